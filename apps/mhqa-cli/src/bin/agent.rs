use std::env;

use tracing_subscriber::EnvFilter;

use mhqa_core::config::{expand_path, Config};
use mhqa_core::types::Question;
use mhqa_pipeline::writer::write_json_file;
use mhqa_pipeline::PipelineOrchestrator;

const USAGE: &str = "Usage: mhqa-agent --question <text> [--topk_sparse N] [--topk_dense N] [--use_llm|--no_llm] [-o <path>]";

fn number(args: &[String], i: usize, flag: &str) -> usize {
    match args.get(i + 1).map(|v| v.parse::<usize>()) {
        Some(Ok(n)) => n,
        _ => {
            eprintln!("Error: {flag} requires a number");
            std::process::exit(2);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load().map_err(|e| { eprintln!("Error loading config: {e}"); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut question = None;
    let mut output = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--question" | "-q" => {
                question = args.get(i + 1).cloned();
                i += 1;
            }
            "--topk_sparse" => {
                config = config.with_override("pipeline.topk_sparse", number(&args, i, "--topk_sparse"));
                i += 1;
            }
            "--topk_dense" => {
                config = config.with_override("pipeline.topk_dense", number(&args, i, "--topk_dense"));
                i += 1;
            }
            "--use_llm" => config = config.with_override("pipeline.use_llm", true),
            "--no_llm" => config = config.with_override("pipeline.use_llm", false),
            "-o" | "--output" => {
                output = args.get(i + 1).map(expand_path);
                i += 1;
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            other if !other.starts_with('-') && question.is_none() => question = Some(other.to_string()),
            other => {
                eprintln!("Unknown argument: {other}\n{USAGE}");
                std::process::exit(2);
            }
        }
        i += 1;
    }
    let Some(question) = question.filter(|q| !q.trim().is_empty()) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let settings = config.settings().map_err(|e| { eprintln!("Invalid configuration: {e}"); e })?;
    let orchestrator = PipelineOrchestrator::new(settings)?;
    let trajectory = orchestrator.run(&Question::new("q-000000", question))?;
    for w in trajectory.warnings() {
        tracing::warn!("{w}");
    }

    match output {
        Some(path) => {
            write_json_file(&path, &trajectory)?;
            eprintln!("Trajectory written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&trajectory)?),
    }
    eprintln!("Answer: {}", trajectory.answer());
    Ok(())
}

use std::env;

use tracing_subscriber::EnvFilter;

use mhqa_core::config::{expand_path, Config};
use mhqa_pipeline::dataset::read_questions;
use mhqa_pipeline::{BatchRunner, DirWriter, JsonlWriter, PipelineOrchestrator};

const USAGE: &str = "Usage: mhqa-batch --dataset <path.jsonl> --out <path> [--workers N] [--limit N] [--topk_sparse N] [--topk_dense N] [--use_llm|--no_llm] [--per-file]";

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
    let (mut dataset, mut out, mut limit, mut per_file) = (None, None, None, false);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dataset" => {
                dataset = args.get(i + 1).map(expand_path);
                i += 1;
            }
            "--out" | "-o" => {
                out = args.get(i + 1).map(expand_path);
                i += 1;
            }
            "--workers" => {
                config = config.with_override("batch.workers", number(&args, i, "--workers"));
                i += 1;
            }
            "--limit" => {
                limit = Some(number(&args, i, "--limit"));
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
            "--per-file" => per_file = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}\n{USAGE}");
                std::process::exit(2);
            }
        }
        i += 1;
    }
    let (Some(dataset), Some(out)) = (dataset, out) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let settings = config.settings().map_err(|e| { eprintln!("Invalid configuration: {e}"); e })?;
    let mut questions = read_questions(&dataset)?;
    if let Some(limit) = limit {
        questions.truncate(limit);
    }
    println!("MHQA batch\n==========");
    println!("Dataset: {} ({} questions)", dataset.display(), questions.len());
    println!("Output: {}{}", out.display(), if per_file { " (one file per question)" } else { "" });

    let runner = BatchRunner::new(PipelineOrchestrator::new(settings)?).with_progress(true);
    println!("Workers: {}", runner.workers());
    let report = if per_file {
        runner.run(&questions, DirWriter::open(&out)?)?
    } else {
        runner.run(&questions, JsonlWriter::open(&out)?)?
    };

    println!("\nDone: {} written, {} skipped, {} succeeded, {} errors", report.written, report.skipped, report.succeeded, report.errors);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

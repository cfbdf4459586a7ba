use std::fs;

use tempfile::TempDir;

use mhqa_core::config::Settings;
use mhqa_core::traits::TrajectoryWriter;
use mhqa_core::types::Question;
use mhqa_pipeline::{BatchReport, BatchRunner, DirWriter, JsonlWriter, PipelineOrchestrator};

/// Orchestrator with no retrieval endpoints and the heuristic reader: fully offline.
fn offline_runner(workers: usize) -> BatchRunner {
    BatchRunner::new(PipelineOrchestrator::new(Settings::new(5, 5)).unwrap()).with_workers(workers)
}

fn questions(n: usize) -> Vec<Question> {
    (0..n).map(|i| Question::new(format!("q-{i:06}"), format!("Who founded city number {i}?"))).collect()
}

fn jsonl_records(path: &std::path::Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn batch_writes_one_record_per_question() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out/trajectories.jsonl");
    let report = offline_runner(4).run(&questions(6), JsonlWriter::open(&out).unwrap()).unwrap();

    assert_eq!(report, BatchReport { total: 6, skipped: 0, written: 6, succeeded: 6, cancelled: 0, errors: 0 });
    let records = jsonl_records(&out);
    assert_eq!(records.len(), 6);
    for r in &records {
        assert_eq!(r["domain"], "mhqa");
        assert_eq!(r["steps"].as_array().unwrap().len(), 6);
        assert_eq!(r["steps"][0]["phase"], "PLAN");
        assert_eq!(r["steps"][5]["phase"], "FINALIZE");
    }
}

#[test]
fn restarted_batch_skips_persisted_questions() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("trajectories.jsonl");
    let runner = offline_runner(2);

    let first = runner.run(&questions(3), JsonlWriter::open(&out).unwrap()).unwrap();
    assert_eq!(first.written, 3);

    let second = runner.run(&questions(5), JsonlWriter::open(&out).unwrap()).unwrap();
    assert_eq!(second.skipped, 3);
    assert_eq!(second.written, 2);

    let mut ids: Vec<String> =
        jsonl_records(&out).iter().map(|r| r["question_id"].as_str().unwrap().to_string()).collect();
    ids.sort();
    assert_eq!(ids, questions(5).into_iter().map(|q| q.id).collect::<Vec<_>>());
}

#[test]
fn duplicate_question_ids_run_once() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("t.jsonl");
    let mut qs = questions(2);
    qs.push(qs[0].clone());
    let report = offline_runner(2).run(&qs, JsonlWriter::open(&out).unwrap()).unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(jsonl_records(&out).len(), 2);
}

#[test]
fn cancelled_batch_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("t.jsonl");
    let runner = offline_runner(2);
    runner.cancel_token().cancel();
    let report = runner.run(&questions(4), JsonlWriter::open(&out).unwrap()).unwrap();
    assert_eq!(report.cancelled, 4);
    assert_eq!(report.written, 0);
    assert!(jsonl_records(&out).is_empty());
}

#[test]
fn dir_writer_persists_per_question_files_and_resumes() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("full_mhqa_trajectories");
    let runner = offline_runner(3);
    runner.run(&questions(3), DirWriter::open(&dir).unwrap()).unwrap();

    let writer = DirWriter::open(&dir).unwrap();
    assert!(writer.file_for("q-000001").exists());
    let ids = writer.existing_ids().unwrap();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains("q-000002"));

    fs::write(dir.join("mhqa_broken.json"), "{ not json").unwrap();
    let report = runner.run(&questions(4), DirWriter::open(&dir).unwrap()).unwrap();
    assert_eq!(report.skipped, 3);
    assert_eq!(report.written, 1);
}

#[test]
fn jsonl_writer_recovers_from_a_torn_last_line() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("t.jsonl");
    offline_runner(1).run(&questions(1), JsonlWriter::open(&out).unwrap()).unwrap();
    let mut content = fs::read_to_string(&out).unwrap();
    content.push_str("{\"run_id\": \"torn");
    fs::write(&out, content).unwrap();

    let writer = JsonlWriter::open(&out).unwrap();
    assert_eq!(writer.existing_ids().unwrap().len(), 1);
    let report = offline_runner(1).run(&questions(2), writer).unwrap();
    assert_eq!(report.written, 1);

    let lines: Vec<String> = fs::read_to_string(&out).unwrap().lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 3);
    let last: serde_json::Value = serde_json::from_str(&lines[2]).unwrap();
    assert_eq!(last["question_id"], "q-000001");
}

#[test]
fn torn_multibyte_tail_does_not_block_resume() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("t.jsonl");
    offline_runner(1).run(&questions(1), JsonlWriter::open(&out).unwrap()).unwrap();
    let mut bytes = fs::read(&out).unwrap();
    bytes.extend_from_slice(b"{\"task_id\": \"M\xc3");
    fs::write(&out, bytes).unwrap();

    let writer = JsonlWriter::open(&out).unwrap();
    let ids = writer.existing_ids().unwrap();
    assert_eq!(ids.len(), 1);
    assert!(ids.contains("q-000000"));

    let report = offline_runner(1).run(&questions(2), writer).unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.written, 1);
}

#[test]
fn ids_that_sanitize_alike_keep_separate_files() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("per_file");
    let qs = vec![Question::new("a/b", "Who founded Rome?"), Question::new("a_b", "Who founded Carthage?")];
    let report = offline_runner(2).run(&qs, DirWriter::open(&dir).unwrap()).unwrap();
    assert_eq!(report.written, 2);

    let files = fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).filter(|e| e.path().is_file()).count();
    assert_eq!(files, 2);
    let ids = DirWriter::open(&dir).unwrap().existing_ids().unwrap();
    assert!(ids.contains("a/b") && ids.contains("a_b"));

    let rerun = offline_runner(2).run(&qs, DirWriter::open(&dir).unwrap()).unwrap();
    assert_eq!(rerun.skipped, 2);
    assert_eq!(rerun.written, 0);
}

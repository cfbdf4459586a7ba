use mhqa_core::config::HeuristicSettings;
use mhqa_core::types::{Backend, Document, MergedEvidence, Question, Strategy};
use mhqa_reader::HeuristicExtractor;

fn doc(id: &str, text: &str) -> Document {
    Document { id: id.to_string(), title: id.to_string(), text: text.to_string(), source: Backend::Sparse }
}

fn france() -> Question {
    Question::new("q-france", "What is the capital of France?")
}

#[test]
fn exact_match_returns_the_paris_sentence() {
    let evidence = MergedEvidence::new(vec![
        doc("s0", "Paris is the capital of France"),
        doc("s1", "Bananas are rich in potassium."),
    ]);
    let answer = HeuristicExtractor::default().extract(&france(), &evidence);
    assert!(answer.text.contains("Paris"), "got {:?}", answer.text);
    assert_eq!(answer.strategy, Strategy::Heuristic);
    assert!(answer.reasoning.is_none());
}

#[test]
fn later_document_with_overlap_beats_unrelated_first_document() {
    let evidence = MergedEvidence::new(vec![
        doc("s0", "Bananas are rich in potassium. They grow in the tropics."),
        doc("d0", "Europe has many cities. The capital of France is Paris."),
    ]);
    let answer = HeuristicExtractor::default().extract(&france(), &evidence);
    assert_eq!(answer.text, "The capital of France is Paris.");
}

#[test]
fn best_sentence_within_a_document_wins() {
    let evidence = MergedEvidence::new(vec![doc(
        "s0",
        "France is in Europe. The capital of France is Paris. France exports wine.",
    )]);
    let answer = HeuristicExtractor::default().extract(&france(), &evidence);
    assert_eq!(answer.text, "The capital of France is Paris.");
}

#[test]
fn degraded_generic_document_is_returned_verbatim() {
    let evidence = MergedEvidence::new(vec![doc("s0", "France is a country in Europe.")]);
    let answer = HeuristicExtractor::default().extract(&france(), &evidence);
    assert_eq!(answer.text, "France is a country in Europe.");
}

#[test]
fn no_overlap_falls_back_to_first_sentence_of_first_document() {
    let strict = HeuristicExtractor::new(&HeuristicSettings { min_overlap: 1.0 });
    let evidence = MergedEvidence::new(vec![
        doc("s0", "Bananas are rich in potassium. They grow in the tropics."),
        doc("s1", "France is a country in Europe."),
    ]);
    let answer = strict.extract(&france(), &evidence);
    assert_eq!(answer.text, "Bananas are rich in potassium.");
}

#[test]
fn empty_evidence_gives_empty_answer_without_panicking() {
    let answer = HeuristicExtractor::default().extract(&france(), &MergedEvidence::default());
    assert!(answer.text.is_empty());
    assert_eq!(answer.strategy, Strategy::Heuristic);
}

#[test]
fn extraction_is_deterministic() {
    let evidence = MergedEvidence::new(vec![doc("s0", "Paris is the capital of France. Lyon is not.")]);
    let h = HeuristicExtractor::default();
    let first = h.extract(&france(), &evidence);
    for _ in 0..5 {
        assert_eq!(h.extract(&france(), &evidence), first);
    }
}

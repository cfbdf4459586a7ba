//! Question loading for batch runs.
//!
//! Accepts JSON Lines (one object per line) or a single JSON array. Each row
//! needs `question` (or `query`); `id` is optional and defaults to
//! `q-<row index>`, zero-padded to six digits.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use mhqa_core::error::{Error, Result};
use mhqa_core::types::Question;

#[derive(Deserialize)]
struct Row {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default, alias = "query")]
    question: Option<String>,
}

pub fn read_questions(path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(path)?;
    parse_questions(&content)
}

pub fn parse_questions(content: &str) -> Result<Vec<Question>> {
    let rows: Vec<(usize, Row)> = if content.trim_start().starts_with('[') {
        let rows: Vec<Row> = serde_json::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("dataset is not a JSON array of objects: {e}")))?;
        rows.into_iter().enumerate().collect()
    } else {
        content
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .filter_map(|(n, l)| match serde_json::from_str::<Row>(l) {
                Ok(row) => Some((n, row)),
                Err(e) => {
                    warn!(line = n + 1, error = %e, "skipping malformed dataset line");
                    None
                }
            })
            .collect()
    };

    Ok(rows
        .into_iter()
        .filter_map(|(n, row)| {
            let text = row.question.map(|q| q.trim().to_string()).filter(|q| !q.is_empty())?;
            let id = match row.id {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
                Some(serde_json::Value::Number(num)) => num.to_string(),
                _ => format!("q-{n:06}"),
            };
            Some(Question { id, text })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_rows_with_defaults_and_skips() {
        let data = "{\"id\": \"a\", \"question\": \"Who?\"}\n\n{\"query\": \"Where?\"}\nnot json\n{\"id\": 7, \"question\": \"When?\"}\n{\"question\": \"  \"}\n";
        let qs = parse_questions(data).unwrap();
        let got: Vec<(&str, &str)> = qs.iter().map(|q| (q.id.as_str(), q.text.as_str())).collect();
        assert_eq!(got, vec![("a", "Who?"), ("q-000002", "Where?"), ("7", "When?")]);
    }

    #[test]
    fn json_array_is_accepted() {
        let qs = parse_questions("[{\"question\": \"Who?\"}, {\"id\": \"x\", \"question\": \"Why?\"}]").unwrap();
        assert_eq!(qs[0].id, "q-000000");
        assert_eq!(qs[1].id, "x");
    }
}

//! Batch evaluation harness.
//!
//! Reads questions from a JSONL file, answers each one with the pipeline
//! and writes one JSONL result per question, ready for offline scoring
//! against the ground truth.

use std::path::Path;

use khoji_search::{LanguageModel, Pipeline, SearchProvider};
use serde::{Deserialize, Serialize};

use crate::error::{KhojiError, Result};

/// Documents retrieved per evaluation question.
pub const EVALUATION_MAX_RESULTS: usize = 10;

/// One input question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The question to answer.
    pub question: String,
    /// Reference answer, carried through unchanged.
    #[serde(default)]
    pub ground_truth: String,
    /// Reference contexts, carried through unchanged.
    #[serde(default)]
    pub contexts: Vec<String>,
    /// Question category, carried through unchanged.
    #[serde(default)]
    pub question_type: String,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The question asked.
    pub question: String,
    /// The pipeline's summary.
    pub answer: String,
    /// Reference contexts from the input record.
    pub contexts: Vec<String>,
    /// Reference answer from the input record.
    pub ground_truth: String,
    /// Question category from the input record.
    pub question_type: String,
}

/// Parse JSONL input. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`KhojiError::Evaluation`] naming the first malformed line
/// (1-based).
pub fn parse_records(input: &str) -> Result<Vec<EvaluationRecord>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| KhojiError::Evaluation(format!("line {}: {e}", i + 1)))
        })
        .collect()
}

/// Render results as JSONL, one object per line, non-ASCII kept as is.
///
/// # Errors
///
/// Returns [`KhojiError::Evaluation`] if a result cannot be serialized.
pub fn render_results(results: &[EvaluationResult]) -> Result<String> {
    let mut out = String::new();
    for result in results {
        let line = serde_json::to_string(result)
            .map_err(|e| KhojiError::Evaluation(format!("failed to serialize result: {e}")))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

/// Answer every question in `input` and write the results to `output`.
///
/// Questions are answered one after another. Returns the number of
/// records written.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, or the output
/// cannot be written. Pipeline degradation is not an error: a question with
/// no results gets the no-results summary as its answer.
pub async fn run<P, M>(input: &Path, output: &Path, pipeline: &Pipeline<P, M>) -> Result<usize>
where
    P: SearchProvider,
    M: LanguageModel,
{
    let content = tokio::fs::read_to_string(input).await?;
    let records = parse_records(&content)?;
    let total = records.len();
    tracing::info!(total, input = %input.display(), "starting evaluation");

    let mut results = Vec::with_capacity(total);
    for (i, record) in records.into_iter().enumerate() {
        tracing::trace!(question = %record.question, "evaluating");
        let summary = pipeline
            .answer(&record.question, EVALUATION_MAX_RESULTS)
            .await;
        results.push(EvaluationResult {
            question: record.question,
            answer: summary.summary,
            contexts: record.contexts,
            ground_truth: record.ground_truth,
            question_type: record.question_type,
        });
        tracing::info!(record = i + 1, total, "evaluated");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, render_results(&results)?).await?;
    tracing::info!(output = %output.display(), "evaluation complete");
    Ok(results.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default() {
        let records = parse_records(r#"{"question": "What is the gold rate today?"}"#).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "What is the gold rate today?");
        assert!(records[0].ground_truth.is_empty());
        assert!(records[0].contexts.is_empty());
        assert!(records[0].question_type.is_empty());
    }

    #[test]
    fn blank_lines_skipped() {
        let input = "{\"question\": \"a\"}\n\n   \n{\"question\": \"b\", \"question_type\": \"simple\"}\n";
        let records = parse_records(input).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].question_type, "simple");
    }

    #[test]
    fn malformed_line_names_line_number() {
        let input = "{\"question\": \"a\"}\n\n{not json}\n";
        let err = parse_records(input).unwrap_err();
        assert!(matches!(err, KhojiError::Evaluation(_)));
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn missing_question_is_malformed() {
        let err = parse_records("{\"ground_truth\": \"x\"}").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn rendered_results_keep_unicode_and_field_order() {
        let rendered = render_results(&[EvaluationResult {
            question: "सुनको मूल्य".into(),
            answer: "रु 1,61,200".into(),
            contexts: vec!["ctx".into()],
            ground_truth: "gt".into(),
            question_type: "simple".into(),
        }])
        .expect("render");
        assert_eq!(
            rendered,
            "{\"question\":\"सुनको मूल्य\",\"answer\":\"रु 1,61,200\",\"contexts\":[\"ctx\"],\"ground_truth\":\"gt\",\"question_type\":\"simple\"}\n"
        );
    }
}

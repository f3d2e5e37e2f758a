//! Wire payloads and export files

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::EXPORT_FILE_SUFFIX;
use crate::error::Result;

/// Body of a save request: one question and its current answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub question: String,
    pub answer: Value,
}

impl AnswerPayload {
    pub fn new(question: impl Into<String>, answer: Value) -> Self {
        Self {
            question: question.into(),
            answer,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// URL of a subject's export; the subject is appended unencoded
pub fn export_url(export_endpoint: &str, subject: &str) -> String {
    format!("{}/{}", export_endpoint.trim_end_matches('/'), subject)
}

/// Download filename for a subject's export
pub fn export_filename(subject: &str) -> String {
    format!("{subject}{EXPORT_FILE_SUFFIX}")
}

/// A file ready to be offered as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    /// Pretty-printed JSON (two-space indent)
    pub contents: String,
}

impl ExportFile {
    /// Re-serialize a fetched document for download
    pub fn from_document(subject: &str, document: &Value) -> Result<Self> {
        let mut document = document.clone();
        integral_floats_as_integers(&mut document);
        Ok(Self {
            filename: export_filename(subject),
            contents: serde_json::to_string_pretty(&document)?,
        })
    }
}

/// Print `1.0` as `1` like `JSON.stringify`; floats outside the i64 range keep
/// serde_json's exponent form
fn integral_floats_as_integers(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            let f = n.as_f64().unwrap_or(f64::NAN);
            if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) {
                *n = serde_json::Number::from(f as i64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(integral_floats_as_integers),
        Value::Object(map) => map.values_mut().for_each(integral_floats_as_integers),
        _ => {}
    }
}

/// Export document shape produced by the question-bank server
#[derive(Debug, Clone, Deserialize)]
struct ExportDocument {
    subject: String,
    qa_pairs: Vec<QaPair>,
}

#[derive(Debug, Clone, Deserialize)]
struct QaPair {
    section: String,
    #[serde(default)]
    answer: Value,
}

impl QaPair {
    /// Null and blank strings count as unanswered
    fn is_answered(&self) -> bool {
        match &self.answer {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        }
    }
}

/// Counts describing an export, for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub subject: String,
    pub questions: usize,
    pub answered: usize,
    pub sections: usize,
}

impl ExportSummary {
    /// Summarize a server export document; `None` for any other shape
    pub fn of(document: &Value) -> Option<Self> {
        let doc = ExportDocument::deserialize(document).ok()?;
        let sections: BTreeSet<&str> = doc.qa_pairs.iter().map(|p| p.section.as_str()).collect();
        Some(Self {
            questions: doc.qa_pairs.len(),
            answered: doc.qa_pairs.iter().filter(|p| p.is_answered()).count(),
            sections: sections.len(),
            subject: doc.subject,
        })
    }
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}/{} answered across {} section(s)",
            self.subject, self.answered, self.questions, self.sections
        )
    }
}

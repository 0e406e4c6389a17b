use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::Job;

/// A previously answered form question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Read-only answers consulted before asking the external answerer.
#[derive(Debug, Clone, Default)]
pub struct QuestionAnswerStore {
    entries: Vec<QuestionAnswer>,
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerStoreError {
    #[error("unable to read answers from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("answers file {path} has an unexpected shape: {reason}")]
    Format { path: PathBuf, reason: String },
}

impl QuestionAnswerStore {
    pub fn new(entries: Vec<QuestionAnswer>) -> Self {
        Self { entries }
    }

    /// Missing and undecodable files yield an empty store; a decodable file
    /// that is not a list of question/answer objects is rejected.
    pub fn load(path: &Path) -> Result<Self, AnswerStoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "answers file not found, starting with no stored answers");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(AnswerStoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "answers file is not valid JSON, ignoring it");
                return Ok(Self::default());
            }
        };

        if !value.is_array() {
            return Err(AnswerStoreError::Format {
                path: path.to_path_buf(),
                reason: "expected a list of questions".to_string(),
            });
        }
        let entries: Vec<QuestionAnswer> =
            serde_json::from_value(value).map_err(|err| AnswerStoreError::Format {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        tracing::debug!(count = entries.len(), "stored answers loaded");
        Ok(Self { entries })
    }

    /// Case-insensitive exact match on the question text.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        let wanted = question.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.question.to_lowercase() == wanted)
            .map(|entry| entry.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("answerer unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator that answers questions missing from the store.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer_question(&self, job: &Job, question: &str) -> Result<String, AnswerError>;
}

/// Answers every question with the same configured text.
#[derive(Debug, Clone)]
pub struct FixedAnswerer {
    answer: String,
}

impl FixedAnswerer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl QuestionAnswerer for FixedAnswerer {
    async fn answer_question(&self, job: &Job, question: &str) -> Result<String, AnswerError> {
        tracing::debug!(%question, job = %job, "answering with configured default");
        Ok(self.answer.clone())
    }
}

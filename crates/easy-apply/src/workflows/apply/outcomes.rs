use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::domain::{OutcomeClass, OutcomeRecord};

/// Storage abstraction for the success/failed/skipped logs.
pub trait OutcomeLog: Send + Sync {
    fn append(&self, class: OutcomeClass, record: &OutcomeRecord) -> Result<(), OutcomeLogError>;
    fn read(&self, class: OutcomeClass) -> Result<Vec<OutcomeRecord>, OutcomeLogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OutcomeLogError {
    #[error("outcome log {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to encode outcome record for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to export outcome report: {0}")]
    Export(#[from] csv::Error),
}

/// Pretty-printed JSON arrays, one file per outcome class, rewritten on each append.
#[derive(Debug, Clone)]
pub struct JsonOutcomeLog {
    directory: PathBuf,
}

impl JsonOutcomeLog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Ensures the output directory exists.
    pub fn create(directory: impl Into<PathBuf>) -> Result<Self, OutcomeLogError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| OutcomeLogError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, class: OutcomeClass) -> PathBuf {
        self.directory.join(class.file_name())
    }

    fn load(&self, path: &Path) -> Result<Vec<OutcomeRecord>, OutcomeLogError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(OutcomeLogError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "outcome log is not valid JSON, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

impl OutcomeLog for JsonOutcomeLog {
    fn append(&self, class: OutcomeClass, record: &OutcomeRecord) -> Result<(), OutcomeLogError> {
        let path = self.path_for(class);
        let mut records = self.load(&path)?;
        records.push(record.clone());

        let encoded =
            serde_json::to_string_pretty(&records).map_err(|source| OutcomeLogError::Encode {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, encoded).map_err(|source| OutcomeLogError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(outcome = %class, company = %record.company, title = %record.job_title, "outcome recorded");
        Ok(())
    }

    fn read(&self, class: OutcomeClass) -> Result<Vec<OutcomeRecord>, OutcomeLogError> {
        self.load(&self.path_for(class))
    }
}

/// Per-class counts and top companies across the outcome logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub counts: BTreeMap<&'static str, usize>,
    pub companies: BTreeMap<String, usize>,
}

impl OutcomeSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

pub fn summarize<L>(log: &L) -> Result<OutcomeSummary, OutcomeLogError>
where
    L: OutcomeLog + ?Sized,
{
    let mut summary = OutcomeSummary::default();
    for class in OutcomeClass::ALL {
        let records = log.read(class)?;
        summary.counts.insert(class.label(), records.len());
        if class == OutcomeClass::Success {
            for record in records {
                *summary
                    .companies
                    .entry(record.company.trim().to_string())
                    .or_default() += 1;
            }
        }
    }
    Ok(summary)
}

/// Writes every record, tagged with its outcome class, as CSV.
pub fn export_csv<L, W>(log: &L, writer: W) -> Result<usize, OutcomeLogError>
where
    L: OutcomeLog + ?Sized,
    W: io::Write,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "outcome",
        "company",
        "job_title",
        "link",
        "job_recruiter",
        "job_location",
        "pdf_path",
    ])?;

    let mut written = 0;
    for class in OutcomeClass::ALL {
        for record in log.read(class)? {
            csv_writer.write_record([
                class.label(),
                record.company.as_str(),
                record.job_title.as_str(),
                record.link.as_str(),
                record.job_recruiter.as_str(),
                record.job_location.as_str(),
                record.pdf_path.as_deref().unwrap_or(""),
            ])?;
            written += 1;
        }
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(written)
}

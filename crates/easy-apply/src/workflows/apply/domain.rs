use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job field `{0}` cannot be empty")]
    EmptyField(&'static str),
}

/// One listing parsed from a search result tile.
///
/// The identifying fields are fixed at construction; description, recruiter
/// link, summary, and résumé path are attached later as navigation reveals them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    title: String,
    company: String,
    location: String,
    link: String,
    apply_method: String,
    description: String,
    summarized_description: Option<String>,
    recruiter_link: String,
    pdf_path: Option<PathBuf>,
}

impl Job {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        link: impl AsRef<str>,
        apply_method: impl Into<String>,
    ) -> Result<Self, JobError> {
        let title = required("title", title.into())?;
        let company = required("company", company.into())?;
        let location = required("location", location.into())?;
        let link = required("link", strip_query(link.as_ref()).to_string())?;
        let apply_method = required("apply_method", apply_method.into())?;

        tracing::debug!(%title, %company, "job parsed");
        Ok(Self {
            title,
            company,
            location,
            link,
            apply_method,
            description: String::new(),
            summarized_description: None,
            recruiter_link: String::new(),
            pdf_path: None,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn apply_method(&self) -> &str {
        &self.apply_method
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn summarized_description(&self) -> Option<&str> {
        self.summarized_description.as_deref()
    }

    pub fn recruiter_link(&self) -> &str {
        &self.recruiter_link
    }

    pub fn pdf_path(&self) -> Option<&Path> {
        self.pdf_path.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_summarized_description(&mut self, summary: impl Into<String>) {
        self.summarized_description = Some(summary.into());
    }

    pub fn set_recruiter_link(&mut self, link: impl Into<String>) {
        self.recruiter_link = link.into();
    }

    pub fn set_pdf_path(&mut self, path: impl Into<PathBuf>) {
        self.pdf_path = Some(path.into());
    }

    /// Tiles already applied to, or routed to an external site, carry one of
    /// these apply-method labels instead of "Easy Apply".
    pub fn is_easy_apply(&self) -> bool {
        !matches!(self.apply_method.trim(), "Continue" | "Applied" | "Apply")
    }

    /// Markdown summary handed to the answerer as context.
    pub fn formatted_information(&self) -> String {
        let recruiter = if self.recruiter_link.is_empty() {
            "Not available"
        } else {
            &self.recruiter_link
        };
        let description = if self.description.is_empty() {
            "No description provided."
        } else {
            &self.description
        };
        let summary = self
            .summarized_description
            .as_deref()
            .filter(|summary| !summary.is_empty())
            .unwrap_or("No summarized description available.");

        format!(
            "# Job Description\n\
             ## Job Information\n\
             - Position: {}\n\
             - At: {}\n\
             - Location: {}\n\
             - Recruiter Profile: {}\n\
             - Apply Method: {}\n\
             - Job Link: {}\n\
             \n\
             ## Description\n\
             {}\n\
             \n\
             ## Summarized Description\n\
             {}",
            self.title,
            self.company,
            self.location,
            recruiter,
            self.apply_method,
            self.link,
            description,
            summary
        )
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} ({})", self.title, self.company, self.location)
    }
}

fn required(field: &'static str, value: String) -> Result<String, JobError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::error!(field, "required job field is empty");
        return Err(JobError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

pub fn strip_query(link: &str) -> &str {
    link.split('?').next().unwrap_or(link)
}

/// Which outcome file a record lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeClass {
    Success,
    Failed,
    Skipped,
}

impl OutcomeClass {
    pub const ALL: [OutcomeClass; 3] = [
        OutcomeClass::Success,
        OutcomeClass::Failed,
        OutcomeClass::Skipped,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            OutcomeClass::Success => "success.json",
            OutcomeClass::Failed => "failed.json",
            OutcomeClass::Skipped => "skipped.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutcomeClass::Success => "success",
            OutcomeClass::Failed => "failed",
            OutcomeClass::Skipped => "skipped",
        }
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted entry in one of the outcome logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub company: String,
    pub job_title: String,
    pub link: String,
    pub job_recruiter: String,
    pub job_location: String,
    pub pdf_path: Option<String>,
}

impl OutcomeRecord {
    pub fn from_job(job: &Job) -> Self {
        Self {
            company: job.company.clone(),
            job_title: job.title.clone(),
            link: job.link.clone(),
            job_recruiter: job.recruiter_link.clone(),
            job_location: job.location.clone(),
            pdf_path: job.pdf_path.as_deref().and_then(file_uri),
        }
    }
}

fn file_uri(path: &Path) -> Option<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Url::from_file_path(&absolute).ok().map(String::from)
}

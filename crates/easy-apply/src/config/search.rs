use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

fn default_match_threshold() -> f64 {
    0.75
}

fn default_max_pages() -> u32 {
    5
}

/// Search, screening, and portal settings read from `config.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParameters {
    #[serde(default)]
    pub remote: bool,
    #[serde(default, rename = "experienceLevel", alias = "experience_level")]
    pub experience_level: Toggles,
    #[serde(default, rename = "jobTypes", alias = "job_types")]
    pub job_types: Toggles,
    #[serde(default)]
    pub date: Toggles,
    pub positions: Vec<String>,
    pub locations: Vec<String>,
    #[serde(default)]
    pub distance: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company_blacklist: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title_blacklist: Vec<String>,
    #[serde(default)]
    pub apply_once_at_company: bool,
    #[serde(default)]
    pub job_matching_algorithm: JobMatchingAlgorithm,
    #[serde(default)]
    pub job_applicants_threshold: Option<ApplicantsThreshold>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub job_portals: Vec<PortalConfig>,
    #[serde(default)]
    pub uploads: Uploads,
}

impl SearchParameters {
    pub fn from_yaml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let params: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.job_matching_algorithm.match_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "job_matching_algorithm.match_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.positions.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "at least one position is required".to_string(),
            ));
        }
        if self.locations.iter().all(|l| l.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "at least one location is required".to_string(),
            ));
        }
        if let Some(threshold) = &self.job_applicants_threshold {
            if threshold.min_applicants > threshold.max_applicants {
                return Err(ConfigError::Invalid(format!(
                    "job_applicants_threshold.min_applicants ({}) exceeds max_applicants ({})",
                    threshold.min_applicants, threshold.max_applicants
                )));
            }
        }
        Ok(())
    }

    pub fn portal(&self, name: &str) -> Option<&PortalConfig> {
        self.job_portals
            .iter()
            .find(|portal| portal.name.eq_ignore_ascii_case(name))
    }
}

/// Ordered name → enabled pairs, as written in the YAML mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "serde_yaml::Mapping")]
pub struct Toggles(Vec<(String, bool)>);

impl Toggles {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(name, enabled)| (name.into(), enabled))
                .collect(),
        )
    }

    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, _)| name.as_str())
    }

    pub fn first_enabled(&self) -> Option<&str> {
        self.enabled().next()
    }
}

impl TryFrom<serde_yaml::Mapping> for Toggles {
    type Error = String;

    fn try_from(mapping: serde_yaml::Mapping) -> Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                serde_yaml::Value::Number(number) => number.to_string(),
                other => return Err(format!("filter names must be strings, got {other:?}")),
            };
            let enabled = match value {
                serde_yaml::Value::Bool(enabled) => enabled,
                serde_yaml::Value::Null => false,
                other => return Err(format!("filter '{name}' must be a boolean, got {other:?}")),
            };
            entries.push((name, enabled));
        }
        Ok(Self(entries))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobMatchingAlgorithm {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keywords: Vec<String>,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl Default for JobMatchingAlgorithm {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            match_threshold: default_match_threshold(),
        }
    }
}

/// Applicant-count window. Parsed and validated; screening does not consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ApplicantsThreshold {
    #[serde(default)]
    pub min_applicants: u32,
    #[serde(default = "u32_max")]
    pub max_applicants: u32,
}

fn u32_max() -> u32 {
    u32::MAX
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Uploads {
    #[serde(default)]
    pub resume: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortalConfig {
    pub name: String,
    pub login_url: String,
    pub feed_url: String,
    pub login_element: String,
    pub feed_element: String,
    pub profile_image_xpath: String,
    pub security_check_url: String,
}

/// Raw `secrets.yaml` contents keyed by `<portal>_username` / `<portal>_password`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secrets(HashMap<String, serde_yaml::Value>);

impl Secrets {
    pub fn from_yaml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let secrets: Option<Self> = serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(secrets.unwrap_or_default())
    }

    /// A missing secrets file is not an error; login then falls back to the operator.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_yaml_str(&raw, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn credentials_for(&self, portal: &str) -> Option<Credentials> {
        let prefix = portal.to_lowercase();
        let username = self.string_value(&format!("{prefix}_username"))?;
        let password = self.string_value(&format!("{prefix}_password"))?;
        Some(Credentials { username, password })
    }

    fn string_value(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_yaml::Value::String(value) if !value.trim().is_empty() => Some(value.clone()),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

mod search;

pub use search::{
    ApplicantsThreshold, Credentials, JobMatchingAlgorithm, PortalConfig, SearchParameters,
    Secrets, Toggles, Uploads,
};

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub webdriver: WebDriverConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub portal_name: String,
    pub default_answer: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let url = env::var("WEBDRIVER_URL").unwrap_or_else(|_| "http://localhost:4444".to_string());
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidWebDriverUrl(url));
        }
        let browser_args = env::var("WEBDRIVER_ARGS")
            .map(|raw| {
                raw.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_dir = env::var("APPLY_DATA_DIR").unwrap_or_else(|_| "data_folder".to_string());
        if data_dir.trim().is_empty() {
            return Err(ConfigError::EmptyValue("APPLY_DATA_DIR"));
        }

        let portal_name = env::var("APPLY_PORTAL").unwrap_or_else(|_| "LinkedIn".to_string());
        if portal_name.trim().is_empty() {
            return Err(ConfigError::EmptyValue("APPLY_PORTAL"));
        }

        let default_answer = env::var("APPLY_DEFAULT_ANSWER").unwrap_or_else(|_| "Yes".to_string());

        Ok(Self {
            environment,
            webdriver: WebDriverConfig { url, browser_args },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig::new(PathBuf::from(data_dir)),
            portal_name,
            default_answer,
        })
    }
}

/// Where the remote WebDriver endpoint lives and how to launch the browser.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub url: String,
    pub browser_args: Vec<String>,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Layout of the data folder holding configuration, answers, and outcome logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub root: PathBuf,
}

impl DataConfig {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn search_config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.root.join("secrets.yaml")
    }

    pub fn answers_path(&self) -> PathBuf {
        self.root.join("answers.json")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidWebDriverUrl(String),
    EmptyValue(&'static str),
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWebDriverUrl(url) => {
                write!(f, "WEBDRIVER_URL must be an http(s) URL, got '{url}'")
            }
            ConfigError::EmptyValue(key) => write!(f, "{key} must not be empty"),
            ConfigError::Read { path, .. } => {
                write!(f, "unable to read configuration file {}", path.display())
            }
            ConfigError::Yaml { path, source } => {
                write!(f, "invalid YAML in {}: {}", path.display(), source)
            }
            ConfigError::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Yaml { source, .. } => Some(source),
            ConfigError::InvalidWebDriverUrl(_)
            | ConfigError::EmptyValue(_)
            | ConfigError::Invalid(_) => None,
        }
    }
}

use crate::browser::BrowserError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::apply::{AnswerStoreError, AuthError, OutcomeLogError, SessionError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Browser(BrowserError),
    Auth(AuthError),
    Answers(AnswerStoreError),
    Outcomes(OutcomeLogError),
    Session(SessionError),
    LoginFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Browser(err) => write!(f, "browser error: {}", err),
            AppError::Auth(err) => write!(f, "authentication error: {}", err),
            AppError::Answers(err) => write!(f, "answer store error: {}", err),
            AppError::Outcomes(err) => write!(f, "outcome log error: {}", err),
            AppError::Session(err) => write!(f, "session error: {}", err),
            AppError::LoginFailed(portal) => write!(f, "could not log in to {}", portal),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Browser(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Answers(err) => Some(err),
            AppError::Outcomes(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::LoginFailed(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<BrowserError> for AppError {
    fn from(value: BrowserError) -> Self {
        Self::Browser(value)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<AnswerStoreError> for AppError {
    fn from(value: AnswerStoreError) -> Self {
        Self::Answers(value)
    }
}

impl From<OutcomeLogError> for AppError {
    fn from(value: OutcomeLogError) -> Self {
        Self::Outcomes(value)
    }
}

impl From<SessionError> for AppError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

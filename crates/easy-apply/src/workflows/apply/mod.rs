//! Job search, screening, and Easy Apply session workflow.

pub mod answers;
pub mod applier;
pub mod auth;
pub mod domain;
pub mod eligibility;
pub mod operator;
pub mod outcomes;
pub mod pacing;
pub mod search;
pub(crate) mod selectors;
pub mod session;

#[cfg(test)]
mod tests;

pub use answers::{
    AnswerError, AnswerStoreError, FixedAnswerer, QuestionAnswer, QuestionAnswerStore,
    QuestionAnswerer,
};
pub use applier::{
    ApplierSettings, ApplyError, ApplyState, EasyApplier, FailureDisposition, FieldKind,
};
pub use auth::{AuthError, Authenticator};
pub use domain::{Job, JobError, OutcomeClass, OutcomeRecord};
pub use eligibility::{EligibilityConfig, EligibilityDecision, EligibilityFilter, SkipReason};
pub use operator::{OperatorConsole, OperatorSignal, StdinOperator};
pub use outcomes::{
    export_csv, summarize, JsonOutcomeLog, OutcomeLog, OutcomeLogError, OutcomeSummary,
};
pub use pacing::{DelayRange, Timings};
pub use search::{SearchError, SearchUrlBuilder};
pub use session::{SessionError, SessionOrchestrator, SessionReport, SessionState};

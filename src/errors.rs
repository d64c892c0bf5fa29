use serde::Serialize;
use thiserror::Error;

/// Errors reported by the browser driver boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The element does not exist (yet)
    #[error("no such element: {0}")]
    NoSuchElement(String),
    /// The element reference was invalidated by a re-render
    #[error("stale element reference: {0}")]
    StaleElement(String),
    /// Another element would receive the click
    #[error("element click intercepted: {0}")]
    ClickIntercepted(String),
    /// The WebDriver session could not be created or was lost
    #[error("WebDriver connection failed: {0}")]
    Connection(String),
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Whether a waiter should keep polling after this error
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriverError::NoSuchElement(_) | DriverError::StaleElement(_)
        )
    }
}

/// Broad class of a [`ProbeError`], used for reporting and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// No element could be located for the request
    Resolution,
    /// An element was found but could not be acted on
    Interaction,
    /// The action ran but the page state is not what was expected
    Verification,
    /// The driver itself failed
    Driver,
}

/// Terminal errors of resolution, interaction and verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Field with label or placeholder containing '{label}' not found")]
    FieldNotFound { label: String },

    #[error("No radio buttons found on the page")]
    NoRadiosFound,

    #[error("Could not find a radio button associated with '{token}'")]
    AmbiguousOrNotFound { token: String },

    #[error("Click on radio '{token}' was intercepted, and so was the retry on its parent")]
    ClickInterceptedRetryExhausted { token: String },

    #[error("Verification failed for {subject}: expected {expected}, got {actual}")]
    VerificationFailed {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::FieldNotFound { .. }
            | ProbeError::NoRadiosFound
            | ProbeError::AmbiguousOrNotFound { .. } => ErrorKind::Resolution,
            ProbeError::ClickInterceptedRetryExhausted { .. } => ErrorKind::Interaction,
            ProbeError::VerificationFailed { .. } => ErrorKind::Verification,
            ProbeError::Driver(_) => ErrorKind::Driver,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Resolution => 2,
            ErrorKind::Interaction => 3,
            ErrorKind::Driver => 4,
            ErrorKind::Verification => 5,
        }
    }
}

/// Exit code for a top-level error, falling back to 1 for anything that
/// is not a [`ProbeError`]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ProbeError>() {
        Some(probe_err) => probe_err.exit_code(),
        None if err.downcast_ref::<DriverError>().is_some() => 4,
        None => 1,
    }
}

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Recoverable validation failures raised by `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    RequiredAnswerMissing,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::RequiredAnswerMissing => "required_answer_missing",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end or refuse a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalCode {
    EmptyTemplate,
    AlreadyCompleted,
    NotInQuestion,
    CaptureNotReady,
}

impl FatalCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatalCode::EmptyTemplate => "empty_template",
            FatalCode::AlreadyCompleted => "already_completed",
            FatalCode::NotInQuestion => "not_in_question",
            FatalCode::CaptureNotReady => "capture_not_ready",
        }
    }
}

impl fmt::Display for FatalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by template stores and result sinks.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("invalid id '{0}'")]
    InvalidId(String),
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::InvalidId(_) => "invalid_id",
            StoreError::Io { .. } => "io",
            StoreError::Json { .. } => "json",
        }
    }
}

/// Errors surfaced synchronously by flow operations.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("validation failed for '{question_id}': {code}")]
    Validation {
        code: ValidationCode,
        question_id: String,
    },
    #[error("fatal flow error: {0}")]
    Fatal(FatalCode),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FlowError {
    pub fn required_missing(question_id: impl Into<String>) -> Self {
        FlowError::Validation {
            code: ValidationCode::RequiredAnswerMissing,
            question_id: question_id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FlowError::Validation { code, .. } => code.as_str(),
            FlowError::Fatal(code) => code.as_str(),
            FlowError::Store(err) => err.code(),
        }
    }

    /// Validation failures keep the user on the same question.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FlowError::Validation { .. })
    }
}

impl From<FatalCode> for FlowError {
    fn from(code: FatalCode) -> Self {
        FlowError::Fatal(code)
    }
}

//! Pipeline failure taxonomy and its caller-facing classification.

use std::fmt;

use thiserror::Error;

use crate::domain::{InvalidTransition, PipelineState};

/// A terminal pipeline failure
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or malformed request input
    #[error("{0}")]
    InvalidInput(String),

    /// No caller identity on the request
    #[error("The request must be made by an authenticated caller")]
    Unauthenticated,

    /// Audio fetch, conversion or transcription failed
    #[error("{stage} failed: {message}")]
    ExternalTool { stage: Stage, message: String },

    /// The run exceeded its wall-clock ceiling
    #[error("Pipeline timed out after {limit_seconds}s")]
    Timeout { limit_seconds: u64 },

    /// Anything else: storage, serialization, state machine bugs
    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    /// Wrap a collaborator failure for the given stage
    pub fn external(stage: Stage, error: anyhow::Error) -> Self {
        Self::ExternalTool {
            stage,
            message: format!("{:#}", error),
        }
    }

    /// Wrap an unexpected failure
    pub fn internal(error: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", error))
    }

    /// Classification reported to the caller
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::InvalidInput(_) => ErrorClass::InvalidArgument,
            PipelineError::Unauthenticated => ErrorClass::Unauthenticated,
            PipelineError::Timeout { .. } => ErrorClass::DeadlineExceeded,
            PipelineError::ExternalTool { .. } | PipelineError::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// Human-readable message for the caller, echoing the failure detail
    pub fn caller_message(&self) -> String {
        match self {
            PipelineError::InvalidInput(_) | PipelineError::Unauthenticated => self.to_string(),
            _ => format!("Failed to transcribe from link: {}", self),
        }
    }
}

impl From<InvalidTransition> for PipelineError {
    fn from(e: InvalidTransition) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Caller-facing error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    InvalidArgument,
    Unauthenticated,
    DeadlineExceeded,
    Internal,
}

impl ErrorClass {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorClass::InvalidArgument => "invalid-argument",
            ErrorClass::Unauthenticated => "unauthenticated",
            ErrorClass::DeadlineExceeded => "deadline-exceeded",
            ErrorClass::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// External stages a collaborator failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AudioFetch,
    Conversion,
    Transcription,
}

impl Stage {
    /// State the run reaches when this stage succeeds
    pub fn completes_into(&self) -> PipelineState {
        match self {
            Stage::AudioFetch => PipelineState::AudioFetched,
            Stage::Conversion => PipelineState::ConvertedToWav,
            Stage::Transcription => PipelineState::Transcribed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::AudioFetch => f.write_str("Audio download"),
            Stage::Conversion => f.write_str("Audio conversion"),
            Stage::Transcription => f.write_str("Transcription"),
        }
    }
}

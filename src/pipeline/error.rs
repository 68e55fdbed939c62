use thiserror::Error;

use crate::index::IndexError;
use crate::llm::ModelCallFailed;
use crate::sanitize::RejectedInput;
use crate::validate;

/// Why a classification produced no result.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Empty or oversized input; the caller must resubmit.
    #[error("input rejected: {0}")]
    RejectedInput(#[from] RejectedInput),

    /// The pattern index could not be searched.
    #[error("pattern index unavailable: {0}")]
    IndexUnavailable(#[from] IndexError),

    /// Every model attempt failed.
    #[error(transparent)]
    ModelCallFailed(#[from] ModelCallFailed),

    /// The model replied, but no JSON could be recovered from the reply.
    #[error("model response contained no parseable JSON")]
    UnparseableResponse {
        /// Model reply, verbatim.
        raw: String,
    },

    /// The reply parsed as JSON but not as a list of records.
    #[error("model response has an invalid structure: {reason}")]
    InvalidResultStructure {
        /// Model reply, verbatim.
        raw: String,
        #[source]
        reason: validate::InvalidResultStructure,
    },
}

impl ClassifyError {
    /// Whether the user can act on the failure (resubmit, or read the raw reply).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RejectedInput(_)
                | Self::UnparseableResponse { .. }
                | Self::InvalidResultStructure { .. }
        )
    }

    /// The model's reply when the failure happened after it answered.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::UnparseableResponse { raw } | Self::InvalidResultStructure { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }

    /// Stable snake-case code for logs and response bodies.
    /// Attempts spent when every model call failed.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::ModelCallFailed(e) => Some(e.attempts),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::RejectedInput(_) => "rejected_input",
            Self::IndexUnavailable(_) => "index_unavailable",
            Self::ModelCallFailed(_) => "model_call_failed",
            Self::UnparseableResponse { .. } => "unparseable_response",
            Self::InvalidResultStructure { .. } => "invalid_result_structure",
        }
    }
}

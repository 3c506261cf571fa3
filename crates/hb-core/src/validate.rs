//! Accept/reject decision for a submitted confession.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::threat;

/// Upper bound used by the public submission form.
pub const DEFAULT_MAX_LENGTH: usize = 1500;

/// Checks in order, first failure wins:
/// empty → unsafe content → too long → forbidden term.
///
/// Length is counted in characters on the untrimmed text.
pub fn validate(
    text: &str,
    max_len: usize,
    forbidden_terms: &[String],
) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let hits = threat::findings(text);
    if !hits.is_empty() {
        tracing::debug!(rules = ?hits, "submission matched threat rules");
        return Err(ValidationError::UnsafeContent);
    }

    if text.chars().count() > max_len {
        return Err(ValidationError::TooLong { max: max_len });
    }

    let lowered = text.to_lowercase();
    let forbidden = forbidden_terms
        .iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .any(|term| lowered.contains(&term));
    if forbidden {
        return Err(ValidationError::ForbiddenTerm);
    }

    Ok(())
}

/// Submission limits, usually loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPolicy {
    pub max_length: usize,
    #[serde(default)]
    pub forbidden_terms: Vec<String>,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            forbidden_terms: Vec::new(),
        }
    }
}

impl SubmissionPolicy {
    pub fn validate(&self, text: &str) -> Result<(), ValidationError> {
        validate(text, self.max_length, &self.forbidden_terms)
    }
}

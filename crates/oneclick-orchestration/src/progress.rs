//! Deployment progress state and its observer
//!
//! Progress is an immutable value: each transition consumes the previous
//! state and returns the next one, which keeps every transition testable on
//! its own.

use serde::Serialize;

/// Label of the single step reported when a template cannot be prepared
pub const PARSING_STEP_LABEL: &str = "Parsing the template";

/// Everything a consumer needs to render a run
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProgress {
    /// Step labels in execution order
    pub steps: Vec<String>,
    /// Index of the step currently running (equals `steps.len()` once all ran)
    pub current_step_index: usize,
    /// Failure message; empty when there is none
    pub error: String,
    /// Set once every step completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
}

impl DeploymentProgress {
    /// Preparation failed before any step existed
    pub fn parsing_failed(error: impl Into<String>) -> Self {
        Self {
            steps: vec![PARSING_STEP_LABEL.to_string()],
            current_step_index: 0,
            error: error.into(),
            success_message: None,
        }
    }

    /// A run is about to execute the given steps
    pub fn started(steps: Vec<String>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }

    /// The current step completed
    pub fn advanced(self) -> Self {
        Self {
            current_step_index: self.current_step_index + 1,
            ..self
        }
    }

    /// The current step failed; the index stays where it was
    pub fn failed(self, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..self
        }
    }

    /// Every step completed
    pub fn succeeded(self, message: impl Into<String>) -> Self {
        Self {
            success_message: Some(message.into()),
            ..self
        }
    }

    /// Whether the run ended with an error
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Whether the run reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.has_error() || self.success_message.is_some()
    }

    /// Label of the step at the current index, if any
    pub fn current_step(&self) -> Option<&str> {
        self.steps.get(self.current_step_index).map(String::as_str)
    }
}

/// Receives every progress transition of a run
///
/// Called synchronously, in order, once at start, once per completed step and
/// once on the terminal state.
pub trait ProgressObserver: Send + Sync {
    /// Handle a new progress state
    fn on_progress(&self, progress: &DeploymentProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&DeploymentProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &DeploymentProgress) {
        self(progress)
    }
}

//! Terminal rendering of deployment progress

use oneclick_orchestration::{DeploymentProgress, PARSING_STEP_LABEL, ProgressObserver};
use std::sync::Mutex;

/// Prints each progress transition to stdout
#[derive(Default)]
pub struct TerminalProgress {
    last_index: Mutex<Option<usize>>,
}

impl TerminalProgress {
    /// Create a renderer that has seen nothing yet
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&self, progress: &DeploymentProgress) {
        let mut last_index = match self.last_index.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in render(*last_index, progress) {
            println!("{}", line);
        }
        *last_index = Some(progress.current_step_index);
    }
}

/// Lines describing the transition from `previous_index` to `progress`
pub fn render(previous_index: Option<usize>, progress: &DeploymentProgress) -> Vec<String> {
    let mut lines = Vec::new();
    let total = progress.steps.len();

    if progress.has_error() && progress.steps == [PARSING_STEP_LABEL] {
        lines.push(format!("✗ {}", PARSING_STEP_LABEL));
        lines.push(format!("  Error: {}", progress.error));
        return lines;
    }

    if previous_index.is_none() {
        lines.push(format!("Running {} step(s)", total));
    }

    let from = previous_index.unwrap_or(0);
    for index in from..progress.current_step_index.min(total) {
        lines.push(format!("✓ [{}/{}] {}", index + 1, total, progress.steps[index]));
    }

    if progress.has_error() {
        let label = progress.current_step().unwrap_or_default();
        lines.push(format!(
            "✗ [{}/{}] {}",
            progress.current_step_index + 1,
            total,
            label
        ));
        lines.push(format!("  {}", progress.error));
    } else if let Some(message) = &progress.success_message {
        lines.push("✓ Deployment finished".to_string());
        if !message.is_empty() {
            lines.push(String::new());
            lines.push(message.clone());
        }
    } else if let Some(label) = progress.current_step() {
        lines.push(format!(
            "→ [{}/{}] {}...",
            progress.current_step_index + 1,
            total,
            label
        ));
    }

    lines
}

//! Sequential one-click deployment engine
//!
//! This module turns a template and its variable values into a flat list of
//! steps and runs them one after another, reporting progress after each
//! transition and stopping at the first failure.

use crate::{
    Error, Result,
    order::{OrderedService, order_by_dependency},
    platform::PlatformApi,
    progress::{DeploymentProgress, ProgressObserver},
    steps::{DeploymentStep, build_steps},
};
use chrono::{DateTime, Utc};
use oneclick_template::{OneClickTemplate, VariableValues, parser, resolve_template};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Phase of an orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationPhase {
    /// Resolving the template and building steps
    Parsing,
    /// Executing the step at the given index
    Running(usize),
    /// Every step completed
    Succeeded,
    /// Preparation or a step failed
    Failed,
}

/// Result of the parsing phase: everything needed to execute a run
#[derive(Debug)]
pub struct DeploymentPlan {
    /// Resolved template
    pub template: OneClickTemplate,
    /// Services in deployment order
    pub services: Vec<OrderedService>,
    /// Steps of every service, flattened in order
    pub steps: Vec<DeploymentStep>,
}

impl DeploymentPlan {
    /// Labels of every step
    pub fn step_labels(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.label().to_string()).collect()
    }

    /// Message shown after a successful run
    pub fn success_message(&self) -> &str {
        &self.template.one_click_app.instructions.end
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    /// Unique run id
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run reached its terminal state
    pub finished_at: DateTime<Utc>,
    /// Terminal phase, `Succeeded` or `Failed`
    pub phase: OrchestrationPhase,
    /// Last progress state reported to the observer
    pub progress: DeploymentProgress,
}

impl OrchestrationOutcome {
    /// Whether every step completed
    pub fn succeeded(&self) -> bool {
        self.phase == OrchestrationPhase::Succeeded
    }
}

/// Orchestrator deploying one-click templates through a [`PlatformApi`]
pub struct OneClickOrchestrator {
    api: Arc<dyn PlatformApi>,
}

impl OneClickOrchestrator {
    /// Create a new orchestrator
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        Self { api }
    }

    /// Resolve the template, order its services and build every step
    ///
    /// Performs no platform calls; the returned steps are thunks.
    pub fn plan(&self, template: &OneClickTemplate, values: &VariableValues) -> Result<DeploymentPlan> {
        parser::check_version(template)?;

        let resolved = resolve_template(template, values)?;
        let services = order_by_dependency(&resolved.services)?;
        debug!(
            "Deployment order: {:?}",
            services.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()
        );

        let namespace = values.app_name();
        let steps = services
            .iter()
            .flat_map(|service| {
                build_steps(&service.name, &service.definition, namespace, self.api.clone())
            })
            .collect();

        Ok(DeploymentPlan {
            template: resolved,
            services,
            steps,
        })
    }

    /// Run a full deployment
    ///
    /// Never fails: every error ends up in the progress state handed to the
    /// observer and in the returned outcome.
    pub async fn run(
        &self,
        template: &OneClickTemplate,
        values: &VariableValues,
        observer: &dyn ProgressObserver,
    ) -> OrchestrationOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Starting one-click deployment {} for '{}'", run_id, values.app_name());

        let finish = |phase: OrchestrationPhase, progress: DeploymentProgress| {
            OrchestrationOutcome {
                run_id,
                started_at,
                finished_at: Utc::now(),
                phase,
                progress,
            }
        };

        let plan = match self.plan(template, values) {
            Ok(plan) => plan,
            Err(e) => {
                let message = parsing_error_message(&e);
                warn!("Deployment {} failed while parsing: {}", run_id, message);
                let progress = DeploymentProgress::parsing_failed(message);
                observer.on_progress(&progress);
                return finish(OrchestrationPhase::Failed, progress);
            }
        };

        let success_message = plan.success_message().to_string();
        let mut progress = DeploymentProgress::started(plan.step_labels());
        observer.on_progress(&progress);

        for (index, step) in plan.steps.into_iter().enumerate() {
            let phase = OrchestrationPhase::Running(index);
            info!("[{:?}] {}", phase, step.label());

            match step.execute().await {
                Ok(()) => {
                    progress = progress.advanced();
                    observer.on_progress(&progress);
                }
                Err(e) => {
                    warn!("Deployment {} failed at step {}: {}", run_id, index, e);
                    progress = progress.failed(format!("Failed: {}", e));
                    observer.on_progress(&progress);
                    return finish(OrchestrationPhase::Failed, progress);
                }
            }
        }

        progress = progress.succeeded(success_message);
        observer.on_progress(&progress);
        info!("Deployment {} completed successfully", run_id);
        finish(OrchestrationPhase::Succeeded, progress)
    }
}

fn parsing_error_message(error: &Error) -> String {
    match error {
        Error::Template(oneclick_template::TemplateError::UnsupportedVersion { .. }) => {
            error.to_string()
        }
        Error::Template(e) => format!("Cannot parse the template: {}", e),
        other => other.to_string(),
    }
}

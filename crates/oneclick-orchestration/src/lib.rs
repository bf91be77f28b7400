//! # One-Click Orchestration
//!
//! Deploys a resolved one-click template onto the platform, one step at a
//! time.
//!
//! Services are ordered so that every service follows its dependencies, each
//! service is expanded into register/configure/deploy steps, and the steps run
//! strictly in sequence. Progress is reported to a [`ProgressObserver`] after
//! every transition; the first failing step ends the run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oneclick_orchestration::{DeploymentProgress, OneClickOrchestrator, PlatformApi};
//! use oneclick_template::{VariableValues, parser};
//! use std::sync::Arc;
//!
//! # async fn example(api: Arc<dyn PlatformApi>) -> Result<(), Box<dyn std::error::Error>> {
//! let template = parser::parse_file("wordpress.yml")?;
//! let values = VariableValues::new("blog").with_defaults(&template);
//!
//! let orchestrator = OneClickOrchestrator::new(api);
//! let outcome = orchestrator
//!     .run(&template, &values, &|progress: &DeploymentProgress| {
//!         println!("{}/{}", progress.current_step_index, progress.steps.len());
//!     })
//!     .await;
//! assert!(outcome.progress.error.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod order;
mod orchestrator;
mod platform;
mod progress;
mod steps;

pub use order::{OrderedService, order_by_dependency};
pub use orchestrator::{
    DeploymentPlan, OneClickOrchestrator, OrchestrationOutcome, OrchestrationPhase,
};
pub use platform::{
    AppDefinition, AppDefinitionsResponse, AppTag, CAPTAIN_DEFINITION_SCHEMA_VERSION,
    CaptainDefinition, EnvVar, PlatformApi, PortMapping, VolumeMount,
};
pub use progress::{DeploymentProgress, PARSING_STEP_LABEL, ProgressObserver};
pub use steps::{DeploymentStep, StepAction, build_steps, merge_service_definition};

/// Error types for orchestration operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Template errors (version, parse, validation)
    #[error(transparent)]
    Template(#[from] oneclick_template::TemplateError),

    /// Template declares no services
    #[error("Cannot parse the template. No services found!")]
    NoServices,

    /// Dependencies form a cycle or reference unknown services
    #[error(
        "Cannot parse the template. Dependency tree cannot be resolved. Infinite loop! Unresolved: {}",
        .unresolved.join(", ")
    )]
    UnresolvableDependencies {
        /// Services that could not be placed
        unresolved: Vec<String>,
    },

    /// App missing from the platform after registration
    #[error("Cannot find app definition for '{0}'")]
    AppNotFound(String),

    /// Platform API call failed
    #[error("{0}")]
    Api(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Create a platform API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }
}

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

//! Per-service deployment steps
//!
//! Every service becomes three steps: register, configure, deploy. Steps are
//! thunks; building them performs no platform calls.

use crate::{
    Error, Result,
    platform::{
        AppDefinition, AppTag, CaptainDefinition, EnvVar, PlatformApi, PortMapping, VolumeMount,
    },
};
use futures::future::BoxFuture;
use oneclick_template::ServiceDefinition;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Deferred step action, invoked once when its turn arrives
pub type StepAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send + 'static>;

/// One labelled step of a run
pub struct DeploymentStep {
    label: String,
    action: StepAction,
}

impl DeploymentStep {
    /// Create a step from a label and an async closure
    pub fn new<F, Fut>(label: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            action: Box::new(move || Box::pin(action()) as BoxFuture<'static, Result<()>>),
        }
    }

    /// Human readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run the step, consuming it
    pub async fn execute(self) -> Result<()> {
        (self.action)().await
    }
}

impl fmt::Debug for DeploymentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentStep")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Build the register, configure and deploy steps of one service
pub fn build_steps(
    service_name: &str,
    definition: &ServiceDefinition,
    namespace: &str,
    api: Arc<dyn PlatformApi>,
) -> Vec<DeploymentStep> {
    vec![
        register_step(service_name, definition, api.clone()),
        configure_step(service_name, definition, namespace, api.clone()),
        deploy_step(service_name, definition, api),
    ]
}

fn register_step(
    service_name: &str,
    definition: &ServiceDefinition,
    api: Arc<dyn PlatformApi>,
) -> DeploymentStep {
    let name = service_name.to_string();
    let has_persistent_data = definition.has_persistent_data();

    DeploymentStep::new(format!("Registering {}", name), move || async move {
        info!(
            "Registering '{}' (persistent data: {})",
            name, has_persistent_data
        );
        api.register(&name, has_persistent_data, false).await
    })
}

fn configure_step(
    service_name: &str,
    definition: &ServiceDefinition,
    namespace: &str,
    api: Arc<dyn PlatformApi>,
) -> DeploymentStep {
    let name = service_name.to_string();
    let definition = definition.clone();
    let namespace = namespace.to_string();

    DeploymentStep::new(
        format!(
            "Configuring {} (volumes, ports, environmental variables)",
            name
        ),
        move || async move {
            info!("Configuring '{}'", name);
            let response = api.fetch_all().await?;
            let mut app = response
                .app_definitions
                .into_iter()
                .find(|app| app.app_name == name)
                .ok_or_else(|| Error::AppNotFound(name.clone()))?;

            merge_service_definition(&mut app, &definition, &namespace);
            api.update(&name, &app).await
        },
    )
}

fn deploy_step(
    service_name: &str,
    definition: &ServiceDefinition,
    api: Arc<dyn PlatformApi>,
) -> DeploymentStep {
    let name = service_name.to_string();
    let descriptor = match &definition.image {
        Some(image) => CaptainDefinition::from_image(image.clone()),
        None => CaptainDefinition::from_dockerfile_lines(
            definition.extras.dockerfile_lines.clone().unwrap_or_default(),
        ),
    };

    DeploymentStep::new(
        format!("Deploying {} (might take up to a minute)", name),
        move || async move {
            info!("Deploying '{}'", name);
            api.deploy(&name, &descriptor).await
        },
    )
}

/// Merge a template service into a remote app definition
///
/// Volumes, ports and environment variables are appended, the namespace tag
/// is attached once, and extras only override the remote values when set.
pub fn merge_service_definition(
    app: &mut AppDefinition,
    service: &ServiceDefinition,
    namespace: &str,
) {
    app.volumes.extend(service.volumes.iter().map(|spec| parse_volume(spec)));
    app.ports.extend(service.ports.iter().map(|spec| parse_port(spec)));
    app.env_vars
        .extend(service.environment.iter().map(|(key, value)| EnvVar {
            key: key.clone(),
            value: value.clone(),
        }));

    if !namespace.is_empty() && !app.tags.iter().any(|t| t.tag_name == namespace) {
        app.tags.push(AppTag {
            tag_name: namespace.to_string(),
        });
    }

    if let Some(port) = service.extras.container_http_port() {
        app.container_http_port = Some(port);
    }
    if service.extras.not_expose_as_web_app() {
        app.not_expose_as_web_app = true;
    }
    if service.extras.websocket_support() {
        app.websocket_support = true;
    }

    debug!(
        "Merged '{}': {} volume(s), {} port(s), {} env var(s)",
        app.app_name,
        app.volumes.len(),
        app.ports.len(),
        app.env_vars.len()
    );
}

fn split_spec(spec: &str) -> (&str, &str) {
    spec.split_once(':').unwrap_or((spec, ""))
}

// `/data:/var/lib` is a host path, `data:/var/lib` a named volume.
fn parse_volume(spec: &str) -> VolumeMount {
    let (source, container_path) = split_spec(spec);
    let source = source.to_string();
    let (host_path, volume_name) = if source.starts_with('/') {
        (Some(source), None)
    } else {
        (None, Some(source))
    };
    VolumeMount {
        container_path: container_path.to_string(),
        host_path,
        volume_name,
    }
}

// Unparseable or out-of-range ports become 0.
fn parse_port(spec: &str) -> PortMapping {
    let (host, container) = split_spec(spec);
    PortMapping {
        host_port: parse_port_number(host, spec),
        container_port: parse_port_number(container, spec),
    }
}

fn parse_port_number(part: &str, spec: &str) -> u16 {
    let part = part.trim();
    if part.is_empty() {
        return 0;
    }
    match part.parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            warn!("Port '{}' in '{}' is not a valid port number, using 0", part, spec);
            0
        }
    }
}

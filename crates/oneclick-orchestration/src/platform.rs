//! Platform management API capability and its wire models
//!
//! The orchestrator only ever talks to the platform through [`PlatformApi`];
//! HTTP clients, dry-run implementations and test doubles all plug in here.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Schema version of the deployment descriptor
pub const CAPTAIN_DEFINITION_SCHEMA_VERSION: u32 = 2;

/// Management operations the orchestrator needs from the platform
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Register a new app
    ///
    /// `detached` asks the platform to return before registration finishes.
    async fn register(&self, app_name: &str, has_persistent_data: bool, detached: bool)
    -> Result<()>;

    /// Fetch every app definition
    async fn fetch_all(&self) -> Result<AppDefinitionsResponse>;

    /// Replace the definition of an app
    async fn update(&self, app_name: &str, definition: &AppDefinition) -> Result<()>;

    /// Deploy an app from a descriptor
    async fn deploy(&self, app_name: &str, definition: &CaptainDefinition) -> Result<()>;
}

/// Response of [`PlatformApi::fetch_all`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinitionsResponse {
    /// All registered apps
    #[serde(default)]
    pub app_definitions: Vec<AppDefinition>,

    /// Root domain apps are exposed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_domain: Option<String>,
}

/// Remote app definition
///
/// Fields the orchestrator does not touch are kept in `extra` so that an
/// update sends them back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinition {
    /// App name
    #[serde(default)]
    pub app_name: String,

    /// Whether the app keeps persistent data
    #[serde(default)]
    pub has_persistent_data: bool,

    /// Volume mounts
    #[serde(default)]
    pub volumes: Vec<VolumeMount>,

    /// Port mappings
    #[serde(default)]
    pub ports: Vec<PortMapping>,

    /// Environment variables
    #[serde(default)]
    pub env_vars: Vec<EnvVar>,

    /// Tags
    #[serde(default)]
    pub tags: Vec<AppTag>,

    /// Port the container serves HTTP on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_http_port: Option<u16>,

    /// Disable web exposure
    #[serde(default)]
    pub not_expose_as_web_app: bool,

    /// Enable websocket proxying
    #[serde(default)]
    pub websocket_support: bool,

    /// Everything else the platform sent
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Volume mount; exactly one of `host_path` / `volume_name` is set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Path inside the container
    pub container_path: String,

    /// Bind-mounted host path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,

    /// Named volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
}

/// Host to container port mapping
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    /// Port on the host
    pub host_port: u16,
    /// Port in the container
    pub container_port: u16,
}

/// Environment variable entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvVar {
    /// Name
    pub key: String,
    /// Value
    pub value: String,
}

/// App tag
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppTag {
    /// Tag name
    pub tag_name: String,
}

/// Minimal deployment descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptainDefinition {
    /// Descriptor schema version
    pub schema_version: u32,

    /// Image to deploy verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    /// Build lines used when there is no image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile_lines: Option<Vec<String>>,
}

impl CaptainDefinition {
    /// Descriptor deploying an image
    pub fn from_image(image_name: impl Into<String>) -> Self {
        Self {
            schema_version: CAPTAIN_DEFINITION_SCHEMA_VERSION,
            image_name: Some(image_name.into()),
            dockerfile_lines: None,
        }
    }

    /// Descriptor building from raw lines
    pub fn from_dockerfile_lines(lines: Vec<String>) -> Self {
        Self {
            schema_version: CAPTAIN_DEFINITION_SCHEMA_VERSION,
            image_name: None,
            dockerfile_lines: Some(lines),
        }
    }
}

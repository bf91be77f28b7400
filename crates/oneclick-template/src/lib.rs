//! # One-Click Templates
//!
//! Template document parser and variable resolver for one-click app bundles.
//!
//! A template describes a set of services (image or build lines, volumes,
//! ports, environment, dependencies) together with the variables the user
//! fills in before deployment. This crate parses and validates those
//! documents and resolves variable placeholders and random token directives.

#![warn(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod parser;
pub mod resolver;
mod scalar;

pub use resolver::{
    VariableValues, VariableViolation, expand_random_directives, resolve_template,
    resolve_variables, validate_values,
};

/// The only `captainVersion` this client understands
pub const SUPPORTED_CAPTAIN_VERSION: u32 = 4;

/// Prefix every variable id must start with
pub const VARIABLE_PREFIX: &str = "$$cap_";

/// Implicit variable holding the application name
pub const APP_NAME_VARIABLE: &str = "$$cap_appname";

/// Implicit variable holding the platform root domain
pub const ROOT_DOMAIN_VARIABLE: &str = "$$cap_root_domain";

/// Template error types
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Failed to read template file
    #[error("Failed to read template file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to parse or serialize JSON
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Template targets a version this client does not support
    #[error("Captain version {found} is not supported by this client (supported: {supported})")]
    UnsupportedVersion {
        /// Version declared by the template
        found: u64,
        /// Version this client supports
        supported: u32,
    },

    /// Invalid template
    #[error("Invalid template: {0}")]
    Validation(String),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Root template document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OneClickTemplate {
    /// Template schema version
    pub captain_version: u32,

    /// Service definitions in declaration order
    #[serde(default)]
    pub services: IndexMap<String, ServiceDefinition>,

    /// Bundle metadata, variables and instructions
    #[serde(rename = "caproverOneClickApp", default)]
    pub one_click_app: OneClickAppMeta,
}

impl OneClickTemplate {
    /// Look up a declared variable by id
    pub fn variable(&self, id: &str) -> Option<&Variable> {
        self.one_click_app.variables.iter().find(|v| v.id == id)
    }
}

/// One deployable service inside a template
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceDefinition {
    /// Container image; takes precedence over build lines
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar::optional_string"
    )]
    pub image: Option<String>,

    /// Volume specs (`hostPathOrVolumeName:containerPath`)
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "scalar::string_list"
    )]
    pub volumes: Vec<String>,

    /// Port specs (`hostPort:containerPort`)
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "scalar::string_list"
    )]
    pub ports: Vec<String>,

    /// Environment variables
    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        deserialize_with = "scalar::string_map"
    )]
    pub environment: IndexMap<String, String>,

    /// Services that must be deployed first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Platform specific settings
    #[serde(
        rename = "caproverExtra",
        default,
        skip_serializing_if = "ServiceExtras::is_default"
    )]
    pub extras: ServiceExtras,
}

impl ServiceDefinition {
    /// Services declaring volumes are registered as stateful
    pub fn has_persistent_data(&self) -> bool {
        !self.volumes.is_empty()
    }
}

/// Platform extras attached to a service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceExtras {
    /// Port the container serves HTTP on
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar::optional_string"
    )]
    pub container_http_port: Option<String>,

    /// `"true"` disables web exposure
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar::optional_string"
    )]
    pub not_expose_as_web_app: Option<String>,

    /// `"true"` enables websocket proxying
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar::optional_string"
    )]
    pub websocket_support: Option<String>,

    /// Raw build lines used when no image is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile_lines: Option<Vec<String>>,
}

impl ServiceExtras {
    fn is_default(&self) -> bool {
        self == &ServiceExtras::default()
    }

    /// Custom container HTTP port, if set to a non-zero number
    pub fn container_http_port(&self) -> Option<u16> {
        self.container_http_port
            .as_deref()
            .and_then(|p| p.trim().parse::<u16>().ok())
            .filter(|p| *p != 0)
    }

    /// Whether web exposure should be suppressed
    pub fn not_expose_as_web_app(&self) -> bool {
        self.not_expose_as_web_app.as_deref() == Some("true")
    }

    /// Whether websocket support should be enabled
    pub fn websocket_support(&self) -> bool {
        self.websocket_support.as_deref() == Some("true")
    }
}

/// Bundle metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OneClickAppMeta {
    /// Variables the user provides before deployment
    #[serde(default)]
    pub variables: Vec<Variable>,

    /// Messages shown before and after deployment
    #[serde(default)]
    pub instructions: Instructions,

    /// Human readable bundle name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Upstream documentation pointer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// Whether the bundle is maintained by the platform authors
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_official: bool,
}

/// Start/end instructions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Instructions {
    /// Shown before deployment starts
    #[serde(default)]
    pub start: String,
    /// Shown after a successful deployment
    #[serde(default)]
    pub end: String,
}

/// Template variable declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Placeholder token, starts with [`VARIABLE_PREFIX`]
    pub id: String,

    /// Human label
    #[serde(default)]
    pub label: String,

    /// Value used when the user leaves the field empty
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar::optional_string"
    )]
    pub default_value: Option<String>,

    /// Validation pattern, optionally wrapped in `/.../`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_regex: Option<String>,

    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

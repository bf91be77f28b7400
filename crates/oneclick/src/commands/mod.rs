pub mod deploy;
pub mod plan;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use oneclick::config::{ClientConfig, parse_variable_assignment};
use oneclick_template::{OneClickTemplate, VariableValues, parser};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Flags providing variable values
#[derive(Args, Debug, Clone)]
pub struct VariableArgs {
    /// Application name, used as namespace and `$$cap_appname`
    #[arg(short, long)]
    pub app_name: String,

    /// Variable value, repeatable (`--var db_pass=secret`)
    #[arg(long = "var", value_name = "ID=VALUE", value_parser = parse_variable_assignment)]
    pub vars: Vec<(String, String)>,

    /// Root domain apps are exposed under (`$$cap_root_domain`)
    #[arg(long)]
    pub root_domain: Option<String>,
}

impl VariableArgs {
    /// Collect values; explicit flags win over template defaults
    ///
    /// `fallback_root_domain` is used when `--root-domain` was not given.
    pub fn values(
        &self,
        template: &OneClickTemplate,
        fallback_root_domain: Option<&str>,
    ) -> VariableValues {
        let mut values = VariableValues::new(&self.app_name);
        if let Some(domain) = self.root_domain.as_deref().or(fallback_root_domain) {
            values = values.with_root_domain(domain);
        }
        for (id, value) in &self.vars {
            if template.variable(id).is_none() {
                warn!("Template does not declare variable {}", id);
            }
            values.set(id.clone(), value.clone());
        }
        values.with_defaults(template)
    }
}

/// Platform connection flags
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Client configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Platform base URL
    #[arg(long, env = "CAPTAIN_URL")]
    pub url: Option<String>,

    /// Platform password
    #[arg(long, env = "CAPTAIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Register apps without waiting for the platform
    #[arg(long)]
    pub detached: bool,
}

impl ConnectionArgs {
    /// Layer file, environment and flags into one configuration
    pub fn client_config(&self) -> Result<ClientConfig> {
        let file = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        Ok(file.merge(ClientConfig {
            url: self.url.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
            detached: self.detached.then_some(true),
        }))
    }
}

pub fn load_template(path: &Path) -> Result<OneClickTemplate> {
    parser::parse_file(path)
        .with_context(|| format!("Failed to load template {}", path.display()))
}

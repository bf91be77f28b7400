//! In-memory platform used by `deploy --dry-run`

use async_trait::async_trait;
use oneclick_orchestration::{
    AppDefinition, AppDefinitionsResponse, CaptainDefinition, Error, PlatformApi, Result,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Platform that records what a deployment would do
///
/// Registered apps are kept so later configure steps can look them up.
pub struct DryRunPlatform {
    root_domain: String,
    apps: Mutex<Vec<AppDefinition>>,
    journal: Mutex<Vec<String>>,
}

impl DryRunPlatform {
    /// Create an empty platform reporting the given root domain
    pub fn new(root_domain: impl Into<String>) -> Self {
        Self {
            root_domain: root_domain.into(),
            apps: Mutex::new(Vec::new()),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Descriptions of every call made so far
    pub fn journal(&self) -> Vec<String> {
        lock(&self.journal).clone()
    }

    /// Current definition of an app
    pub fn app(&self, app_name: &str) -> Option<AppDefinition> {
        lock(&self.apps)
            .iter()
            .find(|app| app.app_name == app_name)
            .cloned()
    }

    fn record(&self, entry: String) {
        info!("[dry-run] {}", entry);
        lock(&self.journal).push(entry);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl PlatformApi for DryRunPlatform {
    async fn register(
        &self,
        app_name: &str,
        has_persistent_data: bool,
        _detached: bool,
    ) -> Result<()> {
        let mut apps = lock(&self.apps);
        if apps.iter().any(|app| app.app_name == app_name) {
            return Err(Error::api(format!("App '{}' already exists", app_name)));
        }
        apps.push(AppDefinition {
            app_name: app_name.to_string(),
            has_persistent_data,
            ..Default::default()
        });
        drop(apps);

        self.record(format!(
            "register {} (persistent data: {})",
            app_name, has_persistent_data
        ));
        Ok(())
    }

    async fn fetch_all(&self) -> Result<AppDefinitionsResponse> {
        self.record("fetch app definitions".to_string());
        Ok(AppDefinitionsResponse {
            app_definitions: lock(&self.apps).clone(),
            root_domain: Some(self.root_domain.clone()),
        })
    }

    async fn update(&self, app_name: &str, definition: &AppDefinition) -> Result<()> {
        let mut apps = lock(&self.apps);
        let app = apps
            .iter_mut()
            .find(|app| app.app_name == app_name)
            .ok_or_else(|| Error::AppNotFound(app_name.to_string()))?;
        *app = definition.clone();
        drop(apps);

        self.record(format!(
            "update {}: {} volume(s), {} port(s), {} env var(s)",
            app_name,
            definition.volumes.len(),
            definition.ports.len(),
            definition.env_vars.len()
        ));
        Ok(())
    }

    async fn deploy(&self, app_name: &str, definition: &CaptainDefinition) -> Result<()> {
        let source = match (&definition.image_name, &definition.dockerfile_lines) {
            (Some(image), _) => format!("image {}", image),
            (None, Some(lines)) => format!("{} build line(s)", lines.len()),
            (None, None) => "nothing".to_string(),
        };
        self.record(format!("deploy {} from {}", app_name, source));
        Ok(())
    }
}

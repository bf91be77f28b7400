//! Recording platform double shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use oneclick_orchestration::{
    AppDefinition, AppDefinitionsResponse, CaptainDefinition, Error, PlatformApi, Result,
};
use std::sync::Mutex;

/// A platform call as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Register {
        app_name: String,
        has_persistent_data: bool,
    },
    FetchAll,
    Update {
        app_name: String,
        definition: AppDefinition,
    },
    Deploy {
        app_name: String,
        definition: CaptainDefinition,
    },
}

impl Call {
    pub fn app_name(&self) -> Option<&str> {
        match self {
            Call::Register { app_name, .. }
            | Call::Update { app_name, .. }
            | Call::Deploy { app_name, .. } => Some(app_name),
            Call::FetchAll => None,
        }
    }
}

/// In-memory platform recording every call
#[derive(Default)]
pub struct MockPlatform {
    calls: Mutex<Vec<Call>>,
    apps: Mutex<Vec<AppDefinition>>,
    fail_on_call: Option<usize>,
    skip_registration: bool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the n-th call (0-based, counting every method)
    pub fn failing_on_call(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Default::default()
        }
    }

    /// Accept registrations without storing the app
    pub fn forgetful() -> Self {
        Self {
            skip_registration: true,
            ..Default::default()
        }
    }

    /// Seed a pre-existing app
    pub fn with_app(self, app: AppDefinition) -> Self {
        self.apps.lock().unwrap().push(app);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(call);
        if self.fail_on_call == Some(index) {
            return Err(Error::api(format!("mock failure on call {}", index)));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn register(
        &self,
        app_name: &str,
        has_persistent_data: bool,
        _detached: bool,
    ) -> Result<()> {
        self.record(Call::Register {
            app_name: app_name.to_string(),
            has_persistent_data,
        })?;
        if !self.skip_registration {
            self.apps.lock().unwrap().push(AppDefinition {
                app_name: app_name.to_string(),
                has_persistent_data,
                ..Default::default()
            });
        }
        Ok(())
    }

    async fn fetch_all(&self) -> Result<AppDefinitionsResponse> {
        self.record(Call::FetchAll)?;
        Ok(AppDefinitionsResponse {
            app_definitions: self.apps.lock().unwrap().clone(),
            root_domain: Some("example.com".to_string()),
        })
    }

    async fn update(&self, app_name: &str, definition: &AppDefinition) -> Result<()> {
        self.record(Call::Update {
            app_name: app_name.to_string(),
            definition: definition.clone(),
        })?;
        let mut apps = self.apps.lock().unwrap();
        if let Some(app) = apps.iter_mut().find(|a| a.app_name == app_name) {
            *app = definition.clone();
        }
        Ok(())
    }

    async fn deploy(&self, app_name: &str, definition: &CaptainDefinition) -> Result<()> {
        self.record(Call::Deploy {
            app_name: app_name.to_string(),
            definition: definition.clone(),
        })
    }
}

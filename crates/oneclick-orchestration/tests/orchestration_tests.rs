//! Integration tests for sequential one-click deployment

mod common;

use common::{Call, MockPlatform};
use oneclick_orchestration::{
    CaptainDefinition, DeploymentProgress, OneClickOrchestrator, OrchestrationPhase,
    PARSING_STEP_LABEL,
};
use oneclick_template::{OneClickTemplate, VariableValues, parser};
use std::sync::{Arc, Mutex};

const BLOG: &str = r#"
captainVersion: 4
services:
  $$cap_appname:
    image: wordpress:latest
    depends_on:
      - $$cap_appname-db
    ports:
      - "8080:80"
    environment:
      WORDPRESS_DB_HOST: srv-captain--$$cap_appname-db
      WORDPRESS_DB_PASSWORD: $$cap_db_pass
  $$cap_appname-db:
    volumes:
      - $$cap_appname-db-data:/var/lib/mysql
    environment:
      MYSQL_ROOT_PASSWORD: $$cap_db_pass
    caproverExtra:
      dockerfileLines:
        - FROM mysql:8.0
        - EXPOSE 3306
caproverOneClickApp:
  instructions:
    start: A blog with its database.
    end: Visit http://$$cap_appname.$$cap_root_domain
  variables:
    - id: $$cap_db_pass
      label: Database password
      defaultValue: $$cap_gen_random_hex(12)
"#;

fn blog() -> (OneClickTemplate, VariableValues) {
    let template = parser::parse_str(BLOG).unwrap();
    let values = VariableValues::new("blog")
        .with_root_domain("example.com")
        .with_defaults(&template);
    (template, values)
}

fn single_service(depends_on: &str) -> OneClickTemplate {
    let yaml = format!(
        "captainVersion: 4\nservices:\n  app:\n    image: nginx\n    depends_on:\n      - {}\n",
        depends_on
    );
    parser::parse_str(&yaml).unwrap()
}

/// Records every progress state the orchestrator reports
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<DeploymentProgress>>,
}

impl Recorder {
    fn observe(&self, progress: &DeploymentProgress) {
        self.seen.lock().unwrap().push(progress.clone());
    }

    fn states(&self) -> Vec<DeploymentProgress> {
        self.seen.lock().unwrap().clone()
    }
}

#[smol_potat::test]
async fn test_successful_deployment() {
    let (template, values) = blog();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());
    let recorder = Recorder::default();

    let outcome = orchestrator
        .run(&template, &values, &|p: &DeploymentProgress| recorder.observe(p))
        .await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.phase, OrchestrationPhase::Succeeded);
    assert!(outcome.finished_at >= outcome.started_at);

    let progress = &outcome.progress;
    assert_eq!(progress.steps.len(), 6);
    assert_eq!(progress.current_step_index, 6);
    assert!(progress.error.is_empty());
    assert_eq!(
        progress.success_message.as_deref(),
        Some("Visit http://blog.example.com")
    );

    // start, one per step, terminal
    let states = recorder.states();
    assert_eq!(states.len(), 1 + 6 + 1);
    let indexes: Vec<_> = states.iter().map(|s| s.current_step_index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5, 6, 6]);
    assert_eq!(states.last(), Some(progress));

    assert_eq!(platform.call_count(), 8);
}

#[smol_potat::test]
async fn test_dependencies_deploy_first() {
    let (template, values) = blog();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    let outcome = orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;
    assert!(outcome.succeeded());

    assert_eq!(
        outcome.progress.steps,
        vec![
            "Registering blog-db",
            "Configuring blog-db (volumes, ports, environmental variables)",
            "Deploying blog-db (might take up to a minute)",
            "Registering blog",
            "Configuring blog (volumes, ports, environmental variables)",
            "Deploying blog (might take up to a minute)",
        ]
    );

    let order: Vec<_> = platform
        .calls()
        .iter()
        .filter_map(|c| c.app_name().map(str::to_string))
        .collect();
    assert_eq!(
        order,
        vec!["blog-db", "blog-db", "blog-db", "blog", "blog", "blog"]
    );
}

#[smol_potat::test]
async fn test_configure_merges_resolved_service() {
    let (template, values) = blog();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;

    let calls = platform.calls();
    assert_eq!(
        calls[0],
        Call::Register {
            app_name: "blog-db".to_string(),
            has_persistent_data: true,
        }
    );
    assert_eq!(
        calls[4],
        Call::Register {
            app_name: "blog".to_string(),
            has_persistent_data: false,
        }
    );

    let updates: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Update { definition, .. } => Some(definition.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 2);

    let db = &updates[0];
    assert_eq!(db.volumes[0].volume_name.as_deref(), Some("blog-db-data"));
    assert_eq!(db.volumes[0].container_path, "/var/lib/mysql");
    assert_eq!(db.tags.len(), 1);
    assert_eq!(db.tags[0].tag_name, "blog");

    let app = &updates[1];
    assert_eq!(app.ports[0].host_port, 8080);
    assert_eq!(app.ports[0].container_port, 80);
    let db_host = app
        .env_vars
        .iter()
        .find(|e| e.key == "WORDPRESS_DB_HOST")
        .unwrap();
    assert_eq!(db_host.value, "srv-captain--blog-db");

    // Both services share the single generated password
    let db_pass = &db.env_vars[0].value;
    assert_eq!(db_pass.len(), 12);
    let app_pass = app
        .env_vars
        .iter()
        .find(|e| e.key == "WORDPRESS_DB_PASSWORD")
        .unwrap();
    assert_eq!(&app_pass.value, db_pass);
}

#[smol_potat::test]
async fn test_image_and_dockerfile_descriptors() {
    let (template, values) = blog();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;

    let deploys: Vec<_> = platform
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Deploy {
                app_name,
                definition,
            } => Some((app_name, definition)),
            _ => None,
        })
        .collect();

    assert_eq!(
        deploys,
        vec![
            (
                "blog-db".to_string(),
                CaptainDefinition::from_dockerfile_lines(vec![
                    "FROM mysql:8.0".to_string(),
                    "EXPOSE 3306".to_string(),
                ])
            ),
            (
                "blog".to_string(),
                CaptainDefinition::from_image("wordpress:latest")
            ),
        ]
    );
}

#[smol_potat::test]
async fn test_failure_halts_the_run() {
    let (template, values) = blog();
    // register (0) succeeds, the configure step's fetch (1) fails
    let platform = Arc::new(MockPlatform::failing_on_call(1));
    let orchestrator = OneClickOrchestrator::new(platform.clone());
    let recorder = Recorder::default();

    let outcome = orchestrator
        .run(&template, &values, &|p: &DeploymentProgress| recorder.observe(p))
        .await;

    assert_eq!(outcome.phase, OrchestrationPhase::Failed);
    assert_eq!(outcome.progress.current_step_index, 1);
    assert_eq!(outcome.progress.error, "Failed: mock failure on call 1");
    assert!(outcome.progress.success_message.is_none());

    // No call after the failing one
    assert_eq!(platform.call_count(), 2);

    // start, step 0 completed, failure
    let states = recorder.states();
    assert_eq!(states.len(), 3);
    assert!(states[..2].iter().all(|s| s.error.is_empty()));
    assert!(states[2].has_error());
}

#[smol_potat::test]
async fn test_missing_app_fails_configure() {
    let (template, values) = blog();
    let platform = Arc::new(MockPlatform::forgetful());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    let outcome = orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.progress.current_step_index, 1);
    assert!(outcome.progress.error.starts_with("Failed: "));
    assert!(outcome.progress.error.contains("blog-db"));
    assert_eq!(platform.calls(), vec![
        Call::Register {
            app_name: "blog-db".to_string(),
            has_persistent_data: true,
        },
        Call::FetchAll,
    ]);
}

#[smol_potat::test]
async fn test_unsupported_version_makes_no_calls() {
    let (mut template, values) = blog();
    template.captain_version = 3;
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());
    let recorder = Recorder::default();

    let outcome = orchestrator
        .run(&template, &values, &|p: &DeploymentProgress| recorder.observe(p))
        .await;

    assert_eq!(outcome.phase, OrchestrationPhase::Failed);
    assert_eq!(outcome.progress.steps, vec![PARSING_STEP_LABEL]);
    assert_eq!(outcome.progress.current_step_index, 0);
    assert!(outcome.progress.error.contains("Captain version 3"));
    assert_eq!(recorder.states().len(), 1);
    assert_eq!(platform.call_count(), 0);
}

#[smol_potat::test]
async fn test_unresolvable_dependencies_make_no_calls() {
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());
    let values = VariableValues::new("x");

    for template in [single_service("app"), single_service("missing")] {
        let outcome = orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;
        assert_eq!(outcome.progress.steps, vec![PARSING_STEP_LABEL]);
        assert!(
            outcome
                .progress
                .error
                .contains("Dependency tree cannot be resolved. Infinite loop!")
        );
    }

    assert_eq!(platform.call_count(), 0);
}

#[smol_potat::test]
async fn test_no_services_makes_no_calls() {
    let template = parser::parse_str("captainVersion: 4\nservices: {}\n").unwrap();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    let outcome = orchestrator
        .run(&template, &VariableValues::new("x"), &|_: &DeploymentProgress| {})
        .await;

    assert_eq!(
        outcome.progress.error,
        "Cannot parse the template. No services found!"
    );
    assert_eq!(platform.call_count(), 0);
}

#[smol_potat::test]
async fn test_empty_service_deploys_from_empty_lines() {
    let template = parser::parse_str("captainVersion: 4\nservices:\n  db: {}\n").unwrap();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    let outcome = orchestrator
        .run(&template, &VariableValues::new("x"), &|_: &DeploymentProgress| {})
        .await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.progress.success_message.as_deref(), Some(""));
    assert_eq!(
        platform.calls().last(),
        Some(&Call::Deploy {
            app_name: "db".to_string(),
            definition: CaptainDefinition::from_dockerfile_lines(vec![]),
        })
    );
}

#[smol_potat::test]
async fn test_existing_tag_is_not_duplicated() {
    let template = parser::parse_str("captainVersion: 4\nservices:\n  web:\n    image: nginx\n").unwrap();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    // Running twice registers twice; the mock keeps both, the first wins the lookup
    let values = VariableValues::new("web");
    orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;
    orchestrator.run(&template, &values, &|_: &DeploymentProgress| {}).await;

    let updates: Vec<_> = platform
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Update { definition, .. } => Some(definition),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[1].tags.len(), 1);
    assert_eq!(updates[1].tags[0].tag_name, "web");
}

#[test]
fn test_plan_performs_no_calls() {
    let (template, values) = blog();
    let platform = Arc::new(MockPlatform::new());
    let orchestrator = OneClickOrchestrator::new(platform.clone());

    let mut plan = orchestrator.plan(&template, &values).unwrap();
    assert_eq!(plan.steps.len(), 6);
    assert_eq!(plan.services[0].name, "blog-db");
    assert_eq!(plan.success_message(), "Visit http://blog.example.com");
    assert_eq!(platform.call_count(), 0);

    // Steps only call the platform once executed
    smol::block_on(plan.steps.remove(0).execute()).unwrap();
    assert_eq!(platform.call_count(), 1);
}

use super::{ConnectionArgs, VariableArgs, load_template};
use anyhow::{Context, Result, bail};
use oneclick::{client::CaptainClient, dry_run::DryRunPlatform, progress::TerminalProgress};
use oneclick_orchestration::{OneClickOrchestrator, PlatformApi};
use oneclick_template::{resolve_variables, validate_values};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Root domain reported by the dry-run platform
const DRY_RUN_ROOT_DOMAIN: &str = "captain.localhost";

pub async fn run(
    template_path: &Path,
    args: &VariableArgs,
    connection: &ConnectionArgs,
    dry_run: bool,
) -> Result<()> {
    let template = load_template(template_path)?;

    let mut dry_run_platform = None;
    let api: Arc<dyn PlatformApi> = if dry_run {
        let platform = Arc::new(DryRunPlatform::new(
            args.root_domain.as_deref().unwrap_or(DRY_RUN_ROOT_DOMAIN),
        ));
        dry_run_platform = Some(platform.clone());
        platform
    } else {
        let settings = connection.client_config()?.into_connection()?;
        let client = CaptainClient::login(&settings.url, &settings.password, settings.timeout)
            .await
            .with_context(|| format!("Failed to log in to {}", settings.url))?;
        Arc::new(client.with_detached(settings.detached))
    };

    let root_domain = match &args.root_domain {
        Some(domain) => Some(domain.clone()),
        None => {
            let response = api
                .fetch_all()
                .await
                .context("Failed to query the platform root domain")?;
            response.root_domain
        }
    };
    info!("Root domain: {:?}", root_domain);

    // Expanded once so the printed instructions and the deployment agree.
    let values = args
        .values(&template, root_domain.as_deref())
        .expand_directives();
    let violations = validate_values(&template, &values);
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!(
                "✗ {} ({}): {}",
                violation.label, violation.id, violation.reason
            );
        }
        bail!("{} variable(s) failed validation", violations.len());
    }

    let start = &template.one_click_app.instructions.start;
    if !start.is_empty() {
        println!("{}\n", resolve_variables(start, &values.substitutions(&template)));
    }

    let orchestrator = OneClickOrchestrator::new(api);
    let outcome = orchestrator
        .run(&template, &values, &TerminalProgress::new())
        .await;

    if let Some(platform) = dry_run_platform {
        println!("\nDry run, nothing was changed. Calls that would have been made:");
        for entry in platform.journal() {
            println!("  {}", entry);
        }
    }

    if !outcome.succeeded() {
        bail!("Deployment of '{}' failed", values.app_name());
    }
    info!(
        "Deployment {} took {}s",
        outcome.run_id,
        (outcome.finished_at - outcome.started_at).num_seconds()
    );
    Ok(())
}

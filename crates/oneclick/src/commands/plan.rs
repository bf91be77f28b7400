use super::{VariableArgs, load_template};
use anyhow::Result;
use comfy_table::{Cell, Table};
use oneclick::dry_run::DryRunPlatform;
use oneclick_orchestration::OneClickOrchestrator;
use oneclick_template::validate_values;
use std::path::Path;
use std::sync::Arc;

pub async fn run(template_path: &Path, args: &VariableArgs) -> Result<()> {
    let template = load_template(template_path)?;
    let values = args.values(&template, None);

    for violation in validate_values(&template, &values) {
        println!(
            "  ⚠ {} ({}): {}",
            violation.label, violation.id, violation.reason
        );
    }

    // Planning never touches the platform
    let platform = Arc::new(DryRunPlatform::new(
        args.root_domain.clone().unwrap_or_default(),
    ));
    let plan = OneClickOrchestrator::new(platform).plan(&template, &values)?;

    println!("Deployment plan for '{}'", values.app_name());

    let mut table = Table::new();
    table.set_header(vec!["#", "Service", "Source", "Depends on"]);
    for (i, service) in plan.services.iter().enumerate() {
        let definition = &service.definition;
        let source = match (&definition.image, &definition.extras.dockerfile_lines) {
            (Some(image), _) => image.clone(),
            (None, Some(lines)) => format!("{} build line(s)", lines.len()),
            (None, None) => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&service.name),
            Cell::new(source),
            Cell::new(definition.depends_on.join(", ")),
        ]);
    }
    println!("{}", table);

    println!("\nSteps:");
    for (i, label) in plan.step_labels().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, label);
    }

    if !plan.success_message().is_empty() {
        println!("\nAfter deployment:\n{}", plan.success_message());
    }

    Ok(())
}

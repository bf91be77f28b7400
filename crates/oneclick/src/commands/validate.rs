use super::load_template;
use anyhow::Result;
use comfy_table::{Cell, Table};
use oneclick_orchestration::order_by_dependency;
use std::path::Path;

pub async fn run(template_path: &Path) -> Result<()> {
    println!("Validating {}...", template_path.display());

    // Version and schema are checked while parsing
    let template = load_template(template_path)?;
    let app = &template.one_click_app;

    println!("✓ Template valid");
    println!("  Captain version: {}", template.captain_version);
    if let Some(name) = &app.display_name {
        println!("  Name: {}", name);
    }
    if let Some(description) = &app.description {
        println!("  Description: {}", description);
    }
    println!("  Services: {}", template.services.len());
    println!("  Variables: {}", app.variables.len());

    if !app.variables.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Variable", "Label", "Default", "Pattern"]);
        for variable in &app.variables {
            table.add_row(vec![
                Cell::new(&variable.id),
                Cell::new(&variable.label),
                Cell::new(variable.default_value.as_deref().unwrap_or("-")),
                Cell::new(variable.valid_regex.as_deref().unwrap_or("-")),
            ]);
        }
        println!("\n{}", table);
    }

    let ordered = order_by_dependency(&template.services)?;
    println!("\nDeployment order:");
    for (i, service) in ordered.iter().enumerate() {
        if service.definition.depends_on.is_empty() {
            println!("  {}. {}", i + 1, service.name);
        } else {
            println!(
                "  {}. {} (after {})",
                i + 1,
                service.name,
                service.definition.depends_on.join(", ")
            );
        }
    }

    Ok(())
}

//! Template parser and validation

use crate::{OneClickTemplate, Result, SUPPORTED_CAPTAIN_VERSION, TemplateError, VARIABLE_PREFIX};
use std::collections::HashSet;
use std::path::Path;

/// Parse a template file (YAML or JSON)
pub fn parse_file(path: impl AsRef<Path>) -> Result<OneClickTemplate> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse a template from YAML (or JSON) text
///
/// The version is checked on the raw document before the rest of the schema
/// is interpreted, so templates written for another version are rejected
/// with a version error rather than a schema error.
pub fn parse_str(content: &str) -> Result<OneClickTemplate> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;
    check_document_version(&document)?;
    let template: OneClickTemplate = serde_yaml::from_value(document)?;
    validate_template(&template)?;
    Ok(template)
}

/// Parse a template from JSON text
pub fn parse_json(content: &str) -> Result<OneClickTemplate> {
    let template: OneClickTemplate = serde_json::from_str(content)?;
    validate_template(&template)?;
    Ok(template)
}

/// Serialize a template to JSON text
pub fn to_json(template: &OneClickTemplate) -> Result<String> {
    Ok(serde_json::to_string(template)?)
}

/// Reject templates targeting an unsupported version
pub fn check_version(template: &OneClickTemplate) -> Result<()> {
    if template.captain_version != SUPPORTED_CAPTAIN_VERSION {
        return Err(TemplateError::UnsupportedVersion {
            found: u64::from(template.captain_version),
            supported: SUPPORTED_CAPTAIN_VERSION,
        });
    }
    Ok(())
}

fn check_document_version(document: &serde_yaml::Value) -> Result<()> {
    let version = document
        .get("captainVersion")
        .ok_or_else(|| TemplateError::Validation("Missing captainVersion".to_string()))?;

    let found = match version {
        serde_yaml::Value::Number(n) => n.as_u64(),
        serde_yaml::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        TemplateError::Validation(format!("captainVersion must be an integer, got {:?}", version))
    })?;

    if found != u64::from(SUPPORTED_CAPTAIN_VERSION) {
        return Err(TemplateError::UnsupportedVersion {
            found,
            supported: SUPPORTED_CAPTAIN_VERSION,
        });
    }
    Ok(())
}

/// Validate a parsed template
pub fn validate_template(template: &OneClickTemplate) -> Result<()> {
    check_version(template)?;

    let mut seen = HashSet::new();
    for variable in &template.one_click_app.variables {
        if !variable.id.starts_with(VARIABLE_PREFIX) {
            return Err(TemplateError::Validation(format!(
                "Variable '{}' must start with '{}'",
                variable.id, VARIABLE_PREFIX
            )));
        }
        if !seen.insert(variable.id.as_str()) {
            return Err(TemplateError::Validation(format!(
                "Variable '{}' is declared more than once",
                variable.id
            )));
        }
    }

    for name in template.services.keys() {
        if name.trim().is_empty() {
            return Err(TemplateError::Validation(
                "Service names must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

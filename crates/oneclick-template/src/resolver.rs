//! Variable and directive resolver
//!
//! This module handles resolution of:
//! - Variables: literal `$$cap_*` tokens replaced by user or implicit values
//! - Random directives: `$$cap_gen_random_hex(N)` replaced by N random hex chars

use crate::{APP_NAME_VARIABLE, OneClickTemplate, ROOT_DOMAIN_VARIABLE, Result, parser};
use indexmap::IndexMap;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, digit1},
    sequence::delimited,
};
use rand::Rng;
use regex::Regex;
use tracing::{debug, warn};

/// Opening of a random hex directive
pub const RANDOM_HEX_DIRECTIVE: &str = "$$cap_gen_random_hex(";

/// Longest random hex token a directive may request
pub const MAX_RANDOM_HEX_LENGTH: usize = 256;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Values collected for one deployment attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableValues {
    values: IndexMap<String, String>,
}

impl VariableValues {
    /// Create values for the given application name
    pub fn new(app_name: impl Into<String>) -> Self {
        let mut values = IndexMap::new();
        values.insert(APP_NAME_VARIABLE.to_string(), app_name.into());
        Self { values }
    }

    /// Add the platform root domain
    pub fn with_root_domain(mut self, root_domain: impl Into<String>) -> Self {
        self.set(ROOT_DOMAIN_VARIABLE, root_domain);
        self
    }

    /// Add or update a value
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(id.into(), value.into());
    }

    /// Get a value
    pub fn get(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    /// Application name (empty if never set)
    pub fn app_name(&self) -> &str {
        self.get(APP_NAME_VARIABLE).unwrap_or_default()
    }

    /// Root domain, if supplied
    pub fn root_domain(&self) -> Option<&str> {
        self.get(ROOT_DOMAIN_VARIABLE)
    }

    /// Iterate over collected values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fill declared variables that have no value from their defaults
    pub fn with_defaults(mut self, template: &OneClickTemplate) -> Self {
        for variable in &template.one_click_app.variables {
            if self.values.contains_key(&variable.id) {
                continue;
            }
            if let Some(default) = &variable.default_value {
                self.values.insert(variable.id.clone(), default.clone());
            }
        }
        self
    }

    /// Replace random directives inside values with generated tokens
    ///
    /// Afterwards every use of a value, including the start instructions,
    /// sees the same token.
    pub fn expand_directives(mut self) -> Self {
        for value in self.values.values_mut() {
            if value.contains(RANDOM_HEX_DIRECTIVE) {
                *value = expand_random_directives(value);
            }
        }
        self
    }

    /// Substitution map for a template: declared ids plus the implicit ones
    pub fn substitutions(&self, template: &OneClickTemplate) -> IndexMap<String, Option<String>> {
        let mut map: IndexMap<String, Option<String>> = template
            .one_click_app
            .variables
            .iter()
            .map(|v| (v.id.clone(), self.get(&v.id).map(str::to_string)))
            .collect();

        map.insert(
            APP_NAME_VARIABLE.to_string(),
            Some(self.app_name().to_string()),
        );
        if let Some(root_domain) = self.root_domain() {
            map.insert(ROOT_DOMAIN_VARIABLE.to_string(), Some(root_domain.to_string()));
        }
        map
    }
}

/// Replace every literal occurrence of each id with its value
///
/// Each id is replaced in a single pass over the text; absent values
/// resolve to the empty string. Longer ids go first so an id that is a
/// prefix of another never eats into the longer token.
pub fn resolve_variables(text: &str, values: &IndexMap<String, Option<String>>) -> String {
    let mut entries: Vec<_> = values.iter().collect();
    entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));

    let mut result = text.to_string();
    for (id, value) in entries {
        if id.is_empty() || !result.contains(id.as_str()) {
            continue;
        }
        result = result.replace(id.as_str(), value.as_deref().unwrap_or_default());
    }
    result
}

/// Parse `$$cap_gen_random_hex(<digits>)` at the start of the input
fn random_hex_directive(input: &str) -> IResult<&str, &str> {
    delimited(tag(RANDOM_HEX_DIRECTIVE), digit1, char(')')).parse(input)
}

fn random_hex_token(rng: &mut impl Rng, digits: &str) -> String {
    let length = match digits.parse::<usize>() {
        Ok(length) if length <= MAX_RANDOM_HEX_LENGTH => length,
        _ => {
            warn!(
                "Random hex length {} exceeds {}, substituting an empty string",
                digits, MAX_RANDOM_HEX_LENGTH
            );
            return String::new();
        }
    };

    (0..length)
        .map(|_| HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char)
        .collect()
}

/// Replace every random hex directive with a fresh token
///
/// Directives are resolved leftmost first, each with an independent random
/// value. A directive with a non-numeric argument is left as literal text.
pub fn expand_random_directives(text: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(RANDOM_HEX_DIRECTIVE) {
        output.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match random_hex_directive(candidate) {
            Ok((remaining, digits)) => {
                output.push_str(&random_hex_token(&mut rng, digits));
                rest = remaining;
            }
            Err(_) => {
                output.push_str(RANDOM_HEX_DIRECTIVE);
                rest = &candidate[RANDOM_HEX_DIRECTIVE.len()..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Resolve all variables and directives of a template
///
/// The template is serialized to JSON, substituted textually and parsed
/// again. The variable declarations themselves are kept out of the
/// substitution so the resolved template still describes its inputs.
pub fn resolve_template(
    template: &OneClickTemplate,
    values: &VariableValues,
) -> Result<OneClickTemplate> {
    parser::check_version(template)?;

    // A value is generated once and shared by every place the variable appears.
    let substitutions: IndexMap<String, Option<String>> = values
        .substitutions(template)
        .into_iter()
        .map(|(id, value)| (id, value.map(|v| expand_random_directives(&v))))
        .collect();
    let mut working = template.clone();
    let variables = std::mem::take(&mut working.one_click_app.variables);

    let text = parser::to_json(&working)?;
    let substituted = resolve_variables(&text, &substitutions);
    let expanded = expand_random_directives(&substituted);
    debug!("Resolved template text: {} bytes", expanded.len());

    let mut resolved: OneClickTemplate = serde_json::from_str(&expanded)?;
    resolved.one_click_app.variables = variables;
    parser::validate_template(&resolved)?;
    Ok(resolved)
}

/// A variable whose value failed its validation pattern
#[derive(Debug, Clone, PartialEq)]
pub struct VariableViolation {
    /// Variable id
    pub id: String,
    /// Variable label
    pub label: String,
    /// Why the value was rejected
    pub reason: String,
}

/// Check collected values against each variable's `validRegex`
pub fn validate_values(template: &OneClickTemplate, values: &VariableValues) -> Vec<VariableViolation> {
    let mut violations = Vec::new();

    for variable in &template.one_click_app.variables {
        let Some(raw_pattern) = &variable.valid_regex else {
            continue;
        };
        let pattern = strip_regex_delimiters(raw_pattern);
        let value = values.get(&variable.id).unwrap_or_default();

        let reason = match Regex::new(pattern) {
            Ok(re) if re.is_match(value) => continue,
            Ok(_) => format!("value {:?} does not match {}", value, raw_pattern),
            Err(e) => format!("invalid validation pattern {}: {}", raw_pattern, e),
        };

        violations.push(VariableViolation {
            id: variable.id.clone(),
            label: variable.label.clone(),
            reason,
        });
    }

    violations
}

// Templates carry JavaScript style `/pattern/` literals.
fn strip_regex_delimiters(pattern: &str) -> &str {
    pattern
        .strip_prefix('/')
        .and_then(|p| p.strip_suffix('/'))
        .unwrap_or(pattern)
}

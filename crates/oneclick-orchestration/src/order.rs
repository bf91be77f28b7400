//! Dependency ordering of template services

use crate::{Error, Result};
use indexmap::IndexMap;
use oneclick_template::ServiceDefinition;
use std::collections::HashSet;
use tracing::debug;

/// A service placed in deployment order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedService {
    /// Service name
    pub name: String,
    /// Service definition
    pub definition: ServiceDefinition,
}

/// Order services so each one follows all of its dependencies
///
/// Works in rounds: every round scans the services not yet placed in
/// declaration order and places those whose dependencies are all placed.
/// Services that become eligible in the same round keep their declaration
/// order. A round that places nothing means the remaining services form a
/// cycle or depend on names that do not exist.
pub fn order_by_dependency(
    services: &IndexMap<String, ServiceDefinition>,
) -> Result<Vec<OrderedService>> {
    if services.is_empty() {
        return Err(Error::NoServices);
    }

    let mut placed: HashSet<&str> = HashSet::with_capacity(services.len());
    let mut ordered = Vec::with_capacity(services.len());
    let max_rounds = services.len() + 1;

    for round in 1..=max_rounds {
        let mut placed_this_round = 0;

        for (name, definition) in services {
            if placed.contains(name.as_str()) {
                continue;
            }
            let ready = definition
                .depends_on
                .iter()
                .all(|dep| placed.contains(dep.as_str()));
            if ready {
                placed.insert(name.as_str());
                ordered.push(OrderedService {
                    name: name.clone(),
                    definition: definition.clone(),
                });
                placed_this_round += 1;
            }
        }

        if ordered.len() == services.len() {
            debug!("Resolved deployment order in {} round(s)", round);
            return Ok(ordered);
        }
        if placed_this_round == 0 {
            break;
        }
    }

    let unresolved = services
        .keys()
        .filter(|name| !placed.contains(name.as_str()))
        .cloned()
        .collect();
    Err(Error::UnresolvableDependencies { unresolved })
}

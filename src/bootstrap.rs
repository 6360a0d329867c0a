//! Bootstrap helpers for registering the catalog and seeding layouts.
//!
//! Hosts call these once at startup: push the area and definition catalog
//! into the widget store, mirror definitions into the registry, and create
//! the starter widget assignments.

use crate::registry::Registry;
use crate::service::{AddWidgetRequest, Service};
use crate::store::WidgetStore;
use crate::{DashboardError, WidgetAreaDefinition, WidgetDefinition};

/// Ensures every area in `areas` exists in the store.
pub async fn register_areas(
    store: &dyn WidgetStore,
    areas: &[WidgetAreaDefinition],
) -> Result<(), DashboardError> {
    for area in areas {
        store
            .ensure_area(area)
            .await
            .map_err(|err| DashboardError::Store(format!("register area {}: {}", area.code, err)))?;
    }
    Ok(())
}

/// Ensures every definition exists in the store, mirroring each into the
/// registry when one is supplied.
pub async fn register_definitions(
    store: &dyn WidgetStore,
    registry: Option<&Registry>,
    definitions: &[WidgetDefinition],
) -> Result<(), DashboardError> {
    for def in definitions {
        store.ensure_definition(def).await.map_err(|err| {
            DashboardError::Store(format!("register definition {}: {}", def.code, err))
        })?;
        if let Some(registry) = registry {
            registry.register_definition(def.clone())?;
        }
    }
    Ok(())
}

/// Failures accumulated while seeding starter widgets.
///
/// Seeding keeps going past individual failures so one broken seed request
/// does not block the rest of the dashboard.
#[derive(Debug, thiserror::Error)]
#[error("seeding failed for {} widget request(s)", .failures.len())]
pub struct SeedError {
    /// Definition code and error for each failed request.
    pub failures: Vec<(String, DashboardError)>,
}

/// Creates the starter widget assignments through the service.
pub async fn seed_layout(
    service: &Service,
    requests: Vec<AddWidgetRequest>,
) -> Result<(), SeedError> {
    let mut failures = Vec::new();
    for request in requests {
        let code = request.definition_code.clone();
        if let Err(err) = service.add_widget(request).await {
            tracing::warn!(definition = %code, error = %err, "seed request failed");
            failures.push((code, err));
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SeedError { failures })
    }
}

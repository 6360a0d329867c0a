//! Orchestration service: widget lifecycle and layout resolution.
//!
//! The service composes the registry, the external widget store, the
//! authorizer, the preference store, the validator, and the refresh hook
//! into the full widget lifecycle (add/update/remove/reorder) and the
//! read-side layout pipeline.
//!
//! Every read of a `(viewer, area)` pair runs the same fixed pipeline:
//!
//! 1. fetch the raw assignment from the store,
//! 2. drop instances the authorizer rejects (unauthorized instances never
//!    reach a provider),
//! 3. enrich survivors through their registered provider (failures are
//!    per-widget and non-fatal),
//! 4. apply the viewer's order override,
//! 5. apply the viewer's row layout,
//! 6. remove hidden instances.
//!
//! Hiding happens last so hidden widgets still participate in ordering and
//! row bookkeeping for edit-time UI consistency, but never reach the final
//! payload.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::broadcast::{NoopRefreshHook, RefreshHook};
use crate::preferences::{normalize_overrides, InMemoryPreferenceStore, PreferenceStore};
use crate::providers::{default_area_definitions, WidgetContext};
use crate::registry::Registry;
use crate::store::{
    AssignWidgetInput, CreateWidgetInstanceInput, ReorderAreaInput, ResolveAreaInput, ResolvedArea,
    UpdateWidgetInstanceInput, WidgetStore,
};
use crate::telemetry::{NoopTelemetry, Telemetry};
use crate::validation::{ConfigValidator, SchemaValidator};
use crate::{
    clamp_slot_width, ChangeReason, ConfigMap, DashboardError, Layout, LayoutOverrides, LayoutRow,
    ViewerContext, WidgetAreaDefinition, WidgetEvent, WidgetInstance, WidgetVisibility,
};

#[cfg(test)]
mod tests;

/// Metadata key enrichment writes provider output under.
pub const DATA_KEY: &str = "data";

/// Metadata key the row-layout step writes `{row, column, width}` under.
pub const LAYOUT_KEY: &str = "layout";

/// Decides whether a viewer may see a widget instance.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns `true` when `viewer` may see `instance`.
    async fn can_view_widget(&self, viewer: &ViewerContext, instance: &WidgetInstance) -> bool;
}

/// Authorizer that permits everything. The default when none is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAuthorizer;

#[async_trait]
impl Authorizer for AllowAllAuthorizer {
    async fn can_view_widget(&self, _viewer: &ViewerContext, _instance: &WidgetInstance) -> bool {
        true
    }
}

/// Data required to create and place a widget instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddWidgetRequest {
    /// Definition the new instance renders. Required.
    pub definition_code: String,
    /// Area the new instance is placed in. Required.
    pub area_code: String,
    /// Instance configuration, validated against the definition schema.
    #[serde(default)]
    pub configuration: ConfigMap,
    /// Position within the area; `None` appends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Roles allowed to see the widget.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Audience segments the widget targets.
    #[serde(default)]
    pub audience: Vec<String>,
    /// Earliest visibility time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Latest visibility time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Acting user, recorded in telemetry.
    #[serde(default)]
    pub user_id: String,
}

/// Payload for updating an existing widget instance.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWidgetRequest {
    /// Replacement configuration, validated before persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ConfigMap>,
    /// Replacement metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConfigMap>,
    /// Acting user, recorded in telemetry.
    #[serde(default)]
    pub user_id: String,
}

/// Collaborators the service composes. Absent optional collaborators default
/// to permissive/no-op implementations; only the widget store has no default.
pub struct ServiceOptions {
    /// External persistence for instances and assignments.
    pub widget_store: Option<Arc<dyn WidgetStore>>,
    /// Visibility gate; defaults to [`AllowAllAuthorizer`].
    pub authorizer: Option<Arc<dyn Authorizer>>,
    /// Per-viewer overrides; defaults to [`InMemoryPreferenceStore`].
    pub preference_store: Option<Arc<dyn PreferenceStore>>,
    /// Definition/provider registry; defaults to an empty registry.
    pub registry: Option<Arc<Registry>>,
    /// Change notification sink; defaults to [`NoopRefreshHook`].
    pub refresh_hook: Option<Arc<dyn RefreshHook>>,
    /// Observability sink; defaults to [`NoopTelemetry`].
    pub telemetry: Option<Arc<dyn Telemetry>>,
    /// Configuration gate; defaults to [`SchemaValidator`].
    pub validator: Option<Arc<dyn ConfigValidator>>,
    /// Canonical working set of areas resolved by `configure_layout`.
    /// Defaults to the three built-in areas.
    pub areas: Vec<WidgetAreaDefinition>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            widget_store: None,
            authorizer: None,
            preference_store: None,
            registry: None,
            refresh_hook: None,
            telemetry: None,
            validator: None,
            areas: default_area_definitions(),
        }
    }
}

/// Facade hosts use to orchestrate dashboard behavior.
pub struct Service {
    widget_store: Option<Arc<dyn WidgetStore>>,
    authorizer: Arc<dyn Authorizer>,
    preferences: Arc<dyn PreferenceStore>,
    registry: Arc<Registry>,
    refresh_hook: Arc<dyn RefreshHook>,
    telemetry: Arc<dyn Telemetry>,
    validator: Arc<dyn ConfigValidator>,
    areas: Vec<WidgetAreaDefinition>,
}

impl Service {
    /// Builds a service, defaulting absent collaborators to null objects.
    pub fn new(opts: ServiceOptions) -> Self {
        Self {
            widget_store: opts.widget_store,
            authorizer: opts.authorizer.unwrap_or_else(|| Arc::new(AllowAllAuthorizer)),
            preferences: opts
                .preference_store
                .unwrap_or_else(|| Arc::new(InMemoryPreferenceStore::new())),
            registry: opts.registry.unwrap_or_else(|| Arc::new(Registry::new())),
            refresh_hook: opts.refresh_hook.unwrap_or_else(|| Arc::new(NoopRefreshHook)),
            telemetry: opts.telemetry.unwrap_or_else(|| Arc::new(NoopTelemetry)),
            validator: opts.validator.unwrap_or_else(|| Arc::new(SchemaValidator::new())),
            areas: opts.areas,
        }
    }

    /// The registry this service resolves providers from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The canonical area working set resolved by [`Service::configure_layout`].
    pub fn areas(&self) -> &[WidgetAreaDefinition] {
        &self.areas
    }

    fn store(&self) -> Result<&Arc<dyn WidgetStore>, DashboardError> {
        self.widget_store.as_ref().ok_or_else(|| {
            DashboardError::invalid_argument("widget store is not configured")
        })
    }

    /// Creates a widget instance, assigns it to an area, and notifies
    /// subscribers. Returns the placed instance.
    pub async fn add_widget(
        &self,
        req: AddWidgetRequest,
    ) -> Result<WidgetInstance, DashboardError> {
        if req.area_code.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget area code is required",
            ));
        }
        if req.definition_code.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget definition code is required",
            ));
        }
        let store = self.store()?;

        if let Some(def) = self.registry.definition(&req.definition_code) {
            self.validator.validate(&def, &req.configuration)?;
        }

        let instance = store
            .create_instance(CreateWidgetInstanceInput {
                definition_code: req.definition_code.clone(),
                configuration: req.configuration.clone(),
                visibility: WidgetVisibility {
                    roles: req.roles.clone(),
                    audience: req.audience.clone(),
                    start_at: req.start_at,
                    end_at: req.end_at,
                },
                metadata: ConfigMap::new(),
            })
            .await?;
        store
            .assign_instance(AssignWidgetInput {
                area_code: req.area_code.clone(),
                instance_id: instance.id.clone(),
                position: req.position,
            })
            .await?;

        let mut placed = instance;
        placed.area_code = req.area_code.clone();

        self.notify(WidgetEvent {
            area_code: req.area_code.clone(),
            instance: placed.clone(),
            reason: ChangeReason::Add,
        })
        .await;
        self.telemetry.record(
            "dashboard.widget.add",
            json!({
                "instance_id": placed.id,
                "definition_code": placed.definition_code,
                "area_code": req.area_code,
                "user_id": req.user_id,
            }),
        );
        Ok(placed)
    }

    /// Updates an instance's configuration and/or metadata.
    pub async fn update_widget(
        &self,
        widget_id: &str,
        req: UpdateWidgetRequest,
    ) -> Result<WidgetInstance, DashboardError> {
        if widget_id.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget instance id is required",
            ));
        }
        let store = self.store()?;
        let current = store.get_instance(widget_id).await?;

        if let Some(cfg) = &req.configuration {
            if let Some(def) = self.registry.definition(&current.definition_code) {
                self.validator.validate(&def, cfg)?;
            }
        }

        let updated = store
            .update_instance(UpdateWidgetInstanceInput {
                instance_id: widget_id.to_string(),
                configuration: req.configuration,
                metadata: req.metadata,
            })
            .await?;

        self.notify(WidgetEvent {
            area_code: current.area_code.clone(),
            instance: updated.clone(),
            reason: ChangeReason::Update,
        })
        .await;
        self.telemetry.record(
            "dashboard.widget.update",
            json!({"instance_id": widget_id, "user_id": req.user_id}),
        );
        Ok(updated)
    }

    /// Removes an instance from the dashboard.
    pub async fn remove_widget(&self, widget_id: &str) -> Result<(), DashboardError> {
        if widget_id.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget instance id is required",
            ));
        }
        let store = self.store()?;
        let current = store.get_instance(widget_id).await?;
        store.delete_instance(widget_id).await?;

        self.notify(WidgetEvent {
            area_code: current.area_code.clone(),
            instance: current,
            reason: ChangeReason::Delete,
        })
        .await;
        self.telemetry
            .record("dashboard.widget.delete", json!({"instance_id": widget_id}));
        Ok(())
    }

    /// Applies a new full ordering to an area.
    pub async fn reorder_widgets(
        &self,
        area_code: &str,
        widget_ids: Vec<String>,
    ) -> Result<(), DashboardError> {
        if area_code.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget area code is required",
            ));
        }
        let store = self.store()?;
        store
            .reorder_area(ReorderAreaInput {
                area_code: area_code.to_string(),
                widget_ids: widget_ids.clone(),
            })
            .await?;

        self.notify(WidgetEvent {
            area_code: area_code.to_string(),
            instance: WidgetInstance::default(),
            reason: ChangeReason::Reorder,
        })
        .await;
        self.telemetry.record(
            "dashboard.widget.reorder",
            json!({"area_code": area_code, "count": widget_ids.len()}),
        );
        Ok(())
    }

    /// Resolves the full layout for a viewer across the canonical area set.
    pub async fn configure_layout(
        &self,
        viewer: &ViewerContext,
    ) -> Result<Layout, DashboardError> {
        let store = Arc::clone(self.store()?);
        let overrides = self.preferences.layout_overrides(viewer).await?;
        let mut areas = HashMap::with_capacity(self.areas.len());
        for area in &self.areas {
            let widgets = self
                .resolve_area_widgets(store.as_ref(), viewer, &area.code, &overrides)
                .await?;
            areas.insert(area.code.clone(), widgets);
        }
        Ok(Layout { areas })
    }

    /// Resolves one area for a viewer.
    pub async fn resolve_area(
        &self,
        viewer: &ViewerContext,
        area_code: &str,
    ) -> Result<ResolvedArea, DashboardError> {
        if area_code.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget area code is required",
            ));
        }
        let store = Arc::clone(self.store()?);
        let overrides = self.preferences.layout_overrides(viewer).await?;
        let widgets = self
            .resolve_area_widgets(store.as_ref(), viewer, area_code, &overrides)
            .await?;
        Ok(ResolvedArea {
            area_code: area_code.to_string(),
            widgets,
        })
    }

    /// Persists layout overrides for a viewer, normalizing widths on write.
    pub async fn save_preferences(
        &self,
        viewer: &ViewerContext,
        mut overrides: LayoutOverrides,
    ) -> Result<(), DashboardError> {
        if viewer.user_id.is_empty() {
            return Err(DashboardError::invalid_argument(
                "viewer user id is required",
            ));
        }
        normalize_overrides(&mut overrides);
        let area_count = overrides.area_order.len();
        let hidden_count = overrides.hidden_widgets.len();
        self.preferences
            .save_layout_overrides(viewer, overrides)
            .await?;
        self.telemetry.record(
            "dashboard.preferences.save",
            json!({
                "user_id": viewer.user_id,
                "areas": area_count,
                "hidden_count": hidden_count,
            }),
        );
        Ok(())
    }

    /// Forwards a widget event to the refresh hook without a store mutation.
    pub async fn notify_widget_updated(&self, event: WidgetEvent) -> Result<(), DashboardError> {
        self.refresh_hook.widget_updated(event.clone()).await?;
        self.telemetry.record(
            "dashboard.widget.refresh",
            json!({
                "area_code": event.area_code,
                "widget_id": event.instance.id,
                "reason": event.reason.to_string(),
            }),
        );
        Ok(())
    }

    /// Best-effort notification after a successful store mutation. The
    /// mutation is the source of truth; a hook failure is logged, never
    /// propagated.
    async fn notify(&self, event: WidgetEvent) {
        if let Err(err) = self.refresh_hook.widget_updated(event).await {
            tracing::warn!(error = %err, "refresh hook failed after store mutation");
        }
    }

    async fn resolve_area_widgets(
        &self,
        store: &dyn WidgetStore,
        viewer: &ViewerContext,
        area_code: &str,
        overrides: &LayoutOverrides,
    ) -> Result<Vec<WidgetInstance>, DashboardError> {
        let resolved = store
            .resolve_area(ResolveAreaInput {
                area_code: area_code.to_string(),
                audience: viewer.roles.clone(),
                locale: viewer.locale.clone(),
            })
            .await?;

        // Authorize before enrichment: unauthorized instances must never
        // reach a provider.
        let mut visible = Vec::with_capacity(resolved.widgets.len());
        for instance in resolved.widgets {
            if self.authorizer.can_view_widget(viewer, &instance).await {
                visible.push(instance);
            }
        }

        for instance in visible.iter_mut() {
            // Static widgets without a provider are legal.
            let Some(provider) = self.registry.provider(&instance.definition_code) else {
                continue;
            };
            let ctx = WidgetContext {
                instance: instance.clone(),
                viewer: viewer.clone(),
                options: ConfigMap::new(),
            };
            match provider.fetch(&ctx).await {
                Ok(data) => {
                    instance
                        .metadata
                        .insert(DATA_KEY.to_string(), Value::Object(data));
                }
                Err(err) => {
                    // Per-widget failures never fail the whole area.
                    tracing::warn!(
                        instance = %instance.id,
                        definition = %instance.definition_code,
                        error = %err,
                        "widget provider failed, returning instance without data"
                    );
                    self.telemetry.record(
                        "dashboard.widget.provider_error",
                        json!({
                            "instance_id": instance.id,
                            "definition_code": instance.definition_code,
                            "error": err.to_string(),
                        }),
                    );
                }
            }
        }

        if let Some(order) = overrides.area_order.get(area_code) {
            visible = apply_order_override(visible, order);
        }
        if let Some(rows) = overrides.area_rows.get(area_code) {
            apply_row_overrides(&mut visible, rows);
        }
        Ok(apply_hidden_filter(visible, &overrides.hidden_widgets))
    }
}

/// Reorders `widgets` so ids named in `order` come first, in that order.
///
/// Ids absent from the live set are skipped; live instances not mentioned in
/// the override keep their original relative order and are appended after the
/// ordered prefix. No instance is dropped, only reordered.
pub fn apply_order_override(
    widgets: Vec<WidgetInstance>,
    order: &[String],
) -> Vec<WidgetInstance> {
    if order.is_empty() {
        return widgets;
    }
    let mut slots: Vec<Option<WidgetInstance>> = widgets.into_iter().map(Some).collect();
    let mut result = Vec::with_capacity(slots.len());
    for id in order {
        let found = slots
            .iter()
            .position(|slot| slot.as_ref().map(|w| &w.id == id).unwrap_or(false));
        if let Some(pos) = found {
            if let Some(instance) = slots[pos].take() {
                result.push(instance);
            }
        }
    }
    result.extend(slots.into_iter().flatten());
    result
}

/// Writes `{row, column, width}` placement metadata for slotted instances.
///
/// Instances not covered by any row keep their order-only placement.
pub fn apply_row_overrides(widgets: &mut [WidgetInstance], rows: &[LayoutRow]) {
    for (row_index, row) in rows.iter().enumerate() {
        for (column_index, slot) in row.widgets.iter().enumerate() {
            if let Some(instance) = widgets.iter_mut().find(|w| w.id == slot.id) {
                instance.metadata.insert(
                    LAYOUT_KEY.to_string(),
                    json!({
                        "row": row_index,
                        "column": column_index,
                        "width": clamp_slot_width(slot.width),
                    }),
                );
            }
        }
    }
}

/// Removes instances whose id is in `hidden`.
pub fn apply_hidden_filter(
    widgets: Vec<WidgetInstance>,
    hidden: &HashSet<String>,
) -> Vec<WidgetInstance> {
    if hidden.is_empty() {
        return widgets;
    }
    widgets
        .into_iter()
        .filter(|w| !hidden.contains(&w.id))
        .collect()
}

//! Persistence contract for widget instances and area assignments.
//!
//! The actual datastore lives outside the core; the service only speaks this
//! trait. Implementations ensure thread safety and idempotency of the
//! `ensure_*` operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigMap, DashboardError, WidgetAreaDefinition, WidgetDefinition, WidgetInstance,
    WidgetVisibility,
};

/// Input for creating a new widget instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateWidgetInstanceInput {
    /// Definition the instance renders.
    pub definition_code: String,
    /// Validated instance configuration.
    #[serde(default)]
    pub configuration: ConfigMap,
    /// Runtime visibility constraints.
    #[serde(default)]
    pub visibility: WidgetVisibility,
    /// Opaque instance metadata.
    #[serde(default)]
    pub metadata: ConfigMap,
}

/// Input for updating an existing instance's configuration or metadata.
///
/// `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWidgetInstanceInput {
    /// Instance to update.
    pub instance_id: String,
    /// Replacement configuration, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ConfigMap>,
    /// Replacement metadata, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConfigMap>,
}

/// Input associating an instance with an area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignWidgetInput {
    /// Target area code.
    pub area_code: String,
    /// Instance to place.
    pub instance_id: String,
    /// Position within the area; `None` appends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// A new full ordering for the instances within one area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderAreaInput {
    /// Area being reordered.
    pub area_code: String,
    /// Instance ids in their new order.
    pub widget_ids: Vec<String>,
}

/// Request for the instances assigned to one area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveAreaInput {
    /// Area to resolve.
    pub area_code: String,
    /// Audience segments of the requesting viewer.
    #[serde(default)]
    pub audience: Vec<String>,
    /// Viewer locale.
    #[serde(default)]
    pub locale: String,
}

/// Instances returned by the store for one area, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArea {
    /// Area the instances belong to.
    pub area_code: String,
    /// Instances in stored order, before any viewer overrides.
    pub widgets: Vec<WidgetInstance>,
}

/// Persistence and assignment operations the service requires.
#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// Ensures an area exists; returns whether it was created.
    async fn ensure_area(&self, def: &WidgetAreaDefinition) -> Result<bool, DashboardError>;

    /// Ensures a definition exists; returns whether it was created.
    async fn ensure_definition(&self, def: &WidgetDefinition) -> Result<bool, DashboardError>;

    /// Creates a new widget instance.
    async fn create_instance(
        &self,
        input: CreateWidgetInstanceInput,
    ) -> Result<WidgetInstance, DashboardError>;

    /// Fetches one instance by id.
    async fn get_instance(&self, instance_id: &str) -> Result<WidgetInstance, DashboardError>;

    /// Updates an instance's configuration and/or metadata.
    async fn update_instance(
        &self,
        input: UpdateWidgetInstanceInput,
    ) -> Result<WidgetInstance, DashboardError>;

    /// Deletes an instance and its assignments.
    async fn delete_instance(&self, instance_id: &str) -> Result<(), DashboardError>;

    /// Places an instance within an area.
    async fn assign_instance(&self, input: AssignWidgetInput) -> Result<(), DashboardError>;

    /// Applies a new full ordering to an area.
    async fn reorder_area(&self, input: ReorderAreaInput) -> Result<(), DashboardError>;

    /// Returns the instances assigned to an area, in stored order.
    async fn resolve_area(&self, input: ResolveAreaInput) -> Result<ResolvedArea, DashboardError>;
}

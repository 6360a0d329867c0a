//! Dashboard orchestration core.
//!
//! This crate is the embeddable engine behind a widget dashboard: given a set
//! of widget definitions, provider implementations, and per-viewer layout
//! preferences, it resolves a concrete, ordered, authorized list of widget
//! instances per display area, attaches freshly computed (and cached) render
//! data, and fans out change notifications to live subscribers.
//!
//! # Architecture
//!
//! - [`registry::Registry`] maps widget definition codes to schema metadata
//!   and to the [`providers::Provider`] bound to each code.
//! - [`service::Service`] composes the registry with an external
//!   [`store::WidgetStore`], an [`service::Authorizer`], a
//!   [`preferences::PreferenceStore`], a [`validation::ConfigValidator`], and
//!   a [`broadcast::RefreshHook`] to implement the widget lifecycle and the
//!   read-side layout resolution pipeline.
//! - [`cache::RenderCache`] memoizes expensive render output under a TTL.
//! - [`broadcast::BroadcastHook`] delivers [`WidgetEvent`]s to any number of
//!   live subscribers without blocking the producer.
//!
//! Persistence, authentication, HTML rendering, and network transport are
//! collaborator concerns; the core reaches them only through traits.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fan-out of widget change events to in-process subscribers.
pub mod broadcast;

/// TTL cache for expensive derived render output.
pub mod cache;

/// TOML configuration schema and loader.
pub mod config;

/// Error types shared across the core.
pub mod error;

/// Per-viewer layout override persistence.
pub mod preferences;

/// Provider trait, widget context, and the built-in widget catalog.
pub mod providers;

/// Widget definition and provider registry.
pub mod registry;

/// Orchestration service: widget lifecycle and layout resolution.
pub mod service;

/// Persistence contract for widget instances and area assignments.
pub mod store;

/// Fire-and-forget observability sink.
pub mod telemetry;

/// Schema-based validation of widget instance configuration.
pub mod validation;

/// Bootstrap helpers for registering the catalog and seeding layouts.
pub mod bootstrap;

pub use error::DashboardError;

/// Dynamically-shaped JSON object used for widget configuration, metadata,
/// and provider output. `serde_json`'s default map is ordered, which keeps
/// cache fingerprints stable across serializations.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Data computed by a provider for one widget instance.
pub type WidgetData = serde_json::Map<String, serde_json::Value>;

/// Maximum column width a widget slot may occupy within a layout row.
pub const MAX_SLOT_WIDTH: i32 = 12;

/// A named placement surface for widget instances (e.g. "main", "sidebar").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetAreaDefinition {
    /// Unique area code, dotted namespace by convention.
    pub code: String,
    /// Human-readable area name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Static schema and metadata describing a widget type.
///
/// Definitions are immutable once registered under a code; re-registering the
/// same code overwrites the previous entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetDefinition {
    /// Globally unique definition code, dotted namespace by convention
    /// (e.g. `acme.widget.stats`).
    pub code: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Grouping category used by pickers and catalogs.
    #[serde(default)]
    pub category: String,
    /// JSON-Schema document for instance configuration. A definition without
    /// a schema opts out of configuration validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

/// A concrete, placed widget with its own configuration.
///
/// Instances are created by the external [`store::WidgetStore`]; the core
/// treats them as opaque values it enriches in place (a `data` key in
/// `metadata`) before returning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetInstance {
    /// Store-assigned instance id.
    pub id: String,
    /// Code of the [`WidgetDefinition`] this instance renders.
    pub definition_code: String,
    /// Area the instance is assigned to.
    #[serde(default)]
    pub area_code: String,
    /// Instance configuration, validated against the definition schema.
    #[serde(default)]
    pub configuration: ConfigMap,
    /// Opaque metadata; enrichment writes `data` and `layout` keys here.
    #[serde(default)]
    pub metadata: ConfigMap,
}

/// Runtime visibility constraints attached to a new instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetVisibility {
    /// Roles allowed to see the widget; empty means unrestricted.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Audience segments the widget targets.
    #[serde(default)]
    pub audience: Vec<String>,
    /// Earliest time the widget becomes visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Time after which the widget is no longer visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Active viewer identity threaded through layout resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
    /// Viewer user id; preference persistence requires it to be non-empty.
    pub user_id: String,
    /// Roles granted to the viewer, forwarded to the store as audience.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Preferred locale.
    #[serde(default)]
    pub locale: String,
}

/// One widget placement within a layout row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSlot {
    /// Instance id occupying the slot.
    pub id: String,
    /// Column width in `[1, 12]`; out-of-range values become 12 on write.
    pub width: i32,
}

/// An ordered row of widget slots within an area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRow {
    /// Slots laid out left to right.
    pub widgets: Vec<WidgetSlot>,
}

/// Per-viewer layout customization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutOverrides {
    /// Locale the overrides were saved under.
    #[serde(default)]
    pub locale: String,
    /// Explicit instance ordering per area code.
    #[serde(default)]
    pub area_order: HashMap<String, Vec<String>>,
    /// Row/width layout per area code.
    #[serde(default)]
    pub area_rows: HashMap<String, Vec<LayoutRow>>,
    /// Instance ids the viewer has hidden.
    #[serde(default)]
    pub hidden_widgets: HashSet<String>,
}

/// Resolved widget instances per dashboard area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Area code to ordered, authorized, enriched instances.
    pub areas: HashMap<String, Vec<WidgetInstance>>,
}

/// Why a widget change event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeReason {
    /// A new instance was created and assigned.
    Add,
    /// An existing instance's configuration or metadata changed.
    Update,
    /// An instance was removed.
    Delete,
    /// An area's instance ordering changed.
    Reorder,
    /// An explicit refresh was requested without a store mutation.
    Refresh,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeReason::Add => "add",
            ChangeReason::Update => "update",
            ChangeReason::Delete => "delete",
            ChangeReason::Reorder => "reorder",
            ChangeReason::Refresh => "refresh",
        };
        write!(f, "{}", s)
    }
}

/// Error type for parsing a [`ChangeReason`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChangeReasonError(pub String);

impl fmt::Display for ParseChangeReasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid change reason: {}", self.0)
    }
}

impl std::error::Error for ParseChangeReasonError {}

impl FromStr for ChangeReason {
    type Err = ParseChangeReasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "add" => Ok(ChangeReason::Add),
            "update" => Ok(ChangeReason::Update),
            "delete" => Ok(ChangeReason::Delete),
            "reorder" => Ok(ChangeReason::Reorder),
            "refresh" => Ok(ChangeReason::Refresh),
            _ => Err(ParseChangeReasonError(s.to_string())),
        }
    }
}

/// A widget change notification delivered to transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetEvent {
    /// Area affected by the change.
    pub area_code: String,
    /// Instance snapshot at the time of the change. Reorder events carry a
    /// default instance since no single instance changed.
    #[serde(default)]
    pub instance: WidgetInstance,
    /// Reason tag for the change.
    pub reason: ChangeReason,
}

/// Clamps a slot width to `[1, 12]`.
///
/// Out-of-range values (including zero and negatives) become the full row
/// width of 12 rather than the nearest bound.
pub fn clamp_slot_width(width: i32) -> i32 {
    if (1..=MAX_SLOT_WIDTH).contains(&width) {
        width
    } else {
        MAX_SLOT_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_reason_round_trips_through_display_and_from_str() {
        for reason in [
            ChangeReason::Add,
            ChangeReason::Update,
            ChangeReason::Delete,
            ChangeReason::Reorder,
            ChangeReason::Refresh,
        ] {
            let parsed: ChangeReason = reason.to_string().parse().expect("parse");
            assert_eq!(parsed, reason);
        }
        assert!("bogus".parse::<ChangeReason>().is_err());
    }

    #[test]
    fn clamp_slot_width_stays_within_bounds() {
        assert_eq!(clamp_slot_width(1), 1);
        assert_eq!(clamp_slot_width(6), 6);
        assert_eq!(clamp_slot_width(12), 12);
        assert_eq!(clamp_slot_width(0), 12);
        assert_eq!(clamp_slot_width(-3), 12);
        assert_eq!(clamp_slot_width(13), 12);
    }

    #[test]
    fn widget_event_serializes_reason_lowercase() {
        let event = WidgetEvent {
            area_code: "main".into(),
            instance: WidgetInstance::default(),
            reason: ChangeReason::Add,
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["reason"], "add");
    }
}

//! Per-viewer layout override persistence.
//!
//! The [`PreferenceStore`] contract is external-replaceable: hosts back it
//! with their user settings storage. [`InMemoryPreferenceStore`] is the
//! concurrency-safe default used when nothing is wired, and the unit tests'
//! reference implementation.
//!
//! Overrides are normalized on write: slot widths are clamped to `[1, 12]`
//! (out-of-range values become 12), empty slots and rows are dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{clamp_slot_width, DashboardError, LayoutOverrides, ViewerContext};

/// Persistence contract for per-viewer layout overrides.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Returns the viewer's stored overrides, or defaults when none exist.
    async fn layout_overrides(
        &self,
        viewer: &ViewerContext,
    ) -> Result<LayoutOverrides, DashboardError>;

    /// Persists overrides for the viewer, replacing any previous set.
    async fn save_layout_overrides(
        &self,
        viewer: &ViewerContext,
        overrides: LayoutOverrides,
    ) -> Result<(), DashboardError>;
}

/// Concurrency-safe in-memory preference store.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    data: RwLock<HashMap<String, LayoutOverrides>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(viewer: &ViewerContext) -> String {
        if viewer.locale.is_empty() {
            viewer.user_id.clone()
        } else {
            format!("{}::{}", viewer.user_id, viewer.locale)
        }
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn layout_overrides(
        &self,
        viewer: &ViewerContext,
    ) -> Result<LayoutOverrides, DashboardError> {
        if viewer.user_id.is_empty() {
            return Ok(LayoutOverrides::default());
        }
        Ok(self
            .data
            .read()
            .get(&Self::key(viewer))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_layout_overrides(
        &self,
        viewer: &ViewerContext,
        mut overrides: LayoutOverrides,
    ) -> Result<(), DashboardError> {
        if viewer.user_id.is_empty() {
            return Err(DashboardError::invalid_argument(
                "preference store requires viewer user id",
            ));
        }
        normalize_overrides(&mut overrides);
        self.data.write().insert(Self::key(viewer), overrides);
        Ok(())
    }
}

/// Normalizes overrides before persistence.
///
/// Clamps every slot width to `[1, 12]`, drops slots without an instance id,
/// drops rows left empty, and drops areas left without rows.
pub fn normalize_overrides(overrides: &mut LayoutOverrides) {
    for rows in overrides.area_rows.values_mut() {
        for row in rows.iter_mut() {
            row.widgets.retain(|slot| !slot.id.is_empty());
            for slot in row.widgets.iter_mut() {
                slot.width = clamp_slot_width(slot.width);
            }
        }
        rows.retain(|row| !row.widgets.is_empty());
    }
    overrides.area_rows.retain(|_, rows| !rows.is_empty());
}

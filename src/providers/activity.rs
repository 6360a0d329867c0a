//! Recent-activity feed backing the activity widget.

use std::time::Duration;

use async_trait::async_trait;

use crate::{DashboardError, ViewerContext};

/// A single activity entry displayed by the recent-activity widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    /// Display name of the acting user.
    pub user: String,
    /// What the user did.
    pub action: String,
    /// Secondary context line.
    pub details: String,
    /// How long ago the activity happened.
    pub ago: Duration,
}

/// Fetches recent activity entries for the current viewer.
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// Returns up to `limit` recent entries, newest first.
    async fn recent(
        &self,
        viewer: &ViewerContext,
        limit: usize,
    ) -> Result<Vec<ActivityItem>, DashboardError>;
}

/// Feed that serves a fixed list of entries. Useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticActivityFeed {
    /// Entries served by the feed, newest first.
    pub items: Vec<ActivityItem>,
}

#[async_trait]
impl ActivityFeed for StaticActivityFeed {
    async fn recent(
        &self,
        _viewer: &ViewerContext,
        limit: usize,
    ) -> Result<Vec<ActivityItem>, DashboardError> {
        if limit == 0 || limit >= self.items.len() {
            return Ok(self.items.clone());
        }
        Ok(self.items[..limit].to_vec())
    }
}

/// Placeholder entries for the demo activity widget.
pub fn default_activity_feed() -> StaticActivityFeed {
    let entry = |user: &str, action: &str, details: &str, ago: Duration| ActivityItem {
        user: user.to_string(),
        action: action.to_string(),
        details: details.to_string(),
        ago,
    };
    StaticActivityFeed {
        items: vec![
            entry(
                "Priya Raman",
                "published the spring pricing update",
                "Billing · Plan v3 rollout",
                Duration::from_secs(5 * 60),
            ),
            entry(
                "Jonas Weiss",
                "invited 24 enterprise seats",
                "Meridian Industrial — Enterprise",
                Duration::from_secs(22 * 60),
            ),
            entry(
                "Amara Diallo",
                "resolved 14 aging invoices",
                "Finance · Treasury automation",
                Duration::from_secs(49 * 60),
            ),
            entry(
                "Tomás Herrera",
                "shipped a dashboard theme change",
                "Design System · Canary env",
                Duration::from_secs(2 * 3600),
            ),
            entry(
                "Elif Kaya",
                "closed incident #782",
                "Checkout API · On-call",
                Duration::from_secs(6 * 3600),
            ),
        ],
    }
}

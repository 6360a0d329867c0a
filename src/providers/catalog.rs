//! Built-in widget catalog: default areas, definitions, providers, seeds.
//!
//! The catalog ships as an explicit [`RegistrationHook`] rather than a
//! process-global list; hosts opt in by passing [`builtin_hook`] to
//! [`crate::registry::Registry::with_hooks`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};

use crate::registry::RegistrationHook;
use crate::service::AddWidgetRequest;
use crate::{DashboardError, WidgetAreaDefinition, WidgetData, WidgetDefinition};

use super::activity::{default_activity_feed, ActivityFeed};
use super::sales_chart::{SalesChartProvider, SalesSeriesPoint, StaticSalesRepository};
use super::{Provider, ProviderFn, WidgetContext};

/// Code of the primary dashboard canvas.
pub const AREA_MAIN: &str = "admin.dashboard.main";
/// Code of the secondary widget column.
pub const AREA_SIDEBAR: &str = "admin.dashboard.sidebar";
/// Code of the footer strip.
pub const AREA_FOOTER: &str = "admin.dashboard.footer";

/// Returns the three built-in dashboard areas.
pub fn default_area_definitions() -> Vec<WidgetAreaDefinition> {
    let area = |code: &str, name: &str, description: &str| WidgetAreaDefinition {
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    };
    vec![
        area(AREA_MAIN, "Admin Dashboard (Main)", "Primary dashboard canvas"),
        area(AREA_SIDEBAR, "Admin Dashboard (Sidebar)", "Secondary widgets"),
        area(AREA_FOOTER, "Admin Dashboard (Footer)", "Footer widgets"),
    ]
}

/// Returns the built-in widget definitions with their schemas.
pub fn default_widget_definitions() -> Vec<WidgetDefinition> {
    let def = |code: &str, name: &str, description: &str, category: &str, schema: Value| {
        WidgetDefinition {
            code: code.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            schema: Some(schema),
        }
    };
    vec![
        def(
            "admin.widget.user_stats",
            "User Statistics",
            "High-level user metrics",
            "stats",
            json!({
                "type": "object",
                "required": ["metric"],
                "properties": {
                    "metric": {"type": "string", "enum": ["total", "active", "new"]}
                }
            }),
        ),
        def(
            "admin.widget.recent_activity",
            "Recent Activity",
            "Latest activity feed entries",
            "activity",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "minimum": 1, "maximum": 50}
                }
            }),
        ),
        def(
            "admin.widget.sales_chart",
            "Sales Chart",
            "Sales overview chart",
            "charts",
            json!({
                "type": "object",
                "properties": {
                    "range": {"type": "string", "enum": ["7d", "30d", "90d"]},
                    "period": {"type": "string"},
                    "metric": {"type": "string"},
                    "segment": {"type": "string"},
                    "comparison_metric": {"type": "string"}
                }
            }),
        ),
        def(
            "admin.widget.quick_actions",
            "Quick Actions",
            "Common admin shortcuts",
            "actions",
            json!({
                "type": "object",
                "properties": {
                    "actions": {"type": "array", "items": {"type": "object"}}
                }
            }),
        ),
        def(
            "admin.widget.system_status",
            "System Status",
            "Health indicators",
            "status",
            json!({
                "type": "object",
                "properties": {
                    "checks": {"type": "array", "items": {"type": "string"}}
                }
            }),
        ),
    ]
}

/// Returns the starter widget assignments used to seed a fresh dashboard.
pub fn default_seed_requests() -> Vec<AddWidgetRequest> {
    vec![
        AddWidgetRequest {
            definition_code: "admin.widget.user_stats".to_string(),
            area_code: AREA_MAIN.to_string(),
            configuration: json!({"metric": "total"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ..Default::default()
        },
        AddWidgetRequest {
            definition_code: "admin.widget.recent_activity".to_string(),
            area_code: AREA_SIDEBAR.to_string(),
            configuration: json!({"limit": 10})
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ..Default::default()
        },
        AddWidgetRequest {
            definition_code: "admin.widget.quick_actions".to_string(),
            area_code: AREA_FOOTER.to_string(),
            ..Default::default()
        },
    ]
}

/// Registration hook that installs the built-in catalog.
///
/// Registers every default definition and binds the built-in provider for
/// each one. Independently compiled extensions contribute their own hooks
/// alongside this one.
pub fn builtin_hook() -> RegistrationHook {
    Box::new(|registry| {
        for def in default_widget_definitions() {
            let code = def.code.clone();
            registry.register_definition(def)?;
            if let Some(provider) = builtin_provider(&code) {
                registry.register_provider(&code, provider)?;
            }
        }
        Ok(())
    })
}

fn builtin_provider(code: &str) -> Option<Arc<dyn Provider>> {
    match code {
        "admin.widget.user_stats" => Some(Arc::new(ProviderFn::new(user_stats_data))),
        "admin.widget.recent_activity" => Some(Arc::new(RecentActivityProvider {
            feed: Arc::new(default_activity_feed()),
        })),
        "admin.widget.sales_chart" => Some(Arc::new(SalesChartProvider::new(
            Arc::new(StaticSalesRepository::new(demo_sales_points())),
            None,
        ))),
        "admin.widget.quick_actions" => Some(Arc::new(ProviderFn::new(quick_actions_data))),
        "admin.widget.system_status" => Some(Arc::new(ProviderFn::new(system_status_data))),
        _ => None,
    }
}

fn user_stats_data(ctx: &WidgetContext) -> Result<WidgetData, DashboardError> {
    let metric = ctx
        .instance
        .configuration
        .get("metric")
        .cloned()
        .unwrap_or(Value::Null);
    let mut data = WidgetData::new();
    data.insert("title".to_string(), json!("Users"));
    data.insert("metric".to_string(), metric);
    data.insert(
        "values".to_string(),
        json!({"total": 1200, "active": 875, "new": 32}),
    );
    Ok(data)
}

fn quick_actions_data(_ctx: &WidgetContext) -> Result<WidgetData, DashboardError> {
    let mut data = WidgetData::new();
    data.insert(
        "actions".to_string(),
        json!([
            {"label": "Invite user", "route": "/admin/users/invite", "icon": "user-plus"},
            {"label": "Create page", "route": "/admin/pages/new", "icon": "file-plus"},
        ]),
    );
    Ok(data)
}

fn system_status_data(_ctx: &WidgetContext) -> Result<WidgetData, DashboardError> {
    let mut data = WidgetData::new();
    data.insert(
        "checks".to_string(),
        json!([
            {"name": "Database", "status": "ok"},
            {"name": "Cache", "status": "ok"},
            {"name": "Worker", "status": "warning"},
        ]),
    );
    Ok(data)
}

/// Provider serving the recent-activity widget from an [`ActivityFeed`].
pub struct RecentActivityProvider {
    /// Feed the entries are read from.
    pub feed: Arc<dyn ActivityFeed>,
}

#[async_trait]
impl Provider for RecentActivityProvider {
    async fn fetch(&self, ctx: &WidgetContext) -> Result<WidgetData, DashboardError> {
        let limit = ctx
            .instance
            .configuration
            .get("limit")
            .and_then(|v| v.as_u64())
            .filter(|&v| v > 0)
            .unwrap_or(10) as usize;
        let items = self.feed.recent(&ctx.viewer, limit).await?;
        let entries: Vec<Value> = items
            .into_iter()
            .map(|item| {
                json!({
                    "user": item.user,
                    "action": item.action,
                    "details": item.details,
                    "ago": humantime::format_duration(item.ago).to_string(),
                })
            })
            .collect();
        let mut data = WidgetData::new();
        data.insert("items".to_string(), Value::Array(entries));
        Ok(data)
    }
}

fn demo_sales_points() -> Vec<SalesSeriesPoint> {
    let now = Utc::now();
    (0..7)
        .rev()
        .map(|days_ago| SalesSeriesPoint {
            timestamp: now - ChronoDuration::days(days_ago),
            // Deterministic demo curve; real deployments bind a repository.
            value: 40.0 + 7.5 * (7 - days_ago) as f64,
        })
        .collect()
}

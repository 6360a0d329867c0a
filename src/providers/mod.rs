//! Provider capability and the built-in widget catalog.
//!
//! A [`Provider`] computes the runtime data for one widget type. Providers
//! are bound to definition codes in the [`crate::registry::Registry`]; during
//! layout resolution the service looks up the provider for each surviving
//! instance and attaches its output under the instance's `data` metadata key.
//!
//! Provider calls may perform I/O. The core imposes no timeout of its own;
//! cancellation propagates by dropping the in-flight future.

use async_trait::async_trait;

use crate::{ConfigMap, DashboardError, ViewerContext, WidgetData, WidgetInstance};

pub mod activity;
pub mod catalog;
pub mod sales_chart;

pub use activity::{ActivityFeed, ActivityItem, StaticActivityFeed};
pub use catalog::{
    builtin_hook, default_area_definitions, default_seed_requests, default_widget_definitions,
};
pub use sales_chart::{
    SalesChartProvider, SalesSeriesPoint, SalesSeriesQuery, SalesSeriesRepository,
    StaticSalesRepository,
};


/// Everything a provider may consult while computing widget data.
#[derive(Debug, Clone, Default)]
pub struct WidgetContext {
    /// Instance being enriched, including its configuration.
    pub instance: WidgetInstance,
    /// Viewer the layout is being resolved for.
    pub viewer: ViewerContext,
    /// Caller-supplied rendering options (variant hints, feature toggles).
    pub options: ConfigMap,
}

/// Pluggable data-fetch capability bound to a widget definition code.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Computes the runtime data for one widget instance.
    async fn fetch(&self, ctx: &WidgetContext) -> Result<WidgetData, DashboardError>;
}

/// Adapts a plain closure into a [`Provider`].
///
/// Convenient for static widgets and tests where the data is computed
/// synchronously from the context.
pub struct ProviderFn<F>(F);

impl<F> ProviderFn<F>
where
    F: Fn(&WidgetContext) -> Result<WidgetData, DashboardError> + Send + Sync,
{
    /// Wraps `f` as a provider.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Provider for ProviderFn<F>
where
    F: Fn(&WidgetContext) -> Result<WidgetData, DashboardError> + Send + Sync,
{
    async fn fetch(&self, ctx: &WidgetContext) -> Result<WidgetData, DashboardError> {
        (self.0)(ctx)
    }
}

/// Reads a string configuration value with a fallback.
pub(crate) fn string_config<'a>(cfg: &'a ConfigMap, key: &str, fallback: &'a str) -> &'a str {
    cfg.get(key).and_then(|v| v.as_str()).unwrap_or(fallback)
}

//! Repository-backed time-series provider for the sales chart widget.
//!
//! The provider fetches one (optionally two) metric series from a
//! [`SalesSeriesRepository`], assembles a chart document, and serializes it
//! through the [`RenderCache`] so repeated resolutions of an unchanged
//! configuration skip the serialization work. Chart output is a JSON
//! document; markup generation stays outside the core.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::cache::{render_cache_key, RenderCache};
use crate::{DashboardError, ViewerContext, WidgetData};

use super::{string_config, Provider, WidgetContext};

/// A single time-series value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesSeriesPoint {
    /// Sample timestamp.
    pub timestamp: DateTime<Utc>,
    /// Metric value at the timestamp.
    pub value: f64,
}

/// Describes the metric a chart requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesSeriesQuery {
    /// Reporting period, e.g. `7d` / `30d` / `90d`.
    pub period: String,
    /// Metric name, e.g. `revenue`.
    pub metric: String,
    /// Customer segment the series is filtered to.
    pub segment: String,
    /// Viewer the series is resolved for.
    pub viewer: ViewerContext,
}

/// Fetches time-series data for the sales chart provider.
#[async_trait]
pub trait SalesSeriesRepository: Send + Sync {
    /// Returns the series for `query`, oldest point first.
    async fn fetch_sales_series(
        &self,
        query: &SalesSeriesQuery,
    ) -> Result<Vec<SalesSeriesPoint>, DashboardError>;
}

/// Repository that always serves the provided points.
#[derive(Debug, Clone, Default)]
pub struct StaticSalesRepository {
    points: Vec<SalesSeriesPoint>,
}

impl StaticSalesRepository {
    /// Builds a repository over a fixed point list.
    pub fn new(points: Vec<SalesSeriesPoint>) -> Self {
        Self { points }
    }
}

#[async_trait]
impl SalesSeriesRepository for StaticSalesRepository {
    async fn fetch_sales_series(
        &self,
        _query: &SalesSeriesQuery,
    ) -> Result<Vec<SalesSeriesPoint>, DashboardError> {
        Ok(self.points.clone())
    }
}

/// Composes dynamic sales data into a cached chart document.
pub struct SalesChartProvider {
    repo: Arc<dyn SalesSeriesRepository>,
    cache: Option<Arc<RenderCache>>,
}

impl SalesChartProvider {
    /// Builds a provider backed by the given repository.
    ///
    /// When `cache` is present, the serialized chart document is memoized
    /// under the recommended `code:instance:variant:hash(config)` key.
    pub fn new(repo: Arc<dyn SalesSeriesRepository>, cache: Option<Arc<RenderCache>>) -> Self {
        Self { repo, cache }
    }

    fn render_document(&self, key: &str, document: &Value) -> Result<String, DashboardError> {
        let render = || {
            serde_json::to_string(document).map_err(|err| DashboardError::Provider {
                code: "sales_chart".to_string(),
                detail: format!("serialize chart document: {}", err),
            })
        };
        match &self.cache {
            Some(cache) => cache.get_or_render(key, render),
            None => render(),
        }
    }
}

#[async_trait]
impl Provider for SalesChartProvider {
    async fn fetch(&self, ctx: &WidgetContext) -> Result<WidgetData, DashboardError> {
        let cfg = &ctx.instance.configuration;
        let period = string_config(cfg, "period", "30d").to_lowercase();
        let metric = string_config(cfg, "metric", "revenue").to_lowercase();
        let segment = string_config(cfg, "segment", "all customers").to_string();
        let comparison = string_config(cfg, "comparison_metric", "").to_lowercase();

        let points = self
            .repo
            .fetch_sales_series(&SalesSeriesQuery {
                period: period.clone(),
                metric: metric.clone(),
                segment: segment.clone(),
                viewer: ctx.viewer.clone(),
            })
            .await?;

        let mut series = vec![json!({
            "name": titleize(&metric),
            "data": series_values(&points),
        })];
        let mut x_axis = axis_labels(&points);

        if !comparison.is_empty() && comparison != metric {
            let alt_points = self
                .repo
                .fetch_sales_series(&SalesSeriesQuery {
                    period: period.clone(),
                    metric: comparison.clone(),
                    segment: segment.clone(),
                    viewer: ctx.viewer.clone(),
                })
                .await?;
            if alt_points.len() > points.len() {
                x_axis = axis_labels(&alt_points);
            }
            series.push(json!({
                "name": titleize(&comparison),
                "data": series_values(&alt_points),
            }));
        }

        let document = json!({
            "title": format!("{} ({})", titleize(&metric), segment),
            "subtitle": period.to_uppercase(),
            "x_axis": x_axis,
            "series": series,
        });

        let key = render_cache_key(
            &ctx.instance.definition_code,
            &ctx.instance.id,
            "line",
            cfg,
        );
        let rendered = self.render_document(&key, &document)?;

        let mut data = WidgetData::new();
        data.insert("chart".to_string(), Value::String(rendered));
        data.insert(
            "source".to_string(),
            json!({
                "metric": metric,
                "period": period,
                "segment": segment,
            }),
        );
        Ok(data)
    }
}

fn series_values(points: &[SalesSeriesPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}

fn axis_labels(points: &[SalesSeriesPoint]) -> Vec<String> {
    points
        .iter()
        .map(|p| p.timestamp.format("%b %-d").to_string())
        .collect()
}

fn titleize(value: &str) -> String {
    let lower = value.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lower,
    }
}

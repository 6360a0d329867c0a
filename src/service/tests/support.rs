//! Shared test doubles for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::service::{Authorizer, Service, ServiceOptions};
use crate::store::{
    AssignWidgetInput, CreateWidgetInstanceInput, ReorderAreaInput, ResolveAreaInput, ResolvedArea,
    UpdateWidgetInstanceInput, WidgetStore,
};
use crate::telemetry::Telemetry;
use crate::broadcast::RefreshHook;
use crate::{
    DashboardError, ViewerContext, WidgetAreaDefinition, WidgetDefinition, WidgetEvent,
    WidgetInstance,
};

pub(super) fn viewer(user_id: &str) -> ViewerContext {
    ViewerContext {
        user_id: user_id.to_string(),
        ..Default::default()
    }
}

pub(super) fn instance(id: &str, definition_code: &str, area_code: &str) -> WidgetInstance {
    WidgetInstance {
        id: id.to_string(),
        definition_code: definition_code.to_string(),
        area_code: area_code.to_string(),
        ..Default::default()
    }
}

pub(super) fn area(code: &str) -> WidgetAreaDefinition {
    WidgetAreaDefinition {
        code: code.to_string(),
        ..Default::default()
    }
}

/// In-memory widget store that records every call.
#[derive(Default)]
pub(super) struct FakeWidgetStore {
    resolved: Mutex<HashMap<String, Vec<WidgetInstance>>>,
    instances: Mutex<HashMap<String, WidgetInstance>>,
    calls: Mutex<Vec<String>>,
    pub(super) assign_calls: Mutex<Vec<AssignWidgetInput>>,
    pub(super) reorder_calls: Mutex<Vec<ReorderAreaInput>>,
    fail_create: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeWidgetStore {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Seeds the instances one area resolves to, in stored order.
    pub(super) fn with_area(self, area_code: &str, widgets: Vec<WidgetInstance>) -> Self {
        for widget in &widgets {
            self.instances
                .lock()
                .insert(widget.id.clone(), widget.clone());
        }
        self.resolved.lock().insert(area_code.to_string(), widgets);
        self
    }

    pub(super) fn failing_create(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(super) fn stored_instance(&self, id: &str) -> Option<WidgetInstance> {
        self.instances.lock().get(id).cloned()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

#[async_trait]
impl WidgetStore for FakeWidgetStore {
    async fn ensure_area(&self, _def: &WidgetAreaDefinition) -> Result<bool, DashboardError> {
        self.record("ensure_area");
        Ok(true)
    }

    async fn ensure_definition(&self, _def: &WidgetDefinition) -> Result<bool, DashboardError> {
        self.record("ensure_definition");
        Ok(true)
    }

    async fn create_instance(
        &self,
        input: CreateWidgetInstanceInput,
    ) -> Result<WidgetInstance, DashboardError> {
        self.record("create_instance");
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DashboardError::Store("create failed".to_string()));
        }
        let id = format!(
            "{}-{}",
            input.definition_code,
            self.next_id.fetch_add(1, Ordering::SeqCst)
        );
        let instance = WidgetInstance {
            id: id.clone(),
            definition_code: input.definition_code,
            configuration: input.configuration,
            metadata: input.metadata,
            ..Default::default()
        };
        self.instances.lock().insert(id, instance.clone());
        Ok(instance)
    }

    async fn get_instance(&self, instance_id: &str) -> Result<WidgetInstance, DashboardError> {
        self.record("get_instance");
        self.instances
            .lock()
            .get(instance_id)
            .cloned()
            .ok_or_else(|| DashboardError::InstanceNotFound(instance_id.to_string()))
    }

    async fn update_instance(
        &self,
        input: UpdateWidgetInstanceInput,
    ) -> Result<WidgetInstance, DashboardError> {
        self.record("update_instance");
        let mut instances = self.instances.lock();
        let instance = instances
            .get_mut(&input.instance_id)
            .ok_or_else(|| DashboardError::InstanceNotFound(input.instance_id.clone()))?;
        if let Some(configuration) = input.configuration {
            instance.configuration = configuration;
        }
        if let Some(metadata) = input.metadata {
            instance.metadata = metadata;
        }
        Ok(instance.clone())
    }

    async fn delete_instance(&self, instance_id: &str) -> Result<(), DashboardError> {
        self.record("delete_instance");
        self.instances.lock().remove(instance_id);
        for widgets in self.resolved.lock().values_mut() {
            widgets.retain(|w| w.id != instance_id);
        }
        Ok(())
    }

    async fn assign_instance(&self, input: AssignWidgetInput) -> Result<(), DashboardError> {
        self.record("assign_instance");
        if let Some(instance) = self.instances.lock().get_mut(&input.instance_id) {
            instance.area_code = input.area_code.clone();
        }
        self.assign_calls.lock().push(input);
        Ok(())
    }

    async fn reorder_area(&self, input: ReorderAreaInput) -> Result<(), DashboardError> {
        self.record("reorder_area");
        self.reorder_calls.lock().push(input);
        Ok(())
    }

    async fn resolve_area(&self, input: ResolveAreaInput) -> Result<ResolvedArea, DashboardError> {
        self.record("resolve_area");
        let widgets = self
            .resolved
            .lock()
            .get(&input.area_code)
            .cloned()
            .unwrap_or_default();
        Ok(ResolvedArea {
            area_code: input.area_code,
            widgets,
        })
    }
}

/// Authorizer permitting only an allow-listed set of instance ids.
pub(super) struct AllowListAuthorizer {
    pub(super) allowed: Vec<String>,
}

#[async_trait]
impl Authorizer for AllowListAuthorizer {
    async fn can_view_widget(&self, _viewer: &ViewerContext, instance: &WidgetInstance) -> bool {
        self.allowed.contains(&instance.id)
    }
}

/// Refresh hook that collects delivered events.
#[derive(Default)]
pub(super) struct CollectingHook {
    pub(super) events: Mutex<Vec<WidgetEvent>>,
}

impl CollectingHook {
    pub(super) fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

#[async_trait]
impl RefreshHook for CollectingHook {
    async fn widget_updated(&self, event: WidgetEvent) -> Result<(), DashboardError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// Refresh hook that always fails; mutations must still succeed.
pub(super) struct FailingHook;

#[async_trait]
impl RefreshHook for FailingHook {
    async fn widget_updated(&self, _event: WidgetEvent) -> Result<(), DashboardError> {
        Err(DashboardError::Store("transport down".to_string()))
    }
}

/// Telemetry sink that records event names.
#[derive(Default)]
pub(super) struct RecordingTelemetry {
    pub(super) events: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    pub(super) fn recorded(&self, event: &str) -> bool {
        self.events.lock().iter().any(|e| e == event)
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&self, event: &str, _payload: serde_json::Value) {
        self.events.lock().push(event.to_string());
    }
}

/// Builds a service over the given store with the given options already
/// partially filled in.
pub(super) fn service_with(store: Arc<FakeWidgetStore>, opts: ServiceOptions) -> Service {
    Service::new(ServiceOptions {
        widget_store: Some(store as Arc<dyn WidgetStore>),
        ..opts
    })
}

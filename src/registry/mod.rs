//! Widget definition and provider registry.
//!
//! The registry is the single source of truth mapping a widget definition
//! code to its schema metadata and to the [`Provider`] that computes its
//! runtime data. One registry is built per process (or tenant) and lives for
//! the process lifetime; rebuilding wholesale is the supported way to change
//! the catalog.
//!
//! Extension happens through explicit [`RegistrationHook`]s replayed at
//! construction time — independently compiled packages contribute widgets by
//! handing the composition root a hook, without the registry knowing about
//! them at compile time — and through pre-parsed manifest entries layered on
//! top via [`Registry::load_manifest`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::providers::Provider;
use crate::{DashboardError, WidgetDefinition};


/// Initializer executed against a freshly constructed registry.
pub type RegistrationHook =
    Box<dyn Fn(&Registry) -> Result<(), DashboardError> + Send + Sync + 'static>;

/// Discovery metadata about a provider implementation, as declared by a
/// widget manifest. Purely informational; the registry never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestProvider {
    /// Provider display name.
    #[serde(default)]
    pub name: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Entry point hint for tooling.
    #[serde(default)]
    pub entry: String,
    /// Package the provider ships in.
    #[serde(default)]
    pub package: String,
    /// Documentation URL.
    #[serde(default)]
    pub docs_url: String,
    /// Capability tags.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Release channel.
    #[serde(default)]
    pub channel: String,
}

impl ManifestProvider {
    fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.summary.is_empty()
            && self.entry.is_empty()
            && self.package.is_empty()
            && self.docs_url.is_empty()
            && self.capabilities.is_empty()
            && self.channel.is_empty()
    }
}

/// One pre-parsed manifest entry: a definition, an optional provider
/// implementation, and discovery metadata. Manifest file parsing (YAML or
/// otherwise) happens outside the core.
pub struct WidgetManifest {
    /// Definition registered for the entry.
    pub definition: WidgetDefinition,
    /// Provider bound to the definition, when the manifest ships one.
    pub provider: Option<Arc<dyn Provider>>,
    /// Discovery metadata recorded alongside the definition.
    pub metadata: ManifestProvider,
}

struct RegistryInner {
    definitions: HashMap<String, WidgetDefinition>,
    providers: HashMap<String, Arc<dyn Provider>>,
    manifest_meta: HashMap<String, ManifestProvider>,
}

/// Concurrency-safe store of widget definitions and provider bindings.
///
/// One read/write lock guards both maps; reads take the shared side. The
/// lock is never held across a call into a provider or any other component.
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                definitions: HashMap::new(),
                providers: HashMap::new(),
                manifest_meta: HashMap::new(),
            }),
        }
    }

    /// Creates a registry and replays `hooks` in order.
    ///
    /// The first failing hook aborts construction; a registry is either
    /// fully initialized or not produced at all.
    pub fn with_hooks(hooks: &[RegistrationHook]) -> Result<Self, DashboardError> {
        let registry = Self::new();
        registry.apply_hooks(hooks)?;
        Ok(registry)
    }

    /// Replays `hooks` against this registry.
    pub fn apply_hooks(&self, hooks: &[RegistrationHook]) -> Result<(), DashboardError> {
        for hook in hooks {
            hook(self)?;
        }
        Ok(())
    }

    /// Stores widget metadata. Re-registering a code overwrites its entry.
    pub fn register_definition(&self, def: WidgetDefinition) -> Result<(), DashboardError> {
        if def.code.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget definition code is required",
            ));
        }
        let mut inner = self.inner.write();
        inner.definitions.insert(def.code.clone(), def);
        Ok(())
    }

    /// Associates a provider implementation with a registered definition.
    ///
    /// Providers cannot precede their definition: registering against an
    /// unknown code fails with [`DashboardError::DefinitionNotFound`].
    pub fn register_provider(
        &self,
        code: &str,
        provider: Arc<dyn Provider>,
    ) -> Result<(), DashboardError> {
        if code.is_empty() {
            return Err(DashboardError::invalid_argument(
                "widget definition code is required to register provider",
            ));
        }
        let mut inner = self.inner.write();
        if !inner.definitions.contains_key(code) {
            return Err(DashboardError::DefinitionNotFound(code.to_string()));
        }
        inner.providers.insert(code.to_string(), provider);
        Ok(())
    }

    /// Fetches a widget definition by code.
    pub fn definition(&self, code: &str) -> Option<WidgetDefinition> {
        self.inner.read().definitions.get(code).cloned()
    }

    /// Fetches the provider bound to a code.
    pub fn provider(&self, code: &str) -> Option<Arc<dyn Provider>> {
        self.inner.read().providers.get(code).cloned()
    }

    /// Returns a snapshot of all registered definitions.
    ///
    /// Iteration order is unspecified; callers needing determinism sort by
    /// code themselves.
    pub fn definitions(&self) -> Vec<WidgetDefinition> {
        self.inner.read().definitions.values().cloned().collect()
    }

    /// Returns any manifest metadata recorded for a code.
    pub fn provider_metadata(&self, code: &str) -> Option<ManifestProvider> {
        self.inner.read().manifest_meta.get(code).cloned()
    }

    /// Registers definitions and providers from pre-parsed manifest entries.
    ///
    /// The batch is validated first: entries must carry a code and a name,
    /// and no two entries may share a code. Validation failures reject the
    /// whole batch before anything is registered.
    pub fn load_manifest(&self, entries: Vec<WidgetManifest>) -> Result<(), DashboardError> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if entry.definition.code.is_empty() {
                return Err(DashboardError::invalid_argument(format!(
                    "manifest widget at index {} is missing definition code",
                    index
                )));
            }
            if entry.definition.name.is_empty() {
                return Err(DashboardError::invalid_argument(format!(
                    "manifest widget {} is missing definition name",
                    entry.definition.code
                )));
            }
            if !seen.insert(entry.definition.code.clone()) {
                return Err(DashboardError::invalid_argument(format!(
                    "manifest duplicates widget code {}",
                    entry.definition.code
                )));
            }
        }
        for entry in entries {
            let code = entry.definition.code.clone();
            self.register_definition(entry.definition)?;
            if let Some(provider) = entry.provider {
                self.register_provider(&code, provider)?;
            }
            if !entry.metadata.is_empty() {
                self.inner.write().manifest_meta.insert(code, entry.metadata);
            }
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Registry")
            .field("definitions", &inner.definitions.len())
            .field("providers", &inner.providers.len())
            .field("manifest_meta", &inner.manifest_meta.len())
            .finish()
    }
}

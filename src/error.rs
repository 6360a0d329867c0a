//! Error types for the dashboard orchestration core.
//!
//! One enum covers the whole core so collaborator traits and the service can
//! propagate failures with `?` without conversion layers. The variants map to
//! the error taxonomy the service enforces: configuration errors surface
//! before any side effect, validation errors before persistence, and
//! not-found errors identify the missing resource.

/// Errors produced by the orchestration core and its collaborator contracts.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// A required argument was missing or malformed. Rejected before any
    /// store mutation or notification is attempted.
    #[error("{0}")]
    InvalidArgument(String),

    /// No widget definition is registered under the given code.
    #[error("widget definition {0} not found")]
    DefinitionNotFound(String),

    /// No widget instance exists for the given id.
    #[error("widget instance {0} not found")]
    InstanceNotFound(String),

    /// Instance configuration did not conform to its definition schema.
    #[error("configuration for {code} failed validation: {detail}")]
    InvalidConfiguration {
        /// Definition code whose schema rejected the payload.
        code: String,
        /// Human-readable description of the violation.
        detail: String,
    },

    /// A definition schema could not be compiled.
    #[error("schema for {code} did not compile: {detail}")]
    InvalidSchema {
        /// Definition code carrying the malformed schema.
        code: String,
        /// Compilation failure detail.
        detail: String,
    },

    /// A provider failed to compute widget data. Non-fatal during layout
    /// enrichment; fatal only when a provider is invoked directly.
    #[error("provider for {code}: {detail}")]
    Provider {
        /// Definition code the provider is bound to.
        code: String,
        /// Fetch failure detail.
        detail: String,
    },

    /// The external widget store reported a failure.
    #[error("widget store: {0}")]
    Store(String),

    /// The preference store reported a failure.
    #[error("preference store: {0}")]
    Preferences(String),
}

impl DashboardError {
    /// Shorthand for an [`DashboardError::InvalidArgument`] with a formatted
    /// message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        DashboardError::InvalidArgument(msg.into())
    }
}

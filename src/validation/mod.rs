//! Schema-based validation of widget instance configuration.
//!
//! Each widget definition may carry a JSON-Schema document describing its
//! configuration. [`SchemaValidator`] compiles that document once per
//! definition code, memoizes the compiled form, and rejects configuration
//! payloads that do not conform before they are ever persisted.
//!
//! The supported schema vocabulary covers what the widget catalog uses:
//! `type` (string or array), `properties`, `required`, `items`, `enum`,
//! `minimum`, and `maximum`. Unknown keywords are ignored, matching the
//! permissive reading most validators apply to unrecognized annotations.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::{ConfigMap, DashboardError, WidgetDefinition};


/// Gate that gives dynamically-shaped configuration structure at the boundary.
pub trait ConfigValidator: Send + Sync {
    /// Checks `config` against the definition's schema.
    ///
    /// A definition without a schema always validates (validation is opt-in
    /// per widget type). Configuration is already a JSON value here; callers
    /// holding native types normalize through `serde_json::to_value` first.
    fn validate(&self, def: &WidgetDefinition, config: &ConfigMap) -> Result<(), DashboardError>;
}

/// Validator that accepts any configuration. Used when callers opt out.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveValidator;

impl ConfigValidator for PermissiveValidator {
    fn validate(&self, _: &WidgetDefinition, _: &ConfigMap) -> Result<(), DashboardError> {
        Ok(())
    }
}

/// Validator backed by compiled, memoized definition schemas.
pub struct SchemaValidator {
    compiled: RwLock<HashMap<String, Arc<CompiledSchema>>>,
}

impl SchemaValidator {
    /// Creates a validator with an empty compilation cache.
    pub fn new() -> Self {
        Self {
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Number of definition codes with a compiled schema. Exposed for
    /// observability and tests.
    pub fn compiled_count(&self) -> usize {
        self.compiled.read().len()
    }

    fn schema_for(
        &self,
        def: &WidgetDefinition,
        doc: &Value,
    ) -> Result<Arc<CompiledSchema>, DashboardError> {
        if let Some(schema) = self.compiled.read().get(&def.code) {
            return Ok(schema.clone());
        }
        let schema = Arc::new(CompiledSchema::compile(&def.code, doc)?);
        self.compiled
            .write()
            .insert(def.code.clone(), schema.clone());
        Ok(schema)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator for SchemaValidator {
    fn validate(&self, def: &WidgetDefinition, config: &ConfigMap) -> Result<(), DashboardError> {
        let Some(doc) = def.schema.as_ref() else {
            return Ok(());
        };
        let schema = self.schema_for(def, doc)?;
        let payload = Value::Object(config.clone());
        schema
            .root
            .check(&payload, "configuration")
            .map_err(|detail| DashboardError::InvalidConfiguration {
                code: def.code.clone(),
                detail,
            })
    }
}

/// A definition schema parsed into a directly checkable form.
struct CompiledSchema {
    root: SchemaNode,
}

impl CompiledSchema {
    fn compile(code: &str, doc: &Value) -> Result<Self, DashboardError> {
        let root = SchemaNode::compile(doc).map_err(|detail| DashboardError::InvalidSchema {
            code: code.to_string(),
            detail,
        })?;
        Ok(Self { root })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaType {
    Object,
    Array,
    Str,
    Integer,
    Number,
    Boolean,
    Null,
}

impl SchemaType {
    fn parse(name: &str) -> Result<Self, String> {
        match name {
            "object" => Ok(SchemaType::Object),
            "array" => Ok(SchemaType::Array),
            "string" => Ok(SchemaType::Str),
            "integer" => Ok(SchemaType::Integer),
            "number" => Ok(SchemaType::Number),
            "boolean" => Ok(SchemaType::Boolean),
            "null" => Ok(SchemaType::Null),
            other => Err(format!("unsupported type keyword {:?}", other)),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            SchemaType::Object => value.is_object(),
            SchemaType::Array => value.is_array(),
            SchemaType::Str => value.is_string(),
            SchemaType::Integer => is_integer(value),
            SchemaType::Number => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Null => value.is_null(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Str => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        }
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value
            .as_f64()
            .map(|f| f.fract() == 0.0 && f.is_finite())
            .unwrap_or(false)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct SchemaNode {
    types: Vec<SchemaType>,
    required: Vec<String>,
    properties: HashMap<String, SchemaNode>,
    items: Option<Box<SchemaNode>>,
    enum_values: Vec<Value>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl SchemaNode {
    fn compile(doc: &Value) -> Result<Self, String> {
        let Some(map) = doc.as_object() else {
            return Err(format!("schema must be an object, got {}", type_name(doc)));
        };
        let mut node = SchemaNode::default();

        match map.get("type") {
            None => {}
            Some(Value::String(name)) => node.types.push(SchemaType::parse(name)?),
            Some(Value::Array(names)) => {
                for name in names {
                    let name = name
                        .as_str()
                        .ok_or_else(|| "type array entries must be strings".to_string())?;
                    node.types.push(SchemaType::parse(name)?);
                }
            }
            Some(other) => {
                return Err(format!(
                    "type must be a string or array, got {}",
                    type_name(other)
                ));
            }
        }

        if let Some(required) = map.get("required") {
            let entries = required
                .as_array()
                .ok_or_else(|| "required must be an array".to_string())?;
            for entry in entries {
                let name = entry
                    .as_str()
                    .ok_or_else(|| "required entries must be strings".to_string())?;
                node.required.push(name.to_string());
            }
        }

        if let Some(properties) = map.get("properties") {
            let entries = properties
                .as_object()
                .ok_or_else(|| "properties must be an object".to_string())?;
            for (name, sub) in entries {
                let compiled = SchemaNode::compile(sub)
                    .map_err(|detail| format!("property {:?}: {}", name, detail))?;
                node.properties.insert(name.clone(), compiled);
            }
        }

        if let Some(items) = map.get("items") {
            let compiled =
                SchemaNode::compile(items).map_err(|detail| format!("items: {}", detail))?;
            node.items = Some(Box::new(compiled));
        }

        if let Some(enum_values) = map.get("enum") {
            let entries = enum_values
                .as_array()
                .ok_or_else(|| "enum must be an array".to_string())?;
            node.enum_values = entries.clone();
        }

        if let Some(minimum) = map.get("minimum") {
            node.minimum = Some(
                minimum
                    .as_f64()
                    .ok_or_else(|| "minimum must be a number".to_string())?,
            );
        }
        if let Some(maximum) = map.get("maximum") {
            node.maximum = Some(
                maximum
                    .as_f64()
                    .ok_or_else(|| "maximum must be a number".to_string())?,
            );
        }

        Ok(node)
    }

    /// Checks `value` against this node, returning the first violation.
    fn check(&self, value: &Value, path: &str) -> Result<(), String> {
        if !self.types.is_empty() && !self.types.iter().any(|t| t.matches(value)) {
            let expected = self
                .types
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(format!(
                "{}: expected {}, got {}",
                path,
                expected,
                type_name(value)
            ));
        }

        if !self.enum_values.is_empty() && !self.enum_values.contains(value) {
            return Err(format!("{}: value {} is not one of the allowed values", path, value));
        }

        if let Some(number) = value.as_f64() {
            if let Some(minimum) = self.minimum {
                if number < minimum {
                    return Err(format!("{}: {} is below minimum {}", path, number, minimum));
                }
            }
            if let Some(maximum) = self.maximum {
                if number > maximum {
                    return Err(format!("{}: {} exceeds maximum {}", path, number, maximum));
                }
            }
        }

        if let Some(map) = value.as_object() {
            for name in &self.required {
                if !map.contains_key(name) {
                    return Err(format!("{}: missing required property {:?}", path, name));
                }
            }
            for (name, sub) in &self.properties {
                if let Some(entry) = map.get(name) {
                    let child_path = if path.is_empty() {
                        name.clone()
                    } else {
                        format!("{}.{}", path, name)
                    };
                    sub.check(entry, &child_path)?;
                }
            }
        }

        if let (Some(items), Some(entries)) = (&self.items, value.as_array()) {
            for (index, entry) in entries.iter().enumerate() {
                items.check(entry, &format!("{}[{}]", path, index))?;
            }
        }

        Ok(())
    }
}

//! Block type registry and attribute schemas.
//!
//! Provides:
//! - `AttributeSchema`: declared attributes (name → type, default)
//! - `BlockTypeDefinition`: block name plus its attribute schema
//! - `BlockTypeRegistry`: registered block types bound to their render callbacks
//!
//! The registry is built once at startup and then shared read-only.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, info};

use super::BlockError;
use crate::html::Markup;

/// The attribute bag of one block instance.
pub type Attributes = serde_json::Map<String, Value>;

/// Semantic type of a block attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl AttributeType {
    /// Coerce a raw value into this type.
    ///
    /// Editors and query strings deliver numbers and booleans as strings, so
    /// `"5"` is a valid number and `"true"`/`"1"` a valid boolean. Returns
    /// `None` when the value cannot represent this type.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::String, Value::String(_)) => Some(value.clone()),
            (Self::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (Self::Number, Value::Number(_)) => Some(value.clone()),
            (Self::Number, Value::String(s)) => parse_number(s).map(Value::Number),

            (Self::Integer, Value::Number(n)) => integer_from_number(n).map(Value::from),
            (Self::Integer, Value::String(s)) => parse_number(s)
                .as_ref()
                .and_then(integer_from_number)
                .map(Value::from),

            (Self::Boolean, Value::Bool(_)) => Some(value.clone()),
            (Self::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" | "" => Some(Value::Bool(false)),
                _ => None,
            },
            (Self::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(1) => Some(Value::Bool(true)),
                Some(0) => Some(Value::Bool(false)),
                _ => None,
            },

            (Self::Object, Value::Object(_)) => Some(value.clone()),
            (Self::Array, Value::Array(_)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn integer_from_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

/// Declaration of a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl AttributeDefinition {
    /// An attribute with no default.
    pub fn new(attribute_type: AttributeType) -> Self {
        Self {
            attribute_type,
            default: None,
        }
    }

    /// Set the default applied when the attribute is absent or unusable.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Attribute schema of a block type, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSchema {
    attributes: BTreeMap<String, AttributeDefinition>,
}

impl AttributeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an attribute declaration.
    pub fn with(mut self, name: &str, definition: AttributeDefinition) -> Self {
        self.attributes.insert(name.to_string(), definition);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.get(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attribute names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Prepare a raw attribute bag for rendering.
    ///
    /// Declared attributes are coerced to their type; absent or uncoercible
    /// values are replaced by the default, or dropped when there is none.
    /// Undeclared attributes pass through untouched.
    pub fn apply(&self, raw: &Attributes) -> Attributes {
        let mut prepared = raw.clone();

        for (name, definition) in &self.attributes {
            let coerced = raw
                .get(name)
                .filter(|v| !v.is_null())
                .and_then(|v| definition.attribute_type.coerce(v));

            match coerced.or_else(|| definition.default.clone()) {
                Some(value) => {
                    prepared.insert(name.clone(), value);
                }
                None => {
                    prepared.remove(name);
                }
            }
        }

        prepared
    }

    /// Validate a raw attribute bag.
    ///
    /// Returns a list of validation error messages. An empty list means the
    /// bag is valid. Null values count as absent.
    pub fn validate(&self, raw: &Attributes) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in raw {
            let Some(definition) = self.attributes.get(name) else {
                errors.push(format!("'{name}' is not a valid attribute"));
                continue;
            };
            if !value.is_null() && definition.attribute_type.coerce(value).is_none() {
                errors.push(format!(
                    "'{name}' must be of type {}",
                    definition.attribute_type.as_str()
                ));
            }
        }

        errors
    }
}

/// Name and attribute schema of a block type.
///
/// Immutable once built; the registry stores it alongside the callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTypeDefinition {
    /// Namespaced block name (e.g. "wds/recent-posts").
    pub name: String,
    pub attributes: AttributeSchema,
}

impl BlockTypeDefinition {
    pub fn new(name: &str, attributes: AttributeSchema) -> Self {
        Self {
            name: name.to_string(),
            attributes,
        }
    }
}

/// Produces markup for one block instance.
///
/// Called with attributes already passed through [`AttributeSchema::apply`].
#[async_trait]
pub trait RenderCallback: Send + Sync {
    async fn render(&self, attributes: &Attributes) -> Markup;
}

struct RegisteredBlock {
    definition: BlockTypeDefinition,
    callback: Arc<dyn RenderCallback>,
}

impl fmt::Debug for RegisteredBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredBlock")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// Registry of block types, keyed by block name.
#[derive(Debug, Default)]
pub struct BlockTypeRegistry {
    blocks: HashMap<String, RegisteredBlock>,
}

impl BlockTypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type and bind its render callback.
    ///
    /// Registering the same name again replaces the earlier registration.
    pub fn register(&mut self, definition: BlockTypeDefinition, callback: Arc<dyn RenderCallback>) {
        let name = definition.name.clone();
        let attributes = definition.attributes.len();
        let replaced = self
            .blocks
            .insert(name.clone(), RegisteredBlock { definition, callback })
            .is_some();

        if replaced {
            info!(block = %name, attributes, "replaced block type registration");
        } else {
            debug!(block = %name, attributes, "registered block type");
        }
    }

    /// Look up a block type by name.
    pub fn get(&self, name: &str) -> Option<&BlockTypeDefinition> {
        self.blocks.get(name).map(|b| &b.definition)
    }

    /// Check whether a block type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Return the number of registered block types.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All definitions, sorted by name.
    pub fn definitions(&self) -> Vec<&BlockTypeDefinition> {
        let mut definitions: Vec<_> = self.blocks.values().map(|b| &b.definition).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Validate a raw attribute bag against a registered block's schema.
    pub fn validate(&self, name: &str, raw: &Attributes) -> Result<(), BlockError> {
        let block = self
            .blocks
            .get(name)
            .ok_or_else(|| BlockError::UnknownBlockType(name.to_string()))?;

        let errors = block.definition.attributes.validate(raw);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BlockError::InvalidAttributes(errors))
        }
    }

    /// Apply schema defaults to `raw` and invoke the block's render callback.
    pub async fn render(&self, name: &str, raw: &Attributes) -> Result<Markup, BlockError> {
        let block = self
            .blocks
            .get(name)
            .ok_or_else(|| BlockError::UnknownBlockType(name.to_string()))?;

        let attributes = block.definition.attributes.apply(raw);
        Ok(block.callback.render(&attributes).await)
    }
}

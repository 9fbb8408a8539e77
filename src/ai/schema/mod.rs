//! Schema Registry
//!
//! Static output shapes for each analysis kind. Descriptors are advisory: they
//! are rendered as JSON Schema into the model prompt, but extraction does not
//! validate against them.

mod definitions;

use std::sync::LazyLock;

use serde_json::{Map, Value, json};

use crate::types::{GenError, Result};

// =============================================================================
// Schema Nodes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<SchemaNode>),
    Object(Vec<FieldSpec>),
}

impl SchemaNode {
    pub fn array(item: SchemaNode) -> Self {
        Self::Array(Box::new(item))
    }

    pub fn object(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        Self::Object(fields.into_iter().collect())
    }

    /// Render as a JSON Schema fragment
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Number => json!({"type": "number"}),
            Self::Integer => json!({"type": "integer"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::Array(item) => json!({"type": "array", "items": item.to_json_schema()}),
            Self::Object(fields) => {
                let mut properties = Map::new();
                for field in fields {
                    properties.insert(field.name.to_string(), field.to_json_schema());
                }
                let required: Vec<&str> = fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| f.name)
                    .collect();
                json!({
                    "type": "object",
                    "required": required,
                    "properties": properties,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub node: SchemaNode,
}

impl FieldSpec {
    pub fn required(name: &'static str, description: &'static str, node: SchemaNode) -> Self {
        Self {
            name,
            required: true,
            description,
            node,
        }
    }

    pub fn optional(name: &'static str, description: &'static str, node: SchemaNode) -> Self {
        Self {
            name,
            required: false,
            description,
            node,
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = self.node.to_json_schema();
        if let Value::Object(map) = &mut schema
            && !self.description.is_empty()
        {
            map.insert("description".to_string(), Value::String(self.description.to_string()));
        }
        schema
    }
}

// =============================================================================
// Descriptors & Registry
// =============================================================================

/// Declared output shape for one analysis kind
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub analysis_kind: &'static str,
    pub description: &'static str,
    pub shape: SchemaNode,
}

impl SchemaDescriptor {
    pub fn to_json_schema(&self) -> Value {
        let mut schema = self.shape.to_json_schema();
        if let Value::Object(map) = &mut schema {
            map.insert("title".to_string(), Value::String(self.analysis_kind.to_string()));
            map.insert(
                "description".to_string(),
                Value::String(self.description.to_string()),
            );
        }
        schema
    }

    /// Names of top-level required fields
    pub fn required_fields(&self) -> Vec<&'static str> {
        match &self.shape {
            SchemaNode::Object(fields) => fields.iter().filter(|f| f.required).map(|f| f.name).collect(),
            _ => Vec::new(),
        }
    }
}

pub struct SchemaRegistry {
    descriptors: Vec<SchemaDescriptor>,
}

static REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(|| SchemaRegistry {
    descriptors: definitions::builtin(),
});

impl SchemaRegistry {
    /// Process-wide registry of built-in kinds
    pub fn global() -> &'static SchemaRegistry {
        &REGISTRY
    }

    /// Case-insensitive lookup; `-` and `_` are interchangeable
    pub fn lookup(&self, kind: &str) -> Result<&SchemaDescriptor> {
        let normalized = kind.trim().to_lowercase().replace('-', "_");
        self.descriptors
            .iter()
            .find(|d| d.analysis_kind == normalized)
            .ok_or_else(|| GenError::UnknownAnalysisKind(kind.trim().to_string()))
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.analysis_kind).collect()
    }

    pub fn descriptors(&self) -> &[SchemaDescriptor] {
        &self.descriptors
    }
}

/// Look up a built-in schema
pub fn lookup_schema(kind: &str) -> Result<&'static SchemaDescriptor> {
    SchemaRegistry::global().lookup(kind)
}

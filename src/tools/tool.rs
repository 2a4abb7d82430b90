//! Tool trait, function schemas, and the closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::arguments::ToolArguments;
use crate::error::Result;

/// Declared interface of a callable tool, advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// Function name the model uses to call this tool.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema object describing the accepted arguments.
    pub parameters: serde_json::Value,
}

impl FunctionSchema {
    /// Schema for a tool that takes no arguments.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        }
    }

    /// Builder: declare an object schema property by property.
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            description: description.into(),
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }
}

/// Builder for constructing tool argument schemas.
pub struct SchemaBuilder {
    name: String,
    description: String,
    properties: serde_json::Map<String, serde_json::Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Add a string property.
    pub fn string(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            serde_json::json!({
                "type": "string",
                "description": description.into(),
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Add a number property.
    pub fn number(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            serde_json::json!({
                "type": "number",
                "description": description.into(),
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Add a boolean property.
    pub fn boolean(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            serde_json::json!({
                "type": "boolean",
                "description": description.into(),
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            serde_json::json!({
                "type": "string",
                "description": description.into(),
                "enum": values,
            }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Build the finished schema.
    pub fn build(self) -> FunctionSchema {
        FunctionSchema {
            name: self.name,
            description: self.description,
            parameters: serde_json::json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}

/// Core tool trait; implement it to create custom tools.
///
/// Implementations must tolerate concurrent invocation; the executor may
/// run several calls to the same instance at once.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The advertised schema. Dispatch matches on `schema().name`.
    fn schema(&self) -> &FunctionSchema;

    /// Execute the tool with decoded arguments, returning textual output.
    async fn invoke(&self, args: &ToolArguments) -> Result<String>;
}

/// Type alias for the tool handler function.
type ToolHandler =
    dyn Fn(ToolArguments) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync;

/// Closure-based tool for quick tool creation.
pub struct ClosureTool {
    schema: FunctionSchema,
    handler: Arc<ToolHandler>,
}

impl ClosureTool {
    /// Create a tool from a schema and a closure.
    pub fn new<F, Fut>(schema: FunctionSchema, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            schema,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

#[async_trait]
impl Tool for ClosureTool {
    fn schema(&self) -> &FunctionSchema {
        &self.schema
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<String> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for ClosureTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureTool")
            .field("name", &self.schema.name)
            .field("description", &self.schema.description)
            .finish()
    }
}

//! Registry mapping declared function names to tool instances.

use std::collections::HashMap;
use std::sync::Arc;

use super::tool::{FunctionSchema, Tool};

/// Holds the tools available to an agent, keyed by the function name each
/// tool declares in its schema. The name is resolved once at registration,
/// never re-derived per call.
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its declared schema name. Registering a second
    /// tool with the same name replaces the first.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name.clone();
        match self.index.get(&name) {
            Some(&pos) => {
                tracing::warn!(tool = %name, "replacing previously registered tool");
                self.order[pos] = tool;
            }
            None => {
                self.index.insert(name, self.order.len());
                self.order.push(tool);
            }
        }
    }

    /// Look up a tool by declared function name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&pos| Arc::clone(&self.order[pos]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Schemas of all registered tools, in registration order. This is what
    /// gets advertised to the model on every request.
    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.order.iter().map(|t| t.schema().clone()).collect()
    }

    /// Registered function names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|t| t.schema().name.as_str()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

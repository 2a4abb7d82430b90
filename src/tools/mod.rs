//! Tool system for function calling.

pub mod arguments;
pub mod registry;
pub mod tool;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{ClosureTool, FunctionSchema, SchemaBuilder, Tool};

//! # aitool
//!
//! aitool.json 工具规范的 Rust 运行时：加载、校验、执行，以及声明式错误恢复。
//!
//! Runtime for declarative `aitool.json` tool specifications.
//!
//! ## Overview
//!
//! A tool document describes a callable capability: identity, input/output
//! schemas, an endpoint naming its implementation, when an agent should pick it,
//! and how its failures should be recovered. This crate loads such documents,
//! binds them to registered Rust handlers, and executes them with input
//! validation, advisory output validation and rule-driven error recovery.
//!
//! ## Core Philosophy
//!
//! - **Document-Driven**: retry counts, backoff schedules and user notices live in
//!   the tool document, not in code
//! - **Explicit Binding**: implementations are registered in a [`FunctionTable`]
//!   under `(module, function)`; nothing is loaded dynamically
//! - **Observable**: every stage is reported to an injected [`EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aitool::{ExecutionEngine, FunctionTable, Tool};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> aitool::Result<()> {
//!     let functions = Arc::new(FunctionTable::new());
//!     functions.register_sync("shop.search", "search_products", |params| {
//!         Ok(json!({ "products": [], "query": params.get("query").cloned() }))
//!     });
//!
//!     let tool = Tool::from_file("tools/search_products.aitool.json").await?;
//!     let engine = ExecutionEngine::new(functions);
//!
//!     let params = json!({ "query": "laptop" }).as_object().cloned().unwrap_or_default();
//!     let result = engine.run(&tool, &params).await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`spec`] | Tool document model, loading and document-schema validation |
//! | [`tool`] | A loaded tool with cached implementation binding |
//! | [`function`] | Handler trait and the `(module, function)` table |
//! | [`engine`] | Execution pipeline and error recovery |
//! | [`registry`] | Tool lookup by id, name, category, tags and triggers |
//! | [`events`] | Execution events and observability sinks |
//! | [`validation`] | JSON Schema validator boundary |
//! | [`contract`] | Contract tests declared in tool documents |
//! | [`template`] | Starter documents for new tools |
//! | [`logging`] | Subscriber setup |

pub mod contract;
pub mod engine;
pub mod events;
pub mod function;
pub mod logging;
pub mod registry;
pub mod spec;
pub mod template;
pub mod tool;
pub mod validation;

// Re-export main types for convenience
pub use engine::{EngineConfig, ExecuteOptions, ExecutionEngine};
pub use events::{EventSink, ExecutionEvent};
pub use function::{global_functions, FunctionTable, InvocationError, Params, ResolutionError, ToolFunction};
pub use registry::{RegistryError, ToolQuery, ToolRegistry};
pub use spec::{RecoveryStrategy, SpecError, ToolSpec};
pub use tool::Tool;
pub use validation::{JsonSchemaValidator, SchemaValidator};

use std::path::Path;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Load a single tool document.
pub async fn load_tool(path: impl AsRef<Path>) -> Result<Tool> {
    Ok(Tool::from_file(path).await?)
}

/// Load every tool under `dir`; see [`ToolRegistry::from_directory`].
pub async fn load_registry(dir: impl AsRef<Path>) -> Result<ToolRegistry> {
    Ok(ToolRegistry::from_directory(dir).await?)
}

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

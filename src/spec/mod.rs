//! 工具规范层：负责加载、解析和校验 aitool.json 工具文档。
//!
//! # Tool Specification Layer
//!
//! This module turns declarative tool documents into typed structures. Parsing is
//! pure: it never touches the network and never loads code.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Whole-document parsing into [`ToolSpec`] |
//! | [`manifest`] | Identity metadata, categories, registry status |
//! | [`capabilities`] | Descriptive capability flags |
//! | [`execution`] | Endpoint descriptor, parameter and return schemas |
//! | [`guidance`] | Usage guidance and triggers |
//! | [`recovery`] | Error recovery rules and strategies |
//! | [`loader`] | Reading documents from JSON/YAML files |
//! | [`validator`] | Validating a raw document against a document schema |
//! | [`error`] | Specification error types |
//!
//! ## Example
//!
//! ```rust,no_run
//! use aitool::spec::{SpecLoader, SpecValidator};
//!
//! #[tokio::main]
//! async fn main() -> aitool::Result<()> {
//!     let loader = SpecLoader::new();
//!     let raw = loader.load_value("tools/search_database.aitool.json").await?;
//!     SpecValidator::new().validate(&raw)?;
//!
//!     let spec = aitool::spec::ToolSpec::from_value(raw)?;
//!     println!("Tool: {} v{}", spec.manifest.name, spec.manifest.version);
//!     Ok(())
//! }
//! ```

pub mod capabilities;
pub mod document;
pub mod error;
pub mod execution;
pub mod guidance;
pub mod loader;
pub mod manifest;
pub mod recovery;
pub mod validator;

pub use capabilities::Capabilities;
pub use document::{ToolSpec, REQUIRED_SECTIONS};
pub use error::SpecError;
pub use execution::{EndpointSpec, ExecutionSpec, ReturnsSpec};
pub use guidance::{Trigger, UsageGuidance};
pub use loader::{DocumentFormat, SpecLoader};
pub use manifest::{Category, ToolManifest, ToolStatus};
pub use recovery::{ErrorRecovery, RecoveryStrategy};
pub use validator::SpecValidator;

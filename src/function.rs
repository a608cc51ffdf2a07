//! 函数解析：将执行端点描述解析为可调用的处理函数。
//!
//! Function resolution.
//!
//! Tool documents name their implementation as `(module, function)`. Instead of
//! loading code dynamically, handlers are registered up front in a [`FunctionTable`]
//! and looked up by that string pair.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::spec::execution::{ExecutionSpec, FUNCTION_CALL_PROTOCOL};

/// Named parameters passed to a tool function.
pub type Params = Map<String, Value>;

/// Failure raised by a tool function while it runs.
///
/// `kind` plays the role of an exception class name: recovery rules match it
/// against their `error_code`. `message` is what `error_type` is searched in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct InvocationError {
    pub kind: String,
    pub message: String,
}

impl InvocationError {
    pub const GENERIC: &'static str = "ToolExecutionError";
    pub const TIMEOUT: &'static str = "TimeoutError";
    pub const RATE_LIMIT: &'static str = "RateLimitError";

    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(Self::GENERIC, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(Self::RATE_LIMIT, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            Self::TIMEOUT,
            format!("timed out after {:.3}s", after.as_secs_f64()),
        )
    }
}

/// Endpoint could not be turned into a callable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Protocol '{0}' not yet supported")]
    UnsupportedProtocol(String),

    #[error("Endpoint type '{0}' not yet supported")]
    UnsupportedEndpoint(String),

    #[error("Endpoint is missing '{0}'")]
    IncompleteEndpoint(&'static str),

    #[error("Could not load function {namespace}.{function}: namespace not registered")]
    NamespaceNotFound { namespace: String, function: String },

    #[error("Could not load function {namespace}.{function}: function not registered")]
    FunctionNotFound { namespace: String, function: String },
}

/// An invocable tool implementation.
#[async_trait]
pub trait ToolFunction: Send + Sync {
    async fn call(&self, params: Params) -> Result<Value, InvocationError>;
}

#[async_trait]
impl<F, Fut> ToolFunction for F
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, InvocationError>> + Send,
{
    async fn call(&self, params: Params) -> Result<Value, InvocationError> {
        (self)(params).await
    }
}

/// Runs on the blocking pool so an execution timeout can still fire.
struct SyncFunction<F>(Arc<F>);

#[async_trait]
impl<F> ToolFunction for SyncFunction<F>
where
    F: Fn(&Params) -> Result<Value, InvocationError> + Send + Sync + 'static,
{
    async fn call(&self, params: Params) -> Result<Value, InvocationError> {
        let f = self.0.clone();
        tokio::task::spawn_blocking(move || f(&params))
            .await
            .map_err(|e| InvocationError::generic(format!("task failed: {e}")))?
    }
}

type Namespace = HashMap<String, Arc<dyn ToolFunction>>;

/// Capability-registration table: `namespace -> function -> handler`.
#[derive(Default)]
pub struct FunctionTable {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = guard
            .iter()
            .flat_map(|(ns, fns)| fns.keys().map(move |f| format!("{}.{}", ns, f)))
            .collect();
        names.sort();
        f.debug_struct("FunctionTable")
            .field("registered", &names)
            .finish()
    }
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a handler.
    pub fn register<T>(&self, namespace: impl Into<String>, function: impl Into<String>, handler: T)
    where
        T: ToolFunction + 'static,
    {
        self.register_arc(namespace, function, Arc::new(handler));
    }

    pub fn register_arc(
        &self,
        namespace: impl Into<String>,
        function: impl Into<String>,
        handler: Arc<dyn ToolFunction>,
    ) {
        let mut guard = self.namespaces.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .entry(namespace.into())
            .or_default()
            .insert(function.into(), handler);
    }

    /// Register a plain synchronous closure.
    ///
    /// The closure runs on tokio's blocking pool. On timeout the caller gets a
    /// `TimeoutError` right away, but the closure itself runs to completion.
    pub fn register_sync<F>(&self, namespace: impl Into<String>, function: impl Into<String>, f: F)
    where
        F: Fn(&Params) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.register(namespace, function, SyncFunction(Arc::new(f)));
    }

    pub fn contains(&self, namespace: &str, function: &str) -> bool {
        let guard = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .get(namespace)
            .map(|ns| ns.contains_key(function))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        let guard = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        guard.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve an execution descriptor to its handler.
    pub fn resolve(&self, execution: &ExecutionSpec) -> Result<Arc<dyn ToolFunction>, ResolutionError> {
        if execution.protocol != FUNCTION_CALL_PROTOCOL {
            return Err(ResolutionError::UnsupportedProtocol(execution.protocol.clone()));
        }
        let endpoint = &execution.endpoint;
        if !endpoint.is_named_function() {
            return Err(ResolutionError::UnsupportedEndpoint(endpoint.kind.clone()));
        }
        let namespace = endpoint
            .module
            .as_deref()
            .ok_or(ResolutionError::IncompleteEndpoint("module"))?;
        let function = endpoint
            .function
            .as_deref()
            .ok_or(ResolutionError::IncompleteEndpoint("function"))?;

        let guard = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        let ns = guard
            .get(namespace)
            .ok_or_else(|| ResolutionError::NamespaceNotFound {
                namespace: namespace.to_string(),
                function: function.to_string(),
            })?;
        ns.get(function)
            .cloned()
            .ok_or_else(|| ResolutionError::FunctionNotFound {
                namespace: namespace.to_string(),
                function: function.to_string(),
            })
    }
}

static GLOBAL_FUNCTIONS: once_cell::sync::Lazy<Arc<FunctionTable>> =
    once_cell::sync::Lazy::new(|| Arc::new(FunctionTable::new()));

/// Process-wide table, populated at startup and used by [`crate::ExecutionEngine::default`].
pub fn global_functions() -> Arc<FunctionTable> {
    GLOBAL_FUNCTIONS.clone()
}

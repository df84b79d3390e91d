//! Tool callables and result rendering.
//!
//! A tool's function is either blocking or async. The executor picks the
//! invocation strategy; the tool only declares which kind it is.

use crate::arguments::ValidatedArguments;
use crate::tools::error::ToolError;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The result type for async tool futures.
pub type ToolExecutionFuture =
    Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'static>>;

type BlockingFn = dyn Fn(ValidatedArguments) -> Result<Value, ToolError> + Send + Sync;
type AsyncFn = dyn Fn(ValidatedArguments) -> ToolExecutionFuture + Send + Sync;
type RenderFn = dyn Fn(&Value) -> Result<String, ToolError> + Send + Sync;

/// The function behind a tool.
#[derive(Clone)]
pub enum Callable {
    /// Runs to completion on the calling thread
    Blocking(Arc<BlockingFn>),
    /// Returns a future
    Async(Arc<AsyncFn>),
}

impl Callable {
    /// Wraps a blocking function.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(ValidatedArguments) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }

    /// Wraps an async function.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(ValidatedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self::Async(Arc::new(move |args| Box::pin(f(args))))
    }

    /// Returns true for async callables.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("Callable::Blocking"),
            Self::Async(_) => f.write_str("Callable::Async"),
        }
    }
}

/// Turns a tool's raw return value into conversation content.
#[derive(Clone)]
pub struct Renderer(Arc<RenderFn>);

impl Renderer {
    /// Wraps a render function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Renders a result.
    ///
    /// # Errors
    ///
    /// Propagates the render function's error; the executor substitutes the
    /// tool's error content.
    pub fn render(&self, result: &Value) -> Result<String, ToolError> {
        (self.0)(result)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(|value| Ok(render_default(value)))
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Renderer")
    }
}

/// The default string cast.
///
/// Strings are returned verbatim; everything else is compact JSON, which
/// is deterministic for a given value.
#[must_use]
pub fn render_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_render_passes_strings_through() {
        assert_eq!(render_default(&json!("sunny")), "sunny");
    }

    #[test]
    fn default_render_serializes_structures() {
        assert_eq!(render_default(&json!({"rate": 1.5})), r#"{"rate":1.5}"#);
        assert_eq!(render_default(&json!(null)), "null");
        assert_eq!(render_default(&json!(42)), "42");
    }

    #[test]
    fn custom_renderer_is_used() {
        let renderer = Renderer::new(|v| Ok(format!("temp: {}", v["c"])));
        assert_eq!(renderer.render(&json!({"c": 21})).unwrap(), "temp: 21");
    }

    #[tokio::test]
    async fn async_callable_produces_value() {
        let callable = Callable::from_async(|args: ValidatedArguments| async move {
            Ok(json!({"n": args.as_map().len()}))
        });
        assert!(callable.is_async());
        let Callable::Async(f) = callable else {
            unreachable!()
        };
        assert_eq!(f(ValidatedArguments::default()).await.unwrap(), json!({"n": 0}));
    }
}

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]

//! The sandbox host turns owner-supplied source text into an invocable
//! handler and runs it in an isolated guest context. Two guest languages
//! are supported: JavaScript (boa, one engine context per handler on a
//! dedicated worker thread) and Python (pyo3, one module namespace per
//! handler, GIL work on the blocking pool).
//!
//! Handlers are released by dropping the last [`Arc`] that points at
//! them; a release racing an in-flight invocation defers the actual
//! teardown until that invocation returns.

mod error;
mod js;
mod py;

use std::sync::Arc;

use atelier_types::entity::Language;
use serde_json::{json, Map, Value};

pub use error::{CompileError, InvokeError};

/// Bounds applied to JavaScript guest execution. Python guests cannot be
/// interrupted mid-flight; runaway Python handlers are abandoned by the
/// dispatcher's wall-clock budget instead.
#[derive(Debug, Clone)]
pub struct RuntimeLimits {
    pub loop_iterations: u64,
    pub recursion: usize,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            loop_iterations: 1_000_000_000,
            recursion: 512,
        }
    }
}

/// Outcome of a compilation. The handler is always present: a failed
/// compile yields a stub that reports `error` on every invocation.
pub struct Compiled {
    pub handler: Arc<Handler>,
    pub error: Option<CompileError>,
}

pub struct SandboxHost {
    limits: RuntimeLimits,
}

impl Default for SandboxHost {
    fn default() -> Self {
        Self::new(RuntimeLimits::default())
    }
}

impl SandboxHost {
    #[must_use]
    pub fn new(limits: RuntimeLimits) -> Self {
        Self { limits }
    }

    /// Compile guest source into a handler. Never fails: broken source
    /// produces a stub handler carrying the compile error.
    pub async fn compile(&self, language: Language, source: &str) -> Compiled {
        let compiled = match language {
            Language::Javascript => js::compile(source, &self.limits).await.map(Kind::Js),
            Language::Python => py::compile(source).await.map(Kind::Py),
        };
        match compiled {
            Ok(kind) => Compiled {
                handler: Arc::new(Handler { kind }),
                error: None,
            },
            Err(error) => {
                let kind = Kind::Stub {
                    language,
                    details: error.to_string(),
                };
                Compiled {
                    handler: Arc::new(Handler { kind }),
                    error: Some(error),
                }
            }
        }
    }
}

enum Kind {
    Js(js::JsHandler),
    Py(py::PyHandler),
    Stub { language: Language, details: String },
}

/// An invocable guest handler. Dropping the last reference releases the
/// guest context (worker thread or interpreter objects).
pub struct Handler {
    kind: Kind,
}

impl Handler {
    /// Invoke the handler with the request parameter dictionary and
    /// return its JSON result.
    ///
    /// # Errors
    ///
    /// Returns an error when the guest code raises, returns something
    /// that is not representable as JSON, or the guest context is gone.
    pub async fn invoke(&self, params: Map<String, Value>) -> Result<Value, InvokeError> {
        match &self.kind {
            Kind::Js(handler) => handler.invoke(params).await,
            Kind::Py(handler) => handler.invoke(params).await,
            Kind::Stub { language, details } => Ok(json!({
                "error": format!("{} compilation error", language.display_name()),
                "details": details,
            })),
        }
    }

    /// Whether this handler is a compile-error stub.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        matches!(self.kind, Kind::Stub { .. })
    }
}

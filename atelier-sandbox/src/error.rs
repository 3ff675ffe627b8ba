use thiserror::Error;

/// Failure to turn source text into an invocable handler.
///
/// A compile error never blocks registration: the host hands out a stub
/// handler that reports the stored error on every invocation, so a broken
/// endpoint stays visible over HTTP instead of silently missing.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("source does not define a callable `endpoint_function`")]
    NotAFunction,
    #[error("{0}")]
    Evaluation(String),
}

/// Failure while running an already compiled handler.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{0}")]
    Runtime(String),
    #[error("handler has been released")]
    Released,
    #[error("sandbox worker crashed")]
    Panicked,
}

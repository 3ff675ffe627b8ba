use boa_engine::{property::Attribute, Context, JsObject, JsValue, Source};
use boa_runtime::Console;
use serde_json::{json, Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::{CompileError, InvokeError, RuntimeLimits};

const ENDPOINT_FUNCTION: &str = "endpoint_function";

struct InvokeMessage {
    params: Map<String, Value>,
    reply: oneshot::Sender<Result<Value, InvokeError>>,
}

/// A compiled JavaScript handler. The engine context is not `Send`, so it
/// lives on a dedicated worker thread for the lifetime of the handler;
/// invocations are marshalled over a channel. Dropping the handler closes
/// the channel, which lets the worker drain queued calls and exit.
pub(crate) struct JsHandler {
    tx: mpsc::UnboundedSender<InvokeMessage>,
}

pub(crate) async fn compile(
    source: &str,
    limits: &RuntimeLimits,
) -> Result<JsHandler, CompileError> {
    let source = source.to_owned();
    let limits = limits.clone();
    let (ready_tx, ready_rx) = oneshot::channel();
    let (tx, rx) = mpsc::unbounded_channel::<InvokeMessage>();

    std::thread::Builder::new()
        .name("js-endpoint".into())
        .spawn(move || worker(&source, &limits, ready_tx, rx))
        .map_err(|err| CompileError::Evaluation(format!("failed to spawn sandbox worker: {err}")))?;

    match ready_rx.await {
        Ok(Ok(())) => Ok(JsHandler { tx }),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(CompileError::Evaluation(
            "sandbox worker terminated during compilation".into(),
        )),
    }
}

impl JsHandler {
    pub(crate) async fn invoke(&self, params: Map<String, Value>) -> Result<Value, InvokeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(InvokeMessage { params, reply })
            .map_err(|_| InvokeError::Released)?;
        rx.await.map_err(|_| InvokeError::Released)?
    }
}

fn worker(
    source: &str,
    limits: &RuntimeLimits,
    ready_tx: oneshot::Sender<Result<(), CompileError>>,
    mut rx: mpsc::UnboundedReceiver<InvokeMessage>,
) {
    let (mut context, function) = match build_context(source, limits) {
        Ok(built) => built,
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };
    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    // Drains queued calls after release, then observes the closed channel
    // and exits.
    while let Some(message) = rx.blocking_recv() {
        let result = invoke_in_context(&function, message.params, &mut context);
        if message.reply.send(result).is_err() {
            // The caller timed out or hung up; the result is discarded.
            debug!("dropping result of abandoned invocation");
        }
    }
}

/// Evaluate the source in a fresh context that exposes only `console`,
/// then pull out the global `endpoint_function`.
fn build_context(
    source: &str,
    limits: &RuntimeLimits,
) -> Result<(Context<'static>, JsObject), CompileError> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(limits.loop_iterations);
    context.runtime_limits_mut().set_recursion_limit(limits.recursion);

    let console = Console::init(&mut context);
    context
        .register_global_property(Console::NAME, console, Attribute::all())
        .map_err(|err| CompileError::Evaluation(err.to_string()))?;

    context
        .eval(Source::from_bytes(source))
        .map_err(|err| CompileError::Evaluation(err.to_string()))?;

    let function = context
        .global_object()
        .get(ENDPOINT_FUNCTION, &mut context)
        .map_err(|err| CompileError::Evaluation(err.to_string()))?;
    let function = function
        .as_object()
        .filter(|object| object.is_callable())
        .cloned()
        .ok_or(CompileError::NotAFunction)?;

    Ok((context, function))
}

fn invoke_in_context(
    function: &JsObject,
    params: Map<String, Value>,
    context: &mut Context<'_>,
) -> Result<Value, InvokeError> {
    let argument = JsValue::from_json(&Value::Object(params), context)
        .map_err(|err| InvokeError::Runtime(err.to_string()))?;
    let returned = function
        .call(&JsValue::undefined(), &[argument], context)
        .map_err(|err| InvokeError::Runtime(err.to_string()))?;

    if returned.is_undefined() || returned.is_null() {
        return Ok(Value::Null);
    }
    // Functions, symbols and other engine-only values have no JSON form.
    Ok(returned
        .to_json(context)
        .unwrap_or_else(|_| json!({ "error": "non-serializable result" })))
}

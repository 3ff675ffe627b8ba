use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyList, PyTuple};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::{CompileError, InvokeError};

/// A compiled Python handler: the `endpoint_function` object of a
/// uniquely named module. GIL work happens on the blocking pool.
#[derive(Debug)]
pub(crate) struct PyHandler {
    function: Py<PyAny>,
}

pub(crate) async fn compile(source: &str) -> Result<PyHandler, CompileError> {
    let wrapped = wrap_source(source);
    let module_name = format!("atelier_endpoint_{}", Uuid::new_v4().simple());
    tokio::task::spawn_blocking(move || {
        Python::with_gil(|py| {
            let module =
                PyModule::from_code_bound(py, &wrapped, "endpoint_function.py", &module_name)
                    .map_err(|err| CompileError::Evaluation(err.to_string()))?;
            let function = module
                .getattr("endpoint_function")
                .map_err(|_| CompileError::NotAFunction)?;
            if !function.is_callable() {
                return Err(CompileError::NotAFunction);
            }
            Ok(PyHandler {
                function: function.unbind(),
            })
        })
    })
    .await
    .map_err(|_| CompileError::Evaluation("sandbox worker crashed during compilation".into()))?
}

impl PyHandler {
    pub(crate) async fn invoke(&self, params: Map<String, Value>) -> Result<Value, InvokeError> {
        let function = Python::with_gil(|py| self.function.clone_ref(py));
        tokio::task::spawn_blocking(move || {
            Python::with_gil(|py| {
                let argument = json_to_py(py, &Value::Object(params))
                    .map_err(|err| InvokeError::Runtime(format!("Python execution error: {err}")))?;
                let returned = function.bind(py).call1((argument,)).map_err(|err| {
                    InvokeError::Runtime(format!("Python execution error: {err}"))
                })?;
                py_result_to_json(&returned)
            })
        })
        .await
        .map_err(|_| InvokeError::Panicked)?
    }
}

/// The owner supplies the *body* of the handler; wrap it into a generated
/// `def endpoint_function(params):` with uniform indentation.
fn wrap_source(source: &str) -> String {
    let mut wrapped = String::from("def endpoint_function(params):\n");
    if source.trim().is_empty() {
        wrapped.push_str("    return None\n");
        return wrapped;
    }
    for line in source.lines() {
        wrapped.push_str("    ");
        wrapped.push_str(line);
        wrapped.push('\n');
    }
    wrapped
}

fn py_result_to_json(returned: &Bound<'_, PyAny>) -> Result<Value, InvokeError> {
    if returned.is_none() {
        return Ok(Value::Null);
    }
    if !returned.is_instance_of::<PyDict>() {
        return Err(InvokeError::Runtime(
            "Python execution error: endpoint_function must return a JSON-serializable dictionary"
                .into(),
        ));
    }
    py_to_json(returned).map_err(|err| InvokeError::Runtime(format!("Python execution error: {err}")))
}

fn json_to_py(py: Python<'_>, value: &Value) -> Result<PyObject, String> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(value) => value.into_py(py),
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                value.into_py(py)
            } else if let Some(value) = number.as_u64() {
                value.into_py(py)
            } else {
                number
                    .as_f64()
                    .ok_or_else(|| "unrepresentable number".to_string())?
                    .into_py(py)
            }
        }
        Value::String(value) => value.into_py(py),
        Value::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(json_to_py(py, item)?)
                    .map_err(|err| err.to_string())?;
            }
            list.into_py(py)
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)
                    .map_err(|err| err.to_string())?;
            }
            dict.into_py(py)
        }
    })
}

fn py_to_json(object: &Bound<'_, PyAny>) -> Result<Value, String> {
    if object.is_none() {
        return Ok(Value::Null);
    }
    // Bools must be checked before ints: a Python bool extracts as i64.
    if let Ok(value) = object.downcast::<PyBool>() {
        return Ok(Value::Bool(value.is_true()));
    }
    if let Ok(value) = object.extract::<i64>() {
        return Ok(Value::Number(value.into()));
    }
    if let Ok(value) = object.extract::<f64>() {
        return Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| "non-finite float".to_string());
    }
    if let Ok(value) = object.extract::<String>() {
        return Ok(Value::String(value));
    }
    if let Ok(list) = object.downcast::<PyList>() {
        let mut items = Vec::with_capacity(list.len());
        for item in list.iter() {
            items.push(py_to_json(&item)?);
        }
        return Ok(Value::Array(items));
    }
    if let Ok(tuple) = object.downcast::<PyTuple>() {
        let mut items = Vec::with_capacity(tuple.len());
        for item in tuple.iter() {
            items.push(py_to_json(&item)?);
        }
        return Ok(Value::Array(items));
    }
    if let Ok(dict) = object.downcast::<PyDict>() {
        let mut map = Map::new();
        for (key, item) in dict.iter() {
            let key = key
                .extract::<String>()
                .map_err(|_| "dictionary keys must be strings".to_string())?;
            map.insert(key, py_to_json(&item)?);
        }
        return Ok(Value::Object(map));
    }
    let type_name = object
        .get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "object".into());
    Err(format!("`{type_name}` is not JSON-serializable"))
}

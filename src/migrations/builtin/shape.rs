//! Defensive accessors over the environment document shape.
//!
//! Documents reach the engine unvalidated. A collection that is absent is
//! treated as empty; a value of the wrong JSON type is a [`TransformError`]
//! pointing at the offending location.

use serde_json::{Map, Value};

use crate::errors::TransformError;

pub(super) type Object = Map<String, Value>;

pub(super) fn root(doc: &mut Value) -> Result<&mut Object, TransformError> {
    match doc {
        Value::Object(object) => Ok(object),
        other => Err(TransformError::unexpected_type("/", "an object", other)),
    }
}

pub(super) fn as_object<'a>(value: &'a mut Value, pointer: &str) -> Result<&'a mut Object, TransformError> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(TransformError::unexpected_type(pointer, "an object", other)),
    }
}

/// Array field of `object`, `None` when absent or null.
pub(super) fn array_mut<'a>(
    object: &'a mut Object,
    key: &str,
    pointer: &str,
) -> Result<Option<&'a mut Vec<Value>>, TransformError> {
    match object.get_mut(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(TransformError::unexpected_type(
            format!("{}/{}", pointer, key),
            "an array",
            other,
        )),
    }
}

/// Array field of `object`, created empty when absent or null.
pub(super) fn array_or_default<'a>(
    object: &'a mut Object,
    key: &str,
    pointer: &str,
) -> Result<&'a mut Vec<Value>, TransformError> {
    if matches!(object.get(key), None | Some(Value::Null)) {
        object.insert(key.to_string(), Value::Array(Vec::new()));
    }
    match object.get_mut(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(TransformError::unexpected_type(
            format!("{}/{}", pointer, key),
            "an array",
            other,
        )),
        None => Err(TransformError::at(pointer, format!("missing {}", key))),
    }
}

/// Insert `value` under `key` unless the key is already present.
pub(super) fn insert_default(object: &mut Object, key: &str, value: Value) {
    object.entry(key.to_string()).or_insert(value);
}

/// Remove `key` while keeping the order of the remaining keys.
pub(super) fn take(object: &mut Object, key: &str) -> Option<Value> {
    object.shift_remove(key)
}

/// Remove an optional boolean flag. Absent and null read as `None`.
pub(super) fn take_bool(object: &mut Object, key: &str, pointer: &str) -> Result<Option<bool>, TransformError> {
    match take(object, key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(other) => Err(TransformError::unexpected_type(
            format!("{}/{}", pointer, key),
            "a boolean",
            &other,
        )),
    }
}

/// Run `f` on every route object.
pub(super) fn for_each_route<F>(doc: &mut Value, mut f: F) -> Result<(), TransformError>
where
    F: FnMut(&mut Object, &str) -> Result<(), TransformError>,
{
    let environment = root(doc)?;
    let Some(routes) = array_mut(environment, "routes", "")? else {
        return Ok(());
    };

    for (index, route) in routes.iter_mut().enumerate() {
        let pointer = format!("/routes/{}", index);
        let route = as_object(route, &pointer)?;
        f(route, &pointer)?;
    }

    Ok(())
}

/// Run `f` on every response object of every route.
pub(super) fn for_each_response<F>(doc: &mut Value, mut f: F) -> Result<(), TransformError>
where
    F: FnMut(&mut Object, &str) -> Result<(), TransformError>,
{
    for_each_route(doc, |route, route_pointer| {
        let Some(responses) = array_mut(route, "responses", route_pointer)? else {
            return Ok(());
        };

        for (index, response) in responses.iter_mut().enumerate() {
            let pointer = format!("{}/responses/{}", route_pointer, index);
            let response = as_object(response, &pointer)?;
            f(response, &pointer)?;
        }

        Ok(())
    })
}

//! Route-level steps.

use serde_json::{json, Value};

use super::shape::{
    array_mut, array_or_default, as_object, for_each_route, insert_default, take, take_bool, Object,
};
use crate::errors::TransformError;

/// Route fields that moved into a response when routes gained several responses.
const RESPONSE_FIELDS: [&str; 6] = [
    "statusCode",
    "body",
    "headers",
    "latency",
    "filePath",
    "sendFileAsBody",
];

/// 1: the route `contentType` becomes an explicit `Content-Type` header.
pub(super) fn content_type_to_header(doc: &mut Value) -> Result<(), TransformError> {
    for_each_route(doc, |route, pointer| {
        let content_type = match take(route, "contentType") {
            None | Some(Value::Null) => None,
            Some(Value::String(content_type)) => Some(content_type),
            Some(other) => {
                return Err(TransformError::unexpected_type(
                    format!("{}/contentType", pointer),
                    "a string",
                    &other,
                ))
            }
        };

        let headers = array_or_default(route, "headers", pointer)?;
        if let Some(content_type) = content_type.filter(|value| !value.is_empty()) {
            let declared = headers.iter().any(|header| {
                header
                    .get("key")
                    .and_then(Value::as_str)
                    .is_some_and(|key| key.eq_ignore_ascii_case("content-type"))
            });
            if !declared {
                headers.push(json!({ "key": "Content-Type", "value": content_type }));
            }
        }
        Ok(())
    })
}

/// 4: a route's single response moves into a `responses` array.
pub(super) fn single_response_to_responses(doc: &mut Value) -> Result<(), TransformError> {
    for_each_route(doc, |route, pointer| {
        if array_mut(route, "responses", pointer)?.is_some() {
            return Ok(());
        }

        let mut response = Object::new();
        absorb_legacy_file(route, &mut response, pointer)?;

        for field in RESPONSE_FIELDS {
            if let Some(value) = take(route, field) {
                response.insert(field.to_string(), value);
            }
        }

        let status = match response.get("statusCode") {
            None | Some(Value::Null) => 200,
            Some(status) => parse_status_code(status, pointer)?,
        };
        response.insert("statusCode".into(), json!(status));
        insert_default(&mut response, "body", json!(""));
        insert_default(&mut response, "headers", json!([]));
        insert_default(&mut response, "latency", json!(0));
        insert_default(&mut response, "filePath", json!(""));

        route.insert("responses".into(), Value::Array(vec![Value::Object(response)]));
        Ok(())
    })
}

/// Early documents stored file responses as `file: { path, sendAsBody }`.
fn absorb_legacy_file(route: &mut Object, response: &mut Object, pointer: &str) -> Result<(), TransformError> {
    let mut file = match take(route, "file") {
        None | Some(Value::Null) => return Ok(()),
        Some(file) => file,
    };
    let file_pointer = format!("{}/file", pointer);
    let file = as_object(&mut file, &file_pointer)?;

    if let Some(path) = take(file, "path") {
        response.insert("filePath".into(), path);
    }
    if let Some(send_as_body) = take_bool(file, "sendAsBody", &file_pointer)? {
        response.insert("sendFileAsBody".into(), json!(send_as_body));
    }
    Ok(())
}

fn parse_status_code(value: &Value, pointer: &str) -> Result<u16, TransformError> {
    let parsed = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u16>().ok(),
        _ => None,
    };

    parsed
        .filter(|status| (100..=599).contains(status))
        .ok_or_else(|| {
            TransformError::at(
                format!("{}/statusCode", pointer),
                format!("expected an HTTP status code, found {}", value),
            )
        })
}

/// 8 (route half): random response selection switch.
pub(super) fn add_random_response(doc: &mut Value) -> Result<(), TransformError> {
    for_each_route(doc, |route, _| {
        insert_default(route, "randomResponse", json!(false));
        Ok(())
    })
}

/// 14: `randomResponse` becomes `responseMode` and each route gets a
/// default response.
pub(super) fn response_mode_and_default(doc: &mut Value) -> Result<(), TransformError> {
    for_each_route(doc, |route, pointer| {
        let random = take_bool(route, "randomResponse", pointer)?.unwrap_or(false);
        let mode = if random { json!("RANDOM") } else { Value::Null };
        insert_default(route, "responseMode", mode);

        let Some(responses) = array_mut(route, "responses", pointer)? else {
            return Ok(());
        };
        // Exactly one default: the first one flagged true, else the first response.
        let chosen = responses
            .iter()
            .position(|response| response.get("default") == Some(&Value::Bool(true)))
            .unwrap_or(0);

        for (index, response) in responses.iter_mut().enumerate() {
            let response = as_object(response, &format!("{}/responses/{}", pointer, index))?;
            response.insert("default".to_string(), json!(index == chosen));
        }
        Ok(())
    })
}

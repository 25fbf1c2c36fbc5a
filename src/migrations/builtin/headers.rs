//! Header list deduplication (step 11).
//!
//! Earlier releases could append the same header twice when an environment
//! was imported on top of itself. Two entries are duplicates when their keys
//! match case-insensitively and their values match exactly; the first one
//! wins and order is otherwise kept. Distinct values under one key are
//! legitimate (several `Set-Cookie` headers) and are kept.

use std::collections::HashSet;

use serde_json::Value;

use super::shape::{array_mut, for_each_response, root};
use crate::errors::TransformError;

const ENVIRONMENT_HEADER_LISTS: [&str; 3] = ["headers", "proxyReqHeaders", "proxyResHeaders"];

pub(super) fn dedupe_headers(doc: &mut Value) -> Result<(), TransformError> {
    let environment = root(doc)?;
    for list in ENVIRONMENT_HEADER_LISTS {
        if let Some(headers) = array_mut(environment, list, "")? {
            dedupe(headers, &format!("/{}", list))?;
        }
    }

    for_each_response(doc, |response, pointer| {
        if let Some(headers) = array_mut(response, "headers", pointer)? {
            dedupe(headers, &format!("{}/headers", pointer))?;
        }
        Ok(())
    })
}

fn dedupe(headers: &mut Vec<Value>, pointer: &str) -> Result<(), TransformError> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(headers.len());

    for (index, header) in headers.drain(..).enumerate() {
        let (key, value) = header_pair(&header, &format!("{}/{}", pointer, index))?;
        if key.is_empty() && value.is_empty() {
            continue;
        }
        if seen.insert((key.to_ascii_lowercase(), value)) {
            kept.push(header);
        }
    }

    *headers = kept;
    Ok(())
}

fn header_pair(header: &Value, pointer: &str) -> Result<(String, String), TransformError> {
    let Value::Object(object) = header else {
        return Err(TransformError::unexpected_type(pointer, "a header object", header));
    };

    let field = |name: &str| -> Result<String, TransformError> {
        match object.get(name) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Err(TransformError::unexpected_type(
                format!("{}/{}", pointer, name),
                "a string",
                other,
            )),
        }
    };

    Ok((field("key")?, field("value")?))
}

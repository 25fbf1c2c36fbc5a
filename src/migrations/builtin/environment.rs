//! Environment-level steps.

use serde_json::{json, Value};

use super::shape::{insert_default, root, take_bool};
use crate::errors::TransformError;

/// 2: global response headers, HTTPS and CORS switches.
pub(super) fn add_headers_https_cors(doc: &mut Value) -> Result<(), TransformError> {
    let environment = root(doc)?;
    insert_default(environment, "headers", json!([]));
    insert_default(environment, "https", json!(false));
    insert_default(environment, "cors", json!(true));
    Ok(())
}

/// 3: proxy forwarding.
pub(super) fn add_proxy_settings(doc: &mut Value) -> Result<(), TransformError> {
    let environment = root(doc)?;
    insert_default(environment, "proxyMode", json!(false));
    insert_default(environment, "proxyHost", json!(""));
    Ok(())
}

/// 6: headers added to proxied requests and responses.
pub(super) fn add_proxy_headers(doc: &mut Value) -> Result<(), TransformError> {
    let environment = root(doc)?;
    insert_default(environment, "proxyReqHeaders", json!([]));
    insert_default(environment, "proxyResHeaders", json!([]));
    Ok(())
}

/// 9 (environment half): strip the environment prefix when proxying.
pub(super) fn add_proxy_remove_prefix(doc: &mut Value) -> Result<(), TransformError> {
    let environment = root(doc)?;
    insert_default(environment, "proxyRemovePrefix", json!(false));
    Ok(())
}

/// 12: the `https` flag becomes a `tlsOptions` block.
///
/// An existing `tlsOptions` wins over the flag; the flag is dropped either way.
pub(super) fn https_to_tls_options(doc: &mut Value) -> Result<(), TransformError> {
    let environment = root(doc)?;
    let enabled = take_bool(environment, "https", "")?.unwrap_or(false);

    insert_default(
        environment,
        "tlsOptions",
        json!({
            "enabled": enabled,
            "type": "CERT",
            "pfxPath": "",
            "certPath": "",
            "keyPath": "",
            "caPath": "",
            "passphrase": ""
        }),
    );
    Ok(())
}

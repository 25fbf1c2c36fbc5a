//! The environment schema history.
//!
//! Each step is published once and never renumbered. New schema changes are
//! appended with the next id; [`CURRENT_VERSION`] must follow.

mod environment;
mod headers;
mod responses;
mod routes;
mod shape;

use serde_json::Value;

use super::step::MigrationStep;
use crate::errors::TransformError;

/// Schema version written by this release.
pub const CURRENT_VERSION: u32 = 14;

/// All built-in steps, ascending by id.
pub fn steps() -> Vec<MigrationStep> {
    vec![
        MigrationStep::new(
            1,
            "Route content type becomes a Content-Type header",
            routes::content_type_to_header,
        ),
        MigrationStep::new(
            2,
            "Environment headers, HTTPS and CORS settings",
            environment::add_headers_https_cors,
        ),
        MigrationStep::new(3, "Proxy mode and proxy host", environment::add_proxy_settings),
        MigrationStep::new(
            4,
            "Route response moves into a responses list",
            routes::single_response_to_responses,
        ),
        MigrationStep::new(5, "Response rules", responses::add_rules),
        MigrationStep::new(6, "Proxy request and response headers", environment::add_proxy_headers),
        MigrationStep::new(7, "Response templating switch", responses::add_disable_templating),
        MigrationStep::new(8, "Random responses and rules operator", random_response_and_operator),
        MigrationStep::new(9, "Response label and proxy prefix removal", label_and_proxy_prefix),
        MigrationStep::new(10, "Rule regex flag becomes an operator", responses::regex_flag_to_operator),
        MigrationStep::new(11, "Duplicate headers are removed", headers::dedupe_headers),
        MigrationStep::new(12, "HTTPS flag becomes TLS options", environment::https_to_tls_options),
        MigrationStep::new(13, "Response file delivery options", responses::add_file_options),
        MigrationStep::new(
            14,
            "Response mode and default response",
            routes::response_mode_and_default,
        ),
    ]
}

fn random_response_and_operator(doc: &mut Value) -> Result<(), TransformError> {
    routes::add_random_response(doc)?;
    responses::add_rules_operator(doc)
}

fn label_and_proxy_prefix(doc: &mut Value) -> Result<(), TransformError> {
    responses::add_label(doc)?;
    environment::add_proxy_remove_prefix(doc)
}

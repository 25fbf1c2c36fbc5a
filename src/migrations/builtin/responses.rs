//! Response-level steps.

use serde_json::{json, Value};

use super::shape::{array_mut, as_object, for_each_response, insert_default, take_bool};
use crate::errors::TransformError;

/// 5: response rules.
pub(super) fn add_rules(doc: &mut Value) -> Result<(), TransformError> {
    for_each_response(doc, |response, pointer| {
        if array_mut(response, "rules", pointer)?.is_none() {
            response.insert("rules".into(), json!([]));
        }
        Ok(())
    })
}

/// 7: templating switch.
pub(super) fn add_disable_templating(doc: &mut Value) -> Result<(), TransformError> {
    for_each_response(doc, |response, _| {
        insert_default(response, "disableTemplating", json!(false));
        Ok(())
    })
}

/// 8 (response half): how rules combine.
pub(super) fn add_rules_operator(doc: &mut Value) -> Result<(), TransformError> {
    for_each_response(doc, |response, _| {
        insert_default(response, "rulesOperator", json!("OR"));
        Ok(())
    })
}

/// 9 (response half): free-text label.
pub(super) fn add_label(doc: &mut Value) -> Result<(), TransformError> {
    for_each_response(doc, |response, _| {
        insert_default(response, "label", json!(""));
        Ok(())
    })
}

/// 10: the rule `isRegex` flag becomes an `operator`.
pub(super) fn regex_flag_to_operator(doc: &mut Value) -> Result<(), TransformError> {
    for_each_response(doc, |response, pointer| {
        let Some(rules) = array_mut(response, "rules", pointer)? else {
            return Ok(());
        };

        for (index, rule) in rules.iter_mut().enumerate() {
            let rule_pointer = format!("{}/rules/{}", pointer, index);
            let rule = as_object(rule, &rule_pointer)?;
            let operator = match take_bool(rule, "isRegex", &rule_pointer)? {
                Some(true) => "regex",
                Some(false) | None => "equals",
            };
            insert_default(rule, "operator", json!(operator));
        }
        Ok(())
    })
}

/// 13: file delivery switches.
pub(super) fn add_file_options(doc: &mut Value) -> Result<(), TransformError> {
    for_each_response(doc, |response, _| {
        insert_default(response, "sendFileAsBody", json!(false));
        insert_default(response, "fallbackTo404", json!(false));
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_rules_rejects_non_array() {
        let mut doc = json!({ "routes": [{ "responses": [{ "rules": {} }] }] });
        let err = add_rules(&mut doc).unwrap_err();
        assert_eq!(err.pointer(), Some("/routes/0/responses/0/rules"));
    }

    #[test]
    fn test_add_rules_keeps_existing_rules() {
        let mut doc = json!({ "routes": [{ "responses": [{ "rules": [{ "target": "query" }] }, {}] }] });
        add_rules(&mut doc).unwrap();
        assert_eq!(doc["routes"][0]["responses"][0]["rules"], json!([{ "target": "query" }]));
        assert_eq!(doc["routes"][0]["responses"][1]["rules"], json!([]));
    }

    #[test]
    fn test_regex_flag_to_operator() {
        let mut doc = json!({
            "routes": [{
                "responses": [{
                    "rules": [
                        { "target": "body", "isRegex": true, "value": "^a" },
                        { "target": "query", "isRegex": false, "value": "b" },
                        { "target": "header", "value": "c" },
                        { "target": "params", "isRegex": true, "operator": "null" }
                    ]
                }]
            }]
        });

        regex_flag_to_operator(&mut doc).unwrap();

        assert_eq!(
            doc["routes"][0]["responses"][0]["rules"],
            json!([
                { "target": "body", "value": "^a", "operator": "regex" },
                { "target": "query", "value": "b", "operator": "equals" },
                { "target": "header", "value": "c", "operator": "equals" },
                { "target": "params", "operator": "null" }
            ])
        );
    }

    #[test]
    fn test_regex_flag_must_be_boolean() {
        let mut doc = json!({ "routes": [{ "responses": [{ "rules": [{ "isRegex": 1 }] }] }] });
        let err = regex_flag_to_operator(&mut doc).unwrap_err();
        assert_eq!(err.pointer(), Some("/routes/0/responses/0/rules/0/isRegex"));
    }

    #[test]
    fn test_response_defaults() {
        let mut doc = json!({ "routes": [{ "responses": [{ "label": "ok" }] }] });
        add_disable_templating(&mut doc).unwrap();
        add_rules_operator(&mut doc).unwrap();
        add_label(&mut doc).unwrap();
        add_file_options(&mut doc).unwrap();

        assert_eq!(
            doc["routes"][0]["responses"][0],
            json!({
                "label": "ok",
                "disableTemplating": false,
                "rulesOperator": "OR",
                "sendFileAsBody": false,
                "fallbackTo404": false
            })
        );
    }
}

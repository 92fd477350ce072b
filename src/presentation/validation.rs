//! Turns `validator` failures into the `errors` map of a 400 response.
//!
//! Every violated rule is kept, in declaration order, under its field name:
//! `{"password": ["required", "min=8"]}`. A rule renders as `"<tag>=<param>"`
//! when it carries a parameter and `"<tag>"` otherwise.
//!
//! The derive reports built-in checks (`email`, `length`) ahead of custom
//! ones, so `required` is moved to the front of each field's list; every
//! field declares it first.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use validator::{ValidationError, ValidationErrors};

/// Field name to the reasons it failed, sorted by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

// Added by validator to most errors; it is the rejected input, not a rule parameter.
const VALUE_PARAM: &str = "value";
const REQUIRED: &str = "required";

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut map = FieldErrors::new();
    for (field, failures) in errors.field_errors() {
        debug!(field = %field, "Field failed validation");
        let rules = map.entry(field.to_string()).or_default();
        rules.extend(failures.iter().map(render_rule));
        rules.sort_by_key(|rule| rule != REQUIRED);
    }
    map
}

pub fn render_rule(error: &ValidationError) -> String {
    let mut params: Vec<(&str, &Value)> = error
        .params
        .iter()
        .map(|(k, v)| (&**k, v))
        .filter(|(k, _)| *k != VALUE_PARAM)
        .collect();
    params.sort_by(|a, b| a.0.cmp(b.0));

    match params.first() {
        Some((_, param)) => format!("{}={}", error.code, render_param(param)),
        None => error.code.to_string(),
    }
}

fn render_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{BulkDeleteRequest, CreateMemberRequest};
    use crate::domain::pagination::ListQuery;
    use std::borrow::Cow;
    use validator::Validate;

    #[test]
    fn test_rule_without_param_renders_tag_only() {
        let error = ValidationError::new("required");
        assert_eq!(render_rule(&error), "required");
    }

    #[test]
    fn test_rule_with_param_renders_tag_equals_param() {
        let mut error = ValidationError::new("min");
        error.add_param(Cow::from("min"), &8);
        error.add_param(Cow::from("value"), &"short");
        assert_eq!(render_rule(&error), "min=8");
    }

    #[test]
    fn test_string_param_is_not_quoted() {
        let mut error = ValidationError::new("oneof");
        error.add_param(Cow::from("allowed"), &"a b");
        assert_eq!(render_rule(&error), "oneof=a b");
    }

    #[test]
    fn test_same_field_keeps_every_failure() {
        let mut errors = ValidationErrors::new();
        errors.add("password", ValidationError::new("required"));
        let mut min = ValidationError::new("min");
        min.add_param(Cow::from("min"), &8);
        errors.add("password", min);

        let map = field_errors(&errors);

        assert_eq!(map["password"], vec!["required", "min=8"]);
    }

    #[test]
    fn test_create_request_failures_map_to_expected_reasons() {
        let req = CreateMemberRequest {
            name: " ".to_string(),
            email: "not-an-email".to_string(),
            handphone: Some("08-12".to_string()),
            password: "short".to_string(),
            photo: None,
        };

        let map = field_errors(&req.validate().unwrap_err());

        assert_eq!(map["name"], vec!["required"]);
        assert_eq!(map["email"], vec!["email"]);
        assert_eq!(map["handphone"], vec!["numeric"]);
        assert_eq!(map["password"], vec!["min=8"]);
    }

    #[test]
    fn test_required_is_listed_before_the_rules_declared_after_it() {
        let map = field_errors(&CreateMemberRequest::default().validate().unwrap_err());

        assert_eq!(map["name"], vec!["required"]);
        assert_eq!(map["email"], vec!["required", "email"]);
        assert_eq!(map["password"], vec!["required", "min=8"]);
        assert!(!map.contains_key("handphone"));
    }

    #[test]
    fn test_reordering_keeps_the_other_rules_in_place() {
        let mut errors = ValidationErrors::new();
        errors.add("code", ValidationError::new("email"));
        errors.add("code", ValidationError::new("numeric"));
        errors.add("code", ValidationError::new("required"));

        let map = field_errors(&errors);

        assert_eq!(map["code"], vec!["required", "email", "numeric"]);
    }

    #[test]
    fn test_bulk_delete_and_list_query_reasons() {
        let map = field_errors(&BulkDeleteRequest { ids: vec![] }.validate().unwrap_err());
        assert_eq!(map["ids"], vec!["required"]);

        let query = ListQuery {
            page: 0,
            limit: -3,
            search: None,
        };
        let map = field_errors(&query.validate().unwrap_err());
        assert_eq!(map["page"], vec!["min=1"]);
        assert_eq!(map["limit"], vec!["min=1"]);
    }

    #[test]
    fn test_map_serializes_with_sorted_keys() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("required"));
        errors.add("email", ValidationError::new("email"));

        let json = serde_json::to_string(&field_errors(&errors)).unwrap();

        assert_eq!(json, r#"{"email":["email"],"name":["required"]}"#);
    }
}

//! Request descriptors and parameter flattening.
//!
//! A [`RequestDescriptor`] is what a façade method builds for one API call:
//! which resource, which method, which parameters. It is consumed by
//! [`TransactionManager::dispatch`](crate::TransactionManager::dispatch)
//! and never reused.

use deployr_protocol::Format;
use deployr_transport::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};

/// Characters left untouched when a GET value is percent-encoded. This is
/// the unreserved set of ECMAScript's `encodeURIComponent`, which is what
/// the server expects in query strings.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One API call, before dispatch.
///
/// Parameters keep their insertion order. The `format` parameter is not
/// part of `params`: it always comes from [`format`](Self::format) and is
/// appended last when the parameters are flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub params: Map<String, Value>,
    pub format: Format,
    /// Set for uploads: names the bound form that supplies the file.
    pub form_id: Option<String>,
}

impl RequestDescriptor {
    /// A GET request expecting a JSON envelope.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            params: Map::new(),
            format: Format::Json,
            form_id: None,
        }
    }

    /// A POST request expecting a JSON envelope.
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    /// A multipart upload of the form bound under `form_id`.
    ///
    /// Uploads ask for `format=text`, as the server's upload endpoints
    /// reply into a frame rather than to a script.
    pub fn upload(path: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            format: Format::Text,
            form_id: Some(form_id.into()),
            ..Self::get(path)
        }
    }

    /// Adds a parameter. A `format` key is ignored; use
    /// [`format`](Self::format) instead.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets the reply format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Returns `true` if this request submits a bound form.
    pub fn is_upload(&self) -> bool {
        self.form_id.is_some()
    }

    /// Flattens the parameters for the given method.
    /// See [`flatten_params`].
    pub fn flattened(&self, method: Method) -> Vec<(String, String)> {
        flatten_params(&self.params, self.format, method)
    }
}

/// Turns a parameter map into `key=value` pairs.
///
/// - `null` values are skipped
/// - nested objects contribute their own members, recursively; the
///   object's key itself produces no pair
/// - arrays produce one pair whose value is the elements joined by `,`
/// - `format` is always the last pair
///
/// For GET the values are percent-encoded, ready for a query string. For
/// POST they are left raw; the transport encodes the body.
///
/// Recursion has no depth limit. `serde_json::Value` cannot hold a cycle,
/// so this always terminates.
pub fn flatten_params(
    params: &Map<String, Value>,
    format: Format,
    method: Method,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    collect(params, true, &mut pairs);
    pairs.push(("format".to_string(), format.as_str().to_string()));

    if method == Method::Get {
        for (_, value) in &mut pairs {
            *value = utf8_percent_encode(value.as_str(), URI_COMPONENT).to_string();
        }
    }
    pairs
}

fn collect(params: &Map<String, Value>, top_level: bool, pairs: &mut Vec<(String, String)>) {
    for (key, value) in params {
        if top_level && key == "format" {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Object(nested) => collect(nested, false, pairs),
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(text_of).collect();
                pairs.push((key.clone(), joined.join(",")));
            }
            scalar => pairs.push((key.clone(), text_of(scalar))),
        }
    }
}

/// Text form of a parameter value: strings verbatim, everything else as
/// JSON.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Joins flattened pairs into `k=v&k=v`.
pub fn query_string(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_constructors_set_method_and_format() {
        let get = RequestDescriptor::get("/r/session/ping");
        assert_eq!(get.method, Method::Get);
        assert_eq!(get.format, Format::Json);
        assert!(!get.is_upload());

        let post = RequestDescriptor::post("/r/session/create");
        assert_eq!(post.method, Method::Post);

        let upload = RequestDescriptor::upload("/r/session/file/upload", "fileForm");
        assert_eq!(upload.method, Method::Post);
        assert_eq!(upload.format, Format::Text);
        assert_eq!(upload.form_id.as_deref(), Some("fileForm"));
        assert!(upload.is_upload());
    }

    #[test]
    fn test_get_values_are_percent_encoded() {
        let descriptor = RequestDescriptor::get("/r/session/object/get")
            .param("session", "LIVE-1")
            .param("name", "my data & more");
        assert_eq!(
            descriptor.flattened(Method::Get),
            pairs(&[
                ("session", "LIVE-1"),
                ("name", "my%20data%20%26%20more"),
                ("format", "json"),
            ])
        );
    }

    #[test]
    fn test_get_keeps_uri_component_unreserved_characters() {
        let descriptor = RequestDescriptor::get("/x").param("v", "a-b_c.d!e~f*g'h(i)");
        assert_eq!(descriptor.flattened(Method::Get)[0].1, "a-b_c.d!e~f*g'h(i)");
    }

    #[test]
    fn test_post_values_are_left_raw() {
        let descriptor = RequestDescriptor::post("/r/session/execute/code")
            .param("code", "x <- c(1, 2)");
        assert_eq!(
            descriptor.flattened(Method::Post),
            pairs(&[("code", "x <- c(1, 2)"), ("format", "json")])
        );
    }

    #[test]
    fn test_nulls_are_skipped() {
        let descriptor = RequestDescriptor::post("/x")
            .param("session", Value::Null)
            .param("name", "a");
        assert_eq!(
            descriptor.flattened(Method::Post),
            pairs(&[("name", "a"), ("format", "json")])
        );
    }

    #[test]
    fn test_nested_objects_are_flattened_recursively() {
        let descriptor = RequestDescriptor::post("/x")
            .param("outer", json!({"a": 1, "inner": {"b": true, "c": null}}))
            .param("d", "last");
        assert_eq!(
            descriptor.flattened(Method::Post),
            pairs(&[("a", "1"), ("b", "true"), ("d", "last"), ("format", "json")])
        );
    }

    #[test]
    fn test_arrays_are_comma_joined() {
        let descriptor = RequestDescriptor::get("/x").param("robjects", json!(["x", "y", 3]));
        assert_eq!(descriptor.flattened(Method::Get)[0], ("robjects".into(), "x%2Cy%2C3".into()));
        assert_eq!(descriptor.flattened(Method::Post)[0], ("robjects".into(), "x,y,3".into()));
    }

    #[test]
    fn test_format_param_cannot_be_overridden_through_params() {
        let descriptor = RequestDescriptor::get("/x")
            .param("format", "xml")
            .format(Format::Text);
        assert_eq!(descriptor.flattened(Method::Get), pairs(&[("format", "text")]));
    }

    #[test]
    fn test_query_string_joins_pairs() {
        let query = query_string(&pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(query, "a=1&b=2");
        assert_eq!(query_string(&[]), "");
    }
}

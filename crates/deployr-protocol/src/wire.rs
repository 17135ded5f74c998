//! Tagged wire values: how R-side data travels between client and server.
//!
//! The server describes every R object as a small tagged JSON object:
//!
//! ```text
//! { "type": "vector", "value": [1, 2, 3] }
//! { "type": "list",   "value": { "x": { "type": "primitive", "value": 5 } } }
//! ```
//!
//! [`WireValue`] is the closed set of those tags. Converting *to* native
//! values ([`decode_wire`]) never fails: anything unrecognised passes
//! through unchanged. Converting *from* native values ([`encode_native`])
//! may produce nothing at all, which tells the parent to drop the key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::ProtocolError;

/// One R value in its wire representation.
///
/// `Date`, `Factor` and `Matrix` are carried opaquely: their `value` is
/// handed to the caller without further interpretation. `List` and
/// `Dataframe` hold nested wire values keyed by name, in the order the
/// server (or the caller) wrote them.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Primitive(Value),
    Vector(Value),
    Date(Value),
    Factor(Value),
    Matrix(Value),
    List(Vec<(String, WireValue)>),
    Dataframe(Vec<(String, WireValue)>),
    /// A tag this client does not know. The payload is kept verbatim.
    Unknown { tag: String, value: Value },
    /// JSON that carries no string `type` tag at all.
    Untagged(Value),
}

impl WireValue {
    /// The `type` tag this value is written with, if it has one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Primitive(_) => Some("primitive"),
            Self::Vector(_) => Some("vector"),
            Self::Date(_) => Some("date"),
            Self::Factor(_) => Some("factor"),
            Self::Matrix(_) => Some("matrix"),
            Self::List(_) => Some("list"),
            Self::Dataframe(_) => Some("dataframe"),
            Self::Unknown { tag, .. } => Some(tag),
            Self::Untagged(_) => None,
        }
    }

    /// Reads a wire value out of arbitrary JSON.
    ///
    /// Total: malformed input becomes [`Untagged`](Self::Untagged) or
    /// [`Unknown`](Self::Unknown) instead of an error.
    pub fn from_json(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::Untagged(value);
        };
        let tag = match object.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            _ => return Self::Untagged(Value::Object(object)),
        };
        let inner = object.remove("value").unwrap_or(Value::Null);

        match tag.as_str() {
            "primitive" => Self::Primitive(inner),
            "vector" => Self::Vector(inner),
            "date" => Self::Date(inner),
            "factor" => Self::Factor(inner),
            "matrix" => Self::Matrix(inner),
            "list" => Self::List(Self::members(inner)),
            "dataframe" => Self::Dataframe(Self::members(inner)),
            _ => Self::Unknown { tag, value: inner },
        }
    }

    /// Decodes the members of a `list` or `dataframe`. Arrays are keyed by
    /// index (`"0"`, `"1"`, ...); a null, missing or scalar `value` has no
    /// members.
    fn members(inner: Value) -> Vec<(String, WireValue)> {
        match inner {
            Value::Object(members) => members
                .into_iter()
                .map(|(key, member)| (key, Self::from_json(member)))
                .collect(),
            Value::Array(members) => members
                .into_iter()
                .enumerate()
                .map(|(index, member)| (index.to_string(), Self::from_json(member)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Writes the tagged JSON form, `{"type": ..., "value": ...}`.
    pub fn to_json(&self) -> Value {
        let value = match self {
            Self::Primitive(v)
            | Self::Vector(v)
            | Self::Date(v)
            | Self::Factor(v)
            | Self::Matrix(v)
            | Self::Unknown { value: v, .. } => v.clone(),
            Self::List(members) | Self::Dataframe(members) => Value::Object(
                members
                    .iter()
                    .map(|(key, member)| (key.clone(), member.to_json()))
                    .collect(),
            ),
            Self::Untagged(v) => return v.clone(),
        };

        let mut object = Map::new();
        // `tag()` is only `None` for `Untagged`, handled above.
        object.insert(
            "type".into(),
            Value::String(self.tag().unwrap_or_default().to_owned()),
        );
        object.insert("value".into(), value);
        Value::Object(object)
    }

    /// Converts to the native value the caller works with.
    pub fn into_native(self) -> Value {
        match self {
            Self::Primitive(v)
            | Self::Vector(v)
            | Self::Date(v)
            | Self::Factor(v)
            | Self::Matrix(v)
            | Self::Unknown { value: v, .. }
            | Self::Untagged(v) => v,
            Self::List(members) | Self::Dataframe(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(key, member)| (key, member.into_native()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

/// Converts a wire value (as raw JSON) into its native form.
///
/// Never fails; input without a recognisable tag comes back unchanged.
pub fn decode_wire(value: &Value) -> Value {
    WireValue::from_json(value.clone()).into_native()
}

/// Converts a native value into its wire form.
///
/// - `null` → `primitive` with a null value
/// - array → `vector` (elements are not encoded themselves)
/// - object → `list`, keeping only members that encode to something
/// - number, bool, string → `primitive`
///
/// Returns `None` for an object with no encodable members, including the
/// empty object. Callers treat `None` as "omit this value".
pub fn encode_native(value: &Value) -> Option<WireValue> {
    match value {
        Value::Null => Some(WireValue::Primitive(Value::Null)),
        Value::Array(_) => Some(WireValue::Vector(value.clone())),
        Value::Object(object) => {
            let members: Vec<(String, WireValue)> = object
                .iter()
                .filter_map(|(key, member)| {
                    encode_native(member).map(|wire| (key.clone(), wire))
                })
                .collect();
            if members.is_empty() {
                None
            } else {
                Some(WireValue::List(members))
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Some(WireValue::Primitive(value.clone()))
        }
    }
}

/// [`encode_native`] for a value that may be absent. Absent encodes to
/// `None`.
pub fn encode_optional(value: Option<&Value>) -> Option<WireValue> {
    value.and_then(encode_native)
}

/// Encodes any serializable Rust value by going through its JSON form.
///
/// # Errors
/// Returns `ProtocolError::Encode` if the value cannot be represented as
/// JSON.
pub fn to_wire<T: Serialize>(value: &T) -> Result<Option<WireValue>, ProtocolError> {
    let native = serde_json::to_value(value).map_err(ProtocolError::Encode)?;
    Ok(encode_native(&native))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // =====================================================================
    // decode_wire
    // =====================================================================

    #[test]
    fn test_decode_primitive_null() {
        assert_eq!(decode_wire(&json!({"type": "primitive", "value": null})), Value::Null);
    }

    #[test]
    fn test_decode_list_recurses_into_members() {
        let wire = json!({
            "type": "list",
            "value": {
                "a": {"type": "primitive", "value": 1},
                "b": {"type": "vector", "value": [1, 2]}
            }
        });
        assert_eq!(decode_wire(&wire), json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn test_decode_dataframe_decodes_like_list() {
        let wire = json!({
            "type": "dataframe",
            "value": {
                "height": {"type": "vector", "value": [1.5, 1.8]},
                "name": {"type": "factor", "value": ["a", "b"]}
            }
        });
        assert_eq!(
            decode_wire(&wire),
            json!({"height": [1.5, 1.8], "name": ["a", "b"]})
        );
    }

    #[test]
    fn test_decode_opaque_kinds_pass_value_through() {
        for tag in ["date", "factor", "matrix"] {
            let value = json!([[1, 2], [3, 4]]);
            let wire = json!({"type": tag, "value": value.clone()});
            assert_eq!(decode_wire(&wire), value, "tag {tag}");
        }
    }

    #[test]
    fn test_decode_untagged_input_is_returned_unchanged() {
        let plain = json!({"rclass": "numeric", "value": 3});
        assert_eq!(decode_wire(&plain), plain);
        assert_eq!(decode_wire(&json!(42)), json!(42));
    }

    #[test]
    fn test_decode_unknown_tag_returns_value() {
        let wire = json!({"type": "environment", "value": {"x": 1}});
        assert_eq!(decode_wire(&wire), json!({"x": 1}));
    }

    #[test]
    fn test_decode_ignores_extra_server_fields() {
        let wire = json!({"type": "vector", "rclass": "numeric", "value": [7]});
        assert_eq!(decode_wire(&wire), json!([7]));
    }

    // =====================================================================
    // encode_native
    // =====================================================================

    #[test]
    fn test_encode_array_is_shallow_vector() {
        let array = json!([1, {"nested": true}, [2]]);
        assert_eq!(encode_native(&array), Some(WireValue::Vector(array.clone())));
    }

    #[test]
    fn test_encode_null_and_scalars_are_primitives() {
        assert_eq!(encode_native(&Value::Null), Some(WireValue::Primitive(Value::Null)));
        assert_eq!(encode_native(&json!(2.5)), Some(WireValue::Primitive(json!(2.5))));
        assert_eq!(encode_native(&json!("x")), Some(WireValue::Primitive(json!("x"))));
        assert_eq!(encode_native(&json!(false)), Some(WireValue::Primitive(json!(false))));
    }

    #[test]
    fn test_encode_empty_object_is_nothing() {
        assert_eq!(encode_native(&json!({})), None);
    }

    #[test]
    fn test_encode_drops_members_that_encode_to_nothing() {
        let wire = encode_native(&json!({"keep": 1, "drop": {}})).unwrap();
        let WireValue::List(members) = wire else {
            panic!("expected a list");
        };
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0, "keep");
    }

    #[test]
    fn test_encode_object_of_only_empty_members_is_nothing() {
        assert_eq!(encode_native(&json!({"a": {}, "b": {"c": {}}})), None);
    }

    #[test]
    fn test_encode_optional_absent_is_nothing() {
        assert_eq!(encode_optional(None), None);
        assert!(encode_optional(Some(&json!(1))).is_some());
    }

    #[test]
    fn test_encode_list_json_shape() {
        let wire = encode_native(&json!({"x": 5})).unwrap();
        assert_eq!(
            wire.to_json(),
            json!({"type": "list", "value": {"x": {"type": "primitive", "value": 5}}})
        );
    }

    #[test]
    fn test_to_wire_from_struct() {
        #[derive(Serialize)]
        struct Inputs {
            n: u32,
            weights: Vec<f64>,
        }
        let wire = to_wire(&Inputs { n: 3, weights: vec![0.5] }).unwrap().unwrap();
        assert_eq!(wire.into_native(), json!({"n": 3, "weights": [0.5]}));
    }

    // =====================================================================
    // Round trip
    // =====================================================================

    #[test]
    fn test_round_trip_preserves_shape() {
        let samples = [
            json!(null),
            json!(17),
            json!("text"),
            json!([1, "two", null]),
            json!({"a": 1, "b": [1, 2], "c": {"d": true, "e": null}}),
        ];
        for native in samples {
            let wire = encode_native(&native).unwrap();
            assert_eq!(decode_wire(&wire.to_json()), native);
        }
    }

    #[test]
    fn test_serde_round_trip_through_text() {
        let wire = encode_native(&json!({"a": [1, 2]})).unwrap();
        let text = serde_json::to_string(&wire).unwrap();
        let back: WireValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, wire);
    }

    #[test]
    fn test_decode_array_valued_list_is_keyed_by_index() {
        let wire = json!({
            "type": "list",
            "value": [
                {"type": "primitive", "value": 1},
                {"type": "vector", "value": [2, 3]}
            ]
        });
        assert_eq!(decode_wire(&wire), json!({"0": 1, "1": [2, 3]}));
    }

    #[test]
    fn test_decode_list_without_members_is_empty_object() {
        assert_eq!(decode_wire(&json!({"type": "dataframe", "value": null})), json!({}));
        assert_eq!(decode_wire(&json!({"type": "list"})), json!({}));
        assert_eq!(decode_wire(&json!({"type": "list", "value": 7})), json!({}));
    }

    #[test]
    fn test_members_keep_wire_order() {
        let wire = WireValue::from_json(json!({
            "type": "dataframe",
            "value": {
                "zeta": {"type": "primitive", "value": 1},
                "alpha": {"type": "primitive", "value": 2}
            }
        }));
        let WireValue::Dataframe(members) = &wire else {
            panic!("expected a dataframe");
        };
        let keys: Vec<&str> = members.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha"]);

        let native = serde_json::to_string(&wire.into_native()).unwrap();
        assert_eq!(native, r#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn test_encode_keeps_insertion_order() {
        let native: Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        let text = serde_json::to_string(&encode_native(&native).unwrap()).unwrap();
        assert_eq!(
            text,
            r#"{"type":"list","value":{"b":{"type":"primitive","value":1},"a":{"type":"primitive","value":2}}}"#
        );
    }
}

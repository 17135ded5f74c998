//! Options for code and script execution.

use deployr_protocol::{Codec, JsonCodec, ProtocolError, encode_optional};
use serde_json::{Map, Value};

/// Optional settings for `execute_code`, `execute_session_script` and
/// `execute_script`.
///
/// ```
/// use deployr::ExecOptions;
/// use serde_json::json;
///
/// let options = ExecOptions::new()
///     .inputs(json!({"n": 10}))
///     .robjects(["x", "y"])
///     .save_workspace(true);
/// assert_eq!(options.robjects_param(), "x,y");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecOptions {
    /// Native values passed to the script as R objects.
    pub inputs: Option<Value>,
    /// Names of R objects to return with the reply.
    pub robjects: Vec<String>,
    /// Names of working-directory files to return with the reply.
    pub files: Vec<String>,
    /// Script to run before the main script.
    pub preload: Option<String>,
    pub save_workspace: bool,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(mut self, inputs: Value) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn robjects<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.robjects = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn preload(mut self, script: impl Into<String>) -> Self {
        self.preload = Some(script.into());
        self
    }

    pub fn save_workspace(mut self, save: bool) -> Self {
        self.save_workspace = save;
        self
    }

    /// The `robjects` parameter: names joined by `,`.
    pub fn robjects_param(&self) -> String {
        self.robjects.join(",")
    }

    /// The `files` parameter: names joined by `,`.
    pub fn files_param(&self) -> String {
        self.files.join(",")
    }

    /// The `inputs` parameter. See [`inputs_param`].
    pub fn inputs_param(&self) -> Result<String, ProtocolError> {
        inputs_param(self.inputs.as_ref())
    }
}

/// Encodes native values as the `inputs` request parameter: the JSON text
/// of `{"inputs": <wire value>}`. Values with no wire encoding (such as
/// an empty object) leave `inputs` out, giving `{}`.
pub fn inputs_param(inputs: Option<&Value>) -> Result<String, ProtocolError> {
    let mut wrapper = Map::new();
    if let Some(wire) = encode_optional(inputs) {
        wrapper.insert("inputs".to_string(), wire.to_json());
    }
    JsonCodec.encode(&wrapper)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults_produce_empty_params() {
        let options = ExecOptions::new();
        assert_eq!(options.robjects_param(), "");
        assert_eq!(options.files_param(), "");
        assert_eq!(options.inputs_param().unwrap(), "{}");
        assert!(!options.save_workspace);
    }

    #[test]
    fn test_lists_are_comma_joined() {
        let options = ExecOptions::new()
            .robjects(["x", "y"])
            .files(vec!["a.csv".to_string(), "b.png".to_string()]);
        assert_eq!(options.robjects_param(), "x,y");
        assert_eq!(options.files_param(), "a.csv,b.png");
    }

    #[test]
    fn test_inputs_are_wrapped_and_wire_encoded() {
        let text = inputs_param(Some(&json!({"n": 10, "v": [1, 2]}))).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"inputs": {"type": "list", "value": {
                "n": {"type": "primitive", "value": 10},
                "v": {"type": "vector", "value": [1, 2]}
            }}})
        );
    }

    #[test]
    fn test_empty_inputs_are_omitted() {
        assert_eq!(inputs_param(Some(&json!({}))).unwrap(), "{}");
        assert_eq!(inputs_param(None).unwrap(), "{}");
    }
}

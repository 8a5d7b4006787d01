use pantry_core::ToolError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Named arguments of a single tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn from_value(input: Value) -> Result<Self, ToolError> {
        match input {
            Value::Null => Ok(Self::default()),
            Value::Object(values) => Ok(Self { values }),
            other => Err(ToolError::InvalidArguments(format!(
                "expected an object of named arguments, got {other}"
            ))),
        }
    }

    pub fn required<T: DeserializeOwned>(&self, key: &str) -> Result<T, ToolError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Err(ToolError::InvalidArguments(format!(
                "missing required argument `{key}`"
            ))),
            Some(value) => decode(key, value),
        }
    }

    pub fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ToolError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(key, value).map(Some),
        }
    }

    /// Integer argument; a whole-valued float such as `30.0` is accepted,
    /// a fractional one is not.
    pub fn integer(&self, key: &str) -> Result<i64, ToolError> {
        let value = match self.values.get(key) {
            None | Some(Value::Null) => {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required argument `{key}`"
                )))
            }
            Some(value) => value,
        };
        if let Some(integer) = value.as_i64() {
            return Ok(integer);
        }
        match value.as_f64().and_then(whole_number) {
            Some(integer) => Ok(integer),
            None => decode(key, value),
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

fn whole_number(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ToolError> {
    T::deserialize(value)
        .map_err(|e| ToolError::InvalidArguments(format!("argument `{key}`: {e}")))
}

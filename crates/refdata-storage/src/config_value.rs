use refdata_common::types::ConfigType;
use serde::Serialize;
use serde_json::Value;

/// A config value decoded according to its [`ConfigType`].
///
/// # Examples
///
/// ```
/// use refdata_common::types::ConfigType;
/// use refdata_storage::ConfigValue;
///
/// let v = ConfigValue::decode(ConfigType::Boolean, "TRUE").unwrap();
/// assert_eq!(v.as_bool(), Some(true));
/// assert!(ConfigValue::decode(ConfigType::Number, "abc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    Number(serde_json::Number),
    Boolean(bool),
    Json(Value),
    Array(Vec<Value>),
}

impl ConfigValue {
    /// Decodes the stored text. The error string says why the text does not
    /// fit `config_type`.
    pub fn decode(config_type: ConfigType, raw: &str) -> Result<Self, String> {
        match config_type {
            ConfigType::Text => Ok(ConfigValue::Text(raw.to_owned())),
            ConfigType::Number => serde_json::from_str::<serde_json::Number>(raw.trim())
                .map(ConfigValue::Number)
                .map_err(|_| format!("'{raw}' is not a number")),
            ConfigType::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(ConfigValue::Boolean(true)),
                "false" | "0" => Ok(ConfigValue::Boolean(false)),
                _ => Err(format!("'{raw}' is not a boolean (expected true/false/1/0)")),
            },
            ConfigType::Json => serde_json::from_str::<Value>(raw)
                .map(ConfigValue::Json)
                .map_err(|e| format!("invalid JSON: {e}")),
            ConfigType::Array => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(items)) => Ok(ConfigValue::Array(items)),
                Ok(_) => Err("expected a JSON array".to_owned()),
                Err(e) => Err(format!("invalid JSON: {e}")),
            },
        }
    }

    pub fn config_type(&self) -> ConfigType {
        match self {
            ConfigValue::Text(_) => ConfigType::Text,
            ConfigValue::Number(_) => ConfigType::Number,
            ConfigValue::Boolean(_) => ConfigType::Boolean,
            ConfigValue::Json(_) => ConfigType::Json,
            ConfigValue::Array(_) => ConfigType::Array,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// The value as a JSON document, as a front-end client would receive it.
    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::Text(s) => Value::String(s.clone()),
            ConfigValue::Number(n) => Value::Number(n.clone()),
            ConfigValue::Boolean(b) => Value::Bool(*b),
            ConfigValue::Json(v) => v.clone(),
            ConfigValue::Array(items) => Value::Array(items.clone()),
        }
    }
}

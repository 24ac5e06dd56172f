use crate::errors::{Result, VersionManagerError};

/// Deserializes a JSON string into the provided type with shared error semantics.
pub fn from_json_str<T: serde::de::DeserializeOwned>(input: &str) -> Result<T> {
    serde_json::from_str(input)
        .map_err(|err| VersionManagerError::DeserializationError(err.to_string()))
}

/// Deserializes a YAML string. JSON documents are valid YAML, so this doubles
/// as a lenient fallback parser.
pub fn from_yaml_str<T: serde::de::DeserializeOwned>(input: &str) -> Result<T> {
    serde_yaml::from_str(input)
        .map_err(|err| VersionManagerError::DeserializationError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_are_deserialization_errors() {
        let decoded: serde_json::Value = from_json_str(r#"{"key": "value"}"#).expect("json");
        assert_eq!(decoded["key"], "value");
        let err = from_json_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(err, VersionManagerError::DeserializationError(_)));
    }

    #[test]
    fn yaml_reads_nested_maps() {
        let decoded: serde_json::Value =
            from_yaml_str("application:\n  version: \"1.2.0\"\n").expect("yaml");
        assert_eq!(decoded["application"]["version"], "1.2.0");
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = from_json_str::<serde_json::Value>("{ nope").unwrap_err();
        assert!(matches!(err, VersionManagerError::DeserializationError(_)));
    }
}

//! Serde helpers for query strings, where every value arrives as a string.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Empty or whitespace-only strings become `None`; others are trimmed.
pub fn deserialize_optional_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Accepts `true`/`false`/`1`/`0` as strings (query strings) or booleans (JSON).
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got `{}`",
                other
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
        search: Option<String>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        flag: Option<bool>,
    }

    #[test]
    fn test_empty_values_become_none() {
        let q: Query = serde_json::from_str(r#"{"id":"","search":"   ","flag":""}"#).unwrap();
        assert!(q.id.is_none());
        assert!(q.search.is_none());
        assert!(q.flag.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"id":"{}","search":"  rust ","flag":"true"}}"#, id);
        let q: Query = serde_json::from_str(&raw).unwrap();
        assert_eq!(q.id, Some(id));
        assert_eq!(q.search.as_deref(), Some("rust"));
        assert_eq!(q.flag, Some(true));
    }

    #[test]
    fn test_bool_accepts_json_bool() {
        let q: Query = serde_json::from_str(r#"{"flag":false}"#).unwrap();
        assert_eq!(q.flag, Some(false));
    }

    #[test]
    fn test_invalid_uuid_fails() {
        assert!(serde_json::from_str::<Query>(r#"{"id":"nope"}"#).is_err());
    }
}

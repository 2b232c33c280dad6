//! Portable column codecs.
//!
//! Structured columns (string lists, parameter dicts, enum values) are
//! stored behind one uniform in-memory representation. On this engine
//! everything lands in a JSON text column; a server-grade backend with
//! native arrays would swap the encoding, not the API. Stored NULL always
//! decodes to `None`, and encoding an empty collection is valid (it is
//! `"[]"`, not NULL).

use std::str::FromStr;

use crate::model::practice::Parameters;
use crate::{Error, Result};

/// Encode a string list as JSON text.
pub fn encode_string_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decode a string list from a stored JSON text column.
pub fn decode_string_list(stored: Option<String>) -> Result<Option<Vec<String>>> {
    match stored {
        None => Ok(None),
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
    }
}

/// Encode a parameter dict (string keys, scalar values) as JSON text.
pub fn encode_dict(params: &Parameters) -> Result<String> {
    Ok(serde_json::to_string(params)?)
}

/// Decode a parameter dict from a stored JSON text column.
pub fn decode_dict(stored: Option<String>) -> Result<Option<Parameters>> {
    match stored {
        None => Ok(None),
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
    }
}

/// Encode an enum member as its canonical string value.
///
/// Stores the string, never an ordinal, so members can be reordered
/// without a migration and the column stays human-readable.
pub fn encode_enum<T: std::fmt::Display>(value: &T) -> String {
    value.to_string()
}

/// Decode an enum member from its stored string value.
///
/// An unrecognized string is a [`Error::Decoding`] failure, never a
/// silent coercion.
pub fn decode_enum<T>(stored: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    stored.parse()
}

/// Decode an optional enum column; NULL decodes to `None`.
pub fn decode_enum_opt<T>(stored: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    stored.as_deref().map(decode_enum).transpose()
}

/// Encode a list of enum members as a JSON array of their string values.
pub fn encode_enum_list<T: std::fmt::Display>(values: &[T]) -> Result<String> {
    let strings: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    Ok(serde_json::to_string(&strings)?)
}

/// Decode a list of enum members from a stored JSON text column.
pub fn decode_enum_list<T>(stored: &str) -> Result<Vec<T>>
where
    T: FromStr<Err = Error>,
{
    let strings: Vec<String> = serde_json::from_str(stored)?;
    strings.iter().map(|s| decode_enum(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::practice::ParamValue;
    use crate::model::{DomainType, SessionType};

    #[test]
    fn test_string_list_round_trip() {
        let pitches: Vec<String> = ["E2", "A2", "D3", "G3", "B3", "E4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let encoded = encode_string_list(&pitches).unwrap();
        let decoded = decode_string_list(Some(encoded)).unwrap().unwrap();
        assert_eq!(decoded, pitches);
    }

    #[test]
    fn test_empty_list_is_not_null() {
        let encoded = encode_string_list(&[]).unwrap();
        assert_eq!(encoded, "[]");
        let decoded = decode_string_list(Some(encoded)).unwrap().unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_null_decodes_to_none() {
        assert_eq!(decode_string_list(None).unwrap(), None);
        assert_eq!(decode_dict(None).unwrap(), None);
        assert_eq!(
            decode_enum_opt::<SessionType>(None).unwrap(),
            None
        );
    }

    #[test]
    fn test_dict_round_trip() {
        let mut params = Parameters::new();
        params.insert("tempo".to_string(), ParamValue::Int(120));
        params.insert("pattern".to_string(), ParamValue::String("1-2-3-4".to_string()));
        params.insert("ratio".to_string(), ParamValue::Float(0.75));

        let encoded = encode_dict(&params).unwrap();
        let decoded = decode_dict(Some(encoded)).unwrap().unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn test_enum_round_trip() {
        for session_type in [
            SessionType::Normal,
            SessionType::Light,
            SessionType::Heavy,
            SessionType::Deload,
        ] {
            let encoded = encode_enum(&session_type);
            let decoded: SessionType = decode_enum(&encoded).unwrap();
            assert_eq!(decoded, session_type);
        }
    }

    #[test]
    fn test_unrecognized_enum_string_fails() {
        let result: Result<SessionType> = decode_enum("intense");
        assert!(matches!(result, Err(Error::Decoding(_))));
    }

    #[test]
    fn test_enum_list_round_trip() {
        let domains = vec![DomainType::Technique, DomainType::Rhythm];
        let encoded = encode_enum_list(&domains).unwrap();
        assert_eq!(encoded, r#"["Technique","Rhythm"]"#);
        let decoded: Vec<DomainType> = decode_enum_list(&encoded).unwrap();
        assert_eq!(decoded, domains);
    }

    #[test]
    fn test_enum_list_rejects_unknown_member() {
        let result: Result<Vec<DomainType>> = decode_enum_list(r#"["Technique","Cardio"]"#);
        assert!(matches!(result, Err(Error::Decoding(_))));
    }

    #[test]
    fn test_malformed_json_is_decoding_failure() {
        let result = decode_string_list(Some("not json".to_string()));
        assert!(matches!(result, Err(Error::Decoding(_))));
    }
}

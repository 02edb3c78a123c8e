//! Descriptor — Event Log File export metadata and the column-type manifest.
//!
//! A [`LogDescriptor`] identifies one ELF export on the CRM side: which
//! event type it covers, where its CSV body can be downloaded from, and the
//! per-column type manifest that drives schema-aware decoding.

use serde::{Deserialize, Serialize};

/// Metadata for one Event Log File export, as returned by the bulk log API.
///
/// Field names mirror the API's PascalCase JSON keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogDescriptor {
    pub id: String,
    pub event_type: String,
    /// Opaque download reference (a URL path on the API host).
    pub log_file: String,
    pub log_date: String,
    pub log_file_length: i64,
    /// Comma-separated type tags, aligned to the CSV columns.
    pub log_file_field_types: String,
}

impl LogDescriptor {
    /// Parse the comma-separated type manifest into an ordered tag list.
    pub fn field_types(&self) -> Vec<TypeTag> {
        parse_field_types(&self.log_file_field_types)
    }
}

/// Declared semantic type of one CSV column.
///
/// Closed set: adding a tag without updating every decode match is a
/// compile-time error, not a silent string fallthrough. Tokens the manifest
/// uses that we do not recognize are mapped to `String` at the parse
/// boundary ([`TypeTag::from_token`]), never inside the decode dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Number,
    Boolean,
    Ip,
    String,
    Id,
    EscapedString,
    Set,
}

impl TypeTag {
    /// Map a manifest token to a tag. Unrecognized tokens get `String`
    /// semantics.
    pub fn from_token(token: &str) -> Self {
        match token {
            "Number" => TypeTag::Number,
            "Boolean" => TypeTag::Boolean,
            "IP" => TypeTag::Ip,
            "String" => TypeTag::String,
            "Id" => TypeTag::Id,
            "EscapedString" => TypeTag::EscapedString,
            "Set" => TypeTag::Set,
            _ => TypeTag::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Number => "Number",
            TypeTag::Boolean => "Boolean",
            TypeTag::Ip => "IP",
            TypeTag::String => "String",
            TypeTag::Id => "Id",
            TypeTag::EscapedString => "EscapedString",
            TypeTag::Set => "Set",
        }
    }
}

/// Split a comma-separated type manifest into an ordered tag list.
pub fn parse_field_types(manifest: &str) -> Vec<TypeTag> {
    if manifest.trim().is_empty() {
        return Vec::new();
    }
    manifest
        .split(',')
        .map(|token| TypeTag::from_token(token.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest_ordered() {
        let tags = parse_field_types("Id,Number,Boolean,IP,EscapedString,Set,String");
        assert_eq!(
            tags,
            vec![
                TypeTag::Id,
                TypeTag::Number,
                TypeTag::Boolean,
                TypeTag::Ip,
                TypeTag::EscapedString,
                TypeTag::Set,
                TypeTag::String,
            ]
        );
    }

    #[test]
    fn test_unrecognized_token_defaults_to_string() {
        assert_eq!(TypeTag::from_token("Geolocation"), TypeTag::String);
        assert_eq!(TypeTag::from_token(""), TypeTag::String);
        // Tags are case-sensitive the way the platform emits them.
        assert_eq!(TypeTag::from_token("number"), TypeTag::String);
    }

    #[test]
    fn test_manifest_whitespace_tolerated() {
        let tags = parse_field_types("Number, Boolean ,IP");
        assert_eq!(tags, vec![TypeTag::Number, TypeTag::Boolean, TypeTag::Ip]);
    }

    #[test]
    fn test_empty_manifest() {
        assert!(parse_field_types("").is_empty());
        assert!(parse_field_types("   ").is_empty());
    }

    #[test]
    fn test_descriptor_json_shape() {
        let json = r#"{
            "Id": "0AT000000000001",
            "EventType": "Login",
            "LogFile": "/services/data/v52.0/sobjects/EventLogFile/0AT000000000001/LogFile",
            "LogDate": "2021-05-01T00:00:00.000Z",
            "LogFileLength": 2048,
            "LogFileFieldTypes": "String,Id,Number"
        }"#;
        let descriptor: LogDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.event_type, "Login");
        assert_eq!(
            descriptor.field_types(),
            vec![TypeTag::String, TypeTag::Id, TypeTag::Number]
        );
    }
}

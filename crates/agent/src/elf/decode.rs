//! Decode — schema-typed CSV row into a typed field array.
//!
//! Each CSV column carries a [`TypeTag`] from the export's type manifest;
//! the dispatch below is an exhaustive match over the closed tag set, so a
//! new tag that reaches this module without a decode rule fails to compile.

use std::net::Ipv4Addr;

use csv::StringRecord;
use serde::Serialize;

use super::descriptor::TypeTag;
use super::error::IngestError;

/// One decoded CSV field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// One decoded data row: one optional value per header column.
pub type Row = Vec<Option<FieldValue>>;

/// Decode a tokenized CSV row against the column type manifest.
///
/// Row width must equal manifest width; an empty token is always an absent
/// value, never a default.
pub fn decode_row(raw: &StringRecord, types: &[TypeTag]) -> Result<Row, IngestError> {
    if raw.len() != types.len() {
        return Err(IngestError::LengthMismatch {
            expected: types.len(),
            got: raw.len(),
        });
    }

    raw.iter()
        .zip(types)
        .enumerate()
        .map(|(column, (text, tag))| decode_field(*tag, text, column))
        .collect()
}

fn decode_field(tag: TypeTag, text: &str, column: usize) -> Result<Option<FieldValue>, IngestError> {
    if text.is_empty() {
        return Ok(None);
    }

    let value = match tag {
        TypeTag::Number => {
            let parsed = text.parse::<f64>().map_err(|_| IngestError::TypeParse {
                tag: "Number",
                column,
                value: text.to_string(),
            })?;
            FieldValue::Number(parsed)
        }
        // Historical polarity preserved exactly: "0" is true, everything
        // else false. Downstream consumers depend on this output.
        TypeTag::Boolean => FieldValue::Bool(text == "0"),
        // Tokens that are not valid IPv4 literals decode as absent, not as
        // errors; valid ones keep the raw string unchanged.
        TypeTag::Ip => match text.parse::<Ipv4Addr>() {
            Ok(_) => FieldValue::Text(text.to_string()),
            Err(_) => return Ok(None),
        },
        TypeTag::String | TypeTag::Id | TypeTag::EscapedString | TypeTag::Set => {
            FieldValue::Text(text.to_string())
        }
    };

    Ok(Some(value))
}

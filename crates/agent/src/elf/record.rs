//! Record — structured output record with derived timestamp and routing tag.
//!
//! One [`Record`] per CSV data row. The canonical timestamp comes from the
//! row's `TIMESTAMP` column when present; the `"type"` field routes the
//! record to a date-partitioned index downstream.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use csv::StringRecord;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::decode::{FieldValue, Row};
use super::error::IngestError;

/// Timestamp shapes the platform emits inside `TIMESTAMP` columns, tried
/// after RFC 3339. All are interpreted as UTC.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y%m%d%H%M%S%.3f", "%Y-%m-%d %H:%M:%S"];

/// One structured record, ready for the output queue.
///
/// `fields` holds the header-derived values plus the `"type"` routing tag;
/// absent row values are never written, so a record carries at most
/// header-width + 1 keys.
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub fields: HashMap<String, FieldValue>,
}

impl Serialize for Record {
    /// Flat JSON object: `@timestamp` plus the fields.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(
            "@timestamp",
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Build one record from a decoded row, in header order.
///
/// The `"type"` routing tag is recomputed and overwritten at every column
/// from whatever the canonical timestamp is at that point — ingestion time
/// until the `TIMESTAMP` column has been visited, the parsed value after.
/// Last write wins. This per-column recomputation is the historical
/// behavior and is deliberately not hoisted after the loop.
pub fn build_record(
    header: &StringRecord,
    row: &Row,
    event_type: &str,
    ingested_at: DateTime<Utc>,
) -> Result<Record, IngestError> {
    if header.len() != row.len() {
        return Err(IngestError::LengthMismatch {
            expected: header.len(),
            got: row.len(),
        });
    }

    let mut timestamp = ingested_at;
    let mut fields = HashMap::with_capacity(header.len() + 1);

    for (column, name) in header.iter().enumerate() {
        if name == "TIMESTAMP" {
            if let Some(value) = &row[column] {
                timestamp = parse_timestamp_value(value, column)?;
            }
        }

        fields.insert(
            "type".to_string(),
            FieldValue::Text(routing_tag(event_type, &timestamp)),
        );

        if let Some(value) = &row[column] {
            fields.insert(name.to_string(), value.clone());
        }
    }

    Ok(Record { timestamp, fields })
}

/// `logstash-elf-<eventtype-lowercased>-<YYYY-MM-dd>`, date in UTC.
fn routing_tag(event_type: &str, timestamp: &DateTime<Utc>) -> String {
    format!(
        "logstash-elf-{}-{}",
        event_type.to_lowercase(),
        timestamp.format("%Y-%m-%d")
    )
}

fn parse_timestamp_value(value: &FieldValue, column: usize) -> Result<DateTime<Utc>, IngestError> {
    let text = match value {
        FieldValue::Text(text) => text,
        // A TIMESTAMP column that decoded as anything but text is a
        // manifest defect; parse failure is fatal, never defaulted.
        FieldValue::Number(n) => {
            return Err(timestamp_error(column, &n.to_string()));
        }
        FieldValue::Bool(b) => {
            return Err(timestamp_error(column, &b.to_string()));
        }
    };

    parse_timestamp(text).ok_or_else(|| timestamp_error(column, text))
}

fn timestamp_error(column: usize, value: &str) -> IngestError {
    IngestError::TypeParse {
        tag: "Timestamp",
        column,
        value: value.to_string(),
    }
}

/// Try RFC 3339 first, then the platform's other timestamp shapes.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(text, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn header(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    fn text(value: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(value.to_string()))
    }

    fn ingested() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_timestamp_and_routing_tag() {
        let record = build_record(
            &header(&["TIMESTAMP", "EVENT_TYPE"]),
            &vec![text("2021-05-01T10:00:00Z"), text("Login")],
            "Login",
            ingested(),
        )
        .unwrap();

        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            record.fields.get("type"),
            Some(&FieldValue::Text("logstash-elf-login-2021-05-01".to_string()))
        );
        assert_eq!(record.fields.get("EVENT_TYPE"), text("Login").as_ref());
        // Header width 2 → at most 3 keys.
        assert_eq!(record.fields.len(), 3);
    }

    #[test]
    fn test_tag_overwritten_after_late_timestamp_column() {
        // TIMESTAMP is not the first column: earlier iterations tag with
        // ingestion time, the later ones overwrite with the parsed date.
        let record = build_record(
            &header(&["EVENT_TYPE", "TIMESTAMP"]),
            &vec![text("Login"), text("2021-05-01T10:00:00Z")],
            "Login",
            ingested(),
        )
        .unwrap();

        assert_eq!(
            record.fields.get("type"),
            Some(&FieldValue::Text("logstash-elf-login-2021-05-01".to_string()))
        );
    }

    #[test]
    fn test_no_timestamp_column_tags_with_ingestion_date() {
        let record = build_record(
            &header(&["EVENT_TYPE"]),
            &vec![text("ApexSoap")],
            "ApexSoap",
            ingested(),
        )
        .unwrap();

        assert_eq!(record.timestamp, ingested());
        assert_eq!(
            record.fields.get("type"),
            Some(&FieldValue::Text("logstash-elf-apexsoap-2021-06-15".to_string()))
        );
    }

    #[test]
    fn test_absent_timestamp_value_keeps_ingestion_time() {
        let record = build_record(
            &header(&["TIMESTAMP", "EVENT_TYPE"]),
            &vec![None, text("Login")],
            "Login",
            ingested(),
        )
        .unwrap();

        assert_eq!(record.timestamp, ingested());
        assert!(!record.fields.contains_key("TIMESTAMP"));
    }

    #[test]
    fn test_unparseable_timestamp_is_fatal() {
        let err = build_record(
            &header(&["TIMESTAMP"]),
            &vec![text("yesterday-ish")],
            "Login",
            ingested(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            IngestError::TypeParse { tag: "Timestamp", column: 0, .. }
        ));
    }

    #[test]
    fn test_bulk_timestamp_format() {
        let record = build_record(
            &header(&["TIMESTAMP"]),
            &vec![text("20210501100000.000")],
            "API",
            ingested(),
        )
        .unwrap();
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_absent_values_never_written() {
        let record = build_record(
            &header(&["A", "B", "C"]),
            &vec![text("a"), None, Some(FieldValue::Number(1.0))],
            "Login",
            ingested(),
        )
        .unwrap();

        assert!(!record.fields.contains_key("B"));
        assert_eq!(record.fields.len(), 3); // A, C, type
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let err = build_record(
            &header(&["A", "B"]),
            &vec![text("a")],
            "Login",
            ingested(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::LengthMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_serialized_shape() {
        let record = build_record(
            &header(&["TIMESTAMP", "COUNT", "OK"]),
            &vec![
                text("2021-05-01T10:00:00Z"),
                Some(FieldValue::Number(3.0)),
                Some(FieldValue::Bool(true)),
            ],
            "Login",
            ingested(),
        )
        .unwrap();

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["@timestamp"], "2021-05-01T10:00:00.000Z");
        assert_eq!(json["COUNT"], 3.0);
        assert_eq!(json["OK"], true);
        assert_eq!(json["type"], "logstash-elf-login-2021-05-01");
    }
}

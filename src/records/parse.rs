use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::warn;

use super::record::DataRecord;

/// Parses either a top-level array of records or an object carrying a
/// `records` array.
///
/// Sizes are sanitized here: negative or non-finite values become `0`, so the
/// layout engine never has to validate them.
pub fn parse_records(raw: &str) -> Result<Vec<DataRecord>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in record file")?;

    let entries = match parsed {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("records") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(anyhow!("`records` must be an array")),
            None => return Err(anyhow!("record file has no `records` array")),
        },
        _ => return Err(anyhow!("unexpected JSON type in record file")),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let mut record = match serde_json::from_value::<DataRecord>(entry) {
            Ok(record) => record,
            Err(error) => {
                warn!(index, %error, "skipping malformed record");
                continue;
            }
        };

        if !record.size.is_finite() || record.size < 0.0 {
            record.size = 0.0;
        }
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_level_array() {
        let records = parse_records(
            r#"[
                {"id": "a", "label": "Alpha", "size": 10, "category": "x"},
                {"label": "Beta", "size": 2.5, "group": "g1", "owner": "ops"}
            ]"#,
        )
        .expect("array parses");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("a"));
        assert_eq!(records[1].group.as_deref(), Some("g1"));
        assert_eq!(records[1].field("owner").as_deref(), Some("ops"));
    }

    #[test]
    fn parses_records_object() {
        let records = parse_records(r#"{"title": "t", "records": [{"label": "only", "size": 1}]}"#)
            .expect("object parses");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "only");
    }

    #[test]
    fn negative_sizes_are_zeroed() {
        let records =
            parse_records(r#"[{"label": "neg", "size": -4}]"#).expect("record parses");
        assert_eq!(records[0].size, 0.0);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let records = parse_records(r#"[{"label": 12, "size": "big"}, {"label": "ok", "size": 1}]"#)
            .expect("file parses");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "ok");
    }

    #[test]
    fn rejects_scalar_documents() {
        assert!(parse_records("42").is_err());
        assert!(parse_records(r#"{"records": 3}"#).is_err());
        assert!(parse_records(r#"{"rows": []}"#).is_err());
        assert!(parse_records("not json").is_err());
    }
}

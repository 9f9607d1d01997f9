use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Object fields that hold timestamps and are revived on load.
const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// Read the raw JSON stored under `key`. Array values get their timestamp
/// fields revived; see [`revive_timestamps`].
pub fn load_value(conn: &Connection, key: &str) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM storage WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read key {key}"))?;

    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("stored value for {key} is not valid JSON"))?;
    revive_timestamps(&mut value, Utc::now());
    Ok(Some(value))
}

/// Insert or overwrite the JSON stored under `key`.
pub fn save_value(conn: &Connection, key: &str, value: &Value) -> Result<()> {
    let raw = serde_json::to_string(value).context("failed to encode value")?;
    conn.execute(
        "INSERT INTO storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, raw],
    )
    .with_context(|| format!("failed to write key {key}"))?;
    Ok(())
}

/// Typed read that falls back to `default` when the key is absent. Unreadable
/// or mismatched documents are logged and also yield the default, so a bad
/// row never blocks start-up.
pub fn get<T: DeserializeOwned>(conn: &Connection, key: &str, default: T) -> Result<T> {
    let value = match load_value(conn, key) {
        Ok(Some(value)) => value,
        Ok(None) => return Ok(default),
        Err(err) if is_decode_error(&err) => {
            warn!("ignoring stored {key}: {err:#}");
            return Ok(default);
        }
        Err(err) => return Err(err),
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            warn!("ignoring stored {key}: {err}");
            Ok(default)
        }
    }
}

/// Typed write.
pub fn set<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).with_context(|| format!("failed to encode {key}"))?;
    save_value(conn, key, &value)
}

fn is_decode_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<serde_json::Error>())
}

/// Normalise `createdAt`/`updatedAt` on every object of a top-level array.
/// Parsable values are rewritten as RFC 3339; missing or unparsable ones
/// become `now`. Non-array values are left alone.
pub fn revive_timestamps(value: &mut Value, now: DateTime<Utc>) {
    let Value::Array(items) = value else {
        return;
    };
    for item in items.iter_mut() {
        let Value::Object(fields) = item else {
            continue;
        };
        for field in TIMESTAMP_FIELDS {
            let parsed = fields.get(field).and_then(parse_timestamp).unwrap_or(now);
            fields.insert(
                field.to_string(),
                Value::String(parsed.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
    }
}

/// Accepts RFC 3339, offset-less ISO date-times, bare dates, and epoch
/// milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

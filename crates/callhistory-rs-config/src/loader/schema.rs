//! Structural checks for a single JSON5 layer, run before merging so errors
//! point at the layer that introduced them.

use crate::ConfigError;
use serde_json::{Map, Value};

#[derive(Clone, Copy)]
enum FieldKind {
    /// Non-negative integer.
    Count,
    /// Signed integer, `null` allowed.
    OptionalOffset,
    /// strftime pattern.
    Pattern,
}

const PAGING: &[(&str, FieldKind)] = &[("page_size", FieldKind::Count)];
const SUGGESTIONS: &[(&str, FieldKind)] = &[
    ("debounce_ms", FieldKind::Count),
    ("recent_window_hours", FieldKind::Count),
    ("max_recent", FieldKind::Count),
    ("max_search", FieldKind::Count),
];
const DISPLAY: &[(&str, FieldKind)] = &[
    ("utc_offset_minutes", FieldKind::OptionalOffset),
    ("date_format", FieldKind::Pattern),
    ("time_format", FieldKind::Pattern),
];
const REFRESH: &[(&str, FieldKind)] = &[("settle_delay_ms", FieldKind::Count)];

const SECTIONS: &[(&str, &[(&str, FieldKind)])] = &[
    ("paging", PAGING),
    ("suggestions", SUGGESTIONS),
    ("display", DISPLAY),
    ("refresh", REFRESH),
];

/// Check one layer. Every key must be known and every value well typed.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let Value::Object(root) = value else {
        return Err(invalid_field(layer, "root", "expected object"));
    };
    for (key, value) in root {
        if key == "$schema" {
            if !value.is_string() {
                return Err(invalid_field(layer, key, "expected string"));
            }
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| name == key) else {
            return Err(invalid_field(layer, key, "unknown key"));
        };
        let Value::Object(section) = value else {
            return Err(invalid_field(layer, key, "expected object"));
        };
        validate_section(section, fields, layer, key)?;
    }
    Ok(())
}

fn validate_section(
    section: &Map<String, Value>,
    fields: &[(&str, FieldKind)],
    layer: &str,
    section_name: &str,
) -> Result<(), ConfigError> {
    for (key, value) in section {
        let path = format!("{section_name}.{key}");
        let Some((_, kind)) = fields.iter().find(|(name, _)| name == key) else {
            return Err(invalid_field(layer, &path, "unknown key"));
        };
        let (ok, expected) = match kind {
            FieldKind::Count => (value.is_u64(), "expected non-negative integer"),
            FieldKind::OptionalOffset => (
                value.is_null() || value.is_i64() || value.is_u64(),
                "expected integer or null",
            ),
            FieldKind::Pattern => (value.is_string(), "expected string"),
        };
        if !ok {
            return Err(invalid_field(layer, &path, expected));
        }
    }
    Ok(())
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}

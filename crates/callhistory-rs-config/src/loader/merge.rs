use serde_json::{Map, Value};

/// Fold a higher-precedence layer into the accumulated config.
///
/// Objects merge key by key. Any other value replaces what was there, and an
/// explicit `null` removes the key so the model default applies again.
pub(super) fn overlay(base: &mut Map<String, Value>, layer: Map<String, Value>) {
    for (key, value) in layer {
        match value {
            Value::Null => {
                base.remove(&key);
            }
            Value::Object(section) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => overlay(existing, section),
                _ => {
                    base.insert(key, Value::Object(without_nulls(section)));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

fn without_nulls(mut section: Map<String, Value>) -> Map<String, Value> {
    section.retain(|_, value| !value.is_null());
    section
}

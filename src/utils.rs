use serde_json::{Map, Value};

/// Recursively merge `overwrite` into a copy of `source`.
///
/// Nested objects present on both sides are merged key by key; any other
/// value from `overwrite` replaces the one in `source`.
pub fn merge_json(source: &Value, overwrite: &Value) -> Value {
    match (source, overwrite) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged: Map<String, Value> = base.clone();
            for (key, value) in patch {
                let next = match merged.get(key) {
                    Some(existing @ Value::Object(_)) => merge_json(existing, value),
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, patch) => patch.clone(),
    }
}

/// Shallow-insert the fields of `extra` into `body`; non-object extras are ignored
pub(crate) fn extend_object(body: &mut Value, extra: Option<Value>) {
    if let (Some(target), Some(Value::Object(fields))) = (body.as_object_mut(), extra) {
        target.extend(fields);
    }
}

use serde_json::Value;

/// Tri-state for PATCH bodies: a key can be absent (leave the field alone),
/// null (clear it), or carry a value.
pub enum Patch<T> {
    Omitted,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    /// Maps to the `Option<Option<T>>` shape diesel changesets expect for
    /// nullable columns: outer `None` = untouched, `Some(None)` = set NULL.
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Patch::Omitted => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }
}

pub fn patch_string(body: &Value, key: &str) -> Result<Patch<String>, String> {
    match body.get(key) {
        None => Ok(Patch::Omitted),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::String(s)) => Ok(Patch::Value(s.to_owned())),
        Some(other) => Err(format!("{key}: expected string or null, got {other}")),
    }
}

pub fn patch_i64(body: &Value, key: &str) -> Result<Patch<i64>, String> {
    match body.get(key) {
        None => Ok(Patch::Omitted),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Patch::Value)
            .ok_or_else(|| format!("{key}: expected integer, got {n}")),
        Some(other) => Err(format!("{key}: expected integer or null, got {other}")),
    }
}

pub fn patch_i32(body: &Value, key: &str) -> Result<Patch<i32>, String> {
    match patch_i64(body, key)? {
        Patch::Omitted => Ok(Patch::Omitted),
        Patch::Null => Ok(Patch::Null),
        Patch::Value(v) => i32::try_from(v)
            .map(Patch::Value)
            .map_err(|_| format!("{key}: integer out of range")),
    }
}

pub fn patch_string_array(body: &Value, key: &str) -> Result<Patch<Vec<String>>, String> {
    match body.get(key) {
        None => Ok(Patch::Omitted),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.push(s.to_owned()),
                    other => {
                        return Err(format!("{key}: expected array of strings, got {other}"))
                    }
                }
            }
            Ok(Patch::Value(out))
        }
        Some(other) => Err(format!("{key}: expected array of strings or null, got {other}")),
    }
}

pub fn patch_bool(body: &Value, key: &str) -> Result<Patch<bool>, String> {
    match body.get(key) {
        None => Ok(Patch::Omitted),
        Some(Value::Null) => Ok(Patch::Null),
        Some(Value::Bool(b)) => Ok(Patch::Value(*b)),
        Some(other) => Err(format!("{key}: expected boolean or null, got {other}")),
    }
}

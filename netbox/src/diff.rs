use serde_json::{Map, Value};

/// Field name to value, in insertion order.
pub type Fields = Map<String, Value>;

/// Fields of `desired` that are missing from or differ in `existing`.
///
/// Keys only present in `existing` are never part of the patch. Values are
/// compared exactly, so `1` and `"1"` differ.
pub fn diff(existing: &Fields, desired: &Fields) -> Fields {
    desired
        .iter()
        .filter(|(key, value)| existing.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

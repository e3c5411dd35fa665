use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::{Fields, NetBoxError};

/// A paginated list response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Platform {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlatform {
    pub name: String,
    pub slug: String,
}

/// A virtual machine as the registry currently stores it.
///
/// Related objects (`{"id": 3, "url": ..}`) are reduced to their id, choice
/// fields (`{"value": "active", "label": "Active"}`) to their value and
/// whole-number decimals to integers, matching the shape of a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingVm {
    pub id: u64,
    pub fields: Fields,
}

impl ExistingVm {
    pub fn from_value(value: Value) -> Result<Self, NetBoxError> {
        let Value::Object(raw) = value else {
            return Err(NetBoxError::InvalidRecord(value));
        };
        let Some(id) = raw.get("id").and_then(Value::as_u64) else {
            return Err(NetBoxError::InvalidRecord(Value::Object(raw)));
        };
        let fields = raw
            .into_iter()
            .map(|(key, value)| (key, normalize(value)))
            .collect();
        Ok(ExistingVm { id, fields })
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            if let Some(id) = object.get("id").filter(|id| id.is_u64()) {
                return id.clone();
            }
            if object.contains_key("label") {
                if let Some(choice) = object.remove("value") {
                    return choice;
                }
            }
            Value::Object(object)
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f >= 0.0 => {
                Value::Number(Number::from(f as u64))
            }
            _ => Value::Number(n),
        },
        other => other,
    }
}

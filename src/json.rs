//! JSON bridge
//!
//! Converts between [`JsValue`] and `serde_json::Value` with `JSON.stringify`
//! rules, and implements `serde::Serialize` for values and wrappers on top of
//! that conversion.

use serde::ser::{Error as _, Serialize, Serializer};

use crate::chain::Wrapped;
use crate::error::UnderbarError;
use crate::keys::own_keys;
use crate::prelude::*;
use crate::realm::Realm;
use crate::value::{ExoticObject, JsObjectRef, JsString, JsValue, date_to_iso_string};

/// Build a value from parsed JSON
///
/// Object keys are inserted in the order the map yields them; integer-like
/// keys enumerate first afterwards, as they do for any object.
pub fn from_json(realm: &Realm, json: &serde_json::Value) -> JsValue {
    match json {
        serde_json::Value::Null => JsValue::Null,
        serde_json::Value::Bool(b) => JsValue::Boolean(*b),
        serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsValue::String(JsString::from(s.as_str())),
        serde_json::Value::Array(items) => {
            let elements = items.iter().map(|item| from_json(realm, item)).collect();
            JsValue::Object(realm.new_array(elements))
        }
        serde_json::Value::Object(map) => {
            let obj = realm.new_object();
            {
                let mut o = obj.borrow_mut();
                for (key, value) in map {
                    o.set_property(realm.key(key), from_json(realm, value));
                }
            }
            JsValue::Object(obj)
        }
    }
}

/// Parse JSON text into a value
pub fn parse(realm: &Realm, text: &str) -> Result<JsValue, UnderbarError> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| UnderbarError::syntax_error(format!("JSON.parse: {}", e)))?;
    Ok(from_json(realm, &json))
}

/// Convert a value to JSON following `JSON.stringify`
///
/// - `undefined` and functions are dropped from objects and become `null`
///   in arrays and at the top level
/// - non-finite numbers become `null`
/// - boxed primitives are unwrapped
/// - valid dates become ISO-8601 strings, invalid ones `null`
/// - other objects keep their own enumerable properties
///
/// Cyclic input fails with [`UnderbarError::CircularStructure`].
pub fn to_json(value: &JsValue) -> Result<serde_json::Value, UnderbarError> {
    let mut tracker = CircularTracker::default();
    Ok(to_json_keyed("", value, &mut tracker)?.unwrap_or(serde_json::Value::Null))
}

/// Serialize a value to JSON text
pub fn stringify(value: &JsValue) -> Result<String, UnderbarError> {
    let json = to_json(value)?;
    serde_json::to_string(&json).map_err(|e| UnderbarError::type_error(e.to_string()))
}

/// Objects on the current conversion path, with the key each was reached by
#[derive(Default)]
struct CircularTracker {
    path: Vec<(String, usize)>,
}

impl CircularTracker {
    fn enter(&mut self, key: &str, obj: &JsObjectRef) -> Result<(), UnderbarError> {
        let id = obj.id();
        if let Some(start) = self.path.iter().position(|(_, seen)| *seen == id) {
            let cycle: Vec<String> = self
                .path
                .iter()
                .skip(start + 1)
                .map(|(key, _)| key.clone())
                .chain(core::iter::once(key.to_string()))
                .collect();
            tracing::debug!(depth = self.path.len(), "rejecting cyclic value in JSON conversion");
            return Err(UnderbarError::circular_structure(cycle));
        }
        self.path.push((key.to_string(), id));
        Ok(())
    }

    fn exit(&mut self) {
        self.path.pop();
    }
}

/// `None` for values JSON cannot hold (`undefined`, functions)
fn to_json_keyed(
    key: &str,
    value: &JsValue,
    tracker: &mut CircularTracker,
) -> Result<Option<serde_json::Value>, UnderbarError> {
    let obj = match value {
        JsValue::Undefined => return Ok(None),
        JsValue::Null => return Ok(Some(serde_json::Value::Null)),
        JsValue::Boolean(b) => return Ok(Some(serde_json::Value::Bool(*b))),
        JsValue::Number(n) => return Ok(Some(number_to_json(*n))),
        JsValue::String(s) => return Ok(Some(serde_json::Value::String(s.to_string()))),
        JsValue::Object(obj) => obj,
    };

    let elements = {
        let o = obj.borrow();
        match &o.exotic {
            ExoticObject::Function(_) => return Ok(None),
            ExoticObject::Number(n) => return Ok(Some(number_to_json(*n))),
            ExoticObject::Boolean(b) => return Ok(Some(serde_json::Value::Bool(*b))),
            ExoticObject::StringObj(s) => {
                return Ok(Some(serde_json::Value::String(s.to_string())));
            }
            ExoticObject::Date { timestamp } => {
                return Ok(Some(match date_to_iso_string(*timestamp) {
                    Some(iso) => serde_json::Value::String(iso),
                    None => serde_json::Value::Null,
                }));
            }
            ExoticObject::Array { .. } => o.array_values(),
            _ => None,
        }
    };

    tracker.enter(key, obj)?;
    let json = match elements {
        Some(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for (i, element) in elements.iter().enumerate() {
                let item = to_json_keyed(&i.to_string(), element, tracker)?;
                items.push(item.unwrap_or(serde_json::Value::Null));
            }
            serde_json::Value::Array(items)
        }
        None => {
            let mut map = serde_json::Map::new();
            for name in own_keys(value) {
                let member = value.get(&name);
                if let Some(item) = to_json_keyed(name.as_str(), &member, tracker)? {
                    map.insert(name.to_string(), item);
                }
            }
            serde_json::Value::Object(map)
        }
    };
    tracker.exit();
    Ok(Some(json))
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    // Whole numbers print without a fraction, and -0 prints as 0
    let safe = 9_007_199_254_740_991.0;
    if n == math::trunc(n) && (-safe..=safe).contains(&n) {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl Serialize for JsValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl Serialize for Wrapped {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

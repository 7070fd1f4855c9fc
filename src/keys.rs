//! Key enumeration
//!
//! Names come back in host order: integer indices ascending, then string keys
//! in insertion order. Non-objects have no keys, so every function here is
//! total.

use crate::kind::is_function;
use crate::prelude::*;
use crate::value::{JsString, JsValue, PropertyKey, string_own_value};

/// Ordered property names of an object at one point in time
pub type KeySet = Vec<JsString>;

/// Own enumerable property names (`Object.keys`)
pub fn own_keys(value: &JsValue) -> KeySet {
    let JsValue::Object(obj) = value else {
        return Vec::new();
    };
    obj.borrow()
        .own_keys(true)
        .iter()
        .map(PropertyKey::to_js_string)
        .collect()
}

/// Own and inherited enumerable property names, in `for-in` order
///
/// Each prototype level contributes its own keys after the levels below it.
/// A name is listed once, and a name already seen closer to the object hides
/// the inherited one even when the closer property is not enumerable.
pub fn all_keys(value: &JsValue) -> KeySet {
    let JsValue::Object(obj) = value else {
        return Vec::new();
    };

    let mut keys = Vec::new();
    let mut seen: FxHashSet<PropertyKey> = FxHashSet::default();
    let mut current = Some(obj.clone());
    while let Some(level) = current {
        let object = level.borrow();
        for key in object.own_keys(false) {
            let enumerable = object
                .get_own_property(&key)
                .is_some_and(|prop| prop.enumerable);
            if seen.insert(key.clone()) && enumerable {
                keys.push(key.to_js_string());
            }
        }
        current = object.prototype().cloned();
    }
    keys
}

/// Whether `key` is an own property of `value` (`hasOwnProperty`)
///
/// Null and undefined have no properties. String primitives own their
/// indices and `length`.
pub fn has(value: &JsValue, key: &str) -> bool {
    let key = PropertyKey::from(key);
    match value {
        JsValue::Object(obj) => obj.has_own_property(&key),
        JsValue::String(s) => string_own_value(s, &key).is_some(),
        _ => false,
    }
}

/// Sorted names of the callable properties reachable by `for-in`
pub fn functions(value: &JsValue) -> KeySet {
    let mut names: KeySet = all_keys(value)
        .into_iter()
        .filter(|name| is_function(&value.get(name)))
        .collect();
    names.sort();
    names
}

//! Object utilities
//!
//! Copying, filtering and inspecting objects on top of key enumeration. A
//! null or undefined subject is treated as an empty object, never as an error.
//! Utilities that build new objects take the [`Realm`] to build them in.

use crate::error::UnderbarError;
use crate::iteratee::Iteratee;
use crate::keys::{KeySet, all_keys, own_keys};
use crate::kind::{is_arguments, is_array, is_array_like, is_object, is_string};
use crate::prelude::*;
use crate::realm::Realm;
use crate::value::{JsObjectRef, JsString, JsValue, PropertyKey};

/// Copy properties from each source onto `target`, later sources winning
///
/// `keys_of` picks which names of a source are copied. With `undefined_only`
/// a name is only assigned while the target still reads `undefined` for it.
fn assign(
    target: &JsValue,
    sources: &[JsValue],
    keys_of: fn(&JsValue) -> KeySet,
    undefined_only: bool,
) -> JsValue {
    let JsValue::Object(obj) = target else {
        // Assignments to primitives are dropped
        return target.clone();
    };
    for source in sources {
        for key in keys_of(source) {
            let key = PropertyKey::from(key);
            if !undefined_only || matches!(obj.get(&key), JsValue::Undefined) {
                let value = source.get(&key);
                obj.set(key, value);
            }
        }
    }
    target.clone()
}

/// Copy every enumerable property, inherited ones included, onto `target`
pub fn extend(target: &JsValue, sources: &[JsValue]) -> JsValue {
    assign(target, sources, all_keys, false)
}

/// Copy own enumerable properties onto `target` (`Object.assign`)
pub fn extend_own(target: &JsValue, sources: &[JsValue]) -> JsValue {
    assign(target, sources, own_keys, false)
}

/// Fill properties of `target` that read as `undefined`
pub fn defaults(target: &JsValue, sources: &[JsValue]) -> JsValue {
    assign(target, sources, all_keys, true)
}

/// Copy of `obj` holding only the listed keys it has, own or inherited
pub fn pick(realm: &Realm, obj: &JsValue, keys: &[&str]) -> JsObjectRef {
    let result = realm.new_object();
    let Ok(source) = realm.to_object(obj) else {
        return result;
    };
    for name in keys {
        let key = realm.key(name);
        if source.has_property(&key) {
            let value = source.get(&key);
            result.set(key, value);
        }
    }
    result
}

/// Copy of `obj` holding the enumerable properties `predicate` accepts
///
/// The predicate sees `(value, key, obj)` for every `for-in` key.
pub fn pick_by(
    realm: &Realm,
    obj: &JsValue,
    predicate: &Iteratee,
) -> Result<JsObjectRef, UnderbarError> {
    let result = realm.new_object();
    for name in all_keys(obj) {
        let value = obj.get(&name);
        if predicate.test(&value, &JsValue::String(name.clone()), obj)? {
            result.set(name, value);
        }
    }
    Ok(result)
}

/// Copy of `obj` without the listed keys
pub fn omit(realm: &Realm, obj: &JsValue, keys: &[&str]) -> JsObjectRef {
    let result = realm.new_object();
    for name in all_keys(obj) {
        if !keys.contains(&name.as_str()) {
            let value = obj.get(&name);
            result.set(name, value);
        }
    }
    result
}

/// Copy of `obj` without the properties `predicate` accepts
pub fn omit_by(
    realm: &Realm,
    obj: &JsValue,
    predicate: &Iteratee,
) -> Result<JsObjectRef, UnderbarError> {
    let result = realm.new_object();
    for name in all_keys(obj) {
        let value = obj.get(&name);
        if !predicate.test(&value, &JsValue::String(name.clone()), obj)? {
            result.set(name, value);
        }
    }
    Ok(result)
}

/// Shallow copy: arrays are sliced, other objects extended into a plain object
///
/// Non-objects are returned unchanged.
pub fn clone(realm: &Realm, obj: &JsValue) -> JsValue {
    if !is_object(obj) {
        return obj.clone();
    }
    if is_array(obj) {
        let elements = obj
            .as_object()
            .and_then(|o| o.borrow().array_values())
            .unwrap_or_default();
        return JsValue::Object(realm.new_array(elements));
    }
    extend(&JsValue::Object(realm.new_object()), &[obj.clone()])
}

/// Object inheriting from `prototype`, with the own properties of `props`
///
/// A non-object prototype gives a plain object.
pub fn create(realm: &Realm, prototype: &JsValue, props: Option<&JsValue>) -> JsObjectRef {
    let result = match prototype {
        JsValue::Object(proto) => realm.object_create(Some(proto)),
        _ => realm.new_object(),
    };
    if let Some(props) = props {
        extend_own(&JsValue::Object(result.clone()), &[props.clone()]);
    }
    result
}

/// Array of own enumerable property values
pub fn values(realm: &Realm, obj: &JsValue) -> JsObjectRef {
    let values = own_keys(obj).iter().map(|key| obj.get(key)).collect();
    realm.new_array(values)
}

/// Array of `[key, value]` pairs for own enumerable properties
pub fn pairs(realm: &Realm, obj: &JsValue) -> JsObjectRef {
    let pairs = own_keys(obj)
        .into_iter()
        .map(|key| {
            let value = obj.get(&key);
            JsValue::Object(realm.new_array(vec![JsValue::String(key), value]))
        })
        .collect();
    realm.new_array(pairs)
}

/// Object mapping each own value's string form back to its key
///
/// Later keys win when values collide.
pub fn invert(realm: &Realm, obj: &JsValue) -> JsObjectRef {
    let result = realm.new_object();
    for key in own_keys(obj) {
        let name = obj.get(&key).to_js_string();
        result.set(name, JsValue::String(key));
    }
    result
}

/// Object with the same own keys, each value replaced by `iteratee(value, key, obj)`
pub fn map_object(
    realm: &Realm,
    obj: &JsValue,
    iteratee: &Iteratee,
) -> Result<JsObjectRef, UnderbarError> {
    let result = realm.new_object();
    for key in own_keys(obj) {
        let value = obj.get(&key);
        let mapped = iteratee.call(&value, &JsValue::String(key.clone()), obj)?;
        result.set(key, mapped);
    }
    Ok(result)
}

/// First own key whose value passes `predicate`
pub fn find_key(obj: &JsValue, predicate: &Iteratee) -> Result<Option<JsString>, UnderbarError> {
    for key in own_keys(obj) {
        let value = obj.get(&key);
        if predicate.test(&value, &JsValue::String(key.clone()), obj)? {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

/// Run `interceptor` on `obj`, then hand `obj` back
pub fn tap<F>(obj: JsValue, interceptor: F) -> Result<JsValue, UnderbarError>
where
    F: FnOnce(&JsValue) -> Result<(), UnderbarError>,
{
    interceptor(&obj)?;
    Ok(obj)
}

/// Whether `obj` has every own enumerable `key: value` pair of `attrs`
///
/// Values are compared with `===`. Null and undefined match only empty attrs.
/// A string subject exposes its characters and `length`; numbers and booleans
/// carry no realm to box them with, so they only match empty attrs.
pub fn is_match(obj: &JsValue, attrs: &JsValue) -> bool {
    let keys = own_keys(attrs);
    if obj.is_null_or_undefined() {
        return keys.is_empty();
    }
    keys.iter().all(|name| {
        let key = PropertyKey::from(name);
        let present = match obj {
            JsValue::Object(o) => o.has_property(&key),
            _ => {
                !obj.get(&key).is_null_or_undefined() || crate::keys::has(obj, name.as_str())
            }
        };
        present && attrs.get(&key).strict_equals(&obj.get(&key))
    })
}

/// Whether a value has nothing in it
///
/// Arrays, strings and arguments objects are empty at length zero; other
/// values when they have no own enumerable properties.
pub fn is_empty(obj: &JsValue) -> bool {
    if obj.is_null_or_undefined() {
        return true;
    }
    if is_array_like(obj) && (is_array(obj) || is_string(obj) || is_arguments(obj)) {
        return obj.get("length").to_number() == 0.0;
    }
    own_keys(obj).is_empty()
}

//! Callback normalisation
//!
//! Utilities that take a callback accept an [`Iteratee`]: a Rust closure, a
//! callable value, or shorthand that stands for a common callback. A property
//! name reads that property and an object of attributes matches them.

use crate::error::UnderbarError;
use crate::keys::own_keys;
use crate::objects::{extend_own, is_match};
use crate::prelude::*;
use crate::value::{JsObject, JsObjectRef, JsString, JsValue};

/// Callback receiving `(value, key, collection)`
pub type IterateeFn = Rc<dyn Fn(&JsValue, &JsValue, &JsValue) -> Result<JsValue, UnderbarError>>;

/// A normalised callback
#[derive(Clone)]
pub enum Iteratee {
    /// Returns the value it is given
    Identity,
    /// Rust closure
    Closure(IterateeFn),
    /// Callable value, invoked with `context` as `this`
    Callable { func: JsValue, context: JsValue },
    /// Tests its argument against a snapshot of attributes
    Matcher(JsObjectRef),
    /// Reads a property of its argument
    Property(JsString),
}

impl Iteratee {
    /// Normalise an arbitrary value into a callback
    ///
    /// Null and undefined give the identity, callables are called, other
    /// objects become matchers, and anything else names a property.
    pub fn from_value(value: &JsValue, context: Option<JsValue>) -> Self {
        match value {
            JsValue::Undefined | JsValue::Null => Iteratee::Identity,
            v if v.is_callable() => Iteratee::Callable {
                func: v.clone(),
                context: context.unwrap_or_default(),
            },
            JsValue::Object(_) => Iteratee::matcher(value),
            other => Iteratee::Property(other.to_js_string()),
        }
    }

    /// Wrap a Rust closure
    pub fn closure<F>(func: F) -> Self
    where
        F: Fn(&JsValue, &JsValue, &JsValue) -> Result<JsValue, UnderbarError> + 'static,
    {
        Iteratee::Closure(Rc::new(func))
    }

    /// Wrap a Rust predicate
    pub fn predicate<F>(func: F) -> Self
    where
        F: Fn(&JsValue, &JsValue, &JsValue) -> bool + 'static,
    {
        Iteratee::closure(move |value, key, collection| {
            Ok(JsValue::Boolean(func(value, key, collection)))
        })
    }

    /// Matcher over the own enumerable properties `attrs` has right now
    ///
    /// Later changes to `attrs` do not affect the matcher.
    pub fn matcher(attrs: &JsValue) -> Self {
        let snapshot = JsValue::Object(JsObjectRef::new(JsObject::new()));
        extend_own(&snapshot, &[attrs.clone()]);
        match snapshot {
            JsValue::Object(obj) => Iteratee::Matcher(obj),
            _ => Iteratee::Identity,
        }
    }

    pub fn property(key: &str) -> Self {
        Iteratee::Property(JsString::from(key))
    }

    /// Invoke with `(value, key, collection)`
    pub fn call(
        &self,
        value: &JsValue,
        key: &JsValue,
        collection: &JsValue,
    ) -> Result<JsValue, UnderbarError> {
        match self {
            Iteratee::Identity => Ok(value.clone()),
            Iteratee::Closure(func) => func(value, key, collection),
            Iteratee::Callable { func, context } => {
                func.call(context, &[value.clone(), key.clone(), collection.clone()])
            }
            Iteratee::Matcher(attrs) => Ok(JsValue::Boolean(is_match(
                value,
                &JsValue::Object(attrs.clone()),
            ))),
            Iteratee::Property(name) => Ok(read_property(value, name)),
        }
    }

    /// Invoke and coerce the result to a boolean
    pub fn test(
        &self,
        value: &JsValue,
        key: &JsValue,
        collection: &JsValue,
    ) -> Result<bool, UnderbarError> {
        Ok(self.call(value, key, collection)?.to_boolean())
    }
}

impl fmt::Debug for Iteratee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iteratee::Identity => write!(f, "Identity"),
            Iteratee::Closure(_) => write!(f, "Closure"),
            Iteratee::Callable { func, .. } => write!(f, "Callable({:?})", func),
            Iteratee::Matcher(attrs) => {
                let keys = own_keys(&JsValue::Object(attrs.clone()));
                write!(f, "Matcher({:?})", keys)
            }
            Iteratee::Property(name) => write!(f, "Property({})", name),
        }
    }
}

/// Property accessor; null and undefined read as undefined
pub fn property(key: &str) -> impl Fn(&JsValue) -> JsValue + use<> {
    let key = JsString::from(key);
    move |value| read_property(value, &key)
}

/// Predicate testing its argument against `attrs` as they are now
pub fn matcher(attrs: &JsValue) -> impl Fn(&JsValue) -> bool + use<> {
    let iteratee = Iteratee::matcher(attrs);
    move |value| match &iteratee {
        Iteratee::Matcher(snapshot) => is_match(value, &JsValue::Object(snapshot.clone())),
        _ => true,
    }
}

pub fn identity(value: &JsValue) -> JsValue {
    value.clone()
}

fn read_property(value: &JsValue, key: &JsString) -> JsValue {
    if value.is_null_or_undefined() {
        return JsValue::Undefined;
    }
    value.get(key)
}

//! Chaining wrapper
//!
//! [`Wrapped`] holds a value and a chain flag. Its methods forward to the free
//! functions of this crate and wrap the result again with the same flag, so
//! calls can be strung together and finished with [`Wrapped::value`].
//!
//! ```
//! use underbar::{Realm, chain, JsValue};
//!
//! let realm = Realm::new();
//! let array = JsValue::Object(realm.new_array(vec![JsValue::from(1), JsValue::from(2)]));
//! let joined = chain(array)
//!     .push(&[JsValue::from(3)])
//!     .and_then(|w| w.reverse())
//!     .map(|w| w.join(Some("-")))
//!     .unwrap();
//! assert_eq!(joined.value(), &JsValue::from("3-2-1"));
//! ```

use core::cmp::Ordering;

use crate::equality::{AsValue, is_equal};
use crate::error::UnderbarError;
use crate::iteratee::Iteratee;
use crate::keys::{self, KeySet};
use crate::objects;
use crate::prelude::*;
use crate::realm::Realm;
use crate::value::JsValue;

/// A value with an optional chain flag
#[derive(Clone, Debug, Default)]
pub struct Wrapped {
    value: JsValue,
    chained: bool,
}

/// Wrap a value without chaining (`_(value)`)
pub fn wrap(value: impl Into<JsValue>) -> Wrapped {
    Wrapped {
        value: value.into(),
        chained: false,
    }
}

/// Wrap a value for chaining (`_.chain(value)`)
pub fn chain(value: impl Into<JsValue>) -> Wrapped {
    wrap(value).chain()
}

impl AsValue for Wrapped {
    fn as_value(&self) -> &JsValue {
        &self.value
    }
}

impl From<JsValue> for Wrapped {
    fn from(value: JsValue) -> Self {
        wrap(value)
    }
}

impl Wrapped {
    /// Turn chaining on
    pub fn chain(mut self) -> Self {
        self.chained = true;
        self
    }

    pub fn is_chained(&self) -> bool {
        self.chained
    }

    /// The wrapped value
    pub fn value(&self) -> &JsValue {
        &self.value
    }

    pub fn into_value(self) -> JsValue {
        self.value
    }

    fn rewrap(&self, value: impl Into<JsValue>) -> Wrapped {
        Wrapped {
            value: value.into(),
            chained: self.chained,
        }
    }

    fn rewrap_keys(&self, realm: &Realm, keys: KeySet) -> Wrapped {
        let names = keys.into_iter().map(JsValue::String).collect();
        self.rewrap(realm.new_array(names))
    }

    // Object functions

    pub fn keys(&self, realm: &Realm) -> Wrapped {
        self.rewrap_keys(realm, keys::own_keys(&self.value))
    }

    pub fn all_keys(&self, realm: &Realm) -> Wrapped {
        self.rewrap_keys(realm, keys::all_keys(&self.value))
    }

    pub fn functions(&self, realm: &Realm) -> Wrapped {
        self.rewrap_keys(realm, keys::functions(&self.value))
    }

    pub fn values(&self, realm: &Realm) -> Wrapped {
        self.rewrap(objects::values(realm, &self.value))
    }

    pub fn pairs(&self, realm: &Realm) -> Wrapped {
        self.rewrap(objects::pairs(realm, &self.value))
    }

    pub fn invert(&self, realm: &Realm) -> Wrapped {
        self.rewrap(objects::invert(realm, &self.value))
    }

    pub fn extend(&self, sources: &[JsValue]) -> Wrapped {
        self.rewrap(objects::extend(&self.value, sources))
    }

    pub fn extend_own(&self, sources: &[JsValue]) -> Wrapped {
        self.rewrap(objects::extend_own(&self.value, sources))
    }

    pub fn defaults(&self, sources: &[JsValue]) -> Wrapped {
        self.rewrap(objects::defaults(&self.value, sources))
    }

    pub fn pick(&self, realm: &Realm, keys: &[&str]) -> Wrapped {
        self.rewrap(objects::pick(realm, &self.value, keys))
    }

    pub fn pick_by(&self, realm: &Realm, predicate: &Iteratee) -> Result<Wrapped, UnderbarError> {
        Ok(self.rewrap(objects::pick_by(realm, &self.value, predicate)?))
    }

    pub fn omit(&self, realm: &Realm, keys: &[&str]) -> Wrapped {
        self.rewrap(objects::omit(realm, &self.value, keys))
    }

    pub fn omit_by(&self, realm: &Realm, predicate: &Iteratee) -> Result<Wrapped, UnderbarError> {
        Ok(self.rewrap(objects::omit_by(realm, &self.value, predicate)?))
    }

    /// Shallow copy of the wrapped value (`_.clone`)
    pub fn shallow_clone(&self, realm: &Realm) -> Wrapped {
        self.rewrap(objects::clone(realm, &self.value))
    }

    /// Object inheriting from the wrapped value (`_.create`)
    pub fn create(&self, realm: &Realm, props: Option<&JsValue>) -> Wrapped {
        self.rewrap(objects::create(realm, &self.value, props))
    }

    pub fn map_object(&self, realm: &Realm, iteratee: &Iteratee) -> Result<Wrapped, UnderbarError> {
        Ok(self.rewrap(objects::map_object(realm, &self.value, iteratee)?))
    }

    /// The first matching key, or `undefined`
    pub fn find_key(&self, predicate: &Iteratee) -> Result<Wrapped, UnderbarError> {
        let key = objects::find_key(&self.value, predicate)?;
        Ok(self.rewrap(key.map(JsValue::String).unwrap_or_default()))
    }

    pub fn tap<F>(self, interceptor: F) -> Result<Wrapped, UnderbarError>
    where
        F: FnOnce(&JsValue) -> Result<(), UnderbarError>,
    {
        interceptor(&self.value)?;
        Ok(self)
    }

    pub fn has(&self, key: &str) -> Wrapped {
        self.rewrap(keys::has(&self.value, key))
    }

    pub fn is_match(&self, attrs: &JsValue) -> Wrapped {
        self.rewrap(objects::is_match(&self.value, attrs))
    }

    pub fn is_empty(&self) -> Wrapped {
        self.rewrap(objects::is_empty(&self.value))
    }

    pub fn is_equal<T: AsValue + ?Sized>(&self, other: &T) -> Wrapped {
        self.rewrap(is_equal(self, other))
    }

    // Array mutators: change the wrapped array in place and wrap it again

    fn mutate<R>(
        &self,
        method: &str,
        f: impl FnOnce(&mut Vec<JsValue>) -> R,
    ) -> Result<R, UnderbarError> {
        let not_array = || {
            UnderbarError::type_error(format!("Array.prototype.{} called on a non-array", method))
        };
        let obj = self.value.as_object().ok_or_else(not_array)?;
        let mut borrowed = obj.borrow_mut();
        let elements = borrowed.array_elements_mut().ok_or_else(not_array)?;
        Ok(f(elements))
    }

    fn elements(&self) -> Option<Vec<JsValue>> {
        self.value
            .as_object()
            .and_then(|obj| obj.borrow().array_values())
    }

    pub fn push(&self, items: &[JsValue]) -> Result<Wrapped, UnderbarError> {
        self.mutate("push", |elements| elements.extend_from_slice(items))?;
        Ok(self.clone())
    }

    pub fn pop(&self) -> Result<Wrapped, UnderbarError> {
        self.mutate("pop", |elements| {
            elements.pop();
        })?;
        Ok(self.clone())
    }

    pub fn shift(&self) -> Result<Wrapped, UnderbarError> {
        self.mutate("shift", |elements| {
            if !elements.is_empty() {
                elements.remove(0);
            }
        })?;
        Ok(self.clone())
    }

    pub fn unshift(&self, items: &[JsValue]) -> Result<Wrapped, UnderbarError> {
        self.mutate("unshift", |elements| {
            elements.splice(0..0, items.iter().cloned());
        })?;
        Ok(self.clone())
    }

    pub fn reverse(&self) -> Result<Wrapped, UnderbarError> {
        self.mutate("reverse", |elements| elements.reverse())?;
        Ok(self.clone())
    }

    /// Remove `delete_count` elements at `start` and insert `items` there
    ///
    /// A negative `start` counts from the end; a missing count removes the rest.
    pub fn splice(
        &self,
        start: isize,
        delete_count: Option<usize>,
        items: &[JsValue],
    ) -> Result<Wrapped, UnderbarError> {
        self.mutate("splice", |elements| {
            let start = relative_index(start, elements.len());
            let end = match delete_count {
                Some(count) => start.saturating_add(count).min(elements.len()),
                None => elements.len(),
            };
            elements.splice(start..end, items.iter().cloned());
        })?;
        Ok(self.clone())
    }

    /// Sort in place, by `comparator(a, b)` when given, else by string form
    ///
    /// `undefined` sorts last either way. The sort is stable, and a comparator
    /// that is not a consistent order gives some permutation of the elements.
    /// A failing comparator leaves the array unchanged.
    pub fn sort(&self, comparator: Option<&JsValue>) -> Result<Wrapped, UnderbarError> {
        let elements = self.mutate("sort", |elements| elements.clone())?;

        let mut compare = |a: &JsValue, b: &JsValue| -> Result<Ordering, UnderbarError> {
            match (a, b) {
                (JsValue::Undefined, JsValue::Undefined) => Ok(Ordering::Equal),
                (JsValue::Undefined, _) => Ok(Ordering::Greater),
                (_, JsValue::Undefined) => Ok(Ordering::Less),
                _ => match comparator {
                    Some(compare) => {
                        let order =
                            compare.call(&JsValue::Undefined, &[a.clone(), b.clone()])?;
                        Ok(order
                            .to_number()
                            .partial_cmp(&0.0)
                            .unwrap_or(Ordering::Equal))
                    }
                    None => Ok(a.to_js_string().cmp(&b.to_js_string())),
                },
            }
        };
        let sorted = merge_sort(elements, &mut compare)?;

        self.mutate("sort", |slot| *slot = sorted)?;
        Ok(self.clone())
    }

    // Array accessors: build new values

    /// New array of the wrapped elements followed by `items`, spreading arrays
    pub fn concat(&self, realm: &Realm, items: &[JsValue]) -> Wrapped {
        let mut out = self.elements().unwrap_or_else(|| vec![self.value.clone()]);
        for item in items {
            let spread = item
                .as_object()
                .filter(|_| crate::kind::is_array(item))
                .and_then(|obj| obj.borrow().array_values());
            match spread {
                Some(elements) => out.extend(elements),
                None => out.push(item.clone()),
            }
        }
        self.rewrap(realm.new_array(out))
    }

    /// New array of elements from `start` up to `end`, negative indices counting from the end
    pub fn slice(&self, realm: &Realm, start: isize, end: Option<isize>) -> Wrapped {
        let elements = self.elements().unwrap_or_default();
        let len = elements.len();
        let from = relative_index(start, len);
        let to = end.map_or(len, |end| relative_index(end, len));
        let sliced = elements
            .get(from..to.max(from))
            .map(<[JsValue]>::to_vec)
            .unwrap_or_default();
        self.rewrap(realm.new_array(sliced))
    }

    /// String of the elements joined by `separator` (default `","`)
    ///
    /// `null` and `undefined` elements print as empty strings.
    pub fn join(&self, separator: Option<&str>) -> Wrapped {
        let separator = separator.unwrap_or(",");
        let elements = self.elements().unwrap_or_default();
        let mut out = String::new();
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            if !element.is_null_or_undefined() {
                out.push_str(element.to_js_string().as_str());
            }
        }
        self.rewrap(out)
    }
}

/// Stable top-down merge sort
///
/// The merge never assumes the comparator is a consistent order.
fn merge_sort<F>(mut items: Vec<JsValue>, compare: &mut F) -> Result<Vec<JsValue>, UnderbarError>
where
    F: FnMut(&JsValue, &JsValue) -> Result<Ordering, UnderbarError>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // Ties take from the left run
        let next = if compare(l, r)? == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.to_js_string())
    }
}

fn relative_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

//! Deep structural equality
//!
//! [`is_equal`] compares two values by kind and content:
//!
//! - Strings and patterns compare by their string form, so a primitive string
//!   equals a boxed one holding the same text.
//! - Numbers compare by value with `NaN` equal to itself and `0` distinct from `-0`.
//! - Dates and booleans compare by their numeric form.
//! - Arrays compare element-wise, other objects by their own enumerable
//!   properties, after checking that their constructors agree.
//!
//! Cyclic graphs terminate: a pair of objects already being compared further
//! up the recursion is assumed equal if it is paired the same way again.

use core::ops::{Deref, DerefMut};

use crate::keys::{has, own_keys};
use crate::kind::{Kind, classify, is_function};
use crate::prelude::*;
use crate::value::{JsObjectRef, JsValue, PropertyKey};

/// Anything that can stand in for a value in a comparison
///
/// Wrappers implement this to hand over their inner value, so the comparison
/// itself never has to recognise them.
pub trait AsValue {
    fn as_value(&self) -> &JsValue;
}

impl AsValue for JsValue {
    fn as_value(&self) -> &JsValue {
        self
    }
}

/// Deep equality of two values. Never fails.
pub fn is_equal<A, B>(a: &A, b: &B) -> bool
where
    A: AsValue + ?Sized,
    B: AsValue + ?Sized,
{
    let mut stack = VisitedPairStack::new();
    eq(a.as_value(), b.as_value(), &mut stack)
}

/// Object pairs under comparison in the active recursion, outermost first
///
/// `a` and `b` are parallel: the object at `a[i]` was being compared against
/// `b[i]`. Entries are pushed through [`VisitedPairStack::enter`] and popped
/// when the returned [`Frame`] drops, on every exit path.
#[derive(Default)]
pub struct VisitedPairStack {
    a: Vec<JsObjectRef>,
    b: Vec<JsObjectRef>,
}

impl VisitedPairStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs currently being compared
    pub fn depth(&self) -> usize {
        self.a.len()
    }

    /// Find the innermost entry whose left side is `a`
    ///
    /// Returns whether its right side is `b`, or `None` when `a` is not
    /// being compared.
    pub fn lookup(&self, a: &JsObjectRef, b: &JsObjectRef) -> Option<bool> {
        self.a
            .iter()
            .zip(&self.b)
            .rev()
            .find(|(left, _)| JsObjectRef::ptr_eq(left, a))
            .map(|(_, right)| JsObjectRef::ptr_eq(right, b))
    }

    /// Push a pair for the lifetime of the returned frame
    pub fn enter(&mut self, a: JsObjectRef, b: JsObjectRef) -> Frame<'_> {
        self.a.push(a);
        self.b.push(b);
        Frame { stack: self }
    }
}

/// Scoped entry on a [`VisitedPairStack`]; pops its pair when dropped
pub struct Frame<'s> {
    stack: &'s mut VisitedPairStack,
}

impl Deref for Frame<'_> {
    type Target = VisitedPairStack;

    fn deref(&self) -> &VisitedPairStack {
        self.stack
    }
}

impl DerefMut for Frame<'_> {
    fn deref_mut(&mut self) -> &mut VisitedPairStack {
        self.stack
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.a.pop();
        self.stack.b.pop();
    }
}

fn eq(a: &JsValue, b: &JsValue, stack: &mut VisitedPairStack) -> bool {
    // Identical values are equal, but 0 and -0 are not identical
    if a.strict_equals(b) {
        return match (a, b) {
            (JsValue::Number(x), JsValue::Number(y)) if *x == 0.0 => {
                x.is_sign_negative() == y.is_sign_negative()
            }
            _ => true,
        };
    }
    // null == undefined, but neither is equal to anything else
    if a.is_null_or_undefined() || b.is_null_or_undefined() {
        return false;
    }

    let kind = classify(a);
    if kind != classify(b) {
        return false;
    }
    match kind {
        Kind::String | Kind::Pattern => return a.to_js_string() == b.to_js_string(),
        Kind::Number => return numbers_equal(a.to_number(), b.to_number()),
        // Invalid dates are NaN and never equal
        Kind::Date | Kind::Boolean => return a.to_number() == b.to_number(),
        _ => {}
    }

    let (JsValue::Object(a_obj), JsValue::Object(b_obj)) = (a, b) else {
        return false;
    };

    let are_arrays = kind == Kind::Array;
    if !are_arrays {
        // Distinct functions are never equal
        if a_obj.borrow().is_callable() || b_obj.borrow().is_callable() {
            return false;
        }
        if constructors_differ(a_obj, b_obj) {
            return false;
        }
    }

    if let Some(matched) = stack.lookup(a_obj, b_obj) {
        tracing::trace!(depth = stack.depth(), matched, "cyclic pair short-circuited");
        return matched;
    }
    let mut frame = stack.enter(a_obj.clone(), b_obj.clone());

    if are_arrays {
        if array_length(a_obj) != array_length(b_obj) {
            return false;
        }
        // Indices that are holes on both sides read as undefined on both
        present_indices(a_obj, b_obj).into_iter().rev().all(|i| {
            let key = PropertyKey::Index(i);
            eq(&a_obj.get(&key), &b_obj.get(&key), &mut frame)
        })
    } else {
        let keys = own_keys(a);
        if own_keys(b).len() != keys.len() {
            return false;
        }
        keys.iter().rev().all(|key| {
            has(b, key.as_str()) && eq(&a.get(key), &b.get(key), &mut frame)
        })
    }
}

fn numbers_equal(x: f64, y: f64) -> bool {
    if x.is_nan() {
        return y.is_nan();
    }
    if x == 0.0 {
        return y == 0.0 && x.is_sign_negative() == y.is_sign_negative();
    }
    x == y
}

fn array_length(obj: &JsObjectRef) -> u32 {
    obj.borrow().array_length().unwrap_or_default()
}

/// Ascending indices at which either array has an own value
fn present_indices(a: &JsObjectRef, b: &JsObjectRef) -> Vec<u32> {
    let mut indices: Vec<u32> = [a, b]
        .iter()
        .flat_map(|obj| obj.borrow().own_keys(false))
        .filter_map(|key| match key {
            PropertyKey::Index(i) => Some(i),
            PropertyKey::String(_) => None,
        })
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Objects whose `constructor`s differ are different types, unless both
/// constructors are instances of themselves (`Object` and `Function` from any
/// realm), or either object has no `constructor` at all.
fn constructors_differ(a: &JsObjectRef, b: &JsObjectRef) -> bool {
    let key = PropertyKey::from("constructor");
    let a_ctor = a.get(&key);
    let b_ctor = b.get(&key);
    !a_ctor.strict_equals(&b_ctor)
        && !(is_self_instance(&a_ctor) && is_self_instance(&b_ctor))
        && a.has_property(&key)
        && b.has_property(&key)
}

fn is_self_instance(ctor: &JsValue) -> bool {
    is_function(ctor) && ctor.instance_of(ctor)
}

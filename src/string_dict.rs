//! Property-name interning
//!
//! A realm interns the names it hands out (intrinsic member names and the keys
//! of objects it builds), so equal names share one `Rc<str>` and key
//! comparisons during enumeration and equality mostly hit the pointer fast path.

use crate::prelude::*;
use crate::value::{CheapClone, JsString, PropertyKey};

/// Set of shared name strings, looked up by `&str`
#[derive(Default)]
pub struct StringDict {
    strings: FxHashSet<JsString>,
}

impl StringDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary preloaded with the names a realm wires into its intrinsics
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in INTRINSIC_NAMES {
            dict.get_or_insert(s);
        }
        dict
    }

    /// The shared instance of `s`, inserted on first use
    pub fn get_or_insert(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let interned = JsString::from(s);
        self.strings.insert(interned.cheap_clone());
        interned
    }

    /// Property key for `s`; array indices stay numeric and are not interned
    pub fn key(&mut self, s: &str) -> PropertyKey {
        match PropertyKey::from(s) {
            PropertyKey::String(_) => PropertyKey::String(self.get_or_insert(s)),
            index => index,
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

const INTRINSIC_NAMES: &[&str] = &[
    "length",
    "prototype",
    "constructor",
    "name",
    "message",
    "lastIndex",
    "Object",
    "Function",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Date",
    "RegExp",
    "Error",
];

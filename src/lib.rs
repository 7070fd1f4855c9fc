//! Functional object utilities over JavaScript-style dynamic values
//!
//! The centre of the crate is [`is_equal`], a deep structural comparison that
//! understands boxed primitives, dates, patterns, constructors and cyclic
//! graphs. Around it sit value classification ([`classify`] and the `is_*`
//! predicates), key enumeration ([`own_keys`], [`all_keys`]) and the object
//! utilities built on them, all reachable through the chaining [`Wrapped`]
//! value as well as free functions.
//!
//! Values live in a [`Realm`], which owns the built-in prototypes and
//! constructors new objects are linked to.
//!
//! # Example
//!
//! ```
//! use underbar::{Realm, JsValue, is_equal, json};
//! use serde_json::json;
//!
//! let realm = Realm::new();
//! let a = json::from_json(&realm, &json!({"name": "moe", "tags": [1, 2]}));
//! let b = json::from_json(&realm, &json!({"tags": [1, 2], "name": "moe"}));
//! assert!(is_equal(&a, &b));
//! assert!(!is_equal(&a, &JsValue::Null));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod prelude;

pub mod chain;
pub mod equality;
pub mod error;
pub mod iteratee;
pub mod json;
pub mod keys;
pub mod kind;
pub mod objects;
pub mod realm;
pub mod regexp;
pub mod string_dict;
pub mod value;

pub use chain::{Wrapped, chain, wrap};
pub use equality::{AsValue, VisitedPairStack, is_equal};
pub use error::UnderbarError;
pub use iteratee::Iteratee;
pub use keys::{KeySet, all_keys, functions, has, own_keys};
pub use kind::{Kind, classify};
pub use realm::Realm;
pub use value::CheapClone;
pub use value::ExoticObject;
pub use value::JsObject;
pub use value::JsObjectRef;
pub use value::JsString;
pub use value::JsValue;
pub use value::Property;
pub use value::PropertyKey;

//! Runtime kind classification
//!
//! A value's kind comes from its internal tag: the primitive variant, or the
//! `exotic` slot of an object. Prototype chains and constructors are never
//! consulted, so values built in another realm, or with a replaced prototype,
//! classify the same as native ones.

use crate::prelude::*;
use crate::value::{ExoticObject, JsValue};

/// Canonical runtime kind of a value
///
/// Primitives and their boxed objects share a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Array,
    Object,
    String,
    Number,
    Boolean,
    Date,
    /// Regular expression
    Pattern,
    Error,
    Function,
    Null,
    Undefined,
    Arguments,
}

impl Kind {
    /// The class name the host reports inside `[object ...]`
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Array => "Array",
            Kind::Object => "Object",
            Kind::String => "String",
            Kind::Number => "Number",
            Kind::Boolean => "Boolean",
            Kind::Date => "Date",
            Kind::Pattern => "RegExp",
            Kind::Error => "Error",
            Kind::Function => "Function",
            Kind::Null => "Null",
            Kind::Undefined => "Undefined",
            Kind::Arguments => "Arguments",
        }
    }

    /// Arrays and plain objects, the kinds compared member by member
    pub fn is_composite(self) -> bool {
        !matches!(
            self,
            Kind::String
                | Kind::Number
                | Kind::Boolean
                | Kind::Date
                | Kind::Pattern
                | Kind::Null
                | Kind::Undefined
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[object {}]", self.tag())
    }
}

/// Classify a value by its internal tag
pub fn classify(value: &JsValue) -> Kind {
    match value {
        JsValue::Undefined => Kind::Undefined,
        JsValue::Null => Kind::Null,
        JsValue::Boolean(_) => Kind::Boolean,
        JsValue::Number(_) => Kind::Number,
        JsValue::String(_) => Kind::String,
        JsValue::Object(obj) => match obj.borrow().exotic {
            ExoticObject::Ordinary => Kind::Object,
            ExoticObject::Array { .. } => Kind::Array,
            ExoticObject::Arguments { .. } => Kind::Arguments,
            ExoticObject::Function(_) => Kind::Function,
            ExoticObject::Date { .. } => Kind::Date,
            ExoticObject::RegExp { .. } => Kind::Pattern,
            ExoticObject::Error => Kind::Error,
            ExoticObject::Boolean(_) => Kind::Boolean,
            ExoticObject::Number(_) => Kind::Number,
            ExoticObject::StringObj(_) => Kind::String,
        },
    }
}

/// True for every object, callables included; false for null and primitives
pub fn is_object(value: &JsValue) -> bool {
    matches!(value, JsValue::Object(_))
}

pub fn is_array(value: &JsValue) -> bool {
    classify(value) == Kind::Array
}

pub fn is_function(value: &JsValue) -> bool {
    classify(value) == Kind::Function
}

pub fn is_string(value: &JsValue) -> bool {
    classify(value) == Kind::String
}

pub fn is_number(value: &JsValue) -> bool {
    classify(value) == Kind::Number
}

pub fn is_boolean(value: &JsValue) -> bool {
    classify(value) == Kind::Boolean
}

pub fn is_date(value: &JsValue) -> bool {
    classify(value) == Kind::Date
}

pub fn is_regexp(value: &JsValue) -> bool {
    classify(value) == Kind::Pattern
}

pub fn is_error(value: &JsValue) -> bool {
    classify(value) == Kind::Error
}

pub fn is_arguments(value: &JsValue) -> bool {
    classify(value) == Kind::Arguments
}

pub fn is_null(value: &JsValue) -> bool {
    matches!(value, JsValue::Null)
}

pub fn is_undefined(value: &JsValue) -> bool {
    matches!(value, JsValue::Undefined)
}

/// Number-kind values holding NaN; a boxed NaN counts, a boxed 5 does not
pub fn is_nan(value: &JsValue) -> bool {
    is_number(value) && value.to_number().is_nan()
}

/// Finite after numeric coercion, and its string form starts with a number
///
/// So `"12px"` is rejected by the coercion, while `null` and `""` coerce to 0
/// but have no numeric prefix.
pub fn is_finite(value: &JsValue) -> bool {
    value.to_number().is_finite() && !parse_float(value.to_js_string().as_str()).is_nan()
}

/// Whether the value looks like a DOM element (`nodeType === 1`)
pub fn is_element(value: &JsValue) -> bool {
    value.to_boolean() && value.get("nodeType").strict_equals(&JsValue::Number(1.0))
}

/// Largest exact integer, the bound on array-like lengths
pub const MAX_ARRAY_INDEX: f64 = 9_007_199_254_740_991.0;

/// Whether the value has a numeric `length` in `[0, 2^53 - 1]`
pub fn is_array_like(value: &JsValue) -> bool {
    if value.is_null_or_undefined() {
        return false;
    }
    match value.get("length") {
        JsValue::Number(len) => (0.0..=MAX_ARRAY_INDEX).contains(&len),
        _ => false,
    }
}

/// `parseFloat`: the longest numeric prefix after leading whitespace
fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let negative = s.starts_with('-');
    if unsigned.starts_with("Infinity") {
        return if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let bytes = unsigned.as_bytes();
    let digits_from = |start: usize| {
        bytes
            .iter()
            .skip(start)
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let int_digits = digits_from(0);
    let mut end = int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = digits_from(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    let magnitude = unsigned
        .get(..end)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .unwrap_or(f64::NAN);
    if negative { -magnitude } else { magnitude }
}

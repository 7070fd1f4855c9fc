//! Dynamic value representation
//!
//! The core JsValue type and the object model it points into. Objects carry an
//! internal `exotic` tag that fixes their runtime kind independently of their
//! prototype chain.

use crate::error::UnderbarError;
use crate::prelude::*;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This trait makes it explicit when a clone is cheap (just incrementing a reference count)
/// vs when it might be expensive (copying data). Types implementing this trait should have
/// O(1) clone operations, typically because they use `Rc` or similar reference counting.
///
/// # Examples
/// - `JsObjectRef` (Rc<RefCell<JsObject>>) - cheap clone
/// - `JsString` (Rc<str>) - cheap clone
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    ///
    /// This is semantically identical to `clone()` but makes it explicit that
    /// the operation is O(1) and only increments a reference count.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

// Implement CheapClone for Rc-based types (Rc<RefCell<T>> is covered by this)
impl<T: ?Sized> CheapClone for Rc<T> {}

/// Largest gap past the end of an array that is still filled densely on write.
/// Writes further out land in the ordinary property table.
const MAX_DENSE_GAP: usize = 1 << 16;

/// Longest array length; index writes and `length` assignments past it are ignored
pub(crate) const MAX_ARRAY_LENGTH: u32 = 1 << 24;

/// A dynamically-typed value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObjectRef),
}

// JsValue holds at most one reference count, so clone is cheap
impl CheapClone for JsValue {}

impl JsValue {
    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Check if this is a string value
    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object", // Historical quirk
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Object(_) => true,
        }
    }

    /// Convert to number (ToNumber)
    ///
    /// Objects go through their primitive value: boxed primitives unwrap and
    /// dates yield their time value.
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(true) => 1.0,
            JsValue::Boolean(false) => 0.0,
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s.as_str()),
            JsValue::Object(obj) => {
                let primitive = match &obj.borrow().exotic {
                    ExoticObject::Number(n) => Some(*n),
                    ExoticObject::Boolean(b) => Some(f64::from(u8::from(*b))),
                    ExoticObject::Date { timestamp } => Some(*timestamp),
                    ExoticObject::StringObj(s) => Some(string_to_number(s.as_str())),
                    _ => None,
                };
                match primitive {
                    Some(n) => n,
                    None => string_to_number(self.to_js_string().as_str()),
                }
            }
        }
    }

    /// Convert to string (ToString)
    pub fn to_js_string(&self) -> JsString {
        let mut seen = Vec::new();
        to_js_string_inner(self, &mut seen)
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN falls out of f64 comparison
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => JsObjectRef::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Property lookup (`value[key]`)
    ///
    /// Objects search their prototype chain. String primitives expose `length`
    /// and their characters; every other primitive yields `undefined`.
    pub fn get(&self, key: impl Into<PropertyKey>) -> JsValue {
        let key = key.into();
        match self {
            JsValue::Object(obj) => obj.get(&key),
            JsValue::String(s) => string_own_value(s, &key).unwrap_or_default(),
            _ => JsValue::Undefined,
        }
    }

    /// The `instanceof` operator without `Symbol.hasInstance`
    ///
    /// False unless `ctor` is callable with an object `prototype` that appears
    /// on this value's prototype chain.
    pub fn instance_of(&self, ctor: &JsValue) -> bool {
        let JsValue::Object(obj) = self else {
            return false;
        };
        if !ctor.is_callable() {
            return false;
        }
        match ctor.get("prototype") {
            JsValue::Object(proto) => proto.is_prototype_of(obj),
            _ => false,
        }
    }

    /// Call this value as a function
    pub fn call(&self, this: &JsValue, args: &[JsValue]) -> Result<JsValue, UnderbarError> {
        let func = match self {
            JsValue::Object(obj) => match &obj.borrow().exotic {
                ExoticObject::Function(JsFunction::Native(native)) => {
                    Some(native.func.cheap_clone())
                }
                _ => None,
            },
            _ => None,
        };
        match func {
            Some(func) => func(this, args),
            None => Err(UnderbarError::type_error(format!(
                "{:?} is not a function",
                self
            ))),
        }
    }
}

fn to_js_string_inner(value: &JsValue, seen: &mut Vec<usize>) -> JsString {
    match value {
        JsValue::Undefined => JsString::from("undefined"),
        JsValue::Null => JsString::from("null"),
        JsValue::Boolean(true) => JsString::from("true"),
        JsValue::Boolean(false) => JsString::from("false"),
        JsValue::Number(n) => number_to_js_string(*n),
        JsValue::String(s) => s.cheap_clone(),
        JsValue::Object(obj) => object_to_js_string(obj, seen),
    }
}

fn object_to_js_string(obj: &JsObjectRef, seen: &mut Vec<usize>) -> JsString {
    let elements = {
        let object = obj.borrow();
        match &object.exotic {
            ExoticObject::Ordinary => return JsString::from("[object Object]"),
            ExoticObject::Arguments { .. } => return JsString::from("[object Arguments]"),
            ExoticObject::StringObj(s) => return s.cheap_clone(),
            ExoticObject::Number(n) => return number_to_js_string(*n),
            ExoticObject::Boolean(b) => {
                return JsString::from(if *b { "true" } else { "false" });
            }
            ExoticObject::Date { timestamp } => {
                return match date_to_iso_string(*timestamp) {
                    Some(iso) => JsString::from(iso),
                    None => JsString::from("Invalid Date"),
                };
            }
            ExoticObject::RegExp { source, flags } => {
                return JsString::from(format!("/{}/{}", source, flags));
            }
            ExoticObject::Function(func) => {
                return JsString::from(format!(
                    "function {}() {{ [native code] }}",
                    func.name()
                ));
            }
            ExoticObject::Error => None,
            ExoticObject::Array { .. } => object.array_values(),
        }
    };

    let Some(elements) = elements else {
        return error_to_js_string(obj);
    };

    // Cyclic arrays print their back-reference as the empty string
    let id = obj.id();
    if seen.contains(&id) {
        return JsString::from("");
    }
    seen.push(id);
    let mut out = String::new();
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if !element.is_null_or_undefined() {
            out.push_str(to_js_string_inner(element, seen).as_str());
        }
    }
    seen.pop();
    JsString::from(out)
}

fn error_to_js_string(obj: &JsObjectRef) -> JsString {
    let name = match obj.get(&PropertyKey::from("name")) {
        JsValue::Undefined => JsString::from("Error"),
        other => other.to_js_string(),
    };
    let message = match obj.get(&PropertyKey::from("message")) {
        JsValue::Undefined => JsString::from(""),
        other => other.to_js_string(),
    };
    if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        JsString::from(format!("{}: {}", name, message))
    }
}

/// Number to string (Number::toString)
///
/// Shortest round-trip digits, written out in full for decimal exponents
/// from -6 to 20 and in `1.5e+21` form outside that range.
pub(crate) fn number_to_js_string(n: f64) -> JsString {
    if n.is_nan() {
        return JsString::from("NaN");
    }
    if n == 0.0 {
        return JsString::from("0");
    }
    if n.is_infinite() {
        return JsString::from(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }

    // `{:e}` yields the shortest digits as `d.ddde<exp>`
    let scientific = format!("{:e}", math::abs(n));
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return JsString::from(n.to_string());
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let Ok(exponent) = exponent.parse::<i32>() else {
        return JsString::from(n.to_string());
    };
    // The value is 0.<digits> x 10^point
    let k = digits.len() as i32;
    let point = exponent + 1;

    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }
    if k <= point && point <= 21 {
        out.push_str(&digits);
        out.extend(core::iter::repeat_n('0', (point - k) as usize));
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(fraction);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(core::iter::repeat_n('0', (-point) as usize));
        out.push_str(&digits);
    } else {
        let mut chars = digits.chars();
        out.extend(chars.next());
        let rest = chars.as_str();
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if point > 0 { '+' } else { '-' });
        out.push_str(&(point - 1).abs().to_string());
    }
    JsString::from(out)
}

/// String to number (StringToNumber)
pub(crate) fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return match u64::from_str_radix(digits, radix) {
                Ok(n) => n as f64,
                Err(_) => f64::NAN,
            };
        }
    }
    // Rust accepts "inf" and "nan" spellings that the host does not
    let numeric = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

const MS_PER_DAY: f64 = 86_400_000.0;

/// Format a time value as an ISO-8601 UTC string, `None` for invalid dates
pub(crate) fn date_to_iso_string(timestamp: f64) -> Option<String> {
    if !timestamp.is_finite() {
        return None;
    }
    let days = math::floor(timestamp / MS_PER_DAY);
    let ms_in_day = math::rem_euclid(timestamp, MS_PER_DAY) as i64;
    let (year, month, day) = civil_from_days(days as i64);

    let hours = ms_in_day / 3_600_000;
    let minutes = (ms_in_day / 60_000) % 60;
    let seconds = (ms_in_day / 1000) % 60;
    let millis = ms_in_day % 1000;

    let year = if (0..=9999).contains(&year) {
        format!("{:04}", year)
    } else if year < 0 {
        format!("-{:06}", -year)
    } else {
        format!("+{:06}", year)
    };
    Some(format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hours, minutes, seconds, millis
    ))
}

/// Days since the Unix epoch to (year, month, day) in the proleptic Gregorian calendar
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// (year, month 1-12, day 1-31) to days since the Unix epoch
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// TimeClip: NaN outside the representable range, whole milliseconds inside it
pub(crate) fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || math::abs(time) > 8.64e15 {
        return f64::NAN;
    }
    // +0.0 folds a negative zero
    math::trunc(time) + 0.0
}

/// UTC time value from date components, months zero-based and allowed to overflow
pub(crate) fn make_date_value(
    year: f64,
    month: f64,
    day: f64,
    hours: f64,
    minutes: f64,
    seconds: f64,
    millis: f64,
) -> f64 {
    let parts = [year, month, day, hours, minutes, seconds, millis];
    if parts.iter().any(|p| !p.is_finite()) {
        return f64::NAN;
    }
    let year = math::trunc(year);
    // Two-digit years land in the twentieth century
    let year = if (0.0..=99.0).contains(&year) { year + 1900.0 } else { year };
    let month = math::trunc(month);
    let year = year + math::floor(month / 12.0);
    let month = math::rem_euclid(month, 12.0);
    if math::abs(year) > 400_000.0 {
        return f64::NAN;
    }
    let days = days_from_civil(year as i64, month as i64 + 1, 1) as f64 + math::trunc(day) - 1.0;
    let time = math::trunc(hours) * 3_600_000.0
        + math::trunc(minutes) * 60_000.0
        + math::trunc(seconds) * 1000.0
        + math::trunc(millis);
    time_clip(days * MS_PER_DAY + time)
}

/// Parse the ISO-8601 subset the host guarantees: `YYYY-MM-DD`, optionally
/// followed by `THH:MM`, `:SS`, `.sss` and a `Z` or `±HH:MM` offset.
/// Strings without an offset are read as UTC.
pub(crate) fn parse_date_string(s: &str) -> f64 {
    parse_iso_date(s.trim()).unwrap_or(f64::NAN)
}

fn parse_iso_date(s: &str) -> Option<f64> {
    let year_digits = s.get(..4)?;
    if !year_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut rest = s.get(4..)?;
    let mut parsed = [year_digits.parse::<f64>().ok()?, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let mut offset_minutes = 0.0;

    let separators = [(1, '-', 2), (2, '-', 2), (3, 'T', 2), (4, ':', 2), (5, ':', 2), (6, '.', 3)];
    for (slot, separator, width) in separators {
        let Some(after) = rest.strip_prefix(separator) else {
            break;
        };
        rest = after;
        let digits = rest.get(..width)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest = rest.get(width..)?;
        *parsed.get_mut(slot)? = digits.parse::<f64>().ok()?;
    }

    if let Some(after) = rest.strip_prefix('Z') {
        rest = after;
    } else if let Some(sign) = rest.chars().next().filter(|c| matches!(c, '+' | '-')) {
        let offset = rest.get(1..)?;
        let (hh, mm) = (offset.get(..2)?, offset.get(3..5)?);
        if offset.get(2..3)? != ":" {
            return None;
        }
        let magnitude = hh.parse::<f64>().ok()? * 60.0 + mm.parse::<f64>().ok()?;
        offset_minutes = if sign == '-' { -magnitude } else { magnitude };
        rest = offset.get(5..)?;
    }
    if !rest.is_empty() {
        return None;
    }

    let [year, month, day, hours, minutes, seconds, millis] = parsed;
    let in_range = (1.0..=12.0).contains(&month)
        && (1.0..=31.0).contains(&day)
        && hours <= 24.0
        && minutes < 60.0
        && seconds < 60.0;
    if !in_range {
        return None;
    }
    // Four-digit years are taken literally here
    let days = days_from_civil(year as i64, month as i64, day as i64) as f64;
    let time = hours * 3_600_000.0 + minutes * 60_000.0 + seconds * 1000.0 + millis;
    Some(time_clip(
        days * MS_PER_DAY + time - offset_minutes * 60_000.0,
    ))
}

pub(crate) fn string_own_value(s: &JsString, key: &PropertyKey) -> Option<JsValue> {
    match key {
        PropertyKey::Index(i) => s
            .as_str()
            .chars()
            .nth(*i as usize)
            .map(|c| JsValue::String(JsString::from(c.to_string()))),
        PropertyKey::String(name) if name == "length" => {
            Some(JsValue::Number(s.as_str().chars().count() as f64))
        }
        PropertyKey::String(_) => None,
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            JsValue::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(f64::from(n))
    }
}

impl From<u32> for JsValue {
    fn from(n: u32) -> Self {
        JsValue::Number(f64::from(n))
    }
}

impl From<usize> for JsValue {
    fn from(n: usize) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

impl From<()> for JsValue {
    fn from(_: ()) -> Self {
        JsValue::Undefined
    }
}

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

// JsString wraps Rc<str>, so clone is cheap (just reference count increment)
impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared handle to a heap object
///
/// Identity is pointer identity. Graphs built from these handles may be cyclic;
/// a cycle is reclaimed once one of its objects is [`JsObject::clear`]ed.
#[derive(Clone)]
pub struct JsObjectRef(Rc<RefCell<JsObject>>);

impl CheapClone for JsObjectRef {}

impl JsObjectRef {
    pub fn new(object: JsObject) -> Self {
        JsObjectRef(Rc::new(RefCell::new(object)))
    }

    pub fn borrow(&self) -> Ref<'_, JsObject> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, JsObject> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(a: &JsObjectRef, b: &JsObjectRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Stable identity of the referenced object while it is alive
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Get a property, searching the prototype chain
    pub fn get(&self, key: &PropertyKey) -> JsValue {
        let mut current = self.cheap_clone();
        loop {
            let next = {
                let obj = current.borrow();
                if let Some(value) = obj.get_own(key) {
                    return value;
                }
                match obj.prototype() {
                    Some(proto) => proto.cheap_clone(),
                    None => return JsValue::Undefined,
                }
            };
            current = next;
        }
    }

    /// Check for a property anywhere on the prototype chain (the `in` operator)
    pub fn has_property(&self, key: &PropertyKey) -> bool {
        let mut current = self.cheap_clone();
        loop {
            let next = {
                let obj = current.borrow();
                if obj.has_own_property(key) {
                    return true;
                }
                match obj.prototype() {
                    Some(proto) => proto.cheap_clone(),
                    None => return false,
                }
            };
            current = next;
        }
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.borrow().has_own_property(key)
    }

    /// Assign a property (`obj[key] = value`)
    pub fn set(&self, key: impl Into<PropertyKey>, value: JsValue) {
        self.borrow_mut().set_property(key.into(), value);
    }

    /// Check whether `self` appears on the prototype chain of `value`
    pub fn is_prototype_of(&self, value: &JsObjectRef) -> bool {
        let mut current = value.borrow().prototype().cloned();
        while let Some(proto) = current {
            if JsObjectRef::ptr_eq(&proto, self) {
                return true;
            }
            current = proto.borrow().prototype().cloned();
        }
        false
    }

    /// Replace the prototype link
    ///
    /// Returns false, leaving the object untouched, when the new link would
    /// close a prototype cycle.
    pub fn set_prototype(&self, prototype: Option<JsObjectRef>) -> bool {
        if let Some(ref proto) = prototype {
            if JsObjectRef::ptr_eq(proto, self) || self.is_prototype_of(proto) {
                return false;
            }
        }
        self.borrow_mut().prototype = prototype;
        true
    }
}

impl PartialEq for JsObjectRef {
    fn eq(&self, other: &Self) -> bool {
        JsObjectRef::ptr_eq(self, other)
    }
}

impl Eq for JsObjectRef {}

impl fmt::Debug for JsObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(obj) = self.0.try_borrow() else {
            return write!(f, "[object (borrowed)]");
        };
        match &obj.exotic {
            ExoticObject::Ordinary => write!(f, "{{...}}"),
            ExoticObject::Array { .. } => {
                write!(f, "[...; {}]", obj.array_length().unwrap_or_default())
            }
            ExoticObject::Arguments { elements } => write!(f, "[Arguments; {}]", elements.len()),
            ExoticObject::Function(func) => write!(f, "[Function: {}]", func.name()),
            ExoticObject::Date { timestamp } => write!(f, "Date({})", timestamp),
            ExoticObject::RegExp { source, flags } => write!(f, "/{}/{}", source, flags),
            ExoticObject::Error => write!(f, "[Error]"),
            ExoticObject::Boolean(b) => write!(f, "[Boolean: {}]", b),
            ExoticObject::Number(n) => write!(f, "[Number: {}]", n),
            ExoticObject::StringObj(s) => write!(f, "[String: {:?}]", s),
        }
    }
}

/// A heap object
#[derive(Debug)]
pub struct JsObject {
    /// Prototype link
    prototype: Option<JsObjectRef>,
    /// Ordinary properties in insertion order
    properties: IndexMap<PropertyKey, Property>,
    /// Exotic object behavior; decides the object's kind
    pub exotic: ExoticObject,
    /// Length of an array whose highest indices live in `properties`; zero
    /// while the dense elements cover the whole array
    sparse_length: u32,
}

impl JsObject {
    /// Create a new ordinary object without a prototype
    pub fn new() -> Self {
        Self::with_exotic(ExoticObject::Ordinary, None)
    }

    /// Create a new ordinary object with a prototype
    pub fn with_prototype(prototype: JsObjectRef) -> Self {
        Self::with_exotic(ExoticObject::Ordinary, Some(prototype))
    }

    pub fn with_exotic(exotic: ExoticObject, prototype: Option<JsObjectRef>) -> Self {
        Self {
            prototype,
            properties: index_map_new(),
            exotic,
            sparse_length: 0,
        }
    }

    pub fn prototype(&self) -> Option<&JsObjectRef> {
        self.prototype.as_ref()
    }

    /// Check if this object is callable
    pub fn is_callable(&self) -> bool {
        matches!(self.exotic, ExoticObject::Function(_))
    }

    /// Dense elements of array and arguments objects
    ///
    /// A sparse array keeps its indices past these in the property table; use
    /// [`JsObject::array_values`] for every element up to `length`.
    pub fn array_elements(&self) -> Option<&[JsValue]> {
        match &self.exotic {
            ExoticObject::Array { elements } | ExoticObject::Arguments { elements } => {
                Some(elements)
            }
            _ => None,
        }
    }

    /// Elements of array and arguments objects for in-place mutation
    ///
    /// A sparse array is made dense first, so the vector spans its whole length.
    pub fn array_elements_mut(&mut self) -> Option<&mut Vec<JsValue>> {
        self.make_dense();
        self.elements_mut()
    }

    fn elements_mut(&mut self) -> Option<&mut Vec<JsValue>> {
        match &mut self.exotic {
            ExoticObject::Array { elements } | ExoticObject::Arguments { elements } => {
                Some(elements)
            }
            _ => None,
        }
    }

    /// The `length` of an array or arguments object
    pub fn array_length(&self) -> Option<u32> {
        self.array_elements()
            .map(|elements| (elements.len() as u32).max(self.sparse_length))
    }

    /// Every element up to `length`, holes read as `undefined`
    pub fn array_values(&self) -> Option<Vec<JsValue>> {
        let length = self.array_length()?;
        let elements = self.array_elements()?;
        let values = (0..length)
            .map(|i| match elements.get(i as usize) {
                Some(value) => value.clone(),
                None => self
                    .properties
                    .get(&PropertyKey::Index(i))
                    .map_or(JsValue::Undefined, |prop| prop.value.clone()),
            })
            .collect();
        Some(values)
    }

    fn make_dense(&mut self) {
        if self.sparse_length == 0 {
            return;
        }
        let length = self.sparse_length as usize;
        if let Some(elements) = self.elements_mut() {
            elements.resize(length, JsValue::Undefined);
        }
        self.absorb_indices();
    }

    /// Move index properties now covered by the dense elements into them
    fn absorb_indices(&mut self) {
        let ExoticObject::Array { elements } = &mut self.exotic else {
            return;
        };
        let len = elements.len();
        let covered: Vec<u32> = self
            .properties
            .keys()
            .filter_map(|key| match key {
                PropertyKey::Index(i) if (*i as usize) < len => Some(*i),
                _ => None,
            })
            .collect();
        for i in covered {
            let prop = self.properties.shift_remove(&PropertyKey::Index(i));
            if let (Some(prop), Some(slot)) = (prop, elements.get_mut(i as usize)) {
                *slot = prop.value;
            }
        }
        if self.sparse_length as usize <= len {
            self.sparse_length = 0;
        }
    }

    /// Get an own property value
    pub fn get_own(&self, key: &PropertyKey) -> Option<JsValue> {
        if let Some(value) = self.exotic_own_value(key) {
            return Some(value);
        }
        self.properties.get(key).map(|prop| prop.value.clone())
    }

    /// Get an own property descriptor, including the synthesized ones of exotic objects
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        if let Some(value) = self.exotic_own_value(key) {
            let is_length = matches!(key, PropertyKey::String(_));
            return Some(if is_length {
                Property::with_attributes(value, true, false, false)
            } else {
                Property::data(value)
            });
        }
        self.properties.get(key).cloned()
    }

    fn exotic_own_value(&self, key: &PropertyKey) -> Option<JsValue> {
        match &self.exotic {
            ExoticObject::Array { elements } | ExoticObject::Arguments { elements } => match key {
                PropertyKey::Index(i) => elements.get(*i as usize).cloned(),
                PropertyKey::String(name) if name == "length" => Some(JsValue::Number(
                    f64::from((elements.len() as u32).max(self.sparse_length)),
                )),
                PropertyKey::String(_) => None,
            },
            ExoticObject::StringObj(s) => string_own_value(s, key),
            _ => None,
        }
    }

    /// Check if object has own property
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.exotic_own_value(key).is_some() || self.properties.contains_key(key)
    }

    /// Set a property
    pub fn set_property(&mut self, key: PropertyKey, value: JsValue) {
        let is_array = matches!(self.exotic, ExoticObject::Array { .. });
        let value = match &key {
            PropertyKey::Index(index) => match self.set_element(*index, value) {
                Some(value) => value,
                None => return,
            },
            PropertyKey::String(name) if is_array && name == "length" => {
                self.set_array_length(&value);
                return;
            }
            _ => value,
        };
        if let ExoticObject::StringObj(s) = &self.exotic {
            // Characters and length of String objects are read-only
            if string_own_value(s, &key).is_some() {
                return;
            }
        }

        if let Some(prop) = self.properties.get_mut(&key) {
            // Only set if writable
            if prop.writable {
                prop.value = value;
            }
        } else {
            self.properties.insert(key, Property::data(value));
        }
    }

    /// Store an indexed element, handing the value back when it belongs in
    /// the property table instead
    fn set_element(&mut self, index: u32, value: JsValue) -> Option<JsValue> {
        let is_array = matches!(self.exotic, ExoticObject::Array { .. });
        let Some(elements) = self.elements_mut() else {
            return Some(value);
        };
        let slot_index = index as usize;
        if let Some(slot) = elements.get_mut(slot_index) {
            *slot = value;
            return None;
        }
        if is_array && index >= MAX_ARRAY_LENGTH {
            return None;
        }
        if slot_index - elements.len() <= MAX_DENSE_GAP {
            elements.resize(slot_index, JsValue::Undefined);
            elements.push(value);
            if self.sparse_length != 0 {
                self.absorb_indices();
            }
            return None;
        }
        if is_array {
            self.sparse_length = self.sparse_length.max(index + 1);
        }
        Some(value)
    }

    /// Assign an array's `length`: shrinking drops elements, growing adds holes
    ///
    /// Values that are not valid lengths are ignored.
    fn set_array_length(&mut self, value: &JsValue) {
        let requested = value.to_number();
        if !(0.0..=f64::from(MAX_ARRAY_LENGTH)).contains(&requested)
            || math::trunc(requested) != requested
        {
            return;
        }
        let length = requested as u32;
        self.properties
            .retain(|key, _| !matches!(key, PropertyKey::Index(i) if *i >= length));
        let Some(elements) = self.elements_mut() else {
            return;
        };
        if length as usize <= elements.len() + MAX_DENSE_GAP {
            elements.resize(length as usize, JsValue::Undefined);
            self.sparse_length = 0;
            self.absorb_indices();
        } else {
            self.sparse_length = length;
        }
    }

    /// Define a property with attributes
    pub fn define_property(&mut self, key: PropertyKey, prop: Property) {
        self.properties.insert(key, prop);
    }

    /// Own property keys in host order: integer indices ascending, then
    /// string keys in insertion order.
    pub fn own_keys(&self, enumerable_only: bool) -> Vec<PropertyKey> {
        let mut indices: Vec<u32> = Vec::new();
        let mut exotic_length = false;
        match &self.exotic {
            ExoticObject::Array { elements } | ExoticObject::Arguments { elements } => {
                indices.extend(0..elements.len() as u32);
                exotic_length = true;
            }
            ExoticObject::StringObj(s) => {
                indices.extend(0..s.as_str().chars().count() as u32);
                exotic_length = true;
            }
            _ => {}
        }

        let mut names = Vec::new();
        for (key, prop) in &self.properties {
            if enumerable_only && !prop.enumerable {
                continue;
            }
            match key {
                PropertyKey::Index(i) => indices.push(*i),
                PropertyKey::String(_) => names.push(key.clone()),
            }
        }
        indices.sort_unstable();
        indices.dedup();

        let mut keys: Vec<PropertyKey> = indices.into_iter().map(PropertyKey::Index).collect();
        if exotic_length && !enumerable_only {
            keys.push(PropertyKey::from("length"));
        }
        keys.extend(names);
        keys
    }

    /// Iterate ordinary properties in insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> + '_ {
        self.properties.iter()
    }

    /// Drop every property, element and the prototype link
    ///
    /// This severs any cycle running through the object.
    pub fn clear(&mut self) {
        self.prototype = None;
        self.properties.clear();
        self.sparse_length = 0;
        if let Some(elements) = self.elements_mut() {
            elements.clear();
        }
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

/// Property key (string or array index)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Index(u32),
}

impl PropertyKey {
    /// The key as the string the host would enumerate
    pub fn to_js_string(&self) -> JsString {
        match self {
            PropertyKey::String(s) => s.cheap_clone(),
            PropertyKey::Index(i) => JsString::from(i.to_string()),
        }
    }

    /// Check if this key equals a string literal (avoids allocation)
    #[inline]
    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            PropertyKey::String(js_str) => js_str.as_str() == s,
            PropertyKey::Index(_) => false,
        }
    }
}

/// Canonical array index, rejecting leading zeros and the 2^32 - 1 sentinel
fn parse_array_index(s: &str) -> Option<u32> {
    // Fast path: check first char is a digit before parsing
    let first = s.bytes().next()?;
    if !first.is_ascii_digit() || (first == b'0' && s.len() > 1) {
        return None;
    }
    s.parse::<u32>().ok().filter(|idx| *idx != u32::MAX)
}

impl From<&str> for PropertyKey {
    #[inline]
    fn from(s: &str) -> Self {
        match parse_array_index(s) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(JsString::from(s)),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<JsString> for PropertyKey {
    #[inline]
    fn from(s: JsString) -> Self {
        match parse_array_index(s.as_str()) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(s),
        }
    }
}

impl From<&JsString> for PropertyKey {
    fn from(s: &JsString) -> Self {
        PropertyKey::from(s.cheap_clone())
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(key: &PropertyKey) -> Self {
        key.clone()
    }
}

impl From<u32> for PropertyKey {
    fn from(idx: u32) -> Self {
        PropertyKey::Index(idx)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Object property descriptor
#[derive(Debug, Clone)]
pub struct Property {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    pub fn data(value: JsValue) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, configurable, but skipped by enumeration (how built-ins attach members)
    pub fn hidden(value: JsValue) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Create a property with custom attributes
    pub fn with_attributes(
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value,
            writable,
            enumerable,
            configurable,
        }
    }
}

/// Exotic object behavior
#[derive(Debug)]
pub enum ExoticObject {
    /// Ordinary object
    Ordinary,
    /// Array exotic object
    Array { elements: Vec<JsValue> },
    /// Arguments object of a call
    Arguments { elements: Vec<JsValue> },
    /// Function exotic object
    Function(JsFunction),
    /// Date exotic object - stores timestamp in milliseconds since Unix epoch
    Date { timestamp: f64 },
    /// RegExp exotic object - stores source and flags
    RegExp { source: JsString, flags: JsString },
    /// Error instance marker; name and message live in ordinary properties
    Error,
    /// Boxed boolean primitive
    Boolean(bool),
    /// Boxed number primitive
    Number(f64),
    /// Boxed string primitive
    StringObj(JsString),
}

/// Native function signature
pub type NativeFn = Rc<dyn Fn(&JsValue, &[JsValue]) -> Result<JsValue, UnderbarError>>;

/// Function representation
#[derive(Debug, Clone)]
pub enum JsFunction {
    /// Native Rust function
    Native(NativeFunction),
}

impl JsFunction {
    pub fn name(&self) -> &str {
        match self {
            JsFunction::Native(f) => f.name.as_str(),
        }
    }
}

/// Native function wrapper
#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub func: NativeFn,
    pub arity: usize,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

//! Classification and predicate tests

use super::{js, noop};
use serde_json::json;
use underbar::kind::{
    MAX_ARRAY_INDEX, is_arguments, is_array, is_array_like, is_boolean, is_date, is_element,
    is_error, is_finite, is_function, is_nan, is_null, is_number, is_object, is_regexp,
    is_string, is_undefined,
};
use underbar::{JsValue, Kind, Realm, classify};

#[test]
fn test_classify_every_kind() {
    let realm = Realm::new();
    let cases = vec![
        (js(&realm, json!([1])), Kind::Array),
        (js(&realm, json!({"a": 1})), Kind::Object),
        (JsValue::from("s"), Kind::String),
        (JsValue::Object(realm.new_string_object("s")), Kind::String),
        (JsValue::from(1.5), Kind::Number),
        (JsValue::Object(realm.new_number_object(1.5)), Kind::Number),
        (JsValue::from(false), Kind::Boolean),
        (JsValue::Object(realm.new_boolean_object(false)), Kind::Boolean),
        (JsValue::Object(realm.new_date(0.0)), Kind::Date),
        (JsValue::Object(realm.new_regexp("x", "").unwrap()), Kind::Pattern),
        (JsValue::Object(realm.new_error("e")), Kind::Error),
        (noop(&realm, "f"), Kind::Function),
        (JsValue::Null, Kind::Null),
        (JsValue::Undefined, Kind::Undefined),
        (JsValue::Object(realm.new_arguments(vec![])), Kind::Arguments),
    ];
    for (value, kind) in cases {
        assert_eq!(classify(&value), kind, "{:?}", value);
    }
}

#[test]
fn test_kind_tags() {
    assert_eq!(Kind::Pattern.to_string(), "[object RegExp]");
    assert_eq!(Kind::Arguments.to_string(), "[object Arguments]");
    assert_eq!(Kind::Null.tag(), "Null");
    assert!(Kind::Array.is_composite());
    assert!(Kind::Error.is_composite());
    assert!(!Kind::Date.is_composite());
}

#[test]
fn test_classification_ignores_prototype() {
    let realm = Realm::new();
    let other = Realm::new();

    // An array whose prototype was swapped for a plain object's
    let array = realm.new_array(vec![]);
    array.set_prototype(Some(other.object_prototype.clone()));
    assert!(is_array(&JsValue::Object(array)));

    // A plain object dressed up with Array.prototype
    let fake = realm.object_create(Some(&realm.array_prototype));
    assert!(!is_array(&JsValue::Object(fake)));

    assert!(is_date(&JsValue::Object(other.new_date(0.0))));
    assert!(is_error(&JsValue::Object(other.new_error("x"))));
}

#[test]
fn test_is_object_includes_callables() {
    let realm = Realm::new();
    assert!(is_object(&noop(&realm, "f")));
    assert!(is_object(&js(&realm, json!([]))));
    assert!(!is_object(&JsValue::Null));
    assert!(!is_object(&JsValue::from("s")));
    assert!(is_function(&JsValue::Object(realm.object_constructor.clone())));
}

#[test]
fn test_simple_predicates() {
    let realm = Realm::new();
    assert!(is_string(&JsValue::Object(realm.new_string_object(""))));
    assert!(is_number(&JsValue::Number(f64::NAN)));
    assert!(is_boolean(&JsValue::Object(realm.new_boolean_object(true))));
    assert!(is_regexp(&JsValue::Object(realm.new_regexp("a", "g").unwrap())));
    assert!(is_arguments(&JsValue::Object(realm.new_arguments(vec![]))));
    assert!(!is_arguments(&js(&realm, json!([]))));
    assert!(is_null(&JsValue::Null));
    assert!(!is_null(&JsValue::Undefined));
    assert!(is_undefined(&JsValue::Undefined));
}

#[test]
fn test_is_nan_is_value_based() {
    let realm = Realm::new();
    assert!(is_nan(&JsValue::Number(f64::NAN)));
    assert!(is_nan(&JsValue::Object(realm.new_number_object(f64::NAN))));
    assert!(!is_nan(&JsValue::Object(realm.new_number_object(5.0))));
    assert!(!is_nan(&JsValue::Undefined));
    assert!(!is_nan(&JsValue::from("abc")));
}

#[test]
fn test_is_finite() {
    assert!(is_finite(&JsValue::from(0)));
    assert!(is_finite(&JsValue::from("12")));
    assert!(is_finite(&JsValue::from(" 1e3 ")));
    assert!(!is_finite(&JsValue::from("12px")));
    assert!(!is_finite(&JsValue::from("")));
    assert!(!is_finite(&JsValue::Null));
    assert!(!is_finite(&JsValue::Number(f64::INFINITY)));
    assert!(!is_finite(&JsValue::Number(f64::NAN)));
}

#[test]
fn test_is_element() {
    let realm = Realm::new();
    assert!(is_element(&js(&realm, json!({"nodeType": 1}))));
    assert!(!is_element(&js(&realm, json!({"nodeType": 3}))));
    assert!(!is_element(&JsValue::Null));
}

#[test]
fn test_is_array_like() {
    let realm = Realm::new();
    assert!(is_array_like(&js(&realm, json!([1, 2]))));
    assert!(is_array_like(&JsValue::from("abc")));
    assert!(is_array_like(&js(&realm, json!({"length": 0}))));
    assert!(is_array_like(&js(&realm, json!({"length": MAX_ARRAY_INDEX}))));
    assert!(!is_array_like(&js(&realm, json!({"length": -1}))));
    assert!(!is_array_like(&js(&realm, json!({"length": "3"}))));
    assert!(!is_array_like(&JsValue::Null));
    // Functions have a numeric length too
    assert!(is_array_like(&noop(&realm, "f")));
}

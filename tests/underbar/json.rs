//! JSON bridge tests

use super::{js, noop, sever};
use serde_json::json;
use underbar::json::{parse, stringify, to_json};
use underbar::{JsValue, Realm, UnderbarError, is_equal};

#[test]
fn test_round_trip_through_values() {
    let realm = Realm::new();
    let source = json!({"name": "moe", "tags": ["a", "b"], "age": 40, "ratio": 0.5, "x": null});
    let value = js(&realm, source.clone());
    assert_eq!(to_json(&value).unwrap(), source);
}

#[test]
fn test_stringify_drops_what_json_cannot_hold() {
    let realm = Realm::new();
    let f = noop(&realm, "f");
    let obj = realm.object_from([
        ("keep", JsValue::from(1)),
        ("undef", JsValue::Undefined),
        ("func", f.clone()),
    ]);
    assert_eq!(stringify(&JsValue::Object(obj)).unwrap(), r#"{"keep":1}"#);

    let list = JsValue::Object(realm.new_array(vec![JsValue::Undefined, f, JsValue::Null]));
    assert_eq!(stringify(&list).unwrap(), "[null,null,null]");
}

#[test]
fn test_numbers() {
    assert_eq!(stringify(&JsValue::Number(f64::NAN)).unwrap(), "null");
    assert_eq!(stringify(&JsValue::Number(f64::NEG_INFINITY)).unwrap(), "null");
    assert_eq!(stringify(&JsValue::Number(-0.0)).unwrap(), "0");
    assert_eq!(stringify(&JsValue::from(3)).unwrap(), "3");
    assert_eq!(stringify(&JsValue::from(2.5)).unwrap(), "2.5");
}

#[test]
fn test_boxed_dates_patterns_and_errors() {
    let realm = Realm::new();
    assert_eq!(
        stringify(&JsValue::Object(realm.new_number_object(7.0))).unwrap(),
        "7"
    );
    assert_eq!(
        stringify(&JsValue::Object(realm.new_boolean_object(false))).unwrap(),
        "false"
    );
    assert_eq!(
        stringify(&JsValue::Object(realm.new_date(86_400_000.0))).unwrap(),
        r#""1970-01-02T00:00:00.000Z""#
    );
    assert_eq!(
        stringify(&JsValue::Object(realm.new_date(f64::NAN))).unwrap(),
        "null"
    );
    assert_eq!(
        stringify(&JsValue::Object(realm.new_regexp("a", "g").unwrap())).unwrap(),
        "{}"
    );
    assert_eq!(
        stringify(&JsValue::Object(realm.new_error("boom"))).unwrap(),
        "{}"
    );
    let args = JsValue::Object(realm.new_arguments(vec![JsValue::from("x")]));
    assert_eq!(stringify(&args).unwrap(), r#"{"0":"x"}"#);
}

#[test]
fn test_cycles_are_rejected() {
    let realm = Realm::new();
    let list = realm.new_array(vec![]);
    let holder = realm.object_from([("items", JsValue::Object(list.clone()))]);
    list.set(0u32, JsValue::Object(holder.clone()));

    let err = to_json(&JsValue::Object(holder.clone())).unwrap_err();
    assert!(matches!(err, UnderbarError::CircularStructure { .. }));
    assert!(err.to_string().contains("circular structure"));
    assert!(err.to_string().contains("items.0"));
    sever(&holder);
}

#[test]
fn test_serialize_impl() {
    let realm = Realm::new();
    let value = js(&realm, json!({"a": [true, null]}));
    assert_eq!(serde_json::to_value(&value).unwrap(), json!({"a": [true, null]}));

    let cyclic = realm.new_object();
    cyclic.set("me", JsValue::Object(cyclic.clone()));
    assert!(serde_json::to_string(&JsValue::Object(cyclic.clone())).is_err());
    sever(&cyclic);
}

#[test]
fn test_parse() {
    let realm = Realm::new();
    let value = parse(&realm, r#"[1, {"2": "x", "b": [false]}]"#).unwrap();
    assert!(is_equal(&value, &js(&realm, json!([1, {"2": "x", "b": [false]}]))));
    assert!(matches!(
        parse(&realm, "[1,"),
        Err(UnderbarError::SyntaxError { .. })
    ));
}

#[test]
fn test_sparse_arrays_serialize_holes_as_null() {
    let realm = Realm::new();
    let array = js(&realm, json!([1]));
    let obj = array.as_object().unwrap();
    obj.set("length", JsValue::from(70_000));
    obj.set(69_999u32, JsValue::from(2));

    let out = to_json(&array).unwrap();
    let items = out.as_array().unwrap();
    assert_eq!(items.len(), 70_000);
    assert_eq!(items.first(), Some(&json!(1)));
    assert_eq!(items.get(1), Some(&serde_json::Value::Null));
    assert_eq!(items.last(), Some(&json!(2)));
}

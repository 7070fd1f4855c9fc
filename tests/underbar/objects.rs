//! Object utility tests

use super::{js, names, noop};
use serde_json::json;
use underbar::iteratee::{self, Iteratee};
use underbar::objects::{
    clone, create, defaults, extend, extend_own, find_key, invert, is_empty, is_match,
    map_object, omit, omit_by, pairs, pick, pick_by, tap, values,
};
use underbar::{JsValue, Realm, UnderbarError, is_equal, own_keys};

#[test]
fn test_extend_later_sources_win() {
    let realm = Realm::new();
    let target = js(&realm, json!({"a": 1}));
    let result = extend(
        &target,
        &[js(&realm, json!({"a": 2, "b": 2})), js(&realm, json!({"b": 3}))],
    );
    assert!(is_equal(&result, &js(&realm, json!({"a": 2, "b": 3}))));
    // The target itself is returned
    assert!(result.strict_equals(&target));
}

#[test]
fn test_extend_own_skips_inherited() {
    let realm = Realm::new();
    let parent = realm.object_from([("inherited", JsValue::from(1))]);
    let source = JsValue::Object(realm.object_create(Some(&parent)));
    source.as_object().unwrap().set("own", JsValue::from(2));

    let all = extend(&js(&realm, json!({})), &[source.clone()]);
    let own = extend_own(&js(&realm, json!({})), &[source]);
    assert_eq!(names(own_keys(&all)), vec!["own", "inherited"]);
    assert_eq!(names(own_keys(&own)), vec!["own"]);
}

#[test]
fn test_defaults_keep_null() {
    let realm = Realm::new();
    let options = js(&realm, json!({"flavor": "chocolate", "sprinkles": null}));
    defaults(
        &options,
        &[js(&realm, json!({"flavor": "vanilla", "sprinkles": "lots", "size": 2}))],
    );
    assert!(is_equal(
        &options,
        &js(&realm, json!({"flavor": "chocolate", "sprinkles": null, "size": 2}))
    ));
}

#[test]
fn test_pick_and_omit() {
    let realm = Realm::new();
    let person = js(&realm, json!({"name": "moe", "age": 50, "userid": "moe1"}));

    let picked = JsValue::Object(pick(&realm, &person, &["name", "age", "missing"]));
    assert!(is_equal(&picked, &js(&realm, json!({"name": "moe", "age": 50}))));

    let omitted = JsValue::Object(omit(&realm, &person, &["userid"]));
    assert!(is_equal(&omitted, &js(&realm, json!({"name": "moe", "age": 50}))));
}

#[test]
fn test_pick_sees_inherited_keys() {
    let realm = Realm::new();
    let parent = realm.object_from([("inherited", JsValue::from(1))]);
    let child = JsValue::Object(realm.object_create(Some(&parent)));
    let picked = JsValue::Object(pick(&realm, &child, &["inherited"]));
    assert_eq!(picked.get("inherited"), JsValue::from(1));
}

#[test]
fn test_pick_by_and_omit_by_predicates() {
    let realm = Realm::new();
    let obj = js(&realm, json!({"a": 1, "b": "two", "c": 3}));
    let is_number = Iteratee::predicate(|value, _, _| matches!(value, JsValue::Number(_)));

    let numbers = JsValue::Object(pick_by(&realm, &obj, &is_number).unwrap());
    assert!(is_equal(&numbers, &js(&realm, json!({"a": 1, "c": 3}))));

    let rest = JsValue::Object(omit_by(&realm, &obj, &is_number).unwrap());
    assert!(is_equal(&rest, &js(&realm, json!({"b": "two"}))));
}

#[test]
fn test_predicate_errors_propagate() {
    let realm = Realm::new();
    let failing = Iteratee::closure(|_, _, _| Err(UnderbarError::type_error("nope")));
    let obj = js(&realm, json!({"a": 1}));
    assert!(matches!(
        pick_by(&realm, &obj, &failing),
        Err(UnderbarError::TypeError { .. })
    ));
    assert!(map_object(&realm, &obj, &failing).is_err());
    assert!(find_key(&obj, &failing).is_err());
}

#[test]
fn test_clone_is_shallow() {
    let realm = Realm::new();
    let original = js(&realm, json!({"name": "moe", "lucky": [13, 27]}));
    let copy = clone(&realm, &original);
    assert!(is_equal(&copy, &original));
    assert!(!copy.strict_equals(&original));
    assert!(copy.get("lucky").strict_equals(&original.get("lucky")));

    let list = js(&realm, json!([1, 2]));
    let list_copy = clone(&realm, &list);
    assert!(underbar::kind::is_array(&list_copy));
    assert!(is_equal(&list_copy, &list));

    assert_eq!(clone(&realm, &JsValue::from(3)), JsValue::from(3));
}

#[test]
fn test_create_links_prototype() {
    let realm = Realm::new();
    let proto = js(&realm, json!({"greet": "hi"}));
    let obj = create(&realm, &proto, Some(&js(&realm, json!({"name": "moe"}))));
    let obj = JsValue::Object(obj);
    assert_eq!(obj.get("greet"), JsValue::from("hi"));
    assert_eq!(names(own_keys(&obj)), vec!["name"]);

    let plain = JsValue::Object(create(&realm, &JsValue::Null, None));
    assert!(is_equal(&plain, &js(&realm, json!({}))));
}

#[test]
fn test_values_pairs_invert() {
    let realm = Realm::new();
    let obj = js(&realm, json!({"one": 1, "two": 2}));
    assert!(is_equal(
        &JsValue::Object(values(&realm, &obj)),
        &js(&realm, json!([1, 2]))
    ));
    assert!(is_equal(
        &JsValue::Object(pairs(&realm, &obj)),
        &js(&realm, json!([["one", 1], ["two", 2]]))
    ));
    assert!(is_equal(
        &JsValue::Object(invert(&realm, &obj)),
        &js(&realm, json!({"1": "one", "2": "two"}))
    ));
}

#[test]
fn test_map_object_and_find_key() {
    let realm = Realm::new();
    let obj = js(&realm, json!({"start": 5, "end": 12}));
    let plus_five = Iteratee::closure(|value, _, _| Ok(JsValue::Number(value.to_number() + 5.0)));
    let mapped = JsValue::Object(map_object(&realm, &obj, &plus_five).unwrap());
    assert!(is_equal(&mapped, &js(&realm, json!({"start": 10, "end": 17}))));

    let big = Iteratee::predicate(|value, _, _| value.to_number() > 10.0);
    assert_eq!(
        find_key(&obj, &big).unwrap().map(|k| k.to_string()),
        Some("end".to_string())
    );
    let huge = Iteratee::predicate(|value, _, _| value.to_number() > 100.0);
    assert_eq!(find_key(&obj, &huge).unwrap(), None);
}

#[test]
fn test_iteratee_shorthands() {
    let realm = Realm::new();
    let people = js(
        &realm,
        json!({"a": {"name": "moe", "age": 40}, "b": {"name": "larry", "age": 50}}),
    );
    let by_name = Iteratee::from_value(&JsValue::from("name"), None);
    let names_by_key = JsValue::Object(map_object(&realm, &people, &by_name).unwrap());
    assert!(is_equal(
        &names_by_key,
        &js(&realm, json!({"a": "moe", "b": "larry"}))
    ));

    let fifty = Iteratee::from_value(&js(&realm, json!({"age": 50})), None);
    assert_eq!(
        find_key(&people, &fifty).unwrap().map(|k| k.to_string()),
        Some("b".to_string())
    );

    let age = iteratee::property("age");
    assert_eq!(age(&people.get("a")), JsValue::from(40));
}

#[test]
fn test_tap_returns_its_input() {
    let realm = Realm::new();
    let obj = js(&realm, json!({"a": 1}));
    let mut seen = 0;
    let result = tap(obj.clone(), |value| {
        seen = own_keys(value).len();
        Ok(())
    })
    .unwrap();
    assert!(result.strict_equals(&obj));
    assert_eq!(seen, 1);
}

#[test]
fn test_is_match() {
    let realm = Realm::new();
    let moe = js(&realm, json!({"name": "moe", "age": 32}));
    assert!(is_match(&moe, &js(&realm, json!({"age": 32}))));
    assert!(!is_match(&moe, &js(&realm, json!({"age": 33}))));
    assert!(is_match(&moe, &js(&realm, json!({}))));
    assert!(is_match(&JsValue::Null, &js(&realm, json!({}))));
    assert!(!is_match(&JsValue::Null, &js(&realm, json!({"a": 1}))));
    // Strict equality, so nested objects must be the same reference
    let nested = js(&realm, json!({"x": {"y": 1}}));
    assert!(!is_match(&nested, &js(&realm, json!({"x": {"y": 1}}))));
    assert!(is_match(&JsValue::from("abc"), &js(&realm, json!({"length": 3}))));
}

#[test]
fn test_is_empty() {
    let realm = Realm::new();
    assert!(is_empty(&JsValue::Null));
    assert!(is_empty(&JsValue::Undefined));
    assert!(is_empty(&js(&realm, json!([]))));
    assert!(!is_empty(&js(&realm, json!([0]))));
    assert!(is_empty(&js(&realm, json!({}))));
    assert!(!is_empty(&js(&realm, json!({"a": null}))));
    assert!(is_empty(&JsValue::from("")));
    assert!(is_empty(&JsValue::Object(realm.new_arguments(vec![]))));
    assert!(is_empty(&noop(&realm, "f")));
}

#[test]
fn test_is_match_on_number_and_boolean_subjects() {
    let realm = Realm::new();
    assert!(is_match(&JsValue::from(5), &js(&realm, json!({}))));
    assert!(is_match(&JsValue::from(false), &js(&realm, json!({}))));
    assert!(!is_match(&JsValue::from(5), &js(&realm, json!({"a": 5}))));
    assert!(!is_match(&JsValue::from(0), &js(&realm, json!({"length": 0}))));
    let undefined_attr = JsValue::Object(realm.object_from([("x", JsValue::Undefined)]));
    assert!(!is_match(&JsValue::from(true), &undefined_attr));
    // Strings expose their characters
    assert!(is_match(&JsValue::from("ab"), &js(&realm, json!({"0": "a", "length": 2}))));
}

#[test]
fn test_large_and_small_numbers_print_in_exponent_form() {
    let realm = Realm::new();
    let obj = js(&realm, json!({"big": 1e21, "small": 1e-7, "plain": 0.000001}));
    let inverted = JsValue::Object(invert(&realm, &obj));
    assert_eq!(inverted.get("1e+21"), JsValue::from("big"));
    assert_eq!(inverted.get("1e-7"), JsValue::from("small"));
    assert_eq!(inverted.get("0.000001"), JsValue::from("plain"));
}

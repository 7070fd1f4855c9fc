//! Deep equality tests

use super::{array, class, js, noop, object, sever};
use serde_json::json;
use underbar::{JsValue, Realm, is_equal, own_keys};

fn samples(realm: &Realm) -> Vec<JsValue> {
    vec![
        JsValue::Undefined,
        JsValue::Null,
        JsValue::from(true),
        JsValue::from(0),
        JsValue::Number(-0.0),
        JsValue::from(5),
        JsValue::from("5"),
        JsValue::from(""),
        js(realm, json!([])),
        js(realm, json!({})),
        js(realm, json!([1, 2, 3])),
        js(realm, json!([3, 2, 1])),
        js(realm, json!({"a": 1, "b": 2})),
        js(realm, json!({"b": 2, "a": 1})),
        js(realm, json!({"x": [1, {"y": 2}]})),
        JsValue::Object(realm.new_string_object("5")),
        JsValue::Object(realm.new_number_object(5.0)),
        JsValue::Object(realm.new_boolean_object(true)),
        JsValue::Object(realm.new_date(0.0)),
        JsValue::Object(realm.new_date(f64::NAN)),
        JsValue::Object(realm.new_arguments(vec![JsValue::from(1)])),
        JsValue::Object(realm.new_error("boom")),
        noop(realm, "f"),
    ]
}

#[test]
fn test_reflexivity() {
    let realm = Realm::new();
    for value in samples(&realm) {
        if matches!(value, JsValue::Number(n) if n.is_nan()) {
            continue;
        }
        assert!(is_equal(&value, &value), "{:?} should equal itself", value);
    }
}

#[test]
fn test_nan_equals_nan() {
    assert!(is_equal(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
    assert!(!is_equal(&JsValue::Number(f64::NAN), &JsValue::from(0)));
}

#[test]
fn test_zero_sign_distinction() {
    assert!(!is_equal(&JsValue::from(0), &JsValue::Number(-0.0)));
    assert!(!is_equal(&JsValue::Number(-0.0), &JsValue::from(0)));
    assert!(is_equal(&JsValue::from(0), &JsValue::from(0)));
    assert!(is_equal(&JsValue::Number(-0.0), &JsValue::Number(-0.0)));
}

#[test]
fn test_symmetry() {
    let realm = Realm::new();
    let values = samples(&realm);
    for a in &values {
        for b in &values {
            assert_eq!(
                is_equal(a, b),
                is_equal(b, a),
                "asymmetric for {:?} and {:?}",
                a,
                b
            );
        }
    }
}

#[test]
fn test_self_referencing_objects_are_equal() {
    let realm = Realm::new();
    let a = realm.object_from([("name", JsValue::from("loop"))]);
    a.set("self", JsValue::Object(a.clone()));
    let b = realm.object_from([("name", JsValue::from("loop"))]);
    b.set("self", JsValue::Object(b.clone()));

    assert!(is_equal(&JsValue::Object(a.clone()), &JsValue::Object(b.clone())));
    sever(&a);
    sever(&b);
}

#[test]
fn test_cycle_against_finite_mismatch() {
    let realm = Realm::new();
    let a = realm.object_from([("name", JsValue::from("loop"))]);
    a.set("self", JsValue::Object(a.clone()));
    // Two levels of unrolling, then a different leaf
    let b = js(
        &realm,
        json!({"name": "loop", "self": {"name": "loop", "self": {"name": "end"}}}),
    );

    assert!(!is_equal(&JsValue::Object(a.clone()), &b));
    assert!(!is_equal(&b, &JsValue::Object(a.clone())));
    sever(&a);
}

#[test]
fn test_cycles_of_different_period() {
    let realm = Realm::new();
    // a -> a
    let a = realm.new_object();
    a.set("next", JsValue::Object(a.clone()));
    // b1 -> b2 -> b1
    let b1 = realm.new_object();
    let b2 = realm.new_object();
    b1.set("next", JsValue::Object(b2.clone()));
    b2.set("next", JsValue::Object(b1.clone()));

    // Both unroll to the same infinite shape, but pairs differ on revisit
    assert!(!is_equal(&JsValue::Object(a.clone()), &JsValue::Object(b1.clone())));
    sever(&a);
    sever(&b1);
}

#[test]
fn test_cyclic_arrays() {
    let realm = Realm::new();
    let a = realm.new_array(vec![JsValue::from(1)]);
    a.borrow_mut()
        .array_elements_mut()
        .unwrap()
        .push(JsValue::Object(a.clone()));
    let b = realm.new_array(vec![JsValue::from(1)]);
    b.borrow_mut()
        .array_elements_mut()
        .unwrap()
        .push(JsValue::Object(b.clone()));

    assert!(is_equal(&JsValue::Object(a.clone()), &JsValue::Object(b.clone())));
    sever(&a);
    sever(&b);
}

#[test]
fn test_cross_kind_inequality() {
    let realm = Realm::new();
    assert!(!is_equal(&js(&realm, json!([])), &js(&realm, json!({}))));
    assert!(!is_equal(&JsValue::from("5"), &JsValue::from(5)));
    assert!(!is_equal(&JsValue::from(1), &JsValue::from(true)));
    assert!(!is_equal(
        &JsValue::Object(realm.new_arguments(vec![JsValue::from(1)])),
        &js(&realm, json!([1]))
    ));
}

#[test]
fn test_boxed_primitive_equivalence() {
    let realm = Realm::new();
    let boxed = JsValue::Object(realm.new_string_object("abc"));
    assert!(is_equal(&JsValue::from("abc"), &boxed));
    assert!(is_equal(&boxed, &JsValue::from("abc")));
    assert!(!is_equal(&JsValue::from("abd"), &boxed));

    let five = JsValue::Object(realm.new_number_object(5.0));
    assert!(is_equal(&five, &JsValue::from(5)));
    let yes = JsValue::Object(realm.new_boolean_object(true));
    assert!(is_equal(&yes, &JsValue::from(true)));
    assert!(!is_equal(&yes, &JsValue::from(false)));
}

#[test]
fn test_array_order_sensitivity() {
    let realm = Realm::new();
    assert!(!is_equal(&js(&realm, json!([1, 2, 3])), &js(&realm, json!([3, 2, 1]))));
    assert!(is_equal(&js(&realm, json!([1, 2, 3])), &js(&realm, json!([1, 2, 3]))));
    assert!(!is_equal(&js(&realm, json!([1, 2])), &js(&realm, json!([1, 2, 3]))));
}

#[test]
fn test_key_order_independence() {
    let realm = Realm::new();
    let a = object(&realm, vec![("a", JsValue::from(1)), ("b", JsValue::from(2))]);
    let b = object(&realm, vec![("b", JsValue::from(2)), ("a", JsValue::from(1))]);
    assert!(is_equal(&a, &b));
    let c = object(&realm, vec![("a", JsValue::from(1)), ("c", JsValue::from(2))]);
    assert!(!is_equal(&a, &c));
}

#[test]
fn test_deep_nesting() {
    let realm = Realm::new();
    let a = js(&realm, json!({"x": [1, {"y": 2}]}));
    assert!(is_equal(&a, &js(&realm, json!({"x": [1, {"y": 2}]}))));
    assert!(!is_equal(&a, &js(&realm, json!({"x": [1, {"y": 3}]}))));
}

#[test]
fn test_own_keys_of_nothing() {
    assert!(own_keys(&JsValue::Null).is_empty());
    assert!(own_keys(&JsValue::Undefined).is_empty());
}

#[test]
fn test_dates_compare_by_time() {
    let realm = Realm::new();
    let a = JsValue::Object(realm.new_date(1_000.0));
    let b = JsValue::Object(realm.parse_date("1970-01-01T00:00:01Z"));
    assert!(is_equal(&a, &b));
    assert!(!is_equal(&a, &JsValue::Object(realm.new_date(2_000.0))));
    // Invalid dates are never equal
    let bad = JsValue::Object(realm.new_date(f64::NAN));
    assert!(!is_equal(&bad, &JsValue::Object(realm.new_date(f64::NAN))));
}

#[test]
fn test_patterns_compare_by_source_and_flags() {
    let realm = Realm::new();
    let a = JsValue::Object(realm.new_regexp("a+b", "gi").unwrap());
    let b = JsValue::Object(realm.new_regexp("a+b", "gi").unwrap());
    let c = JsValue::Object(realm.new_regexp("a+b", "g").unwrap());
    assert!(is_equal(&a, &b));
    assert!(!is_equal(&a, &c));
}

#[test]
fn test_values_from_another_realm() {
    let here = Realm::new();
    let there = Realm::new();
    // Different Object constructors, both instances of themselves
    assert!(is_equal(
        &js(&here, json!({"a": [1, {"b": null}]})),
        &js(&there, json!({"a": [1, {"b": null}]}))
    ));
    assert!(!is_equal(
        &js(&here, json!({"a": 1})),
        &js(&there, json!({"a": 2}))
    ));
}

#[test]
fn test_constructor_mismatch() {
    let realm = Realm::new();
    let point = class(&realm, "Point");
    let vector = class(&realm, "Vector");
    let coords = js(&realm, json!({"x": 1, "y": 2}));

    let p1 = realm.construct(&point, &[coords.clone()]).unwrap();
    let p2 = realm.construct(&point, &[coords.clone()]).unwrap();
    let v = realm.construct(&vector, &[coords.clone()]).unwrap();

    assert!(is_equal(&p1, &p2));
    assert!(!is_equal(&p1, &v));
    assert!(!is_equal(&p1, &coords));
}

#[test]
fn test_object_without_constructor_matches_plain() {
    let realm = Realm::new();
    let bare = JsValue::Object(realm.object_create(None));
    bare.as_object().unwrap().set("a", JsValue::from(1));
    assert!(is_equal(&bare, &js(&realm, json!({"a": 1}))));
}

#[test]
fn test_functions_and_errors() {
    let realm = Realm::new();
    let f = noop(&realm, "f");
    assert!(is_equal(&f, &f));
    assert!(!is_equal(&f, &noop(&realm, "f")));

    // Messages are not enumerable, so only own enumerable properties count
    let a = JsValue::Object(realm.new_error("one"));
    let b = JsValue::Object(realm.new_error("two"));
    assert!(is_equal(&a, &b));
    a.as_object().unwrap().set("code", JsValue::from(1));
    assert!(!is_equal(&a, &b));
}

#[test]
fn test_inherited_properties_do_not_count() {
    let realm = Realm::new();
    let parent = realm.object_from([("shared", JsValue::from(1))]);
    let child = JsValue::Object(realm.object_create(Some(&parent)));
    let empty = JsValue::Object(realm.object_create(Some(&parent)));
    assert!(is_equal(&child, &empty));
    assert!(is_equal(&array(&realm, vec![child]), &array(&realm, vec![empty])));
}

#[test]
fn test_sparse_arrays_compare_every_index() {
    let realm = Realm::new();
    let a = array(&realm, vec![]);
    let b = array(&realm, vec![]);
    a.as_object().unwrap().set(100_000u32, JsValue::from(1));
    b.as_object().unwrap().set(100_000u32, JsValue::from(2));
    assert_eq!(a.get("length"), JsValue::from(100_001));
    assert!(!is_equal(&a, &b));

    b.as_object().unwrap().set(100_000u32, JsValue::from(1));
    assert!(is_equal(&a, &b));

    // Only the length set: all holes
    let holes = array(&realm, vec![]);
    holes.as_object().unwrap().set("length", JsValue::from(100_001));
    assert!(!is_equal(&a, &holes));
    holes.as_object().unwrap().set(100_000u32, JsValue::from(1));
    assert!(is_equal(&a, &holes));
}

#[test]
fn test_array_storage_does_not_affect_equality() {
    let realm = Realm::new();
    let sparse = array(&realm, vec![JsValue::from("x")]);
    sparse.as_object().unwrap().set(80_000u32, JsValue::from("y"));

    let mut elements = vec![JsValue::Undefined; 80_001];
    if let Some((first, rest)) = elements.split_first_mut()
        && let Some(last) = rest.last_mut()
    {
        *first = JsValue::from("x");
        *last = JsValue::from("y");
    }
    let dense = array(&realm, elements);
    assert!(is_equal(&sparse, &dense));
    assert!(is_equal(&dense, &sparse));

    dense.as_object().unwrap().set(40_000u32, JsValue::from(0));
    assert!(!is_equal(&sparse, &dense));
    assert!(!is_equal(&dense, &sparse));
}

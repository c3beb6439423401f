use super::*;
use bytes::Bytes;
use http::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;

fn vars(pairs: &[(&str, &str)]) -> Value {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Value::RequestVars(Arc::new(map))
}

#[test]
fn test_with_value_is_visible_and_preserves_other_keys() {
    let base = Store::new()
        .with_value(Value::Environment(Environment::Hosted))
        .with_value(Value::RequestBody(Bytes::from_static(b"abc")));

    let next = base.with_value(Value::Namespace("ns".into()));

    assert_eq!(next.namespace(), Some("ns"));
    assert_eq!(next.environment(), Environment::Hosted);
    assert_eq!(next.body(), Bytes::from_static(b"abc"));
    // Parent snapshot is untouched
    assert!(base.namespace().is_none());
}

#[test]
fn test_newer_value_shadows_older() {
    let first = Store::new().with_value(Value::Namespace("a".into()));
    let second = first.with_value(Value::Namespace("b".into()));

    assert_eq!(first.namespace(), Some("a"));
    assert_eq!(second.namespace(), Some("b"));
    assert_eq!(second.keys(), vec![Key::Namespace]);
}

#[test]
fn test_missing_keys_fall_back_to_typed_defaults() {
    let store = Store::new();
    assert!(store.get(Key::Request).is_none());
    assert_eq!(store.code(), StatusCode::OK);
    assert!(store.explicit_code().is_none());
    assert!(store.body().is_empty());
    assert!(!store.has_body());
    assert_eq!(store.form_value("id"), "");
    assert_eq!(store.environment(), Environment::Standard);
    assert!(!store.is_cancelled());
}

#[test]
fn test_set_code_replaces_binding_but_not_snapshots() {
    let mut store = Store::new();
    let before = store.clone();

    store.set_code(StatusCode::CREATED);

    assert_eq!(store.code(), StatusCode::CREATED);
    assert_eq!(store.explicit_code(), Some(StatusCode::CREATED));
    assert_eq!(before.code(), StatusCode::OK);
    assert!(before.explicit_code().is_none());
}

#[test]
fn test_set_code_same_value_does_not_grow_history() {
    let mut store = Store::new();
    store.set_code(StatusCode::ACCEPTED);
    store.set_code(StatusCode::ACCEPTED);
    assert_eq!(store.keys(), vec![Key::ResponseCode]);
}

#[test]
fn test_form_value_reads_request_vars() {
    let store = Store::new().with_value(vars(&[("id", "7"), ("name", "rex")]));
    assert_eq!(store.form_value("id"), "7");
    assert_eq!(store.form_value("name"), "rex");
    assert_eq!(store.form_value("missing"), "");
}

#[test]
fn test_extensions_are_copy_on_write() {
    #[derive(Clone, Debug, PartialEq)]
    struct Tenant(&'static str);

    let base = Store::new();
    let with_tenant = base.with_extension(Tenant("acme"));

    assert_eq!(with_tenant.extension::<Tenant>(), Some(&Tenant("acme")));
    assert!(base.extension::<Tenant>().is_none());

    // Core values written after the extension keep it
    let later = with_tenant.with_value(Value::Namespace("x".into()));
    assert_eq!(later.extension::<Tenant>(), Some(&Tenant("acme")));
}

#[test]
fn test_value_key_mapping() {
    assert_eq!(Value::ResponseCode(StatusCode::OK).key(), Key::ResponseCode);
    assert_eq!(Value::Namespace("n".into()).key(), Key::Namespace);
    assert_eq!(Key::RequestBody.name(), "request.body");
    assert_eq!(Key::ResponseWriter.to_string(), "http.responsewriter");
}

#[test]
fn test_environment_parse() {
    assert_eq!(Environment::parse("hosted"), Environment::Hosted);
    assert_eq!(Environment::parse("AppEngine"), Environment::Hosted);
    assert_eq!(Environment::parse("standard"), Environment::Standard);
    assert_eq!(Environment::parse("bogus"), Environment::Standard);
    assert_eq!(Environment::Hosted.to_string(), "hosted");
}

#[test]
fn test_long_history_drops_without_overflow() {
    let mut store = Store::new();
    for i in 0..200_000u32 {
        let code = if i % 2 == 0 {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        };
        store = store.with_value(Value::ResponseCode(code));
    }
    drop(store);
}

#[test]
fn test_store_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Store>();
}

//! Late-bound model class resolution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use databind::{
    Attribute, Model, ModelAttribute, ModelClass, ModelClassRef, ModelError, ModelRegistry,
};
use serde_json::json;

use crate::support::{model, Shop};

#[test]
fn factory_runs_on_first_assignment_only() {
    let target = ModelClass::builder("app.Target")
        .attribute(Attribute::new("label"))
        .build();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let factory_target = Arc::clone(&target);
    let holder = ModelClass::builder("app.Holder")
        .attribute(Attribute::model(
            "target",
            ModelAttribute::new(ModelClassRef::by_factory(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(Arc::clone(&factory_target))
            })),
        ))
        .build();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let model = Model::new(holder).unwrap();
    model.set("target", None::<Model>).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    model.set("target", json!({"label": "a"})).unwrap();
    model.set("target", json!({"label": "b"})).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let nested = model.get("target").unwrap();
    assert!(Arc::ptr_eq(nested.as_model().unwrap().class(), &target));
}

#[test]
fn path_resolves_against_later_registration() {
    let shop = Shop::new();
    let order = model(&shop.order, json!({"customer": {"name": "Grace"}}));

    let customer = order.get("customer").unwrap();
    let customer = customer.as_model().unwrap();
    assert!(Arc::ptr_eq(customer.class(), &shop.customer));
    assert_eq!(customer.get("name").unwrap().as_scalar(), Some(&json!("Grace")));
}

#[test]
fn unregistered_path_fails_on_assignment() {
    let registry = ModelRegistry::new();
    let class = ModelClass::builder("app.Invoice")
        .attribute(Attribute::model(
            "payer",
            ModelAttribute::new(ModelClassRef::by_path(&registry, "app.Payer")),
        ))
        .build();

    let invoice = Model::new(class).unwrap();
    assert!(matches!(
        invoice.set("payer", json!({"id": 1})),
        Err(ModelError::Config(_))
    ));
}

#[test]
fn attribute_from_config() {
    let shop = Shop::new();

    let attribute = ModelAttribute::from_config(
        &shop.registry,
        json!({"model": "app.Customer", "embedded": true}).as_object().unwrap(),
    )
    .unwrap();
    assert!(attribute.is_embedded());
    assert!(!attribute.persists_id_only());
    assert!(Arc::ptr_eq(
        &attribute.resolve_model_class().unwrap(),
        &shop.customer
    ));

    let undefined =
        ModelAttribute::from_config(&shop.registry, json!({"model": null}).as_object().unwrap());
    assert!(matches!(undefined, Err(ModelError::Config(_))));

    let absent = ModelAttribute::from_config(&shop.registry, json!({}).as_object().unwrap());
    assert!(absent.unwrap().model_ref().is_none());
}

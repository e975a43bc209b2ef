//! Shared and cyclic references in converted graphs.

use databind::{Collection, ConvertError, ConvertOptions, NativeObjectConverter};
use serde_json::json;

use crate::support::Shop;

#[test]
fn cycle_back_to_root_reuses_root_output() {
    let shop = Shop::new();
    let order = shop.sample_order();
    let customer = order.get("customer").unwrap().as_model().unwrap().clone();
    customer.set("lastOrder", &order).unwrap();

    let native =
        NativeObjectConverter::convert(&(&order).into(), &ConvertOptions::new().raw(true)).unwrap();

    let root = native.as_object().unwrap();
    let customer_out = root.get("customer").unwrap();
    let last_order = customer_out.as_object().unwrap().get("lastOrder").unwrap();
    assert!(last_order.ptr_eq(&native));
}

#[test]
fn cyclic_output_cannot_render_as_json() {
    let shop = Shop::new();
    let order = shop.sample_order();
    let customer = order.get("customer").unwrap().as_model().unwrap().clone();
    customer.set("lastOrder", &order).unwrap();

    assert_eq!(
        NativeObjectConverter::convert_to_json(&(&order).into(), &ConvertOptions::new()),
        Err(ConvertError::CircularReference)
    );

    // Restricting the root to a scalar attribute sidesteps the cycle.
    let json = NativeObjectConverter::convert_to_json(
        &order.into(),
        &ConvertOptions::new().attribute_names(["number"]),
    )
    .unwrap();
    assert_eq!(json, json!({"number": "A-1"}));
}

#[test]
fn cycle_through_collection_member() {
    let shop = Shop::new();
    let order = shop.sample_order();
    let customer = order.get("customer").unwrap().as_model().unwrap().clone();
    customer.set("lastOrder", &order).unwrap();

    let orders = Collection::with_models(Some(shop.order.clone()), vec![order]);
    let native =
        NativeObjectConverter::convert(&orders.into(), &ConvertOptions::new().raw(true)).unwrap();

    let first = native.as_array().unwrap().get(0).unwrap();
    let last_order = first
        .as_object()
        .unwrap()
        .get("customer")
        .unwrap()
        .as_object()
        .unwrap()
        .get("lastOrder")
        .unwrap();
    assert!(last_order.ptr_eq(&first));
}

#[test]
fn shared_customer_is_converted_once() {
    let shop = Shop::new();
    let ada = shop.customer(json!({"id": 7, "name": "Ada"}));
    let first = shop.order(json!({"id": 1}));
    let second = shop.order(json!({"id": 2}));
    first.set("customer", &ada).unwrap();
    second.set("customer", &ada).unwrap();

    let orders = Collection::with_models(None, vec![first, second]);
    let native = NativeObjectConverter::convert(&orders.into(), &ConvertOptions::new()).unwrap();
    let array = native.as_array().unwrap();

    let a = array.get(0).unwrap().as_object().unwrap().get("customer").unwrap();
    let b = array.get(1).unwrap().as_object().unwrap().get("customer").unwrap();
    assert!(a.ptr_eq(&b));
    assert_eq!(native.to_json().unwrap()[1]["customer"]["name"], json!("Ada"));
}

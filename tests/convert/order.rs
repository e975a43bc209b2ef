//! The order scenario: a related customer and a related line-item collection.

use databind::{ConvertOptions, Model, ModelError, NativeObjectConverter};
use serde_json::json;

use crate::support::Shop;

#[test]
fn raw_collapses_related_collection_to_ids() {
    let shop = Shop::new();
    let order = shop.sample_order();

    let json =
        NativeObjectConverter::convert_to_json(&order.into(), &ConvertOptions::new().raw(true))
            .unwrap();

    assert_eq!(
        json,
        json!({
            "id": 10,
            "number": "A-1",
            "note": "leave at door",
            "customer": {"id": 7, "name": "Ada", "lastOrder": null},
            "lineItems": [{"id": 1}, {"id": 2}],
        })
    );
}

#[test]
fn non_raw_converts_line_items_in_full() {
    let shop = Shop::new();
    let order = shop.sample_order();

    let json =
        NativeObjectConverter::convert_to_json(&order.into(), &ConvertOptions::new()).unwrap();

    assert_eq!(
        json["lineItems"],
        json!([
            {"id": 1, "sku": "tea", "quantity": 2},
            {"id": 2, "sku": "mug", "quantity": 1},
        ])
    );
}

#[test]
fn persisted_only_omits_transient_attributes() {
    let shop = Shop::new();
    let order = shop.sample_order();

    let persisted = NativeObjectConverter::convert_to_json(
        &(&order).into(),
        &ConvertOptions::new().persisted_only(true),
    )
    .unwrap();
    assert!(persisted.get("note").is_none());
    assert_eq!(persisted["number"], json!("A-1"));

    let all =
        NativeObjectConverter::convert_to_json(&order.into(), &ConvertOptions::new()).unwrap();
    assert_eq!(all["note"], json!("leave at door"));
}

#[test]
fn attribute_names_only_restrict_the_root() {
    let shop = Shop::new();
    let order = shop.sample_order();

    let json = NativeObjectConverter::convert_to_json(
        &order.into(),
        &ConvertOptions::new().attribute_names(["customer"]),
    )
    .unwrap();

    assert_eq!(
        json,
        json!({"customer": {"id": 7, "name": "Ada", "lastOrder": null}})
    );
}

#[test]
fn options_load_from_json() {
    let shop = Shop::new();
    let order = shop.sample_order();
    let options: ConvertOptions =
        serde_json::from_value(json!({"raw": true, "persistedOnly": true})).unwrap();

    let json = NativeObjectConverter::convert_to_json(&order.into(), &options).unwrap();
    assert!(json.get("note").is_none());
    assert_eq!(json["lineItems"], json!([{"id": 1}, {"id": 2}]));
}

#[test]
fn line_item_collection_converts_to_array() {
    let shop = Shop::new();
    let order = shop.sample_order();
    let items = order.get("lineItems").unwrap();
    let items = items.as_collection().unwrap();

    let json =
        NativeObjectConverter::convert_to_json(&items.into(), &ConvertOptions::new().raw(true))
            .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["sku"], json!("mug"));
}

#[test]
fn identical_customer_instance_is_still_a_change() {
    let shop = Shop::new();
    let order = shop.sample_order();
    order.commit().unwrap();

    let current = order.get("customer").unwrap().as_model().unwrap().clone();
    assert!(!order.set("customer", &current).unwrap());
    assert!(!order.is_modified().unwrap());

    let twin = shop.customer(json!({"id": 7, "name": "Ada"}));
    assert!(order.set("customer", twin).unwrap());
    assert!(order.is_modified_attr("customer").unwrap());
}

#[test]
fn customer_slot_rejects_other_classes() {
    let shop = Shop::new();
    let order = shop.sample_order();
    let other = shop.order(json!({"id": 11}));

    assert!(matches!(
        order.set("customer", other),
        Err(ModelError::DataIntegrity { .. })
    ));
    assert!(matches!(
        order.set("customer", "c1"),
        Err(ModelError::DataIntegrity { .. })
    ));
    assert!(order.set("customer", None::<Model>).unwrap());
}

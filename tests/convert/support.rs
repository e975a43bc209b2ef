//! Test domain: orders, customers, and line items wired through a registry.

#![allow(dead_code)]

use std::sync::Arc;

use databind::{
    Attribute, CollectionAttribute, Model, ModelAttribute, ModelClass, ModelClassRef,
    ModelRegistry,
};
use serde_json::{json, Value};

pub struct Shop {
    pub registry: ModelRegistry,
    pub order: Arc<ModelClass>,
    pub customer: Arc<ModelClass>,
    pub line_item: Arc<ModelClass>,
}

impl Shop {
    /// Classes reference each other by path, so `app.Order` is registered
    /// before `app.Customer` exists.
    pub fn new() -> Self {
        let registry = ModelRegistry::new();

        let order = registry
            .register(
                ModelClass::builder("app.Order")
                    .attribute(Attribute::new("number"))
                    .attribute(Attribute::new("note").persist(false))
                    .attribute(Attribute::model(
                        "customer",
                        ModelAttribute::new(ModelClassRef::by_path(&registry, "app.Customer")),
                    ))
                    .attribute(Attribute::collection(
                        "lineItems",
                        CollectionAttribute::new(ModelClassRef::by_path(
                            &registry,
                            "app.LineItem",
                        )),
                    ))
                    .build(),
            )
            .unwrap();

        let customer = registry
            .register(
                ModelClass::builder("app.Customer")
                    .attribute(Attribute::new("name"))
                    .attribute(Attribute::model(
                        "lastOrder",
                        ModelAttribute::new(ModelClassRef::by_path(&registry, "app.Order")),
                    ))
                    .build(),
            )
            .unwrap();

        let line_item = registry
            .register(
                ModelClass::builder("app.LineItem")
                    .attribute(Attribute::new("sku"))
                    .attribute(Attribute::new("quantity"))
                    .build(),
            )
            .unwrap();

        Shop {
            registry,
            order,
            customer,
            line_item,
        }
    }

    pub fn order(&self, data: Value) -> Model {
        model(&self.order, data)
    }

    pub fn customer(&self, data: Value) -> Model {
        model(&self.customer, data)
    }

    /// Order #A-1 for Ada with two line items.
    pub fn sample_order(&self) -> Model {
        self.order(json!({
            "id": 10,
            "number": "A-1",
            "note": "leave at door",
            "customer": {"id": 7, "name": "Ada"},
            "lineItems": [
                {"id": 1, "sku": "tea", "quantity": 2},
                {"id": 2, "sku": "mug", "quantity": 1},
            ],
        }))
    }
}

pub fn model(class: &Arc<ModelClass>, data: Value) -> Model {
    Model::from_data(Arc::clone(class), data.as_object().unwrap()).unwrap()
}

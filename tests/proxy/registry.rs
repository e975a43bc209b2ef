//! Polymorphic proxy construction through the registry.

use std::sync::Arc;

use databind::{Proxy, ProxyConfig, ProxyError, ProxyRegistry, ReadOperation};
use serde_json::json;

use crate::support::SlowProxy;

#[test]
fn duplicate_names_are_rejected_but_shared_factories_are_fine() {
    let registry = ProxyRegistry::with_defaults().unwrap();

    registry.register("slow", SlowProxy::from_config).unwrap();
    registry.register("rest", SlowProxy::from_config).unwrap();

    assert_eq!(
        registry.register("slow", SlowProxy::from_config),
        Err(ProxyError::AlreadyRegistered("slow".into()))
    );
    assert_eq!(
        registry.register("memory", SlowProxy::from_config),
        Err(ProxyError::AlreadyRegistered("memory".into()))
    );
}

#[test]
fn unknown_type_is_an_error() {
    let registry = ProxyRegistry::with_defaults().unwrap();
    assert_eq!(
        registry.create(ProxyConfig::new("unknown")).err(),
        Some(ProxyError::UnknownType("unknown".into()))
    );
}

#[test]
fn existing_instance_passes_through() {
    let registry = ProxyRegistry::new();
    let proxy: Arc<dyn Proxy> = Arc::new(SlowProxy::new(Default::default()));

    let created = registry.create(&proxy).unwrap();
    assert!(Arc::ptr_eq(&created, &proxy));
}

#[test]
fn config_from_json_builds_seeded_memory_proxy() {
    let registry = ProxyRegistry::with_defaults().unwrap();
    let config: ProxyConfig = serde_json::from_value(json!({
        "type": "MEMORY",
        "data": [{"id": "t1", "title": "write tests"}],
    }))
    .unwrap();

    let proxy = registry.create(config).unwrap();
    let op = proxy.read(ReadOperation::for_model("t1")).wait().unwrap();
    assert!(op.was_successful());
    assert_eq!(
        op.result_set().unwrap().records()[0]["title"],
        json!("write tests")
    );
}

#[test]
fn factory_config_errors_surface() {
    let registry = ProxyRegistry::new();
    registry.register("slow", SlowProxy::from_config).unwrap();

    let config = ProxyConfig::new("slow").with_option("delayMs", "soon");
    assert!(matches!(
        registry.create(config).err(),
        Some(ProxyError::InvalidConfig(_))
    ));
}

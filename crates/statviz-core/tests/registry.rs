use statviz_core::{BackendMode, CoreError, ServiceConfig, ServiceRegistry};

#[test]
fn global_registry_initializes_once() {
    assert!(ServiceRegistry::global().is_none());

    let mut config = ServiceConfig::default();
    config.backend.mode = BackendMode::Mock;
    let registry = ServiceRegistry::init(config.clone()).expect("first init");
    assert_eq!(registry.backend().name(), "mock");

    let global = ServiceRegistry::global().expect("installed");
    assert!(std::ptr::eq(registry, global));

    let err = ServiceRegistry::init(config).expect_err("second init");
    assert!(matches!(err, CoreError::AlreadyInitialized));
}

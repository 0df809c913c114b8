/// Unit tests for DiError, ArgumentError and DiResult
use arbor_di::{ArgumentError, Container, DiError, DiResult, Resolver};
use std::error::Error;

#[test]
fn test_error_display_resolution_failed() {
    let error = DiError::ResolutionFailed {
        type_name: "app::Mailer",
        name: None,
    };
    assert_eq!(error.to_string(), "Cannot resolve app::Mailer with name <none>");

    let named = DiError::ResolutionFailed {
        type_name: "app::Mailer",
        name: Some("backup".to_string()),
    };
    assert_eq!(named.to_string(), "Cannot resolve app::Mailer with name backup");
    assert!(named.is_not_found());
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("alloc::string::String");
    assert_eq!(error.to_string(), "Type mismatch for: alloc::string::String");
    assert!(!error.is_not_found());
}

#[test]
fn test_error_display_circular() {
    let error = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
    assert_eq!(
        error.to_string(),
        "Circular dependency: ServiceA -> ServiceB -> ServiceA"
    );
}

#[test]
fn test_error_display_depth_exceeded() {
    assert_eq!(DiError::DepthExceeded(100).to_string(), "Max depth 100 exceeded");
}

#[test]
fn test_error_display_disposed_and_invalid_argument() {
    let disposed = DiError::Disposed {
        container: "app/request".to_string(),
    };
    assert_eq!(disposed.to_string(), "Container app/request has been disposed");

    let invalid = DiError::InvalidArgument("service name must not be empty".to_string());
    assert_eq!(
        invalid.to_string(),
        "Invalid argument: service name must not be empty"
    );
}

#[test]
fn test_construction_failures_keep_their_source() {
    let error = DiError::construction::<u32>(ArgumentError::Missing { index: 1, name: "port" });
    assert_eq!(
        error.to_string(),
        "Construction of u32 failed: argument 1 (port) could not be resolved"
    );

    let source = error.source().unwrap();
    assert_eq!(
        source.downcast_ref::<ArgumentError>(),
        Some(&ArgumentError::Missing { index: 1, name: "port" })
    );
}

#[test]
fn test_argument_error_display() {
    let mismatch = ArgumentError::TypeMismatch {
        index: 0,
        name: "clock",
        expected: "dyn app::Clock",
    };
    assert_eq!(mismatch.to_string(), "argument 0 (clock) is not a dyn app::Clock");
    assert_eq!(
        ArgumentError::OutOfRange(4).to_string(),
        "constructor has no argument 4"
    );
}

#[test]
fn test_strict_and_lenient_calls_agree_on_not_found() {
    let container = Container::new();
    let lenient: DiResult<Option<_>> = container.try_resolve::<String>();
    assert!(lenient.unwrap().is_none());

    match container.resolve_named::<String>("missing") {
        Err(DiError::ResolutionFailed { type_name, name }) => {
            assert_eq!(type_name, "alloc::string::String");
            assert_eq!(name.as_deref(), Some("missing"));
        }
        other => panic!("unexpected: {:?}", other.err()),
    }
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<DiError>();
    assert_send_sync::<ArgumentError>();
}

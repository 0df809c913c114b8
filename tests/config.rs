#![cfg(feature = "config")]

use arbor_di::{ContainerBuilder, ContainerOptions, Resolver};

#[test]
fn options_deserialize_with_defaults_for_missing_fields() {
    let options: ContainerOptions = serde_json::from_str(r#"{ "name": "api" }"#).unwrap();
    assert_eq!(options.name.as_deref(), Some("api"));
    assert_eq!(options.max_depth, ContainerOptions::default().max_depth);
    assert!(!options.trace);

    let empty: ContainerOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, ContainerOptions::default());
}

#[test]
fn options_round_trip_through_json() {
    let options = ContainerOptions {
        name: Some("worker".to_string()),
        max_depth: 32,
        trace: true,
    };
    let json = serde_json::to_value(&options).unwrap();
    assert_eq!(json["max_depth"], 32);
    assert_eq!(json["trace"], true);

    let back: ContainerOptions = serde_json::from_value(json).unwrap();
    assert_eq!(back, options);
}

#[test]
fn deserialized_options_configure_the_tree() {
    let options: ContainerOptions =
        serde_json::from_str(r#"{ "name": "svc", "max_depth": 8 }"#).unwrap();
    let root = ContainerBuilder::new().options(options).build();
    root.register_value(1u8).unwrap();

    let child = root.create_named_child("job").unwrap();
    assert_eq!(child.name(), Some("svc/job"));
    assert_eq!(child.options().max_depth, 8);
    assert_eq!(*child.resolve::<u8>().unwrap(), 1);
}

use arbor_di::{
    implements, Binding, Constructor, Container, DiError, Lifetime, Parameter, RegistrationKind,
    Resolvable, Resolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Animal: Send + Sync {
    fn sound(&self) -> &'static str;
}
impl Resolvable for dyn Animal {}

struct Dog;
impl Animal for Dog {
    fn sound(&self) -> &'static str {
        "woof"
    }
}
impl Resolvable for Dog {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::new([], |_| Ok(Dog))]
    }
}
implements!(Dog => dyn Animal);

struct Cat;
impl Animal for Cat {
    fn sound(&self) -> &'static str {
        "meow"
    }
}
impl Resolvable for Cat {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::new([], |_| Ok(Cat))]
    }
}
implements!(Cat => dyn Animal);

struct Owner {
    pet: Arc<dyn Animal>,
    nickname: Option<Arc<String>>,
}
impl Resolvable for Owner {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::new(
            [Parameter::of::<dyn Animal>("pet"), Parameter::of::<String>("nickname")],
            |args| {
                Ok(Owner {
                    pet: args.get::<dyn Animal>(0)?,
                    nickname: args.optional::<String>(1)?,
                })
            },
        )]
    }
}

#[test]
fn instance_registration_returns_the_same_value() {
    let container = Container::new();
    let dog: Arc<dyn Animal> = Arc::new(Dog);
    container.register_instance(dog.clone()).unwrap();

    let resolved = container.resolve::<dyn Animal>().unwrap();
    assert!(Arc::ptr_eq(&resolved, &dog));
    assert_eq!(resolved.sound(), "woof");
}

#[test]
fn type_mapping_builds_a_new_value_per_request() {
    let container = Container::new();
    container.register_type::<dyn Animal, Cat>().unwrap();

    let a = container.resolve::<dyn Animal>().unwrap();
    let b = container.resolve::<dyn Animal>().unwrap();
    assert_eq!(a.sound(), "meow");
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn singleton_type_mapping_is_built_once() {
    let container = Container::new();
    container.register_singleton_type::<dyn Animal, Cat>().unwrap();

    let a = container.resolve::<dyn Animal>().unwrap();
    let b = container.resolve::<dyn Animal>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn factories_run_per_request_unless_singleton() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    let counter = calls.clone();
    container
        .register_factory::<u64, _>(move |_| Ok(Arc::new(counter.fetch_add(1, Ordering::SeqCst) as u64)))
        .unwrap();
    assert_eq!(*container.resolve::<u64>().unwrap(), 0);
    assert_eq!(*container.resolve::<u64>().unwrap(), 1);

    let counter = calls.clone();
    container
        .register_singleton_factory::<String, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new("cached".to_string()))
        })
        .unwrap();
    let a = container.resolve::<String>().unwrap();
    let b = container.resolve::<String>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn named_registrations_are_separate_slots() {
    let container = Container::new();
    container.register_type::<dyn Animal, Dog>().unwrap();
    container.register_named_type::<dyn Animal, Cat>("cat").unwrap();

    assert_eq!(container.resolve::<dyn Animal>().unwrap().sound(), "woof");
    assert_eq!(container.resolve_named::<dyn Animal>("cat").unwrap().sound(), "meow");
    assert!(container.try_resolve_named::<dyn Animal>("horse").unwrap().is_none());

    match container.resolve_named::<dyn Animal>("horse") {
        Err(DiError::ResolutionFailed { name, .. }) => assert_eq!(name.as_deref(), Some("horse")),
        other => panic!("unexpected: {:?}", other.err()),
    }
}

#[test]
fn re_registering_replaces_the_local_registration() {
    let container = Container::new();
    container.register_type::<dyn Animal, Dog>().unwrap();
    container.register_type::<dyn Animal, Cat>().unwrap();
    assert_eq!(container.resolve::<dyn Animal>().unwrap().sound(), "meow");
}

#[test]
fn unregistered_types_are_auto_wired() {
    let container = Container::new();
    container.register_type::<dyn Animal, Dog>().unwrap();

    let owner = container.resolve::<Owner>().unwrap();
    assert_eq!(owner.pet.sound(), "woof");
    assert!(owner.nickname.is_none());

    container.register_value(String::from("Rex")).unwrap();
    let owner = container.resolve::<Owner>().unwrap();
    assert_eq!(owner.nickname.as_deref().map(String::as_str), Some("Rex"));
}

#[test]
fn missing_required_parameter_fails_construction() {
    let container = Container::new();
    match container.resolve::<Owner>() {
        Err(DiError::ConstructionFailed { type_name, .. }) => assert!(type_name.ends_with("Owner")),
        other => panic!("unexpected: {:?}", other.err()),
    }
}

#[test]
fn types_without_constructors_are_not_found() {
    let container = Container::new();
    assert!(container.try_resolve::<dyn Animal>().unwrap().is_none());
    assert!(container.resolve::<dyn Animal>().err().is_some_and(|e| e.is_not_found()));
    assert!(container.try_resolve::<u32>().unwrap().is_none());
}

struct Gauge(&'static str);
impl Resolvable for Gauge {
    fn constructors() -> Vec<Constructor> {
        vec![
            Constructor::new([Parameter::of::<u32>("a"), Parameter::of::<u32>("b")], |_| {
                Ok(Gauge("two"))
            }),
            Constructor::new([], |_| Ok(Gauge("none"))),
            Constructor::new([Parameter::of::<u32>("a")], |_| Ok(Gauge("one"))),
        ]
    }
}

struct Marked(&'static str);
impl Resolvable for Marked {
    fn constructors() -> Vec<Constructor> {
        vec![
            Constructor::new([], |_| Ok(Marked("default"))),
            Constructor::new([Parameter::of::<u32>("level")], |args| {
                Ok(Marked(if args.optional::<u32>(0)?.is_some() { "level" } else { "unset" }))
            })
            .preferred(),
        ]
    }
}

#[test]
fn constructor_selection_prefers_marked_then_fewest_parameters() {
    let container = Container::new();
    assert_eq!(container.resolve::<Gauge>().unwrap().0, "none");
    assert_eq!(container.resolve::<Marked>().unwrap().0, "unset");

    container.register_value(3u32).unwrap();
    assert_eq!(container.resolve::<Marked>().unwrap().0, "level");
}

#[test]
fn create_instance_bypasses_registrations_for_the_type() {
    let container = Container::new();
    let registered = Arc::new(Dog);
    container.register_instance(registered.clone()).unwrap();

    let fresh = container.create_instance::<Dog>(&[]).unwrap();
    assert!(!Arc::ptr_eq(&fresh, &registered));
    assert!(Arc::ptr_eq(&container.resolve::<Dog>().unwrap(), &registered));
}

#[test]
fn every_container_resolves_itself() {
    let root = Container::new();
    let child = root.create_child().unwrap();

    assert!(root.resolve::<Container>().unwrap().same(&root));
    assert!(child.resolve::<Container>().unwrap().same(&child));
    assert!(child.can_resolve_locally::<Container>(None).unwrap());
}

#[test]
fn can_resolve_reports_registrations_only() {
    let root = Container::new();
    root.register_type::<dyn Animal, Dog>().unwrap();
    let child = root.create_child().unwrap();

    assert!(child.can_resolve::<dyn Animal>().unwrap());
    assert!(!child.can_resolve_locally::<dyn Animal>(None).unwrap());
    assert!(!child.can_resolve::<Owner>().unwrap());
    assert!(child.resolve::<Owner>().is_ok());
}

#[test]
fn empty_names_are_rejected() {
    let container = Container::new();
    assert!(matches!(
        container.register(Binding::<u32>::instance(Arc::new(1)).named("")),
        Err(DiError::InvalidArgument(_))
    ));
    assert!(matches!(container.resolve_named::<u32>(""), Err(DiError::InvalidArgument(_))));
    assert!(matches!(container.create_named_child(""), Err(DiError::InvalidArgument(_))));
}

#[test]
fn registrations_describe_local_state() {
    let container = Container::new();
    container.register_singleton_type::<dyn Animal, Dog>().unwrap();

    let info = container
        .registrations()
        .unwrap()
        .into_iter()
        .find(|r| r.kind == RegistrationKind::Type)
        .unwrap();
    assert_eq!(info.lifetime, Lifetime::Singleton);
    assert!(!info.materialized);
    assert!(info.concrete_type.unwrap().ends_with("Dog"));

    container.resolve::<dyn Animal>().unwrap();
    let info = container
        .registrations()
        .unwrap()
        .into_iter()
        .find(|r| r.kind == RegistrationKind::Type)
        .unwrap();
    assert!(info.materialized);
}

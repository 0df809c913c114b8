use arbor_di::{
    implements, Binding, Constructor, Container, ContainerBuilder, Parameter, Resolvable, Resolver,
};
use std::sync::Arc;

trait Clock: Send + Sync {
    fn zone(&self) -> String;
}
impl Resolvable for dyn Clock {}

struct ZoneClock {
    zone: Arc<String>,
}
impl Clock for ZoneClock {
    fn zone(&self) -> String {
        self.zone.to_string()
    }
}
impl Resolvable for ZoneClock {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::new([Parameter::of::<String>("zone")], |args| {
            Ok(ZoneClock { zone: args.get::<String>(0)? })
        })]
    }
}
implements!(ZoneClock => dyn Clock);

#[test]
fn children_fall_back_to_ancestors() {
    let root = Container::new();
    root.register_value(String::from("UTC")).unwrap();
    let child = root.create_child().unwrap();
    let grandchild = child.create_child().unwrap();

    assert_eq!(*grandchild.resolve::<String>().unwrap(), "UTC");
    assert!(grandchild.root().same(&root));
    assert!(grandchild.parent().unwrap().same(&child));
}

#[test]
fn parents_never_see_child_registrations() {
    let root = Container::new();
    let child = root.create_child().unwrap();
    child.register_value(String::from("child only")).unwrap();

    assert!(root.try_resolve::<String>().unwrap().is_none());
    assert!(!root.can_resolve::<String>().unwrap());
}

#[test]
fn siblings_are_isolated() {
    let root = Container::new();
    let left = root.create_child().unwrap();
    let right = root.create_child().unwrap();
    left.register_value(1u8).unwrap();

    assert!(right.try_resolve::<u8>().unwrap().is_none());
}

#[test]
fn local_registrations_shadow_ancestors() {
    let root = Container::new();
    root.register_value(String::from("root")).unwrap();
    let child = root.create_child().unwrap();
    child.register_value(String::from("child")).unwrap();

    assert_eq!(*child.resolve::<String>().unwrap(), "child");
    assert_eq!(*root.resolve::<String>().unwrap(), "root");
}

#[test]
fn inherited_type_mappings_wire_from_the_requesting_container() {
    let root = Container::new();
    root.register_value(String::from("UTC")).unwrap();
    root.register_type::<dyn Clock, ZoneClock>().unwrap();

    let tokyo = root.create_child().unwrap();
    tokyo.register_value(String::from("JST")).unwrap();

    assert_eq!(root.resolve::<dyn Clock>().unwrap().zone(), "UTC");
    assert_eq!(tokyo.resolve::<dyn Clock>().unwrap().zone(), "JST");
}

#[test]
fn inherited_factories_receive_the_requesting_container() {
    let root = Container::new();
    root.register(Binding::<String>::factory(|c| {
        Ok(Arc::new(c.name().unwrap_or("unnamed").to_string()))
    }))
    .unwrap();

    let worker = ContainerBuilder::new().name("app").build();
    worker
        .register(Binding::<String>::factory(|c| Ok(Arc::new(c.to_string()))))
        .unwrap();
    let job = worker.create_named_child("job").unwrap();

    assert_eq!(*job.resolve::<String>().unwrap(), "app/job");
    let unnamed = root.create_child().unwrap();
    assert_eq!(*unnamed.resolve::<String>().unwrap(), "unnamed");
}

#[test]
fn inherited_singletons_are_shared_across_the_tree() {
    let root = Container::new();
    root.register_value(String::from("UTC")).unwrap();
    root.register(Binding::<dyn Clock>::to::<ZoneClock>().singleton()).unwrap();

    let a = root.create_child().unwrap();
    let b = root.create_child().unwrap();
    a.register_value(String::from("CET")).unwrap();

    let from_a = a.resolve::<dyn Clock>().unwrap();
    let from_b = b.resolve::<dyn Clock>().unwrap();
    assert!(Arc::ptr_eq(&from_a, &from_b));
    assert_eq!(from_b.zone(), "CET");
}

#[test]
fn child_names_and_options_are_inherited() {
    let root = ContainerBuilder::new().name("app").max_depth(64).build();
    let plain = root.create_child().unwrap();
    let named = root.create_named_child("request").unwrap();

    assert_eq!(plain.name(), Some("app"));
    assert_eq!(named.name(), Some("app/request"));
    assert_eq!(named.options().max_depth, 64);
    assert_ne!(plain.id(), named.id());
}

#[test]
fn disposing_a_parent_leaves_children_usable_for_their_own_registrations() {
    let root = Container::new();
    root.register_value(String::from("root")).unwrap();
    let child = root.create_child().unwrap();
    child.register_value(5u16).unwrap();

    root.dispose();
    assert_eq!(*child.resolve::<u16>().unwrap(), 5);
    assert!(child.try_resolve::<String>().is_err());
}

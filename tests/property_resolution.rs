/// Property-based tests for resolution through the container tree
///
/// These tests check that lookup follows the tree the same way for any shape
/// of chain and any placement of registrations.
use arbor_di::{Binding, Container, Resolver};
use proptest::prelude::*;
use std::sync::Arc;

/// Builds a chain of `depth` containers below a root; index 0 is the root.
fn chain(depth: usize) -> Vec<Container> {
    let mut chain = vec![Container::new()];
    for _ in 0..depth {
        let child = chain[chain.len() - 1].create_child().unwrap();
        chain.push(child);
    }
    chain
}

proptest! {
    #[test]
    fn nearest_registration_wins(
        depth in 1usize..6,
        placements in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let chain = chain(depth);
        for (level, container) in chain.iter().enumerate() {
            if placements[level] {
                container.register_value(level as u64).unwrap();
            }
        }

        for (level, container) in chain.iter().enumerate() {
            let expected = (0..=level).rev().find(|l| placements[*l]).map(|l| l as u64);
            let resolved = container.try_resolve::<u64>().unwrap().map(|v| *v);
            prop_assert_eq!(resolved, expected);
        }
    }
}

proptest! {
    #[test]
    fn named_and_unnamed_slots_never_mix(
        name in "[a-z]{1,12}",
        value in any::<i64>(),
        depth in 0usize..4,
    ) {
        let chain = chain(depth);
        chain[0]
            .register(Binding::<i64>::instance(Arc::new(value)).named(name.clone()))
            .unwrap();
        let leaf = &chain[chain.len() - 1];

        prop_assert!(leaf.try_resolve::<i64>().unwrap().is_none());
        prop_assert_eq!(*leaf.resolve_named::<i64>(&name).unwrap(), value);
        prop_assert!(leaf.can_resolve_named::<i64>(&name).unwrap());
        prop_assert_eq!(leaf.can_resolve_locally::<i64>(Some(name.as_str())).unwrap(), depth == 0);
    }
}

proptest! {
    #[test]
    fn singletons_are_shared_by_every_descendant(depth in 1usize..6, text in "\\PC{0,40}") {
        let chain = chain(depth);
        let seed = text.clone();
        chain[0]
            .register(Binding::<String>::factory(move |_| Ok(Arc::new(seed.clone()))).singleton())
            .unwrap();

        let values: Vec<_> = chain.iter().rev().map(|c| c.resolve::<String>().unwrap()).collect();
        prop_assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
        prop_assert_eq!(values[0].as_str(), text.as_str());
    }
}

proptest! {
    #[test]
    fn disposing_any_level_only_affects_that_level(depth in 1usize..6, victim in 0usize..6) {
        let chain = chain(depth);
        let victim = victim % chain.len();
        for (level, container) in chain.iter().enumerate() {
            container.register_value(level as u32).unwrap();
        }

        chain[victim].dispose();

        for (level, container) in chain.iter().enumerate() {
            let result = container.try_resolve::<u32>();
            if level == victim {
                prop_assert!(result.is_err());
            } else {
                prop_assert_eq!(result.unwrap().map(|v| *v), Some(level as u32));
            }
        }
    }
}

proptest! {
    #[test]
    fn transients_are_distinct_and_instances_identical(count in 2usize..8, value in any::<u16>()) {
        let container = Container::new();
        container.register_factory::<u64, _>(|_| Ok(Arc::new(1))).unwrap();
        let fixed = Arc::new(value);
        container.register_instance(fixed.clone()).unwrap();

        let transients: Vec<_> = (0..count).map(|_| container.resolve::<u64>().unwrap()).collect();
        for (i, a) in transients.iter().enumerate() {
            for b in &transients[i + 1..] {
                prop_assert!(!Arc::ptr_eq(a, b));
            }
            prop_assert!(Arc::ptr_eq(&container.resolve::<u16>().unwrap(), &fixed));
        }
    }
}

struct Pair {
    left: Arc<String>,
    right: Arc<String>,
}

impl arbor_di::Resolvable for Pair {
    fn constructors() -> Vec<arbor_di::Constructor> {
        use arbor_di::{Constructor, Parameter};
        vec![Constructor::new(
            [Parameter::of::<String>("left"), Parameter::of::<String>("right")],
            |args| {
                Ok(Pair {
                    left: args.get::<String>(0)?,
                    right: args.get::<String>(1)?,
                })
            },
        )]
    }
}

proptest! {
    #[test]
    fn the_first_matching_override_supplies_each_parameter(
        by_name in "[a-z]{1,8}",
        by_type in "[A-Z]{1,8}",
        by_shape in "[0-9]{1,8}",
        shape_has_right in any::<bool>(),
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
    ) {
        use arbor_di::{Fields, ParameterOverride};

        // Every override matches `left`; only the type and maybe the shape match `right`.
        let mut shape = Fields::new().with("left", by_shape.clone());
        if shape_has_right {
            shape = shape.with("right", by_shape.clone());
        }
        let overrides: Vec<_> = order
            .iter()
            .map(|kind| match *kind {
                0 => ParameterOverride::by_name("left", by_name.clone()),
                1 => ParameterOverride::by_type(by_type.clone()),
                _ => ParameterOverride::by_shape(shape.clone()),
            })
            .collect();
        let supplied = |kind: usize| match kind {
            0 => &by_name,
            1 => &by_type,
            _ => &by_shape,
        };

        let pair = Container::new().resolve_with::<Pair>(&overrides).unwrap();
        let expected_left = supplied(order[0]);
        let expected_right = order
            .iter()
            .copied()
            .find(|&kind| kind == 1 || (kind == 2 && shape_has_right))
            .map(supplied)
            .unwrap();
        prop_assert_eq!(pair.left.as_str(), expected_left.as_str());
        prop_assert_eq!(pair.right.as_str(), expected_right.as_str());
    }
}

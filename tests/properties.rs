//! Property tests for the variable table and vector arithmetic.

use proptest::prelude::*;
use rustc_hash::FxHashMap;

use tritone::{interpreter::environment::Environment, vector::Vector};

fn name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9]{0,7}").unwrap()
}

fn any_vector() -> impl Strategy<Value = Vector> {
    (any::<f32>(), any::<f32>(), any::<f32>()).prop_map(|(i, j, k)| Vector::new(i, j, k))
}

/// Integer-valued components keep every sum and product exact.
fn small_vector() -> impl Strategy<Value = Vector> {
    (-1000i32..1000, -1000i32..1000, -1000i32..1000)
        .prop_map(|(i, j, k)| Vector::new(i as f32, j as f32, k as f32))
}

fn bits(vector: Vector) -> [u32; 3] {
    [vector.i.to_bits(), vector.j.to_bits(), vector.k.to_bits()]
}

proptest! {
    #[test]
    fn insert_then_lookup_is_bit_exact(name in name(), vector in any_vector()) {
        let mut environment = Environment::new();
        environment.insert(&name, vector).unwrap();
        let stored = environment.get(&name).unwrap();
        prop_assert_eq!(bits(stored), bits(vector));
    }

    #[test]
    fn table_matches_model(inserts in prop::collection::vec((name(), small_vector()), 0..200)) {
        let mut environment = Environment::new();
        let mut model = FxHashMap::default();

        for (name, vector) in &inserts {
            environment.insert(name, *vector).unwrap();
            model.insert(name.clone(), *vector);

            prop_assert!(environment.load_factor() <= 0.70);
            prop_assert_eq!(environment.len(), model.len());
        }

        for (name, vector) in &model {
            prop_assert_eq!(environment.get(name), Some(*vector));
        }
        prop_assert_eq!(environment.iter().count(), model.len());
    }

    #[test]
    fn reinsert_keeps_size(name in name(), first in small_vector(), second in small_vector()) {
        let mut environment = Environment::new();
        environment.insert(&name, first).unwrap();
        environment.insert(&name, second).unwrap();
        prop_assert_eq!(environment.len(), 1);
        prop_assert_eq!(environment.get(&name), Some(second));
    }

    #[test]
    fn addition_is_associative(a in small_vector(), b in small_vector(), c in small_vector()) {
        prop_assert_eq!((a + b) + c, a + (b + c));
        prop_assert_eq!(a - b, -(b - a));
    }

    #[test]
    fn dot_is_commutative(a in small_vector(), b in small_vector()) {
        prop_assert_eq!(a.dot(b), b.dot(a));
    }

    #[test]
    fn cross_is_anticommutative(a in small_vector(), b in small_vector()) {
        prop_assert_eq!(a.cross(b), -(b.cross(a)));
    }
}

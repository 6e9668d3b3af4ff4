use std::{collections::TryReserveError, fmt::Debug};

use log::debug;
use uuid::Uuid;

use crate::vector::Vector;

pub const INITIAL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub vector: Vector,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Could not grow variable table to {capacity} slots: {source}")]
    Resize {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("Variable table is full")]
    Full,
}

/// Open-addressing table of named vectors with linear probing.
///
/// Entries are never removed one at a time, so every live key sits on an
/// unbroken probe chain starting at its home slot. The table doubles before
/// adding a new name would push the load factor past 0.70; overwriting an
/// existing name never grows it.
#[derive(Clone)]
pub struct Environment {
    slots: Vec<Option<Entry>>,
    size: usize,
}

/// djb2: `hash * 33 + byte`, seeded with 5381.
pub fn hash(name: &str) -> u64 {
    name.bytes()
        .fold(5381u64, |hash, byte| {
            hash.wrapping_mul(33).wrapping_add(u64::from(byte))
        })
}

// size / capacity > 0.70
fn exceeds_load_factor(size: usize, capacity: usize) -> bool {
    size * 10 > capacity * 7
}

impl Environment {
    pub fn new() -> Self {
        Self {
            slots: vec![None; INITIAL_CAPACITY],
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.slots.len() as f64
    }

    pub fn insert(&mut self, name: &str, vector: Vector) -> Result<(), EnvironmentError> {
        let mut index = self.probe(name).ok_or(EnvironmentError::Full)?;
        if let Some(entry) = &mut self.slots[index] {
            entry.vector = vector;
            return Ok(());
        }

        if exceeds_load_factor(self.size + 1, self.slots.len()) {
            self.resize(self.slots.len() * 2)?;
            index = self.probe(name).ok_or(EnvironmentError::Full)?;
        }

        self.slots[index] = Some(Entry {
            name: name.to_string(),
            vector,
        });
        self.size += 1;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        let index = self.probe(name)?;
        self.slots[index].as_ref()
    }

    pub fn get(&self, name: &str) -> Option<Vector> {
        self.lookup(name).map(|entry| entry.vector)
    }

    /// Drops every entry and goes back to the initial capacity.
    pub fn clear(&mut self) -> usize {
        let freed = self.size;
        *self = Self::new();
        freed
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.slots.iter().flatten()
    }

    /// Inserts `count` entries with random names, for stress testing.
    pub fn fill(&mut self, count: usize) -> Result<(), EnvironmentError> {
        for _ in 0..count {
            let id = Uuid::new_v4();
            let bits = id.as_u128();
            let vector = Vector::new(
                component(bits),
                component(bits >> 32),
                component(bits >> 64),
            );
            self.insert(&format!("v{}", id.simple()), vector)?;
        }
        Ok(())
    }

    /// Slot holding `name`, or the first empty slot on its probe chain.
    fn probe(&self, name: &str) -> Option<usize> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return None;
        }

        let home = (hash(name) % capacity as u64) as usize;
        (0..capacity)
            .map(|offset| (home + offset) % capacity)
            .find(|&index| match &self.slots[index] {
                Some(entry) => entry.name == name,
                None => true,
            })
    }

    fn resize(&mut self, capacity: usize) -> Result<(), EnvironmentError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|source| EnvironmentError::Resize { capacity, source })?;
        slots.resize(capacity, None);

        debug!(
            "Growing variable table from {} to {} slots",
            self.slots.len(),
            capacity
        );
        let old = std::mem::replace(&mut self.slots, slots);
        for entry in old.into_iter().flatten() {
            let index = self.probe(&entry.name).ok_or(EnvironmentError::Full)?;
            self.slots[index] = Some(entry);
        }

        Ok(())
    }
}

fn component(bits: u128) -> f32 {
    (bits % 2000) as f32 / 10.0 - 100.0
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("size", &self.size)
            .field("capacity", &self.slots.len())
            .field(
                "entries",
                &self
                    .iter()
                    .map(|entry| format!("{}: {}", entry.name, entry.vector))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut environment = Environment::new();
        environment
            .insert("a", Vector::new(1.0, 2.0, 3.0))
            .unwrap();
        assert_eq!(environment.get("a"), Some(Vector::new(1.0, 2.0, 3.0)));
        assert_eq!(environment.get("b"), None);
        assert_eq!(environment.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_size() {
        let mut environment = Environment::new();
        environment.insert("a", Vector::new(1.0, 1.0, 1.0)).unwrap();
        environment.insert("a", Vector::new(2.0, 2.0, 2.0)).unwrap();
        assert_eq!(environment.len(), 1);
        assert_eq!(environment.get("a"), Some(Vector::new(2.0, 2.0, 2.0)));
    }

    #[test]
    fn test_djb2() {
        assert_eq!(hash(""), 5381);
        assert_eq!(hash("a"), 5381 * 33 + 97);
    }

    #[test]
    fn test_colliding_names() {
        assert_eq!(hash("a") % 16, hash("q") % 16);

        let mut environment = Environment::new();
        environment.insert("a", Vector::new(1.0, 0.0, 0.0)).unwrap();
        environment.insert("q", Vector::new(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(environment.get("a"), Some(Vector::new(1.0, 0.0, 0.0)));
        assert_eq!(environment.get("q"), Some(Vector::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_grows_before_exceeding_load_factor() {
        let mut environment = Environment::new();
        for n in 0..11 {
            environment
                .insert(&format!("var{n}"), Vector::new(n as f32, 0.0, 0.0))
                .unwrap();
        }
        assert_eq!(environment.capacity(), INITIAL_CAPACITY);

        environment.insert("var11", Vector::default()).unwrap();
        assert_eq!(environment.capacity(), INITIAL_CAPACITY * 2);
        assert_eq!(environment.len(), 12);
        for n in 0..11 {
            assert_eq!(
                environment.get(&format!("var{n}")),
                Some(Vector::new(n as f32, 0.0, 0.0))
            );
        }
    }

    #[test]
    fn test_overwrite_at_threshold_does_not_grow() {
        let mut environment = Environment::new();
        for n in 0..11 {
            environment
                .insert(&format!("var{n}"), Vector::default())
                .unwrap();
        }

        environment.insert("var3", Vector::new(3.0, 3.0, 3.0)).unwrap();
        assert_eq!(environment.capacity(), INITIAL_CAPACITY);
        assert_eq!(environment.len(), 11);
        assert_eq!(environment.get("var3"), Some(Vector::new(3.0, 3.0, 3.0)));
    }

    #[test]
    fn test_clear() {
        let mut environment = Environment::new();
        environment.fill(40).unwrap();
        assert_eq!(environment.len(), 40);
        assert!(environment.capacity() > INITIAL_CAPACITY);
        assert!(environment.load_factor() <= 0.70);

        assert_eq!(environment.clear(), 40);
        assert!(environment.is_empty());
        assert_eq!(environment.capacity(), INITIAL_CAPACITY);
        assert_eq!(environment.iter().count(), 0);
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut environment = Environment::new();
        environment.insert("x", Vector::default()).unwrap();
        environment.insert("y", Vector::default()).unwrap();
        let mut names: Vec<_> = environment.iter().map(|entry| entry.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["x", "y"]);
    }
}

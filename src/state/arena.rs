use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use indexmap::IndexMap;

/// Typed handle into an [`Arena`]. Handles are never reused within one arena.
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn raw(self) -> u32 {
        self.raw
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}

/// Insertion-ordered storage. Iteration order is the order entities were added,
/// which is the order they are written back out.
pub struct Arena<T> {
    items: IndexMap<u32, T>,
    next: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            next: 0,
        }
    }
}

impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            next: self.next,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items.iter()).finish()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Id<T> {
        let raw = self.next;
        self.next += 1;
        self.items.insert(raw, value);
        Id::new(raw)
    }

    /// Swap the value behind `id`, keeping its handle and position.
    pub fn replace(&mut self, id: Id<T>, value: T) -> Option<T> {
        self.items.get_mut(&id.raw).map(|slot| std::mem::replace(slot, value))
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.items.get(&id.raw)
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.items.get_mut(&id.raw)
    }

    pub fn remove(&mut self, id: Id<T>) -> Option<T> {
        self.items.shift_remove(&id.raw)
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        self.items.contains_key(&id.raw)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of `id` in iteration order.
    pub fn position(&self, id: Id<T>) -> Option<usize> {
        self.items.get_index_of(&id.raw)
    }

    pub fn id_at(&self, index: usize) -> Option<Id<T>> {
        self.items.get_index(index).map(|(&raw, _)| Id::new(raw))
    }

    pub fn ids(&self) -> Vec<Id<T>> {
        self.items.keys().map(|&raw| Id::new(raw)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.items.iter().map(|(&raw, v)| (Id::new(raw), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<T>, &mut T)> {
        self.items.iter_mut().map(|(&raw, v)| (Id::new(raw), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }

    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Id<T>> {
        self.iter().find(|(_, v)| pred(v)).map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_stable_after_removal() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        let c = arena.insert("c");
        assert_eq!(arena.remove(b), Some("b"));
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(c), Some(&"c"));
        assert_eq!(arena.position(c), Some(1));
        assert_eq!(arena.id_at(1), Some(c));
        assert!(!arena.contains(b));

        let d = arena.insert("d");
        assert_ne!(d, b);
        let order: Vec<_> = arena.values().copied().collect();
        assert_eq!(order, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_eq!(arena.replace(a, 10), Some(1));
        assert_eq!(arena.id_at(0), Some(a));
        assert_eq!(arena.find(|&v| v == 2), Some(b));
    }
}

use std::collections::BTreeSet;

/// Set that iterates in first-insertion order.
///
/// Membership is tracked in a `BTreeSet`, order in a `Vec`; duplicates are dropped on insert.
#[derive(Debug, Clone)]
pub struct OrderedSet<T: Ord + Clone> {
    seen: BTreeSet<T>,
    items: Vec<T>,
}

impl<T: Ord + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            seen: BTreeSet::new(),
            items: Vec::new(),
        }
    }
}

impl<T: Ord + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `value` was not already present.
    pub fn insert(&mut self, value: T) -> bool {
        if !self.seen.insert(value.clone()) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Ord + Clone> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Ord + Clone> Eq for OrderedSet<T> {}

impl<T: Ord + Clone> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.extend(iter);
        set
    }
}

impl<'a, T: Ord + Clone> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Ord + Clone> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedSet;

    #[test]
    fn keeps_first_seen_order_and_drops_duplicates() {
        let mut set = OrderedSet::new();
        assert!(set.insert("c"));
        assert!(set.insert("a"));
        assert!(!set.insert("c"));
        assert!(set.insert("b"));
        assert_eq!(set.as_slice(), &["c", "a", "b"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.first(), Some(&"c"));
    }

    #[test]
    fn collect_deduplicates() {
        let set: OrderedSet<u32> = [3, 1, 3, 2, 1].into_iter().collect();
        assert_eq!(set.into_vec(), vec![3, 1, 2]);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a: OrderedSet<u8> = [1, 2].into_iter().collect();
        let b: OrderedSet<u8> = [2, 1].into_iter().collect();
        assert_ne!(a, b);
        assert!(a.contains(&2) && b.contains(&1));
    }
}

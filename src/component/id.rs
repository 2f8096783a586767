//! Component ID: a lightweight, ordered, copyable component identifier.

/// A unique identifier for a simulated component.
///
/// Minted by a [`ComponentIdGen`] that the model builder owns and passes
/// around explicitly, so identities never leak between runs or tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentId(u64);

impl ComponentId {
    /// Create a component ID from a raw integer.
    #[inline]
    pub fn new(id: u64) -> Self {
        ComponentId(id)
    }

    /// Return the underlying integer.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Strictly-increasing source of [`ComponentId`]s.
#[derive(Debug, Clone)]
pub struct ComponentIdGen {
    next: u64,
}

impl ComponentIdGen {
    /// Create a generator whose first ID is `C1`.
    pub fn new() -> Self {
        ComponentIdGen { next: 1 }
    }

    /// Mint the next component ID.
    pub fn next_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next);
        self.next += 1;
        id
    }
}

impl Default for ComponentIdGen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_per_generator() {
        let mut a = ComponentIdGen::new();
        let mut b = ComponentIdGen::new();
        assert_eq!(a.next_id(), ComponentId::new(1));
        assert_eq!(a.next_id(), ComponentId::new(2));
        // Independent generators do not share a counter.
        assert_eq!(b.next_id(), ComponentId::new(1));
        assert_eq!(ComponentId::new(7).to_string(), "C7");
    }
}

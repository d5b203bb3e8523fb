//! Which session is currently in view.

use crate::core::types::SessionId;

/// Holds the selected session and a generation counter.
///
/// Every call to [`SessionSelector::select`] bumps the generation, even when
/// the same identifier is selected again. Fetch results are tagged with the
/// generation they were issued under, so anything carrying an older
/// generation belongs to a superseded selection.
#[derive(Debug, Clone, Default)]
pub struct SessionSelector {
    current: SessionId,
    generation: u64,
}

impl SessionSelector {
    /// Start on the live session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `id` unconditionally and return the new generation.
    ///
    /// No validation against the catalog happens here.
    pub fn select(&mut self, id: SessionId) -> u64 {
        self.current = id;
        self.generation += 1;
        self.generation
    }

    /// Keep the selection but retire everything issued so far.
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn current(&self) -> &SessionId {
        &self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a result tagged with `generation` still matches the selection.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_live() {
        let selector = SessionSelector::new();
        assert!(selector.current().is_live());
        assert_eq!(selector.generation(), 0);
    }

    #[test]
    fn test_select_accepts_anything_and_bumps_generation() {
        let mut selector = SessionSelector::new();
        let id: SessionId = "1970-01-01T00:00:00Z".parse().unwrap();

        let first = selector.select(id.clone());
        assert_eq!(selector.current(), &id);

        let second = selector.select(id);
        assert!(second > first);
        assert!(!selector.is_current(first));
        assert!(selector.is_current(second));
    }

    #[test]
    fn test_invalidate_keeps_selection() {
        let mut selector = SessionSelector::new();
        let before = selector.generation();

        let after = selector.invalidate();
        assert!(selector.current().is_live());
        assert!(after > before);
        assert!(!selector.is_current(before));
    }
}

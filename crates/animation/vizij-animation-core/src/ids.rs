//! Identifiers and simple allocators for mixer entities.

use serde::{Deserialize, Serialize};

/// Identifies one playing clip inside a [`crate::Mixer`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

/// Hands out action ids in play order; ids are never reused within a mixer.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_action: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_action(&mut self) -> ActionId {
        let id = ActionId(self.next_action);
        self.next_action = self.next_action.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_play_order() {
        let mut alloc = IdAllocator::new();
        let first = alloc.alloc_action();
        let second = alloc.alloc_action();
        assert_eq!((first, second), (ActionId(0), ActionId(1)));
    }
}

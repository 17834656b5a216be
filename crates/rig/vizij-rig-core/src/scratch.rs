//! Frame-scoped rotation storage for the resolver.
//!
//! Slots are handed out from a pool whose capacity grows to the largest frame
//! seen and is reused afterwards; `begin_frame` resets the cursor only.

use glam::Quat;

/// Index of a rotation held in a [`RotationPool`] for the current frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RotationSlot(u32);

#[derive(Debug, Default)]
pub struct RotationPool {
    values: Vec<Quat>,
    cursor: usize,
}

impl RotationPool {
    #[inline]
    pub fn begin_frame(&mut self) {
        self.cursor = 0;
    }

    pub fn acquire(&mut self, value: Quat) -> RotationSlot {
        if self.cursor == self.values.len() {
            self.values.push(value);
        } else {
            self.values[self.cursor] = value;
        }
        let slot = RotationSlot(self.cursor as u32);
        self.cursor += 1;
        slot
    }

    #[inline]
    pub fn get(&self, slot: RotationSlot) -> Quat {
        self.values[slot.0 as usize]
    }

    #[inline]
    pub fn set(&mut self, slot: RotationSlot, value: Quat) {
        self.values[slot.0 as usize] = value;
    }

    /// Slots handed out since the last `begin_frame`.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }
}

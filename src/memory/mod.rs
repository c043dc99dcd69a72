//! Storage layout for function frames
//!
//! Every declared symbol gets a slot in the current function's frame. The
//! layout is word-oriented: each scalar occupies one 8-byte slot (chars are
//! stored widened), which keeps the back end's load/store addressing trivial.

use std::collections::HashMap;

/// Bytes per storage slot
pub const WORD_SIZE: usize = 8;

/// Hard ceiling on a single function frame
pub const FRAME_CEILING: usize = 2048;

/// A storage slot within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: usize,
    pub size: usize,
}

/// The finished layout of a function frame, captured when a function's IR
/// is handed to the back end
#[derive(Debug, Clone)]
pub struct FrameLayout {
    /// Slots in allocation order
    pub slots: Vec<(String, Slot)>,
    /// Total frame size in bytes
    pub size: usize,
}

impl FrameLayout {
    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }
}

/// Allocates frame slots for the function currently under analysis
#[derive(Debug)]
pub struct LayoutManager {
    slots: HashMap<String, Slot>,
    order: Vec<String>,
    next_offset: usize,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: Vec::new(),
            next_offset: 0,
        }
    }

    /// Record a storage slot for `name`. Fails past the frame ceiling.
    pub fn allocate_for(&mut self, name: &str) -> Result<Slot, String> {
        if let Some(existing) = self.slots.get(name) {
            return Ok(*existing);
        }

        if self.next_offset + WORD_SIZE > FRAME_CEILING {
            return Err(format!(
                "allocation of \"{}\" exceeds the frame ceiling of {} bytes",
                name, FRAME_CEILING
            ));
        }

        let slot = Slot {
            offset: self.next_offset,
            size: WORD_SIZE,
        };
        self.next_offset += WORD_SIZE;
        self.slots.insert(name.to_string(), slot);
        self.order.push(name.to_string());
        Ok(slot)
    }

    pub fn slot_of(&self, name: &str) -> Option<Slot> {
        self.slots.get(name).copied()
    }

    pub fn frame_size(&self) -> usize {
        self.next_offset
    }

    /// Capture the frame for a completed function
    pub fn snapshot(&self) -> FrameLayout {
        FrameLayout {
            slots: self
                .order
                .iter()
                .map(|name| (name.clone(), self.slots[name]))
                .collect(),
            size: self.next_offset,
        }
    }

    /// Clear all slots for the next function
    pub fn reset(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.next_offset = 0;
    }
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_allocation() {
        let mut layout = LayoutManager::new();
        let a = layout.allocate_for("a").unwrap();
        let b = layout.allocate_for("b").unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, WORD_SIZE);
        assert_eq!(layout.frame_size(), 2 * WORD_SIZE);
    }

    #[test]
    fn test_reallocation_is_stable() {
        let mut layout = LayoutManager::new();
        let first = layout.allocate_for("x").unwrap();
        let again = layout.allocate_for("x").unwrap();
        assert_eq!(first, again);
        assert_eq!(layout.frame_size(), WORD_SIZE);
    }

    #[test]
    fn test_reset_clears_frame() {
        let mut layout = LayoutManager::new();
        layout.allocate_for("x").unwrap();
        layout.reset();
        assert_eq!(layout.frame_size(), 0);
        assert!(layout.slot_of("x").is_none());
    }

    #[test]
    fn test_frame_ceiling() {
        let mut layout = LayoutManager::new();
        for i in 0..(FRAME_CEILING / WORD_SIZE) {
            layout.allocate_for(&format!("v{}", i)).unwrap();
        }
        assert!(layout.allocate_for("overflow").is_err());
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut layout = LayoutManager::new();
        layout.allocate_for("first").unwrap();
        layout.allocate_for("second").unwrap();
        let frame = layout.snapshot();
        assert_eq!(frame.slots[0].0, "first");
        assert_eq!(frame.slots[1].0, "second");
        assert_eq!(frame.size, 2 * WORD_SIZE);
        assert_eq!(frame.slot_of("second").unwrap().offset, WORD_SIZE);
    }
}

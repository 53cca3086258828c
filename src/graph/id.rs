//! Stable handles for modeled objects.
//!
//! An [`Id`] pairs a slot index with a generation counter. Releasing a handle
//! bumps the generation of its slot, so a stale handle held elsewhere never
//! aliases the object that later reuses the slot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GraphError;

/// Generation-counted handle of a node in the identity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id {
    index: u32,
    generation: u32,
}

impl Id {
    /// Create a handle from its raw parts.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of the handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

impl FromStr for Id {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidHandle {
            text: s.to_string(),
        };
        let (index, generation) = s.split_once('v').ok_or_else(invalid)?;
        let index = index.parse::<u32>().map_err(|_| invalid())?;
        let generation = generation.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { index, generation })
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Slot allocator issuing [`Id`]s and recycling released slots.
#[derive(Debug, Clone, Default)]
pub(crate) struct HandleAllocator {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl HandleAllocator {
    pub(crate) fn allocate(&mut self) -> Id {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.occupied = true;
            return Id::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            occupied: true,
        });
        Id::new(index, 0)
    }

    /// Release a live handle. Returns false for stale or unknown handles.
    pub(crate) fn release(&mut self, id: Id) -> bool {
        if !self.is_live(id) {
            return false;
        }
        let slot = &mut self.slots[id.index as usize];
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        true
    }

    pub(crate) fn is_live(&self, id: Id) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == id.generation)
    }
}

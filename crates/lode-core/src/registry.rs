//! Actor registry
//!
//! Slot storage with generation-counted handles. An [`ActorId`] held across
//! a despawn never resolves to the recycled slot's new occupant, so a
//! back-reference such as "the platform I stand on" can be kept for as long
//! as convenient without extending or corrupting anything's lifetime.

/// Handle to an actor slot, stable across the actor's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId {
    index: u32,
    generation: u32,
}

impl ActorId {
    pub const fn index(&self) -> u32 {
        self.index
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
    alive: bool,
}

/// Generational slot arena.
///
/// Besides the usual insert/remove/get operations, a value can be
/// [`take`](Registry::take)n out for an in-flight integration step and
/// [`restore`](Registry::restore)d afterwards; while taken, iteration and
/// lookups skip the slot, which is exactly the exclusion the collision
/// queries need for the actor currently being stepped.
#[derive(Debug)]
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: T) -> ActorId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.value = Some(value);
            slot.alive = true;
            ActorId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
                alive: true,
            });
            ActorId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove an actor, invalidating its handle. Returns the value, or
    /// `None` if the handle is stale.
    pub fn remove(&mut self, id: ActorId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take();
        slot.alive = false;
        self.free.push(id.index);
        value
    }

    /// Whether the handle still refers to a live actor (taken slots count
    /// as live; the actor is merely out being stepped).
    pub fn contains(&self, id: ActorId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|s| s.alive && s.generation == id.generation)
    }

    pub fn get(&self, id: ActorId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.alive && s.generation == id.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut T> {
        self.slot_mut(id).and_then(|s| s.value.as_mut())
    }

    /// Take a value out of its slot without invalidating the handle.
    pub fn take(&mut self, id: ActorId) -> Option<T> {
        self.slot_mut(id).and_then(|s| s.value.take())
    }

    /// Put back a value previously [`take`](Registry::take)n. Returns the
    /// value unchanged if the handle has gone stale in the meantime.
    pub fn restore(&mut self, id: ActorId, value: T) -> Option<T> {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.value = Some(value);
                None
            }
            None => Some(value),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.alive).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate live, present values (taken slots are skipped).
    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            let value = s.value.as_ref()?;
            s.alive.then_some((
                ActorId {
                    index: i as u32,
                    generation: s.generation,
                },
                value,
            ))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorId, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            if !s.alive {
                return None;
            }
            let generation = s.generation;
            s.value.as_mut().map(|value| {
                (
                    ActorId {
                        index: i as u32,
                        generation,
                    },
                    value,
                )
            })
        })
    }

    /// Handles of all live actors, in slot order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.alive)
            .map(|(i, s)| ActorId {
                index: i as u32,
                generation: s.generation,
            })
            .collect()
    }

    fn slot_mut(&mut self, id: ActorId) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.alive && s.generation == id.generation)
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

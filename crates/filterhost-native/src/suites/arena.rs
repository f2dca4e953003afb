//! Generation-checked slot storage behind opaque identifiers.
//!
//! Identifiers handed to plug-ins pack three fields into a `u64`:
//!
//! ```text
//! bits 63..48  session tag
//! bits 47..32  slot generation
//! bits 31..0   slot index + 1
//! ```
//!
//! Zero is never produced, so it stays free as the null identifier. A slot's
//! generation advances every time it is freed, which turns stale
//! identifiers into lookups that fail instead of aliasing a newer
//! allocation. The session tag keeps identifiers from one session from
//! resolving in another.

use std::sync::atomic::{AtomicU16, Ordering};

static NEXT_TAG: AtomicU16 = AtomicU16::new(1);

/// Allocate a session tag. Never returns zero.
pub fn next_session_tag() -> u16 {
    loop {
        let tag = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
        if tag != 0 {
            return tag;
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u16,
    value: Option<T>,
}

/// Dense storage addressed by tagged, generation-checked identifiers.
#[derive(Debug)]
pub struct Arena<T> {
    tag: u16,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

fn encode(tag: u16, generation: u16, index: u32) -> u64 {
    (u64::from(tag) << 48) | (u64::from(generation) << 32) | (u64::from(index) + 1)
}

fn decode(id: u64) -> Option<(u16, u16, u32)> {
    let low = (id & 0xFFFF_FFFF) as u32;
    if low == 0 {
        return None;
    }
    Some(((id >> 48) as u16, (id >> 32) as u16, low - 1))
}

impl<T> Arena<T> {
    /// An empty arena whose identifiers carry `tag`.
    pub fn new(tag: u16) -> Self {
        Self {
            tag,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Session tag of this arena.
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Store `value` and return its identifier.
    ///
    /// Returns `None` only when every one of the 2^32 - 1 slots is in use.
    pub fn insert(&mut self, value: T) -> Option<u64> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len()).ok()?;
                if index == u32::MAX {
                    return None;
                }
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                index
            }
        };
        let slot = self.slots.get_mut(index as usize)?;
        slot.value = Some(value);
        self.len += 1;
        Some(encode(self.tag, slot.generation, index))
    }

    fn slot_index(&self, id: u64) -> Option<usize> {
        let (tag, generation, index) = decode(id)?;
        if tag != self.tag {
            return None;
        }
        let slot = self.slots.get(index as usize)?;
        (slot.generation == generation && slot.value.is_some()).then_some(index as usize)
    }

    /// Whether `id` names a live value.
    pub fn contains(&self, id: u64) -> bool {
        self.slot_index(id).is_some()
    }

    /// Borrow the value behind `id`.
    pub fn get(&self, id: u64) -> Option<&T> {
        let index = self.slot_index(id)?;
        self.slots.get(index)?.value.as_ref()
    }

    /// Mutably borrow the value behind `id`.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        let index = self.slot_index(id)?;
        self.slots.get_mut(index)?.value.as_mut()
    }

    /// Remove and return the value behind `id`, retiring the identifier.
    pub fn remove(&mut self, id: u64) -> Option<T> {
        let index = self.slot_index(id)?;
        let slot = self.slots.get_mut(index)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        self.len -= 1;
        Some(value)
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no values are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live identifiers with their values.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|v| (encode(self.tag, slot.generation, index as u32), v))
        })
    }

    /// Remove every live value, retiring all identifiers.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                out.push(value);
            }
        }
        self.len = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_never_zero() {
        let mut arena = Arena::new(0);
        let id = arena.insert(1);
        assert!(matches!(id, Some(id) if id != 0));
    }

    #[test]
    fn test_stale_id_rejected_after_reuse() {
        let mut arena = Arena::new(3);
        let first = arena.insert("a");
        let Some(first) = first else {
            panic!("insert failed");
        };
        assert_eq!(arena.remove(first), Some("a"));
        let second = arena.insert("b");
        assert!(second.is_some());
        assert_ne!(second, Some(first));
        assert_eq!(arena.get(first), None);
        assert_eq!(arena.remove(first), None);
    }

    #[test]
    fn test_foreign_tag_rejected() {
        let mut a = Arena::new(1);
        let b: Arena<i32> = Arena::new(2);
        let id = a.insert(5).unwrap_or_default();
        assert!(a.contains(id));
        assert!(!b.contains(id));
    }

    #[test]
    fn test_drain_retires_everything() {
        let mut arena = Arena::new(7);
        let ids: Vec<u64> = (0..4).filter_map(|v| arena.insert(v)).collect();
        assert_eq!(arena.len(), 4);
        let mut drained = arena.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert!(arena.is_empty());
        assert!(ids.iter().all(|&id| !arena.contains(id)));
    }

    #[test]
    fn test_session_tags_skip_zero() {
        for _ in 0..10 {
            assert_ne!(next_session_tag(), 0);
        }
    }
}

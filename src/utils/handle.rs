use std::hash::Hash;
use std::marker::PhantomData;

/// Typed index into a [`Pool`]. The generation lets stale handles be detected
/// after their slot has been recycled.
#[repr(C)]
pub struct Handle<T> {
    pub slot: u16,
    pub generation: u16,
    phantom: PhantomData<T>,
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("slot", &self.slot)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> Handle<T> {
    pub fn valid(&self) -> bool {
        self.slot != u16::MAX && self.generation != u16::MAX
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self {
            slot: u16::MAX,
            generation: u16::MAX,
            phantom: PhantomData,
        }
    }
}

/// Generational arena. Slots are recycled in LIFO order; releasing a slot
/// bumps its generation so outstanding handles to the old occupant go stale
/// instead of aliasing the new one.
pub struct Pool<T> {
    items: Vec<Option<T>>,
    empty: Vec<u32>,
    generation: Vec<u16>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new(64)
    }
}

impl<T> Pool<T> {
    pub fn new(initial_size: usize) -> Self {
        let mut items = Vec::with_capacity(initial_size);
        items.resize_with(initial_size, || None);
        Self {
            items,
            empty: (0..initial_size as u32).rev().collect(),
            generation: vec![0; initial_size],
        }
    }

    pub fn insert(&mut self, item: T) -> Option<Handle<T>> {
        let slot = match self.empty.pop() {
            Some(slot) => slot,
            None => {
                let slot = self.items.len() as u32;
                if slot >= u16::MAX as u32 {
                    return None;
                }
                self.items.push(None);
                self.generation.push(0);
                slot
            }
        };
        self.items[slot as usize] = Some(item);
        Some(Handle {
            slot: slot as u16,
            generation: self.generation[slot as usize],
            phantom: PhantomData,
        })
    }

    pub fn get_ref(&self, handle: Handle<T>) -> Option<&T> {
        if !handle.valid() {
            return None;
        }
        let slot = handle.slot as usize;
        if self.generation.get(slot) != Some(&handle.generation) {
            return None;
        }
        self.items[slot].as_ref()
    }

    pub fn get_mut_ref(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if !handle.valid() {
            return None;
        }
        let slot = handle.slot as usize;
        if self.generation.get(slot) != Some(&handle.generation) {
            return None;
        }
        self.items[slot].as_mut()
    }

    /// Removes the item and recycles the slot. Returns `None` when the handle
    /// is stale or was never occupied, making double-release a no-op.
    pub fn take(&mut self, handle: Handle<T>) -> Option<T> {
        if !handle.valid() {
            return None;
        }
        let slot = handle.slot as usize;
        if self.generation.get(slot) != Some(&handle.generation) {
            return None;
        }
        let item = self.items[slot].take()?;
        self.generation[slot] = self.generation[slot].wrapping_add(1);
        self.empty.push(slot as u32);
        Some(item)
    }

    pub fn release(&mut self, handle: Handle<T>) {
        let _ = self.take(handle);
    }

    /// Removes every live item. Used for bulk teardown.
    pub fn drain_all(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        for (slot, item) in self.items.iter_mut().enumerate() {
            if let Some(item) = item.take() {
                self.generation[slot] = self.generation[slot].wrapping_add(1);
                self.empty.push(slot as u32);
                out.push(item);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|i| i.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut pool: Pool<u32> = Pool::new(4);
        let a = pool.insert(7).unwrap();
        let b = pool.insert(9).unwrap();
        assert_eq!(pool.get_ref(a), Some(&7));
        assert_eq!(pool.get_ref(b), Some(&9));
        assert_ne!(a, b);
    }

    #[test]
    fn grows_past_initial_size() {
        let mut pool: Pool<u32> = Pool::new(2);
        let handles: Vec<_> = (0..16).map(|i| pool.insert(i).unwrap()).collect();
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(pool.get_ref(*h), Some(&(i as u32)));
        }
    }

    #[test]
    fn stale_handle_after_release() {
        let mut pool: Pool<u32> = Pool::new(4);
        let a = pool.insert(1).unwrap();
        assert_eq!(pool.take(a), Some(1));
        // Second release is a no-op.
        assert_eq!(pool.take(a), None);
        assert!(pool.get_ref(a).is_none());

        // The slot is recycled with a new generation; the old handle stays dead.
        let b = pool.insert(2).unwrap();
        assert_eq!(b.slot, a.slot);
        assert_ne!(b.generation, a.generation);
        assert!(pool.get_ref(a).is_none());
        assert_eq!(pool.get_ref(b), Some(&2));
    }

    #[test]
    fn default_handle_is_invalid() {
        let pool: Pool<u32> = Pool::default();
        let h: Handle<u32> = Handle::default();
        assert!(!h.valid());
        assert!(pool.get_ref(h).is_none());
    }

    #[test]
    fn drain_all_empties_the_pool() {
        let mut pool: Pool<u32> = Pool::new(4);
        for i in 0..6 {
            pool.insert(i).unwrap();
        }
        let mut drained = pool.drain_all();
        drained.sort();
        assert_eq!(drained, vec![0, 1, 2, 3, 4, 5]);
        assert!(pool.is_empty());
    }
}

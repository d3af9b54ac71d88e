use std::collections::hash_map;
use std::collections::HashMap;

use super::pixel_buffer::TextureKey;

/// Default number of distinct frame geometries kept resident
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

struct Entry<T> {
    texture: T,
    last_used: u64,
}

/// Textures indexed by frame geometry, evicting the least recently used
///
/// The cache never releases GPU objects itself: evicted and drained entries
/// are handed back so the owner can release them against the context that
/// created them.
pub struct TextureCache<T> {
    entries: HashMap<TextureKey, Entry<T>>,
    capacity: usize,
    clock: u64,
}

/// Result of a cache lookup
pub struct Lookup<'a, T> {
    pub texture: &'a mut T,
    /// Whether the texture was created by this lookup
    pub created: bool,
}

impl<T> TextureCache<T> {
    /// Create an empty cache; capacity is clamped to at least one entry
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &TextureKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TextureKey> {
        self.entries.keys()
    }

    /// Evict the least recently used entry if inserting `key` would
    /// exceed capacity
    ///
    /// Call before [`get_or_insert_with`](Self::get_or_insert_with) so the
    /// evicted texture is released before a new one is allocated.
    pub fn make_room(&mut self, key: &TextureKey) -> Option<(TextureKey, T)> {
        if self.entries.contains_key(key) || self.entries.len() < self.capacity {
            return None;
        }
        self.evict_oldest()
    }

    /// Return the texture for `key`, creating it on a miss
    ///
    /// A failed `create` leaves the cache unchanged.
    pub fn get_or_insert_with<E, F>(&mut self, key: TextureKey, create: F) -> Result<Lookup<'_, T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.clock += 1;
        let now = self.clock;

        match self.entries.entry(key) {
            hash_map::Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                entry.last_used = now;
                Ok(Lookup {
                    texture: &mut entry.texture,
                    created: false,
                })
            }
            hash_map::Entry::Vacant(vacant) => {
                let entry = vacant.insert(Entry {
                    texture: create()?,
                    last_used: now,
                });
                Ok(Lookup {
                    texture: &mut entry.texture,
                    created: true,
                })
            }
        }
    }

    /// Remove every entry, handing the textures back for release
    pub fn drain(&mut self) -> Vec<(TextureKey, T)> {
        let mut drained: Vec<_> = self
            .entries
            .drain()
            .map(|(key, entry)| (entry.last_used, key, entry.texture))
            .collect();
        // Oldest first keeps release order deterministic
        drained.sort_by_key(|(last_used, _, _)| *last_used);
        drained
            .into_iter()
            .map(|(_, key, texture)| (key, texture))
            .collect()
    }

    fn evict_oldest(&mut self) -> Option<(TextureKey, T)> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key)?;
        self.entries
            .remove(&oldest)
            .map(|entry| (oldest, entry.texture))
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pixel_buffer::PixelFormat;

    fn key(width: u32, height: u32) -> TextureKey {
        TextureKey {
            width,
            height,
            format: PixelFormat::Bgra8,
        }
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        let cache: TextureCache<u32> = TextureCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_hit_does_not_call_create() {
        let mut cache = TextureCache::new(2);
        cache
            .get_or_insert_with(key(640, 480), || Ok::<_, ()>(1))
            .unwrap();

        let lookup = cache
            .get_or_insert_with(key(640, 480), || -> Result<u32, ()> {
                panic!("create called on hit")
            })
            .unwrap();
        assert!(!lookup.created);
        assert_eq!(*lookup.texture, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_create_leaves_cache_untouched() {
        let mut cache = TextureCache::new(2);
        cache.get_or_insert_with(key(1, 1), || Ok::<_, &str>(7)).unwrap();

        let result = cache.get_or_insert_with(key(2, 2), || Err::<u32, _>("oom"));
        assert!(result.is_err());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(1, 1)));
    }

    #[test]
    fn test_make_room_only_when_full() {
        let mut cache = TextureCache::new(2);
        assert!(cache.make_room(&key(1, 1)).is_none());
        cache.get_or_insert_with(key(1, 1), || Ok::<_, ()>(1)).unwrap();
        assert!(cache.make_room(&key(2, 2)).is_none());
        cache.get_or_insert_with(key(2, 2), || Ok::<_, ()>(2)).unwrap();

        // Already cached keys never evict
        assert!(cache.make_room(&key(2, 2)).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = TextureCache::new(2);
        cache.get_or_insert_with(key(1, 1), || Ok::<_, ()>(1)).unwrap();
        cache.get_or_insert_with(key(2, 2), || Ok::<_, ()>(2)).unwrap();
        // Touch the first so the second becomes the oldest
        cache.get_or_insert_with(key(1, 1), || Ok::<_, ()>(99)).unwrap();

        assert_eq!(cache.make_room(&key(3, 3)), Some((key(2, 2), 2)));
        let lookup = cache.get_or_insert_with(key(3, 3), || Ok::<_, ()>(3)).unwrap();
        assert!(lookup.created);
        assert!(cache.contains(&key(1, 1)));
        assert!(cache.contains(&key(3, 3)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_full_cache_frees_stale_entry_when_create_keeps_failing() {
        let mut cache = TextureCache::new(1);
        cache.get_or_insert_with(key(1, 1), || Ok::<_, &str>(1)).unwrap();

        for _ in 0..3 {
            cache.make_room(&key(2, 2));
            assert!(cache.get_or_insert_with(key(2, 2), || Err::<i32, _>("oom")).is_err());
        }
        assert!(cache.is_empty());

        cache.make_room(&key(2, 2));
        cache.get_or_insert_with(key(2, 2), || Ok::<_, &str>(2)).unwrap();
        assert!(cache.contains(&key(2, 2)));
    }

    #[test]
    fn test_drain_returns_oldest_first() {
        let mut cache = TextureCache::new(4);
        for (i, size) in [10, 20, 30].into_iter().enumerate() {
            cache.get_or_insert_with(key(size, size), || Ok::<_, ()>(i)).unwrap();
        }

        let drained: Vec<usize> = cache.drain().into_iter().map(|(_, t)| t).collect();
        assert_eq!(drained, vec![0, 1, 2]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_drain_on_empty_cache() {
        let mut cache: TextureCache<u8> = TextureCache::default();
        assert!(cache.drain().is_empty());
        assert_eq!(cache.capacity(), DEFAULT_CACHE_CAPACITY);
    }
}

/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Reusable buffer pool.
//!
//! This module provides a pool of fixed-capacity byte regions organized
//! into power-of-two size classes. Encoders draw regions from the pool,
//! fill them, and hand them off; the region returns to its free list when
//! released or dropped.

use bytes::BytesMut;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Smallest region capacity handed out by the pool.
pub const MIN_REGION_CAPACITY: usize = 1024;

/// Maximum number of regions retained per size class.
const MAX_RETAINED_PER_CLASS: usize = 64;

/// Pool of reusable byte regions.
///
/// Regions are grouped by power-of-two capacity. The pool is safe to share
/// across threads; all free-list access is serialized internally.
#[derive(Debug, Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

#[derive(Debug)]
struct PoolShared {
    /// Free regions indexed by capacity class.
    classes: Mutex<BTreeMap<usize, Vec<BytesMut>>>,
}

impl BufferPool {
    /// Creates a new empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(PoolShared {
                classes: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Acquires a region with at least `min_capacity` bytes.
    ///
    /// The returned region is empty and never smaller than requested.
    ///
    /// # Arguments
    /// * `min_capacity` - Minimum usable capacity in bytes
    #[must_use]
    pub fn acquire(&self, min_capacity: usize) -> PooledBuffer {
        let class = Self::size_class(min_capacity);

        let region = {
            let mut classes = self.shared.classes.lock();
            classes.get_mut(&class).and_then(Vec::pop)
        };

        let inner = region.unwrap_or_else(|| BytesMut::with_capacity(class));

        PooledBuffer {
            inner: Some(inner),
            class,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns the number of free regions currently retained.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.shared.classes.lock().values().map(Vec::len).sum()
    }

    /// Rounds a requested capacity up to its size class.
    fn size_class(min_capacity: usize) -> usize {
        min_capacity.max(MIN_REGION_CAPACITY).next_power_of_two()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolShared {
    fn recycle(&self, mut region: BytesMut, class: usize) {
        region.clear();
        let mut classes = self.classes.lock();
        let free = classes.entry(class).or_default();
        if free.len() < MAX_RETAINED_PER_CLASS {
            free.push(region);
        }
    }
}

/// A byte region drawn from a [`BufferPool`].
///
/// The region returns to the pool exactly once: either through an explicit
/// [`release`](Self::release) or on drop. A released region must not be
/// used again; the guard bit makes a second release a no-op.
#[derive(Debug)]
pub struct PooledBuffer {
    /// `None` once released.
    inner: Option<BytesMut>,
    class: usize,
    shared: Arc<PoolShared>,
}

impl PooledBuffer {
    /// Returns the filled portion of the region.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.inner.as_deref().unwrap_or(&[])
    }

    /// Returns a mutable reference to the underlying buffer.
    ///
    /// # Panics
    /// Panics if the region has already been released.
    #[inline]
    pub fn buf_mut(&mut self) -> &mut BytesMut {
        self.inner.as_mut().expect("buffer already released")
    }

    /// Returns the filled length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, BytesMut::len)
    }

    /// Returns true if nothing has been written to the region.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the usable capacity of the region.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.as_ref().map_or(0, BytesMut::capacity)
    }

    /// Returns the region to the pool.
    ///
    /// Safe to call more than once; only the first call recycles.
    pub fn release(&mut self) {
        if let Some(region) = self.inner.take() {
            self.shared.recycle(region, self.class);
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn test_acquire_never_smaller_than_requested() {
        let pool = BufferPool::new();

        let small = pool.acquire(10);
        assert!(small.capacity() >= MIN_REGION_CAPACITY);

        let large = pool.acquire(5000);
        assert!(large.capacity() >= 5000);
    }

    #[test]
    fn test_release_recycles_region() {
        let pool = BufferPool::new();
        assert_eq!(pool.free_count(), 0);

        let mut buf = pool.acquire(100);
        buf.buf_mut().put_slice(b"payload");
        buf.release();

        assert_eq!(pool.free_count(), 1);

        // The recycled region comes back empty.
        let buf = pool.acquire(100);
        assert_eq!(pool.free_count(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_double_release_is_noop() {
        let pool = BufferPool::new();

        let mut buf = pool.acquire(100);
        buf.release();
        buf.release();
        drop(buf);

        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let pool = BufferPool::new();

        {
            let _buf = pool.acquire(100);
        }

        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_size_classes_kept_separate() {
        let pool = BufferPool::new();

        drop(pool.acquire(100));
        drop(pool.acquire(10_000));
        assert_eq!(pool.free_count(), 2);

        // A large request must not be satisfied by the small region.
        let large = pool.acquire(10_000);
        assert!(large.capacity() >= 10_000);
    }
}

//! # Caching Module
//!
//! This module provides caching mechanisms for fitness evaluations to improve performance.
//! An individual already memoizes its own fitness; a [`FitnessCache`] goes further and
//! shares results between distinct individuals whose genomes are equivalent, which pays
//! off for expensive objectives and for populations that keep rediscovering the same
//! solutions.
//!
//! Wrap a genome in [`Cached`] to route its evaluation through a cache. Only successful
//! evaluations are stored; failures are recomputed every time.
//!
//! ```rust
//! use gaopt::caching::{CacheKey, Cached, FitnessCache};
//! use gaopt::error::Result;
//! use gaopt::genome::Genome;
//! use gaopt::rng::RandomNumberGenerator;
//!
//! #[derive(Clone, Debug)]
//! struct Bits(Vec<u8>);
//!
//! impl Genome for Bits {
//!     fn evaluate(&self) -> Result<f64> {
//!         Ok(self.0.iter().filter(|&&b| b == 0).count() as f64)
//!     }
//!     fn mutate(&mut self, _rng: &mut RandomNumberGenerator) {}
//!     fn crossover(&mut self, _other: &mut Self, _rng: &mut RandomNumberGenerator) {}
//! }
//!
//! impl CacheKey for Bits {
//!     type Key = Vec<u8>;
//!     fn cache_key(&self) -> Self::Key {
//!         self.0.clone()
//!     }
//! }
//!
//! let cache = FitnessCache::global();
//! let a = Cached::new(Bits(vec![0, 1, 1]), cache.clone());
//! let b = Cached::new(Bits(vec![0, 1, 1]), cache.clone());
//!
//! assert_eq!(a.evaluate().unwrap(), 1.0);
//! assert_eq!(b.evaluate().unwrap(), 1.0);
//! assert_eq!(cache.len(), 1);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thread_local::ThreadLocal;

use crate::error::Result;
use crate::genome::Genome;
use crate::rng::RandomNumberGenerator;

/// A trait for genomes that can be used as cache keys.
pub trait CacheKey: Genome {
    /// The type of the cache key.
    type Key: Eq + Hash + Clone + Debug + Send + Sync;

    /// Generates a cache key for this genome.
    ///
    /// Genomes that would have the same fitness should have the same cache key.
    fn cache_key(&self) -> Self::Key;
}

/// A per-thread map of fitness values.
///
/// Each worker thread fills its own map, so lookups never contend on a lock.
/// The price is that a value computed on one thread is invisible to the others.
pub struct ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    cache: ThreadLocal<RefCell<HashMap<K, f64>>>,
}

impl<K> ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    /// Creates a new empty thread-local cache.
    pub fn new() -> Self {
        Self {
            cache: ThreadLocal::new(),
        }
    }

    /// Gets a cached fitness value if the current thread has one.
    pub fn get(&self, key: &K) -> Option<f64> {
        self.cache
            .get()
            .and_then(|cell| cell.try_borrow().ok())
            .and_then(|cache| cache.get(key).copied())
    }

    /// Inserts a fitness value into the current thread's map.
    pub fn insert(&self, key: K, value: f64) {
        let cell = self.cache.get_or(|| RefCell::new(HashMap::new()));
        if let Ok(mut cache) = cell.try_borrow_mut() {
            cache.insert(key, value);
        }
    }

    /// Clears the cache for the current thread.
    pub fn clear(&self) {
        if let Some(cell) = self.cache.get() {
            if let Ok(mut cache) = cell.try_borrow_mut() {
                cache.clear();
            }
        }
    }

    /// Returns the number of cached fitness evaluations for the current thread.
    pub fn len(&self) -> usize {
        self.cache
            .get()
            .and_then(|cell| cell.try_borrow().ok())
            .map_or(0, |cache| cache.len())
    }

    /// Returns `true` if the cache for the current thread is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Debug for ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLocalCache")
            .field("len", &self.len())
            .finish()
    }
}

/// A shared fitness cache.
///
/// Clones share the same storage.
#[derive(Clone)]
pub enum FitnessCache<K>
where
    K: Eq + Hash + Send,
{
    /// One map behind a mutex, shared by every thread.
    Global(Arc<Mutex<HashMap<K, f64>>>),
    /// One map per worker thread.
    ThreadLocal(Arc<ThreadLocalCache<K>>),
}

impl<K> FitnessCache<K>
where
    K: Eq + Hash + Clone + Send,
{
    pub fn global() -> Self {
        FitnessCache::Global(Arc::new(Mutex::new(HashMap::new())))
    }

    /// A global cache pre-populated with known values.
    pub fn with_values(values: HashMap<K, f64>) -> Self {
        FitnessCache::Global(Arc::new(Mutex::new(values)))
    }

    pub fn thread_local() -> Self {
        FitnessCache::ThreadLocal(Arc::new(ThreadLocalCache::new()))
    }

    pub fn get(&self, key: &K) -> Option<f64> {
        match self {
            FitnessCache::Global(map) => lock(map).get(key).copied(),
            FitnessCache::ThreadLocal(cache) => cache.get(key),
        }
    }

    pub fn insert(&self, key: K, value: f64) {
        match self {
            FitnessCache::Global(map) => {
                lock(map).insert(key, value);
            }
            FitnessCache::ThreadLocal(cache) => cache.insert(key, value),
        }
    }

    /// Number of cached values; for a thread-local cache, on the current thread.
    pub fn len(&self) -> usize {
        match self {
            FitnessCache::Global(map) => lock(map).len(),
            FitnessCache::ThreadLocal(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the cache; for a thread-local cache, on the current thread.
    pub fn clear(&self) {
        match self {
            FitnessCache::Global(map) => lock(map).clear(),
            FitnessCache::ThreadLocal(cache) => cache.clear(),
        }
    }

    /// A copy of the global map; `None` for a thread-local cache.
    pub fn values(&self) -> Option<HashMap<K, f64>> {
        match self {
            FitnessCache::Global(map) => Some(lock(map).clone()),
            FitnessCache::ThreadLocal(_) => None,
        }
    }
}

impl<K> Debug for FitnessCache<K>
where
    K: Eq + Hash + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitnessCache::Global(map) => f
                .debug_struct("FitnessCache::Global")
                .field("len", &lock(map).len())
                .finish(),
            FitnessCache::ThreadLocal(cache) => f
                .debug_tuple("FitnessCache::ThreadLocal")
                .field(cache)
                .finish(),
        }
    }
}

/// A poisoned map only means another evaluation panicked; the stored values
/// are still valid.
fn lock<K>(map: &Mutex<HashMap<K, f64>>) -> MutexGuard<'_, HashMap<K, f64>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A genome whose evaluation goes through a [`FitnessCache`].
///
/// Mutation and crossover are delegated to the wrapped genome; the cache
/// handle is shared by every clone.
#[derive(Clone)]
pub struct Cached<G: CacheKey> {
    genome: G,
    cache: FitnessCache<G::Key>,
}

impl<G: CacheKey> Cached<G> {
    pub fn new(genome: G, cache: FitnessCache<G::Key>) -> Self {
        Self { genome, cache }
    }

    /// Returns a reference to the wrapped genome.
    pub fn inner(&self) -> &G {
        &self.genome
    }

    pub fn inner_mut(&mut self) -> &mut G {
        &mut self.genome
    }

    pub fn into_inner(self) -> G {
        self.genome
    }

    pub fn cache(&self) -> &FitnessCache<G::Key> {
        &self.cache
    }
}

impl<G: CacheKey> Debug for Cached<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cached").field(&self.genome).finish()
    }
}

impl<G: CacheKey> Genome for Cached<G> {
    fn evaluate(&self) -> Result<f64> {
        let key = self.genome.cache_key();
        if let Some(fitness) = self.cache.get(&key) {
            return Ok(fitness);
        }

        let fitness = self.genome.evaluate()?;
        self.cache.insert(key, fitness);
        Ok(fitness)
    }

    fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        self.genome.mutate(rng);
    }

    fn crossover(&mut self, other: &mut Self, rng: &mut RandomNumberGenerator) {
        self.genome.crossover(&mut other.genome, rng);
    }
}

// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Template cache
//!
//! Maps the structural hash of a deduced template to the shared structure,
//! so that a batch of differently written rows pays for deduction once per
//! distinct shape. Entries are compared in full on a hit; two shapes with
//! the same hash never share a structure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::structure::{DeductionContext, TemplateShape, TemplateStructure};
use crate::config::DEFAULT_CACHE_SIZE;
use crate::core::{DataType, Result};
use crate::parser::ast::Expression;
use crate::parser::TokenSpan;

struct CacheEntry {
    structure: Arc<TemplateStructure>,
    last_used: AtomicU64,
    usage_count: AtomicU64,
}

impl CacheEntry {
    fn touch(&self, tick: u64) {
        self.last_used.store(tick, Ordering::Relaxed);
        self.usage_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bounded, thread-safe cache of template structures
pub struct TemplateCache {
    entries: RwLock<FxHashMap<u64, CacheEntry>>,
    max_size: usize,
    /// Share of `max_size` evicted when the cache is full
    prune_factor: f64,
    tick: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TemplateCache {
    /// Create a cache holding at most `max_size` templates. A size of zero
    /// disables caching: every lookup deduces a fresh template.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            max_size,
            prune_factor: 0.2,
            tick: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the template of `expr`, deducing and caching it if needed
    ///
    /// The returned flag is true when the structure came from the cache.
    pub fn get_or_build(
        &self,
        result_type: &DataType,
        span: &TokenSpan<'_>,
        expr: &Expression,
        ctx: &DeductionContext,
        salt: &str,
    ) -> Result<(Arc<TemplateStructure>, bool)> {
        let shape = TemplateShape::analyze(result_type, span, expr, ctx)?;
        let hash = shape.structural_hash(result_type, salt);
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);

        let collision = {
            let entries = self.entries.read();
            let cached = entries.get(&hash);
            match cached {
                Some(entry) if entry.structure.matches(&shape, result_type, salt) => {
                    entry.touch(tick);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(hash, "template cache hit");
                    return Ok((Arc::clone(&entry.structure), true));
                }
                Some(entry) => {
                    tracing::warn!(
                        hash,
                        cached = entry.structure.result_name(),
                        "template hash collision, building uncached template"
                    );
                    true
                }
                None => false,
            }
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let structure = Arc::new(TemplateStructure::from_shape(
            shape, result_type, ctx, salt, hash,
        )?);
        if collision || self.max_size == 0 {
            return Ok((structure, false));
        }
        Ok(self.insert(hash, structure, tick))
    }

    /// Publish a freshly built structure, deferring to one inserted meanwhile
    fn insert(
        &self,
        hash: u64,
        structure: Arc<TemplateStructure>,
        tick: u64,
    ) -> (Arc<TemplateStructure>, bool) {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&hash) {
            // Built concurrently by another thread
            if existing.structure.matches_structure(&structure) {
                existing.touch(tick);
                return (Arc::clone(&existing.structure), true);
            }
            return (structure, false);
        }

        if entries.len() >= self.max_size {
            self.prune(&mut entries);
        }
        entries.insert(
            hash,
            CacheEntry {
                structure: Arc::clone(&structure),
                last_used: AtomicU64::new(tick),
                usage_count: AtomicU64::new(1),
            },
        );
        tracing::debug!(
            hash,
            template = structure.result_name(),
            size = entries.len(),
            "cached new template"
        );
        (structure, false)
    }

    /// Evict the least recently used entries
    fn prune(&self, entries: &mut FxHashMap<u64, CacheEntry>) {
        let num_to_remove = ((self.max_size as f64) * self.prune_factor).ceil() as usize;
        let num_to_remove = num_to_remove.max(1).min(entries.len());

        let mut candidates: Vec<(u64, u64, u64)> = entries
            .iter()
            .map(|(k, e)| {
                (
                    *k,
                    e.last_used.load(Ordering::Relaxed),
                    e.usage_count.load(Ordering::Relaxed),
                )
            })
            .collect();

        // Oldest first, then least used
        candidates.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.cmp(&b.2)));

        for (key, _, _) in candidates.into_iter().take(num_to_remove) {
            entries.remove(&key);
        }
        tracing::debug!(evicted = num_to_remove, "pruned template cache");
    }

    /// Number of cached templates
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.size(),
            max_size: self.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCache")
            .field("size", &self.size())
            .field("max_size", &self.max_size)
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_with_tokens;

    fn lookup(cache: &TemplateCache, sql: &str, ty: DataType) -> (Arc<TemplateStructure>, bool) {
        let (expr, span) = parse_with_tokens(sql).unwrap();
        cache
            .get_or_build(&ty, &span, &expr, &DeductionContext::default(), "")
            .unwrap()
    }

    #[test]
    fn test_hit_after_miss() {
        let cache = TemplateCache::new(16);
        let (first, found) = lookup(&cache, "1 + 2", DataType::Integer);
        assert!(!found);
        let (second, found) = lookup(&cache, "7 +  8", DataType::Integer);
        assert!(found);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.size(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_distinct_shapes() {
        let cache = TemplateCache::new(16);
        lookup(&cache, "1 + 2", DataType::Integer);
        let (_, found) = lookup(&cache, "1 - 2", DataType::Integer);
        assert!(!found);
        let (_, found) = lookup(&cache, "1 + 2", DataType::Float);
        assert!(!found);
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn test_prune_keeps_bound() {
        let cache = TemplateCache::new(5);
        for i in 0..20 {
            let sql = format!("{} + abs(1){}", 1, " + 1".repeat(i));
            lookup(&cache, &sql, DataType::Integer);
            assert!(cache.size() <= 5);
        }
    }

    #[test]
    fn test_prune_evicts_least_recent() {
        let cache = TemplateCache::new(2);
        lookup(&cache, "1 + 2", DataType::Integer);
        lookup(&cache, "1 * 2", DataType::Integer);
        // Refresh the first entry
        assert!(lookup(&cache, "3 + 4", DataType::Integer).1);
        lookup(&cache, "1 - 2", DataType::Integer);
        assert_eq!(cache.size(), 2);
        assert!(lookup(&cache, "5 + 6", DataType::Integer).1);
        assert!(!lookup(&cache, "5 * 6", DataType::Integer).1);
    }

    #[test]
    fn test_zero_size_disables_caching() {
        let cache = TemplateCache::new(0);
        assert!(!lookup(&cache, "1 + 2", DataType::Integer).1);
        assert!(!lookup(&cache, "1 + 2", DataType::Integer).1);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_clear() {
        let cache = TemplateCache::default();
        assert_eq!(cache.max_size(), DEFAULT_CACHE_SIZE);
        lookup(&cache, "1 + 2", DataType::Integer);
        cache.clear();
        assert_eq!(cache.size(), 0);
        assert!(!lookup(&cache, "1 + 2", DataType::Integer).1);
    }

    fn shape_hash(sql: &str, ty: &DataType) -> u64 {
        let (expr, span) = parse_with_tokens(sql).unwrap();
        TemplateShape::analyze(ty, &span, &expr, &DeductionContext::default())
            .unwrap()
            .structural_hash(ty, "")
    }

    fn seed(cache: &TemplateCache, hash: u64, structure: &Arc<TemplateStructure>) {
        cache.entries.write().insert(
            hash,
            CacheEntry {
                structure: Arc::clone(structure),
                last_used: AtomicU64::new(0),
                usage_count: AtomicU64::new(1),
            },
        );
    }

    #[test]
    fn test_hash_collision_builds_uncached() {
        let cache = TemplateCache::new(4);
        let (other, _) = lookup(&TemplateCache::new(0), "1 - 2", DataType::Integer);
        let hash = shape_hash("1 + 2", &DataType::Integer);
        seed(&cache, hash, &other);

        let (built, found) = lookup(&cache, "1 + 2", DataType::Integer);
        assert!(!found);
        assert!(!Arc::ptr_eq(&built, &other));
        assert_eq!(built.result_name(), "(_dummy_0 + _dummy_1)");

        // The resident entry is left alone
        assert_eq!(cache.size(), 1);
        let entries = cache.entries.read();
        assert!(Arc::ptr_eq(&entries[&hash].structure, &other));
        drop(entries);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_concurrent_insert_prefers_resident() {
        let cache = TemplateCache::new(4);
        let (resident, _) = lookup(&TemplateCache::new(0), "1 + 2", DataType::Integer);
        let (late, _) = lookup(&TemplateCache::new(0), "3 + 4", DataType::Integer);
        let hash = resident.structural_hash();
        seed(&cache, hash, &resident);

        let (kept, found) = cache.insert(hash, Arc::clone(&late), 1);
        assert!(found);
        assert!(Arc::ptr_eq(&kept, &resident));

        // A different structure under the same key is returned without caching
        let (other, _) = lookup(&TemplateCache::new(0), "1 * 2", DataType::Integer);
        let (kept, found) = cache.insert(hash, Arc::clone(&other), 2);
        assert!(!found);
        assert!(Arc::ptr_eq(&kept, &other));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_deduction_error_not_cached() {
        let cache = TemplateCache::new(4);
        let (expr, span) = parse_with_tokens("1 + 'a'").unwrap();
        let result =
            cache.get_or_build(&DataType::Integer, &span, &expr, &DeductionContext::default(), "");
        assert!(result.is_err());
        assert_eq!(cache.size(), 0);
    }
}

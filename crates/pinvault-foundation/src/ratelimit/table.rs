//! LRU-bounded bucket storage shared by every limiter strategy.
//!
//! The table never holds more buckets than its capacity: inserting a new key
//! into a full table pops the least-recently-used bucket first. Recency is the
//! LRU order itself, so buckets carry no separate last-access timestamp. Every
//! check promotes its bucket, rejected ones included, so a client that keeps
//! hammering stays tracked (and blocked) instead of aging out.

use lru::LruCache;
use parking_lot::Mutex;
use pinvault_kernel::ratelimit::normalize_identifier;
use std::num::NonZeroUsize;
use tracing::debug;

/// Structured `(scope, identifier)` key.
///
/// Keeping the parts apart means `("a", "b:c")` and `("a:b", "c")` can never
/// share a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BucketKey {
    scope: Option<Box<str>>,
    identifier: Box<str>,
}

impl BucketKey {
    pub(crate) fn new(scope: Option<&str>, identifier: &str) -> Self {
        Self {
            scope: scope.map(Into::into),
            identifier: normalize_identifier(identifier).into(),
        }
    }

    pub(crate) fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

pub(crate) struct BucketTable<B> {
    buckets: Mutex<LruCache<BucketKey, B>>,
}

impl<B> BucketTable<B> {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            buckets: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Run `f` on the bucket for `key`, creating it with `create` if missing.
    ///
    /// The bucket becomes the most recently used entry.
    pub(crate) fn with_bucket<R>(
        &self,
        key: BucketKey,
        create: impl FnOnce() -> B,
        f: impl FnOnce(&mut B) -> R,
    ) -> R {
        let mut buckets = self.buckets.lock();

        if !buckets.contains(&key) && buckets.len() >= buckets.cap().get() {
            if let Some((evicted, _)) = buckets.pop_lru() {
                debug!(
                    identifier = evicted.identifier(),
                    scope = evicted.scope(),
                    capacity = buckets.cap().get(),
                    "evicted least recently used rate limit bucket"
                );
            }
        }

        f(buckets.get_or_insert_mut(key, create))
    }

    /// Run `f` on the bucket for `key` without creating it or touching recency.
    pub(crate) fn peek<R>(&self, key: &BucketKey, f: impl FnOnce(&B) -> R) -> Option<R> {
        self.buckets.lock().peek(key).map(f)
    }

    pub(crate) fn remove(&self, key: &BucketKey) -> bool {
        self.buckets.lock().pop(key).is_some()
    }

    /// Drop every bucket for which `expired` returns `true`.
    pub(crate) fn retain_live(&self, expired: impl Fn(&B) -> bool) -> usize {
        let mut buckets = self.buckets.lock();
        let stale: Vec<BucketKey> = buckets
            .iter()
            .filter(|(_, bucket)| expired(bucket))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            buckets.pop(key);
        }
        stale.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.lock().len()
    }
}

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use staterail_core::api::{TemplateFuture, TemplateResolver, TemplateSource};

/// Keeps the shared futures of recently used `Url` templates.
///
/// Concurrent slots asking for the same template share one load. A load that
/// finished with an error is dropped from the cache on the next lookup.
pub struct CachingTemplateResolver {
    inner: Arc<dyn TemplateResolver>,
    cache: Mutex<LruCache<String, TemplateFuture>>,
}

impl CachingTemplateResolver {
    pub fn new(inner: Arc<dyn TemplateResolver>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateResolver for CachingTemplateResolver {
    fn resolve(&self, source: &TemplateSource) -> TemplateFuture {
        let source = source.flatten();
        let TemplateSource::Url(url) = &source else {
            return self.inner.resolve(&source);
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let failed = match cache.get(url) {
            Some(cached) if !matches!(cached.peek(), Some(Err(_))) => return cached.clone(),
            Some(_) => true,
            None => false,
        };
        if failed {
            tracing::debug!(url = %url, "evicting failed template");
            cache.pop(url);
        }

        let future = self.inner.resolve(&source);
        cache.put(url.clone(), future.clone());
        future
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use staterail_core::api::{failed, ready, TemplateError};

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
        fail: bool,
    }

    impl TemplateResolver for CountingResolver {
        fn resolve(&self, source: &TemplateSource) -> TemplateFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return failed(TemplateError::Io("down".to_string()));
            }
            ready(format!("{source:?}"))
        }
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_url_templates_are_shared() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = CachingTemplateResolver::new(inner.clone(), capacity(4));

        let a = resolver.resolve(&TemplateSource::url("a.html"));
        let b = resolver.resolve(&TemplateSource::url("a.html"));
        assert_eq!(a.await.unwrap(), b.await.unwrap());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        let _ = resolver.resolve(&TemplateSource::inline("<x/>"));
        let _ = resolver.resolve(&TemplateSource::inline("<x/>"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(resolver.len(), 1);
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = CachingTemplateResolver::new(inner.clone(), capacity(1));

        let _ = resolver.resolve(&TemplateSource::url("a.html"));
        let _ = resolver.resolve(&TemplateSource::url("b.html"));
        let _ = resolver.resolve(&TemplateSource::url("a.html"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let inner = Arc::new(CountingResolver {
            fail: true,
            ..Default::default()
        });
        let resolver = CachingTemplateResolver::new(inner.clone(), capacity(4));

        assert!(resolver.resolve(&TemplateSource::url("a.html")).await.is_err());
        assert!(resolver.resolve(&TemplateSource::url("a.html")).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}

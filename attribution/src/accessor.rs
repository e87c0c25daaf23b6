use crate::metrics_defs::{
    TEMPLATE_CACHE_HIT, TEMPLATE_CACHE_MISS, TEMPLATE_FALLBACK_USED, TEMPLATE_FETCH_DURATION,
    TEMPLATE_STORE_ERROR,
};
use crate::store::{StoreError, TemplateFilter, TemplateStore};
use crate::template::{ACTIVE_TEMPLATE_ID, TEMPLATE_SOURCE, Template};
use parking_lot::RwLock;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long a fetched template is served without asking the store again.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CachedTemplate {
    template: Arc<Template>,
    fetched_at: Instant,
}

/// Last resolved template and when it was resolved.
///
/// The lock is only held to copy the entry in or out and never across an
/// await. Concurrent refreshes overwrite each other; every writer stores a
/// template resolved from the same store so last-writer-wins is fine.
pub struct TemplateCache {
    entry: RwLock<Option<CachedTemplate>>,
    freshness: Duration,
}

impl TemplateCache {
    pub fn new(freshness: Duration) -> Self {
        TemplateCache {
            entry: RwLock::new(None),
            freshness,
        }
    }

    /// The cached template if it is younger than the freshness window.
    fn fresh(&self, now: Instant) -> Option<Arc<Template>> {
        self.entry
            .read()
            .as_ref()
            .filter(|cached| now.duration_since(cached.fetched_at) < self.freshness)
            .map(|cached| cached.template.clone())
    }

    /// The cached template regardless of age.
    fn any(&self) -> Option<Arc<Template>> {
        self.entry
            .read()
            .as_ref()
            .map(|cached| cached.template.clone())
    }

    fn store(&self, template: Arc<Template>, fetched_at: Instant) {
        *self.entry.write() = Some(CachedTemplate {
            template,
            fetched_at,
        });
    }

    pub fn is_populated(&self) -> bool {
        self.entry.read().is_some()
    }
}

/// Resolves the active session template. Never fails: store problems degrade
/// to the last cached template, then to [`Template::fallback`].
pub struct TemplateAccessor {
    store: Arc<dyn TemplateStore>,
    cache: TemplateCache,
}

impl TemplateAccessor {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self::with_freshness(store, FRESHNESS_WINDOW)
    }

    pub fn with_freshness(store: Arc<dyn TemplateStore>, freshness: Duration) -> Self {
        TemplateAccessor {
            store,
            cache: TemplateCache::new(freshness),
        }
    }

    /// True once any template has been resolved and cached.
    pub fn is_warm(&self) -> bool {
        self.cache.is_populated()
    }

    pub async fn get_active_template(&self) -> Arc<Template> {
        let now = Instant::now();

        if let Some(template) = self.cache.fresh(now) {
            counter!(TEMPLATE_CACHE_HIT).increment(1);
            return template;
        }
        counter!(TEMPLATE_CACHE_MISS).increment(1);

        let fetch_result = self.fetch().await;
        histogram!(TEMPLATE_FETCH_DURATION).record(now.elapsed().as_secs_f64());

        match fetch_result {
            Ok(template) => {
                let template = Arc::new(template);
                self.cache.store(template.clone(), now);
                template
            }
            Err(err) => {
                let stale = self.cache.any();
                let recovered_from = if stale.is_some() { "stale_cache" } else { "fallback" };

                tracing::warn!(
                    error_kind = err.kind(),
                    recovered_from,
                    "Template store unavailable"
                );
                counter!(
                    TEMPLATE_STORE_ERROR,
                    "kind" => err.kind(),
                    "recovered_from" => recovered_from
                )
                .increment(1);

                stale.unwrap_or_else(|| {
                    counter!(TEMPLATE_FALLBACK_USED).increment(1);
                    Arc::new(Template::fallback())
                })
            }
        }
    }

    /// Looks the template up by id, then by source, then settles on the
    /// built-in fallback. Only store errors are returned.
    async fn fetch(&self) -> Result<Template, StoreError> {
        let lookups = [
            TemplateFilter::ActiveById(ACTIVE_TEMPLATE_ID.to_string()),
            TemplateFilter::ActiveBySource(TEMPLATE_SOURCE.to_string()),
        ];

        for filter in &lookups {
            if let Some(template) = self.store.find_one(filter).await? {
                tracing::debug!(template_id = %template.id, filter = ?filter, "Resolved template");
                return Ok(template);
            }
        }

        tracing::info!("No active template in store, using fallback template");
        counter!(TEMPLATE_FALLBACK_USED).increment(1);
        Ok(Template::fallback())
    }
}

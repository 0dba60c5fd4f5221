// src/aggregate.rs
//! Provider fan-out: every enabled provider is queried concurrently, the join
//! waits for all of them to settle, and failures only cost that provider's
//! contribution.

use std::time::Duration;

use metrics::counter;
use tracing::{info, warn};

use crate::article::{dedupe, Category, NormalizedArticle};
use crate::error::NewsError;
use crate::providers::DynProvider;

pub struct Aggregator {
    providers: Vec<DynProvider>,
    timeout: Duration,
}

impl Aggregator {
    /// `timeout` bounds each provider call on top of the HTTP client's own.
    pub fn new(providers: Vec<DynProvider>, timeout: Duration) -> Self {
        let providers: Vec<DynProvider> =
            providers.into_iter().filter(|p| p.is_enabled()).collect();
        info!(
            target: "aggregate",
            providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "aggregator ready"
        );
        Self { providers, timeout }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Deduplicated articles for `category`, at most `count` of them.
    /// Never fails: provider errors, timeouts and panics are logged and skipped.
    pub async fn aggregate(&self, category: Category, count: usize) -> Vec<NormalizedArticle> {
        if self.providers.is_empty() {
            warn!(
                target: "aggregate",
                %category,
                error = %NewsError::NoProvidersConfigured,
                "returning no articles"
            );
            return Vec::new();
        }

        // Spawn first so all requests are in flight, then await in enumeration
        // order so the concatenation is provider order, not completion order.
        let handles: Vec<_> = self
            .providers
            .iter()
            .map(|p| {
                let provider = p.clone();
                let timeout = self.timeout;
                counter!("news_provider_requests_total", "provider" => provider.name())
                    .increment(1);
                tokio::spawn(async move {
                    tokio::time::timeout(timeout, provider.fetch(category, count)).await
                })
            })
            .collect();

        let mut merged = Vec::new();
        for (provider, handle) in self.providers.iter().zip(handles) {
            let name = provider.name();
            let outcome = match handle.await {
                Ok(Ok(Ok(items))) => Ok(items),
                Ok(Ok(Err(e))) => Err(e),
                Ok(Err(_elapsed)) => Err(anyhow::anyhow!("timed out after {:?}", self.timeout)),
                Err(join) => Err(anyhow::anyhow!("provider task failed: {join}")),
            };
            match outcome {
                Ok(items) if items.is_empty() => {
                    info!(
                        target: "aggregate",
                        provider = name,
                        %category,
                        "provider returned no articles"
                    );
                }
                Ok(mut items) => {
                    counter!("news_provider_articles_total", "provider" => name)
                        .increment(items.len() as u64);
                    merged.append(&mut items);
                }
                Err(source) => {
                    let err = NewsError::ProviderUnavailable {
                        provider: name,
                        source,
                    };
                    warn!(
                        target: "aggregate",
                        provider = name,
                        %category,
                        error = %err,
                        "provider skipped"
                    );
                    counter!("news_provider_errors_total", "provider" => name).increment(1);
                }
            }
        }

        let before = merged.len();
        let mut out = dedupe(merged);
        counter!("news_dedup_dropped_total").increment((before - out.len()) as u64);
        out.truncate(count);
        info!(target: "aggregate", %category, unique = out.len(), "aggregated articles");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleDraft;
    use crate::providers::NewsProvider;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    struct Slow;

    #[async_trait]
    impl NewsProvider for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }
        fn is_enabled(&self) -> bool {
            true
        }
        async fn fetch(&self, _c: Category, _n: usize) -> Result<Vec<NormalizedArticle>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    struct Quick;

    #[async_trait]
    impl NewsProvider for Quick {
        fn name(&self) -> &'static str {
            "quick"
        }
        fn is_enabled(&self) -> bool {
            true
        }
        async fn fetch(&self, c: Category, _n: usize) -> Result<Vec<NormalizedArticle>> {
            Ok(vec![ArticleDraft {
                provider: "quick",
                title: Some("Fast news".into()),
                url: Some("https://q.test/1".into()),
                ..Default::default()
            }
            .build(c, Utc::now())])
        }
    }

    struct Panics;

    #[async_trait]
    impl NewsProvider for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }
        fn is_enabled(&self) -> bool {
            true
        }
        async fn fetch(&self, _c: Category, _n: usize) -> Result<Vec<NormalizedArticle>> {
            panic!("adapter bug")
        }
    }

    #[tokio::test]
    async fn hung_provider_times_out_without_blocking_others() {
        let agg = Aggregator::new(
            vec![Arc::new(Slow), Arc::new(Quick)],
            Duration::from_millis(50),
        );
        let out = agg.aggregate(Category::General, 5).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Fast news");
    }

    #[tokio::test]
    async fn panicking_adapter_is_contained() {
        let agg = Aggregator::new(
            vec![Arc::new(Panics), Arc::new(Quick)],
            Duration::from_secs(1),
        );
        let out = agg.aggregate(Category::Science, 5).await;
        assert_eq!(out.len(), 1);
    }
}

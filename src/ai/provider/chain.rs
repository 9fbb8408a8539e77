//! Deterministic Image Fallback Chain
//!
//! Tries image providers one at a time in a fixed order and returns the first
//! success together with a log of every candidate considered.
//!
//! ## Strategy
//!
//! 1. Try-order = resolved preference (if any) followed by the configured
//!    priority list, duplicates removed
//! 2. Candidates without an adapter or credential are logged as skipped and
//!    do not count as attempts
//! 3. Every other candidate is invoked exactly once; failures are logged and
//!    the chain moves on
//! 4. Exhaustion yields `AggregateFailure` (last failure reason) when at least
//!    one real attempt failed, otherwise `NoProviderConfigured`
//!
//! No retries, no concurrent fan-out, no reordering by cost or latency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::preference::resolve_preference;
use super::{ImageProviderRegistry, ImageResult};
use crate::constants::chain as chain_constants;
use crate::types::{GenError, GenerationRequest, MediaKind, ProviderId, Result};

// =============================================================================
// Attempt Log
// =============================================================================

/// What happened to one candidate provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure(String),
    Skipped(String),
}

/// One entry in the fallback log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider_id: ProviderId,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

/// Ordered record of one chain run, read-only once returned
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackAttemptLog {
    records: Vec<AttemptRecord>,
}

impl FallbackAttemptLog {
    fn push(&mut self, provider_id: ProviderId, outcome: AttemptOutcome) {
        self.records.push(AttemptRecord {
            provider_id,
            outcome,
            at: Utc::now(),
        });
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Real invocations (skips excluded)
    pub fn attempt_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !matches!(r.outcome, AttemptOutcome::Skipped(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.len() - self.attempt_count()
    }

    /// Reason of the most recent failed attempt
    pub fn last_failure(&self) -> Option<&str> {
        self.records.iter().rev().find_map(|r| match &r.outcome {
            AttemptOutcome::Failure(reason) => Some(reason.as_str()),
            _ => None,
        })
    }
}

/// Successful chain run
#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    pub result: ImageResult,
    pub attempts: FallbackAttemptLog,
}

impl ImageOutcome {
    pub fn image_uri(&self) -> String {
        self.result.payload.to_uri()
    }

    pub fn provider_id(&self) -> &ProviderId {
        &self.result.provider_id
    }
}

// =============================================================================
// Image Chain
// =============================================================================

/// Sequential fallback over registered image providers
#[derive(Debug, Clone)]
pub struct ImageChain {
    registry: ImageProviderRegistry,
    priority: Vec<ProviderId>,
}

impl ImageChain {
    pub fn new<I, P>(registry: ImageProviderRegistry, priority: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProviderId>,
    {
        Self {
            registry,
            priority: priority.into_iter().map(Into::into).collect(),
        }
    }

    /// Chain with the built-in priority order
    pub fn with_default_priority(registry: ImageProviderRegistry) -> Self {
        Self::new(registry, chain_constants::DEFAULT_PRIORITY)
    }

    pub fn registry(&self) -> &ImageProviderRegistry {
        &self.registry
    }

    /// Candidate order for a request naming `preferred` (raw label)
    pub fn try_order(&self, preferred: Option<&str>) -> Vec<ProviderId> {
        let mut order: Vec<ProviderId> = Vec::with_capacity(self.priority.len() + 1);
        let head = preferred.and_then(resolve_preference);

        for id in head.into_iter().chain(self.priority.iter().cloned()) {
            if !order.contains(&id) {
                order.push(id);
            }
        }
        order
    }

    /// Run the chain for an image request
    #[instrument(
        skip(self, request),
        fields(run_id = %Uuid::new_v4(), aspect = %request.aspect_ratio(), preferred = ?request.preferred_provider())
    )]
    pub async fn resolve(&self, request: &GenerationRequest) -> Result<ImageOutcome> {
        if request.kind() != MediaKind::Image {
            return Err(GenError::unsupported("kind", request.kind().to_string()));
        }

        let mut log = FallbackAttemptLog::default();

        for id in self.try_order(request.preferred_provider()) {
            let provider = match self.registry.lookup(id.as_str()) {
                Ok(provider) if provider.is_configured() => provider,
                _ => {
                    debug!(provider = %id, "Skipping provider (not configured)");
                    log.push(
                        id,
                        AttemptOutcome::Skipped(chain_constants::SKIPPED_NOT_CONFIGURED.to_string()),
                    );
                    continue;
                }
            };

            debug!(provider = %id, attempt = log.attempt_count() + 1, "Chain attempt");

            match provider.generate(request.prompt(), request.aspect_ratio()).await {
                Ok(result) => {
                    log.push(id.clone(), AttemptOutcome::Success);
                    info!(
                        provider = %id,
                        attempts = log.attempt_count(),
                        skipped = log.skipped_count(),
                        "Chain succeeded"
                    );
                    return Ok(ImageOutcome {
                        result,
                        attempts: log,
                    });
                }
                Err(err) if err.is_not_configured() => {
                    debug!(provider = %id, error = %err, "Provider reported missing configuration");
                    log.push(
                        id,
                        AttemptOutcome::Skipped(chain_constants::SKIPPED_NOT_CONFIGURED.to_string()),
                    );
                }
                Err(err) => {
                    warn!(provider = %id, error = %err, "Provider failed");
                    log.push(id, AttemptOutcome::Failure(err.to_string()));
                }
            }
        }

        match log.last_failure().map(str::to_string) {
            Some(last_reason) => {
                warn!(attempts = log.attempt_count(), "All image providers failed");
                Err(GenError::AggregateFailure {
                    last_reason,
                    attempts: log,
                })
            }
            None => {
                warn!(candidates = log.len(), "No image provider configured");
                Err(GenError::NoProviderConfigured { attempts: log })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ImagePayload, ImageProvider};
    use crate::types::{AspectRatio, ErrorCategory, ErrorCode, ProviderError};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        id: String,
        configured: bool,
        succeed: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(id: &str, configured: bool, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                configured,
                succeed,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageProvider for ScriptedProvider {
        fn id(&self) -> &str {
            &self.id
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> std::result::Result<ImageResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(ImageResult {
                    provider_id: ProviderId::new(self.id.clone()),
                    payload: ImagePayload::Uri {
                        uri: format!("https://{}.example/out.png", self.id),
                    },
                    metadata: serde_json::Value::Null,
                })
            } else {
                Err(ProviderError::invocation(
                    self.id.clone(),
                    ErrorCategory::Transient,
                    format!("{} exploded", self.id),
                ))
            }
        }
    }

    fn chain_of(providers: &[Arc<ScriptedProvider>]) -> ImageChain {
        let registry = providers
            .iter()
            .fold(ImageProviderRegistry::new(), |reg, p| reg.register(p.clone()));
        ImageChain::with_default_priority(registry)
    }

    fn request() -> GenerationRequest {
        GenerationRequest::image("a lighthouse at dusk", AspectRatio::Square).unwrap()
    }

    #[test]
    fn test_try_order_puts_preference_first_without_duplicates() {
        let chain = chain_of(&[]);
        assert_eq!(
            chain.try_order(Some("flux-pro")),
            vec![ProviderId::fal(), ProviderId::openai(), ProviderId::stability()]
        );
        assert_eq!(
            chain.try_order(None),
            vec![ProviderId::openai(), ProviderId::stability(), ProviderId::fal()]
        );
        assert_eq!(chain.try_order(Some("xyz"))[0], ProviderId::new("xyz"));
    }

    #[tokio::test]
    async fn test_unconfigured_preference_then_priority_success() {
        // preference fal (no key), openai fails, stability succeeds
        let openai = ScriptedProvider::new("openai", true, false);
        let stability = ScriptedProvider::new("stability", true, true);
        let fal = ScriptedProvider::new("fal", false, true);
        let chain = chain_of(&[openai.clone(), stability.clone(), fal.clone()]);

        let outcome = chain
            .resolve(&request().preferring("flux").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome.provider_id(), &ProviderId::stability());
        let outcomes: Vec<_> = outcome
            .attempts
            .records()
            .iter()
            .map(|r| (r.provider_id.as_str().to_string(), r.outcome.clone()))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("fal".to_string(), AttemptOutcome::Skipped("not configured".to_string())),
                ("openai".to_string(), AttemptOutcome::Failure(
                    "openai invocation failed [TRANSIENT]: openai exploded".to_string()
                )),
                ("stability".to_string(), AttemptOutcome::Success),
            ]
        );
        assert_eq!(outcome.attempts.attempt_count(), 2);
        assert_eq!(fal.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_failures_yield_aggregate_with_last_reason() {
        let chain = chain_of(&[
            ScriptedProvider::new("openai", true, false),
            ScriptedProvider::new("stability", true, false),
            ScriptedProvider::new("fal", true, false),
        ]);

        let err = chain.resolve(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AggregateFailure);
        match &err {
            GenError::AggregateFailure { last_reason, attempts } => {
                assert!(last_reason.contains("fal exploded"));
                assert_eq!(attempts.attempt_count(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nothing_configured_yields_no_provider_configured() {
        let providers = [
            ScriptedProvider::new("openai", false, true),
            ScriptedProvider::new("stability", false, true),
            ScriptedProvider::new("fal", false, true),
        ];
        let chain = chain_of(&providers);

        let err = chain.resolve(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoProviderConfigured);
        let attempts = err.attempts().unwrap();
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts.attempt_count(), 0);
        assert!(providers.iter().all(|p| p.calls() == 0));
    }

    #[tokio::test]
    async fn test_unknown_preference_is_skipped_not_failed() {
        let chain = chain_of(&[ScriptedProvider::new("openai", true, true)]);

        let outcome = chain
            .resolve(&request().preferring("xyz").unwrap())
            .await
            .unwrap();
        let first = &outcome.attempts.records()[0];
        assert_eq!(first.provider_id, ProviderId::new("xyz"));
        assert!(matches!(first.outcome, AttemptOutcome::Skipped(_)));
        assert_eq!(outcome.provider_id(), &ProviderId::openai());
    }

    #[tokio::test]
    async fn test_video_request_rejected() {
        let chain = chain_of(&[ScriptedProvider::new("openai", true, true)]);
        let video = GenerationRequest::video("a wave", AspectRatio::Landscape).unwrap();

        let err = chain.resolve(&video).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedParameter);
    }

    #[test]
    fn test_attempt_log_serializes_outcome_inline() {
        let mut log = FallbackAttemptLog::default();
        log.push(ProviderId::fal(), AttemptOutcome::Skipped("not configured".into()));

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["provider_id"], "fal");
        assert_eq!(json[0]["outcome"], "skipped");
        assert_eq!(json[0]["reason"], "not configured");
    }

    proptest! {
        /// The first configured, succeeding candidate in try-order wins, and
        /// only configured candidates before it are counted as attempts.
        #[test]
        fn prop_first_configured_success_wins(
            flags in proptest::collection::vec((any::<bool>(), any::<bool>()), 3)
        ) {
            let ids = ["openai", "stability", "fal"];
            let providers: Vec<_> = ids
                .iter()
                .zip(&flags)
                .map(|(id, (configured, succeed))| ScriptedProvider::new(id, *configured, *succeed))
                .collect();
            let chain = chain_of(&providers);

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let result = runtime.block_on(chain.resolve(&request()));

            let winner = flags.iter().position(|(c, s)| *c && *s);
            let considered = winner.map(|w| w + 1).unwrap_or(ids.len());
            let expected_attempts = flags[..considered].iter().filter(|(c, _)| *c).count();

            match (winner, result) {
                (Some(w), Ok(outcome)) => {
                    prop_assert_eq!(outcome.provider_id().as_str(), ids[w]);
                    prop_assert_eq!(outcome.attempts.attempt_count(), expected_attempts);
                    prop_assert_eq!(outcome.attempts.len(), considered);
                }
                (None, Err(err)) => {
                    let expected = if expected_attempts > 0 {
                        ErrorCode::AggregateFailure
                    } else {
                        ErrorCode::NoProviderConfigured
                    };
                    prop_assert_eq!(err.code(), expected);
                    prop_assert_eq!(err.attempts().map(|a| a.attempt_count()), Some(expected_attempts));
                }
                (winner, result) => {
                    prop_assert!(false, "winner {:?} but result ok = {}", winner, result.is_ok());
                }
            }

            for (provider, (configured, _)) in providers.iter().zip(&flags) {
                if !configured {
                    prop_assert_eq!(provider.calls(), 0);
                }
            }
        }
    }
}

//! Cache-aside fetch broker with a single-flight guarantee.
//!
//! The raw cache is upsert-on-miss: two callers missing on the same
//! fingerprint would both pay for the expensive computation and the
//! later write would win. The broker closes that gap inside one
//! process by serializing in-flight computations per fingerprint.
//! Callers for different fingerprints never wait on each other, and a
//! caller that loses the race fills from the row the winner wrote.

use crate::db::MarketStore;
use crate::fingerprint::query_fingerprint;
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// An external text-producing service the cache wraps.
///
/// Implementations map their own failures into
/// [`StoreError::ProviderError`](crate::StoreError::ProviderError).
pub trait AnalysisProvider {
    /// Label recorded as the cache entry's source, e.g. "openai".
    fn source(&self) -> &str;

    /// Produce the analysis text for one subject and query kind.
    fn analyze(
        &self,
        subject: &str,
        kind: &str,
        parameters: &Value,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// How a fetch was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from an existing live cache entry.
    Hit,
    /// The provider ran and the result was written through.
    Computed,
}

/// Owns a store handle and a provider; all state is behind locks so a
/// single broker can be shared across tasks.
pub struct AnalysisBroker<P> {
    store: MarketStore,
    provider: P,
    session_token: String,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<P: AnalysisProvider> AnalysisBroker<P> {
    pub fn new(store: MarketStore, provider: P) -> Self {
        Self {
            store,
            provider,
            session_token: Uuid::new_v4().to_string(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The token attached to telemetry events from this broker.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Cache-aside fetch. Returns the payload and whether it came from
    /// the cache or from a fresh computation. `ttl_hours` of `None`
    /// caches the computed result without expiry.
    pub async fn fetch(
        &self,
        subject: &str,
        kind: &str,
        parameters: &Value,
        ttl_hours: Option<u32>,
    ) -> Result<(String, FetchOutcome)> {
        if let Some(entry) = self.store.cached_analysis(subject, kind, parameters)? {
            return Ok((entry.payload, FetchOutcome::Hit));
        }

        let fingerprint = query_fingerprint(subject, kind, parameters)?;
        let gate = self.gate_for(&fingerprint).await;

        let result = {
            let _guard = gate.lock().await;
            self.fill(subject, kind, parameters, ttl_hours).await
        };

        self.release_gate(&fingerprint, &gate).await;
        result
    }

    /// Runs with the fingerprint gate held. The re-check turns the
    /// racer that lost into a cache hit instead of a second provider
    /// call.
    async fn fill(
        &self,
        subject: &str,
        kind: &str,
        parameters: &Value,
        ttl_hours: Option<u32>,
    ) -> Result<(String, FetchOutcome)> {
        if let Some(entry) = self.store.cached_analysis(subject, kind, parameters)? {
            return Ok((entry.payload, FetchOutcome::Hit));
        }

        let payload = self.provider.analyze(subject, kind, parameters).await?;
        self.store.store_analysis(
            subject,
            kind,
            parameters,
            &payload,
            self.provider.source(),
            ttl_hours,
        )?;

        // Telemetry must never poison the caller's flow.
        let event = json!({ "subject": subject, "kind": kind });
        if let Err(err) =
            self.store
                .record_event("market_analysis", Some(&event), Some(&self.session_token))
        {
            warn!(
                target: "marketscope::broker",
                error = %err,
                "failed to record analysis telemetry"
            );
        }

        Ok((payload, FetchOutcome::Computed))
    }

    async fn gate_for(&self, fingerprint: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight
            .entry(fingerprint.to_string())
            .or_default()
            .clone()
    }

    /// Drop the map entry once nobody else is waiting on it. Gates are
    /// only cloned under the map lock, so the count check here is
    /// race-free.
    async fn release_gate(&self, fingerprint: &str, gate: &Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        if Arc::strong_count(gate) <= 2 {
            in_flight.remove(fingerprint);
        }
    }
}

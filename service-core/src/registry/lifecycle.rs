//! Registration lifecycle of a provider service.
//!
//! ```text
//! NotRegistered --register ok--> Registered --release--> (deregistered)
//! NotRegistered --attempts exhausted--> Failed
//! ```
//!
//! A failed registration never yields a [`Registration`], so neither the
//! liveness loop nor the deregistration on shutdown can be installed for it.

use super::client::RegistryClient;
use super::descriptor::ServiceDescriptor;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    NotRegistered,
    Registered,
    Failed,
}

impl std::fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationState::NotRegistered => write!(f, "not_registered"),
            RegistrationState::Registered => write!(f, "registered"),
            RegistrationState::Failed => write!(f, "failed"),
        }
    }
}

/// Fixed-delay retry policy for registration.
///
/// Attempts are strictly sequential; the worst case blocks for
/// `(max_attempts - 1) * retry_delay` plus the time spent in the calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }
}

/// Put `descriptor` into the registry, retrying per `policy`.
///
/// Any transport error or non-success status counts as a failed attempt.
/// Returns `Registered` on the first success and `Failed` once every attempt
/// has been used; exactly one registry call is made per attempt.
pub async fn register(
    client: &dyn RegistryClient,
    descriptor: &ServiceDescriptor,
    policy: &RetryPolicy,
) -> RegistrationState {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match client.register(descriptor).await {
            Ok(()) => {
                metrics::counter!("registry_registration_attempts_total", "outcome" => "success")
                    .increment(1);
                info!(
                    service_id = %descriptor.service_id,
                    registry = client.endpoint(),
                    attempt,
                    "Service registered"
                );
                return RegistrationState::Registered;
            }
            Err(err) => {
                metrics::counter!("registry_registration_attempts_total", "outcome" => "failure")
                    .increment(1);

                if attempt >= max_attempts {
                    error!(
                        service_id = %descriptor.service_id,
                        registry = client.endpoint(),
                        attempts = attempt,
                        error = %err,
                        "Registration failed, giving up"
                    );
                    return RegistrationState::Failed;
                }

                warn!(
                    service_id = %descriptor.service_id,
                    attempt,
                    max_attempts,
                    kind = err.kind(),
                    error = %err,
                    retry_in_ms = policy.retry_delay.as_millis() as u64,
                    "Registration attempt failed, retrying"
                );

                sleep(policy.retry_delay).await;
                attempt += 1;
            }
        }
    }
}

/// Remove `descriptor` from the registry with a single call.
///
/// Failure is logged and reported as `false`; it is never retried because the
/// process is on its way out.
pub async fn deregister(client: &dyn RegistryClient, descriptor: &ServiceDescriptor) -> bool {
    match client.deregister(&descriptor.service_id).await {
        Ok(()) => {
            info!(service_id = %descriptor.service_id, "Service deregistered");
            true
        }
        Err(err) => {
            warn!(
                service_id = %descriptor.service_id,
                kind = err.kind(),
                error = %err,
                "Deregistration failed"
            );
            false
        }
    }
}

#[derive(Debug, Error)]
#[error("service {service_id} could not be registered after {attempts} attempts")]
pub struct RegistrationFailed {
    pub service_id: String,
    pub attempts: u32,
}

/// Proof that the service sits in the registry catalog.
///
/// Releasing consumes the value, so deregistration happens at most once.
#[must_use = "a Registration must be released on shutdown"]
pub struct Registration {
    client: Arc<dyn RegistryClient>,
    descriptor: Arc<ServiceDescriptor>,
}

impl Registration {
    /// Register `descriptor` per `policy` and hand back the release capability.
    pub async fn acquire(
        client: Arc<dyn RegistryClient>,
        descriptor: Arc<ServiceDescriptor>,
        policy: &RetryPolicy,
    ) -> Result<Self, RegistrationFailed> {
        match register(client.as_ref(), &descriptor, policy).await {
            RegistrationState::Registered => Ok(Self { client, descriptor }),
            _ => Err(RegistrationFailed {
                service_id: descriptor.service_id.clone(),
                attempts: policy.max_attempts.max(1),
            }),
        }
    }

    /// Deregister; returns whether the registry acknowledged the removal.
    pub async fn release(self) -> bool {
        deregister(self.client.as_ref(), &self.descriptor).await
    }
}

/// Work performed on every liveness tick.
#[async_trait]
pub trait LivenessCheck: Send + Sync + 'static {
    async fn check(&self) -> Result<(), String>;
}

/// Tick that only proves the loop is alive. The registry pulls health through
/// the descriptor's check URL, so there is nothing to evaluate here yet.
pub struct InertCheck;

#[async_trait]
impl LivenessCheck for InertCheck {
    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Background cadence started after a successful registration.
///
/// Each tick runs the check in its own task: an error or panic in one tick is
/// logged and the loop carries on. The loop ends only when stopped, and a
/// tick still running at that point is aborted.
pub struct LivenessLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl LivenessLoop {
    pub fn spawn(
        descriptor: Arc<ServiceDescriptor>,
        interval: Duration,
        check: Arc<dyn LivenessCheck>,
    ) -> Self {
        let token = CancellationToken::new();
        let shutdown = token.clone();
        let period = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            info!(
                service_id = %descriptor.service_id,
                interval_ms = period.as_millis() as u64,
                "Liveness loop started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let check = check.clone();
                        let mut tick = tokio::spawn(async move { check.check().await });

                        let outcome = tokio::select! {
                            _ = shutdown.cancelled() => {
                                tick.abort();
                                warn!(
                                    service_id = %descriptor.service_id,
                                    "Liveness tick abandoned on shutdown"
                                );
                                break;
                            }
                            joined = &mut tick => joined,
                        };

                        match outcome {
                            Ok(Ok(())) => {
                                debug!(service_id = %descriptor.service_id, "Liveness tick");
                            }
                            Ok(Err(reason)) => {
                                warn!(
                                    service_id = %descriptor.service_id,
                                    reason = %reason,
                                    "Liveness check reported a problem"
                                );
                            }
                            Err(join_error) => {
                                error!(
                                    service_id = %descriptor.service_id,
                                    error = %join_error,
                                    "Liveness tick aborted"
                                );
                            }
                        }
                    }
                }
            }

            info!(service_id = %descriptor.service_id, "Liveness loop stopped");
        });

        Self { token, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to wind down.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            error!(error = %e, "Liveness loop ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::descriptor::{AgentService, CatalogEntry};
    use crate::registry::error::RegistryError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` registrations, then accepts.
    struct FlakyRegistry {
        failures: u32,
        register_calls: AtomicU32,
        deregister_calls: AtomicU32,
        deregister_ok: bool,
    }

    impl FlakyRegistry {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                register_calls: AtomicU32::new(0),
                deregister_calls: AtomicU32::new(0),
                deregister_ok: true,
            }
        }

        fn failing_deregister(mut self) -> Self {
            self.deregister_ok = false;
            self
        }

        fn register_calls(&self) -> u32 {
            self.register_calls.load(Ordering::SeqCst)
        }

        fn deregister_calls(&self) -> u32 {
            self.deregister_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RegistryClient for FlakyRegistry {
        fn endpoint(&self) -> &str {
            "memory://registry"
        }

        async fn register(&self, _descriptor: &ServiceDescriptor) -> Result<(), RegistryError> {
            let call = self.register_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(RegistryError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        async fn deregister(&self, _service_id: &str) -> Result<(), RegistryError> {
            self.deregister_calls.fetch_add(1, Ordering::SeqCst);
            if self.deregister_ok {
                Ok(())
            } else {
                Err(RegistryError::Rejected {
                    status: 500,
                    body: "agent gone".to_string(),
                })
            }
        }

        async fn service(&self, _service_id: &str) -> Result<Option<AgentService>, RegistryError> {
            Ok(None)
        }

        async fn catalog(&self, _name: &str) -> Result<Vec<CatalogEntry>, RegistryError> {
            Ok(Vec::new())
        }
    }

    fn descriptor() -> Arc<ServiceDescriptor> {
        Arc::new(ServiceDescriptor::new("notify", "127.0.0.1", 8081))
    }

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn default_policy_matches_documented_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let registry = FlakyRegistry::new(0);
        let state = register(&registry, &descriptor(), &quick(10)).await;

        assert_eq!(state, RegistrationState::Registered);
        assert_eq!(registry.register_calls(), 1);
    }

    #[tokio::test]
    async fn succeeds_on_last_allowed_attempt() {
        for n in 1..=5 {
            let registry = FlakyRegistry::new(n - 1);
            let state = register(&registry, &descriptor(), &quick(n)).await;

            assert_eq!(state, RegistrationState::Registered, "max_attempts = {}", n);
            assert_eq!(registry.register_calls(), n);
        }
    }

    #[tokio::test]
    async fn exhausting_attempts_fails_with_exactly_n_calls() {
        for n in 1..=5 {
            let registry = FlakyRegistry::new(u32::MAX);
            let state = register(&registry, &descriptor(), &quick(n)).await;

            assert_eq!(state, RegistrationState::Failed, "max_attempts = {}", n);
            assert_eq!(registry.register_calls(), n);
        }
    }

    #[tokio::test]
    async fn retry_delay_separates_attempts() {
        let registry = FlakyRegistry::new(2);
        let policy = RetryPolicy::new(3, Duration::from_millis(20));

        let started = std::time::Instant::now();
        let state = register(&registry, &descriptor(), &policy).await;

        assert_eq!(state, RegistrationState::Registered);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn failed_acquire_yields_no_release_capability() {
        let registry = Arc::new(FlakyRegistry::new(u32::MAX));
        let client: Arc<dyn RegistryClient> = registry.clone();

        let err = Registration::acquire(client, descriptor(), &quick(3))
            .await
            .err()
            .expect("registration should fail");

        assert_eq!(err.attempts, 3);
        assert_eq!(registry.register_calls(), 3);
        assert_eq!(registry.deregister_calls(), 0);
    }

    #[tokio::test]
    async fn release_sends_one_deregistration() {
        let registry = Arc::new(FlakyRegistry::new(0));
        let client: Arc<dyn RegistryClient> = registry.clone();

        let registration = Registration::acquire(client, descriptor(), &quick(1))
            .await
            .expect("registration should succeed");

        assert!(registration.release().await);
        assert_eq!(registry.deregister_calls(), 1);
    }

    #[tokio::test]
    async fn failing_release_is_reported_not_retried() {
        let registry = Arc::new(FlakyRegistry::new(0).failing_deregister());
        let client: Arc<dyn RegistryClient> = registry.clone();

        let registration = Registration::acquire(client, descriptor(), &quick(1))
            .await
            .expect("registration should succeed");

        assert!(!registration.release().await);
        assert_eq!(registry.deregister_calls(), 1);
    }

    struct CountingCheck {
        ticks: AtomicU32,
        panic_on_tick: bool,
    }

    #[async_trait]
    impl LivenessCheck for CountingCheck {
        async fn check(&self) -> Result<(), String> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if self.panic_on_tick {
                panic!("tick {} blew up", tick);
            }
            if tick % 2 == 0 {
                return Err(format!("tick {} unhealthy", tick));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn liveness_loop_ticks_until_stopped() {
        let check = Arc::new(CountingCheck {
            ticks: AtomicU32::new(0),
            panic_on_tick: false,
        });

        let liveness = LivenessLoop::spawn(descriptor(), Duration::from_millis(10), check.clone());
        sleep(Duration::from_millis(80)).await;
        assert!(liveness.is_running());

        liveness.stop().await;
        let ticks = check.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 2, "expected several ticks, got {}", ticks);

        sleep(Duration::from_millis(30)).await;
        assert_eq!(check.ticks.load(Ordering::SeqCst), ticks);
    }

    struct HangingCheck;

    #[async_trait]
    impl LivenessCheck for HangingCheck {
        async fn check(&self) -> Result<(), String> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn stop_aborts_a_hung_tick() {
        let liveness =
            LivenessLoop::spawn(descriptor(), Duration::from_millis(5), Arc::new(HangingCheck));
        sleep(Duration::from_millis(30)).await;
        assert!(liveness.is_running());

        let stopped = tokio::time::timeout(Duration::from_secs(2), liveness.stop()).await;
        assert!(stopped.is_ok(), "stop() did not return while a tick was hung");
    }

    #[test]
    fn attempts_are_counted_by_outcome() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let registry = FlakyRegistry::new(2);

        metrics::with_local_recorder(&recorder, || {
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap()
                .block_on(register(&registry, &descriptor(), &quick(3)));
        });

        let rendered = handle.render();
        assert!(
            rendered.contains(r#"registry_registration_attempts_total{outcome="failure"} 2"#),
            "{}",
            rendered
        );
        assert!(
            rendered.contains(r#"registry_registration_attempts_total{outcome="success"} 1"#),
            "{}",
            rendered
        );
    }

    #[tokio::test]
    async fn panicking_tick_does_not_end_the_loop() {
        let check = Arc::new(CountingCheck {
            ticks: AtomicU32::new(0),
            panic_on_tick: true,
        });

        let liveness = LivenessLoop::spawn(descriptor(), Duration::from_millis(10), check.clone());
        sleep(Duration::from_millis(80)).await;

        assert!(liveness.is_running());
        assert!(check.ticks.load(Ordering::SeqCst) >= 2);
        liveness.stop().await;
    }
}

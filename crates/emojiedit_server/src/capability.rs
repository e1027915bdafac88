//! Lazily loaded, process-wide capabilities (the PDF engine).
//!
//! A provider starts `Unloaded`. The first `acquire` moves it to `Loading` and
//! runs the loader; callers arriving meanwhile wait on the same load instead
//! of starting their own. A failed load is reported to every waiter of that
//! attempt, and the next `acquire` tries again.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Boxed future returned by a capability loader.
pub type LoadFuture<T> = Pin<Box<dyn Future<Output = Result<Arc<T>, String>> + Send>>;

type Loader<T> = Arc<dyn Fn() -> LoadFuture<T> + Send + Sync>;

/// Load state of a capability.
pub enum CapabilityState<T: ?Sized> {
    Unloaded,
    Loading,
    Ready(Arc<T>),
    Failed(String),
}

impl<T: ?Sized> CapabilityState<T> {
    fn label(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

impl<T: ?Sized> fmt::Debug for CapabilityState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "Failed({reason})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Error returned when a capability cannot be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityUnavailable {
    pub name: &'static str,
    pub reason: String,
}

impl fmt::Display for CapabilityUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is unavailable: {}", self.name, self.reason)
    }
}

impl std::error::Error for CapabilityUnavailable {}

/// Single acquisition point for a lazily loaded capability.
pub struct CapabilityProvider<T: ?Sized> {
    name: &'static str,
    loader: Loader<T>,
    state: Mutex<CapabilityState<T>>,
    loaded: Notify,
}

enum Step<T: ?Sized> {
    Done(Result<Arc<T>, CapabilityUnavailable>),
    Load,
    Wait,
}

impl<T: ?Sized + Send + Sync + 'static> CapabilityProvider<T> {
    pub fn new<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> LoadFuture<T> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Arc::new(loader),
            state: Mutex::new(CapabilityState::Unloaded),
            loaded: Notify::new(),
        }
    }

    /// Provider that is already loaded with `value`.
    pub fn ready(name: &'static str, value: Arc<T>) -> Self {
        let provider = Self::new(name, || -> LoadFuture<T> {
            Box::pin(async { Err("loader should not run for a preloaded capability".to_string()) })
        });
        if let Ok(mut state) = provider.state.lock() {
            *state = CapabilityState::Ready(value);
        }
        provider
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state label, for diagnostics.
    pub fn state_label(&self) -> &'static str {
        self.state
            .lock()
            .map(|state| state.label())
            .unwrap_or("poisoned")
    }

    fn unavailable(&self, reason: impl Into<String>) -> CapabilityUnavailable {
        CapabilityUnavailable {
            name: self.name,
            reason: reason.into(),
        }
    }

    /// Return the loaded capability, loading it first if needed.
    pub async fn acquire(&self) -> Result<Arc<T>, CapabilityUnavailable> {
        let mut retried_failure = false;
        loop {
            // Register interest before inspecting state so a load finishing
            // in between still wakes us.
            let notified = self.loaded.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let step = {
                let mut state = self
                    .state
                    .lock()
                    .map_err(|_| self.unavailable("capability state is poisoned"))?;
                match &*state {
                    CapabilityState::Ready(value) => Step::Done(Ok(value.clone())),
                    CapabilityState::Loading => Step::Wait,
                    CapabilityState::Failed(reason) if retried_failure => {
                        Step::Done(Err(self.unavailable(reason.clone())))
                    }
                    CapabilityState::Unloaded | CapabilityState::Failed(_) => {
                        *state = CapabilityState::Loading;
                        Step::Load
                    }
                }
            };

            match step {
                Step::Done(result) => return result,
                Step::Wait => {
                    notified.await;
                    // Whatever the in-flight load produced is final for us.
                    retried_failure = true;
                }
                Step::Load => return self.load().await,
            }
        }
    }

    async fn load(&self) -> Result<Arc<T>, CapabilityUnavailable> {
        debug!("Loading capability {}", self.name);
        let mut abandoned = AbandonedLoad {
            provider: self,
            armed: true,
        };
        let outcome = (self.loader)().await;
        abandoned.armed = false;
        let result = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| self.unavailable("capability state is poisoned"))?;
            match outcome {
                Ok(value) => {
                    *state = CapabilityState::Ready(value.clone());
                    Ok(value)
                }
                Err(reason) => {
                    warn!("Capability {} failed to load: {}", self.name, reason);
                    *state = CapabilityState::Failed(reason.clone());
                    Err(self.unavailable(reason))
                }
            }
        };
        self.loaded.notify_waiters();
        result
    }
}

/// Puts a provider back to `Unloaded` if its loading future is dropped early,
/// so waiters are not left parked on a load that will never finish.
struct AbandonedLoad<'a, T: ?Sized> {
    provider: &'a CapabilityProvider<T>,
    armed: bool,
}

impl<T: ?Sized> Drop for AbandonedLoad<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.provider.state.lock() {
            *state = CapabilityState::Unloaded;
        }
        self.provider.loaded.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::{CapabilityProvider, LoadFuture};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_provider(
        calls: Arc<AtomicUsize>,
        succeed: bool,
    ) -> CapabilityProvider<String> {
        CapabilityProvider::new("test engine", move || -> LoadFuture<String> {
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                if succeed {
                    Ok(Arc::new("engine".to_string()))
                } else {
                    Err("offline".to_string())
                }
            })
        })
    }

    #[tokio::test]
    async fn concurrent_acquires_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(counting_provider(calls.clone(), true));
        assert_eq!(provider.state_label(), "unloaded");

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.acquire().await })
            })
            .collect();
        for handle in handles {
            let value = handle.await.expect("join").expect("acquire");
            assert_eq!(value.as_str(), "engine");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.state_label(), "ready");
    }

    #[tokio::test]
    async fn failure_is_reported_and_retried_on_next_acquire() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = counting_provider(calls.clone(), false);

        let err = provider.acquire().await.expect_err("load should fail");
        assert_eq!(err.name, "test engine");
        assert!(err.to_string().contains("offline"));
        assert_eq!(provider.state_label(), "failed");

        provider.acquire().await.expect_err("retry should fail too");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn preloaded_provider_never_runs_loader() {
        let provider = CapabilityProvider::ready("preloaded", Arc::new(7_u32));
        assert_eq!(*provider.acquire().await.expect("ready"), 7);
        assert_eq!(provider.state_label(), "ready");
    }
}

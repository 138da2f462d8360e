//! Per-client rate-limiter session.
//!
//! A [`Session`] holds the shared usage counters for one client: the weight
//! accumulated in the current admission window and the window start time.
//! Every read-modify-write of the counters happens under one mutex, so two
//! concurrent callers sharing a session never observe a torn read.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use flatfetch_core::HttpResponse;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Usage counters guarded by the session lock.
#[derive(Debug)]
struct Usage {
    weight: u64,
    window_start: Instant,
}

/// Read-only snapshot of the session counters.
#[derive(Debug, Clone, Copy)]
pub struct UsageSnapshot {
    /// Weight accumulated in the current window.
    pub weight: u64,
    /// When the current window started.
    pub window_start: Instant,
}

// ============================================================================
// Session
// ============================================================================

/// Shared rate-limiter state for one client.
///
/// A session is owned 1:1 by its client and never shared across clients;
/// cross-client throughput is deliberately uncoordinated.
#[derive(Debug)]
pub struct Session {
    weight_per_second: Option<f64>,
    interval: Duration,
    usage_header: Option<String>,
    usage: Mutex<Usage>,
}

impl Session {
    /// Creates a session for the given rate target.
    ///
    /// `None` disables rate limiting. The admission window is one second,
    /// stretched to `1/weight_per_second` when the target is below one so
    /// that sub-one-per-second limits widen the window instead of shrinking
    /// weight granularity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] for a non-positive target.
    pub fn new(weight_per_second: Option<f64>) -> Result<Self, ClientError> {
        if let Some(wps) = weight_per_second {
            if wps <= 0.0 || !wps.is_finite() {
                return Err(ClientError::InvalidConfig(format!(
                    "weight_per_second must be greater than zero, got {wps}"
                )));
            }
        }

        let interval = match weight_per_second {
            Some(wps) if wps < 1.0 => Duration::from_secs_f64(1.0 / wps),
            _ => Duration::from_secs(1),
        };

        Ok(Self {
            weight_per_second,
            interval,
            usage_header: None,
            usage: Mutex::new(Usage {
                weight: 0,
                window_start: Instant::now(),
            }),
        })
    }

    /// Sets the response header carrying server-advertised usage.
    #[must_use]
    pub fn with_usage_header(mut self, header: impl Into<String>) -> Self {
        self.usage_header = Some(header.into().to_ascii_lowercase());
        self
    }

    /// Length of the admission window.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Configured rate target, if any.
    pub fn weight_per_second(&self) -> Option<f64> {
        self.weight_per_second
    }

    /// Charges a request's weight to the current window.
    ///
    /// The first request of a fresh window records the window start.
    pub fn log_request(&self, weight: u32) {
        let mut usage = self.lock();
        Self::charge(&mut usage, self.interval, weight);
    }

    /// Records server-advertised usage from a response, if configured.
    ///
    /// Some APIs report the weight they have charged in a response header;
    /// when present it overrides the locally accumulated count
    /// (side-channel correction). Otherwise a no-op.
    pub fn log_response(&self, response: &HttpResponse) {
        let Some(header) = &self.usage_header else {
            return;
        };
        let Some(value) = response.header(header) else {
            return;
        };
        let Ok(weight) = value.trim().parse::<u64>() else {
            warn!(header, value, "Unparseable usage header value");
            return;
        };

        let mut usage = self.lock();
        debug!(local = usage.weight, server = weight, "Usage corrected from response header");
        usage.weight = weight;
    }

    /// Read-only snapshot of the usage counters.
    pub fn current_usage(&self) -> UsageSnapshot {
        let usage = self.lock();
        UsageSnapshot {
            weight: usage.weight,
            window_start: usage.window_start,
        }
    }

    /// Computes how long a caller must wait before issuing a request.
    ///
    /// Admission is optimistic: the weight is charged first and reverted if
    /// the window budget is exceeded. Callers must loop (sleep for the
    /// returned duration and call again) until zero comes back, because
    /// elapsed time during the sleep may not yet clear the window. Waiters
    /// re-test individually against the shared counter; no ordering between
    /// them is guaranteed.
    pub fn throttle(&self, weight: u32) -> Duration {
        let Some(wps) = self.weight_per_second else {
            return Duration::ZERO;
        };

        let window_start = {
            let mut usage = self.lock();
            Self::charge(&mut usage, self.interval, weight);

            if usage.weight as f64 / self.interval.as_secs_f64() <= wps {
                return Duration::ZERO;
            }

            // Not admitted: undo the optimistic charge
            usage.weight -= u64::from(weight);
            usage.window_start
        };

        self.interval.saturating_sub(window_start.elapsed())
    }

    /// Charges weight under the lock, rolling the window over first when it
    /// has elapsed.
    fn charge(usage: &mut Usage, interval: Duration, weight: u32) {
        if usage.window_start.elapsed() >= interval {
            usage.weight = 0;
        }
        if usage.weight == 0 {
            usage.window_start = Instant::now();
        }
        usage.weight += u64::from(weight);
    }

    fn lock(&self) -> MutexGuard<'_, Usage> {
        self.usage
            .lock()
            .expect("session usage lock should not be poisoned")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_non_positive_rate_is_rejected() {
        assert!(Session::new(Some(0.0)).is_err());
        assert!(Session::new(Some(-2.5)).is_err());
        assert!(Session::new(Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_interval_stretches_for_sub_one_rates() {
        assert_eq!(
            Session::new(Some(0.5)).unwrap().interval(),
            Duration::from_secs(2)
        );
        assert_eq!(
            Session::new(Some(4.0)).unwrap().interval(),
            Duration::from_secs(1)
        );
        assert_eq!(Session::new(None).unwrap().interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_unlimited_session_never_throttles() {
        let session = Session::new(None).unwrap();

        for _ in 0..100 {
            assert_eq!(session.throttle(10), Duration::ZERO);
        }
    }

    #[test]
    fn test_throttle_admits_within_budget() {
        let session = Session::new(Some(3.0)).unwrap();

        assert_eq!(session.throttle(1), Duration::ZERO);
        assert_eq!(session.throttle(1), Duration::ZERO);
        assert_eq!(session.throttle(1), Duration::ZERO);
        assert_eq!(session.current_usage().weight, 3);
    }

    #[test]
    fn test_throttle_reverts_charge_when_over_budget() {
        let session = Session::new(Some(2.0)).unwrap();

        assert_eq!(session.throttle(1), Duration::ZERO);
        assert_eq!(session.throttle(1), Duration::ZERO);

        let wait = session.throttle(1);
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(1));
        // The rejected weight was reverted
        assert_eq!(session.current_usage().weight, 2);
    }

    #[test]
    fn test_throttle_loop_terminates_after_window_rolls() {
        let session = Session::new(Some(2.0)).unwrap();

        assert_eq!(session.throttle(2), Duration::ZERO);

        let mut wait = session.throttle(1);
        assert!(wait > Duration::ZERO);

        // Caller contract: sleep and re-test until admitted
        let mut rounds = 0;
        while !wait.is_zero() {
            std::thread::sleep(wait);
            wait = session.throttle(1);
            rounds += 1;
            assert!(rounds < 50, "throttle loop did not terminate");
        }
        assert_eq!(session.current_usage().weight, 1);
    }

    #[test]
    fn test_window_budget_is_bounded() {
        let session = Session::new(Some(5.0)).unwrap();

        let mut admitted = 0_u64;
        for _ in 0..20 {
            if session.throttle(1).is_zero() {
                admitted += 1;
            }
        }

        // weight_per_second * interval = 5; one in-flight weight of slack
        assert!(admitted <= 5);
    }

    #[test]
    fn test_log_request_accumulates() {
        let session = Session::new(Some(100.0)).unwrap();

        session.log_request(3);
        session.log_request(4);

        assert_eq!(session.current_usage().weight, 7);
    }

    #[test]
    fn test_log_response_overrides_usage() {
        let session = Session::new(Some(100.0))
            .unwrap()
            .with_usage_header("X-Used-Weight");
        session.log_request(2);

        let mut headers = BTreeMap::new();
        headers.insert("x-used-weight".to_string(), "17".to_string());
        session.log_response(&HttpResponse::new("u", 200, headers, ""));

        assert_eq!(session.current_usage().weight, 17);
    }

    #[test]
    fn test_log_response_without_header_is_noop() {
        let session = Session::new(Some(100.0))
            .unwrap()
            .with_usage_header("X-Used-Weight");
        session.log_request(2);

        session.log_response(&HttpResponse::new("u", 200, BTreeMap::new(), ""));

        assert_eq!(session.current_usage().weight, 2);
    }

    #[test]
    fn test_concurrent_callers_share_counters() {
        let session = std::sync::Arc::new(Session::new(Some(1000.0)).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        session.log_request(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(session.current_usage().weight, 800);
    }
}

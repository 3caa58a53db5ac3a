//! Proof-of-work nonce search
//!
//! The search is a first-fit scan from nonce zero. How long it runs depends
//! entirely on the validator, so every search goes through a
//! [`MiningControl`] that can stop it: an explicit [`CancelToken`], a
//! wall-clock deadline, or a cap on attempts.

use crate::error::{ChainError, Result};
use crate::hash::HashDigest;
use crate::validator::HashValidator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Deadline checks read the clock, so only do it every this many attempts.
const DEADLINE_CHECK_INTERVAL: u64 = 1024;

/// Emit a progress line this often during long searches.
const PROGRESS_INTERVAL: u64 = 1 << 20;

/// Shared flag that aborts a running search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits applied to a single nonce search.
#[derive(Debug, Clone, Default)]
pub struct MiningControl {
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
    max_attempts: Option<u64>,
}

impl MiningControl {
    /// No limits besides nonce exhaustion.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The deadline is fixed when this is called, not when mining starts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    fn should_stop(&self, attempts: u64) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return true;
            }
        }
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if attempts % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return true;
            }
        }
        false
    }
}

/// Finds the smallest nonce whose hash the validator accepts.
///
/// `hash_for` must be pure: the same nonce always yields the same hash.
pub fn search_nonce<F>(
    hash_for: F,
    validator: &dyn HashValidator,
    control: &MiningControl,
) -> Result<(u64, HashDigest)>
where
    F: Fn(u64) -> HashDigest,
{
    let started = Instant::now();
    let mut attempts = 0u64;

    for nonce in 0..=u64::MAX {
        if control.should_stop(attempts) {
            warn!(attempts, elapsed = ?started.elapsed(), "nonce search aborted");
            return Err(ChainError::MiningAborted { attempts });
        }

        let hash = hash_for(nonce);
        attempts += 1;
        if validator.is_valid(&hash) {
            debug!(nonce, attempts, elapsed = ?started.elapsed(), "nonce found");
            return Ok((nonce, hash));
        }

        if attempts % PROGRESS_INTERVAL == 0 {
            debug!(attempts, elapsed = ?started.elapsed(), "still mining");
        }
    }

    warn!("nonce space exhausted");
    Err(ChainError::MiningAborted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_hash(nonce: u64) -> HashDigest {
        HashDigest::new(vec![(nonce % 251) as u8])
    }

    #[test]
    fn test_first_fit() {
        let wants_seven = |h: &HashDigest| h.as_bytes() == [7];
        let (nonce, hash) =
            search_nonce(byte_hash, &wants_seven, &MiningControl::unbounded()).unwrap();
        assert_eq!(nonce, 7);
        assert_eq!(hash.as_bytes(), &[7]);
    }

    #[test]
    fn test_max_attempts_stops_search() {
        let never = |_: &HashDigest| false;
        let control = MiningControl::unbounded().with_max_attempts(50);
        let result = search_nonce(byte_hash, &never, &control);
        assert_eq!(result, Err(ChainError::MiningAborted { attempts: 50 }));
    }

    #[test]
    fn test_attempt_cap_still_allows_last_nonce() {
        let wants_four = |h: &HashDigest| h.as_bytes() == [4];
        let control = MiningControl::unbounded().with_max_attempts(5);
        let (nonce, _) = search_nonce(byte_hash, &wants_four, &control).unwrap();
        assert_eq!(nonce, 4);
    }

    #[test]
    fn test_cancelled_token_stops_before_hashing() {
        let token = CancelToken::new();
        token.cancel();
        let always = |_: &HashDigest| true;
        let control = MiningControl::unbounded().with_cancel(token);
        let result = search_nonce(byte_hash, &always, &control);
        assert_eq!(result, Err(ChainError::MiningAborted { attempts: 0 }));
    }

    #[test]
    fn test_expired_deadline_stops_search() {
        let never = |_: &HashDigest| false;
        let control = MiningControl::unbounded().with_deadline(Instant::now());
        let result = search_nonce(byte_hash, &never, &control);
        assert!(matches!(result, Err(ChainError::MiningAborted { .. })));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let token = CancelToken::new();
        let control = MiningControl::unbounded().with_cancel(token.clone());
        let handle = std::thread::spawn(move || {
            let never = |_: &HashDigest| false;
            search_nonce(byte_hash, &never, &control)
        });
        token.cancel();
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(ChainError::MiningAborted { .. })));
    }
}

//! Time-bounded caching and warm-up throttling, driven by an injected [`Clock`].

use std::collections::HashMap;
use std::time::Duration;

use crate::foundation::clock::Clock;
use crate::foundation::error::{GridError, GridResult};

struct Entry<T> {
    value: T,
    expires_at: u64,
}

/// String-keyed cache whose entries expire `ttl` after insertion.
pub struct TtlCache<T, C: Clock> {
    ttl_millis: u64,
    clock: C,
    entries: HashMap<String, Entry<T>>,
}

impl<T, C: Clock> TtlCache<T, C> {
    pub fn new(ttl: Duration, clock: C) -> GridResult<Self> {
        let ttl_millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        if ttl_millis == 0 {
            return Err(GridError::validation("cache ttl must be > 0"));
        }
        Ok(Self {
            ttl_millis,
            clock,
            entries: HashMap::new(),
        })
    }

    /// Live value for `key`. An entry is still live at exactly its expiry instant.
    pub fn get(&mut self, key: &str) -> Option<&T> {
        let now = self.clock.now_millis();
        if self.entries.get(key).is_some_and(|e| now > e.expires_at) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let expires_at = self.clock.now_millis().saturating_add(self.ttl_millis);
        self.entries.insert(key.into(), Entry { value, expires_at });
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_millis();
        let before = self.entries.len();
        self.entries.retain(|_, e| now <= e.expires_at);
        before - self.entries.len()
    }

    /// Stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cool-down between upstream warm-ups.
pub const WARMUP_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Whether a warm-up should run now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarmupDecision {
    /// Another warm-up is running.
    InFlight,
    /// The last warm-up is recent enough.
    Cooling,
    /// Run it, then report back through [`WarmupGate::finish`].
    Proceed { started_at: u64 },
}

/// Throttles warm-up pings to upstream services.
#[derive(Debug)]
pub struct WarmupGate<C: Clock> {
    clock: C,
    cooldown_millis: u64,
    last_warmup: Option<u64>,
    in_flight: bool,
}

impl<C: Clock> WarmupGate<C> {
    pub fn new(clock: C) -> Self {
        Self::with_cooldown(clock, WARMUP_COOLDOWN)
    }

    pub fn with_cooldown(clock: C, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown_millis: u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX),
            last_warmup: None,
            in_flight: false,
        }
    }

    pub fn begin(&mut self) -> WarmupDecision {
        if self.in_flight {
            return WarmupDecision::InFlight;
        }
        let now = self.clock.now_millis();
        if self.is_warm_at(now) {
            tracing::debug!("warm-up skipped; cooling down");
            return WarmupDecision::Cooling;
        }
        self.in_flight = true;
        WarmupDecision::Proceed { started_at: now }
    }

    /// Close a warm-up started by [`WarmupGate::begin`]. Only a completed attempt starts the
    /// cool-down; a failed one may be retried immediately.
    pub fn finish(&mut self, started_at: u64, completed: bool) {
        self.in_flight = false;
        if completed {
            self.last_warmup = Some(started_at);
        }
    }

    pub fn is_warm(&self) -> bool {
        self.is_warm_at(self.clock.now_millis())
    }

    pub fn last_warmup(&self) -> Option<u64> {
        self.last_warmup
    }

    fn is_warm_at(&self, now: u64) -> bool {
        self.last_warmup
            .is_some_and(|t| now.saturating_sub(t) < self.cooldown_millis)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/ttl.rs"]
mod tests;

// ============================================
// File: crates/lightwire-common/src/time.rs
// ============================================
//! # Time Utilities
//!
//! ## Creation Reason
//! Connection read loops and writers both record activity; an atomic
//! timestamp lets them do so without sharing a lock.
//!
//! ## Main Functionality
//! - `AtomicInstant`: Lock-free `Instant` (nanoseconds since a process-wide reference)
//! - `unix_timestamp`: Wall-clock seconds for stats snapshots
//!
//! ## ⚠️ Important Note for Next Developer
//! - Instants earlier than the reference clamp to the reference
//!
//! ## Last Modified
//! v0.1.0 - Initial time utilities

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// ============================================
// AtomicInstant
// ============================================

/// Thread-safe wrapper around [`Instant`].
///
/// # Example
/// ```
/// use lightwire_common::time::AtomicInstant;
/// use std::time::Duration;
///
/// let last_activity = AtomicInstant::now();
/// last_activity.touch();
/// assert!(last_activity.elapsed() < Duration::from_secs(60));
/// ```
#[derive(Debug)]
pub struct AtomicInstant {
    nanos: AtomicU64,
}

impl AtomicInstant {
    fn reference() -> Instant {
        static REFERENCE: OnceLock<Instant> = OnceLock::new();
        *REFERENCE.get_or_init(Instant::now)
    }

    fn to_nanos(instant: Instant) -> u64 {
        instant
            .checked_duration_since(Self::reference())
            .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Creates a new `AtomicInstant` set to the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            nanos: AtomicU64::new(Self::to_nanos(Instant::now())),
        }
    }

    /// Loads the stored instant.
    #[must_use]
    pub fn load(&self) -> Instant {
        Self::reference() + Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }

    /// Stores a new instant.
    pub fn store(&self, instant: Instant) {
        self.nanos.store(Self::to_nanos(instant), Ordering::Relaxed);
    }

    /// Sets the stored instant to now.
    pub fn touch(&self) {
        self.store(Instant::now());
    }

    /// Time since the stored instant.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.load().elapsed()
    }
}

impl Default for AtomicInstant {
    fn default() -> Self {
        Self::now()
    }
}

// ============================================
// Utility Functions
// ============================================

/// Current Unix time in seconds (0 if the clock is before the epoch).
#[must_use]
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

// ============================================
// Tests
// ============================================

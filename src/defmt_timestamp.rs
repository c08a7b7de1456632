//! Monotonic timestamp source for `defmt`'s global logger, ticked from the
//! ARM generic timer (feature `rtt-logging`, bare-metal builds only).

#[cfg(feature = "rtt-logging")]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "rtt-logging")]
static TICKS: AtomicU64 = AtomicU64::new(0);

#[cfg(feature = "rtt-logging")]
defmt::timestamp!("{=u64:us}", {
    TICKS.fetch_add(1, Ordering::Relaxed)
});

/// Reset the timestamp counter. Called once from `init_rtt_logging`.
#[cfg(feature = "rtt-logging")]
pub fn init_timestamp() {
    TICKS.store(0, Ordering::Relaxed);
}

//! Traits the embedding application implements; everything in this crate is
//! generic over them instead of talking to a specific microcontroller.

use embedded_hal::delay::DelayNs;

/// A busy-spin delay used *inside* the bit engine's critical section.
///
/// Must not yield to another task or interrupt handler: the 40 µs half-period
/// timing in [`crate::timing::BusTiming`] depends on it running back-to-back
/// with no preemption. Implement this with a cycle-counter spin loop, not a
/// sleep syscall.
pub trait BusyDelay: DelayNs {}
impl<T: DelayNs> BusyDelay for T {}

/// A yielding delay used by the service loops between bus transactions
/// (inter-byte gaps, the ≈9 ms poll cadence, stream-mode pacing, `click`'s
/// 100 ms hold). Safe to implement as a task sleep that lets other work run.
pub trait TaskDelay: DelayNs {}
impl<T: DelayNs> TaskDelay for T {}

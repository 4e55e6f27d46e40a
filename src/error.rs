use core::fmt;

/// Everything that can go wrong while running the link layer or a
/// personality's command dispatch.
///
/// `Pin` wraps whatever error type the embedding `embedded-hal` pin
/// implementation surfaces; every other variant is a recoverable, expected
/// part of running a PS/2 link and is handled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<PinError> {
    /// `write` was attempted while the bus was not IDLE.
    BusBusy,
    /// The host pulled clock low mid-frame; the in-flight byte was abandoned.
    Inhibited,
    /// `read` waited past its deadline without the host requesting to send.
    Timeout,
    /// The received byte's parity did not match what we computed.
    Parity,
    /// The outbound packet queue was full; the caller's report was dropped.
    QueueFull,
    /// The underlying GPIO reported a fault.
    Pin(PinError),
}

impl<PinError: fmt::Debug> fmt::Display for Error<PinError> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BusBusy => write!(f, "bus is not idle"),
            Error::Inhibited => write!(f, "host inhibited the bus mid-frame"),
            Error::Timeout => write!(f, "timed out waiting for host request-to-send"),
            Error::Parity => write!(f, "received byte failed parity check"),
            Error::QueueFull => write!(f, "outbound packet queue is full"),
            Error::Pin(e) => write!(f, "GPIO fault: {:?}", e),
        }
    }
}

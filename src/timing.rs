/// Calibration constants for the bit engine and arbiter, collected in one
/// place so an implementer tuning for a slower/faster GPIO path only has to
/// touch one struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTiming {
    /// Half of one clock period, in microseconds. The PS/2 spec wants a line
    /// rate of 10-16.7 kHz; 40 µs gives ~80 µs bit cells, ~12.5 kHz.
    pub clk_half_period_us: u32,
    /// Minimum gap between two back-to-back device-to-host bytes, in
    /// microseconds.
    pub byte_interval_us: u32,
    /// How often the embedding runtime is expected to call
    /// `service_host_request`, in milliseconds. Purely advisory: this crate
    /// never sleeps on its own behalf.
    pub poll_interval_ms: u32,
}

impl BusTiming {
    /// A quarter of [`Self::clk_half_period_us`]; the settle time framing
    /// each bit before and after the clock pulse.
    pub const fn clk_quarter_period_us(&self) -> u32 {
        self.clk_half_period_us / 2
    }
}

impl Default for BusTiming {
    fn default() -> Self {
        BusTiming {
            clk_half_period_us: 40,
            byte_interval_us: 500,
            poll_interval_ms: 9,
        }
    }
}

/// Advisory placement hints for the embedding scheduler's own poller/sender/
/// pacer tasks. This crate never spawns or clamps anything with this value;
/// it just stores and hands it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskConfig {
    pub priority: u8,
    pub affinity: Option<u8>,
}

use embedded_hal::digital::{InputPin, OutputPin};

use crate::engine::BitEngine;
use crate::error::Error;
use crate::hal::{BusyDelay, TaskDelay};
use crate::packet::Packet;
use crate::queue::PacketQueue;
use crate::timing::{BusTiming, TaskConfig};

/// The bus operations a personality's command dispatch needs while holding
/// it, type-erased so [`Personality`] doesn't have to carry the pin/delay
/// generics of whichever [`BitEngine`] is driving it.
pub trait Bus<E> {
    fn write(&mut self, byte: u8) -> Result<(), Error<E>>;
    fn write_retry(&mut self, byte: u8) -> Result<(), Error<E>>;
    fn write_paced(&mut self, byte: u8) -> Result<(), Error<E>>;
    fn ack(&mut self) -> Result<(), Error<E>>;
    fn read_param(&mut self) -> Result<u8, Error<E>>;
}

/// Command-parameter reads (e.g. the rate byte after `SET_SAMPLE_RATE`) use
/// the same host-request timeout as the initial command byte.
const PARAM_READ_TIMEOUT_MS: u32 = 9;

impl<CLK, DATA, E, BD, TD> Bus<E> for BitEngine<CLK, DATA, E, BD, TD>
where
    CLK: OutputPin<Error = E> + InputPin<Error = E>,
    DATA: OutputPin<Error = E> + InputPin<Error = E>,
    BD: BusyDelay,
    TD: TaskDelay,
{
    fn write(&mut self, byte: u8) -> Result<(), Error<E>> {
        BitEngine::write(self, byte)
    }

    fn write_retry(&mut self, byte: u8) -> Result<(), Error<E>> {
        BitEngine::write_retry(self, byte)
    }

    fn write_paced(&mut self, byte: u8) -> Result<(), Error<E>> {
        BitEngine::write_paced(self, byte)
    }

    fn ack(&mut self) -> Result<(), Error<E>> {
        BitEngine::ack(self)
    }

    fn read_param(&mut self) -> Result<u8, Error<E>> {
        BitEngine::read(self, PARAM_READ_TIMEOUT_MS)
    }
}

/// A device personality: something that consumes one host byte while
/// holding the bus. The arbiter is generic over this instead of a
/// shared base class; [`crate::keyboard::Keyboard`] and
/// [`crate::mouse::Mouse`] are the two implementations.
pub trait Personality<E> {
    /// Bytes to transmit for the power-on self test at `begin()`.
    fn power_on_packet(&self) -> Packet;

    /// Handle one host command byte, already holding the bus via `bus`.
    /// Implementations may enqueue reports through `queue` (e.g.
    /// `READ_DATA`) in addition to replying directly over `bus`.
    fn handle_command(
        &mut self,
        cmd: u8,
        bus: &mut dyn Bus<E>,
        queue: &PacketQueue,
    ) -> Result<(), Error<E>>;
}

/// The host-request poller and packet sender, plus the bit
/// engine and queue they share. Scheduling `service_host_request` and
/// `service_packet_queue` — on separate tasks, separate interrupt
/// priorities, or a single cooperative loop — is the embedding
/// application's job; this type only guarantees the two never interleave
/// mid-frame when called from a single thread of control (and, if the
/// embedding application shares a `Device` across real tasks, whatever
/// mutex it wraps this in provides the rest).
pub struct Device<CLK, DATA, E, BD, TD, P> {
    engine: BitEngine<CLK, DATA, E, BD, TD>,
    queue: PacketQueue,
    personality: P,
    task_config: TaskConfig,
}

impl<CLK, DATA, E, BD, TD, P> Device<CLK, DATA, E, BD, TD, P>
where
    CLK: OutputPin<Error = E> + InputPin<Error = E>,
    DATA: OutputPin<Error = E> + InputPin<Error = E>,
    BD: BusyDelay,
    TD: TaskDelay,
    P: Personality<E>,
{
    pub fn new(
        clk: CLK,
        data: DATA,
        timing: BusTiming,
        busy_delay: BD,
        task_delay: TD,
        task_config: TaskConfig,
        personality: P,
    ) -> Self {
        Device {
            engine: BitEngine::new(clk, data, timing, busy_delay, task_delay),
            queue: PacketQueue::new(),
            personality,
            task_config,
        }
    }

    pub fn task_config(&self) -> TaskConfig {
        self.task_config
    }

    pub fn timing(&self) -> BusTiming {
        self.engine.timing()
    }

    pub(crate) fn personality(&self) -> &P {
        &self.personality
    }

    pub(crate) fn personality_mut(&mut self) -> &mut P {
        &mut self.personality
    }

    pub(crate) fn queue(&self) -> &PacketQueue {
        &self.queue
    }

    /// Release both lines and transmit the power-on self test directly
    /// (nothing else can be contending for the bus yet, so this bypasses
    /// the queue and retries until accepted).
    pub fn begin(&mut self) -> Result<(), Error<E>> {
        self.engine.release()?;
        let packet = self.personality.power_on_packet();
        for &byte in packet.as_slice() {
            self.engine.write_retry(byte)?;
        }
        Ok(())
    }

    /// If the bus is requesting to send, read one command byte and
    /// dispatch it to the personality. A timeout (no request pending) is
    /// the expected steady-state outcome, not an error the caller should
    /// act on.
    pub fn service_host_request(&mut self) -> Result<(), Error<E>> {
        match self.engine.read(0) {
            Ok(cmd) => {
                log::debug!("ps2dev: host command {:#04x}", cmd);
                self.personality
                    .handle_command(cmd, &mut self.engine, &self.queue)
            }
            Err(Error::Timeout) => Ok(()),
            Err(Error::Parity) => {
                log::debug!("ps2dev: dropped command byte, parity mismatch");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Drain one packet from the outbound queue onto the wire, byte
    /// by byte, rechecking IDLE before each byte since the host can inhibit
    /// mid-packet.
    pub fn service_packet_queue(&mut self) -> Result<(), Error<E>> {
        let Some(packet) = self.queue.pop() else {
            return Ok(());
        };

        if self.engine.bus_state()? != crate::bus::BusState::Idle {
            log::debug!("ps2dev: dropped outbound packet, bus busy");
            return Ok(());
        }

        let timing = self.engine.timing();
        for (i, &byte) in packet.as_slice().iter().enumerate() {
            if i > 0 {
                // Pace the inter-byte gap; the bit engine's own busy delay
                // already paced the edges within the previous byte.
                self.engine.delay_us(timing.byte_interval_us);
            }
            if self.engine.bus_state()? != crate::bus::BusState::Idle {
                log::debug!("ps2dev: host inhibited mid-packet, abandoning remainder");
                return Ok(());
            }
            self.engine.write(byte)?;
        }
        Ok(())
    }

    pub fn into_pins(self) -> (CLK, DATA) {
        self.engine.into_pins()
    }
}

//! Bit-banged PS/2 keyboard and mouse device emulation over two open-drain
//! GPIOs, generic over [`embedded_hal`] pin and delay traits so it runs on
//! any target the embedding application wires up — no chip HAL baked in.
//!
//! The crate is deliberately not in charge of scheduling: callers drive
//! [`Ps2Keyboard::service_host_request`]/[`Ps2Mouse::service_host_request`]
//! and friends from whatever task, interrupt, or bare loop they already run.
#![cfg_attr(not(test), no_std)]

mod bus;
mod device;
mod engine;
mod error;
mod hal;
pub mod keyboard;
pub mod mouse;
mod packet;
mod queue;
mod store;
mod timing;

pub use bus::BusState;
pub use device::{Bus, Device, Personality};
pub use error::Error;
pub use hal::{BusyDelay, TaskDelay};
pub use packet::Packet;
pub use queue::PacketQueue;
pub use store::{keys as store_keys, NullStore, StateStore};
pub use timing::{BusTiming, TaskConfig};

use embedded_hal::digital::{InputPin, OutputPin};

use keyboard::Keyboard;
use mouse::Mouse;

/// A PS/2 mouse emulator: an Intellimouse-compatible [`Mouse`] personality
/// driving the shared [`Device`] arbiter.
pub struct Ps2Mouse<CLK, DATA, E, BD, TD>(Device<CLK, DATA, E, BD, TD, Mouse>);

impl<CLK, DATA, E, BD, TD> Ps2Mouse<CLK, DATA, E, BD, TD>
where
    CLK: OutputPin<Error = E> + InputPin<Error = E>,
    DATA: OutputPin<Error = E> + InputPin<Error = E>,
    BD: BusyDelay,
    TD: TaskDelay,
{
    /// `namespace` names this device's persisted settings; pass
    /// anything unique per pin pair, e.g. `"ps2dev_clk4_data5"`.
    pub fn new(
        clk: CLK,
        data: DATA,
        timing: BusTiming,
        busy_delay: BD,
        task_delay: TD,
        task_config: TaskConfig,
        namespace: &str,
    ) -> Self {
        Ps2Mouse(Device::new(
            clk,
            data,
            timing,
            busy_delay,
            task_delay,
            task_config,
            Mouse::new(namespace),
        ))
    }

    /// Releases the lines, optionally reloads persisted settings, and emits
    /// the power-on self test.
    pub fn begin<S: StateStore>(&mut self, resume: Option<&mut S>) -> Result<(), Error<E>> {
        if let Some(store) = resume {
            self.0.personality().load_state(store);
        }
        self.0.begin()
    }

    pub fn move_by(&self, dx: i16, dy: i16, dz: i8) {
        self.0.personality().move_by(dx, dy, dz);
    }

    pub fn press(&self, button: mouse::Button) {
        self.0.personality().press(button);
    }

    pub fn release(&self, button: mouse::Button) {
        self.0.personality().release(button);
    }

    pub fn click<D: TaskDelay>(&self, button: mouse::Button, delay: &mut D) {
        self.0.personality().click(button, delay);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn move_and_buttons(
        &self,
        dx: i16,
        dy: i16,
        dz: i8,
        left: bool,
        right: bool,
        middle: bool,
        button4: bool,
        button5: bool,
    ) {
        self.0
            .personality()
            .move_and_buttons(dx, dy, dz, left, right, middle, button4, button5);
    }

    /// Persist the six settings fields the mouse personality tracks.
    pub fn save_state<S: StateStore>(&self, store: &mut S) {
        self.0.personality().save_state(store);
    }

    pub fn service_host_request(&mut self) -> Result<(), Error<E>> {
        self.0.service_host_request()
    }

    pub fn service_packet_queue(&mut self) -> Result<(), Error<E>> {
        self.0.service_packet_queue()
    }

    /// Call every `1000 / sample_rate` ms; encodes and enqueues one report
    /// if STREAM mode is active, reporting is enabled, and there's motion
    /// to report.
    pub fn service_stream_tick(&mut self) {
        self.0.personality().service_stream_tick(self.0.queue());
    }

    pub fn into_pins(self) -> (CLK, DATA) {
        self.0.into_pins()
    }
}

/// A PS/2 keyboard emulator: a Scan Code Set 2 [`Keyboard`] personality
/// driving the shared [`Device`] arbiter.
pub struct Ps2Keyboard<CLK, DATA, E, BD, TD>(Device<CLK, DATA, E, BD, TD, Keyboard>);

impl<CLK, DATA, E, BD, TD> Ps2Keyboard<CLK, DATA, E, BD, TD>
where
    CLK: OutputPin<Error = E> + InputPin<Error = E>,
    DATA: OutputPin<Error = E> + InputPin<Error = E>,
    BD: BusyDelay,
    TD: TaskDelay,
{
    pub fn new(
        clk: CLK,
        data: DATA,
        timing: BusTiming,
        busy_delay: BD,
        task_delay: TD,
        task_config: TaskConfig,
    ) -> Self {
        Ps2Keyboard(Device::new(
            clk,
            data,
            timing,
            busy_delay,
            task_delay,
            task_config,
            Keyboard::new(),
        ))
    }

    pub fn begin(&mut self) -> Result<(), Error<E>> {
        self.0.begin()
    }

    pub fn keydown(&self, key: keyboard::Key) {
        self.0.personality().keydown(key, self.0.queue());
    }

    pub fn keyup(&self, key: keyboard::Key) {
        self.0.personality().keyup(key, self.0.queue());
    }

    pub fn type_key<D: TaskDelay>(&self, key: keyboard::Key, delay: &mut D) {
        self.0.personality().type_key(key, delay, self.0.queue());
    }

    pub fn type_sequence(&self, keys: &[keyboard::Key]) {
        self.0.personality().type_sequence(keys, self.0.queue());
    }

    pub fn type_str(&self, s: &str) {
        self.0.personality().type_str(s, self.0.queue());
    }

    pub fn leds(&self) -> keyboard::LedMask {
        self.0.personality().leds()
    }

    pub fn service_host_request(&mut self) -> Result<(), Error<E>> {
        self.0.service_host_request()
    }

    pub fn service_packet_queue(&mut self) -> Result<(), Error<E>> {
        self.0.service_packet_queue()
    }

    pub fn into_pins(self) -> (CLK, DATA) {
        self.0.into_pins()
    }
}

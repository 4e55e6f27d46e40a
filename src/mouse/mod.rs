//! Microsoft Intellimouse-compatible PS/2 mouse personality.

pub mod report;

use core::cell::RefCell;
use core::sync::atomic::Ordering;

use bitflags::bitflags;
use critical_section::Mutex;
use portable_atomic::AtomicBool;

use crate::device::{Bus, Personality};
use crate::error::Error;
use crate::hal::TaskDelay;
use crate::packet::Packet;
use crate::queue::PacketQueue;
use crate::store::{keys, StateStore};

bitflags! {
    /// Button bits, laid out to match the low 5 bits of the motion report
    /// header / byte 3 nibble directly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Buttons: u8 {
        const LEFT = 0b0000_0001;
        const RIGHT = 0b0000_0010;
        const MIDDLE = 0b0000_0100;
        const BUTTON_4 = 0b0000_1000;
        const BUTTON_5 = 0b0001_0000;
    }
}

/// One of the five buttons the input surface can press/release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Middle,
    Button4,
    Button5,
}

impl Button {
    fn mask(self) -> Buttons {
        match self {
            Button::Left => Buttons::LEFT,
            Button::Right => Buttons::RIGHT,
            Button::Middle => Buttons::MIDDLE,
            Button::Button4 => Buttons::BUTTON_4,
            Button::Button5 => Buttons::BUTTON_5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Stream,
    Remote,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    OneToOne,
    TwoToOne,
}

/// Sample rates the host is allowed to negotiate.
const VALID_SAMPLE_RATES: [u8; 7] = [10, 20, 40, 60, 80, 100, 200];

const DEFAULT_SAMPLE_RATE: u8 = 100;
const DEFAULT_RESOLUTION: u8 = 2; // code 2 == 4 counts/mm

// Command bytes.
const CMD_RESET: u8 = 0xFF;
const CMD_RESEND: u8 = 0xFE;
const CMD_SET_DEFAULTS: u8 = 0xF6;
const CMD_DISABLE_REPORTING: u8 = 0xF5;
const CMD_ENABLE_REPORTING: u8 = 0xF4;
const CMD_SET_SAMPLE_RATE: u8 = 0xF3;
const CMD_GET_DEVICE_ID: u8 = 0xF2;
const CMD_SET_REMOTE_MODE: u8 = 0xF0;
const CMD_SET_WRAP_MODE: u8 = 0xEE;
const CMD_RESET_WRAP_MODE: u8 = 0xEC;
const CMD_READ_DATA: u8 = 0xEB;
const CMD_SET_STREAM_MODE: u8 = 0xEA;
const CMD_STATUS_REQUEST: u8 = 0xE9;
const CMD_SET_RESOLUTION: u8 = 0xE8;
const CMD_SET_SCALING_2_1: u8 = 0xE7;
const CMD_SET_SCALING_1_1: u8 = 0xE6;

const DEVICE_ID_STANDARD: u8 = 0x00;
const DEVICE_ID_WHEEL: u8 = 0x03;
const DEVICE_ID_FIVE_BUTTON: u8 = 0x04;

/// All mutable mouse state except `dirty`, which lives outside the mutex as
/// a lock-free flag so producers never need to take it just to signal the
/// pacer.
pub(crate) struct MouseState {
    has_wheel: bool,
    has_four_five_buttons: bool,
    data_reporting_enabled: bool,
    resolution: u8,
    scale: Scale,
    mode: Mode,
    last_mode: Mode,
    sample_rate: u8,
    rate_history: [u8; 3],
    x: i32,
    y: i32,
    z: i32,
    buttons: Buttons,
}

impl MouseState {
    fn defaults() -> Self {
        MouseState {
            has_wheel: false,
            has_four_five_buttons: false,
            data_reporting_enabled: false,
            resolution: DEFAULT_RESOLUTION,
            scale: Scale::OneToOne,
            mode: Mode::Stream,
            last_mode: Mode::Stream,
            sample_rate: DEFAULT_SAMPLE_RATE,
            rate_history: [0; 3],
            x: 0,
            y: 0,
            z: 0,
            buttons: Buttons::empty(),
        }
    }

    fn reset_counters(&mut self) {
        self.x = 0;
        self.y = 0;
        self.z = 0;
    }

    fn record_sample_rate(&mut self, rate: u8) -> bool {
        if !VALID_SAMPLE_RATES.contains(&rate) {
            return false;
        }
        self.sample_rate = rate;
        self.rate_history[0] = self.rate_history[1];
        self.rate_history[1] = self.rate_history[2];
        self.rate_history[2] = rate;
        true
    }

    /// Applies any knock the current rate history satisfies and returns the
    /// device ID to report for GET_DEVICE_ID.
    fn knock_and_device_id(&mut self) -> u8 {
        if self.rate_history == [200, 100, 80] {
            self.has_wheel = true;
        } else if self.has_wheel && self.rate_history == [200, 200, 80] {
            self.has_four_five_buttons = true;
        }

        if self.has_four_five_buttons {
            DEVICE_ID_FIVE_BUTTON
        } else if self.has_wheel {
            DEVICE_ID_WHEEL
        } else {
            DEVICE_ID_STANDARD
        }
    }
}

/// PS/2 Intellimouse personality. Input-surface methods take `&self`: the
/// state they touch lives behind a `critical_section::Mutex`, so they're
/// safe to call from any execution context concurrently with command
/// dispatch.
pub struct Mouse {
    state: Mutex<RefCell<MouseState>>,
    dirty: AtomicBool,
    namespace: [u8; 16],
    namespace_len: u8,
}

impl Mouse {
    /// `namespace` identifies this device's persisted settings, e.g. a
    /// string built from its pin numbers. Truncated to 16 bytes.
    pub fn new(namespace: &str) -> Self {
        let mut buf = [0u8; 16];
        let bytes = namespace.as_bytes();
        let len = bytes.len().min(16);
        buf[..len].copy_from_slice(&bytes[..len]);
        Mouse {
            state: Mutex::new(RefCell::new(MouseState::defaults())),
            dirty: AtomicBool::new(false),
            namespace: buf,
            namespace_len: len as u8,
        }
    }

    fn namespace_str(&self) -> &str {
        core::str::from_utf8(&self.namespace[..self.namespace_len as usize]).unwrap_or("ps2dev")
    }

    pub fn move_by(&self, dx: i16, dy: i16, dz: i8) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.x += dx as i32;
            state.y += dy as i32;
            state.z += dz as i32;
        });
        self.dirty.store(true, Ordering::Release);
    }

    pub fn press(&self, button: Button) {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).buttons.insert(button.mask());
        });
        self.dirty.store(true, Ordering::Release);
    }

    pub fn release(&self, button: Button) {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).buttons.remove(button.mask());
        });
        self.dirty.store(true, Ordering::Release);
    }

    /// Press, hold for ~100 ms via the caller-supplied yielding delay, then
    /// release.
    pub fn click<D: TaskDelay>(&self, button: Button, delay: &mut D) {
        self.press(button);
        delay.delay_ms(100);
        self.release(button);
    }

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
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.x += dx as i32;
            state.y += dy as i32;
            state.z += dz as i32;
            state.buttons.set(Buttons::LEFT, left);
            state.buttons.set(Buttons::RIGHT, right);
            state.buttons.set(Buttons::MIDDLE, middle);
            state.buttons.set(Buttons::BUTTON_4, button4);
            state.buttons.set(Buttons::BUTTON_5, button5);
        });
        self.dirty.store(true, Ordering::Release);
    }

    /// Encode and enqueue one report for the current accumulators, then
    /// reset them. A report always leaves the accumulators and `dirty`
    /// clear.
    fn emit_report(&self, queue: &PacketQueue) {
        let packet = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            let packet = report::encode(&state);
            state.reset_counters();
            packet
        });
        self.dirty.store(false, Ordering::Release);
        if queue.push(packet).is_err() {
            log::debug!("ps2dev mouse: dropped report, queue full");
        }
    }

    /// Called by the embedding runtime every `1000/sample_rate` ms while in
    /// STREAM mode.
    pub fn service_stream_tick(&self, queue: &PacketQueue) {
        let (enabled, in_stream) = critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            (state.data_reporting_enabled, state.mode == Mode::Stream)
        });
        if enabled && in_stream && self.dirty.load(Ordering::Acquire) {
            self.emit_report(queue);
        }
    }

    /// Snapshot the six persisted fields. Failures are logged and
    /// swallowed, matching the original firmware's "log and move on".
    pub fn save_state<S: StateStore>(&self, store: &mut S) {
        let ns = self.namespace_str();
        let snapshot = critical_section::with(|cs| {
            let state = self.state.borrow_ref(cs);
            (
                state.has_wheel,
                state.has_four_five_buttons,
                state.data_reporting_enabled,
                state.resolution,
                state.scale == Scale::TwoToOne,
                match state.mode {
                    Mode::Stream => 0u8,
                    Mode::Remote => 1u8,
                    Mode::Wrap => 2u8,
                },
            )
        });
        let (has_wheel, has_45, rep_en, resolution, scale_2_1, mode) = snapshot;
        let fields: [(&str, u8); 6] = [
            (keys::HAS_WHEEL, has_wheel as u8),
            (keys::HAS_4_AND_5_BTN, has_45 as u8),
            (keys::DATA_REPORTING_ENABLED, rep_en as u8),
            (keys::RESOLUTION, resolution),
            (keys::SCALE, scale_2_1 as u8),
            (keys::MODE, mode),
        ];
        for (key, value) in fields {
            if store.set_u8(ns, key, value).is_err() {
                log::warn!("ps2dev mouse: failed to persist {key}");
            }
        }
    }

    /// Reload persisted settings at `begin()` when the caller requests
    /// resume. Missing keys leave the corresponding field at its default.
    pub fn load_state<S: StateStore>(&self, store: &mut S) {
        let ns = self.namespace_str();
        let has_wheel = store.get_u8(ns, keys::HAS_WHEEL).map(|v| v != 0);
        let has_45 = store.get_u8(ns, keys::HAS_4_AND_5_BTN).map(|v| v != 0);
        let rep_en = store
            .get_u8(ns, keys::DATA_REPORTING_ENABLED)
            .map(|v| v != 0);
        let resolution = store.get_u8(ns, keys::RESOLUTION);
        let scale = store.get_u8(ns, keys::SCALE).map(|v| v != 0);
        let mode = store.get_u8(ns, keys::MODE);

        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if let Some(v) = has_wheel {
                state.has_wheel = v;
            }
            if let Some(v) = has_45 {
                state.has_four_five_buttons = v;
            }
            if let Some(v) = rep_en {
                state.data_reporting_enabled = v;
            }
            if let Some(v) = resolution {
                state.resolution = v;
            }
            if let Some(v) = scale {
                state.scale = if v { Scale::TwoToOne } else { Scale::OneToOne };
            }
            if let Some(v) = mode {
                state.mode = match v {
                    1 => Mode::Remote,
                    2 => Mode::Wrap,
                    _ => Mode::Stream,
                };
                state.last_mode = state.mode;
            }
        });
    }
}

impl<E> Personality<E> for Mouse {
    fn power_on_packet(&self) -> Packet {
        Packet::from_bytes(&[0xAA, 0x00])
    }

    fn handle_command(
        &mut self,
        cmd: u8,
        bus: &mut dyn Bus<E>,
        queue: &PacketQueue,
    ) -> Result<(), Error<E>> {
        let wrap_mode = critical_section::with(|cs| self.state.borrow_ref(cs).mode == Mode::Wrap);
        if wrap_mode && cmd != CMD_SET_WRAP_MODE && cmd != CMD_RESET_WRAP_MODE {
            // WRAP echoes every byte except the two wrap-control commands,
            // with no reply envelope.
            return bus.write_retry(cmd);
        }

        match cmd {
            CMD_RESET => {
                bus.ack()?;
                critical_section::with(|cs| {
                    let mut state = self.state.borrow_ref_mut(cs);
                    *state = MouseState::defaults();
                });
                self.dirty.store(false, Ordering::Release);
                bus.write_retry(0xAA)?;
                bus.write_retry(0x00)?;
            }
            CMD_RESEND => {
                bus.ack()?;
            }
            CMD_SET_DEFAULTS => {
                bus.ack()?;
                critical_section::with(|cs| {
                    *self.state.borrow_ref_mut(cs) = MouseState::defaults();
                });
                self.dirty.store(false, Ordering::Release);
            }
            CMD_DISABLE_REPORTING => {
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).data_reporting_enabled = false;
                });
                bus.ack()?;
                self.reset_counters();
            }
            CMD_ENABLE_REPORTING => {
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).data_reporting_enabled = true;
                });
                bus.ack()?;
                self.reset_counters();
            }
            CMD_SET_SAMPLE_RATE => {
                bus.ack()?;
                let rate = bus.read_param()?;
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).record_sample_rate(rate);
                });
                bus.ack()?;
            }
            CMD_GET_DEVICE_ID => {
                bus.ack()?;
                let id =
                    critical_section::with(|cs| self.state.borrow_ref_mut(cs).knock_and_device_id());
                bus.write_retry(id)?;
            }
            CMD_SET_REMOTE_MODE => {
                bus.ack()?;
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).mode = Mode::Remote);
            }
            CMD_SET_WRAP_MODE => {
                bus.ack()?;
                critical_section::with(|cs| {
                    let mut state = self.state.borrow_ref_mut(cs);
                    state.last_mode = state.mode;
                    state.mode = Mode::Wrap;
                });
            }
            CMD_RESET_WRAP_MODE => {
                bus.ack()?;
                critical_section::with(|cs| {
                    let mut state = self.state.borrow_ref_mut(cs);
                    state.mode = state.last_mode;
                });
            }
            CMD_READ_DATA => {
                bus.ack()?;
                self.emit_report(queue);
            }
            CMD_SET_STREAM_MODE => {
                bus.ack()?;
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).mode = Mode::Stream);
            }
            CMD_STATUS_REQUEST => {
                bus.ack()?;
                let packet =
                    critical_section::with(|cs| report::encode_status(&self.state.borrow_ref(cs)));
                for &byte in packet.as_slice() {
                    bus.write_retry(byte)?;
                }
            }
            CMD_SET_RESOLUTION => {
                bus.ack()?;
                let code = bus.read_param()? & 0x03;
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).resolution = code);
                bus.ack()?;
            }
            CMD_SET_SCALING_2_1 => {
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).scale = Scale::TwoToOne);
                bus.ack()?;
            }
            CMD_SET_SCALING_1_1 => {
                critical_section::with(|cs| self.state.borrow_ref_mut(cs).scale = Scale::OneToOne);
                bus.ack()?;
            }
            other => {
                log::debug!("ps2dev mouse: unknown command {:#04x}", other);
            }
        }
        Ok(())
    }
}

impl Mouse {
    fn reset_counters(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).reset_counters());
        self.dirty.store(false, Ordering::Release);
    }
}

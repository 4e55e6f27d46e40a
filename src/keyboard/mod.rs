//! Scan Code Set 2 MF-II keyboard personality.

pub mod ascii;
pub mod scancode;

use core::cell::RefCell;

use bitflags::bitflags;
use critical_section::Mutex;

pub use scancode::Key;

use crate::device::{Bus, Personality};
use crate::error::Error;
use crate::hal::TaskDelay;
use crate::packet::Packet;
use crate::queue::PacketQueue;

bitflags! {
    /// LED mask bits from `SET_RESET_LEDS`: bit0/1/2 = scroll/num/caps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LedMask: u8 {
        const SCROLL_LOCK = 0b001;
        const NUM_LOCK = 0b010;
        const CAPS_LOCK = 0b100;
    }
}

const DEVICE_ID: [u8; 2] = [0xAB, 0x83];

// Command bytes.
const CMD_RESET: u8 = 0xFF;
const CMD_RESEND: u8 = 0xFE;
const CMD_SET_DEFAULTS: u8 = 0xF6;
const CMD_DISABLE_REPORTING: u8 = 0xF5;
const CMD_ENABLE_REPORTING: u8 = 0xF4;
const CMD_SET_TYPEMATIC_RATE: u8 = 0xF3;
const CMD_GET_DEVICE_ID: u8 = 0xF2;
const CMD_SET_SCAN_CODE_SET: u8 = 0xF0;
const CMD_ECHO: u8 = 0xEE;
const CMD_SET_RESET_LEDS: u8 = 0xED;

struct KeyboardState {
    data_reporting_enabled: bool,
    leds: LedMask,
}

/// PS/2 MF-II keyboard personality. Like [`crate::mouse::Mouse`], the state
/// an input-surface call touches lives behind a `critical_section::Mutex`
/// so `keydown`/`keyup` are safe to call from any execution context.
pub struct Keyboard {
    state: Mutex<RefCell<KeyboardState>>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            state: Mutex::new(RefCell::new(KeyboardState {
                data_reporting_enabled: false,
                leds: LedMask::empty(),
            })),
        }
    }

    pub fn leds(&self) -> LedMask {
        critical_section::with(|cs| self.state.borrow_ref(cs).leds)
    }

    fn reporting_enabled(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).data_reporting_enabled)
    }

    fn enqueue(&self, queue: &PacketQueue, bytes: &[u8]) {
        if !self.reporting_enabled() {
            return;
        }
        if queue.push(Packet::from_bytes(bytes)).is_err() {
            log::debug!("ps2dev keyboard: dropped report, queue full");
        }
    }

    /// Enqueue `key`'s make code. No-op while reporting is disabled.
    pub fn keydown(&self, key: Key, queue: &PacketQueue) {
        self.enqueue(queue, scancode::make_code(key));
    }

    /// Enqueue `key`'s break code. No-op while reporting is disabled.
    pub fn keyup(&self, key: Key, queue: &PacketQueue) {
        self.enqueue(queue, &scancode::break_code(key));
    }

    /// `keydown`, hold for `hold_ms` (at least ~10 ms), `keyup`.
    pub fn type_key<D: TaskDelay>(&self, key: Key, delay: &mut D, queue: &PacketQueue) {
        self.keydown(key, queue);
        delay.delay_ms(10);
        self.keyup(key, queue);
    }

    /// Press every key in `keys` in order, then release them in reverse
    /// order (LIFO), so chorded modifiers stay held across the keys they
    /// modify.
    pub fn type_sequence(&self, keys: &[Key], queue: &PacketQueue) {
        for &key in keys {
            self.keydown(key, queue);
        }
        for &key in keys.iter().rev() {
            self.keyup(key, queue);
        }
    }

    /// Walk `s` through the ASCII table, enqueuing each character's
    /// key sandwiched in `LShift` make/break when the character needs it.
    /// Unrecognised bytes are skipped.
    pub fn type_str(&self, s: &str, queue: &PacketQueue) {
        for &byte in s.as_bytes() {
            let Some((key, shift)) = ascii::lookup(byte) else {
                continue;
            };
            if shift {
                self.keydown(Key::LShift, queue);
            }
            self.keydown(key, queue);
            self.keyup(key, queue);
            if shift {
                self.keyup(Key::LShift, queue);
            }
        }
    }
}

impl<E> Personality<E> for Keyboard {
    fn power_on_packet(&self) -> Packet {
        Packet::from_bytes(&[0xAA])
    }

    fn handle_command(
        &mut self,
        cmd: u8,
        bus: &mut dyn Bus<E>,
        _queue: &PacketQueue,
    ) -> Result<(), Error<E>> {
        match cmd {
            CMD_RESET => {
                bus.ack()?;
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).data_reporting_enabled = false;
                });
                bus.write_retry(0xAA)?;
            }
            CMD_RESEND => {
                bus.ack()?;
            }
            CMD_SET_DEFAULTS => {
                bus.ack()?;
            }
            CMD_DISABLE_REPORTING => {
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).data_reporting_enabled = false;
                });
                bus.ack()?;
            }
            CMD_ENABLE_REPORTING => {
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).data_reporting_enabled = true;
                });
                bus.ack()?;
            }
            CMD_SET_TYPEMATIC_RATE => {
                bus.ack()?;
                let _rate = bus.read_param()?;
                bus.ack()?;
            }
            CMD_GET_DEVICE_ID => {
                bus.ack()?;
                bus.write_retry(DEVICE_ID[0])?;
                bus.write_retry(DEVICE_ID[1])?;
            }
            CMD_SET_SCAN_CODE_SET => {
                bus.ack()?;
                let _set = bus.read_param()?;
                bus.ack()?;
            }
            CMD_ECHO => {
                bus.write_paced(0xEE)?;
            }
            CMD_SET_RESET_LEDS => {
                bus.ack()?;
                let mask = bus.read_param()?;
                critical_section::with(|cs| {
                    self.state.borrow_ref_mut(cs).leds = LedMask::from_bits_truncate(mask);
                });
                bus.ack()?;
            }
            other => {
                log::debug!("ps2dev keyboard: unknown command {:#04x}", other);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_mask_round_trips_bits() {
        let mask = LedMask::from_bits_truncate(0x07);
        assert!(mask.contains(LedMask::SCROLL_LOCK));
        assert!(mask.contains(LedMask::NUM_LOCK));
        assert!(mask.contains(LedMask::CAPS_LOCK));
    }

    #[test]
    fn new_keyboard_has_reporting_disabled() {
        let kb = Keyboard::new();
        assert!(!kb.reporting_enabled());
    }
}

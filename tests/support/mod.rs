//! Shared test harness: a bus double that lets personality-level tests drive
//! `handle_command` directly with canned command-parameter bytes and inspect
//! exactly what was written back, without bit-banging real GPIOs.

use std::collections::VecDeque;

use ps2dev::{Bus, Error};

pub struct MockBus {
    pub written: Vec<u8>,
    pub to_read: VecDeque<u8>,
}

impl MockBus {
    pub fn new() -> Self {
        MockBus {
            written: Vec::new(),
            to_read: VecDeque::new(),
        }
    }

    pub fn with_params(params: &[u8]) -> Self {
        MockBus {
            written: Vec::new(),
            to_read: params.iter().copied().collect(),
        }
    }
}

impl Bus<()> for MockBus {
    fn write(&mut self, byte: u8) -> Result<(), Error<()>> {
        self.written.push(byte);
        Ok(())
    }

    fn write_retry(&mut self, byte: u8) -> Result<(), Error<()>> {
        self.written.push(byte);
        Ok(())
    }

    fn write_paced(&mut self, byte: u8) -> Result<(), Error<()>> {
        self.written.push(byte);
        Ok(())
    }

    fn ack(&mut self) -> Result<(), Error<()>> {
        self.written.push(0xFA);
        Ok(())
    }

    fn read_param(&mut self) -> Result<u8, Error<()>> {
        self.to_read.pop_front().ok_or(Error::Timeout)
    }
}

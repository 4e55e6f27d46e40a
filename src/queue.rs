use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::packet::Packet;

/// Depth of the outbound packet queue.
pub const PACKET_QUEUE_LENGTH: usize = 20;

/// The bounded, MPSC outbound packet queue: any input-surface call may push
/// (from any execution context), `service_packet_queue` is the sole
/// consumer. Guarded by a `critical_section::Mutex` rather than a real OS
/// mutex, since the embedding scheduler — not this crate — decides what
/// "execution context" even means here (task, interrupt, or a single
/// cooperative loop).
pub struct PacketQueue {
    inner: Mutex<RefCell<Deque<Packet, PACKET_QUEUE_LENGTH>>>,
}

impl PacketQueue {
    pub const fn new() -> Self {
        PacketQueue {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Enqueue a packet. Returns `Err(packet)` (dropped by the caller) if the
    /// queue is full — we never block a producer to make room.
    pub fn push(&self, packet: Packet) -> Result<(), Packet> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push_back(packet))
    }

    pub fn pop(&self) -> Option<Packet> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_empty())
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

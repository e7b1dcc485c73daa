//! Receive Buffer
//!
//! Inbound bytes from the host are stored but never interpreted; there is
//! no command protocol. Capacity is fixed and what happens on overflow is
//! chosen explicitly by [`OverflowPolicy`].

use heapless::Deque;

use crate::Error;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Discard the incoming byte and report [`Error::ReceiveOverflow`].
    Reject,
    /// Evict the oldest byte to make room.
    Overwrite,
}

pub struct ReceiveBuffer<const N: usize> {
    bytes: Deque<u8, N>,
    policy: OverflowPolicy,
    dropped: u32,
}

impl<const N: usize> ReceiveBuffer<N> {
    pub const fn new(policy: OverflowPolicy) -> Self {
        Self { bytes: Deque::new(), policy, dropped: 0 }
    }

    /// Called from the receive interrupt, one byte at a time.
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        if self.bytes.is_full() {
            self.dropped = self.dropped.wrapping_add(1);
            match self.policy {
                OverflowPolicy::Reject => return Err(Error::ReceiveOverflow),
                OverflowPolicy::Overwrite => {
                    self.bytes.pop_front();
                }
            }
        }
        self.bytes.push_back(byte).map_err(|_| Error::ReceiveOverflow)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Bytes lost to overflow since the last [`clear`](Self::clear).
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &u8> {
        self.bytes.iter()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.dropped = 0;
    }
}

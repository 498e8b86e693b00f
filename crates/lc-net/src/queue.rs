//! Ordered per-frame control packet queue. Grounded on the teacher's
//! `net_queue.rs` `PacketQueue`/`PacketQueueSender` split (a bounded
//! `crossbeam-channel` decoupling a receiving thread from the game
//! thread, with a cloneable sender handle and non-blocking drain), but
//! specialized for spec §6's requirement that packets be consumable *in
//! frame order*: a raw channel only guarantees FIFO delivery per sender,
//! not per frame number, so ticks are buffered into a `BTreeMap` keyed by
//! frame as they drain off the channel and only handed out once the
//! caller asks for the frame that is actually next.
use std::collections::BTreeMap;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::packet::ControlSyncTick;

/// Default channel capacity, matching the teacher's `DEFAULT_QUEUE_CAPACITY`
/// — enough to absorb a burst without the sender blocking the I/O thread.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

pub struct ControlQueue {
    sender: Sender<ControlSyncTick>,
    receiver: Receiver<ControlSyncTick>,
    pending: BTreeMap<u32, ControlSyncTick>,
}

impl ControlQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        ControlQueue { sender, receiver, pending: BTreeMap::new() }
    }

    pub fn sender(&self) -> ControlQueueSender {
        ControlQueueSender { sender: self.sender.clone() }
    }

    fn drain_channel(&mut self) {
        while let Ok(tick) = self.receiver.try_recv() {
            if self.pending.insert(tick.frame, tick).is_some() {
                tracing::warn!("duplicate control tick received for a frame, keeping the newest");
            }
        }
    }

    /// Removes and returns the buffered tick for `frame`, if it has
    /// arrived. Does not block; the scheduler is expected to stall the
    /// tick loop itself if a frame's packet is still missing.
    pub fn pop_frame(&mut self, frame: u32) -> Option<ControlSyncTick> {
        self.drain_channel();
        self.pending.remove(&frame)
    }

    /// The lowest buffered frame number, if any ticks are waiting.
    pub fn next_ready_frame(&mut self) -> Option<u32> {
        self.drain_channel();
        self.pending.keys().next().copied()
    }

    pub fn pending_count(&mut self) -> usize {
        self.drain_channel();
        self.pending.len()
    }
}

#[derive(Clone)]
pub struct ControlQueueSender {
    sender: Sender<ControlSyncTick>,
}

impl ControlQueueSender {
    /// Enqueues a tick without blocking; drops it if the channel is full
    /// or the receiving side has gone away, matching the teacher's
    /// producer-never-blocks policy for a real-time control channel.
    pub fn try_send(&self, tick: ControlSyncTick) -> bool {
        match self.sender.try_send(tick) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_served_in_frame_order_regardless_of_arrival_order() {
        let mut queue = ControlQueue::new(DEFAULT_QUEUE_CAPACITY);
        let sender = queue.sender();
        assert!(sender.try_send(ControlSyncTick::new(3, 1)));
        assert!(sender.try_send(ControlSyncTick::new(1, 1)));
        assert!(sender.try_send(ControlSyncTick::new(2, 1)));

        assert_eq!(queue.next_ready_frame(), Some(1));
        assert_eq!(queue.pop_frame(1).unwrap().frame, 1);
        assert_eq!(queue.pop_frame(2).unwrap().frame, 2);
        assert_eq!(queue.pop_frame(3).unwrap().frame, 3);
    }

    #[test]
    fn pop_frame_returns_none_for_a_frame_that_has_not_arrived() {
        let mut queue = ControlQueue::new(DEFAULT_QUEUE_CAPACITY);
        assert_eq!(queue.pop_frame(0), None);
    }

    #[test]
    fn full_queue_drops_new_ticks_rather_than_blocking() {
        let queue = ControlQueue::new(1);
        let sender = queue.sender();
        assert!(sender.try_send(ControlSyncTick::new(0, 0)));
        assert!(!sender.try_send(ControlSyncTick::new(1, 0)));
    }

    #[test]
    fn pending_count_reflects_buffered_but_unpopped_ticks() {
        let mut queue = ControlQueue::new(DEFAULT_QUEUE_CAPACITY);
        let sender = queue.sender();
        sender.try_send(ControlSyncTick::new(0, 0));
        sender.try_send(ControlSyncTick::new(1, 0));
        assert_eq!(queue.pending_count(), 2);
        queue.pop_frame(0);
        assert_eq!(queue.pending_count(), 1);
    }
}

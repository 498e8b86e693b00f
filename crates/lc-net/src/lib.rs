//! Control protocol and ordered per-frame packet queue (spec §6). This
//! crate owns only what the simulation core must interpret — the
//! `ControlSyncTick` packet and a queue that hands ticks out in frame
//! order — not any transport, addressing, or retransmission scheme.
pub mod packet;
pub mod queue;

pub use packet::{ControlSyncTick, PlayerInput};
pub use queue::{ControlQueue, ControlQueueSender, DEFAULT_QUEUE_CAPACITY};

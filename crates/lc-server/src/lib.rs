pub mod host;
pub mod scheduler;

pub use host::EngineHost;
pub use scheduler::{Scheduler, TickReport};

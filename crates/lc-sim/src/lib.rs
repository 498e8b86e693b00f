pub mod context;
pub mod find;
pub mod message;
pub mod motion;
pub mod object;
pub mod pathfinder;
pub mod pxs;

pub use context::Section;
pub use find::{count, find_first, find_many, sort_by, Criterion, SortKey};
pub use message::{Message, MessageBoard, MessageKind};
pub use motion::{sim_flight, stabilize, step_object, ContactSink, NoopSink};
pub use object::{Object, ObjectId, Ocf, Status};
pub use pathfinder::{direct_path_free, PathResult, Pathfinder, RayState, TransferZone, MAX_CRAWL_PER_LEVEL, MAX_RAY};
pub use pxs::{Particle, PxsId, PxsPool};

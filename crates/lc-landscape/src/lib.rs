//! Dense pixel landscape, its material table, the 32x32 spatial sector
//! index objects are filed into, and the texture map that pairs materials
//! with rendered surfaces.

pub mod landscape;
pub mod material;
pub mod sector;
pub mod texmap;

pub use landscape::{Cell, Landscape, VEHICLE_MATERIAL};
pub use material::{Material, MaterialTable, ReactionEffect, MNONE};
pub use sector::{ObjectId, SectorIndex, SECTOR_HGT, SECTOR_WDT};
pub use texmap::{TexMap, TexMapEntry, TexMapError};

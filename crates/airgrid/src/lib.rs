#![doc = include_str!("../readme.md")]

pub mod attributes;
pub mod cell;
pub mod codec;
pub mod conflict;
pub mod enumerate;
pub mod error;
pub mod json;
pub mod manager;
pub mod rounding;
pub mod route;

pub mod prelude {
    pub use crate::attributes::{AttributeRecord, AttributeStore, Category};
    pub use crate::cell::{Cell, CellSize};
    pub use crate::codec::{decode, encode, Decoded};
    pub use crate::conflict::{detect, Conflict, ConflictReport, Route as ConflictRoute, TrajectoryPoint};
    pub use crate::enumerate::BBox;
    pub use crate::error::{Error, Result};
    pub use crate::json::{export_json, import_json};
    pub use crate::manager::{Manager, Stats};
    pub use crate::route::Waypoint;
}

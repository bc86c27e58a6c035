#![doc = include_str!("../README.md")]

mod error;
pub mod geom;
pub mod queue;
pub mod search;
pub mod tree;
mod r#type;

pub use error::{BbdIndexError, Result};
pub use geom::{Point, PointObj, Rect};
pub use r#type::CoordFloat;
pub use tree::{BBDTree, BuildVariant};

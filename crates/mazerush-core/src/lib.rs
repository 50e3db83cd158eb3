//! Leaf types shared by every Maze Rush crate.

pub mod car;
pub mod geom;
pub mod palette;
pub mod time;

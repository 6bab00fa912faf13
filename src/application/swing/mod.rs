pub mod consensus;
pub mod regime;

pub mod cluster;
pub mod kdtree;

pub use cluster::*;
pub use kdtree::KdTree;

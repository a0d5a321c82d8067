//! Core-Datenobjekte, die von den Interaktoren verändert werden.

pub mod fiber_bundle;
pub mod geometry;
pub mod point_set;
pub mod slice_navigation;
pub mod spatial;

pub use fiber_bundle::FiberBundle;
pub use geometry::{
    distance_to_line, normalized_axes, rotation_about, scaling_about, Geometry3D, PlaneGeometry,
    SubscriptionToken, WorldGeometry,
};
pub use point_set::{PointEntry, PointSet};
pub use slice_navigation::SliceNavigationController;
pub use spatial::{PointIndex, SpatialMatch};

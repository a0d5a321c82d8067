//! Koordination mehrerer Schicht-Navigationen.

pub mod slices_coordinator;
pub mod slices_rotator;

pub use slices_coordinator::{SliceCoordination, SlicesCoordinator};
pub use slices_rotator::SlicesRotator;

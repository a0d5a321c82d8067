//! Geteilte Typen, die von mehreren Schichten genutzt werden.

pub mod options;

pub use options::{GizmoAllowOptions, InteractionOptions};

//! Operationen, Do-/Undo-Paare und der Undo-Controller.

pub mod operation;
pub mod operation_event;
pub mod undo_controller;

pub use operation::{ActorId, Operation, OperationActor, OperationKind, OperationPayload};
pub use operation_event::{OperationEvent, SharedActor};
pub use undo_controller::{SharedUndoController, UndoController, UndoEntry};

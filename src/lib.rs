//! Interaktions-Kern für medizinische Bildgebung.
//! Core-Funktionalität als Library exportiert für Tests und Wiederverwendung.
//!
//! Eingabe-Events werden über ein konfiguriertes Event-Mapping auf abstrakte
//! Event-IDs abgebildet und von XML-definierten State-Machines verarbeitet.
//! Jede Änderung an Datenobjekten läuft als Operation und ist rückgängig machbar.

pub mod controllers;
pub mod core;
pub mod gizmo;
pub mod interaction;
pub mod interactors;
pub mod shared;
pub mod tools;
pub mod undo;
pub mod xml;

pub use controllers::{SliceCoordination, SlicesCoordinator, SlicesRotator};
pub use core::{FiberBundle, Geometry3D, PlaneGeometry, PointSet, SliceNavigationController, WorldGeometry};
pub use gizmo::{Gizmo, GizmoInteraction, HandleType};
pub use interaction::{
    Action, ActionId, Behavior, Delivery, Dispatch, Event, EventId, EventListener,
    GlobalInteraction, Interactor, StateEvent, StateMachine, StateMachineFactory,
};
pub use interactors::{AffineInteraction, CoordinateSupplier, FiberBundleInteraction, PointSetInteraction};
pub use shared::{GizmoAllowOptions, InteractionOptions};
pub use tools::{Tool, ToolManager};
pub use undo::{Operation, OperationEvent, OperationKind, SharedUndoController, UndoController};
pub use xml::load_interaction_config;

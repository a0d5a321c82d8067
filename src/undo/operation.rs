//! Reversible Operationen und die Schnittstelle der Objekte, die sie ausführen.

use glam::{DAffine3, DVec3};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Prozessweit eindeutige Identität eines `OperationActor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    /// Vergibt die nächste freie ID.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Art einer Operation (wird u.a. für `get_last_of_type` verglichen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Nothing,
    Add,
    Insert,
    Delete,
    Move,
    Select,
    Deselect,
    DeselectAll,
    Terminate,
    Rotate,
    Translate,
    Scale,
    ApplyTransform,
}

/// Nutzdaten einer Operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperationPayload {
    None,
    /// Punkt-Operation: Position und Index im Ziel
    Point { position: DVec3, index: usize },
    /// Rotation um `axis` durch `center` (Grad)
    Rotation {
        center: DVec3,
        axis: DVec3,
        angle_deg: f64,
    },
    Translation(DVec3),
    /// Skalierung um `center` mit Faktor je Achse
    Scale { center: DVec3, factors: DVec3 },
    /// Komplette Index-zu-Welt-Transformation
    Transform(DAffine3),
}

/// Beschreibung einer einzelnen, reversiblen Mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub payload: OperationPayload,
    /// Zeitschritt (ms), auf den sich die Operation bezieht
    pub time_ms: f64,
    pub description: String,
}

impl Operation {
    pub fn new(kind: OperationKind, payload: OperationPayload) -> Self {
        Self {
            kind,
            payload,
            time_ms: 0.0,
            description: String::new(),
        }
    }

    /// Punkt-Operation (Add/Move/Delete/Select/...).
    pub fn point(kind: OperationKind, position: DVec3, index: usize) -> Self {
        Self::new(kind, OperationPayload::Point { position, index })
    }

    pub fn rotation(center: DVec3, axis: DVec3, angle_deg: f64) -> Self {
        Self::new(
            OperationKind::Rotate,
            OperationPayload::Rotation {
                center,
                axis,
                angle_deg,
            },
        )
    }

    pub fn translation(delta: DVec3) -> Self {
        Self::new(OperationKind::Translate, OperationPayload::Translation(delta))
    }

    pub fn transform(transform: DAffine3) -> Self {
        Self::new(
            OperationKind::ApplyTransform,
            OperationPayload::Transform(transform),
        )
    }

    pub fn with_time(mut self, time_ms: f64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Position, falls es eine Punkt-Operation ist.
    pub fn point_position(&self) -> Option<DVec3> {
        match self.payload {
            OperationPayload::Point { position, .. } => Some(position),
            _ => None,
        }
    }

    /// Index, falls es eine Punkt-Operation ist.
    pub fn point_index(&self) -> Option<usize> {
        match self.payload {
            OperationPayload::Point { index, .. } => Some(index),
            _ => None,
        }
    }
}

/// Datenobjekt, das Operationen ausführen kann.
///
/// Der Kern ruft nur `execute_operation` auf und kennt sonst keine Interna.
pub trait OperationActor {
    fn actor_id(&self) -> ActorId;

    /// Führt die Operation aus. Nicht unterstützte Arten werden ignoriert.
    fn execute_operation(&mut self, operation: &Operation);
}

//! Paar aus Do- und Undo-Operation samt Ziel-Actor.

use super::operation::{ActorId, Operation, OperationActor, OperationKind};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Gemeinsam genutztes Ziel einer Operation.
pub type SharedActor = Rc<RefCell<dyn OperationActor>>;

/// Do-/Undo-Paar für ein Ziel.
///
/// Der Actor wird nur schwach referenziert: wird das Datenobjekt zerstört,
/// laufen Undo/Redo für diesen Eintrag ins Leere statt es am Leben zu halten.
#[derive(Clone)]
pub struct OperationEvent {
    actor: Weak<RefCell<dyn OperationActor>>,
    actor_id: ActorId,
    do_op: Operation,
    undo_op: Operation,
    pub description: String,
}

impl OperationEvent {
    pub fn new(actor: &SharedActor, do_op: Operation, undo_op: Operation) -> Self {
        let actor_id = actor.borrow().actor_id();
        Self::with_actor_id(Rc::downgrade(actor), actor_id, do_op, undo_op)
    }

    /// Variante, wenn der Actor gerade (mutabel) ausgeliehen ist.
    pub fn with_actor_id(
        actor: Weak<RefCell<dyn OperationActor>>,
        actor_id: ActorId,
        do_op: Operation,
        undo_op: Operation,
    ) -> Self {
        let description = do_op.description.clone();
        Self {
            actor,
            actor_id,
            do_op,
            undo_op,
            description,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Die Vorwärts-Operation.
    pub fn operation(&self) -> &Operation {
        &self.do_op
    }

    pub fn undo_operation(&self) -> &Operation {
        &self.undo_op
    }

    pub fn kind(&self) -> OperationKind {
        self.do_op.kind
    }

    /// Lebt das Ziel noch?
    pub fn is_actor_alive(&self) -> bool {
        self.actor.strong_count() > 0
    }

    /// Spielt die Undo-Operation ab. `false` wenn das Ziel nicht mehr existiert.
    pub(crate) fn replay_undo(&self) -> bool {
        self.replay(&self.undo_op)
    }

    /// Spielt die Do-Operation erneut ab.
    pub(crate) fn replay_do(&self) -> bool {
        self.replay(&self.do_op)
    }

    fn replay(&self, operation: &Operation) -> bool {
        let Some(actor) = self.actor.upgrade() else {
            log::warn!(
                "Undo/Redo '{}': Ziel {:?} existiert nicht mehr",
                self.description,
                self.actor_id
            );
            return false;
        };
        let Ok(mut actor) = actor.try_borrow_mut() else {
            log::error!(
                "Undo/Redo '{}': Ziel {:?} ist gerade in Benutzung",
                self.description,
                self.actor_id
            );
            return false;
        };
        actor.execute_operation(operation);
        true
    }
}

impl fmt::Debug for OperationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationEvent")
            .field("actor_id", &self.actor_id)
            .field("do_op", &self.do_op)
            .field("undo_op", &self.undo_op)
            .field("description", &self.description)
            .finish()
    }
}

//! Liefert Weltkoordinaten an ein beliebiges Ziel (z.B. Schicht-Navigation).

use super::{execute, execute_group, upgrade_target};
use crate::interaction::{Action, ActionContext, ActionId, ActionTable, Behavior, StateEvent};
use crate::undo::{Operation, OperationActor, OperationKind, SharedActor};
use glam::DVec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Schickt Add-/Move-Operationen mit der Mausposition an sein Ziel.
pub struct CoordinateSupplier {
    target: Weak<RefCell<dyn OperationActor>>,
    current_point: DVec3,
    old_point: DVec3,
}

impl CoordinateSupplier {
    pub fn new(target: &SharedActor) -> Self {
        Self {
            target: Rc::downgrade(target),
            current_point: DVec3::ZERO,
            old_point: DVec3::ZERO,
        }
    }

    /// Zuletzt gelieferte Koordinate.
    pub fn current_point(&self) -> DVec3 {
        self.current_point
    }

    fn new_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return state_event.display_position().is_some();
        };
        let Some(target) = upgrade_target(&self.target, ctx) else {
            return false;
        };
        self.old_point = position;
        self.current_point = position;
        let time = state_event.time_ms();
        let do_op = Operation::point(OperationKind::Add, position, 0).with_time(time);
        let undo_op = Operation::point(OperationKind::Delete, position, 0).with_time(time);
        execute_group(&target, vec![(do_op, undo_op)], "Punkt setzen", ctx)
    }

    fn move_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return state_event.display_position().is_some();
        };
        self.current_point = position;
        let Some(target) = upgrade_target(&self.target, ctx) else {
            return false;
        };
        let op = Operation::point(OperationKind::Move, position, 0).with_time(state_event.time_ms());
        execute(&target, &op)
    }

    /// Schließt eine Bewegung ab: ein Undo-Eintrag zurück auf die Position vor
    /// der Bewegung (letzter Move dieses Ziels, sonst Ursprung).
    fn finish_movement(
        &mut self,
        _: &Action,
        state_event: &StateEvent,
        ctx: &mut ActionContext<'_>,
    ) -> bool {
        let Some(position) = state_event.world_position() else {
            return state_event.display_position().is_some();
        };
        let Some(target) = upgrade_target(&self.target, ctx) else {
            return false;
        };
        let Ok(actor_id) = target.try_borrow().map(|t| t.actor_id()) else {
            return false;
        };
        let previous = ctx
            .undo_controller()
            .try_borrow()
            .ok()
            .and_then(|undo| {
                undo.get_last_of_type(actor_id, OperationKind::Move)
                    .and_then(|event| event.operation().point_position())
            })
            .unwrap_or(DVec3::ZERO);

        self.current_point = position;
        let time = state_event.time_ms();
        let do_op = Operation::point(OperationKind::Move, position, 0).with_time(time);
        let undo_op = Operation::point(OperationKind::Move, previous, 0).with_time(time);
        let ok = execute_group(&target, vec![(do_op, undo_op)], "Koordinate verschieben", ctx);
        ok && execute(&target, &Operation::point(OperationKind::Terminate, position, 0))
    }
}

impl Behavior for CoordinateSupplier {
    const NAME: &'static str = "CoordinateSupplier";

    fn action_table() -> ActionTable<Self> {
        ActionTable::new()
            .layer(
                "CoordinateSupplier",
                &[
                    (ActionId::NEW_POINT, Self::new_point),
                    (ActionId::INIT_MOVEMENT, Self::move_point),
                    (ActionId::MOVE_POINT, Self::move_point),
                    (ActionId::MOVE, Self::move_point),
                    (ActionId::FINISH_MOVEMENT, Self::finish_movement),
                ],
            )
            .with_base_layer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PointSet;
    use crate::interaction::{
        Event, EventId, Interactor, StateMachine, StateMachineTable, TableBuilder,
    };
    use crate::undo::UndoController;
    use std::sync::Arc;

    fn table() -> Arc<StateMachineTable> {
        let table = TableBuilder::new("coordinatesupplier")
            .state("neutral", true)
            .transition(
                "neutral",
                EventId::LEFT_MOUSE_PRESS_SHIFT,
                "moving",
                vec![Action::new(ActionId::NEW_POINT)],
            )
            .state("moving", false)
            .transition(
                "moving",
                EventId::LEFT_MOUSE_DRAG,
                "moving",
                vec![Action::new(ActionId::MOVE_POINT)],
            )
            .transition(
                "moving",
                EventId::LEFT_MOUSE_RELEASE,
                "neutral",
                vec![Action::new(ActionId::FINISH_MOVEMENT)],
            )
            .build(ActionId::is_builtin)
            .expect("gültig");
        Arc::new(table)
    }

    #[test]
    fn finish_movement_pushes_single_undo_entry() {
        let points = Rc::new(RefCell::new(PointSet::new()));
        let actor: SharedActor = points.clone();
        let undo = UndoController::shared(10);
        let mut supplier = Interactor::with_machine(
            StateMachine::new(table(), undo.clone()),
            CoordinateSupplier::new(&actor),
        );

        let a = DVec3::new(1.0, 0.0, 0.0);
        let b = DVec3::new(4.0, 0.0, 0.0);
        supplier.handle_event(&StateEvent::new(
            EventId::LEFT_MOUSE_PRESS_SHIFT,
            Event::left_press(a),
        ));
        supplier.handle_event(&StateEvent::new(EventId::LEFT_MOUSE_DRAG, Event::left_drag(b)));
        supplier.handle_event(&StateEvent::new(
            EventId::LEFT_MOUSE_RELEASE,
            Event::left_release(b),
        ));

        assert_eq!(points.borrow().positions(), vec![b]);
        assert_eq!(points.borrow().terminated_count(), 1);
        assert_eq!(undo.borrow().len(), 2);

        // Move zurück auf den Ursprung (kein früherer Move vorhanden)
        assert!(undo.borrow_mut().undo());
        assert_eq!(points.borrow().positions(), vec![DVec3::ZERO]);
        assert!(undo.borrow_mut().undo());
        assert!(points.borrow().is_empty());
    }

    #[test]
    fn display_only_events_are_accepted() {
        let points = Rc::new(RefCell::new(PointSet::new()));
        let actor: SharedActor = points.clone();
        let mut supplier = Interactor::with_machine(
            StateMachine::new(table(), UndoController::shared(10)),
            CoordinateSupplier::new(&actor),
        );
        let display_only = Event::Display(crate::interaction::DisplayPositionEvent {
            kind: crate::interaction::PointerKind::Press,
            button: crate::interaction::MouseButton::Left,
            modifiers: crate::interaction::Modifiers::SHIFT,
            display_position: glam::DVec2::new(10.0, 10.0),
            sender: None,
        });

        let result = supplier.handle_event(&StateEvent::new(
            EventId::LEFT_MOUSE_PRESS_SHIFT,
            display_only,
        ));

        assert!(result.is_ok());
        assert!(points.borrow().is_empty());
    }

    #[test]
    fn dropped_target_fails_without_undo_entry() {
        let undo = UndoController::shared(10);
        let mut supplier = {
            let points = Rc::new(RefCell::new(PointSet::new()));
            let actor: SharedActor = points;
            Interactor::with_machine(
                StateMachine::new(table(), undo.clone()),
                CoordinateSupplier::new(&actor),
            )
        };

        let result = supplier.handle_event(&StateEvent::new(
            EventId::LEFT_MOUSE_PRESS_SHIFT,
            Event::left_press(DVec3::ONE),
        ));

        assert!(result.is_handled());
        assert!(!result.is_ok());
        assert!(undo.borrow().is_empty());
    }
}

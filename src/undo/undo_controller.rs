//! Undo/Redo-Stack aus `OperationEvent`s.

use super::operation::{ActorId, OperationKind};
use super::operation_event::OperationEvent;
use std::cell::RefCell;
use std::rc::Rc;

/// Undo-Controller, der per Dependency Injection an State-Machines gereicht wird.
pub type SharedUndoController = Rc<RefCell<UndoController>>;

/// Ein Undo-Schritt: ein oder mehrere `OperationEvent`s, die gemeinsam
/// rückgängig gemacht werden.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    events: Vec<OperationEvent>,
}

impl UndoEntry {
    pub fn events(&self) -> &[OperationEvent] {
        &self.events
    }

    pub fn description(&self) -> &str {
        self.events
            .last()
            .map(|e| e.description.as_str())
            .unwrap_or("")
    }
}

/// Begrenzter Undo/Redo-Manager auf Operationsbasis.
#[derive(Debug)]
pub struct UndoController {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    max_depth: usize,
}

impl Default for UndoController {
    fn default() -> Self {
        Self::new_with_capacity(Self::DEFAULT_DEPTH)
    }
}

impl UndoController {
    /// Standard-Tiefe, wenn nichts konfiguriert ist.
    pub const DEFAULT_DEPTH: usize = 200;

    /// Erstellt einen Controller mit maximaler Stack-Tiefe (mindestens 1).
    pub fn new_with_capacity(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(1024)),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Erstellt einen Controller zum Teilen zwischen mehreren Interactors.
    pub fn shared(max_depth: usize) -> SharedUndoController {
        Rc::new(RefCell::new(Self::new_with_capacity(max_depth)))
    }

    /// Legt einen einzelnen Undo-Schritt ab. Leert den Redo-Stack.
    pub fn set_operation_event(&mut self, event: OperationEvent) {
        self.push_entry(UndoEntry {
            events: vec![event],
        });
    }

    /// Legt mehrere Events als einen gemeinsamen Undo-Schritt ab.
    pub fn set_operation_group(&mut self, events: Vec<OperationEvent>) {
        if events.is_empty() {
            return;
        }
        self.push_entry(UndoEntry { events });
    }

    fn push_entry(&mut self, entry: UndoEntry) {
        if self.undo_stack.len() >= self.max_depth {
            let evicted = self.undo_stack.remove(0);
            log::debug!("Undo-Stack voll, verwerfe '{}'", evicted.description());
        }
        log::debug!("Undo-Eintrag '{}' abgelegt", entry.description());
        self.undo_stack.push(entry);
        self.redo_stack.clear();
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Anzahl der Undo-Schritte.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Macht den letzten Schritt rückgängig (Events in umgekehrter Reihenfolge).
    ///
    /// Gibt `false` zurück, wenn nichts zu tun war oder kein Ziel mehr lebt.
    /// Der Eintrag wandert in beiden Fällen (außer leer) auf den Redo-Stack.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            log::debug!("Undo: nichts zu tun");
            return false;
        };
        let mut any = false;
        for event in entry.events.iter().rev() {
            any |= event.replay_undo();
        }
        log::info!("Undo '{}' ausgeführt", entry.description());
        if self.redo_stack.len() >= self.max_depth {
            self.redo_stack.remove(0);
        }
        self.redo_stack.push(entry);
        any
    }

    /// Wiederholt den zuletzt rückgängig gemachten Schritt.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            log::debug!("Redo: nichts zu tun");
            return false;
        };
        let mut any = false;
        for event in &entry.events {
            any |= event.replay_do();
        }
        log::info!("Redo '{}' ausgeführt", entry.description());
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(entry);
        any
    }

    /// Jüngstes Event der Art `kind` für das Ziel `actor` (andere Ziele und
    /// Arten werden übersprungen).
    pub fn get_last_of_type(&self, actor: ActorId, kind: OperationKind) -> Option<&OperationEvent> {
        self.undo_stack
            .iter()
            .rev()
            .flat_map(|entry| entry.events.iter().rev())
            .find(|event| event.actor_id() == actor && event.kind() == kind)
    }

    /// Jüngster Undo-Schritt.
    pub fn last_entry(&self) -> Option<&UndoEntry> {
        self.undo_stack.last()
    }

    /// Verwirft die gesamte History.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::{Operation, OperationActor, SharedActor};
    use glam::DVec3;

    /// Minimaler Actor: ein einzelner Wert, Move setzt ihn.
    struct Slider {
        id: ActorId,
        value: DVec3,
    }

    impl OperationActor for Slider {
        fn actor_id(&self) -> ActorId {
            self.id
        }

        fn execute_operation(&mut self, operation: &Operation) {
            if let Some(position) = operation.point_position() {
                self.value = position;
            }
        }
    }

    fn slider() -> (Rc<RefCell<Slider>>, SharedActor) {
        let concrete = Rc::new(RefCell::new(Slider {
            id: ActorId::next(),
            value: DVec3::ZERO,
        }));
        let shared: SharedActor = concrete.clone();
        (concrete, shared)
    }

    fn move_event(actor: &SharedActor, from: f64, to: f64) -> OperationEvent {
        OperationEvent::new(
            actor,
            Operation::point(OperationKind::Move, DVec3::splat(to), 0),
            Operation::point(OperationKind::Move, DVec3::splat(from), 0),
        )
    }

    #[test]
    fn empty_controller_cannot_undo_or_redo() {
        let mut undo = UndoController::new_with_capacity(10);
        assert!(!undo.can_undo());
        assert!(!undo.can_redo());
        assert!(!undo.undo());
        assert!(!undo.redo());
    }

    #[test]
    fn undo_and_redo_replay_operations() {
        let (concrete, actor) = slider();
        let mut undo = UndoController::new_with_capacity(10);

        concrete.borrow_mut().value = DVec3::splat(5.0);
        undo.set_operation_event(move_event(&actor, 0.0, 5.0));

        assert!(undo.undo());
        assert_eq!(concrete.borrow().value, DVec3::ZERO);
        assert!(undo.can_redo());

        assert!(undo.redo());
        assert_eq!(concrete.borrow().value, DVec3::splat(5.0));
        assert!(!undo.can_redo());
    }

    #[test]
    fn new_push_clears_redo_stack() {
        let (_concrete, actor) = slider();
        let mut undo = UndoController::new_with_capacity(10);
        undo.set_operation_event(move_event(&actor, 0.0, 1.0));
        undo.undo();
        assert!(undo.can_redo());

        undo.set_operation_event(move_event(&actor, 0.0, 2.0));
        assert!(!undo.can_redo());
    }

    #[test]
    fn respects_max_depth() {
        let (_concrete, actor) = slider();
        let mut undo = UndoController::new_with_capacity(3);
        for i in 0..5 {
            undo.set_operation_event(move_event(&actor, i as f64, i as f64 + 1.0));
        }
        assert_eq!(undo.len(), 3);

        let mut count = 0;
        while undo.can_undo() {
            undo.undo();
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn group_is_undone_in_reverse_order() {
        let (concrete, actor) = slider();
        let mut undo = UndoController::new_with_capacity(10);
        undo.set_operation_group(vec![
            move_event(&actor, 0.0, 1.0),
            move_event(&actor, 1.0, 2.0),
        ]);
        concrete.borrow_mut().value = DVec3::splat(2.0);
        assert_eq!(undo.len(), 1);

        undo.undo();
        assert_eq!(concrete.borrow().value, DVec3::ZERO);
    }

    #[test]
    fn get_last_of_type_skips_other_actors_and_kinds() {
        let (_a, actor_a) = slider();
        let (_b, actor_b) = slider();
        let id_a = actor_a.borrow().actor_id();
        let mut undo = UndoController::new_with_capacity(10);

        undo.set_operation_event(move_event(&actor_a, 0.0, 1.0));
        undo.set_operation_event(OperationEvent::new(
            &actor_a,
            Operation::point(OperationKind::Add, DVec3::splat(9.0), 0),
            Operation::point(OperationKind::Delete, DVec3::splat(9.0), 0),
        ));
        undo.set_operation_event(move_event(&actor_b, 0.0, 7.0));

        let last = undo
            .get_last_of_type(id_a, OperationKind::Move)
            .expect("Move von A vorhanden");
        assert_eq!(last.actor_id(), id_a);
        assert_eq!(last.operation().point_position(), Some(DVec3::splat(1.0)));
        assert!(undo.get_last_of_type(id_a, OperationKind::Rotate).is_none());
    }

    #[test]
    fn undo_of_dropped_actor_reports_failure() {
        let (concrete, actor) = slider();
        let mut undo = UndoController::new_with_capacity(10);
        undo.set_operation_event(move_event(&actor, 0.0, 1.0));
        drop(actor);
        drop(concrete);

        assert!(!undo.undo());
        assert!(!undo.can_undo());
    }
}

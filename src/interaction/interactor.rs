//! Interactor = State-Machine-Instanz + Verhalten + Action-Tabelle.
//!
//! Das Verhalten (`Behavior`) trägt die fachlichen Daten (z.B. das gebundene
//! PointSet) und registriert seine Handler über `action_table`.

use super::action_table::{ActionTable, TableExecutor};
use super::event::StateEvent;
use super::factory::StateMachineFactory;
use super::state_machine::{Dispatch, StateMachine};
use crate::undo::SharedUndoController;
use anyhow::Result;

/// Fachliches Verhalten eines Interactors.
pub trait Behavior: Sized {
    /// Anzeigename (Logs, Tool-Liste)
    const NAME: &'static str;

    /// Handler-Schichten, speziellste zuerst.
    fn action_table() -> ActionTable<Self>;

    /// Verfeinert die Bewertung der State-Machine (Standard: unverändert).
    fn can_handle_event(&self, _state_event: &StateEvent, machine_score: f32) -> f32 {
        machine_score
    }

    /// Wird beim Deaktivieren aufgerufen, nachdem die Machine zurückgesetzt wurde.
    fn on_deactivated(&mut self) {}
}

/// Schnittstelle, über die der Dispatcher Interactors anspricht.
pub trait EventListener {
    fn name(&self) -> &str;

    /// Bewertung 0..=1, wie gut das Event hierher passt.
    fn can_handle_event(&self, state_event: &StateEvent) -> f32;

    fn handle_event(&mut self, state_event: &StateEvent) -> Dispatch;

    fn reset_to_start_state(&mut self);
}

/// Konkrete Interactor-Instanz.
pub struct Interactor<T: Behavior> {
    machine: StateMachine,
    behavior: T,
    actions: ActionTable<T>,
}

impl<T: Behavior> Interactor<T> {
    /// Erstellt den Interactor für einen geladenen State-Machine-Typ.
    pub fn new(
        factory: &StateMachineFactory,
        machine_type: &str,
        undo: SharedUndoController,
        behavior: T,
    ) -> Result<Self> {
        let machine = factory.create_machine(machine_type, undo)?;
        Ok(Self::with_machine(machine, behavior))
    }

    pub fn with_machine(machine: StateMachine, behavior: T) -> Self {
        Self {
            machine,
            behavior,
            actions: T::action_table(),
        }
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine {
        &mut self.machine
    }

    pub fn behavior(&self) -> &T {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut T {
        &mut self.behavior
    }

    pub fn actions(&self) -> &ActionTable<T> {
        &self.actions
    }

    /// Verarbeitet ein Event über die eigene State-Machine.
    pub fn handle_event(&mut self, state_event: &StateEvent) -> Dispatch {
        let mut executor = TableExecutor {
            target: &mut self.behavior,
            table: &self.actions,
        };
        self.machine.handle_event(&mut executor, state_event)
    }

    /// Deaktivierung: Startzustand, angefangene Gesten werden verworfen.
    pub fn deactivate(&mut self) {
        self.machine.reset_to_start_state();
        self.behavior.on_deactivated();
    }
}

impl<T: Behavior> EventListener for Interactor<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn can_handle_event(&self, state_event: &StateEvent) -> f32 {
        let score = self.machine.can_handle_event(state_event);
        self.behavior
            .can_handle_event(state_event, score)
            .clamp(0.0, 1.0)
    }

    fn handle_event(&mut self, state_event: &StateEvent) -> Dispatch {
        Interactor::handle_event(self, state_event)
    }

    /// Wie ein frisch erzeugter Interactor: Startzustand ohne Gestenreste.
    fn reset_to_start_state(&mut self) {
        self.deactivate();
    }
}

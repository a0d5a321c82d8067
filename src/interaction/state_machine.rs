//! Die State-Machine-Engine: aktueller Zustand über einer geteilten Tabelle.
//!
//! `handle_event` sucht die Transition für die Event-ID im aktuellen Zustand,
//! wechselt in den Zielzustand, führt die Actions in Deklarationsreihenfolge
//! aus und speist danach alle Folge-Events rekursiv wieder ein.

use super::action::Action;
use super::event::{EventId, StateEvent};
use super::state_table::{StateId, StateMachineTable};
use crate::undo::{OperationEvent, SharedUndoController};
use std::sync::Arc;

/// Standard-Grenze für verschachtelte Folge-Events.
pub const DEFAULT_MAX_FOLLOW_UP_DEPTH: usize = 32;

/// Ergebnis eines `handle_event`-Aufrufs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Keine Transition für dieses Event im aktuellen Zustand.
    NotHandled,
    /// Transition ausgeführt. `all_actions_ok` ist `false`, sobald eine Action
    /// (auch in einem Folge-Event) fehlgeschlagen ist.
    Handled { all_actions_ok: bool },
}

impl Dispatch {
    pub fn is_handled(self) -> bool {
        matches!(self, Dispatch::Handled { .. })
    }

    /// Transition gefunden und alle Actions erfolgreich.
    pub fn is_ok(self) -> bool {
        matches!(
            self,
            Dispatch::Handled {
                all_actions_ok: true
            }
        )
    }
}

/// Kontext, den ein Action-Handler während der Ausführung sieht.
pub struct ActionContext<'a> {
    machine_type: &'a str,
    undo: &'a SharedUndoController,
    undo_enabled: bool,
    follow_ups: Vec<EventId>,
}

impl<'a> ActionContext<'a> {
    pub fn new(machine_type: &'a str, undo: &'a SharedUndoController, undo_enabled: bool) -> Self {
        Self {
            machine_type,
            undo,
            undo_enabled,
            follow_ups: Vec::new(),
        }
    }

    /// Typname der ausführenden State-Machine (für Logs).
    pub fn machine_type(&self) -> &str {
        self.machine_type
    }

    pub fn undo_enabled(&self) -> bool {
        self.undo_enabled
    }

    /// Legt ein `OperationEvent` auf den Undo-Stack, falls Undo aktiv ist.
    pub fn push_undo(&mut self, event: OperationEvent) {
        if !self.undo_enabled {
            return;
        }
        match self.undo.try_borrow_mut() {
            Ok(mut undo) => undo.set_operation_event(event),
            Err(_) => log::error!(
                "{}: Undo-Controller belegt, Eintrag '{}' verworfen",
                self.machine_type,
                event.description
            ),
        }
    }

    /// Legt mehrere Events als einen Undo-Schritt ab, falls Undo aktiv ist.
    pub fn push_undo_group(&mut self, events: Vec<OperationEvent>) {
        if !self.undo_enabled {
            return;
        }
        match self.undo.try_borrow_mut() {
            Ok(mut undo) => undo.set_operation_group(events),
            Err(_) => log::error!("{}: Undo-Controller belegt, Gruppe verworfen", self.machine_type),
        }
    }

    /// Lesezugriff auf den Undo-Controller (z.B. für `get_last_of_type`).
    pub fn undo_controller(&self) -> &SharedUndoController {
        self.undo
    }

    /// Fordert ein Folge-Event an, das nach der Action-Liste eingespeist wird
    /// (z.B. `YES`/`NO` nach einer Prüfung).
    pub fn post_follow_up(&mut self, id: EventId) {
        self.follow_ups.push(id);
    }

    fn take_follow_ups(&mut self) -> Vec<EventId> {
        std::mem::take(&mut self.follow_ups)
    }
}

/// Führt die Actions einer Transition aus.
///
/// Gibt `true` bei Erfolg zurück. Unbekannte Actions und unpassende Events
/// liefern `false`, nie einen Panic.
pub trait ActionExecutor {
    fn execute_action(
        &mut self,
        action: &Action,
        state_event: &StateEvent,
        ctx: &mut ActionContext<'_>,
    ) -> bool;
}

/// Instanz einer State-Machine: eigener Cursor über eine geteilte Tabelle.
#[derive(Debug, Clone)]
pub struct StateMachine {
    table: Arc<StateMachineTable>,
    current: StateId,
    undo_enabled: bool,
    undo: SharedUndoController,
    max_follow_up_depth: usize,
}

impl StateMachine {
    /// Erstellt eine Instanz im Startzustand der Tabelle.
    pub fn new(table: Arc<StateMachineTable>, undo: SharedUndoController) -> Self {
        let current = table.start_state();
        Self {
            table,
            current,
            undo_enabled: true,
            undo,
            max_follow_up_depth: DEFAULT_MAX_FOLLOW_UP_DEPTH,
        }
    }

    /// Typname der Tabelle.
    pub fn machine_type(&self) -> &str {
        self.table.name()
    }

    pub fn table(&self) -> &Arc<StateMachineTable> {
        &self.table
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_state_name(&self) -> &str {
        &self.table.state(self.current).name
    }

    pub fn undo_enabled(&self) -> bool {
        self.undo_enabled
    }

    pub fn set_undo_enabled(&mut self, enabled: bool) {
        self.undo_enabled = enabled;
    }

    pub fn undo_controller(&self) -> &SharedUndoController {
        &self.undo
    }

    pub fn set_max_follow_up_depth(&mut self, depth: usize) {
        self.max_follow_up_depth = depth;
    }

    /// Setzt unbedingt auf den Startzustand zurück ("forget the past").
    ///
    /// Bereits ausgeführte Operationen bleiben bestehen.
    pub fn reset_to_start_state(&mut self) {
        self.current = self.table.start_state();
    }

    /// Bewertung, wie gut diese Instanz das Event behandeln kann:
    /// 0.5 wenn der aktuelle Zustand eine Transition dafür hat, sonst 0.
    pub fn can_handle_event(&self, state_event: &StateEvent) -> f32 {
        if self.table.transition(self.current, state_event.id).is_some() {
            0.5
        } else {
            0.0
        }
    }

    /// Verarbeitet ein Event.
    pub fn handle_event(
        &mut self,
        executor: &mut dyn ActionExecutor,
        state_event: &StateEvent,
    ) -> Dispatch {
        self.handle_event_at_depth(executor, state_event, 0)
    }

    fn handle_event_at_depth(
        &mut self,
        executor: &mut dyn ActionExecutor,
        state_event: &StateEvent,
        depth: usize,
    ) -> Dispatch {
        // Arc-Klon, damit die Transition nicht an `self` hängt
        let table = Arc::clone(&self.table);
        let Some(transition) = table.transition(self.current, state_event.id) else {
            log::trace!(
                "{}: keine Transition für {} in Zustand '{}'",
                table.name(),
                state_event.id,
                self.current_state_name()
            );
            return Dispatch::NotHandled;
        };

        log::debug!(
            "{}: '{}' --{}--> '{}'",
            table.name(),
            table.state(self.current).name,
            state_event.id,
            table.state(transition.target).name
        );
        self.current = transition.target;

        let mut all_ok = true;
        let mut follow_ups = Vec::new();
        {
            let mut ctx = ActionContext::new(table.name(), &self.undo, self.undo_enabled);
            for action in &transition.actions {
                if !executor.execute_action(action, state_event, &mut ctx) {
                    // Fehlschlag wird vermerkt, die übrigen Actions laufen weiter
                    log::debug!("{}: Action {} fehlgeschlagen", table.name(), action.id);
                    all_ok = false;
                }
            }
            for action in &transition.actions {
                follow_ups.extend(action.follow_ups.iter().copied());
            }
            follow_ups.extend(ctx.take_follow_ups());
        }

        for id in follow_ups {
            if depth + 1 > self.max_follow_up_depth {
                log::error!(
                    "{}: Folge-Event {} verworfen, maximale Tiefe {} erreicht",
                    table.name(),
                    id,
                    self.max_follow_up_depth
                );
                all_ok = false;
                break;
            }
            let follow_up = state_event.follow_up(id);
            match self.handle_event_at_depth(executor, &follow_up, depth + 1) {
                Dispatch::Handled { all_actions_ok } => all_ok &= all_actions_ok,
                Dispatch::NotHandled => log::debug!(
                    "{}: Folge-Event {} ohne Transition in '{}'",
                    table.name(),
                    id,
                    self.current_state_name()
                ),
            }
        }

        Dispatch::Handled {
            all_actions_ok: all_ok,
        }
    }
}

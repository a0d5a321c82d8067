//! Registrierte Action-Handler mit expliziter Fallback-Kette.
//!
//! Statt einer Klassenhierarchie mit virtuellem `ExecuteAction` registriert
//! jedes Verhalten seine Handler pro Action-ID in einer Schicht. Die Suche läuft
//! von der speziellsten zur allgemeinsten Schicht; die Basisschicht kommt zuletzt.

use super::action::{Action, ActionId};
use super::event::StateEvent;
use super::state_machine::{ActionContext, ActionExecutor};
use std::collections::HashMap;

/// Handler-Signatur für ein Verhalten `T`.
pub type ActionHandler<T> = fn(&mut T, &Action, &StateEvent, &mut ActionContext<'_>) -> bool;

/// Eine benannte Schicht von Handlern (entspricht einer Ebene der alten Hierarchie).
pub struct ActionLayer<T> {
    name: &'static str,
    handlers: HashMap<ActionId, ActionHandler<T>>,
}

impl<T> ActionLayer<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Fallback-Kette aus Schichten.
pub struct ActionTable<T> {
    layers: Vec<ActionLayer<T>>,
}

impl<T> Default for ActionTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ActionTable<T> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Hängt eine Schicht hinten an (wird nach allen bisherigen durchsucht).
    pub fn layer(mut self, name: &'static str, entries: &[(ActionId, ActionHandler<T>)]) -> Self {
        let handlers = entries.iter().copied().collect();
        self.layers.push(ActionLayer { name, handlers });
        self
    }

    /// Hängt die gemeinsame Basisschicht an.
    pub fn with_base_layer(self) -> Self {
        self.layer(
            "StateMachine",
            &[
                (ActionId::DO_NOTHING, do_nothing::<T>),
                (ActionId::MODE_SELECT, do_nothing::<T>),
                (ActionId::MODE_DESELECT, do_nothing::<T>),
            ],
        )
    }

    /// Erster Handler entlang der Fallback-Kette.
    pub fn resolve(&self, id: ActionId) -> Option<(&'static str, ActionHandler<T>)> {
        self.layers
            .iter()
            .find_map(|layer| layer.handlers.get(&id).map(|h| (layer.name, *h)))
    }

    pub fn knows(&self, id: ActionId) -> bool {
        self.resolve(id).is_some()
    }

    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name).collect()
    }

    /// Führt eine Action für `target` aus; unbekannte IDs liefern `false`.
    pub fn execute(
        &self,
        target: &mut T,
        action: &Action,
        state_event: &StateEvent,
        ctx: &mut ActionContext<'_>,
    ) -> bool {
        match self.resolve(action.id) {
            Some((layer, handler)) => {
                log::trace!("{}: {} via Schicht '{}'", ctx.machine_type(), action.id, layer);
                handler(target, action, state_event, ctx)
            }
            None => {
                log::debug!(
                    "{}: Action {} von keiner Schicht erkannt",
                    ctx.machine_type(),
                    action.id
                );
                false
            }
        }
    }
}

/// Bindet ein Ziel an seine Tabelle, damit die Engine es als Executor nutzen kann.
pub struct TableExecutor<'a, T> {
    pub target: &'a mut T,
    pub table: &'a ActionTable<T>,
}

impl<T> ActionExecutor for TableExecutor<'_, T> {
    fn execute_action(
        &mut self,
        action: &Action,
        state_event: &StateEvent,
        ctx: &mut ActionContext<'_>,
    ) -> bool {
        self.table.execute(self.target, action, state_event, ctx)
    }
}

fn do_nothing<T>(_: &mut T, _: &Action, _: &StateEvent, _: &mut ActionContext<'_>) -> bool {
    true
}

//! Zustände, Transitionen und die geteilte Transitionstabelle eines State-Machine-Typs.
//!
//! Eine `StateMachineTable` wird einmal beim Laden der Konfiguration gebaut und
//! danach nur noch gelesen. Alle Instanzen desselben Typs teilen sie sich.

use super::action::{Action, ActionId};
use super::event::EventId;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fmt;

/// Index eines Zustands in seiner Tabelle (Lookup-Schlüssel, kein Besitz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// Transition: Zielzustand plus geordnete Action-Liste.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub name: String,
    pub target: StateId,
    pub actions: Vec<Action>,
}

/// Benannter Zustand mit eindeutigen Event-Schlüsseln.
#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    pub name: String,
    transitions: HashMap<EventId, Transition>,
}

impl State {
    /// Transition für eine Event-ID (exakter Vergleich, keine Wildcards).
    pub fn transition(&self, event: EventId) -> Option<&Transition> {
        self.transitions.get(&event)
    }

    /// Alle Event-IDs, auf die dieser Zustand reagiert (sortiert).
    pub fn handled_events(&self) -> Vec<EventId> {
        let mut ids: Vec<EventId> = self.transitions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

/// Unveränderliche Transitionstabelle eines State-Machine-Typs.
#[derive(Debug, Clone)]
pub struct StateMachineTable {
    name: String,
    states: Vec<State>,
    start: StateId,
}

impl StateMachineTable {
    /// Typname (z.B. `"pointsetinteractor"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// Zustand per ID. IDs stammen immer aus dieser Tabelle.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Lookup (Zustand, Event) → Transition.
    pub fn transition(&self, state: StateId, event: EventId) -> Option<&Transition> {
        self.states.get(state.0)?.transition(event)
    }
}

impl fmt::Display for StateMachineTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StateMachine '{}' ({} Zustände, Start '{}')",
            self.name,
            self.states.len(),
            self.states[self.start.0].name
        )
    }
}

// ── Builder ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct TransitionDraft {
    name: String,
    event: EventId,
    target: String,
    actions: Vec<Action>,
}

#[derive(Debug, Clone)]
struct StateDraft {
    name: String,
    start: bool,
    transitions: Vec<TransitionDraft>,
}

/// Sammelt Zustände und Transitionen und validiert sie beim `build`.
///
/// Alle Konfigurationsfehler (unbekannter Zielzustand, unbekannte Action,
/// doppelte Schlüssel, fehlender Startzustand) werden hier gemeldet, nie
/// erst beim Dispatch.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    states: Vec<StateDraft>,
    undeclared_sources: Vec<String>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            undeclared_sources: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fügt einen Zustand hinzu.
    pub fn state(mut self, name: impl Into<String>, start: bool) -> Self {
        self.add_state(name, start);
        self
    }

    /// Fügt eine Transition am zuletzt genannten Zustand `from` hinzu.
    pub fn transition(
        mut self,
        from: &str,
        event: EventId,
        target: impl Into<String>,
        actions: Vec<Action>,
    ) -> Self {
        let name = format!("{}->{}", from, event);
        self.add_transition(from, name, event, target, actions);
        self
    }

    pub(crate) fn add_state(&mut self, name: impl Into<String>, start: bool) {
        self.states.push(StateDraft {
            name: name.into(),
            start,
            transitions: Vec::new(),
        });
    }

    /// Fügt eine Transition hinzu; ein unbekannter Quellzustand wird beim `build` gemeldet.
    pub(crate) fn add_transition(
        &mut self,
        from: &str,
        name: String,
        event: EventId,
        target: impl Into<String>,
        actions: Vec<Action>,
    ) {
        let draft = TransitionDraft {
            name,
            event,
            target: target.into(),
            actions,
        };
        match self.states.iter_mut().rev().find(|s| s.name == from) {
            Some(state) => state.transitions.push(draft),
            None => self.undeclared_sources.push(from.to_string()),
        }
    }

    /// Validiert und erzeugt die Tabelle.
    ///
    /// `is_known_action` entscheidet, ob eine Action-ID registriert ist.
    pub fn build(self, is_known_action: impl Fn(ActionId) -> bool) -> Result<StateMachineTable> {
        let machine = self.name;
        if machine.trim().is_empty() {
            bail!("State-Machine ohne Namen");
        }
        if let Some(source) = self.undeclared_sources.first() {
            bail!(
                "State-Machine '{}': Transition aus nicht deklariertem Zustand '{}'",
                machine,
                source
            );
        }
        if self.states.is_empty() {
            bail!("State-Machine '{}' hat keine Zustände", machine);
        }

        let mut index: HashMap<&str, StateId> = HashMap::new();
        for (i, draft) in self.states.iter().enumerate() {
            if index.insert(draft.name.as_str(), StateId(i)).is_some() {
                bail!(
                    "State-Machine '{}': Zustand '{}' doppelt definiert",
                    machine,
                    draft.name
                );
            }
        }

        let starts: Vec<&StateDraft> = self.states.iter().filter(|s| s.start).collect();
        let start = match starts.as_slice() {
            [only] => index[only.name.as_str()],
            [] => bail!("State-Machine '{}' hat keinen Startzustand", machine),
            _ => bail!(
                "State-Machine '{}' hat {} Startzustände",
                machine,
                starts.len()
            ),
        };

        let mut states = Vec::with_capacity(self.states.len());
        for (i, draft) in self.states.iter().enumerate() {
            let mut transitions = HashMap::with_capacity(draft.transitions.len());
            for t in &draft.transitions {
                let Some(&target) = index.get(t.target.as_str()) else {
                    bail!(
                        "State-Machine '{}', Zustand '{}': Zielzustand '{}' existiert nicht",
                        machine,
                        draft.name,
                        t.target
                    );
                };
                if let Some(unknown) = t.actions.iter().find(|a| !is_known_action(a.id)) {
                    bail!(
                        "State-Machine '{}', Zustand '{}': unbekannte Action {}",
                        machine,
                        draft.name,
                        unknown.id
                    );
                }
                let transition = Transition {
                    name: t.name.clone(),
                    target,
                    actions: t.actions.clone(),
                };
                if transitions.insert(t.event, transition).is_some() {
                    bail!(
                        "State-Machine '{}', Zustand '{}': Event {} mehrfach belegt",
                        machine,
                        draft.name,
                        t.event
                    );
                }
            }
            states.push(State {
                id: StateId(i),
                name: draft.name.clone(),
                transitions,
            });
        }

        Ok(StateMachineTable {
            name: machine,
            states,
            start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_action(_: ActionId) -> bool {
        true
    }

    fn two_state_builder() -> TableBuilder {
        TableBuilder::new("demo")
            .state("idle", true)
            .transition(
                "idle",
                EventId::LEFT_MOUSE_PRESS,
                "busy",
                vec![Action::new(ActionId::ADD_POINT)],
            )
            .state("busy", false)
            .transition("busy", EventId::ESCAPE_KEY, "idle", vec![])
    }

    #[test]
    fn builds_lookup_table() {
        let table = two_state_builder().build(any_action).expect("gültige Tabelle");
        let idle = table.start_state();
        assert_eq!(table.state(idle).name, "idle");

        let t = table
            .transition(idle, EventId::LEFT_MOUSE_PRESS)
            .expect("Transition vorhanden");
        assert_eq!(table.state(t.target).name, "busy");
        assert_eq!(t.actions.len(), 1);
        assert!(table.transition(idle, EventId::ESCAPE_KEY).is_none());
    }

    #[test]
    fn rejects_unknown_target_state() {
        let err = TableBuilder::new("broken")
            .state("a", true)
            .transition("a", EventId::YES, "nowhere", vec![])
            .build(any_action)
            .unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn rejects_unknown_action() {
        let err = two_state_builder()
            .build(|id| id != ActionId::ADD_POINT)
            .unwrap_err();
        assert!(err.to_string().contains("AcADDPOINT"));
    }

    #[test]
    fn rejects_duplicate_event_key() {
        let err = TableBuilder::new("dup")
            .state("a", true)
            .transition("a", EventId::YES, "a", vec![])
            .transition("a", EventId::YES, "a", vec![])
            .build(any_action)
            .unwrap_err();
        assert!(err.to_string().contains("mehrfach"));
    }

    #[test]
    fn requires_exactly_one_start_state() {
        let none = TableBuilder::new("x").state("a", false).build(any_action);
        assert!(none.is_err());
        let two = TableBuilder::new("x")
            .state("a", true)
            .state("b", true)
            .build(any_action);
        assert!(two.is_err());
    }

    #[test]
    fn rejects_transition_from_undeclared_state() {
        let err = TableBuilder::new("x")
            .state("a", true)
            .transition("ghost", EventId::YES, "a", vec![])
            .build(any_action)
            .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}

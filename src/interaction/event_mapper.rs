//! Konfigurationsgesteuerte Abbildung roher Events auf abstrakte Event-IDs.

use super::event::{Event, EventId, EventType, Key, Modifiers, MouseButton, StateEvent};
use anyhow::{bail, Result};
use indexmap::IndexMap;

/// Eine Zeile aus dem `<events>`-Block der Konfiguration.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescription {
    pub name: String,
    pub id: EventId,
    pub event_type: EventType,
    pub button: MouseButton,
    pub key: Option<Key>,
    pub modifiers: Modifiers,
}

impl EventDescription {
    /// Prüft Typ, Taste, Key und Modifier auf exakte Gleichheit.
    pub fn matches(&self, event: &Event) -> bool {
        if self.event_type != event.event_type() || self.modifiers != event.modifiers() {
            return false;
        }
        match self.event_type {
            EventType::KeyPress => self.key == event.key(),
            _ => self.button == event.button(),
        }
    }
}

/// Ordnet rohe Events den Event-IDs der State-Machines zu.
///
/// Die Reihenfolge der Deklaration entscheidet bei mehreren passenden Einträgen.
#[derive(Debug, Clone, Default)]
pub struct EventMapper {
    descriptions: IndexMap<String, EventDescription>,
}

impl EventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard-Mapping für Maus und die wichtigsten Tasten.
    pub fn with_defaults() -> Self {
        let mut mapper = Self::new();
        #[rustfmt::skip]
        let defaults = [
            ("leftMousePress", EventId::LEFT_MOUSE_PRESS, EventType::MousePress, MouseButton::Left, None, Modifiers::NONE),
            ("leftMousePressShift", EventId::LEFT_MOUSE_PRESS_SHIFT, EventType::MousePress, MouseButton::Left, None, Modifiers::SHIFT),
            ("leftMousePressCtrl", EventId::LEFT_MOUSE_PRESS_CTRL, EventType::MousePress, MouseButton::Left, None, Modifiers::CTRL),
            ("rightMousePress", EventId::RIGHT_MOUSE_PRESS, EventType::MousePress, MouseButton::Right, None, Modifiers::NONE),
            ("middleMousePress", EventId::MIDDLE_MOUSE_PRESS, EventType::MousePress, MouseButton::Middle, None, Modifiers::NONE),
            ("leftMouseRelease", EventId::LEFT_MOUSE_RELEASE, EventType::MouseRelease, MouseButton::Left, None, Modifiers::NONE),
            ("leftMouseDrag", EventId::LEFT_MOUSE_DRAG, EventType::MouseMove, MouseButton::Left, None, Modifiers::NONE),
            ("mouseMove", EventId::MOUSE_MOVE, EventType::MouseMove, MouseButton::NoButton, None, Modifiers::NONE),
            ("deleteKey", EventId::DELETE_KEY, EventType::KeyPress, MouseButton::NoButton, Some(Key::Delete), Modifiers::NONE),
            ("escapeKey", EventId::ESCAPE_KEY, EventType::KeyPress, MouseButton::NoButton, Some(Key::Escape), Modifiers::NONE),
        ];
        for (name, id, event_type, button, key, modifiers) in defaults {
            mapper.descriptions.insert(
                name.to_string(),
                EventDescription {
                    name: name.to_string(),
                    id,
                    event_type,
                    button,
                    key,
                    modifiers,
                },
            );
        }
        mapper
    }

    /// Registriert eine Event-Beschreibung. Doppelte Namen sind ein Konfigurationsfehler.
    pub fn insert(&mut self, description: EventDescription) -> Result<()> {
        if self.descriptions.contains_key(&description.name) {
            bail!("Event '{}' doppelt definiert", description.name);
        }
        self.descriptions
            .insert(description.name.clone(), description);
        Ok(())
    }

    /// Löst einen Event-Namen auf: erst konfigurierte, dann eingebaute Namen.
    pub fn id_for_name(&self, name: &str) -> Option<EventId> {
        self.descriptions
            .get(name)
            .map(|d| d.id)
            .or_else(|| EventId::builtin(name))
    }

    /// Bildet ein rohes Event auf ein `StateEvent` ab; `None` wenn nichts passt.
    pub fn map(&self, event: &Event) -> Option<StateEvent> {
        self.descriptions
            .values()
            .find(|d| d.matches(event))
            .map(|d| StateEvent::new(d.id, *event))
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &EventDescription> {
        self.descriptions.values()
    }
}

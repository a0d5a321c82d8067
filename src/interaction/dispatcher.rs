//! Globaler Dispatcher: mappt Roh-Events und verteilt sie an Listener.

use super::event::{Event, StateEvent};
use super::event_mapper::EventMapper;
use super::interactor::EventListener;
use super::state_machine::Dispatch;
use std::cell::RefCell;
use std::rc::Rc;

/// Geteilter Listener, wie ihn Tools und Interactors registrieren.
pub type SharedListener = Rc<RefCell<dyn EventListener>>;

/// Ergebnis einer Verteilung.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Das Event hatte keine Zuordnung im Event-Mapping.
    Unmapped,
    /// Kein Listener hat das Event verarbeitet.
    Ignored(StateEvent),
    /// Verarbeitet vom Listener mit diesem Namen.
    Handled {
        state_event: StateEvent,
        listener: String,
        dispatch: Dispatch,
    },
}

impl Delivery {
    pub fn is_handled(&self) -> bool {
        matches!(self, Delivery::Handled { .. })
    }
}

/// Verteilt Events an registrierte Listener in absteigender Bewertung.
pub struct GlobalInteraction {
    mapper: EventMapper,
    listeners: Vec<SharedListener>,
}

impl GlobalInteraction {
    pub fn new(mapper: EventMapper) -> Self {
        Self {
            mapper,
            listeners: Vec::new(),
        }
    }

    pub fn mapper(&self) -> &EventMapper {
        &self.mapper
    }

    /// Registriert einen Listener. Doppelte Registrierung wird ignoriert.
    pub fn add_listener(&mut self, listener: SharedListener) -> bool {
        if self.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            log::debug!("Listener bereits registriert");
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn remove_listener(&mut self, listener: &SharedListener) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
        before != self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Setzt alle Listener auf ihren Startzustand zurück.
    pub fn reset_all(&self) {
        for listener in &self.listeners {
            if let Ok(mut listener) = listener.try_borrow_mut() {
                listener.reset_to_start_state();
            }
        }
    }

    /// Mappt ein Roh-Event und verteilt es.
    pub fn dispatch(&self, event: &Event) -> Delivery {
        match self.mapper.map(event) {
            Some(state_event) => self.dispatch_state_event(state_event),
            None => {
                log::trace!("Event {:?} ohne Zuordnung", event.event_type());
                Delivery::Unmapped
            }
        }
    }

    /// Verteilt ein bereits gemapptes Event.
    pub fn dispatch_state_event(&self, state_event: StateEvent) -> Delivery {
        let mut candidates: Vec<(f32, &SharedListener)> = self
            .listeners
            .iter()
            .filter_map(|listener| {
                let score = listener.try_borrow().ok()?.can_handle_event(&state_event);
                (score > 0.0).then_some((score, listener))
            })
            .collect();
        // stabil: Registrierungsreihenfolge bei Gleichstand
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (score, listener) in candidates {
            let Ok(mut listener) = listener.try_borrow_mut() else {
                log::warn!("Listener während der Verteilung belegt, übersprungen");
                continue;
            };
            let dispatch = listener.handle_event(&state_event);
            if dispatch.is_handled() {
                log::debug!(
                    "{} verarbeitet von '{}' (Bewertung {:.2})",
                    state_event.id,
                    listener.name(),
                    score
                );
                return Delivery::Handled {
                    listener: listener.name().to_string(),
                    state_event,
                    dispatch,
                };
            }
        }
        Delivery::Ignored(state_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::event::EventId;
    use glam::DVec3;

    struct Fixed {
        name: &'static str,
        score: f32,
        handles: bool,
        calls: usize,
    }

    impl EventListener for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn can_handle_event(&self, _: &StateEvent) -> f32 {
            self.score
        }
        fn handle_event(&mut self, _: &StateEvent) -> Dispatch {
            self.calls += 1;
            if self.handles {
                Dispatch::Handled {
                    all_actions_ok: true,
                }
            } else {
                Dispatch::NotHandled
            }
        }
        fn reset_to_start_state(&mut self) {}
    }

    fn listener(name: &'static str, score: f32, handles: bool) -> Rc<RefCell<Fixed>> {
        Rc::new(RefCell::new(Fixed {
            name,
            score,
            handles,
            calls: 0,
        }))
    }

    #[test]
    fn highest_score_wins_and_ties_keep_registration_order() {
        let mut global = GlobalInteraction::new(EventMapper::with_defaults());
        let low = listener("low", 0.2, true);
        let first = listener("first", 0.5, true);
        let second = listener("second", 0.5, true);
        global.add_listener(low.clone());
        global.add_listener(first.clone());
        global.add_listener(second.clone());

        let delivery = global.dispatch(&Event::left_press(DVec3::ZERO));

        match delivery {
            Delivery::Handled {
                listener,
                state_event,
                ..
            } => {
                assert_eq!(listener, "first");
                assert_eq!(state_event.id, EventId::LEFT_MOUSE_PRESS);
            }
            other => panic!("unerwartet: {other:?}"),
        }
        assert_eq!(low.borrow().calls, 0);
        assert_eq!(second.borrow().calls, 0);
    }

    #[test]
    fn falls_through_to_next_candidate() {
        let mut global = GlobalInteraction::new(EventMapper::with_defaults());
        let refuses = listener("refuses", 1.0, false);
        let accepts = listener("accepts", 0.5, true);
        let silent = listener("silent", 0.0, true);
        global.add_listener(refuses.clone());
        global.add_listener(accepts.clone());
        global.add_listener(silent.clone());

        let delivery = global.dispatch(&Event::left_press(DVec3::ZERO));

        assert!(delivery.is_handled());
        assert_eq!(refuses.borrow().calls, 1);
        assert_eq!(accepts.borrow().calls, 1);
        assert_eq!(silent.borrow().calls, 0);
    }

    #[test]
    fn duplicate_listeners_are_ignored() {
        let mut global = GlobalInteraction::new(EventMapper::new());
        let l = listener("l", 1.0, true);
        let shared: SharedListener = l.clone();
        assert!(global.add_listener(shared.clone()));
        assert!(!global.add_listener(shared.clone()));
        assert_eq!(global.listener_count(), 1);
        assert_eq!(
            global.dispatch(&Event::left_press(DVec3::ZERO)),
            Delivery::Unmapped
        );
        assert!(global.remove_listener(&shared));
        assert_eq!(global.listener_count(), 0);
    }
}

//! Tool-System: austauschbare Interactors, von denen genau einer aktiv ist.
//!
//! Jeder Interactor ist automatisch ein `Tool`. Der `ToolManager` hält die
//! registrierten Tools, leitet Events an das aktive weiter und ist selbst ein
//! `EventListener`, damit er als ein Eintrag im globalen Dispatcher hängt.

use crate::interaction::{Behavior, Dispatch, EventListener, Interactor, StateEvent};

/// Schnittstelle für alle Tools.
pub trait Tool: EventListener {
    /// Icon-Zeichen für Tool-Listen
    fn icon(&self) -> &str {
        ""
    }

    /// Wird beim Aktivieren aufgerufen.
    fn activate(&mut self) {}

    /// Deaktivierung setzt auf den Startzustand zurück.
    /// Bereits ausgeführte Operationen bleiben bestehen.
    fn deactivate(&mut self);
}

impl<T: Behavior> Tool for Interactor<T> {
    fn deactivate(&mut self) {
        Interactor::deactivate(self);
    }
}

// ── ToolManager ──────────────────────────────────────────────────

/// Verwaltet registrierte Tools und den aktiven Tool-Index.
#[derive(Default)]
pub struct ToolManager {
    tools: Vec<Box<dyn Tool>>,
    active_index: Option<usize>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registriert ein Tool und gibt seinen Index zurück.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> usize {
        log::debug!("Tool '{}' registriert", tool.name());
        self.tools.push(tool);
        self.tools.len() - 1
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Name und Index aller registrierten Tools.
    pub fn tool_names(&self) -> Vec<(usize, &str)> {
        self.tools
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.name()))
            .collect()
    }

    /// Setzt das aktive Tool per Index. Das bisher aktive wird deaktiviert.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.tools.len() {
            log::warn!("Tool-Index {} existiert nicht", index);
            return false;
        }
        if let Some(old) = self.active_index {
            if old == index {
                return true;
            }
            self.tools[old].deactivate();
        }
        self.tools[index].activate();
        self.active_index = Some(index);
        log::info!("Tool '{}' aktiv", self.tools[index].name());
        true
    }

    /// Aktiviert das erste Tool mit diesem Namen.
    pub fn set_active_by_name(&mut self, name: &str) -> bool {
        match self.tools.iter().position(|t| t.name() == name) {
            Some(index) => self.set_active(index),
            None => false,
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn active_tool(&self) -> Option<&dyn Tool> {
        self.active_index.map(|i| self.tools[i].as_ref())
    }

    pub fn active_tool_mut(&mut self) -> Option<&mut (dyn Tool + 'static)> {
        let i = self.active_index?;
        Some(self.tools[i].as_mut())
    }

    /// Deaktiviert das aktive Tool, ohne ein neues zu wählen.
    pub fn reset(&mut self) {
        if let Some(i) = self.active_index.take() {
            self.tools[i].deactivate();
        }
    }
}

impl EventListener for ToolManager {
    fn name(&self) -> &str {
        self.active_tool().map_or("ToolManager", |t| t.name())
    }

    fn can_handle_event(&self, state_event: &StateEvent) -> f32 {
        self.active_tool()
            .map_or(0.0, |t| t.can_handle_event(state_event))
    }

    fn handle_event(&mut self, state_event: &StateEvent) -> Dispatch {
        match self.active_tool_mut() {
            Some(tool) => tool.handle_event(state_event),
            None => Dispatch::NotHandled,
        }
    }

    fn reset_to_start_state(&mut self) {
        if let Some(tool) = self.active_tool_mut() {
            tool.reset_to_start_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PointSet;
    use crate::interaction::{Action, ActionId, Event, EventId, StateMachine, TableBuilder};
    use crate::interactors::PointSetInteraction;
    use crate::undo::UndoController;
    use glam::DVec3;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn point_tool(points: &Rc<RefCell<PointSet>>) -> Box<dyn Tool> {
        let table = TableBuilder::new("pointsetinteractor")
            .state("neutral", true)
            .transition(
                "neutral",
                EventId::LEFT_MOUSE_PRESS_SHIFT,
                "adding",
                vec![Action::new(ActionId::ADD_POINT)],
            )
            .state("adding", false)
            .transition("adding", EventId::LEFT_MOUSE_RELEASE, "neutral", vec![])
            .build(ActionId::is_builtin)
            .expect("gültig");
        Box::new(Interactor::with_machine(
            StateMachine::new(Arc::new(table), UndoController::shared(10)),
            PointSetInteraction::new(points),
        ))
    }

    #[test]
    fn test_switching_tool_resets_machine_but_keeps_points() {
        let points = Rc::new(RefCell::new(PointSet::new()));
        let mut manager = ToolManager::new();
        let first = manager.register(point_tool(&points));
        let second = manager.register(point_tool(&points));
        assert!(manager.set_active(first));

        let press = StateEvent::new(EventId::LEFT_MOUSE_PRESS_SHIFT, Event::left_press(DVec3::X));
        assert!(manager.handle_event(&press).is_handled());
        assert_eq!(points.borrow().len(), 1);

        assert!(manager.set_active(second));
        assert!(manager.set_active(first));
        // wieder im Startzustand: derselbe Press legt einen zweiten Punkt an
        assert!(manager.handle_event(&press).is_handled());
        assert_eq!(points.borrow().len(), 2);
    }

    #[test]
    fn test_without_active_tool_nothing_is_handled() {
        let points = Rc::new(RefCell::new(PointSet::new()));
        let mut manager = ToolManager::new();
        manager.register(point_tool(&points));

        let press = StateEvent::new(EventId::LEFT_MOUSE_PRESS_SHIFT, Event::left_press(DVec3::X));
        assert_eq!(manager.can_handle_event(&press), 0.0);
        assert_eq!(manager.handle_event(&press), Dispatch::NotHandled);
        assert!(!manager.set_active(7));
        assert!(manager.set_active_by_name("PointSetInteraction"));
        manager.reset();
        assert!(manager.active_tool().is_none());
    }
}

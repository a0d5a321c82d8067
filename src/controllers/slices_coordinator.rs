//! Registry mehrerer Schicht-Navigationen, die gemeinsam bedient werden.
//!
//! Die Registry hält die Controller nur schwach. Zerstörte Controller werden
//! beim nächsten Zugriff stillschweigend entfernt, ohne Hook-Aufruf.

use crate::core::SliceNavigationController;
use crate::undo::ActorId;
use anyhow::{bail, Result};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Erweiterungspunkte beim Hinzufügen und Entfernen eines Controllers.
///
/// Beide Hooks laufen synchron innerhalb von `add_slice_controller` bzw.
/// `remove_slice_controller`.
pub trait SliceCoordination {
    fn on_slice_controller_added(&mut self, _controller: &Rc<RefCell<SliceNavigationController>>) {}

    fn on_slice_controller_removed(&mut self, _controller: ActorId) {}
}

/// Ohne Hooks.
impl SliceCoordination for () {}

/// Geordnete, duplikatfreie Menge von `SliceNavigationController`s.
pub struct SlicesCoordinator {
    controllers: Vec<(ActorId, Weak<RefCell<SliceNavigationController>>)>,
    hooks: Box<dyn SliceCoordination>,
}

impl Default for SlicesCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SlicesCoordinator {
    pub fn new() -> Self {
        Self::with_hooks(Box::new(()))
    }

    pub fn with_hooks(hooks: Box<dyn SliceCoordination>) -> Self {
        Self {
            controllers: Vec::new(),
            hooks,
        }
    }

    /// Fügt einen Controller hinzu.
    ///
    /// Fehler bei nicht rotierbarer Geometrie, doppelter Registrierung oder
    /// wenn der Controller gerade ausgeliehen ist.
    pub fn add_slice_controller(
        &mut self,
        controller: &Rc<RefCell<SliceNavigationController>>,
    ) -> Result<()> {
        let (id, manageable) = match controller.try_borrow() {
            Ok(c) => (c.id(), c.is_manageable()),
            Err(_) => bail!("SliceNavigationController ist belegt"),
        };
        if !manageable {
            bail!("SliceNavigationController {:?} hat keine koordinierbare Geometrie", id);
        }
        self.prune();
        if self.contains(id) {
            bail!("SliceNavigationController {:?} ist bereits registriert", id);
        }
        self.controllers.push((id, Rc::downgrade(controller)));
        log::debug!("SliceNavigationController {:?} registriert", id);
        self.hooks.on_slice_controller_added(controller);
        Ok(())
    }

    /// Entfernt einen Controller; `false` wenn er nicht registriert war.
    pub fn remove_slice_controller(&mut self, id: ActorId) -> bool {
        let Some(pos) = self.controllers.iter().position(|(c, _)| *c == id) else {
            return false;
        };
        self.controllers.remove(pos);
        log::debug!("SliceNavigationController {:?} entfernt", id);
        self.hooks.on_slice_controller_removed(id);
        true
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.controllers.iter().any(|(c, _)| *c == id)
    }

    /// Anzahl lebender Controller.
    pub fn len(&self) -> usize {
        self.controllers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lebende Controller in Registrierungsreihenfolge.
    pub fn controllers(&mut self) -> Vec<Rc<RefCell<SliceNavigationController>>> {
        self.prune();
        self.controllers
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    fn prune(&mut self) {
        self.controllers.retain(|(id, weak)| {
            let alive = weak.strong_count() > 0;
            if !alive {
                log::trace!("SliceNavigationController {:?} nicht mehr vorhanden", id);
            }
            alive
        });
    }
}

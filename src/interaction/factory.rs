//! Registry aller geladenen State-Machine-Typen.
//!
//! Die Factory besitzt die geteilten Tabellen, das Event-Mapping und die
//! Menge der bekannten Actions. Sie wird beim Start einmal befüllt und danach
//! an alle Interactors gereicht.

use super::action::ActionId;
use super::event_mapper::EventMapper;
use super::state_machine::{StateMachine, DEFAULT_MAX_FOLLOW_UP_DEPTH};
use super::state_table::{StateMachineTable, TableBuilder};
use crate::undo::SharedUndoController;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;

/// Geteilte Tabellen, Event-Mapping und bekannte Actions.
#[derive(Debug, Clone)]
pub struct StateMachineFactory {
    tables: IndexMap<String, Arc<StateMachineTable>>,
    known_actions: IndexMap<ActionId, String>,
    event_mapper: EventMapper,
    max_follow_up_depth: usize,
}

impl Default for StateMachineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachineFactory {
    /// Leere Factory mit eingebauten Actions und Standard-Event-Mapping.
    pub fn new() -> Self {
        let known_actions = ActionId::BUILTIN
            .iter()
            .map(|(name, id)| (*id, (*name).to_string()))
            .collect();
        Self {
            tables: IndexMap::new(),
            known_actions,
            event_mapper: EventMapper::with_defaults(),
            max_follow_up_depth: DEFAULT_MAX_FOLLOW_UP_DEPTH,
        }
    }

    /// Lädt eine XML-Konfiguration aus einem String.
    pub fn load_from_str(&mut self, xml: &str) -> Result<()> {
        crate::xml::load_interaction_config(xml, self)
    }

    /// Lädt eine XML-Konfiguration aus einer Datei.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Konfiguration nicht lesbar: {}", path.display()))?;
        self.load_from_str(&content)
            .with_context(|| format!("Konfiguration fehlerhaft: {}", path.display()))?;
        log::info!(
            "Interaktions-Konfiguration geladen aus {} ({} State-Machines)",
            path.display(),
            self.tables.len()
        );
        Ok(())
    }

    /// Registriert eine zusätzliche (anwendungsspezifische) Action.
    pub fn register_action(&mut self, id: ActionId, name: &str) -> Result<()> {
        if let Some(existing) = self.known_actions.get(&id) {
            if existing != name {
                bail!("Action-ID {} bereits als '{}' registriert", id.0, existing);
            }
            return Ok(());
        }
        if self.action_by_name(name).is_some() {
            bail!("Action-Name '{}' bereits vergeben", name);
        }
        self.known_actions.insert(id, name.to_string());
        Ok(())
    }

    pub fn is_known_action(&self, id: ActionId) -> bool {
        self.known_actions.contains_key(&id)
    }

    /// Sucht eine bekannte Action über ihren Namen.
    pub fn action_by_name(&self, name: &str) -> Option<ActionId> {
        self.known_actions
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(id, _)| *id)
    }

    /// Validiert und registriert eine Tabelle. Doppelte Typnamen sind ein Fehler.
    pub fn add_table(&mut self, builder: TableBuilder) -> Result<()> {
        let name = builder.name().to_string();
        if self.tables.contains_key(&name) {
            bail!("State-Machine '{}' doppelt definiert", name);
        }
        let table = builder.build(|id| self.is_known_action(id))?;
        log::debug!("{} registriert", table);
        self.tables.insert(name, Arc::new(table));
        Ok(())
    }

    /// Geteilte Tabelle eines Typs. Unbekannte Typen sind ein Konfigurationsfehler.
    pub fn table(&self, machine_type: &str) -> Result<Arc<StateMachineTable>> {
        match self.tables.get(machine_type) {
            Some(table) => Ok(Arc::clone(table)),
            None => bail!("State-Machine-Typ '{}' nicht geladen", machine_type),
        }
    }

    /// Erstellt eine neue Instanz im Startzustand.
    pub fn create_machine(
        &self,
        machine_type: &str,
        undo: SharedUndoController,
    ) -> Result<StateMachine> {
        let mut machine = StateMachine::new(self.table(machine_type)?, undo);
        machine.set_max_follow_up_depth(self.max_follow_up_depth);
        Ok(machine)
    }

    pub fn machine_types(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn event_mapper(&self) -> &EventMapper {
        &self.event_mapper
    }

    pub fn event_mapper_mut(&mut self) -> &mut EventMapper {
        &mut self.event_mapper
    }

    pub fn set_max_follow_up_depth(&mut self, depth: usize) {
        self.max_follow_up_depth = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::action::Action;
    use crate::interaction::event::EventId;
    use crate::undo::UndoController;

    fn builder(name: &str, action: ActionId) -> TableBuilder {
        TableBuilder::new(name)
            .state("a", true)
            .transition("a", EventId::YES, "a", vec![Action::new(action)])
    }

    #[test]
    fn tables_are_shared_between_instances() {
        let mut factory = StateMachineFactory::new();
        factory
            .add_table(builder("m", ActionId::DO_NOTHING))
            .expect("gültig");
        let undo = UndoController::shared(10);

        let a = factory.create_machine("m", undo.clone()).expect("Typ bekannt");
        let b = factory.create_machine("m", undo).expect("Typ bekannt");
        assert!(Arc::ptr_eq(a.table(), b.table()));
        assert!(factory.create_machine("unknown", UndoController::shared(1)).is_err());
    }

    #[test]
    fn custom_actions_must_be_registered() {
        let mut factory = StateMachineFactory::new();
        let custom = ActionId(5000);
        assert!(factory.add_table(builder("m", custom)).is_err());

        factory.register_action(custom, "AcCUSTOM").expect("frei");
        factory.add_table(builder("m", custom)).expect("jetzt bekannt");
        assert_eq!(factory.action_by_name("accustom"), Some(custom));
        assert!(factory.register_action(custom, "AcOTHER").is_err());
    }

    #[test]
    fn duplicate_machine_names_are_rejected() {
        let mut factory = StateMachineFactory::new();
        factory.add_table(builder("m", ActionId::DO_NOTHING)).expect("gültig");
        assert!(factory.add_table(builder("m", ActionId::DO_NOTHING)).is_err());
    }
}

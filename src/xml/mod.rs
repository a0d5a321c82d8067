//! XML-Import der Interaktions-Konfiguration.
//!
//! Eine Datei enthält optional einen `<events>`-Block (Event-Mapping) und
//! beliebig viele `<stateMachine>`-Tabellen. Der `<events>`-Block muss vor den
//! Tabellen stehen, die seine Namen verwenden.

pub mod parser;

pub use parser::load_interaction_config;

//! Action-IDs und die in einer Transition konfigurierten Actions.

use super::event::EventId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiziert eine Aktion, die ein Interactor bei einer Transition ausführt.
///
/// Die ID selbst ist nicht polymorph; welcher Handler sie interpretiert,
/// entscheidet die `ActionTable` des jeweiligen Interactors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u32);

macro_rules! builtin_actions {
    ($($konst:ident = $value:expr, $name:literal;)*) => {
        impl ActionId {
            $(pub const $konst: Self = Self($value);)*

            /// Alle eingebauten Actions als (Konfigurationsname, ID).
            pub const BUILTIN: &'static [(&'static str, ActionId)] = &[
                $(($name, Self::$konst),)*
            ];
        }
    };
}

builtin_actions! {
    DO_NOTHING = 0, "AcDONOTHING";
    NEW_POINT = 5, "AcNEWPOINT";
    INIT_MOVEMENT = 8, "AcINITMOVEMENT";
    ADD_POINT = 10, "AcADDPOINT";
    MOVE_POINT = 11, "AcMOVEPOINT";
    MOVE = 12, "AcMOVE";
    FINISH_MOVEMENT = 13, "AcFINISHMOVEMENT";
    CHECK_POINT = 20, "AcCHECKPOINT";
    CHECK_ELEMENT = 21, "AcCHECKELEMENT";
    SELECT_POINT = 30, "AcSELECTPOINT";
    DESELECT_POINT = 31, "AcDESELECTPOINT";
    DESELECT_ALL = 32, "AcDESELECTALL";
    REMOVE_POINT = 40, "AcREMOVEPOINT";
    CHECK_HOVERING = 50, "AcCHECKHOVERING";
    SELECT_PICKED_OBJECT = 51, "AcSELECTPICKEDOBJECT";
    DESELECT_OBJECT = 52, "AcDESELECTOBJECT";
    CHECK_OBJECT = 53, "AcCHECKOBJECT";
    TRANSLATE_START = 60, "AcTRANSLATESTART";
    TRANSLATE = 61, "AcTRANSLATE";
    ROTATE_START = 62, "AcROTATESTART";
    ROTATE = 63, "AcROTATE";
    ROTATE_END = 64, "AcROTATEEND";
    SCALE_START = 65, "AcSCALESTART";
    SCALE = 66, "AcSCALE";
    FINISH_TRANSFORM = 67, "AcFINISHTRANSFORM";
    CHECK_GIZMO_HANDLE = 70, "AcCHECKGIZMOHANDLE";
    START_GIZMO_DRAG = 71, "AcSTARTGIZMODRAG";
    GIZMO_DRAG = 72, "AcGIZMODRAG";
    FINISH_GIZMO_DRAG = 73, "AcFINISHGIZMODRAG";
    MODE_SELECT = 90, "AcMODESELECT";
    MODE_DESELECT = 91, "AcMODEDESELECT";
}

impl ActionId {
    /// Sucht eine eingebaute Action über ihren Konfigurationsnamen.
    pub fn builtin(name: &str) -> Option<Self> {
        Self::BUILTIN
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, id)| *id)
    }

    /// Konfigurationsname, falls es eine eingebaute Action ist.
    pub fn builtin_name(self) -> Option<&'static str> {
        Self::BUILTIN
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(name, _)| *name)
    }

    pub fn is_builtin(self) -> bool {
        self.builtin_name().is_some()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin_name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "Ac({})", self.0),
        }
    }
}

/// Typisierter Action-Parameter aus der Konfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// Eine konfigurierte Action innerhalb einer Transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: ActionId,
    /// Parameter in Deklarationsreihenfolge
    pub properties: IndexMap<String, PropertyValue>,
    /// Event-IDs, die nach der Action-Liste als Folge-Events eingespeist werden
    pub follow_ups: Vec<EventId>,
}

impl Action {
    pub fn new(id: ActionId) -> Self {
        Self {
            id,
            properties: IndexMap::new(),
            follow_ups: Vec::new(),
        }
    }

    /// Hängt ein Folge-Event an (Builder-Stil).
    pub fn with_follow_up(mut self, id: EventId) -> Self {
        self.follow_ups.push(id);
        self
    }

    /// Setzt einen Parameter (Builder-Stil).
    pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Float-Parameter; Int-Werte werden akzeptiert.
    pub fn float_property(&self, name: &str) -> Option<f64> {
        match self.properties.get(name)? {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn int_property(&self, name: &str) -> Option<i64> {
        match self.properties.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn bool_property(&self, name: &str) -> Option<bool> {
        match self.properties.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn text_property(&self, name: &str) -> Option<&str> {
        match self.properties.get(name)? {
            PropertyValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

//! Eingabe-Events als getaggte Union und die abstrakten Event-IDs der State-Machines.
//!
//! Ein `Event` beschreibt ein rohes Eingabe-Ereignis (Maus, Tastatur). Die
//! State-Machines sehen es nur zusammen mit einer `EventId` als `StateEvent`.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifiziert den Renderer, aus dem ein Event stammt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RendererId(pub u32);

/// Absender eines Events (Wert-Kopie, keine Ownership am Renderer).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    /// Renderer, in dem das Event ausgelöst wurde
    pub renderer: RendererId,
    /// Zeitpunkt (ms) der aktuell im Renderer angezeigten Welt-Geometrie
    pub time_ms: f64,
}

impl Sender {
    /// Erstellt einen Absender für Zeitpunkt 0.
    pub fn new(renderer: RendererId) -> Self {
        Self {
            renderer,
            time_ms: 0.0,
        }
    }
}

/// Art einer Zeiger-Interaktion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerKind {
    Press,
    Release,
    Move,
}

/// Maustaste eines Zeiger-Events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    NoButton,
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Parsed den Tastennamen aus der XML-Konfiguration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "nobutton" => Some(Self::NoButton),
            "left" => Some(Self::Left),
            "middle" => Some(Self::Middle),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Taste eines Tastatur-Events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Escape,
    Enter,
    Space,
    Left,
    Right,
    Up,
    Down,
}

impl Key {
    /// Parsed den Tastennamen aus der XML-Konfiguration.
    ///
    /// Einzelne Zeichen werden als `Key::Char` (kleingeschrieben) interpretiert.
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Self::Char(c.to_ascii_lowercase()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "delete" | "del" => Some(Self::Delete),
            "backspace" => Some(Self::Backspace),
            "escape" | "esc" => Some(Self::Escape),
            "enter" | "return" => Some(Self::Enter),
            "space" => Some(Self::Space),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Gedrückte Modifier-Tasten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Keine Modifier gedrückt.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };
    /// Nur Shift gedrückt.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
    /// Nur Ctrl gedrückt.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };

    /// Parsed eine Modifier-Liste wie `"Shift+Ctrl"` oder `"shift,alt"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut mods = Self::NONE;
        for part in text.split(['+', ',', '|']) {
            match part.trim().to_ascii_lowercase().as_str() {
                "" | "none" => {}
                "shift" => mods.shift = true,
                "ctrl" | "control" | "strg" => mods.ctrl = true,
                "alt" => mods.alt = true,
                _ => return None,
            }
        }
        Some(mods)
    }
}

/// Typ eines Events, wie er im Event-Mapping der Konfiguration steht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    MousePress,
    MouseRelease,
    MouseMove,
    KeyPress,
}

impl EventType {
    /// Parsed den Typnamen aus der XML-Konfiguration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mousepress" | "mousebuttonpress" => Some(Self::MousePress),
            "mouserelease" | "mousebuttonrelease" => Some(Self::MouseRelease),
            "mousemove" => Some(Self::MouseMove),
            "keypress" => Some(Self::KeyPress),
            _ => None,
        }
    }
}

impl From<PointerKind> for EventType {
    fn from(kind: PointerKind) -> Self {
        match kind {
            PointerKind::Press => Self::MousePress,
            PointerKind::Release => Self::MouseRelease,
            PointerKind::Move => Self::MouseMove,
        }
    }
}

/// Zeiger-Event mit Display- und Weltposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub kind: PointerKind,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub display_position: DVec2,
    pub world_position: DVec3,
    pub sender: Option<Sender>,
}

/// Zeiger-Event nur mit Displayposition (kein Picking in die Welt möglich).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPositionEvent {
    pub kind: PointerKind,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub display_position: DVec2,
    pub sender: Option<Sender>,
}

/// Tastatur-Event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Mausposition zum Zeitpunkt des Tastendrucks, falls bekannt
    pub display_position: Option<DVec2>,
    pub sender: Option<Sender>,
}

/// Rohes Eingabe-Ereignis.
///
/// Jede Variante trägt nur die Felder, die für sie gültig sind. Handler fragen
/// die benötigte Fähigkeit über `world_position()` & Co. ab statt zu casten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Position(PositionEvent),
    Display(DisplayPositionEvent),
    Key(KeyEvent),
}

impl Event {
    /// Zeiger-Event mit Weltposition.
    pub fn position(
        kind: PointerKind,
        button: MouseButton,
        modifiers: Modifiers,
        display_position: DVec2,
        world_position: DVec3,
        sender: Option<Sender>,
    ) -> Self {
        Self::Position(PositionEvent {
            kind,
            button,
            modifiers,
            display_position,
            world_position,
            sender,
        })
    }

    /// Kurzform: Linksklick an einer Weltposition ohne Modifier.
    pub fn left_press(world_position: DVec3) -> Self {
        Self::position(
            PointerKind::Press,
            MouseButton::Left,
            Modifiers::NONE,
            DVec2::ZERO,
            world_position,
            None,
        )
    }

    /// Kurzform: Mausbewegung (linke Taste gehalten) an einer Weltposition.
    pub fn left_drag(world_position: DVec3) -> Self {
        Self::position(
            PointerKind::Move,
            MouseButton::Left,
            Modifiers::NONE,
            DVec2::ZERO,
            world_position,
            None,
        )
    }

    /// Kurzform: Loslassen der linken Taste an einer Weltposition.
    pub fn left_release(world_position: DVec3) -> Self {
        Self::position(
            PointerKind::Release,
            MouseButton::Left,
            Modifiers::NONE,
            DVec2::ZERO,
            world_position,
            None,
        )
    }

    /// Kurzform: Tastendruck ohne Modifier.
    pub fn key_press(key: Key) -> Self {
        Self::Key(KeyEvent {
            key,
            modifiers: Modifiers::NONE,
            display_position: None,
            sender: None,
        })
    }

    /// Typ des Events für das Event-Mapping.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Position(e) => e.kind.into(),
            Event::Display(e) => e.kind.into(),
            Event::Key(_) => EventType::KeyPress,
        }
    }

    /// Gedrückte Maustaste (bei Tastatur-Events `NoButton`).
    pub fn button(&self) -> MouseButton {
        match self {
            Event::Position(e) => e.button,
            Event::Display(e) => e.button,
            Event::Key(_) => MouseButton::NoButton,
        }
    }

    /// Taste, falls es ein Tastatur-Event ist.
    pub fn key(&self) -> Option<Key> {
        match self {
            Event::Key(e) => Some(e.key),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Event::Position(e) => e.modifiers,
            Event::Display(e) => e.modifiers,
            Event::Key(e) => e.modifiers,
        }
    }

    /// Weltposition, nur bei `Event::Position` vorhanden.
    pub fn world_position(&self) -> Option<DVec3> {
        match self {
            Event::Position(e) => Some(e.world_position),
            _ => None,
        }
    }

    /// Displayposition, falls das Event eine trägt.
    pub fn display_position(&self) -> Option<DVec2> {
        match self {
            Event::Position(e) => Some(e.display_position),
            Event::Display(e) => Some(e.display_position),
            Event::Key(e) => e.display_position,
        }
    }

    pub fn sender(&self) -> Option<Sender> {
        match self {
            Event::Position(e) => e.sender,
            Event::Display(e) => e.sender,
            Event::Key(e) => e.sender,
        }
    }

    /// Setzt den Absender (Builder-Stil für Tests und Replay).
    pub fn with_sender(mut self, sender: Sender) -> Self {
        match &mut self {
            Event::Position(e) => e.sender = Some(sender),
            Event::Display(e) => e.sender = Some(sender),
            Event::Key(e) => e.sender = Some(sender),
        }
        self
    }

    /// Zeitpunkt der Sender-Geometrie, 0 wenn kein Sender bekannt ist.
    pub fn time_ms(&self) -> f64 {
        match self.sender() {
            Some(sender) => sender.time_ms,
            None => {
                log::debug!("Event ohne Sender, verwende Zeitpunkt 0");
                0.0
            }
        }
    }
}

// ── Event-IDs ───────────────────────────────────────────────────────

/// Abstrakte Event-ID, auf der die Transitionen einer State-Machine arbeiten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl EventId {
    pub const NULL: Self = Self(0);
    pub const LEFT_MOUSE_PRESS: Self = Self(1);
    pub const RIGHT_MOUSE_PRESS: Self = Self(2);
    pub const LEFT_MOUSE_PRESS_SHIFT: Self = Self(3);
    pub const MIDDLE_MOUSE_PRESS: Self = Self(4);
    pub const LEFT_MOUSE_PRESS_CTRL: Self = Self(5);
    pub const DELETE_KEY: Self = Self(12);
    pub const ESCAPE_KEY: Self = Self(14);
    pub const LEFT_MOUSE_RELEASE: Self = Self(505);
    pub const MOUSE_MOVE: Self = Self(520);
    pub const LEFT_MOUSE_DRAG: Self = Self(530);
    pub const YES: Self = Self(1003);
    pub const NO: Self = Self(1004);
    pub const SAME: Self = Self(1005);
    pub const NEW: Self = Self(1006);
    pub const LAST: Self = Self(1007);
    pub const FINISHED: Self = Self(1008);
    /// Strg losgelassen
    pub const STRG_UP: Self = Self(1009);

    /// Eingebaute Event-Namen, die in jeder Konfiguration referenziert werden dürfen.
    pub const BUILTIN: &'static [(&'static str, EventId)] = &[
        ("null", Self::NULL),
        ("leftMousePress", Self::LEFT_MOUSE_PRESS),
        ("rightMousePress", Self::RIGHT_MOUSE_PRESS),
        ("leftMousePressShift", Self::LEFT_MOUSE_PRESS_SHIFT),
        ("middleMousePress", Self::MIDDLE_MOUSE_PRESS),
        ("leftMousePressCtrl", Self::LEFT_MOUSE_PRESS_CTRL),
        ("deleteKey", Self::DELETE_KEY),
        ("escapeKey", Self::ESCAPE_KEY),
        ("leftMouseRelease", Self::LEFT_MOUSE_RELEASE),
        ("mouseMove", Self::MOUSE_MOVE),
        ("leftMouseDrag", Self::LEFT_MOUSE_DRAG),
        ("yes", Self::YES),
        ("no", Self::NO),
        ("same", Self::SAME),
        ("new", Self::NEW),
        ("last", Self::LAST),
        ("finished", Self::FINISHED),
        ("strgUp", Self::STRG_UP),
    ];

    /// Sucht eine eingebaute Event-ID über ihren Namen (Groß-/Kleinschreibung egal).
    pub fn builtin(name: &str) -> Option<Self> {
        Self::BUILTIN
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, id)| *id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::BUILTIN.iter().find(|(_, id)| id == self) {
            Some((name, _)) => write!(f, "{}({})", name, self.0),
            None => write!(f, "EID({})", self.0),
        }
    }
}

/// Abstrakte Event-ID zusammen mit dem auslösenden Event.
///
/// Folge-Events (z.B. `YES` nach einer Prüfung) tragen das ursprüngliche Event weiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateEvent {
    pub id: EventId,
    pub event: Option<Event>,
}

impl StateEvent {
    pub fn new(id: EventId, event: Event) -> Self {
        Self {
            id,
            event: Some(event),
        }
    }

    /// Rein synthetisches Event ohne Eingabe-Ereignis.
    pub fn synthetic(id: EventId) -> Self {
        Self { id, event: None }
    }

    /// Folge-Event mit neuer ID und demselben Eingabe-Ereignis.
    pub fn follow_up(&self, id: EventId) -> Self {
        Self {
            id,
            event: self.event,
        }
    }

    /// Weltposition des Eingabe-Ereignisses, falls vorhanden.
    pub fn world_position(&self) -> Option<DVec3> {
        self.event.as_ref().and_then(Event::world_position)
    }

    /// Displayposition des Eingabe-Ereignisses, falls vorhanden.
    pub fn display_position(&self) -> Option<DVec2> {
        self.event.as_ref().and_then(Event::display_position)
    }

    pub fn sender(&self) -> Option<Sender> {
        self.event.as_ref().and_then(Event::sender)
    }

    pub fn time_ms(&self) -> f64 {
        self.event.as_ref().map(Event::time_ms).unwrap_or(0.0)
    }
}

//! Parser für die Interaktions-Konfiguration (Events + State-Machines).
//!
//! Fehler werden beim Laden gemeldet, nie erst beim Dispatch. Ein expliziter
//! `<events>`-Block ersetzt das Standard-Event-Mapping der Factory.

use crate::interaction::{
    Action, ActionId, EventDescription, EventId, EventMapper, EventType, Key, Modifiers,
    MouseButton, PropertyValue, StateMachineFactory, TableBuilder,
};
use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Attribute eines Elements, Schlüssel in Großbuchstaben.
type Attributes = HashMap<String, String>;

/// Zwischenstand einer offenen `<transition>`.
struct OpenTransition {
    name: String,
    event: EventId,
    target: String,
    actions: Vec<Action>,
}

/// Offene Elemente während des Durchlaufs.
#[derive(Default)]
struct ParseState {
    in_events: bool,
    events: Vec<EventDescription>,
    machine: Option<TableBuilder>,
    state: Option<String>,
    transition: Option<OpenTransition>,
    action: Option<Action>,
}

/// Lädt Events und State-Machines aus einem XML-String in die Factory.
///
/// Die Factory bleibt bei einem Fehler in der Mitte teilweise befüllt; der
/// Aufrufer verwirft sie dann.
pub fn load_interaction_config(xml_content: &str, factory: &mut StateMachineFactory) -> Result<()> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut buffer = Vec::new();
    let mut state = ParseState::default();
    let mut machine_count = 0usize;

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buffer) {
            Ok(Event::Start(ref e)) => {
                let (tag, attrs) = read_element(&reader, e)?;
                open_element(&mut state, factory, &tag, &attrs)
                    .with_context(|| format!("Element <{}> bei Byte {}", tag, position))?;
            }
            Ok(Event::Empty(ref e)) => {
                let (tag, attrs) = read_element(&reader, e)?;
                open_element(&mut state, factory, &tag, &attrs)
                    .and_then(|_| close_element(&mut state, factory, &tag))
                    .with_context(|| format!("Element <{}> bei Byte {}", tag, position))?;
                if tag == "stateMachine" {
                    machine_count += 1;
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let tag = reader.decoder().decode(name.as_ref())?.into_owned();
                close_element(&mut state, factory, &tag)
                    .with_context(|| format!("Element </{}> bei Byte {}", tag, position))?;
                if tag == "stateMachine" {
                    machine_count += 1;
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err).context("Fehler beim Parsen des XML"),
            _ => {}
        }
        buffer.clear();
    }

    if state.machine.is_some() || state.in_events {
        bail!("XML endet innerhalb eines offenen Elements");
    }
    log::debug!("{} State-Machine(s) aus XML geladen", machine_count);
    Ok(())
}

fn read_element(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<(String, Attributes)> {
    let name = e.name();
    let tag = reader.decoder().decode(name.as_ref())?.into_owned();
    let mut attrs = Attributes::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key.to_ascii_uppercase(), value);
    }
    Ok((tag, attrs))
}

fn open_element(
    state: &mut ParseState,
    factory: &StateMachineFactory,
    tag: &str,
    attrs: &Attributes,
) -> Result<()> {
    match tag {
        "interaction" => {}
        "events" => state.in_events = true,
        "event" => {
            if !state.in_events {
                bail!("<event> außerhalb von <events>");
            }
            state.events.push(parse_event_description(attrs)?);
        }
        "stateMachine" => {
            if state.machine.is_some() {
                bail!("verschachtelte <stateMachine>");
            }
            state.machine = Some(TableBuilder::new(required(attrs, "NAME")?));
        }
        "state" => {
            let machine = state
                .machine
                .as_mut()
                .context("<state> außerhalb von <stateMachine>")?;
            let name = required(attrs, "NAME")?;
            let start = attrs
                .get("START_STATE")
                .map(|v| parse_bool(v))
                .transpose()?
                .unwrap_or(false);
            machine.add_state(name, start);
            state.state = Some(name.to_string());
        }
        "transition" => {
            if state.state.is_none() {
                bail!("<transition> außerhalb von <state>");
            }
            let target = required(attrs, "NEXT_STATE")?.to_string();
            let event = resolve_event(attrs, factory)?;
            let name = attrs
                .get("NAME")
                .cloned()
                .unwrap_or_else(|| format!("{}->{}", event, target));
            state.transition = Some(OpenTransition {
                name,
                event,
                target,
                actions: Vec::new(),
            });
        }
        "action" => {
            if state.transition.is_none() {
                bail!("<action> außerhalb von <transition>");
            }
            state.action = Some(Action::new(resolve_action(attrs, factory)?));
        }
        "floatParameter" | "intParameter" | "boolParameter" | "stringParameter" => {
            let action = state
                .action
                .as_mut()
                .with_context(|| format!("<{}> außerhalb von <action>", tag))?;
            let name = required(attrs, "NAME")?;
            let raw = required(attrs, "VALUE")?;
            let value = parse_property(tag, raw)
                .with_context(|| format!("Parameter '{}' = '{}'", name, raw))?;
            action.properties.insert(name.to_string(), value);
        }
        "followUp" => {
            let action = state
                .action
                .as_mut()
                .context("<followUp> außerhalb von <action>")?;
            action.follow_ups.push(resolve_event(attrs, factory)?);
        }
        other => log::warn!("Unbekanntes Element <{}> ignoriert", other),
    }
    Ok(())
}

fn close_element(state: &mut ParseState, factory: &mut StateMachineFactory, tag: &str) -> Result<()> {
    match tag {
        "events" => {
            state.in_events = false;
            let events = std::mem::take(&mut state.events);
            if !events.is_empty() {
                let mut mapper = EventMapper::new();
                for description in events {
                    mapper.insert(description)?;
                }
                *factory.event_mapper_mut() = mapper;
            }
        }
        "stateMachine" => {
            if let Some(builder) = state.machine.take() {
                let name = builder.name().to_string();
                factory
                    .add_table(builder)
                    .with_context(|| format!("State-Machine '{}' ungültig", name))?;
            }
        }
        "state" => state.state = None,
        "transition" => {
            if let (Some(transition), Some(from), Some(machine)) = (
                state.transition.take(),
                state.state.as_deref(),
                state.machine.as_mut(),
            ) {
                machine.add_transition(
                    from,
                    transition.name,
                    transition.event,
                    transition.target,
                    transition.actions,
                );
            }
        }
        "action" => {
            if let (Some(action), Some(transition)) =
                (state.action.take(), state.transition.as_mut())
            {
                transition.actions.push(action);
            }
        }
        _ => {}
    }
    Ok(())
}

fn required<'a>(attrs: &'a Attributes, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Attribut {} fehlt", key))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("'{}' ist kein Wahrheitswert", other),
    }
}

/// `EVENT_ID` (numerisch) oder `EVENT` (konfigurierter oder eingebauter Name).
fn resolve_event(attrs: &Attributes, factory: &StateMachineFactory) -> Result<EventId> {
    if let Some(raw) = attrs.get("EVENT_ID") {
        let id = raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("EVENT_ID '{}' ist keine Zahl", raw))?;
        return Ok(EventId(id));
    }
    let name = attrs
        .get("EVENT")
        .context("Attribut EVENT_ID oder EVENT fehlt")?;
    factory
        .event_mapper()
        .id_for_name(name.trim())
        .ok_or_else(|| anyhow!("Event '{}' unbekannt", name))
}

/// `NAME` (bekannte Action) oder numerische `ID`.
fn resolve_action(attrs: &Attributes, factory: &StateMachineFactory) -> Result<ActionId> {
    if let Some(name) = attrs.get("NAME") {
        return factory
            .action_by_name(name)
            .ok_or_else(|| anyhow!("Action '{}' unbekannt", name));
    }
    let raw = attrs.get("ID").context("Attribut NAME oder ID fehlt")?;
    let id = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Action-ID '{}' ist keine Zahl", raw))?;
    Ok(ActionId(id))
}

fn parse_event_description(attrs: &Attributes) -> Result<EventDescription> {
    let name = required(attrs, "NAME")?.to_string();
    let raw_id = required(attrs, "ID")?;
    let id = raw_id
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Event '{}': ID '{}' ist keine Zahl", name, raw_id))?;
    let type_name = required(attrs, "TYPE")?;
    let event_type = EventType::from_name(type_name)
        .ok_or_else(|| anyhow!("Event '{}': Typ '{}' unbekannt", name, type_name))?;

    let button = match attrs.get("BUTTON") {
        Some(b) => MouseButton::from_name(b)
            .ok_or_else(|| anyhow!("Event '{}': Taste '{}' unbekannt", name, b))?,
        None => MouseButton::NoButton,
    };
    let key = match attrs.get("KEY") {
        Some(k) => Some(
            Key::from_name(k).ok_or_else(|| anyhow!("Event '{}': Key '{}' unbekannt", name, k))?,
        ),
        None => None,
    };
    if event_type == EventType::KeyPress && key.is_none() {
        bail!("Event '{}': KeyPress ohne KEY", name);
    }
    let modifiers = match attrs.get("MODIFIERS") {
        Some(m) => Modifiers::parse(m)
            .ok_or_else(|| anyhow!("Event '{}': Modifier '{}' unbekannt", name, m))?,
        None => Modifiers::NONE,
    };

    Ok(EventDescription {
        name,
        id: EventId(id),
        event_type,
        button,
        key,
        modifiers,
    })
}

fn parse_property(tag: &str, raw: &str) -> Result<PropertyValue> {
    let raw = raw.trim();
    Ok(match tag {
        "floatParameter" => PropertyValue::Float(raw.parse::<f64>()?),
        "intParameter" => PropertyValue::Int(raw.parse::<i64>()?),
        "boolParameter" => PropertyValue::Bool(parse_bool(raw)?),
        _ => PropertyValue::Text(raw.to_string()),
    })
}

#[cfg(test)]
mod tests;

use super::*;
use crate::interaction::{Event, StateMachineTable};
use crate::undo::UndoController;
use glam::DVec3;
use std::sync::Arc;

fn load(xml: &str) -> Result<StateMachineFactory> {
    let mut factory = StateMachineFactory::new();
    load_interaction_config(xml, &mut factory)?;
    Ok(factory)
}

fn table(factory: &StateMachineFactory, name: &str) -> Arc<StateMachineTable> {
    factory.table(name).expect("Tabelle vorhanden")
}

#[test]
fn test_parse_machine_with_parameters_and_follow_ups() {
    let xml = r#"
    <interaction>
        <stateMachine NAME="pointsetinteractor">
            <state NAME="neutral" START_STATE="TRUE">
                <transition NAME="add" EVENT_ID="3" NEXT_STATE="checked">
                    <action NAME="AcCHECKPOINT">
                        <floatParameter NAME="precision" VALUE="2.5" />
                        <intParameter NAME="layer" VALUE="4" />
                        <boolParameter NAME="strict" VALUE="false" />
                        <stringParameter NAME="label" VALUE="Landmarke" />
                        <followUp EVENT="yes" />
                    </action>
                </transition>
            </state>
            <state NAME="checked">
                <transition EVENT="no" NEXT_STATE="neutral" />
            </state>
        </stateMachine>
    </interaction>
    "#;

    let factory = load(xml).expect("gültige Konfiguration");
    let table = table(&factory, "pointsetinteractor");
    let neutral = table.state_by_name("neutral").expect("Zustand");
    let transition = neutral.transition(EventId(3)).expect("Transition");
    assert_eq!(transition.name, "add");
    assert_eq!(table.state(transition.target).name, "checked");

    let action = &transition.actions[0];
    assert_eq!(action.id, ActionId::CHECK_POINT);
    assert_eq!(action.float_property("precision"), Some(2.5));
    assert_eq!(action.int_property("layer"), Some(4));
    assert_eq!(action.bool_property("strict"), Some(false));
    assert_eq!(action.text_property("label"), Some("Landmarke"));
    assert_eq!(action.follow_ups, vec![EventId::YES]);

    let checked = table.state_by_name("checked").expect("Zustand");
    assert!(checked.transition(EventId::NO).is_some());
}

#[test]
fn test_events_block_replaces_default_mapping() {
    let xml = r#"
    <interaction>
        <events>
            <event NAME="shiftClick" ID="3" TYPE="MousePress" BUTTON="Left" MODIFIERS="Shift" />
            <event NAME="deleteKey" ID="12" TYPE="KeyPress" KEY="Delete" />
        </events>
        <stateMachine NAME="m">
            <state NAME="s" START_STATE="true">
                <transition EVENT="shiftClick" NEXT_STATE="s" />
                <transition EVENT="deleteKey" NEXT_STATE="s" />
            </state>
        </stateMachine>
    </interaction>
    "#;

    let factory = load(xml).expect("gültige Konfiguration");
    let mapper = factory.event_mapper();
    assert_eq!(mapper.len(), 2);
    assert_eq!(mapper.id_for_name("shiftClick"), Some(EventId(3)));
    // einfacher Linksklick ist nicht mehr gemappt
    assert!(mapper.map(&Event::left_press(DVec3::ZERO)).is_none());
    let key = mapper.map(&Event::key_press(Key::Delete)).expect("gemappt");
    assert_eq!(key.id, EventId::DELETE_KEY);
}

#[test]
fn test_numeric_action_requires_registration() {
    let xml = r#"
    <interaction>
        <stateMachine NAME="custom">
            <state NAME="s" START_STATE="true">
                <transition EVENT_ID="1" NEXT_STATE="s">
                    <action ID="4711" />
                </transition>
            </state>
        </stateMachine>
    </interaction>
    "#;

    assert!(load(xml).is_err());

    let mut factory = StateMachineFactory::new();
    factory
        .register_action(ActionId(4711), "AcCUSTOM")
        .expect("registrierbar");
    load_interaction_config(xml, &mut factory).expect("nach Registrierung gültig");
    let machine = factory
        .create_machine("custom", UndoController::shared(4))
        .expect("Machine");
    assert_eq!(machine.current_state_name(), "s");
}

#[test]
fn test_load_errors_are_reported() {
    let cases = [
        (
            "unbekannter Zielzustand",
            r#"<interaction><stateMachine NAME="m">
                <state NAME="a" START_STATE="true"><transition EVENT_ID="1" NEXT_STATE="nirgends"/></state>
            </stateMachine></interaction>"#,
            "existiert nicht",
        ),
        (
            "unbekannte Action",
            r#"<interaction><stateMachine NAME="m">
                <state NAME="a" START_STATE="true"><transition EVENT_ID="1" NEXT_STATE="a">
                    <action NAME="AcGIBTESNICHT"/></transition></state>
            </stateMachine></interaction>"#,
            "AcGIBTESNICHT",
        ),
        (
            "unbekanntes Event",
            r#"<interaction><stateMachine NAME="m">
                <state NAME="a" START_STATE="true"><transition EVENT="wink" NEXT_STATE="a"/></state>
            </stateMachine></interaction>"#,
            "wink",
        ),
        (
            "doppelter Zustand",
            r#"<interaction><stateMachine NAME="m">
                <state NAME="a" START_STATE="true"/><state NAME="a"/>
            </stateMachine></interaction>"#,
            "doppelt",
        ),
        (
            "doppeltes Event",
            r#"<interaction><stateMachine NAME="m">
                <state NAME="a" START_STATE="true">
                    <transition EVENT_ID="1" NEXT_STATE="a"/>
                    <transition EVENT_ID="1" NEXT_STATE="a"/>
                </state>
            </stateMachine></interaction>"#,
            "mehrfach",
        ),
        (
            "kein Startzustand",
            r#"<interaction><stateMachine NAME="m"><state NAME="a"/></stateMachine></interaction>"#,
            "Startzustand",
        ),
        (
            "zwei Startzustände",
            r#"<interaction><stateMachine NAME="m">
                <state NAME="a" START_STATE="true"/><state NAME="b" START_STATE="true"/>
            </stateMachine></interaction>"#,
            "Startzustände",
        ),
        (
            "doppelte Machine",
            r#"<interaction>
                <stateMachine NAME="m"><state NAME="a" START_STATE="true"/></stateMachine>
                <stateMachine NAME="m"><state NAME="a" START_STATE="true"/></stateMachine>
            </interaction>"#,
            "m",
        ),
        (
            "Syntaxfehler",
            r#"<interaction><stateMachine NAME="m"></interaction>"#,
            "",
        ),
    ];

    for (label, xml, needle) in cases {
        let err = load(xml).expect_err(label);
        let msg = format!("{err:#}");
        assert!(msg.contains(needle), "{}: '{}' fehlt in '{}'", label, needle, msg);
    }
}

#[test]
fn test_unknown_elements_are_ignored() {
    let xml = r#"
    <interaction>
        <comment>Freitext</comment>
        <stateMachine NAME="m">
            <state NAME="a" START_STATE="1" />
        </stateMachine>
    </interaction>
    "#;

    let factory = load(xml).expect("gültige Konfiguration");
    assert_eq!(factory.machine_types().collect::<Vec<_>>(), vec!["m"]);
}

//! Undo/Redo über komplette Gesten mit der mitgelieferten Konfiguration.

use approx::assert_relative_eq;
use glam::{DVec2, DVec3};
use imaging_interaction::interaction::{
    Event, EventId, Key, Modifiers, MouseButton, PointerKind, RendererId, Sender, StateEvent,
    StateMachineFactory,
};
use imaging_interaction::{
    Geometry3D, Gizmo, GizmoAllowOptions, GizmoInteraction, Interactor, PlaneGeometry, PointSet,
    PointSetInteraction, SharedUndoController, SliceNavigationController, SlicesRotator,
    UndoController, WorldGeometry,
};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

fn fixture_factory() -> StateMachineFactory {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/interaction_states.xml");
    let mut factory = StateMachineFactory::new();
    factory.load_from_file(&path).expect("Fixture ladbar");
    factory
}

fn shift_press(p: DVec3) -> StateEvent {
    StateEvent::new(
        EventId::LEFT_MOUSE_PRESS_SHIFT,
        Event::position(
            PointerKind::Press,
            MouseButton::Left,
            Modifiers::SHIFT,
            DVec2::ZERO,
            p,
            None,
        ),
    )
}

fn drag(p: DVec3) -> StateEvent {
    StateEvent::new(EventId::LEFT_MOUSE_DRAG, Event::left_drag(p))
}

fn release(p: DVec3) -> StateEvent {
    StateEvent::new(EventId::LEFT_MOUSE_RELEASE, Event::left_release(p))
}

fn undo_all(undo: &SharedUndoController) -> usize {
    let mut steps = 0;
    while undo.borrow_mut().undo() {
        steps += 1;
    }
    steps
}

#[test]
fn test_point_add_move_delete_roundtrip() {
    let factory = fixture_factory();
    let undo = UndoController::shared(50);
    let points = Rc::new(RefCell::new(PointSet::new()));
    let mut tool = Interactor::new(
        &factory,
        "pointsetinteractor",
        undo.clone(),
        PointSetInteraction::new(&points),
    )
    .expect("Interactor");

    let start = DVec3::new(1.0, 1.0, 1.0);
    let end = DVec3::new(4.0, 1.0, 1.0);

    // Hinzufügen
    assert!(tool.handle_event(&shift_press(start)).is_ok());
    assert!(tool.handle_event(&release(start)).is_ok());
    assert_eq!(points.borrow().positions(), vec![start]);

    // Verschieben
    assert!(tool.handle_event(&shift_press(start)).is_ok());
    assert_eq!(tool.machine().current_state_name(), "moving");
    assert!(tool.handle_event(&drag(end)).is_ok());
    assert!(tool.handle_event(&release(end)).is_ok());
    assert_eq!(points.borrow().positions(), vec![end]);

    // Löschen
    let delete = StateEvent::new(EventId::DELETE_KEY, Event::key_press(Key::Delete));
    assert!(tool.handle_event(&delete).is_ok());
    assert!(points.borrow().is_empty());
    assert_eq!(undo.borrow().len(), 3);

    assert!(undo.borrow_mut().undo());
    assert_eq!(points.borrow().positions(), vec![end]);
    assert_eq!(points.borrow().selected_indices(), vec![0]);
    assert!(undo.borrow_mut().undo());
    assert_eq!(points.borrow().positions(), vec![start]);
    assert!(undo.borrow_mut().undo());
    assert!(points.borrow().is_empty());
    assert!(!undo.borrow_mut().undo());

    for _ in 0..3 {
        assert!(undo.borrow_mut().redo());
    }
    assert!(points.borrow().is_empty());
    assert!(!undo.borrow().can_redo());
}

#[test]
fn test_disabled_undo_records_nothing() {
    let factory = fixture_factory();
    let undo = UndoController::shared(50);
    let points = Rc::new(RefCell::new(PointSet::new()));
    let mut tool = Interactor::new(
        &factory,
        "pointsetinteractor",
        undo.clone(),
        PointSetInteraction::new(&points),
    )
    .expect("Interactor");
    tool.machine_mut().set_undo_enabled(false);

    tool.handle_event(&shift_press(DVec3::ONE));

    assert_eq!(points.borrow().len(), 1);
    assert!(undo.borrow().is_empty());
}

fn slice_controller(renderer: u32, plane: PlaneGeometry) -> Rc<RefCell<SliceNavigationController>> {
    Rc::new(RefCell::new(SliceNavigationController::new(
        RendererId(renderer),
        WorldGeometry::Sliced {
            reference: plane,
            slices: 20,
            spacing: 1.0,
        },
    )))
}

#[test]
fn test_slice_rotation_roundtrip() {
    let factory = fixture_factory();
    let undo = UndoController::shared(50);
    let axial = slice_controller(1, PlaneGeometry::axial(0.0));
    let sagittal = slice_controller(2, PlaneGeometry::sagittal(0.0));
    let coronal = slice_controller(3, PlaneGeometry::coronal(0.0));
    let mut rotator = Interactor::new(
        &factory,
        "slicesrotator",
        undo.clone(),
        SlicesRotator::default(),
    )
    .expect("Interactor");
    for c in [&axial, &sagittal, &coronal] {
        rotator
            .behavior_mut()
            .coordinator_mut()
            .add_slice_controller(c)
            .expect("registrierbar");
    }
    let sagittal_before = sagittal.borrow().world_geometry().clone();
    let coronal_before = coronal.borrow().world_geometry().clone();

    let in_axial = |event: Event| event.with_sender(Sender::new(RendererId(1)));
    rotator.handle_event(&StateEvent::new(
        EventId::MOUSE_MOVE,
        in_axial(Event::position(
            PointerKind::Move,
            MouseButton::NoButton,
            Modifiers::NONE,
            DVec2::ZERO,
            DVec3::new(6.0, 0.5, 0.0),
            None,
        )),
    ));
    assert_eq!(rotator.machine().current_state_name(), "ready");
    rotator.handle_event(&StateEvent::new(
        EventId::LEFT_MOUSE_PRESS,
        in_axial(Event::left_press(DVec3::new(6.0, 0.0, 0.0))),
    ));
    rotator.handle_event(&StateEvent::new(
        EventId::LEFT_MOUSE_DRAG,
        in_axial(Event::left_drag(DVec3::new(0.0, 6.0, 0.0))),
    ));
    rotator.handle_event(&StateEvent::new(
        EventId::LEFT_MOUSE_RELEASE,
        in_axial(Event::left_release(DVec3::new(0.0, 6.0, 0.0))),
    ));

    let rotated = sagittal.borrow().current_plane().expect("Ebene").normal();
    assert_relative_eq!(rotated.y.abs(), 1.0, epsilon = 1e-9);
    assert_eq!(undo.borrow().len(), 1);

    assert!(undo.borrow_mut().undo());
    let restored = sagittal.borrow().current_plane().expect("Ebene").normal();
    let sagittal_expected = sagittal_before.plane(0).expect("Ebene").normal();
    assert_relative_eq!(restored.x, sagittal_expected.x, epsilon = 1e-9);
    assert_relative_eq!(restored.y, sagittal_expected.y, epsilon = 1e-9);
    let coronal_normal = coronal.borrow().current_plane().expect("Ebene").normal();
    let coronal_expected = coronal_before.plane(0).expect("Ebene").normal();
    assert_relative_eq!(coronal_normal.x, coronal_expected.x, epsilon = 1e-9);
    assert_relative_eq!(coronal_normal.y, coronal_expected.y, epsilon = 1e-9);
    assert_relative_eq!(coronal_normal.z, coronal_expected.z, epsilon = 1e-9);

    assert!(undo.borrow_mut().redo());
    let again = sagittal.borrow().current_plane().expect("Ebene").normal();
    assert_relative_eq!(again.y, rotated.y, epsilon = 1e-9);
}

#[test]
fn test_gizmo_drag_roundtrip() {
    let factory = fixture_factory();
    let undo = UndoController::shared(50);
    let geometry = Rc::new(RefCell::new(Geometry3D::from_box(
        DVec3::ZERO,
        DVec3::splat(10.0),
    )));
    let (gizmo, _subscription) =
        Gizmo::attach_to(&geometry, GizmoAllowOptions::default()).expect("anhängbar");
    let mut tool = Interactor::new(
        &factory,
        "gizmointeraction",
        undo.clone(),
        GizmoInteraction::new(&gizmo, &geometry),
    )
    .expect("Interactor");
    let initial = geometry.borrow().index_to_world();

    tool.handle_event(&StateEvent::new(
        EventId::LEFT_MOUSE_PRESS,
        Event::left_press(DVec3::new(5.0, 5.0, 5.0)),
    ));
    assert_eq!(tool.machine().current_state_name(), "dragging");
    tool.handle_event(&drag(DVec3::new(7.0, 8.0, 6.0)));
    tool.handle_event(&release(DVec3::new(7.0, 8.0, 6.0)));

    assert_ne!(geometry.borrow().index_to_world(), initial);
    assert_eq!(undo_all(&undo), 1);
    assert_eq!(geometry.borrow().index_to_world(), initial);
    assert_relative_eq!(gizmo.borrow().center().x, 5.0, epsilon = 1e-12);

    assert!(undo.borrow_mut().redo());
    assert_relative_eq!(geometry.borrow().center().y, 8.0, epsilon = 1e-12);
    assert_relative_eq!(gizmo.borrow().center().y, 8.0, epsilon = 1e-12);
}

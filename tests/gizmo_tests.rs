//! Gizmo an einer Box: Handle-Auswahl und Transformation über den Interactor.

use approx::assert_relative_eq;
use glam::{DMat3, DVec3};
use imaging_interaction::gizmo::GeometrySubscription;
use imaging_interaction::interaction::{Event, EventId, EventListener, StateEvent, StateMachineFactory};
use imaging_interaction::{
    Geometry3D, Gizmo, GizmoAllowOptions, GizmoInteraction, HandleType, Interactor,
    SharedUndoController, UndoController,
};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

struct Setup {
    geometry: Rc<RefCell<Geometry3D>>,
    gizmo: Rc<RefCell<Gizmo>>,
    tool: Interactor<GizmoInteraction>,
    undo: SharedUndoController,
    _subscription: GeometrySubscription,
}

fn setup(allow: GizmoAllowOptions) -> Setup {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/interaction_states.xml");
    let mut factory = StateMachineFactory::new();
    factory.load_from_file(&path).expect("Fixture ladbar");

    let geometry = Rc::new(RefCell::new(Geometry3D::from_box(
        DVec3::ZERO,
        DVec3::splat(10.0),
    )));
    let (gizmo, subscription) = Gizmo::attach_to(&geometry, allow).expect("anhängbar");
    let undo = UndoController::shared(10);
    let tool = Interactor::new(
        &factory,
        "gizmointeraction",
        undo.clone(),
        GizmoInteraction::new(&gizmo, &geometry),
    )
    .expect("Interactor");
    Setup {
        geometry,
        gizmo,
        tool,
        undo,
        _subscription: subscription,
    }
}

fn press(p: DVec3) -> StateEvent {
    StateEvent::new(EventId::LEFT_MOUSE_PRESS, Event::left_press(p))
}

fn drag(p: DVec3) -> StateEvent {
    StateEvent::new(EventId::LEFT_MOUSE_DRAG, Event::left_drag(p))
}

fn release(p: DVec3) -> StateEvent {
    StateEvent::new(EventId::LEFT_MOUSE_RELEASE, Event::left_release(p))
}

#[test]
fn test_x_shaft_drag_translates_exactly_along_x() {
    let mut s = setup(GizmoAllowOptions::default());
    assert_eq!(
        s.gizmo.borrow().handle_at(DVec3::new(8.0, 5.0, 5.0)),
        HandleType::MoveAlongAxisX
    );

    s.tool.handle_event(&press(DVec3::new(8.0, 5.0, 5.0)));
    assert_eq!(s.tool.behavior().active_handle(), Some(HandleType::MoveAlongAxisX));
    s.tool.handle_event(&drag(DVec3::new(10.0, 7.0, 4.0)));
    s.tool.handle_event(&release(DVec3::new(10.0, 7.0, 4.0)));

    let transform = s.geometry.borrow().index_to_world();
    assert_eq!(transform.translation, DVec3::new(2.0, 0.0, 0.0));
    assert_eq!(transform.matrix3, DMat3::IDENTITY);
    assert_eq!(s.gizmo.borrow().center(), DVec3::new(7.0, 5.0, 5.0));
    assert_eq!(s.tool.machine().current_state_name(), "neutral");
}

#[test]
fn test_z_ring_drag_rotates_about_center() {
    let mut s = setup(GizmoAllowOptions::default());
    // Ring um Z liegt in der XY-Ebene mit Radius 5; 45° und 135°
    let r = 5.0 * std::f64::consts::FRAC_1_SQRT_2;
    let on_ring = DVec3::new(5.0 + r, 5.0 + r, 5.0);
    let quarter_on = DVec3::new(5.0 - r, 5.0 + r, 5.0);
    assert_eq!(s.gizmo.borrow().handle_at(on_ring), HandleType::RotateAroundAxisZ);

    s.tool.handle_event(&press(on_ring));
    s.tool.handle_event(&drag(quarter_on));
    s.tool.handle_event(&release(quarter_on));

    let geometry = s.geometry.borrow();
    let center = geometry.center();
    assert_relative_eq!(center.x, 5.0, epsilon = 1e-9);
    assert_relative_eq!(center.y, 5.0, epsilon = 1e-9);
    let x_axis = geometry.index_to_world().matrix3.x_axis;
    assert_relative_eq!(x_axis.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(x_axis.y, 1.0, epsilon = 1e-9);
}

#[test]
fn test_press_beside_gizmo_does_not_start_drag() {
    let mut s = setup(GizmoAllowOptions::default());
    let before = s.geometry.borrow().index_to_world();

    s.tool.handle_event(&press(DVec3::new(2.0, 2.0, 8.0)));
    s.tool.handle_event(&drag(DVec3::new(4.0, 4.0, 8.0)));

    assert_eq!(s.tool.machine().current_state_name(), "neutral");
    assert_eq!(s.geometry.borrow().index_to_world(), before);
    assert!(s.tool.behavior().active_handle().is_none());
}

#[test]
fn test_disallowed_translation_has_no_handles() {
    let allow = GizmoAllowOptions {
        translation: false,
        ..GizmoAllowOptions::default()
    };
    let mut s = setup(allow);

    s.tool.handle_event(&press(DVec3::new(8.0, 5.0, 5.0)));

    assert_eq!(s.tool.machine().current_state_name(), "neutral");
    assert_eq!(s.gizmo.borrow().mesh().count(HandleType::MoveFreely), 0);
}

#[test]
fn test_can_handle_is_full_over_handle() {
    let s = setup(GizmoAllowOptions::default());
    assert_eq!(s.tool.can_handle_event(&press(DVec3::new(8.0, 5.0, 5.0))), 1.0);
    assert_eq!(s.tool.can_handle_event(&press(DVec3::new(2.0, 2.0, 8.0))), 0.5);
    assert_eq!(s.tool.can_handle_event(&release(DVec3::ZERO)), 0.0);
}

#[test]
fn test_finishing_drag_does_not_reapply_transform() {
    let mut s = setup(GizmoAllowOptions::default());
    let notifications = Rc::new(Cell::new(0usize));
    let counter = notifications.clone();
    s.geometry
        .borrow_mut()
        .subscribe(move |_| counter.set(counter.get() + 1));

    s.tool.handle_event(&press(DVec3::new(8.0, 5.0, 5.0)));
    s.tool.handle_event(&drag(DVec3::new(10.0, 5.0, 5.0)));
    assert_eq!(notifications.get(), 1);
    s.tool.handle_event(&release(DVec3::new(10.0, 5.0, 5.0)));

    assert_eq!(notifications.get(), 1);
    assert_eq!(s.undo.borrow().len(), 1);
    assert!(s.undo.borrow_mut().undo());
    assert_eq!(s.geometry.borrow().center(), DVec3::splat(5.0));
}

#[test]
fn test_reset_mid_drag_discards_gesture() {
    let mut s = setup(GizmoAllowOptions::default());
    let before = s.geometry.borrow().index_to_world();

    s.tool.handle_event(&press(DVec3::new(8.0, 5.0, 5.0)));
    assert_eq!(s.tool.behavior().active_handle(), Some(HandleType::MoveAlongAxisX));
    EventListener::reset_to_start_state(&mut s.tool);

    assert_eq!(s.tool.machine().current_state_name(), "neutral");
    assert!(s.tool.behavior().active_handle().is_none());
    assert_eq!(s.tool.can_handle_event(&press(DVec3::new(2.0, 2.0, 8.0))), 0.5);
    s.tool.handle_event(&drag(DVec3::new(10.0, 5.0, 5.0)));
    assert_eq!(s.geometry.borrow().index_to_world(), before);
}

//! Ziehen an den Gizmo-Handles.
//!
//! Jeder Zwischenschritt wird aus der Starttransformation neu berechnet, das
//! Ergebnis hängt also nur von Start- und aktueller Position ab.

use super::{Gizmo, HandleType};
use crate::core::{rotation_about, Geometry3D};
use crate::interaction::{Action, ActionContext, ActionId, ActionTable, Behavior, StateEvent};
use crate::interactors::{execute, post_answer, record, upgrade_target};
use crate::undo::{Operation, SharedActor};
use glam::{DAffine3, DMat3, DVec3};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Untergrenze für Hebel und Skalierungsfaktor
const MIN_LEVER: f64 = 1e-6;

/// Laufender Zug an einem Handle.
#[derive(Debug, Clone, Copy)]
struct GizmoDrag {
    handle: HandleType,
    initial_transform: DAffine3,
    center: DVec3,
    axes: [DVec3; 3],
    pick_point: DVec3,
}

impl GizmoDrag {
    /// Transformation in Weltkoordinaten vom Start bis `position`.
    fn delta_transform(&self, position: DVec3) -> Option<DAffine3> {
        let axis = self.handle.axis_index().map(|i| self.axes[i]);
        match (self.handle, axis) {
            (HandleType::MoveFreely, _) => Some(DAffine3::from_translation(position - self.pick_point)),
            (
                HandleType::MoveAlongAxisX | HandleType::MoveAlongAxisY | HandleType::MoveAlongAxisZ,
                Some(axis),
            ) => {
                let distance = (position - self.pick_point).dot(axis);
                Some(DAffine3::from_translation(axis * distance))
            }
            (
                HandleType::RotateAroundAxisX
                | HandleType::RotateAroundAxisY
                | HandleType::RotateAroundAxisZ,
                Some(axis),
            ) => {
                let project = |p: DVec3| {
                    let v = p - self.center;
                    v - axis * v.dot(axis)
                };
                let from = project(self.pick_point);
                let to = project(position);
                if from.length() < MIN_LEVER || to.length() < MIN_LEVER {
                    return Some(DAffine3::IDENTITY);
                }
                let angle = axis.dot(from.cross(to)).atan2(from.dot(to));
                rotation_about(self.center, axis, angle.to_degrees())
            }
            (HandleType::ScaleX | HandleType::ScaleY | HandleType::ScaleZ, Some(axis)) => {
                let before = (self.pick_point - self.center).dot(axis);
                let after = (position - self.center).dot(axis);
                if before.abs() < MIN_LEVER {
                    return Some(DAffine3::IDENTITY);
                }
                let factor = after / before;
                if factor < MIN_LEVER {
                    return None;
                }
                Some(scaling_along(self.center, axis, factor))
            }
            _ => None,
        }
    }
}

/// Skalierung um `center` nur entlang `axis` (normiert).
fn scaling_along(center: DVec3, axis: DVec3, factor: f64) -> DAffine3 {
    let outer = DMat3::from_cols(axis * axis.x, axis * axis.y, axis * axis.z);
    let matrix = DMat3::IDENTITY + outer * (factor - 1.0);
    DAffine3::from_translation(center)
        * DAffine3::from_mat3(matrix)
        * DAffine3::from_translation(-center)
}

/// Verhalten für einen Gizmo und die Geometrie, der er folgt.
pub struct GizmoInteraction {
    gizmo: Weak<RefCell<Gizmo>>,
    geometry: Weak<RefCell<Geometry3D>>,
    hovered: HandleType,
    drag: Option<GizmoDrag>,
}

impl GizmoInteraction {
    pub fn new(gizmo: &Rc<RefCell<Gizmo>>, geometry: &Rc<RefCell<Geometry3D>>) -> Self {
        Self {
            gizmo: Rc::downgrade(gizmo),
            geometry: Rc::downgrade(geometry),
            hovered: HandleType::NoHandle,
            drag: None,
        }
    }

    /// Zuletzt geprüfter Handle unter dem Cursor.
    pub fn hovered(&self) -> HandleType {
        self.hovered
    }

    /// Handle, an dem gerade gezogen wird.
    pub fn active_handle(&self) -> Option<HandleType> {
        self.drag.map(|d| d.handle)
    }

    fn handle_at(&self, position: DVec3) -> HandleType {
        self.gizmo
            .upgrade()
            .and_then(|g| g.try_borrow().ok().map(|g| g.handle_at(position)))
            .unwrap_or(HandleType::NoHandle)
    }

    fn check_handle(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        self.hovered = self.handle_at(position);
        post_answer(ctx, self.hovered != HandleType::NoHandle);
        true
    }

    fn start_drag(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(gizmo) = upgrade_target(&self.gizmo, ctx) else {
            return false;
        };
        let Some(geometry) = upgrade_target(&self.geometry, ctx) else {
            return false;
        };
        let (handle, center, axes) = match gizmo.try_borrow() {
            Ok(g) => (g.handle_at(position), g.center(), g.axes()),
            Err(_) => return false,
        };
        if handle == HandleType::NoHandle {
            return false;
        }
        let Ok(initial_transform) = geometry.try_borrow().map(|g| g.index_to_world()) else {
            return false;
        };
        log::debug!("{}: Zug an {:?} gestartet", ctx.machine_type(), handle);
        self.drag = Some(GizmoDrag {
            handle,
            initial_transform,
            center,
            axes,
            pick_point: position,
        });
        true
    }

    fn drag(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(drag) = self.drag else {
            return false;
        };
        let Some(geometry) = upgrade_target(&self.geometry, ctx) else {
            return false;
        };
        let Some(delta) = drag.delta_transform(position) else {
            return false;
        };
        let actor: SharedActor = geometry;
        execute(&actor, &Operation::transform(delta * drag.initial_transform))
    }

    /// Legt einen Undo-Schritt von der End- zurück zur Starttransformation ab.
    fn finish_drag(&mut self, _: &Action, _: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(drag) = self.drag.take() else {
            return true;
        };
        let Some(geometry) = upgrade_target(&self.geometry, ctx) else {
            return false;
        };
        let Ok(current) = geometry.try_borrow().map(|g| g.index_to_world()) else {
            return false;
        };
        if current == drag.initial_transform {
            return true;
        }
        let actor: SharedActor = geometry;
        record(
            &actor,
            Operation::transform(current),
            Operation::transform(drag.initial_transform),
            "Gizmo-Transformation",
            ctx,
        );
        true
    }
}

impl Behavior for GizmoInteraction {
    const NAME: &'static str = "GizmoInteraction";

    fn action_table() -> ActionTable<Self> {
        ActionTable::new()
            .layer(
                "GizmoInteraction",
                &[
                    (ActionId::CHECK_GIZMO_HANDLE, Self::check_handle),
                    (ActionId::START_GIZMO_DRAG, Self::start_drag),
                    (ActionId::GIZMO_DRAG, Self::drag),
                    (ActionId::FINISH_GIZMO_DRAG, Self::finish_drag),
                ],
            )
            .with_base_layer()
    }

    /// Volle Bewertung über einem Handle.
    fn can_handle_event(&self, state_event: &StateEvent, machine_score: f32) -> f32 {
        if machine_score <= 0.0 {
            return machine_score;
        }
        if self.drag.is_some() {
            return 1.0;
        }
        match state_event.world_position() {
            Some(position) if self.handle_at(position) != HandleType::NoHandle => 1.0,
            _ => machine_score,
        }
    }

    fn on_deactivated(&mut self) {
        self.hovered = HandleType::NoHandle;
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn drag_with(handle: HandleType) -> GizmoDrag {
        GizmoDrag {
            handle,
            initial_transform: DAffine3::IDENTITY,
            center: DVec3::ZERO,
            axes: [DVec3::X, DVec3::Y, DVec3::Z],
            pick_point: DVec3::new(4.0, 0.0, 0.0),
        }
    }

    #[test]
    fn test_axis_move_ignores_off_axis_component() {
        let delta = drag_with(HandleType::MoveAlongAxisX)
            .delta_transform(DVec3::new(6.0, 3.0, -1.0))
            .expect("Transformation");
        assert_eq!(delta.translation, DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(delta.matrix3, DMat3::IDENTITY);
    }

    #[test]
    fn test_rotation_uses_angle_between_pick_vectors() {
        let delta = drag_with(HandleType::RotateAroundAxisZ)
            .delta_transform(DVec3::new(0.0, 4.0, 0.0))
            .expect("Transformation");
        let moved = delta.transform_point3(DVec3::X);
        assert_relative_eq!(moved.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(moved.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_only_along_axis() {
        let delta = drag_with(HandleType::ScaleX)
            .delta_transform(DVec3::new(8.0, 5.0, 0.0))
            .expect("Transformation");
        let p = delta.transform_point3(DVec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_through_center_is_rejected() {
        let drag = drag_with(HandleType::ScaleY);
        let drag = GizmoDrag {
            pick_point: DVec3::new(0.0, 2.0, 0.0),
            ..drag
        };
        assert!(drag.delta_transform(DVec3::new(0.0, -1.0, 0.0)).is_none());
        assert!(drag_with(HandleType::NoHandle).delta_transform(DVec3::ZERO).is_none());
    }
}

//! Drehen mehrerer Schichtebenen um die Achse der aktiven Ansicht.
//!
//! Der Benutzer greift in einer Ansicht die Schnittlinie einer anderen Ebene
//! und zieht sie herum. Alle übrigen Ebenen drehen sich um die Normale der
//! Ansicht, durch den gemeinsamen Schnittpunkt.

use super::slices_coordinator::SlicesCoordinator;
use crate::core::{distance_to_line, PlaneGeometry, SliceNavigationController, WorldGeometry};
use crate::interaction::{
    Action, ActionContext, ActionId, ActionTable, Behavior, RendererId, StateEvent,
};
use crate::interactors::post_answer;
use crate::shared::options::ROTATION_PICK_DISTANCE;
use crate::undo::{ActorId, Operation, OperationEvent, SharedActor};
use glam::DVec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Mindestlänge des Hebels um das Zentrum
const MIN_LEVER: f64 = 1e-6;

/// Laufende Drehung.
struct RotationGesture {
    center: DVec3,
    axis: DVec3,
    last_vector: DVec3,
    /// Summe aller angewendeten Teilwinkel (Grad)
    net_angle: f64,
    targets: Vec<(ActorId, Weak<RefCell<SliceNavigationController>>)>,
}

/// Verhalten zum koordinierten Drehen der registrierten Schichten.
pub struct SlicesRotator {
    coordinator: SlicesCoordinator,
    pick_distance: f64,
    gesture: Option<RotationGesture>,
}

impl Default for SlicesRotator {
    fn default() -> Self {
        Self::new(SlicesCoordinator::new())
    }
}

impl SlicesRotator {
    pub fn new(coordinator: SlicesCoordinator) -> Self {
        Self {
            coordinator,
            pick_distance: ROTATION_PICK_DISTANCE,
            gesture: None,
        }
    }

    pub fn with_pick_distance(mut self, distance: f64) -> Self {
        self.pick_distance = distance;
        self
    }

    pub fn coordinator(&self) -> &SlicesCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut SlicesCoordinator {
        &mut self.coordinator
    }

    pub fn is_rotating(&self) -> bool {
        self.gesture.is_some()
    }

    /// Ebene der sendenden Ansicht und die Ebenen aller anderen Controller.
    fn planes_for(
        &mut self,
        renderer: RendererId,
    ) -> Option<(PlaneGeometry, Vec<(Rc<RefCell<SliceNavigationController>>, PlaneGeometry)>)> {
        let mut own = None;
        let mut others = Vec::new();
        for controller in self.coordinator.controllers() {
            let Ok(c) = controller.try_borrow() else {
                continue;
            };
            let Some(plane) = c.current_plane() else {
                continue;
            };
            if c.renderer() == renderer {
                own = Some(plane);
            } else {
                drop(c);
                others.push((controller, plane));
            }
        }
        Some((own?, others))
    }

    /// Gemeinsamer Drehpunkt: Schnittpunkt der Ebenen, bei nur zwei Ebenen der
    /// Lotfußpunkt auf der Schnittgeraden.
    fn rotation_center(own: &PlaneGeometry, others: &[PlaneGeometry], cursor: DVec3) -> Option<DVec3> {
        for (i, a) in others.iter().enumerate() {
            for b in &others[i + 1..] {
                if let Some(point) = PlaneGeometry::intersection_point(own, a, b) {
                    return Some(point);
                }
            }
        }
        let (point, direction) = others.iter().find_map(|p| own.intersection_line(p))?;
        Some(point + direction * (cursor - point).dot(direction))
    }

    /// Vektor vom Zentrum zum Cursor, projiziert in die Drehebene.
    fn lever(center: DVec3, axis: DVec3, position: DVec3) -> DVec3 {
        let v = position - center;
        v - axis * v.dot(axis)
    }

    /// Postet `YES`, wenn der Cursor auf einer Schnittlinie einer anderen Ebene liegt.
    fn check_point(&mut self, action: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let (Some(position), Some(sender)) = (state_event.world_position(), state_event.sender()) else {
            return false;
        };
        let pick_distance = action.float_property("precision").unwrap_or(self.pick_distance);
        let hit = match self.planes_for(sender.renderer) {
            Some((own, others)) => others.iter().any(|(_, plane)| {
                own.intersection_line(plane)
                    .map(|(point, direction)| distance_to_line(position, point, direction) <= pick_distance)
                    .unwrap_or(false)
            }),
            None => false,
        };
        post_answer(ctx, hit);
        true
    }

    fn rotate_start(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let (Some(position), Some(sender)) = (state_event.world_position(), state_event.sender()) else {
            return false;
        };
        let Some((own, others)) = self.planes_for(sender.renderer) else {
            log::debug!("{}: keine Ansicht für {:?} registriert", ctx.machine_type(), sender.renderer);
            return false;
        };
        let planes: Vec<PlaneGeometry> = others.iter().map(|(_, p)| *p).collect();
        let Some(center) = Self::rotation_center(&own, &planes, position) else {
            return false;
        };
        let axis = own.normal();
        let last_vector = Self::lever(center, axis, position);
        if others.is_empty() || last_vector.length() < MIN_LEVER {
            return false;
        }
        let targets = others
            .iter()
            .filter_map(|(c, _)| Some((c.try_borrow().ok()?.id(), Rc::downgrade(c))))
            .collect();
        self.gesture = Some(RotationGesture {
            center,
            axis,
            last_vector,
            net_angle: 0.0,
            targets,
        });
        true
    }

    /// Ein Drehschritt. Erst werden alle neuen Geometrien berechnet; schlägt
    /// eine fehl, bleibt jeder Controller unverändert.
    fn rotate(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(gesture) = self.gesture.as_mut() else {
            return false;
        };
        let vector = Self::lever(gesture.center, gesture.axis, position);
        if vector.length() < MIN_LEVER {
            return true;
        }
        let from = gesture.last_vector;
        let angle = gesture
            .axis
            .dot(from.cross(vector))
            .atan2(from.dot(vector))
            .to_degrees();
        if angle.abs() < f64::EPSILON {
            return true;
        }

        let mut staged: Vec<(Rc<RefCell<SliceNavigationController>>, WorldGeometry)> = Vec::new();
        for (id, weak) in &gesture.targets {
            let Some(controller) = weak.upgrade() else {
                log::warn!("{}: Controller {:?} nicht mehr vorhanden", ctx.machine_type(), id);
                return false;
            };
            let world = match controller.try_borrow() {
                Ok(c) if c.is_manageable() => {
                    c.world_geometry().rotated(gesture.center, gesture.axis, angle)
                }
                _ => None,
            };
            let Some(world) = world else {
                log::warn!("{}: Controller {:?} nicht drehbar", ctx.machine_type(), id);
                return false;
            };
            staged.push((controller, world));
        }
        if staged.iter().any(|(c, _)| c.try_borrow_mut().is_err()) {
            return false;
        }

        for (controller, world) in staged {
            if let Ok(mut c) = controller.try_borrow_mut() {
                c.set_world_geometry(world);
            }
        }
        gesture.last_vector = vector;
        gesture.net_angle += angle;
        true
    }

    /// Schließt die Drehung ab: ein Undo-Schritt mit dem Nettowinkel je Controller.
    fn rotate_end(&mut self, _: &Action, _: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return true;
        };
        if gesture.net_angle.abs() < f64::EPSILON || !ctx.undo_enabled() {
            return true;
        }
        let events: Vec<OperationEvent> = gesture
            .targets
            .iter()
            .filter_map(|(id, weak)| {
                let actor: SharedActor = weak.upgrade()?;
                let do_op = Operation::rotation(gesture.center, gesture.axis, gesture.net_angle);
                let undo_op = Operation::rotation(gesture.center, gesture.axis, -gesture.net_angle);
                Some(
                    OperationEvent::with_actor_id(Rc::downgrade(&actor), *id, do_op, undo_op)
                        .with_description("Schichten drehen"),
                )
            })
            .collect();
        if events.is_empty() {
            return false;
        }
        ctx.push_undo_group(events);
        true
    }
}

impl Behavior for SlicesRotator {
    const NAME: &'static str = "SlicesRotator";

    fn action_table() -> ActionTable<Self> {
        ActionTable::new()
            .layer(
                "SlicesRotator",
                &[
                    (ActionId::CHECK_POINT, Self::check_point),
                    (ActionId::ROTATE_START, Self::rotate_start),
                    (ActionId::ROTATE, Self::rotate),
                    (ActionId::ROTATE_END, Self::rotate_end),
                ],
            )
            .with_base_layer()
    }

    /// Eine abgebrochene Drehung bleibt angewendet, nur ohne Undo-Eintrag.
    fn on_deactivated(&mut self) {
        self.gesture = None;
    }
}

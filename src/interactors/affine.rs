//! Verschieben, Drehen und Skalieren eines Objekts über seine `Geometry3D`.
//!
//! Zwischenschritte laufen ohne Undo; der Abschluss legt ein `ApplyTransform`
//! von der Start- zur Endtransformation ab.

use super::{execute, post_answer, record, upgrade_target};
use crate::core::Geometry3D;
use crate::interaction::{Action, ActionContext, ActionId, ActionTable, Behavior, StateEvent};
use crate::undo::{Operation, OperationKind, OperationPayload, SharedActor};
use glam::{DAffine3, DVec3};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Kleinster Abstand zum Zentrum, ab dem Drehen/Skalieren berechnet wird
const MIN_LEVER: f64 = 1e-6;

/// Verhalten für eine gebundene `Geometry3D`.
pub struct AffineInteraction {
    geometry: Weak<RefCell<Geometry3D>>,
    initial_transform: Option<DAffine3>,
    center: DVec3,
    last_position: DVec3,
}

impl AffineInteraction {
    pub fn new(geometry: &Rc<RefCell<Geometry3D>>) -> Self {
        Self {
            geometry: Rc::downgrade(geometry),
            initial_transform: None,
            center: DVec3::ZERO,
            last_position: DVec3::ZERO,
        }
    }

    fn target(&self, ctx: &ActionContext<'_>) -> Option<(Rc<RefCell<Geometry3D>>, SharedActor)> {
        let geometry = upgrade_target(&self.geometry, ctx)?;
        let actor: SharedActor = geometry.clone();
        Some((geometry, actor))
    }

    fn check_object(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(geometry) = upgrade_target(&self.geometry, ctx) else {
            return false;
        };
        let inside = geometry
            .try_borrow()
            .map(|g| g.is_inside(position))
            .unwrap_or(false);
        post_answer(ctx, inside);
        true
    }

    /// Gemeinsamer Start für Verschieben, Drehen und Skalieren.
    fn start(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(geometry) = upgrade_target(&self.geometry, ctx) else {
            return false;
        };
        let Ok(geometry) = geometry.try_borrow() else {
            return false;
        };
        self.initial_transform = Some(geometry.index_to_world());
        self.center = geometry.center();
        self.last_position = position;
        true
    }

    fn translate(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some((_, actor)) = self.target(ctx) else {
            return false;
        };
        let delta = position - self.last_position;
        self.last_position = position;
        self.center += delta;
        execute(&actor, &Operation::translation(delta))
    }

    fn rotate(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some((_, actor)) = self.target(ctx) else {
            return false;
        };
        let from = self.last_position - self.center;
        let to = position - self.center;
        self.last_position = position;
        let axis = from.cross(to);
        if from.length() < MIN_LEVER || to.length() < MIN_LEVER || axis.length() < MIN_LEVER {
            return true;
        }
        let angle = from.angle_between(to).to_degrees();
        execute(&actor, &Operation::rotation(self.center, axis, angle))
    }

    fn scale(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some((_, actor)) = self.target(ctx) else {
            return false;
        };
        let before = (self.last_position - self.center).length();
        let after = (position - self.center).length();
        self.last_position = position;
        if before < MIN_LEVER || after < MIN_LEVER {
            return true;
        }
        let factor = after / before;
        let op = Operation::new(
            OperationKind::Scale,
            OperationPayload::Scale {
                center: self.center,
                factors: DVec3::splat(factor),
            },
        );
        execute(&actor, &op)
    }

    fn finish_transform(&mut self, _: &Action, _: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(initial) = self.initial_transform.take() else {
            return true;
        };
        let Some((geometry, actor)) = self.target(ctx) else {
            return false;
        };
        let Ok(current) = geometry.try_borrow().map(|g| g.index_to_world()) else {
            return false;
        };
        if current == initial {
            return true;
        }
        record(
            &actor,
            Operation::transform(current),
            Operation::transform(initial),
            "Objekt transformieren",
            ctx,
        );
        true
    }
}

impl Behavior for AffineInteraction {
    const NAME: &'static str = "AffineInteraction";

    fn action_table() -> ActionTable<Self> {
        ActionTable::new()
            .layer(
                "AffineInteraction",
                &[
                    (ActionId::CHECK_OBJECT, Self::check_object),
                    (ActionId::TRANSLATE_START, Self::start),
                    (ActionId::TRANSLATE, Self::translate),
                    (ActionId::ROTATE_START, Self::start),
                    (ActionId::ROTATE, Self::rotate),
                    (ActionId::SCALE_START, Self::start),
                    (ActionId::SCALE, Self::scale),
                    (ActionId::FINISH_TRANSFORM, Self::finish_transform),
                    (ActionId::ROTATE_END, Self::finish_transform),
                ],
            )
            .with_base_layer()
    }

    /// Volle Bewertung, wenn der Cursor im Objekt liegt und die Machine das Event kennt.
    fn can_handle_event(&self, state_event: &StateEvent, machine_score: f32) -> f32 {
        if machine_score <= 0.0 {
            return machine_score;
        }
        let inside = match (state_event.world_position(), self.geometry.upgrade()) {
            (Some(position), Some(geometry)) => geometry
                .try_borrow()
                .map(|g| g.is_inside(position))
                .unwrap_or(false),
            _ => false,
        };
        if inside {
            1.0
        } else {
            machine_score
        }
    }

    /// Eine abgebrochene Geste bleibt angewendet, es wird nur der Startwert vergessen.
    fn on_deactivated(&mut self) {
        self.initial_transform = None;
        self.center = DVec3::ZERO;
        self.last_position = DVec3::ZERO;
    }
}

//! Hover und Selektion einzelner Fasern eines Faserbündels.

use super::{execute_group, post_answer, upgrade_target};
use crate::core::FiberBundle;
use crate::interaction::{Action, ActionContext, ActionId, ActionTable, Behavior, StateEvent};
use crate::shared::options::FIBER_PICK_TOLERANCE;
use crate::undo::{Operation, OperationKind, SharedActor};
use glam::DVec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub struct FiberBundleInteraction {
    bundle: Weak<RefCell<FiberBundle>>,
    tolerance: f64,
    picked: Option<usize>,
}

impl FiberBundleInteraction {
    pub fn new(bundle: &Rc<RefCell<FiberBundle>>) -> Self {
        Self {
            bundle: Rc::downgrade(bundle),
            tolerance: FIBER_PICK_TOLERANCE,
            picked: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Aktualisiert die Hover-Markierung und postet `YES`/`NO`.
    fn check_hovering(&mut self, action: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(bundle) = upgrade_target(&self.bundle, ctx) else {
            return false;
        };
        let Ok(mut bundle) = bundle.try_borrow_mut() else {
            return false;
        };
        let tolerance = action.float_property("tolerance").unwrap_or(self.tolerance);
        self.picked = bundle.pick_fiber(position, tolerance);
        bundle.set_hovered(self.picked);
        post_answer(ctx, self.picked.is_some());
        true
    }

    fn select_picked(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(bundle) = upgrade_target(&self.bundle, ctx) else {
            return false;
        };
        let fiber = {
            let Ok(b) = bundle.try_borrow() else {
                return false;
            };
            let fiber = self.picked.or_else(|| {
                state_event
                    .world_position()
                    .and_then(|p| b.pick_fiber(p, self.tolerance))
            });
            match fiber {
                Some(f) if b.is_selected(f) => return true,
                Some(f) => f,
                None => return false,
            }
        };
        let actor: SharedActor = bundle;
        execute_group(
            &actor,
            vec![(
                Operation::point(OperationKind::Select, DVec3::ZERO, fiber),
                Operation::point(OperationKind::Deselect, DVec3::ZERO, fiber),
            )],
            "Faser selektieren",
            ctx,
        )
    }

    fn deselect_object(&mut self, _: &Action, _: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(bundle) = upgrade_target(&self.bundle, ctx) else {
            return false;
        };
        let pairs: Vec<(Operation, Operation)> = match bundle.try_borrow() {
            Ok(b) => b
                .selected_fibers()
                .into_iter()
                .map(|f| {
                    (
                        Operation::point(OperationKind::Deselect, DVec3::ZERO, f),
                        Operation::point(OperationKind::Select, DVec3::ZERO, f),
                    )
                })
                .collect(),
            Err(_) => return false,
        };
        self.picked = None;
        let actor: SharedActor = bundle;
        execute_group(&actor, pairs, "Faserselektion aufheben", ctx)
    }
}

impl Behavior for FiberBundleInteraction {
    const NAME: &'static str = "FiberBundleInteraction";

    fn action_table() -> ActionTable<Self> {
        ActionTable::new()
            .layer(
                "FiberBundleInteraction",
                &[
                    (ActionId::CHECK_HOVERING, Self::check_hovering),
                    (ActionId::SELECT_PICKED_OBJECT, Self::select_picked),
                    (ActionId::DESELECT_OBJECT, Self::deselect_object),
                ],
            )
            .with_base_layer()
    }

    fn on_deactivated(&mut self) {
        self.picked = None;
        if let Some(bundle) = self.bundle.upgrade() {
            if let Ok(mut bundle) = bundle.try_borrow_mut() {
                bundle.set_hovered(None);
            }
        }
    }
}

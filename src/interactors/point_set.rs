//! Punkte setzen, selektieren, verschieben und löschen.
//!
//! Jede sichtbare Änderung landet als Undo-Schritt im Controller. Während einer
//! Bewegung werden nur Zwischenschritte ausgeführt; `AcFINISHMOVEMENT` legt einen
//! gemeinsamen Schritt von den Startpositionen zu den Endpositionen ab.

use super::{execute, execute_group, post_answer, upgrade_target};
use crate::core::PointSet;
use crate::interaction::{Action, ActionContext, ActionId, ActionTable, Behavior, StateEvent};
use crate::shared::options::POINT_PICK_PRECISION;
use crate::undo::{Operation, OperationKind, SharedActor};
use glam::DVec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Verhalten für eine gebundene `PointSet`.
pub struct PointSetInteraction {
    point_set: Weak<RefCell<PointSet>>,
    precision: f64,
    /// Punkt aus der letzten Prüfung samt Cursorposition, an der er gefunden wurde
    picked: Option<(usize, DVec3)>,
    last_position: DVec3,
    /// Startpositionen der bewegten Punkte
    moving: Vec<(usize, DVec3)>,
}

impl PointSetInteraction {
    pub fn new(point_set: &Rc<RefCell<PointSet>>) -> Self {
        Self {
            point_set: Rc::downgrade(point_set),
            precision: POINT_PICK_PRECISION,
            picked: None,
            last_position: DVec3::ZERO,
            moving: Vec::new(),
        }
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    fn target(&self, ctx: &ActionContext<'_>) -> Option<(Rc<RefCell<PointSet>>, SharedActor)> {
        let set = upgrade_target(&self.point_set, ctx)?;
        let actor: SharedActor = set.clone();
        Some((set, actor))
    }

    /// Punkt, auf den sich das Event bezieht. Das Ergebnis der letzten Prüfung
    /// gilt nur für dieselbe Cursorposition, sonst wird neu gesucht.
    fn resolve_index(&self, set: &PointSet, state_event: &StateEvent) -> Option<usize> {
        match (state_event.world_position(), self.picked) {
            (Some(position), Some((index, at))) if at == position => Some(index),
            (Some(position), _) => set.search_point(position, self.precision),
            (None, picked) => picked.map(|(index, _)| index),
        }
    }

    /// Paare zum Abwählen aller selektierten Punkte außer `keep`.
    fn deselect_pairs(set: &PointSet, keep: Option<usize>) -> Vec<(Operation, Operation)> {
        set.selected_indices()
            .into_iter()
            .filter(|i| Some(*i) != keep)
            .filter_map(|i| {
                let position = set.point(i)?;
                Some((
                    Operation::point(OperationKind::Deselect, position, i),
                    Operation::point(OperationKind::Select, position, i),
                ))
            })
            .collect()
    }

    fn add_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let (mut pairs, index) = {
            let Ok(set) = set.try_borrow() else {
                return false;
            };
            (Self::deselect_pairs(&set, None), set.len())
        };
        let time = state_event.time_ms();
        pairs.push((
            Operation::point(OperationKind::Add, position, index).with_time(time),
            Operation::point(OperationKind::Delete, position, index).with_time(time),
        ));
        pairs.push((
            Operation::point(OperationKind::Select, position, index),
            Operation::point(OperationKind::Deselect, position, index),
        ));
        self.picked = Some((index, position));
        execute_group(&actor, pairs, "Punkt hinzufügen", ctx)
    }

    /// Postet `YES`, wenn ein Punkt innerhalb der Präzision liegt, sonst `NO`.
    fn check_point(&mut self, action: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(set) = upgrade_target(&self.point_set, ctx) else {
            return false;
        };
        let precision = action.float_property("precision").unwrap_or(self.precision);
        self.picked = set
            .try_borrow()
            .ok()
            .and_then(|s| s.search_point(position, precision))
            .map(|index| (index, position));
        post_answer(ctx, self.picked.is_some());
        true
    }

    fn select_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let pairs = {
            let Ok(set) = set.try_borrow() else {
                return false;
            };
            let index = self.resolve_index(&set, state_event);
            self.picked = None;
            let Some(index) = index else {
                return false;
            };
            let Some(position) = set.point(index) else {
                return false;
            };
            let mut pairs = Self::deselect_pairs(&set, Some(index));
            if !set.is_selected(index) {
                pairs.push((
                    Operation::point(OperationKind::Select, position, index),
                    Operation::point(OperationKind::Deselect, position, index),
                ));
            }
            pairs
        };
        execute_group(&actor, pairs, "Punkt selektieren", ctx)
    }

    /// Hebt die Selektion des Punkts unter dem Cursor auf.
    fn deselect_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let pairs = {
            let Ok(set) = set.try_borrow() else {
                return false;
            };
            let Some(index) = self.resolve_index(&set, state_event) else {
                return false;
            };
            match set.point(index) {
                Some(position) if set.is_selected(index) => vec![(
                    Operation::point(OperationKind::Deselect, position, index),
                    Operation::point(OperationKind::Select, position, index),
                )],
                Some(_) => Vec::new(),
                None => return false,
            }
        };
        self.picked = None;
        execute_group(&actor, pairs, "Punkt deselektieren", ctx)
    }

    fn deselect_all(&mut self, _: &Action, _: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let pairs = match set.try_borrow() {
            Ok(set) => Self::deselect_pairs(&set, None),
            Err(_) => return false,
        };
        self.picked = None;
        execute_group(&actor, pairs, "Selektion aufheben", ctx)
    }

    fn init_movement(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some(set) = upgrade_target(&self.point_set, ctx) else {
            return false;
        };
        let Ok(set) = set.try_borrow() else {
            return false;
        };
        self.last_position = position;
        self.moving = set
            .selected_indices()
            .into_iter()
            .filter_map(|i| set.point(i).map(|p| (i, p)))
            .collect();
        true
    }

    fn move_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some(position) = state_event.world_position() else {
            return false;
        };
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let delta = position - self.last_position;
        self.last_position = position;
        let moves: Vec<Operation> = {
            let Ok(set) = set.try_borrow() else {
                return false;
            };
            self.moving
                .iter()
                .filter_map(|(i, _)| {
                    let current = set.point(*i)?;
                    Some(Operation::point(OperationKind::Move, current + delta, *i))
                })
                .collect()
        };
        moves.iter().all(|op| execute(&actor, op))
    }

    fn finish_movement(
        &mut self,
        _: &Action,
        state_event: &StateEvent,
        ctx: &mut ActionContext<'_>,
    ) -> bool {
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let moving = std::mem::take(&mut self.moving);
        self.picked = None;
        let time = state_event.time_ms();
        let mut pairs: Vec<(Operation, Operation)> = {
            let Ok(set) = set.try_borrow() else {
                return false;
            };
            moving
                .iter()
                .filter_map(|(i, start)| {
                    let end = set.point(*i)?;
                    (end != *start).then(|| {
                        (
                            Operation::point(OperationKind::Move, end, *i).with_time(time),
                            Operation::point(OperationKind::Move, *start, *i).with_time(time),
                        )
                    })
                })
                .collect()
        };
        if pairs.is_empty() {
            return true;
        }
        let last = pairs.len() - 1;
        let marker = pairs[last].0.point_position().unwrap_or_default();
        pairs.push((
            Operation::point(OperationKind::Terminate, marker, 0),
            Operation::point(OperationKind::Nothing, marker, 0),
        ));
        execute_group(&actor, pairs, "Punkte verschieben", ctx)
    }

    /// Löscht alle selektierten Punkte (absteigend, damit Indizes stabil bleiben).
    fn remove_point(&mut self, _: &Action, state_event: &StateEvent, ctx: &mut ActionContext<'_>) -> bool {
        let Some((set, actor)) = self.target(ctx) else {
            return false;
        };
        let pairs = {
            let Ok(set) = set.try_borrow() else {
                return false;
            };
            let mut indices = set.selected_indices();
            if indices.is_empty() {
                let hovered = state_event
                    .world_position()
                    .and_then(|p| set.search_point(p, self.precision));
                indices.extend(hovered);
            }
            let mut pairs = Vec::new();
            for i in indices.into_iter().rev() {
                let Some(position) = set.point(i) else {
                    continue;
                };
                if set.is_selected(i) {
                    pairs.push((
                        Operation::point(OperationKind::Deselect, position, i),
                        Operation::point(OperationKind::Select, position, i),
                    ));
                }
                pairs.push((
                    Operation::point(OperationKind::Delete, position, i),
                    Operation::point(OperationKind::Insert, position, i),
                ));
            }
            pairs
        };
        if pairs.is_empty() {
            return false;
        }
        self.picked = None;
        execute_group(&actor, pairs, "Punkte löschen", ctx)
    }
}

impl Behavior for PointSetInteraction {
    const NAME: &'static str = "PointSetInteraction";

    fn action_table() -> ActionTable<Self> {
        ActionTable::new()
            .layer(
                "PointSetInteraction",
                &[
                    (ActionId::ADD_POINT, Self::add_point),
                    (ActionId::CHECK_POINT, Self::check_point),
                    (ActionId::CHECK_ELEMENT, Self::check_point),
                    (ActionId::SELECT_POINT, Self::select_point),
                    (ActionId::DESELECT_POINT, Self::deselect_point),
                    (ActionId::DESELECT_ALL, Self::deselect_all),
                    (ActionId::INIT_MOVEMENT, Self::init_movement),
                    (ActionId::MOVE_POINT, Self::move_point),
                    (ActionId::FINISH_MOVEMENT, Self::finish_movement),
                    (ActionId::REMOVE_POINT, Self::remove_point),
                ],
            )
            .with_base_layer()
    }

    /// 1.0, wenn ein Punkt unter dem Cursor liegt und die Machine das Event kennt.
    fn can_handle_event(&self, state_event: &StateEvent, machine_score: f32) -> f32 {
        if machine_score <= 0.0 {
            return machine_score;
        }
        let hit = match (state_event.world_position(), self.point_set.upgrade()) {
            (Some(position), Some(set)) => set
                .try_borrow()
                .ok()
                .and_then(|s| s.search_point(position, self.precision))
                .is_some(),
            _ => false,
        };
        if hit {
            1.0
        } else {
            machine_score
        }
    }

    fn on_deactivated(&mut self) {
        self.picked = None;
        self.last_position = DVec3::ZERO;
        self.moving.clear();
    }
}

//! Geordnete Punktmenge mit Selektion, Ziel der Punkt-Interaktoren.

use super::spatial::PointIndex;
use crate::undo::{ActorId, Operation, OperationActor, OperationKind};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Einzelner Punkt der Menge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub position: DVec3,
    pub selected: bool,
}

/// Punktmenge; Positionen werden über den Listenindex angesprochen.
#[derive(Debug, Clone)]
pub struct PointSet {
    actor_id: ActorId,
    points: Vec<PointEntry>,
    index: PointIndex,
    /// Anzahl abgeschlossener Bewegungen (`Terminate`)
    terminated: usize,
}

impl Default for PointSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PointSet {
    pub fn new() -> Self {
        Self {
            actor_id: ActorId::next(),
            points: Vec::new(),
            index: PointIndex::empty(),
            terminated: 0,
        }
    }

    /// Erstellt eine Menge mit unselektierten Punkten.
    pub fn from_positions(positions: impl IntoIterator<Item = DVec3>) -> Self {
        let mut set = Self::new();
        set.points = positions
            .into_iter()
            .map(|position| PointEntry {
                position,
                selected: false,
            })
            .collect();
        set.rebuild_index();
        set
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<DVec3> {
        self.points.get(index).map(|p| p.position)
    }

    pub fn positions(&self) -> Vec<DVec3> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.points.get(index).is_some_and(|p| p.selected)
    }

    /// Indizes aller selektierten Punkte, aufsteigend.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.selected)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn terminated_count(&self) -> usize {
        self.terminated
    }

    /// Nächster Punkt innerhalb von `precision`.
    pub fn search_point(&self, position: DVec3, precision: f64) -> Option<usize> {
        self.index
            .nearest_within(position, precision)
            .map(|hit| hit.index)
    }

    fn rebuild_index(&mut self) {
        self.index = PointIndex::from_points(self.points.iter().map(|p| &p.position));
    }

    fn insert_at(&mut self, index: usize, position: DVec3) {
        let index = index.min(self.points.len());
        self.points.insert(
            index,
            PointEntry {
                position,
                selected: false,
            },
        );
        self.rebuild_index();
    }
}

impl OperationActor for PointSet {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn execute_operation(&mut self, operation: &Operation) {
        let index = operation.point_index();
        let position = operation.point_position();
        match (operation.kind, index, position) {
            (OperationKind::Add | OperationKind::Insert, Some(i), Some(pos)) => {
                self.insert_at(i, pos)
            }
            (OperationKind::Delete, Some(i), _) if i < self.points.len() => {
                self.points.remove(i);
                self.rebuild_index();
            }
            (OperationKind::Move, Some(i), Some(pos)) if i < self.points.len() => {
                self.points[i].position = pos;
                self.rebuild_index();
            }
            (OperationKind::Select, Some(i), _) if i < self.points.len() => {
                self.points[i].selected = true;
            }
            (OperationKind::Deselect, Some(i), _) if i < self.points.len() => {
                self.points[i].selected = false;
            }
            (OperationKind::DeselectAll, _, _) => {
                self.points.iter_mut().for_each(|p| p.selected = false);
            }
            (OperationKind::Terminate, _, _) => self.terminated += 1,
            _ => log::debug!(
                "PointSet: Operation {:?} (Index {:?}) ignoriert",
                operation.kind,
                index
            ),
        }
    }
}

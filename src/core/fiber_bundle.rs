//! Faserbündel: Polylinien mit Hover- und Selektionszustand.

use super::spatial::PointIndex;
use crate::undo::{ActorId, Operation, OperationActor, OperationKind};
use glam::DVec3;

/// Menge von Fasern (Polylinien). Picking erfolgt über die Stützpunkte.
#[derive(Debug, Clone)]
pub struct FiberBundle {
    actor_id: ActorId,
    fibers: Vec<Vec<DVec3>>,
    selected: Vec<bool>,
    hovered: Option<usize>,
    index: PointIndex,
    /// Faser je Eintrag im Index
    owner: Vec<usize>,
}

impl FiberBundle {
    pub fn new(fibers: Vec<Vec<DVec3>>) -> Self {
        let owner: Vec<usize> = fibers
            .iter()
            .enumerate()
            .flat_map(|(i, fiber)| std::iter::repeat(i).take(fiber.len()))
            .collect();
        let index = PointIndex::from_points(fibers.iter().flatten());
        Self {
            actor_id: ActorId::next(),
            selected: vec![false; fibers.len()],
            fibers,
            hovered: None,
            index,
            owner,
        }
    }

    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }

    pub fn fiber(&self, index: usize) -> Option<&[DVec3]> {
        self.fibers.get(index).map(Vec::as_slice)
    }

    /// Faser mit dem nächsten Stützpunkt innerhalb von `tolerance`.
    pub fn pick_fiber(&self, position: DVec3, tolerance: f64) -> Option<usize> {
        let hit = self.index.nearest_within(position, tolerance)?;
        self.owner.get(hit.index).copied()
    }

    pub fn is_selected(&self, fiber: usize) -> bool {
        self.selected.get(fiber).copied().unwrap_or(false)
    }

    pub fn selected_fibers(&self) -> Vec<usize> {
        (0..self.fibers.len())
            .filter(|i| self.selected[*i])
            .collect()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Hover-Markierung (nur Darstellung, nicht undo-fähig).
    pub fn set_hovered(&mut self, fiber: Option<usize>) {
        self.hovered = fiber.filter(|i| *i < self.fibers.len());
    }
}

impl OperationActor for FiberBundle {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn execute_operation(&mut self, operation: &Operation) {
        match (operation.kind, operation.point_index()) {
            (OperationKind::Select, Some(i)) if i < self.fibers.len() => self.selected[i] = true,
            (OperationKind::Deselect, Some(i)) if i < self.fibers.len() => {
                self.selected[i] = false
            }
            (OperationKind::DeselectAll, _) => self.selected.iter_mut().for_each(|s| *s = false),
            _ => log::debug!("FiberBundle: Operation {:?} ignoriert", operation.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> FiberBundle {
        FiberBundle::new(vec![
            vec![DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)],
            vec![DVec3::new(0.0, 5.0, 0.0), DVec3::new(10.0, 5.0, 0.0)],
        ])
    }

    #[test]
    fn pick_respects_tolerance() {
        let b = bundle();
        assert_eq!(b.pick_fiber(DVec3::new(10.0, 4.5, 0.0), 1.0), Some(1));
        assert_eq!(b.pick_fiber(DVec3::new(5.0, 2.5, 0.0), 1.0), None);
    }

    #[test]
    fn select_and_deselect() {
        let mut b = bundle();
        b.execute_operation(&Operation::point(OperationKind::Select, DVec3::ZERO, 1));
        assert_eq!(b.selected_fibers(), vec![1]);
        b.execute_operation(&Operation::point(OperationKind::Deselect, DVec3::ZERO, 1));
        assert!(b.selected_fibers().is_empty());
    }
}

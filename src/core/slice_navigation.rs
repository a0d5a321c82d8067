//! Schicht-Navigation einer Ansicht.

use super::geometry::{PlaneGeometry, WorldGeometry};
use crate::interaction::RendererId;
use crate::undo::{ActorId, Operation, OperationActor, OperationKind, OperationPayload};
use glam::DVec3;

/// Navigiert eine Ansicht durch ihre Weltgeometrie.
///
/// `Move` wählt die Schicht, die dem Punkt am nächsten liegt; `Rotate` dreht
/// die Referenzebene um eine Achse durch das Zentrum.
#[derive(Debug, Clone)]
pub struct SliceNavigationController {
    actor_id: ActorId,
    renderer: RendererId,
    world: WorldGeometry,
    current_slice: usize,
}

impl SliceNavigationController {
    pub fn new(renderer: RendererId, world: WorldGeometry) -> Self {
        Self {
            actor_id: ActorId::next(),
            renderer,
            world,
            current_slice: 0,
        }
    }

    /// Controller-Identität (gleichzeitig Actor-ID für Undo).
    pub fn id(&self) -> ActorId {
        self.actor_id
    }

    pub fn renderer(&self) -> RendererId {
        self.renderer
    }

    pub fn world_geometry(&self) -> &WorldGeometry {
        &self.world
    }

    pub fn set_world_geometry(&mut self, world: WorldGeometry) {
        self.world = world;
        let last = self.world.slice_count().saturating_sub(1);
        self.current_slice = self.current_slice.min(last);
    }

    pub fn current_slice(&self) -> usize {
        self.current_slice
    }

    pub fn set_current_slice(&mut self, slice: usize) -> bool {
        if slice >= self.world.slice_count() {
            return false;
        }
        self.current_slice = slice;
        true
    }

    /// Ebene der aktuellen Schicht.
    pub fn current_plane(&self) -> Option<PlaneGeometry> {
        self.world.plane(self.current_slice)
    }

    pub fn is_manageable(&self) -> bool {
        self.world.is_manageable()
    }

    /// Wählt die Schicht, die `point` am nächsten liegt.
    pub fn select_slice_by_point(&mut self, point: DVec3) -> bool {
        match self.world.nearest_slice(point) {
            Some(slice) => {
                self.current_slice = slice;
                true
            }
            None => false,
        }
    }

    /// Dreht die Referenzebene; ohne Wirkung bei nicht rotierbarer Geometrie.
    pub fn rotate(&mut self, center: DVec3, axis: DVec3, angle_deg: f64) -> bool {
        match self.world.rotated(center, axis, angle_deg) {
            Some(world) => {
                self.world = world;
                true
            }
            None => false,
        }
    }
}

impl OperationActor for SliceNavigationController {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn execute_operation(&mut self, operation: &Operation) {
        let done = match (operation.kind, &operation.payload) {
            (OperationKind::Move, OperationPayload::Point { position, .. }) => {
                self.select_slice_by_point(*position)
            }
            (
                OperationKind::Rotate,
                OperationPayload::Rotation {
                    center,
                    axis,
                    angle_deg,
                },
            ) => self.rotate(*center, *axis, *angle_deg),
            _ => false,
        };
        if !done {
            log::debug!(
                "SliceNavigationController {:?}: Operation {:?} ohne Wirkung",
                self.renderer,
                operation.kind
            );
        }
    }
}

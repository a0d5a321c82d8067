//! Gizmo-Manipulator: folgt der Geometrie eines Objekts und übersetzt
//! Ziehbewegungen an seinen Handles in affine Transformationen.
//!
//! Der Gizmo hält keine Referenz auf das Objekt. `follow_geometry` abonniert
//! die Änderungen der `Geometry3D`; das zurückgegebene `GeometrySubscription`
//! löst das Abonnement beim Drop wieder.

pub mod interaction;
pub mod mesh;

pub use interaction::GizmoInteraction;
pub use mesh::{GizmoMesh, GizmoVertex, HandleType};

use crate::core::{normalized_axes, Geometry3D, SubscriptionToken};
use crate::shared::options::GIZMO_HANDLE_TOLERANCE;
use crate::shared::GizmoAllowOptions;
use anyhow::{bail, Result};
use glam::DVec3;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Zustand und Darstellung eines Gizmos.
#[derive(Debug, Clone)]
pub struct Gizmo {
    center: DVec3,
    axes: [DVec3; 3],
    radius: DVec3,
    allow: GizmoAllowOptions,
    /// Relativ zum längsten Radius
    handle_tolerance: f64,
    mesh: GizmoMesh,
}

impl Default for Gizmo {
    fn default() -> Self {
        Self::new(GizmoAllowOptions::default())
    }
}

impl Gizmo {
    /// Einheits-Gizmo im Ursprung.
    pub fn new(allow: GizmoAllowOptions) -> Self {
        let mut gizmo = Self {
            center: DVec3::ZERO,
            axes: [DVec3::X, DVec3::Y, DVec3::Z],
            radius: DVec3::ONE,
            allow,
            handle_tolerance: GIZMO_HANDLE_TOLERANCE,
            mesh: GizmoMesh::default(),
        };
        gizmo.update_representation();
        gizmo
    }

    /// Gizmo passend zu einer Geometrie.
    pub fn for_geometry(geometry: &Geometry3D, allow: GizmoAllowOptions) -> Self {
        let mut gizmo = Self::new(allow);
        gizmo.update_from_geometry(geometry);
        gizmo
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn axes(&self) -> [DVec3; 3] {
        self.axes
    }

    pub fn axis(&self, index: usize) -> DVec3 {
        self.axes[index.min(2)]
    }

    pub fn radius(&self) -> DVec3 {
        self.radius
    }

    pub fn longest_radius(&self) -> f64 {
        self.radius.max_element()
    }

    pub fn allow(&self) -> GizmoAllowOptions {
        self.allow
    }

    pub fn set_allow(&mut self, allow: GizmoAllowOptions) {
        self.allow = allow;
        self.update_representation();
    }

    pub fn set_handle_tolerance(&mut self, tolerance: f64) {
        self.handle_tolerance = tolerance;
    }

    pub fn mesh(&self) -> &GizmoMesh {
        &self.mesh
    }

    /// Übernimmt Zentrum, Achsen und Radien aus der Geometrie.
    pub fn update_from_geometry(&mut self, geometry: &Geometry3D) {
        self.center = geometry.center();
        self.axes = normalized_axes(geometry.index_to_world().matrix3);
        self.radius = DVec3::new(
            geometry.extent_in_mm(0),
            geometry.extent_in_mm(1),
            geometry.extent_in_mm(2),
        ) * 0.5;
        self.update_representation();
    }

    /// Baut das Mesh aus dem aktuellen Zustand neu.
    pub fn update_representation(&mut self) {
        self.mesh = GizmoMesh::build(self.center, self.axes, self.radius, &self.allow);
    }

    /// Handle unter `point`; die Toleranz skaliert mit dem längsten Radius.
    pub fn handle_at(&self, point: DVec3) -> HandleType {
        let tolerance = self.handle_tolerance * self.longest_radius();
        self.mesh.handle_at(point, tolerance)
    }

    /// Lässt `gizmo` jeder Änderung von `geometry` synchron folgen.
    pub fn follow_geometry(
        gizmo: &Rc<RefCell<Gizmo>>,
        geometry: &Rc<RefCell<Geometry3D>>,
    ) -> Result<GeometrySubscription> {
        let Ok(mut target) = geometry.try_borrow_mut() else {
            bail!("Geometrie ist belegt, Gizmo kann nicht folgen");
        };
        match gizmo.try_borrow_mut() {
            Ok(mut g) => g.update_from_geometry(&target),
            Err(_) => bail!("Gizmo ist belegt"),
        }
        let weak_gizmo = Rc::downgrade(gizmo);
        let token = target.subscribe(move |geometry: &Geometry3D| {
            let Some(gizmo) = weak_gizmo.upgrade() else {
                return;
            };
            match gizmo.try_borrow_mut() {
                Ok(mut gizmo) => gizmo.update_from_geometry(geometry),
                Err(_) => log::warn!("Gizmo belegt, Geometrie-Änderung nicht übernommen"),
            };
        });
        Ok(GeometrySubscription {
            geometry: Rc::downgrade(geometry),
            token: Some(token),
        })
    }

    /// Erstellt einen Gizmo für `geometry` und lässt ihn folgen.
    ///
    /// Entfernen = Gizmo und Abonnement fallen lassen.
    pub fn attach_to(
        geometry: &Rc<RefCell<Geometry3D>>,
        allow: GizmoAllowOptions,
    ) -> Result<(Rc<RefCell<Gizmo>>, GeometrySubscription)> {
        let gizmo = Rc::new(RefCell::new(Gizmo::new(allow)));
        let subscription = Self::follow_geometry(&gizmo, geometry)?;
        log::debug!("Gizmo an Geometrie angehängt");
        Ok((gizmo, subscription))
    }
}

// ── Abonnement ───────────────────────────────────────────────────

/// Löst das Abonnement an der Geometrie, sobald es fallen gelassen wird.
#[derive(Debug)]
pub struct GeometrySubscription {
    geometry: Weak<RefCell<Geometry3D>>,
    token: Option<SubscriptionToken>,
}

impl GeometrySubscription {
    pub fn is_active(&self) -> bool {
        self.token.is_some() && self.geometry.strong_count() > 0
    }

    /// Löst das Abonnement sofort.
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let Some(geometry) = self.geometry.upgrade() else {
            return;
        };
        match geometry.try_borrow_mut() {
            Ok(mut geometry) => {
                geometry.unsubscribe(token);
            }
            Err(_) => log::warn!("Geometrie belegt, Abonnement {:?} bleibt bestehen", token),
        };
    }
}

impl Drop for GeometrySubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::{Operation, OperationActor};
    use approx::assert_relative_eq;

    fn box_geometry() -> Rc<RefCell<Geometry3D>> {
        Rc::new(RefCell::new(Geometry3D::from_box(DVec3::ZERO, DVec3::splat(10.0))))
    }

    #[test]
    fn test_gizmo_follows_geometry_until_subscription_drops() {
        let geometry = box_geometry();
        let (gizmo, subscription) =
            Gizmo::attach_to(&geometry, GizmoAllowOptions::default()).expect("anhängbar");
        assert_relative_eq!(gizmo.borrow().center().x, 5.0);
        assert_relative_eq!(gizmo.borrow().longest_radius(), 5.0);

        geometry
            .borrow_mut()
            .execute_operation(&Operation::translation(DVec3::new(3.0, 0.0, 0.0)));
        assert_relative_eq!(gizmo.borrow().center().x, 8.0);
        assert_eq!(geometry.borrow().subscriber_count(), 1);

        drop(subscription);
        assert_eq!(geometry.borrow().subscriber_count(), 0);
        geometry
            .borrow_mut()
            .execute_operation(&Operation::translation(DVec3::new(3.0, 0.0, 0.0)));
        assert_relative_eq!(gizmo.borrow().center().x, 8.0);
    }

    #[test]
    fn test_dropped_gizmo_is_ignored_by_callback() {
        let geometry = box_geometry();
        let (gizmo, subscription) =
            Gizmo::attach_to(&geometry, GizmoAllowOptions::default()).expect("anhängbar");
        drop(gizmo);

        geometry
            .borrow_mut()
            .execute_operation(&Operation::translation(DVec3::X));
        assert!(subscription.is_active());
        subscription.detach();
        assert_eq!(geometry.borrow().subscriber_count(), 0);
    }

    #[test]
    fn test_handle_tolerance_scales_with_radius() {
        let geometry = Geometry3D::from_box(DVec3::ZERO, DVec3::splat(100.0));
        let gizmo = Gizmo::for_geometry(&geometry, GizmoAllowOptions::default());
        // 0.1 * 50 = 5 mm Fangradius
        assert_eq!(gizmo.handle_at(DVec3::new(50.0, 53.0, 50.0)), HandleType::MoveFreely);
        assert_eq!(gizmo.handle_at(DVec3::new(50.0, 58.0, 62.0)), HandleType::NoHandle);
    }
}

//! Vertex-Generierung für den Gizmo und Handle-Suche über die Vertex-Tags.
//!
//! Jeder Vertex trägt den Handle-Typ, zu dem er gehört. Die Suche nimmt den
//! nächsten Vertex innerhalb der Toleranz und liefert dessen Tag.

use crate::core::PointIndex;
use crate::shared::GizmoAllowOptions;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Segmente eines Rings
const RING_SEGMENTS: usize = 48;
/// Stützpunkte entlang eines Schafts
const SHAFT_SAMPLES: usize = 16;
/// Segmente des Kegelbodens
const CONE_SEGMENTS: usize = 8;
/// Breiten- und Längenkreise der Mittelkugel
const SPHERE_STACKS: usize = 4;
const SPHERE_SLICES: usize = 8;

/// Abstand der Skalierungskegel relativ zum Achsradius
const CONE_OFFSET: f64 = 1.1;
/// Kegelhöhe und -radius relativ zum längsten Radius
const CONE_LENGTH: f64 = 0.1;
const CONE_RADIUS: f64 = 0.04;
/// Kugelradius relativ zum längsten Radius
const SPHERE_RADIUS: f64 = 0.06;
/// Schaft beginnt außerhalb der Kugel
const SHAFT_START: f64 = 0.1;

/// Welcher Teil des Gizmos getroffen wurde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleType {
    NoHandle,
    MoveFreely,
    MoveAlongAxisX,
    MoveAlongAxisY,
    MoveAlongAxisZ,
    RotateAroundAxisX,
    RotateAroundAxisY,
    RotateAroundAxisZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl HandleType {
    pub fn move_along(axis: usize) -> Self {
        [Self::MoveAlongAxisX, Self::MoveAlongAxisY, Self::MoveAlongAxisZ][axis.min(2)]
    }

    pub fn rotate_around(axis: usize) -> Self {
        [
            Self::RotateAroundAxisX,
            Self::RotateAroundAxisY,
            Self::RotateAroundAxisZ,
        ][axis.min(2)]
    }

    pub fn scale(axis: usize) -> Self {
        [Self::ScaleX, Self::ScaleY, Self::ScaleZ][axis.min(2)]
    }

    /// Achse (0 = X, 1 = Y, 2 = Z), falls der Handle an eine Achse gebunden ist.
    pub fn axis_index(self) -> Option<usize> {
        match self {
            Self::MoveAlongAxisX | Self::RotateAroundAxisX | Self::ScaleX => Some(0),
            Self::MoveAlongAxisY | Self::RotateAroundAxisY | Self::ScaleY => Some(1),
            Self::MoveAlongAxisZ | Self::RotateAroundAxisZ | Self::ScaleZ => Some(2),
            Self::NoHandle | Self::MoveFreely => None,
        }
    }
}

/// Ein Gizmo-Vertex mit seinem Handle-Tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoVertex {
    pub position: DVec3,
    pub handle: HandleType,
}

/// Punktwolke des Gizmos plus KD-Tree für die Handle-Suche.
#[derive(Debug, Clone, Default)]
pub struct GizmoMesh {
    vertices: Vec<GizmoVertex>,
    index: PointIndex,
}

impl GizmoMesh {
    /// Baut das Mesh deterministisch aus Zentrum, Achsen und Radien.
    pub fn build(
        center: DVec3,
        axes: [DVec3; 3],
        radius: DVec3,
        allow: &GizmoAllowOptions,
    ) -> Self {
        let longest = radius.max_element();
        let mut vertices = Vec::new();

        if allow.translation {
            push_sphere(&mut vertices, center, longest * SPHERE_RADIUS);
        }
        let rotation_allowed = [allow.rotation_x, allow.rotation_y, allow.rotation_z];
        for (i, axis) in axes.iter().enumerate() {
            if allow.translation {
                push_shaft(
                    &mut vertices,
                    center + *axis * (longest * SHAFT_START),
                    center + *axis * radius[i],
                    HandleType::move_along(i),
                );
            }
            if allow.scaling {
                for sign in [1.0, -1.0] {
                    let direction = *axis * sign;
                    push_cone(
                        &mut vertices,
                        center + direction * (radius[i] * CONE_OFFSET),
                        direction,
                        longest * CONE_LENGTH,
                        longest * CONE_RADIUS,
                        HandleType::scale(i),
                    );
                }
            }
            if rotation_allowed[i] {
                let u = axes[(i + 1) % 3];
                let v = axes[(i + 2) % 3];
                push_ring(&mut vertices, center, u, v, longest, HandleType::rotate_around(i));
            }
        }

        let index = PointIndex::from_points(vertices.iter().map(|v| &v.position));
        Self { vertices, index }
    }

    pub fn vertices(&self) -> &[GizmoVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Anzahl Vertices mit diesem Tag.
    pub fn count(&self, handle: HandleType) -> usize {
        self.vertices.iter().filter(|v| v.handle == handle).count()
    }

    /// Handle des nächsten Vertex innerhalb von `tolerance`, sonst `NoHandle`.
    pub fn handle_at(&self, point: DVec3, tolerance: f64) -> HandleType {
        self.index
            .nearest_within(point, tolerance)
            .and_then(|hit| self.vertices.get(hit.index))
            .map_or(HandleType::NoHandle, |v| v.handle)
    }
}

/// Orthonormale Basis senkrecht zu `direction`.
fn perpendicular_basis(direction: DVec3) -> (DVec3, DVec3) {
    let u = direction.any_orthonormal_vector();
    (u, direction.cross(u).normalize_or_zero())
}

fn push_shaft(vertices: &mut Vec<GizmoVertex>, start: DVec3, end: DVec3, handle: HandleType) {
    for s in 0..SHAFT_SAMPLES {
        let t = s as f64 / (SHAFT_SAMPLES - 1) as f64;
        vertices.push(GizmoVertex {
            position: start.lerp(end, t),
            handle,
        });
    }
}

/// Kegel mit Basis bei `base`, Spitze in Richtung `direction`.
fn push_cone(
    vertices: &mut Vec<GizmoVertex>,
    base: DVec3,
    direction: DVec3,
    length: f64,
    radius: f64,
    handle: HandleType,
) {
    let direction = direction.normalize_or_zero();
    let (u, v) = perpendicular_basis(direction);
    vertices.push(GizmoVertex {
        position: base + direction * length,
        handle,
    });
    vertices.push(GizmoVertex {
        position: base,
        handle,
    });
    for s in 0..CONE_SEGMENTS {
        let phi = TAU * s as f64 / CONE_SEGMENTS as f64;
        vertices.push(GizmoVertex {
            position: base + (u * phi.cos() + v * phi.sin()) * radius,
            handle,
        });
    }
}

/// Kreis in der von `u` und `v` aufgespannten Ebene.
fn push_ring(
    vertices: &mut Vec<GizmoVertex>,
    center: DVec3,
    u: DVec3,
    v: DVec3,
    radius: f64,
    handle: HandleType,
) {
    for s in 0..RING_SEGMENTS {
        let phi = TAU * s as f64 / RING_SEGMENTS as f64;
        vertices.push(GizmoVertex {
            position: center + (u * phi.cos() + v * phi.sin()) * radius,
            handle,
        });
    }
}

fn push_sphere(vertices: &mut Vec<GizmoVertex>, center: DVec3, radius: f64) {
    let handle = HandleType::MoveFreely;
    vertices.push(GizmoVertex {
        position: center,
        handle,
    });
    for pole in [1.0, -1.0] {
        vertices.push(GizmoVertex {
            position: center + DVec3::Z * (radius * pole),
            handle,
        });
    }
    for stack in 1..SPHERE_STACKS {
        let theta = PI * stack as f64 / SPHERE_STACKS as f64;
        for slice in 0..SPHERE_SLICES {
            let phi = TAU * slice as f64 / SPHERE_SLICES as f64;
            let direction = DVec3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            );
            vertices.push(GizmoVertex {
                position: center + direction * radius,
                handle,
            });
        }
    }
}

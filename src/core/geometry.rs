//! Geometrien: Ebenen, Weltgeometrie einer Ansicht und 3D-Geometrie eines Objekts.
//!
//! `Geometry3D` benachrichtigt Abonnenten synchron nach jeder Änderung.
//! Abonnements werden explizit über ein `SubscriptionToken` wieder gelöst.

use crate::undo::{ActorId, Operation, OperationActor, OperationKind, OperationPayload};
use glam::{DAffine3, DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Toleranz für Längen- und Winkelvergleiche
const EPSILON: f64 = 1e-9;

/// Rotation um eine Achse durch `center` als affine Transformation.
pub fn rotation_about(center: DVec3, axis: DVec3, angle_deg: f64) -> Option<DAffine3> {
    let axis = axis.try_normalize()?;
    let rotation = DAffine3::from_quat(DQuat::from_axis_angle(axis, angle_deg.to_radians()));
    Some(DAffine3::from_translation(center) * rotation * DAffine3::from_translation(-center))
}

/// Skalierung entlang der Weltachsen um `center`.
pub fn scaling_about(center: DVec3, factors: DVec3) -> DAffine3 {
    DAffine3::from_translation(center)
        * DAffine3::from_scale(factors)
        * DAffine3::from_translation(-center)
}

// ── Ebene ─────────────────────────────────────────────────────────

/// Ebene mit Ursprung und orthonormalen In-Plane-Achsen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneGeometry {
    pub origin: DVec3,
    pub right: DVec3,
    pub up: DVec3,
}

impl PlaneGeometry {
    /// Erstellt eine Ebene; die Achsen werden normalisiert.
    pub fn new(origin: DVec3, right: DVec3, up: DVec3) -> Self {
        Self {
            origin,
            right: right.normalize_or_zero(),
            up: up.normalize_or_zero(),
        }
    }

    /// Axiale Ebene (z = `z`).
    pub fn axial(z: f64) -> Self {
        Self::new(DVec3::new(0.0, 0.0, z), DVec3::X, DVec3::Y)
    }

    /// Sagittale Ebene (x = `x`).
    pub fn sagittal(x: f64) -> Self {
        Self::new(DVec3::new(x, 0.0, 0.0), DVec3::Y, DVec3::Z)
    }

    /// Koronale Ebene (y = `y`).
    pub fn coronal(y: f64) -> Self {
        Self::new(DVec3::new(0.0, y, 0.0), DVec3::X, DVec3::Z)
    }

    pub fn normal(&self) -> DVec3 {
        self.right.cross(self.up).normalize_or_zero()
    }

    /// Endliche, nicht-parallele Achsen.
    pub fn is_valid(&self) -> bool {
        self.origin.is_finite()
            && self.right.is_finite()
            && self.up.is_finite()
            && self.right.cross(self.up).length() > EPSILON
    }

    /// Vorzeichenbehafteter Abstand entlang der Normalen.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.origin).dot(self.normal())
    }

    pub fn project(&self, point: DVec3) -> DVec3 {
        point - self.normal() * self.signed_distance(point)
    }

    /// Um `distance` entlang der Normalen verschobene Kopie.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal() * distance,
            ..*self
        }
    }

    /// Gedrehte Kopie (Achse durch `center`).
    pub fn rotated(&self, center: DVec3, axis: DVec3, angle_deg: f64) -> Option<Self> {
        let transform = rotation_about(center, axis, angle_deg)?;
        Some(Self {
            origin: transform.transform_point3(self.origin),
            right: transform.transform_vector3(self.right).normalize_or_zero(),
            up: transform.transform_vector3(self.up).normalize_or_zero(),
        })
    }

    /// Schnittgerade zweier Ebenen als (Punkt, Richtung); `None` bei parallelen Ebenen.
    pub fn intersection_line(&self, other: &PlaneGeometry) -> Option<(DVec3, DVec3)> {
        let n1 = self.normal();
        let n2 = other.normal();
        let direction = n1.cross(n2);
        let denom = direction.length_squared();
        if denom < EPSILON {
            return None;
        }
        let d1 = n1.dot(self.origin);
        let d2 = n2.dot(other.origin);
        let point = (n2.cross(direction) * d1 + direction.cross(n1) * d2) / denom;
        Some((point, direction.normalize()))
    }

    /// Schnittpunkt dreier Ebenen; `None` wenn nicht eindeutig.
    pub fn intersection_point(a: &Self, b: &Self, c: &Self) -> Option<DVec3> {
        let (n1, n2, n3) = (a.normal(), b.normal(), c.normal());
        let det = n1.dot(n2.cross(n3));
        if det.abs() < EPSILON {
            return None;
        }
        let (d1, d2, d3) = (n1.dot(a.origin), n2.dot(b.origin), n3.dot(c.origin));
        Some((n2.cross(n3) * d1 + n3.cross(n1) * d2 + n1.cross(n2) * d3) / det)
    }
}

/// Abstand eines Punktes von einer Geraden (Punkt, normierte Richtung).
pub fn distance_to_line(point: DVec3, line_point: DVec3, direction: DVec3) -> f64 {
    let v = point - line_point;
    (v - direction * v.dot(direction)).length()
}

// ── Weltgeometrie einer Ansicht ───────────────────────────────────

/// Geometrie, durch die eine Ansicht navigiert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldGeometry {
    /// Stapel paralleler Schichten ausgehend von einer Referenzebene.
    Sliced {
        reference: PlaneGeometry,
        slices: usize,
        spacing: f64,
    },
    /// Freie Liste von Ebenen (nicht rotierbar).
    Planes(Vec<PlaneGeometry>),
}

impl WorldGeometry {
    pub fn slice_count(&self) -> usize {
        match self {
            WorldGeometry::Sliced { slices, .. } => *slices,
            WorldGeometry::Planes(planes) => planes.len(),
        }
    }

    /// Ebene der Schicht `index`.
    pub fn plane(&self, index: usize) -> Option<PlaneGeometry> {
        match self {
            WorldGeometry::Sliced {
                reference,
                slices,
                spacing,
            } => (index < *slices).then(|| reference.offset(index as f64 * spacing)),
            WorldGeometry::Planes(planes) => planes.get(index).copied(),
        }
    }

    /// Schicht, die `point` am nächsten liegt.
    pub fn nearest_slice(&self, point: DVec3) -> Option<usize> {
        match self {
            WorldGeometry::Sliced {
                reference,
                slices,
                spacing,
            } => {
                if *slices == 0 {
                    return None;
                }
                let raw = reference.signed_distance(point) / spacing;
                Some(raw.round().clamp(0.0, (*slices - 1) as f64) as usize)
            }
            WorldGeometry::Planes(planes) => planes
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    a.1.signed_distance(point)
                        .abs()
                        .total_cmp(&b.1.signed_distance(point).abs())
                })
                .map(|(i, _)| i),
        }
    }

    /// Nur gültige Schichtstapel lassen sich koordiniert drehen.
    pub fn is_manageable(&self) -> bool {
        match self {
            WorldGeometry::Sliced {
                reference,
                slices,
                spacing,
            } => reference.is_valid() && *slices > 0 && spacing.is_finite() && *spacing > 0.0,
            WorldGeometry::Planes(_) => false,
        }
    }

    /// Dreht die Referenzebene; nur für `Sliced`.
    pub fn rotated(&self, center: DVec3, axis: DVec3, angle_deg: f64) -> Option<Self> {
        match self {
            WorldGeometry::Sliced {
                reference,
                slices,
                spacing,
            } => Some(WorldGeometry::Sliced {
                reference: reference.rotated(center, axis, angle_deg)?,
                slices: *slices,
                spacing: *spacing,
            }),
            WorldGeometry::Planes(_) => None,
        }
    }
}

// ── 3D-Geometrie eines Datenobjekts ───────────────────────────────

/// Handle für ein Abonnement an einer `Geometry3D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type ModifiedCallback = Box<dyn FnMut(&Geometry3D)>;

/// Index-zu-Welt-Transformation plus Ausdehnung in Indexkoordinaten.
pub struct Geometry3D {
    actor_id: ActorId,
    index_to_world: DAffine3,
    extent: DVec3,
    subscribers: Vec<(SubscriptionToken, ModifiedCallback)>,
    next_token: u64,
}

impl std::fmt::Debug for Geometry3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geometry3D")
            .field("actor_id", &self.actor_id)
            .field("index_to_world", &self.index_to_world)
            .field("extent", &self.extent)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Geometry3D {
    pub fn new(index_to_world: DAffine3, extent: DVec3) -> Self {
        Self {
            actor_id: ActorId::next(),
            index_to_world,
            extent,
            subscribers: Vec::new(),
            next_token: 0,
        }
    }

    /// Achsparallele Box mit Ursprung `origin` und Kantenlängen `size`.
    pub fn from_box(origin: DVec3, size: DVec3) -> Self {
        Self::new(DAffine3::from_translation(origin), size)
    }

    pub fn index_to_world(&self) -> DAffine3 {
        self.index_to_world
    }

    pub fn extent(&self) -> DVec3 {
        self.extent
    }

    /// Weltmittelpunkt der Box.
    pub fn center(&self) -> DVec3 {
        self.index_to_world.transform_point3(self.extent * 0.5)
    }

    /// Achsvektor `dim` in Weltkoordinaten (Länge = Ausdehnung in mm).
    pub fn axis_vector(&self, dim: usize) -> DVec3 {
        let column = self.index_to_world.matrix3.col(dim.min(2));
        column * self.extent[dim.min(2)]
    }

    pub fn extent_in_mm(&self, dim: usize) -> f64 {
        self.axis_vector(dim).length()
    }

    /// Liegt `point` innerhalb der Box?
    pub fn is_inside(&self, point: DVec3) -> bool {
        if self.index_to_world.matrix3.determinant().abs() < EPSILON {
            return false;
        }
        let local = self.index_to_world.inverse().transform_point3(point);
        (0..3).all(|i| local[i] >= -EPSILON && local[i] <= self.extent[i] + EPSILON)
    }

    /// Setzt die Transformation und benachrichtigt Abonnenten.
    pub fn set_index_to_world(&mut self, transform: DAffine3) {
        self.index_to_world = transform;
        self.notify();
    }

    /// Wendet `transform` in Weltkoordinaten an (links multipliziert).
    pub fn compose(&mut self, transform: DAffine3) {
        self.set_index_to_world(transform * self.index_to_world);
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&Geometry3D) + 'static) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscribers.push((token, Box::new(callback)));
        token
    }

    /// Löst ein Abonnement; `false` wenn das Token unbekannt ist.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(t, _)| *t != token);
        before != self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self) {
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for (_, callback) in subscribers.iter_mut() {
            callback(self);
        }
        self.subscribers = subscribers;
    }
}

impl OperationActor for Geometry3D {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn execute_operation(&mut self, operation: &Operation) {
        match (operation.kind, &operation.payload) {
            (OperationKind::Translate, OperationPayload::Translation(delta)) => {
                self.compose(DAffine3::from_translation(*delta));
            }
            (
                OperationKind::Rotate,
                OperationPayload::Rotation {
                    center,
                    axis,
                    angle_deg,
                },
            ) => match rotation_about(*center, *axis, *angle_deg) {
                Some(rotation) => self.compose(rotation),
                None => log::warn!("Geometry3D: Rotation um Nullachse ignoriert"),
            },
            (OperationKind::Scale, OperationPayload::Scale { center, factors }) => {
                self.compose(scaling_about(*center, *factors));
            }
            (OperationKind::ApplyTransform, OperationPayload::Transform(transform)) => {
                self.set_index_to_world(*transform);
            }
            _ => log::debug!(
                "Geometry3D: Operation {:?} nicht unterstützt",
                operation.kind
            ),
        }
    }
}

/// Orthonormale Achsen einer Transformation (Spalten normiert).
pub fn normalized_axes(matrix: DMat3) -> [DVec3; 3] {
    [
        matrix.x_axis.normalize_or_zero(),
        matrix.y_axis.normalize_or_zero(),
        matrix.z_axis.normalize_or_zero(),
    ]
}

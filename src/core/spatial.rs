//! Spatial-Index (KD-Tree) für schnelle Punkt-Abfragen im 3D-Raum.

use glam::DVec3;
use kiddo::{KdTree, SquaredEuclidean};

/// Ergebnis einer Distanzabfrage gegen den Spatial-Index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMatch {
    /// Index des gefundenen Eintrags in der Ausgangsliste
    pub index: usize,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f64,
}

/// Read-only Index über einer Punktliste. Einträge werden über ihre
/// Position in der Liste identifiziert.
#[derive(Debug, Clone)]
pub struct PointIndex {
    tree: KdTree<f64, 3>,
    len: usize,
}

impl Default for PointIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl PointIndex {
    /// Erstellt einen leeren Index.
    pub fn empty() -> Self {
        Self {
            tree: (&Vec::<[f64; 3]>::new()).into(),
            len: 0,
        }
    }

    /// Baut einen neuen Index aus den übergebenen Positionen.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Self {
        let entries: Vec<[f64; 3]> = points.into_iter().map(|p| p.to_array()).collect();
        let len = entries.len();
        let tree: KdTree<f64, 3> = (&entries).into();
        Self { tree, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Findet den nächsten Eintrag zur Position.
    pub fn nearest(&self, query: DVec3) -> Option<SpatialMatch> {
        if self.is_empty() {
            return None;
        }
        let result = self.tree.nearest_one::<SquaredEuclidean>(&query.to_array());
        Some(SpatialMatch {
            index: result.item as usize,
            distance: result.distance.sqrt(),
        })
    }

    /// Nächster Eintrag, aber nur innerhalb von `max_distance`.
    pub fn nearest_within(&self, query: DVec3, max_distance: f64) -> Option<SpatialMatch> {
        self.nearest(query)
            .filter(|m| m.distance <= max_distance)
    }

    /// Alle Einträge im Radius, nach Distanz sortiert.
    pub fn within_radius(&self, query: DVec3, radius: f64) -> Vec<SpatialMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .tree
            .within::<SquaredEuclidean>(&query.to_array(), radius * radius)
            .into_iter()
            .map(|entry| SpatialMatch {
                index: entry.item as usize,
                distance: entry.distance.sqrt(),
            })
            .collect::<Vec<_>>();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results
    }
}

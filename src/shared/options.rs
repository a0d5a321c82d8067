//! Zentrale Konfiguration des Interaktions-Kerns.
//!
//! `InteractionOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use crate::undo::UndoController;
use serde::{Deserialize, Serialize};

// ── Undo ────────────────────────────────────────────────────────────

/// Maximale Anzahl Undo-Schritte.
pub const UNDO_DEPTH: usize = UndoController::DEFAULT_DEPTH;

// ── Engine ──────────────────────────────────────────────────────────

/// Maximale Verschachtelung von Folge-Events.
pub const MAX_FOLLOW_UP_DEPTH: usize = crate::interaction::DEFAULT_MAX_FOLLOW_UP_DEPTH;

// ── Picking ─────────────────────────────────────────────────────────

/// Fangradius für Punkte (mm).
pub const POINT_PICK_PRECISION: f64 = 2.0;
/// Fangradius für Fasern (mm).
pub const FIBER_PICK_TOLERANCE: f64 = 1.5;
/// Abstand zur Schnittlinie, ab dem eine Schicht-Rotation startet (mm).
pub const ROTATION_PICK_DISTANCE: f64 = 2.0;
/// Fangradius für Gizmo-Handles relativ zum längsten Radius.
pub const GIZMO_HANDLE_TOLERANCE: f64 = 0.1;

/// Standard-Logfilter, durch `RUST_LOG` überschreibbar.
pub const LOG_FILTER: &str = "info";

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Erlaubte Gizmo-Manipulationen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GizmoAllowOptions {
    pub translation: bool,
    pub rotation_x: bool,
    pub rotation_y: bool,
    pub rotation_z: bool,
    pub scaling: bool,
}

impl Default for GizmoAllowOptions {
    fn default() -> Self {
        Self {
            translation: true,
            rotation_x: true,
            rotation_y: true,
            rotation_z: true,
            scaling: true,
        }
    }
}

/// Alle zur Laufzeit änderbaren Interaktions-Optionen.
/// Wird als `interaction_core.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOptions {
    // ── Undo ────────────────────────────────────────────────────
    /// Maximale Undo-Tiefe
    pub undo_depth: usize,
    /// Undo-Aufzeichnung für neue State-Machines aktiv
    pub undo_enabled: bool,

    // ── Engine ──────────────────────────────────────────────────
    /// Maximale Tiefe verschachtelter Folge-Events
    pub max_follow_up_depth: usize,

    // ── Picking ─────────────────────────────────────────────────
    pub point_pick_precision: f64,
    pub fiber_pick_tolerance: f64,
    pub rotation_pick_distance: f64,
    /// Relativ zum längsten Gizmo-Radius
    pub gizmo_handle_tolerance: f64,

    // ── Gizmo ───────────────────────────────────────────────────
    #[serde(default)]
    pub gizmo_allow: GizmoAllowOptions,

    // ── Logging ─────────────────────────────────────────────────
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            undo_depth: UNDO_DEPTH,
            undo_enabled: true,
            max_follow_up_depth: MAX_FOLLOW_UP_DEPTH,
            point_pick_precision: POINT_PICK_PRECISION,
            fiber_pick_tolerance: FIBER_PICK_TOLERANCE,
            rotation_pick_distance: ROTATION_PICK_DISTANCE,
            gizmo_handle_tolerance: GIZMO_HANDLE_TOLERANCE,
            gizmo_allow: GizmoAllowOptions::default(),
            log_filter: LOG_FILTER.to_string(),
        }
    }
}

/// Serde-Default für `log_filter` (ältere TOML-Dateien).
fn default_log_filter() -> String {
    LOG_FILTER.to_string()
}

impl InteractionOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("interaction-replay"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("interaction_core.toml")
    }

    /// Überträgt die Engine-Werte auf eine Factory.
    pub fn apply_to_factory(&self, factory: &mut crate::interaction::StateMachineFactory) {
        factory.set_max_follow_up_depth(self.max_follow_up_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_roundtrip_keeps_values() {
        let opts = InteractionOptions {
            undo_depth: 12,
            point_pick_precision: 4.5,
            ..Default::default()
        };
        let text = toml::to_string_pretty(&opts).expect("serialisierbar");
        let back: InteractionOptions = toml::from_str(&text).expect("lesbar");
        assert_eq!(back, opts);
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let text = r#"
            undo_depth = 5
            undo_enabled = false
            max_follow_up_depth = 8
            point_pick_precision = 1.0
            fiber_pick_tolerance = 1.0
            rotation_pick_distance = 1.0
            gizmo_handle_tolerance = 0.2
        "#;
        let opts: InteractionOptions = toml::from_str(text).expect("lesbar");
        assert_eq!(opts.log_filter, LOG_FILTER);
        assert_eq!(opts.gizmo_allow, GizmoAllowOptions::default());
        assert!(!opts.undo_enabled);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let opts = InteractionOptions::load_from_file(std::path::Path::new(
            "/nonexistent/interaction_core.toml",
        ));
        assert_eq!(opts, InteractionOptions::default());
    }
}

//! Interaction Replay.
//!
//! Lädt eine Interaktions-Konfiguration, spielt ein aufgezeichnetes
//! Event-Skript (JSON) durch die Tools und gibt Zustand und Undo-Stack aus.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::DVec3;
use imaging_interaction::{
    AffineInteraction, Delivery, Event, Geometry3D, GlobalInteraction, InteractionOptions,
    Interactor, PointSet, PointSetInteraction, SharedUndoController, StateMachineFactory,
    ToolManager, UndoController,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(version, about = "Spielt Eingabe-Events durch konfigurierte State-Machines")]
struct Cli {
    /// XML-Konfiguration (Events + State-Machines)
    #[arg(long)]
    config: PathBuf,
    /// Optionen-Datei (TOML); Standard: neben der Binary
    #[arg(long)]
    options: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prüft die Konfiguration und listet die geladenen State-Machines.
    Check,
    /// Spielt ein Event-Skript ab.
    Replay {
        script: PathBuf,
        /// Aktives Tool: "points" oder "affine"
        #[arg(long, default_value = "points")]
        tool: String,
    },
}

/// Aufgezeichnetes Skript: Startpunkte plus Schritte.
#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    points: Vec<DVec3>,
    /// Würfel für das Affine-Tool (Ursprung, Kantenlängen)
    #[serde(default = "default_box")]
    object: (DVec3, DVec3),
    steps: Vec<Step>,
}

fn default_box() -> (DVec3, DVec3) {
    (DVec3::ZERO, DVec3::splat(10.0))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Event(Event),
    Undo,
    Redo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let options_path = cli
        .options
        .clone()
        .unwrap_or_else(InteractionOptions::config_path);
    let options = InteractionOptions::load_from_file(&options_path);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&options.log_filter))
        .init();
    log::info!(
        "Interaction Replay v{} startet (Optionen: {})",
        env!("CARGO_PKG_VERSION"),
        options_path.display()
    );

    let mut factory = StateMachineFactory::new();
    options.apply_to_factory(&mut factory);
    factory.load_from_file(&cli.config)?;

    match cli.command {
        Command::Check => {
            for machine_type in factory.machine_types() {
                println!("{}", factory.table(machine_type)?);
            }
            println!("{} Event-Zuordnungen", factory.event_mapper().len());
        }
        Command::Replay { script, tool } => replay(&factory, &options, &script, &tool)?,
    }
    Ok(())
}

fn replay(
    factory: &StateMachineFactory,
    options: &InteractionOptions,
    script_path: &Path,
    tool: &str,
) -> Result<()> {
    let content = std::fs::read_to_string(script_path)
        .with_context(|| format!("Skript nicht lesbar: {}", script_path.display()))?;
    let script: Script = serde_json::from_str(&content)
        .with_context(|| format!("Skript fehlerhaft: {}", script_path.display()))?;

    let undo = UndoController::shared(options.undo_depth);
    let points = Rc::new(RefCell::new(PointSet::from_positions(script.points.iter().copied())));
    let object = Rc::new(RefCell::new(Geometry3D::from_box(script.object.0, script.object.1)));

    let mut tools = ToolManager::new();
    let mut point_tool = Interactor::new(
        factory,
        "pointsetinteractor",
        undo.clone(),
        PointSetInteraction::new(&points).with_precision(options.point_pick_precision),
    )?;
    point_tool.machine_mut().set_undo_enabled(options.undo_enabled);
    let points_index = tools.register(Box::new(point_tool));

    let mut affine_tool = Interactor::new(
        factory,
        "affineinteractor",
        undo.clone(),
        AffineInteraction::new(&object),
    )?;
    affine_tool.machine_mut().set_undo_enabled(options.undo_enabled);
    let affine_index = tools.register(Box::new(affine_tool));

    let active = match tool {
        "points" => points_index,
        "affine" => affine_index,
        other => anyhow::bail!("Unbekanntes Tool '{}' (erwartet: points, affine)", other),
    };
    tools.set_active(active);

    let tools = Rc::new(RefCell::new(tools));
    let mut global = GlobalInteraction::new(factory.event_mapper().clone());
    global.add_listener(tools.clone());

    for (i, step) in script.steps.iter().enumerate() {
        match step {
            Step::Event(event) => {
                let delivery = global.dispatch(event);
                println!("#{:<3} {}", i, describe(&delivery));
            }
            Step::Undo => {
                let done = undo.borrow_mut().undo();
                println!("#{:<3} undo -> {}", i, done);
            }
            Step::Redo => {
                let done = undo.borrow_mut().redo();
                println!("#{:<3} redo -> {}", i, done);
            }
        }
    }

    print_summary(&points.borrow(), &object.borrow(), &undo);
    Ok(())
}

fn describe(delivery: &Delivery) -> String {
    match delivery {
        Delivery::Unmapped => "nicht gemappt".to_string(),
        Delivery::Ignored(state_event) => format!("{} ignoriert", state_event.id),
        Delivery::Handled {
            state_event,
            listener,
            dispatch,
        } => format!(
            "{} -> {} ({})",
            state_event.id,
            listener,
            if dispatch.is_ok() { "ok" } else { "Action fehlgeschlagen" }
        ),
    }
}

fn print_summary(points: &PointSet, object: &Geometry3D, undo: &SharedUndoController) {
    println!("Punkte: {}", points.len());
    for (i, p) in points.positions().iter().enumerate() {
        let marker = if points.is_selected(i) { "*" } else { " " };
        println!("  {}{:>3}: ({:.3}, {:.3}, {:.3})", marker, i, p.x, p.y, p.z);
    }
    let center = object.center();
    println!(
        "Objekt-Zentrum: ({:.3}, {:.3}, {:.3})",
        center.x, center.y, center.z
    );
    let undo = undo.borrow();
    println!(
        "Undo-Schritte: {} (undo: {}, redo: {})",
        undo.len(),
        undo.can_undo(),
        undo.can_redo()
    );
    if let Some(entry) = undo.last_entry() {
        println!("  zuletzt: {} ({} Operationen)", entry.description(), entry.events().len());
    }
}

//! Konkrete Interaktoren: Verhalten, die über State-Machines Datenobjekte verändern.

pub mod affine;
pub mod coordinate_supplier;
pub mod fiber_bundle;
pub mod point_set;

pub use affine::AffineInteraction;
pub use coordinate_supplier::CoordinateSupplier;
pub use fiber_bundle::FiberBundleInteraction;
pub use point_set::PointSetInteraction;

use crate::interaction::{ActionContext, EventId};
use crate::undo::{Operation, OperationEvent, SharedActor};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Hebt ein schwach gehaltenes Ziel an; `None` wenn es nicht mehr existiert.
pub(crate) fn upgrade_target<A: ?Sized>(
    target: &Weak<RefCell<A>>,
    ctx: &ActionContext<'_>,
) -> Option<Rc<RefCell<A>>> {
    let upgraded = target.upgrade();
    if upgraded.is_none() {
        log::debug!("{}: Ziel existiert nicht mehr", ctx.machine_type());
    }
    upgraded
}

/// Führt eine Operation ohne Undo-Eintrag aus (z.B. Zwischenschritte einer Geste).
pub(crate) fn execute(target: &SharedActor, operation: &Operation) -> bool {
    match target.try_borrow_mut() {
        Ok(mut actor) => {
            actor.execute_operation(operation);
            true
        }
        Err(_) => {
            log::warn!("Ziel belegt, {:?} nicht ausgeführt", operation.kind);
            false
        }
    }
}

/// Führt alle Do-Operationen in Reihenfolge aus und legt sie bei aktivem Undo
/// als einen gemeinsamen Schritt ab.
pub(crate) fn execute_group(
    target: &SharedActor,
    pairs: Vec<(Operation, Operation)>,
    description: &str,
    ctx: &mut ActionContext<'_>,
) -> bool {
    if pairs.is_empty() {
        return true;
    }
    for (do_op, _) in &pairs {
        if !execute(target, do_op) {
            return false;
        }
    }
    if ctx.undo_enabled() {
        let events = pairs
            .into_iter()
            .map(|(do_op, undo_op)| {
                OperationEvent::new(target, do_op, undo_op).with_description(description)
            })
            .collect();
        ctx.push_undo_group(events);
    }
    true
}

/// Legt einen bereits angewendeten Zustandswechsel als Undo-Schritt ab,
/// ohne ihn erneut auszuführen.
pub(crate) fn record(
    target: &SharedActor,
    do_op: Operation,
    undo_op: Operation,
    description: &str,
    ctx: &mut ActionContext<'_>,
) {
    if ctx.undo_enabled() {
        ctx.push_undo(OperationEvent::new(target, do_op, undo_op).with_description(description));
    }
}

/// Postet `YES` oder `NO` als Folge-Event.
pub(crate) fn post_answer(ctx: &mut ActionContext<'_>, yes: bool) {
    ctx.post_follow_up(if yes { EventId::YES } else { EventId::NO });
}

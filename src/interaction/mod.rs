//! Interaktions-Kern: Events, State-Machine-Tabellen, Engine und Dispatcher.

pub mod action;
pub mod action_table;
pub mod dispatcher;
pub mod event;
pub mod event_mapper;
pub mod factory;
pub mod interactor;
pub mod state_machine;
pub mod state_table;

pub use action::{Action, ActionId, PropertyValue};
pub use action_table::{ActionHandler, ActionTable, TableExecutor};
pub use dispatcher::{Delivery, GlobalInteraction, SharedListener};
pub use event::{
    DisplayPositionEvent, Event, EventId, EventType, Key, KeyEvent, Modifiers, MouseButton,
    PointerKind, PositionEvent, RendererId, Sender, StateEvent,
};
pub use event_mapper::{EventDescription, EventMapper};
pub use factory::StateMachineFactory;
pub use interactor::{Behavior, EventListener, Interactor};
pub use state_machine::{
    ActionContext, ActionExecutor, Dispatch, StateMachine, DEFAULT_MAX_FOLLOW_UP_DEPTH,
};
pub use state_table::{State, StateId, StateMachineTable, TableBuilder, Transition};

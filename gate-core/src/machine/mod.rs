//! Máquina de estados guardada do checkpoint

pub mod action;
pub mod context;
pub mod engine;
pub mod security;
pub mod state;

pub use action::{Action, ActionKind};
pub use context::{DEFAULT_MAX_TRIES, PersonId, SecurityContext};
pub use engine::{Branch, Fired, Guard, Hook, Rejection, TransitionTable};
pub use security::{MachineConfig, SecurityStateMachine};
pub use state::State;

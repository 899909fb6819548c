//! # Prelude — Re-exportações Convenientes
//!
//! ```
//! use gate_core::prelude::*;
//! ```

pub use crate::bus::{DispatchReport, EventBus, HandlerError, HandlerResult, SubscriptionId};
pub use crate::error::{CoreError, CoreResult};
pub use crate::events::{EventKind, SecurityEvent};
pub use crate::machine::{
    Action, ActionKind, MachineConfig, PersonId, SecurityContext, SecurityStateMachine, State,
};

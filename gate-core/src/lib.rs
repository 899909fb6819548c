//! # 🚪 gate-core — Núcleo do Checkpoint
//!
//! Máquina de estados guardada que conduz o fluxo de presença física
//! (aproximação → leitura → aceite/recusa → detenção/entrada → reset) e o
//! bus de eventos que desacopla as transições das ações disparadas por elas.
//!
//! ## Arquitetura
//!
//! ```text
//! driver ──▶ SecurityStateMachine ──guards──▶ hooks ──publish──▶ EventBus
//!                                                                  │
//!                                       handlers (captura, log) ◀──┘
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use gate_core::prelude::*;
//!
//! let bus = EventBus::new();
//! bus.subscribe(EventKind::PersonEnter, |event| {
//!     println!("entrou: {:?}", event.get("id"));
//!     Ok(())
//! }).unwrap();
//!
//! let config = MachineConfig { allow_list: [42].into_iter().collect(), max_tries: 3 };
//! let mut sm = SecurityStateMachine::new(bus, config);
//! sm.walk_up().unwrap();
//! sm.open(42).unwrap();
//! assert_eq!(sm.identify().unwrap(), State::Allowed);
//! ```

pub mod bus;
pub mod error;
pub mod events;
pub mod machine;
pub mod prelude;

pub use bus::{DispatchReport, EventBus, EventHandler, HandlerError, HandlerResult, SubscriptionId};
pub use error::{CoreError, CoreResult};
pub use events::{EventKind, SecurityEvent};
pub use machine::{
    Action, ActionKind, MachineConfig, PersonId, SecurityContext, SecurityStateMachine, State,
};

//! Erros do núcleo (máquina de estados e bus de eventos)

use thiserror::Error;

use crate::bus::SubscriptionId;
use crate::events::EventKind;
use crate::machine::State;

pub type CoreResult<T> = Result<T, CoreError>;

/// Erros do núcleo
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Ação não definida a partir do estado atual, ou nenhum guard satisfeito
    #[error("Can't {action} when in {state}")]
    InvalidTransition { action: String, state: State },

    /// Nome de ação desconhecido
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Argumento ausente ou inválido
    #[error("Invalid argument for {action}: {reason}")]
    InvalidArgument { action: String, reason: String },

    /// Handler nunca registrado para o tipo de evento
    #[error("Handler {id} is not subscribed to {kind}")]
    NotSubscribed { kind: EventKind, id: SubscriptionId },

    /// Lock poison
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CoreError::LockPoisoned(err.to_string())
    }
}

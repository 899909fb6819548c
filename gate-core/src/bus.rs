//! Bus de eventos síncrono (publish/subscribe por tipo de evento)
//!
//! Cada [`EventKind`] tem uma lista ordenada de handlers. `notify` tira um
//! snapshot da lista antes de iterar, então handlers podem inscrever,
//! desinscrever ou notificar durante o dispatch sem corromper a iteração.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::events::{EventKind, SecurityEvent};

/// Falha reportada por um handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError(pub String);

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for HandlerError {}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        HandlerError(msg)
    }
}

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        HandlerError(msg.to_string())
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Handler de eventos (callback)
pub type EventHandler = Arc<dyn Fn(&SecurityEvent) -> HandlerResult + Send + Sync>;

/// Identificador de uma inscrição, devolvido por [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resultado de um `notify`
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub kind: EventKind,
    /// Handlers invocados (inclui os que falharam)
    pub delivered: usize,
    pub failures: Vec<(SubscriptionId, HandlerError)>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

type HandlerList = Vec<(SubscriptionId, EventHandler)>;

/// Bus de eventos
///
/// Clonar o bus compartilha o mesmo registro de handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<EventKind, HandlerList>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Cria novo bus de eventos
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra handler para um tipo de evento
    ///
    /// A lista do tipo é criada sob demanda; qualquer tipo é aceito.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> CoreResult<SubscriptionId>
    where
        F: Fn(&SecurityEvent) -> HandlerResult + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.lock()?;
        handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        debug!(%kind, %id, "handler subscribed");
        Ok(id)
    }

    /// Remove um handler previamente registrado
    ///
    /// Falha com [`CoreError::NotSubscribed`] se o handler não estava
    /// registrado para o tipo; o chamador deve tratar como aviso.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> CoreResult<()> {
        let mut handlers = self.handlers.lock()?;
        let list = handlers
            .get_mut(&kind)
            .ok_or(CoreError::NotSubscribed { kind, id })?;
        let position = list
            .iter()
            .position(|(sub, _)| *sub == id)
            .ok_or(CoreError::NotSubscribed { kind, id })?;
        list.remove(position);
        if list.is_empty() {
            handlers.remove(&kind);
        }
        debug!(%kind, %id, "handler unsubscribed");
        Ok(())
    }

    /// Notifica todos os handlers do tipo, em ordem de inscrição, na thread atual
    ///
    /// Sem handlers é um no-op (registrado em log). Falhas de handlers não
    /// interrompem o dispatch; ficam no [`DispatchReport`].
    pub fn notify(&self, event: &SecurityEvent) -> CoreResult<DispatchReport> {
        let snapshot: HandlerList = {
            let handlers = self.handlers.lock()?;
            handlers.get(&event.kind).cloned().unwrap_or_default()
        };

        let mut report = DispatchReport {
            kind: event.kind,
            delivered: 0,
            failures: Vec::new(),
        };

        if snapshot.is_empty() {
            debug!(kind = %event.kind, "event has no subscribers");
            return Ok(report);
        }

        for (id, handler) in snapshot {
            report.delivered += 1;
            if let Err(err) = handler(event) {
                warn!(kind = %event.kind, %id, error = %err, "event handler failed");
                report.failures.push((id, err));
            }
        }

        Ok(report)
    }

    /// Conveniência: notifica um evento sem payload
    pub fn publish(&self, kind: EventKind) -> CoreResult<DispatchReport> {
        self.notify(&SecurityEvent::new(kind))
    }

    /// Conta handlers registrados para um tipo
    pub fn subscriber_count(&self, kind: EventKind) -> CoreResult<usize> {
        let handlers = self.handlers.lock()?;
        Ok(handlers.get(&kind).map_or(0, Vec::len))
    }

    /// Conta handlers registrados
    pub fn handler_count(&self) -> CoreResult<usize> {
        let handlers = self.handlers.lock()?;
        Ok(handlers.values().map(Vec::len).sum())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handler_count", &self.handler_count().unwrap_or(0))
            .finish()
    }
}

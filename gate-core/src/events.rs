//! Eventos de domínio publicados pela máquina de estados

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tipo de evento de segurança
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    PersonDetected,
    PersonIdAttempt,
    PersonIdSuccess,
    PersonIdFail,
    PersonEnter,
    PersonDetained,
}

impl EventKind {
    /// Todos os tipos, em ordem de declaração
    pub const ALL: [EventKind; 6] = [
        EventKind::PersonDetected,
        EventKind::PersonIdAttempt,
        EventKind::PersonIdSuccess,
        EventKind::PersonIdFail,
        EventKind::PersonEnter,
        EventKind::PersonDetained,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PersonDetected => "PERSON_DETECTED",
            EventKind::PersonIdAttempt => "PERSON_ID_ATTEMPT",
            EventKind::PersonIdSuccess => "PERSON_ID_SUCCESS",
            EventKind::PersonIdFail => "PERSON_ID_FAIL",
            EventKind::PersonEnter => "PERSON_ENTER",
            EventKind::PersonDetained => "PERSON_DETAINED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| CoreError::InvalidArgument {
                action: "event".into(),
                reason: format!("unknown event kind '{}'", s.trim()),
            })
    }
}

/// Evento publicado no bus: tipo + payload chave/valor opcional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub payload: BTreeMap<String, String>,
}

impl SecurityEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            payload: BTreeMap::new(),
        }
    }

    /// Adiciona um par chave/valor ao payload
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.payload.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }
}

impl From<EventKind> for SecurityEvent {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

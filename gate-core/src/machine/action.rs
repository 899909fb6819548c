//! Ações aceitas pela máquina de estados

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::machine::context::PersonId;

/// Nome de uma ação, sem argumentos (chave da tabela de transições)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    WalkUp,
    Open,
    Hack,
    Identify,
    Detain,
    Catch,
    Ignore,
    MoveOn,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::WalkUp,
        ActionKind::Open,
        ActionKind::Hack,
        ActionKind::Identify,
        ActionKind::Detain,
        ActionKind::Catch,
        ActionKind::Ignore,
        ActionKind::MoveOn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::WalkUp => "walk_up",
            ActionKind::Open => "open",
            ActionKind::Hack => "hack",
            ActionKind::Identify => "identify",
            ActionKind::Detain => "detain",
            ActionKind::Catch => "catch",
            ActionKind::Ignore => "ignore",
            ActionKind::MoveOn => "move_on",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownAction(s.to_string()))
    }
}

/// Ação com seus argumentos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    WalkUp,
    /// Apresenta um identificador ao leitor
    Open(PersonId),
    Hack,
    Identify,
    Detain,
    Catch,
    Ignore,
    MoveOn,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::WalkUp => ActionKind::WalkUp,
            Action::Open(_) => ActionKind::Open,
            Action::Hack => ActionKind::Hack,
            Action::Identify => ActionKind::Identify,
            Action::Detain => ActionKind::Detain,
            Action::Catch => ActionKind::Catch,
            Action::Ignore => ActionKind::Ignore,
            Action::MoveOn => ActionKind::MoveOn,
        }
    }

    /// Monta uma ação a partir do nome e dos argumentos em texto
    pub fn parse(name: &str, args: &[&str]) -> CoreResult<Self> {
        let kind: ActionKind = name.parse()?;
        let action = match kind {
            ActionKind::Open => {
                let raw = args.first().ok_or_else(|| CoreError::InvalidArgument {
                    action: kind.to_string(),
                    reason: "missing id".into(),
                })?;
                let id = raw.parse::<PersonId>().map_err(|e| CoreError::InvalidArgument {
                    action: kind.to_string(),
                    reason: format!("'{}' is not an id: {}", raw, e),
                })?;
                Action::Open(id)
            }
            ActionKind::WalkUp => Action::WalkUp,
            ActionKind::Hack => Action::Hack,
            ActionKind::Identify => Action::Identify,
            ActionKind::Detain => Action::Detain,
            ActionKind::Catch => Action::Catch,
            ActionKind::Ignore => Action::Ignore,
            ActionKind::MoveOn => Action::MoveOn,
        };
        Ok(action)
    }
}

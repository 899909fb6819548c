//! Estados do checkpoint

use std::fmt;

use serde::{Deserialize, Serialize};

/// Estado da máquina; `Idle` é o inicial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Idle,
    Detected,
    Scanning,
    Hacking,
    Allowed,
    Detained,
}

impl State {
    pub const INITIAL: State = State::Idle;

    pub const ALL: [State; 6] = [
        State::Idle,
        State::Detected,
        State::Scanning,
        State::Hacking,
        State::Allowed,
        State::Detained,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Detected => "detected",
            State::Scanning => "scanning",
            State::Hacking => "hacking",
            State::Allowed => "allowed",
            State::Detained => "detained",
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

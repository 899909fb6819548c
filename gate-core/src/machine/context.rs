//! Contexto carregado pela máquina de estados

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identificador apresentado por uma pessoa no leitor
pub type PersonId = i64;

/// Número padrão de tentativas antes de permitir `detain`
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Contexto de segurança
///
/// Só é alterado pelos hooks das transições; volta ao vazio sempre que a
/// máquina reentra em `idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    current_tries: u32,
    max_tries: u32,
    detain_flag: bool,
    id_accepted: bool,
    presented_id: Option<PersonId>,
    allow_list: BTreeSet<PersonId>,
}

impl SecurityContext {
    pub fn new(allow_list: impl IntoIterator<Item = PersonId>, max_tries: u32) -> Self {
        Self {
            current_tries: 0,
            max_tries,
            detain_flag: false,
            id_accepted: false,
            presented_id: None,
            allow_list: allow_list.into_iter().collect(),
        }
    }

    pub fn current_tries(&self) -> u32 {
        self.current_tries
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn detain_flag(&self) -> bool {
        self.detain_flag
    }

    pub fn id_accepted(&self) -> bool {
        self.id_accepted
    }

    pub fn presented_id(&self) -> Option<PersonId> {
        self.presented_id
    }

    pub fn allow_list(&self) -> &BTreeSet<PersonId> {
        &self.allow_list
    }

    pub fn is_allowed(&self, id: PersonId) -> bool {
        self.allow_list.contains(&id)
    }

    pub fn tries_exhausted(&self) -> bool {
        self.current_tries >= self.max_tries
    }

    pub(crate) fn present(&mut self, id: PersonId) {
        self.presented_id = Some(id);
        self.id_accepted = self.is_allowed(id);
    }

    /// Conta uma tentativa e atualiza o flag de detenção
    pub(crate) fn record_attempt(&mut self) -> u32 {
        self.current_tries += 1;
        self.detain_flag = self.tries_exhausted();
        self.current_tries
    }

    /// Limpa os dados da pessoa atual (lista e limite permanecem)
    pub(crate) fn reset_person(&mut self) {
        self.current_tries = 0;
        self.detain_flag = false;
        self.id_accepted = false;
        self.presented_id = None;
    }
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self::new([], DEFAULT_MAX_TRIES)
    }
}

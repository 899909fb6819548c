//! Motor genérico de transições
//!
//! Estados e transições são dados: cada ação tem uma lista ordenada de
//! ramos (origens, destino, guard opcional, hook `before` opcional). O
//! primeiro ramo cuja origem contém o estado atual e cujo guard passa é
//! tomado. Os guards são avaliados antes de qualquer hook.
//!
//! Ordem de execução de um disparo:
//!
//! ```text
//! guards → before → on_exit(origem) → estado = destino → on_enter(destino)
//! ```

use std::collections::HashMap;
use std::hash::Hash;

/// Predicado puro sobre o contexto
pub type Guard<C> = fn(&C) -> bool;

/// Efeito colateral de uma transição; `X` carrega o que o hook precisa
pub type Hook<C, X> = fn(&mut C, &X);

/// Um ramo de uma ação
pub struct Branch<S, C, X> {
    sources: Vec<S>,
    target: S,
    guard: Option<Guard<C>>,
    before: Option<Hook<C, X>>,
}

impl<S: Copy + PartialEq, C, X> Branch<S, C, X> {
    pub fn new(sources: &[S], target: S) -> Self {
        Self {
            sources: sources.to_vec(),
            target,
            guard: None,
            before: None,
        }
    }

    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn before(mut self, hook: Hook<C, X>) -> Self {
        self.before = Some(hook);
        self
    }

    fn leaves(&self, state: S) -> bool {
        self.sources.contains(&state)
    }

    fn admits(&self, context: &C) -> bool {
        self.guard.is_none_or(|guard| guard(context))
    }
}

/// Motivo de rejeição de uma ação
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nenhum ramo sai do estado atual
    Undefined,
    /// Há ramos saindo do estado atual, mas nenhum guard passou
    GuardsFailed,
}

/// Transição efetivada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<S> {
    pub from: S,
    pub to: S,
}

/// Tabela de transições + hooks de entrada/saída de estado
pub struct TransitionTable<S, K, C, X> {
    actions: Vec<(K, Vec<Branch<S, C, X>>)>,
    on_enter: HashMap<S, Hook<C, X>>,
    on_exit: HashMap<S, Hook<C, X>>,
}

impl<S, K, C, X> TransitionTable<S, K, C, X>
where
    S: Copy + Eq + Hash,
    K: Copy + Eq,
{
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            on_enter: HashMap::new(),
            on_exit: HashMap::new(),
        }
    }

    /// Acrescenta um ramo à ação (a ordem de declaração é a ordem de avaliação)
    pub fn branch(mut self, action: K, branch: Branch<S, C, X>) -> Self {
        match self.actions.iter_mut().find(|(k, _)| *k == action) {
            Some((_, branches)) => branches.push(branch),
            None => self.actions.push((action, vec![branch])),
        }
        self
    }

    pub fn on_enter(mut self, state: S, hook: Hook<C, X>) -> Self {
        self.on_enter.insert(state, hook);
        self
    }

    pub fn on_exit(mut self, state: S, hook: Hook<C, X>) -> Self {
        self.on_exit.insert(state, hook);
        self
    }

    fn branches(&self, action: K) -> &[Branch<S, C, X>] {
        self.actions
            .iter()
            .find(|(k, _)| *k == action)
            .map_or(&[], |(_, branches)| branches.as_slice())
    }

    /// Seleciona o ramo a tomar, sem efeitos colaterais
    fn select(&self, state: S, action: K, context: &C) -> Result<&Branch<S, C, X>, Rejection> {
        let mut leaving = self
            .branches(action)
            .iter()
            .filter(|branch| branch.leaves(state))
            .peekable();

        if leaving.peek().is_none() {
            return Err(Rejection::Undefined);
        }

        leaving
            .find(|branch| branch.admits(context))
            .ok_or(Rejection::GuardsFailed)
    }

    /// Dispara uma ação. Em caso de rejeição, estado e contexto ficam intactos.
    pub fn fire(&self, state: &mut S, action: K, context: &mut C, env: &X) -> Result<Fired<S>, Rejection> {
        let branch = self.select(*state, action, context)?;
        let from = *state;
        let to = branch.target;

        if let Some(before) = branch.before {
            before(context, env);
        }
        if let Some(exit) = self.on_exit.get(&from) {
            exit(context, env);
        }
        *state = to;
        if let Some(enter) = self.on_enter.get(&to) {
            enter(context, env);
        }

        Ok(Fired { from, to })
    }

    /// Ações com algum ramo saindo de `state`, em ordem de declaração
    pub fn defined_from(&self, state: S) -> Vec<K> {
        self.actions
            .iter()
            .filter(|(_, branches)| branches.iter().any(|b| b.leaves(state)))
            .map(|(k, _)| *k)
            .collect()
    }

    /// Ações que seriam aceitas agora (algum guard passa)
    pub fn enabled_from(&self, state: S, context: &C) -> Vec<K> {
        self.actions
            .iter()
            .filter(|(k, _)| self.select(state, *k, context).is_ok())
            .map(|(k, _)| *k)
            .collect()
    }
}

impl<S, K, C, X> Default for TransitionTable<S, K, C, X>
where
    S: Copy + Eq + Hash,
    K: Copy + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

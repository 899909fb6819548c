//! Máquina de estados do checkpoint
//!
//! | ação | origem | destino | guard |
//! |---|---|---|---|
//! | walk_up | idle | detected | — |
//! | open(id) | detected | scanning | — |
//! | hack | detected | hacking | — |
//! | identify | scanning | allowed | id aceito |
//! | identify | scanning | scanning | id recusado e sem flag de detenção |
//! | detain | scanning | detained | tentativas ≥ máximo |
//! | catch | hacking | detained | — |
//! | ignore | hacking | allowed | — |
//! | move_on | detained, allowed | idle | — |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::error::{CoreError, CoreResult};
use crate::events::{EventKind, SecurityEvent};
use crate::machine::action::{Action, ActionKind};
use crate::machine::context::{DEFAULT_MAX_TRIES, PersonId, SecurityContext};
use crate::machine::engine::{Branch, Rejection, TransitionTable};
use crate::machine::state::State;

/// Configuração da máquina
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Identificadores aceitos
    #[serde(default)]
    pub allow_list: BTreeSet<PersonId>,
    /// Tentativas antes de `detain` ser permitido
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
}

fn default_max_tries() -> u32 {
    DEFAULT_MAX_TRIES
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            allow_list: BTreeSet::new(),
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

/// O que os hooks recebem: a ação em curso e o bus onde publicar
pub(crate) struct Effects {
    action: Action,
    bus: EventBus,
}

impl Effects {
    /// Publica de forma síncrona. Falhas de assinantes são registradas e não
    /// desfazem a transição.
    fn publish(&self, event: SecurityEvent) {
        match self.bus.notify(&event) {
            Ok(report) if !report.is_clean() => {
                warn!(
                    kind = %event.kind,
                    failed = report.failures.len(),
                    "subscribers failed while handling transition event"
                );
            }
            Ok(_) => {}
            Err(err) => warn!(kind = %event.kind, error = %err, "event dispatch failed"),
        }
    }
}

type SecurityTable = TransitionTable<State, ActionKind, SecurityContext, Effects>;

// ═══════════════════════════════════════════════════════════════════════════════
// GUARDS E HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

fn id_accepted(ctx: &SecurityContext) -> bool {
    ctx.id_accepted()
}

fn may_retry(ctx: &SecurityContext) -> bool {
    !ctx.id_accepted() && !ctx.detain_flag()
}

fn tries_exhausted(ctx: &SecurityContext) -> bool {
    ctx.tries_exhausted()
}

fn with_person(event: SecurityEvent, ctx: &SecurityContext) -> SecurityEvent {
    match ctx.presented_id() {
        Some(id) => event.with("id", id),
        None => event,
    }
}

fn before_walk_up(_ctx: &mut SecurityContext, fx: &Effects) {
    fx.publish(SecurityEvent::new(EventKind::PersonDetected));
}

fn before_open(ctx: &mut SecurityContext, fx: &Effects) {
    if let Action::Open(id) = fx.action {
        ctx.present(id);
    }
}

fn before_identify(ctx: &mut SecurityContext, fx: &Effects) {
    let attempt = ctx.record_attempt();
    fx.publish(with_person(SecurityEvent::new(EventKind::PersonIdAttempt), ctx).with("attempt", attempt));

    let outcome = if ctx.id_accepted() {
        EventKind::PersonIdSuccess
    } else {
        EventKind::PersonIdFail
    };
    fx.publish(with_person(SecurityEvent::new(outcome), ctx));
}

fn enter_allowed(ctx: &mut SecurityContext, fx: &Effects) {
    fx.publish(with_person(SecurityEvent::new(EventKind::PersonEnter), ctx));
}

fn enter_detained(ctx: &mut SecurityContext, fx: &Effects) {
    fx.publish(
        with_person(SecurityEvent::new(EventKind::PersonDetained), ctx).with("tries", ctx.current_tries()),
    );
}

fn enter_idle(ctx: &mut SecurityContext, _fx: &Effects) {
    ctx.reset_person();
}

fn security_table() -> SecurityTable {
    use State::*;

    TransitionTable::new()
        .branch(ActionKind::WalkUp, Branch::new(&[Idle], Detected).before(before_walk_up))
        .branch(ActionKind::Open, Branch::new(&[Detected], Scanning).before(before_open))
        .branch(ActionKind::Hack, Branch::new(&[Detected], Hacking))
        .branch(
            ActionKind::Identify,
            Branch::new(&[Scanning], Allowed).guard(id_accepted).before(before_identify),
        )
        .branch(
            ActionKind::Identify,
            Branch::new(&[Scanning], Scanning).guard(may_retry).before(before_identify),
        )
        .branch(ActionKind::Detain, Branch::new(&[Scanning], Detained).guard(tries_exhausted))
        .branch(ActionKind::Catch, Branch::new(&[Hacking], Detained))
        .branch(ActionKind::Ignore, Branch::new(&[Hacking], Allowed))
        .branch(ActionKind::MoveOn, Branch::new(&[Detained, Allowed], Idle))
        .on_enter(Allowed, enter_allowed)
        .on_enter(Detained, enter_detained)
        .on_enter(Idle, enter_idle)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MÁQUINA
// ═══════════════════════════════════════════════════════════════════════════════

/// Máquina de estados de segurança
///
/// Publica eventos no [`EventBus`] recebido; não conhece câmeras nem logger.
pub struct SecurityStateMachine {
    state: State,
    context: SecurityContext,
    bus: EventBus,
    table: SecurityTable,
}

impl SecurityStateMachine {
    pub fn new(bus: EventBus, config: MachineConfig) -> Self {
        Self {
            state: State::INITIAL,
            context: SecurityContext::new(config.allow_list, config.max_tries),
            bus,
            table: security_table(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &SecurityContext {
        &self.context
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Dispara uma ação
    ///
    /// Rejeições deixam estado e contexto inalterados. Eventos publicados
    /// pelos hooks são entregues antes do retorno.
    pub fn fire(&mut self, action: Action) -> CoreResult<State> {
        let kind = action.kind();
        let effects = Effects {
            action,
            bus: self.bus.clone(),
        };

        match self.table.fire(&mut self.state, kind, &mut self.context, &effects) {
            Ok(fired) => {
                info!(action = %kind, from = %fired.from, to = %fired.to, "transition");
                Ok(fired.to)
            }
            Err(rejection) => {
                debug!(
                    action = %kind,
                    state = %self.state,
                    undefined = rejection == Rejection::Undefined,
                    "action rejected"
                );
                Err(CoreError::InvalidTransition {
                    action: kind.to_string(),
                    state: self.state,
                })
            }
        }
    }

    /// Dispara uma ação pelo nome (interface do driver)
    pub fn perform(&mut self, name: &str, args: &[&str]) -> CoreResult<State> {
        let action = Action::parse(name, args)?;
        self.fire(action)
    }

    /// Ações definidas a partir do estado atual
    pub fn available_actions(&self) -> Vec<ActionKind> {
        self.table.defined_from(self.state)
    }

    /// Ações cujo guard passa no contexto atual
    pub fn enabled_actions(&self) -> Vec<ActionKind> {
        self.table.enabled_from(self.state, &self.context)
    }

    pub fn walk_up(&mut self) -> CoreResult<State> {
        self.fire(Action::WalkUp)
    }

    pub fn open(&mut self, id: PersonId) -> CoreResult<State> {
        self.fire(Action::Open(id))
    }

    pub fn hack(&mut self) -> CoreResult<State> {
        self.fire(Action::Hack)
    }

    pub fn identify(&mut self) -> CoreResult<State> {
        self.fire(Action::Identify)
    }

    pub fn detain(&mut self) -> CoreResult<State> {
        self.fire(Action::Detain)
    }

    pub fn catch(&mut self) -> CoreResult<State> {
        self.fire(Action::Catch)
    }

    pub fn ignore(&mut self) -> CoreResult<State> {
        self.fire(Action::Ignore)
    }

    pub fn move_on(&mut self) -> CoreResult<State> {
        self.fire(Action::MoveOn)
    }
}

impl std::fmt::Debug for SecurityStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityStateMachine")
            .field("state", &self.state)
            .field("context", &self.context)
            .finish()
    }
}

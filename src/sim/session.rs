//! Session controller
//!
//! The single authority on the session phase. It is the only machine that
//! announces `startGame`, `levelUp` and `restart` on the global channel, and
//! it owns the level / match counters.

use super::event::{Event, EventName, ItemType, Payload, TargetColor};
use super::machine::{Behavior, Context, Rule, Scope};
use super::state::SessionState;
use crate::audio::Cue;
use crate::tuning::SessionTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the first press
    Start,
    Playing,
    GameOver,
}

pub struct SessionController {
    tuning: SessionTuning,
    state: SessionState,
}

impl SessionController {
    pub fn new(tuning: SessionTuning) -> Self {
        Self {
            tuning,
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn handle_drop(&mut self, item: ItemType, target: TargetColor, ctx: &mut Context<'_>) {
        if !self.state.active {
            return;
        }

        if item.matches(target) {
            self.state.matched_count += 1;
            ctx.cue(Cue::Match);
        } else {
            log::info!("{:?} dropped on a {:?} house - game over", item, target);
            ctx.dispatch(Event::global(EventName::GameOver));
        }

        if self.state.matched_count >= self.state.level_up_threshold(self.tuning.matches_per_level) {
            self.state.level += 1;
            self.state.matched_count = 0;
            log::info!("Level up: now level {}", self.state.level);
            ctx.dispatch(Event::global(EventName::LevelUp));
            ctx.cue(Cue::LevelUp);
        }
    }
}

impl Behavior for SessionController {
    type State = SessionPhase;
    const NAME: &'static str = "session";
    const INITIAL: SessionPhase = SessionPhase::Start;
    const RULES: &'static [Rule<SessionPhase, Self>] = &[
        Rule::handle(SessionPhase::Start, EventName::PrimaryInput, Scope::Own),
        Rule::on(SessionPhase::Start, EventName::StartGame, Scope::Global, SessionPhase::Playing),
        Rule::handle(SessionPhase::Playing, EventName::DropItem, Scope::Global),
        Rule::on(SessionPhase::Playing, EventName::GameOver, Scope::Global, SessionPhase::GameOver),
        Rule::handle(SessionPhase::GameOver, EventName::PrimaryInput, Scope::Own),
        Rule::on(SessionPhase::GameOver, EventName::Restart, Scope::Global, SessionPhase::Start),
    ];

    fn on_enter(&mut self, state: SessionPhase, ctx: &mut Context<'_>) {
        match state {
            SessionPhase::Start => self.state = SessionState::new(),
            SessionPhase::Playing => log::info!("Session started"),
            SessionPhase::GameOver => {
                self.state.active = false;
                log::info!(
                    "Game over at level {} ({} matched)",
                    self.state.level,
                    self.state.matched_count
                );
                ctx.cue(Cue::GameOver);
            }
        }
    }

    fn on_event(&mut self, state: SessionPhase, event: &Event, ctx: &mut Context<'_>) {
        match (state, event.name) {
            (SessionPhase::Start, EventName::PrimaryInput) => {
                ctx.dispatch(Event::global(EventName::StartGame));
            }
            (SessionPhase::GameOver, EventName::PrimaryInput) => {
                ctx.dispatch(Event::global(EventName::Restart));
            }
            (SessionPhase::Playing, EventName::DropItem) => {
                if let Payload::Drop { item, target } = event.payload {
                    self.handle_drop(item, target, ctx);
                }
            }
            _ => {}
        }
    }
}

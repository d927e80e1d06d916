//! Thread-safe handle around a [`GameSession`].
//!
//! Every call takes the one lock, so submissions are serialized per session
//! and a resolution never overlaps a submission.

use crate::resolver::DayOutcome;
use crate::session::{GameSession, PlayerView};
use sim_core::{Decision, PlayerId, RawDecision, StateError, ValidationError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug)]
pub struct SharedSession {
    inner: Arc<Mutex<GameSession>>,
}

impl SharedSession {
    pub fn new(session: GameSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    // A panicked holder cannot leave a half-committed day behind, so the
    // state behind a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut GameSession) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn submit_decision(
        &self,
        player: PlayerId,
        day: u32,
        raw: RawDecision,
    ) -> Result<Decision, ValidationError> {
        self.lock().submit_decision(player, day, raw)
    }

    pub fn resolve_day(&self, day: u32) -> Result<DayOutcome, StateError> {
        self.lock().resolve_day(day)
    }

    pub fn process_day(&self) -> Result<DayOutcome, StateError> {
        self.lock().process_day()
    }

    pub fn player_view(&self, player: PlayerId) -> Option<PlayerView> {
        self.lock().player_view(player)
    }

    /// Consistent copy of the whole session, e.g. for saving.
    pub fn snapshot(&self) -> GameSession {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{GameConfig, Resource};
    use std::thread;

    #[test]
    fn concurrent_submissions_all_land_before_resolution() {
        let mut session = GameSession::new(GameConfig::default(), 3).unwrap();
        let ids: Vec<PlayerId> = (0..6)
            .map(|i| session.login(&format!("p{i}"), "T").unwrap())
            .collect();
        let shared = SharedSession::new(session);

        thread::scope(|scope| {
            for (n, id) in ids.iter().enumerate() {
                let shared = shared.clone();
                scope.spawn(move || {
                    for effort in 1..=5u32 {
                        let mut raw = RawDecision::default();
                        raw.mining[Resource::ALL[n % 4]] = effort;
                        shared.submit_decision(*id, 1, raw).unwrap();
                    }
                });
            }
        });

        assert_eq!(shared.with(|s| s.pending_count()), 6);
        let out = shared.process_day().unwrap();
        assert!(out.report.absentees.is_empty());
        // each tribe's last submission (effort 5) is the one that played
        for (_, decision) in &out.decisions {
            assert_eq!(decision.mining.total(), 5);
        }
        assert_eq!(
            shared.submit_decision(ids[0], 1, RawDecision::default()),
            Err(ValidationError::DayAlreadyResolved { day: 1, current: 2 })
        );
        assert_eq!(shared.snapshot().current_day(), 2);
    }
}

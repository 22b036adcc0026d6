use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

pub const DEFAULT_AMOUNT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Per-user interaction state. Only lives in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Session {
    Idle,
    /// The next free-text message of the user is read as a donation amount.
    AwaitingAmount { since: DateTime<Utc> },
}

/// Sessions keyed by chat user id. A session is created when the user asks
/// to donate and removed once an amount is submitted or `timeout` has passed
/// since the request; absence means idle.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<i64, Session>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    /// Starts waiting for an amount from `user_id`. Sessions abandoned by
    /// other users are dropped on the way.
    pub fn await_amount(&self, user_id: i64) {
        let now = Utc::now();
        self.sessions
            .retain(|_, session| !self.is_expired(session, now));
        self.sessions
            .insert(user_id, Session::AwaitingAmount { since: now });
    }

    pub fn get(&self, user_id: i64) -> Session {
        let now = Utc::now();
        self.sessions
            .remove_if(&user_id, |_, session| self.is_expired(session, now));
        self.sessions
            .get(&user_id)
            .map(|session| *session)
            .unwrap_or(Session::Idle)
    }

    pub fn is_awaiting_amount(&self, user_id: i64) -> bool {
        matches!(self.get(user_id), Session::AwaitingAmount { .. })
    }

    /// Resets the user to idle. Returns whether a session existed.
    pub fn finish(&self, user_id: i64) -> bool {
        self.sessions.remove(&user_id).is_some()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        match session {
            Session::Idle => true,
            Session::AwaitingAmount { since } => {
                // Negative when the clock went backwards; never expires.
                let elapsed = (now - *since).to_std();
                elapsed.is_ok_and(|elapsed| elapsed >= self.timeout)
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_AMOUNT_TIMEOUT)
    }
}

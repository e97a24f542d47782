//! Calorie tracker sessions.
//!
//! Every session owns its own food log and calorie target. The store is
//! owned by the HTTP shell, which creates sessions when a client starts
//! tracking and drops them when the client ends the session or leaves it
//! idle past the timeout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::InputError;
use crate::food_log::FoodLog;
use crate::goal::check_range;

/// Default daily calorie target offered by the tracker form.
pub const DEFAULT_TARGET_CALORIES: f64 = 2000.0;

/// Accepted bounds for the daily calorie target.
pub const MIN_TARGET_CALORIES: f64 = 500.0;
pub const MAX_TARGET_CALORIES: f64 = 5000.0;

pub type SessionId = Uuid;

/// State of one calorie tracker session.
#[derive(Debug, Clone)]
pub struct Session {
    pub log: FoodLog,
    target_calories: f64,
}

impl Session {
    pub fn new(target_calories: f64) -> Result<Self, InputError> {
        validate_target(target_calories)?;
        Ok(Self {
            log: FoodLog::new(),
            target_calories,
        })
    }

    pub fn target_calories(&self) -> f64 {
        self.target_calories
    }

    pub fn set_target_calories(&mut self, target_calories: f64) -> Result<(), InputError> {
        validate_target(target_calories)?;
        self.target_calories = target_calories;
        Ok(())
    }
}

fn validate_target(target_calories: f64) -> Result<(), InputError> {
    check_range(
        "target_calories",
        target_calories,
        MIN_TARGET_CALORIES,
        MAX_TARGET_CALORIES,
    )
}

/// Sessions idle longer than this are dropped when a new one starts.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Upper bound on concurrently held sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug)]
struct Slot {
    session: Session,
    last_active: Instant,
}

/// Independent sessions keyed by id.
///
/// Abandoned sessions are reclaimed lazily: starting a session first drops
/// every session idle past the timeout, then the least recently used one if
/// the store is still full.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Slot>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    /// Starts a new session and returns its id.
    pub fn create(&mut self, target_calories: f64) -> Result<SessionId, InputError> {
        self.create_at(target_calories, Instant::now())
    }

    fn create_at(&mut self, target_calories: f64, now: Instant) -> Result<SessionId, InputError> {
        let session = Session::new(target_calories)?;

        self.evict_idle(now);
        if self.sessions.len() >= self.max_sessions {
            self.evict_least_recent();
        }

        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Slot {
                session,
                last_active: now,
            },
        );
        log::info!("Session {} started ({} active)", id, self.sessions.len());
        Ok(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id).map(|slot| &slot.session)
    }

    /// Mutable access; counts as activity for the idle timeout.
    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        let slot = self.sessions.get_mut(id)?;
        slot.last_active = Instant::now();
        Some(&mut slot.session)
    }

    /// Ends a session, discarding its log. Returns false if it did not exist.
    pub fn end(&mut self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            log::info!("Session {} ended", id);
        }
        removed
    }

    /// Drops sessions idle longer than the timeout. Returns how many.
    pub fn evict_idle(&mut self, now: Instant) -> usize {
        let timeout = self.idle_timeout;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, slot| now.saturating_duration_since(slot.last_active) <= timeout);

        let evicted = before - self.sessions.len();
        if evicted > 0 {
            log::info!("Expired {} idle session(s)", evicted);
        }
        evicted
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, slot)| slot.last_active)
            .map(|(id, _)| *id);

        if let Some(id) = oldest {
            self.sessions.remove(&id);
            log::warn!("Session limit {} reached, dropped session {}", self.max_sessions, id);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FoodItem, Macros};
    use chrono::NaiveDate;

    #[test]
    fn test_session_target_validation() {
        assert!(Session::new(DEFAULT_TARGET_CALORIES).is_ok());
        assert!(Session::new(499.0).is_err());
        assert!(Session::new(5001.0).is_err());

        let mut session = Session::new(2000.0).unwrap();
        assert!(session.set_target_calories(100.0).is_err());
        assert_eq!(session.target_calories(), 2000.0);
        session.set_target_calories(2500.0).unwrap();
        assert_eq!(session.target_calories(), 2500.0);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut store = SessionStore::new();
        let a = store.create(2000.0).unwrap();
        let b = store.create(1800.0).unwrap();
        assert_ne!(a, b);

        let item = FoodItem::new("Rice", Macros::new(130.0, 2.7, 28.0, 0.3));
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        store
            .get_mut(&a)
            .unwrap()
            .log
            .add_or_update_entry(date, "Rice", 100.0, &item);

        assert_eq!(store.get(&a).unwrap().log.entry_count(), 1);
        assert!(store.get(&b).unwrap().log.is_empty());
    }

    #[test]
    fn test_end_session() {
        let mut store = SessionStore::new();
        let id = store.create(2000.0).unwrap();
        assert_eq!(store.len(), 1);

        assert!(store.end(&id));
        assert!(!store.end(&id));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_idle_sessions_expire_on_create() {
        let timeout = Duration::from_secs(60);
        let mut store = SessionStore::with_limits(10, timeout);
        let t0 = Instant::now();

        let stale = store.create_at(2000.0, t0).unwrap();
        let recent = store.create_at(2000.0, t0 + Duration::from_secs(30)).unwrap();

        let fresh = store
            .create_at(2000.0, t0 + timeout + Duration::from_secs(1))
            .unwrap();

        assert!(store.get(&stale).is_none());
        assert!(store.get(&recent).is_some());
        assert!(store.get(&fresh).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_session_cap_drops_least_recent() {
        let mut store = SessionStore::with_limits(2, DEFAULT_IDLE_TIMEOUT);
        let t0 = Instant::now();

        let first = store.create_at(2000.0, t0).unwrap();
        let second = store.create_at(2000.0, t0 + Duration::from_secs(1)).unwrap();
        let third = store.create_at(2000.0, t0 + Duration::from_secs(2)).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn test_invalid_target_does_not_evict() {
        let mut store = SessionStore::with_limits(1, DEFAULT_IDLE_TIMEOUT);
        let id = store.create(2000.0).unwrap();

        assert!(store.create(10.0).is_err());
        assert!(store.get(&id).is_some());
    }
}

//! Caller identity and salon access.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use common::{SalonId, UserId};

use crate::error::AuthorizationError;

/// Resolves who is calling and whether they may manage a salon.
#[async_trait]
pub trait AccessGuard: Send + Sync {
    /// Resolves the authenticated caller for a request against `salon_id`.
    async fn resolve_caller(&self, salon_id: SalonId) -> Result<UserId, AuthorizationError>;

    /// Returns true if `user_id` may manage the salon's catalog.
    async fn can_access_salon(
        &self,
        salon_id: SalonId,
        user_id: UserId,
    ) -> Result<bool, AuthorizationError>;
}

#[derive(Debug, Default)]
struct InMemoryAccessState {
    session: Option<UserId>,
    grants: HashSet<(SalonId, UserId)>,
    allow_all: bool,
    fail_on_check: bool,
    checks: usize,
}

/// In-memory access guard for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessGuard {
    state: Arc<RwLock<InMemoryAccessState>>,
}

impl InMemoryAccessGuard {
    /// Creates a guard with no session and no grants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a guard that lets every caller into every salon.
    pub fn allowing_all() -> Self {
        let guard = Self::new();
        guard.write().allow_all = true;
        guard
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryAccessState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryAccessState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the caller returned by `resolve_caller`.
    pub fn sign_in(&self, user_id: UserId) {
        self.write().session = Some(user_id);
    }

    /// Lets `user_id` manage `salon_id`.
    pub fn grant(&self, salon_id: SalonId, user_id: UserId) {
        self.write().grants.insert((salon_id, user_id));
    }

    /// Configures access checks to fail as unavailable.
    pub fn set_fail_on_check(&self, fail: bool) {
        self.write().fail_on_check = fail;
    }

    /// Returns the number of access checks performed.
    pub fn check_count(&self) -> usize {
        self.read().checks
    }
}

#[async_trait]
impl AccessGuard for InMemoryAccessGuard {
    async fn resolve_caller(&self, _salon_id: SalonId) -> Result<UserId, AuthorizationError> {
        self.read()
            .session
            .ok_or(AuthorizationError::NotAuthenticated)
    }

    async fn can_access_salon(
        &self,
        salon_id: SalonId,
        user_id: UserId,
    ) -> Result<bool, AuthorizationError> {
        let mut state = self.write();
        state.checks += 1;

        if state.fail_on_check {
            return Err(AuthorizationError::Unavailable(
                "access service unreachable".to_string(),
            ));
        }

        Ok(state.allow_all || state.grants.contains(&(salon_id, user_id)))
    }
}

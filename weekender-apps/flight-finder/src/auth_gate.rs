//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Auth Gate
//!
//! Password login for chat callers. The authorized set lives only in memory:
//! empty at startup, grown by successful logins, never persisted or expired.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::config::ConfigError;

/// Opaque caller identity, as given by the front end (chat user id, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted,
    AlreadyAuthorized,
    Denied,
}

impl LoginOutcome {
    pub fn is_granted(self) -> bool {
        !matches!(self, LoginOutcome::Denied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("caller {0} is not authenticated")]
pub struct AuthError(pub CallerId);

#[derive(Debug)]
pub struct AuthGate {
    password: String,
    authorized: RwLock<HashSet<CallerId>>,
}

impl AuthGate {
    /// An empty password is refused: it would let an empty login succeed.
    pub fn new(password: impl Into<String>) -> Result<Self, ConfigError> {
        let password = password.into();
        if password.is_empty() {
            return Err(ConfigError::EmptyGatePassword);
        }
        Ok(Self {
            password,
            authorized: RwLock::new(HashSet::new()),
        })
    }

    pub fn authorize(&self, caller: &CallerId, supplied_password: &str) -> LoginOutcome {
        if self.is_authorized(caller) {
            return LoginOutcome::AlreadyAuthorized;
        }
        if supplied_password != self.password {
            tracing::warn!("Rejected login attempt from {}", caller);
            return LoginOutcome::Denied;
        }
        self.authorized
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(caller.clone());
        tracing::info!("Caller {} authenticated", caller);
        LoginOutcome::Granted
    }

    pub fn is_authorized(&self, caller: &CallerId) -> bool {
        self.authorized
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(caller)
    }

    /// Guard clause for gated entry points.
    pub fn check(&self, caller: &CallerId) -> Result<(), AuthError> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            tracing::warn!("Unauthenticated access attempt by {}", caller);
            Err(AuthError(caller.clone()))
        }
    }

    pub fn authorized_count(&self) -> usize {
        self.authorized
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

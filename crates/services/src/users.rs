use std::sync::Arc;

use storage::repository::UserRepository;

use crate::admin::AdminGate;
use crate::error::SessionError;

/// Trainee registry as seen from the login screen.
#[derive(Clone)]
pub struct UserService {
    gate: AdminGate,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(gate: AdminGate, users: Arc<dyn UserRepository>) -> Self {
        Self { gate, users }
    }

    /// Registered trainees, without the admin entry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the registry cannot be read.
    pub async fn visible_users(&self) -> Result<Vec<String>, SessionError> {
        let users = self.users.list_users().await?;
        Ok(users
            .into_iter()
            .filter(|name| !self.gate.is_admin(name))
            .collect())
    }

    /// Register `name`; returns false if it was already known.
    ///
    /// The admin passphrase is never stored as a trainee.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyUser` for a blank name, or a storage error.
    pub async fn register(&self, name: &str) -> Result<bool, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyUser);
        }
        if self.gate.is_admin(name) {
            return Ok(false);
        }
        let added = self.users.add_user(name).await?;
        if added {
            tracing::info!(user = name, "trainee registered");
        }
        Ok(added)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` on read failures.
    pub async fn avatar(&self, user: &str) -> Result<String, SessionError> {
        Ok(self.users.get_user_avatar(user).await?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` on write failures.
    pub async fn set_avatar(&self, user: &str, avatar: &str) -> Result<(), SessionError> {
        self.users.save_user_avatar(user, avatar).await?;
        Ok(())
    }
}

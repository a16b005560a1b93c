use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::admin::{AdminGate, AdminService};
use crate::error::AppServicesError;
use crate::sessions::TrainingService;
use crate::users::UserService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    gate: AdminGate,
    training: Arc<TrainingService>,
    users: Arc<UserService>,
    admin: Arc<AdminService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// The question bank is read once so a fresh database gets the bundled
    /// defaults right away.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        gate: AdminGate,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let categories = storage.content.get_question_bank().await?;
        tracing::debug!(categories = categories.len(), "question bank ready");
        Ok(Self::from_storage(&storage, clock, gate))
    }

    /// Build services over process-local storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, AdminGate::default())
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, gate: AdminGate) -> Self {
        let training = Arc::new(TrainingService::new(
            clock,
            Arc::clone(&storage.content),
            Arc::clone(&storage.history),
        ));
        let users = Arc::new(UserService::new(gate.clone(), Arc::clone(&storage.users)));
        let admin = Arc::new(AdminService::new(gate.clone(), storage));
        Self {
            gate,
            training,
            users,
            admin,
        }
    }

    #[must_use]
    pub fn gate(&self) -> &AdminGate {
        &self.gate
    }

    #[must_use]
    pub fn training(&self) -> Arc<TrainingService> {
        Arc::clone(&self.training)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }
}

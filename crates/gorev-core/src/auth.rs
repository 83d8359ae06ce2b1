//! Login, registration and logout.
//!
//! Identity numbers are gated by [`validate_identity_number`] and nothing
//! else. Users inserted directly into storage (the seeded admin) are never
//! re-validated.

use thiserror::Error;

use crate::identity::validate_identity_number;
use crate::manager::TaskManager;
use crate::model::{new_id, User};
use crate::storage::{StorageError, Store};

/// Errors from auth operations.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid identity number")]
    InvalidIdentity,

    #[error("No user registered with this identity number")]
    UserNotFound,

    #[error("A user with this identity number is already registered")]
    AlreadyRegistered,

    #[error("Name is required")]
    NameRequired,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl<S: Store> TaskManager<S> {
    /// The logged-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Log in as the user registered under `identity_number`.
    pub fn login(&mut self, identity_number: &str) -> Result<&User, AuthError> {
        if !validate_identity_number(identity_number) {
            return Err(AuthError::InvalidIdentity);
        }

        let user = self
            .repo
            .users()?
            .into_iter()
            .find(|u| u.identity_number == identity_number)
            .ok_or(AuthError::UserNotFound)?;

        self.repo.save_current_user(Some(&user))?;
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(&*self.current.insert(user))
    }

    /// Register a new non-admin user and log in as them.
    pub fn register(&mut self, identity_number: &str, name: &str) -> Result<&User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::NameRequired);
        }

        if !validate_identity_number(identity_number) {
            return Err(AuthError::InvalidIdentity);
        }

        let mut users = self.repo.users()?;
        if users.iter().any(|u| u.identity_number == identity_number) {
            return Err(AuthError::AlreadyRegistered);
        }

        let user = User {
            id: new_id(),
            identity_number: identity_number.to_string(),
            name: name.to_string(),
            is_admin: false,
        };
        users.push(user.clone());
        self.repo.save_users(&users)?;
        self.repo.save_current_user(Some(&user))?;

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(&*self.current.insert(user))
    }

    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.repo.save_current_user(None)?;
        if let Some(user) = self.current.take() {
            tracing::info!(user_id = %user.id, "Logged out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::storage::{MemoryStore, Repository};

    fn manager() -> TaskManager<MemoryStore> {
        TaskManager::open(Repository::new(MemoryStore::new()), &SeedConfig::default()).unwrap()
    }

    #[test]
    fn test_register_logs_in() {
        let mut m = manager();
        let user = m.register("10000000146", "  Ayşe Yılmaz ").unwrap().clone();

        assert_eq!(user.name, "Ayşe Yılmaz");
        assert!(!user.is_admin);
        assert!(m.is_authenticated());
        assert_eq!(m.repository().current_user().unwrap(), Some(user));
        assert_eq!(m.users().unwrap().len(), 2);
    }

    #[test]
    fn test_register_rejects_invalid_identity() {
        let mut m = manager();
        assert!(matches!(
            m.register("12345678911", "Ali"),
            Err(AuthError::InvalidIdentity)
        ));
        assert!(!m.is_authenticated());
    }

    #[test]
    fn test_register_requires_name() {
        let mut m = manager();
        assert!(matches!(
            m.register("10000000146", "   "),
            Err(AuthError::NameRequired)
        ));
    }

    #[test]
    fn test_register_duplicate() {
        let mut m = manager();
        m.register("10000000146", "Ayşe").unwrap();
        m.logout().unwrap();
        assert!(matches!(
            m.register("10000000146", "Someone Else"),
            Err(AuthError::AlreadyRegistered)
        ));
    }

    #[test]
    fn test_login_roundtrip() {
        let mut m = manager();
        let id = m.register("12345678950", "Mehmet").unwrap().id.clone();
        m.logout().unwrap();
        assert!(m.current_user().is_none());
        assert!(m.repository().current_user().unwrap().is_none());

        let user = m.login("12345678950").unwrap();
        assert_eq!(user.id, id);
    }

    #[test]
    fn test_login_unknown_user() {
        let mut m = manager();
        assert!(matches!(m.login("10000000146"), Err(AuthError::UserNotFound)));
    }

    #[test]
    fn test_seeded_demo_admin_cannot_pass_login() {
        // The default seed is stored directly and is not checksum-valid.
        let mut m = manager();
        assert!(matches!(m.login("12345678910"), Err(AuthError::InvalidIdentity)));
    }

    #[test]
    fn test_valid_seed_admin_can_log_in() {
        let seed = SeedConfig {
            identity_number: "10000000146".to_string(),
            ..SeedConfig::default()
        };
        let mut m = TaskManager::open(Repository::new(MemoryStore::new()), &seed).unwrap();
        let admin = m.login("10000000146").unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.id, "1");
    }
}

//! The task manager: session state plus the tasks it can see.

use crate::config::{Config, SeedConfig};
use crate::model::{Task, User};
use crate::storage::{Repository, StorageError, Store};

/// Owns the repository and the in-memory session.
///
/// Auth operations live in [`crate::auth`], task operations in
/// [`crate::tasks`]. Every mutation is written through to the store before
/// it returns.
#[derive(Debug)]
pub struct TaskManager<S: Store> {
    pub(crate) repo: Repository<S>,
    pub(crate) current: Option<User>,
    pub(crate) tasks: Vec<Task>,
}

impl<S: Store> TaskManager<S> {
    /// Open a manager over `store` using the configured key prefix and seed.
    pub fn from_config(store: S, config: &Config) -> Result<Self, StorageError> {
        let repo = Repository::with_prefix(store, &config.storage.key_prefix);
        Self::open(repo, &config.seed)
    }

    /// Prepare storage and restore the previous session.
    ///
    /// Drops legacy keys, moves invalid stored records aside, seeds the
    /// admin user into an empty user list, restores the persisted current
    /// user and loads all tasks.
    pub fn open(mut repo: Repository<S>, seed: &SeedConfig) -> Result<Self, StorageError> {
        repo.remove_legacy_keys()?;
        let rejected = repo.set_aside_rejected()?;
        repo.initialize_users(seed)?;

        let current = repo.current_user()?;
        let tasks = repo.tasks()?;

        tracing::debug!(
            restored_user = current.as_ref().map(|u| u.id.as_str()),
            tasks = tasks.len(),
            rejected,
            "Opened task manager"
        );

        Ok(Self {
            repo,
            current,
            tasks,
        })
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn into_repository(self) -> Repository<S> {
        self.repo
    }

    /// All registered users.
    pub fn users(&self) -> Result<Vec<User>, StorageError> {
        self.repo.users()
    }

    /// Write `next` to the store, then make it the in-memory task list.
    ///
    /// On a store error the in-memory list is left untouched.
    pub(crate) fn commit_tasks(&mut self, next: Vec<Task>) -> Result<(), StorageError> {
        self.repo.save_tasks(&next)?;
        self.tasks = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_open_seeds_and_starts_logged_out() {
        let manager = TaskManager::from_config(MemoryStore::new(), &Config::default()).unwrap();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.users().unwrap().len(), 1);
        assert!(manager.tasks.is_empty());
    }

    #[test]
    fn test_open_restores_current_user() {
        let mut repo = Repository::new(MemoryStore::new());
        let user = User {
            id: "u1".to_string(),
            identity_number: "10000000146".to_string(),
            name: "Ayşe".to_string(),
            is_admin: false,
        };
        repo.save_current_user(Some(&user)).unwrap();

        let manager = TaskManager::open(repo, &SeedConfig::default()).unwrap();
        assert_eq!(manager.current_user(), Some(&user));
    }

    #[test]
    fn test_open_keeps_valid_users_beside_a_bad_one() {
        let mut store = MemoryStore::new();
        store
            .set(
                "tasks-management-users",
                r#"[{"id":"u1","tcKimlikNo":"10000000146","name":"Ayşe"},
                    {"id":"u2","tcKimlikNo":"1234","name":"Short"}]"#,
            )
            .unwrap();

        let manager = TaskManager::open(Repository::new(store), &SeedConfig::default()).unwrap();

        let ids: Vec<String> = manager.users().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["u1"]);
        let rejected = manager
            .repository()
            .store()
            .get("tasks-management-users-rejected")
            .unwrap()
            .unwrap();
        assert!(rejected.contains("\"u2\""));
    }
}

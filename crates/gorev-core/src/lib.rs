//! # gorev-core
//!
//! Identity-number validation and per-user task management.
//!
//! The heart of the crate is [`validate_identity_number`], a pure checksum
//! predicate over Turkish national identification numbers. Around it sits a
//! small task manager: users register and log in with an identity number,
//! then create and change tasks scoped to themselves (or to everyone, for
//! admins).
//!
//! ## Key Guarantees
//!
//! 1. **Total validation**: the validator never panics and answers `false`
//!    for any malformed input
//! 2. **Explicit state**: all session and task state lives in a
//!    [`TaskManager`] passed by reference, never in globals
//! 3. **Checked storage**: every persisted record is schema-validated on read,
//!    and a bad record never takes valid ones down with it
//!
//! ## Example
//!
//! ```rust,ignore
//! use gorev_core::{Config, MemoryStore, NewTask, TaskManager, validate_identity_number};
//!
//! assert!(validate_identity_number("10000000146"));
//!
//! let mut manager = TaskManager::from_config(MemoryStore::new(), &Config::default())?;
//! manager.register("12345678950", "Ayşe Yılmaz")?;
//! manager.add_task(NewTask::new("Renew passport"))?;
//! ```

pub mod auth;
pub mod config;
pub mod identity;
pub mod manager;
pub mod model;
pub mod query;
pub mod storage;
pub mod tasks;

// Re-export main types at crate root
pub use auth::AuthError;
pub use config::{Config, ConfigError, SeedConfig, StorageConfig};
pub use identity::{check_digits, validate_identity_number, IdentityError, IdentityNumber};
pub use manager::TaskManager;
pub use model::{NewTask, Priority, Task, TaskStatus, TaskUpdate, User};
pub use query::{Order, SortMode, TaskQuery};
pub use storage::{FileStore, MemoryStore, Repository, StorageError, Store};
pub use tasks::TaskError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_session() {
        let config = Config::default();
        let mut manager = TaskManager::from_config(MemoryStore::new(), &config).unwrap();

        assert!(validate_identity_number("12345678950"));
        manager.register("12345678950", "Ayşe Yılmaz").unwrap();

        let first = manager.add_task(NewTask::new("Renew passport")).unwrap().id.clone();
        manager
            .add_task(NewTask::new("Book dentist").priority(Priority::High))
            .unwrap();
        manager.toggle_task_status(&first).unwrap();

        let listed = TaskQuery::new()
            .sort(SortMode::Priority(Order::Desc))
            .apply(manager.all_tasks());
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Book dentist");
        assert_eq!(listed[1].status, TaskStatus::Complete);
    }
}

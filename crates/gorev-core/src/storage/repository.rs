//! Typed access to users, tasks and the current session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::schema::{validate_record, RecordKind};
use super::{StorageError, Store};
use crate::config::SeedConfig;
use crate::model::{Task, User};

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "tasks-management";

/// Key written by older releases; removed on open.
pub const LEGACY_TASKS_KEY: &str = "tasks";

/// Suffix of the key that holds records moved out of a list.
pub const REJECTED_SUFFIX: &str = "-rejected";

#[derive(Debug, Clone)]
struct Keys {
    tasks: String,
    users: String,
    current_user: String,
}

impl Keys {
    fn new(prefix: &str) -> Self {
        Self {
            tasks: format!("{prefix}-tasks"),
            users: format!("{prefix}-users"),
            current_user: format!("{prefix}-current-user"),
        }
    }
}

/// A list blob split into records that passed validation and raw values
/// that did not.
struct Split<T> {
    records: Vec<T>,
    rejected: Vec<Value>,
}

/// Typed, schema-checked view over a [`Store`].
///
/// Reads never fail on bad data. List elements are checked one by one and a
/// bad element is logged and skipped; a missing or unreadable blob reads as
/// empty. Store errors still propagate.
#[derive(Debug)]
pub struct Repository<S: Store> {
    store: S,
    keys: Keys,
}

impl<S: Store> Repository<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: &str) -> Self {
        Self {
            store,
            keys: Keys::new(prefix),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn tasks(&self) -> Result<Vec<Task>, StorageError> {
        self.read_list(&self.keys.tasks, RecordKind::Task)
    }

    pub fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let key = self.keys.tasks.clone();
        self.write(&key, &tasks)
    }

    pub fn users(&self) -> Result<Vec<User>, StorageError> {
        self.read_list(&self.keys.users, RecordKind::User)
    }

    pub fn save_users(&mut self, users: &[User]) -> Result<(), StorageError> {
        let key = self.keys.users.clone();
        self.write(&key, &users)
    }

    pub fn current_user(&self) -> Result<Option<User>, StorageError> {
        self.read(&self.keys.current_user, RecordKind::User)
    }

    /// Persist the logged-in user, or clear it with `None`.
    pub fn save_current_user(&mut self, user: Option<&User>) -> Result<(), StorageError> {
        let key = self.keys.current_user.clone();
        match user {
            Some(user) => self.write(&key, user),
            None => self.store.remove(&key),
        }
    }

    /// Insert the seed admin if there are no valid users yet.
    ///
    /// Invalid stored users are set aside first, never overwritten. The seed
    /// is written as-is and is not checked against the identity checksum.
    /// Returns `true` if a user was inserted.
    pub fn initialize_users(&mut self, seed: &SeedConfig) -> Result<bool, StorageError> {
        let key = self.keys.users.clone();
        if let Some(split) = self.split_list::<User>(&key, RecordKind::User)? {
            let has_users = !split.records.is_empty();
            self.set_aside(&key, split)?;
            if has_users {
                return Ok(false);
            }
        }

        let admin = User {
            id: seed.id.clone(),
            identity_number: seed.identity_number.clone(),
            name: seed.name.clone(),
            is_admin: true,
        };
        self.save_users(&[admin])?;
        tracing::info!(user_id = %seed.id, "Seeded admin user");
        Ok(true)
    }

    pub fn remove_legacy_keys(&mut self) -> Result<(), StorageError> {
        if self.store.get(LEGACY_TASKS_KEY)?.is_some() {
            tracing::info!(key = LEGACY_TASKS_KEY, "Removing legacy key");
            self.store.remove(LEGACY_TASKS_KEY)?;
        }
        Ok(())
    }

    /// Move records that fail validation out of the user and task lists.
    ///
    /// Rejected records are appended to `<key>-rejected` and the list is
    /// rewritten with the valid records only. Returns how many were moved.
    pub fn set_aside_rejected(&mut self) -> Result<usize, StorageError> {
        let users_key = self.keys.users.clone();
        let tasks_key = self.keys.tasks.clone();

        let mut moved = 0;
        if let Some(split) = self.split_list::<User>(&users_key, RecordKind::User)? {
            moved += self.set_aside(&users_key, split)?;
        }
        if let Some(split) = self.split_list::<Task>(&tasks_key, RecordKind::Task)? {
            moved += self.set_aside(&tasks_key, split)?;
        }
        Ok(moved)
    }

    fn set_aside<T: Serialize>(
        &mut self,
        key: &str,
        split: Split<T>,
    ) -> Result<usize, StorageError> {
        if split.rejected.is_empty() {
            return Ok(0);
        }

        let rejected_key = format!("{key}{REJECTED_SUFFIX}");
        let mut kept = match self.store.get(&rejected_key)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(Value::Array(items)) => items,
                _ => vec![Value::String(raw)],
            },
            None => Vec::new(),
        };
        let count = split.rejected.len();
        kept.extend(split.rejected);

        self.write(&rejected_key, &kept)?;
        self.write(key, &split.records)?;
        tracing::warn!(key, rejected_key = %rejected_key, count, "Moved invalid records aside");
        Ok(count)
    }

    fn read<T: DeserializeOwned>(
        &self,
        key: &str,
        kind: RecordKind,
    ) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored value is not valid JSON, ignoring");
                return Ok(None);
            }
        };

        Ok(decode(key, kind, value).ok())
    }

    fn read_list<T: DeserializeOwned>(
        &self,
        key: &str,
        kind: RecordKind,
    ) -> Result<Vec<T>, StorageError> {
        Ok(self
            .split_list(key, kind)?
            .map(|split| split.records)
            .unwrap_or_default())
    }

    fn split_list<T: DeserializeOwned>(
        &self,
        key: &str,
        kind: RecordKind,
    ) -> Result<Option<Split<T>>, StorageError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        let items = match serde_json::from_str(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                tracing::warn!(key, "Stored list is not an array, ignoring");
                return Ok(Some(Split {
                    records: Vec::new(),
                    rejected: vec![other],
                }));
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Stored value is not valid JSON, ignoring");
                return Ok(Some(Split {
                    records: Vec::new(),
                    rejected: vec![Value::String(raw)],
                }));
            }
        };

        let mut split = Split {
            records: Vec::with_capacity(items.len()),
            rejected: Vec::new(),
        };
        for item in items {
            match decode(key, kind, item) {
                Ok(record) => split.records.push(record),
                Err(item) => split.rejected.push(item),
            }
        }
        Ok(Some(split))
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }
}

/// Validate and deserialize one record, handing the raw value back on failure.
fn decode<T: DeserializeOwned>(key: &str, kind: RecordKind, value: Value) -> Result<T, Value> {
    if let Err(errors) = validate_record(kind, &value) {
        tracing::warn!(key, ?kind, ?errors, "Stored record failed schema validation, skipping");
        return Err(value);
    }

    T::deserialize(&value).map_err(|e| {
        tracing::warn!(key, error = %e, "Stored record has unexpected shape, skipping");
        value
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus};
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn sample_task() -> Task {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        Task {
            id: "t1".to_string(),
            title: "Write report".to_string(),
            description: String::new(),
            status: TaskStatus::Incomplete,
            priority: Priority::High,
            user_id: "1".to_string(),
            user_name: "Admin User".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_missing_values_are_empty() {
        let repo = Repository::new(MemoryStore::new());
        assert!(repo.tasks().unwrap().is_empty());
        assert!(repo.users().unwrap().is_empty());
        assert!(repo.current_user().unwrap().is_none());
    }

    #[test]
    fn test_tasks_roundtrip_with_timestamps() {
        let mut repo = Repository::new(MemoryStore::new());
        repo.save_tasks(&[sample_task()]).unwrap();

        let tasks = repo.tasks().unwrap();
        assert_eq!(tasks, vec![sample_task()]);
    }

    #[test]
    fn test_keys_use_prefix() {
        let mut repo = Repository::with_prefix(MemoryStore::new(), "demo");
        repo.save_tasks(&[]).unwrap();
        assert!(repo.store().get("demo-tasks").unwrap().is_some());
    }

    #[test]
    fn test_garbage_json_reads_as_empty() {
        let mut store = MemoryStore::new();
        store.set("tasks-management-users", "{not json").unwrap();
        let repo = Repository::new(store);
        assert!(repo.users().unwrap().is_empty());
    }

    #[test]
    fn test_non_array_list_reads_as_empty() {
        let mut store = MemoryStore::new();
        store.set("tasks-management-tasks", r#"{"id":"t1"}"#).unwrap();
        let repo = Repository::new(store);
        assert!(repo.tasks().unwrap().is_empty());
    }

    #[test]
    fn test_bad_user_does_not_hide_the_others() {
        let mut store = MemoryStore::new();
        store
            .set(
                "tasks-management-users",
                r#"[{"id":"u1","tcKimlikNo":"10000000146","name":"Ayşe"},
                    {"id":"u2","tcKimlikNo":"1234","name":"Short"}]"#,
            )
            .unwrap();
        let repo = Repository::new(store);

        let users = repo.users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");
    }

    #[test]
    fn test_bad_task_does_not_hide_the_others() {
        let mut store = MemoryStore::new();
        let mut bad = serde_json::to_value(sample_task()).unwrap();
        bad["id"] = "t2".into();
        bad["priority"] = "urgent".into();
        let blob = serde_json::json!([sample_task(), bad]);
        store.set("tasks-management-tasks", &blob.to_string()).unwrap();
        let repo = Repository::new(store);

        assert_eq!(repo.tasks().unwrap(), vec![sample_task()]);
    }

    #[test]
    fn test_set_aside_moves_only_bad_records() {
        let mut store = MemoryStore::new();
        store
            .set(
                "tasks-management-users",
                r#"[{"id":"u1","tcKimlikNo":"10000000146","name":"Ayşe"},
                    {"id":"u2","tcKimlikNo":"1234","name":"Short"}]"#,
            )
            .unwrap();
        let mut repo = Repository::new(store);

        assert_eq!(repo.set_aside_rejected().unwrap(), 1);
        assert_eq!(repo.set_aside_rejected().unwrap(), 0);

        let raw = repo.store().get("tasks-management-users").unwrap().unwrap();
        let kept: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["id"], "u1");

        let raw = repo
            .store()
            .get("tasks-management-users-rejected")
            .unwrap()
            .unwrap();
        let rejected: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0]["tcKimlikNo"], "1234");
    }

    #[test]
    fn test_set_aside_keeps_unreadable_blob() {
        let mut store = MemoryStore::new();
        store.set("tasks-management-tasks", "{not json").unwrap();
        let mut repo = Repository::new(store);

        assert_eq!(repo.set_aside_rejected().unwrap(), 1);
        assert_eq!(
            repo.store().get("tasks-management-tasks").unwrap().as_deref(),
            Some("[]")
        );
        let raw = repo
            .store()
            .get("tasks-management-tasks-rejected")
            .unwrap()
            .unwrap();
        let rejected: Vec<Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(rejected, vec![Value::String("{not json".to_string())]);
    }

    #[test]
    fn test_schema_invalid_blob_reads_as_empty() {
        let mut store = MemoryStore::new();
        store
            .set(
                "tasks-management-current-user",
                r#"{"id":"1","tcKimlikNo":"abc","name":"X"}"#,
            )
            .unwrap();
        let repo = Repository::new(store);
        assert!(repo.current_user().unwrap().is_none());
    }

    #[test]
    fn test_current_user_clear() {
        let mut repo = Repository::new(MemoryStore::new());
        let user = User {
            id: "u1".to_string(),
            identity_number: "10000000146".to_string(),
            name: "Ayşe".to_string(),
            is_admin: false,
        };
        repo.save_current_user(Some(&user)).unwrap();
        assert_eq!(repo.current_user().unwrap(), Some(user));

        repo.save_current_user(None).unwrap();
        assert!(repo.current_user().unwrap().is_none());
    }

    #[test]
    fn test_initialize_users_seeds_once() {
        let mut repo = Repository::new(MemoryStore::new());
        let seed = SeedConfig::default();

        assert!(repo.initialize_users(&seed).unwrap());
        assert!(!repo.initialize_users(&seed).unwrap());

        let users = repo.users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "1");
        assert_eq!(users[0].identity_number, "12345678910");
        assert!(users[0].is_admin);
    }

    #[test]
    fn test_initialize_users_sets_aside_unreadable_users() {
        let mut store = MemoryStore::new();
        store.set("tasks-management-users", "{not json").unwrap();
        let mut repo = Repository::new(store);

        assert!(repo.initialize_users(&SeedConfig::default()).unwrap());
        assert_eq!(repo.users().unwrap().len(), 1);
        assert!(repo
            .store()
            .get("tasks-management-users-rejected")
            .unwrap()
            .is_some_and(|raw| raw.contains("{not json")));
    }

    #[test]
    fn test_remove_legacy_keys() {
        let mut store = MemoryStore::new();
        store.set(LEGACY_TASKS_KEY, "[]").unwrap();
        let mut repo = Repository::new(store);

        repo.remove_legacy_keys().unwrap();
        assert!(repo.store().get(LEGACY_TASKS_KEY).unwrap().is_none());
    }
}

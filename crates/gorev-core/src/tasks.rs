//! Creating, changing and listing tasks.
//!
//! Every operation needs a logged-in user. Non-admins may only touch tasks
//! they own; admins may touch any task.

use chrono::Utc;
use thiserror::Error;

use crate::manager::TaskManager;
use crate::model::{NewTask, Task, TaskStatus, TaskUpdate, User};
use crate::storage::{StorageError, Store};

/// Errors from task operations.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Not allowed to modify task {0}")]
    Forbidden(String),

    #[error("Only admins can assign tasks to other users")]
    AssignmentForbidden,

    #[error("Unknown assignee: {0}")]
    UnknownAssignee(String),

    #[error("Title is required")]
    TitleRequired,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl<S: Store> TaskManager<S> {
    fn require_user(&self) -> Result<&User, TaskError> {
        self.current.as_ref().ok_or(TaskError::NotAuthenticated)
    }

    /// Index of a task the current user may modify.
    fn authorize(&self, task_id: &str) -> Result<usize, TaskError> {
        let user = self.require_user()?;
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        if self.tasks[index].user_id != user.id && !user.is_admin {
            tracing::warn!(task_id, user_id = %user.id, "Rejected modification of another user's task");
            return Err(TaskError::Forbidden(task_id.to_string()));
        }

        Ok(index)
    }

    /// Create a task. The assignee defaults to the current user.
    pub fn add_task(&mut self, new: NewTask) -> Result<&Task, TaskError> {
        let user = self.require_user()?;

        let title = new.title.trim();
        if title.is_empty() {
            return Err(TaskError::TitleRequired);
        }

        let assignee = match new.assignee.filter(|a| !a.is_empty()) {
            None => user.id.clone(),
            Some(a) if a == user.id => a,
            Some(_) if !user.is_admin => return Err(TaskError::AssignmentForbidden),
            Some(a) => {
                if !self.repo.users()?.iter().any(|u| u.id == a) {
                    return Err(TaskError::UnknownAssignee(a));
                }
                a
            }
        };

        let now = Utc::now();
        let task = Task {
            id: crate::model::new_id(),
            title: title.to_string(),
            description: new.description.trim().to_string(),
            status: TaskStatus::Incomplete,
            priority: new.priority,
            user_id: assignee,
            user_name: user.name.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut next = self.tasks.clone();
        next.push(task);
        self.commit_tasks(next)?;

        let added = &self.tasks[self.tasks.len() - 1];
        tracing::info!(task_id = %added.id, user_id = %added.user_id, "Added task");
        Ok(added)
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn update_task(&mut self, task_id: &str, mut update: TaskUpdate) -> Result<&Task, TaskError> {
        let index = self.authorize(task_id)?;

        if let Some(title) = update.title.as_mut() {
            *title = title.trim().to_string();
            if title.is_empty() {
                return Err(TaskError::TitleRequired);
            }
        }
        if let Some(description) = update.description.as_mut() {
            *description = description.trim().to_string();
        }

        let mut next = self.tasks.clone();
        let task = &mut next[index];
        update.apply(task);
        task.updated_at = Utc::now();
        self.commit_tasks(next)?;

        tracing::info!(task_id, "Updated task");
        Ok(&self.tasks[index])
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<Task, TaskError> {
        let index = self.authorize(task_id)?;
        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit_tasks(next)?;

        tracing::info!(task_id, "Deleted task");
        Ok(removed)
    }

    /// Flip between incomplete and complete.
    pub fn toggle_task_status(&mut self, task_id: &str) -> Result<&Task, TaskError> {
        let index = self.authorize(task_id)?;

        let mut next = self.tasks.clone();
        let task = &mut next[index];
        task.status = task.status.toggled();
        task.updated_at = Utc::now();
        self.commit_tasks(next)?;

        let task = &self.tasks[index];
        tracing::info!(task_id, status = %task.status, "Toggled task status");
        Ok(task)
    }

    /// Tasks owned by the current user. Empty when logged out.
    pub fn user_tasks(&self) -> Vec<&Task> {
        match &self.current {
            Some(user) => self.tasks.iter().filter(|t| t.user_id == user.id).collect(),
            None => Vec::new(),
        }
    }

    /// Every task the current user may see: all of them for admins.
    pub fn all_tasks(&self) -> Vec<&Task> {
        match &self.current {
            Some(user) if user.is_admin => self.tasks.iter().collect(),
            Some(_) => self.user_tasks(),
            None => Vec::new(),
        }
    }
}

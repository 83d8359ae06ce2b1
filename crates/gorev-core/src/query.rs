//! Search and ordering for task lists.

use std::cmp::Ordering;

use crate::model::{Task, TaskStatus};

/// Direction for priority ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Low before high.
    #[default]
    Asc,
    /// High before low.
    Desc,
}

/// How to order a task list.
///
/// Incomplete tasks always come first. `Default` and `Date` then order by
/// most recently updated; `Priority` orders by priority before falling back
/// to the update time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Default,
    Date,
    Priority(Order),
}

/// A title search plus a sort mode.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub sort: SortMode,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Does `task`'s title contain the search term, ignoring case?
    pub fn matches(&self, task: &Task) -> bool {
        match &self.search {
            Some(term) => task.title.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }

    /// Filter and sort. The sort is stable.
    pub fn apply<'a, I>(&self, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut selected: Vec<&Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let by_status = status_rank(a.status).cmp(&status_rank(b.status));
        if by_status != Ordering::Equal {
            return by_status;
        }

        if let SortMode::Priority(order) = self.sort {
            let by_priority = match order {
                Order::Asc => a.priority.cmp(&b.priority),
                Order::Desc => b.priority.cmp(&a.priority),
            };
            if by_priority != Ordering::Equal {
                return by_priority;
            }
        }

        b.updated_at.cmp(&a.updated_at)
    }
}

fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Incomplete => 0,
        TaskStatus::Complete => 1,
    }
}

//! In-memory todo list.
//!
//! Lives for one process run; the shell keeps it alive across lines.

use anyhow::{bail, Result};
use serde::Serialize;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: usize,
    pub title: String,
    pub priority: i64,
    pub tags: Vec<String>,
    pub done: bool,
}

#[derive(Debug, Default)]
pub struct Store {
    items: RefCell<Vec<Todo>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, title: String, priority: i64, tags: Vec<String>) -> Todo {
        let mut items = self.items.borrow_mut();
        let todo = Todo {
            id: items.len() + 1,
            title,
            priority,
            tags,
            done: false,
        };
        items.push(todo.clone());
        todo
    }

    /// Marks a todo as done by its 1-based id.
    pub fn complete(&self, id: usize) -> Result<Todo> {
        let mut items = self.items.borrow_mut();
        let Some(todo) = items.iter_mut().find(|todo| todo.id == id) else {
            bail!("no todo with id {id}");
        };
        if todo.done {
            bail!("todo {id} is already done");
        }
        todo.done = true;
        Ok(todo.clone())
    }

    /// Open todos (or all, if asked), highest priority first.
    pub fn list(&self, all: bool) -> Vec<Todo> {
        let mut items: Vec<Todo> = self
            .items
            .borrow()
            .iter()
            .filter(|todo| all || !todo.done)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        items
    }

    pub fn open_count(&self) -> usize {
        self.items.borrow().iter().filter(|todo| !todo.done).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_orders_by_priority_then_id() {
        let store = Store::new();
        store.add("low".into(), 1, vec![]);
        store.add("high".into(), 5, vec![]);
        store.add("also low".into(), 1, vec![]);

        let titles: Vec<_> = store.list(false).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["high", "low", "also low"]);
    }

    #[test]
    fn test_complete_hides_from_open_list() {
        let store = Store::new();
        store.add("a".into(), 1, vec![]);
        store.add("b".into(), 1, vec![]);
        store.complete(1).unwrap();

        assert_eq!(store.open_count(), 1);
        assert_eq!(store.list(false).len(), 1);
        assert_eq!(store.list(true).len(), 2);
    }

    #[test]
    fn test_complete_rejects_unknown_and_repeated() {
        let store = Store::new();
        store.add("a".into(), 1, vec![]);
        assert!(store.complete(7).is_err());
        store.complete(1).unwrap();
        let err = store.complete(1).unwrap_err();
        assert_eq!(err.to_string(), "todo 1 is already done");
    }
}

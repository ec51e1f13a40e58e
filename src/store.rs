//! Persistence of groups and expenses.
//!
//! Handlers only see the [`Store`] trait. Production runs against MongoDB
//! (see [`crate::mongo`]); [`MemoryStore`] backs tests and local runs without
//! a database.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::schemas::{Expense, Group};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_group(&self, group: &Group) -> StoreResult<()>;
    async fn find_group(&self, id: &str) -> StoreResult<Option<Group>>;
    /// Active groups `member_id` belongs to, most recently updated first.
    async fn groups_of_member(&self, member_id: &str) -> StoreResult<Vec<Group>>;
    async fn save_group(&self, group: &Group) -> StoreResult<()>;

    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()>;
    async fn find_expense(&self, id: &str) -> StoreResult<Option<Expense>>;
    /// Expenses of a group, newest first.
    async fn list_expenses(&self, group_id: &str) -> StoreResult<Vec<Expense>>;
    async fn save_expense(&self, expense: &Expense) -> StoreResult<()>;
    /// Returns whether an expense was actually removed.
    async fn delete_expense(&self, id: &str) -> StoreResult<bool>;
}

#[derive(Default)]
pub struct MemoryStore {
    groups: RwLock<HashMap<String, Group>>,
    expenses: RwLock<HashMap<String, Expense>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_group(&self, group: &Group) -> StoreResult<()> {
        self.groups
            .write()
            .await
            .insert(group.id.clone(), group.clone());
        Ok(())
    }

    async fn find_group(&self, id: &str) -> StoreResult<Option<Group>> {
        Ok(self.groups.read().await.get(id).cloned())
    }

    async fn groups_of_member(&self, member_id: &str) -> StoreResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .groups
            .read()
            .await
            .values()
            .filter(|g| g.active && g.is_member(member_id))
            .cloned()
            .collect();
        groups.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(groups)
    }

    async fn save_group(&self, group: &Group) -> StoreResult<()> {
        self.insert_group(group).await
    }

    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.expenses
            .write()
            .await
            .insert(expense.id.clone(), expense.clone());
        Ok(())
    }

    async fn find_expense(&self, id: &str) -> StoreResult<Option<Expense>> {
        Ok(self.expenses.read().await.get(id).cloned())
    }

    async fn list_expenses(&self, group_id: &str) -> StoreResult<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(expenses)
    }

    async fn save_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.insert_expense(expense).await
    }

    async fn delete_expense(&self, id: &str) -> StoreResult<bool> {
        Ok(self.expenses.write().await.remove(id).is_some())
    }
}

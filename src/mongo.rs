use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::schemas::{Expense, Group};
use crate::store::{Store, StoreResult};

pub struct MongoStore {
    groups: Collection<Group>,
    expenses: Collection<Expense>,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);
        Ok(MongoStore {
            groups: database.collection("Groups"),
            expenses: database.collection("Expenses"),
        })
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_group(&self, group: &Group) -> StoreResult<()> {
        self.groups.insert_one(group, None).await?;
        Ok(())
    }

    async fn find_group(&self, id: &str) -> StoreResult<Option<Group>> {
        Ok(self.groups.find_one(doc! { "id": id }, None).await?)
    }

    async fn groups_of_member(&self, member_id: &str) -> StoreResult<Vec<Group>> {
        let cursor = self
            .groups
            .find(doc! { "members.member_id": member_id, "active": true }, None)
            .await?;
        let mut groups: Vec<Group> = cursor.try_collect().await?;
        // Timestamps are stored as RFC 3339 strings, which don't sort reliably
        groups.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(groups)
    }

    async fn save_group(&self, group: &Group) -> StoreResult<()> {
        self.groups
            .replace_one(doc! { "id": group.id.as_str() }, group, None)
            .await?;
        Ok(())
    }

    async fn insert_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.expenses.insert_one(expense, None).await?;
        Ok(())
    }

    async fn find_expense(&self, id: &str) -> StoreResult<Option<Expense>> {
        Ok(self.expenses.find_one(doc! { "id": id }, None).await?)
    }

    async fn list_expenses(&self, group_id: &str) -> StoreResult<Vec<Expense>> {
        let cursor = self
            .expenses
            .find(doc! { "group_id": group_id }, None)
            .await?;
        let mut expenses: Vec<Expense> = cursor.try_collect().await?;
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(expenses)
    }

    async fn save_expense(&self, expense: &Expense) -> StoreResult<()> {
        self.expenses
            .replace_one(doc! { "id": expense.id.as_str() }, expense, None)
            .await?;
        Ok(())
    }

    async fn delete_expense(&self, id: &str) -> StoreResult<bool> {
        let result = self.expenses.delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

use actix_web::{delete, post, put, web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use super::{load_group, new_id};
use crate::auth::Identity;
use crate::config::Settings;
use crate::error::{ApiError, LedgerError};
use crate::expense;
use crate::schemas::{Expense, ExpenseUpdate, NewExpense};
use crate::store::Store;

async fn load_expense(store: &dyn Store, id: &str) -> Result<Expense, ApiError> {
    store
        .find_expense(id)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Expense".into()).into())
}

#[post("/expenses")]
async fn create_expense(
    store: web::Data<dyn Store>,
    settings: web::Data<Settings>,
    identity: Identity,
    json: web::Json<NewExpense>,
) -> Result<HttpResponse, ApiError> {
    let input = json.into_inner();
    let group = load_group(store.get_ref(), &input.group).await?;
    let expense = expense::create_expense(
        new_id(),
        &group,
        &identity.user_id,
        input,
        &settings.ledger.base_currency,
        Utc::now(),
    )?;
    store.insert_expense(&expense).await?;
    tracing::info!(
        expense_id = %expense.id,
        group_id = %group.id,
        base_amount = %expense.base_amount,
        "expense created"
    );
    Ok(HttpResponse::Created().json(expense))
}

#[put("/expenses/{id}")]
async fn update_expense(
    store: web::Data<dyn Store>,
    settings: web::Data<Settings>,
    identity: Identity,
    id: web::Path<String>,
    json: web::Json<ExpenseUpdate>,
) -> Result<HttpResponse, ApiError> {
    let current = load_expense(store.get_ref(), &id).await?;
    let group = load_group(store.get_ref(), &current.group_id).await?;
    let updated = expense::update_expense(
        &current,
        &group,
        &identity.user_id,
        json.into_inner(),
        &settings.ledger.base_currency,
        Utc::now(),
    )?;
    store.save_expense(&updated).await?;
    tracing::info!(expense_id = %updated.id, "expense updated");
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/expenses/{id}")]
async fn delete_expense(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let current = load_expense(store.get_ref(), &id).await?;
    let group = load_group(store.get_ref(), &current.group_id).await?;
    expense::authorize_modification(&current, &group, &identity.user_id)?;
    if !store.delete_expense(&current.id).await? {
        return Err(LedgerError::NotFound("Expense".into()).into());
    }
    tracing::info!(expense_id = %current.id, "expense deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Expense deleted" })))
}

use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;

use super::{load_group, new_id, public};
use crate::auth::Identity;
use crate::balance::compute_balances;
use crate::error::ApiError;
use crate::exchange::get_exchanges_from_group;
use crate::schemas::{Group, Member, NewGroup, NewMember};
use crate::store::Store;

#[post("/groups")]
async fn create_group(
    store: web::Data<dyn Store>,
    identity: Identity,
    json: web::Json<NewGroup>,
) -> Result<HttpResponse, ApiError> {
    let group = Group::new(new_id(), json.into_inner(), identity.as_member(), Utc::now())?;
    store.insert_group(&group).await?;
    tracing::info!(group_id = %group.id, creator = %group.creator_id, "group created");
    Ok(HttpResponse::Created().json(group))
}

#[get("/groups")]
async fn list_groups(
    store: web::Data<dyn Store>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    let groups: Vec<Group> = store
        .groups_of_member(&identity.user_id)
        .await?
        .into_iter()
        .map(public)
        .collect();
    Ok(HttpResponse::Ok().json(groups))
}

#[get("/groups/{id}")]
async fn get_group(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = load_group(store.get_ref(), &id).await?;
    group.require_member(&identity.user_id)?;
    Ok(HttpResponse::Ok().json(public(group)))
}

#[delete("/groups/{id}")]
async fn delete_group(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut group = load_group(store.get_ref(), &id).await?;
    group.require_creator(&identity.user_id)?;
    group.deactivate(Utc::now());
    store.save_group(&group).await?;
    tracing::info!(group_id = %group.id, "group deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Group deleted" })))
}

#[post("/groups/{id}/members")]
async fn add_member(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
    json: web::Json<NewMember>,
) -> Result<HttpResponse, ApiError> {
    let mut group = load_group(store.get_ref(), &id).await?;
    group.require_member(&identity.user_id)?;
    let NewMember {
        member_id,
        display_name,
    } = json.into_inner();
    group.add_member(
        Member {
            member_id,
            display_name,
        },
        Utc::now(),
    )?;
    store.save_group(&group).await?;
    Ok(HttpResponse::Ok().json(public(group)))
}

#[delete("/groups/{id}/members/{member_id}")]
async fn remove_member(
    store: web::Data<dyn Store>,
    identity: Identity,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (id, member_id) = path.into_inner();
    let mut group = load_group(store.get_ref(), &id).await?;
    group.require_member(&identity.user_id)?;
    group.remove_member(&member_id, Utc::now())?;
    store.save_group(&group).await?;
    tracing::info!(group_id = %group.id, member_id = %member_id, "member removed");
    Ok(HttpResponse::Ok().json(public(group)))
}

#[get("/groups/{id}/expenses")]
async fn list_group_expenses(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = load_group(store.get_ref(), &id).await?;
    group.require_member(&identity.user_id)?;
    Ok(HttpResponse::Ok().json(store.list_expenses(&group.id).await?))
}

#[get("/groups/{id}/balances")]
async fn get_balances(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = load_group(store.get_ref(), &id).await?;
    group.require_member(&identity.user_id)?;
    let expenses = store.list_expenses(&group.id).await?;
    Ok(HttpResponse::Ok().json(compute_balances(&group, &expenses)))
}

#[get("/groups/{id}/settlements")]
async fn get_settlements(
    store: web::Data<dyn Store>,
    identity: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let group = load_group(store.get_ref(), &id).await?;
    group.require_member(&identity.user_id)?;
    let expenses = store.list_expenses(&group.id).await?;
    Ok(HttpResponse::Ok().json(get_exchanges_from_group(&group, &expenses)))
}

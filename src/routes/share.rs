use actix_web::{get, post, web, HttpResponse};
use chrono::{Duration, Utc};
use serde_json::json;

use super::load_group;
use crate::auth::Identity;
use crate::config::Settings;
use crate::error::{ApiError, ValidationError};
use crate::schemas::InviteRequest;
use crate::share;
use crate::store::Store;

#[post("/share/invite")]
async fn invite(
    store: web::Data<dyn Store>,
    settings: web::Data<Settings>,
    identity: Identity,
    json: web::Json<InviteRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut group = load_group(store.get_ref(), &json.group_id).await?;
    group.require_creator(&identity.user_id)?;
    let link = share::issue(
        &mut group,
        &settings.auth.jwt_secret,
        Duration::days(settings.share.ttl_days),
        Utc::now(),
    );
    store.save_group(&group).await?;
    tracing::info!(group_id = %group.id, expires_at = %link.expires_at, "share link issued");
    Ok(HttpResponse::Ok().json(json!({
        "share_link": share::link_url(&settings.share.client_url, &group.id, &link.token),
        "token": link.token,
        "expires_at": link.expires_at,
    })))
}

#[get("/share/validate/{group_id}/{token}")]
async fn validate(
    store: web::Data<dyn Store>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (group_id, token) = path.into_inner();
    let group = store
        .find_group(&group_id)
        .await?
        .filter(|group| share::is_valid(group, &token, Utc::now()))
        .ok_or(ValidationError::InvalidShareLink)?;
    Ok(HttpResponse::Ok().json(json!({
        "valid": true,
        "group": {
            "id": group.id,
            "name": group.name,
            "description": group.description,
            "members": group.members.len(),
        }
    })))
}

#[post("/share/join/{group_id}/{token}")]
async fn join(
    store: web::Data<dyn Store>,
    identity: Identity,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (group_id, token) = path.into_inner();
    let mut group = load_group(store.get_ref(), &group_id).await?;
    share::join(&mut group, &token, identity.as_member(), Utc::now())?;
    store.save_group(&group).await?;
    tracing::info!(group_id = %group.id, member_id = %identity.user_id, "joined via share link");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully joined the group",
        "group": {
            "id": group.id,
            "name": group.name,
            "description": group.description,
        }
    })))
}

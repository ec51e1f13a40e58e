use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::ApiError;
use crate::schemas::{Member, MemberId};

/// Tokens are issued by the identity provider, signed with the shared
/// HS256 secret.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: MemberId,
    #[serde(default)]
    pub username: Option<String>,
    pub exp: usize,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: MemberId,
    pub display_name: String,
}

impl Identity {
    pub fn as_member(&self) -> Member {
        Member {
            member_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

pub fn verify_token(token: &str, secret: &str) -> Result<Identity, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        ApiError::Unauthenticated("Token is not valid".into())
    })?;
    let claims = data.claims;
    let display_name = claims
        .username
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| claims.user_id.clone());
    Ok(Identity {
        user_id: claims.user_id,
        display_name,
    })
}

fn check_authorization(request: &HttpRequest) -> Result<Identity, ApiError> {
    let settings = request
        .app_data::<web::Data<Settings>>()
        .ok_or_else(|| ApiError::Unauthenticated("Authentication is not configured".into()))?;
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("No token, authorization denied".into()))?;
    verify_token(token, &settings.auth.jwt_secret)
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(check_authorization(req))
    }
}

#[cfg(test)]
pub(crate) fn issue_token(user_id: &str, username: Option<&str>, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        user_id: user_id.to_string(),
        username: username.map(str::to_string),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

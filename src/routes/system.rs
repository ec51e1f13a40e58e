use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::currency;

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": Utc::now(),
    }))
}

#[derive(Deserialize)]
struct CurrencyQuery {
    q: Option<String>,
}

#[get("/currencies")]
async fn list_currencies(query: web::Query<CurrencyQuery>) -> HttpResponse {
    match query.q.as_deref() {
        Some(q) => HttpResponse::Ok().json(currency::search(q)),
        None => HttpResponse::Ok().json(currency::all()),
    }
}

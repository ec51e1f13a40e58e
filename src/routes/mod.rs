use actix_web::web;

use crate::error::{ApiError, LedgerError};
use crate::schemas::Group;
use crate::store::Store;

mod expenses;
mod groups;
mod share;
mod system;


pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(system::health)
        .service(system::list_currencies)
        .service(groups::create_group)
        .service(groups::list_groups)
        .service(groups::get_group)
        .service(groups::delete_group)
        .service(groups::add_member)
        .service(groups::remove_member)
        .service(groups::list_group_expenses)
        .service(groups::get_balances)
        .service(groups::get_settlements)
        .service(expenses::create_expense)
        .service(expenses::update_expense)
        .service(expenses::delete_expense)
        .service(share::invite)
        .service(share::validate)
        .service(share::join);
}

fn new_id() -> String {
    bson::oid::ObjectId::new().to_hex()
}

async fn load_group(store: &dyn Store, id: &str) -> Result<Group, ApiError> {
    store
        .find_group(id)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Group".into()).into())
}

/// Group as shown to members: the share token stays with whoever issued it.
fn public(mut group: Group) -> Group {
    group.share = None;
    group
}

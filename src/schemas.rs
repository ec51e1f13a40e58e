use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type MemberId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Member {
    pub member_id: MemberId,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ShareLink {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub creator_id: MemberId,
    pub members: Vec<Member>,
    pub active: bool,
    // Never sent back to API callers, only the issuing endpoint returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<ShareLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    Food,
    Accommodation,
    Transport,
    Entertainment,
    Shopping,
    Other,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub currency: String,
    pub conversion_rate: Decimal,
    pub base_amount: Decimal,
    pub expense_type: ExpenseType,
    #[serde(default)]
    pub description: Option<String>,
    pub group_id: String,
    pub paid_by: MemberId,
    pub split_between: Vec<MemberId>,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMember {
    pub member_id: MemberId,
    pub display_name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewExpense {
    pub title: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub conversion_rate: Option<Decimal>,
    pub expense_type: ExpenseType,
    #[serde(default)]
    pub description: Option<String>,
    pub group: String,
    pub paid_by: MemberId,
    pub split_between: Vec<MemberId>,
}

/// Fields of an expense that may be changed after creation. Absent fields
/// keep their current value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub conversion_rate: Option<Decimal>,
    pub expense_type: Option<ExpenseType>,
    pub description: Option<String>,
    pub paid_by: Option<MemberId>,
    pub split_between: Option<Vec<MemberId>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InviteRequest {
    pub group_id: String,
}

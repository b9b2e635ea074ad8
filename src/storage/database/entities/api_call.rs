use crate::core::billing::CallLogEntry;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One proxied call, successful or not
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "api_calls")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    /// Upstream family (`anthropic`, `openai`, `google`)
    pub provider: String,

    pub model: String,

    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,

    /// Billed amount in cost units
    pub cost_units: i64,

    pub duration_ms: i64,

    /// `success`, `error` or `unpaid`
    pub status: String,

    /// Truncated upstream or transport error
    pub error_message: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Model {
    /// Active model for a new audit row
    pub fn from_entry(entry: &CallLogEntry) -> ActiveModel {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            provider: Set(entry.provider.as_str().to_string()),
            model: Set(entry.model.clone()),
            input_tokens: Set(clamp(entry.usage.input_tokens)),
            output_tokens: Set(clamp(entry.usage.output_tokens)),
            cache_read_tokens: Set(clamp(entry.usage.cache_read_tokens)),
            cache_creation_tokens: Set(clamp(entry.usage.cache_creation_tokens)),
            cost_units: Set(entry.cost_units),
            duration_ms: Set(clamp(entry.duration_ms)),
            status: Set(entry.status.as_str().to_string()),
            error_message: Set(entry.error_message.clone()),
            created_at: Set(chrono::Utc::now().into()),
        }
    }
}

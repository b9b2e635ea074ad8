use crate::core::billing::{AuditSink, CallLogEntry, CallStatus, MonthlyUsage};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use sea_orm::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::debug;
use uuid::Uuid;

use super::super::entities::{self, api_call};
use super::types::SeaOrmDatabase;

/// First instant of the calendar month containing `now`, in UTC
pub(crate) fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

impl SeaOrmDatabase {
    /// Append one audit row
    pub async fn insert_api_call(&self, entry: &CallLogEntry) -> Result<()> {
        debug!(
            "Recording {} call for user {} ({})",
            entry.provider,
            entry.user_id,
            entry.status.as_str()
        );

        entities::ApiCall::insert(api_call::Model::from_entry(entry))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(())
    }

    /// Most recent audit rows for a user, newest first
    pub async fn recent_api_calls(&self, user_id: Uuid, limit: u64) -> Result<Vec<api_call::Model>> {
        entities::ApiCall::find()
            .filter(api_call::Column::UserId.eq(user_id))
            .order_by_desc(api_call::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)
    }

    /// Call count and billed units since the start of the month
    pub async fn monthly_usage(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<MonthlyUsage> {
        let since = month_start(now);
        let since_tz: DateTimeWithTimeZone = since.into();

        // Summed here rather than in SQL: SUM(bigint) decodes as numeric on Postgres
        let rows: Vec<(i64, String)> = entities::ApiCall::find()
            .select_only()
            .column(api_call::Column::CostUnits)
            .column(api_call::Column::Status)
            .filter(api_call::Column::UserId.eq(user_id))
            .filter(api_call::Column::CreatedAt.gte(since_tz))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        // Unpaid calls count as calls but were never deducted
        let billed: i64 = rows
            .iter()
            .filter(|(_, status)| status != CallStatus::Unpaid.as_str())
            .map(|(cost, _)| cost)
            .sum();

        Ok(MonthlyUsage {
            month: since.format("%Y-%m").to_string(),
            total_calls: rows.len() as u64,
            total_cost_units: billed,
        })
    }
}

#[async_trait]
impl AuditSink for SeaOrmDatabase {
    async fn record_call(&self, entry: &CallLogEntry) -> Result<()> {
        self.insert_api_call(entry).await
    }
}

//! Per-user recent report views, kept as a ring buffer.

use crate::error::{AppError, AppResult};
use crate::models::{ReportView, new_id};
use crate::store::Store;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Views retained per user.
pub const RECENT_VIEWS_LIMIT: i64 = 10;

const UPSERT_VIEW: &str = r#"
    INSERT INTO report_views (id, report_id, user_id, viewed_at, seq)
    VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM report_views))
    ON CONFLICT(report_id, user_id) DO UPDATE SET
        viewed_at = excluded.viewed_at,
        seq = excluded.seq
    "#;

const PRUNE_VIEWS: &str = r#"
    DELETE FROM report_views
    WHERE user_id = ?
    AND id NOT IN (
        SELECT id FROM report_views
        WHERE user_id = ?
        ORDER BY viewed_at DESC, seq DESC
        LIMIT ?
    )
    "#;

const SELECT_VIEW: &str = r#"
    SELECT id, report_id, user_id, viewed_at
    FROM report_views
    WHERE report_id = ? AND user_id = ?
    "#;

const RECENT_VIEWS: &str = r#"
    SELECT id, report_id, user_id, viewed_at
    FROM report_views
    WHERE user_id = ?
    ORDER BY viewed_at DESC, seq DESC
    LIMIT ?
    "#;

type ViewRow = (String, String, String, i64);

impl Store {
    /// Record that `user_id` opened `report_id` now. Older views beyond the
    /// user's most recent [`RECENT_VIEWS_LIMIT`] are dropped in the same
    /// transaction.
    pub async fn record_view(&self, report_id: &str, user_id: &str) -> AppResult<ReportView> {
        let viewed_at = Utc::now().timestamp_micros();
        let mut tx = self.pool().begin().await?;

        sqlx::query(UPSERT_VIEW)
            .bind(new_id())
            .bind(report_id)
            .bind(user_id)
            .bind(viewed_at)
            .execute(&mut *tx)
            .await?;

        let pruned = sqlx::query(PRUNE_VIEWS)
            .bind(user_id)
            .bind(user_id)
            .bind(RECENT_VIEWS_LIMIT)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let row: ViewRow = sqlx::query_as(SELECT_VIEW)
            .bind(report_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(report_id = %report_id, user_id = %user_id, pruned, "Report view recorded");
        into_view(row)
    }

    /// The user's most recent views, newest first.
    pub async fn recent_views(&self, user_id: &str) -> AppResult<Vec<ReportView>> {
        let rows: Vec<ViewRow> = sqlx::query_as(RECENT_VIEWS)
            .bind(user_id)
            .bind(RECENT_VIEWS_LIMIT)
            .fetch_all(self.pool())
            .await?;
        rows.into_iter().map(into_view).collect()
    }
}

fn into_view((id, report_id, user_id, viewed_at): ViewRow) -> AppResult<ReportView> {
    let viewed_at = DateTime::<Utc>::from_timestamp_micros(viewed_at)
        .ok_or_else(|| AppError::store(format!("invalid view timestamp: {viewed_at}")))?;
    Ok(ReportView {
        id,
        report_id,
        user_id,
        viewed_at,
    })
}

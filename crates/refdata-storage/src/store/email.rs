use chrono::{DateTime, Utc};
use refdata_common::types::{EmailRecord, EmailStatus, EmailStatusSummary, RecordEmailRequest};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

use crate::entities::email_record::{self, Column, Entity};
use crate::error::{Result, StoreError};
use crate::store::{parse_column, require_non_empty, to_utc, ReferenceStore};

/// 邮件记录过滤条件
#[derive(Debug, Clone, Default)]
pub struct EmailRecordFilter {
    pub to_email_contains: Option<String>,
    pub status: Option<EmailStatus>,
}

impl EmailRecordFilter {
    fn apply(&self, mut q: Select<Entity>) -> Select<Entity> {
        if let Some(ref v) = self.to_email_contains {
            q = q.filter(Column::ToEmail.contains(v));
        }
        if let Some(s) = self.status {
            q = q.filter(Column::Status.eq(s.as_str()));
        }
        q
    }
}

fn to_email_record(m: email_record::Model) -> Result<EmailRecord> {
    Ok(EmailRecord {
        status: parse_column("sys_email_record.status", &m.status)?,
        id: m.id,
        to_email: m.to_email,
        subject: m.subject,
        content: m.content,
        is_html: m.is_html,
        error_msg: m.error_msg,
        send_time: m.send_time.map(to_utc),
        created_at: to_utc(m.created_at),
    })
}

impl ReferenceStore {
    /// Records an outgoing email as `pending`.
    pub async fn record_email_attempt(&self, req: &RecordEmailRequest) -> Result<EmailRecord> {
        require_non_empty("to_email", &req.to_email)?;

        let am = email_record::ActiveModel {
            id: Set(refdata_common::id::next_id()),
            to_email: Set(req.to_email.clone()),
            subject: Set(req.subject.clone()),
            content: Set(req.content.clone()),
            is_html: Set(req.is_html),
            status: Set(EmailStatus::Pending.as_str().to_owned()),
            error_msg: Set(None),
            send_time: Set(None),
            created_at: Set(self.now()),
        };
        let model = am.insert(self.db()).await?;
        tracing::debug!(id = model.id, to = %model.to_email, "Email attempt recorded");
        to_email_record(model)
    }

    /// `pending` → `sent`. Fails with `InvalidState` once the record is terminal.
    pub async fn mark_email_sent(&self, id: i64, send_time: DateTime<Utc>) -> Result<EmailRecord> {
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(EmailStatus::Sent.as_str()))
            .col_expr(Column::SendTime, Expr::value(send_time.fixed_offset()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(EmailStatus::Pending.as_str()))
            .exec(self.db())
            .await?;
        if res.rows_affected == 0 {
            return Err(self.email_refusal(id, "mark sent").await);
        }
        tracing::info!(id, "Email marked sent");
        self.reload_email(id).await
    }

    /// `pending` → `failed`, keeping the dispatcher's error message.
    pub async fn mark_email_failed(&self, id: i64, error_msg: &str) -> Result<EmailRecord> {
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(EmailStatus::Failed.as_str()))
            .col_expr(Column::ErrorMsg, Expr::value(error_msg))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(EmailStatus::Pending.as_str()))
            .exec(self.db())
            .await?;
        if res.rows_affected == 0 {
            return Err(self.email_refusal(id, "mark failed").await);
        }
        tracing::info!(id, error = error_msg, "Email marked failed");
        self.reload_email(id).await
    }

    pub async fn get_email_record(&self, id: i64) -> Result<Option<EmailRecord>> {
        Entity::find_by_id(id)
            .one(self.db())
            .await?
            .map(to_email_record)
            .transpose()
    }

    /// Newest first.
    pub async fn list_email_records(
        &self,
        filter: &EmailRecordFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EmailRecord>> {
        let rows = filter
            .apply(Entity::find())
            .order_by(Column::CreatedAt, Order::Desc)
            .order_by(Column::Id, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_email_record).collect()
    }

    pub async fn count_email_records(&self, filter: &EmailRecordFilter) -> Result<u64> {
        Ok(filter.apply(Entity::find()).count(self.db()).await?)
    }

    /// Oldest pending records first, for an external dispatcher.
    pub async fn list_pending_emails(&self, limit: usize) -> Result<Vec<EmailRecord>> {
        let rows = Entity::find()
            .filter(Column::Status.eq(EmailStatus::Pending.as_str()))
            .order_by(Column::CreatedAt, Order::Asc)
            .order_by(Column::Id, Order::Asc)
            .limit(limit as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_email_record).collect()
    }

    pub async fn email_status_summary(&self) -> Result<EmailStatusSummary> {
        let rows: Vec<(String, i64)> = Entity::find()
            .select_only()
            .column(Column::Status)
            .column_as(Expr::col(Column::Id).count(), "total")
            .group_by(Column::Status)
            .into_tuple()
            .all(self.db())
            .await?;

        let mut summary = EmailStatusSummary::default();
        for (raw, total) in rows {
            let total = total.max(0) as u64;
            match parse_column::<EmailStatus>("sys_email_record.status", &raw)? {
                EmailStatus::Pending => summary.pending = total,
                EmailStatus::Sent => summary.sent = total,
                EmailStatus::Failed => summary.failed = total,
            }
        }
        Ok(summary)
    }

    async fn reload_email(&self, id: i64) -> Result<EmailRecord> {
        self.get_email_record(id)
            .await?
            .ok_or_else(|| StoreError::not_found("email_record", id))
    }

    async fn email_refusal(&self, id: i64, action: &'static str) -> StoreError {
        match Entity::find_by_id(id).one(self.db()).await {
            Ok(Some(m)) => StoreError::InvalidState {
                entity: "email_record",
                id: id.to_string(),
                status: m.status,
                action,
            },
            Ok(None) => StoreError::not_found("email_record", id),
            Err(e) => StoreError::Database(e),
        }
    }
}

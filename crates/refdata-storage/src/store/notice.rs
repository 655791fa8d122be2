use refdata_common::types::{
    CreateNoticeRequest, Notice, NoticeStatus, NoticeType, UpdateNoticeRequest,
};
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

use crate::entities::notice::{self, Column, Entity};
use crate::error::{Result, StoreError};
use crate::store::{parse_column, require_non_empty, to_utc, ReferenceStore};

/// 公告过滤条件
#[derive(Debug, Clone, Default)]
pub struct NoticeFilter {
    pub status: Option<NoticeStatus>,
    pub is_top: Option<bool>,
    pub notice_type: Option<NoticeType>,
    pub title_contains: Option<String>,
}

impl NoticeFilter {
    fn apply(&self, mut q: Select<Entity>) -> Select<Entity> {
        if let Some(s) = self.status {
            q = q.filter(Column::Status.eq(s.as_str()));
        }
        if let Some(top) = self.is_top {
            q = q.filter(Column::IsTop.eq(top));
        }
        if let Some(t) = self.notice_type {
            q = q.filter(Column::NoticeType.eq(t.as_str()));
        }
        if let Some(ref v) = self.title_contains {
            q = q.filter(Column::Title.contains(v));
        }
        q
    }
}

/// Feed order: pinned first, then newest publish time (unpublished last), then newest id.
fn feed_order(q: Select<Entity>) -> Select<Entity> {
    q.order_by(Column::IsTop, Order::Desc)
        .order_by_with_nulls(Column::PublishTime, Order::Desc, NullOrdering::Last)
        .order_by(Column::Id, Order::Desc)
}

fn to_notice(m: notice::Model) -> Result<Notice> {
    Ok(Notice {
        notice_type: parse_column("sys_notice.notice_type", &m.notice_type)?,
        level: parse_column("sys_notice.level", &m.level)?,
        status: parse_column("sys_notice.status", &m.status)?,
        id: m.id,
        title: m.title,
        content: m.content,
        is_top: m.is_top,
        publish_time: m.publish_time.map(to_utc),
        publisher_id: m.publisher_id,
        created_at: to_utc(m.created_at),
        updated_at: to_utc(m.updated_at),
    })
}

impl ReferenceStore {
    /// Creates a notice. New notices always start as `draft`; publishing is a
    /// separate call.
    pub async fn create_notice(&self, req: &CreateNoticeRequest) -> Result<Notice> {
        require_non_empty("title", &req.title)?;
        if let Some(requested) = req.status {
            if requested != NoticeStatus::Draft {
                tracing::debug!(status = %requested, "Ignoring requested status on notice create");
            }
        }

        let now = self.now();
        let am = notice::ActiveModel {
            id: Set(refdata_common::id::next_id()),
            title: Set(req.title.clone()),
            content: Set(req.content.clone()),
            notice_type: Set(req.notice_type.as_str().to_owned()),
            level: Set(req.level.as_str().to_owned()),
            is_top: Set(req.is_top),
            status: Set(NoticeStatus::Draft.as_str().to_owned()),
            publish_time: Set(None),
            publisher_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await?;
        to_notice(model)
    }

    pub async fn get_notice(&self, id: i64) -> Result<Option<Notice>> {
        Entity::find_by_id(id)
            .one(self.db())
            .await?
            .map(to_notice)
            .transpose()
    }

    /// Publishes a draft (or re-publishes a published) notice, stamping
    /// `publish_time` and `publisher_id`. Withdrawn notices stay withdrawn.
    pub async fn publish_notice(&self, id: i64, publisher_id: i64) -> Result<Notice> {
        let now = self.now();
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(NoticeStatus::Published.as_str()))
            .col_expr(Column::PublishTime, Expr::value(now))
            .col_expr(Column::PublisherId, Expr::value(publisher_id))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.ne(NoticeStatus::Withdrawn.as_str()))
            .exec(self.db())
            .await?;
        if res.rows_affected == 0 {
            return Err(self.notice_refusal(id, "publish").await);
        }
        tracing::info!(id, publisher_id, "Notice published");
        self.reload_notice(id).await
    }

    /// Withdraws a published notice.
    pub async fn withdraw_notice(&self, id: i64) -> Result<Notice> {
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(NoticeStatus::Withdrawn.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(self.now()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(NoticeStatus::Published.as_str()))
            .exec(self.db())
            .await?;
        if res.rows_affected == 0 {
            return Err(self.notice_refusal(id, "withdraw").await);
        }
        tracing::info!(id, "Notice withdrawn");
        self.reload_notice(id).await
    }

    /// Edits the content fields of a draft or published notice.
    pub async fn update_notice(&self, id: i64, update: &UpdateNoticeRequest) -> Result<Notice> {
        if let Some(ref title) = update.title {
            require_non_empty("title", title)?;
        }

        let mut q = Entity::update_many().col_expr(Column::UpdatedAt, Expr::value(self.now()));
        if let Some(ref title) = update.title {
            q = q.col_expr(Column::Title, Expr::value(title.as_str()));
        }
        if let Some(ref content) = update.content {
            q = q.col_expr(Column::Content, Expr::value(content.as_str()));
        }
        if let Some(t) = update.notice_type {
            q = q.col_expr(Column::NoticeType, Expr::value(t.as_str()));
        }
        if let Some(level) = update.level {
            q = q.col_expr(Column::Level, Expr::value(level.as_str()));
        }
        if let Some(top) = update.is_top {
            q = q.col_expr(Column::IsTop, Expr::value(top));
        }
        let res = q
            .filter(Column::Id.eq(id))
            .filter(Column::Status.ne(NoticeStatus::Withdrawn.as_str()))
            .exec(self.db())
            .await?;
        if res.rows_affected == 0 {
            return Err(self.notice_refusal(id, "edit").await);
        }
        self.reload_notice(id).await
    }

    /// All matching notices in feed order.
    pub async fn list_notices(&self, filter: &NoticeFilter) -> Result<Vec<Notice>> {
        let rows = feed_order(filter.apply(Entity::find()))
            .all(self.db())
            .await?;
        rows.into_iter().map(to_notice).collect()
    }

    pub async fn list_notices_page(
        &self,
        filter: &NoticeFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notice>> {
        let rows = feed_order(filter.apply(Entity::find()))
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_notice).collect()
    }

    pub async fn count_notices(&self, filter: &NoticeFilter) -> Result<u64> {
        Ok(filter.apply(Entity::find()).count(self.db()).await?)
    }

    pub async fn delete_notices(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let res = Entity::delete_many()
            .filter(Column::Id.is_in(ids.to_vec()))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected)
    }

    async fn reload_notice(&self, id: i64) -> Result<Notice> {
        self.get_notice(id)
            .await?
            .ok_or_else(|| StoreError::not_found("notice", id))
    }

    /// Explains why a conditional update on a notice matched no row.
    async fn notice_refusal(&self, id: i64, action: &'static str) -> StoreError {
        match Entity::find_by_id(id).one(self.db()).await {
            Ok(Some(m)) => StoreError::InvalidState {
                entity: "notice",
                id: id.to_string(),
                status: m.status,
                action,
            },
            Ok(None) => StoreError::not_found("notice", id),
            Err(e) => StoreError::Database(e),
        }
    }
}

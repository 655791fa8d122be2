use refdata_common::types::{Config, ConfigType, Status, UpsertConfigRequest};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};

use crate::config_value::ConfigValue;
use crate::entities::sys_config::{self, Column, Entity};
use crate::error::{Result, StoreError};
use crate::store::{parse_column, require_non_empty, to_utc, ReferenceStore};

/// 系统配置过滤条件
#[derive(Debug, Clone, Default)]
pub struct ConfigFilter {
    pub name_contains: Option<String>,
    pub key_contains: Option<String>,
    pub config_type: Option<ConfigType>,
    pub frontend_visible: Option<bool>,
    pub status: Option<Status>,
}

impl ConfigFilter {
    fn apply(&self, mut q: Select<Entity>) -> Select<Entity> {
        if let Some(ref v) = self.name_contains {
            q = q.filter(Column::Name.contains(v));
        }
        if let Some(ref v) = self.key_contains {
            q = q.filter(Column::ConfigKey.contains(v));
        }
        if let Some(t) = self.config_type {
            q = q.filter(Column::ConfigType.eq(t.as_str()));
        }
        if let Some(visible) = self.frontend_visible {
            q = q.filter(Column::IsFrontend.eq(visible));
        }
        if let Some(s) = self.status {
            q = q.filter(Column::Status.eq(s.as_str()));
        }
        q
    }
}

fn to_config(m: sys_config::Model) -> Result<Config> {
    Ok(Config {
        config_type: parse_column("sys_config.config_type", &m.config_type)?,
        status: parse_column("sys_config.status", &m.status)?,
        id: m.id,
        name: m.name,
        key: m.config_key,
        value: m.config_value,
        is_frontend_visible: m.is_frontend,
        remark: m.remark,
        created_at: to_utc(m.created_at),
        updated_at: to_utc(m.updated_at),
    })
}

impl ReferenceStore {
    /// Creates or overwrites the config stored under `req.key`.
    ///
    /// The value must decode under `req.config_type`. The write is one
    /// `INSERT .. ON CONFLICT(config_key) DO UPDATE` statement, so concurrent
    /// upserts of one key never leave a value paired with the wrong type.
    /// `name` is only overwritten when supplied; `status` is left untouched on
    /// update.
    pub async fn upsert_config(&self, req: &UpsertConfigRequest) -> Result<Config> {
        require_non_empty("key", &req.key)?;
        ConfigValue::decode(req.config_type, &req.value)
            .map_err(|reason| StoreError::validation("value", reason))?;

        let now = self.now();
        let new_id = refdata_common::id::next_id();
        let am = sys_config::ActiveModel {
            id: Set(new_id),
            name: Set(req.name.clone().unwrap_or_else(|| req.key.clone())),
            config_key: Set(req.key.clone()),
            config_value: Set(req.value.clone()),
            config_type: Set(req.config_type.as_str().to_owned()),
            is_frontend: Set(req.is_frontend_visible),
            status: Set(Status::Enabled.as_str().to_owned()),
            remark: Set(req.remark.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let mut overwrite = vec![
            Column::ConfigValue,
            Column::ConfigType,
            Column::IsFrontend,
            Column::Remark,
            Column::UpdatedAt,
        ];
        if req.name.is_some() {
            overwrite.push(Column::Name);
        }

        Entity::insert(am)
            .on_conflict(
                OnConflict::column(Column::ConfigKey)
                    .update_columns(overwrite)
                    .to_owned(),
            )
            .exec_without_returning(self.db())
            .await?;

        let row = Entity::find()
            .filter(Column::ConfigKey.eq(req.key.as_str()))
            .one(self.db())
            .await?
            .ok_or(StoreError::InsertReadback { entity: "config" })?;
        let created = row.id == new_id;
        tracing::info!(
            key = %req.key,
            config_type = %req.config_type,
            created,
            "Config upserted"
        );
        to_config(row)
    }

    /// The full row, whatever its status.
    pub async fn get_config(&self, key: &str) -> Result<Option<Config>> {
        Entity::find()
            .filter(Column::ConfigKey.eq(key))
            .one(self.db())
            .await?
            .map(to_config)
            .transpose()
    }

    /// Reads and decodes a config value.
    ///
    /// Disabled configs are refused with [`StoreError::Disabled`] unless
    /// `include_disabled` is set.
    pub async fn get_config_value(&self, key: &str, include_disabled: bool) -> Result<ConfigValue> {
        let config = self
            .get_config(key)
            .await?
            .ok_or_else(|| StoreError::not_found("config", key))?;
        if config.status == Status::Disabled && !include_disabled {
            return Err(StoreError::Disabled {
                entity: "config",
                id: key.to_owned(),
            });
        }
        tracing::debug!(key, config_type = %config.config_type, "Reading config value");
        ConfigValue::decode(config.config_type, &config.value).map_err(|_| {
            StoreError::UnexpectedValue {
                column: "sys_config.config_value",
                value: config.value.clone(),
            }
        })
    }

    pub async fn set_config_status(&self, key: &str, status: Status) -> Result<Config> {
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(status.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(self.now()))
            .filter(Column::ConfigKey.eq(key))
            .exec(self.db())
            .await?;
        if res.rows_affected == 0 {
            return Err(StoreError::not_found("config", key));
        }
        tracing::info!(key, status = %status, "Config status changed");
        self.get_config(key)
            .await?
            .ok_or_else(|| StoreError::not_found("config", key))
    }

    pub async fn list_configs(
        &self,
        filter: &ConfigFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Config>> {
        let rows = filter
            .apply(Entity::find())
            .order_by(Column::Id, Order::Asc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_config).collect()
    }

    pub async fn count_configs(&self, filter: &ConfigFilter) -> Result<u64> {
        Ok(filter.apply(Entity::find()).count(self.db()).await?)
    }

    /// Enabled configs flagged for front-end clients, ordered by key.
    pub async fn list_frontend_configs(&self) -> Result<Vec<Config>> {
        let rows = Entity::find()
            .filter(Column::IsFrontend.eq(true))
            .filter(Column::Status.eq(Status::Enabled.as_str()))
            .order_by(Column::ConfigKey, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_config).collect()
    }

    pub async fn delete_configs(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let res = Entity::delete_many()
            .filter(Column::ConfigKey.is_in(keys.iter().map(String::as_str)))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected)
    }
}

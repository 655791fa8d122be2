use chrono::{DateTime, FixedOffset};
use refdata_common::types::{
    CreateDictDataRequest, CreateDictTypeRequest, DictData, DictType, Status,
    UpdateDictDataRequest, UpdateDictTypeRequest,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};

use crate::entities::dict_data::{self, Column as DataCol, Entity as DataEntity};
use crate::entities::dict_type::{self, Column as DtCol, Entity as DtEntity};
use crate::error::{Result, StoreError};
use crate::store::{map_unique, parse_column, require_non_empty, to_utc, ReferenceStore};

/// 字典类型过滤条件
#[derive(Debug, Clone, Default)]
pub struct DictTypeFilter {
    pub name_contains: Option<String>,
    pub code_contains: Option<String>,
    pub status: Option<Status>,
}

impl DictTypeFilter {
    fn apply(&self, mut q: Select<DtEntity>) -> Select<DtEntity> {
        if let Some(ref v) = self.name_contains {
            q = q.filter(DtCol::Name.contains(v));
        }
        if let Some(ref v) = self.code_contains {
            q = q.filter(DtCol::Code.contains(v));
        }
        if let Some(s) = self.status {
            q = q.filter(DtCol::Status.eq(s.as_str()));
        }
        q
    }
}

/// 字典数据过滤条件
#[derive(Debug, Clone, Default)]
pub struct DictDataFilter {
    pub type_code: Option<String>,
    pub type_id: Option<i64>,
    pub label_contains: Option<String>,
    pub value_contains: Option<String>,
    pub status: Option<Status>,
}

impl DictDataFilter {
    fn apply(&self, mut q: Select<DataEntity>) -> Select<DataEntity> {
        if let Some(ref v) = self.type_code {
            q = q.filter(DataCol::TypeCode.eq(v.as_str()));
        }
        if let Some(v) = self.type_id {
            q = q.filter(DataCol::TypeId.eq(v));
        }
        if let Some(ref v) = self.label_contains {
            q = q.filter(DataCol::Label.contains(v));
        }
        if let Some(ref v) = self.value_contains {
            q = q.filter(DataCol::Value.contains(v));
        }
        if let Some(s) = self.status {
            q = q.filter(DataCol::Status.eq(s.as_str()));
        }
        q
    }
}

fn to_dict_type(m: dict_type::Model) -> Result<DictType> {
    Ok(DictType {
        status: parse_column("sys_dict_type.status", &m.status)?,
        id: m.id,
        name: m.name,
        code: m.code,
        remark: m.remark,
        created_at: to_utc(m.created_at),
        updated_at: to_utc(m.updated_at),
    })
}

fn to_dict_data(m: dict_data::Model) -> Result<DictData> {
    Ok(DictData {
        status: parse_column("sys_dict_data.status", &m.status)?,
        id: m.id,
        label: m.label,
        value: m.value,
        sort_order: m.sort_order,
        type_id: m.type_id,
        type_code: m.type_code,
        is_default: m.is_default,
        remark: m.remark,
        created_at: to_utc(m.created_at),
        updated_at: to_utc(m.updated_at),
    })
}

/// Clears `is_default` on every entry of `type_id` except `keep`.
async fn clear_defaults<C: ConnectionTrait>(
    conn: &C,
    type_id: i64,
    keep: Option<i64>,
    now: DateTime<FixedOffset>,
) -> Result<u64> {
    let mut q = DataEntity::update_many()
        .col_expr(DataCol::IsDefault, Expr::value(false))
        .col_expr(DataCol::UpdatedAt, Expr::value(now))
        .filter(DataCol::TypeId.eq(type_id))
        .filter(DataCol::IsDefault.eq(true));
    if let Some(id) = keep {
        q = q.filter(DataCol::Id.ne(id));
    }
    Ok(q.exec(conn).await?.rows_affected)
}

impl ReferenceStore {
    // ---- sys_dict_type ----

    pub async fn create_dict_type(&self, req: &CreateDictTypeRequest) -> Result<DictType> {
        require_non_empty("name", &req.name)?;
        require_non_empty("code", &req.code)?;

        let taken = DtEntity::find()
            .filter(DtCol::Code.eq(req.code.as_str()))
            .count(self.db())
            .await?;
        if taken > 0 {
            return Err(StoreError::Conflict {
                entity: "dict_type",
                field: "code",
                value: req.code.clone(),
            });
        }

        let now = self.now();
        let am = dict_type::ActiveModel {
            id: Set(refdata_common::id::next_id()),
            name: Set(req.name.clone()),
            code: Set(req.code.clone()),
            status: Set(req.status.as_str().to_owned()),
            remark: Set(req.remark.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // A concurrent insert of the same code still loses on the unique index.
        let model = am
            .insert(self.db())
            .await
            .map_err(|e| map_unique(e, "dict_type", "code", &req.code))?;
        tracing::info!(id = model.id, code = %model.code, "Dictionary type created");
        to_dict_type(model)
    }

    pub async fn get_dict_type(&self, id: i64) -> Result<Option<DictType>> {
        DtEntity::find_by_id(id)
            .one(self.db())
            .await?
            .map(to_dict_type)
            .transpose()
    }

    pub async fn get_dict_type_by_code(&self, code: &str) -> Result<Option<DictType>> {
        DtEntity::find()
            .filter(DtCol::Code.eq(code))
            .one(self.db())
            .await?
            .map(to_dict_type)
            .transpose()
    }

    pub async fn list_dict_types(
        &self,
        filter: &DictTypeFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DictType>> {
        let rows = filter
            .apply(DtEntity::find())
            .order_by(DtCol::Id, Order::Asc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_dict_type).collect()
    }

    pub async fn count_dict_types(&self, filter: &DictTypeFilter) -> Result<u64> {
        Ok(filter.apply(DtEntity::find()).count(self.db()).await?)
    }

    /// Updates a dictionary type. Renaming `code` re-stamps `type_code` on all
    /// owned entries in the same transaction.
    pub async fn update_dict_type(
        &self,
        id: i64,
        update: &UpdateDictTypeRequest,
    ) -> Result<DictType> {
        if let Some(ref name) = update.name {
            require_non_empty("name", name)?;
        }
        if let Some(ref code) = update.code {
            require_non_empty("code", code)?;
        }

        let txn = self.db().begin().await?;
        let model = DtEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::not_found("dict_type", id))?;

        let new_code = update
            .code
            .as_ref()
            .filter(|c| **c != model.code)
            .cloned();
        if let Some(ref code) = new_code {
            let taken = DtEntity::find()
                .filter(DtCol::Code.eq(code.as_str()))
                .count(&txn)
                .await?;
            if taken > 0 {
                return Err(StoreError::Conflict {
                    entity: "dict_type",
                    field: "code",
                    value: code.clone(),
                });
            }
        }

        let now = self.now();
        let mut am: dict_type::ActiveModel = model.into();
        if let Some(ref name) = update.name {
            am.name = Set(name.clone());
        }
        if let Some(ref code) = new_code {
            am.code = Set(code.clone());
        }
        if let Some(status) = update.status {
            am.status = Set(status.as_str().to_owned());
        }
        if let Some(ref remark) = update.remark {
            am.remark = Set(remark.clone());
        }
        am.updated_at = Set(now);
        let updated = am.update(&txn).await.map_err(|e| {
            map_unique(e, "dict_type", "code", new_code.as_deref().unwrap_or_default())
        })?;

        if let Some(ref code) = new_code {
            let restamped = DataEntity::update_many()
                .col_expr(DataCol::TypeCode, Expr::value(code.as_str()))
                .col_expr(DataCol::UpdatedAt, Expr::value(now))
                .filter(DataCol::TypeId.eq(id))
                .exec(&txn)
                .await?
                .rows_affected;
            tracing::info!(id, code = %code, restamped, "Dictionary type code renamed");
        }

        txn.commit().await?;
        to_dict_type(updated)
    }

    /// Deletes a dictionary type together with all of its entries, atomically.
    /// Returns the number of entries removed.
    pub async fn delete_dict_type(&self, id: i64) -> Result<u64> {
        let txn = self.db().begin().await?;
        let removed = DataEntity::delete_many()
            .filter(DataCol::TypeId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        let res = DtEntity::delete_by_id(id).exec(&txn).await?;
        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::not_found("dict_type", id));
        }
        txn.commit().await?;
        tracing::info!(id, removed_items = removed, "Dictionary type deleted");
        Ok(removed)
    }

    /// Deletes several dictionary types and all of their entries in one
    /// transaction. Unknown ids are ignored. Returns the number of types removed.
    pub async fn delete_dict_types(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let txn = self.db().begin().await?;
        let removed_items = DataEntity::delete_many()
            .filter(DataCol::TypeId.is_in(ids.to_vec()))
            .exec(&txn)
            .await?
            .rows_affected;
        let removed_types = DtEntity::delete_many()
            .filter(DtCol::Id.is_in(ids.to_vec()))
            .exec(&txn)
            .await?
            .rows_affected;
        txn.commit().await?;
        tracing::info!(removed_types, removed_items, "Dictionary types deleted");
        Ok(removed_types)
    }

    // ---- sys_dict_data ----

    /// Creates an entry under `req.type_id`. The entry's `type_code` is copied
    /// from the owning type; when `is_default` is set, the type's previous
    /// default is demoted in the same transaction.
    pub async fn create_dict_data(&self, req: &CreateDictDataRequest) -> Result<DictData> {
        require_non_empty("label", &req.label)?;

        let now = self.now();
        let txn = self.db().begin().await?;
        if req.is_default {
            // write first so the transaction holds the write lock before reading
            clear_defaults(&txn, req.type_id, None, now).await?;
        }
        let owner = DtEntity::find_by_id(req.type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::not_found("dict_type", req.type_id))?;

        let am = dict_data::ActiveModel {
            id: Set(refdata_common::id::next_id()),
            label: Set(req.label.clone()),
            value: Set(req.value.clone()),
            sort_order: Set(req.sort_order),
            type_id: Set(owner.id),
            type_code: Set(owner.code.clone()),
            is_default: Set(req.is_default),
            status: Set(req.status.as_str().to_owned()),
            remark: Set(req.remark.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(&txn).await?;
        txn.commit().await?;
        tracing::debug!(id = model.id, type_code = %model.type_code, "Dictionary entry created");
        to_dict_data(model)
    }

    pub async fn get_dict_data(&self, id: i64) -> Result<Option<DictData>> {
        DataEntity::find_by_id(id)
            .one(self.db())
            .await?
            .map(to_dict_data)
            .transpose()
    }

    /// Entries of one dictionary type, ordered by `sort_order` then `id`.
    pub async fn list_dict_data(
        &self,
        type_code: &str,
        status: Option<Status>,
    ) -> Result<Vec<DictData>> {
        let mut q = DataEntity::find().filter(DataCol::TypeCode.eq(type_code));
        if let Some(s) = status {
            q = q.filter(DataCol::Status.eq(s.as_str()));
        }
        let rows = q
            .order_by(DataCol::SortOrder, Order::Asc)
            .order_by(DataCol::Id, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_dict_data).collect()
    }

    pub async fn list_dict_data_page(
        &self,
        filter: &DictDataFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DictData>> {
        let rows = filter
            .apply(DataEntity::find())
            .order_by(DataCol::TypeId, Order::Asc)
            .order_by(DataCol::SortOrder, Order::Asc)
            .order_by(DataCol::Id, Order::Asc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_dict_data).collect()
    }

    pub async fn count_dict_data(&self, filter: &DictDataFilter) -> Result<u64> {
        Ok(filter.apply(DataEntity::find()).count(self.db()).await?)
    }

    /// The enabled default entry of a dictionary type, if one is marked.
    pub async fn default_dict_data(&self, type_code: &str) -> Result<Option<DictData>> {
        DataEntity::find()
            .filter(DataCol::TypeCode.eq(type_code))
            .filter(DataCol::IsDefault.eq(true))
            .filter(DataCol::Status.eq(Status::Enabled.as_str()))
            .order_by(DataCol::Id, Order::Asc)
            .one(self.db())
            .await?
            .map(to_dict_data)
            .transpose()
    }

    pub async fn update_dict_data(
        &self,
        id: i64,
        update: &UpdateDictDataRequest,
    ) -> Result<DictData> {
        if let Some(ref label) = update.label {
            require_non_empty("label", label)?;
        }

        let now = self.now();
        let txn = self.db().begin().await?;
        let model = DataEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::not_found("dict_data", id))?;

        if update.is_default == Some(true) {
            clear_defaults(&txn, model.type_id, Some(id), now).await?;
        }

        let mut am: dict_data::ActiveModel = model.into();
        if let Some(ref label) = update.label {
            am.label = Set(label.clone());
        }
        if let Some(ref value) = update.value {
            am.value = Set(value.clone());
        }
        if let Some(order) = update.sort_order {
            am.sort_order = Set(order);
        }
        if let Some(is_default) = update.is_default {
            am.is_default = Set(is_default);
        }
        if let Some(status) = update.status {
            am.status = Set(status.as_str().to_owned());
        }
        if let Some(ref remark) = update.remark {
            am.remark = Set(remark.clone());
        }
        am.updated_at = Set(now);
        let updated = am.update(&txn).await?;
        txn.commit().await?;
        to_dict_data(updated)
    }

    pub async fn delete_dict_data(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let res = DataEntity::delete_many()
            .filter(DataCol::Id.is_in(ids.to_vec()))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected)
    }
}

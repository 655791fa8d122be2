use refdata_common::types::{
    ConfigType, CreateDictDataRequest, CreateDictTypeRequest, EmailStatus, NoticeLevel,
    NoticeStatus, NoticeType, Status,
};
use refdata_storage::ReferenceStore;
use std::collections::HashSet;

use crate::config::{DictionariesSeedFile, SeedDictItem, SeedDictType};

/// Outcome of one dictionary seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictSeedReport {
    pub types_created: usize,
    pub types_skipped: usize,
    pub items_created: usize,
    pub items_skipped: usize,
}

/// Built-in dictionaries backing the closed enums of the store itself.
pub fn default_dict_types() -> Vec<SeedDictType> {
    let mut types = Vec::new();

    // ---- sys_common_status: 通用状态 ----
    types.push(system_type(
        "通用状态",
        "sys_common_status",
        Status::ALL
            .iter()
            .map(|s| {
                let label = match s {
                    Status::Enabled => "正常",
                    Status::Disabled => "停用",
                };
                (label, s.as_str(), *s == Status::default())
            })
            .collect(),
    ));

    // ---- sys_notice_type: 公告类型 ----
    types.push(system_type(
        "公告类型",
        "sys_notice_type",
        NoticeType::ALL
            .iter()
            .map(|t| {
                let label = match t {
                    NoticeType::Notice => "通知",
                    NoticeType::Announcement => "公告",
                };
                (label, t.as_str(), *t == NoticeType::default())
            })
            .collect(),
    ));

    // ---- sys_notice_level: 公告级别 ----
    types.push(system_type(
        "公告级别",
        "sys_notice_level",
        NoticeLevel::ALL
            .iter()
            .map(|l| {
                let label = match l {
                    NoticeLevel::Normal => "普通",
                    NoticeLevel::Important => "重要",
                    NoticeLevel::Urgent => "紧急",
                };
                (label, l.as_str(), *l == NoticeLevel::default())
            })
            .collect(),
    ));

    // ---- sys_notice_status: 公告状态 ----
    types.push(system_type(
        "公告状态",
        "sys_notice_status",
        NoticeStatus::ALL
            .iter()
            .map(|s| {
                let label = match s {
                    NoticeStatus::Draft => "草稿",
                    NoticeStatus::Published => "已发布",
                    NoticeStatus::Withdrawn => "已撤回",
                };
                (label, s.as_str(), false)
            })
            .collect(),
    ));

    // ---- sys_config_type: 配置值类型 ----
    types.push(system_type(
        "配置值类型",
        "sys_config_type",
        ConfigType::ALL
            .iter()
            .map(|t| {
                let label = match t {
                    ConfigType::Text => "文本",
                    ConfigType::Number => "数字",
                    ConfigType::Boolean => "布尔",
                    ConfigType::Json => "JSON",
                    ConfigType::Array => "数组",
                };
                (label, t.as_str(), *t == ConfigType::Text)
            })
            .collect(),
    ));

    // ---- sys_email_status: 邮件发送状态 ----
    types.push(system_type(
        "邮件发送状态",
        "sys_email_status",
        EmailStatus::ALL
            .iter()
            .map(|s| {
                let label = match s {
                    EmailStatus::Pending => "待发送",
                    EmailStatus::Sent => "已发送",
                    EmailStatus::Failed => "发送失败",
                };
                (label, s.as_str(), false)
            })
            .collect(),
    ));

    types
}

fn system_type(name: &str, code: &str, items: Vec<(&str, &str, bool)>) -> SeedDictType {
    SeedDictType {
        name: name.to_string(),
        code: code.to_string(),
        status: Status::Enabled,
        remark: Some("系统内置".to_string()),
        items: items
            .into_iter()
            .enumerate()
            .map(|(idx, (label, value, is_default))| SeedDictItem {
                label: label.to_string(),
                value: value.to_string(),
                sort_order: Some(idx as i32 + 1),
                is_default,
                status: Status::Enabled,
                remark: None,
            })
            .collect(),
    }
}

/// Installs the built-in dictionaries.
pub async fn init_default_dictionaries(store: &ReferenceStore) -> anyhow::Result<DictSeedReport> {
    let report = apply_seed(store, &default_dict_types()).await?;
    tracing::info!(
        types_created = report.types_created,
        items_created = report.items_created,
        "Synced built-in dictionaries"
    );
    Ok(report)
}

/// Installs the dictionaries listed in a JSON seed file.
pub async fn init_from_seed_file(
    store: &ReferenceStore,
    seed_path: &str,
) -> anyhow::Result<DictSeedReport> {
    let seed_content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: DictionariesSeedFile = serde_json::from_str(&seed_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    let report = apply_seed(store, &seed.dict_types).await?;
    tracing::info!(
        total = seed.dict_types.len(),
        types_created = report.types_created,
        types_skipped = report.types_skipped,
        items_created = report.items_created,
        items_skipped = report.items_skipped,
        "init-dictionaries completed"
    );
    Ok(report)
}

/// Creates missing types (matched by code) and missing items (matched by value).
///
/// Existing rows are never modified, so running the same seed twice is a
/// no-op. A seeded item only becomes the default when its type has none yet.
pub async fn apply_seed(
    store: &ReferenceStore,
    types: &[SeedDictType],
) -> anyhow::Result<DictSeedReport> {
    let mut report = DictSeedReport::default();

    for seed_type in types {
        let dict_type = match store.get_dict_type_by_code(&seed_type.code).await? {
            Some(existing) => {
                report.types_skipped += 1;
                existing
            }
            None => {
                let created = store
                    .create_dict_type(&CreateDictTypeRequest {
                        name: seed_type.name.clone(),
                        code: seed_type.code.clone(),
                        status: seed_type.status,
                        remark: seed_type.remark.clone(),
                    })
                    .await?;
                report.types_created += 1;
                created
            }
        };

        let existing = store.list_dict_data(&dict_type.code, None).await?;
        let mut has_default = existing.iter().any(|d| d.is_default);
        let mut known: HashSet<String> = existing.into_iter().map(|d| d.value).collect();

        for (idx, item) in seed_type.items.iter().enumerate() {
            if !known.insert(item.value.clone()) {
                report.items_skipped += 1;
                continue;
            }
            let is_default = item.is_default && !has_default;
            store
                .create_dict_data(&CreateDictDataRequest {
                    label: item.label.clone(),
                    value: item.value.clone(),
                    sort_order: item.sort_order.unwrap_or(idx as i32 + 1),
                    type_id: dict_type.id,
                    is_default,
                    status: item.status,
                    remark: item.remark.clone(),
                })
                .await?;
            has_default |= is_default;
            report.items_created += 1;
        }

        tracing::debug!(code = %dict_type.code, "Dictionary type seeded");
    }

    Ok(report)
}

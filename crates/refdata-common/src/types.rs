use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Declares a closed, lowercase-tagged variant type stored as text.
///
/// Generates `as_str`, `ALL`, `Display` and a case-insensitive `FromStr`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    )),
                }
            }
        }
    };
}

text_enum! {
    /// Administrative switch shared by dictionary types, dictionary entries
    /// and configs.
    ///
    /// # Examples
    ///
    /// ```
    /// use refdata_common::types::Status;
    ///
    /// let s: Status = "Disabled".parse().unwrap();
    /// assert_eq!(s, Status::Disabled);
    /// assert_eq!(s.to_string(), "disabled");
    /// ```
    pub enum Status {
        Enabled => "enabled",
        Disabled => "disabled",
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Enabled
    }
}

text_enum! {
    /// 公告类型
    pub enum NoticeType {
        Notice => "notice",
        Announcement => "announcement",
    }
}

impl Default for NoticeType {
    fn default() -> Self {
        NoticeType::Notice
    }
}

text_enum! {
    /// 公告级别
    pub enum NoticeLevel {
        Normal => "normal",
        Important => "important",
        Urgent => "urgent",
    }
}

impl Default for NoticeLevel {
    fn default() -> Self {
        NoticeLevel::Normal
    }
}

text_enum! {
    /// Notice lifecycle: `draft -> published -> withdrawn`. A withdrawn
    /// notice is terminal.
    pub enum NoticeStatus {
        Draft => "draft",
        Published => "published",
        Withdrawn => "withdrawn",
    }
}

text_enum! {
    /// Semantic type tag of a config value, which is always stored as text.
    pub enum ConfigType {
        Text => "text",
        Number => "number",
        Boolean => "boolean",
        Json => "json",
        Array => "array",
    }
}

text_enum! {
    /// Email delivery record status. `sent` and `failed` are terminal.
    pub enum EmailStatus {
        Pending => "pending",
        Sent => "sent",
        Failed => "failed",
    }
}

/// Maps a present field to `Some(..)`, so an explicit `null` becomes
/// `Some(None)`. Pair with `#[serde(default)]` for the absent case.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---- 字典 ----

/// 字典类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictType {
    pub id: i64,
    /// 字典名称
    pub name: String,
    /// 字典编码（全局唯一）
    pub code: String,
    pub status: Status,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 字典数据条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictData {
    pub id: i64,
    /// 显示标签
    pub label: String,
    /// 数据值
    pub value: String,
    /// 排序号（升序）
    pub sort_order: i32,
    /// 所属字典类型ID
    pub type_id: i64,
    /// 所属字典类型编码，始终由存储层根据 `type_id` 写入
    pub type_code: String,
    /// 是否默认值（同一类型下至多一个）
    pub is_default: bool,
    pub status: Status,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDictTypeRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDictTypeRequest {
    pub name: Option<String>,
    /// Renaming the code re-stamps `type_code` on every owned entry.
    pub code: Option<String>,
    pub status: Option<Status>,
    /// `null` clears the remark; an absent field keeps it.
    #[serde(default, deserialize_with = "clearable")]
    pub remark: Option<Option<String>>,
}

/// 创建字典数据请求
///
/// No `type_code` field: the store derives it from
/// `type_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDictDataRequest {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub sort_order: i32,
    pub type_id: i64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDictDataRequest {
    pub label: Option<String>,
    pub value: Option<String>,
    pub sort_order: Option<i32>,
    pub is_default: Option<bool>,
    pub status: Option<Status>,
    /// `null` clears the remark; an absent field keeps it.
    #[serde(default, deserialize_with = "clearable")]
    pub remark: Option<Option<String>>,
}

// ---- 通知公告 ----

/// 通知公告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    /// 富文本内容
    pub content: String,
    pub notice_type: NoticeType,
    pub level: NoticeLevel,
    /// 是否置顶
    pub is_top: bool,
    pub status: NoticeStatus,
    pub publish_time: Option<DateTime<Utc>>,
    pub publisher_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoticeRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub notice_type: NoticeType,
    #[serde(default)]
    pub level: NoticeLevel,
    #[serde(default)]
    pub is_top: bool,
    /// Accepted for wire compatibility and ignored: notices always start as
    /// drafts and are published explicitly.
    #[serde(default)]
    pub status: Option<NoticeStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub notice_type: Option<NoticeType>,
    pub level: Option<NoticeLevel>,
    pub is_top: Option<bool>,
}

// ---- 系统配置 ----

/// 系统配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub id: i64,
    /// 配置名称
    pub name: String,
    /// 配置键（唯一）
    pub key: String,
    /// 配置值（文本编码，按 `config_type` 解析）
    pub value: String,
    pub config_type: ConfigType,
    /// 是否前端可见
    pub is_frontend_visible: bool,
    pub status: Status,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertConfigRequest {
    pub key: String,
    pub value: String,
    pub config_type: ConfigType,
    #[serde(default)]
    pub is_frontend_visible: bool,
    #[serde(default)]
    pub remark: Option<String>,
    /// Display name; a new config falls back to its key, an existing one
    /// keeps its current name.
    #[serde(default)]
    pub name: Option<String>,
}

impl UpsertConfigRequest {
    pub fn new(key: impl Into<String>, value: impl Into<String>, config_type: ConfigType) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            config_type,
            is_frontend_visible: false,
            remark: None,
            name: None,
        }
    }
}

// ---- 邮件记录 ----

/// 邮件发送记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: i64,
    pub to_email: String,
    pub subject: String,
    pub content: String,
    pub is_html: bool,
    pub status: EmailStatus,
    pub error_msg: Option<String>,
    pub send_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEmailRequest {
    pub to_email: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub is_html: bool,
}

/// Email record counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailStatusSummary {
    pub pending: u64,
    pub sent: u64,
    pub failed: u64,
}

impl EmailStatusSummary {
    pub fn total(&self) -> u64 {
        self.pending + self.sent + self.failed
    }
}

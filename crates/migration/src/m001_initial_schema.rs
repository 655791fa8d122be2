use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按依赖顺序建表
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await?;
        Ok(())
    }
}

const UP_SQL: &str = "
CREATE TABLE IF NOT EXISTS sys_dict_type (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'enabled',
    remark TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_dict_type_status ON sys_dict_type(status);

CREATE TABLE IF NOT EXISTS sys_dict_data (
    id INTEGER PRIMARY KEY NOT NULL,
    label TEXT NOT NULL,
    value TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0,
    type_id INTEGER NOT NULL REFERENCES sys_dict_type(id) ON DELETE CASCADE,
    type_code TEXT NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'enabled',
    remark TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_dict_data_type_id ON sys_dict_data(type_id);
CREATE INDEX IF NOT EXISTS idx_dict_data_type_code ON sys_dict_data(type_code, sort_order, id);

CREATE TABLE IF NOT EXISTS sys_notice (
    id INTEGER PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    notice_type TEXT NOT NULL DEFAULT 'notice',
    level TEXT NOT NULL DEFAULT 'normal',
    is_top INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'draft',
    publish_time TEXT,
    publisher_id INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notice_status ON sys_notice(status);
CREATE INDEX IF NOT EXISTS idx_notice_feed ON sys_notice(is_top DESC, publish_time DESC, id DESC);

CREATE TABLE IF NOT EXISTS sys_config (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    config_key TEXT NOT NULL UNIQUE,
    config_value TEXT NOT NULL,
    config_type TEXT NOT NULL DEFAULT 'text',
    is_frontend INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'enabled',
    remark TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_config_frontend ON sys_config(is_frontend, status);

CREATE TABLE IF NOT EXISTS sys_email_record (
    id INTEGER PRIMARY KEY NOT NULL,
    to_email TEXT NOT NULL,
    subject TEXT NOT NULL,
    content TEXT NOT NULL,
    is_html INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    error_msg TEXT,
    send_time TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_email_record_status ON sys_email_record(status, created_at);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS sys_email_record;
DROP TABLE IF EXISTS sys_config;
DROP TABLE IF EXISTS sys_notice;
DROP TABLE IF EXISTS sys_dict_data;
DROP TABLE IF EXISTS sys_dict_type;
";

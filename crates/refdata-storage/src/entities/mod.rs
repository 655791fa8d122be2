pub mod dict_data;
pub mod dict_type;
pub mod email_record;
pub mod notice;
pub mod sys_config;

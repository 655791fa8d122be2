use crate::clock::ManualClock;
use crate::config_value::ConfigValue;
use crate::error::{ErrorKind, StoreError};
use crate::store::{ConfigFilter, DictDataFilter, DictTypeFilter, NoticeFilter, ReferenceStore};
use crate::EmailRecordFilter;
use chrono::{Duration, TimeZone, Utc};
use refdata_common::types::{
    ConfigType, CreateDictDataRequest, CreateDictTypeRequest, CreateNoticeRequest, EmailStatus,
    NoticeLevel, NoticeStatus, NoticeType, RecordEmailRequest, Status, UpdateDictDataRequest,
    UpdateDictTypeRequest, UpdateNoticeRequest, UpsertConfigRequest,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn setup() -> (TempDir, ReferenceStore, Arc<ManualClock>) {
    refdata_common::id::init(1, 1);
    let dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("refdata.db").display()
    );
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
    ));
    let store = ReferenceStore::with_clock(&url, clock.clone())
        .await
        .unwrap();
    (dir, store, clock)
}

fn dict_type(name: &str, code: &str) -> CreateDictTypeRequest {
    CreateDictTypeRequest {
        name: name.to_string(),
        code: code.to_string(),
        status: Status::Enabled,
        remark: None,
    }
}

fn dict_item(type_id: i64, label: &str, value: &str, sort_order: i32) -> CreateDictDataRequest {
    CreateDictDataRequest {
        label: label.to_string(),
        value: value.to_string(),
        sort_order,
        type_id,
        is_default: false,
        status: Status::Enabled,
        remark: None,
    }
}

fn notice(title: &str, is_top: bool) -> CreateNoticeRequest {
    CreateNoticeRequest {
        title: title.to_string(),
        content: "<p>body</p>".to_string(),
        notice_type: NoticeType::Announcement,
        level: NoticeLevel::Normal,
        is_top,
        status: None,
    }
}

fn email(to: &str) -> RecordEmailRequest {
    RecordEmailRequest {
        to_email: to.to_string(),
        subject: "Welcome".to_string(),
        content: "hello".to_string(),
        is_html: false,
    }
}

// ---- 字典 ----

#[tokio::test]
async fn duplicate_dict_type_code_conflicts() {
    let (_dir, store, _clock) = setup().await;

    store
        .create_dict_type(&dict_type("User status", "sys_user_status"))
        .await
        .unwrap();
    let err = store
        .create_dict_type(&dict_type("Another", "sys_user_status"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        store.count_dict_types(&DictTypeFilter::default()).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn empty_dict_type_code_is_rejected() {
    let (_dir, store, _clock) = setup().await;
    let err = store
        .create_dict_type(&dict_type("Nameless", "  "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn delete_dict_type_cascades_to_entries() {
    let (_dir, store, _clock) = setup().await;

    let t = store
        .create_dict_type(&dict_type("Gender", "sys_gender"))
        .await
        .unwrap();
    let keep = store
        .create_dict_type(&dict_type("Yes/No", "sys_yes_no"))
        .await
        .unwrap();
    let a = store.create_dict_data(&dict_item(t.id, "Male", "m", 1)).await.unwrap();
    store.create_dict_data(&dict_item(t.id, "Female", "f", 2)).await.unwrap();
    store.create_dict_data(&dict_item(keep.id, "Yes", "y", 1)).await.unwrap();

    let removed = store.delete_dict_type(t.id).await.unwrap();
    assert_eq!(removed, 2);

    assert!(store.get_dict_type(t.id).await.unwrap().is_none());
    assert!(store.get_dict_data(a.id).await.unwrap().is_none());
    let filter = DictDataFilter {
        type_id: Some(t.id),
        ..Default::default()
    };
    assert_eq!(store.count_dict_data(&filter).await.unwrap(), 0);
    assert!(store.list_dict_data("sys_gender", None).await.unwrap().is_empty());
    assert_eq!(store.list_dict_data("sys_yes_no", None).await.unwrap().len(), 1);

    let err = store.delete_dict_type(t.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn dict_data_type_code_is_derived_from_owner() {
    let (_dir, store, _clock) = setup().await;

    let t = store
        .create_dict_type(&dict_type("Priority", "sys_priority"))
        .await
        .unwrap();
    let item = store.create_dict_data(&dict_item(t.id, "High", "high", 1)).await.unwrap();
    assert_eq!(item.type_code, "sys_priority");
    assert_eq!(item.type_id, t.id);

    let err = store
        .create_dict_data(&dict_item(987_654, "Orphan", "x", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "dict_type", .. }));
}

#[tokio::test]
async fn renaming_dict_type_code_restamps_entries() {
    let (_dir, store, _clock) = setup().await;

    let t = store
        .create_dict_type(&dict_type("Priority", "sys_priority"))
        .await
        .unwrap();
    store
        .create_dict_type(&dict_type("Taken", "sys_taken"))
        .await
        .unwrap();
    let item = store.create_dict_data(&dict_item(t.id, "Low", "low", 1)).await.unwrap();

    let update = UpdateDictTypeRequest {
        code: Some("biz_priority".to_string()),
        ..Default::default()
    };
    let renamed = store.update_dict_type(t.id, &update).await.unwrap();
    assert_eq!(renamed.code, "biz_priority");
    assert_eq!(renamed.name, "Priority");

    let item = store.get_dict_data(item.id).await.unwrap().unwrap();
    assert_eq!(item.type_code, "biz_priority");
    assert_eq!(store.list_dict_data("biz_priority", None).await.unwrap().len(), 1);
    assert!(store.list_dict_data("sys_priority", None).await.unwrap().is_empty());

    let clash = UpdateDictTypeRequest {
        code: Some("sys_taken".to_string()),
        ..Default::default()
    };
    let err = store.update_dict_type(t.id, &clash).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let unchanged = store.get_dict_type_by_code("biz_priority").await.unwrap();
    assert_eq!(unchanged.map(|t| t.id), Some(t.id));
}

#[tokio::test]
async fn list_dict_data_orders_by_sort_order_then_id() {
    let (_dir, store, _clock) = setup().await;

    let t = store
        .create_dict_type(&dict_type("Level", "sys_level"))
        .await
        .unwrap();
    let c = store.create_dict_data(&dict_item(t.id, "C", "c", 3)).await.unwrap();
    let a1 = store.create_dict_data(&dict_item(t.id, "A1", "a1", 1)).await.unwrap();
    let a2 = store.create_dict_data(&dict_item(t.id, "A2", "a2", 1)).await.unwrap();
    let mut off = dict_item(t.id, "B", "b", 2);
    off.status = Status::Disabled;
    let b = store.create_dict_data(&off).await.unwrap();

    let all: Vec<i64> = store
        .list_dict_data("sys_level", None)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(all, vec![a1.id, a2.id, b.id, c.id]);

    let enabled: Vec<i64> = store
        .list_dict_data("sys_level", Some(Status::Enabled))
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(enabled, vec![a1.id, a2.id, c.id]);

    let page = store
        .list_dict_data_page(
            &DictDataFilter {
                label_contains: Some("A".to_string()),
                ..Default::default()
            },
            1,
            1,
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, a2.id);
}

#[tokio::test]
async fn setting_a_default_demotes_the_previous_one() {
    let (_dir, store, _clock) = setup().await;

    let t = store
        .create_dict_type(&dict_type("Yes/No", "sys_yes_no"))
        .await
        .unwrap();
    let mut yes = dict_item(t.id, "Yes", "Y", 1);
    yes.is_default = true;
    let yes = store.create_dict_data(&yes).await.unwrap();
    let mut no = dict_item(t.id, "No", "N", 2);
    no.is_default = true;
    let no = store.create_dict_data(&no).await.unwrap();

    let defaults: Vec<_> = store
        .list_dict_data("sys_yes_no", None)
        .await
        .unwrap()
        .into_iter()
        .filter(|d| d.is_default)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, no.id);

    let update = UpdateDictDataRequest {
        is_default: Some(true),
        ..Default::default()
    };
    store.update_dict_data(yes.id, &update).await.unwrap();
    let current = store.default_dict_data("sys_yes_no").await.unwrap().unwrap();
    assert_eq!(current.id, yes.id);
    assert!(!store.get_dict_data(no.id).await.unwrap().unwrap().is_default);
}

#[tokio::test]
async fn update_and_delete_dict_data() {
    let (_dir, store, _clock) = setup().await;

    let t = store
        .create_dict_type(&dict_type("Color", "sys_color"))
        .await
        .unwrap();
    let red = store.create_dict_data(&dict_item(t.id, "Red", "red", 1)).await.unwrap();
    let blue = store.create_dict_data(&dict_item(t.id, "Blue", "blue", 2)).await.unwrap();

    let update = UpdateDictDataRequest {
        label: Some("Crimson".to_string()),
        status: Some(Status::Disabled),
        remark: Some(Some("renamed".to_string())),
        ..Default::default()
    };
    let updated = store.update_dict_data(red.id, &update).await.unwrap();
    assert_eq!(updated.label, "Crimson");
    assert_eq!(updated.value, "red");
    assert_eq!(updated.status, Status::Disabled);
    assert_eq!(updated.remark.as_deref(), Some("renamed"));
    assert_eq!(updated.type_code, "sys_color");

    let err = store
        .update_dict_data(123, &UpdateDictDataRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(store.delete_dict_data(&[red.id, blue.id, 42]).await.unwrap(), 2);
    assert_eq!(store.delete_dict_data(&[]).await.unwrap(), 0);
    assert!(store.list_dict_data("sys_color", None).await.unwrap().is_empty());
}

// ---- 通知公告 ----

#[tokio::test]
async fn notices_are_created_as_drafts() {
    let (_dir, store, _clock) = setup().await;

    let mut req = notice("Maintenance", false);
    req.status = Some(NoticeStatus::Published);
    let n = store.create_notice(&req).await.unwrap();
    assert_eq!(n.status, NoticeStatus::Draft);
    assert!(n.publish_time.is_none());
    assert!(n.publisher_id.is_none());
}

#[tokio::test]
async fn withdrawn_notice_cannot_be_republished() {
    let (_dir, store, clock) = setup().await;

    let n = store.create_notice(&notice("Release", false)).await.unwrap();
    clock.advance(Duration::minutes(5));
    let published = store.publish_notice(n.id, 7).await.unwrap();
    assert_eq!(published.status, NoticeStatus::Published);
    assert_eq!(published.publisher_id, Some(7));
    assert_eq!(published.publish_time, Some(clock_now(&clock)));

    let withdrawn = store.withdraw_notice(n.id).await.unwrap();
    assert_eq!(withdrawn.status, NoticeStatus::Withdrawn);

    let err = store.publish_notice(n.id, 7).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = store.withdraw_notice(n.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let edit = UpdateNoticeRequest {
        title: Some("Edited".to_string()),
        ..Default::default()
    };
    let err = store.update_notice(n.id, &edit).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

fn clock_now(clock: &ManualClock) -> chrono::DateTime<Utc> {
    use crate::clock::Clock;
    clock.now()
}

#[tokio::test]
async fn withdrawing_a_draft_is_refused() {
    let (_dir, store, _clock) = setup().await;

    let n = store.create_notice(&notice("Draft", false)).await.unwrap();
    let err = store.withdraw_notice(n.id).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidState { ref status, .. } if status == "draft"
    ));

    let err = store.publish_notice(555, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn republishing_restamps_publish_time() {
    let (_dir, store, clock) = setup().await;

    let n = store.create_notice(&notice("Weekly", false)).await.unwrap();
    let first = store.publish_notice(n.id, 1).await.unwrap();
    clock.advance(Duration::hours(1));
    let second = store.publish_notice(n.id, 2).await.unwrap();
    assert!(second.publish_time > first.publish_time);
    assert_eq!(second.publisher_id, Some(2));
}

#[tokio::test]
async fn published_notices_list_pinned_first_then_newest() {
    let (_dir, store, clock) = setup().await;

    let old_plain = store.create_notice(&notice("old plain", false)).await.unwrap();
    let old_pinned = store.create_notice(&notice("old pinned", true)).await.unwrap();
    let new_plain = store.create_notice(&notice("new plain", false)).await.unwrap();
    let new_pinned = store.create_notice(&notice("new pinned", true)).await.unwrap();
    let draft = store.create_notice(&notice("draft", true)).await.unwrap();

    for n in [&old_plain, &old_pinned, &new_plain, &new_pinned] {
        clock.advance(Duration::minutes(1));
        store.publish_notice(n.id, 1).await.unwrap();
    }

    let filter = NoticeFilter {
        status: Some(NoticeStatus::Published),
        ..Default::default()
    };
    let ids: Vec<i64> = store
        .list_notices(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![new_pinned.id, old_pinned.id, new_plain.id, old_plain.id]);

    // unpublished rows sort after published ones within the pinned group
    let all: Vec<i64> = store
        .list_notices(&NoticeFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(all[..3], [new_pinned.id, old_pinned.id, draft.id]);

    assert_eq!(store.count_notices(&filter).await.unwrap(), 4);
    let page = store.list_notices_page(&filter, 2, 1).await.unwrap();
    assert_eq!(
        page.iter().map(|n| n.id).collect::<Vec<_>>(),
        vec![old_pinned.id, new_plain.id]
    );
}

#[tokio::test]
async fn update_and_delete_notices() {
    let (_dir, store, _clock) = setup().await;

    let n = store.create_notice(&notice("Typo", false)).await.unwrap();
    let edit = UpdateNoticeRequest {
        title: Some("Fixed".to_string()),
        level: Some(NoticeLevel::Urgent),
        is_top: Some(true),
        ..Default::default()
    };
    let updated = store.update_notice(n.id, &edit).await.unwrap();
    assert_eq!(updated.title, "Fixed");
    assert_eq!(updated.level, NoticeLevel::Urgent);
    assert!(updated.is_top);
    assert_eq!(updated.content, n.content);

    let err = store
        .update_notice(n.id, &UpdateNoticeRequest {
            title: Some(String::new()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(store.delete_notices(&[n.id]).await.unwrap(), 1);
    assert!(store.get_notice(n.id).await.unwrap().is_none());
}

// ---- 系统配置 ----

#[tokio::test]
async fn upsert_config_overwrites_in_place() {
    let (_dir, store, _clock) = setup().await;

    let first = store
        .upsert_config(&UpsertConfigRequest::new("site.title", "Hello", ConfigType::Text))
        .await
        .unwrap();
    assert_eq!(first.name, "site.title");
    assert_eq!(
        store.get_config_value("site.title", false).await.unwrap(),
        ConfigValue::Text("Hello".to_string())
    );

    let second = store
        .upsert_config(&UpsertConfigRequest::new("site.title", "World", ConfigType::Text))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(
        store.get_config_value("site.title", false).await.unwrap(),
        ConfigValue::Text("World".to_string())
    );
    assert_eq!(store.count_configs(&ConfigFilter::default()).await.unwrap(), 1);
}

#[tokio::test]
async fn upsert_config_keeps_name_unless_given() {
    let (_dir, store, _clock) = setup().await;

    let mut req = UpsertConfigRequest::new("mail.port", "25", ConfigType::Number);
    req.name = Some("SMTP port".to_string());
    store.upsert_config(&req).await.unwrap();

    let again = store
        .upsert_config(&UpsertConfigRequest::new("mail.port", "587", ConfigType::Number))
        .await
        .unwrap();
    assert_eq!(again.name, "SMTP port");
    assert_eq!(again.value, "587");
    let v = store.get_config_value("mail.port", false).await.unwrap();
    assert_eq!(v.as_i64(), Some(587));
}

#[tokio::test]
async fn upsert_config_rejects_values_of_the_wrong_type() {
    let (_dir, store, _clock) = setup().await;

    let err = store
        .upsert_config(&UpsertConfigRequest::new("max.items", "abc", ConfigType::Number))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = store
        .upsert_config(&UpsertConfigRequest::new("theme", "{oops", ConfigType::Json))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    store
        .upsert_config(&UpsertConfigRequest::new("max.items", "10", ConfigType::Number))
        .await
        .unwrap();
    let err = store
        .upsert_config(&UpsertConfigRequest::new("max.items", "ten", ConfigType::Number))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let kept = store.get_config("max.items").await.unwrap().unwrap();
    assert_eq!(kept.value, "10");
}

#[tokio::test]
async fn disabled_configs_need_explicit_opt_in() {
    let (_dir, store, _clock) = setup().await;

    let err = store.get_config_value("missing", true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    store
        .upsert_config(&UpsertConfigRequest::new("feature.beta", "true", ConfigType::Boolean))
        .await
        .unwrap();
    let disabled = store
        .set_config_status("feature.beta", Status::Disabled)
        .await
        .unwrap();
    assert_eq!(disabled.status, Status::Disabled);

    let err = store.get_config_value("feature.beta", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Disabled);
    let v = store.get_config_value("feature.beta", true).await.unwrap();
    assert_eq!(v.as_bool(), Some(true));

    // upsert leaves the status alone
    store
        .upsert_config(&UpsertConfigRequest::new("feature.beta", "false", ConfigType::Boolean))
        .await
        .unwrap();
    let row = store.get_config("feature.beta").await.unwrap().unwrap();
    assert_eq!(row.status, Status::Disabled);

    let err = store
        .set_config_status("missing", Status::Enabled)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn frontend_configs_are_enabled_and_visible_only() {
    let (_dir, store, _clock) = setup().await;

    for (key, visible) in [("ui.theme", true), ("ui.logo", true), ("db.secret", false)] {
        let mut req = UpsertConfigRequest::new(key, "x", ConfigType::Text);
        req.is_frontend_visible = visible;
        store.upsert_config(&req).await.unwrap();
    }
    store.set_config_status("ui.logo", Status::Disabled).await.unwrap();

    let keys: Vec<String> = store
        .list_frontend_configs()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.key)
        .collect();
    assert_eq!(keys, vec!["ui.theme".to_string()]);

    let filter = ConfigFilter {
        key_contains: Some("ui.".to_string()),
        ..Default::default()
    };
    assert_eq!(store.list_configs(&filter, 10, 0).await.unwrap().len(), 2);

    let removed = store
        .delete_configs(&["ui.theme".to_string(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);
}

// ---- 邮件记录 ----

#[tokio::test]
async fn email_transitions_are_single_shot() {
    let (_dir, store, clock) = setup().await;

    let rec = store.record_email_attempt(&email("a@example.com")).await.unwrap();
    assert_eq!(rec.status, EmailStatus::Pending);

    let sent_at = clock_now(&clock) + Duration::seconds(3);
    let sent = store.mark_email_sent(rec.id, sent_at).await.unwrap();
    assert_eq!(sent.status, EmailStatus::Sent);
    assert_eq!(sent.send_time, Some(sent_at));

    let err = store.mark_email_failed(rec.id, "smtp timeout").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = store.mark_email_sent(rec.id, sent_at).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = store.mark_email_sent(404, sent_at).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let failed = store.record_email_attempt(&email("b@example.com")).await.unwrap();
    let failed = store.mark_email_failed(failed.id, "mailbox full").await.unwrap();
    assert_eq!(failed.error_msg.as_deref(), Some("mailbox full"));
    assert!(failed.send_time.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_email_transitions_have_one_winner() {
    let (_dir, store, _clock) = setup().await;
    let store = Arc::new(store);

    for _ in 0..5 {
        let rec = store.record_email_attempt(&email("race@example.com")).await.unwrap();

        let s1 = store.clone();
        let s2 = store.clone();
        let sent = tokio::spawn(async move { s1.mark_email_sent(rec.id, Utc::now()).await });
        let failed = tokio::spawn(async move { s2.mark_email_failed(rec.id, "err").await });
        let (sent, failed) = (sent.await.unwrap(), failed.await.unwrap());

        assert!(sent.is_ok() != failed.is_ok(), "exactly one transition must win");
        let loser = sent.err().or(failed.err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::InvalidState);

        let row = store.get_email_record(rec.id).await.unwrap().unwrap();
        assert_ne!(row.status, EmailStatus::Pending);
    }
}

#[tokio::test]
async fn pending_queue_and_summary() {
    let (_dir, store, clock) = setup().await;

    let first = store.record_email_attempt(&email("1@example.com")).await.unwrap();
    clock.advance(Duration::seconds(1));
    let second = store.record_email_attempt(&email("2@example.com")).await.unwrap();
    clock.advance(Duration::seconds(1));
    let third = store.record_email_attempt(&email("3@example.com")).await.unwrap();
    store.mark_email_failed(second.id, "bounce").await.unwrap();

    let pending: Vec<i64> = store
        .list_pending_emails(10)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(pending, vec![first.id, third.id]);

    let newest = store
        .list_email_records(&EmailRecordFilter::default(), 1, 0)
        .await
        .unwrap();
    assert_eq!(newest[0].id, third.id);

    let summary = store.email_status_summary().await.unwrap();
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.total(), 3);

    let filter = EmailRecordFilter {
        status: Some(EmailStatus::Failed),
        ..Default::default()
    };
    assert_eq!(store.count_email_records(&filter).await.unwrap(), 1);

    let err = store.record_email_attempt(&email("")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_notice_withdrawals_have_one_winner() {
    let (_dir, store, _clock) = setup().await;
    let store = Arc::new(store);

    for round in 0..10 {
        let n = store
            .create_notice(&notice(&format!("race {round}"), false))
            .await
            .unwrap();
        store.publish_notice(n.id, 1).await.unwrap();

        let s1 = store.clone();
        let s2 = store.clone();
        let first = tokio::spawn(async move { s1.withdraw_notice(n.id).await });
        let second = tokio::spawn(async move { s2.withdraw_notice(n.id).await });
        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        assert!(first.is_ok() != second.is_ok(), "exactly one withdrawal must win");
        let loser = first.err().or(second.err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::InvalidState);

        let err = store.publish_notice(n.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_of_one_key_leave_a_consistent_row() {
    let (_dir, store, _clock) = setup().await;
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for i in 0..40 {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            let req = if i % 2 == 0 {
                UpsertConfigRequest::new("limits.max", i.to_string(), ConfigType::Number)
            } else {
                UpsertConfigRequest::new("limits.max", format!("[{i}]"), ConfigType::Array)
            };
            s.upsert_config(&req).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(store.count_configs(&ConfigFilter::default()).await.unwrap(), 1);
    let row = store.get_config("limits.max").await.unwrap().unwrap();
    // value and type were written by the same statement
    let value = store.get_config_value("limits.max", false).await.unwrap();
    assert_eq!(value.config_type(), row.config_type);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn readers_never_see_a_half_deleted_dict_type() {
    let (_dir, store, _clock) = setup().await;
    let store = Arc::new(store);

    let t = store
        .create_dict_type(&dict_type("Region", "sys_region"))
        .await
        .unwrap();
    for i in 0..20 {
        store
            .create_dict_data(&dict_item(t.id, &format!("R{i}"), &format!("r{i}"), i))
            .await
            .unwrap();
    }

    let reader = {
        let s = store.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                // type gone => entries gone
                let owner = s.get_dict_type(t.id).await.unwrap();
                let items = s.list_dict_data("sys_region", None).await.unwrap();
                if owner.is_none() {
                    assert!(items.is_empty(), "entries outlived their type");
                    return;
                }

                // entries gone => type gone
                let items = s.list_dict_data("sys_region", None).await.unwrap();
                let owner = s.get_dict_type(t.id).await.unwrap();
                if items.is_empty() {
                    assert!(owner.is_none(), "type outlived its entries");
                    return;
                }
                assert_eq!(items.len(), 20, "partial cascade observed");
                tokio::task::yield_now().await;
            }
        })
    };

    let removed = store.delete_dict_type(t.id).await.unwrap();
    assert_eq!(removed, 20);
    reader.await.unwrap();
}

#[tokio::test]
async fn delete_dict_types_cascades_in_one_call() {
    let (_dir, store, _clock) = setup().await;

    let a = store.create_dict_type(&dict_type("A", "sys_a")).await.unwrap();
    let b = store.create_dict_type(&dict_type("B", "sys_b")).await.unwrap();
    let keep = store.create_dict_type(&dict_type("C", "sys_c")).await.unwrap();
    store.create_dict_data(&dict_item(a.id, "a1", "1", 1)).await.unwrap();
    store.create_dict_data(&dict_item(b.id, "b1", "1", 1)).await.unwrap();
    store.create_dict_data(&dict_item(keep.id, "c1", "1", 1)).await.unwrap();

    let removed = store.delete_dict_types(&[a.id, b.id, 99_999]).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.delete_dict_types(&[]).await.unwrap(), 0);

    assert_eq!(
        store.count_dict_types(&DictTypeFilter::default()).await.unwrap(),
        1
    );
    assert_eq!(
        store.count_dict_data(&DictDataFilter::default()).await.unwrap(),
        1
    );
    assert_eq!(store.list_dict_data("sys_c", None).await.unwrap().len(), 1);
}

/// Session tests
///
/// Session factory, settings, commit / rollback / close semantics and
/// row streaming.
/// Run with: cargo test --test session_tests

mod common;

use std::time::Duration;

use common::*;
use sqlmapper::{
    Error, ExecutorType, Parameter, ResultContext, Row, RowBounds, Settings, SqlSession, SqlSessionFactory, Value,
};

#[test]
fn test_settings_from_json_drive_new_sessions() {
    let settings = Settings::from_json(
        r#"{
            "default_executor_type": "REUSE",
            "default_statement_timeout": 20,
            "default_fetch_size": 50,
            "auto_commit": true
        }"#,
    )
    .unwrap();
    assert_eq!(settings.default_executor_type, ExecutorType::Reuse);
    assert_eq!(settings.default_statement_timeout, Some(Duration::from_secs(20)));
    assert_eq!(settings.statement_cache_capacity, None);

    let db = users_db();
    let factory = SqlSessionFactory::new(configuration(&db, settings)).unwrap();
    let session = factory.open_session().unwrap();
    assert!(session.is_auto_commit());

    let users = session.get_mapper::<UserMapper>().unwrap();
    users.find_user_by_id(1).unwrap();
    users.find_user_by_id(2).unwrap();

    // reuse executor: one handle for both calls
    assert_eq!(db.stats().statements_prepared, 1);
    let executed = db.executed();
    assert_eq!(executed[1].timeout, Some(Duration::from_secs(20)));
    assert_eq!(executed[1].fetch_size, Some(50));
}

#[test]
fn test_invalid_settings_are_rejected() {
    for json in [
        r#"{"default_statement_timeout": 0}"#,
        r#"{"default_fetch_size": 0}"#,
        r#"{"statement_cache_capacity": 0}"#,
        r#"{"default_executor_type": "PARALLEL"}"#,
        r#"{"auto_commit": "yes"}"#,
    ] {
        assert!(
            matches!(Settings::from_json(json), Err(Error::InvalidConfiguration(_))),
            "accepted {json}"
        );
    }
}

#[test]
fn test_auto_commit_session_never_commits_on_driver() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session_with(ExecutorType::Simple, true).unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    users.insert_user("a", "a@example.com").unwrap();
    session.commit(false).unwrap();
    session.commit(true).unwrap();
    session.rollback(true).unwrap();

    let stats = db.stats();
    assert_eq!(stats.commits, 0);
    assert_eq!(stats.rollbacks, 0);
}

#[test]
fn test_dirty_session_commits_once() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    users.find_all().unwrap();
    session.commit(false).unwrap();
    assert_eq!(db.stats().commits, 0);

    assert!(users.delete_user(3).unwrap());
    assert!(session.is_dirty());
    session.commit(false).unwrap();
    session.commit(false).unwrap();
    assert_eq!(db.stats().commits, 1);
    assert!(!session.is_dirty());
}

#[test]
fn test_rollback_discards_pending_batch() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session_with(ExecutorType::Batch, false).unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    for name in ["a", "b", "c"] {
        users.insert_user(name, "x@example.com").unwrap();
    }
    session.rollback(false).unwrap();

    assert!(db.executed().is_empty());
    assert_eq!(db.stats().rollbacks, 1);
    assert!(users.flush().unwrap().is_empty());
}

#[test]
fn test_commit_flushes_pending_batch() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session_with(ExecutorType::Batch, false).unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    users.insert_user("a", "a@example.com").unwrap();
    users.insert_user("b", "b@example.com").unwrap();
    session.commit(false).unwrap();

    assert_eq!(db.executed().len(), 2);
    assert_eq!(db.stats().commits, 1);
}

#[test]
fn test_drop_releases_everything() {
    let db = users_db();
    let factory = factory(&db);
    {
        let session = factory.open_session_with(ExecutorType::Reuse, false).unwrap();
        let users = session.get_mapper::<UserMapper>().unwrap();
        users.find_all().unwrap();
        users.insert_user("a", "a@example.com").unwrap();
    }

    let stats = db.stats();
    assert_eq!(stats.open_statements(), 0);
    assert_eq!(stats.open_connections(), 0);
    // uncommitted writes are rolled back on close
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.commits, 0);
}

#[test]
fn test_closed_session_rejects_work() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();
    users.find_all().unwrap();

    session.close();
    session.close();
    assert!(session.is_closed());
    assert!(matches!(users.find_all(), Err(Error::ExecutorClosed)));
    assert!(matches!(session.commit(true), Err(Error::ExecutorClosed)));
    assert_eq!(db.stats().connections_closed, 1);
}

#[test]
fn test_select_with_handler_streams_until_stopped() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();

    let mut names = Vec::new();
    let mut collect = |row: Row, context: &mut ResultContext| {
        names.push(name(&row).unwrap_or_default().to_string());
        if context.result_count() == 3 {
            context.stop();
        }
    };
    session
        .select_with_handler("UserMapper.findAll", &Parameter::Null, RowBounds::new(1, 10), &mut collect)
        .unwrap();
    assert_eq!(names, vec!["bob", "carol", "grace"]);
}

#[test]
fn test_sessions_are_isolated() {
    let db = users_db();
    let factory = factory(&db);
    let first = factory.open_session_with(ExecutorType::Batch, false).unwrap();
    let second = factory.open_session().unwrap();

    first
        .get_mapper::<UserMapper>()
        .unwrap()
        .insert_user("a", "a@example.com")
        .unwrap();
    let rows = second.select_list("UserMapper.findAll", &Parameter::Null).unwrap();
    assert_eq!(rows.len(), USERS.len());

    // the first session's batch is still pending
    assert!(db.executed().iter().all(|e| e.sql != INSERT_SQL));
    assert_eq!(first.flush_statements().unwrap().len(), 1);
    assert_eq!(db.stats().connections_opened, 2);
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_select_one_and_map_through_session() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();

    let row = session
        .select_one("UserMapper.findUserById", &Parameter::from(3))
        .unwrap()
        .unwrap();
    assert_eq!(name(&row), Some("carol"));

    let by_name = session
        .select_map("UserMapper.findAll", &Parameter::Null, "name", RowBounds::DEFAULT)
        .unwrap();
    // duplicate keys keep the last row
    assert_eq!(by_name.len(), 4);
    assert_eq!(
        by_name.get(&Value::from("grace")).and_then(|r| r.get("id")),
        Some(&Value::Integer(8))
    );
}

/// Mapper binding tests
///
/// Registration, method resolution and dispatch through mapper proxies.
/// Run with: cargo test --test binding_tests

mod common;

use std::collections::HashSet;
use std::rc::Rc;

use common::*;
use sqlmapper::binding::CommandKind;
use sqlmapper::{
    BindingError, Configuration, Error, Mapper, MapperProxy, MappedStatement, MethodSignature, RegistrationError,
    ReturnShape, RowBounds, Settings, SqlSession, SqlSessionFactory, Value,
};

#[test]
fn test_find_user_by_id_returns_matching_row() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    let row = users.find_user_by_id(7).unwrap().expect("user 7");
    assert_eq!(row.get("id"), Some(&Value::Integer(7)));
    assert_eq!(name(&row), Some("grace"));

    let executed = db.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].sql, FIND_BY_ID_SQL);
    assert_eq!(executed[0].params, vec![Value::Integer(7)]);

    assert!(users.find_user_by_id(42).unwrap().is_none());
}

#[test]
fn test_unregistered_statement_is_not_found() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();

    let err = session
        .select_one("UserMapper.findUserByEmail", &"a@b.c".into())
        .unwrap_err();
    match err {
        Error::Binding(BindingError::StatementNotFound { id }) => assert_eq!(id, "UserMapper.findUserByEmail"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(db.executed().is_empty());
}

struct OrphanMapper;

impl Mapper for OrphanMapper {
    const NAMESPACE: &'static str = "OrphanMapper";
    type Instance<'s> = MapperProxy<'s>;

    fn methods() -> Vec<MethodSignature> {
        vec![MethodSignature::new("findUserById", ReturnShape::One).param("id")]
    }

    fn instance(proxy: MapperProxy<'_>) -> MapperProxy<'_> {
        proxy
    }
}

#[test]
fn test_mapper_without_statement_fails_registration() {
    let mut configuration = Configuration::new(Settings::default());
    add_user_statements(&mut configuration).unwrap();

    let err = configuration.add_mapper::<OrphanMapper>().unwrap_err();
    match err {
        Error::Registration(RegistrationError::Resolution { mapper, source }) => {
            assert_eq!(mapper, "OrphanMapper");
            assert_eq!(
                source,
                BindingError::StatementNotFound {
                    id: "OrphanMapper.findUserById".into()
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!configuration.has_mapper::<OrphanMapper>());
}

#[test]
fn test_duplicate_registration_leaves_registry_unchanged() {
    let db = users_db();
    let mut configuration = configuration(&db, Settings::default());
    let before = configuration.mapper_registry().mappers();

    let err = configuration.add_mapper::<UserMapper>().unwrap_err();
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::AlreadyRegistered { .. })
    ));
    assert_eq!(configuration.mapper_registry().mappers(), before);
    assert_eq!(configuration.mapper_registry().len(), 1);

    // the original binding still works
    let factory = SqlSessionFactory::new(configuration).unwrap();
    let session = factory.open_session().unwrap();
    assert!(session.get_mapper::<UserMapper>().unwrap().find_user_by_id(1).unwrap().is_some());
}

#[test]
fn test_unknown_mapper_is_not_registered() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();

    let err = session.get_mapper::<OrphanMapper>().unwrap_err();
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::NotRegistered { .. })
    ));
}

#[test]
fn test_closed_session_cannot_create_instances() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    session.close();

    let err = session.get_mapper::<UserMapper>().unwrap_err();
    match err {
        Error::Registration(RegistrationError::Instance { mapper, source }) => {
            assert_eq!(mapper, "UserMapper");
            assert!(matches!(*source, Error::ExecutorClosed));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_method_cache_is_idempotent_and_stable() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();
    let proxy = &users.0;

    assert_eq!(proxy.cached_methods(), 0);
    let first = proxy.cached_mapper_method("findAll").unwrap();
    let second = proxy.cached_mapper_method("findAll").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(proxy.cached_methods(), 1);
    assert_eq!(first.command().name(), "UserMapper.findAll");
    assert_eq!(first.command().kind(), CommandKind::SelectMany);

    // invoking goes through the same cached entry
    users.find_all().unwrap();
    assert!(Rc::ptr_eq(&first, &proxy.cached_mapper_method("findAll").unwrap()));
    assert_eq!(proxy.cached_methods(), 1);

    // caches are per instance
    let other = session.get_mapper::<UserMapper>().unwrap();
    assert_eq!(other.0.cached_methods(), 0);
}

#[test]
fn test_proxy_identity_is_answered_locally() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let a = session.get_mapper::<UserMapper>().unwrap();
    let b = session.get_mapper::<UserMapper>().unwrap();

    assert_eq!(a.0, a.0);
    assert_ne!(a.0, b.0);
    let set: HashSet<_> = [&a.0, &b.0, &a.0].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert_eq!(a.0.to_string(), format!("UserMapper@{}", a.0.instance_id()));
    assert!(format!("{:?}", b.0).contains("UserMapper"));

    // none of this reached the database
    assert_eq!(db.stats().connections_opened, 0);
}

#[test]
fn test_undeclared_method_and_bad_arguments() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    let err = users.0.invoke("dropTable", &[]).unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::MethodNotFound { .. })
    ));

    let err = users.0.invoke("findUserById", &[]).unwrap_err();
    assert!(matches!(err, Error::Binding(BindingError::Arguments { .. })));
    assert!(is_binding_error(&err));

    let err = users.0.invoke("findAll", &[]).unwrap().into_count().unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::ResultShape {
            expected: "count",
            found: "many"
        })
    ));
}

#[test]
fn test_single_result_vs_list_result() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    let err = users.find_one_by_name("grace").unwrap_err();
    assert!(matches!(err, Error::TooManyResults { found: 2 }));

    let rows = users.find_by_name("grace").unwrap();
    assert_eq!(ids(&rows), vec![7, 8]);

    assert_eq!(users.find_one_by_name("bob").unwrap().and_then(|r| r.get("id").cloned()), Some(Value::Integer(2)));
}

#[test]
fn test_row_bounds_map_and_cursor() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    assert_eq!(ids(&users.find_page(RowBounds::new(1, 2)).unwrap()), vec![2, 3]);
    assert_eq!(ids(&users.find_page(RowBounds::new(4, 10)).unwrap()), vec![8]);

    let by_id = users.find_all_by_id().unwrap();
    assert_eq!(by_id.len(), 5);
    assert_eq!(by_id.get(&Value::Integer(3)).and_then(name), Some("carol"));

    let mut cursor = users.stream_all().unwrap();
    assert_eq!(cursor.statement_id(), "UserMapper.streamAll");
    let first = cursor.next().unwrap();
    assert_eq!(name(&first), Some("alice"));
    let rest: Vec<_> = cursor.by_ref().collect();
    assert_eq!(ids(&rest), vec![2, 3, 7, 8]);
    assert!(cursor.is_consumed());
}

#[test]
fn test_writes_return_declared_shape() {
    let db = users_db();
    let factory = factory(&db);
    let session = factory.open_session().unwrap();
    let users = session.get_mapper::<UserMapper>().unwrap();

    assert_eq!(users.insert_user("dave", "dave@example.com").unwrap(), 1);
    assert!(users.delete_user(2).unwrap());
    assert!(!users.delete_user(99).unwrap());

    let insert = &db.executed()[0];
    assert_eq!(insert.sql, INSERT_SQL);
    assert_eq!(
        insert.params,
        vec![Value::from("dave"), Value::from("dave@example.com")]
    );
}

#[test]
fn test_unknown_command_type_rejected_at_registration() {
    struct Procedures;

    impl Mapper for Procedures {
        const NAMESPACE: &'static str = "Procedures";
        type Instance<'s> = MapperProxy<'s>;

        fn methods() -> Vec<MethodSignature> {
            vec![MethodSignature::new("refresh", ReturnShape::Void)]
        }

        fn instance(proxy: MapperProxy<'_>) -> MapperProxy<'_> {
            proxy
        }
    }

    let mut configuration = Configuration::new(Settings::default());
    configuration
        .add_mapped_statement(MappedStatement::new(
            "Procedures.refresh",
            sqlmapper::SqlCommandType::Unknown,
            "call refresh()",
            Vec::new(),
        ))
        .unwrap();

    let err = configuration.add_mapper::<Procedures>().unwrap_err();
    assert!(matches!(
        err,
        Error::Registration(RegistrationError::Resolution {
            source: BindingError::UnknownCommand { .. },
            ..
        })
    ));
}

// Shared fixtures: a scripted user table and a `UserMapper`.
#![allow(dead_code)]

use std::sync::Arc;

use sqlmapper::connection::MemoryDatabase;
use sqlmapper::{
    BatchResult, Configuration, Cursor, Environment, Error, Mapper, MapperProxy, MappedStatement,
    MethodSignature, Parameter, Result, ResultSet, ReturnShape, Row, RowBounds, Settings, SqlSessionFactory,
    Value,
};

pub const FIND_BY_ID_SQL: &str = "select id, name from user where id = ?";
pub const FIND_BY_NAME_SQL: &str = "select id, name from user where name = ?";
pub const FIND_ALL_SQL: &str = "select id, name from user order by id";
pub const INSERT_SQL: &str = "insert into user (name, email) values (?, ?)";
pub const DELETE_SQL: &str = "delete from user where id = ?";

/// `(id, name)`; two users share the name "grace".
pub const USERS: &[(i64, &str)] = &[(1, "alice"), (2, "bob"), (3, "carol"), (7, "grace"), (8, "grace")];

fn user_rows(filter: impl Fn(i64, &str) -> bool) -> ResultSet {
    ResultSet::new(
        ["id", "name"],
        USERS
            .iter()
            .filter(|(id, name)| filter(*id, *name))
            .map(|(id, name)| vec![Value::Integer(*id), Value::from(*name)])
            .collect(),
    )
}

/// In-memory database answering the user mapper's statements.
pub fn users_db() -> MemoryDatabase {
    let db = MemoryDatabase::new();
    db.on_query(FIND_BY_ID_SQL, |params| {
        let id = params.first().and_then(Value::as_i64);
        Ok(user_rows(|row_id, _| Some(row_id) == id))
    });
    db.on_query(FIND_BY_NAME_SQL, |params| {
        let name = params.first().and_then(Value::as_str).map(str::to_string);
        Ok(user_rows(|_, row_name| Some(row_name) == name.as_deref()))
    });
    db.on_query(FIND_ALL_SQL, |_| Ok(user_rows(|_, _| true)));
    db.on_update(DELETE_SQL, |params| {
        let id = params.first().and_then(Value::as_i64);
        Ok(USERS.iter().filter(|(row_id, _)| Some(*row_id) == id).count() as u64)
    });
    db
}

pub struct UserMapper;

impl Mapper for UserMapper {
    const NAMESPACE: &'static str = "UserMapper";
    type Instance<'s> = Users<'s>;

    fn methods() -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("findUserById", ReturnShape::One).param("id"),
            MethodSignature::new("findOneByName", ReturnShape::One).unnamed(),
            MethodSignature::new("findByName", ReturnShape::Many).unnamed(),
            MethodSignature::new("findAll", ReturnShape::Many),
            MethodSignature::new("findPage", ReturnShape::Many).row_bounds(),
            MethodSignature::new("findAllById", ReturnShape::Map { key: "id" }),
            MethodSignature::new("streamAll", ReturnShape::Cursor),
            MethodSignature::new("insertUser", ReturnShape::Count)
                .param("name")
                .param("email"),
            MethodSignature::new("deleteUser", ReturnShape::Flag).param("id"),
            MethodSignature::flush("flush"),
        ]
    }

    fn instance(proxy: MapperProxy<'_>) -> Users<'_> {
        Users(proxy)
    }
}

/// Typed adapter over the user mapper's proxy.
#[derive(Debug)]
pub struct Users<'s>(pub MapperProxy<'s>);

impl Users<'_> {
    pub fn find_user_by_id(&self, id: i64) -> Result<Option<Row>> {
        self.0.invoke("findUserById", &[id.into()])?.into_one()
    }

    pub fn find_one_by_name(&self, name: &str) -> Result<Option<Row>> {
        self.0.invoke("findOneByName", &[name.into()])?.into_one()
    }

    pub fn find_by_name(&self, name: &str) -> Result<Vec<Row>> {
        self.0.invoke("findByName", &[name.into()])?.into_many()
    }

    pub fn find_all(&self) -> Result<Vec<Row>> {
        self.0.invoke("findAll", &[])?.into_many()
    }

    pub fn find_page(&self, bounds: RowBounds) -> Result<Vec<Row>> {
        self.0.invoke("findPage", &[bounds.into()])?.into_many()
    }

    pub fn find_all_by_id(&self) -> Result<std::collections::HashMap<Value, Row>> {
        self.0.invoke("findAllById", &[])?.into_map()
    }

    pub fn stream_all(&self) -> Result<Cursor> {
        self.0.invoke("streamAll", &[])?.into_cursor()
    }

    pub fn insert_user(&self, name: &str, email: &str) -> Result<u64> {
        self.0
            .invoke("insertUser", &[name.into(), email.into()])?
            .into_count()
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.0.invoke("deleteUser", &[id.into()])?.into_flag()
    }

    pub fn flush(&self) -> Result<Vec<BatchResult>> {
        self.0.invoke("flush", &[])?.into_batch()
    }
}

/// Statements backing [`UserMapper`].
pub fn add_user_statements(configuration: &mut Configuration) -> Result<()> {
    let statements = [
        MappedStatement::select("UserMapper.findUserById", "select id, name from user where id = #{id}")?,
        MappedStatement::select("UserMapper.findOneByName", "select id, name from user where name = #{name}")?,
        MappedStatement::select("UserMapper.findByName", "select id, name from user where name = #{name}")?,
        MappedStatement::select("UserMapper.findAll", FIND_ALL_SQL)?,
        MappedStatement::select("UserMapper.findPage", FIND_ALL_SQL)?,
        MappedStatement::select("UserMapper.findAllById", FIND_ALL_SQL)?,
        MappedStatement::select("UserMapper.streamAll", FIND_ALL_SQL)?,
        MappedStatement::insert(
            "UserMapper.insertUser",
            "insert into user (name, email) values (#{name}, #{email})",
        )?,
        MappedStatement::delete("UserMapper.deleteUser", "delete from user where id = #{id}")?,
    ];
    for statement in statements {
        configuration.add_mapped_statement(statement)?;
    }
    Ok(())
}

/// Configuration with the user statements and mapper registered.
pub fn configuration(db: &MemoryDatabase, settings: Settings) -> Configuration {
    let mut configuration =
        Configuration::new(settings).environment(Environment::new("test", Arc::new(db.clone())));
    add_user_statements(&mut configuration).unwrap();
    configuration.add_mapper::<UserMapper>().unwrap();
    configuration
}

pub fn factory(db: &MemoryDatabase) -> SqlSessionFactory {
    SqlSessionFactory::new(configuration(db, Settings::default())).unwrap()
}

pub fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}

pub fn name(row: &Row) -> Option<&str> {
    row.get("name").and_then(Value::as_str)
}

pub fn is_binding_error(err: &Error) -> bool {
    matches!(err, Error::Binding(_))
}

pub fn user(name: &str, email: &str) -> Parameter {
    Parameter::record().with("name", name).with("email", email)
}

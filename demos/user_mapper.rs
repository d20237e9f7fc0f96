use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use sqlmapper::connection::MemoryDatabase;
use sqlmapper::{
    Configuration, Environment, ExecutorType, Interceptor, Invocation, Mapper, MapperProxy, MappedStatement,
    MethodSignature, Outcome, ResultSet, ReturnShape, Row, Settings, Signature, SqlSession, SqlSessionFactory,
    TargetKind, Value,
};

struct UserMapper;

impl Mapper for UserMapper {
    const NAMESPACE: &'static str = "UserMapper";
    type Instance<'s> = Users<'s>;

    fn methods() -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("findUserById", ReturnShape::One).param("id"),
            MethodSignature::new("insertUser", ReturnShape::Count).param("name"),
            MethodSignature::flush("flush"),
        ]
    }

    fn instance(proxy: MapperProxy<'_>) -> Users<'_> {
        Users(proxy)
    }
}

struct Users<'s>(MapperProxy<'s>);

impl Users<'_> {
    fn find_user_by_id(&self, id: i64) -> sqlmapper::Result<Option<Row>> {
        self.0.invoke("findUserById", &[id.into()])?.into_one()
    }

    fn insert_user(&self, name: &str) -> sqlmapper::Result<u64> {
        self.0.invoke("insertUser", &[name.into()])?.into_count()
    }

    fn flush(&self) -> sqlmapper::Result<Vec<sqlmapper::BatchResult>> {
        self.0.invoke("flush", &[])?.into_batch()
    }
}

/// Prints how long each executor call took.
struct Timing;

impl Interceptor for Timing {
    fn name(&self) -> &str {
        "timing"
    }

    fn signatures(&self) -> Vec<Signature> {
        vec![
            Signature::new(TargetKind::Executor, "query"),
            Signature::new(TargetKind::Executor, "update"),
        ]
    }

    fn intercept(&self, mut invocation: Invocation<'_>) -> sqlmapper::Result<Outcome> {
        let started = Instant::now();
        let outcome = invocation.proceed();
        println!(
            "   ⏱  {}.{} took {:?}",
            invocation.target(),
            invocation.method(),
            started.elapsed()
        );
        outcome
    }
}

fn main() -> anyhow::Result<()> {
    println!("🚀 sqlmapper - mapper proxies over a scripted database");
    println!("{}", "=".repeat(70));

    let db = MemoryDatabase::new();
    db.on_query("select id, name from user where id = ?", |params| {
        Ok(ResultSet::new(
            ["id", "name"],
            vec![vec![params[0].clone(), Value::from("grace")]],
        ))
    });

    let mut configuration = Configuration::new(Settings::default())
        .environment(Environment::new("demo", Arc::new(db.clone())));
    configuration.add_mapped_statement(MappedStatement::select(
        "UserMapper.findUserById",
        "select id, name from user where id = #{id}",
    )?)?;
    configuration.add_mapped_statement(MappedStatement::insert(
        "UserMapper.insertUser",
        "insert into user (name) values (#{name})",
    )?)?;
    configuration.add_mapper::<UserMapper>()?;
    configuration.add_interceptor(Arc::new(Timing))?;

    let factory = SqlSessionFactory::new(configuration)?;

    println!("\n📊 Simple session: findUserById(7)");
    let session = factory.open_session()?;
    let users = session.get_mapper::<UserMapper>()?;
    let user = users.find_user_by_id(7)?.context("user 7 should exist")?;
    println!("   {}", user);

    println!("\n📥 Batch session: three inserts, one flush");
    let batch = factory.open_session_with(ExecutorType::Batch, false)?;
    let users = batch.get_mapper::<UserMapper>()?;
    for name in ["alice", "bob", "carol"] {
        users.insert_user(name)?;
    }
    for result in users.flush()? {
        println!(
            "   {} x{} -> {:?}",
            result.statement_id(),
            result.parameters().len(),
            result.update_counts()
        );
    }
    batch.commit(false)?;

    println!("\n📈 Driver statistics");
    println!("   {:?}", db.stats());
    Ok(())
}

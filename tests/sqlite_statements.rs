#![cfg(feature = "sqlite")]

use sql_dblib::prelude::*;
use sql_dblib::sqlite::{SqliteConnection, SqliteOptions};
use tempfile::tempdir;

const SCHEMA: &str = "create table person (
    id integer primary key,
    name varchar(40),
    age integer,
    born date,
    seen timestamp,
    photo blob
)";

fn open_with_schema() -> Result<SqliteConnection, DbLibError> {
    let conn = SqliteOptions::in_memory().connect()?;
    let tx = conn.transaction()?;
    tx.execute_immediate(SCHEMA)?;
    tx.commit()?;
    drop(tx);
    Ok(conn)
}

fn count_people(conn: &SqliteConnection) -> Result<i64, DbLibError> {
    let tx = conn.transaction()?;
    let mut stmt = tx.create_statement();
    stmt.execute("select count(*) from person")?;
    stmt.fetch()?;
    stmt.get_i64(1usize)
}

#[test]
fn named_and_ordinal_parameters_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.transaction()?;

    let mut insert = tx.prepare(
        "insert into person(id, name, age, born, seen) values(?1, :name, :age, ?4, ?5)",
    )?;
    assert_eq!(insert.params_count()?, 5);
    let born = Date::new(1990, 7, 14);
    let seen = Timestamp::new(Date::new(2024, 2, 29), Time::new(23, 59, 58, 999));
    insert.set_i32(1usize, 1)?;
    insert.set_str(":name", "alice")?;
    insert.set_str(":AGE", "42")?;
    insert.set_date(4usize, born)?;
    insert.set_timestamp(5usize, seen)?;
    insert.execute_prepared()?;
    assert_eq!(insert.rows_affected()?, 1);

    insert.set_i64(1usize, 2)?;
    insert.set_str(":name", "bob")?;
    insert.set_null(":age")?;
    insert.set_date_opt(4usize, None)?;
    insert.set_timestamp_opt(5usize, None)?;
    insert.execute_prepared()?;

    let mut select = tx.prepare("select id, name, age, born, seen from person order by id")?;
    select.execute_prepared()?;

    assert!(select.fetch()?);
    assert_eq!(select.get_i16("id")?, 1);
    assert_eq!(select.get_str("NAME")?, "alice");
    assert_eq!(select.get_i32("age")?, 42);
    assert_eq!(select.get_str("age")?, "42");
    assert_eq!(select.get_date("born")?, born);
    assert_eq!(select.get_timestamp("seen")?, seen);
    assert_eq!(select.column_type(&"age".into())?, ValueType::BigInt);

    assert!(select.fetch()?);
    assert_eq!(select.get_str(2usize)?, "bob");
    assert!(select.is_null(&"age".into())?);
    assert_eq!(select.get_i32_opt("age")?, None);
    assert_eq!(select.get_i32_or("age", -1)?, -1);
    assert!(matches!(
        select.get_i32("age"),
        Err(DbLibError::ColumnValueIsNull(_))
    ));
    assert_eq!(select.column_type(&"born".into())?, ValueType::Date);

    assert!(!select.fetch()?);
    Ok(())
}

#[test]
fn conversions_follow_the_stored_value() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.transaction()?;
    let mut insert = tx.prepare("insert into person(id, name, age, photo) values(?1, ?2, ?3, ?4)")?;
    insert.set_i32(1usize, 1)?;
    insert.set_str(2usize, "12.5")?;
    insert.set_i64(3usize, 70_000)?;
    insert.set_blob(4usize, &[0u8, 1, 2, 255])?;
    insert.execute_prepared()?;

    let mut select = tx.prepare("select name, age, photo from person")?;
    select.execute_prepared()?;
    assert!(select.fetch()?);

    assert_eq!(select.get_f64("name")?, 12.5);
    assert!(matches!(
        select.get_i32("name"),
        Err(DbLibError::TypeConversion { .. })
    ));
    assert_eq!(select.get_i32("age")?, 70_000);
    assert!(matches!(
        select.get_i16("age"),
        Err(DbLibError::RangeExceeded(_))
    ));
    assert_eq!(select.get_f32("age")?, 70_000.0);
    assert_eq!(select.get_blob("photo")?, vec![0u8, 1, 2, 255]);
    assert_eq!(
        select.get_wstr("name")?,
        "12.5".encode_utf16().collect::<Vec<u16>>()
    );
    Ok(())
}

#[test]
fn statement_calls_are_sequenced() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.transaction()?;
    let mut stmt = tx.create_statement();

    assert!(matches!(stmt.execute_prepared(), Err(DbLibError::Sequence(_))));
    assert!(matches!(stmt.fetch(), Err(DbLibError::Sequence(_))));
    assert!(matches!(stmt.rows_affected(), Err(DbLibError::Sequence(_))));
    assert!(matches!(stmt.set_i32(1usize, 1), Err(DbLibError::Sequence(_))));
    assert!(matches!(stmt.params_count(), Err(DbLibError::Sequence(_))));
    assert!(matches!(
        stmt.param_type(&1usize.into()),
        Err(DbLibError::Sequence(_))
    ));
    assert!(matches!(stmt.columns_count(), Err(DbLibError::Sequence(_))));
    assert!(matches!(stmt.column_name(1), Err(DbLibError::Sequence(_))));
    assert!(matches!(
        stmt.column_type(&1usize.into()),
        Err(DbLibError::Sequence(_))
    ));
    assert!(matches!(
        stmt.is_null(&1usize.into()),
        Err(DbLibError::Sequence(_))
    ));
    assert!(matches!(stmt.last_row_id(), Err(DbLibError::Sequence(_))));
    assert!(matches!(stmt.statement_type(), Err(DbLibError::Sequence(_))));

    stmt.prepare("select id from person where id = :id")?;
    assert!(matches!(stmt.get_i32(1usize), Err(DbLibError::Sequence(_))));
    assert!(matches!(
        stmt.is_null(&1usize.into()),
        Err(DbLibError::Sequence(_))
    ));
    assert!(matches!(stmt.last_row_id(), Err(DbLibError::Sequence(_))));
    assert!(matches!(
        stmt.set_i32(":missing", 1),
        Err(DbLibError::ParameterNotFound(_))
    ));
    assert!(matches!(
        stmt.set_i32(2usize, 1),
        Err(DbLibError::ParameterNotFound(_))
    ));
    stmt.set_i32(":id", 1)?;
    stmt.execute_prepared()?;
    assert!(!stmt.fetch()?);
    assert!(matches!(
        stmt.fetch(),
        Err(DbLibError::Sequence(msg)) if msg == "Fetch after data end"
    ));
    Ok(())
}

#[test]
fn repeated_named_parameter_is_set_once() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteOptions::in_memory().connect()?;
    let tx = conn.transaction()?;
    let mut stmt = tx.prepare("select :a + :a as twice, :a * :b as product")?;
    assert_eq!(stmt.params_count()?, 2);
    stmt.set_i32(":a", 21)?;
    stmt.set_i32(":b", 2)?;
    stmt.execute_prepared()?;
    assert!(stmt.fetch()?);
    assert_eq!(stmt.get_i32("twice")?, 42);
    assert_eq!(stmt.get_i32("product")?, 42);
    Ok(())
}

#[test]
fn native_parameter_syntax_is_addressed_by_ordinal() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteOptions::in_memory().connect()?;
    let tx = conn.transaction()?;
    let mut stmt = tx.create_statement();
    stmt.prepare_with_syntax("select ?1 * 2 as n", true)?;
    assert_eq!(stmt.last_sql(), Some("select ?1 * 2 as n"));
    stmt.set_i64(1usize, 21)?;
    stmt.execute_prepared()?;
    assert!(stmt.fetch()?);
    assert_eq!(stmt.get_i64("n")?, 42);
    Ok(())
}

#[test]
fn insert_reports_row_id_and_type() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.transaction()?;
    let mut insert = tx.prepare("insert into person(id, name) values(:id, :name)")?;
    assert_eq!(insert.statement_type()?, StatementType::Insert);
    insert.set_i32(":id", 17)?;
    insert.set_str(":name", "erin")?;
    insert.execute_prepared()?;
    assert_eq!(insert.last_row_id()?, 17);

    let mut select = tx.create_statement();
    select.prepare("  /* who */ select name from person")?;
    assert_eq!(select.statement_type()?, StatementType::Select);
    assert_eq!(select.last_sql(), Some("  /* who */ select name from person"));
    Ok(())
}

#[test]
fn julian_days_past_the_date_range_are_errors() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteOptions::in_memory().connect()?;
    let tx = conn.transaction()?;
    let mut stmt = tx.create_statement();
    stmt.execute("select 9223372036854775807 as d, 1e300 as t, 2451544.5 as ok")?;
    assert!(stmt.fetch()?);
    assert!(matches!(
        stmt.get_date("d"),
        Err(DbLibError::RangeExceeded(_))
    ));
    assert!(matches!(
        stmt.get_timestamp("d"),
        Err(DbLibError::RangeExceeded(_))
    ));
    assert!(matches!(
        stmt.get_timestamp("t"),
        Err(DbLibError::RangeExceeded(_))
    ));
    assert_eq!(stmt.get_date("ok")?, Date::new(2000, 1, 1));
    Ok(())
}

#[test]
fn extreme_dates_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.transaction()?;
    let mut insert = tx.prepare("insert into person(id, born) values(?1, ?2)")?;
    let far = [Date::new(-4713, 11, 24), Date::new(1, 1, 1), Date::new(275_000, 12, 31)];
    for (id, born) in far.iter().enumerate() {
        insert.set_i64(1usize, i64::try_from(id)?)?;
        insert.set_date(2usize, *born)?;
        insert.execute_prepared()?;
    }

    let mut select = tx.prepare("select born from person order by id")?;
    select.execute_prepared()?;
    for born in far {
        assert!(select.fetch()?);
        assert_eq!(select.get_date("born")?, born);
    }
    Ok(())
}

#[test]
fn reprepare_rebuilds_the_column_map() -> Result<(), Box<dyn std::error::Error>> {
    let conn = SqliteOptions::in_memory().connect()?;
    let tx = conn.transaction()?;
    let mut stmt = tx.create_statement();

    stmt.prepare("select 1 as a, 2 as b")?;
    stmt.execute_prepared()?;
    stmt.fetch()?;
    assert_eq!(stmt.get_i32("b")?, 2);
    assert_eq!(stmt.column_name(2)?, "b");

    stmt.prepare("select 3 as b, 4 as a")?;
    stmt.execute_prepared()?;
    stmt.fetch()?;
    assert_eq!(stmt.get_i32("b")?, 3);
    assert_eq!(stmt.columns_count()?, 2);
    assert!(matches!(
        stmt.get_i32("c"),
        Err(DbLibError::ColumnNotFound(_))
    ));
    Ok(())
}

#[test]
fn sequence_templates_render_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.transaction()?;
    let mut insert =
        tx.prepare("insert into person({if_seq id,} name) values({next person_seq,} :name)")?;
    insert.set_str(":name", "carol")?;
    insert.execute_prepared()?;

    let mut select = tx.create_statement();
    select.execute("select id, name from person")?;
    assert!(select.fetch()?);
    assert_eq!(select.get_i64("id")?, 1);
    assert_eq!(select.get_str("name")?, "carol");
    Ok(())
}

#[test]
fn drop_commits_or_rolls_back_per_params() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    {
        let tx = conn.open_transaction(
            TransactionParams::default().with_auto_commit_on_destroy(false),
        )?;
        tx.execute_immediate("insert into person(name) values('lost')")?;
    }
    assert_eq!(count_people(&conn)?, 0);

    {
        let tx = conn.transaction()?;
        tx.execute_immediate("insert into person(name) values('kept')")?;
    }
    assert_eq!(count_people(&conn)?, 1);
    Ok(())
}

#[test]
fn one_transaction_per_connection() -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_with_schema()?;
    let tx = conn.open_transaction(TransactionParams::default().with_autostart(false))?;
    assert_eq!(tx.state(), TransactionState::Undefined);
    assert!(matches!(tx.commit(), Err(DbLibError::Sequence(_))));
    assert!(matches!(conn.transaction(), Err(DbLibError::Sequence(_))));

    tx.start()?;
    assert!(matches!(tx.start(), Err(DbLibError::Sequence(_))));
    tx.execute_immediate("insert into person(name) values('a')")?;
    tx.rollback_and_start()?;
    tx.execute_immediate("insert into person(name) values('b')")?;
    tx.commit()?;
    assert_eq!(tx.state(), TransactionState::Committed);
    drop(tx);

    assert_eq!(count_people(&conn)?, 1);
    Ok(())
}

#[test]
fn file_database_persists_between_connections() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("people.db").to_string_lossy().into_owned();
    let options = SqliteOptions::new(path).with_wal(true);
    {
        let conn = options.connect()?;
        let tx = conn.transaction()?;
        tx.execute_immediate(SCHEMA)?;
        let mut insert = tx.prepare("insert into person(name) values(@name)")?;
        insert.set_str("@name", "dora")?;
        insert.execute_prepared()?;
    }

    let conn = options.connect()?;
    assert_eq!(count_people(&conn)?, 1);
    Ok(())
}

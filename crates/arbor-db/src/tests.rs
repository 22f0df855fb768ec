use std::sync::LazyLock;

use arbor_orm::{ColumnType, DefaultValue, Record, RecordError, TableSchema, Value};

use crate::{Database, DbError};

static AUTHOR: LazyLock<TableSchema> = LazyLock::new(|| {
    TableSchema::builder("Author")
        .column("name", ColumnType::Text)
        .column("age", ColumnType::Integer)
        .build()
});

static BOOK: LazyLock<TableSchema> = LazyLock::new(|| {
    TableSchema::builder("Book")
        .column("title", ColumnType::Text)
        .column("published", ColumnType::Boolean)
        .foreign_key("author", &AUTHOR)
        .build()
});

static POST: LazyLock<TableSchema> = LazyLock::new(|| {
    TableSchema::builder("Post")
        .column("body", ColumnType::Text)
        .column_with_default("created", ColumnType::Timestamp, DefaultValue::Now)
        .build()
});

fn open_db() -> Database {
    Database::open_in_memory().expect("should open in-memory database")
}

fn saved_author(db: &Database, name: &str, age: i64) -> Record {
    let mut author = Record::new(&AUTHOR);
    author
        .set("name", name)
        .expect("should set name")
        .set("age", age)
        .expect("should set age");
    db.save(&mut author).expect("should save author");
    author
}

#[test]
fn fresh_database_has_no_tables() {
    let db = open_db();
    assert_eq!(db.tables().expect("should list tables"), Vec::<String>::new());
}

#[test]
fn create_registers_the_table_in_the_catalog() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");
    db.create(&BOOK).expect("should create book table");

    let tables = db.tables().expect("should list tables");
    assert!(tables.contains(&"author".to_string()));
    assert!(tables.contains(&"book".to_string()));
}

#[test]
fn create_is_idempotent() {
    let db = open_db();
    db.create(&AUTHOR).expect("first create should succeed");
    db.create(&AUTHOR).expect("second create should succeed");
}

#[test]
fn tables_excludes_sqlite_internals() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");
    // Trigger sqlite_sequence creation via an AUTOINCREMENT insert.
    saved_author(&db, "Bob Smith", 20);

    let tables = db.tables().expect("should list tables");
    assert_eq!(tables, vec!["author".to_string()]);
}

#[test]
fn save_assigns_the_storage_identity() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let author = saved_author(&db, "Bob Smith", 20);
    assert!(author.id().is_some(), "saved record should carry an id");
}

#[test]
fn save_failure_leaves_the_record_without_an_id() {
    let db = open_db();
    // No create: the table does not exist, so the insert must fail.
    let mut author = Record::new(&AUTHOR);
    author.set("name", "Bob Smith").expect("should set name");

    let err = db.save(&mut author).expect_err("insert should fail");
    assert!(matches!(err, DbError::Database(_)));
    assert_eq!(author.id(), None);
}

#[test]
fn saved_records_round_trip_by_id() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let author = saved_author(&db, "Bob Smith", 20);
    let id = author.id().expect("saved record should carry an id");

    let matches = db
        .get(&AUTHOR, &[("id", Value::Integer(id))])
        .expect("should fetch author by id");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].text("name"), Some("Bob Smith"));
    assert_eq!(matches[0].integer("age"), Some(20));
    assert_eq!(matches[0].id(), Some(id));
}

#[test]
fn get_without_filters_behaves_as_all() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");
    saved_author(&db, "Bob Smith", 20);
    saved_author(&db, "Jane Doe", 31);

    let all = db.all(&AUTHOR).expect("should fetch all authors");
    let unfiltered = db.get(&AUTHOR, &[]).expect("should fetch without filters");
    assert_eq!(all.len(), 2);
    assert_eq!(all, unfiltered);
}

#[test]
fn get_with_no_match_returns_an_empty_sequence() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let matches = db
        .get(&AUTHOR, &[("name", Value::from("Nobody"))])
        .expect("should run filtered select");
    assert!(matches.is_empty());
}

#[test]
fn get_rejects_unknown_filter_columns() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let err = db
        .get(&AUTHOR, &[("nickname", Value::from("bob"))])
        .expect_err("unknown filter column should be rejected");
    assert!(matches!(
        err,
        DbError::Record(RecordError::UnknownField { .. })
    ));
}

#[test]
fn sparse_insert_applies_storage_defaults() {
    let db = open_db();
    db.create(&POST).expect("should create post table");

    let mut post = Record::new(&POST);
    post.set("body", "hello").expect("should set body");
    db.save(&mut post).expect("should save post");

    let matches = db
        .get(&POST, &[("id", Value::from(post.id().expect("post should have id")))])
        .expect("should fetch post");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].text("body"), Some("hello"));
    assert!(
        matches[0].timestamp("created").is_some(),
        "created should be filled by the storage default"
    );
}

#[test]
fn foreign_keys_materialize_as_full_records() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");
    db.create(&BOOK).expect("should create book table");

    let author = saved_author(&db, "Bob Smith", 20);

    let mut book = Record::new(&BOOK);
    book.set("title", "Learning Databases")
        .expect("should set title")
        .set("published", true)
        .expect("should set published");
    book.set_reference("author", author)
        .expect("should set author reference");
    db.save(&mut book).expect("should save book");

    let matches = db
        .get(&BOOK, &[("title", Value::from("Learning Databases"))])
        .expect("should fetch book by title");
    assert_eq!(matches.len(), 1);

    let fetched_author = matches[0]
        .record("author")
        .expect("author should be materialized");
    assert_eq!(fetched_author.text("name"), Some("Bob Smith"));
    assert_eq!(fetched_author.integer("age"), Some(20));
}

#[test]
fn dangling_references_are_reported() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");
    db.create(&BOOK).expect("should create book table");

    let author = saved_author(&db, "Bob Smith", 20);
    let mut book = Record::new(&BOOK);
    book.set("title", "Orphaned").expect("should set title");
    book.set_reference("author", author.clone())
        .expect("should set author reference");
    db.save(&mut book).expect("should save book");

    db.delete(&author).expect("should delete author");

    let err = db
        .all(&BOOK)
        .expect_err("resolving a deleted reference should fail");
    match err {
        DbError::DanglingReference { table, field, id } => {
            assert_eq!(table, "book");
            assert_eq!(field, "author");
            assert_eq!(Some(id), author.id());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn update_persists_exactly_the_changed_field() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let mut author = saved_author(&db, "Bob Smith", 20);
    author.set("age", 21).expect("should change age");
    db.update(&author).expect("should update author");

    let matches = db
        .get(&AUTHOR, &[("id", Value::from(author.id().expect("author should have id")))])
        .expect("should fetch author");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].integer("age"), Some(21));
    assert_eq!(matches[0].text("name"), Some("Bob Smith"));
}

#[test]
fn update_requires_a_saved_record() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let mut author = Record::new(&AUTHOR);
    author.set("name", "Bob Smith").expect("should set name");

    let err = db.update(&author).expect_err("update should be rejected");
    assert!(matches!(err, DbError::Record(RecordError::MissingId { .. })));
}

#[test]
fn delete_requires_a_saved_record() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let author = Record::new(&AUTHOR);
    let err = db.delete(&author).expect_err("delete should be rejected");
    assert!(matches!(err, DbError::Record(RecordError::MissingId { .. })));
}

#[test]
fn deleted_records_stop_matching() {
    let db = open_db();
    db.create(&AUTHOR).expect("should create author table");

    let author = saved_author(&db, "Bob Smith", 20);
    let id = author.id().expect("author should have id");
    db.delete(&author).expect("should delete author");

    let matches = db
        .get(&AUTHOR, &[("id", Value::Integer(id))])
        .expect("should run filtered select");
    assert!(matches.is_empty());
}

#[test]
fn records_persist_across_sessions() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("arbor.db");

    {
        let db = Database::open(&path).expect("should open file-backed database");
        db.create(&AUTHOR).expect("should create author table");
        saved_author(&db, "Bob Smith", 20);
    }

    let db = Database::open(&path).expect("should reopen file-backed database");
    let authors = db.all(&AUTHOR).expect("should fetch authors");
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].text("name"), Some("Bob Smith"));
}

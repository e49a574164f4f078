use loam::prelude::*;

#[SQLiteDatabase(name = "library")]
mod schema {
    #[table(name = "authors", model)]
    pub struct Author {
        #[column(primary)]
        pub id: i64,
        #[column]
        pub name: String,
    }

    #[table(name = "books", model)]
    pub struct Book {
        #[column(primary)]
        pub id: i64,
        #[column]
        pub title: String,
        #[foreign_key(on_delete = CASCADE, save_cascade, delete_cascade,
            references(local = "author_id", foreign = "id"))]
        pub author: Option<Author>,
        #[column_map]
        pub shipping: Option<Address>,
        #[foreign_key(table = Author, references(local = "editor_id", foreign = "id"))]
        pub editor_id: Option<i64>,
    }

    #[table(name = "categories", model)]
    pub struct Category {
        #[column(primary)]
        pub id: i64,
        #[column]
        pub name: String,
        #[foreign_key(stubbed, references(local = "parent_id", foreign = "id"))]
        pub parent: Option<Category>,
    }

    pub struct Address {
        #[column]
        pub street: String,
        #[column]
        pub city: String,
    }

    #[query_model]
    pub struct AuthorName {
        #[column]
        pub name: String,
    }
}

use schema::{Address, Author, AuthorTable, Book, BookTable, Category, LibraryDatabase};

fn setup() -> loam::rusqlite::Connection {
    let conn = loam::rusqlite::Connection::open_in_memory().expect("open in-memory database");
    LibraryDatabase::create_all(&conn).expect("create schema");
    conn
}

fn sample_book() -> Book {
    Book {
        id: 1,
        title: "The Dispossessed".to_string(),
        author: Some(Author {
            id: 7,
            name: "Ursula K. Le Guin".to_string(),
        }),
        shipping: Some(Address {
            street: "24 Anarres Way".to_string(),
            city: "Abbenay".to_string(),
        }),
        editor_id: None,
    }
}

#[test]
fn create_table_sql_covers_references() {
    let sql = <BookTable as TableAdapter>::CREATE_TABLE_SQL;
    assert!(sql.contains("\"author_id\" INTEGER"));
    assert!(sql.contains("\"street\" TEXT"));
    assert!(sql.contains(
        "FOREIGN KEY(\"author_id\") REFERENCES \"authors\"(\"id\") ON DELETE CASCADE"
    ));
    assert!(sql.contains("FOREIGN KEY(\"editor_id\") REFERENCES \"authors\"(\"id\")"));
    assert!(sql.contains("PRIMARY KEY(\"id\")"));
}

#[test]
fn insert_fragments_expand_references_in_order() {
    assert_eq!(
        <BookTable as TableAdapter>::COLUMN_NAMES,
        &["id", "title", "author_id", "street", "city", "editor_id"]
    );
    assert_eq!(
        <BookTable as TableAdapter>::INSERT_SQL,
        "INSERT INTO \"books\"(\"id\",\"title\",\"author_id\",\"street\",\"city\",\"editor_id\") \
         VALUES (?,?,?,?,?,?)"
    );
    assert_eq!(
        <BookTable as TableAdapter>::UPDATE_CLAUSE,
        "\"id\"=?,\"title\"=?,\"author_id\"=?,\"street\"=?,\"city\"=?,\"editor_id\"=?"
    );
}

#[test]
fn properties_cover_expanded_reference_columns() {
    assert_eq!(BookTable::author_id.name(), "author_id");
    assert_eq!(BookTable::street.name(), "street");
    let property = BookTable::property("city").expect("city property");
    assert_eq!(property.name(), "city");
    assert!(BookTable::property("missing").is_none());
}

#[test]
fn table_meta_snapshot_is_valid_json() {
    let value: serde_json::Value =
        serde_json::from_str(BookTable::__LOAM_TABLE_META).expect("valid JSON");
    assert_eq!(value["name"], "books");
    assert_eq!(value["primaryKey"][0], "id");
    let columns: Vec<&str> = value["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        columns,
        vec!["id", "title", "author_id", "street", "city", "editor_id"]
    );
}

#[test]
fn content_values_null_guard_reference_columns() {
    let mut values = ContentValues::new();
    <BookTable as TableAdapter>::bind_values(&sample_book(), &mut values);
    assert_eq!(values.get("author_id"), Some(&Value::Integer(7)));
    assert_eq!(values.get("street"), Some(&Value::Text("24 Anarres Way".into())));
    assert_eq!(values.get("editor_id"), Some(&Value::Null));

    let mut absent = sample_book();
    absent.author = None;
    let mut values = ContentValues::new();
    <BookTable as TableAdapter>::bind_values(&absent, &mut values);
    assert_eq!(values.get("author_id"), Some(&Value::Null));
}

#[test]
fn save_cascades_to_the_referenced_model() {
    let conn = setup();
    let mut book = sample_book();
    book.save(&conn).expect("save book");

    let author = Author {
        id: 7,
        name: String::new(),
    };
    assert!(author.exists(&conn).expect("probe author"));
    assert!(<AuthorTable as TableAdapter>::exists(&author, &conn).expect("probe via adapter"));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM \"books\"", [], |row| row.get(0))
        .expect("count books");
    assert_eq!(count, 1);
}

#[test]
fn load_rehydrates_references_and_embedded_values() {
    let conn = setup();
    let mut book = sample_book();
    book.save(&conn).expect("save book");

    let group = OperatorGroup::new().and(Condition::new("id", 1i64));
    let loaded = <BookTable as TableAdapter>::select_one(&conn, &group)
        .expect("select book")
        .expect("book row");

    assert_eq!(loaded.title, "The Dispossessed");
    let author = loaded.author.expect("eager-loaded author");
    assert_eq!(author.name, "Ursula K. Le Guin");
    let shipping = loaded.shipping.expect("embedded address");
    assert_eq!(shipping.street, "24 Anarres Way");
    assert_eq!(shipping.city, "Abbenay");
    assert_eq!(loaded.editor_id, None);
}

#[test]
fn absent_reference_loads_as_none() {
    let conn = setup();
    let mut book = sample_book();
    book.author = None;
    book.shipping = None;
    book.save(&conn).expect("save book");

    let group = OperatorGroup::new().and(Condition::new("id", 1i64));
    let loaded = <BookTable as TableAdapter>::select_one(&conn, &group)
        .expect("select book")
        .expect("book row");
    assert!(loaded.author.is_none());
    assert!(loaded.shipping.is_none());
}

#[test]
fn stubbed_reference_loads_key_only() {
    let conn = setup();
    let mut parent = Category {
        id: 10,
        name: "fiction".to_string(),
        parent: None,
    };
    parent.save(&conn).expect("save parent");

    let mut child = Category {
        id: 11,
        name: "sci-fi".to_string(),
        parent: Some(Category {
            id: 10,
            ..Default::default()
        }),
    };
    child.save(&conn).expect("save child");

    let group = OperatorGroup::new().and(Condition::new("id", 11i64));
    let loaded = <schema::CategoryTable as TableAdapter>::select_one(&conn, &group)
        .expect("select category")
        .expect("category row");
    let stub = loaded.parent.expect("stub parent");
    assert_eq!(stub.id, 10);
    // stubbed relationships carry the key only
    assert_eq!(stub.name, "");
}

#[test]
fn update_goes_through_the_primary_condition() {
    let conn = setup();
    let mut book = sample_book();
    book.save(&conn).expect("insert");

    book.title = "The Word for World Is Forest".to_string();
    book.save(&conn).expect("update");

    let title: String = conn
        .query_row("SELECT \"title\" FROM \"books\" WHERE \"id\" = 1", [], |row| {
            row.get(0)
        })
        .expect("read title");
    assert_eq!(title, "The Word for World Is Forest");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM \"books\"", [], |row| row.get(0))
        .expect("count books");
    assert_eq!(count, 1);
}

#[test]
fn delete_cascades_to_the_referenced_model() {
    let conn = setup();
    let mut book = sample_book();
    book.save(&conn).expect("save book");

    book.delete(&conn).expect("delete book");

    let books: i64 = conn
        .query_row("SELECT COUNT(*) FROM \"books\"", [], |row| row.get(0))
        .expect("count books");
    assert_eq!(books, 0);

    let authors: i64 = conn
        .query_row("SELECT COUNT(*) FROM \"authors\"", [], |row| row.get(0))
        .expect("count authors");
    assert_eq!(authors, 0);
}

#[test]
fn query_model_loads_by_column_name() {
    let conn = setup();
    conn.execute(
        "INSERT INTO \"authors\"(\"id\",\"name\") VALUES (1, 'Ursula K. Le Guin')",
        [],
    )
    .expect("seed author");

    let mut stmt = conn
        .prepare("SELECT \"name\" FROM \"authors\"")
        .expect("prepare");
    let mut rows = stmt.raw_query();
    let row = rows.next().expect("advance").expect("one row");
    let loaded =
        <schema::AuthorNameQuery as QueryAdapter>::load_from_row(&conn, row).expect("load");
    assert_eq!(loaded.name, "Ursula K. Le Guin");
}

#[test]
fn database_schema_orders_creation_statements_by_declaration() {
    let statements = <LibraryDatabase as DatabaseSchema>::CREATE_STATEMENTS;
    assert_eq!(statements.len(), 3);
    assert!(statements[0].contains("\"authors\""));
    assert!(statements[1].contains("\"books\""));
    assert!(statements[2].contains("\"categories\""));
    assert_eq!(<LibraryDatabase as DatabaseSchema>::NAME, "library");
}

#[test]
fn adapter_roundtrip_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("library.db");
    {
        let conn = loam::rusqlite::Connection::open(&path).expect("open file database");
        LibraryDatabase::create_all(&conn).expect("create schema");
        let mut book = sample_book();
        book.save(&conn).expect("save");
    }
    let conn = loam::rusqlite::Connection::open(&path).expect("reopen");
    let group = OperatorGroup::new().and(Condition::new("id", 1i64));
    let loaded = <BookTable as TableAdapter>::select_one(&conn, &group)
        .expect("select")
        .expect("row");
    assert_eq!(loaded.author.expect("author").id, 7);
}

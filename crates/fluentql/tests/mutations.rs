mod common;

use common::MockConnection;
use fluentql::{Db, InfileSpec, Record, Row, Value};

#[tokio::test]
async fn insert_batch_runs_once_with_row_major_bindings() {
    let conn = MockConnection::new().with_affected(2);
    let n = Db::sqlite()
        .table("users")
        .insert(
            &conn,
            vec![
                Record::new().set("id", 1).set("name", "a"),
                Record::new().set("id", 2).set("name", "b"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(n, 2);
    let calls = conn.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].sql,
        r#"INSERT INTO "users" ("id", "name") VALUES (?, ?), (?, ?)"#
    );
    assert_eq!(
        calls[0].bindings,
        vec![
            Value::Int(1),
            Value::from("a"),
            Value::Int(2),
            Value::from("b")
        ]
    );
}

#[tokio::test]
async fn empty_batch_runs_nothing() {
    let conn = MockConnection::new().with_affected(5);
    let n = Db::postgres()
        .table("users")
        .insert(&conn, Vec::<Record>::new())
        .await
        .unwrap();
    assert_eq!(n, 0);
    assert!(conn.calls().is_empty());
}

#[tokio::test]
async fn insert_get_id_postgres_reads_returning_row() {
    let conn = MockConnection::new();
    conn.push_rows(vec![Row::new(vec!["id".into()], vec![Value::Int(9)])]);

    let id = Db::postgres()
        .table("users")
        .insert_get_id(&conn, Record::new().set("name", "a"), None)
        .await
        .unwrap();
    assert_eq!(id, Value::Int(9));
    assert_eq!(
        conn.sql()[0],
        r#"INSERT INTO "users" ("name") VALUES ($1) RETURNING "id""#
    );
}

#[tokio::test]
async fn insert_get_id_mysql_asks_connection() {
    let conn = MockConnection::new().with_affected(1).with_last_id(77);
    let id = Db::mysql()
        .table("users")
        .insert_get_id(&conn, Record::new().set("name", "a"), None)
        .await
        .unwrap();
    assert_eq!(id, Value::Int(77));
    assert_eq!(conn.sql(), vec!["INSERT INTO `users` (`name`) VALUES (?)"]);
}

#[tokio::test]
async fn update_and_delete_return_affected_rows() {
    let conn = MockConnection::new().with_affected(3);
    let db = Db::postgres();

    let mut q = db.table("users");
    q.where_op("age", "<", 18);
    let updated = q
        .update(&conn, Record::new().set("minor", true))
        .await
        .unwrap();
    let deleted = q.delete(&conn).await.unwrap();

    assert_eq!((updated, deleted), (3, 3));
    let calls = conn.calls();
    assert_eq!(
        calls[0].sql,
        r#"UPDATE "users" SET "minor" = $1 WHERE "age" < $2"#
    );
    assert_eq!(calls[0].bindings, vec![Value::Bool(true), Value::Int(18)]);
    assert_eq!(calls[1].sql, r#"DELETE FROM "users" WHERE "age" < $1"#);
    assert_eq!(calls[1].bindings, vec![Value::Int(18)]);
}

#[tokio::test]
async fn increment_and_decrement() {
    let conn = MockConnection::new().with_affected(1);
    let mut q = Db::mysql().table("posts");
    q.where_eq("id", 4);

    q.increment(&conn, "views", 1, Record::new()).await.unwrap();
    q.decrement(&conn, "stock", 2, Record::new().set("sold_out", false))
        .await
        .unwrap();

    let calls = conn.calls();
    assert_eq!(
        calls[0].sql,
        "UPDATE `posts` SET `views` = `views` + 1 WHERE `id` = ?"
    );
    assert_eq!(
        calls[1].sql,
        "UPDATE `posts` SET `stock` = `stock` - 2, `sold_out` = ? WHERE `id` = ?"
    );
    assert_eq!(calls[1].bindings, vec![Value::Bool(false), Value::Int(4)]);
}

#[tokio::test]
async fn upsert_executes_with_update_bindings_last() {
    let conn = MockConnection::new().with_affected(1);
    Db::postgres()
        .table("stock")
        .upsert(
            &conn,
            Record::new().set("sku", "x1").set("qty", 5),
            &["sku"],
            Record::new().set("qty", 6),
        )
        .await
        .unwrap();

    let calls = conn.calls();
    assert_eq!(
        calls[0].sql,
        r#"INSERT INTO "stock" ("sku", "qty") VALUES ($1, $2) ON CONFLICT ("sku") DO UPDATE SET "qty" = $3"#
    );
    assert_eq!(
        calls[0].bindings,
        vec![Value::from("x1"), Value::Int(5), Value::Int(6)]
    );
}

#[tokio::test]
async fn truncate_runs_every_statement() {
    let conn = MockConnection::new();
    Db::sqlite().table("users").truncate(&conn).await.unwrap();
    assert_eq!(
        conn.sql(),
        vec![
            r#"DELETE FROM "sqlite_sequence" WHERE "name" = ?"#,
            r#"DELETE FROM "users""#,
        ]
    );
}

#[tokio::test]
async fn insert_select_and_infile() {
    let conn = MockConnection::new().with_affected(10);
    let mut q = Db::mysql().table("archive");
    let n = q
        .insert_select(&conn, ["id"], |s| {
            s.from("users").select(["id"]).where_eq("deleted", true);
        })
        .await
        .unwrap();
    assert_eq!(n, 10);

    q.load_infile(&conn, &InfileSpec::new("/tmp/a.csv"))
        .await
        .unwrap();

    assert_eq!(
        conn.sql(),
        vec![
            "INSERT INTO `archive` (`id`) SELECT `id` FROM `users` WHERE `deleted` = ?",
            "LOAD DATA INFILE '/tmp/a.csv' INTO TABLE `archive`",
        ]
    );
}

#[tokio::test]
async fn unsupported_statement_is_not_sent() {
    let conn = MockConnection::new();
    let err = Db::postgres()
        .table("users")
        .replace(&conn, Record::new().set("id", 1))
        .await
        .unwrap_err();
    assert!(err.is_unsupported());
    assert!(conn.calls().is_empty());
}

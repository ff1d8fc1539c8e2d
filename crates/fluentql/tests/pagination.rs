mod common;

use common::{MockConnection, user_row};
use fluentql::{BindingKind, Db, Page, PageWindow, QueryConfig, Row, Value};

#[tokio::test]
async fn paginate_last_page() {
    let conn = MockConnection::new();
    conn.push_aggregate(45);
    conn.push_rows((41..=45).map(|id| user_row(id, "u")).collect());

    let mut q = Db::postgres().table("users");
    q.where_eq("active", true).order_by("id").limit(7).offset(3);

    let page: Page<Row> = q.paginate(&conn, 3, 20).await.unwrap();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.total_count(), 45);
    assert_eq!(page.page_count(), 3);
    assert_eq!(page.previous(), Some(2));
    assert_eq!(page.next(), None);

    let calls = conn.calls();
    assert_eq!(
        calls[0].sql,
        r#"SELECT COUNT(*) AS "aggregate" FROM "users" WHERE "active" = $1"#
    );
    assert_eq!(
        calls[1].sql,
        r#"SELECT * FROM "users" WHERE "active" = $1 ORDER BY "id" ASC LIMIT 20 OFFSET 40"#
    );

    // The builder is left as it was.
    assert_eq!(q.state().limit, Some(7));
    assert_eq!(q.state().offset, Some(3));
    assert_eq!(q.state().orders.len(), 1);
}

#[tokio::test]
async fn paginate_first_page_has_next() {
    let conn = MockConnection::new();
    conn.push_aggregate(45);

    let mut q = Db::mysql().table("users");
    let page: Page<Row> = q.paginate(&conn, 1, 20).await.unwrap();
    assert_eq!(page.previous(), None);
    assert_eq!(page.next(), Some(2));
    assert_eq!(conn.sql()[1], "SELECT * FROM `users` LIMIT 20 OFFSET 0");
}

#[tokio::test]
async fn paginate_falls_back_to_default_per_page() {
    let conn = MockConnection::new();
    conn.push_aggregate(12);

    let db = Db::new(QueryConfig::new().with_default_per_page(5));
    let mut q = db.table("users");
    let page: Page<Row> = q.paginate(&conn, 0, 0).await.unwrap();
    assert_eq!(page.window.page, 1);
    assert_eq!(page.window.per_page, 5);
    assert_eq!(page.page_count(), 3);
    assert_eq!(
        conn.sql()[1],
        r#"SELECT * FROM "users" LIMIT 5 OFFSET 0"#
    );
}

#[tokio::test]
async fn total_row_count_ignores_and_restores_ordering() {
    let conn = MockConnection::new();
    conn.push_aggregate(9);

    let mut q = Db::mysql().table("users");
    q.where_eq("a", 1)
        .order_by_raw("FIELD(id, ?, ?)", [3, 4])
        .limit(2)
        .offset(4);

    assert_eq!(q.total_row_count(&conn).await.unwrap(), 9);

    let calls = conn.calls();
    assert_eq!(
        calls[0].sql,
        "SELECT COUNT(*) AS `aggregate` FROM `users` WHERE `a` = ?"
    );
    assert_eq!(calls[0].bindings, vec![Value::Int(1)]);

    assert_eq!(
        q.raw_bindings().slot(BindingKind::Order),
        &[Value::Int(3), Value::Int(4)]
    );
    assert_eq!(
        q.to_sql().unwrap(),
        "SELECT * FROM `users` WHERE `a` = ? ORDER BY FIELD(id, ?, ?) LIMIT 2 OFFSET 4"
    );
}

#[test]
fn page_serializes_flat() {
    let page = Page {
        items: vec![1, 2],
        window: PageWindow::compute(45, 2, 20),
    };
    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["items"], serde_json::json!([1, 2]));
    assert_eq!(json["page"], 2);
    assert_eq!(json["total_count"], 45);
    assert_eq!(json["previous"], 1);
    assert_eq!(json["next"], 3);
}

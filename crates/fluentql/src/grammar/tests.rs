use super::*;
use crate::builder::state::Duplicates;
use crate::record::{Record, Records};
use crate::Db;

fn users_batch() -> Vec<Record> {
    vec![
        Record::new().set("id", 1).set("name", "a"),
        Record::new().set("name", "b").set("id", 2),
    ]
}

// ==================== Identifiers ====================

#[test]
fn test_wrap_quotes_and_escapes() {
    let pg = PostgresGrammar;
    assert_eq!(pg.wrap("users.name"), r#""users"."name""#);
    assert_eq!(pg.wrap("users.*"), r#""users".*"#);
    assert_eq!(pg.wrap(r#"we"ird"#), r#""we""ird""#);
    assert_eq!(pg.wrap("COUNT(id)"), "COUNT(id)");
    assert_eq!(pg.wrap("name AS n"), r#""name" AS "n""#);

    let my = MySqlGrammar;
    assert_eq!(my.wrap("a`b"), "`a``b`");
}

#[test]
fn test_dialect_round_trip() {
    for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite] {
        assert_eq!(dialect.grammar().dialect(), dialect);
    }
    assert_eq!(Dialect::MySql.to_string(), "mysql");
}

// ==================== INSERT ====================

#[test]
fn test_batch_insert_normalizes_columns() {
    let compiled = Db::postgres()
        .table("users")
        .to_insert_sql(users_batch())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"INSERT INTO "users" ("id", "name") VALUES ($1, $2), ($3, $4)"#
    );
    assert_eq!(
        compiled.bindings,
        vec![
            Value::Int(1),
            Value::from("a"),
            Value::Int(2),
            Value::from("b")
        ]
    );
}

#[test]
fn test_insert_rejects_mismatched_records() {
    let records = vec![
        Record::new().set("id", 1).set("name", "a"),
        Record::new().set("id", 2).set("email", "b"),
    ];
    let err = Db::mysql().table("users").to_insert_sql(records).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_insert_expression_is_inlined() {
    let record = Record::new()
        .set("name", "a")
        .set("created_at", crate::raw("CURRENT_TIMESTAMP"));
    let compiled = Db::sqlite().table("users").to_insert_sql(record).unwrap();
    assert_eq!(
        compiled.sql,
        r#"INSERT INTO "users" ("name", "created_at") VALUES (?, CURRENT_TIMESTAMP)"#
    );
    assert_eq!(compiled.bindings, vec![Value::from("a")]);
}

#[test]
fn test_insert_default_values() {
    let pg = Db::postgres().table("logs").to_insert_sql(Record::new()).unwrap();
    assert_eq!(pg.sql, r#"INSERT INTO "logs" DEFAULT VALUES"#);

    let my = Db::mysql().table("logs").to_insert_sql(Record::new()).unwrap();
    assert_eq!(my.sql, "INSERT INTO `logs` () VALUES ()");
}

#[test]
fn test_insert_empty_batch_is_invalid() {
    let err = Db::postgres()
        .table("users")
        .to_insert_sql(Records::Many(Vec::new()))
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_insert_get_id() {
    let record = Record::new().set("name", "a");
    let pg = Db::postgres()
        .table("users")
        .to_insert_get_id_sql(record.clone(), None)
        .unwrap();
    assert_eq!(pg.sql, r#"INSERT INTO "users" ("name") VALUES ($1) RETURNING "id""#);

    let pg = Db::postgres()
        .table("users")
        .to_insert_get_id_sql(record.clone(), Some("user_id"))
        .unwrap();
    assert!(pg.sql.ends_with(r#"RETURNING "user_id""#));

    let my = Db::mysql()
        .table("users")
        .to_insert_get_id_sql(record, None)
        .unwrap();
    assert_eq!(my.sql, "INSERT INTO `users` (`name`) VALUES (?)");
}

#[test]
fn test_insert_ignore_per_dialect() {
    let record = Record::new().set("id", 1);
    let sql = |db: Db| {
        db.table("users")
            .to_insert_ignore_sql(record.clone())
            .unwrap()
            .sql
    };
    assert_eq!(sql(Db::mysql()), "INSERT IGNORE INTO `users` (`id`) VALUES (?)");
    assert_eq!(
        sql(Db::postgres()),
        r#"INSERT INTO "users" ("id") VALUES ($1) ON CONFLICT DO NOTHING"#
    );
    assert_eq!(
        sql(Db::sqlite()),
        r#"INSERT OR IGNORE INTO "users" ("id") VALUES (?)"#
    );
}

#[test]
fn test_replace_per_dialect() {
    let record = Record::new().set("id", 1);
    let my = Db::mysql().table("users").to_replace_sql(record.clone()).unwrap();
    assert_eq!(my.sql, "REPLACE INTO `users` (`id`) VALUES (?)");

    let lite = Db::sqlite().table("users").to_replace_sql(record.clone()).unwrap();
    assert_eq!(lite.sql, r#"INSERT OR REPLACE INTO "users" ("id") VALUES (?)"#);

    let err = Db::postgres().table("users").to_replace_sql(record).unwrap_err();
    assert!(err.is_unsupported());
}

// ==================== UPSERT ====================

#[test]
fn test_upsert_postgres_columns() {
    let compiled = Db::postgres()
        .table("users")
        .to_upsert_sql(users_batch(), &["id"], ["name"])
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"INSERT INTO "users" ("id", "name") VALUES ($1, $2), ($3, $4) ON CONFLICT ("id") DO UPDATE SET "name" = "excluded"."name""#
    );
    assert_eq!(compiled.bindings.len(), 4);
}

#[test]
fn test_upsert_explicit_values_bound_after_rows() {
    let compiled = Db::sqlite()
        .table("counters")
        .to_upsert_sql(
            Record::new().set("key", "hits").set("n", 1),
            &["key"],
            Record::new().set("n", crate::raw("\"n\" + 1")).set("touched", true),
        )
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"INSERT INTO "counters" ("key", "n") VALUES (?, ?) ON CONFLICT ("key") DO UPDATE SET "n" = "n" + 1, "touched" = ?"#
    );
    assert_eq!(
        compiled.bindings,
        vec![Value::from("hits"), Value::Int(1), Value::Bool(true)]
    );
}

#[test]
fn test_upsert_mysql() {
    let compiled = Db::mysql()
        .table("users")
        .to_upsert_sql(users_batch(), &["id"], vec!["name"])
        .unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO `users` (`id`, `name`) VALUES (?, ?), (?, ?) ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"
    );
}

#[test]
fn test_upsert_without_update_is_insert_ignore() {
    let compiled = Db::postgres()
        .table("users")
        .to_upsert_sql(Record::new().set("id", 1), &["id"], Vec::<String>::new())
        .unwrap();
    assert_eq!(
        compiled.sql,
        r#"INSERT INTO "users" ("id") VALUES ($1) ON CONFLICT DO NOTHING"#
    );
}

#[test]
fn test_upsert_requires_conflict_columns() {
    let err = Db::postgres()
        .table("users")
        .to_upsert_sql(Record::new().set("id", 1), &[], ["id"])
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

// ==================== UPDATE / DELETE ====================

#[test]
fn test_update_rejects_empty_values() {
    let mut q = Db::postgres().table("users");
    q.where_eq("id", 1);
    assert!(q.to_update_sql(&Record::new()).unwrap_err().is_invalid_argument());
}

#[test]
fn test_update_with_join_unsupported_outside_mysql() {
    for db in [Db::postgres(), Db::sqlite()] {
        let mut q = db.table("users");
        q.join("teams", "users.team_id", "=", "teams.id");
        let err = q.to_update_sql(&Record::new().set("a", 1)).unwrap_err();
        assert!(err.is_unsupported());
        assert!(q.to_delete_sql().unwrap_err().is_unsupported());
    }
}

#[test]
fn test_mysql_update_order_limit() {
    let mut q = Db::mysql().table("jobs");
    q.where_eq("state", "queued").order_by("id").limit(10);
    let compiled = q
        .to_update_sql(&Record::new().set("state", "running"))
        .unwrap();
    assert_eq!(
        compiled.sql,
        "UPDATE `jobs` SET `state` = ? WHERE `state` = ? ORDER BY `id` ASC LIMIT 10"
    );
    assert_eq!(
        compiled.bindings,
        vec![Value::from("running"), Value::from("queued")]
    );
}

#[test]
fn test_mysql_join_with_limit_unsupported() {
    let mut q = Db::mysql().table("users");
    q.join("teams", "users.team_id", "=", "teams.id").limit(1);
    assert!(q.to_delete_sql().unwrap_err().is_unsupported());
}

#[test]
fn test_mysql_delete_with_join_uses_alias() {
    let mut q = Db::mysql().table("users as u");
    q.join("posts as p", "u.id", "=", "p.user_id").where_null("p.id");
    let compiled = q.to_delete_sql().unwrap();
    assert_eq!(
        compiled.sql,
        "DELETE `u` FROM `users` AS `u` INNER JOIN `posts` AS `p` ON `u`.`id` = `p`.`user_id` WHERE `p`.`id` IS NULL"
    );
}

// ==================== TRUNCATE ====================

#[test]
fn test_truncate_per_dialect() {
    let my = Db::mysql().table("users").to_truncate_sql().unwrap();
    assert_eq!(my, vec![Compiled::new("TRUNCATE TABLE `users`", Vec::new())]);

    let pg = Db::postgres().table("users").to_truncate_sql().unwrap();
    assert_eq!(pg[0].sql, r#"TRUNCATE "users" RESTART IDENTITY CASCADE"#);

    let lite = Db::sqlite().table("users").to_truncate_sql().unwrap();
    assert_eq!(lite.len(), 2);
    assert_eq!(
        lite[0],
        Compiled::new(
            r#"DELETE FROM "sqlite_sequence" WHERE "name" = ?"#,
            vec![Value::from("users")]
        )
    );
    assert_eq!(lite[1].sql, r#"DELETE FROM "users""#);
}

// ==================== LOAD DATA INFILE ====================

#[test]
fn test_infile_mysql() {
    let file = InfileSpec::new("/data/it's.csv")
        .local()
        .on_duplicate(Duplicates::Replace)
        .fields_terminated_by(",")
        .lines_terminated_by("\\n")
        .ignore_lines(1)
        .columns(["id", "name"]);
    let compiled = Db::mysql().table("users").to_infile_sql(&file).unwrap();
    assert_eq!(
        compiled.sql,
        "LOAD DATA LOCAL INFILE '/data/it''s.csv' REPLACE INTO TABLE `users` \
         FIELDS TERMINATED BY ',' LINES TERMINATED BY '\\\\n' IGNORE 1 LINES (`id`, `name`)"
    );
    assert!(compiled.bindings.is_empty());
}

#[test]
fn test_infile_unsupported_elsewhere() {
    let file = InfileSpec::new("/data/x.csv");
    let err = Db::sqlite().table("users").to_infile_sql(&file).unwrap_err();
    assert!(err.is_unsupported());
}

// ==================== Aggregates ====================

#[test]
fn test_wrapped_aggregate_for_grouped_count() {
    let mut state = QueryState {
        table: Some("emp".into()),
        groups: vec!["dept".into()],
        ..QueryState::default()
    };
    state.aggregate = Some(Aggregate {
        function: AggregateFunction::Count,
        columns: Vec::new(),
    });
    assert_eq!(
        PostgresGrammar.compile_select(&state).unwrap(),
        r#"SELECT COUNT(*) AS "aggregate" FROM (SELECT "dept" FROM "emp" GROUP BY "dept") AS "aggregate_table""#
    );
}

#[test]
fn test_plain_aggregate_with_distinct_column() {
    let state = QueryState {
        table: Some("emp".into()),
        distinct: true,
        aggregate: Some(Aggregate {
            function: AggregateFunction::Count,
            columns: vec!["dept".into()],
        }),
        ..QueryState::default()
    };
    assert_eq!(
        MySqlGrammar.compile_select(&state).unwrap(),
        "SELECT COUNT(DISTINCT `dept`) AS `aggregate` FROM `emp`"
    );
}

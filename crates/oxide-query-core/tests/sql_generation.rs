//! Tests for the SQL produced by both dialects: statement shapes, alias
//! qualification, UNION chains, subqueries, hints, literals and parameter
//! numbering.

mod common;
use common::*;

use oxide_query_core::prelude::*;
use oxide_query_core::query::Statement;

struct Shop {
    invoice: Table,
    customer: Table,
    archive: Table,
}

/// `Invoice` is `_0`, `Customer` is `_1`, `Archive` is `_2`.
fn shop() -> Shop {
    let tables = Tables::new();
    Shop {
        invoice: tables.table("Invoice"),
        customer: tables.table("Customer"),
        archive: tables.table("Archive"),
    }
}

fn id(t: &Table) -> Column<i32> {
    t.column("Id")
}

fn total(t: &Table) -> Column<i64> {
    t.column("Total")
}

fn customer_id(t: &Table) -> Column<i32> {
    t.column("CustomerId")
}

fn name(t: &Table) -> Column<String> {
    t.column("Name")
}

fn note(t: &Table) -> NullableColumn<String> {
    t.nullable_column("Note")
}

fn both(query: &oxide_query_core::query::Query<impl Sized>) -> (String, String) {
    (query.to_sql(&SqlServerDialect), query.to_sql(&PostgresDialect))
}

// =============================================================================
// SELECT
// =============================================================================

#[test]
fn select_single_table_is_unqualified() {
    let s = shop();
    let (i, t) = (id(&s.invoice), total(&s.invoice));
    let query = select(move |r| Ok((r.get(&i)?, r.get(&t)?)))
        .from(&s.invoice)
        .where_(total(&s.invoice).gt(100))
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "SELECT Id,Total FROM Invoice WHERE Total>@0");
    assert_eq!(pg, r#"SELECT "Id","Total" FROM "Invoice" WHERE "Total">$1"#);

    let (_, params) = query.render(&SqlServerDialect).unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "@0");
    assert_eq!(params[0].value, SqlValue::BigInt(100));
}

#[test]
fn select_without_where() {
    let s = shop();
    let n = name(&s.customer);
    let query = select(move |r| r.get(&n)).from(&s.customer).build().unwrap();
    assert_eq!(query.to_sql(&SqlServerDialect), "SELECT Name FROM Customer");
}

#[test]
fn select_where_none_leaves_query_unfiltered() {
    let s = shop();
    let n = name(&s.customer);
    let query = select(move |r| r.get(&n))
        .from(&s.customer)
        .where_(Condition::all(Vec::new()))
        .build()
        .unwrap();
    assert_eq!(query.to_sql(&SqlServerDialect), "SELECT Name FROM Customer");
}

#[test]
fn select_join_qualifies_every_column() {
    let s = shop();
    let (i, n) = (id(&s.invoice), name(&s.customer));
    let query = select(move |r| Ok((r.get(&i)?, r.get(&n)?)))
        .from(&s.invoice)
        .join(&s.customer)
        .on(customer_id(&s.invoice).eq(&id(&s.customer)))
        .where_(name(&s.customer).eq("Acme"))
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(
        mssql,
        "SELECT _0.Id,_1.Name FROM Invoice AS _0 INNER JOIN Customer AS _1 \
         ON _0.CustomerId=_1.Id WHERE _1.Name=@0"
    );
    assert_eq!(
        pg,
        r#"SELECT _0."Id",_1."Name" FROM "Invoice" AS _0 INNER JOIN "Customer" AS _1 ON _0."CustomerId"=_1."Id" WHERE _1."Name"=$1"#
    );
}

#[test]
fn select_left_join() {
    let s = shop();
    let n = name(&s.customer);
    let query = select(move |r| r.get(&n))
        .from(&s.invoice)
        .left_join(&s.customer)
        .on(customer_id(&s.invoice).eq(&id(&s.customer)))
        .build()
        .unwrap();
    assert_eq!(
        query.to_sql(&SqlServerDialect),
        "SELECT _1.Name FROM Invoice AS _0 LEFT JOIN Customer AS _1 ON _0.CustomerId=_1.Id"
    );
}

#[test]
fn self_join_uses_two_aliases() {
    let tables = Tables::new();
    let parent = tables.table("Category");
    let child = tables.table("Category");
    let child_id: Column<i32> = child.column("Id");
    let query = select(move |r| r.get(&child_id))
        .from(&child)
        .join(&parent)
        .on(child.column::<i32>("ParentId").eq(&parent.column::<i32>("Id")))
        .build()
        .unwrap();
    assert_eq!(
        query.to_sql(&SqlServerDialect),
        "SELECT _1.Id FROM Category AS _1 INNER JOIN Category AS _0 ON _1.ParentId=_0.Id"
    );
}

#[test]
fn select_top_and_distinct() {
    let s = shop();
    let c = customer_id(&s.invoice);
    let query = select(move |r| r.get(&c))
        .distinct()
        .top(10)
        .unwrap()
        .from(&s.invoice)
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "SELECT DISTINCT TOP 10 CustomerId FROM Invoice");
    assert_eq!(pg, r#"SELECT DISTINCT "CustomerId" FROM "Invoice" LIMIT 10"#);
}

#[test]
fn select_group_by_having_order_by() {
    let s = shop();
    let c = customer_id(&s.invoice);
    let sum_total = sum(&total(&s.invoice));
    let query = select(move |r| Ok((r.get(&c)?, r.get(&sum_total)?)))
        .from(&s.invoice)
        .where_(note(&s.invoice).is_not_null())
        .group_by(&customer_id(&s.invoice))
        .having(count_all().gt(2))
        .order_by(customer_id(&s.invoice).desc())
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(
        mssql,
        "SELECT CustomerId,SUM(Total) FROM Invoice WHERE Note IS NOT NULL \
         GROUP BY CustomerId HAVING COUNT(*)>@0 ORDER BY CustomerId DESC"
    );
    assert_eq!(
        pg,
        r#"SELECT "CustomerId",SUM("Total") FROM "Invoice" WHERE "Note" IS NOT NULL GROUP BY "CustomerId" HAVING COUNT(*)>$1 ORDER BY "CustomerId" DESC"#
    );
}

#[test]
fn group_by_without_where() {
    let s = shop();
    let c = customer_id(&s.invoice);
    let n = count_all();
    let query = select(move |r| Ok((r.get(&c)?, r.get(&n)?)))
        .from(&s.invoice)
        .group_by(&customer_id(&s.invoice))
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(
        mssql,
        "SELECT CustomerId,COUNT(*) FROM Invoice GROUP BY CustomerId"
    );
    assert_eq!(
        pg,
        r#"SELECT "CustomerId",COUNT(*) FROM "Invoice" GROUP BY "CustomerId""#
    );
}

#[test]
fn order_by_several_terms() {
    let s = shop();
    let i = id(&s.invoice);
    let query = select(move |r| r.get(&i))
        .from(&s.invoice)
        .order_by(total(&s.invoice).desc())
        .then_by(id(&s.invoice).asc())
        .build()
        .unwrap();
    assert_eq!(
        query.to_sql(&SqlServerDialect),
        "SELECT Id FROM Invoice ORDER BY Total DESC,Id"
    );
}

#[test]
fn arithmetic_and_functions() {
    let s = shop();
    let doubled = &total(&s.invoice) * 2;
    let len = length(&name(&s.customer));
    let query = select(move |r| r.get(&doubled)).from(&s.invoice).build().unwrap();
    assert_eq!(query.to_sql(&SqlServerDialect), "SELECT (Total*@0) FROM Invoice");

    let query = select(move |r| r.get(&len)).from(&s.customer).build().unwrap();
    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "SELECT LEN(Name) FROM Customer");
    assert_eq!(pg, r#"SELECT LENGTH("Name") FROM "Customer""#);
}

#[test]
fn condition_operators() {
    let s = shop();
    let i = id(&s.invoice);
    let t = total(&s.invoice);
    let n = note(&s.invoice);

    let condition = t
        .between(1, 10)
        .and(i.in_list([1, 2, 3]).unwrap())
        .or(!n.is_null());
    assert_eq!(
        condition.to_inline_sql(&SqlServerDialect),
        "((Total BETWEEN 1 AND 10) AND (Id IN(1,2,3))) OR (NOT (Note IS NULL))"
    );

    assert_eq!(
        i.not_in_list([4]).unwrap().to_inline_sql(&PostgresDialect),
        r#""Id" NOT IN(4)"#
    );
    assert_eq!(
        t.not_between(5, 6).to_inline_sql(&SqlServerDialect),
        "Total NOT BETWEEN 5 AND 6"
    );
    assert_eq!(i.ne(0).to_inline_sql(&SqlServerDialect), "Id<>0");
}

#[test]
fn empty_in_list_is_rejected() {
    let s = shop();
    let err = id(&s.invoice).in_list(Vec::<i32>::new()).unwrap_err();
    assert_eq!(err, QueryError::EmptyInList);
}

#[test]
fn case_insensitive_like() {
    let s = shop();
    let n = name(&s.customer);
    assert_eq!(
        n.ilike("a%").to_inline_sql(&SqlServerDialect),
        "LOWER(Name) LIKE LOWER(N'a%')"
    );
    assert_eq!(n.ilike("a%").to_inline_sql(&PostgresDialect), r#""Name" ILIKE 'a%'"#);
    assert_eq!(
        n.not_like("b%").to_inline_sql(&PostgresDialect),
        r#""Name" NOT LIKE 'b%'"#
    );
}

// =============================================================================
// UNION
// =============================================================================

#[test]
fn union_all_is_linear_and_orders_by_result_column() {
    let s = shop();
    let (a, b) = (id(&s.invoice), id(&s.archive));
    let query = select(move |r| r.get(&a))
        .from(&s.invoice)
        .where_(total(&s.invoice).gt(5))
        .union_all_select(move |r| r.get(&b))
        .from(&s.archive)
        .order_by(id(&s.invoice).asc())
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(
        mssql,
        "SELECT Id FROM Invoice WHERE Total>@0 UNION ALL SELECT Id FROM Archive ORDER BY Id"
    );
    assert_eq!(
        pg,
        r#"SELECT "Id" FROM "Invoice" WHERE "Total">$1 UNION ALL SELECT "Id" FROM "Archive" ORDER BY "Id""#
    );
}

#[test]
fn union_with_join_aliases_every_part_but_not_order_by() {
    let s = shop();
    let (a, b) = (id(&s.invoice), id(&s.archive));
    let query = select(move |r| r.get(&a))
        .from(&s.invoice)
        .join(&s.customer)
        .on(customer_id(&s.invoice).eq(&id(&s.customer)))
        .union_select(move |r| r.get(&b))
        .from(&s.archive)
        .order_by(id(&s.invoice).asc())
        .build()
        .unwrap();

    assert_eq!(
        query.to_sql(&SqlServerDialect),
        "SELECT _0.Id FROM Invoice AS _0 INNER JOIN Customer AS _1 ON _0.CustomerId=_1.Id \
         UNION SELECT _2.Id FROM Archive AS _2 ORDER BY Id"
    );
}

#[test]
fn union_parameters_are_numbered_across_parts() {
    let s = shop();
    let (a, b) = (id(&s.invoice), id(&s.archive));
    let query = select(move |r| r.get(&a))
        .from(&s.invoice)
        .where_(id(&s.invoice).eq(1))
        .union_select(move |r| r.get(&b))
        .from(&s.archive)
        .where_(id(&s.archive).eq(2))
        .build()
        .unwrap();

    let (sql, params) = query.render(&PostgresDialect).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "Id" FROM "Invoice" WHERE "Id"=$1 UNION SELECT "Id" FROM "Archive" WHERE "Id"=$2"#
    );
    let values: Vec<_> = params.into_iter().map(|p| p.value).collect();
    assert_eq!(values, vec![SqlValue::Int(1), SqlValue::Int(2)]);
}

#[test]
fn limited_union_part_is_parenthesised_on_postgres() {
    let s = shop();
    let (a, b) = (id(&s.invoice), id(&s.archive));
    let query = select(move |r| r.get(&a))
        .from(&s.invoice)
        .union_select(move |r| r.get(&b))
        .top(3)
        .unwrap()
        .from(&s.archive)
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "SELECT Id FROM Invoice UNION SELECT TOP 3 Id FROM Archive");
    assert_eq!(
        pg,
        r#"SELECT "Id" FROM "Invoice" UNION (SELECT "Id" FROM "Archive" LIMIT 3)"#
    );
}

// =============================================================================
// Subqueries
// =============================================================================

#[test]
fn exists_subquery_switches_on_aliases() {
    let s = shop();
    let cid = id(&s.customer);
    let inner = select(move |r| r.get(&cid))
        .from(&s.customer)
        .where_(id(&s.customer).eq(&customer_id(&s.invoice)))
        .build()
        .unwrap();

    let i = id(&s.invoice);
    let query = select(move |r| r.get(&i))
        .from(&s.invoice)
        .where_(exists(&inner))
        .build()
        .unwrap();

    assert_eq!(
        query.to_sql(&SqlServerDialect),
        "SELECT _0.Id FROM Invoice AS _0 WHERE EXISTS(SELECT _1.Id FROM Customer AS _1 \
         WHERE _1.Id=_0.CustomerId)"
    );
}

#[test]
fn in_subquery_shares_parameter_numbering() {
    let s = shop();
    let cid = id(&s.customer);
    let acme = select(move |r| r.get(&cid))
        .from(&s.customer)
        .where_(name(&s.customer).like("A%"))
        .build()
        .unwrap();

    let i = id(&s.invoice);
    let query = select(move |r| r.get(&i))
        .from(&s.invoice)
        .where_(
            customer_id(&s.invoice)
                .in_query(&acme)
                .and(total(&s.invoice).ge(10)),
        )
        .build()
        .unwrap();

    let (sql, params) = query.render(&SqlServerDialect).unwrap();
    assert_eq!(
        sql,
        "SELECT _0.Id FROM Invoice AS _0 WHERE (_0.CustomerId IN(SELECT _1.Id FROM Customer AS _1 \
         WHERE _1.Name LIKE @0)) AND (_0.Total>=@1)"
    );
    assert_eq!(params[0].value, SqlValue::Text("A%".into()));
    assert_eq!(params[1].value, SqlValue::BigInt(10));
}

#[test]
fn not_exists_subquery() {
    let s = shop();
    let aid = id(&s.archive);
    let archived = select(move |r| r.get(&aid))
        .from(&s.archive)
        .where_(id(&s.archive).eq(&id(&s.invoice)))
        .build()
        .unwrap();
    let i = id(&s.invoice);
    let query = select(move |r| r.get(&i))
        .from(&s.invoice)
        .where_(not_exists(&archived))
        .build()
        .unwrap();
    assert_eq!(
        query.to_sql(&PostgresDialect),
        r#"SELECT _0."Id" FROM "Invoice" AS _0 WHERE NOT EXISTS(SELECT _2."Id" FROM "Archive" AS _2 WHERE _2."Id"=_0."Id")"#
    );
}

// =============================================================================
// Dialect-specific clauses
// =============================================================================

#[test]
fn sqlserver_hints_and_options() {
    let s = shop();
    let i = id(&s.invoice);
    let query = select(move |r| r.get(&i))
        .from(&s.invoice)
        .with_hints(&[TableHint::NoLock, TableHint::RowLock])
        .where_(id(&s.invoice).eq(1))
        .option(QueryOption::Recompile)
        .option(QueryOption::MaxDop(2))
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(
        mssql,
        "SELECT Id FROM Invoice WITH(NOLOCK,ROWLOCK) WHERE Id=@0 OPTION(RECOMPILE,MAXDOP 2)"
    );
    assert_eq!(pg, r#"SELECT "Id" FROM "Invoice" WHERE "Id"=$1"#);
}

#[test]
fn postgres_row_locking() {
    let s = shop();
    let i = id(&s.invoice);
    let query = select(move |r| r.get(&i))
        .top(5)
        .unwrap()
        .from(&s.invoice)
        .lock(ForLock::update().skip_locked())
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "SELECT TOP 5 Id FROM Invoice");
    assert_eq!(pg, r#"SELECT "Id" FROM "Invoice" LIMIT 5 FOR UPDATE SKIP LOCKED"#);
}

#[test]
fn schema_and_reserved_names_are_quoted() {
    let tables = Tables::new();
    let user = tables.in_schema("dbo", "User");
    let order: Column<i32> = user.column("Order");
    let query = select(move |r| r.get(&order)).from(&user).build().unwrap();
    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "SELECT [Order] FROM dbo.[User]");
    assert_eq!(pg, r#"SELECT "Order" FROM dbo."User""#);
}

// =============================================================================
// INSERT / UPDATE / DELETE / TRUNCATE
// =============================================================================

#[test]
fn insert_binds_values_in_column_order() {
    let s = shop();
    let statement = insert_into(&s.invoice)
        .set(&id(&s.invoice), 7)
        .set(&total(&s.invoice), 250)
        .set_null(&note(&s.invoice))
        .build()
        .unwrap();

    let (sql, params) = statement.render(&SqlServerDialect).unwrap();
    assert_eq!(sql, "INSERT INTO Invoice(Id,Total,Note) VALUES(@0,@1,@2)");
    assert_eq!(params[2].value, SqlValue::Null);
    assert_eq!(
        statement.to_sql(&PostgresDialect),
        r#"INSERT INTO "Invoice"("Id","Total","Note") VALUES($1,$2,$3)"#
    );
}

#[test]
fn insert_returning() {
    let s = shop();
    let i = id(&s.invoice);
    let query = insert_into(&s.invoice)
        .set(&total(&s.invoice), 1)
        .returning(move |r| r.get(&i))
        .build()
        .unwrap();

    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "INSERT INTO Invoice(Total) OUTPUT INSERTED.Id VALUES(@0)");
    assert_eq!(pg, r#"INSERT INTO "Invoice"("Total") VALUES($1) RETURNING "Id""#);
}

#[test]
fn update_numbers_set_before_where() {
    let s = shop();
    let statement = update(&s.invoice)
        .set(&total(&s.invoice), 5)
        .where_(id(&s.invoice).eq(7))
        .build()
        .unwrap();

    let (sql, params) = statement.render(&SqlServerDialect).unwrap();
    assert_eq!(sql, "UPDATE Invoice SET Total=@0 WHERE Id=@1");
    assert_eq!(params[0].value, SqlValue::BigInt(5));
    assert_eq!(params[1].value, SqlValue::Int(7));
    assert_eq!(
        statement.to_sql(&PostgresDialect),
        r#"UPDATE "Invoice" SET "Total"=$1 WHERE "Id"=$2"#
    );
}

#[test]
fn update_with_from_tables() {
    let s = shop();
    let statement = update(&s.invoice)
        .set(&total(&s.invoice), 0)
        .from(&[&s.customer])
        .unwrap()
        .where_(
            customer_id(&s.invoice)
                .eq(&id(&s.customer))
                .and(name(&s.customer).eq("Acme")),
        )
        .build()
        .unwrap();

    assert_eq!(
        statement.to_sql(&SqlServerDialect),
        "UPDATE _0 SET Total=@0 FROM Invoice AS _0,Customer AS _1 \
         WHERE (_0.CustomerId=_1.Id) AND (_1.Name=@1)"
    );
    assert_eq!(
        statement.to_sql(&PostgresDialect),
        r#"UPDATE "Invoice" AS _0 SET "Total"=$1 FROM "Customer" AS _1 WHERE (_0."CustomerId"=_1."Id") AND (_1."Name"=$2)"#
    );
}

#[test]
fn update_every_row_with_column_arithmetic() {
    let s = shop();
    let statement = update(&s.invoice)
        .set(&total(&s.invoice), &total(&s.invoice) + 1)
        .no_where()
        .build()
        .unwrap();
    assert_eq!(
        statement.to_inline_sql(&SqlServerDialect),
        "UPDATE Invoice SET Total=(Total+1)"
    );
}

#[test]
fn update_returning() {
    let s = shop();
    let t = total(&s.invoice);
    let query = update(&s.invoice)
        .set(&total(&s.invoice), 3)
        .where_(id(&s.invoice).eq(1))
        .returning(move |r| r.get(&t))
        .build()
        .unwrap();
    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "UPDATE Invoice SET Total=@0 OUTPUT INSERTED.Total WHERE Id=@1");
    assert_eq!(
        pg,
        r#"UPDATE "Invoice" SET "Total"=$1 WHERE "Id"=$2 RETURNING "Total""#
    );
}

#[test]
fn delete_simple_and_unfiltered() {
    let s = shop();
    let statement = delete_from(&s.invoice)
        .where_(id(&s.invoice).eq(3))
        .build()
        .unwrap();
    let (mssql, pg) = (
        statement.to_sql(&SqlServerDialect),
        statement.to_sql(&PostgresDialect),
    );
    assert_eq!(mssql, "DELETE FROM Invoice WHERE Id=@0");
    assert_eq!(pg, r#"DELETE FROM "Invoice" WHERE "Id"=$1"#);

    let everything = delete_from(&s.archive).no_where().build().unwrap();
    assert_eq!(everything.to_sql(&SqlServerDialect), "DELETE FROM Archive");
}

#[test]
fn delete_with_join() {
    let s = shop();
    let statement = delete_from(&s.invoice)
        .join(&s.customer)
        .on(customer_id(&s.invoice).eq(&id(&s.customer)))
        .where_(name(&s.customer).eq("Gone"))
        .build()
        .unwrap();

    assert_eq!(
        statement.to_sql(&SqlServerDialect),
        "DELETE _0 FROM Invoice AS _0 INNER JOIN Customer AS _1 ON _0.CustomerId=_1.Id \
         WHERE _1.Name=@0"
    );
    assert_eq!(
        statement.to_sql(&PostgresDialect),
        r#"DELETE FROM "Invoice" AS _0 USING "Customer" AS _1 WHERE (_0."CustomerId"=_1."Id") AND (_1."Name"=$1)"#
    );
}

#[test]
fn delete_returning() {
    let s = shop();
    let i = id(&s.invoice);
    let query = delete_from(&s.invoice)
        .where_(total(&s.invoice).lt(0))
        .returning(move |r| r.get(&i))
        .build()
        .unwrap();
    let (mssql, pg) = both(&query);
    assert_eq!(mssql, "DELETE FROM Invoice OUTPUT DELETED.Id WHERE Total<@0");
    assert_eq!(pg, r#"DELETE FROM "Invoice" WHERE "Total"<$1 RETURNING "Id""#);
}

#[test]
fn truncate_table_statement() {
    let tables = Tables::new();
    let statement = truncate_table(&tables.in_schema("dbo", "Invoice"))
        .build()
        .unwrap();
    assert_eq!(statement.to_sql(&SqlServerDialect), "TRUNCATE TABLE dbo.Invoice");
    assert_eq!(statement.to_sql(&PostgresDialect), r#"TRUNCATE TABLE dbo."Invoice""#);
    assert!(matches!(**statement.statement(), Statement::Truncate(_)));
}

// =============================================================================
// Literal rendering
// =============================================================================

#[test]
fn inline_literals_are_escaped() {
    let s = shop();
    let n = name(&s.customer);
    let query = select(move |r| r.get(&n))
        .from(&s.customer)
        .where_(name(&s.customer).eq("O'Brien"))
        .build()
        .unwrap();

    assert_eq!(
        query.to_inline_sql(&SqlServerDialect),
        "SELECT Name FROM Customer WHERE Name=N'O''Brien'"
    );
    assert_eq!(
        query.to_inline_sql(&PostgresDialect),
        r#"SELECT "Name" FROM "Customer" WHERE "Name"='O''Brien'"#
    );
}

#[test]
fn bound_text_never_reaches_sql() {
    let s = shop();
    let n = name(&s.customer);
    let hostile = "x'; DROP TABLE Customer; --";
    let query = select(move |r| r.get(&n))
        .from(&s.customer)
        .where_(name(&s.customer).eq(hostile))
        .build()
        .unwrap();

    let (sql, params) = query.render(&SqlServerDialect).unwrap();
    assert!(!sql.contains("DROP"));
    assert_eq!(params[0].value, SqlValue::Text(hostile.into()));
}

#[test]
fn inline_booleans_and_nulls() {
    let tables = Tables::new();
    let flags = tables.table("Flags");
    let active: Column<bool> = flags.column("Active");
    let label: NullableColumn<String> = flags.nullable_column("Label");
    let statement = insert_into(&flags)
        .set(&active, true)
        .set_opt(&label, None)
        .build()
        .unwrap();

    assert_eq!(
        statement.to_inline_sql(&SqlServerDialect),
        "INSERT INTO Flags(Active,Label) VALUES(1,NULL)"
    );
    assert_eq!(
        statement.to_inline_sql(&PostgresDialect),
        r#"INSERT INTO "Flags"("Active","Label") VALUES(TRUE,NULL)"#
    );
}

#[test]
fn inline_literals_per_value_kind() {
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use uuid::Uuid;

    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let time = date.and_hms_opt(13, 5, 0).unwrap();
    let offset = FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .from_local_datetime(&time)
        .unwrap();
    let guid = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);

    let cases: Vec<(SqlValue, &str, &str)> = vec![
        (SqlValue::Null, "NULL", "NULL"),
        (SqlValue::Bool(false), "0", "FALSE"),
        (SqlValue::TinyInt(255), "255", "255"),
        (SqlValue::SmallInt(-3), "-3", "-3"),
        (SqlValue::Int(42), "42", "42"),
        (SqlValue::BigInt(-9_000_000_000), "-9000000000", "-9000000000"),
        (SqlValue::Real(2.5), "2.5", "2.5"),
        (SqlValue::Real(f32::NAN), "NULL", "'NaN'::float4"),
        (SqlValue::Double(-1.25), "-1.25", "-1.25"),
        (SqlValue::Double(f64::NAN), "NULL", "'NaN'::float8"),
        (SqlValue::Double(f64::INFINITY), "NULL", "'Infinity'::float8"),
        (SqlValue::Double(f64::NEG_INFINITY), "NULL", "'-Infinity'::float8"),
        (SqlValue::Text("it's".into()), "N'it''s'", "'it''s'"),
        (
            SqlValue::Guid(guid),
            "'01234567-89ab-cdef-0123-456789abcdef'",
            "'01234567-89ab-cdef-0123-456789abcdef'::uuid",
        ),
        (SqlValue::Blob(vec![0x0a, 0xff]), "0x0AFF", r"'\x0aff'::bytea"),
        (SqlValue::Blob(Vec::new()), "0x", r"'\x'::bytea"),
        (SqlValue::Date(date), "'2024-02-29'", "'2024-02-29'::date"),
        (SqlValue::Time(time.time()), "'13:05:00'", "'13:05:00'::time"),
        (
            SqlValue::DateTime(time),
            "'2024-02-29T13:05:00'",
            "'2024-02-29 13:05:00'::timestamp",
        ),
        (
            SqlValue::DateTimeOffset(offset),
            "'2024-02-29T13:05:00+02:00'",
            "'2024-02-29 13:05:00+02:00'::timestamptz",
        ),
    ];

    for (value, mssql, pg) in cases {
        let mut sql = String::new();
        SqlServerDialect.write_literal(&mut sql, &value);
        assert_eq!(sql, mssql, "SQL Server literal for {value:?}");

        let mut sql = String::new();
        PostgresDialect.write_literal(&mut sql, &value);
        assert_eq!(sql, pg, "PostgreSQL literal for {value:?}");
    }
}

#[test]
fn inline_and_bound_forms_agree() {
    use chrono::{DateTime, FixedOffset};

    let tables = Tables::new();
    let files = tables.table("Files");
    let data: Column<Vec<u8>> = files.column("Data");
    let stamp: Column<DateTime<FixedOffset>> = files.column("Stamp");
    let score: Column<f64> = files.column("Score");

    let at = DateTime::parse_from_rfc3339("2024-02-29T13:05:00-05:00").unwrap();
    let statement = insert_into(&files)
        .set(&data, vec![0xde, 0xad])
        .set(&stamp, at)
        .set(&score, 0.5)
        .build()
        .unwrap();

    let (sql, params) = statement.render(&PostgresDialect).unwrap();
    assert_eq!(
        sql,
        r#"INSERT INTO "Files"("Data","Stamp","Score") VALUES($1,$2,$3)"#
    );
    let values: Vec<_> = params.into_iter().map(|p| p.value).collect();
    assert_eq!(
        values,
        vec![
            SqlValue::Blob(vec![0xde, 0xad]),
            SqlValue::DateTimeOffset(at),
            SqlValue::Double(0.5),
        ]
    );
    assert_eq!(
        statement.to_inline_sql(&PostgresDialect),
        r#"INSERT INTO "Files"("Data","Stamp","Score") VALUES('\xdead'::bytea,'2024-02-29 13:05:00-05:00'::timestamptz,0.5)"#
    );
    assert_eq!(
        statement.to_inline_sql(&SqlServerDialect),
        "INSERT INTO Files(Data,Stamp,Score) VALUES(0xDEAD,'2024-02-29T13:05:00-05:00',0.5)"
    );
}

//! Invoicing - typed queries rendered for SQL Server and PostgreSQL
//!
//! This example demonstrates:
//! - Table descriptors derived from row structs, with typed keys and enums
//! - SELECT with joins, grouping and UNION
//! - INSERT/UPDATE/DELETE with returned columns
//! - A prepared query executed through a connection provider
//!
//! The provider here only logs the commands it receives.
//!
//! Run with: cargo run --example invoicing

use oxide_query_core::decode::{BufferedCursor, ResultCursor};
use oxide_query_core::execute::{Command, Connection};
use oxide_query_core::prelude::*;
use oxide_query_core::ExecResult;
use oxide_query_derive::Table;

// =============================================================================
// SCHEMA
// =============================================================================

pub struct ClientTag;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
}

impl DbEnum for InvoiceStatus {
    type Repr = u8;

    fn to_repr(self) -> u8 {
        self as u8
    }

    fn from_repr(repr: u8) -> Option<Self> {
        match repr {
            0 => Some(Self::Draft),
            1 => Some(Self::Sent),
            2 => Some(Self::Paid),
            _ => None,
        }
    }
}

/// Customers who receive invoices.
#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(schema = "billing")]
pub struct Client {
    #[column(primary_key)]
    pub id: IntKey<ClientTag>,
    pub name: String,
    pub email: Option<String>,
}

/// The billing document.
#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(schema = "billing")]
pub struct Invoice {
    #[column(primary_key)]
    pub id: GuidKey<Invoice>,
    pub client_id: IntKey<ClientTag>,
    pub total: i64,
    pub status: InvoiceStatus,
    pub note: Option<String>,
}

/// Invoices moved out of the live table.
#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(schema = "billing")]
pub struct ArchivedInvoice {
    #[column(primary_key)]
    pub id: GuidKey<Invoice>,
    pub client_id: IntKey<ClientTag>,
    pub total: i64,
}

// =============================================================================
// A PROVIDER THAT ONLY LOGS
// =============================================================================

struct LoggingProvider(SqlServerDialect);

struct LoggingConnection;

impl Connection for LoggingConnection {
    fn begin(&mut self, isolation: IsolationLevel) -> ExecResult<()> {
        println!("  -> BEGIN TRANSACTION ({isolation})");
        Ok(())
    }

    fn commit(&mut self) -> ExecResult<()> {
        println!("  -> COMMIT");
        Ok(())
    }

    fn rollback(&mut self) -> ExecResult<()> {
        println!("  -> ROLLBACK");
        Ok(())
    }

    fn execute_reader(&mut self, command: &Command) -> ExecResult<Box<dyn ResultCursor>> {
        println!("  -> {} with {} parameter(s)", command.sql, command.parameters.len());
        Ok(Box::new(BufferedCursor::empty()))
    }

    fn execute_non_query(&mut self, command: &Command) -> ExecResult<u64> {
        println!("  -> {} with {} parameter(s)", command.sql, command.parameters.len());
        Ok(1)
    }
}

impl ConnectionProvider for LoggingProvider {
    type Connection = LoggingConnection;

    fn dialect(&self) -> &dyn Dialect {
        &self.0
    }

    fn open_new_connection(&self) -> ExecResult<LoggingConnection> {
        Ok(LoggingConnection)
    }
}

fn show(title: &str, mssql: &str, pg: &str) {
    println!("{title}");
    println!("  SQL Server: {mssql}");
    println!("  PostgreSQL: {pg}");
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let clients = ClientTable::instance();
    let invoices = InvoiceTable::instance();
    let archive = ArchivedInvoiceTable::instance();

    // Outstanding totals per client
    let query = select(move |r| Ok((r.get(&clients.name)?, r.get(&sum(&invoices.total))?)))
        .from(invoices)
        .join(clients)
        .on(invoices.client_id.eq(&clients.id))
        .where_(invoices.status.eq(InvoiceStatus::Sent))
        .group_by(&clients.name)
        .having(count_all().gt(1))
        .order_by(clients.name.asc())
        .build()?;
    show(
        "Outstanding totals per client",
        &query.to_sql(&SqlServerDialect),
        &query.to_sql(&PostgresDialect),
    );

    // Live and archived invoices of one client
    let client = IntKey::<ClientTag>::new(42);
    let query = select(move |r| r.get(&invoices.total))
        .from(invoices)
        .where_(invoices.client_id.eq(client))
        .union_all_select(move |r| r.get(&archive.total))
        .from(archive)
        .where_(archive.client_id.eq(client))
        .order_by(invoices.total.desc())
        .build()?;
    show(
        "Live and archived totals",
        &query.to_sql(&SqlServerDialect),
        &query.to_sql(&PostgresDialect),
    );

    // New draft, reading the generated key back
    let query = insert_into(invoices)
        .set(&invoices.id, GuidKey::generate())
        .set(&invoices.client_id, client)
        .set(&invoices.total, 1_250)
        .set(&invoices.status, InvoiceStatus::Draft)
        .set_opt(&invoices.note, Some(String::from("first order")))
        .returning(move |r| r.get(&invoices.id))
        .build()?;
    show(
        "Insert a draft",
        &query.to_inline_sql(&SqlServerDialect),
        &query.to_inline_sql(&PostgresDialect),
    );

    // Mark drafts of clients without an email as sent
    let statement = update(invoices)
        .set(&invoices.status, InvoiceStatus::Sent)
        .from(&[clients.table()])?
        .where_(
            invoices
                .client_id
                .eq(&clients.id)
                .and(clients.email.is_null()),
        )
        .build()?;
    show(
        "Update with FROM",
        &statement.to_sql(&SqlServerDialect),
        &statement.to_sql(&PostgresDialect),
    );

    // Prepared delete, run inside a transaction
    struct Purge {
        client: IntKey<ClientTag>,
    }

    let mut params = PreparedParams::new();
    let p_client = params.add(|a: &Purge| a.client);
    let purge = delete_from(archive)
        .where_(archive.client_id.eq(p_client))
        .build_prepared(params)?;

    let db = Database::new("billing", LoggingProvider(SqlServerDialect));
    let mut tx = Transaction::new(IsolationLevel::Serializable);
    println!("Purge archived invoices");
    for client in [1, 2] {
        purge.execute_in(&mut tx, &db, &Purge { client: IntKey::new(client) })?;
    }
    tx.commit()?;

    Ok(())
}

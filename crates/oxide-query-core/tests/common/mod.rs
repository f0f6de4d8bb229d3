#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use oxide_query_core::decode::{BufferedCursor, ResultCursor};
use oxide_query_core::dialect::{Dialect, PostgresDialect, SqlServerDialect};
use oxide_query_core::execute::{
    Command, Connection, ConnectionProvider, Database, IsolationLevel, QueryEvents,
    QueryExecuting, QueryPerformed,
};
use oxide_query_core::schema::{AliasGenerator, Table};
use oxide_query_core::value::SqlValue;
use oxide_query_core::{ExecError, ExecResult};

/// What a mock connection was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open,
    Begin(IsolationLevel),
    Commit,
    Rollback,
    Reader(Command),
    NonQuery(Command),
}

/// Scripted reply to the next reader or non-query call.
#[derive(Debug, Clone)]
pub enum Reply {
    Rows(usize, Vec<Vec<SqlValue>>),
    Affected(u64),
    Fail(&'static str),
}

#[derive(Debug, Default)]
pub struct Script {
    pub calls: Vec<Call>,
    pub replies: VecDeque<Reply>,
    pub fail_open: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Script>>);

impl Recorder {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.0.lock().unwrap()
    }

    pub fn reply(&self, reply: Reply) {
        self.lock().replies.push_back(reply);
    }

    pub fn rows(&self, width: usize, rows: Vec<Vec<SqlValue>>) {
        self.reply(Reply::Rows(width, rows));
    }

    pub fn fail_open(&self) {
        self.lock().fail_open = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Every command sent, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reader(command) | Call::NonQuery(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn last_command(&self) -> Command {
        self.commands().pop().expect("no command was sent")
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn next_reply(&self) -> Option<Reply> {
        self.lock().replies.pop_front()
    }
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    postgres: bool,
    recorder: Recorder,
}

impl ConnectionProvider for MockProvider {
    type Connection = MockConnection;

    fn dialect(&self) -> &dyn Dialect {
        if self.postgres {
            &PostgresDialect
        } else {
            &SqlServerDialect
        }
    }

    fn open_new_connection(&self) -> ExecResult<MockConnection> {
        if self.recorder.lock().fail_open {
            return Err(ExecError::Connection("refused".into()));
        }
        self.recorder.record(Call::Open);
        Ok(MockConnection {
            recorder: self.recorder.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    recorder: Recorder,
}

impl Connection for MockConnection {
    fn begin(&mut self, isolation: IsolationLevel) -> ExecResult<()> {
        self.recorder.record(Call::Begin(isolation));
        Ok(())
    }

    fn commit(&mut self) -> ExecResult<()> {
        self.recorder.record(Call::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> ExecResult<()> {
        self.recorder.record(Call::Rollback);
        Ok(())
    }

    fn execute_reader(&mut self, command: &Command) -> ExecResult<Box<dyn ResultCursor>> {
        self.recorder.record(Call::Reader(command.clone()));
        match self.recorder.next_reply() {
            Some(Reply::Rows(width, rows)) => Ok(Box::new(BufferedCursor::new(width, rows))),
            Some(Reply::Affected(n)) => {
                Ok(Box::new(BufferedCursor::empty().with_records_affected(n)))
            }
            Some(Reply::Fail(message)) => Err(ExecError::Connection(message.into())),
            None => Ok(Box::new(BufferedCursor::empty())),
        }
    }

    fn execute_non_query(&mut self, command: &Command) -> ExecResult<u64> {
        self.recorder.record(Call::NonQuery(command.clone()));
        match self.recorder.next_reply() {
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Fail(message)) => Err(ExecError::Connection(message.into())),
            Some(Reply::Rows(..)) | None => Ok(0),
        }
    }
}

pub fn sqlserver_db(name: &str) -> (Database<MockProvider>, Recorder) {
    mock_db(name, false, None)
}

pub fn postgres_db(name: &str) -> (Database<MockProvider>, Recorder) {
    mock_db(name, true, None)
}

pub fn mock_db(
    name: &str,
    postgres: bool,
    events: Option<Arc<dyn QueryEvents>>,
) -> (Database<MockProvider>, Recorder) {
    let recorder = Recorder::default();
    let provider = MockProvider {
        postgres,
        recorder: recorder.clone(),
    };
    let database = Database::with_options(name, provider, Some(Duration::from_secs(30)), events);
    (database, recorder)
}

/// Records every hook invocation as a short string.
#[derive(Debug, Default)]
pub struct HookLog {
    pub entries: Mutex<Vec<String>>,
}

impl HookLog {
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl QueryEvents for HookLog {
    fn query_executing(&self, event: &QueryExecuting<'_>) {
        self.entries.lock().unwrap().push(format!(
            "executing {} {} {:?}",
            event.database, event.kind, event.debug_name
        ));
    }

    fn query_performed(&self, event: &QueryPerformed<'_>) {
        self.entries.lock().unwrap().push(format!(
            "performed rows={:?} affected={} failed={}",
            event.rows,
            event.rows_affected,
            event.error.is_some()
        ));
    }
}

/// Hooks that always panic.
#[derive(Debug, Default)]
pub struct PanickingHooks;

impl QueryEvents for PanickingHooks {
    fn query_executing(&self, _event: &QueryExecuting<'_>) {
        panic!("executing hook failed");
    }

    fn query_performed(&self, _event: &QueryPerformed<'_>) {
        panic!("performed hook failed");
    }
}

/// Tables with predictable aliases: `_0`, `_1`, ... in creation order.
pub struct Tables {
    aliases: AliasGenerator,
}

impl Tables {
    pub const fn new() -> Self {
        Self {
            aliases: AliasGenerator::new(),
        }
    }

    pub fn table(&self, name: &'static str) -> Table {
        Table::with_generator(&self.aliases, None, name).unwrap()
    }

    pub fn in_schema(&self, schema: &'static str, name: &'static str) -> Table {
        Table::with_generator(&self.aliases, Some(schema), name).unwrap()
    }
}

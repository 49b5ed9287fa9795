use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chambers_data::db::drivers::mysql::normalize::{ColumnDescription, SqlRows};
use chambers_data::db::drivers::mysql::{MySqlConnection, SqlSession};
use mysql_async::Value as SqlValue;

use super::{lock, Shared, TIMEOUT};

/// Everything the fake saw, plus the canned answers it hands out.
#[derive(Default)]
pub struct SqlLog {
    pub statements: Vec<(String, Vec<SqlValue>)>,
    pub rows: VecDeque<SqlRows>,
    pub affected: VecDeque<u64>,
    pub fail_next: Option<String>,
    pub closes: usize,
}

impl SqlLog {
    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

pub struct FakeSql {
    log: Shared<SqlLog>,
}

impl FakeSql {
    fn record(&self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<()> {
        let mut log = lock(&self.log);
        log.statements.push((sql, params));
        match log.fail_next.take() {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SqlSession for FakeSql {
    async fn query(&mut self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<SqlRows> {
        self.record(sql, params)?;
        Ok(lock(&self.log).rows.pop_front().unwrap_or_default())
    }

    async fn execute(&mut self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<u64> {
        self.record(sql, params)?;
        Ok(lock(&self.log).affected.pop_front().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        lock(&self.log).closes += 1;
        Ok(())
    }
}

pub fn connection() -> (MySqlConnection, Shared<SqlLog>) {
    let log = Arc::new(Mutex::new(SqlLog::default()));
    let session = FakeSql { log: log.clone() };
    let conn = MySqlConnection::with_session(Box::new(session), TIMEOUT).unwrap();
    (conn, log)
}

pub fn column(name: &str, type_name: &str) -> ColumnDescription {
    ColumnDescription {
        name: name.into(),
        type_name: type_name.into(),
        length: 0,
        precision: 0,
        scale: 0,
    }
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Bytes(s.as_bytes().to_vec())
}

/// A single `COUNT(*)` answer.
pub fn count(n: i64) -> SqlRows {
    SqlRows {
        columns: vec![column("COUNT(*)", "BIGINT")],
        rows: vec![vec![SqlValue::Int(n)]],
    }
}

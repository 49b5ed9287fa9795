use async_trait::async_trait;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::*;
use mysql_async::{Conn, Params, Row, Value as SqlValue};

use super::normalize::{ColumnDescription, SqlRows};

/// Character set id MySQL reports for binary strings.
const BINARY_CHARSET: u16 = 63;

/// The live relational session a [`super::MySqlConnection`] wraps.
#[async_trait]
pub trait SqlSession: Send {
    /// Runs a statement that returns rows.
    async fn query(&mut self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<SqlRows>;

    /// Runs a statement and returns the affected row count.
    async fn execute(&mut self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<u64>;

    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

/// Session backed by a single `mysql_async` connection.
pub struct MySqlSession {
    conn: Conn,
}

impl MySqlSession {
    pub async fn open(opts: mysql_async::Opts) -> anyhow::Result<Self> {
        let conn = Conn::new(opts).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SqlSession for MySqlSession {
    async fn query(&mut self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<SqlRows> {
        let result = self.conn.exec_iter(sql, Params::from(params)).await?;
        let columns = result
            .columns()
            .map(|cols| cols.iter().map(describe_column).collect())
            .unwrap_or_default();
        let rows: Vec<Row> = result.collect_and_drop().await?;
        Ok(SqlRows {
            columns,
            rows: rows.into_iter().map(row_values).collect(),
        })
    }

    async fn execute(&mut self, sql: String, params: Vec<SqlValue>) -> anyhow::Result<u64> {
        if params.is_empty() {
            // DDL such as CREATE TABLESPACE cannot be prepared.
            self.conn.query_drop(sql).await?;
        } else {
            self.conn.exec_drop(sql, Params::from(params)).await?;
        }
        Ok(self.conn.affected_rows())
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.conn.disconnect().await?;
        Ok(())
    }
}

fn row_values(mut row: Row) -> Vec<SqlValue> {
    (0..row.len())
        .map(|i| row.take::<SqlValue, usize>(i).unwrap_or(SqlValue::NULL))
        .collect()
}

fn describe_column(column: &mysql_async::Column) -> ColumnDescription {
    let type_name = type_name(column.column_type(), column.character_set());
    let is_decimal = matches!(
        column.column_type(),
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL
    );
    ColumnDescription {
        name: column.name_str().into_owned(),
        type_name: type_name.to_string(),
        length: column.column_length().into(),
        precision: if is_decimal { column.column_length().into() } else { 0 },
        scale: if is_decimal { column.decimals().into() } else { 0 },
    }
}

/// Declared type name for a wire column type.
fn type_name(column_type: ColumnType, charset: u16) -> &'static str {
    let binary = charset == BINARY_CHARSET;
    match column_type {
        ColumnType::MYSQL_TYPE_TINY => "TINYINT",
        ColumnType::MYSQL_TYPE_SHORT => "SMALLINT",
        ColumnType::MYSQL_TYPE_INT24 => "MEDIUMINT",
        ColumnType::MYSQL_TYPE_LONG => "INT",
        ColumnType::MYSQL_TYPE_LONGLONG => "BIGINT",
        ColumnType::MYSQL_TYPE_FLOAT => "FLOAT",
        ColumnType::MYSQL_TYPE_DOUBLE => "DOUBLE",
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => "DECIMAL",
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => "DATE",
        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => "TIME",
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_DATETIME2 => "DATETIME",
        ColumnType::MYSQL_TYPE_TIMESTAMP | ColumnType::MYSQL_TYPE_TIMESTAMP2 => "TIMESTAMP",
        ColumnType::MYSQL_TYPE_YEAR => "YEAR",
        ColumnType::MYSQL_TYPE_BIT => "BIT",
        ColumnType::MYSQL_TYPE_JSON => "JSON",
        ColumnType::MYSQL_TYPE_ENUM => "ENUM",
        ColumnType::MYSQL_TYPE_SET => "SET",
        ColumnType::MYSQL_TYPE_GEOMETRY => "GEOMETRY",
        ColumnType::MYSQL_TYPE_NULL => "NULL",
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING => {
            if binary {
                "VARBINARY"
            } else {
                "VARCHAR"
            }
        }
        ColumnType::MYSQL_TYPE_STRING => {
            if binary {
                "BINARY"
            } else {
                "CHAR"
            }
        }
        ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_BLOB => {
            if binary {
                "BLOB"
            } else {
                "TEXT"
            }
        }
        #[allow(unreachable_patterns)]
        _ => "UNKNOWN",
    }
}

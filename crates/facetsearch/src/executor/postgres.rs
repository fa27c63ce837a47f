//! PostgreSQL executor over a single `tokio-postgres` connection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use crate::error::{DecodeError, SearchError, SearchResult};
use crate::expr::{Dialect, Postgres, RenderedSql, SqlParam};
use crate::record::{ColumnValue, Row};

use super::QueryExecutor;

/// Connection settings for [`PostgresExecutor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresExecutorConfig {
    /// PostgreSQL host.
    #[serde(default = "default_host")]
    pub host: String,

    /// PostgreSQL port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_dbname")]
    pub dbname: String,

    /// Database user.
    #[serde(default = "default_user")]
    pub user: String,

    /// Database password.
    #[serde(default)]
    pub password: Option<String>,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_dbname() -> String {
    "facetsearch".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for PostgresExecutorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: default_user(),
            password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl PostgresExecutorConfig {
    fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .connect_timeout(std::time::Duration::from_secs(self.connect_timeout_secs));
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

/// Executes rendered queries on one PostgreSQL connection.
pub struct PostgresExecutor {
    client: Client,
}

impl std::fmt::Debug for PostgresExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresExecutor").finish_non_exhaustive()
    }
}

impl PostgresExecutor {
    /// Connects using explicit settings.
    pub async fn connect(config: &PostgresExecutorConfig) -> SearchResult<Self> {
        debug!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "connecting to postgres"
        );
        Self::connect_with(config.to_pg_config()).await
    }

    /// Connects using a connection string (`postgres://user@host/db` or key=value form).
    pub async fn connect_url(url: &str) -> SearchResult<Self> {
        let config: tokio_postgres::Config = url
            .parse()
            .map_err(|e| SearchError::executor(format!("Invalid connection string: {}", e)))?;
        Self::connect_with(config).await
    }

    async fn connect_with(config: tokio_postgres::Config) -> SearchResult<Self> {
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| SearchError::executor(format!("Failed to connect: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });

        Ok(Self { client })
    }

    /// Wraps an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client, for setup statements.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &Postgres
    }

    async fn fetch(&self, query: &RenderedSql) -> SearchResult<Vec<Row>> {
        let params: Vec<Box<dyn ToSql + Sync + Send>> = query
            .params
            .iter()
            .map(|param| -> Box<dyn ToSql + Sync + Send> {
                match param {
                    SqlParam::Text(s) => Box::new(s.clone()),
                    SqlParam::Float(f) => Box::new(*f),
                    SqlParam::Integer(i) => Box::new(*i),
                    SqlParam::Bool(b) => Box::new(*b),
                }
            })
            .collect();

        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = self
            .client
            .query(&query.sql, &param_refs)
            .await
            .map_err(|e| SearchError::executor(format!("Failed to execute search: {}", e)))?;

        Ok(rows.iter().map(convert_row).collect::<Result<Vec<_>, _>>()?)
    }
}

fn convert_row(row: &tokio_postgres::Row) -> Result<Row, DecodeError> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = match *column.type_() {
            Type::BOOL => get::<bool>(row, idx, name)?.map(ColumnValue::Bool),
            Type::INT2 => get::<i16>(row, idx, name)?.map(|v| ColumnValue::Integer(v.into())),
            Type::INT4 => get::<i32>(row, idx, name)?.map(|v| ColumnValue::Integer(v.into())),
            Type::INT8 => get::<i64>(row, idx, name)?.map(ColumnValue::Integer),
            Type::FLOAT4 => get::<f32>(row, idx, name)?.map(|v| ColumnValue::Float(v.into())),
            Type::FLOAT8 => get::<f64>(row, idx, name)?.map(ColumnValue::Float),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                get::<String>(row, idx, name)?.map(ColumnValue::Text)
            }
            Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => {
                get::<Vec<String>>(row, idx, name)?.map(ColumnValue::TextArray)
            }
            Type::JSON | Type::JSONB => {
                get::<serde_json::Value>(row, idx, name)?.map(ColumnValue::Json)
            }
            ref other => {
                return Err(DecodeError::UnsupportedColumnType {
                    column: name.to_string(),
                    type_name: other.name().to_string(),
                });
            }
        };
        out.push(name, value.unwrap_or(ColumnValue::Null));
    }
    Ok(out)
}

fn get<'a, T: FromSql<'a>>(
    row: &'a tokio_postgres::Row,
    idx: usize,
    column: &str,
) -> Result<Option<T>, DecodeError> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|_| DecodeError::UnexpectedType {
            column: column.to_string(),
            expected: std::any::type_name::<T>(),
            found: "incompatible postgres value",
        })
}

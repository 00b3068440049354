// crates/askbridge/src/tools/database.rs
// Read-only SQL over a local SQLite file
//
// Connections come from a deadpool-sqlite pool. Every connection is switched
// to `query_only` in the post_create hook, and statements are additionally
// checked with `Statement::readonly()` before they run. A progress handler
// aborts any statement still stepping past its deadline, so a runaway query
// cannot outlive the tool call on the blocking pool.

use super::{ToolAdapter, ToolDescriptor, ToolError, ToolKind, string_arg};
use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_sqlite::{Config, Hook, HookError, Pool, Runtime};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const TOOL_NAME: &str = "database_query";

/// Per-query time limit unless the caller sets one
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// VM instructions between deadline checks
const PROGRESS_OPS: i32 = 1000;

/// Pooled read-only SQLite access
pub struct DatabasePool {
    pool: Pool,
    path: PathBuf,
}

impl DatabasePool {
    /// Build a pool for `path`. Connections open lazily, so a missing file
    /// only surfaces when a query runs.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let cfg = Config::new(path);
        let pool = cfg
            .builder(Runtime::Tokio1)
            .context("Failed to create pool builder")?
            .max_size(4)
            .post_create(make_read_only_hook())
            .build()
            .context("Failed to build connection pool")?;

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a closure on a pooled connection.
    ///
    /// Refuses to run when the file is missing; opening it would create an
    /// empty database instead of reporting the problem.
    pub async fn interact<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.connection()
            .await?
            .interact(move |conn| f(conn))
            .await
            .map_err(|e| anyhow::anyhow!("interact failed: {e}"))?
    }

    async fn connection(&self) -> Result<deadpool_sqlite::Object> {
        if !self.path.exists() {
            anyhow::bail!("database file {} not found", self.path.display());
        }
        self.pool
            .get()
            .await
            .context("Failed to get connection from pool")
    }

    /// Run one read-only statement, returning at most `max_rows` rows.
    ///
    /// The statement is interrupted once `timeout` has passed, measured from
    /// this call, and the interruption is reported as `Unavailable`.
    pub async fn query_rows(
        &self,
        sql: String,
        max_rows: usize,
        timeout: Duration,
    ) -> Result<QueryRows, ToolError> {
        let deadline = Instant::now() + timeout;
        let conn = self
            .connection()
            .await
            .map_err(|e| ToolError::unavailable(format!("{:#}", e)))?;

        conn.interact(move |conn| run_query(conn, &sql, max_rows, deadline))
            .await
            .map_err(|e| ToolError::unavailable(format!("interact failed: {e}")))?
    }

    /// Tables and columns, one line per table
    pub async fn schema_description(&self) -> Result<String> {
        self.interact(|conn| {
            let mut tables = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )?;
            let names = tables
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut columns = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
            let mut lines = Vec::with_capacity(names.len());
            for table in names {
                let cols = columns
                    .query_map([&table], |row| {
                        let name: String = row.get(0)?;
                        let ty: String = row.get(1)?;
                        Ok(if ty.is_empty() { name } else { format!("{} {}", name, ty) })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                lines.push(format!("{}({})", table, cols.join(", ")));
            }
            Ok(lines.join("\n"))
        })
        .await
    }
}

fn make_read_only_hook() -> Hook {
    Hook::async_fn(|conn, _metrics| {
        Box::pin(async move {
            conn.interact(|conn| {
                conn.execute_batch(
                    "PRAGMA query_only=ON; \
                     PRAGMA busy_timeout=5000;",
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await
            .map_err(|e| HookError::Message(format!("interact failed: {e}").into()))?
            .map_err(|e| HookError::Message(format!("connection setup failed: {e}").into()))
        })
    })
}

/// Result set of a single query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    /// More rows existed beyond the cap
    pub truncated: bool,
}

/// Leading keyword must be SELECT or WITH
pub fn check_read_only(sql: &str) -> Result<(), ToolError> {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match keyword.as_str() {
        "select" | "with" => Ok(()),
        "" => Err(ToolError::invalid("SQL query is empty")),
        other => Err(ToolError::invalid(format!(
            "only SELECT queries are allowed, got {}",
            other.to_uppercase()
        ))),
    }
}

/// True when a `;` outside string literals separates two statements
fn has_statement_separator(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, ';') => return true,
            _ => {}
        }
    }
    false
}

/// Arms the deadline on the pooled connection and always disarms it again
fn run_query(
    conn: &Connection,
    sql: &str,
    max_rows: usize,
    deadline: Instant,
) -> Result<QueryRows, ToolError> {
    conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
    let result = read_rows(conn, sql, max_rows);
    conn.progress_handler(0, None::<fn() -> bool>);
    result
}

fn read_rows(conn: &Connection, sql: &str, max_rows: usize) -> Result<QueryRows, ToolError> {
    check_read_only(sql)?;

    let sql = sql.trim().trim_end_matches(';').trim_end();
    if has_statement_separator(sql) {
        return Err(ToolError::invalid("only a single SQL statement is allowed"));
    }
    let mut stmt = conn.prepare(sql).map_err(classify_sqlite_error)?;
    if !stmt.readonly() {
        return Err(ToolError::invalid("statement would modify the database"));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([]).map_err(classify_sqlite_error)?;

    let mut out = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows.next().map_err(classify_sqlite_error)? {
        if out.len() == max_rows {
            truncated = true;
            break;
        }
        let mut obj = Map::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            let value = row.get_ref(i).map_err(classify_sqlite_error)?;
            obj.insert(name.clone(), sql_value_to_json(value));
        }
        out.push(obj);
    }

    Ok(QueryRows {
        columns,
        rows: out,
        truncated,
    })
}

fn sql_value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

/// Storage problems are transient; everything else is the query's fault
fn classify_sqlite_error(err: rusqlite::Error) -> ToolError {
    use rusqlite::ffi::ErrorCode;
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted => {
            ToolError::unavailable("query timed out and was interrupted")
        }
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::SystemIoFailure
            ) =>
        {
            ToolError::unavailable(format!("database error: {}", err))
        }
        rusqlite::Error::MultipleStatement => {
            ToolError::invalid("only a single SQL statement is allowed")
        }
        _ => ToolError::invalid(format!("SQL error: {}", err)),
    }
}

/// `database_query` tool adapter
pub struct DatabaseTool {
    pool: Arc<DatabasePool>,
    max_rows: usize,
    timeout: Duration,
    descriptor: ToolDescriptor,
}

impl DatabaseTool {
    pub fn new(pool: Arc<DatabasePool>, max_rows: usize) -> Self {
        Self {
            pool,
            max_rows: max_rows.max(1),
            timeout: DEFAULT_QUERY_TIMEOUT,
            descriptor: ToolDescriptor::new(
                TOOL_NAME,
                "Run a read-only SQL SELECT against the local SQLite database and return the rows.",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "A single SQLite SELECT statement"
                        }
                    },
                    "required": ["query"]
                }),
                ToolKind::Data,
            ),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolAdapter for DatabaseTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError> {
        let sql = string_arg(arguments, "query")
            .ok_or_else(|| ToolError::invalid("SQL query is required"))?;
        check_read_only(sql)?;

        debug!(sql = %sql, "Database query");
        let result = self
            .pool
            .query_rows(sql.to_string(), self.max_rows, self.timeout)
            .await;
        let result = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %self.pool.path().display(), error = %e, "Database query failed");
                return Err(e);
            }
        };

        if result.rows.is_empty() {
            return Err(ToolError::empty("query returned no rows"));
        }

        info!(rows = result.rows.len(), truncated = result.truncated, "Database query complete");
        Ok(json!({
            "columns": result.columns,
            "rows": result.rows,
            "row_count": result.rows.len(),
            "truncated": result.truncated,
        }))
    }

    async fn prompt_context(&self) -> Option<String> {
        match self.pool.schema_description().await {
            Ok(schema) if !schema.is_empty() => Some(format!("Database schema:\n{}", schema)),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Schema unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use tempfile::TempDir;

    fn seeded_db() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("music.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE songs (id INTEGER PRIMARY KEY, title TEXT NOT NULL, game TEXT, length REAL);
             INSERT INTO songs (title, game, length) VALUES
                ('Fighters of the Crystal', 'Final Fantasy XI', 3.5),
                ('Ronfaure', 'Final Fantasy XI', 2.75),
                ('Prelude', 'Final Fantasy', NULL);",
        )
        .unwrap();
        (dir, path)
    }

    fn tool_for(path: &Path, max_rows: usize) -> DatabaseTool {
        DatabaseTool::new(Arc::new(DatabasePool::open_read_only(path).unwrap()), max_rows)
    }

    // ============================================================================
    // Read-only checks
    // ============================================================================

    #[test]
    fn test_check_read_only() {
        assert!(check_read_only("SELECT 1").is_ok());
        assert!(check_read_only("  with t as (select 1) select * from t").is_ok());
        assert!(check_read_only("select(1)").is_ok());
        assert_eq!(
            check_read_only("DELETE FROM songs").unwrap_err().kind,
            ToolErrorKind::InvalidArguments
        );
        assert!(check_read_only("   ").is_err());
    }

    #[test]
    fn test_statement_separator() {
        assert!(has_statement_separator("SELECT 1; DROP TABLE songs"));
        assert!(!has_statement_separator("SELECT 'a;b' AS v"));
        assert!(!has_statement_separator("SELECT 1"));
    }

    #[test]
    fn test_sql_value_to_json() {
        assert_eq!(sql_value_to_json(ValueRef::Null), Value::Null);
        assert_eq!(sql_value_to_json(ValueRef::Integer(7)), json!(7));
        assert_eq!(sql_value_to_json(ValueRef::Text(b"abc")), json!("abc"));
        assert_eq!(sql_value_to_json(ValueRef::Blob(&[1, 2])), json!("<blob 2 bytes>"));
    }

    // ============================================================================
    // Queries against a seeded file
    // ============================================================================

    #[tokio::test]
    async fn test_select_rows() {
        let (_dir, path) = seeded_db();
        let tool = tool_for(&path, 200);
        let out = tool
            .invoke(&json!({"query": "SELECT title, length FROM songs WHERE game = 'Final Fantasy XI' ORDER BY id;"}))
            .await
            .unwrap();
        assert_eq!(out["row_count"], 2);
        assert_eq!(out["rows"][0]["title"], "Fighters of the Crystal");
        assert_eq!(out["rows"][0]["length"], 3.5);
        assert_eq!(out["columns"], json!(["title", "length"]));
        assert_eq!(out["truncated"], false);
    }

    #[tokio::test]
    async fn test_row_cap() {
        let (_dir, path) = seeded_db();
        let tool = tool_for(&path, 2);
        let out = tool.invoke(&json!({"query": "SELECT * FROM songs"})).await.unwrap();
        assert_eq!(out["row_count"], 2);
        assert_eq!(out["truncated"], true);
    }

    #[tokio::test]
    async fn test_zero_rows_is_empty_result() {
        let (_dir, path) = seeded_db();
        let err = tool_for(&path, 200)
            .invoke(&json!({"query": "SELECT * FROM songs WHERE title = 'AA'"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_write_rejected() {
        let (_dir, path) = seeded_db();
        let tool = tool_for(&path, 200);
        let err = tool
            .invoke(&json!({"query": "UPDATE songs SET title = 'x'"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);

        let err = tool
            .invoke(&json!({"query": "WITH t AS (SELECT 1) DELETE FROM songs"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);

        let count = tool.invoke(&json!({"query": "SELECT COUNT(*) AS n FROM songs"})).await.unwrap();
        assert_eq!(count["rows"][0]["n"], 3);
    }

    #[tokio::test]
    async fn test_multiple_statements_rejected() {
        let (_dir, path) = seeded_db();
        let err = tool_for(&path, 200)
            .invoke(&json!({"query": "SELECT 1; DROP TABLE songs"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
    }

    #[tokio::test]
    async fn test_bad_sql_is_invalid_arguments() {
        let (_dir, path) = seeded_db();
        let err = tool_for(&path, 200)
            .invoke(&json!({"query": "SELECT * FROM albums"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
        assert!(err.message.contains("albums"));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let err = tool_for(&path, 200)
            .invoke(&json!({"query": "SELECT 1"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Unavailable);
        assert!(!path.exists(), "querying must not create the file");
    }

    #[tokio::test]
    async fn test_runaway_query_interrupted() {
        let (_dir, path) = seeded_db();
        let tool = tool_for(&path, 200).with_timeout(Duration::from_millis(200));
        let endless = "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
                       SELECT count(*) FROM c";

        let err = tokio::time::timeout(Duration::from_secs(10), tool.invoke(&json!({"query": endless})))
            .await
            .expect("query was not interrupted")
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Unavailable);
        assert!(err.message.contains("timed out"), "{}", err.message);

        // Pooled connections stay usable once the deadline is cleared
        let tool = tool.with_timeout(DEFAULT_QUERY_TIMEOUT);
        for _ in 0..4 {
            let out = tool.invoke(&json!({"query": "SELECT COUNT(*) AS n FROM songs"})).await.unwrap();
            assert_eq!(out["rows"][0]["n"], 3);
        }
    }

    #[tokio::test]
    async fn test_missing_query_argument() {
        let (_dir, path) = seeded_db();
        let err = tool_for(&path, 200).invoke(&json!({})).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
    }

    // ============================================================================
    // Schema description
    // ============================================================================

    #[tokio::test]
    async fn test_prompt_context_lists_schema() {
        let (_dir, path) = seeded_db();
        let ctx = tool_for(&path, 200).prompt_context().await.unwrap();
        assert!(ctx.contains("songs(id INTEGER, title TEXT, game TEXT, length REAL)"), "{}", ctx);
    }

    #[tokio::test]
    async fn test_prompt_context_missing_db() {
        let dir = tempfile::tempdir().unwrap();
        let tool = tool_for(&dir.path().join("none.db"), 200);
        assert!(tool.prompt_context().await.is_none());
    }
}

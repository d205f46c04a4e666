use crate::error::SQLError;

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name. Returns None for NULL.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get an integer column interpreted as a boolean (0 = false).
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_i64(name).map(|i| i != 0)
    }
}

/// Statement execution against a database or an open transaction.
pub trait SQLExecutor {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;
}

/// SQLStore provides a SQL execution interface backed by a relational
/// database.
///
/// Statements issued directly on the store auto-commit. Multi-statement
/// atomic mutations go through [`SQLStore::transaction`]: the closure runs
/// against a single open transaction, which commits when the closure
/// returns `Ok` and rolls back when it returns `Err` — no partial mutation
/// is ever visible to other callers.
pub trait SQLStore: SQLExecutor + Send + Sync {
    /// Run `f` inside a transaction. Commit on `Ok`, roll back on `Err`.
    fn transaction(
        &self,
        f: &mut dyn FnMut(&dyn SQLExecutor) -> Result<(), SQLError>,
    ) -> Result<(), SQLError>;
}

//! SQLite-backed transaction store.

use super::{parse_stored_date, BusinessSnapshot, Category, TransactionRow, TransactionSource};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transacoes (
    id    INTEGER PRIMARY KEY,
    data  TEXT NOT NULL,
    valor REAL,
    tipo  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS produtos (
    id           INTEGER PRIMARY KEY,
    nome         TEXT NOT NULL,
    preco_venda  REAL NOT NULL DEFAULT 0,
    preco_compra REAL NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS itens_venda (
    id         INTEGER PRIMARY KEY,
    id_produto INTEGER NOT NULL REFERENCES produtos(id),
    quantidade INTEGER NOT NULL
);
";

const TRANSACTIONS_QUERY: &str =
    "SELECT data, valor FROM transacoes WHERE (?1 IS NULL OR tipo = ?1) ORDER BY data";

const TOP_PRODUCT_QUERY: &str = "
SELECT p.nome
FROM itens_venda i
JOIN produtos p ON p.id = i.id_produto
GROUP BY p.nome
ORDER BY SUM(i.quantidade) DESC
LIMIT 1";

const LOWEST_MARGIN_QUERY: &str = "
SELECT nome
FROM produtos
WHERE preco_venda > 0
ORDER BY (preco_venda - preco_compra) ASC
LIMIT 1";

const AVERAGE_BY_CATEGORY_QUERY: &str = "SELECT AVG(valor) FROM transacoes WHERE tipo = ?1";

/// Transaction store over a single SQLite connection.
///
/// All statements are parameterised. The connection is guarded by a
/// mutex so one store can be shared by concurrent requests.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Fresh in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ForecastError::Storage("connection lock poisoned".to_string()))
    }

    /// Insert one transaction.
    pub fn insert_transaction(&self, date: NaiveDate, amount: f64, category: Category) -> Result<()> {
        self.lock()?.execute(
            "INSERT INTO transacoes (data, valor, tipo) VALUES (?1, ?2, ?3)",
            params![date.format("%Y-%m-%d").to_string(), amount, category.as_str()],
        )?;
        Ok(())
    }

    /// Insert a product and return its id.
    pub fn insert_product(&self, name: &str, sale_price: f64, purchase_price: f64) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO produtos (nome, preco_venda, preco_compra) VALUES (?1, ?2, ?3)",
            params![name, sale_price, purchase_price],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record a sale of `quantity` units of a product.
    pub fn insert_sale_item(&self, product_id: i64, quantity: i64) -> Result<()> {
        self.lock()?.execute(
            "INSERT INTO itens_venda (id_produto, quantidade) VALUES (?1, ?2)",
            params![product_id, quantity],
        )?;
        Ok(())
    }
}

/// Amounts that are missing or not numeric count as zero.
fn coerce_amount(value: Value) -> f64 {
    match value {
        Value::Real(v) => v,
        Value::Integer(v) => v as f64,
        Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        Value::Null | Value::Blob(_) => 0.0,
    }
}

fn stored_date(value: Value) -> Result<NaiveDate> {
    match value {
        Value::Text(s) => parse_stored_date(&s),
        other => Err(ForecastError::TimestampError(format!(
            "unsupported date value {:?}",
            other
        ))),
    }
}

impl TransactionSource for SqliteStore {
    fn transactions(&self, category: Option<Category>) -> Result<Vec<TransactionRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(TRANSACTIONS_QUERY)?;
        let raw = stmt
            .query_map(params![category.map(|c| c.as_str())], |row| {
                Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(date, amount)| Ok(TransactionRow::new(stored_date(date)?, coerce_amount(amount))))
            .collect()
    }

    fn business_snapshot(&self) -> Result<BusinessSnapshot> {
        let conn = self.lock()?;

        let top_product = conn
            .query_row(TOP_PRODUCT_QUERY, [], |row| row.get::<_, String>(0))
            .optional()?;
        let lowest_margin_product = conn
            .query_row(LOWEST_MARGIN_QUERY, [], |row| row.get::<_, String>(0))
            .optional()?;

        let average = |category: Category| -> Result<f64> {
            let avg = conn.query_row(AVERAGE_BY_CATEGORY_QUERY, params![category.as_str()], |row| {
                row.get::<_, Option<f64>>(0)
            })?;
            Ok(avg.unwrap_or(0.0))
        };

        Ok(BusinessSnapshot {
            top_product,
            lowest_margin_product,
            average_revenue: average(Category::Receita)?,
            average_expense: average(Category::Despesa)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn filters_by_category() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_transaction(day(1), 100.0, Category::Receita).unwrap();
        store.insert_transaction(day(1), 40.0, Category::Despesa).unwrap();
        store.insert_transaction(day(2), 25.0, Category::Despesa).unwrap();

        let expenses = store.transactions(Some(Category::Despesa)).unwrap();
        assert_eq!(
            expenses,
            vec![TransactionRow::new(day(1), 40.0), TransactionRow::new(day(2), 25.0)]
        );
        assert_eq!(store.transactions(None).unwrap().len(), 3);
    }

    #[test]
    fn category_value_is_bound_not_interpolated() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_transaction(day(1), 10.0, Category::Receita).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO transacoes (data, valor, tipo) VALUES ('2024-06-02', 5, ?1)",
                params!["receita' OR '1'='1"],
            )
            .unwrap();
        }
        assert_eq!(store.transactions(Some(Category::Receita)).unwrap().len(), 1);
    }

    #[test]
    fn non_numeric_amounts_coerce_to_zero() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute_batch(
                "INSERT INTO transacoes (data, valor, tipo) VALUES ('2024-06-01', 'abc', 'receita');
                 INSERT INTO transacoes (data, valor, tipo) VALUES ('2024-06-02', NULL, 'receita');
                 INSERT INTO transacoes (data, valor, tipo) VALUES ('2024-06-03 10:00:00', '12.5', 'receita');",
            )
            .unwrap();
        }
        let rows = store.transactions(Some(Category::Receita)).unwrap();
        let amounts: Vec<f64> = rows.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![0.0, 0.0, 12.5]);
        assert_eq!(rows[2].date, day(3));
    }

    #[test]
    fn malformed_dates_are_reported() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute_batch(
                "INSERT INTO transacoes (data, valor, tipo) VALUES ('ontem', 3, 'despesa');",
            )
            .unwrap();
        }
        assert!(matches!(
            store.transactions(None),
            Err(ForecastError::TimestampError(_))
        ));
    }

    #[test]
    fn snapshot_of_empty_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        let snapshot = store.business_snapshot().unwrap();
        assert_eq!(snapshot, BusinessSnapshot::default());
    }

    #[test]
    fn snapshot_reports_products_and_averages() {
        let store = SqliteStore::open_in_memory().unwrap();
        let cafe = store.insert_product("Café", 8.0, 3.0).unwrap();
        let pao = store.insert_product("Pão", 1.0, 0.8).unwrap();
        store.insert_product("Brinde", 0.0, 2.0).unwrap();
        store.insert_sale_item(cafe, 10).unwrap();
        store.insert_sale_item(pao, 4).unwrap();
        store.insert_sale_item(pao, 3).unwrap();

        store.insert_transaction(day(1), 100.0, Category::Receita).unwrap();
        store.insert_transaction(day(2), 200.0, Category::Receita).unwrap();
        store.insert_transaction(day(2), 30.0, Category::Despesa).unwrap();

        let snapshot = store.business_snapshot().unwrap();
        assert_eq!(snapshot.top_product.as_deref(), Some("Café"));
        assert_eq!(snapshot.lowest_margin_product.as_deref(), Some("Pão"));
        assert_relative_eq!(snapshot.average_revenue, 150.0);
        assert_relative_eq!(snapshot.average_expense, 30.0);
    }
}

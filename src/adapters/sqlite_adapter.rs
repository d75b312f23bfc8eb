//! SQLite price adapter.
//!
//! Schema: `instrument(name)` lists the universe, `price(instrument,
//! daily_date, close)` holds one close per instrument and day.

use crate::domain::error::DipbuyerError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSeriesProvider;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_error(e: rusqlite::Error) -> DipbuyerError {
    DipbuyerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DipbuyerError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| DipbuyerError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| DipbuyerError::DataUnavailable {
                    reason: format!("cannot open {}: {}", db_path, e),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, DipbuyerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| DipbuyerError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, DipbuyerError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| DipbuyerError::DataUnavailable {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), DipbuyerError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS instrument (
                name TEXT PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS price (
                instrument TEXT NOT NULL,
                daily_date TEXT NOT NULL,
                close REAL NOT NULL,
                PRIMARY KEY (instrument, daily_date)
            );
            CREATE INDEX IF NOT EXISTS idx_price_instrument ON price(instrument);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Registers the instrument and upserts its closes in one transaction.
    pub fn insert_prices(&self, series: &PriceSeries) -> Result<(), DipbuyerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        tx.execute(
            "INSERT OR IGNORE INTO instrument (name) VALUES (?1)",
            params![series.instrument()],
        )
        .map_err(query_error)?;

        for point in series.points() {
            tx.execute(
                "INSERT OR REPLACE INTO price (instrument, daily_date, close)
                 VALUES (?1, ?2, ?3)",
                params![
                    series.instrument(),
                    point.date.format(DATE_FORMAT).to_string(),
                    point.close
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }
}

impl PriceSeriesProvider for SqliteAdapter {
    fn list_instruments(&self) -> Result<Vec<String>, DipbuyerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name FROM instrument ORDER BY name")
            .map_err(|e| DipbuyerError::DataUnavailable {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_error)?;

        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(row.map_err(query_error)?);
        }

        Ok(instruments)
    }

    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, DipbuyerError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT daily_date, close FROM price
                 WHERE instrument = ?1
                 ORDER BY daily_date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![instrument], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PricePoint {
                    date,
                    close: row.get(1)?,
                })
            })
            .map_err(query_error)?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(query_error)?);
        }

        PriceSeries::new(instrument, points)
    }
}

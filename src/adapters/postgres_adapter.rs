//! PostgreSQL price adapter.
//!
//! `ticker(name)` lists the universe; each instrument's closes live in a
//! table of its own with `(daily_date, close)` columns.

use crate::domain::error::DipbuyerError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSeriesProvider;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use r2d2_postgres::postgres::{Config, NoTls};

type Manager = PostgresConnectionManager<NoTls>;

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

/// Unquoted identifiers fold to lower case in PostgreSQL, so table names are
/// lower-cased before quoting. Only `[A-Za-z0-9_]` is accepted.
pub fn price_table_name(instrument: &str) -> Result<String, DipbuyerError> {
    let valid = !instrument.is_empty()
        && !instrument.starts_with(|c: char| c.is_ascii_digit())
        && instrument
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(DipbuyerError::DatabaseQuery {
            reason: format!("'{}' is not a valid table identifier", instrument),
        });
    }
    Ok(instrument.to_ascii_lowercase())
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DipbuyerError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| DipbuyerError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pg_config: Config = connection_string
            .parse()
            .map_err(|e| DipbuyerError::ConfigInvalid {
                section: "postgres".into(),
                key: "connection_string".into(),
                reason: format!("{}", e),
            })?;
        let pool_size = config.get_int("postgres", "pool_size", 4).max(1) as u32;

        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| DipbuyerError::DataUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, DipbuyerError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| DipbuyerError::DataUnavailable {
                reason: e.to_string(),
            })
    }
}

impl PriceSeriesProvider for PostgresAdapter {
    fn list_instruments(&self) -> Result<Vec<String>, DipbuyerError> {
        let rows = self
            .conn()?
            .query("SELECT name FROM ticker ORDER BY name", &[])
            .map_err(|e| DipbuyerError::DataUnavailable {
                reason: e.to_string(),
            })?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn fetch_series(&self, instrument: &str) -> Result<PriceSeries, DipbuyerError> {
        let table = price_table_name(instrument)?;
        let mut conn = self.conn()?;

        let exists: bool = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
                &[&table],
            )
            .map_err(|e| DipbuyerError::DatabaseQuery {
                reason: e.to_string(),
            })?
            .get(0);
        if !exists {
            return Ok(PriceSeries::empty(instrument));
        }

        let query = format!(
            "SELECT daily_date::date, close::double precision FROM \"{}\" ORDER BY daily_date ASC",
            table
        );
        let rows = conn
            .query(query.as_str(), &[])
            .map_err(|e| DipbuyerError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let points = rows
            .into_iter()
            .map(|row| {
                let date: NaiveDate = row.get(0);
                PricePoint {
                    date,
                    close: row.get(1),
                }
            })
            .collect();

        PriceSeries::new(instrument, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_connection_string() {
        let result = PostgresAdapter::from_config(&EmptyConfig);
        match result {
            Err(DipbuyerError::ConfigMissing { section, key }) => {
                assert_eq!(section, "postgres");
                assert_eq!(key, "connection_string");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn table_name_is_lowercased() {
        assert_eq!(price_table_name("EURUSD").unwrap(), "eurusd");
        assert_eq!(price_table_name("btc_usd").unwrap(), "btc_usd");
    }

    #[test]
    fn table_name_rejects_injection() {
        assert!(price_table_name("eurusd; DROP TABLE ticker").is_err());
        assert!(price_table_name("a\"b").is_err());
        assert!(price_table_name("").is_err());
        assert!(price_table_name("1abc").is_err());
    }
}

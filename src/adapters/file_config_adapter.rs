//! INI file configuration adapter.
//!
//! Values come straight from `configparser`; anything that fails to parse
//! falls back to the caller's default.

use crate::domain::error::DipbuyerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DipbuyerError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| DipbuyerError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, DipbuyerError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| DipbuyerError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_optional_double(section, key).unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .getboolcoerce(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_optional_double(&self, section: &str, key: &str) -> Option<f64> {
        self.ini.getfloat(section, key).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
source = csv
path = ./data/prices

[strategy]
initial_capital = 20000
cooling_period_days = 7
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "source"), Some("csv".to_string()));
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("./data/prices".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nlookahead_days = 36\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "lookahead_days", 0), 36);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nlookahead_days = abc\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "lookahead_days", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\npip_value = 0.0001\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "pip_value", 0.0), 0.0001);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\ninitial_capital = plenty\n").unwrap();
        assert_eq!(
            adapter.get_double("strategy", "initial_capital", 99.9),
            99.9
        );
    }

    #[test]
    fn get_optional_double_distinguishes_missing() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nmin_cumulative_drop_pct = 1.5\n").unwrap();
        assert_eq!(
            adapter.get_optional_double("strategy", "min_cumulative_drop_pct"),
            Some(1.5)
        );
        assert_eq!(adapter.get_optional_double("strategy", "stop_loss_pct"), None);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("backtest", "a", false));
        assert!(adapter.get_bool("backtest", "b", false));
        assert!(adapter.get_bool("backtest", "c", false));
        assert!(!adapter.get_bool("backtest", "d", true));
        assert!(!adapter.get_bool("backtest", "e", true));
        assert!(!adapter.get_bool("backtest", "f", true));
    }

    #[test]
    fn get_bool_accepts_on_off_and_ignores_junk() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\na = on\nb = off\nc = maybe\n").unwrap();
        assert!(adapter.get_bool("backtest", "a", false));
        assert!(!adapter.get_bool("backtest", "b", true));
        assert!(adapter.get_bool("backtest", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert!(adapter.get_bool("backtest", "parallel", true));
        assert!(!adapter.get_bool("backtest", "parallel", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\nsummary_path = out/summary.csv\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "summary_path"),
            Some("out/summary.csv".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(
            result,
            Err(DipbuyerError::ConfigParse { file, .. }) if file.contains("config.ini")
        ));
    }
}

//! CLI integration tests: config loading, settings parsing and command
//! dispatch with real INI and CSV files on disk.

mod common;

use common::*;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tradefuse::adapters::file_config_adapter::FileConfigAdapter;
use tradefuse::cli::{self, Cli, Command};
use tradefuse::domain::settings::EngineSettings;
use tradefuse::ports::config_port::ConfigPort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_bars_csv(dir: &std::path::Path, symbol: &str, bars: &[OhlcvBar]) {
    let mut file = std::fs::File::create(dir.join(format!("{symbol}_1h.csv"))).unwrap();
    writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
}

fn exit_code_eq(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

const VALID_INI: &str = r#"
[engine]
min_bars = 120
rsi_overbought = 70.0
rsi_oversold = 30.0
adx_trend_threshold = 25.0
lookback_period = 20

[executor]
min_order_amount = 5000
quote_currency = KRW

[paper]
quote_balance = 1000000
"#;

mod config_loading {
    use super::*;

    #[test]
    fn load_config_reads_ini_from_disk() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(&file.path().to_path_buf()).unwrap();
        assert_eq!(
            adapter.get_string("executor", "quote_currency"),
            Some("KRW".to_string())
        );
    }

    #[test]
    fn load_config_missing_file_fails() {
        assert!(cli::load_config(&PathBuf::from("/nonexistent/engine.ini")).is_err());
    }

    #[test]
    fn settings_come_from_the_ini() {
        let adapter = FileConfigAdapter::from_string(
            "[engine]\nmin_bars = 150\nrsi_overbought = 75.0\n[executor]\nmin_order_amount = 6000\n",
        )
        .unwrap();
        let settings = EngineSettings::from_config(&adapter).unwrap();
        assert_eq!(settings.min_bars, 150);
        assert_eq!(settings.rsi_overbought, 75.0);
        assert_eq!(settings.min_order_amount, 6000.0);
        // untouched keys keep their defaults
        assert_eq!(settings.lookback_period, 20);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let adapter = FileConfigAdapter::from_string(
            "[engine]\nrsi_overbought = 20.0\nrsi_oversold = 60.0\n",
        )
        .unwrap();
        assert!(EngineSettings::from_config(&adapter).is_err());
    }
}

mod command_dispatch {
    use super::*;

    #[test]
    fn analyze_runs_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BTC", &trending_bars("BTC", 150, 100.0, 1.5));
        let config = write_temp_ini(VALID_INI);

        let code = cli::run(Cli {
            command: Command::Analyze {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
                benchmark: None,
            },
        });
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
    }

    #[test]
    fn analyze_with_benchmark_runs() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BTC", &trending_bars("BTC", 150, 100.0, 1.5));
        write_bars_csv(dir.path(), "ETH", &trending_bars("ETH", 150, 50.0, 0.5));
        let config = write_temp_ini(VALID_INI);

        let code = cli::run(Cli {
            command: Command::Analyze {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
                benchmark: Some("ETH".into()),
            },
        });
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
    }

    #[test]
    fn monitor_reports_on_real_files() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BTC", &ranging_bars("BTC", 150, 100.0));
        let config = write_temp_ini(VALID_INI);

        let code = cli::run(Cli {
            command: Command::Monitor {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
                strategies: Some("PULLBACK,OVERSOLD,unknown".into()),
            },
        });
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
    }

    #[test]
    fn monitor_short_series_exits_with_data_error() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BTC", &trending_bars("BTC", 30, 100.0, 1.0));
        let config = write_temp_ini(VALID_INI);

        let code = cli::run(Cli {
            command: Command::Monitor {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
                strategies: None,
            },
        });
        assert!(exit_code_eq(code, ExitCode::from(5)));
    }

    #[test]
    fn execute_records_into_the_configured_ledger() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BTC", &trending_bars("BTC", 200, 100.0, 2.0));
        let db_path = dir.path().join("trades.db");
        let config = write_temp_ini(&format!(
            "{VALID_INI}\n[ledger]\npath = {}\n",
            db_path.display()
        ));

        let code = cli::run(Cli {
            command: Command::Execute {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
            },
        });
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
        assert!(db_path.exists());

        // history over the same ledger sees the row
        let code = cli::run(Cli {
            command: Command::History {
                config: config.path().to_path_buf(),
                symbol: "BTC".into(),
                limit: 5,
            },
        });
        assert!(exit_code_eq(code, ExitCode::SUCCESS));
    }

    #[test]
    fn execute_without_ledger_config_fails_with_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        write_bars_csv(dir.path(), "BTC", &trending_bars("BTC", 200, 100.0, 2.0));
        let config = write_temp_ini(VALID_INI);

        let code = cli::run(Cli {
            command: Command::Execute {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
            },
        });
        assert!(exit_code_eq(code, ExitCode::from(2)));
    }

    #[test]
    fn missing_data_file_exits_with_market_data_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = write_temp_ini(VALID_INI);

        let code = cli::run(Cli {
            command: Command::Analyze {
                config: config.path().to_path_buf(),
                data_dir: dir.path().to_path_buf(),
                symbol: "BTC".into(),
                interval: "1h".into(),
                benchmark: None,
            },
        });
        assert!(exit_code_eq(code, ExitCode::from(4)));
    }
}

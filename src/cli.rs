//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_market_data::CsvMarketData;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_exchange::PaperExchange;
use crate::adapters::sqlite_ledger::SqliteLedger;
use crate::domain::combiner::Direction;
use crate::domain::error::TradefuseError;
use crate::domain::executor::{TradeDecision, TradeExecutor};
use crate::domain::monitor::{TriggerMonitor, TriggerReport};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::settings::EngineSettings;
use crate::domain::strategy::StrategyKind;
use crate::domain::trade::{OrderRequest, OrderSide, OrderType, TradeAction};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "tradefuse", about = "Signal fusion and trade execution engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators and the fused signal for a symbol
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1h")]
        interval: String,
        /// Benchmark symbol for relative strength
        #[arg(long)]
        benchmark: Option<String>,
    },
    /// Run one monitoring cycle and print the trigger report
    Monitor {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1h")]
        interval: String,
        /// Comma-separated strategy names; unknown names are skipped
        #[arg(long)]
        strategies: Option<String>,
    },
    /// Run one monitoring cycle and execute its call on the paper exchange
    Execute {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data_dir: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1h")]
        interval: String,
    },
    /// Show recent ledger rows for a symbol
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            data_dir,
            symbol,
            interval,
            benchmark,
        } => run_analyze(&config, &data_dir, &symbol, &interval, benchmark.as_deref()),
        Command::Monitor {
            config,
            data_dir,
            symbol,
            interval,
            strategies,
        } => run_monitor(&config, &data_dir, &symbol, &interval, strategies.as_deref()),
        Command::Execute {
            config,
            data_dir,
            symbol,
            interval,
        } => run_execute(&config, &data_dir, &symbol, &interval),
        Command::History {
            config,
            symbol,
            limit,
        } => run_history(&config, &symbol, limit),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradefuseError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn load_settings(adapter: &dyn ConfigPort) -> Result<EngineSettings, ExitCode> {
    EngineSettings::from_config(adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fetch_bars(
    data_dir: &PathBuf,
    symbol: &str,
    interval: &str,
) -> Result<Vec<OhlcvBar>, ExitCode> {
    let market = CsvMarketData::new(data_dir.clone());
    market.fetch_ohlcv(symbol, interval, 0).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_analyze(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    symbol: &str,
    interval: &str,
    benchmark: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let bars = match fetch_bars(data_dir, symbol, interval) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let benchmark_bars = match benchmark {
        Some(bench) => match fetch_bars(data_dir, bench, interval) {
            Ok(b) => Some(b),
            Err(code) => return code,
        },
        None => None,
    };

    let table = match crate::domain::indicator::compute(&bars, benchmark_bars.as_deref(), &settings)
    {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    println!("{symbol} {interval}: {} bars", bars.len());
    if let Some(row) = table.latest() {
        let fmt = |v: Option<f64>| match v {
            Some(v) => format!("{v:.4}"),
            None => "-".into(),
        };
        println!("  ma 9/21/120   {} / {} / {}", fmt(row.ma_short), fmt(row.ma_mid), fmt(row.ma_long));
        println!("  rsi 14/5      {} / {}", fmt(row.rsi), fmt(row.rsi_fast));
        println!("  macd/sig/hist {} / {} / {}", fmt(row.macd), fmt(row.macd_signal), fmt(row.macd_histogram));
        println!("  bollinger     {} / {} / {}", fmt(row.bb_upper), fmt(row.bb_middle), fmt(row.bb_lower));
        println!("  atr/adx       {} / {}", fmt(row.atr), fmt(row.adx));
        println!("  stoch k/d     {} / {}", fmt(row.stoch_k), fmt(row.stoch_d));
        println!("  donchian      {} / {}", fmt(row.donchian_upper), fmt(row.donchian_lower));
        println!("  vwap          {}", fmt(row.vwap));
        println!("  roc 1/5       {} / {}", fmt(row.roc_short), fmt(row.roc_long));
        println!("  volume avg/z  {} / {}", fmt(row.volume_avg), fmt(row.volume_z));
        println!("  rel strength  {}", fmt(row.relative_strength));
    }

    let fused = crate::domain::combiner::fuse(&bars, &table, &settings);
    println!("regime: {:?}", fused.regime);
    println!(
        "fused: {} (confidence {:.2}, score {:+.3})",
        direction_label(fused.direction),
        fused.confidence,
        fused.total_score
    );
    for opinion in &fused.opinions {
        println!("  - {opinion}");
    }

    let adx = table.latest().and_then(|r| r.adx);
    match crate::domain::levels::predict_direction_using_levels(&bars, adx, &settings) {
        Ok(prediction) => {
            println!(
                "levels: {} (confidence {:.2}, score {:+.3}, nearest {} at {:.2})",
                direction_label(prediction.prediction),
                prediction.confidence,
                prediction.score,
                prediction.closest_level,
                prediction.closest_value
            );
            for opinion in &prediction.opinions {
                println!("  - {opinion}");
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    }

    ExitCode::SUCCESS
}

fn run_monitor(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    symbol: &str,
    interval: &str,
    strategies: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let bars = match fetch_bars(data_dir, symbol, interval) {
        Ok(b) => b,
        Err(code) => return code,
    };

    let kinds = match strategies {
        Some(names) => StrategyKind::parse_list(names),
        None => StrategyKind::ALL.to_vec(),
    };

    let monitor = TriggerMonitor::new(&settings);
    match monitor.run(&bars, None, &kinds) {
        Ok(report) => {
            print_report(symbol, &report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn print_report(symbol: &str, report: &TriggerReport) {
    println!(
        "{symbol}: {} (combined score {:+.3})",
        direction_label(report.signal),
        report.combined_score
    );
    println!(
        "  fused {} ({:.2}) | levels {} ({:.2})",
        direction_label(report.fused.direction),
        report.fused.confidence,
        direction_label(report.prediction.prediction),
        report.prediction.confidence
    );
    for signal in &report.strategy_signals {
        let mark = if signal.triggered { "*" } else { " " };
        println!("  {mark} {} - {}", signal.strategy, signal.description);
    }
}

fn run_execute(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    symbol: &str,
    interval: &str,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let bars = match fetch_bars(data_dir, symbol, interval) {
        Ok(b) => b,
        Err(code) => return code,
    };
    let Some(last) = bars.last() else {
        let err = TradefuseError::MarketData {
            reason: format!("no bars for {symbol}"),
        };
        eprintln!("error: {err}");
        return ExitCode::from(&err);
    };
    let price = last.close;

    let monitor = TriggerMonitor::new(&settings);
    let report = match monitor.run(&bars, None, &StrategyKind::ALL) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    print_report(symbol, &report);

    let ledger = match SqliteLedger::from_config(&adapter) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    if let Err(e) = ledger.initialize_schema() {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }

    let exchange = paper_exchange_from_config(&adapter, &settings, symbol, price);
    let decision = decision_from_report(&report, &exchange, &settings, symbol);

    let executor = TradeExecutor::new(&exchange, &ledger, &settings);
    match executor.execute(symbol, price, &decision, Utc::now().naive_utc()) {
        Ok(outcome) => {
            println!(
                "executed: {} {} (trade #{}) - {}",
                outcome.action, outcome.status, outcome.trade_id, outcome.reason
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn paper_exchange_from_config(
    adapter: &dyn ConfigPort,
    settings: &EngineSettings,
    symbol: &str,
    price: f64,
) -> PaperExchange {
    let exchange = PaperExchange::new();
    let quote_balance = adapter.get_double("paper", "quote_balance", 1_000_000.0);
    let base_balance = adapter.get_double("paper", "base_balance", 0.0);
    let base_average_price = adapter.get_double("paper", "base_average_price", 0.0);

    exchange.deposit(&settings.quote_currency, quote_balance, 0.0);
    if base_balance > 0.0 {
        exchange.deposit(symbol, base_balance, base_average_price);
    }
    exchange.set_mark_price(symbol, price);
    exchange
}

fn decision_from_report(
    report: &TriggerReport,
    exchange: &PaperExchange,
    settings: &EngineSettings,
    symbol: &str,
) -> TradeDecision {
    let reasons = report.fused.opinions.join(" | ");
    match report.signal {
        Some(Direction::Buy) => {
            let available = exchange.balance_of(&settings.quote_currency).available;
            TradeDecision {
                action: TradeAction::Buy,
                reason: reasons,
                order: Some(OrderRequest {
                    side: OrderSide::Buy,
                    quote_currency: settings.quote_currency.clone(),
                    target_currency: symbol.into(),
                    order_type: OrderType::Market,
                    price: None,
                    quantity: None,
                    amount: Some(available),
                    trigger_price: None,
                    order_id: None,
                }),
            }
        }
        Some(Direction::Sell) => {
            let quantity = exchange.balance_of(symbol).available;
            TradeDecision {
                action: TradeAction::Sell,
                reason: reasons,
                order: (quantity > 0.0).then(|| OrderRequest {
                    side: OrderSide::Sell,
                    quote_currency: settings.quote_currency.clone(),
                    target_currency: symbol.into(),
                    order_type: OrderType::Market,
                    price: None,
                    quantity: Some(quantity),
                    amount: None,
                    trigger_price: None,
                    order_id: None,
                }),
            }
        }
        None => TradeDecision {
            action: TradeAction::Hold,
            reason: reasons,
            order: None,
        },
    }
}

fn run_history(config_path: &PathBuf, symbol: &str, limit: usize) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let ledger = match SqliteLedger::from_config(&adapter) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };
    if let Err(e) = ledger.initialize_schema() {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }

    match ledger.recent_trades(symbol, limit) {
        Ok(trades) => {
            if trades.is_empty() {
                println!("no trades recorded for {symbol}");
            }
            for stored in trades {
                let t = &stored.trade;
                println!(
                    "#{} {} {} {} {:.2} [{}] {}",
                    stored.id, t.timestamp, t.symbol, t.action, t.amount, t.status, t.action_string
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn direction_label(direction: Option<Direction>) -> &'static str {
    match direction {
        Some(Direction::Buy) => "BUY",
        Some(Direction::Sell) => "SELL",
        None => "HOLD",
    }
}

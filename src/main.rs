use anyhow::Context;
use clap::Parser;
use compute::aggregate_amount;
use log::warn;
use read::{load, resolve_inputs, InputSpec};
use std::path::{Path, PathBuf};
use write::{amount_chart, balance_chart, Chart, ChartSink, CsvChartSink};

mod compute;
mod data;
mod read;
mod write;

/// Net gain/loss and time series of bank statement exports
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Statement CSV files, or a single glob pattern such as 'statements/*.csv'
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Write the balance-over-time series as CSV to this file ('-' for stdout)
    #[arg(long)]
    balance_chart: Option<PathBuf>,
    /// Write the transaction-amounts series as CSV to this file ('-' for stdout)
    #[arg(long)]
    amount_chart: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let paths = resolve_inputs(&InputSpec::from_args(args.inputs))?;
    let records = load(&paths)?;
    if records.is_empty() {
        warn!("No transactions in {} statement(s)", paths.len());
    }
    let net = aggregate_amount(&records)?;
    println!("Net Gain/Loss: {net}");

    if let Some(out) = &args.balance_chart {
        draw_to(out, &balance_chart(&records)?)?;
    }
    if let Some(out) = &args.amount_chart {
        draw_to(out, &amount_chart(&records)?)?;
    }
    Ok(())
}

fn draw_to(out: &Path, chart: &Chart) -> Result<(), anyhow::Error> {
    if out == Path::new("-") {
        let mut sink = CsvChartSink::new(std::io::stdout());
        sink.draw(chart)?;
        sink.finish()?;
    } else {
        let file = std::fs::File::create(out)
            .with_context(|| format!("creating {}", out.display()))?;
        let mut sink = CsvChartSink::new(file);
        sink.draw(chart)?;
        sink.finish()?;
    }
    Ok(())
}

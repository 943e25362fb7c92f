use config::{Config, DEFAULT_CONFIG_FILE};
use rental::{AppState, Dashboard, RentalTable};
use ui::data::{metric_rows, Data};
use ui::tui::ViewOptions;

use chrono::NaiveDate;
use clap::builder::PossibleValuesParser;
use clap::Parser;
use csv::Writer;
use env_logger::Env;
use polars::prelude::*;
use std::path::PathBuf;
use std::{error::Error, fs::File, path::Path};

use log::{debug, error, info};

/// Write a csv file with the csv crate.
///
/// # Arguments
/// * `filename` - target file
/// * `header` - csv header
/// * `data` - csv rows
pub fn write_csv<P: AsRef<Path>>(
    filename: P,
    header: Vec<String>,
    data: Vec<Vec<String>>,
) -> Result<(), Box<dyn Error>> {
    let file = File::create(&filename)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(header)?;

    for record in data {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    info!("CSV file written successfully: {:?}", filename.as_ref());

    Ok(())
}

enum OutputType {
    Csv,
    Table,
    Polar,
    Json,
}

impl OutputType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(OutputType::Csv),
            "table" => Some(OutputType::Table),
            "polar" => Some(OutputType::Polar),
            "json" => Some(OutputType::Json),
            _ => None,
        }
    }
}

trait Output {
    fn output(&self) -> Result<(), Box<dyn Error>>;
}

struct PolarOutput {
    dashboard: Dashboard,
    metrics: Vec<Data>,
}

impl PolarOutput {
    fn new(dashboard: Dashboard, metrics: Vec<Data>) -> Self {
        PolarOutput { dashboard, metrics }
    }
}

impl Output for PolarOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        println!("range: {}", self.dashboard.range);
        for m in &self.metrics {
            println!("{} | {}: {}", m.section(), m.metric(), m.value());
        }
        for (name, df) in self.dashboard.frames()? {
            println!("\n{}\n{}", name, df);
        }
        Ok(())
    }
}

struct CsvOutput {
    dir: PathBuf,
    dashboard: Dashboard,
    metrics: Vec<Data>,
}

impl CsvOutput {
    fn new(dir: PathBuf, dashboard: Dashboard, metrics: Vec<Data>) -> Self {
        CsvOutput {
            dir,
            dashboard,
            metrics,
        }
    }
}

impl Output for CsvOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        std::fs::create_dir_all(&self.dir)?;
        for (name, mut df) in self.dashboard.frames()? {
            let path = self.dir.join(format!("{}.csv", name));
            let mut file = File::create(&path)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
            debug!("wrote {:?}", path);
        }
        let header = vec!["section".to_string(), "metric".to_string(), "value".to_string()];
        let rows = self
            .metrics
            .iter()
            .map(|m| m.ref_array().map(|s| s.to_string()).to_vec())
            .collect();
        write_csv(self.dir.join("metrics.csv"), header, rows)
    }
}

struct JsonOutput {
    dashboard: Dashboard,
}

impl Output for JsonOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        let stdout = std::io::stdout();
        serde_json::to_writer_pretty(stdout.lock(), &self.dashboard)?;
        println!();
        Ok(())
    }
}

struct TableOutput {
    state: AppState,
    options: ViewOptions,
}

impl Output for TableOutput {
    fn output(&self) -> Result<(), Box<dyn Error>> {
        ui::tui::run(self.state.clone(), self.options.clone())
    }
}

/// Bike rental dashboard over a daily rentals csv
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(
        short = 'F',
        long = "format",
        value_parser = PossibleValuesParser::new(["csv", "table", "polar", "json"]),
        default_value = "polar",
        help = "output format"
    )]
    format: String,

    #[arg(long = "source", help = "daily rentals csv, overrides `source` in the config file")]
    source: Option<String>,

    #[arg(long = "config", default_value = DEFAULT_CONFIG_FILE, help = "config file")]
    config: String,

    #[arg(
        long = "output-dir",
        default_value = "report",
        help = "directory for --format csv"
    )]
    output_dir: PathBuf,

    /// since date
    #[arg(long = "since", value_parser = parse_date, help = "since date, e.g. 2011-01-01")]
    since: Option<NaiveDate>,

    /// until date
    #[arg(long = "until", value_parser = parse_date, help = "until date, e.g. 2012-12-31")]
    until: Option<NaiveDate>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        error!("parse date err: {}", e);
        format!("invalid date `{}`, expected YYYY-MM-DD", s)
    })
}

fn get_output(
    output_type: OutputType,
    args: &Args,
    conf: &Config,
    state: AppState,
) -> Result<Box<dyn Output>, Box<dyn Error>> {
    let snapshot = |state: &AppState| -> Result<(Dashboard, Vec<Data>), Box<dyn Error>> {
        let dashboard = Dashboard::compute(state, conf.histogram_bins)?;
        let metrics = metric_rows(&dashboard, &conf.currency);
        Ok((dashboard, metrics))
    };
    let output: Box<dyn Output> = match output_type {
        OutputType::Table => Box::new(TableOutput {
            state,
            options: ViewOptions {
                histogram_bins: conf.histogram_bins,
                currency: conf.currency.clone(),
            },
        }),
        OutputType::Csv => {
            let (dashboard, metrics) = snapshot(&state)?;
            Box::new(CsvOutput::new(args.output_dir.clone(), dashboard, metrics))
        }
        OutputType::Polar => {
            let (dashboard, metrics) = snapshot(&state)?;
            Box::new(PolarOutput::new(dashboard, metrics))
        }
        OutputType::Json => {
            let (dashboard, _) = snapshot(&state)?;
            Box::new(JsonOutput { dashboard })
        }
    };
    Ok(output)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let conf = Config::load(&args.config)?;
    debug!("config: {:?}", conf);

    let source = args.source.clone().unwrap_or_else(|| conf.source.clone());
    let table = RentalTable::from_path(&source)?;
    let state = AppState::with_bounds(table, args.since, args.until);
    info!("range: {}", state.range());

    let out_type = OutputType::from_str(args.format.as_str())
        .ok_or_else(|| format!("unknown output format: {}", args.format))?;
    get_output(out_type, &args, &conf, state)?.output()
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_days() {
        assert_eq!(
            parse_date("2011-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2011, 1, 31).unwrap()
        );
        assert!(parse_date("31/01/2011").is_err());
    }

    #[test]
    fn args_parse_range_and_format() {
        let args = Args::parse_from([
            "bike-stat",
            "-F",
            "csv",
            "--since",
            "2011-02-01",
            "--output-dir",
            "out",
        ]);
        assert_eq!(args.format, "csv");
        assert_eq!(args.since, NaiveDate::from_ymd_opt(2011, 2, 1));
        assert_eq!(args.until, None);
        assert_eq!(args.config, DEFAULT_CONFIG_FILE);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(Args::try_parse_from(["bike-stat", "-F", "xml"]).is_err());
    }
}

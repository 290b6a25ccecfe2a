//! CLI entry point for the travel-survey analysis tool.
//!
//! Every subcommand reads a survey CSV (local file or URL, optionally
//! gzipped), classifies its trips with the built-in or overridden mapping
//! tables, and writes CSV tables plus a JSON report.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transod_analysis::analyzers::chisquare::{chi_square, period_residuals};
use transod_analysis::analyzers::contingency::{CategoryOrder, Normalize, code_crosstab, crosstab};
use transod_analysis::analyzers::flows::build_flows;
use transod_analysis::analyzers::hourly::{counts_by_clock_hour, share_by_hour, totals_by_hour};
use transod_analysis::analyzers::summary::{summarize, sustainable_table};
use transod_analysis::analyzers::types::{
    ChiSquareReport, HourTotal, PeriodReport, SummaryRow, TablesReport, ZoneReport,
};
use transod_analysis::analyzers::zones::{correlations, linear_regression, zone_profiles};
use transod_analysis::classify::catalog::{DOWNTOWN_ZONE, VALID_MODE_CODES, valid_origin_zones};
use transod_analysis::classify::{Catalog, ClassifiedTrip};
use transod_analysis::fetch::load_source;
use transod_analysis::output::{
    ensure_dir, print_json, print_pretty, write_json, write_rows, write_table,
};
use transod_analysis::survey::reader::{DEPART_TIME, MODE_PRIMARY, ORIGIN_ZONE, TRIP_PURPOSE};
use transod_analysis::survey::{TripRecord, filter_rows, read_trips};

#[derive(Parser)]
#[command(name = "transod_analysis")]
#[command(
    about = "Modal-share analysis of origin-destination travel survey trips",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Survey CSV file or URL to fetch
    #[arg(short, long, value_name = "FILE_OR_URL")]
    input: String,

    /// JSON file replacing some or all of the built-in mapping tables
    #[arg(short, long)]
    mappings: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Valid primary mode codes, on `modeprimary`
    Modes,
    /// The 26 report zones, on `originreportzone`
    OriginZones,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep only the rows whose column value is a valid code
    Filter {
        /// Survey CSV file or URL to fetch
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: String,

        /// CSV file to write the kept rows to
        #[arg(short, long)]
        output: String,

        /// Column to test (defaults to the preset's column)
        #[arg(short, long)]
        column: Option<String>,

        /// Codes to keep, comma separated (overrides the preset's codes)
        #[arg(long, value_delimiter = ',')]
        values: Vec<i64>,

        /// Built-in column and code list
        #[arg(short, long, value_enum)]
        preset: Option<Preset>,
    },
    /// Sector × mode frequency, percentage, sustainability and summary tables
    Tables {
        #[command(flatten)]
        source: Source,

        /// Directory to write the tables to
        #[arg(short = 'd', long, default_value = "results/tables")]
        output_dir: String,
    },
    /// Chi-square test of sector × mode with standardized residuals
    ChiSquare {
        #[command(flatten)]
        source: Source,

        /// Test raw origin zone × primary mode codes instead of categories
        #[arg(long)]
        raw: bool,

        /// CSV file for the residual table; the report goes next to it as JSON
        #[arg(short, long, default_value = "results/chi_square_residuals.csv")]
        output: String,
    },
    /// Purpose × mode residuals within each time period
    PeriodResiduals {
        #[command(flatten)]
        source: Source,

        /// Directory to write one residual table per period to
        #[arg(short = 'd', long, default_value = "results/periods")]
        output_dir: String,
    },
    /// Departure-hour profiles by purpose and by mode
    Hourly {
        #[command(flatten)]
        source: Source,

        /// Directory to write the hourly tables to
        #[arg(short = 'd', long, default_value = "results/hourly")]
        output_dir: String,
    },
    /// Period → purpose → mode flow links
    Flows {
        #[command(flatten)]
        source: Source,

        /// JSON file to write nodes and links to
        #[arg(short, long, default_value = "results/flows.json")]
        output: String,

        /// Number of most frequent (period, purpose, mode) combinations kept
        #[arg(long, default_value_t = 50)]
        max_flows: usize,
    },
    /// Zone modal shares against distance to downtown
    Zones {
        #[command(flatten)]
        source: Source,

        /// Directory to write the zone tables to
        #[arg(short = 'd', long, default_value = "results/zones")]
        output_dir: String,

        /// Zone whose centroid distances are measured from
        #[arg(long, default_value_t = DOWNTOWN_ZONE)]
        downtown: i64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transod_analysis.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transod_analysis.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            input,
            output,
            column,
            values,
            preset,
        } => filter(&input, &output, column, values, preset)?,
        Commands::Tables { source, output_dir } => tables(&source, Path::new(&output_dir))?,
        Commands::ChiSquare {
            source,
            output,
            raw,
        } => sector_mode_test(&source, Path::new(&output), raw)?,
        Commands::PeriodResiduals { source, output_dir } => {
            periods(&source, Path::new(&output_dir))?
        }
        Commands::Hourly { source, output_dir } => hourly(&source, Path::new(&output_dir))?,
        Commands::Flows {
            source,
            output,
            max_flows,
        } => flows(&source, Path::new(&output), max_flows)?,
        Commands::Zones {
            source,
            output_dir,
            downtown,
        } => zones(&source, Path::new(&output_dir), downtown)?,
    }

    Ok(())
}

/// Reads and parses the survey rows, checking the columns the analysis uses.
fn load_trips(source: &Source, required: &[&str]) -> Result<Vec<TripRecord>> {
    let bytes = load_source(&source.input)?;
    read_trips(&bytes, required)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => ensure_dir(dir),
        _ => Ok(()),
    }
}

/// File-name friendly form of a category label.
fn slug(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[tracing::instrument(skip(values), fields(values = values.len()))]
fn filter(
    input: &str,
    output: &str,
    column: Option<String>,
    values: Vec<i64>,
    preset: Option<Preset>,
) -> Result<()> {
    let (preset_column, preset_values) = match preset {
        Some(Preset::Modes) => (Some(MODE_PRIMARY), VALID_MODE_CODES.to_vec()),
        Some(Preset::OriginZones) => (Some(ORIGIN_ZONE), valid_origin_zones()),
        None => (None, Vec::new()),
    };
    let Some(column) = column.or(preset_column.map(str::to_string)) else {
        bail!("either --column or --preset is required");
    };
    let values = if values.is_empty() { preset_values } else { values };
    if values.is_empty() {
        bail!("no codes to keep: pass --values or --preset");
    }

    let bytes = load_source(input)?;
    let path = Path::new(output);
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("failed to create '{output}'"))?;

    let summary = filter_rows(&bytes, file, &column, &values)?;
    if summary.kept == 0 {
        warn!(column = %column, "No rows kept");
    }
    Ok(())
}

#[tracing::instrument(skip(source), fields(input = %source.input))]
fn tables(source: &Source, output_dir: &Path) -> Result<()> {
    let catalog = Catalog::load(source.mappings.as_deref())?;
    let records = load_trips(source, &[ORIGIN_ZONE, MODE_PRIMARY])?;
    let trips = catalog.classify_all(&records);

    let in_sectors: Vec<ClassifiedTrip<'_>> = trips
        .iter()
        .filter(|t| {
            t.record
                .origin_zone
                .is_some_and(|z| catalog.sectors.contains(z))
        })
        .copied()
        .collect();
    let outside = trips.len() - in_sectors.len();
    if outside > 0 {
        info!(trips = outside, "Trips outside the mapped sectors left out");
    }

    let order = CategoryOrder::new(catalog.sectors.categories(), catalog.modes.labels());
    let table = |normalize| {
        crosstab(
            in_sectors.iter().map(|t| (t.origin_sector, t.mode)),
            normalize,
            Some(&order),
        )
    };
    let counts = table(Normalize::None);

    ensure_dir(output_dir)?;
    write_table(&output_dir.join("frequencies.csv"), &counts.with_margins("TOTAL"), "sector")?;
    write_table(&output_dir.join("pct_by_sector.csv"), &table(Normalize::ByRow), "sector")?;
    write_table(&output_dir.join("pct_by_mode.csv"), &table(Normalize::ByColumn), "sector")?;
    write_table(&output_dir.join("pct_total.csv"), &table(Normalize::ByTotal), "sector")?;
    write_table(
        &output_dir.join("sustainable.csv"),
        &sustainable_table(&in_sectors, &catalog.roles, catalog.sectors.categories()),
        "sector",
    )?;

    let summaries = summarize(&counts, &catalog.roles);
    let rows: Vec<SummaryRow> = summaries.iter().map(SummaryRow::from).collect();
    write_rows(&output_dir.join("summary.csv"), &rows)?;
    print_pretty(&summaries);

    let report = TablesReport {
        generated_at: Utc::now(),
        source: source.input.clone(),
        trips: in_sectors.len(),
        trips_outside_sectors: outside,
        sectors: rows,
    };
    print_json(&report.sectors)?;
    write_json(&output_dir.join("summary.json"), &report)?;
    Ok(())
}

#[tracing::instrument(skip(source), fields(input = %source.input))]
fn sector_mode_test(source: &Source, output: &Path, raw: bool) -> Result<()> {
    let catalog = Catalog::load(source.mappings.as_deref())?;
    let records = load_trips(source, &[ORIGIN_ZONE, MODE_PRIMARY])?;

    let (counts, rows, cols) = if raw {
        let counts = code_crosstab(
            records
                .iter()
                .filter_map(|r| Some((r.origin_zone?, r.mode_primary?))),
        );
        (counts, ORIGIN_ZONE.to_string(), MODE_PRIMARY.to_string())
    } else {
        let trips = catalog.classify_all(&records);
        let order = CategoryOrder::new(catalog.sectors.categories(), catalog.modes.labels());
        let counts = crosstab(
            trips.iter().map(|t| (t.origin_sector, t.mode)),
            Normalize::None,
            Some(&order),
        );
        (
            counts,
            catalog.sectors.name().to_string(),
            catalog.modes.name().to_string(),
        )
    };

    let test = chi_square(&counts)?;
    info!(
        rows = %rows,
        cols = %cols,
        chi2 = test.statistic,
        dof = test.dof,
        p_value = test.p_value,
        n = test.n,
        cramers_v = test.cramers_v,
        max_abs_residual = test.residuals.max_abs(),
        "Chi-square test"
    );

    ensure_parent(output)?;
    write_table(output, &test.residuals, &rows)?;

    let report = ChiSquareReport {
        generated_at: Utc::now(),
        source: source.input.clone(),
        rows,
        cols,
        test,
    };
    write_json(&output.with_extension("json"), &report)?;
    Ok(())
}

#[tracing::instrument(skip(source), fields(input = %source.input))]
fn periods(source: &Source, output_dir: &Path) -> Result<()> {
    let catalog = Catalog::load(source.mappings.as_deref())?;
    let records = load_trips(source, &[MODE_PRIMARY, TRIP_PURPOSE, DEPART_TIME])?;
    let trips = catalog.classify_all(&records);

    let residuals = period_residuals(&trips, &catalog);

    ensure_dir(output_dir)?;
    for segment in &residuals.segments {
        if let Ok(test) = &segment.result {
            let path = output_dir.join(format!("residuals_{}.csv", slug(&segment.period)));
            write_table(&path, &test.residuals, "purpose")?;
        }
    }
    write_json(
        &output_dir.join("periods.json"),
        &PeriodReport::new(&source.input, &residuals),
    )?;
    Ok(())
}

#[tracing::instrument(skip(source), fields(input = %source.input))]
fn hourly(source: &Source, output_dir: &Path) -> Result<()> {
    let catalog = Catalog::load(source.mappings.as_deref())?;
    let records = load_trips(source, &[MODE_PRIMARY, TRIP_PURPOSE, DEPART_TIME])?;
    let trips = catalog.classify_all(&records);

    ensure_dir(output_dir)?;
    write_table(
        &output_dir.join("share_by_purpose.csv"),
        &share_by_hour(&trips, |t| t.purpose),
        "purpose",
    )?;
    write_table(
        &output_dir.join("share_by_mode.csv"),
        &share_by_hour(&trips, |t| t.mode),
        "mode",
    )?;
    write_table(
        &output_dir.join("purpose_by_clock_hour.csv"),
        &counts_by_clock_hour(&trips, |t| t.purpose),
        "purpose",
    )?;

    let totals: Vec<HourTotal> = totals_by_hour(&trips)
        .into_iter()
        .map(|(hour, trips)| HourTotal { hour, trips })
        .collect();
    if let Some(peak) = totals.iter().max_by_key(|h| h.trips) {
        info!(hour = peak.hour, trips = peak.trips, "Peak departure hour");
    }
    write_rows(&output_dir.join("totals_by_hour.csv"), &totals)?;
    Ok(())
}

#[tracing::instrument(skip(source), fields(input = %source.input))]
fn flows(source: &Source, output: &Path, max_flows: usize) -> Result<()> {
    let catalog = Catalog::load(source.mappings.as_deref())?;
    let records = load_trips(source, &[MODE_PRIMARY, TRIP_PURPOSE, DEPART_TIME])?;
    let trips = catalog.classify_all(&records);

    let diagram = build_flows(&trips, max_flows);
    info!(
        nodes = diagram.nodes.len(),
        links = diagram.links.len(),
        "Flow diagram built"
    );

    ensure_parent(output)?;
    write_json(output, &diagram)?;
    Ok(())
}

#[tracing::instrument(skip(source), fields(input = %source.input))]
fn zones(source: &Source, output_dir: &Path, downtown: i64) -> Result<()> {
    let catalog = Catalog::load(source.mappings.as_deref())?;
    let records = load_trips(source, &[ORIGIN_ZONE, MODE_PRIMARY])?;
    let trips = catalog.classify_all(&records);

    let profiles = zone_profiles(&trips, &catalog, downtown)?;
    let entries = correlations(&profiles, catalog.sectors.categories());

    let distance: Vec<f64> = profiles.iter().map(|p| p.distance_km).collect();
    let auto: Vec<f64> = profiles.iter().map(|p| p.part_auto).collect();
    let fit = linear_regression(&distance, &auto);
    match &fit {
        Some(fit) => info!(
            slope = fit.slope,
            intercept = fit.intercept,
            r_squared = fit.r_squared,
            p_value = fit.p_value,
            "Auto share against distance"
        ),
        None => warn!(zones = profiles.len(), "Not enough zones for a regression"),
    }

    ensure_dir(output_dir)?;
    write_rows(&output_dir.join("zones.csv"), &profiles)?;
    write_rows(&output_dir.join("correlations.csv"), &entries)?;

    let report = ZoneReport {
        generated_at: Utc::now(),
        source: source.input.clone(),
        downtown_zone: downtown,
        zones: profiles.len(),
        distance_auto_fit: fit,
    };
    write_json(&output_dir.join("zones.json"), &report)?;
    Ok(())
}

//! `planner` CLI — recurrence tokens and planning grids from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Build a token from a repeat selection
//! planner encode --interval 2 --byday MO,WE --until 2026-03-31
//!
//! # Decode a stored token (argument or stdin) to JSON
//! planner decode 'RRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=FR'
//!
//! # List the timeline columns of a business day
//! planner columns --start 08:00 --end 18:00 --slot 15
//!
//! # Turn a schedule response into a free/busy grid
//! planner grid -i schedule.json --date 2026-03-16 --settings settings.json
//!
//! # Expand a recurring event over a window
//! planner expand --rule 'RRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=MO' \
//!     --dtstart 2026-03-02T09:00:00 --from 2026-03-01T00:00:00Z --to 2026-04-01T00:00:00Z
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG`; `-v` turns on debug output.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use planner_core::grid::{self, TimeGrid};
use planner_core::recurrence::{self, parse_weekday_code, Frequency, RecurrenceRule};
use planner_core::schedule::ScheduleResponse;
use planner_core::settings::CalendarSettings;
use planner_core::{compute_grid, expander};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "planner",
    version,
    about = "Recurrence tokens and free/busy planning grids"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a repeat selection into an RRULE token
    Encode {
        /// Repeat frequency (weekly or monthly)
        #[arg(long, default_value = "weekly")]
        freq: Frequency,
        /// Repeat every N weeks/months
        #[arg(long, default_value_t = 1)]
        interval: u32,
        /// Comma-separated weekday codes in selection order (e.g. MO,WE)
        #[arg(long)]
        byday: Option<String>,
        /// Last day of the recurrence (YYYY-MM-DD, inclusive)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Decode an RRULE token to JSON
    Decode {
        /// Token to decode (reads from stdin if omitted)
        token: Option<String>,
    },
    /// Print the timeline columns of the business window
    Columns {
        #[arg(long, default_value = "08:00", value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, default_value = "18:00", value_parser = parse_time)]
        end: NaiveTime,
        /// Slot width in minutes
        #[arg(long, default_value_t = grid::DEFAULT_SLOT_MINUTES)]
        slot: i64,
    },
    /// Compute a free/busy grid from a schedule response
    Grid {
        /// Schedule response JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Day to lay out (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Calendar settings JSON (business hours); defaults to 08:00-18:00
        #[arg(long)]
        settings: Option<String>,
        /// Meeting length in minutes used to derive free slots
        #[arg(long, default_value_t = grid::DEFAULT_SLOT_MINUTES)]
        duration: i64,
    },
    /// Expand a recurring event into busy intervals
    Expand {
        /// RRULE token; empty for a one-off event
        #[arg(long, default_value = "")]
        rule: String,
        /// Local start of the first occurrence (YYYY-MM-DDThh:mm:ss)
        #[arg(long)]
        dtstart: NaiveDateTime,
        /// IANA timezone of dtstart
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Occurrence length in minutes
        #[arg(long, default_value_t = 60)]
        duration: i64,
        /// Window start (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,
        /// Window end (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            freq,
            interval,
            byday,
            until,
        } => {
            let mut rule = RecurrenceRule {
                frequency: freq,
                interval,
                ..RecurrenceRule::default()
            };
            if let Some(raw) = byday.as_deref() {
                rule = rule.with_weekdays(parse_byday_arg(raw)?);
            }
            if let Some(date) = until {
                rule = rule.with_until_date(date);
            }
            println!("{}", recurrence::encode(&rule));
        }
        Commands::Decode { token } => {
            let token = match token {
                Some(token) => token,
                None => read_input(None)?,
            };
            let rule = recurrence::decode(&token)
                .with_context(|| format!("Failed to decode recurrence token: {}", token.trim()))?;
            println!("{}", serde_json::to_string_pretty(&rule)?);
        }
        Commands::Columns { start, end, slot } => {
            let grid = TimeGrid::new(start, end, slot, grid::DEFAULT_PIXELS_PER_SLOT)
                .context("Invalid grid parameters")?;
            for column in grid.columns() {
                println!("{}", grid::format_label(column));
            }
        }
        Commands::Grid {
            input,
            output,
            date,
            settings,
            duration,
        } => {
            let settings = match settings.as_deref() {
                Some(path) => CalendarSettings::load(path)
                    .with_context(|| format!("Failed to load settings: {}", path))?,
                None => CalendarSettings::default(),
            };
            let time_grid = settings
                .time_grid()
                .context("Settings do not describe a valid business window")?;

            let json = read_input(input.as_deref())?;
            let schedule =
                ScheduleResponse::from_json(&json).context("Failed to parse schedule response")?;
            debug!(users = schedule.users.len(), %date, "computing grid");

            let result = compute_grid(&time_grid, date, &schedule, duration);
            write_output(output.as_deref(), &serde_json::to_string_pretty(&result)?)?;
        }
        Commands::Expand {
            rule,
            dtstart,
            timezone,
            duration,
            from,
            to,
        } => {
            let occurrences =
                expander::expand_token(&rule, dtstart, &timezone, duration, from, to)
                    .context("Failed to expand recurrence")?;
            println!("{}", serde_json::to_string_pretty(&occurrences)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    grid::parse_label(raw).map_err(|e| e.to_string())
}

/// `MO,we, FR` -> weekdays in the given order.
fn parse_byday_arg(raw: &str) -> Result<Vec<chrono::Weekday>> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            parse_weekday_code(code).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown weekday code: '{}'. Expected one of MO,TU,WE,TH,FR,SA,SU",
                    code
                )
            })
        })
        .collect()
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

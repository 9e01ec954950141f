use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use log::{debug, info};

use crate::config::{load_table, resolve_table_path};
use crate::converter::{ConversionResult, UnitConverter, DEFAULT_ROUND_BY};
use crate::units::{format_conversion, Preset};

#[derive(Parser)]
#[command(name = "unitscale", version)]
#[command(about = "Convert values between linearly scaled units")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Built-in unit table (number-full, number, number-lite, time) [default: number-full]
    #[arg(long = "preset", value_parser = Preset::from_str, conflicts_with = "table_path")]
    pub preset: Option<Preset>,
    /// JSON unit table (or set UNITSCALE_TABLE when no --preset is given)
    #[arg(long = "table")]
    pub table_path: Option<PathBuf>,
    /// Re-base the table on this unit before converting
    #[arg(long = "base")]
    pub base: Option<String>,
    /// Print results as JSON
    #[arg(long = "json")]
    pub json: bool,
    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a value from one unit to another
    Convert {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Unit the value is expressed in
        #[arg(long = "from")]
        from: String,
        /// Unit to convert into
        #[arg(long = "to")]
        to: String,
        /// Decimal places for the rounded value
        #[arg(long = "round-by", default_value_t = DEFAULT_ROUND_BY)]
        round_by: u32,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Convert a value into its most readable unit
    Shorten {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Unit the value is expressed in (defaults to the base unit)
        #[arg(long = "from")]
        from: Option<String>,
        /// Decimal places for the rounded value
        #[arg(long = "round-by", default_value_t = DEFAULT_ROUND_BY)]
        round_by: u32,
        #[command(flatten)]
        table: TableArgs,
    },
    /// List the units of the selected table
    Units {
        #[command(flatten)]
        table: TableArgs,
    },
}

fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    let _ = builder.try_init();
}

/// `--table` or `--preset` when given, otherwise the environment or default
/// table file, otherwise the default preset.
pub fn build_converter(args: &TableArgs) -> Result<UnitConverter> {
    let table_path = match (args.table_path.as_deref(), args.preset) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(_)) => None,
        (None, None) => resolve_table_path(None),
    };
    let mut converter = match table_path {
        Some(path) => {
            debug!("Using unit table {}", path.display());
            load_table(&path)?.into_converter()?
        }
        None => {
            let preset = args.preset.unwrap_or_default();
            debug!("Using preset {preset}");
            preset.converter()?
        }
    };
    if let Some(base) = args.base.as_deref() {
        converter.set_base_unit(base)?;
        info!("Base unit set to {base}");
    }
    Ok(converter)
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    match cli.command {
        Commands::Convert {
            value,
            from,
            to,
            round_by,
            table,
        } => {
            configure_logging(table.verbose);
            let converter = build_converter(&table)?;
            let result = converter.convert(value, &from, &to, round_by)?;
            print_result(&result, table.json)?;
        }
        Commands::Shorten {
            value,
            from,
            round_by,
            table,
        } => {
            configure_logging(table.verbose);
            let converter = build_converter(&table)?;
            let result = converter.convert_to_shortened(value, round_by, from.as_deref())?;
            print_result(&result, table.json)?;
        }
        Commands::Units { table } => {
            configure_logging(table.verbose);
            let converter = build_converter(&table)?;
            if table.json {
                println!("{}", serde_json::to_string_pretty(converter.units())?);
            } else {
                println!("{}", units_table(&converter));
            }
        }
    }
    Ok(())
}

fn print_result(result: &ConversionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", format_conversion(result));
        debug!("\n{}", result_table(result));
    }
    Ok(())
}

fn themed_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| {
            Cell::new(*label)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        })
        .collect()
}

fn label_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn value_cell<T: std::fmt::Display>(value: T) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

fn display_key_cell(key: &str) -> Cell {
    if key.is_empty() {
        Cell::new("--")
    } else {
        Cell::new(key).fg(Color::Magenta)
    }
}

fn result_table(result: &ConversionResult) -> Table {
    let mut table = themed_table();
    table.set_header(header_cells(&["Field", "Value"]));
    table.add_row(vec![label_cell("Unit"), Cell::new(&result.id)]);
    table.add_row(vec![
        label_cell("Display key"),
        display_key_cell(&result.display_key),
    ]);
    table.add_row(vec![label_cell("Value"), value_cell(result.value)]);
    table.add_row(vec![
        label_cell("Rounded"),
        value_cell(result.rounded_value),
    ]);
    table.add_row(vec![
        label_cell("Base unit"),
        value_cell(if result.is_base_unit { "yes" } else { "no" }),
    ]);
    table
}

fn units_table(converter: &UnitConverter) -> Table {
    let mut table = themed_table();
    table.set_header(header_cells(&["Unit", "Display key", "Factor", "Base"]));
    for unit in converter.units() {
        let is_base = unit.id == converter.base_unit();
        let id_cell = if is_base {
            label_cell(&unit.id).fg(Color::Green)
        } else {
            Cell::new(&unit.id)
        };
        table.add_row(vec![
            id_cell,
            display_key_cell(&unit.display_key),
            value_cell(format!("{:e}", unit.factor)),
            value_cell(if is_base { "*" } else { "" }),
        ]);
    }
    table
}

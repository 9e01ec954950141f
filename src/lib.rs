pub mod cli;
pub mod config;
pub mod converter;
pub mod shared;
pub mod units;

pub use config::{load_table, resolve_table_path, UnitTable};
pub use converter::{
    round_to, ConstructionError, ConversionResult, LookupError, UnitConverter, UnitDefinition,
    DEFAULT_ROUND_BY,
};
pub use shared::SharedConverter;
pub use units::{format_conversion, Preset, PresetError};

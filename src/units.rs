//! Built-in unit tables and display helpers

use strum::{Display, EnumIter, EnumString};

use crate::converter::{
    ConstructionError, ConversionResult, LookupError, UnitConverter, UnitDefinition,
};

pub const GIGA: &str = "giga";
pub const MEGA: &str = "mega";
pub const KILO: &str = "kilo";
pub const NUMBER: &str = "number";
pub const MILLI: &str = "milli";
pub const MICRO: &str = "micro";
pub const NANO: &str = "nano";

pub const NANOSECOND: &str = "nanosecond";
pub const MICROSECOND: &str = "microsecond";
pub const MILLISECOND: &str = "millisecond";
pub const SECOND: &str = "second";
pub const MINUTE: &str = "minute";
pub const HOUR: &str = "hour";
pub const DAY: &str = "day";

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = 60.0 * MS_PER_SECOND;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

/// Metric prefixes from giga down to nano, largest first.
pub fn number_units() -> Vec<UnitDefinition> {
    vec![
        UnitDefinition::new(GIGA, "GIGA", 1e9),
        UnitDefinition::new(MEGA, "MEGA", 1e6),
        UnitDefinition::new(KILO, "KILO", 1e3),
        UnitDefinition::new(NUMBER, "", 1.0),
        UnitDefinition::new(MILLI, "MILLI", 1e-3),
        UnitDefinition::new(MICRO, "MICRO", 1e-6),
        UnitDefinition::new(NANO, "NANO", 1e-9),
    ]
}

/// Time units expressed in milliseconds.
pub fn time_units() -> Vec<UnitDefinition> {
    vec![
        UnitDefinition::new(NANOSECOND, "NS", 1e-6),
        UnitDefinition::new(MICROSECOND, "MICRS", 1e-3),
        UnitDefinition::new(MILLISECOND, "MILLS", 1.0),
        UnitDefinition::new(SECOND, "SEC", MS_PER_SECOND),
        UnitDefinition::new(MINUTE, "MIN", MS_PER_MINUTE),
        UnitDefinition::new(HOUR, "HOUR", MS_PER_HOUR),
        UnitDefinition::new(DAY, "DAY", MS_PER_DAY),
    ]
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PresetError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Preset {
    /// giga through nano
    #[default]
    NumberFull,
    /// kilo through nano
    Number,
    /// kilo and plain numbers
    NumberLite,
    /// nanoseconds through days, based on nanoseconds
    Time,
}

impl Preset {
    pub fn definitions(&self) -> Vec<UnitDefinition> {
        match self {
            Preset::NumberFull => number_units(),
            Preset::Number => number_units().split_off(2),
            Preset::NumberLite => number_units()[2..4].to_vec(),
            Preset::Time => time_units(),
        }
    }

    pub fn converter(&self) -> Result<UnitConverter, PresetError> {
        let mut converter = UnitConverter::new(&self.definitions())?;
        if *self == Preset::Time {
            converter.set_base_unit(NANOSECOND)?;
        }
        Ok(converter)
    }
}

/// Render a result as `"<rounded> <display key>"`.
pub fn format_conversion(result: &ConversionResult) -> String {
    if result.display_key.is_empty() {
        format!("{}", result.rounded_value)
    } else {
        format!("{} {}", result.rounded_value, result.display_key)
    }
}

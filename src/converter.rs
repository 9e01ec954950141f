//! Linear unit conversion around a re-basable reference unit

use std::collections::HashMap;

use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Decimal places used for `rounded_value` when the caller has no preference.
pub const DEFAULT_ROUND_BY: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub id: String,
    #[serde(default, alias = "translateKey")]
    pub display_key: String,
    #[serde(alias = "value")]
    pub factor: f64,
}

impl UnitDefinition {
    pub fn new<I: Into<String>, K: Into<String>>(id: I, display_key: K, factor: f64) -> Self {
        UnitDefinition {
            id: id.into(),
            display_key: display_key.into(),
            factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub id: String,
    pub value: f64,
    pub display_key: String,
    pub rounded_value: f64,
    pub is_base_unit: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    #[error("at least one unit definition is required")]
    Empty,
    #[error("missing base unit: one unit must have a factor of exactly 1")]
    MissingBase,
    #[error("ambiguous base unit: {0} and {1} both have a factor of 1")]
    AmbiguousBase(String, String),
    #[error("unit \"{0}\" is defined more than once")]
    DuplicateId(String),
    #[error("units {first} and {second} share factor {factor}")]
    DuplicateFactor {
        first: String,
        second: String,
        factor: f64,
    },
    #[error("unit \"{id}\" has invalid factor {factor}; factors must be finite and positive")]
    InvalidFactor { id: String, factor: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("unknown unit \"{0}\"")]
    UnknownUnit(String),
    #[error("unknown unit in conversion {from} -> {to}")]
    UnknownConversion { from: String, to: String },
}

/// Round half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits.min(i32::MAX as u32) as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

#[derive(Debug, Clone)]
pub struct UnitConverter {
    units: Vec<UnitDefinition>,
    index: HashMap<String, usize>,
    base_unit: String,
}

impl UnitConverter {
    pub fn new(definitions: &[UnitDefinition]) -> Result<Self, ConstructionError> {
        if definitions.is_empty() {
            return Err(ConstructionError::Empty);
        }
        for unit in definitions {
            if !unit.factor.is_finite() || unit.factor <= 0.0 {
                return Err(ConstructionError::InvalidFactor {
                    id: unit.id.clone(),
                    factor: unit.factor,
                });
            }
        }

        let mut units = definitions.to_vec();
        units.sort_by_key(|unit| OrderedFloat(unit.factor));

        let index = build_index(&units)?;

        let mut bases = units.iter().filter(|unit| unit.factor == 1.0);
        let base = bases.next().ok_or(ConstructionError::MissingBase)?;
        if let Some(other) = bases.next() {
            return Err(ConstructionError::AmbiguousBase(
                base.id.clone(),
                other.id.clone(),
            ));
        }
        let base_unit = base.id.clone();

        // Tied factors would both land on exactly 1 when re-basing onto either.
        if let Some(pair) = units.windows(2).find(|pair| pair[0].factor == pair[1].factor) {
            return Err(ConstructionError::DuplicateFactor {
                first: pair[0].id.clone(),
                second: pair[1].id.clone(),
                factor: pair[0].factor,
            });
        }

        debug!("Built converter with {} units, base {base_unit}", units.len());
        Ok(UnitConverter {
            units,
            index,
            base_unit,
        })
    }

    pub fn base_unit(&self) -> &str {
        &self.base_unit
    }

    /// Units in ascending factor order.
    pub fn units(&self) -> &[UnitDefinition] {
        &self.units
    }

    pub fn unit(&self, id: &str) -> Option<&UnitDefinition> {
        self.index.get(id).map(|&pos| &self.units[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Re-express every factor relative to `id`, which becomes the base unit.
    pub fn set_base_unit(&mut self, id: &str) -> Result<(), LookupError> {
        let target = self
            .unit(id)
            .ok_or_else(|| LookupError::UnknownUnit(id.to_string()))?;
        let modifier = 1.0 / target.factor;

        let units: Vec<UnitDefinition> = self
            .units
            .iter()
            .map(|unit| UnitDefinition {
                factor: if unit.id == id {
                    1.0
                } else {
                    unit.factor * modifier
                },
                ..unit.clone()
            })
            .collect();
        let index = index_positions(&units);

        self.units = units;
        self.index = index;
        self.base_unit = id.to_string();
        debug!("Re-based converter on {id} (modifier {modifier})");
        Ok(())
    }

    pub fn convert(
        &self,
        value: f64,
        from: &str,
        to: &str,
        round_by: u32,
    ) -> Result<ConversionResult, LookupError> {
        let (from_unit, to_unit) = match (self.unit(from), self.unit(to)) {
            (Some(from_unit), Some(to_unit)) => (from_unit, to_unit),
            _ => {
                return Err(LookupError::UnknownConversion {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
        };
        let relation = from_unit.factor / to_unit.factor;
        let result = value * relation;
        Ok(ConversionResult {
            id: to_unit.id.clone(),
            value: result,
            display_key: to_unit.display_key.clone(),
            rounded_value: round_to(result, round_by),
            is_base_unit: to_unit.id == self.base_unit,
        })
    }

    /// Convert into the unit that keeps the magnitude readable.
    ///
    /// `from` defaults to the current base unit.
    pub fn convert_to_shortened(
        &self,
        value: f64,
        round_by: u32,
        from: Option<&str>,
    ) -> Result<ConversionResult, LookupError> {
        let from = from.unwrap_or(&self.base_unit);
        let from_unit = self
            .unit(from)
            .ok_or_else(|| LookupError::UnknownUnit(from.to_string()))?;
        let best = self.find_best_unit(value.abs(), from_unit);
        self.convert(value, &from_unit.id, &best.id, round_by)
    }

    /// Walk the units in ascending order, preferring the largest unit that keeps
    /// the magnitude at or above 1 and escaping sub-1 magnitudes toward
    /// smaller units. A zero magnitude never moves off `from`.
    fn find_best_unit<'a>(
        &'a self,
        magnitude: f64,
        from: &'a UnitDefinition,
    ) -> &'a UnitDefinition {
        let mut best = from;
        for candidate in &self.units {
            let current = if best.id == from.id {
                magnitude
            } else {
                magnitude * (from.factor / best.factor)
            };
            let candidate_value = current * (best.factor / candidate.factor);
            if (candidate_value < current && candidate_value >= 1.0)
                || (candidate_value > current && current < 1.0)
            {
                best = candidate;
            }
        }
        best
    }
}

fn build_index(units: &[UnitDefinition]) -> Result<HashMap<String, usize>, ConstructionError> {
    let mut index = HashMap::with_capacity(units.len());
    for (pos, unit) in units.iter().enumerate() {
        if index.insert(unit.id.clone(), pos).is_some() {
            return Err(ConstructionError::DuplicateId(unit.id.clone()));
        }
    }
    Ok(index)
}

fn index_positions(units: &[UnitDefinition]) -> HashMap<String, usize> {
    units
        .iter()
        .enumerate()
        .map(|(pos, unit)| (unit.id.clone(), pos))
        .collect()
}

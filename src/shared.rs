//! Thread-safe handle around a [`UnitConverter`]

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::converter::{
    ConstructionError, ConversionResult, LookupError, UnitConverter, UnitDefinition,
};

/// Conversions share a read lock; re-basing takes the write lock, so readers
/// only ever see the table before or after a re-base.
#[derive(Debug, Clone)]
pub struct SharedConverter {
    inner: Arc<RwLock<UnitConverter>>,
}

impl SharedConverter {
    pub fn new(definitions: &[UnitDefinition]) -> Result<Self, ConstructionError> {
        UnitConverter::new(definitions).map(Self::from_converter)
    }

    pub fn from_converter(converter: UnitConverter) -> Self {
        SharedConverter {
            inner: Arc::new(RwLock::new(converter)),
        }
    }

    // The table is swapped in whole, so a panicking holder cannot leave it torn.
    fn read(&self) -> RwLockReadGuard<'_, UnitConverter> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, UnitConverter> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn base_unit(&self) -> String {
        self.read().base_unit().to_string()
    }

    pub fn set_base_unit(&self, id: &str) -> Result<(), LookupError> {
        self.write().set_base_unit(id)
    }

    pub fn convert(
        &self,
        value: f64,
        from: &str,
        to: &str,
        round_by: u32,
    ) -> Result<ConversionResult, LookupError> {
        self.read().convert(value, from, to, round_by)
    }

    pub fn convert_to_shortened(
        &self,
        value: f64,
        round_by: u32,
        from: Option<&str>,
    ) -> Result<ConversionResult, LookupError> {
        self.read().convert_to_shortened(value, round_by, from)
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> UnitConverter {
        self.read().clone()
    }
}

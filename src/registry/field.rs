use std::collections::HashMap;

use nalgebra::DMatrix;
use serde::Serialize;
use slotmap::SlotMap;

use super::Parent;
use crate::error::{RegistryError, Result};

slotmap::new_key_type! {
    /// Unique identifier for a Gaussian random field in the field registry.
    pub struct FieldId;
}

/// Variogram model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariogramKind {
    Spherical,
    Exponential,
    Gaussian,
    /// Requires a power in (0, 2].
    GeneralExponential,
}

/// Spatial correlation settings of a Gaussian random field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Variogram {
    pub kind: VariogramKind,
    pub main_range: f64,
    pub perpendicular_range: f64,
    pub vertical_range: f64,
    /// Azimuth of the main direction, in degrees.
    pub azimuth: f64,
    /// Dip angle, in degrees.
    pub dip: f64,
    /// Exponent for [`VariogramKind::GeneralExponential`].
    pub power: Option<f64>,
}

impl Default for Variogram {
    fn default() -> Self {
        Self {
            kind: VariogramKind::Spherical,
            main_range: 1000.0,
            perpendicular_range: 1000.0,
            vertical_range: 10.0,
            azimuth: 0.0,
            dip: 0.0,
            power: None,
        }
    }
}

impl Variogram {
    /// Returns `true` if the ranges are positive and the power fits the kind.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let ranges_ok = [self.main_range, self.perpendicular_range, self.vertical_range]
            .iter()
            .all(|r| r.is_finite() && *r > 0.0);
        let power_ok = match self.kind {
            VariogramKind::GeneralExponential => self.power.is_some_and(|p| p > 0.0 && p <= 2.0),
            _ => true,
        };
        ranges_ok && power_ok
    }
}

/// A continuous simulated property used as a truncation axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianField {
    pub name: String,
    pub parent: Parent,
    pub variogram: Variogram,
}

impl GaussianField {
    /// Returns `true` if the field can be simulated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.variogram.is_valid()
    }

    /// Projection handed to the simulator.
    #[must_use]
    pub fn specification(&self) -> FieldSpecification {
        FieldSpecification {
            name: self.name.clone(),
            variogram: self.variogram,
        }
    }
}

/// What the simulator needs to know about one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpecification {
    pub name: String,
    pub variogram: Variogram,
}

/// Source of Gaussian random fields per zone/region.
pub trait FieldRegistry {
    /// Fields available in the given zone/region.
    fn list_available(&self, parent: &Parent) -> Vec<FieldId>;

    /// Creates a new field with default settings in the given zone/region.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot create the field.
    fn create_empty(&mut self, parent: &Parent) -> Result<FieldId>;

    /// Looks up a field by id.
    fn by_id(&self, id: FieldId) -> Option<&GaussianField>;

    /// Stores simulated values for a field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is unknown.
    fn store_realization(&mut self, id: FieldId, data: DMatrix<f64>) -> Result<()>;
}

/// Field registry held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryFieldRegistry {
    fields: SlotMap<FieldId, GaussianField>,
    realizations: HashMap<FieldId, DMatrix<f64>>,
}

impl InMemoryFieldRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field with the given name and variogram.
    pub fn add(&mut self, parent: Parent, name: impl Into<String>, variogram: Variogram) -> FieldId {
        self.fields.insert(GaussianField {
            name: name.into(),
            parent,
            variogram,
        })
    }

    /// Removes a field from the registry. Rule references must be cleared separately
    /// with [`RemoveField`](crate::operations::editing::RemoveField).
    pub fn remove(&mut self, id: FieldId) -> Option<GaussianField> {
        self.realizations.remove(&id);
        self.fields.remove(id)
    }

    /// Mutable access to a field's settings.
    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut GaussianField> {
        self.fields.get_mut(id)
    }

    /// Last simulated values of a field.
    #[must_use]
    pub fn realization(&self, id: FieldId) -> Option<&DMatrix<f64>> {
        self.realizations.get(&id)
    }

    /// Number of fields across all zones/regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldRegistry for InMemoryFieldRegistry {
    fn list_available(&self, parent: &Parent) -> Vec<FieldId> {
        self.fields
            .iter()
            .filter(|(_, field)| field.parent == *parent)
            .map(|(id, _)| id)
            .collect()
    }

    fn create_empty(&mut self, parent: &Parent) -> Result<FieldId> {
        let mut n = self.list_available(parent).len() + 1;
        let name = loop {
            let candidate = format!("GRF{n:02}");
            if !self
                .fields
                .values()
                .any(|f| f.parent == *parent && f.name == candidate)
            {
                break candidate;
            }
            n += 1;
        };
        Ok(self.add(*parent, name, Variogram::default()))
    }

    fn by_id(&self, id: FieldId) -> Option<&GaussianField> {
        self.fields.get(id)
    }

    fn store_realization(&mut self, id: FieldId, data: DMatrix<f64>) -> Result<()> {
        if !self.fields.contains_key(id) {
            return Err(RegistryError::FieldNotFound.into());
        }
        self.realizations.insert(id, data);
        Ok(())
    }
}

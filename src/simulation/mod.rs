//! The asynchronous boundary to the external numeric simulator.
//!
//! [`UpdateRealization`] gathers a rule's specification and the fields it
//! references, awaits the [`Simulator`], and writes the facies map and field
//! values back. Nothing is written if the simulator's answer does not match
//! the request.

use std::collections::HashMap;
use std::future::Future;

use nalgebra::DMatrix;

use crate::error::{RegistryError, Result, SimulationError};
use crate::model::{RuleId, RuleStore};
use crate::operations::query::{RuleSpecification, Specification, Validate};
use crate::registry::{FaciesRegistry, FieldId, FieldRegistry, FieldSpecification};

/// Everything the simulator needs for one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    pub fields: Vec<FieldSpecification>,
    pub rule: RuleSpecification,
}

/// Simulated values of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedField {
    pub name: String,
    pub data: DMatrix<f64>,
}

/// What the simulator returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    /// Facies code per cell.
    pub facies_map: DMatrix<i32>,
    pub fields: Vec<SimulatedField>,
}

/// Runs the Gaussian field simulation and truncation for a rule.
pub trait Simulator {
    /// Simulates the requested fields and truncates them with the rule.
    fn simulate(
        &self,
        request: SimulationRequest,
    ) -> impl Future<Output = std::result::Result<SimulationOutput, SimulationError>> + Send;
}

/// Simulates a rule and stores the result.
///
/// Concurrent updates of the same rule are not guarded against; callers
/// must not start a second one while the first is outstanding.
pub struct UpdateRealization {
    rule: RuleId,
}

impl UpdateRealization {
    /// Creates a new `UpdateRealization` operation.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// Executes the simulation.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule is not ready, two referenced fields share
    /// a name, the simulator fails, the simulator returns a field that was
    /// not requested, or the field registry rejects the values.
    pub async fn execute<F, S>(
        &self,
        store: &mut RuleStore,
        facies: &dyn FaciesRegistry,
        fields: &mut F,
        simulator: &S,
    ) -> Result<()>
    where
        F: FieldRegistry,
        S: Simulator,
    {
        if let Some(reason) = Validate::new(self.rule).first(store, facies, &*fields)? {
            return Err(SimulationError::NotReady(reason).into());
        }
        let rule = Specification::new(self.rule).execute(store, facies, &*fields)?;
        let (specs, by_name) = self.field_specifications(store, &*fields)?;

        tracing::debug!(rule = ?self.rule, fields = specs.len(), "requesting simulation");
        let output = simulator
            .simulate(SimulationRequest {
                fields: specs,
                rule,
            })
            .await?;

        let mut updates = Vec::with_capacity(output.fields.len());
        for field in output.fields {
            let id = by_name
                .get(&field.name)
                .copied()
                .ok_or_else(|| SimulationError::UnknownField(field.name.clone()))?;
            updates.push((id, field.data));
        }

        let stored = updates.len();
        for (id, data) in updates {
            fields.store_realization(id, data)?;
        }
        let (rows, cols) = output.facies_map.shape();
        store.rule_mut(self.rule)?.realization = Some(output.facies_map);
        tracing::info!(rule = ?self.rule, rows, cols, fields = stored, "stored realization");
        Ok(())
    }

    /// Background fields plus, with overlay on, the alpha fields, each once.
    ///
    /// Output is matched back by name, so two referenced fields may not share one.
    fn field_specifications<F>(
        &self,
        store: &RuleStore,
        fields: &F,
    ) -> Result<(Vec<FieldSpecification>, HashMap<String, FieldId>)>
    where
        F: FieldRegistry + ?Sized,
    {
        let rule = store.rule(self.rule)?;
        let mut ids: Vec<FieldId> = rule.assigned_background_fields().collect();
        if rule.uses_overlay() {
            for (_, polygon) in store.overlay_polygons(self.rule)? {
                if let Some(field) = polygon.as_overlay().and_then(|o| o.field) {
                    if !ids.contains(&field) {
                        ids.push(field);
                    }
                }
            }
        }

        let mut specs = Vec::with_capacity(ids.len());
        let mut by_name = HashMap::with_capacity(ids.len());
        for id in ids {
            let field = fields.by_id(id).ok_or(RegistryError::FieldNotFound)?;
            if by_name.insert(field.name.clone(), id).is_some() {
                return Err(SimulationError::DuplicateFieldName(field.name.clone()).into());
            }
            specs.push(field.specification());
        }
        Ok((specs, by_name))
    }
}

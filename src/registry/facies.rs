use std::collections::HashMap;

use slotmap::SlotMap;

use super::Parent;
use crate::error::{RegistryError, Result};

slotmap::new_key_type! {
    /// Unique identifier for a facies in the facies registry.
    pub struct FaciesId;
}

/// A discrete rock-type classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Facies {
    /// Project-wide unique code.
    pub code: i32,
    /// Display name.
    pub name: String,
}

/// A facies selected for use in one zone/region, with its preview probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedFacies {
    /// The selected facies.
    pub facies: FaciesId,
    /// Probability of occurrence within the zone/region, if assigned.
    pub preview_probability: Option<f64>,
}

/// Source of facies identities and per-parent selections.
pub trait FaciesRegistry {
    /// Facies selected in the given zone/region.
    fn list_selected(&self, parent: &Parent) -> Vec<SelectedFacies>;

    /// Looks up a facies by id.
    fn by_id(&self, id: FaciesId) -> Option<&Facies>;

    /// Preview probability of a facies within a zone/region, if selected there.
    fn preview_probability(&self, parent: &Parent, id: FaciesId) -> Option<f64> {
        self.list_selected(parent)
            .into_iter()
            .find(|selected| selected.facies == id)
            .and_then(|selected| selected.preview_probability)
    }
}

/// Facies registry held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryFaciesRegistry {
    facies: SlotMap<FaciesId, Facies>,
    selections: HashMap<Parent, Vec<SelectedFacies>>,
}

impl InMemoryFaciesRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a facies.
    ///
    /// # Errors
    ///
    /// Returns an error if another facies already uses `code`.
    pub fn add(&mut self, code: i32, name: impl Into<String>) -> Result<FaciesId> {
        if self.facies.values().any(|f| f.code == code) {
            return Err(RegistryError::Failed(format!("facies code {code} is already in use")).into());
        }
        Ok(self.facies.insert(Facies {
            code,
            name: name.into(),
        }))
    }

    /// Selects a facies in a zone/region, replacing any previous probability.
    ///
    /// # Errors
    ///
    /// Returns an error if the facies is not registered.
    pub fn select(
        &mut self,
        parent: Parent,
        facies: FaciesId,
        preview_probability: Option<f64>,
    ) -> Result<()> {
        if !self.facies.contains_key(facies) {
            return Err(RegistryError::FaciesNotFound.into());
        }
        let selected = self.selections.entry(parent).or_default();
        match selected.iter_mut().find(|s| s.facies == facies) {
            Some(existing) => existing.preview_probability = preview_probability,
            None => selected.push(SelectedFacies {
                facies,
                preview_probability,
            }),
        }
        Ok(())
    }

    /// Removes a facies from a zone/region selection. Returns whether it was selected.
    pub fn deselect(&mut self, parent: &Parent, facies: FaciesId) -> bool {
        let Some(selected) = self.selections.get_mut(parent) else {
            return false;
        };
        let before = selected.len();
        selected.retain(|s| s.facies != facies);
        selected.len() != before
    }
}

impl FaciesRegistry for InMemoryFaciesRegistry {
    fn list_selected(&self, parent: &Parent) -> Vec<SelectedFacies> {
        self.selections.get(parent).cloned().unwrap_or_default()
    }

    fn by_id(&self, id: FaciesId) -> Option<&Facies> {
        self.facies.get(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_code_rejected() {
        let mut registry = InMemoryFaciesRegistry::new();
        registry.add(1, "Sand").unwrap();
        assert!(registry.add(1, "Shale").is_err());
    }

    #[test]
    fn selection_is_scoped_by_parent() {
        let mut registry = InMemoryFaciesRegistry::new();
        let sand = registry.add(1, "Sand").unwrap();
        registry.select(Parent::zone(1), sand, Some(0.4)).unwrap();

        assert_eq!(
            registry.preview_probability(&Parent::zone(1), sand),
            Some(0.4)
        );
        assert_eq!(registry.preview_probability(&Parent::zone(2), sand), None);

        registry.select(Parent::zone(1), sand, Some(0.6)).unwrap();
        assert_eq!(registry.list_selected(&Parent::zone(1)).len(), 1);

        assert!(registry.deselect(&Parent::zone(1), sand));
        assert!(registry.list_selected(&Parent::zone(1)).is_empty());
    }
}

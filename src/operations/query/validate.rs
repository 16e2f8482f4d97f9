use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::error::Result;
use crate::math::{in_unit_interval, sums_to_one};
use crate::model::{PolygonData, RuleData, RuleId, RuleStore};
use crate::registry::{FaciesId, FaciesRegistry, FieldId, FieldRegistry};

/// Number of polygons and background fields of a bayfill rule.
const BAYFILL_POLYGONS: usize = 5;
const BAYFILL_FIELDS: usize = 3;

/// Why a rule is not ready for simulation.
///
/// The messages are shown to users as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("every polygon must have a facies")]
    MissingFacies,

    #[error("the rule has no polygons")]
    NoPolygons,

    #[error("the fractions of each facies must sum to 1")]
    FractionsNotNormalized,

    #[error("the probabilities of the facies in use must sum to 1")]
    ProbabilitiesNotNormalized,

    #[error("{required} background fields must be set")]
    MissingBackgroundFields { required: usize },

    #[error("a referenced gaussian field is not in the registry")]
    UnknownField,

    #[error("gaussian field '{0}' is not valid")]
    InvalidField(String),

    #[error("a bayfill rule must have exactly {expected} polygons, found {found}")]
    WrongPolygonCount { expected: usize, found: usize },

    #[error("the polygons of a bayfill rule must all have different facies")]
    RepeatedFacies,

    #[error("{0} must have a slant factor")]
    MissingSlantFactor(&'static str),

    #[error("overlay is switched on, but there are no overlay polygons")]
    NoOverlayPolygons,

    #[error("an overlay polygon refers to a facies group that no longer exists")]
    UnresolvedGroup,

    #[error("every overlay polygon must have an alpha field")]
    MissingOverlayField,

    #[error("an alpha field cannot also be a background field")]
    OverlayFieldIsBackground,

    #[error("overlay centers must lie in [0, 1]")]
    CenterOutOfRange,

    #[error("every facies of an overlay group must be used by a background polygon")]
    GroupNotInBackground,

    #[error("overlay needs {required} gaussian fields, but only {available} are available")]
    NotEnoughFields { available: usize, required: usize },
}

/// Everything a check looks at, gathered once per validation.
struct Context<'a> {
    store: &'a RuleStore,
    rule: &'a RuleData,
    facies: &'a dyn FaciesRegistry,
    fields: &'a dyn FieldRegistry,
    active: Vec<&'a PolygonData>,
    background: Vec<&'a PolygonData>,
    overlay: Vec<&'a PolygonData>,
    tolerance: f64,
}

type Check = fn(&Context<'_>) -> Option<ValidationError>;

const SHARED: &[Check] = &[
    missing_facies,
    no_polygons,
    fractions_normalized,
    probabilities_normalized,
    background_fields_set,
    fields_valid,
];

const BAYFILL: &[Check] = &[polygon_count, distinct_facies, slant_factors];

const OVERLAY: &[Check] = &[
    overlay_polygons_exist,
    groups_resolve,
    overlay_fields_set,
    overlay_fields_distinct,
    centers_in_range,
    groups_in_background,
    enough_fields,
];

fn missing_facies(cx: &Context<'_>) -> Option<ValidationError> {
    cx.active
        .iter()
        .any(|p| p.facies.is_none())
        .then_some(ValidationError::MissingFacies)
}

fn no_polygons(cx: &Context<'_>) -> Option<ValidationError> {
    cx.active.is_empty().then_some(ValidationError::NoPolygons)
}

fn fractions_normalized(cx: &Context<'_>) -> Option<ValidationError> {
    let mut sums: BTreeMap<FaciesId, Vec<f64>> = BTreeMap::new();
    for polygon in &cx.active {
        if let Some(facies) = polygon.facies {
            sums.entry(facies).or_default().push(polygon.fraction);
        }
    }
    sums.into_values()
        .any(|fractions| !sums_to_one(fractions, cx.tolerance))
        .then_some(ValidationError::FractionsNotNormalized)
}

fn probabilities_normalized(cx: &Context<'_>) -> Option<ValidationError> {
    let used: BTreeSet<FaciesId> = cx.active.iter().filter_map(|p| p.facies).collect();
    let probabilities = used.into_iter().map(|facies| {
        cx.facies
            .preview_probability(&cx.rule.parent, facies)
            .unwrap_or(0.0)
    });
    (!sums_to_one(probabilities, cx.tolerance)).then_some(ValidationError::ProbabilitiesNotNormalized)
}

fn background_fields_set(cx: &Context<'_>) -> Option<ValidationError> {
    let slots = &cx.rule.background_fields;
    let required = if cx.rule.is_bayfill() {
        BAYFILL_FIELDS
    } else {
        slots.len().max(cx.store.config().min_background_fields)
    };
    let set = slots.iter().flatten().count();
    (set != required || slots.len() != required)
        .then_some(ValidationError::MissingBackgroundFields { required })
}

fn referenced_fields(cx: &Context<'_>) -> Vec<FieldId> {
    let mut fields: Vec<FieldId> = cx.rule.assigned_background_fields().collect();
    if cx.rule.uses_overlay() {
        fields.extend(cx.overlay.iter().filter_map(|p| p.as_overlay()?.field));
    }
    fields
}

fn fields_valid(cx: &Context<'_>) -> Option<ValidationError> {
    referenced_fields(cx).into_iter().find_map(|id| match cx.fields.by_id(id) {
        None => Some(ValidationError::UnknownField),
        Some(field) if !field.is_valid() => Some(ValidationError::InvalidField(field.name.clone())),
        Some(_) => None,
    })
}

fn polygon_count(cx: &Context<'_>) -> Option<ValidationError> {
    let found = cx.rule.polygons.len();
    (found != BAYFILL_POLYGONS).then_some(ValidationError::WrongPolygonCount {
        expected: BAYFILL_POLYGONS,
        found,
    })
}

fn distinct_facies(cx: &Context<'_>) -> Option<ValidationError> {
    let distinct: BTreeSet<FaciesId> = cx.active.iter().filter_map(|p| p.facies).collect();
    (distinct.len() != BAYFILL_POLYGONS).then_some(ValidationError::RepeatedFacies)
}

fn slant_factors(cx: &Context<'_>) -> Option<ValidationError> {
    cx.active.iter().find_map(|p| {
        let bayfill = p.as_bayfill()?;
        (bayfill.name.has_slant_factor() && bayfill.slant_factor.is_none())
            .then_some(ValidationError::MissingSlantFactor(bayfill.name.as_str()))
    })
}

fn overlay_polygons_exist(cx: &Context<'_>) -> Option<ValidationError> {
    cx.overlay.is_empty().then_some(ValidationError::NoOverlayPolygons)
}

fn groups_resolve(cx: &Context<'_>) -> Option<ValidationError> {
    cx.overlay
        .iter()
        .filter_map(|p| p.as_overlay())
        .any(|o| !cx.store.has_group(o.group))
        .then_some(ValidationError::UnresolvedGroup)
}

fn overlay_fields_set(cx: &Context<'_>) -> Option<ValidationError> {
    cx.overlay
        .iter()
        .filter_map(|p| p.as_overlay())
        .any(|o| o.field.is_none())
        .then_some(ValidationError::MissingOverlayField)
}

fn overlay_fields_distinct(cx: &Context<'_>) -> Option<ValidationError> {
    let background: BTreeSet<FieldId> = cx.rule.assigned_background_fields().collect();
    cx.overlay
        .iter()
        .filter_map(|p| p.as_overlay()?.field)
        .any(|field| background.contains(&field))
        .then_some(ValidationError::OverlayFieldIsBackground)
}

fn centers_in_range(cx: &Context<'_>) -> Option<ValidationError> {
    cx.overlay
        .iter()
        .filter_map(|p| p.as_overlay())
        .any(|o| !in_unit_interval(o.center))
        .then_some(ValidationError::CenterOutOfRange)
}

fn groups_in_background(cx: &Context<'_>) -> Option<ValidationError> {
    let background: BTreeSet<FaciesId> = cx.background.iter().filter_map(|p| p.facies).collect();
    let groups: BTreeSet<_> = cx.overlay.iter().filter_map(|p| Some(p.as_overlay()?.group)).collect();
    groups
        .into_iter()
        .filter_map(|group| cx.store.group(group).ok())
        .any(|group| !group.facies.is_subset(&background))
        .then_some(ValidationError::GroupNotInBackground)
}

fn enough_fields(cx: &Context<'_>) -> Option<ValidationError> {
    let groups: BTreeSet<_> = cx.overlay.iter().filter_map(|p| Some(p.as_overlay()?.group)).collect();
    let required = cx.rule.background_fields.len() + groups.len();
    let available = cx.fields.list_available(&cx.rule.parent).len();
    (available < required).then_some(ValidationError::NotEnoughFields {
        available,
        required,
    })
}

/// Checks whether a rule is ready for simulation.
///
/// Checks run in a fixed order: the shared ones first, then the bayfill or
/// overlay ones. [`Validate::first`] stops at the first failure, which is
/// what [`Validate::error_message`] reports.
pub struct Validate {
    rule: RuleId,
}

impl Validate {
    /// Creates a new `Validate` query.
    #[must_use]
    pub fn new(rule: RuleId) -> Self {
        Self { rule }
    }

    /// The first failing check, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn first(
        &self,
        store: &RuleStore,
        facies: &dyn FaciesRegistry,
        fields: &dyn FieldRegistry,
    ) -> Result<Option<ValidationError>> {
        let cx = self.context(store, facies, fields)?;
        Ok(Self::checks(cx.rule).find_map(|check| check(&cx)))
    }

    /// Every failing check, in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn all(
        &self,
        store: &RuleStore,
        facies: &dyn FaciesRegistry,
        fields: &dyn FieldRegistry,
    ) -> Result<Vec<ValidationError>> {
        let cx = self.context(store, facies, fields)?;
        Ok(Self::checks(cx.rule).filter_map(|check| check(&cx)).collect())
    }

    /// Returns `true` if every check passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn is_ready(
        &self,
        store: &RuleStore,
        facies: &dyn FaciesRegistry,
        fields: &dyn FieldRegistry,
    ) -> Result<bool> {
        Ok(self.first(store, facies, fields)?.is_none())
    }

    /// Message of the first failing check.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule or one of its polygons is missing.
    pub fn error_message(
        &self,
        store: &RuleStore,
        facies: &dyn FaciesRegistry,
        fields: &dyn FieldRegistry,
    ) -> Result<Option<String>> {
        Ok(self.first(store, facies, fields)?.map(|e| e.to_string()))
    }

    fn checks(rule: &RuleData) -> impl Iterator<Item = &'static Check> {
        let variant: &'static [Check] = if rule.is_bayfill() { BAYFILL } else { &[] };
        let overlay: &'static [Check] = if rule.uses_overlay() { OVERLAY } else { &[] };
        SHARED.iter().chain(variant).chain(overlay)
    }

    fn context<'a>(
        &self,
        store: &'a RuleStore,
        facies: &'a dyn FaciesRegistry,
        fields: &'a dyn FieldRegistry,
    ) -> Result<Context<'a>> {
        let strip = |polygons: Vec<(_, &'a PolygonData)>| -> Vec<&'a PolygonData> {
            polygons.into_iter().map(|(_, p)| p).collect()
        };
        Ok(Context {
            store,
            rule: store.rule(self.rule)?,
            facies,
            fields,
            active: strip(store.active_polygons(self.rule)?),
            background: strip(store.background_polygons(self.rule)?),
            overlay: strip(store.overlay_polygons(self.rule)?),
            tolerance: store.config().tolerance,
        })
    }
}

//! Multi-source lookup across historical stage ids

use contracts::{Deal, StageField};

/// First non-empty value of `field` over `stage_ids`, in declared order
///
/// A deal can carry residual properties from stage ids of pipeline
/// configurations that are no longer active.
pub fn get_first_value<'a>(deal: &'a Deal, stage_ids: &[&str], field: StageField) -> Option<&'a str> {
    stage_ids
        .iter()
        .find_map(|id| deal.non_empty(&field.property_name(id)))
}

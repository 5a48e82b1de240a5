//! Partner Filter

use contracts::{Deal, PARTNER_NAME, PIPELINE};

/// Whether `deal` belongs to the partner identified by `keyword`
///
/// Pipeline must equal `active_pipeline_id` exactly; the partner name must
/// contain `keyword`, case-insensitively. An absent partner name never matches.
pub fn matches_partner(deal: &Deal, active_pipeline_id: &str, keyword: &str) -> bool {
    if deal.value(PIPELINE) != active_pipeline_id {
        return false;
    }
    match deal.non_empty(PARTNER_NAME) {
        Some(name) => name.to_lowercase().contains(&keyword.to_lowercase()),
        None => false,
    }
}

/// Deals of one partner, in fetch order
pub fn filter_deals<'a>(deals: &'a [Deal], active_pipeline_id: &str, keyword: &str) -> Vec<&'a Deal> {
    deals
        .iter()
        .filter(|deal| matches_partner(deal, active_pipeline_id, keyword))
        .collect()
}

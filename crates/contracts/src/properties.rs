//! CRM property names read by the exporter.

/// Deal name
pub const DEAL_NAME: &str = "dealname";
/// Creation timestamp
pub const CREATE_DATE: &str = "createdate";
/// Deal amount
pub const AMOUNT: &str = "amount";
/// Current stage id
pub const DEAL_STAGE: &str = "dealstage";
/// Pipeline id
pub const PIPELINE: &str = "pipeline";
/// Free-text partner name
pub const PARTNER_NAME: &str = "partner_label_name";
pub const TTV_ALL_TIME: &str = "ttv_all_time";
pub const INSTORE_CATEGORY: &str = "instore_category";
pub const OFFLINE_ANNUAL_REVENUE: &str = "offline_annual_revenue";
pub const FIRST_ORDER_TTV: &str = "first_order_ttv";
/// Milliseconds between creation and KYC
pub const DAYS_BETWEEN_CREATE_AND_KYC: &str = "days_between_create_and_kyc";
pub const RISK_CHECK_STATUS: &str = "risk_check_status";
pub const STORE_TYPE: &str = "store_type";
pub const CUSTOMER_TIER: &str = "third_party___customer_tier";
pub const REMUNERATION: &str = "third_party___remuneration";
pub const AGENT_SOURCE_NAME: &str = "original_agent_source_name";
pub const FIXED_FEE: &str = "third_party___fixed_fee";
pub const PRODUCTS_FEE: &str = "third_party___products__fee";
pub const AGENT_EMAIL: &str = "original_agent_email";

/// Fixed descriptive fields requested on every deal
pub const DESCRIPTIVE_PROPERTIES: [&str; 11] = [
    DEAL_NAME,
    CREATE_DATE,
    AMOUNT,
    DEAL_STAGE,
    PIPELINE,
    PARTNER_NAME,
    TTV_ALL_TIME,
    INSTORE_CATEGORY,
    OFFLINE_ANNUAL_REVENUE,
    FIRST_ORDER_TTV,
    DAYS_BETWEEN_CREATE_AND_KYC,
];

/// Risk / store-type pair
pub const RISK_PROPERTIES: [&str; 2] = [RISK_CHECK_STATUS, STORE_TYPE];

/// Fields only shown for some partners, always requested
pub const PARTNER_PROPERTIES: [&str; 6] = [
    CUSTOMER_TIER,
    REMUNERATION,
    AGENT_SOURCE_NAME,
    FIXED_FEE,
    PRODUCTS_FEE,
    AGENT_EMAIL,
];

/// Per-stage property families.
///
/// The CRM exposes one property per stage id for each family, e.g.
/// `hs_v2_date_entered_1834011866`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageField {
    /// Timestamp the deal entered the stage
    DateEntered,
    /// Timestamp the deal left the stage
    DateExited,
    /// Cumulative milliseconds spent in the stage
    CumulativeTime,
}

impl StageField {
    /// Property name prefix for this family
    pub fn prefix(self) -> &'static str {
        match self {
            Self::DateEntered => "hs_v2_date_entered_",
            Self::DateExited => "hs_v2_date_exited_",
            Self::CumulativeTime => "hs_v2_cumulative_time_in_",
        }
    }

    /// Property name for a given stage id
    pub fn property_name(self, stage_id: &str) -> String {
        format!("{}{}", self.prefix(), stage_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_field_property_names() {
        assert_eq!(
            StageField::DateEntered.property_name("1834011866"),
            "hs_v2_date_entered_1834011866"
        );
        assert_eq!(
            StageField::DateExited.property_name("1"),
            "hs_v2_date_exited_1"
        );
        assert_eq!(
            StageField::CumulativeTime.property_name("9"),
            "hs_v2_cumulative_time_in_9"
        );
    }
}

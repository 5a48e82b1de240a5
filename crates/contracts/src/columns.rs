//! Output column schema
//!
//! The base column order is fixed (A..T). Number formats are attached to the
//! columns themselves so format offsets always follow the column order.

use serde::{Deserialize, Serialize};

use crate::properties;

/// Spreadsheet number format applied to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Currency, two decimals, euro suffix
    Euro,
    /// Plain two-decimal number (minutes)
    Minutes,
    /// Two decimals with an `h` suffix
    Hours,
}

impl NumberFormat {
    /// Spreadsheet format pattern
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Euro => "#,##0.00\"€\"",
            Self::Minutes => "0.00",
            Self::Hours => "0.00\"h\"",
        }
    }
}

/// Number format bound to a 0-based column index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFormat {
    pub column: usize,
    pub format: NumberFormat,
}

/// The 20 base columns shared by every partner, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseColumn {
    DealId,
    DealName,
    CreateDate,
    Amount,
    Stage,
    PartnerName,
    TtvAllTime,
    InstoreCategory,
    DateEnteredKyc,
    DateEnteredOnboarding,
    OfflineAnnualRevenue,
    FirstOrderTtv,
    MinutesCreateToKyc,
    DateEnteredProposal,
    DateExitedProposal,
    MinutesInProposal,
    HoursInProposal,
    RiskCheckStatus,
    StoreType,
    DealSize,
}

impl BaseColumn {
    /// All base columns in output order
    pub const ALL: [BaseColumn; 20] = [
        Self::DealId,
        Self::DealName,
        Self::CreateDate,
        Self::Amount,
        Self::Stage,
        Self::PartnerName,
        Self::TtvAllTime,
        Self::InstoreCategory,
        Self::DateEnteredKyc,
        Self::DateEnteredOnboarding,
        Self::OfflineAnnualRevenue,
        Self::FirstOrderTtv,
        Self::MinutesCreateToKyc,
        Self::DateEnteredProposal,
        Self::DateExitedProposal,
        Self::MinutesInProposal,
        Self::HoursInProposal,
        Self::RiskCheckStatus,
        Self::StoreType,
        Self::DealSize,
    ];

    /// Header text
    pub fn header(self) -> &'static str {
        match self {
            Self::DealId => "Deal ID",
            Self::DealName => "Deal name",
            Self::CreateDate => "Deal Create date",
            Self::Amount => "Deal Amount",
            Self::Stage => "Deal stage",
            Self::PartnerName => "Partner Name",
            Self::TtvAllTime => "Deal TTV All Time",
            Self::InstoreCategory => "Deal InStore Category",
            Self::DateEnteredKyc => "Deal Date entered \"KYC Pending Approval\"",
            Self::DateEnteredOnboarding => "Deal Date entered \"Onboarding Completed\"",
            Self::OfflineAnnualRevenue => "Deal Offline Annual Revenue",
            Self::FirstOrderTtv => "Deal First Order TTV",
            Self::MinutesCreateToKyc => "Deal Days between Create and KYC (min)",
            Self::DateEnteredProposal => "Deal Date entered \"Proposal sent\"",
            Self::DateExitedProposal => "Deal Date exited \"Proposal sent\"",
            Self::MinutesInProposal => "Deal Cumulative time in \"Proposal sent\" (min)",
            Self::HoursInProposal => "Ore in Proposal sent",
            Self::RiskCheckStatus => "Risk Check Status",
            Self::StoreType => "Store Type",
            Self::DealSize => "Deal Size",
        }
    }

    /// Number format for the column, if any
    pub fn number_format(self) -> Option<NumberFormat> {
        match self {
            Self::Amount | Self::TtvAllTime | Self::OfflineAnnualRevenue | Self::FirstOrderTtv => {
                Some(NumberFormat::Euro)
            }
            Self::MinutesCreateToKyc | Self::MinutesInProposal => Some(NumberFormat::Minutes),
            Self::HoursInProposal => Some(NumberFormat::Hours),
            _ => None,
        }
    }
}

/// Partner-conditional pass-through columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtraColumn {
    CustomerTier,
    Remuneration,
    AgentSourceName,
    FixedFee,
    ProductsFee,
    AgentEmail,
}

impl ExtraColumn {
    pub fn header(self) -> &'static str {
        match self {
            Self::CustomerTier => "Third Party - Customer Tier",
            Self::Remuneration => "Third Party - Remuneration",
            Self::AgentSourceName => "Original Agent Source Name",
            Self::FixedFee => "Third Party - Fixed Fee",
            Self::ProductsFee => "Third Party - Products Fee",
            Self::AgentEmail => "Original Agent Email",
        }
    }

    /// CRM property copied verbatim into the column
    pub fn property(self) -> &'static str {
        match self {
            Self::CustomerTier => properties::CUSTOMER_TIER,
            Self::Remuneration => properties::REMUNERATION,
            Self::AgentSourceName => properties::AGENT_SOURCE_NAME,
            Self::FixedFee => properties::FIXED_FEE,
            Self::ProductsFee => properties::PRODUCTS_FEE,
            Self::AgentEmail => properties::AGENT_EMAIL,
        }
    }
}

/// Closed set of partner schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerKind {
    /// Base columns only
    #[default]
    Default,
    /// Base + 5 third-party columns
    Attitude,
    /// Base + 3 agent / fee columns
    DeutscheBank,
}

impl PartnerKind {
    /// Kind selected by exact keyword match; unknown keywords get `Default`
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "Attitude" => Self::Attitude,
            "Deutsche Bank" => Self::DeutscheBank,
            _ => Self::Default,
        }
    }

    /// Extra columns appended after the base columns
    pub fn extra_columns(self) -> &'static [ExtraColumn] {
        match self {
            Self::Default => &[],
            Self::Attitude => &[
                ExtraColumn::CustomerTier,
                ExtraColumn::Remuneration,
                ExtraColumn::AgentSourceName,
                ExtraColumn::FixedFee,
                ExtraColumn::ProductsFee,
            ],
            Self::DeutscheBank => &[
                ExtraColumn::AgentEmail,
                ExtraColumn::CustomerTier,
                ExtraColumn::ProductsFee,
            ],
        }
    }

    /// Total number of cells in a row for this kind
    pub fn column_count(self) -> usize {
        BaseColumn::ALL.len() + self.extra_columns().len()
    }

    /// Full header row
    pub fn headers(self) -> Vec<String> {
        BaseColumn::ALL
            .iter()
            .map(|c| c.header())
            .chain(self.extra_columns().iter().map(|c| c.header()))
            .map(str::to_string)
            .collect()
    }

    /// Number formats, by 0-based column index
    pub fn column_formats(self) -> Vec<ColumnFormat> {
        BaseColumn::ALL
            .iter()
            .enumerate()
            .filter_map(|(column, c)| c.number_format().map(|format| ColumnFormat { column, format }))
            .collect()
    }
}

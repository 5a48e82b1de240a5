//! Metric Deriver
//!
//! Pure row assembly: no I/O, only the fetched deal, the run's label tables
//! and an injected clock.

use chrono::{DateTime, Utc};
use contracts::properties as p;
use contracts::{
    stage_ids, BaseColumn, CategoryLabelTable, CellValue, Deal, OutputRow,
    PartnerKind, PartnerSpec, PipelineDefinition, SheetTable, StageField, StageLabelTable,
    StageRole,
};
use tracing::debug;

use crate::lookup::get_first_value;
use crate::normalize::{format_timestamp, ms_to_minutes, parse_number, parse_timestamp};
use crate::sizing::classify_deal_size;
use crate::timing::elapsed_hours;

/// Read-only inputs shared by every derivation of a run
#[derive(Debug, Clone)]
pub struct DerivationContext<'a> {
    stage_labels: &'a StageLabelTable,
    category_labels: &'a CategoryLabelTable,
    proposal_ids: Vec<&'a str>,
    kyc_ids: Vec<&'a str>,
    onboarding_ids: Vec<&'a str>,
    now: DateTime<Utc>,
}

impl<'a> DerivationContext<'a> {
    pub fn new(
        pipelines: &'a [PipelineDefinition],
        stage_labels: &'a StageLabelTable,
        category_labels: &'a CategoryLabelTable,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stage_labels,
            category_labels,
            proposal_ids: stage_ids(pipelines, StageRole::ProposalSent),
            kyc_ids: stage_ids(pipelines, StageRole::KycPending),
            onboarding_ids: stage_ids(pipelines, StageRole::OnboardingCompleted),
            now,
        }
    }
}

/// Values gathered once per deal before the columns are laid out
struct StageValues<'d> {
    stage_label: &'d str,
    entered_kyc: Option<&'d str>,
    entered_onboarding: Option<&'d str>,
    entered_proposal: Option<&'d str>,
    exited_proposal: Option<&'d str>,
    time_in_proposal: Option<&'d str>,
}

impl<'d> StageValues<'d> {
    fn collect(deal: &'d Deal, ctx: &'d DerivationContext<'_>) -> Self {
        Self {
            stage_label: ctx.stage_labels.resolve(deal.value(p::DEAL_STAGE)),
            entered_kyc: get_first_value(deal, &ctx.kyc_ids, StageField::DateEntered),
            entered_onboarding: get_first_value(deal, &ctx.onboarding_ids, StageField::DateEntered),
            entered_proposal: get_first_value(deal, &ctx.proposal_ids, StageField::DateEntered),
            exited_proposal: get_first_value(deal, &ctx.proposal_ids, StageField::DateExited),
            time_in_proposal: get_first_value(deal, &ctx.proposal_ids, StageField::CumulativeTime),
        }
    }
}

fn date_cell(raw: Option<&str>) -> CellValue {
    raw.and_then(format_timestamp).into()
}

fn number_cell(raw: &str) -> CellValue {
    parse_number(raw).into()
}

fn minutes_cell(raw: Option<&str>) -> CellValue {
    raw.and_then(ms_to_minutes).into()
}

fn base_cell(column: BaseColumn, deal: &Deal, stage: &StageValues<'_>, ctx: &DerivationContext<'_>) -> CellValue {
    match column {
        BaseColumn::DealId => CellValue::text(deal.id.as_str()),
        BaseColumn::DealName => CellValue::text(deal.value(p::DEAL_NAME)),
        BaseColumn::CreateDate => date_cell(deal.property(p::CREATE_DATE)),
        BaseColumn::Amount => number_cell(deal.value(p::AMOUNT)),
        BaseColumn::Stage => CellValue::text(stage.stage_label),
        BaseColumn::PartnerName => CellValue::text(deal.value(p::PARTNER_NAME)),
        BaseColumn::TtvAllTime => number_cell(deal.value(p::TTV_ALL_TIME)),
        BaseColumn::InstoreCategory => {
            CellValue::text(ctx.category_labels.resolve(deal.value(p::INSTORE_CATEGORY)))
        }
        BaseColumn::DateEnteredKyc => date_cell(stage.entered_kyc),
        BaseColumn::DateEnteredOnboarding => date_cell(stage.entered_onboarding),
        BaseColumn::OfflineAnnualRevenue => number_cell(deal.value(p::OFFLINE_ANNUAL_REVENUE)),
        BaseColumn::FirstOrderTtv => number_cell(deal.value(p::FIRST_ORDER_TTV)),
        BaseColumn::MinutesCreateToKyc => minutes_cell(deal.property(p::DAYS_BETWEEN_CREATE_AND_KYC)),
        BaseColumn::DateEnteredProposal => date_cell(stage.entered_proposal),
        BaseColumn::DateExitedProposal => date_cell(stage.exited_proposal),
        BaseColumn::MinutesInProposal => minutes_cell(stage.time_in_proposal),
        BaseColumn::HoursInProposal => {
            let entry = stage.entered_proposal.and_then(parse_timestamp);
            let exit = stage.exited_proposal.and_then(parse_timestamp);
            elapsed_hours(entry.as_ref(), exit.as_ref(), stage.stage_label, ctx.now).into()
        }
        BaseColumn::RiskCheckStatus => CellValue::text(deal.value(p::RISK_CHECK_STATUS)),
        BaseColumn::StoreType => CellValue::text(deal.value(p::STORE_TYPE)),
        BaseColumn::DealSize => {
            classify_deal_size(deal.value(p::AMOUNT), deal.value(p::STORE_TYPE))
                .map(|size| CellValue::text(size.label()))
                .unwrap_or_default()
        }
    }
}

/// Output row of one deal for a partner schema
///
/// Always `kind.column_count()` cells, in header order.
pub fn derive(deal: &Deal, ctx: &DerivationContext<'_>, kind: PartnerKind) -> OutputRow {
    let stage = StageValues::collect(deal, ctx);

    let mut row: OutputRow = BaseColumn::ALL
        .iter()
        .map(|&column| base_cell(column, deal, &stage, ctx))
        .collect();

    row.extend(
        kind.extra_columns()
            .iter()
            .map(|extra| CellValue::text(deal.value(extra.property()))),
    );
    row
}

/// Complete table of one partner
pub fn build_table(deals: &[&Deal], ctx: &DerivationContext<'_>, partner: &PartnerSpec) -> SheetTable {
    let kind = partner.kind();
    let rows: Vec<OutputRow> = deals.iter().map(|deal| derive(deal, ctx, kind)).collect();
    debug!(
        partner = %partner.keyword,
        kind = ?kind,
        rows = rows.len(),
        "partner rows derived"
    );
    SheetTable::new(&partner.sheet_name, &partner.keyword, kind, rows)
}

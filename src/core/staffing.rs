use chrono::NaiveDate;
use serde::Serialize;

use super::ledger::ResourceDistribution;
use super::reference::ReferenceData;
use super::types::StaffMember;
use crate::error::{FundError, Result};

/// Stable costs the staff in service absorbs from the non-executive fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsorbedCosts {
    pub progression: f64,
    pub sector_allowance: f64,
    pub total: f64,
}

/// Parses `YYYY-MM-DD`; `None` for anything else, including years chrono
/// cannot represent.
fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Fraction of `year` the member was in service, in [0, 1].
pub fn service_ratio(member: &StaffMember, year: u16) -> f64 {
    if member.full_year_service {
        return 1.0;
    }
    if member.hire_date.is_none() && member.termination_date.is_none() {
        return 0.0;
    }

    let year = i32::from(year);
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return 0.0;
    };
    let start = match member.hire_date.as_deref() {
        Some(raw) => parse_iso_date(raw),
        None => Some(year_start),
    };
    let end = match member.termination_date.as_deref() {
        Some(raw) => parse_iso_date(raw),
        None => Some(year_end),
    };
    let (Some(start), Some(end)) = (start, end) else {
        return 0.0;
    };
    if start > end {
        return 0.0;
    }

    let start = start.max(year_start);
    let end = end.min(year_end);
    if end < start {
        return 0.0;
    }
    let days_in_year = ((year_end - year_start).num_days() + 1) as f64;
    (((end - start).num_days() + 1) as f64 / days_in_year).clamp(0.0, 1.0)
}

fn part_time_factor(member: &StaffMember) -> f64 {
    match member.part_time_percentage {
        Some(p) if p.is_finite() => (p / 100.0).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

fn needs_calendar(member: &StaffMember) -> bool {
    !member.full_year_service && (member.hire_date.is_some() || member.termination_date.is_some())
}

/// Historical progression pay and sector allowance carried by `staff` in
/// `year`, prorated by part-time share and days of service.
pub fn absorbed_stable_uses(
    reference: &ReferenceData,
    year: u16,
    staff: &[StaffMember],
) -> Result<AbsorbedCosts> {
    if year == 0 && staff.iter().any(needs_calendar) {
        return Err(FundError::invalid_input(
            "referenceYear is required to prorate staff with hire or termination dates",
        ));
    }

    let mut costs = AbsorbedCosts::default();
    for member in staff {
        let Some(area) = member.area else {
            continue;
        };
        let weight = part_time_factor(member) * service_ratio(member, year);
        if let Some(value) = member
            .progression_level
            .as_deref()
            .and_then(|level| reference.progression_value(area, level))
        {
            costs.progression += value * weight;
        }
        if let Some(value) = reference.sector_allowance(area) {
            costs.sector_allowance += value * weight;
        }
    }
    costs.total = costs.progression + costs.sector_allowance;

    log::debug!(
        "absorbed stable uses for {year}: progression {:.2}, sector allowance {:.2}",
        costs.progression,
        costs.sector_allowance
    );
    Ok(costs)
}

/// Distribution ledger with the two absorbed stable uses written in.
pub fn with_absorbed_stable_uses(
    distribution: &ResourceDistribution,
    costs: &AbsorbedCosts,
) -> ResourceDistribution {
    ResourceDistribution {
        historical_progressions: Some(costs.progression),
        sector_allowance: Some(costs.sector_allowance),
        ..distribution.clone()
    }
}

use serde::Serialize;

use super::reference::ReferenceData;
use super::types::{
    ComponentKind, EmployeeCategory, FundComponent, FundInput, HeadcountEntry, amount,
};

/// Headcount-variation adjustment of the 2016 ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CeilingAdjustment {
    pub original_ceiling: f64,
    pub baseline_2018: f64,
    pub headcount_2018: f64,
    pub headcount_reference_year: f64,
    pub per_capita_2018: f64,
    pub raw_adjustment: f64,
    pub effective_adjustment: f64,
    pub adjusted_ceiling: f64,
}

fn part_time_fraction(entry: &HeadcountEntry) -> f64 {
    match entry.part_time_percentage {
        Some(p) if p.is_finite() => (p / 100.0).clamp(0.0, 1.0),
        _ => 1.0,
    }
}

fn months_paid_fraction(entry: &HeadcountEntry) -> f64 {
    match entry.months_paid {
        Some(m @ 1..=12) => f64::from(m) / 12.0,
        _ => 1.0,
    }
}

/// Contribution of one employee, always in [0, 1].
pub fn equivalent_fte(entry: &HeadcountEntry, prorate_months: bool) -> f64 {
    let fte = part_time_fraction(entry);
    if prorate_months {
        fte * months_paid_fraction(entry)
    } else {
        fte
    }
}

pub fn equivalent_headcount(entries: &[HeadcountEntry], prorate_months: bool) -> f64 {
    entries
        .iter()
        .map(|e| equivalent_fte(e, prorate_months))
        .sum()
}

fn per_capita(baseline: f64, headcount: f64) -> f64 {
    if baseline > 0.0 && headcount > 0.0 {
        baseline / headcount
    } else {
        0.0
    }
}

/// Raw per-capita variation for a given 2018 baseline; may be negative.
pub fn headcount_variation(
    baseline_2018: f64,
    headcount_2018: &[HeadcountEntry],
    headcount_reference_year: &[HeadcountEntry],
) -> f64 {
    let before = equivalent_headcount(headcount_2018, false);
    let after = equivalent_headcount(headcount_reference_year, true);
    per_capita(baseline_2018, before) * (after - before)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stable increment the non-executive fund is entitled to for headcount
/// growth, priced on the non-executive 2018 baseline alone.
pub fn expected_headcount_increment(input: &FundInput) -> f64 {
    let raw = headcount_variation(
        amount(input.historical.non_executive_fund_2018),
        &input.annual.headcount_2018,
        &input.annual.headcount_reference_year,
    );
    round_cents(raw.max(0.0))
}

pub fn ceiling_adjustment(input: &FundInput) -> CeilingAdjustment {
    let original_ceiling = input.historical.ceiling_2016();
    let baseline_2018 = input.historical.baseline_2018();
    let headcount_2018 = equivalent_headcount(&input.annual.headcount_2018, false);
    let headcount_reference_year =
        equivalent_headcount(&input.annual.headcount_reference_year, true);
    let per_capita_2018 = per_capita(baseline_2018, headcount_2018);
    let raw_adjustment = per_capita_2018 * (headcount_reference_year - headcount_2018);
    // A shrinking workforce never lowers the ceiling.
    let effective_adjustment = raw_adjustment.max(0.0);

    log::debug!(
        "ceiling adjustment: fte 2018 {headcount_2018:.4}, fte ref {headcount_reference_year:.4}, per capita {per_capita_2018:.2}, raw {raw_adjustment:.2}"
    );

    CeilingAdjustment {
        original_ceiling,
        baseline_2018,
        headcount_2018,
        headcount_reference_year,
        per_capita_2018,
        raw_adjustment,
        effective_adjustment,
        adjusted_ceiling: original_ceiling + effective_adjustment,
    }
}

impl CeilingAdjustment {
    pub fn component(&self, reference: &ReferenceData) -> Option<FundComponent> {
        (self.effective_adjustment > 0.0).then(|| FundComponent {
            description: "Adeguamento fondo per variazione personale (base 2018)".to_string(),
            amount: self.effective_adjustment,
            reference: reference.legal_references.art23_dlgs75_2017.clone(),
            kind: ComponentKind::Stable,
            excluded_from_ceiling: false,
        })
    }
}

/// Keeps the 2018 average per-capita value constant for the whole workforce
/// (Art. 33 DL 34/2019). Informational: it does not enter the ceiling test.
pub fn per_capita_invariance(input: &FundInput, reference: &ReferenceData) -> FundComponent {
    let staff_2018 = amount(input.historical.staff_in_service_2018);
    let current_staff = input.annual.staff_count(|_| true);
    let value = per_capita(input.historical.ceiling_2016(), staff_2018);
    let adjustment = if value > 0.0 {
        (current_staff - staff_2018) * value
    } else {
        0.0
    };

    FundComponent {
        description: "Adeguamento invarianza valore medio pro-capite 2018".to_string(),
        amount: adjustment,
        reference: reference.legal_references.art33_dl34_2019.clone(),
        kind: ComponentKind::Stable,
        excluded_from_ceiling: false,
    }
}

/// Stable CCNL increments priced per head.
pub fn ccnl_stable_increments(input: &FundInput, reference: &ReferenceData) -> Vec<FundComponent> {
    let mut increments = Vec::new();
    let staff_2018 = amount(input.historical.staff_in_service_2018);
    if staff_2018 > 0.0 {
        let rate = reference.per_capita.art67_ccnl_2018;
        increments.push(FundComponent {
            description: format!("Incremento stabile CCNL ({rate:.2}€ pro-capite su personale 2018)"),
            amount: staff_2018 * rate,
            reference: reference.legal_references.art67_ccnl2018.clone(),
            kind: ComponentKind::Stable,
            excluded_from_ceiling: false,
        });
    }

    let non_executive_staff = input.annual.staff_count(|c| {
        matches!(
            c,
            EmployeeCategory::NonExecutive | EmployeeCategory::HighQualification
        )
    });
    if non_executive_staff > 0.0 {
        let rate = reference.per_capita.art79_ccnl_2022_b;
        increments.push(FundComponent {
            description: format!(
                "Incremento stabile CCNL ({rate:.2}€ pro-capite personale non dirigente ed EQ)"
            ),
            amount: non_executive_staff * rate,
            reference: format!("{} lett. b)", reference.legal_references.art79_ccnl2022),
            kind: ComponentKind::Stable,
            excluded_from_ceiling: false,
        });
    }

    increments
}

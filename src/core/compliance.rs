//! Fixed battery of compliance checks run over a computed fund.
//!
//! Checks never fail the computation: every outcome, including violations,
//! comes back as a [`ComplianceCheck`] with its severity.

use super::engine::HALF_CENT;
use super::ledger::{STABLE_USES, VARIABLE_USES, allocated_sum};
use super::limits::expected_headcount_increment;
use super::reference::ReferenceData;
use super::types::{
    CalculatedFund, CheckId, ComplianceCheck, FundInput, Severity, SimulatorResult, amount,
};

/// Minimum share of the high-qualification fund reserved for result pay.
const MIN_RESULT_PAY_SHARE: f64 = 0.15;

struct Outcome {
    id: CheckId,
    description: &'static str,
    severity: Severity,
    actual_value: Option<f64>,
    limit: Option<f64>,
    message: String,
    reference: String,
}

impl From<Outcome> for ComplianceCheck {
    fn from(o: Outcome) -> Self {
        ComplianceCheck {
            id: o.id,
            description: o.description.to_string(),
            compliant: o.severity == Severity::Info,
            actual_value: o.actual_value,
            limit: o.limit,
            message: o.message,
            reference: o.reference,
            severity: o.severity,
        }
    }
}

pub fn run_compliance_checks(
    reference: &ReferenceData,
    input: &FundInput,
    fund: &CalculatedFund,
    simulator: &SimulatorResult,
) -> Vec<ComplianceCheck> {
    let mut outcomes = vec![ceiling_check(reference, fund)];
    outcomes.extend(headcount_increment_check(reference, input));
    outcomes.extend(distribution_checks(reference, input, fund));
    outcomes.extend(high_qualification_checks(reference, input, fund));
    outcomes.extend(simulator_coherence_check(reference, input, simulator));

    let checks: Vec<ComplianceCheck> = outcomes.into_iter().map(ComplianceCheck::from).collect();
    let failing = checks.iter().filter(|c| !c.compliant).count();
    log::debug!("compliance: {} checks, {failing} not compliant", checks.len());
    checks
}

fn ceiling_check(reference: &ReferenceData, fund: &CalculatedFund) -> Outcome {
    let (description, severity, message) = match fund.ceiling_excess {
        Some(excess) => (
            "Superamento limite Art. 23 c.2 D.Lgs. 75/2017 (Fondo 2016)",
            Severity::Error,
            format!(
                "Rilevato superamento del limite di € {excess:.2}. È necessario applicare una riduzione di pari importo su uno o più fondi."
            ),
        ),
        None => (
            "Rispetto limite Art. 23 c.2 D.Lgs. 75/2017 (Fondo 2016)",
            Severity::Info,
            "Il totale delle risorse soggette al limite rispetta il tetto 2016 (come modificato)."
                .to_string(),
        ),
    };
    Outcome {
        id: CheckId::Ceiling2016,
        description,
        severity,
        actual_value: Some(fund.subject_to_ceiling),
        limit: Some(fund.adjusted_ceiling),
        message,
        reference: reference.legal_references.art23_dlgs75_2017.clone(),
    }
}

fn headcount_increment_check(reference: &ReferenceData, input: &FundInput) -> Option<Outcome> {
    let expected = expected_headcount_increment(input);
    if expected <= 0.0 {
        return None;
    }

    let entered = input.non_executive.headcount_increment;
    let shortfall = entered.map_or(expected, |v| expected - amount(Some(v)));
    let (severity, message) = if entered.is_none() || shortfall > HALF_CENT {
        (
            Severity::Warning,
            format!(
                "L'importo inserito è inferiore di € {shortfall:.2} rispetto a quanto calcolato: le risorse per l'incremento potrebbero non essere utilizzate a pieno."
            ),
        )
    } else {
        (
            Severity::Info,
            "L'importo inserito è conforme a quanto calcolato per l'incremento.".to_string(),
        )
    };

    Some(Outcome {
        id: CheckId::HeadcountIncrementConsistency,
        description: "Verifica dell'incremento per aumento della consistenza organica del personale",
        severity,
        actual_value: entered,
        limit: Some(expected),
        message,
        reference: reference.legal_references.art79_c1c_ccnl2022.clone(),
    })
}

fn distribution_checks(
    reference: &ReferenceData,
    input: &FundInput,
    fund: &CalculatedFund,
) -> Vec<Outcome> {
    let available = fund.breakdown.non_executive.total;
    if available <= 0.0 {
        return Vec::new();
    }

    let refs = &reference.legal_references;
    let stable_uses = allocated_sum(STABLE_USES, &input.distribution);
    let allocated = stable_uses + allocated_sum(VARIABLE_USES, &input.distribution);
    let remaining = available - allocated;
    let mut outcomes = Vec::new();

    if stable_uses > available {
        outcomes.push(Outcome {
            id: CheckId::DistributionStableExceedsTotal,
            description: "Costi parte stabile superiori alle risorse disponibili",
            severity: Severity::Error,
            actual_value: Some(stable_uses),
            limit: Some(available),
            message: "I costi fissi della parte stabile superano il totale da distribuire: impossibile allocare la parte variabile."
                .to_string(),
            reference: refs.sound_financial_management.clone(),
        });
    }

    if remaining < -HALF_CENT {
        outcomes.push(Outcome {
            id: CheckId::DistributionOverBudget,
            description: "Superamento del budget nella distribuzione risorse dipendenti",
            severity: Severity::Error,
            actual_value: Some(allocated),
            limit: Some(available),
            message: format!(
                "L'importo allocato supera le risorse disponibili di € {:.2}.",
                remaining.abs()
            ),
            reference: refs.art80_ccnl2022.clone(),
        });
    } else {
        outcomes.push(Outcome {
            id: CheckId::DistributionWithinBudget,
            description: "Rispetto del budget nella distribuzione risorse dipendenti",
            severity: Severity::Info,
            actual_value: Some(allocated),
            limit: Some(available),
            message: format!(
                "L'allocazione delle risorse rispetta il budget. Rimanenza: € {remaining:.2}."
            ),
            reference: refs.art80_ccnl2022.clone(),
        });
    }

    outcomes
}

fn high_qualification_checks(
    reference: &ReferenceData,
    input: &FundInput,
    fund: &CalculatedFund,
) -> Vec<Outcome> {
    let available = fund.breakdown.high_qualification.total;
    if available <= 0.0 {
        return Vec::new();
    }

    let refs = &reference.legal_references;
    let ledger = &input.high_qualification;
    let spent = ledger.spend_total();
    let mut outcomes = Vec::new();

    outcomes.push(if spent > available {
        Outcome {
            id: CheckId::HighQualificationOverBudget,
            description: "Superamento budget nella distribuzione risorse EQ",
            severity: Severity::Error,
            actual_value: Some(spent),
            limit: Some(available),
            message: format!(
                "Le retribuzioni di posizione e risultato EQ superano il fondo disponibile di € {:.2}.",
                spent - available
            ),
            reference: refs.sound_financial_management.clone(),
        }
    } else {
        Outcome {
            id: CheckId::HighQualificationWithinBudget,
            description: "Rispetto del budget nella distribuzione risorse EQ",
            severity: Severity::Info,
            actual_value: Some(spent),
            limit: Some(available),
            message: "L'allocazione delle risorse per le EQ rispetta il budget.".to_string(),
            reference: refs.sound_financial_management.clone(),
        }
    });

    let minimum = available * MIN_RESULT_PAY_SHARE;
    let result_pay = amount(ledger.result_pay);
    if result_pay < minimum {
        outcomes.push(Outcome {
            id: CheckId::HighQualificationMinimumResultShare,
            description: "Verifica quota minima retribuzione di risultato EQ",
            severity: Severity::Warning,
            actual_value: Some(result_pay),
            limit: Some(minimum),
            message: "La quota destinata alla retribuzione di risultato è inferiore al 15% minimo previsto dal CCNL."
                .to_string(),
            reference: format!("{} c.4", refs.art17_ccnl2022),
        });
    }

    outcomes
}

fn simulator_coherence_check(
    reference: &ReferenceData,
    input: &FundInput,
    simulator: &SimulatorResult,
) -> Option<Outcome> {
    let ceiling = simulator.phase5_net_increment;
    let entered = amount(input.non_executive.pa_decree_increment);
    (ceiling > 0.0 && entered > ceiling).then(|| Outcome {
        id: CheckId::SimulatorCoherence,
        description: "Incoerenza tra simulatore e incremento Decreto PA",
        severity: Severity::Warning,
        actual_value: Some(entered),
        limit: Some(ceiling),
        message: "L'incremento Decreto PA inserito supera il valore massimo calcolato dal simulatore."
            .to_string(),
        reference: reference.legal_references.art14_dl25_2025.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::aggregate;
    use crate::core::ledger::AllocationLine;
    use crate::core::types::HeadcountEntry;

    fn reference() -> ReferenceData {
        ReferenceData::bundled().expect("bundled table is valid")
    }

    fn sample_input() -> FundInput {
        let mut input = FundInput::default();
        input.historical.non_executive_fund_2016 = Some(100_000.0);
        input.historical.high_qualification_fund_2016 = Some(15_000.0);
        input.historical.executive_fund_2016 = Some(25_000.0);
        input.historical.secretary_resources_2016 = Some(10_000.0);
        input
    }

    fn run(input: &FundInput, simulator: &SimulatorResult) -> Vec<ComplianceCheck> {
        let reference = reference();
        let fund = aggregate(&reference, input, simulator);
        run_compliance_checks(&reference, input, &fund, simulator)
    }

    fn find(checks: &[ComplianceCheck], id: CheckId) -> Option<&ComplianceCheck> {
        checks.iter().find(|c| c.id == id)
    }

    #[test]
    fn empty_fund_reports_only_the_ceiling() {
        let checks = run(&sample_input(), &SimulatorResult::default());
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].id, CheckId::Ceiling2016);
        assert_eq!(checks[0].severity, Severity::Info);
        assert!(checks[0].compliant);
        assert_eq!(checks[0].limit, Some(150_000.0));
    }

    #[test]
    fn ceiling_excess_is_an_error() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(160_000.0);
        let checks = run(&input, &SimulatorResult::default());
        let ceiling = find(&checks, CheckId::Ceiling2016).expect("always present");
        assert_eq!(ceiling.severity, Severity::Error);
        assert!(!ceiling.compliant);
        assert_eq!(ceiling.actual_value, Some(160_000.0));
    }

    #[test]
    fn scenario_e_high_qualification_overspend() {
        let mut input = sample_input();
        input.high_qualification.po_fund_2017 = Some(100_000.0);
        input.high_qualification.position_pay = Some(90_000.0);
        input.high_qualification.result_pay = Some(30_000.0);

        let checks = run(&input, &SimulatorResult::default());
        let budget =
            find(&checks, CheckId::HighQualificationOverBudget).expect("overspend reported");
        assert_eq!(budget.severity, Severity::Error);
        assert_eq!(budget.actual_value, Some(120_000.0));
        assert_eq!(budget.limit, Some(100_000.0));
        // 30_000 is above the 15% floor.
        assert!(find(&checks, CheckId::HighQualificationMinimumResultShare).is_none());
    }

    #[test]
    fn result_pay_below_minimum_share_warns() {
        let mut input = sample_input();
        input.high_qualification.po_fund_2017 = Some(100_000.0);
        input.high_qualification.position_pay = Some(80_000.0);
        input.high_qualification.result_pay = Some(10_000.0);

        let checks = run(&input, &SimulatorResult::default());
        assert!(find(&checks, CheckId::HighQualificationWithinBudget).is_some());
        let share = find(&checks, CheckId::HighQualificationMinimumResultShare)
            .expect("below 15%");
        assert_eq!(share.severity, Severity::Warning);
        assert_eq!(share.limit, Some(15_000.0));
        assert!(share.reference.ends_with("c.4"));
    }

    #[test]
    fn headcount_increment_warns_when_missing_or_short() {
        let mut input = sample_input();
        input.historical.non_executive_fund_2018 = Some(90_000.0);
        input.annual.headcount_2018 = vec![HeadcountEntry::default(); 3];
        input.annual.headcount_reference_year = vec![HeadcountEntry::default(); 4];

        let checks = run(&input, &SimulatorResult::default());
        let check = find(&checks, CheckId::HeadcountIncrementConsistency).expect("expected > 0");
        assert_eq!(check.severity, Severity::Warning);
        assert_eq!(check.actual_value, None);
        assert_eq!(check.limit, Some(30_000.0));

        input.non_executive.headcount_increment = Some(29_999.0);
        let checks = run(&input, &SimulatorResult::default());
        let check = find(&checks, CheckId::HeadcountIncrementConsistency).expect("expected > 0");
        assert_eq!(check.severity, Severity::Warning);

        // Within half a cent is conforming.
        input.non_executive.headcount_increment = Some(29_999.996);
        let checks = run(&input, &SimulatorResult::default());
        let check = find(&checks, CheckId::HeadcountIncrementConsistency).expect("expected > 0");
        assert_eq!(check.severity, Severity::Info);
    }

    #[test]
    fn headcount_check_is_suppressed_without_growth() {
        let mut input = sample_input();
        input.historical.non_executive_fund_2018 = Some(90_000.0);
        input.annual.headcount_2018 = vec![HeadcountEntry::default(); 3];
        input.annual.headcount_reference_year = vec![HeadcountEntry::default(); 3];
        let checks = run(&input, &SimulatorResult::default());
        assert!(find(&checks, CheckId::HeadcountIncrementConsistency).is_none());
    }

    #[test]
    fn distribution_budget_checks() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(50_000.0);
        input.distribution.historical_progressions = Some(20_000.0);
        input.distribution.individual_performance = AllocationLine {
            allocated: Some(29_999.999),
            ..Default::default()
        };
        let checks = run(&input, &SimulatorResult::default());
        let within = find(&checks, CheckId::DistributionWithinBudget).expect("within budget");
        assert!(within.compliant);

        input.distribution.organisational_performance = AllocationLine {
            allocated: Some(1.0),
            ..Default::default()
        };
        let checks = run(&input, &SimulatorResult::default());
        let over = find(&checks, CheckId::DistributionOverBudget).expect("over budget");
        assert_eq!(over.severity, Severity::Error);
        assert!(find(&checks, CheckId::DistributionStableExceedsTotal).is_none());

        input.distribution.sector_allowance = Some(40_000.0);
        let checks = run(&input, &SimulatorResult::default());
        let stable =
            find(&checks, CheckId::DistributionStableExceedsTotal).expect("stable too large");
        assert_eq!(stable.actual_value, Some(60_000.0));
    }

    #[test]
    fn simulator_coherence_warns_on_decree_overrun() {
        let mut input = sample_input();
        input.non_executive.pa_decree_increment = Some(12_000.0);
        let simulator = SimulatorResult {
            phase5_net_increment: 10_000.0,
            ..SimulatorResult::default()
        };
        let checks = run(&input, &simulator);
        let coherence = find(&checks, CheckId::SimulatorCoherence).expect("overrun");
        assert_eq!(coherence.severity, Severity::Warning);
        assert_eq!(checks.last().map(|c| c.id), Some(CheckId::SimulatorCoherence));

        // No simulator room: nothing to compare against.
        let checks = run(&input, &SimulatorResult::default());
        assert!(find(&checks, CheckId::SimulatorCoherence).is_none());
    }

    #[test]
    fn checks_come_back_in_fixed_order() {
        let mut input = sample_input();
        input.historical.non_executive_fund_2018 = Some(90_000.0);
        input.annual.headcount_2018 = vec![HeadcountEntry::default(); 3];
        input.annual.headcount_reference_year = vec![HeadcountEntry::default(); 4];
        input.non_executive.single_amount_2017 = Some(50_000.0);
        input.non_executive.pa_decree_increment = Some(20_000.0);
        input.high_qualification.po_fund_2017 = Some(10_000.0);
        let simulator = SimulatorResult {
            phase5_net_increment: 5_000.0,
            ..SimulatorResult::default()
        };

        let ids: Vec<CheckId> = run(&input, &simulator).iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec![
                CheckId::Ceiling2016,
                CheckId::HeadcountIncrementConsistency,
                CheckId::DistributionWithinBudget,
                CheckId::HighQualificationWithinBudget,
                CheckId::HighQualificationMinimumResultShare,
                CheckId::SimulatorCoherence,
            ]
        );
    }
}

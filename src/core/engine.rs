use super::compliance::run_compliance_checks;
use super::ledger::{
    EXECUTIVE_FIELDS, ExecutiveLedger, FieldSpec, HIGH_QUALIFICATION_FIELDS,
    HighQualificationLedger, NON_EXECUTIVE_FIELDS, NonExecutiveLedger, ResolveContext,
    SECRETARY_FIELDS, SecretaryLedger, Section, flat_sum, signed_sum, simulator_gated,
};
use super::limits::{ccnl_stable_increments, ceiling_adjustment, per_capita_invariance};
use super::reference::ReferenceData;
use super::simulator::run_simulator;
use super::types::{
    CalculatedFund, CategoryBreakdown, CategoryTotals, ComponentKind, FadTotals, FundComponent,
    FundInput, FundReport, FundTrend, SimulatorResult, amount,
};
use crate::error::{FundError, Result};

/// Tolerance for "is this amount over budget" comparisons, in euro.
pub const HALF_CENT: f64 = 0.005;

fn in_section<L>(section: Section) -> impl Fn(&FieldSpec<L>) -> bool {
    move |f| f.section == section
}

/// Values the mirrored ledger fields resolve against.
pub fn resolve_context(input: &FundInput, simulator: &SimulatorResult) -> ResolveContext {
    ResolveContext {
        distressed: input.annual.is_distressed(),
        simulator_net_increment: simulator.phase5_net_increment,
        high_qualification_transfer: input.high_qualification.transfer(),
    }
}

pub fn fad_totals(ledger: &NonExecutiveLedger, ctx: &ResolveContext) -> FadTotals {
    let fields = NON_EXECUTIVE_FIELDS;
    let stable = signed_sum(fields, ledger, ctx, in_section(Section::Stable));
    let variable_subject = flat_sum(fields, ledger, ctx, in_section(Section::VariableSubject));
    let variable_non_subject =
        flat_sum(fields, ledger, ctx, in_section(Section::VariableNonSubject));
    let final_deductions = flat_sum(fields, ledger, ctx, in_section(Section::FinalDeduction));
    let ceiling_deductions = flat_sum(fields, ledger, ctx, in_section(Section::CeilingDeduction));
    let ceiling_relevant_stable = signed_sum(fields, ledger, ctx, |f| {
        f.section == Section::Stable && f.ceiling_relevant
    });

    FadTotals {
        stable,
        variable_subject,
        variable_non_subject,
        final_deductions,
        ceiling_deductions,
        total_available: stable + variable_subject + variable_non_subject
            - final_deductions
            - ceiling_deductions,
        ceiling_relevant_stable,
    }
}

fn high_qualification_totals(
    ledger: &HighQualificationLedger,
    ctx: &ResolveContext,
) -> CategoryTotals {
    let fields = HIGH_QUALIFICATION_FIELDS;
    CategoryTotals::new(
        signed_sum(fields, ledger, ctx, in_section(Section::Stable)),
        signed_sum(fields, ledger, ctx, in_section(Section::Variable)),
    )
}

fn secretary_totals(ledger: &SecretaryLedger, ctx: &ResolveContext) -> CategoryTotals {
    let coverage = ledger.coverage_factor();
    let fields = SECRETARY_FIELDS;
    CategoryTotals::new(
        signed_sum(fields, ledger, ctx, in_section(Section::Stable)) * coverage,
        signed_sum(fields, ledger, ctx, in_section(Section::Variable)) * coverage,
    )
}

fn executive_totals(ledger: &ExecutiveLedger, ctx: &ResolveContext) -> CategoryTotals {
    let fields = EXECUTIVE_FIELDS;
    CategoryTotals::new(
        signed_sum(fields, ledger, ctx, in_section(Section::Stable)),
        signed_sum(fields, ledger, ctx, in_section(Section::Variable)),
    )
}

fn subject_to_ceiling(input: &FundInput, fad: &FadTotals, ctx: &ResolveContext) -> f64 {
    let high_qualification = signed_sum(
        HIGH_QUALIFICATION_FIELDS,
        &input.high_qualification,
        ctx,
        |f| f.ceiling_relevant,
    );
    let secretary = amount(input.secretary.ceiling_relevant_total);
    let executive = if input.annual.has_executives {
        amount(input.executive.ceiling_relevant_total)
    } else {
        0.0
    };
    fad.ceiling_relevant_stable + high_qualification + secretary + executive
}

fn virtuous_increment(input: &FundInput, reference: &ReferenceData) -> Option<FundComponent> {
    let salaries = amount(input.historical.tabular_salaries_2023);
    (input.annual.financially_virtuous && salaries > 0.0).then(|| FundComponent {
        description: "Incremento facoltativo enti virtuosi (max 48% stipendi tabellari 2023)"
            .to_string(),
        amount: salaries * reference.rates.virtuous_increment,
        reference: reference.legal_references.art14_dl25_2025.clone(),
        kind: ComponentKind::Stable,
        excluded_from_ceiling: false,
    })
}

fn variable_component(
    description: impl Into<String>,
    amount: f64,
    reference: impl Into<String>,
    excluded_from_ceiling: bool,
) -> FundComponent {
    FundComponent {
        description: description.into(),
        amount,
        reference: reference.into(),
        kind: ComponentKind::Variable,
        excluded_from_ceiling,
    }
}

fn variable_resources(input: &FundInput, reference: &ReferenceData) -> Vec<FundComponent> {
    let refs = &reference.legal_references;
    let revenues = &input.annual.specific_revenues;
    let tagged = |tag: &str| {
        revenues
            .iter()
            .find(|r| r.legal_reference == tag)
            .map(|r| amount(r.amount))
            .filter(|v| *v > 0.0)
    };

    let mut resources = Vec::new();
    if let Some(value) = tagged(refs.art45_dlgs36_2023.as_str()) {
        resources.push(variable_component(
            "Incentivi funzioni tecniche",
            value,
            refs.art45_dlgs36_2023.as_str(),
            true,
        ));
    }
    if let Some(value) = tagged(refs.art208_cds.as_str()) {
        resources.push(variable_component(
            "Proventi Codice della Strada (quota destinata)",
            value,
            refs.art208_cds.as_str(),
            false,
        ));
    }
    for revenue in revenues
        .iter()
        .filter(|r| r.legal_reference != refs.art45_dlgs36_2023 && r.legal_reference != refs.art208_cds)
    {
        let value = amount(revenue.amount);
        if value > 0.0 {
            resources.push(variable_component(
                revenue.description.as_str(),
                value,
                revenue.legal_reference.as_str(),
                false,
            ));
        }
    }

    let incentives = amount(input.annual.pnrr_incentives);
    if input.annual.financially_virtuous && incentives > 0.0 {
        let cap = input.historical.ceiling_2016() * reference.rates.pnrr_increment;
        resources.push(variable_component(
            "Incremento variabile PNRR/Misure Straordinarie (max 5% fondo stabile 2016)",
            incentives.min(cap),
            refs.art8_dl13_2023.as_str(),
            true,
        ));
    }

    resources
}

fn trend(previous_total: Option<f64>, total: f64) -> Option<FundTrend> {
    let previous_total = previous_total.filter(|v| v.is_finite())?;
    let change = total - previous_total;
    Some(FundTrend {
        previous_total,
        change,
        change_percent: (previous_total != 0.0).then(|| change / previous_total * 100.0),
    })
}

/// Reduces every ledger of `input` into the fund totals. Pure: the same
/// arguments always produce the same result.
pub fn aggregate(
    reference: &ReferenceData,
    input: &FundInput,
    simulator: &SimulatorResult,
) -> CalculatedFund {
    let ctx = resolve_context(input, simulator);
    let adjustment = ceiling_adjustment(input);
    let fad = fad_totals(&input.non_executive, &ctx);

    let breakdown = CategoryBreakdown {
        non_executive: CategoryTotals::new(fad.stable, fad.variable()),
        high_qualification: high_qualification_totals(&input.high_qualification, &ctx),
        secretary: secretary_totals(&input.secretary, &ctx),
        executive: if input.annual.has_executives {
            executive_totals(&input.executive, &ctx)
        } else {
            CategoryTotals::default()
        },
    };
    let categories = [
        breakdown.non_executive,
        breakdown.high_qualification,
        breakdown.secretary,
        breakdown.executive,
    ];
    let total_stable: f64 = categories.iter().map(|c| c.stable).sum();
    let total_variable: f64 = categories.iter().map(|c| c.variable).sum();

    let subject_to_ceiling = subject_to_ceiling(input, &fad, &ctx);
    let excess = subject_to_ceiling - adjustment.adjusted_ceiling;
    let ceiling_excess = (excess > 0.0).then_some(excess);
    if let Some(excess) = ceiling_excess {
        log::warn!(
            "Resources subject to the 2016 ceiling ({subject_to_ceiling:.2}) exceed the adjusted ceiling by {excess:.2}"
        );
    }
    log::debug!(
        "fund totals: stable {total_stable:.2}, variable {total_variable:.2}, subject {subject_to_ceiling:.2}, ceiling {:.2}",
        adjustment.adjusted_ceiling
    );

    let total = total_stable + total_variable;
    CalculatedFund {
        baseline_2016: adjustment.original_ceiling,
        ccnl_stable_increments: ccnl_stable_increments(input, reference),
        per_capita_invariance: per_capita_invariance(input, reference),
        ceiling_adjustment: adjustment.component(reference),
        virtuous_increment: virtuous_increment(input, reference),
        variable_resources: variable_resources(input, reference),
        adjusted_ceiling: adjustment.adjusted_ceiling,
        subject_to_ceiling,
        ceiling_excess,
        total_stable,
        total_variable,
        total,
        breakdown,
        non_executive_detail: fad,
        trend: trend(input.historical.previous_year_total, total),
    }
}

/// Runs the whole pipeline: simulator, aggregation, compliance checks.
pub fn calculate(reference: Option<&ReferenceData>, input: &FundInput) -> Result<FundReport> {
    let reference = reference.ok_or(FundError::ReferenceDataUnavailable)?;
    reference.validate()?;

    let annual = &input.annual;
    let simulator = run_simulator(&annual.simulator, annual.population, annual.entity_type);
    let calculated_fund = aggregate(reference, input, &simulator);
    let compliance_checks = run_compliance_checks(reference, input, &calculated_fund, &simulator);

    Ok(FundReport {
        simulator,
        calculated_fund,
        compliance_checks,
    })
}

/// Snapshot with the two mirrored non-executive fields written back.
pub fn with_derived_fields(input: &FundInput, simulator: &SimulatorResult) -> FundInput {
    let ctx = resolve_context(input, simulator);
    let mut derived = input.clone();
    derived.non_executive.pa_decree_increment = Some(simulator_gated(
        input.non_executive.pa_decree_increment,
        &ctx,
    ));
    derived.non_executive.high_qualification_transfer = Some(ctx.high_qualification_transfer);
    derived
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{HeadcountEntry, SpecificRevenue};
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn reference() -> ReferenceData {
        ReferenceData::bundled().expect("bundled table is valid")
    }

    fn sample_input() -> FundInput {
        let mut input = FundInput::default();
        input.historical.non_executive_fund_2016 = Some(100_000.0);
        input.historical.high_qualification_fund_2016 = Some(15_000.0);
        input.historical.executive_fund_2016 = Some(25_000.0);
        input.historical.secretary_resources_2016 = Some(10_000.0);
        input.annual.reference_year = 2025;
        input
    }

    /// Ledger with only `key` set, built through its serialized form.
    fn ledger_with<L: serde::de::DeserializeOwned>(key: &str, value: f64) -> L {
        let mut map = serde_json::Map::new();
        map.insert(key.to_string(), serde_json::json!(value));
        serde_json::from_value(serde_json::Value::Object(map)).expect("valid ledger")
    }

    fn no_simulator() -> SimulatorResult {
        SimulatorResult::default()
    }

    fn open_simulator(net: f64) -> SimulatorResult {
        SimulatorResult {
            phase5_net_increment: net,
            ..SimulatorResult::default()
        }
    }

    fn revenue(description: &str, amount: f64, legal_reference: &str) -> SpecificRevenue {
        SpecificRevenue {
            id: description.to_string(),
            description: description.to_string(),
            amount: Some(amount),
            legal_reference: legal_reference.to_string(),
        }
    }

    #[test]
    fn scenario_a_ceiling_without_headcount_change() {
        let mut input = sample_input();
        input.historical.non_executive_fund_2018 = Some(95_000.0);
        input.annual.headcount_2018 = vec![HeadcountEntry::default(); 3];
        input.annual.headcount_reference_year = vec![HeadcountEntry::default(); 3];

        let fund = aggregate(&reference(), &input, &no_simulator());
        assert_approx(fund.baseline_2016, 150_000.0);
        assert_approx(fund.adjusted_ceiling, 150_000.0);
        assert!(fund.ceiling_adjustment.is_none());
        assert!(fund.ceiling_excess.is_none());
    }

    #[test]
    fn scenario_b_stable_subtotal_nets_subtractive_fields() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(50_000.0);
        input.non_executive.dl78_cut_2010 = Some(5_000.0);

        let fund = aggregate(&reference(), &input, &no_simulator());
        assert_approx(fund.non_executive_detail.stable, 45_000.0);
        assert_approx(fund.non_executive_detail.ceiling_relevant_stable, 45_000.0);
        assert_approx(fund.breakdown.non_executive.total, 45_000.0);
        assert_approx(fund.subject_to_ceiling, 45_000.0);
    }

    #[test]
    fn variable_sources_stay_outside_the_ceiling() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(50_000.0);
        let before = aggregate(&reference(), &input, &no_simulator());

        input.non_executive.tax_recovery = Some(900_000.0);
        input.non_executive.organisational_choices = Some(40_000.0);
        let after = aggregate(&reference(), &input, &no_simulator());

        assert_approx(after.subject_to_ceiling, before.subject_to_ceiling);
        assert_approx(after.subject_to_ceiling, 50_000.0);
        assert!(after.ceiling_excess.is_none());
        assert_approx(after.total - before.total, 940_000.0);
    }

    #[test]
    fn calculate_refuses_without_reference_data() {
        let err = calculate(None, &sample_input()).expect_err("no reference table");
        assert!(matches!(err, FundError::ReferenceDataUnavailable));
    }

    #[test]
    fn calculate_rejects_invalid_reference_data() {
        let mut reference = reference();
        reference.rates.virtuous_increment = -0.1;
        let err = calculate(Some(&reference), &sample_input()).expect_err("bad rate");
        assert!(matches!(err, FundError::InvalidReferenceData(_)));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(80_000.0);
        input.non_executive.tax_recovery = Some(1_234.56);
        input.high_qualification.po_fund_2017 = Some(12_000.0);
        input.secretary.position_pay_2011 = Some(9_000.0);
        let reference = reference();

        let first = calculate(Some(&reference), &input).expect("computes");
        let second = calculate(Some(&reference), &input).expect("computes");
        assert_eq!(first, second);
    }

    #[test]
    fn non_executive_subtotals_follow_sections() {
        let ledger = NonExecutiveLedger {
            single_amount_2017: Some(60_000.0),
            increment_83_20: Some(4_000.0),
            tax_recovery: Some(2_000.0),
            sponsorships_agreements: Some(1_500.0),
            dl16_compliance_measures: Some(700.0),
            ceiling_2016_annual_cut: Some(300.0),
            ..Default::default()
        };
        let fad = fad_totals(&ledger, &ResolveContext::default());
        assert_approx(fad.stable, 64_000.0);
        assert_approx(fad.ceiling_relevant_stable, 60_000.0);
        assert_approx(fad.variable_subject, 2_000.0);
        assert_approx(fad.variable_non_subject, 1_500.0);
        assert_approx(fad.final_deductions, 700.0);
        assert_approx(fad.ceiling_deductions, 300.0);
        assert_approx(fad.variable(), 2_500.0);
        assert_approx(fad.total_available, 66_500.0);
    }

    #[test]
    fn distress_zeroes_flagged_variable_sources() {
        let mut input = sample_input();
        input.non_executive.casino_staff = Some(1_000.0);
        input.non_executive.sponsorships_agreements = Some(2_000.0);
        input.non_executive.overtime_savings = Some(500.0);
        let reference = reference();

        let healthy = aggregate(&reference, &input, &no_simulator());
        assert_approx(healthy.breakdown.non_executive.variable, 3_500.0);

        input.annual.structurally_deficient = true;
        let distressed = aggregate(&reference, &input, &no_simulator());
        assert_approx(distressed.breakdown.non_executive.variable, 500.0);
    }

    #[test]
    fn decree_increment_counts_only_with_simulator_room() {
        let mut input = sample_input();
        input.non_executive.pa_decree_increment = Some(10_000.0);
        let reference = reference();

        let closed = aggregate(&reference, &input, &no_simulator());
        assert_approx(closed.breakdown.non_executive.stable, 0.0);

        let open = aggregate(&reference, &input, &open_simulator(15_000.0));
        assert_approx(open.breakdown.non_executive.stable, 10_000.0);
        assert_approx(open.subject_to_ceiling, 10_000.0);
    }

    #[test]
    fn transfer_moves_resources_between_categories() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(50_000.0);
        // Stale stored value, the mirror ignores it.
        input.non_executive.high_qualification_transfer = Some(1.0);
        input.high_qualification.po_fund_2017 = Some(10_000.0);
        input.high_qualification.transfer_from_staff_fund = Some(3_000.0);

        let fund = aggregate(&reference(), &input, &no_simulator());
        assert_approx(fund.breakdown.non_executive.stable, 47_000.0);
        assert_approx(fund.breakdown.high_qualification.stable, 13_000.0);
        assert_approx(fund.total_stable, 60_000.0);
        // Counted once per side, so the net effect on the ceiling is zero.
        assert_approx(fund.subject_to_ceiling, 60_000.0);
    }

    #[test]
    fn high_qualification_adjustment_is_outside_ceiling_amount() {
        let mut input = sample_input();
        input.high_qualification.po_fund_2017 = Some(20_000.0);
        input.high_qualification.dl34_ceiling_increment = Some(2_000.0);
        input.high_qualification.ceiling_2016_adjustment = Some(1_000.0);
        input.high_qualification.monte_salari_2018_increment = Some(500.0);

        let fund = aggregate(&reference(), &input, &no_simulator());
        let hq = fund.breakdown.high_qualification;
        assert_approx(hq.stable, 21_000.0);
        assert_approx(hq.variable, 500.0);
        assert_approx(hq.total, 21_500.0);
        assert_approx(fund.subject_to_ceiling, 22_000.0);
    }

    #[test]
    fn secretary_totals_scale_with_coverage() {
        let mut input = sample_input();
        input.secretary.position_pay_2011 = Some(10_000.0);
        input.secretary.secretariat_rights = Some(2_000.0);
        input.secretary.ceiling_relevant_total = Some(7_000.0);
        input.secretary.coverage_percentage = Some(50.0);

        let fund = aggregate(&reference(), &input, &no_simulator());
        let secretary = fund.breakdown.secretary;
        assert_approx(secretary.stable, 5_000.0);
        assert_approx(secretary.variable, 1_000.0);
        assert_approx(secretary.total, 6_000.0);
        // The ceiling-relevant total is entered already scaled.
        assert_approx(fund.subject_to_ceiling, 7_000.0);
    }

    #[test]
    fn executive_fund_requires_executives() {
        let mut input = sample_input();
        input.executive.single_amount_2020 = Some(30_000.0);
        input.executive.ceiling_adjustment = Some(2_000.0);
        input.executive.compliance_measures_cut = Some(500.0);
        input.executive.prior_year_residuals = Some(1_000.0);
        input.executive.ceiling_relevant_total = Some(31_500.0);
        let reference = reference();

        let without = aggregate(&reference, &input, &no_simulator());
        assert_eq!(without.breakdown.executive, CategoryTotals::default());
        assert_approx(without.subject_to_ceiling, 0.0);

        input.annual.has_executives = true;
        let with = aggregate(&reference, &input, &no_simulator());
        assert_approx(with.breakdown.executive.stable, 31_500.0);
        assert_approx(with.breakdown.executive.variable, 1_000.0);
        assert_approx(with.subject_to_ceiling, 31_500.0);
    }

    #[test]
    fn excess_is_reported_when_subject_amount_exceeds_ceiling() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(140_000.0);
        input.high_qualification.po_fund_2017 = Some(20_000.0);

        let fund = aggregate(&reference(), &input, &no_simulator());
        assert_approx(fund.subject_to_ceiling, 160_000.0);
        assert_approx(fund.ceiling_excess.expect("over the ceiling"), 10_000.0);
    }

    #[test]
    fn display_components_and_revenues() {
        let mut input = sample_input();
        let reference = reference();
        let refs = &reference.legal_references;
        input.historical.tabular_salaries_2023 = Some(100_000.0);
        input.annual.financially_virtuous = true;
        input.annual.pnrr_incentives = Some(20_000.0);
        input.annual.specific_revenues = vec![
            revenue("Funzioni tecniche", 4_000.0, &refs.art45_dlgs36_2023),
            revenue("Sanzioni CdS", 3_000.0, &refs.art208_cds),
            revenue("Convenzione", 1_000.0, "Art. 43 L. 449/1997"),
            revenue("Vuoto", 0.0, "Art. 1"),
        ];

        let fund = aggregate(&reference, &input, &no_simulator());
        let virtuous = fund.virtuous_increment.expect("virtuous entity");
        assert_approx(virtuous.amount, 48_000.0);

        let resources = &fund.variable_resources;
        assert_eq!(resources.len(), 4);
        assert!(resources[0].excluded_from_ceiling);
        assert_approx(resources[0].amount, 4_000.0);
        assert!(!resources[1].excluded_from_ceiling);
        assert_eq!(resources[2].description, "Convenzione");
        // PNRR capped at 5% of the 150_000 ceiling.
        assert_approx(resources[3].amount, 7_500.0);
        assert!(resources[3].excluded_from_ceiling);
        // Display components never move the totals.
        assert_approx(fund.total, 0.0);
    }

    #[test]
    fn virtuous_components_need_the_flag() {
        let mut input = sample_input();
        input.historical.tabular_salaries_2023 = Some(100_000.0);
        input.annual.pnrr_incentives = Some(20_000.0);
        let fund = aggregate(&reference(), &input, &no_simulator());
        assert!(fund.virtuous_increment.is_none());
        assert!(fund.variable_resources.is_empty());
    }

    #[test]
    fn trend_against_previous_year() {
        let mut input = sample_input();
        input.non_executive.single_amount_2017 = Some(110_000.0);
        input.historical.previous_year_total = Some(100_000.0);
        let fund = aggregate(&reference(), &input, &no_simulator());
        let trend = fund.trend.expect("previous total known");
        assert_approx(trend.change, 10_000.0);
        assert_approx(trend.change_percent.expect("non-zero base"), 10.0);

        input.historical.previous_year_total = Some(0.0);
        let fund = aggregate(&reference(), &input, &no_simulator());
        assert!(fund.trend.expect("zero is known").change_percent.is_none());

        input.historical.previous_year_total = None;
        assert!(aggregate(&reference(), &input, &no_simulator()).trend.is_none());
    }

    #[test]
    fn derived_fields_rewrite_exactly_two_fields() {
        let mut input = sample_input();
        input.non_executive.pa_decree_increment = Some(8_000.0);
        input.non_executive.high_qualification_transfer = Some(42.0);
        input.non_executive.single_amount_2017 = Some(50_000.0);
        input.high_qualification.transfer_from_staff_fund = Some(2_500.0);
        let reference = reference();

        let closed = with_derived_fields(&input, &no_simulator());
        assert_eq!(closed.non_executive.pa_decree_increment, Some(0.0));
        assert_eq!(closed.non_executive.high_qualification_transfer, Some(2_500.0));

        let open = with_derived_fields(&input, &open_simulator(10_000.0));
        assert_eq!(open.non_executive.pa_decree_increment, Some(8_000.0));

        let mut restored = closed.clone();
        restored.non_executive.pa_decree_increment = input.non_executive.pa_decree_increment;
        restored.non_executive.high_qualification_transfer =
            input.non_executive.high_qualification_transfer;
        assert_eq!(restored, input);

        // Totals never depend on what was written back.
        assert_eq!(
            aggregate(&reference, &closed, &no_simulator()),
            aggregate(&reference, &input, &no_simulator())
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(96))]

        #[test]
        fn prop_each_field_moves_total_by_its_signed_value(
            index in 0usize..NON_EXECUTIVE_FIELDS.len(),
            value in 0.0f64..1_000_000.0,
            distressed in proptest::bool::ANY
        ) {
            let field = &NON_EXECUTIVE_FIELDS[index];
            let mut input = sample_input();
            input.annual.in_bankruptcy = distressed;
            let base = aggregate(&reference(), &input, &no_simulator());
            input.non_executive = ledger_with(field.key, value);
            let with_field = aggregate(&reference(), &input, &no_simulator());

            let ctx = resolve_context(&input, &no_simulator());
            let expected = field.signed_value(&input.non_executive, &ctx);
            prop_assert!((with_field.total - base.total - expected).abs() <= EPS);
        }

        #[test]
        fn prop_high_qualification_field_moves_its_category(
            index in 0usize..HIGH_QUALIFICATION_FIELDS.len(),
            value in 0.0f64..1_000_000.0,
            distressed in proptest::bool::ANY
        ) {
            let field = &HIGH_QUALIFICATION_FIELDS[index];
            let mut input = sample_input();
            input.annual.in_bankruptcy = distressed;
            let base = aggregate(&reference(), &input, &no_simulator());
            input.high_qualification = ledger_with(field.key, value);
            let with_field = aggregate(&reference(), &input, &no_simulator());

            let ctx = resolve_context(&input, &no_simulator());
            let expected = field.signed_value(&input.high_qualification, &ctx);
            let moved = with_field.breakdown.high_qualification.total
                - base.breakdown.high_qualification.total;
            prop_assert!((moved - expected).abs() <= EPS);
        }

        #[test]
        fn prop_secretary_field_moves_its_category(
            index in 0usize..SECRETARY_FIELDS.len(),
            value in 0.0f64..1_000_000.0,
            distressed in proptest::bool::ANY
        ) {
            let field = &SECRETARY_FIELDS[index];
            let mut input = sample_input();
            input.annual.in_bankruptcy = distressed;
            let base = aggregate(&reference(), &input, &no_simulator());
            input.secretary = ledger_with(field.key, value);
            let with_field = aggregate(&reference(), &input, &no_simulator());

            let ctx = resolve_context(&input, &no_simulator());
            let expected = field.signed_value(&input.secretary, &ctx);
            prop_assert!((with_field.total - base.total - expected).abs() <= EPS);
        }

        #[test]
        fn prop_executive_field_moves_total_when_executives_exist(
            index in 0usize..EXECUTIVE_FIELDS.len(),
            value in 0.0f64..1_000_000.0,
            distressed in proptest::bool::ANY
        ) {
            let field = &EXECUTIVE_FIELDS[index];
            let mut input = sample_input();
            input.annual.in_bankruptcy = distressed;
            input.annual.has_executives = true;
            let base = aggregate(&reference(), &input, &no_simulator());
            input.executive = ledger_with(field.key, value);
            let with_field = aggregate(&reference(), &input, &no_simulator());

            let ctx = resolve_context(&input, &no_simulator());
            let expected = field.signed_value(&input.executive, &ctx);
            prop_assert!((with_field.total - base.total - expected).abs() <= EPS);
        }

        #[test]
        fn prop_ceiling_is_monotone_and_excess_positive(
            baseline_2018 in 0.0f64..500_000.0,
            before in 0usize..30,
            after in 0usize..30,
            stable in 0.0f64..400_000.0
        ) {
            let mut input = sample_input();
            input.historical.non_executive_fund_2018 = Some(baseline_2018);
            input.annual.headcount_2018 = vec![HeadcountEntry::default(); before];
            input.annual.headcount_reference_year = vec![HeadcountEntry::default(); after];
            input.non_executive.single_amount_2017 = Some(stable);

            let fund = aggregate(&reference(), &input, &no_simulator());
            prop_assert!(fund.adjusted_ceiling >= fund.baseline_2016);
            match fund.ceiling_excess {
                Some(excess) => prop_assert!(excess > 0.0),
                None => prop_assert!(fund.subject_to_ceiling <= fund.adjusted_ceiling),
            }
            for category in [
                fund.breakdown.non_executive,
                fund.breakdown.high_qualification,
                fund.breakdown.secretary,
                fund.breakdown.executive,
            ] {
                prop_assert!((category.total - category.stable - category.variable).abs() <= EPS);
            }
        }
    }
}

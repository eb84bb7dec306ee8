use super::types::{EntityType, SimulatorInputs, SimulatorResult, amount};

/// Share of 2023 tabular salaries the stable fund may reach.
const TARGET_SHARE: f64 = 0.48;

const MUNICIPALITY_THRESHOLDS: &[(u32, f64)] = &[
    (999, 29.50),
    (1_999, 28.60),
    (2_999, 27.60),
    (4_999, 27.20),
    (9_999, 26.90),
    (59_999, 27.00),
    (249_999, 27.60),
    (1_499_999, 28.80),
];
const MUNICIPALITY_TOP: f64 = 25.30;

const PROVINCE_THRESHOLDS: &[(u32, f64)] = &[
    (250_000, 20.80),
    (349_999, 19.10),
    (449_999, 19.10),
    (699_999, 19.70),
];
const PROVINCE_TOP: f64 = 13.90;

fn bracket(population: u32, table: &[(u32, f64)], top: f64) -> f64 {
    table
        .iter()
        .find(|(upper, _)| population <= *upper)
        .map_or(top, |(_, percent)| *percent)
}

/// Personnel-expense / revenue threshold (percent) for an entity class.
/// Zero when the class has no table or the population is unknown.
pub fn threshold_percent(population: Option<u32>, entity_type: Option<EntityType>) -> f64 {
    let Some(population) = population else {
        return 0.0;
    };
    match entity_type {
        Some(EntityType::Municipality) => {
            bracket(population, MUNICIPALITY_THRESHOLDS, MUNICIPALITY_TOP)
        }
        Some(EntityType::Province) => bracket(population, PROVINCE_THRESHOLDS, PROVINCE_TOP),
        _ => 0.0,
    }
}

/// Five-phase estimate of the largest lawful stable-fund increase.
pub fn run_simulator(
    inputs: &SimulatorInputs,
    population: Option<u32>,
    entity_type: Option<EntityType>,
) -> SimulatorResult {
    let phase1_target = TARGET_SHARE * amount(inputs.tabular_salaries_2023);
    let phase1_current_fund = amount(inputs.current_stable_fund)
        + amount(inputs.current_high_qualification_resources);
    let phase1_potential_increment = (phase1_target - phase1_current_fund).max(0.0);

    let phase2_projected_expense =
        amount(inputs.personnel_expense_2023) + amount(inputs.planned_hiring_cost);
    let phase2_threshold_percent = threshold_percent(population, entity_type);
    let phase2_sustainable_ceiling =
        amount(inputs.average_current_revenue) * phase2_threshold_percent / 100.0;
    let phase2_headroom = (phase2_sustainable_ceiling - phase2_projected_expense).max(0.0);

    let phase3_historical_headroom =
        (amount(inputs.historical_expense_ceiling) - phase2_projected_expense).max(0.0);

    let phase4_usable_gross = phase1_potential_increment
        .min(phase2_headroom)
        .min(phase3_historical_headroom);

    let overhead = amount(inputs.overhead_rate_percent);
    let phase5_net_increment = if (0.0..100.0).contains(&overhead) {
        phase4_usable_gross / (1.0 + overhead / 100.0)
    } else {
        0.0
    };

    log::debug!(
        "simulator: potential {phase1_potential_increment:.2}, headroom {phase2_headroom:.2}, historical {phase3_historical_headroom:.2}, net {phase5_net_increment:.2}"
    );

    SimulatorResult {
        phase1_target,
        phase1_current_fund,
        phase1_potential_increment,
        phase2_projected_expense,
        phase2_threshold_percent,
        phase2_sustainable_ceiling,
        phase2_headroom,
        phase3_historical_headroom,
        phase4_usable_gross,
        phase5_net_increment,
    }
}

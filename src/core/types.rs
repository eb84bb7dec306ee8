use serde::{Deserialize, Serialize};

use super::ledger::{
    ExecutiveLedger, HighQualificationLedger, NonExecutiveLedger, ResourceDistribution,
    SecretaryLedger,
};

/// Unset amounts count as zero everywhere in the engine.
pub(crate) fn amount(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    #[serde(alias = "comune")]
    Municipality,
    #[serde(alias = "provincia")]
    Province,
    #[serde(alias = "unione-comuni")]
    MunicipalUnion,
    #[serde(alias = "comunita-montana")]
    MountainCommunity,
    #[serde(alias = "altro")]
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmployeeCategory {
    NonExecutive,
    HighQualification,
    Executive,
    Secretary,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualificationArea {
    Operatore,
    OperatoreEsperto,
    Istruttore,
    FunzionarioEq,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoricalData {
    pub non_executive_fund_2016: Option<f64>,
    pub high_qualification_fund_2016: Option<f64>,
    pub executive_fund_2016: Option<f64>,
    pub secretary_resources_2016: Option<f64>,
    /// Staff in service at 2018, for the per-capita invariance rule
    pub staff_in_service_2018: Option<f64>,
    pub tabular_salaries_2023: Option<f64>,
    pub non_executive_fund_2018: Option<f64>,
    pub high_qualification_fund_2018: Option<f64>,
    pub previous_year_total: Option<f64>,
}

impl HistoricalData {
    pub fn ceiling_2016(&self) -> f64 {
        amount(self.non_executive_fund_2016)
            + amount(self.high_qualification_fund_2016)
            + amount(self.executive_fund_2016)
            + amount(self.secretary_resources_2016)
    }

    pub fn baseline_2018(&self) -> f64 {
        amount(self.non_executive_fund_2018) + amount(self.high_qualification_fund_2018)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadcountEntry {
    pub id: String,
    pub employee_number: Option<String>,
    pub part_time_percentage: Option<f64>,
    /// Payslips issued in the reference year, 1-12
    pub months_paid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffCount {
    pub category: EmployeeCategory,
    #[serde(default)]
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecificRevenue {
    pub id: String,
    pub description: String,
    pub amount: Option<f64>,
    pub legal_reference: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorInputs {
    pub tabular_salaries_2023: Option<f64>,
    pub current_stable_fund: Option<f64>,
    pub current_high_qualification_resources: Option<f64>,
    pub personnel_expense_2023: Option<f64>,
    pub average_current_revenue: Option<f64>,
    pub historical_expense_ceiling: Option<f64>,
    pub planned_hiring_cost: Option<f64>,
    /// Employer charges on the increment, in percent (27.4 means 27.4%)
    pub overhead_rate_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnualData {
    pub reference_year: u16,
    pub entity_name: Option<String>,
    pub entity_type: Option<EntityType>,
    pub population: Option<u32>,
    pub in_bankruptcy: bool,
    pub structurally_deficient: bool,
    pub in_rebalancing_plan: bool,
    pub has_executives: bool,
    pub current_staff: Vec<StaffCount>,
    pub specific_revenues: Vec<SpecificRevenue>,
    pub pnrr_incentives: Option<f64>,
    pub financially_virtuous: bool,
    pub headcount_2018: Vec<HeadcountEntry>,
    pub headcount_reference_year: Vec<HeadcountEntry>,
    pub simulator: SimulatorInputs,
}

impl AnnualData {
    pub fn is_distressed(&self) -> bool {
        self.in_bankruptcy || self.structurally_deficient || self.in_rebalancing_plan
    }

    pub fn staff_count(&self, include: impl Fn(EmployeeCategory) -> bool) -> f64 {
        self.current_staff
            .iter()
            .filter(|s| include(s.category))
            .map(|s| amount(s.count))
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub employee_number: Option<String>,
    pub part_time_percentage: Option<f64>,
    pub full_year_service: bool,
    /// ISO date, `YYYY-MM-DD`
    pub hire_date: Option<String>,
    pub termination_date: Option<String>,
    pub progression_level: Option<String>,
    pub area: Option<QualificationArea>,
}

/// Everything a calculation reads, as one immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FundInput {
    pub historical: HistoricalData,
    pub annual: AnnualData,
    pub non_executive: NonExecutiveLedger,
    pub high_qualification: HighQualificationLedger,
    pub secretary: SecretaryLedger,
    pub executive: ExecutiveLedger,
    pub distribution: ResourceDistribution,
    pub staff_in_service: Vec<StaffMember>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorResult {
    pub phase1_target: f64,
    pub phase1_current_fund: f64,
    pub phase1_potential_increment: f64,
    pub phase2_projected_expense: f64,
    pub phase2_threshold_percent: f64,
    pub phase2_sustainable_ceiling: f64,
    pub phase2_headroom: f64,
    pub phase3_historical_headroom: f64,
    pub phase4_usable_gross: f64,
    pub phase5_net_increment: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Stable,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundComponent {
    pub description: String,
    pub amount: f64,
    pub reference: String,
    pub kind: ComponentKind,
    pub excluded_from_ceiling: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    pub stable: f64,
    pub variable: f64,
    pub total: f64,
}

impl CategoryTotals {
    pub fn new(stable: f64, variable: f64) -> Self {
        Self {
            stable,
            variable,
            total: stable + variable,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub non_executive: CategoryTotals,
    pub high_qualification: CategoryTotals,
    pub secretary: CategoryTotals,
    pub executive: CategoryTotals,
}

/// Subtotals of the non-executive ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FadTotals {
    pub stable: f64,
    pub variable_subject: f64,
    pub variable_non_subject: f64,
    pub final_deductions: f64,
    pub ceiling_deductions: f64,
    pub total_available: f64,
    pub ceiling_relevant_stable: f64,
}

impl FadTotals {
    pub fn variable(&self) -> f64 {
        self.variable_subject + self.variable_non_subject
            - self.final_deductions
            - self.ceiling_deductions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundTrend {
    pub previous_total: f64,
    pub change: f64,
    /// Absent when the previous total is zero
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedFund {
    pub baseline_2016: f64,
    pub ccnl_stable_increments: Vec<FundComponent>,
    pub per_capita_invariance: FundComponent,
    pub ceiling_adjustment: Option<FundComponent>,
    pub virtuous_increment: Option<FundComponent>,
    pub variable_resources: Vec<FundComponent>,
    pub adjusted_ceiling: f64,
    pub subject_to_ceiling: f64,
    /// Present only when strictly positive
    pub ceiling_excess: Option<f64>,
    pub total_stable: f64,
    pub total_variable: f64,
    pub total: f64,
    pub breakdown: CategoryBreakdown,
    pub non_executive_detail: FadTotals,
    pub trend: Option<FundTrend>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    Ceiling2016,
    HeadcountIncrementConsistency,
    DistributionStableExceedsTotal,
    DistributionOverBudget,
    DistributionWithinBudget,
    HighQualificationOverBudget,
    HighQualificationWithinBudget,
    HighQualificationMinimumResultShare,
    SimulatorCoherence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub id: CheckId,
    pub description: String,
    pub compliant: bool,
    pub actual_value: Option<f64>,
    pub limit: Option<f64>,
    pub message: String,
    pub reference: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundReport {
    pub simulator: SimulatorResult,
    pub calculated_fund: CalculatedFund,
    pub compliance_checks: Vec<ComplianceCheck>,
}

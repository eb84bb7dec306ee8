mod compliance;
mod engine;
mod ledger;
mod limits;
mod reference;
mod simulator;
mod staffing;
mod types;

pub use compliance::run_compliance_checks;
pub use engine::{HALF_CENT, aggregate, calculate, fad_totals, resolve_context, with_derived_fields};
pub use ledger::{
    AllocationLine, DistributionUse, EXECUTIVE_FIELDS, ExecutiveLedger, FieldSpec,
    HIGH_QUALIFICATION_FIELDS, HighQualificationLedger, NON_EXECUTIVE_FIELDS, NonExecutiveLedger,
    ResolveContext, ResourceDistribution, SECRETARY_FIELDS, STABLE_USES, SecretaryLedger, Section,
    Sign, VARIABLE_USES, allocated_sum, find_field,
};
pub use limits::{
    CeilingAdjustment, ceiling_adjustment, equivalent_fte, equivalent_headcount,
    expected_headcount_increment, per_capita_invariance,
};
pub use reference::{IncrementRates, LegalReferences, PerCapitaValues, ReferenceData};
pub use simulator::{run_simulator, threshold_percent};
pub use staffing::{AbsorbedCosts, absorbed_stable_uses, service_ratio, with_absorbed_stable_uses};
pub use types::{
    AnnualData, CalculatedFund, CategoryBreakdown, CategoryTotals, CheckId, ComplianceCheck,
    ComponentKind, EmployeeCategory, EntityType, FadTotals, FundComponent, FundInput, FundReport,
    FundTrend, HeadcountEntry, HistoricalData, QualificationArea, Severity, SimulatorInputs,
    SimulatorResult, SpecificRevenue, StaffCount, StaffMember,
};

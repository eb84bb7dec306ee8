//! Category ledgers and their field descriptor tables.
//!
//! Every monetary field a reducer may touch is declared exactly once in a
//! static table, together with its sign, section, ceiling relevance, distress
//! behaviour and the resolver that turns the stored value into the value the
//! engine actually uses.

use serde::{Deserialize, Serialize};

use super::types::amount;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Stable,
    Variable,
    VariableSubject,
    VariableNonSubject,
    FinalDeduction,
    CeilingDeduction,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Add,
    Subtract,
}

impl Sign {
    fn apply(self, value: f64) -> f64 {
        match self {
            Sign::Add => value,
            Sign::Subtract => -value,
        }
    }
}

/// Values produced elsewhere in the pipeline that some fields mirror.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext {
    pub distressed: bool,
    pub simulator_net_increment: f64,
    pub high_qualification_transfer: f64,
}

pub type ValueResolver = fn(Option<f64>, &ResolveContext) -> f64;

pub fn raw_value(stored: Option<f64>, _ctx: &ResolveContext) -> f64 {
    amount(stored)
}

/// The decree increment only counts while the simulator leaves room for it.
pub fn simulator_gated(stored: Option<f64>, ctx: &ResolveContext) -> f64 {
    if ctx.simulator_net_increment > 0.0 {
        amount(stored)
    } else {
        0.0
    }
}

/// Mirrors the transfer booked in the high-qualification ledger; the stored
/// value is ignored.
pub fn transfer_mirror(_stored: Option<f64>, ctx: &ResolveContext) -> f64 {
    ctx.high_qualification_transfer
}

pub struct FieldSpec<L> {
    pub key: &'static str,
    pub description: &'static str,
    pub reference: &'static str,
    pub section: Section,
    pub sign: Sign,
    pub ceiling_relevant: bool,
    pub distress_disabled: bool,
    pub read: fn(&L) -> Option<f64>,
    pub resolve: ValueResolver,
}

const fn field<L>(
    key: &'static str,
    description: &'static str,
    reference: &'static str,
    section: Section,
    read: fn(&L) -> Option<f64>,
) -> FieldSpec<L> {
    FieldSpec {
        key,
        description,
        reference,
        section,
        sign: Sign::Add,
        ceiling_relevant: false,
        distress_disabled: false,
        read,
        resolve: raw_value,
    }
}

impl<L> FieldSpec<L> {
    const fn subtractive(mut self) -> Self {
        self.sign = Sign::Subtract;
        self
    }

    const fn ceiling(mut self) -> Self {
        self.ceiling_relevant = true;
        self
    }

    const fn off_in_distress(mut self) -> Self {
        self.distress_disabled = true;
        self
    }

    const fn resolved_by(mut self, resolve: ValueResolver) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn effective_value(&self, ledger: &L, ctx: &ResolveContext) -> f64 {
        if self.distress_disabled && ctx.distressed {
            return 0.0;
        }
        (self.resolve)((self.read)(ledger), ctx)
    }

    pub fn signed_value(&self, ledger: &L, ctx: &ResolveContext) -> f64 {
        self.sign.apply(self.effective_value(ledger, ctx))
    }
}

/// Signed sum of the selected fields: subtractive fields enter negated.
pub fn signed_sum<L>(
    fields: &[FieldSpec<L>],
    ledger: &L,
    ctx: &ResolveContext,
    include: impl Fn(&FieldSpec<L>) -> bool,
) -> f64 {
    fields
        .iter()
        .filter(|f| include(f))
        .map(|f| f.signed_value(ledger, ctx))
        .sum()
}

/// Sum of effective values regardless of sign, for deduction subtotals.
pub fn flat_sum<L>(
    fields: &[FieldSpec<L>],
    ledger: &L,
    ctx: &ResolveContext,
    include: impl Fn(&FieldSpec<L>) -> bool,
) -> f64 {
    fields
        .iter()
        .filter(|f| include(f))
        .map(|f| f.effective_value(ledger, ctx))
        .sum()
}

pub fn find_field<L>(fields: &'static [FieldSpec<L>], key: &str) -> Option<&'static FieldSpec<L>> {
    fields.iter().find(|f| f.key == key)
}

// ---------------------------------------------------------------------------
// Non-executive staff

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NonExecutiveLedger {
    pub single_amount_2017: Option<f64>,
    pub unused_high_professionalism: Option<f64>,
    pub increment_83_20: Option<f64>,
    pub differential_pay_increments: Option<f64>,
    pub ria_integration: Option<f64>,
    pub reabsorbed_resources: Option<f64>,
    pub transferred_staff: Option<f64>,
    pub regional_executive_reduction: Option<f64>,
    pub overtime_reduction: Option<f64>,
    pub dl78_cut_2010: Option<f64>,
    pub ata_po_outsourcing_reductions: Option<f64>,
    pub po_ap_executive_entity_cut: Option<f64>,
    pub increment_84_50: Option<f64>,
    /// Stable increment for headcount growth; checked against the 2018 per-capita value
    pub headcount_increment: Option<f64>,
    pub pay_differentials_2022: Option<f64>,
    pub b3_d3_pay_differences: Option<f64>,
    /// Mirrors the simulator's net increment
    pub pa_decree_increment: Option<f64>,
    /// Mirrors the high-qualification ledger transfer
    pub high_qualification_transfer: Option<f64>,

    pub tax_recovery: Option<f64>,
    pub monthly_ria_integration: Option<f64>,
    pub casino_staff: Option<f64>,
    pub monte_salari_1997: Option<f64>,
    pub transferred_staff_variable: Option<f64>,
    pub organisational_choices: Option<f64>,

    pub sponsorships_agreements: Option<f64>,
    pub notification_fees: Option<f64>,
    pub rationalisation_plans: Option<f64>,
    pub technical_incentives_amnesties: Option<f64>,
    pub litigation_census_incentives: Option<f64>,
    pub overtime_savings: Option<f64>,
    pub regional_percentage_increment: Option<f64>,
    pub unused_prior_stable: Option<f64>,
    pub imu_tari_collection_incentives: Option<f64>,
    pub meal_voucher_savings_2020: Option<f64>,
    pub derogation_hiring_resources: Option<f64>,
    pub monte_salari_2018_proportional: Option<f64>,
    pub increment_84_50_one_off: Option<f64>,
    pub monte_salari_2018_one_off: Option<f64>,
    pub pnrr_increment: Option<f64>,

    pub dl16_compliance_measures: Option<f64>,
    pub ceiling_2016_annual_cut: Option<f64>,
}

type Ne = NonExecutiveLedger;

pub static NON_EXECUTIVE_FIELDS: &[FieldSpec<NonExecutiveLedger>] = &[
    field::<Ne>(
        "singleAmount2017",
        "Unico importo consolidato 2017",
        "Art. 79 c.1 (rif. Art. 67 c.1 CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.single_amount_2017,
    )
    .ceiling(),
    field::<Ne>(
        "unusedHighProfessionalism",
        "Alte professionalità non utilizzate",
        "Art. 79 c.1 (rif. Art. 67 c.1 CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.unused_high_professionalism,
    )
    .ceiling(),
    field::<Ne>(
        "increment8320",
        "Incremento €83,20/unità (personale 31.12.2015)",
        "Art. 79 c.1 (rif. Art. 67 c.2a CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.increment_83_20,
    ),
    field::<Ne>(
        "differentialPayIncrements",
        "Incrementi stipendiali differenziali",
        "Art. 79 c.1 (rif. Art. 67 c.2b CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.differential_pay_increments,
    ),
    field::<Ne>(
        "riaIntegration",
        "Integrazione RIA personale cessato anno precedente",
        "Art. 79 c.1 (rif. Art. 67 c.2c CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.ria_integration,
    )
    .ceiling(),
    field::<Ne>(
        "reabsorbedResources",
        "Risorse riassorbite (Art. 2 c.3 D.Lgs 165/01)",
        "Art. 79 c.1 (rif. Art. 67 c.2d CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.reabsorbed_resources,
    )
    .ceiling(),
    field::<Ne>(
        "transferredStaff",
        "Risorse personale trasferito",
        "Art. 79 c.1 (rif. Art. 67 c.2e CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.transferred_staff,
    )
    .ceiling(),
    field::<Ne>(
        "regionalExecutiveReduction",
        "Regioni: riduzione stabile posti dirigenziali",
        "Art. 79 c.1 (rif. Art. 67 c.2f CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.regional_executive_reduction,
    )
    .ceiling(),
    field::<Ne>(
        "overtimeReduction",
        "Riduzione stabile straordinario",
        "Art. 79 c.1 (rif. Art. 67 c.2g CCNL 2018)",
        Section::Stable,
        |l: &Ne| l.overtime_reduction,
    )
    .ceiling(),
    field::<Ne>(
        "dl78Cut2010",
        "Taglio fondo DL 78/2010",
        "Art. 9 c.2bis DL 78/2010",
        Section::Stable,
        |l: &Ne| l.dl78_cut_2010,
    )
    .subtractive()
    .ceiling(),
    field::<Ne>(
        "ataPoOutsourcingReductions",
        "Riduzioni per personale ATA, PO, esternalizzazioni",
        "Disposizioni specifiche",
        Section::Stable,
        |l: &Ne| l.ata_po_outsourcing_reductions,
    )
    .subtractive()
    .ceiling(),
    field::<Ne>(
        "poApExecutiveEntityCut",
        "Decurtazione PO/AP enti con dirigenza",
        "Art. 67 c.1 CCNL 2018",
        Section::Stable,
        |l: &Ne| l.po_ap_executive_entity_cut,
    )
    .subtractive()
    .ceiling(),
    field::<Ne>(
        "increment8450",
        "Incremento €84,50/unità (personale 31.12.2018)",
        "Art. 79 c.1b CCNL 16.11.2022",
        Section::Stable,
        |l: &Ne| l.increment_84_50,
    ),
    field::<Ne>(
        "headcountIncrement",
        "Incremento stabile per consistenza personale",
        "Art. 79 c.1c CCNL 16.11.2022",
        Section::Stable,
        |l: &Ne| l.headcount_increment,
    )
    .ceiling(),
    field::<Ne>(
        "payDifferentials2022",
        "Differenziali stipendiali personale in servizio 2022",
        "Art. 79 c.1d CCNL 16.11.2022",
        Section::Stable,
        |l: &Ne| l.pay_differentials_2022,
    ),
    field::<Ne>(
        "b3D3PayDifferences",
        "Differenze stipendiali personale B3 e D3",
        "Art. 79 c.1-bis CCNL 16.11.2022",
        Section::Stable,
        |l: &Ne| l.b3_d3_pay_differences,
    ),
    field::<Ne>(
        "paDecreeIncrement",
        "Incremento Decreto PA (da simulatore)",
        "DL PA / Misure Urgenti",
        Section::Stable,
        |l: &Ne| l.pa_decree_increment,
    )
    .ceiling()
    .resolved_by(simulator_gated),
    field::<Ne>(
        "highQualificationTransfer",
        "Riduzione per incremento risorse EQ",
        "Art. 7, c.4u, CCNL 16.11.2022",
        Section::Stable,
        |l: &Ne| l.high_qualification_transfer,
    )
    .subtractive()
    .ceiling()
    .resolved_by(transfer_mirror),
    field::<Ne>(
        "taxRecovery",
        "Recupero evasione ICI",
        "Art. 67 c.3c CCNL 2018",
        Section::VariableSubject,
        |l: &Ne| l.tax_recovery,
    ),
    field::<Ne>(
        "monthlyRiaIntegration",
        "Integrazione RIA mensile personale cessato in anno",
        "Art. 67 c.3d CCNL 2018",
        Section::VariableSubject,
        |l: &Ne| l.monthly_ria_integration,
    ),
    field::<Ne>(
        "casinoStaff",
        "Risorse personale case da gioco",
        "Art. 67 c.3g CCNL 2018",
        Section::VariableSubject,
        |l: &Ne| l.casino_staff,
    )
    .off_in_distress(),
    field::<Ne>(
        "monteSalari1997",
        "Max 1,2% monte salari 1997",
        "Art. 79 c.2b CCNL 16.11.2022",
        Section::VariableSubject,
        |l: &Ne| l.monte_salari_1997,
    )
    .off_in_distress(),
    field::<Ne>(
        "transferredStaffVariable",
        "Integrazione per personale trasferito (variabile)",
        "Art. 67 c.3k CCNL 2018",
        Section::VariableSubject,
        |l: &Ne| l.transferred_staff_variable,
    )
    .off_in_distress(),
    field::<Ne>(
        "organisationalChoices",
        "Risorse per scelte organizzative",
        "Art. 79 c.2c CCNL 16.11.2022",
        Section::VariableSubject,
        |l: &Ne| l.organisational_choices,
    )
    .off_in_distress(),
    field::<Ne>(
        "sponsorshipsAgreements",
        "Sponsorizzazioni, convenzioni, servizi non essenziali",
        "Art. 67 c.3a CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.sponsorships_agreements,
    )
    .off_in_distress(),
    field::<Ne>(
        "notificationFees",
        "Quota rimborso spese notifica",
        "Art. 67 c.3f CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.notification_fees,
    )
    .off_in_distress(),
    field::<Ne>(
        "rationalisationPlans",
        "Piani di razionalizzazione (Art. 16 DL 98/11)",
        "Art. 67 c.3b CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.rationalisation_plans,
    )
    .off_in_distress(),
    field::<Ne>(
        "technicalIncentivesAmnesties",
        "Incentivi funzioni tecniche, condoni",
        "Art. 67 c.3c CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.technical_incentives_amnesties,
    ),
    field::<Ne>(
        "litigationCensusIncentives",
        "Incentivi spese giudizio, compensi censimento/ISTAT",
        "Art. 67 c.3c CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.litigation_census_incentives,
    ),
    field::<Ne>(
        "overtimeSavings",
        "Risparmi da disciplina straordinario",
        "Art. 67 c.3e CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.overtime_savings,
    ),
    field::<Ne>(
        "regionalPercentageIncrement",
        "Regioni/Città Metropolitane: incremento percentuale",
        "Art. 67 c.3j CCNL 2018",
        Section::VariableNonSubject,
        |l: &Ne| l.regional_percentage_increment,
    )
    .off_in_distress(),
    field::<Ne>(
        "unusedPriorStable",
        "Somme non utilizzate esercizi precedenti (stabili)",
        "Art. 80 c.1 CCNL 16.11.2022",
        Section::VariableNonSubject,
        |l: &Ne| l.unused_prior_stable,
    ),
    field::<Ne>(
        "imuTariCollectionIncentives",
        "Incentivi riscossione IMU/TARI",
        "L. 145/2018 Art.1 c.1091",
        Section::VariableNonSubject,
        |l: &Ne| l.imu_tari_collection_incentives,
    ),
    field::<Ne>(
        "mealVoucherSavings2020",
        "Risparmi buoni pasto 2020",
        "L. 178/2020 Art.1 c.870",
        Section::VariableNonSubject,
        |l: &Ne| l.meal_voucher_savings_2020,
    )
    .off_in_distress(),
    field::<Ne>(
        "derogationHiringResources",
        "Risorse accessorie per assunzioni in deroga",
        "DL 135/2018 Art.11 c.1b",
        Section::VariableNonSubject,
        |l: &Ne| l.derogation_hiring_resources,
    )
    .off_in_distress(),
    field::<Ne>(
        "monteSalari2018Proportional",
        "0,22% MS 2018 (quota proporzionale)",
        "Art. 79 c.3 CCNL 16.11.2022",
        Section::VariableNonSubject,
        |l: &Ne| l.monte_salari_2018_proportional,
    )
    .off_in_distress(),
    field::<Ne>(
        "increment8450OneOff",
        "€84,50/unità una tantum 2021-22",
        "Art. 79 c.1b CCNL 16.11.2022",
        Section::VariableNonSubject,
        |l: &Ne| l.increment_84_50_one_off,
    )
    .off_in_distress(),
    field::<Ne>(
        "monteSalari2018OneOff",
        "0,22% MS 2018 una tantum 2022",
        "Art. 79 c.3 CCNL 16.11.2022",
        Section::VariableNonSubject,
        |l: &Ne| l.monte_salari_2018_one_off,
    )
    .off_in_distress(),
    field::<Ne>(
        "pnrrIncrement",
        "Incremento PNRR (max 5% fondo stabile 2016)",
        "Art. 8, D.L. 13/2023",
        Section::VariableNonSubject,
        |l: &Ne| l.pnrr_increment,
    )
    .off_in_distress(),
    field::<Ne>(
        "dl16ComplianceMeasures",
        "Misure per mancato rispetto vincoli",
        "Art. 4, D.L. 16/2014",
        Section::FinalDeduction,
        |l: &Ne| l.dl16_compliance_measures,
    )
    .subtractive(),
    field::<Ne>(
        "ceiling2016AnnualCut",
        "Decurtazione annuale per rispetto tetto 2016",
        "Art. 23, c.2, D.Lgs. 75/2017",
        Section::CeilingDeduction,
        |l: &Ne| l.ceiling_2016_annual_cut,
    )
    .subtractive(),
];

// ---------------------------------------------------------------------------
// High-qualification officers (EQ)

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighQualificationLedger {
    pub po_fund_2017: Option<f64>,
    /// Amount moved out of the non-executive fund
    pub transfer_from_staff_fund: Option<f64>,
    pub dl34_ceiling_increment: Option<f64>,
    pub monte_salari_2018_increment: Option<f64>,
    pub ceiling_2016_adjustment: Option<f64>,

    pub position_pay: Option<f64>,
    pub position_pay_art16c4: Option<f64>,
    pub interim_pay: Option<f64>,
    pub seat_premium: Option<f64>,
    pub result_pay: Option<f64>,
}

impl HighQualificationLedger {
    pub fn transfer(&self) -> f64 {
        amount(self.transfer_from_staff_fund)
    }

    pub fn spend_total(&self) -> f64 {
        amount(self.position_pay)
            + amount(self.position_pay_art16c4)
            + amount(self.interim_pay)
            + amount(self.seat_premium)
            + amount(self.result_pay)
    }
}

type Hq = HighQualificationLedger;

pub static HIGH_QUALIFICATION_FIELDS: &[FieldSpec<HighQualificationLedger>] = &[
    field::<Hq>(
        "poFund2017",
        "Fondo PO 2017",
        "Art. 17 CCNL 16.11.2022",
        Section::Stable,
        |l: &Hq| l.po_fund_2017,
    )
    .ceiling(),
    field::<Hq>(
        "transferFromStaffFund",
        "Incremento con riduzione del fondo dipendenti",
        "Art. 7, c.4u, CCNL 16.11.2022",
        Section::Stable,
        |l: &Hq| l.transfer_from_staff_fund,
    )
    .ceiling(),
    field::<Hq>(
        "dl34CeilingIncrement",
        "Incremento limite Art. 23 c.2 (Art. 33 DL 34/2019)",
        "Art. 33, D.L. 34/2019",
        Section::Stable,
        |l: &Hq| l.dl34_ceiling_increment,
    )
    .ceiling(),
    field::<Hq>(
        "ceiling2016Adjustment",
        "Adeguamento per rispetto tetto 2016",
        "Art. 23, c.2, D.Lgs. 75/2017",
        Section::Stable,
        |l: &Hq| l.ceiling_2016_adjustment,
    )
    .subtractive(),
    field::<Hq>(
        "monteSalari2018Increment",
        "Incremento 0,22% monte salari 2018",
        "Art. 79 c.3 CCNL 16.11.2022",
        Section::Variable,
        |l: &Hq| l.monte_salari_2018_increment,
    ),
];

// ---------------------------------------------------------------------------
// Municipal secretary

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecretaryLedger {
    pub position_pay_2011: Option<f64>,
    pub pay_rise_differential: Option<f64>,
    pub class_position_pay: Option<f64>,
    pub complexity_premium: Option<f64>,
    pub executive_alignment: Option<f64>,
    pub agreement_supplement: Option<f64>,
    pub regency_allowance: Option<f64>,

    pub secretariat_rights: Option<f64>,
    pub other_statutory_fees: Option<f64>,
    pub pnrr_increment: Option<f64>,
    pub result_pay_10: Option<f64>,
    pub result_pay_15: Option<f64>,
    pub metropolitan_excess: Option<f64>,
    pub monte_salari_2018_increment: Option<f64>,

    pub ceiling_relevant_total: Option<f64>,
    /// Share of the post actually covered, in percent; unset means 100
    pub coverage_percentage: Option<f64>,
}

impl SecretaryLedger {
    pub fn coverage_factor(&self) -> f64 {
        match self.coverage_percentage {
            Some(p) if p.is_finite() => p / 100.0,
            _ => 1.0,
        }
    }
}

type Sec = SecretaryLedger;

pub static SECRETARY_FIELDS: &[FieldSpec<SecretaryLedger>] = &[
    field::<Sec>(
        "positionPay2011",
        "Retribuzione di posizione",
        "Art. 3, c.6, CCNL Segretari 01.03.2011",
        Section::Stable,
        |l: &Sec| l.position_pay_2011,
    ),
    field::<Sec>(
        "payRiseDifferential",
        "Differenziale aumento",
        "Art. 58, c.1, CCNL Segretari 16.07.2024",
        Section::Stable,
        |l: &Sec| l.pay_rise_differential,
    ),
    field::<Sec>(
        "classPositionPay",
        "Retribuzione di posizione per classi",
        "Art. 60, c.1, CCNL Segretari 16.07.2024",
        Section::Stable,
        |l: &Sec| l.class_position_pay,
    ),
    field::<Sec>(
        "complexityPremium",
        "Maggiorazione per complessità",
        "Art. 60, c.3, CCNL Segretari 16.07.2024",
        Section::Stable,
        |l: &Sec| l.complexity_premium,
    ),
    field::<Sec>(
        "executiveAlignment",
        "Allineamento con dirigenza/EQ",
        "Art. 60, c.5, CCNL Segretari 16.07.2024",
        Section::Stable,
        |l: &Sec| l.executive_alignment,
    ),
    field::<Sec>(
        "agreementSupplement",
        "Retribuzione aggiuntiva per convenzioni",
        "Art. 56, c.1g, CCNL Segretari 16.07.2024",
        Section::Stable,
        |l: &Sec| l.agreement_supplement,
    ),
    field::<Sec>(
        "regencyAllowance",
        "Indennità di reggenza/supplenza",
        "Art. 56, c.1h, CCNL Segretari 16.07.2024",
        Section::Stable,
        |l: &Sec| l.regency_allowance,
    ),
    field::<Sec>(
        "secretariatRights",
        "Diritti di segreteria",
        "Art. 56, c.1f, CCNL Segretari 16.07.2024",
        Section::Variable,
        |l: &Sec| l.secretariat_rights,
    ),
    field::<Sec>(
        "otherStatutoryFees",
        "Altri compensi previsti dalla legge",
        "Art. 56, c.1i, CCNL Segretari 16.07.2024",
        Section::Variable,
        |l: &Sec| l.other_statutory_fees,
    ),
    field::<Sec>(
        "pnrrIncrement",
        "Incremento PNRR",
        "Art. 8, c.3, D.L. 13/2023",
        Section::Variable,
        |l: &Sec| l.pnrr_increment,
    ),
    field::<Sec>(
        "resultPay10",
        "Retribuzione di risultato (10%)",
        "Art. 61, c.2, CCNL Segretari 16.07.2024",
        Section::Variable,
        |l: &Sec| l.result_pay_10,
    ),
    field::<Sec>(
        "resultPay15",
        "Retribuzione di risultato (15%)",
        "Art. 61, c.2bis, CCNL Segretari 16.07.2024",
        Section::Variable,
        |l: &Sec| l.result_pay_15,
    ),
    field::<Sec>(
        "metropolitanExcess",
        "Superamento limite città metropolitane",
        "Art. 61, c.2ter, CCNL Segretari 16.07.2024",
        Section::Variable,
        |l: &Sec| l.metropolitan_excess,
    ),
    field::<Sec>(
        "monteSalari2018Increment",
        "Incremento 0,22% monte salari 2018",
        "Art. 61, c.3, CCNL Segretari 16.07.2024",
        Section::Variable,
        |l: &Sec| l.monte_salari_2018_increment,
    ),
];

// ---------------------------------------------------------------------------
// Executives

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutiveLedger {
    pub single_amount_2020: Option<f64>,
    pub ria_ceased_2020: Option<f64>,
    pub monte_salari_2015_increment: Option<f64>,
    pub ria_ceased_following_year: Option<f64>,
    pub autonomous_stable: Option<f64>,
    pub monte_salari_2018_increment: Option<f64>,

    pub law_sponsor_resources: Option<f64>,
    pub all_inclusive_sums: Option<f64>,
    pub autonomous_variable: Option<f64>,
    pub prior_year_residuals: Option<f64>,
    pub pnrr_increment: Option<f64>,
    pub recovery_0_46: Option<f64>,
    pub recovery_2_01: Option<f64>,
    pub valorisation_0_22: Option<f64>,
    pub dl34_derogation_increment: Option<f64>,

    pub ceiling_relevant_total: Option<f64>,
    pub ceiling_adjustment: Option<f64>,
    pub compliance_measures_cut: Option<f64>,
}

type Ex = ExecutiveLedger;

pub static EXECUTIVE_FIELDS: &[FieldSpec<ExecutiveLedger>] = &[
    field::<Ex>(
        "singleAmount2020",
        "Unico importo 2020",
        "Art. 57, c.2a, CCNL Dirigenza 17.12.2020",
        Section::Stable,
        |l: &Ex| l.single_amount_2020,
    ),
    field::<Ex>(
        "riaCeased2020",
        "RIA personale cessato 2020",
        "Art. 57, c.2a, CCNL Dirigenza 17.12.2020",
        Section::Stable,
        |l: &Ex| l.ria_ceased_2020,
    ),
    field::<Ex>(
        "monteSalari2015Increment",
        "Incremento 1,53% monte salari 2015",
        "Art. 56, c.1, CCNL Dirigenza 17.12.2020",
        Section::Stable,
        |l: &Ex| l.monte_salari_2015_increment,
    ),
    field::<Ex>(
        "riaCeasedFollowingYear",
        "RIA cessati dall'anno successivo",
        "Art. 57, c.2c, CCNL Dirigenza 17.12.2020",
        Section::Stable,
        |l: &Ex| l.ria_ceased_following_year,
    ),
    field::<Ex>(
        "autonomousStable",
        "Risorse autonome stabili",
        "Art. 57, c.2e, CCNL Dirigenza 17.12.2020",
        Section::Stable,
        |l: &Ex| l.autonomous_stable,
    ),
    field::<Ex>(
        "monteSalari2018Increment",
        "Incremento 2,01% monte salari 2018",
        "Art. 39, c.1, CCNL Dirigenza 16.07.2024",
        Section::Stable,
        |l: &Ex| l.monte_salari_2018_increment,
    ),
    field::<Ex>(
        "ceilingAdjustment",
        "Adeguamento annuale tetto 2016",
        "Art. 23, c.2, D.Lgs. 75/2017",
        Section::Stable,
        |l: &Ex| l.ceiling_adjustment,
    ),
    field::<Ex>(
        "complianceMeasuresCut",
        "Misure per mancato rispetto vincoli",
        "Art. 4, D.L. 16/2014",
        Section::Stable,
        |l: &Ex| l.compliance_measures_cut,
    )
    .subtractive(),
    field::<Ex>(
        "lawSponsorResources",
        "Risorse da leggi e sponsorizzazioni",
        "Art. 57, c.2b, CCNL Dirigenza 17.12.2020",
        Section::Variable,
        |l: &Ex| l.law_sponsor_resources,
    ),
    field::<Ex>(
        "allInclusiveSums",
        "Somme da onnicomprensività",
        "Art. 57, c.2d, CCNL Dirigenza 17.12.2020",
        Section::Variable,
        |l: &Ex| l.all_inclusive_sums,
    ),
    field::<Ex>(
        "autonomousVariable",
        "Risorse autonome variabili",
        "Art. 57, c.2e, CCNL Dirigenza 17.12.2020",
        Section::Variable,
        |l: &Ex| l.autonomous_variable,
    ),
    field::<Ex>(
        "priorYearResiduals",
        "Residui anno precedente",
        "Art. 57, c.3, CCNL Dirigenza 17.12.2020",
        Section::Variable,
        |l: &Ex| l.prior_year_residuals,
    ),
    field::<Ex>(
        "pnrrIncrement",
        "Incremento PNRR",
        "Art. 8, c.3, D.L. 13/2023",
        Section::Variable,
        |l: &Ex| l.pnrr_increment,
    ),
    field::<Ex>(
        "recovery046",
        "Recupero 0,46% monte salari 2018 (2020)",
        "Art. 39, c.1, CCNL Dirigenza 16.07.2024",
        Section::Variable,
        |l: &Ex| l.recovery_0_46,
    ),
    field::<Ex>(
        "recovery201",
        "Recupero 2,01% monte salari 2018 (2021-2023)",
        "Art. 39, c.1, CCNL Dirigenza 16.07.2024",
        Section::Variable,
        |l: &Ex| l.recovery_2_01,
    ),
    field::<Ex>(
        "valorisation022",
        "Incremento 0,22% monte salari 2018",
        "Art. 39, c.2, CCNL Dirigenza 16.07.2024",
        Section::Variable,
        |l: &Ex| l.valorisation_0_22,
    ),
    field::<Ex>(
        "dl34DerogationIncrement",
        "Incremento in deroga",
        "Art. 33, c.2, D.L. 34/2019",
        Section::Variable,
        |l: &Ex| l.dl34_derogation_increment,
    ),
];

// ---------------------------------------------------------------------------
// Resource distribution (how the non-executive fund is spent)

/// One variable use: what was allocated, what was saved, what is budgeted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocationLine {
    pub allocated: Option<f64>,
    pub realized_savings: Option<f64>,
    pub budgeted: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceDistribution {
    pub historical_progressions: Option<f64>,
    pub sector_allowance: Option<f64>,
    pub educator_allowance_increase: AllocationLine,
    pub school_staff_allowance_increase: AllocationLine,
    pub former_eighth_grade_allowance: AllocationLine,

    pub organisational_performance: AllocationLine,
    pub individual_performance: AllocationLine,
    pub individual_performance_bonus: AllocationLine,
    pub working_conditions_allowance: AllocationLine,
    pub shift_allowance: AllocationLine,
    pub on_call_allowance: AllocationLine,
    pub rest_day_work_allowance: AllocationLine,
    pub specific_responsibilities: AllocationLine,
    pub function_allowance: AllocationLine,
    pub external_service_allowance: AllocationLine,
    pub local_police_objectives: AllocationLine,
    pub third_party_incentives: AllocationLine,
    pub internal_counsel_fees: AllocationLine,
    pub technical_incentives_pre_2018: AllocationLine,
    pub technical_incentives_post_2018: AllocationLine,
    pub imu_tari_incentives: AllocationLine,
    pub process_server_fees: AllocationLine,
    pub casino_staff_fees: AllocationLine,
    pub casino_staff_fees_uncovered: AllocationLine,
    pub pay_differentials_prior_years: AllocationLine,
    pub pay_differentials_current_year: AllocationLine,
    pub welfare_plans: AllocationLine,
}

pub struct DistributionUse {
    pub key: &'static str,
    pub description: &'static str,
    pub allocated: fn(&ResourceDistribution) -> f64,
}

type Rd = ResourceDistribution;

const fn line(
    key: &'static str,
    description: &'static str,
    allocated: fn(&Rd) -> f64,
) -> DistributionUse {
    DistributionUse {
        key,
        description,
        allocated,
    }
}

pub static STABLE_USES: &[DistributionUse] = &[
    line(
        "historicalProgressions",
        "Differenziali progressioni orizzontali storiche",
        |d: &Rd| amount(d.historical_progressions),
    ),
    line("sectorAllowance", "Indennità di comparto", |d: &Rd| {
        amount(d.sector_allowance)
    }),
    line(
        "educatorAllowanceIncrease",
        "Incremento indennità personale educativo asili nido",
        |d: &Rd| amount(d.educator_allowance_increase.allocated),
    ),
    line(
        "schoolStaffAllowanceIncrease",
        "Incremento indennità personale scolastico",
        |d: &Rd| amount(d.school_staff_allowance_increase.allocated),
    ),
    line(
        "formerEighthGradeAllowance",
        "Indennità personale ex 8^ q.f. non titolare di PO",
        |d: &Rd| amount(d.former_eighth_grade_allowance.allocated),
    ),
];

pub static VARIABLE_USES: &[DistributionUse] = &[
    line(
        "organisationalPerformance",
        "Premi performance organizzativa",
        |d: &Rd| amount(d.organisational_performance.allocated),
    ),
    line(
        "individualPerformance",
        "Premi performance individuale",
        |d: &Rd| amount(d.individual_performance.allocated),
    ),
    line(
        "individualPerformanceBonus",
        "Maggiorazione premio individuale",
        |d: &Rd| amount(d.individual_performance_bonus.allocated),
    ),
    line(
        "workingConditionsAllowance",
        "Indennità condizioni di lavoro",
        |d: &Rd| amount(d.working_conditions_allowance.allocated),
    ),
    line("shiftAllowance", "Indennità di turno", |d: &Rd| {
        amount(d.shift_allowance.allocated)
    }),
    line("onCallAllowance", "Indennità di reperibilità", |d: &Rd| {
        amount(d.on_call_allowance.allocated)
    }),
    line(
        "restDayWorkAllowance",
        "Indennità lavoro nel giorno di riposo",
        |d: &Rd| amount(d.rest_day_work_allowance.allocated),
    ),
    line(
        "specificResponsibilities",
        "Compensi per specifiche responsabilità",
        |d: &Rd| amount(d.specific_responsibilities.allocated),
    ),
    line("functionAllowance", "Indennità di funzione", |d: &Rd| {
        amount(d.function_allowance.allocated)
    }),
    line(
        "externalServiceAllowance",
        "Indennità di servizio esterno",
        |d: &Rd| amount(d.external_service_allowance.allocated),
    ),
    line(
        "localPoliceObjectives",
        "Obiettivi di potenziamento Polizia Locale",
        |d: &Rd| amount(d.local_police_objectives.allocated),
    ),
    line(
        "thirdPartyIncentives",
        "Incentivi da entrate conto terzi",
        |d: &Rd| amount(d.third_party_incentives.allocated),
    ),
    line(
        "internalCounselFees",
        "Compensi avvocatura interna",
        |d: &Rd| amount(d.internal_counsel_fees.allocated),
    ),
    line(
        "technicalIncentivesPre2018",
        "Incentivi condono e funzioni tecniche pre-2018",
        |d: &Rd| amount(d.technical_incentives_pre_2018.allocated),
    ),
    line(
        "technicalIncentivesPost2018",
        "Incentivi funzioni tecniche post-2018",
        |d: &Rd| amount(d.technical_incentives_post_2018.allocated),
    ),
    line(
        "imuTariIncentives",
        "Incentivi accertamenti IMU e TARI",
        |d: &Rd| amount(d.imu_tari_incentives.allocated),
    ),
    line(
        "processServerFees",
        "Compensi messi notificatori",
        |d: &Rd| amount(d.process_server_fees.allocated),
    ),
    line("casinoStaffFees", "Compensi personale case da gioco", |d: &Rd| {
        amount(d.casino_staff_fees.allocated)
    }),
    line(
        "casinoStaffFeesUncovered",
        "Compensi case da gioco non coperti da stabili",
        |d: &Rd| amount(d.casino_staff_fees_uncovered.allocated),
    ),
    line(
        "payDifferentialsPriorYears",
        "Differenziali stipendiali anni precedenti",
        |d: &Rd| amount(d.pay_differentials_prior_years.allocated),
    ),
    line(
        "payDifferentialsCurrentYear",
        "Differenziali stipendiali anno corrente",
        |d: &Rd| amount(d.pay_differentials_current_year.allocated),
    ),
    line("welfarePlans", "Piani welfare", |d: &Rd| {
        amount(d.welfare_plans.allocated)
    }),
];

pub fn allocated_sum(uses: &[DistributionUse], distribution: &ResourceDistribution) -> f64 {
    uses.iter().map(|u| (u.allocated)(distribution)).sum()
}

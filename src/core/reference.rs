use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::QualificationArea;
use crate::error::{FundError, Result};

const BUNDLED_REFERENCE: &str = include_str!("../../data/reference.json");

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PerCapitaValues {
    pub art67_ccnl_2018: f64,
    pub art79_ccnl_2022_b: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IncrementRates {
    /// Share of 2023 tabular salaries a virtuous entity may add
    pub virtuous_increment: f64,
    /// Cap of the PNRR increment, as a share of the 2016 ceiling
    pub pnrr_increment: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LegalReferences {
    pub art8_dl13_2023: String,
    pub art14_dl25_2025: String,
    pub art17_ccnl2022: String,
    pub art23_dlgs75_2017: String,
    pub art33_dl34_2019: String,
    pub art45_dlgs36_2023: String,
    pub art67_ccnl2018: String,
    pub art79_ccnl2022: String,
    pub art79_c1c_ccnl2022: String,
    pub art80_ccnl2022: String,
    pub art208_cds: String,
    pub sound_financial_management: String,
}

impl LegalReferences {
    fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("art8_dl13_2023", self.art8_dl13_2023.as_str()),
            ("art14_dl25_2025", self.art14_dl25_2025.as_str()),
            ("art17_ccnl2022", self.art17_ccnl2022.as_str()),
            ("art23_dlgs75_2017", self.art23_dlgs75_2017.as_str()),
            ("art33_dl34_2019", self.art33_dl34_2019.as_str()),
            ("art45_dlgs36_2023", self.art45_dlgs36_2023.as_str()),
            ("art67_ccnl2018", self.art67_ccnl2018.as_str()),
            ("art79_ccnl2022", self.art79_ccnl2022.as_str()),
            ("art79_c1c_ccnl2022", self.art79_c1c_ccnl2022.as_str()),
            ("art80_ccnl2022", self.art80_ccnl2022.as_str()),
            ("art208_cds", self.art208_cds.as_str()),
            ("sound_financial_management", self.sound_financial_management.as_str()),
        ]
    }
}

/// Static legal constants and rate tables. Read-only once loaded, so one
/// instance can back any number of concurrent calculations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReferenceData {
    pub per_capita: PerCapitaValues,
    pub rates: IncrementRates,
    pub legal_references: LegalReferences,
    #[serde(default)]
    pub progression_values: BTreeMap<QualificationArea, BTreeMap<String, f64>>,
    #[serde(default)]
    pub sector_allowance_values: BTreeMap<QualificationArea, f64>,
}

impl ReferenceData {
    /// The table shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_REFERENCE, "bundled reference data")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| FundError::io(path, e))?;
        let data = Self::from_json_str(&raw, path.display().to_string())?;
        log::info!("Loaded reference data from {}", path.display());
        Ok(data)
    }

    /// Loads `path` when given, otherwise the bundled table.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                log::debug!("Using bundled reference data");
                Self::bundled()
            }
        }
    }

    pub fn from_json_str(json: &str, context: impl Into<String>) -> Result<Self> {
        let data: Self = serde_json::from_str(json).map_err(|e| FundError::json(context, e))?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<()> {
        let per_capita = [
            ("per_capita.art67_ccnl_2018", self.per_capita.art67_ccnl_2018),
            ("per_capita.art79_ccnl_2022_b", self.per_capita.art79_ccnl_2022_b),
        ];
        for (name, value) in per_capita {
            if !value.is_finite() || value < 0.0 {
                return Err(FundError::invalid_reference(format!(
                    "{name} must be a finite amount >= 0"
                )));
            }
        }

        let rates = [
            ("rates.virtuous_increment", self.rates.virtuous_increment),
            ("rates.pnrr_increment", self.rates.pnrr_increment),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(FundError::invalid_reference(format!(
                    "{name} must be between 0 and 1"
                )));
            }
        }

        for (name, citation) in self.legal_references.entries() {
            if citation.trim().is_empty() {
                return Err(FundError::invalid_reference(format!(
                    "legal_references.{name} must not be empty"
                )));
            }
        }

        let progression = self
            .progression_values
            .values()
            .flat_map(|levels| levels.values());
        for value in progression.chain(self.sector_allowance_values.values()) {
            if !value.is_finite() || *value < 0.0 {
                return Err(FundError::invalid_reference(
                    "progression and sector allowance values must be finite amounts >= 0",
                ));
            }
        }

        Ok(())
    }

    pub fn progression_value(&self, area: QualificationArea, level: &str) -> Option<f64> {
        self.progression_values
            .get(&area)
            .and_then(|levels| levels.get(level))
            .copied()
    }

    pub fn sector_allowance(&self, area: QualificationArea) -> Option<f64> {
        self.sector_allowance_values.get(&area).copied()
    }
}

//! Security records and the sample universe.
//!
//! A `Security` is a read-only snapshot owned by the data provider; the
//! engine never mutates it. Metric slots are stored in canonical units
//! (rupees for currency, fractions for percentages) and are assumed to
//! be pre-rounded to two decimal places by the provider, which is why
//! execution compares them exactly with no epsilon.

use serde::{Deserialize, Serialize};

use crate::catalog::{FieldKey, Sector};

/// One security in the screening universe.
///
/// Fundamental metrics are optional: a loss-making company has no PE,
/// a non-paying one has no dividend yield. Missing values fail any
/// comparison clause and sort last regardless of direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub symbol: String,
    pub name: String,
    pub sector: Sector,
    /// Last traded price, rupees.
    pub price: f64,
    /// Day change as a fraction (0.012 == +1.2%).
    pub change_pct: f64,
    /// Market capitalisation, rupees.
    pub mcap: f64,
    /// Traded volume, shares.
    pub volume: f64,
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
    pub roce: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    /// Earnings per share, rupees.
    pub eps: Option<f64>,
    pub profit_growth: Option<f64>,
    pub sales_growth: Option<f64>,
}

impl Security {
    /// Numeric slot for a field, in canonical units.
    ///
    /// Identity fields (`symbol`, `name`, `sector`) have no numeric
    /// value and return `None`.
    pub fn metric(&self, field: FieldKey) -> Option<f64> {
        match field {
            FieldKey::Symbol | FieldKey::Name | FieldKey::Sector => None,
            FieldKey::Price => Some(self.price),
            FieldKey::ChangePct => Some(self.change_pct),
            FieldKey::Mcap => Some(self.mcap),
            FieldKey::Volume => Some(self.volume),
            FieldKey::Pe => self.pe,
            FieldKey::Pb => self.pb,
            FieldKey::Roe => self.roe,
            FieldKey::Roce => self.roce,
            FieldKey::DividendYield => self.dividend_yield,
            FieldKey::DebtToEquity => self.debt_to_equity,
            FieldKey::Eps => self.eps,
            FieldKey::ProfitGrowth => self.profit_growth,
            FieldKey::SalesGrowth => self.sales_growth,
        }
    }

    /// Text rendering of one field, for table display.
    pub fn display_field(&self, field: FieldKey) -> String {
        match field {
            FieldKey::Symbol => self.symbol.clone(),
            FieldKey::Name => self.name.clone(),
            FieldKey::Sector => self.sector.to_string(),
            _ => match self.metric(field) {
                Some(v) => crate::catalog::CATALOG.format_value(field, v),
                None => "-".to_string(),
            },
        }
    }
}

/// Deterministic sample universe used by the REPL binary and tests.
///
/// NSE-flavored synthetic figures in canonical units. A couple of
/// entries carry deliberate gaps (no PE for the loss-maker, no dividend
/// yield for non-payers) so null handling stays exercised.
pub fn sample_universe() -> Vec<Security> {
    fn sec(
        symbol: &str,
        name: &str,
        sector: Sector,
        price: f64,
        change_pct: f64,
        mcap: f64,
        volume: f64,
        pe: Option<f64>,
        pb: Option<f64>,
        roe: Option<f64>,
        roce: Option<f64>,
        dividend_yield: Option<f64>,
        debt_to_equity: Option<f64>,
        eps: Option<f64>,
        profit_growth: Option<f64>,
        sales_growth: Option<f64>,
    ) -> Security {
        Security {
            symbol: symbol.to_string(),
            name: name.to_string(),
            sector,
            price,
            change_pct,
            mcap,
            volume,
            pe,
            pb,
            roe,
            roce,
            dividend_yield,
            debt_to_equity,
            eps,
            profit_growth,
            sales_growth,
        }
    }

    vec![
        sec("INFY", "Infosys", Sector::It, 1520.50, 0.012, 6.31e12, 4.2e6,
            Some(24.10), Some(7.10), Some(0.30), Some(0.37), Some(0.023), Some(0.10),
            Some(63.10), Some(0.08), Some(0.04)),
        sec("TCS", "Tata Consultancy Services", Sector::It, 3890.00, -0.004, 1.41e13, 1.8e6,
            Some(29.50), Some(12.40), Some(0.46), Some(0.55), Some(0.016), Some(0.08),
            Some(131.80), Some(0.09), Some(0.07)),
        sec("WIPRO", "Wipro", Sector::It, 465.20, 0.006, 2.43e12, 5.1e6,
            Some(14.60), Some(2.40), Some(0.16), Some(0.18), Some(0.002), Some(0.17),
            Some(31.90), Some(0.05), Some(0.01)),
        sec("HDFCBANK", "HDFC Bank", Sector::Banking, 1645.30, 0.009, 1.15e13, 9.8e6,
            Some(18.90), Some(2.60), Some(0.17), Some(0.16), Some(0.012), Some(0.90),
            Some(87.00), Some(0.20), Some(0.18)),
        sec("SBIN", "State Bank of India", Sector::Banking, 781.40, 0.015, 6.97e12, 1.2e7,
            Some(9.80), Some(1.50), Some(0.17), Some(0.14), Some(0.019), Some(1.40),
            Some(79.70), Some(0.21), Some(0.12)),
        sec("SUNPHARMA", "Sun Pharmaceutical Industries", Sector::Pharma, 1701.20, -0.002, 4.08e12, 1.4e6,
            Some(34.20), Some(5.50), Some(0.17), Some(0.19), Some(0.008), Some(0.05),
            Some(49.70), Some(0.15), Some(0.10)),
        sec("CIPLA", "Cipla", Sector::Pharma, 1488.60, 0.004, 1.20e12, 1.1e6,
            Some(27.80), Some(4.20), Some(0.15), Some(0.18), Some(0.009), Some(0.04),
            Some(53.50), Some(0.12), Some(0.08)),
        sec("RELIANCE", "Reliance Industries", Sector::Energy, 2561.80, 0.003, 1.73e13, 5.6e6,
            Some(27.90), Some(2.10), Some(0.09), Some(0.10), Some(0.004), Some(0.44),
            Some(91.80), Some(0.06), Some(0.11)),
        sec("ONGC", "Oil & Natural Gas Corporation", Sector::Energy, 242.70, -0.011, 3.05e12, 8.9e6,
            Some(7.20), Some(0.90), Some(0.16), Some(0.17), Some(0.048), Some(0.32),
            Some(33.70), Some(0.03), Some(-0.02)),
        sec("ITC", "ITC", Sector::Fmcg, 441.10, 0.001, 5.51e12, 7.3e6,
            Some(25.60), Some(7.40), Some(0.29), Some(0.38), Some(0.033), Some(0.00),
            Some(17.20), Some(0.07), Some(0.05)),
        sec("TATAMOTORS", "Tata Motors", Sector::Auto, 948.50, 0.021, 3.15e12, 1.5e7,
            Some(17.10), Some(3.80), Some(0.28), Some(0.20), None, Some(1.10),
            Some(55.40), Some(0.35), Some(0.14)),
        sec("TATASTEEL", "Tata Steel", Sector::Metal, 142.90, -0.008, 1.78e12, 3.4e7,
            None, Some(1.30), Some(-0.05), Some(0.02), Some(0.022), Some(0.80),
            None, None, Some(-0.04)),
        sec("DLF", "DLF", Sector::Realty, 832.00, 0.018, 2.06e12, 2.7e6,
            Some(45.30), Some(5.10), Some(0.11), Some(0.09), Some(0.006), Some(0.09),
            Some(18.40), Some(0.26), Some(0.19)),
        sec("BHARTIARTL", "Bharti Airtel", Sector::Telecom, 1402.30, 0.007, 8.41e12, 4.9e6,
            Some(58.00), Some(9.30), Some(0.14), Some(0.12), Some(0.005), Some(1.90),
            Some(24.20), Some(0.30), Some(0.08)),
    ]
}

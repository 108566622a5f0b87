//! Tier Tables - Static Pricing Configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::engine::PricingError;
use crate::seats::SeatAllowance;
use crate::validation::ValidationConfig;

/// Multiplier applied to every plan's base price for one axis selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFactor", into = "RawFactor")]
pub enum ScalingFactor {
    Numeric(f64),
    /// No list price exists for this selection; the buyer talks to sales.
    ContactSales,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawFactor {
    Number(f64),
    Marker(SalesMarker),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SalesMarker {
    ContactSales,
}

impl From<RawFactor> for ScalingFactor {
    fn from(raw: RawFactor) -> Self {
        match raw {
            RawFactor::Number(n) => Self::Numeric(n),
            RawFactor::Marker(SalesMarker::ContactSales) => Self::ContactSales,
        }
    }
}

impl From<ScalingFactor> for RawFactor {
    fn from(factor: ScalingFactor) -> Self {
        match factor {
            ScalingFactor::Numeric(n) => Self::Number(n),
            ScalingFactor::ContactSales => Self::Marker(SalesMarker::ContactSales),
        }
    }
}

impl ScalingFactor {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::ContactSales => None,
        }
    }

    pub fn is_contact_sales(&self) -> bool {
        matches!(self, Self::ContactSales)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisKind {
    DataAmount,
    Perspectives,
}

impl fmt::Display for AxisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataAmount => write!(f, "data_amount"),
            Self::Perspectives => write!(f, "perspectives"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTier {
    pub label: String,
    pub factor: ScalingFactor,
}

impl AxisTier {
    pub fn new(label: impl Into<String>, factor: ScalingFactor) -> Self {
        Self { label: label.into(), factor }
    }
}

/// One selectable pricing dimension. Ordinal index = position in `tiers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub id: AxisKind,
    pub label: String,
    pub tiers: Vec<AxisTier>,
}

impl Axis {
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Look up a selection. Out-of-range indices are rejected, never clamped.
    pub fn tier_at(&self, index: usize) -> Result<&AxisTier, PricingError> {
        self.tiers.get(index).ok_or(PricingError::InvalidSelection {
            axis: self.id,
            index,
            len: self.tiers.len(),
        })
    }

    pub fn factor_at(&self, index: usize) -> Result<ScalingFactor, PricingError> {
        self.tier_at(index).map(|tier| tier.factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductTierId {
    Core,
    Pro,
    Excellence,
}

impl ProductTierId {
    pub const ALL: [ProductTierId; 3] = [Self::Core, Self::Pro, Self::Excellence];
}

impl fmt::Display for ProductTierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Pro => write!(f, "pro"),
            Self::Excellence => write!(f, "excellence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTier {
    pub id: ProductTierId,
    pub name: String,
    /// Annual list price before axis scaling.
    pub base_price: u64,
    #[serde(default)]
    pub seats: SeatAllowance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    pub config_version: String,
    #[serde(default = "default_engine_min_version")]
    pub engine_min_version: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub data_amount: Axis,
    pub perspectives: Axis,
    pub products: Vec<ProductTier>,
    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_engine_min_version() -> String { crate::MIN_ENGINE_VERSION.to_string() }
fn default_currency() -> String { "EUR".to_string() }

impl PricingConfig {
    /// The shipped price list.
    pub fn reference() -> Self {
        use ScalingFactor::{ContactSales, Numeric};

        let axis = |id, label: &str, tiers: [(&str, ScalingFactor); 5]| Axis {
            id,
            label: label.to_string(),
            tiers: tiers.into_iter().map(|(l, f)| AxisTier::new(l, f)).collect(),
        };

        Self {
            config_version: "2024.1".to_string(),
            engine_min_version: default_engine_min_version(),
            currency: default_currency(),
            data_amount: axis(AxisKind::DataAmount, "Data amount", [
                ("15 Mio.", Numeric(1.6)),
                ("35 Mio.", Numeric(2.4)),
                ("85 Mio.", Numeric(3.0)),
                ("150 Mio.", Numeric(3.5)),
                ("300 Mio.", ContactSales),
            ]),
            perspectives: axis(AxisKind::Perspectives, "Perspectives", [
                ("8x", Numeric(1.4)),
                ("16x", Numeric(1.7)),
                ("40x", Numeric(1.9)),
                ("100x", Numeric(2.1)),
                (">100x", ContactSales),
            ]),
            products: vec![
                ProductTier {
                    id: ProductTierId::Core,
                    name: "Core".to_string(),
                    base_price: 8600,
                    seats: SeatAllowance::new(3, "Power-User"),
                },
                ProductTier {
                    id: ProductTierId::Pro,
                    name: "Pro".to_string(),
                    base_price: 13200,
                    seats: SeatAllowance::new(5, "Power-User"),
                },
                ProductTier {
                    id: ProductTierId::Excellence,
                    name: "Excellence".to_string(),
                    base_price: 20600,
                    seats: SeatAllowance::new(10, "Power-User"),
                },
            ],
            validation: ValidationConfig::default(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, PricingError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, PricingError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load `path`, or the reference table if no file exists there.
    pub fn load_or_reference(path: &Path) -> Result<Self, PricingError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!(path = %path.display(), "no pricing table found, using reference table");
            Ok(Self::reference())
        }
    }

    pub fn axis(&self, kind: AxisKind) -> &Axis {
        match kind {
            AxisKind::DataAmount => &self.data_amount,
            AxisKind::Perspectives => &self.perspectives,
        }
    }

    pub fn product(&self, id: ProductTierId) -> Option<&ProductTier> {
        self.products.iter().find(|p| p.id == id)
    }
}

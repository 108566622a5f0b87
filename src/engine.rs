//! Pricing Engine - Single Entry Point
//!
//! A table is validated once, when the engine is built. There is no way to
//! obtain an engine over an unvalidated table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hashing::{compute_selection_hash, compute_table_hash};
use crate::seats::DEFAULT_SEAT_COUNT;
use crate::tiers::{AxisKind, PricingConfig, ProductTierId, ScalingFactor};
use crate::validation::{FailureMode, ValidationResult, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Invalid selection: index {index} out of range for axis {axis} ({len} tiers)")]
    InvalidSelection {
        axis: AxisKind,
        index: usize,
        len: usize,
    },

    #[error("No base price defined for plan {0}")]
    MissingBasePrice(ProductTierId),

    #[error("Plan {tier} prices to {value}, not a positive whole amount")]
    UnpriceableAmount { tier: ProductTierId, value: f64 },

    #[error("Invalid pricing table: {0}")]
    InvalidTable(String),

    #[error("Pricing table {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Price of one plan: a whole-unit annual amount, or a referral to sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTierPrice", into = "RawTierPrice")]
pub enum TierPrice {
    Amount(u64),
    ContactSales,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTierPrice {
    Amount(u64),
    Marker(ContactSalesTag),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ContactSalesTag {
    ContactSales,
}

impl From<RawTierPrice> for TierPrice {
    fn from(raw: RawTierPrice) -> Self {
        match raw {
            RawTierPrice::Amount(n) => Self::Amount(n),
            RawTierPrice::Marker(ContactSalesTag::ContactSales) => Self::ContactSales,
        }
    }
}

impl From<TierPrice> for RawTierPrice {
    fn from(price: TierPrice) -> Self {
        match price {
            TierPrice::Amount(n) => Self::Amount(n),
            TierPrice::ContactSales => Self::Marker(ContactSalesTag::ContactSales),
        }
    }
}

impl TierPrice {
    pub fn amount(&self) -> Option<u64> {
        match self {
            Self::Amount(n) => Some(*n),
            Self::ContactSales => None,
        }
    }

    pub fn is_contact_sales(&self) -> bool {
        matches!(self, Self::ContactSales)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub core: TierPrice,
    pub pro: TierPrice,
    pub excellence: TierPrice,
}

impl PricingResult {
    fn contact_sales() -> Self {
        Self {
            core: TierPrice::ContactSales,
            pro: TierPrice::ContactSales,
            excellence: TierPrice::ContactSales,
        }
    }

    pub fn get(&self, tier: ProductTierId) -> TierPrice {
        match tier {
            ProductTierId::Core => self.core,
            ProductTierId::Pro => self.pro,
            ProductTierId::Excellence => self.excellence,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProductTierId, TierPrice)> + '_ {
        ProductTierId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }

    pub fn is_contact_sales(&self) -> bool {
        self.iter().all(|(_, price)| price.is_contact_sales())
    }
}

/// Annual price spread over twelve months and the plan's seats.
/// A seat count of zero is read as one seat.
pub fn per_seat_monthly(tier_price: TierPrice, seat_count: u32) -> TierPrice {
    match tier_price {
        TierPrice::ContactSales => TierPrice::ContactSales,
        TierPrice::Amount(annual) => {
            let seats = seat_count.max(DEFAULT_SEAT_COUNT) as f64;
            TierPrice::Amount((annual as f64 / 12.0 / seats).round() as u64)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedTier {
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatBreakdown {
    pub tier: ProductTierId,
    pub seats: u32,
    pub seat_label: String,
    pub per_seat_monthly: TierPrice,
}

/// Server-side quote: prices plus everything needed to reproduce them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingQuote {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub config_version: String,
    pub table_hash: String,
    pub selection_hash: String,
    pub currency: String,
    pub data_amount: SelectedTier,
    pub perspectives: SelectedTier,
    pub prices: PricingResult,
    pub per_seat: Vec<SeatBreakdown>,
}

pub struct PricingEngine {
    config: PricingConfig,
    validation: ValidationResult,
    table_hash: String,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Result<Self, PricingError> {
        check_engine_version(&config)?;

        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let validation = Validator::new().validate(&config);
        if !validation.valid {
            return Err(PricingError::InvalidTable(validation.summary()));
        }
        for v in &validation.violations {
            match config.validation.failure_mode {
                FailureMode::Log => info!(rule = %v.rule, severity = ?v.severity, "{}", v.message),
                FailureMode::Block | FailureMode::Warn => {
                    warn!(rule = %v.rule, severity = ?v.severity, "{}", v.message)
                }
            }
        }

        let table_hash = compute_table_hash(&config)?;
        info!(
            config_version = %config.config_version,
            table_hash = %table_hash,
            "pricing engine ready"
        );

        Ok(Self { config, validation, table_hash })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn table_hash(&self) -> &str {
        &self.table_hash
    }

    /// Price all three plans for one pair of axis selections.
    ///
    /// Contact-sales on either axis applies to every plan; there is no
    /// partial pricing.
    pub fn compute_pricing(
        &self,
        data_amount: usize,
        perspectives: usize,
    ) -> Result<PricingResult, PricingError> {
        let factor_a = self.config.data_amount.factor_at(data_amount)?;
        let factor_b = self.config.perspectives.factor_at(perspectives)?;

        let (a, b) = match (factor_a, factor_b) {
            (ScalingFactor::Numeric(a), ScalingFactor::Numeric(b)) => (a, b),
            _ => {
                debug!(data_amount, perspectives, "selection requires sales contact");
                return Ok(PricingResult::contact_sales());
            }
        };

        let price = |tier: ProductTierId| -> Result<TierPrice, PricingError> {
            let base = self
                .config
                .product(tier)
                .ok_or(PricingError::MissingBasePrice(tier))?
                .base_price;
            let value = (base as f64 * a * b).round();
            if !value.is_finite() || value < 1.0 || value > u64::MAX as f64 {
                return Err(PricingError::UnpriceableAmount { tier, value });
            }
            Ok(TierPrice::Amount(value as u64))
        };

        let result = PricingResult {
            core: price(ProductTierId::Core)?,
            pro: price(ProductTierId::Pro)?,
            excellence: price(ProductTierId::Excellence)?,
        };
        debug!(data_amount, perspectives, ?result, "computed pricing");
        Ok(result)
    }

    /// Per-seat monthly price for one plan, using its configured seat count.
    pub fn per_seat_monthly(&self, prices: &PricingResult, tier: ProductTierId) -> TierPrice {
        let seats = self
            .config
            .product(tier)
            .map(|p| p.seats.count)
            .unwrap_or(DEFAULT_SEAT_COUNT);
        per_seat_monthly(prices.get(tier), seats)
    }

    pub fn quote(&self, data_amount: usize, perspectives: usize) -> Result<PricingQuote, PricingError> {
        let prices = self.compute_pricing(data_amount, perspectives)?;
        let selected = |kind: AxisKind, index: usize| -> Result<SelectedTier, PricingError> {
            let tier = self.config.axis(kind).tier_at(index)?;
            Ok(SelectedTier { index, label: tier.label.clone() })
        };

        let per_seat = self
            .config
            .products
            .iter()
            .map(|p| SeatBreakdown {
                tier: p.id,
                seats: p.seats.count,
                seat_label: p.seats.label.clone(),
                per_seat_monthly: per_seat_monthly(prices.get(p.id), p.seats.count),
            })
            .collect();

        Ok(PricingQuote {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            config_version: self.config.config_version.clone(),
            table_hash: self.table_hash.clone(),
            selection_hash: compute_selection_hash(
                &self.table_hash,
                data_amount,
                perspectives,
                ENGINE_VERSION,
            ),
            currency: self.config.currency.clone(),
            data_amount: selected(AxisKind::DataAmount, data_amount)?,
            perspectives: selected(AxisKind::Perspectives, perspectives)?,
            prices,
            per_seat,
        })
    }
}

fn check_engine_version(config: &PricingConfig) -> Result<(), PricingError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| PricingError::Config("Invalid engine version".into()))?;
    let min_ver = semver::Version::parse(&config.engine_min_version)
        .map_err(|_| PricingError::Config("Invalid table engineMinVersion".into()))?;

    if engine_ver < min_ver {
        return Err(PricingError::EngineVersionMismatch(
            config.config_version.clone(),
            config.engine_min_version.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PricingEngine {
        PricingEngine::new(PricingConfig::reference()).unwrap()
    }

    #[test]
    fn test_per_seat_monthly() {
        assert_eq!(per_seat_monthly(TierPrice::Amount(19264), 3), TierPrice::Amount(535));
        assert_eq!(per_seat_monthly(TierPrice::Amount(1200), 0), TierPrice::Amount(100));
        assert_eq!(per_seat_monthly(TierPrice::ContactSales, 3), TierPrice::ContactSales);
    }

    #[test]
    fn test_tier_price_serde() {
        let result = engine().compute_pricing(0, 4).unwrap();
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["core"], "contact_sales");

        let result = engine().compute_pricing(0, 0).unwrap();
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["core"], 19264);

        let back: PricingResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_future_table_rejected() {
        let mut config = PricingConfig::reference();
        config.engine_min_version = "99.0.0".to_string();
        let err = PricingEngine::new(config).err().unwrap();
        assert!(matches!(err, PricingError::EngineVersionMismatch(..)));
    }

    #[test]
    fn test_bad_version_string() {
        let mut config = PricingConfig::reference();
        config.engine_min_version = "latest".to_string();
        assert!(matches!(PricingEngine::new(config), Err(PricingError::Config(_))));
    }

    #[test]
    fn test_missing_plan_rejected_in_log_mode() {
        let mut config = PricingConfig::reference();
        config.validation.failure_mode = FailureMode::Log;
        config.products.retain(|p| p.id != ProductTierId::Excellence);
        assert!(matches!(PricingEngine::new(config), Err(PricingError::InvalidTable(_))));
    }

    #[test]
    fn test_tiny_factor_is_unpriceable_not_zero() {
        let mut config = PricingConfig::reference();
        config.data_amount.tiers[0].factor = ScalingFactor::Numeric(1e-9);
        let engine = PricingEngine::new(config).unwrap();

        let err = engine.compute_pricing(0, 0).unwrap_err();
        assert!(matches!(
            err,
            PricingError::UnpriceableAmount { tier: ProductTierId::Core, .. }
        ));
        assert!(engine.compute_pricing(1, 0).is_ok());
    }

    #[test]
    fn test_warnings_kept_on_engine() {
        let mut config = PricingConfig::reference();
        config.perspectives.tiers[2].factor = ScalingFactor::Numeric(1.0);
        let engine = PricingEngine::new(config.clone()).unwrap();
        assert!(engine.validation().valid);
        assert_eq!(engine.validation().violations.len(), 1);
        assert_eq!(engine.validation().violations[0].rule, "monotonic_factor");

        config.validation.failure_mode = FailureMode::Block;
        assert!(matches!(PricingEngine::new(config), Err(PricingError::InvalidTable(_))));
    }

    #[test]
    fn test_quote_envelope() {
        let engine = engine();
        let quote = engine.quote(0, 0).unwrap();
        assert_eq!(quote.data_amount.label, "15 Mio.");
        assert_eq!(quote.perspectives.label, "8x");
        assert_eq!(quote.table_hash, engine.table_hash());
        assert_eq!(quote.per_seat.len(), 3);
        assert_eq!(quote.per_seat[0].per_seat_monthly, TierPrice::Amount(535));

        let again = engine.quote(0, 0).unwrap();
        assert_ne!(quote.id, again.id);
        assert_eq!(quote.selection_hash, again.selection_hash);
        assert_eq!(quote.prices, again.prices);
    }

    #[test]
    fn test_quote_rejects_invalid_selection() {
        assert!(matches!(
            engine().quote(0, 9),
            Err(PricingError::InvalidSelection { axis: AxisKind::Perspectives, .. })
        ));
    }
}

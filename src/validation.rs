//! Table Validation - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Errors always reject a table; its failure mode decides what warnings do.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tiers::{Axis, PricingConfig, ProductTierId, ScalingFactor};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default)]
    pub failure_mode: FailureMode,
}

/// What a table's Warning-severity violations do. Error-severity
/// violations reject the table in every mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Warnings reject the table too.
    Block,
    /// Warnings are logged at `warn`.
    #[default]
    Warn,
    /// Warnings are logged at `info`.
    Log,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<TableViolation>,
    pub config_version: String,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, config: &PricingConfig) -> Vec<TableViolation>;
}

fn violation(
    rule: &dyn ValidationRule,
    severity: ViolationSeverity,
    message: String,
    expected: Option<String>,
    actual: Option<String>,
) -> TableViolation {
    TableViolation {
        rule: rule.name().to_string(),
        severity,
        message,
        expected,
        actual,
    }
}

fn axes(config: &PricingConfig) -> [&Axis; 2] {
    [&config.data_amount, &config.perspectives]
}

// --- Concrete Rules ---

pub struct NonEmptyAxisRule;

impl ValidationRule for NonEmptyAxisRule {
    fn name(&self) -> &'static str { "non_empty_axis" }

    fn validate(&self, config: &PricingConfig) -> Vec<TableViolation> {
        axes(config)
            .into_iter()
            .filter(|axis| axis.is_empty())
            .map(|axis| violation(
                self,
                ViolationSeverity::Error,
                format!("Axis {} has no tiers", axis.id),
                Some("at least 1 tier".to_string()),
                Some("0 tiers".to_string()),
            ))
            .collect()
    }
}

pub struct PositiveFactorRule;

impl ValidationRule for PositiveFactorRule {
    fn name(&self) -> &'static str { "positive_factor" }

    fn validate(&self, config: &PricingConfig) -> Vec<TableViolation> {
        let mut violations = vec![];
        for axis in axes(config) {
            for (index, tier) in axis.tiers.iter().enumerate() {
                if let ScalingFactor::Numeric(f) = tier.factor {
                    if !f.is_finite() || f <= 0.0 {
                        violations.push(violation(
                            self,
                            ViolationSeverity::Error,
                            format!("Axis {} tier {} ({}) has a non-positive factor", axis.id, index, tier.label),
                            Some("finite factor > 0".to_string()),
                            Some(f.to_string()),
                        ));
                    }
                }
            }
        }
        violations
    }
}

/// Factors should not fall as the selection grows. Contact-sales ranks above
/// every numeric factor, so a price reappearing after it is also flagged.
pub struct MonotonicFactorRule;

impl ValidationRule for MonotonicFactorRule {
    fn name(&self) -> &'static str { "monotonic_factor" }

    fn validate(&self, config: &PricingConfig) -> Vec<TableViolation> {
        let mut violations = vec![];
        for axis in axes(config) {
            for (index, pair) in axis.tiers.windows(2).enumerate() {
                let decreasing = match (pair[0].factor, pair[1].factor) {
                    (ScalingFactor::Numeric(a), ScalingFactor::Numeric(b)) => b < a,
                    (ScalingFactor::ContactSales, ScalingFactor::Numeric(_)) => true,
                    (_, ScalingFactor::ContactSales) => false,
                };
                if decreasing {
                    violations.push(violation(
                        self,
                        ViolationSeverity::Warning,
                        format!("Axis {} factor decreases from tier {} to tier {}", axis.id, index, index + 1),
                        Some("non-decreasing factors".to_string()),
                        Some(format!("{:?} -> {:?}", pair[0].factor, pair[1].factor)),
                    ));
                }
            }
        }
        violations
    }
}

pub struct ProductTiersRule;

impl ValidationRule for ProductTiersRule {
    fn name(&self) -> &'static str { "product_tiers" }

    fn validate(&self, config: &PricingConfig) -> Vec<TableViolation> {
        let mut violations = vec![];
        let mut counts: HashMap<ProductTierId, usize> = HashMap::new();
        for product in &config.products {
            *counts.entry(product.id).or_default() += 1;
            if product.base_price == 0 {
                violations.push(violation(
                    self,
                    ViolationSeverity::Error,
                    format!("Plan {} has a zero base price", product.id),
                    Some("base price > 0".to_string()),
                    Some("0".to_string()),
                ));
            }
        }

        for id in ProductTierId::ALL {
            let count = counts.get(&id).copied().unwrap_or(0);
            if count != 1 {
                violations.push(violation(
                    self,
                    ViolationSeverity::Error,
                    format!("Plan {} must be defined exactly once", id),
                    Some("1 definition".to_string()),
                    Some(format!("{} definitions", count)),
                ));
            }
        }
        violations
    }
}

pub struct BasePriceOrderRule;

impl ValidationRule for BasePriceOrderRule {
    fn name(&self) -> &'static str { "base_price_order" }

    fn validate(&self, config: &PricingConfig) -> Vec<TableViolation> {
        let prices: Vec<_> = ProductTierId::ALL
            .iter()
            .filter_map(|id| config.product(*id).map(|p| (*id, p.base_price)))
            .collect();

        prices
            .windows(2)
            .filter(|pair| pair[1].1 < pair[0].1)
            .map(|pair| violation(
                self,
                ViolationSeverity::Warning,
                format!("Plan {} is cheaper than plan {}", pair[1].0, pair[0].0),
                Some(format!(">= {}", pair[0].1)),
                Some(pair[1].1.to_string()),
            ))
            .collect()
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(NonEmptyAxisRule),
                Box::new(PositiveFactorRule),
                Box::new(MonotonicFactorRule),
                Box::new(ProductTiersRule),
                Box::new(BasePriceOrderRule),
            ],
        }
    }

    pub fn validate(&self, config: &PricingConfig) -> ValidationResult {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(config))
            .collect();

        let has_errors = violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        let valid = match config.validation.failure_mode {
            FailureMode::Block => violations.is_empty(),
            FailureMode::Warn | FailureMode::Log => !has_errors,
        };

        ValidationResult {
            valid,
            violations,
            config_version: config.config_version.clone(),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_hit(result: &ValidationResult) -> Vec<&str> {
        result.violations.iter().map(|v| v.rule.as_str()).collect()
    }

    #[test]
    fn test_reference_table_is_clean() {
        let result = Validator::new().validate(&PricingConfig::reference());
        assert!(result.valid);
        assert!(result.violations.is_empty(), "{}", result.summary());
    }

    #[test]
    fn test_decreasing_factor_warns_only() {
        let mut config = PricingConfig::reference();
        config.perspectives.tiers[2].factor = ScalingFactor::Numeric(1.0);
        let result = Validator::new().validate(&config);
        assert!(result.valid);
        assert_eq!(rules_hit(&result), vec!["monotonic_factor"]);
        assert_eq!(result.violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_price_after_contact_sales_warns() {
        let mut config = PricingConfig::reference();
        config.data_amount.tiers[1].factor = ScalingFactor::ContactSales;
        let result = Validator::new().validate(&config);
        assert_eq!(rules_hit(&result), vec!["monotonic_factor"]);
    }

    #[test]
    fn test_negative_factor_blocks() {
        let mut config = PricingConfig::reference();
        config.data_amount.tiers[0].factor = ScalingFactor::Numeric(-1.0);
        let result = Validator::new().validate(&config);
        assert!(!result.valid);
        assert!(rules_hit(&result).contains(&"positive_factor"));
    }

    #[test]
    fn test_nan_factor_blocks() {
        let mut config = PricingConfig::reference();
        config.perspectives.tiers[0].factor = ScalingFactor::Numeric(f64::NAN);
        let result = Validator::new().validate(&config);
        assert!(!result.valid);
    }

    #[test]
    fn test_missing_and_duplicate_plans() {
        let mut config = PricingConfig::reference();
        config.products.retain(|p| p.id != ProductTierId::Pro);
        let dup = config.products[0].clone();
        config.products.push(dup);

        let result = Validator::new().validate(&config);
        assert!(!result.valid);
        let product_errors = result
            .violations
            .iter()
            .filter(|v| v.rule == "product_tiers")
            .count();
        assert_eq!(product_errors, 2);
    }

    #[test]
    fn test_empty_axis_blocks() {
        let mut config = PricingConfig::reference();
        config.data_amount.tiers.clear();
        let result = Validator::new().validate(&config);
        assert!(!result.valid);
        assert_eq!(rules_hit(&result), vec!["non_empty_axis"]);
    }

    #[test]
    fn test_errors_block_in_every_mode() {
        for mode in [FailureMode::Block, FailureMode::Warn, FailureMode::Log] {
            let mut config = PricingConfig::reference();
            config.products[0].base_price = 0;
            config.validation.failure_mode = mode;
            let result = Validator::new().validate(&config);
            assert!(!result.valid, "{:?}", mode);
            assert!(result.has_errors());
        }
    }

    #[test]
    fn test_block_mode_rejects_warnings() {
        let mut config = PricingConfig::reference();
        config.perspectives.tiers[2].factor = ScalingFactor::Numeric(1.0);
        config.validation.failure_mode = FailureMode::Block;
        let result = Validator::new().validate(&config);
        assert!(!result.valid);
        assert!(!result.has_errors());
    }

    #[test]
    fn test_base_price_order() {
        let mut config = PricingConfig::reference();
        config.products[2].base_price = 9000;
        let result = Validator::new().validate(&config);
        assert!(result.valid);
        assert_eq!(rules_hit(&result), vec!["base_price_order"]);
    }
}

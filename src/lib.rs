//! TierPrice Core - Plan Pricing Engine
//!
//! # Pricing Rules
//! 1. Price = base price x data-amount factor x perspectives factor, rounded to whole units
//! 2. Contact-sales on either axis applies to every plan
//! 3. Out-of-range selections are errors, never clamped
//! 4. Tables are validated once, when the engine is built
//! 5. Every quote names the table hash that priced it

pub mod tiers;
pub mod seats;
pub mod validation;
pub mod hashing;
pub mod format;
pub mod engine;

pub use tiers::{Axis, AxisKind, AxisTier, PricingConfig, ProductTier, ProductTierId, ScalingFactor};
pub use seats::{parse_seat_count, SeatAllowance};
pub use validation::{FailureMode, TableViolation, ValidationResult, ValidationRule, ViolationSeverity};
pub use hashing::{canonical_json, compute_selection_hash, compute_table_hash};
pub use format::{format_amount, format_tier_price, Locale};
pub use engine::{per_seat_monthly, PricingEngine, PricingError, PricingQuote, PricingResult, TierPrice};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_ENGINE_VERSION: &str = "1.0.0";

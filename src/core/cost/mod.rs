//! Cost calculation
//!
//! Pricing table, usage accumulation and conversion to integer cost units
//! (hundredths of a cent).

pub mod calculator;
pub mod types;
pub mod usage;

pub use calculator::{
    DEFAULT_SURCHARGE, FALLBACK_PRICING, PricingTable, builtin_pricing,
};
pub use types::{CostError, PricingEntry, UsageRecord};
pub use usage::{UsageMeter, token_field};

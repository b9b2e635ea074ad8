//! Pricing table and cost calculation
//!
//! Rates are USD per million tokens. Costs leave this module as integer
//! "cost units": hundredths of a cent, after the surcharge multiplier.

use super::types::{CostError, PricingEntry, UsageRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

static DATE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\d{8,}$").expect("Invalid date suffix regex"));
static ISO_DATE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\d{4}-\d{2}-\d{2}$").expect("Invalid ISO date suffix regex"));
static PREVIEW_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-preview$").expect("Invalid preview suffix regex"));

/// Surcharge applied on top of upstream list prices
pub const DEFAULT_SURCHARGE: f64 = 1.20;

/// Sonnet-tier rate for models missing from the table
pub const FALLBACK_PRICING: PricingEntry = PricingEntry::with_cache(3.0, 15.0, 3.75, 0.30);

/// Built-in list prices
pub fn builtin_pricing() -> HashMap<String, PricingEntry> {
    [
        // Anthropic
        ("claude-opus-4-6", PricingEntry::with_cache(5.0, 25.0, 6.25, 0.50)),
        ("claude-sonnet-4-6", PricingEntry::with_cache(3.0, 15.0, 3.75, 0.30)),
        ("claude-haiku-4-5", PricingEntry::with_cache(1.0, 5.0, 1.25, 0.10)),
        // Google
        ("gemini-2.5-flash-lite", PricingEntry::new(0.10, 0.40)),
        ("gemini-3-flash", PricingEntry::new(0.50, 3.0)),
        ("gemini-3.1-pro", PricingEntry::new(2.0, 12.0)),
        // OpenAI
        ("gpt-5.2", PricingEntry::new(1.75, 14.0)),
        ("gpt-5-mini", PricingEntry::new(0.25, 2.0)),
        ("gpt-5-nano", PricingEntry::new(0.05, 0.40)),
    ]
    .into_iter()
    .map(|(model, entry)| (model.to_string(), entry))
    .collect()
}

/// Static per-model rates plus fallback and surcharge
#[derive(Debug, Clone)]
pub struct PricingTable {
    entries: HashMap<String, PricingEntry>,
    fallback: PricingEntry,
    surcharge: f64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            entries: builtin_pricing(),
            fallback: FALLBACK_PRICING,
            surcharge: DEFAULT_SURCHARGE,
        }
    }
}

impl PricingTable {
    /// Built-in table with the given surcharge
    pub fn new(surcharge: f64) -> Result<Self, CostError> {
        if !surcharge.is_finite() || surcharge <= 0.0 {
            return Err(CostError::InvalidSurcharge(surcharge));
        }
        Ok(Self {
            surcharge,
            ..Self::default()
        })
    }

    /// Add or replace model rates
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = (String, PricingEntry)>,
    ) -> Result<Self, CostError> {
        for (model, entry) in overrides {
            entry.validate()?;
            self.entries.insert(model, entry);
        }
        Ok(self)
    }

    pub fn surcharge(&self) -> f64 {
        self.surcharge
    }

    /// Strip date and preview suffixes; `None` when the result is unknown
    pub fn resolve_key(&self, model: &str) -> Option<String> {
        let key = DATE_SUFFIX.replace(model, "");
        let key = ISO_DATE_SUFFIX.replace(&key, "");
        let key = PREVIEW_SUFFIX.replace(&key, "");
        self.entries
            .contains_key(key.as_ref())
            .then(|| key.into_owned())
    }

    /// Rates that apply to `model`
    pub fn rates_for(&self, model: &str) -> &PricingEntry {
        match self.resolve_key(model) {
            Some(key) => self.entries.get(&key).unwrap_or(&self.fallback),
            None => {
                debug!(model = %model, "No pricing entry, using fallback rate");
                &self.fallback
            }
        }
    }

    /// List-price USD before surcharge
    pub fn usd(&self, usage: &UsageRecord, model: &str) -> f64 {
        self.rates_for(model).usd(usage)
    }

    /// Billable cost in hundredths of a cent, surcharge included
    pub fn cost_units(&self, usage: &UsageRecord, model: &str) -> i64 {
        let usd = self.usd(usage, model);
        (usd * 100.0 * self.surcharge * 100.0).round() as i64
    }
}

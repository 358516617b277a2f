//! Pure integer arithmetic over microdollars (§4.5). No floats in the
//! result; the only floating point is the premium-tier fraction, applied
//! to an already-integral token count before conversion back to an
//! integer cost.

use std::collections::HashMap;

use polyroute_model::Usage;

/// Pricing for one model. Tiered pricing applies `premium_fraction` as an
/// extra multiplier to input/output tokens beyond `tier_threshold_tokens`
/// (the "1M-context" tier in frontier model price sheets).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_micro_per_token: i64,
    pub output_micro_per_token: i64,
    pub tier_threshold_tokens: Option<u64>,
    pub premium_fraction: Option<f64>,
}

impl ModelPrice {
    pub const fn flat(input_micro_per_token: i64, output_micro_per_token: i64) -> Self {
        Self {
            input_micro_per_token,
            output_micro_per_token,
            tier_threshold_tokens: None,
            premium_fraction: None,
        }
    }

    /// Cache read price: 10% of input price (§4.5).
    pub fn cache_read_micro_per_token(&self) -> i64 {
        self.input_micro_per_token / 10
    }

    /// 5-minute cache write price: 125% of input price (§4.5).
    pub fn cache_5m_write_micro_per_token(&self) -> i64 {
        self.input_micro_per_token * 125 / 100
    }

    /// 1-hour cache write price: 200% of input price (§4.5).
    pub fn cache_1h_write_micro_per_token(&self) -> i64 {
        self.input_micro_per_token * 200 / 100
    }

    fn tiered_cost(&self, tokens: u64, base_micro_per_token: i64) -> i64 {
        let Some(threshold) = self.tier_threshold_tokens else {
            return tokens as i64 * base_micro_per_token;
        };
        let Some(premium) = self.premium_fraction else {
            return tokens as i64 * base_micro_per_token;
        };
        let base_tokens = tokens.min(threshold);
        let premium_tokens = tokens.saturating_sub(threshold);
        let base_cost = base_tokens as i64 * base_micro_per_token;
        let premium_rate = (base_micro_per_token as f64 * (1.0 + premium)).round() as i64;
        base_cost + premium_tokens as i64 * premium_rate
    }
}

#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: HashMap<String, ModelPrice>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<String>, price: ModelPrice) {
        self.prices.insert(model.into(), price);
    }

    pub fn get(&self, model: &str) -> Option<&ModelPrice> {
        self.prices.get(model)
    }

    /// Computes cost in microdollars. An unknown model returns `0` and logs
    /// one warning (§4.5) rather than failing the request.
    pub fn calculate(&self, model: &str, usage: &Usage) -> i64 {
        let Some(price) = self.prices.get(model) else {
            tracing::warn!(model, "no price entry for model, costing as zero");
            return 0;
        };
        let input_cost = price.tiered_cost(usage.input_tokens, price.input_micro_per_token);
        let output_cost = price.tiered_cost(usage.output_tokens, price.output_micro_per_token);
        let cache_read_cost = usage.cache_read_tokens as i64 * price.cache_read_micro_per_token();
        let cache_5m_cost =
            usage.cache_5m_creation_tokens as i64 * price.cache_5m_write_micro_per_token();
        let cache_1h_cost =
            usage.cache_1h_creation_tokens as i64 * price.cache_1h_write_micro_per_token();
        input_cost + output_cost + cache_read_cost + cache_5m_cost + cache_1h_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_pricing_without_tiering() {
        let mut table = PriceTable::new();
        table.insert("gpt-flat", ModelPrice::flat(10, 30));
        let usage = Usage {
            input_tokens: 100,
            ..Default::default()
        };
        assert_eq!(table.calculate("gpt-flat", &usage), 1_000);
    }

    #[test]
    fn unknown_model_costs_zero() {
        let table = PriceTable::new();
        assert_eq!(table.calculate("mystery", &Usage::default()), 0);
    }

    #[test]
    fn cache_prices_are_derived_from_input_price() {
        let mut table = PriceTable::new();
        table.insert("claude-x", ModelPrice::flat(100, 500));
        let usage = Usage {
            cache_read_tokens: 10,
            cache_5m_creation_tokens: 10,
            cache_1h_creation_tokens: 10,
            ..Default::default()
        };
        // reads at 10% (10/token), 5m writes at 125% (125/token), 1h at 200% (200/token)
        assert_eq!(table.calculate("claude-x", &usage), 10 * 10 + 10 * 125 + 10 * 200);
    }

    #[test]
    fn tiered_pricing_applies_premium_beyond_threshold() {
        let mut table = PriceTable::new();
        table.insert(
            "big-context",
            ModelPrice {
                input_micro_per_token: 10,
                output_micro_per_token: 0,
                tier_threshold_tokens: Some(1_000_000),
                premium_fraction: Some(1.0),
            },
        );
        let usage = Usage {
            input_tokens: 1_000_100,
            ..Default::default()
        };
        let expected = 1_000_000 * 10 + 100 * 20;
        assert_eq!(table.calculate("big-context", &usage), expected);
    }
}

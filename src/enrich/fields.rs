//! Display labels and formats for known fact fields

use serde_json::Value;

use crate::template::variables::title_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactFormat {
    Currency,
    Percent,
    Integer,
    Years,
    Text,
    /// Intermediate values that never appear in rendered output
    Internal,
}

/// (field, label, format)
const FIELDS: &[(&str, &str, FactFormat)] = &[
    ("nightly_rate", "Average nightly rate", FactFormat::Currency),
    ("average_cost", "Average cost", FactFormat::Currency),
    ("occupancy_rate", "Occupancy rate", FactFormat::Percent),
    ("property_price", "Typical property price", FactFormat::Currency),
    ("monthly_revenue", "Estimated monthly revenue", FactFormat::Currency),
    ("annual_revenue", "Estimated annual revenue", FactFormat::Currency),
    ("annual_expenses", "Estimated annual expenses", FactFormat::Currency),
    ("net_operating_income", "Net operating income", FactFormat::Currency),
    ("roi_percent", "Return on investment", FactFormat::Percent),
    ("payback_years", "Payback period", FactFormat::Years),
    ("growth_rate", "Annual market growth", FactFormat::Percent),
    ("regulation", "Regulations", FactFormat::Text),
    ("peak_season", "Peak season", FactFormat::Text),
    ("guest_capacity", "Typical guest capacity", FactFormat::Integer),
    ("cost_low", "Low-end cost", FactFormat::Currency),
    ("cost_high", "High-end cost", FactFormat::Currency),
    ("provider_count", "Estimated local providers", FactFormat::Integer),
    ("demand_index", "Demand index", FactFormat::Integer),
    ("typical_duration", "Typical job duration", FactFormat::Text),
    ("license_required", "License required", FactFormat::Text),
    ("affordability_percent", "Share of monthly median income", FactFormat::Percent),
    ("population", "Population", FactFormat::Integer),
    ("median_income", "Median household income", FactFormat::Currency),
    ("base_nightly_rate", "Base nightly rate", FactFormat::Internal),
    ("base_property_price", "Base property price", FactFormat::Internal),
    ("base_cost", "Base cost", FactFormat::Internal),
    ("rate_multiplier", "Rate multiplier", FactFormat::Internal),
    ("price_multiplier", "Price multiplier", FactFormat::Internal),
    ("cost_multiplier", "Cost multiplier", FactFormat::Internal),
    ("provider_density", "Provider density", FactFormat::Internal),
    ("regulation_level", "Regulation level", FactFormat::Internal),
];

pub fn format_of(field: &str) -> FactFormat {
    FIELDS
        .iter()
        .find(|(name, _, _)| *name == field)
        .map(|(_, _, format)| *format)
        .unwrap_or(FactFormat::Text)
}

/// Position in the display order; unknown fields sort last
pub fn field_rank(field: &str) -> usize {
    FIELDS
        .iter()
        .position(|(name, _, _)| *name == field)
        .unwrap_or(FIELDS.len())
}

pub fn label_of(field: &str) -> String {
    FIELDS
        .iter()
        .find(|(name, _, _)| *name == field)
        .map(|(_, label, _)| label.to_string())
        .unwrap_or_else(|| title_case(field))
}

/// Render a fact value for display
pub fn format_fact(field: &str, value: &Value) -> String {
    format_value(value, format_of(field))
}

pub fn format_value(value: &Value, format: FactFormat) -> String {
    match (value, format) {
        (Value::Number(n), FactFormat::Currency) => {
            format!("${}", group_thousands(n.as_f64().unwrap_or_default().round()))
        }
        (Value::Number(n), FactFormat::Percent) => {
            let v = n.as_f64().unwrap_or_default();
            if v.fract() == 0.0 {
                format!("{v:.0}%")
            } else {
                format!("{v:.1}%")
            }
        }
        (Value::Number(n), FactFormat::Integer) => {
            group_thousands(n.as_f64().unwrap_or_default().round())
        }
        (Value::Number(n), FactFormat::Years) => {
            format!("{:.1} years", n.as_f64().unwrap_or_default())
        }
        (Value::Number(n), _) => n.to_string(),
        (Value::String(s), _) => s.clone(),
        (Value::Bool(b), _) => (if *b { "yes" } else { "no" }).to_string(),
        (Value::Null, _) => String::new(),
        (other, _) => other.to_string(),
    }
}

/// 1234567.0 -> "1,234,567"
pub fn group_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_currency_and_percent() {
        assert_eq!(format_fact("monthly_revenue", &json!(4340.1)), "$4,340");
        assert_eq!(format_fact("occupancy_rate", &json!(68)), "68%");
        assert_eq!(format_fact("roi_percent", &json!(10.24)), "10.2%");
        assert_eq!(format_fact("payback_years", &json!(9.84)), "9.8 years");
    }

    #[test]
    fn test_unknown_fields_fall_back_to_text() {
        assert_eq!(format_of("whatever"), FactFormat::Text);
        assert_eq!(label_of("parking_spots"), "Parking Spots");
        assert_eq!(format_fact("whatever", &json!("x")), "x");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(-2500.0), "-2,500");
    }
}

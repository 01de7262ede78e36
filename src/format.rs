//! Display formatting for prices, magnitudes and percentages

const SUFFIXES: &[(f64, &str)] = &[(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Formats a USD amount with thousands separators and two decimals
///
/// `1234.5` → `"$1,234.50"`, `-3.0` → `"-$3.00"`. Non-finite input renders as
/// `"$0.00"`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, group_thousands(whole), frac)
}

/// Formats a price with precision that suits its magnitude
///
/// Sub-cent prices keep six decimals, sub-dollar prices four, the rest two.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return "$0.00".to_string();
    }
    if price < 0.01 {
        format!("${:.6}", price)
    } else if price < 1.0 {
        format!("${:.4}", price)
    } else {
        format!("${:.2}", price)
    }
}

/// Shortens large magnitudes with a K/M/B/T suffix
///
/// `1_500_000_000.0` → `"1.50B"`, `999.0` → `"999.00"`.
pub fn format_large_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    for (threshold, suffix) in SUFFIXES {
        if value >= *threshold {
            return format!("{:.2}{}", value / threshold, suffix);
        }
    }
    format!("{:.2}", value)
}

/// Signed percentage with two decimals; missing values render as `"0.00%"`
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v >= 0.0 { "+" } else { "" };
            format!("{}{:.2}%", sign, v)
        }
        _ => "0.00%".to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

//! Display formatting for record values.
//!
//! The assembler converts every field to its final display string here, so
//! renderers only ever see text.

use super::{Scalar, PLACEHOLDER};

/// Plain display value, or the placeholder.
pub fn text(value: Option<&Scalar>) -> String {
    match value {
        Some(v) if !v.is_blank() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Currency value with Indian digit grouping, e.g. `Rs. 80,00,000`.
///
/// Non-numeric strings pass through unchanged.
pub fn currency(value: Option<&Scalar>) -> String {
    match value {
        Some(v) if !v.is_blank() => match v.as_f64() {
            Some(amount) => format!("Rs. {}", group_indian(amount)),
            None => v.to_string(),
        },
        _ => PLACEHOLDER.to_string(),
    }
}

/// Numeric value followed by `unit`; non-numeric values pass through.
pub fn with_unit(value: Option<&Scalar>, unit: &str) -> String {
    match value {
        Some(v) if !v.is_blank() => match (v, v.as_f64()) {
            (Scalar::Number(_), Some(n)) => format!("{} {}", group_indian(n), unit),
            (Scalar::Text(s), Some(n)) if is_bare_number(s) => {
                format!("{} {}", group_indian(n), unit)
            }
            _ => v.to_string(),
        },
        _ => PLACEHOLDER.to_string(),
    }
}

/// Currency per unit, e.g. `Rs. 5,500 per sq. ft.`.
pub fn rate(value: Option<&Scalar>, unit: &str) -> String {
    match value {
        Some(v) if !v.is_blank() => match v.as_f64() {
            Some(amount) => format!("Rs. {} per {}", group_indian(amount), unit),
            None => v.to_string(),
        },
        _ => PLACEHOLDER.to_string(),
    }
}

fn is_bare_number(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

/// 2^53: beyond this an `f64` no longer holds every integer.
const MAX_EXACT_CENTS: f64 = 9_007_199_254_740_992.0;

/// Group digits the Indian way: last three, then pairs.
///
/// Fractions are shown with two decimals only when present. Values too large to hold exactly in paise are shown unformatted.
pub fn group_indian(amount: f64) -> String {
    let scaled = (amount.abs() * 100.0).round();
    if !scaled.is_finite() || scaled >= MAX_EXACT_CENTS {
        return amount.to_string();
    }
    let cents = scaled as u64;
    let negative = amount < 0.0 && cents != 0;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            parts.push(&head[start..end]);
            end = start;
        }
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let sign = if negative { "-" } else { "" };
    if frac == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, frac)
    }
}

/// `water_supply` → `Water Supply`.
pub fn humanize_key(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: u64) -> Scalar {
        Scalar::Number(v.into())
    }

    #[test]
    fn indian_grouping() {
        assert_eq!(group_indian(0.0), "0");
        assert_eq!(group_indian(999.0), "999");
        assert_eq!(group_indian(1000.0), "1,000");
        assert_eq!(group_indian(100000.0), "1,00,000");
        assert_eq!(group_indian(8000000.0), "80,00,000");
        assert_eq!(group_indian(123456789.0), "12,34,56,789");
        assert_eq!(group_indian(1500.5), "1,500.50");
        assert_eq!(group_indian(-25000.0), "-25,000");
    }

    #[test]
    fn huge_values_are_not_saturated() {
        assert_eq!(group_indian(1e18), "1000000000000000000");
        assert_eq!(group_indian(f64::INFINITY), "inf");
        assert_eq!(group_indian(1e13), "1,00,00,00,00,00,000");
    }

    #[test]
    fn rounding_to_zero_drops_the_sign() {
        assert_eq!(group_indian(-0.001), "0");
        assert_eq!(group_indian(-0.004), "0");
        assert_eq!(group_indian(-0.5), "-0.50");
    }

    #[test]
    fn currency_formats() {
        assert_eq!(currency(Some(&num(8_000_000))), "Rs. 80,00,000");
        assert_eq!(currency(Some(&Scalar::Text("6400000".into()))), "Rs. 64,00,000");
        assert_eq!(currency(Some(&Scalar::Text("On request".into()))), "On request");
        assert_eq!(currency(None), PLACEHOLDER);
        assert_eq!(currency(Some(&Scalar::Text(" ".into()))), PLACEHOLDER);
    }

    #[test]
    fn units_and_rates() {
        assert_eq!(with_unit(Some(&num(1200)), "sq. ft."), "1,200 sq. ft.");
        assert_eq!(with_unit(Some(&Scalar::Text("1200".into())), "sq. ft."), "1,200 sq. ft.");
        assert_eq!(
            with_unit(Some(&Scalar::Text("2 guntha".into())), "sq. ft."),
            "2 guntha"
        );
        assert_eq!(rate(Some(&num(5500)), "sq. ft."), "Rs. 5,500 per sq. ft.");
        assert_eq!(rate(None, "sq. ft."), PLACEHOLDER);
    }

    #[test]
    fn text_placeholder() {
        assert_eq!(text(None), "-");
        assert_eq!(text(Some(&Scalar::Bool(true))), "Yes");
    }

    #[test]
    fn humanize() {
        assert_eq!(humanize_key("water_supply"), "Water Supply");
        assert_eq!(humanize_key("nearest-bus stop"), "Nearest Bus Stop");
    }
}

//! Dish price rule: `stored = raw * (1 - discount)` when a discount is present, `raw` otherwise.

use super::error::DomainError;

pub fn parse_price(raw: &str) -> Result<f64, DomainError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| DomainError::validation(format!("price `{trimmed}` is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!(
            "price `{trimmed}` must be a non-negative finite number"
        )));
    }
    Ok(value)
}

/// Compute the price that gets persisted for a dish.
///
/// Without a discount the raw text is kept as supplied (trimmed). With a discount the
/// result is rendered in shortest round-trip form, so `10.00` at `0.1` becomes `9.0`.
pub fn stored_price(raw: &str, discount: Option<f64>) -> Result<String, DomainError> {
    let base = parse_price(raw)?;
    match discount {
        None => Ok(raw.trim().to_string()),
        Some(discount) => {
            if !(0.0..=1.0).contains(&discount) {
                return Err(DomainError::validation(format!(
                    "discount {discount} must lie within 0..=1"
                )));
            }
            Ok(format_price(base * (1.0 - discount)))
        }
    }
}

pub fn format_price(value: f64) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_is_applied_to_raw_price() {
        assert_eq!(stored_price("10.00", Some(0.1)).unwrap(), "9.0");
        assert_eq!(stored_price("20", Some(0.5)).unwrap(), "10.0");
    }

    #[test]
    fn missing_discount_keeps_raw_text() {
        assert_eq!(stored_price(" 10.00 ", None).unwrap(), "10.00");
    }

    #[test]
    fn zero_discount_normalizes_the_number() {
        assert_eq!(stored_price("10.00", Some(0.0)).unwrap(), "10.0");
    }

    #[test]
    fn rejects_garbage_and_out_of_range_values() {
        assert!(stored_price("ten", None).is_err());
        assert!(stored_price("-1", None).is_err());
        assert!(stored_price("10", Some(1.5)).is_err());
        assert!(stored_price("10", Some(-0.1)).is_err());
    }
}

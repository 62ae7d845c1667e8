//! Display helpers

/// 价格格式化：千位分隔 + "원"
///
/// `9000` → `"9,000원"`
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    if price < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('원');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "0원");
        assert_eq!(format_price(500), "500원");
        assert_eq!(format_price(9000), "9,000원");
        assert_eq!(format_price(12500), "12,500원");
        assert_eq!(format_price(1_234_567), "1,234,567원");
    }
}

use config::CurrencyFormat;

/// Formats `value` as `<code><NBSP><grouped integer><decimal separator><cents>`,
/// e.g. `AUD\u{a0}1.234.567,89`, the layout babel's `es_CO` locale gives.
pub fn format_currency(value: f64, format: &CurrencyFormat) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}{}\u{a0}{}{}{:02}",
        sign,
        format.code,
        group_thousands(cents / 100, &format.grouping_separator),
        format.decimal_separator,
        cents % 100
    )
}

fn group_thousands(n: u64, separator: &str) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_with_locale_separators() {
        let aud = CurrencyFormat::default();
        assert_eq!(format_currency(1_234_567.891, &aud), "AUD\u{a0}1.234.567,89");
        assert_eq!(format_currency(121_600.0, &aud), "AUD\u{a0}121.600,00");
        assert_eq!(format_currency(999.999, &aud), "AUD\u{a0}1.000,00");
        assert_eq!(format_currency(0.0, &aud), "AUD\u{a0}0,00");
        assert_eq!(format_currency(-5.5, &aud), "-AUD\u{a0}5,50");
    }

    #[test]
    fn code_and_amount_do_not_break_apart() {
        let formatted = format_currency(121_600.0, &CurrencyFormat::default());
        assert!(formatted.contains('\u{a0}'));
        assert!(!formatted.contains(' '));
    }

    #[test]
    fn honours_custom_format() {
        let usd = CurrencyFormat {
            code: "USD".to_string(),
            grouping_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        };
        assert_eq!(format_currency(1234.5, &usd), "USD\u{a0}1,234.50");
        assert_eq!(format_currency(12.0, &usd), "USD\u{a0}12.00");
    }
}

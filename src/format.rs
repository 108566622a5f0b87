//! Display Formatting
//!
//! Rendering rules shared by every surface that shows a price. Contact-sales
//! never renders as a number.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::TierPrice;

/// The site's two languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    fn group_separator(self) -> char {
        match self {
            Self::En => ',',
            Self::De => '.',
        }
    }

    pub fn contact_sales_label(self) -> &'static str {
        match self {
            Self::En => "Let's talk",
            Self::De => "Lass uns reden",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "de" => Ok(Self::De),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::De => write!(f, "de"),
        }
    }
}

/// Group thousands: 19264 -> "19,264" (en) / "19.264" (de).
pub fn format_amount(amount: u64, locale: Locale) -> String {
    let digits = amount.to_string();
    let sep = locale.group_separator();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Currency symbol placement follows the locale: "€19,264" / "19.264 €".
pub fn format_tier_price(price: &TierPrice, currency: &str, locale: Locale) -> String {
    match price {
        TierPrice::ContactSales => locale.contact_sales_label().to_string(),
        TierPrice::Amount(amount) => {
            let symbol = currency_symbol(currency);
            let number = format_amount(*amount, locale);
            match locale {
                Locale::En => format!("{}{}", symbol, number),
                Locale::De => format!("{} {}", number, symbol),
            }
        }
    }
}

fn currency_symbol(code: &str) -> &str {
    match code {
        "EUR" => "€",
        "USD" => "$",
        "GBP" => "£",
        "CHF" => "CHF",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(format_amount(0, Locale::En), "0");
        assert_eq!(format_amount(535, Locale::En), "535");
        assert_eq!(format_amount(19264, Locale::En), "19,264");
        assert_eq!(format_amount(19264, Locale::De), "19.264");
        assert_eq!(format_amount(1234567, Locale::De), "1.234.567");
        assert_eq!(format_amount(100000, Locale::En), "100,000");
    }

    #[test]
    fn test_tier_price_rendering() {
        let price = TierPrice::Amount(46144);
        assert_eq!(format_tier_price(&price, "EUR", Locale::En), "€46,144");
        assert_eq!(format_tier_price(&price, "EUR", Locale::De), "46.144 €");
        assert_eq!(format_tier_price(&price, "SEK", Locale::En), "SEK46,144");
    }

    #[test]
    fn test_contact_sales_is_not_a_number() {
        let rendered = format_tier_price(&TierPrice::ContactSales, "EUR", Locale::De);
        assert_eq!(rendered, "Lass uns reden");
        assert!(!rendered.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("DE".parse::<Locale>().unwrap(), Locale::De);
        assert!("fr".parse::<Locale>().is_err());
    }
}

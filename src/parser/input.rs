use crate::amount::Amount;
use crate::database::models::{BudgetLimits, Category, Month};
use crate::error::{LedgerError, Result};
use crate::parser::regex::RegexPatterns;
use log::debug;

/// Turns text typed by the user into typed values.
#[derive(Clone, Debug)]
pub struct InputParser {
    patterns: &'static RegexPatterns,
}

impl InputParser {
    pub fn new() -> Self {
        Self {
            patterns: RegexPatterns::get_instance(),
        }
    }

    /// Parse an amount such as `150`, `1,250.50` or `৳ 30.5`.
    ///
    /// Only the numeric form is checked here; positivity and rounding are
    /// enforced by [`Amount::from_input`].
    pub fn parse_amount(&self, text: &str) -> Result<f64> {
        let digits = self
            .patterns
            .amount_regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| LedgerError::invalid_amount(format!("'{}' is not a number", text.trim())))?
            .as_str()
            .replace(',', "");

        let value = digits
            .parse::<f64>()
            .map_err(|_| LedgerError::invalid_amount(format!("'{}' is not a number", text.trim())))?;
        debug!("Parsed amount {value} from '{text}'");
        Ok(value)
    }

    /// Parse `category=limit` pairs; categories not mentioned keep a zero limit.
    pub fn parse_budget_limits<'a>(
        &self,
        pairs: impl IntoIterator<Item = &'a str>,
    ) -> Result<BudgetLimits> {
        let mut limits = BudgetLimits::default();
        let mut seen = 0;

        for pair in pairs {
            let caps = self.patterns.budget_pair_regex.captures(pair.trim()).ok_or_else(|| {
                LedgerError::invalid_input(format!(
                    "'{pair}' is not a budget entry like canteen=500"
                ))
            })?;

            let category: Category = caps[1].parse()?;
            let value: f64 = caps[2]
                .parse()
                .map_err(|_| LedgerError::invalid_amount(format!("'{}' is not a number", &caps[2])))?;
            let limit = if value == 0.0 {
                Amount::ZERO
            } else {
                Amount::from_input(value)?
            };

            limits.set(category, limit);
            seen += 1;
        }

        if seen == 0 {
            return Err(LedgerError::invalid_input(
                "no budget entries given, e.g. canteen=500 lab=200",
            ));
        }
        Ok(limits)
    }

    pub fn parse_month(&self, text: &str) -> Result<Month> {
        text.parse()
    }

    pub fn is_pin_format(&self, pin: &str) -> bool {
        self.patterns.pin_regex.is_match(pin.trim())
    }
}

impl Default for InputParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_formatted_amounts() {
        let parser = InputParser::new();
        assert_eq!(parser.parse_amount("150").unwrap(), 150.0);
        assert_eq!(parser.parse_amount(" 30.50 ").unwrap(), 30.5);
        assert_eq!(parser.parse_amount("1,250.75").unwrap(), 1250.75);
        assert_eq!(parser.parse_amount("৳500").unwrap(), 500.0);
        assert_eq!(parser.parse_amount("Tk 12.345").unwrap(), 12.345);
        assert_eq!(parser.parse_amount(".5").unwrap(), 0.5);
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let parser = InputParser::new();
        for text in ["", "abc", "12a", "-5", "1,25", "NaN", "inf", "1.2.3"] {
            assert!(
                matches!(parser.parse_amount(text), Err(LedgerError::InvalidAmount { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn parses_budget_pairs() {
        let parser = InputParser::new();
        let limits = parser
            .parse_budget_limits(["canteen=500", "Lab=120.5", "other=0"])
            .unwrap();
        assert_eq!(limits.canteen, Amount::from_cents(50_000));
        assert_eq!(limits.lab, Amount::from_cents(12_050));
        assert_eq!(limits.library, Amount::ZERO);
        assert_eq!(limits.other, Amount::ZERO);
    }

    #[test]
    fn rejects_bad_budget_pairs() {
        let parser = InputParser::new();
        assert!(parser.parse_budget_limits(["topup=100"]).is_err());
        assert!(parser.parse_budget_limits(["canteen=-1"]).is_err());
        assert!(parser.parse_budget_limits(["canteen"]).is_err());
        assert!(parser.parse_budget_limits(Vec::<&str>::new()).is_err());
    }

    #[test]
    fn pin_format() {
        let parser = InputParser::new();
        assert!(parser.is_pin_format("12345"));
        assert!(parser.is_pin_format(" 12345 "));
        assert!(!parser.is_pin_format("1234"));
        assert!(!parser.is_pin_format("12a45"));
    }

    #[test]
    fn month_keys() {
        let parser = InputParser::new();
        let month = parser.parse_month("2024-09").unwrap();
        assert_eq!((month.year(), month.month()), (2024, 9));
        assert!(parser.parse_month("09/2024").is_err());
    }
}

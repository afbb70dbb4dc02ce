use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct RegexPatterns {
    pub amount_regex: Regex,
    pub budget_pair_regex: Regex,
    pub pin_regex: Regex,
    pub student_id_regex: Regex,
    pub contact_number_regex: Regex,
}

impl RegexPatterns {
    pub fn new() -> Self {
        Self {
            // Optional currency marker, digits with thousands separators, optional fraction: "৳1,250.50"
            amount_regex: Regex::new(
                r"(?i)^\s*(?:৳|tk\.?|bdt)?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?|\.\d+)\s*$",
            )
            .unwrap(),
            // canteen=500 lab=120.50
            budget_pair_regex: Regex::new(r"(?i)^(canteen|library|lab|club|other)=(\d+(?:\.\d+)?)$")
                .unwrap(),
            pin_regex: Regex::new(r"^\d{5}$").unwrap(),
            student_id_regex: Regex::new(r"^\d{9}$").unwrap(),
            contact_number_regex: Regex::new(r"^\d+$").unwrap(),
        }
    }

    pub fn get_instance() -> &'static Self {
        static INSTANCE: OnceLock<RegexPatterns> = OnceLock::new();
        INSTANCE.get_or_init(RegexPatterns::new)
    }
}

impl Default for RegexPatterns {
    fn default() -> Self {
        Self::new()
    }
}

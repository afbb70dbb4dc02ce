pub mod input;
pub mod regex;

pub use input::InputParser;
pub use regex::RegexPatterns;

pub mod budget;
pub mod summary;

pub use budget::BudgetCalculator;
pub use summary::SummaryCalculator;

pub mod budgets;
pub mod models;
pub mod notifications;
pub mod operations;
pub mod transactions;
pub mod wallets;

pub use operations::DatabaseOperations;

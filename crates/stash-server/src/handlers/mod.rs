//! API request handlers

mod auth;
mod budgets;
mod categories;
mod engagement;
mod goals;
mod reports;
mod rules;
mod savings_transactions;
mod transactions;

pub use auth::*;
pub use budgets::*;
pub use categories::*;
pub use engagement::*;
pub use goals::*;
pub use reports::*;
pub use rules::*;
pub use savings_transactions::*;
pub use transactions::*;

pub mod expense;
pub mod group;
pub mod money;
pub mod user;

pub use expense::{Expense, ExpenseSplit};
pub use group::{Group, GroupUser, Role};
pub use money::Money;
pub use user::User;

use uuid::Uuid;

use crate::error::DivvyError;
use crate::models::{Expense, Group, User};

/// Seam to the persistence collaborator. The engine itself never touches
/// storage; only the service layer loads and saves rows through this trait.
pub trait Storage {
    fn create_user(&mut self, user: User) -> Result<User, DivvyError>;
    fn get_user(&self, user_id: Uuid) -> Option<User>;
    fn find_user_by_email(&self, email: &str) -> Option<User>;

    fn create_group(&mut self, group: Group) -> Result<Group, DivvyError>;
    fn update_group(&mut self, group: Group) -> Result<Group, DivvyError>;
    fn get_group(&self, group_id: Uuid) -> Option<Group>;
    fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> bool;

    fn create_expense(&mut self, expense: Expense) -> Result<Expense, DivvyError>;
    fn update_expense(&mut self, expense: Expense) -> Result<Expense, DivvyError>;
    fn get_expense(&self, expense_id: Uuid) -> Option<Expense>;
    fn list_expenses(&self, group_id: Uuid) -> Vec<Expense>;
}

pub mod in_memory;

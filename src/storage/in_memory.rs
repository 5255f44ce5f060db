use crate::error::DivvyError;
use crate::models::{Expense, Group, User};
use crate::storage::Storage;
use std::collections::HashMap;
use uuid::Uuid;

/// HashMap-backed storage for tests and single-process use.
#[derive(Default)]
pub struct InMemoryStorage {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>, // email -> user_id
    groups: HashMap<Uuid, Group>,
    expenses: HashMap<Uuid, Expense>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn create_user(&mut self, user: User) -> Result<User, DivvyError> {
        if self.emails.contains_key(&user.email) {
            return Err(DivvyError::EmailAlreadyRegistered(user.email));
        }
        self.emails.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: Uuid) -> Option<User> {
        self.users.get(&user_id).cloned()
    }

    fn find_user_by_email(&self, email: &str) -> Option<User> {
        let user_id = self.emails.get(email)?;
        self.users.get(user_id).cloned()
    }

    fn create_group(&mut self, group: Group) -> Result<Group, DivvyError> {
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn update_group(&mut self, group: Group) -> Result<Group, DivvyError> {
        if !self.groups.contains_key(&group.id) {
            return Err(DivvyError::GroupNotFound(group.id));
        }
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    fn get_group(&self, group_id: Uuid) -> Option<Group> {
        self.groups.get(&group_id).cloned()
    }

    fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> bool {
        self.groups
            .get(&group_id)
            .is_some_and(|g| g.is_member(user_id))
    }

    fn create_expense(&mut self, expense: Expense) -> Result<Expense, DivvyError> {
        self.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    fn update_expense(&mut self, expense: Expense) -> Result<Expense, DivvyError> {
        if !self.expenses.contains_key(&expense.id) {
            return Err(DivvyError::ExpenseNotFound(expense.id));
        }
        self.expenses.insert(expense.id, expense.clone());
        Ok(expense)
    }

    fn get_expense(&self, expense_id: Uuid) -> Option<Expense> {
        self.expenses.get(&expense_id).cloned()
    }

    fn list_expenses(&self, group_id: Uuid) -> Vec<Expense> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| e.created_at);
        expenses
    }
}

use crate::config::CONFIG;
use crate::engine;
use crate::engine::ledger::Ledger;
use crate::engine::settle::Transfer;
use crate::engine::split::Split;
use crate::error::DivvyError;
use crate::models::{Expense, ExpenseSplit, Group, GroupUser, Money, Role, User};
use crate::storage::Storage;
use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub struct ExpenseService<'a> {
    pub storage: &'a mut dyn Storage,
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a mut dyn Storage) -> Self {
        info!("Initializing ExpenseService");
        Self { storage }
    }

    // USER MANAGEMENT

    pub fn create_user(&mut self, email: String, name: String) -> Result<User, DivvyError> {
        info!("Creating user with email: {}", email);
        if email.len() < 5 || !email.contains('@') || !email.contains('.') {
            warn!("Rejected malformed email: {}", email);
            return Err(DivvyError::InvalidEmail(email));
        }
        Self::validate_text("name", &name, 100)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name,
            created_at: now,
            updated_at: now,
        };

        let created = self.storage.create_user(user)?;
        debug!("User created with ID: {}", created.id);
        Ok(created)
    }

    // GROUP MANAGEMENT

    /// Create a group owned by `owner`. The owner is always a member,
    /// whether or not they appear in `member_ids`.
    pub fn create_group(
        &mut self,
        owner: &User,
        name: String,
        member_ids: &[Uuid],
    ) -> Result<Group, DivvyError> {
        info!("Creating group '{}' for owner ID: {}", name, owner.id);
        Self::validate_text("name", &name, 100)?;
        self.validate_users_exist(member_ids)?;
        if self.storage.get_user(owner.id).is_none() {
            return Err(DivvyError::UserNotFound(owner.id));
        }

        let now = Utc::now();
        let group_id = Uuid::new_v4();
        let mut members = vec![GroupUser {
            group_id,
            user_id: owner.id,
            role: Role::Owner,
            joined_at: now,
        }];
        for &user_id in member_ids {
            if user_id == owner.id || members.iter().any(|m| m.user_id == user_id) {
                continue;
            }
            members.push(GroupUser {
                group_id,
                user_id,
                role: Role::Member,
                joined_at: now,
            });
        }

        let group = Group {
            id: group_id,
            name,
            owner_id: owner.id,
            members,
            created_at: now,
            updated_at: now,
        };

        let created = self.storage.create_group(group)?;
        debug!("Group created with ID: {}", created.id);
        Ok(created)
    }

    pub fn add_member(
        &mut self,
        group_id: Uuid,
        user_id: Uuid,
        added_by: &User,
    ) -> Result<(), DivvyError> {
        info!("Adding user {} to group {}", user_id, group_id);
        let mut group = self.require_group(group_id)?;
        if group.owner_id != added_by.id {
            warn!(
                "User {} attempted to add a member to group {} without owner role",
                added_by.id, group_id
            );
            return Err(DivvyError::NotAuthorized);
        }
        if self.storage.get_user(user_id).is_none() {
            return Err(DivvyError::UserNotFound(user_id));
        }
        if group.is_member(user_id) {
            return Err(DivvyError::AlreadyGroupMember(user_id));
        }

        group.members.push(GroupUser {
            group_id,
            user_id,
            role: Role::Member,
            joined_at: Utc::now(),
        });
        group.updated_at = Utc::now();
        self.storage.update_group(group)?;
        debug!("User {} joined group {}", user_id, group_id);
        Ok(())
    }

    pub fn remove_member(
        &mut self,
        group_id: Uuid,
        user_id: Uuid,
        removed_by: &User,
    ) -> Result<(), DivvyError> {
        info!("Removing user {} from group {}", user_id, group_id);
        let mut group = self.require_group(group_id)?;
        if group.owner_id != removed_by.id {
            warn!(
                "User {} attempted to remove a member from group {} without owner role",
                removed_by.id, group_id
            );
            return Err(DivvyError::NotAuthorized);
        }
        if user_id == group.owner_id {
            warn!("Attempted to remove owner {} from group {}", user_id, group_id);
            return Err(DivvyError::NotAuthorized);
        }
        if !group.is_member(user_id) {
            return Err(DivvyError::NotGroupMember(user_id));
        }

        group.members.retain(|m| m.user_id != user_id);
        group.updated_at = Utc::now();
        self.storage.update_group(group)?;
        debug!("User {} removed from group {}", user_id, group_id);
        Ok(())
    }

    // EXPENSE MANAGEMENT

    /// Record a shared expense, dividing it among the group's members.
    ///
    /// `proposal` is an untrusted suggestion of shares, keyed by user id.
    /// Anything that is not an object of id -> non-negative number summing
    /// to the amount is discarded and the expense falls back to an equal
    /// split; a bad suggestion never fails the request.
    pub fn record_expense(
        &mut self,
        group_id: Uuid,
        description: String,
        amount: f64,
        paid_by: Uuid,
        excluded: &[Uuid],
        notes: Option<String>,
        proposal: Option<&Value>,
        added_by: &User,
    ) -> Result<Expense, DivvyError> {
        info!(
            "Recording expense in group {} by user {} for amount {}",
            group_id, added_by.id, amount
        );
        let group = self.require_group(group_id)?;
        if !group.is_member(added_by.id) {
            return Err(DivvyError::NotGroupMember(added_by.id));
        }
        if !group.is_member(paid_by) {
            warn!("Payer {} not in group {}", paid_by, group_id);
            return Err(DivvyError::NotGroupMember(paid_by));
        }

        Self::validate_text("description", &description, CONFIG.max_description_len)?;
        let amount = Self::validate_amount(amount)?;

        let parsed = match proposal {
            Some(value) => {
                let parsed = Self::parse_proposal(value);
                if parsed.is_none() {
                    warn!("Split proposal is not a map of user ids to numbers, ignoring it");
                }
                parsed
            }
            None => None,
        };

        let member_ids = group.member_ids();
        let split = engine::compute_split(amount, &member_ids, excluded, &paid_by, parsed.as_ref())?;

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            group_id,
            paid_by,
            description,
            notes,
            amount,
            splits: split
                .iter()
                .map(|(&user_id, amount_owed)| ExpenseSplit { user_id, amount_owed })
                .collect(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created = self.storage.create_expense(expense)?;
        debug!(
            "Expense created with ID: {} ({} splits)",
            created.id,
            created.splits.len()
        );
        Ok(created)
    }

    pub fn delete_expense(
        &mut self,
        expense_id: Uuid,
        deleted_by: &User,
    ) -> Result<Expense, DivvyError> {
        info!("Soft deleting expense {} by user {}", expense_id, deleted_by.id);
        let mut expense = self
            .storage
            .get_expense(expense_id)
            .ok_or(DivvyError::ExpenseNotFound(expense_id))?;
        if !self.storage.is_group_member(expense.group_id, deleted_by.id) {
            return Err(DivvyError::NotGroupMember(deleted_by.id));
        }
        if expense.is_deleted() {
            warn!("Expense {} already deleted", expense_id);
            return Err(DivvyError::AlreadyDeleted(expense_id));
        }

        let now = Utc::now();
        expense.deleted_at = Some(now);
        expense.updated_at = now;
        let saved = self.storage.update_expense(expense)?;
        debug!("Expense soft deleted: {}", saved.id);
        Ok(saved)
    }

    // BALANCES & SETTLEMENT

    /// Net balance per member across the group's effective expenses.
    pub fn group_balances(&self, group_id: Uuid) -> Result<Ledger<Uuid>, DivvyError> {
        debug!("Calculating balances for group {}", group_id);
        self.require_group(group_id)?;

        let mut ledger = Ledger::new();
        for expense in self
            .storage
            .list_expenses(group_id)
            .iter()
            .filter(|e| !e.is_deleted())
        {
            let shares: BTreeMap<Uuid, Money> = expense
                .splits
                .iter()
                .map(|s| (s.user_id, s.amount_owed))
                .collect();
            ledger = engine::fold_split(ledger, &Split::from_shares(shares), &expense.paid_by);
        }

        debug!("Balances calculated: {:?}", ledger);
        Ok(ledger)
    }

    /// Minimal transfer plan clearing the group's balances.
    pub fn settlement_plan(&self, group_id: Uuid) -> Result<Vec<Transfer<Uuid>>, DivvyError> {
        let ledger = self.group_balances(group_id)?;
        let transfers = engine::minimize(&ledger)?;
        info!(
            "Settlement plan for group {} has {} transfers",
            group_id,
            transfers.len()
        );
        Ok(transfers)
    }

    // VALIDATION HELPERS

    fn require_group(&self, group_id: Uuid) -> Result<Group, DivvyError> {
        self.storage
            .get_group(group_id)
            .ok_or(DivvyError::GroupNotFound(group_id))
    }

    fn validate_users_exist(&self, user_ids: &[Uuid]) -> Result<(), DivvyError> {
        for &user_id in user_ids {
            if self.storage.get_user(user_id).is_none() {
                return Err(DivvyError::UserNotFound(user_id));
            }
        }
        Ok(())
    }

    fn validate_text(field: &str, value: &str, max_length: usize) -> Result<(), DivvyError> {
        if value.trim().is_empty() {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                format!("{} cannot be empty", field),
            ));
        }
        if value.len() > max_length {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount(amount: f64) -> Result<Money, DivvyError> {
        let money = Money::try_from_decimal(amount).ok_or_else(|| {
            DivvyError::InvalidAmount(
                "amount must be a finite number with at most 2 decimal places".to_string(),
            )
        })?;
        if !money.is_positive() {
            return Err(DivvyError::InvalidAmount(
                "amount must be greater than 0".to_string(),
            ));
        }
        if amount > CONFIG.max_expense_amount {
            return Err(DivvyError::InvalidAmount(format!(
                "amount cannot exceed {}",
                CONFIG.max_expense_amount
            )));
        }
        Ok(money)
    }

    /// Structural check on an external split suggestion: an object whose
    /// keys parse as user ids and whose values are numbers. Domain checks
    /// (membership, coverage, sign, sum) happen in the engine.
    fn parse_proposal(value: &Value) -> Option<HashMap<Uuid, f64>> {
        let object = value.as_object()?;
        let mut proposal = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let user_id = Uuid::parse_str(key).ok()?;
            proposal.insert(user_id, value.as_f64()?);
        }
        Some(proposal)
    }
}

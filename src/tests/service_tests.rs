use crate::engine::settle::apply;
use crate::error::DivvyError;
use crate::models::{Money, User};
use crate::service::ExpenseService;
use crate::storage::in_memory::InMemoryStorage;
use crate::visualization::Visualization;
use serde_json::{Map, Value, json};

fn create_users(service: &mut ExpenseService<'_>, names: &[&str]) -> Vec<User> {
    names
        .iter()
        .map(|name| {
            service
                .create_user(format!("{}@example.com", name), name.to_string())
                .unwrap()
        })
        .collect()
}

fn proposal_of(entries: &[(&User, f64)]) -> Value {
    let mut object = Map::new();
    for (user, share) in entries {
        object.insert(user.id.to_string(), Value::from(*share));
    }
    Value::Object(object)
}

#[test]
fn test_record_expense_equal_split_and_settle() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["alice", "bob", "carol"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Trip".to_string(), &member_ids)
        .unwrap();

    service
        .record_expense(
            group.id,
            "Dinner".to_string(),
            50.0,
            users[0].id,
            &[],
            None,
            None,
            &users[0],
        )
        .unwrap();

    let balances = service.group_balances(group.id).unwrap();
    // The payer's own 16.66 share nets against the 50.00 credit.
    assert_eq!(balances[&users[0].id], Money::from_cents(3334));
    assert_eq!(balances[&users[1].id], Money::from_cents(-1667));
    assert_eq!(balances[&users[2].id], Money::from_cents(-1667));

    let plan = service.settlement_plan(group.id).unwrap();
    assert_eq!(plan.len(), 2);
    assert!(plan.iter().all(|t| t.to == users[0].id));

    let settled = apply(balances, &plan);
    assert!(settled.values().all(|balance| balance.is_zero()));
}

#[test]
fn test_valid_proposal_shapes_the_split() {
    let _ = env_logger::try_init();
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["dora", "eli"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Flat".to_string(), &member_ids)
        .unwrap();

    let proposal = proposal_of(&[(&users[0], 20.0), (&users[1], 30.0)]);
    let expense = service
        .record_expense(
            group.id,
            "Groceries".to_string(),
            50.0,
            users[0].id,
            &[],
            Some("dora was away half the week".to_string()),
            Some(&proposal),
            &users[0],
        )
        .unwrap();

    let dora_split = expense.splits.iter().find(|s| s.user_id == users[0].id).unwrap();
    assert_eq!(dora_split.amount_owed, Money::from_cents(2000));

    let plan = service.settlement_plan(group.id).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].from, users[1].id);
    assert_eq!(plan[0].to, users[0].id);
    assert_eq!(plan[0].amount, Money::from_cents(3000));
}

#[test]
fn test_malformed_proposal_degrades_to_equal_split() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["fay", "gus"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Lunch".to_string(), &member_ids)
        .unwrap();

    for proposal in [
        json!("half each"),
        json!([25.0, 25.0]),
        json!({ "not-a-uuid": 50.0 }),
        proposal_of(&[(&users[0], 50.0), (&users[1], -25.0)]),
    ] {
        let expense = service
            .record_expense(
                group.id,
                "Lunch".to_string(),
                50.0,
                users[0].id,
                &[],
                None,
                Some(&proposal),
                &users[0],
            )
            .unwrap();

        assert!(
            expense
                .splits
                .iter()
                .all(|s| s.amount_owed == Money::from_cents(2500))
        );
        service.delete_expense(expense.id, &users[0]).unwrap();
    }
}

#[test]
fn test_excluded_member_owes_nothing() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["hana", "ivo", "jo"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Drinks".to_string(), &member_ids)
        .unwrap();

    service
        .record_expense(
            group.id,
            "Round one".to_string(),
            30.0,
            users[0].id,
            &[users[2].id],
            None,
            None,
            &users[0],
        )
        .unwrap();

    let balances = service.group_balances(group.id).unwrap();
    assert!(!balances.contains_key(&users[2].id));
    assert_eq!(balances[&users[1].id], Money::from_cents(-1500));
}

#[test]
fn test_soft_deleted_expense_is_excluded_from_balances() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["kim", "lou"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Bills".to_string(), &member_ids)
        .unwrap();

    let kept = service
        .record_expense(group.id, "Rent".to_string(), 100.0, users[0].id, &[], None, None, &users[0])
        .unwrap();
    let dropped = service
        .record_expense(group.id, "Oops".to_string(), 40.0, users[1].id, &[], None, None, &users[1])
        .unwrap();

    service.delete_expense(dropped.id, &users[0]).unwrap();

    let balances = service.group_balances(group.id).unwrap();
    assert_eq!(balances[&users[0].id], Money::from_cents(5000));
    assert_eq!(balances[&users[1].id], Money::from_cents(-5000));

    let result = service.delete_expense(dropped.id, &users[0]);
    assert!(matches!(result, Err(DivvyError::AlreadyDeleted(_))));
    assert!(matches!(
        service.delete_expense(kept.id, &users[1]),
        Ok(_)
    ));
}

#[test]
fn test_amount_validation() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["mia", "ned"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Edge".to_string(), &member_ids)
        .unwrap();

    for amount in [10.123, 0.0, -5.0, f64::NAN, 2_000_000.0] {
        let result = service.record_expense(
            group.id,
            "Bad amount".to_string(),
            amount,
            users[0].id,
            &[],
            None,
            None,
            &users[0],
        );
        assert!(
            matches!(result, Err(DivvyError::InvalidAmount(_))),
            "amount {amount} should be rejected"
        );
    }
}

#[test]
fn test_payer_outside_group_is_rejected() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["oli", "pia", "quin"]);
    let group = service
        .create_group(&users[0], "Duo".to_string(), &[users[1].id])
        .unwrap();

    let result = service.record_expense(
        group.id,
        "Taxi".to_string(),
        12.0,
        users[2].id,
        &[],
        None,
        None,
        &users[0],
    );
    assert!(matches!(result, Err(DivvyError::NotGroupMember(id)) if id == users[2].id));
}

#[test]
fn test_create_group_always_includes_owner() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["rae", "sam"]);
    // Owner listed twice: once implicitly, once in member_ids.
    let group = service
        .create_group(&users[0], "Pair".to_string(), &[users[0].id, users[1].id])
        .unwrap();

    assert_eq!(group.members.len(), 2);
    assert!(group.is_member(users[0].id));
    assert_eq!(group.owner_id, users[0].id);
}

#[test]
fn test_membership_changes_are_owner_gated() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["tess", "uma", "vik"]);
    let group = service
        .create_group(&users[0], "Gate".to_string(), &[users[1].id])
        .unwrap();

    let result = service.add_member(group.id, users[2].id, &users[1]);
    assert!(matches!(result, Err(DivvyError::NotAuthorized)));

    service.add_member(group.id, users[2].id, &users[0]).unwrap();
    let result = service.add_member(group.id, users[2].id, &users[0]);
    assert!(matches!(result, Err(DivvyError::AlreadyGroupMember(_))));

    let result = service.remove_member(group.id, users[0].id, &users[0]);
    assert!(matches!(result, Err(DivvyError::NotAuthorized)));
    service.remove_member(group.id, users[2].id, &users[0]).unwrap();
    assert!(!service.storage.get_group(group.id).unwrap().is_member(users[2].id));
}

#[test]
fn test_duplicate_email_is_rejected() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    service
        .create_user("same@example.com".to_string(), "First".to_string())
        .unwrap();
    let result = service.create_user("same@example.com".to_string(), "Second".to_string());
    assert!(matches!(result, Err(DivvyError::EmailAlreadyRegistered(_))));

    let result = service.create_user("nope".to_string(), "Third".to_string());
    assert!(matches!(result, Err(DivvyError::InvalidEmail(_))));
}

#[test]
fn test_balance_chart_configuration() {
    let mut storage = InMemoryStorage::new();
    let mut service = ExpenseService::new(&mut storage);

    let users = create_users(&mut service, &["wes", "yara"]);
    let member_ids: Vec<_> = users.iter().map(|u| u.id).collect();
    let group = service
        .create_group(&users[0], "Chart".to_string(), &member_ids)
        .unwrap();
    service
        .record_expense(group.id, "Fuel".to_string(), 20.0, users[0].id, &[], None, None, &users[0])
        .unwrap();

    let ledger = service.group_balances(group.id).unwrap();
    let chart = Visualization::generate_balance_chart(&service, &ledger).unwrap();

    assert_eq!(chart["type"], "bar");
    let labels = chart["data"]["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 2);
    let data = chart["data"]["datasets"][0]["data"].as_array().unwrap();
    let total: f64 = data.iter().map(|v| v.as_f64().unwrap()).sum();
    assert!(total.abs() < 1e-9);
}

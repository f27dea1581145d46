use pretty_assertions::assert_eq;
use rega_alloc::{AllocError, NumberSequencer};
use rega_types::{Person, PersonDraft, Range, Role, RoleAssignment, User, UserId};

fn registrador(id: &str, start: i64, end: i64) -> User {
    let mut user = User::new(id);
    user.apply(&RoleAssignment::registrador(Range::new(start, end).unwrap()));
    user
}

fn person(doc: &str, number: i64, by: &str) -> Person {
    PersonDraft {
        numero_documento: doc.into(),
        nombres: "Rosa".into(),
        apellidos: "Díaz".into(),
        ..Default::default()
    }
    .into_person(number, UserId::new(by))
}

#[test]
fn fresh_registrador_starts_at_range_start() {
    let user = registrador("r", 1, 200);
    assert_eq!(NumberSequencer::next_number(&user, &[]).unwrap(), 1);
}

#[test]
fn scenario_register_five_then_deplete() {
    let user = registrador("r", 1, 200);
    let mut persons = Vec::new();
    for _ in 0..5 {
        let n = NumberSequencer::next_number(&user, &persons).unwrap();
        persons.push(person(&format!("doc-{n}"), n, "r"));
    }
    assert_eq!(NumberSequencer::next_number(&user, &persons).unwrap(), 6);

    while let Ok(n) = NumberSequencer::next_number(&user, &persons) {
        persons.push(person(&format!("doc-{n}"), n, "r"));
    }
    assert_eq!(persons.len(), 200);
    assert_eq!(persons.last().unwrap().numero_asignado, 200);
    assert!(matches!(
        NumberSequencer::next_number(&user, &persons),
        Err(AllocError::RangeDepleted { end: 200 })
    ));
}

#[test]
fn other_registradores_numbers_are_ignored() {
    let user = registrador("r", 101, 200);
    let persons = vec![person("a", 150, "someone-else"), person("b", 101, "r")];
    assert_eq!(NumberSequencer::next_number(&user, &persons).unwrap(), 102);
}

#[test]
fn numbers_from_previous_block_are_ignored() {
    let user = registrador("r", 301, 400);
    let persons = vec![person("old", 150, "r")];
    assert_eq!(NumberSequencer::next_number(&user, &persons).unwrap(), 301);
}

#[test]
fn gaps_are_not_refilled() {
    let user = registrador("r", 1, 10);
    let persons = vec![person("a", 1, "r"), person("b", 7, "r")];
    assert_eq!(NumberSequencer::next_number(&user, &persons).unwrap(), 8);
}

#[test]
fn cursor_is_used_when_nothing_stamped() {
    let mut user = registrador("r", 1, 100);
    user.current_number = Some(40);
    assert_eq!(NumberSequencer::next_number(&user, &[]).unwrap(), 40);
}

#[test]
fn cursor_outside_range_is_clamped() {
    let mut user = registrador("r", 101, 200);
    user.current_number = Some(7);
    assert_eq!(NumberSequencer::next_number(&user, &[]).unwrap(), 101);

    user.current_number = None;
    assert_eq!(NumberSequencer::next_number(&user, &[]).unwrap(), 101);
}

#[test]
fn non_registrador_is_rejected() {
    let mut user = registrador("r", 1, 100);
    user.role = Role::Usuario;
    assert!(matches!(
        NumberSequencer::next_number(&user, &[]),
        Err(AllocError::NotARegistrador(id)) if id == UserId::new("r")
    ));
}

#[test]
fn registrador_without_range_is_rejected() {
    let mut user = User::new("r");
    user.apply(&RoleAssignment::declassify(Role::Registrador));
    assert!(matches!(
        NumberSequencer::next_number(&user, &[]),
        Err(AllocError::NoRangeAssigned(_))
    ));
}

#[test]
fn remaining_counts_down_to_zero() {
    let user = registrador("r", 1, 3);
    assert_eq!(NumberSequencer::remaining(&user, &[]).unwrap(), 3);
    let persons = vec![person("a", 1, "r"), person("b", 2, "r")];
    assert_eq!(NumberSequencer::remaining(&user, &persons).unwrap(), 1);
    let persons = vec![person("c", 3, "r")];
    assert_eq!(NumberSequencer::remaining(&user, &persons).unwrap(), 0);
}

#[test]
fn remaining_saturates_on_block_wider_than_i64() {
    let user = registrador("r", i64::MIN, i64::MAX);
    assert_eq!(NumberSequencer::remaining(&user, &[]).unwrap(), i64::MAX);
    assert_eq!(NumberSequencer::next_number(&user, &[]).unwrap(), i64::MIN);
}

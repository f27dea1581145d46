use pretty_assertions::assert_eq;
use rega_types::{
    Document, DocumentType, Person, PersonDraft, Range, Role, RoleAssignment, TypesError, User,
    UserId,
};
use serde_json::json;

fn draft(doc: &str) -> PersonDraft {
    PersonDraft {
        numero_documento: doc.to_string(),
        nombres: "Ana".to_string(),
        apellidos: "Pérez".to_string(),
        municipio: "Pasto".to_string(),
        ..Default::default()
    }
}

// ── Person ───────────────────────────────────────────────────────

#[test]
fn person_wire_format_is_camel_case() {
    let person = draft("1085").into_person(12, UserId::new("reg-1"));
    let json = serde_json::to_value(&person).unwrap();

    assert_eq!(json["numeroDocumento"], "1085");
    assert_eq!(json["numeroAsignado"], 12);
    assert_eq!(json["registradoPor"], "reg-1");
    assert_eq!(json["isSynced"], 0);
    assert_eq!(json["tipoDocumento"], "Cédula de ciudadanía");
    assert!(json.get("id").is_none());
}

#[test]
fn person_reads_string_numero_asignado() {
    let person: Person = serde_json::from_value(json!({
        "numeroDocumento": "42",
        "numeroAsignado": "17",
        "registradoPor": "u1",
        "isSynced": 1,
        "tipoDocumento": "Pasaporte"
    }))
    .unwrap();

    assert_eq!(person.numero_asignado, 17);
    assert!(person.is_synced);
    assert_eq!(person.tipo_documento, DocumentType::Pasaporte);
    assert_eq!(person.nombres, "");
}

#[test]
fn person_rejects_non_numeric_numero_asignado() {
    let result = serde_json::from_value::<Person>(json!({
        "numeroDocumento": "42",
        "numeroAsignado": "abc",
        "registradoPor": "u1"
    }));
    assert!(result.is_err());
}

#[test]
fn same_content_ignores_bookkeeping() {
    let local = draft("1").into_person(5, UserId::new("r"));
    let mut remote = local.clone();
    remote.mark_synced(Some("doc-9".into()));

    assert!(local.same_content(&remote));
    assert_eq!(remote.id.as_deref(), Some("doc-9"));

    remote.celular = "300".into();
    assert!(!local.same_content(&remote));
}

#[test]
fn mark_synced_keeps_known_id() {
    let mut person = draft("1").into_person(5, UserId::new("r"));
    person.id = Some("doc-1".into());
    person.mark_synced(None);
    assert!(person.is_synced);
    assert_eq!(person.id.as_deref(), Some("doc-1"));
}

// ── PersonDraft ──────────────────────────────────────────────────

#[test]
fn draft_validation() {
    assert!(draft("123").validate().is_ok());

    let err = draft("  ").validate().unwrap_err();
    assert!(matches!(err, TypesError::InvalidDraft(_)));

    let mut nameless = draft("123");
    nameless.nombres.clear();
    assert!(nameless.validate().is_err());

    let mut no_surname = draft("123");
    no_surname.apellidos = " ".into();
    assert!(no_surname.validate().is_err());
}

#[test]
fn draft_into_person_is_local_only_and_trimmed() {
    let person = draft(" 99 ").into_person(3, UserId::new("r"));
    assert_eq!(person.numero_documento, "99");
    assert!(!person.is_synced);
    assert_eq!(person.id, None);
    assert_eq!(person.numero_asignado, 3);
}

// ── Role ─────────────────────────────────────────────────────────

#[test]
fn role_wire_names() {
    assert_eq!(serde_json::to_value(Role::Registrador).unwrap(), "Registrador");
    assert_eq!(serde_json::to_value(Role::Unassigned).unwrap(), "No asignado");

    let role: Role = serde_json::from_value(json!("Administrador")).unwrap();
    assert_eq!(role, Role::Administrador);

    let unknown: Role = serde_json::from_value(json!("Supervisor")).unwrap();
    assert_eq!(unknown, Role::Unassigned);

    let null: Role = serde_json::from_value(json!(null)).unwrap();
    assert_eq!(null, Role::Unassigned);
}

#[test]
fn role_from_str_is_strict() {
    assert_eq!("registrador".parse::<Role>().unwrap(), Role::Registrador);
    assert!(matches!(
        "Supervisor".parse::<Role>(),
        Err(TypesError::UnknownRole(_))
    ));
}

// ── User & RoleAssignment ────────────────────────────────────────

#[test]
fn user_without_role_decodes_as_unassigned() {
    let user: User = serde_json::from_value(json!({"id": "u1", "email": "a@b.co"})).unwrap();
    assert_eq!(user.role, Role::Unassigned);
    assert_eq!(user.assigned_range(), None);
}

#[test]
fn assigned_range_requires_registrador_and_both_bounds() {
    let mut user = User::new("u1");
    user.number_init = Some(1);
    user.number_end = Some(100);
    assert_eq!(user.assigned_range(), None);

    user.role = Role::Registrador;
    assert_eq!(user.assigned_range(), Some(Range::new(1, 100).unwrap()));

    user.number_end = None;
    assert_eq!(user.assigned_range(), None);
}

#[test]
fn registrador_assignment_sets_all_range_fields() {
    let mut user = User::new("u1");
    let range = Range::new(101, 200).unwrap();
    user.apply(&RoleAssignment::registrador(range));

    assert_eq!(user.role, Role::Registrador);
    assert_eq!(user.number_init, Some(101));
    assert_eq!(user.number_end, Some(200));
    assert_eq!(user.current_number, Some(101));
}

#[test]
fn declassify_clears_all_range_fields() {
    let mut user = User::new("u1");
    user.apply(&RoleAssignment::registrador(Range::new(1, 100).unwrap()));
    user.apply(&RoleAssignment::declassify(Role::Usuario));

    assert_eq!(user.role, Role::Usuario);
    assert_eq!(user.number_init, None);
    assert_eq!(user.number_end, None);
    assert_eq!(user.current_number, None);
}

#[test]
fn assignment_patch_carries_all_four_fields() {
    let patch = RoleAssignment::registrador(Range::new(1, 100).unwrap()).to_patch();
    assert_eq!(patch.len(), 4);
    assert_eq!(patch["role"], "Registrador");
    assert_eq!(patch["numberInit"], 1);
    assert_eq!(patch["numberEnd"], 100);
    assert_eq!(patch["currentNumber"], 1);

    let cleared = RoleAssignment::declassify(Role::Registrador).to_patch();
    assert_eq!(cleared["role"], "Registrador");
    assert!(cleared["numberInit"].is_null());
    assert!(cleared["numberEnd"].is_null());
    assert!(cleared["currentNumber"].is_null());
}

// ── Document ─────────────────────────────────────────────────────

#[test]
fn document_decode_injects_id() {
    let doc = Document::new("abc", json!({"role": "Registrador", "numberInit": 1}));
    let user: User = doc.decode().unwrap();
    assert_eq!(user.id, UserId::new("abc"));
    assert_eq!(user.role, Role::Registrador);
    assert_eq!(doc.get_str("/role"), Some("Registrador"));
    assert_eq!(doc.get_i64("/numberInit"), Some(1));
}

#[test]
fn document_encode_strips_id() {
    let mut person = draft("7").into_person(1, UserId::new("r"));
    person.id = Some("remote".into());
    let body = Document::encode(&person).unwrap();
    assert!(body.get("id").is_none());
    assert_eq!(body["numeroDocumento"], "7");
}

#[test]
fn document_field_equals() {
    let doc = Document::new("x", json!({"isSelected": 1}));
    assert!(doc.field_equals("isSelected", &json!(1)));
    assert!(!doc.field_equals("isSelected", &json!(0)));
    assert!(!doc.field_equals("missing", &json!(1)));
}

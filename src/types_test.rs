use super::*;
use serde_json::json;

// =============================================================================
// UserRole
// =============================================================================

#[test]
fn user_role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(UserRole::University).unwrap(), json!("university"));
}

#[test]
fn user_role_from_str_is_case_insensitive() {
    assert_eq!("Student".parse::<UserRole>(), Ok(UserRole::Student));
    assert_eq!(" ADMIN ".parse::<UserRole>(), Ok(UserRole::Admin));
}

#[test]
fn user_role_from_str_rejects_unknown() {
    let err = "recruiter".parse::<UserRole>().unwrap_err();
    assert!(err.contains("recruiter"));
}

#[test]
fn user_role_display_matches_wire_name() {
    for role in [UserRole::Student, UserRole::Employer, UserRole::University, UserRole::Admin] {
        assert_eq!(serde_json::to_value(role).unwrap(), json!(role.to_string()));
    }
}

// =============================================================================
// User
// =============================================================================

#[test]
fn user_deserializes_full_record() {
    let user: User = serde_json::from_value(json!({
        "id": "u1",
        "email": "a@b.com",
        "role": "employer",
        "is_active": false,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-02T00:00:00Z"
    }))
    .unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.role, UserRole::Employer);
    assert!(!user.is_active);
    assert_eq!(user.updated_at.as_deref(), Some("2025-01-02T00:00:00Z"));
}

#[test]
fn user_deserializes_minimal_record() {
    let user: User = serde_json::from_value(json!({ "id": "u1", "role": "student" })).unwrap();
    assert_eq!(user.email, "");
    assert!(user.is_active);
    assert!(user.created_at.is_none());
}

// =============================================================================
// TokenPair
// =============================================================================

#[test]
fn token_pair_defaults_token_type() {
    let pair: TokenPair =
        serde_json::from_value(json!({ "access_token": "AT1", "refresh_token": "RT1" })).unwrap();
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 0);
    assert!(pair.has_refresh_token());
}

#[test]
fn token_pair_empty_refresh_token_is_absent() {
    let pair: TokenPair = serde_json::from_value(json!({ "access_token": "AT1", "refresh_token": "" })).unwrap();
    assert!(!pair.has_refresh_token());
}

#[test]
fn token_pair_debug_redacts_tokens() {
    let pair = TokenPair {
        access_token: "secret-access".into(),
        refresh_token: "secret-refresh".into(),
        token_type: "Bearer".into(),
        expires_in: 900,
    };
    let debug = format!("{pair:?}");
    assert!(!debug.contains("secret-access"));
    assert!(!debug.contains("secret-refresh"));
    assert!(debug.contains("900"));
}

#[test]
fn auth_response_deserializes_nested_tokens() {
    let resp: AuthResponse = serde_json::from_value(json!({
        "user": { "id": "u1", "email": "a@b.com", "role": "student" },
        "tokens": { "access_token": "AT1", "refresh_token": "RT1", "token_type": "Bearer", "expires_in": 3600 }
    }))
    .unwrap();
    assert_eq!(resp.user.role, UserRole::Student);
    assert_eq!(resp.tokens.access_token, "AT1");
    assert_eq!(resp.tokens.expires_in, 3600);
}

// =============================================================================
// Requests
// =============================================================================

#[test]
fn login_request_debug_redacts_password() {
    let req = LoginRequest { email: "a@b.com".into(), password: "secret1".into() };
    let debug = format!("{req:?}");
    assert!(debug.contains("a@b.com"));
    assert!(!debug.contains("secret1"));
}

#[test]
fn register_request_serializes_role() {
    let req = RegisterRequest { email: "a@b.com".into(), password: "secret1".into(), role: UserRole::University };
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value, json!({ "email": "a@b.com", "password": "secret1", "role": "university" }));
}

#[test]
fn create_profile_omits_missing_university() {
    let req = CreateStudentProfileRequest {
        first_name: "Aida".into(),
        last_name: "Nur".into(),
        iin: "010203040506".into(),
        university_id: None,
    };
    let value = serde_json::to_value(&req).unwrap();
    assert!(value.get("university_id").is_none());
}

#[test]
fn update_profile_serializes_only_present_fields() {
    let req = UpdateStudentProfileRequest { last_name: Some("Sultan".into()), ..Default::default() };
    assert!(!req.is_empty());
    assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "last_name": "Sultan" }));
    assert!(UpdateStudentProfileRequest::default().is_empty());
}

use super::*;

fn pair(access: &str, refresh: &str) -> TokenPair {
    TokenPair {
        access_token: access.into(),
        refresh_token: refresh.into(),
        token_type: "Bearer".into(),
        expires_in: 900,
    }
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

#[test]
fn memory_store_starts_empty() {
    let store = MemoryTokenStore::new();
    assert!(store.load().unwrap().is_none());
}

#[test]
fn memory_store_save_then_load() {
    let store = MemoryTokenStore::new();
    store.save(&pair("AT1", "RT1")).unwrap();
    assert_eq!(store.load().unwrap(), Some(pair("AT1", "RT1")));
}

#[test]
fn memory_store_save_replaces_both_tokens() {
    let store = MemoryTokenStore::with_pair(pair("AT1", "RT1"));
    store.save(&pair("AT2", "RT2")).unwrap();
    assert_eq!(store.load().unwrap(), Some(pair("AT2", "RT2")));
}

#[test]
fn memory_store_clear_is_idempotent() {
    let store = MemoryTokenStore::with_pair(pair("AT1", "RT1"));
    store.clear().unwrap();
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

// =============================================================================
// FileTokenStore
// =============================================================================

#[test]
fn file_store_missing_file_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_store_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    store.save(&pair("AT1", "RT1")).unwrap();
    assert_eq!(store.load().unwrap(), Some(pair("AT1", "RT1")));
}

#[test]
fn file_store_survives_new_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    FileTokenStore::new(&path).save(&pair("AT1", "RT1")).unwrap();

    let reopened = FileTokenStore::new(&path);
    assert_eq!(reopened.load().unwrap(), Some(pair("AT1", "RT1")));
}

#[test]
fn file_store_uses_fixed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    FileTokenStore::new(&path).save(&pair("AT1", "RT1")).unwrap();

    let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw["access_token"], "AT1");
    assert_eq!(raw["refresh_token"], "RT1");
}

#[test]
fn file_store_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("nested/deeper/tokens.json"));
    store.save(&pair("AT1", "RT1")).unwrap();
    assert!(store.path().exists());
}

#[test]
fn file_store_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    store.save(&pair("AT1", "RT1")).unwrap();
    assert!(!store.temp_path().exists());
}

#[test]
fn file_store_clear_removes_file_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    store.save(&pair("AT1", "RT1")).unwrap();
    store.clear().unwrap();
    store.clear().unwrap();
    assert!(!store.path().exists());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn file_store_corrupt_file_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, b"not json").unwrap();
    let err = FileTokenStore::new(&path).load().unwrap_err();
    assert!(matches!(err, TokenStoreError::Decode(_)));
}

#[test]
fn file_store_empty_access_token_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, br#"{"access_token":"","refresh_token":"RT1"}"#).unwrap();
    assert!(FileTokenStore::new(&path).load().unwrap().is_none());
}

#[cfg(unix)]
#[test]
fn file_store_restricts_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    store.save(&pair("AT1", "RT1")).unwrap();
    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(unix)]
#[test]
fn write_private_creates_owner_only_file() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.tmp");
    write_private(&path, b"{}").unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(unix)]
#[test]
fn save_tightens_leftover_temp_file() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("tokens.json"));
    std::fs::write(store.temp_path(), b"stale").unwrap();
    std::fs::set_permissions(store.temp_path(), std::fs::Permissions::from_mode(0o644)).unwrap();

    store.save(&pair("AT1", "RT1")).unwrap();
    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(store.load().unwrap(), Some(pair("AT1", "RT1")));
}

//! Integration tests for the CFE vault store.

use std::fs;

use cfe::crypto::Argon2Params;
use cfe::errors::CfeError;
use cfe::vault::VaultStore;
use tempfile::TempDir;

const PARAMS: Argon2Params = Argon2Params::minimum();

/// Helper: an initialized, empty vault inside a fresh temp dir.
fn vault_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("vault").join("cfe_vault.dat");
    assert!(VaultStore::initialize(&path).expect("initialize"));
    (dir, path)
}

fn open(path: &std::path::Path, password: &str) -> VaultStore {
    VaultStore::open(path, password, &PARAMS).expect("open vault")
}

fn line_count(path: &std::path::Path) -> usize {
    fs::read(path)
        .unwrap()
        .split(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
        .count()
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

#[test]
fn open_without_initialize_is_not_initialized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.dat");
    let err = VaultStore::open(&path, "password", &PARAMS).err().unwrap();
    assert!(matches!(err, CfeError::VaultNotInitialized(_)));
}

#[test]
fn initialize_keeps_existing_records() {
    let (_dir, path) = vault_path();
    open(&path, "pw-one").create("a 1").unwrap();
    let before = fs::read(&path).unwrap();

    assert!(!VaultStore::initialize(&path).unwrap());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn empty_vault_opens_with_any_password() {
    let (_dir, path) = vault_path();
    let store = open(&path, "whatever");
    assert!(store.is_empty());
    assert!(store.foreign_records().is_empty());
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_is_idempotent() {
    let (_dir, path) = vault_path();
    let mut store = open(&path, "pw-one");

    let first = store.create("report 0f3c").unwrap().content_key.clone();
    let second = store.create("report 0f3c").unwrap().content_key.clone();
    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
    assert_eq!(line_count(&path), 1);

    let reopened = open(&path, "pw-one");
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.entries()[0].content_key, first);
}

#[test]
fn created_entry_survives_reopen() {
    let (_dir, path) = vault_path();
    let (name, key) = {
        let mut store = open(&path, "pw-one");
        let entry = store.create_for_label("notes.txt").unwrap();
        (entry.name.clone(), entry.content_key.clone())
    };

    let store = open(&path, "pw-one");
    let entry = store.find_label("notes.txt").expect("entry");
    assert_eq!(entry.name, name);
    assert_eq!(entry.content_key, key);
    assert_eq!(entry.label(), "notes.txt");
    assert!(entry.remote_id().is_some());
}

#[test]
fn create_for_label_rejects_bad_labels() {
    let (_dir, path) = vault_path();
    let mut store = open(&path, "pw-one");
    assert!(matches!(
        store.create_for_label("two words"),
        Err(CfeError::InvalidLabel(_))
    ));
    assert!(matches!(
        store.create_for_label(""),
        Err(CfeError::InvalidLabel(_))
    ));
    assert_eq!(line_count(&path), 0);
}

// ---------------------------------------------------------------------------
// Foreign records
// ---------------------------------------------------------------------------

#[test]
fn foreign_records_are_preserved_byte_for_byte() {
    let (_dir, path) = vault_path();

    {
        let mut other = open(&path, "pw-two");
        other.create("theirs 1111").unwrap();
        other.create("also-theirs 2222").unwrap();
    }
    let foreign_before: Vec<Vec<u8>> = fs::read(&path)
        .unwrap()
        .split(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
        .map(<[u8]>::to_vec)
        .collect();

    let mut mine = open(&path, "pw-one");
    assert!(mine.is_empty());
    assert_eq!(mine.foreign_records(), foreign_before.as_slice());

    mine.create("mine 3333").unwrap();
    assert!(mine.delete("mine").unwrap());
    mine.create("mine 4444").unwrap();

    let after: Vec<Vec<u8>> = fs::read(&path)
        .unwrap()
        .split(|&b| b == b'\n')
        .filter(|l| !l.is_empty())
        .map(<[u8]>::to_vec)
        .collect();
    assert_eq!(after.len(), 3);
    for line in &foreign_before {
        assert!(after.contains(line), "foreign line was altered or dropped");
    }

    let other = open(&path, "pw-two");
    assert_eq!(other.labels(), vec!["also-theirs", "theirs"]);
}

#[test]
fn garbage_lines_are_kept_as_foreign() {
    let (_dir, path) = vault_path();
    fs::write(&path, b"not base64 at all!\nAAAA\n").unwrap();

    let mut store = open(&path, "pw-one");
    assert_eq!(store.foreign_records().len(), 2);
    store.create("x 1").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("not base64 at all!\n"));
    assert!(content.contains("AAAA\n"));
}

// ---------------------------------------------------------------------------
// Find and delete
// ---------------------------------------------------------------------------

#[test]
fn label_lookup_does_not_match_longer_labels() {
    let (_dir, path) = vault_path();
    let mut store = open(&path, "pw-one");
    store.create("foo2 abcd").unwrap();

    assert!(store.find_label("foo").is_none());
    assert!(store.find("foo").is_some());
    assert!(!store.delete_label("foo").unwrap());
    assert_eq!(store.len(), 1);
}

#[test]
fn delete_then_find_is_absent_even_after_reopen() {
    let (_dir, path) = vault_path();
    let mut store = open(&path, "pw-one");
    store.create_for_label("a").unwrap();
    store.create_for_label("b").unwrap();

    assert!(store.delete_label("a").unwrap());
    assert!(store.find_label("a").is_none());
    assert!(!store.delete_label("a").unwrap());

    let reopened = open(&path, "pw-one");
    assert!(reopened.find_label("a").is_none());
    assert_eq!(reopened.labels(), vec!["b"]);
}

#[test]
fn delete_on_empty_vault_is_false() {
    let (_dir, path) = vault_path();
    let mut store = open(&path, "pw-one");
    assert!(!store.delete("anything").unwrap());
}

// ---------------------------------------------------------------------------
// Two passwords, one file
// ---------------------------------------------------------------------------

#[test]
fn two_passwords_share_one_file() {
    let (_dir, path) = vault_path();

    let a_key = open(&path, "pw1-secret")
        .create("a 1")
        .unwrap()
        .content_key
        .clone();
    open(&path, "pw2-secret").create("b 2").unwrap();

    let one = open(&path, "pw1-secret");
    assert_eq!(one.labels(), vec!["a"]);
    assert_eq!(one.find("a").unwrap().content_key, a_key);
    assert!(one.find("b").is_none());
    assert_eq!(one.foreign_records().len(), 1);

    let two = open(&path, "pw2-secret");
    assert_eq!(two.labels(), vec!["b"]);
    assert!(two.find("a").is_none());

    let mut one = one;
    assert!(one.delete("a").unwrap());

    let two = open(&path, "pw2-secret");
    assert_eq!(two.labels(), vec!["b"]);
    assert!(open(&path, "pw1-secret").is_empty());
    assert_eq!(line_count(&path), 1);
}

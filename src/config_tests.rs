#![allow(clippy::unwrap_used)]

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_take_db_flag_absent() {
    let mut a = args(&["budgetbook", "summary"]);
    assert!(take_db_flag(&mut a).unwrap().is_none());
    assert_eq!(a, args(&["budgetbook", "summary"]));
}

#[test]
fn test_take_db_flag_removes_pair() {
    let mut a = args(&["budgetbook", "--db", "/tmp/x.db", "summary", "2024-03"]);
    let path = take_db_flag(&mut a).unwrap().unwrap();
    assert_eq!(path, PathBuf::from("/tmp/x.db"));
    assert_eq!(a, args(&["budgetbook", "summary", "2024-03"]));

    let mut b = args(&["budgetbook", "summary", "--db", "y.db"]);
    assert_eq!(take_db_flag(&mut b).unwrap().unwrap(), PathBuf::from("y.db"));
    assert_eq!(b, args(&["budgetbook", "summary"]));
}

#[test]
fn test_take_db_flag_missing_value() {
    let mut a = args(&["budgetbook", "--db"]);
    assert!(take_db_flag(&mut a).is_err());
}

#[test]
fn test_override_path_creates_parent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data.db");
    let resolved = get_db_path(Some(path.clone())).unwrap();
    assert_eq!(resolved, path);
    assert!(dir.path().join("nested").is_dir());
}

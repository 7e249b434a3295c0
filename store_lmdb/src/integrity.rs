//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node begins
//! accepting blocks.

use std::path::Path;

use heed::types::Bytes;
use heed::Env;

use fedchain_store::Bucket;

use crate::environment::{BUCKETS_DB, META_DB};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

const EXPECTED_DATABASES: &[&str] = &[BUCKETS_DB, META_DB];

/// Count entries in every expected database and check that every bucket key
/// carries a known tag. Read failures are recorded in the report rather than
/// returned.
pub fn check_integrity(env: &Env) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
                if db_name == BUCKETS_DB {
                    scan_bucket_tags(&rtxn, db, &mut report);
                }
            }
            Ok(None) => {
                // Not created yet; acceptable for a fresh node
            }
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    Ok(report)
}

fn scan_bucket_tags(
    rtxn: &heed::RoTxn<'_>,
    db: heed::Database<Bytes, Bytes>,
    report: &mut IntegrityReport,
) {
    let iter = match db.iter(rtxn) {
        Ok(iter) => iter,
        Err(e) => {
            report.errors.push(format!("failed to scan buckets: {}", e));
            return;
        }
    };
    for item in iter {
        match item {
            Ok((key, _)) => match key.first() {
                Some(&tag) if Bucket::from_u8(tag).is_some() => {}
                Some(&tag) => {
                    report.errors.push(format!("record with unknown bucket tag {}", tag));
                }
                None => report.errors.push("record with empty key".to_string()),
            },
            Err(e) => {
                report.errors.push(format!("failed to read bucket record: {}", e));
                return;
            }
        }
    }
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(&dir.path().join("missing")).is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(&dir.path().join("db"), 10 * 1024 * 1024).unwrap();
        let report = check_integrity(env.env()).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, 2);
    }

    #[test]
    fn unknown_tag_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(&dir.path().join("db"), 10 * 1024 * 1024).unwrap();
        let mut wtxn = env.env().write_txn().unwrap();
        env.buckets_db.put(&mut wtxn, &[200u8, 1, 2][..], &[0u8][..]).unwrap();
        wtxn.commit().unwrap();

        let report = check_integrity(env.env()).unwrap();
        assert!(!report.is_healthy());
    }
}

//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::{info, warn};

use fedchain_store::{Bucket, KeyValueStore, Record, StoreError};

use crate::integrity::{check_data_dir, check_integrity};
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

pub(crate) const BUCKETS_DB: &str = "buckets";
pub(crate) const META_DB: &str = "meta";
const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and its database handles.
pub struct LmdbEnvironment {
    env: Env,
    path: PathBuf,
    pub(crate) buckets_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an environment at `path`, run schema migrations and an
    /// integrity scan.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        check_data_dir(path).map_err(LmdbError::DataDir)?;
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // the files are not modified externally while open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let buckets_db = env.create_database(&mut wtxn, Some(BUCKETS_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let this = Self {
            env,
            path: path.to_path_buf(),
            buckets_db,
            meta_db,
        };

        Migrator::run(&this.meta_store())?;

        let report = check_integrity(&this.env)?;
        if report.is_healthy() {
            info!(
                path = %path.display(),
                databases = report.databases_checked,
                entries = report.total_entries,
                "opened LMDB environment"
            );
        } else {
            for e in &report.errors {
                warn!(path = %path.display(), error = %e, "integrity check");
            }
        }

        Ok(this)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: self.env.clone(),
            meta_db: self.meta_db,
        }
    }

    /// Begin a write batch. Dropping it without `commit` discards it.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }
}

/// `tag ++ key`.
pub(crate) fn bucket_key(bucket: Bucket, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + key.len());
    out.push(bucket.as_u8());
    out.extend_from_slice(key);
    out
}

impl KeyValueStore for LmdbEnvironment {
    fn put_batch(&self, records: &[Record]) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        for record in records {
            batch.put(record.bucket, &record.key, &record.value)?;
        }
        batch.commit()
    }

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self
            .buckets_db
            .get(&rtxn, &bucket_key(bucket, key))
            .map_err(LmdbError::from)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn list_bucket(&self, bucket: Bucket) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = [bucket.as_u8()];
        let mut out = Vec::new();
        for item in self
            .buckets_db
            .prefix_iter(&rtxn, &prefix[..])
            .map_err(LmdbError::from)?
        {
            let (key, value) = item.map_err(LmdbError::from)?;
            out.push((key[1..].to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}

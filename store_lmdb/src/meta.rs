//! LMDB implementation of MetaStore.

use heed::types::Bytes;
use heed::{Database, Env};

use fedchain_store::{MetaStore, StoreError};

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

pub struct LmdbMetaStore {
    pub(crate) env: Env,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl MetaStore for LmdbMetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(format!(
                        "schema_version has {} bytes, expected 4",
                        bytes.len()
                    ))
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::LmdbEnvironment;
    use fedchain_store::MetaStore;

    #[test]
    fn meta_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(&dir.path().join("db"), 10 * 1024 * 1024).unwrap();
        let meta = env.meta_store();
        assert_eq!(meta.get_meta("k").unwrap(), None);
        meta.put_meta("k", b"v").unwrap();
        assert_eq!(meta.get_meta("k").unwrap(), Some(b"v".to_vec()));
        meta.delete_meta("k").unwrap();
        assert_eq!(meta.get_meta("k").unwrap(), None);
    }

    #[test]
    fn malformed_schema_version_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(&dir.path().join("db"), 10 * 1024 * 1024).unwrap();
        let meta = env.meta_store();
        meta.put_meta("schema_version", &[1, 2]).unwrap();
        assert!(meta.get_schema_version().is_err());
    }
}

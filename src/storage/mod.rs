//! Persistent partitioned cache storage
//!
//! A storage root holds one directory per named partition. Partitions are
//! plain request→response stores: no expiry, no eviction of single entries.
//! Whole partitions are created on open and removed on delete.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   static-v1.0.0/
//!     <id>.json     entry metadata
//!     <id>.body     entry body
//!   dynamic-v1.0.0/
//!   registration.json
//! ```
//!
//! Puts write to a temporary file and rename into place, so a reader sees
//! either the previous entry or the new one. Concurrent puts of one key are
//! last-write-wins.

pub mod entry;

pub use entry::EntryMeta;

use crate::error::{SwError, SwResult};
use crate::http::{Request, Response};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Check that a partition name is a single safe path component
pub fn validate_partition_name(name: &str) -> SwResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(SwError::PartitionName(name.to_string()))
    }
}

/// A cached response together with the partition that answered
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub partition: String,
    pub response: Response,
}

/// Handle to a storage root
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, name: &str) -> SwResult<PathBuf> {
        validate_partition_name(name)?;
        Ok(self.root.join(name))
    }

    /// Open a partition, creating it if needed
    pub async fn open(&self, name: &str) -> SwResult<Partition> {
        let dir = self.partition_dir(name)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwError::io(format!("creating partition {}", dir.display()), e))?;

        Ok(Partition {
            name: name.to_string(),
            dir,
        })
    }

    /// Get an existing partition without creating it
    pub async fn get(&self, name: &str) -> SwResult<Option<Partition>> {
        let dir = self.partition_dir(name)?;
        if !is_dir(&dir).await {
            return Ok(None);
        }
        Ok(Some(Partition {
            name: name.to_string(),
            dir,
        }))
    }

    /// Whether a partition exists
    pub async fn has(&self, name: &str) -> SwResult<bool> {
        Ok(is_dir(&self.partition_dir(name)?).await)
    }

    /// Delete a partition and all its entries. Returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> SwResult<bool> {
        let dir = self.partition_dir(name)?;
        if !is_dir(&dir).await {
            return Ok(false);
        }

        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| SwError::io(format!("deleting partition {}", dir.display()), e))?;

        debug!("Deleted partition {}", name);
        Ok(true)
    }

    /// Names of all partitions, sorted
    pub async fn keys(&self) -> SwResult<Vec<String>> {
        if !is_dir(&self.root).await {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| SwError::io("reading storage root", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwError::io("reading storage entry", e))?
        {
            if !entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_partition_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Look a request up in `names`, in order, returning the first match.
    ///
    /// Missing partitions are skipped, not created. An unreadable entry in one
    /// partition is logged and treated as a miss there.
    pub async fn match_in(&self, names: &[String], request: &Request) -> SwResult<Option<CacheHit>> {
        for name in names {
            let Some(partition) = self.get(name).await? else {
                continue;
            };

            match partition.match_request(request).await {
                Ok(Some(response)) => {
                    return Ok(Some(CacheHit {
                        partition: name.clone(),
                        response,
                    }))
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Ignoring cache entry in {}: {}", name, e),
            }
        }
        Ok(None)
    }
}

/// Handle to one named partition
#[derive(Debug, Clone)]
pub struct Partition {
    name: String,
    dir: PathBuf,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn paths(&self, key: &str) -> (PathBuf, PathBuf) {
        let id = entry::entry_id(key);
        (
            self.dir.join(format!("{}.json", id)),
            self.dir.join(format!("{}.body", id)),
        )
    }

    /// Find the stored response for a request
    pub async fn match_request(&self, request: &Request) -> SwResult<Option<Response>> {
        let key = request.cache_key();
        let (meta_path, body_path) = self.paths(&key);

        let content = match fs::read_to_string(&meta_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SwError::io(format!("reading {}", meta_path.display()), e)),
        };
        let meta: EntryMeta =
            serde_json::from_str(&content).map_err(|e| SwError::CorruptEntry {
                path: meta_path.clone(),
                reason: e.to_string(),
            })?;

        if meta.key != key {
            return Ok(None);
        }

        let body = fs::read(&body_path)
            .await
            .map_err(|e| SwError::io(format!("reading {}", body_path.display()), e))?;

        if !meta.matches_body(&body) {
            return Err(SwError::CorruptEntry {
                path: body_path,
                reason: "body does not match metadata".to_string(),
            });
        }

        Ok(Some(meta.into_response(body)))
    }

    /// Store a response for a request, replacing any previous entry
    pub async fn put(&self, request: &Request, response: &Response) -> SwResult<()> {
        let meta = EntryMeta::new(request, response);
        let (meta_path, body_path) = self.paths(&meta.key);

        write_atomic(&body_path, &response.body).await?;
        write_atomic(&meta_path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;

        debug!("Stored {} in {}", meta.key, self.name);
        Ok(())
    }

    /// Metadata of every entry, sorted by URL
    pub async fn entries(&self) -> SwResult<Vec<EntryMeta>> {
        let mut metas = vec![];
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| SwError::io(format!("reading partition {}", self.name), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwError::io("reading partition entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path).await.ok();
                if let Some(meta) = content.and_then(|c| serde_json::from_str::<EntryMeta>(&c).ok()) {
                    metas.push(meta);
                }
            }
        }

        metas.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(metas)
    }

    /// Number of entries
    pub async fn len(&self) -> SwResult<usize> {
        Ok(self.entries().await?.len())
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|meta| meta.is_dir())
}

async fn write_atomic(path: &Path, contents: &[u8]) -> SwResult<()> {
    let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));

    fs::write(&tmp, contents)
        .await
        .map_err(|e| SwError::io(format!("writing {}", tmp.display()), e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(SwError::io(format!("replacing {}", path.display()), e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (CacheStorage, TempDir) {
        let temp = TempDir::new().unwrap();
        (CacheStorage::new(temp.path()), temp)
    }

    fn css() -> (Request, Response) {
        (
            Request::get("https://site.test/css/base.css").unwrap(),
            Response::new(
                200,
                vec![("Content-Type".to_string(), "text/css".to_string())],
                "body{}",
            ),
        )
    }

    #[test]
    fn partition_names_validated() {
        assert!(validate_partition_name("static-v1.0.0").is_ok());
        assert!(validate_partition_name("").is_err());
        assert!(validate_partition_name("..").is_err());
        assert!(validate_partition_name("a/b").is_err());
        assert!(validate_partition_name("x y").is_err());
    }

    #[tokio::test]
    async fn put_then_match() {
        let (storage, _temp) = storage();
        let (request, response) = css();

        let partition = storage.open("static-v1").await.unwrap();
        assert!(partition.match_request(&request).await.unwrap().is_none());

        partition.put(&request, &response).await.unwrap();
        let stored = partition.match_request(&request).await.unwrap().unwrap();
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn put_overwrites_without_duplicates() {
        let (storage, _temp) = storage();
        let (request, response) = css();
        let partition = storage.open("static-v1").await.unwrap();

        partition.put(&request, &response).await.unwrap();
        let newer = Response::new(200, vec![], "body{margin:0}");
        partition.put(&request, &newer).await.unwrap();

        assert_eq!(partition.len().await.unwrap(), 1);
        assert_eq!(
            partition.match_request(&request).await.unwrap().unwrap(),
            newer
        );
    }

    #[tokio::test]
    async fn keys_lists_partitions_only() {
        let (storage, temp) = storage();
        assert!(storage.keys().await.unwrap().is_empty());

        storage.open("static-v1").await.unwrap();
        storage.open("dynamic-v1").await.unwrap();
        std::fs::write(temp.path().join("registration.json"), "{}").unwrap();

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["dynamic-v1".to_string(), "static-v1".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_partition() {
        let (storage, _temp) = storage();
        storage.open("images-v0").await.unwrap();

        assert!(storage.delete("images-v0").await.unwrap());
        assert!(!storage.delete("images-v0").await.unwrap());
        assert!(!storage.has("images-v0").await.unwrap());
    }

    #[tokio::test]
    async fn plain_file_is_not_a_partition() {
        let (storage, temp) = storage();
        std::fs::write(temp.path().join("static-v1"), "stray").unwrap();

        assert!(storage.get("static-v1").await.unwrap().is_none());
        assert!(!storage.has("static-v1").await.unwrap());
        assert!(!storage.delete("static-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn match_in_follows_order_and_skips_missing() {
        let (storage, _temp) = storage();
        let (request, _) = css();

        let first = storage.open("first").await.unwrap();
        let second = storage.open("second").await.unwrap();
        first
            .put(&request, &Response::new(200, vec![], "from-first"))
            .await
            .unwrap();
        second
            .put(&request, &Response::new(200, vec![], "from-second"))
            .await
            .unwrap();

        let names = vec![
            "missing".to_string(),
            "second".to_string(),
            "first".to_string(),
        ];
        let hit = storage.match_in(&names, &request).await.unwrap().unwrap();
        assert_eq!(hit.partition, "second");
        assert_eq!(hit.response.text(), "from-second");
        assert!(!storage.has("missing").await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_body_is_a_miss_for_global_lookup() {
        let (storage, temp) = storage();
        let (request, response) = css();
        let partition = storage.open("static-v1").await.unwrap();
        partition.put(&request, &response).await.unwrap();

        let id = entry::entry_id(&request.cache_key());
        std::fs::write(
            temp.path().join("static-v1").join(format!("{}.body", id)),
            "tampered",
        )
        .unwrap();

        assert!(matches!(
            partition.match_request(&request).await,
            Err(SwError::CorruptEntry { .. })
        ));
        let names = vec!["static-v1".to_string()];
        assert!(storage.match_in(&names, &request).await.unwrap().is_none());
    }
}

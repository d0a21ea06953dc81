use crate::error::StoreError;
use crate::model::{AlbumDocument, AlbumRecord, DocumentTimestamp};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Fields a merge-update may overwrite; `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumPatch {
    pub listen_count: Option<u32>,
    pub last_listened: Option<OffsetDateTime>,
}

/// Per-user album documents keyed by album id.
pub trait CollectionRepository {
    fn list_albums(&self, user_id: &str) -> Result<Vec<AlbumRecord>, StoreError>;

    fn get_album(&self, user_id: &str, album_id: &str) -> Result<Option<AlbumRecord>, StoreError>;

    fn create_album(&mut self, user_id: &str, record: &AlbumRecord) -> Result<(), StoreError>;

    fn merge_album(
        &mut self,
        user_id: &str,
        album_id: &str,
        patch: &AlbumPatch,
    ) -> Result<(), StoreError>;

    fn delete_album(&mut self, user_id: &str, album_id: &str) -> Result<(), StoreError>;
}

/// Decodes a JSON array of album documents, each carrying its own `id`.
pub fn decode_snapshot(json: &str) -> Result<Vec<AlbumRecord>, StoreError> {
    let documents: Vec<AlbumDocument> = serde_json::from_str(json)?;
    documents
        .into_iter()
        .map(|document| AlbumRecord::from_document(None, document).map_err(StoreError::from))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserCollection {
    #[serde(default)]
    pub albums: BTreeMap<String, AlbumDocument>,
}

/// The whole store, laid out as `users/<uid>/albums/<album id>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionData {
    #[serde(default)]
    pub users: BTreeMap<String, UserCollection>,
}

impl CollectionData {
    fn list(&self, user_id: &str) -> Result<Vec<AlbumRecord>, StoreError> {
        let Some(collection) = self.users.get(user_id) else {
            return Ok(Vec::new());
        };
        collection
            .albums
            .iter()
            .map(|(key, document)| {
                AlbumRecord::from_document(Some(key.as_str()), document.clone())
                    .map_err(StoreError::from)
            })
            .collect()
    }

    fn get(&self, user_id: &str, album_id: &str) -> Result<Option<AlbumRecord>, StoreError> {
        self.users
            .get(user_id)
            .and_then(|collection| collection.albums.get(album_id))
            .map(|document| AlbumRecord::from_document(Some(album_id), document.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    fn create(&mut self, user_id: &str, record: &AlbumRecord) -> Result<(), StoreError> {
        let albums = &mut self.users.entry(user_id.to_string()).or_default().albums;
        if albums.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id.clone()));
        }
        albums.insert(record.id.clone(), AlbumDocument::from(record));
        Ok(())
    }

    fn merge(
        &mut self,
        user_id: &str,
        album_id: &str,
        patch: &AlbumPatch,
    ) -> Result<(), StoreError> {
        let document = self
            .users
            .get_mut(user_id)
            .and_then(|collection| collection.albums.get_mut(album_id))
            .ok_or_else(|| StoreError::NotFound(album_id.to_string()))?;
        if let Some(listen_count) = patch.listen_count {
            document.listen_count = Some(Number::from(listen_count));
        }
        if let Some(at) = patch.last_listened {
            document.last_listened = Some(DocumentTimestamp::from_datetime(at));
        }
        Ok(())
    }

    fn delete(&mut self, user_id: &str, album_id: &str) -> Result<(), StoreError> {
        self.users
            .get_mut(user_id)
            .and_then(|collection| collection.albums.remove(album_id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(album_id.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    data: CollectionData,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionRepository for MemoryCollection {
    fn list_albums(&self, user_id: &str) -> Result<Vec<AlbumRecord>, StoreError> {
        self.data.list(user_id)
    }

    fn get_album(&self, user_id: &str, album_id: &str) -> Result<Option<AlbumRecord>, StoreError> {
        self.data.get(user_id, album_id)
    }

    fn create_album(&mut self, user_id: &str, record: &AlbumRecord) -> Result<(), StoreError> {
        self.data.create(user_id, record)
    }

    fn merge_album(
        &mut self,
        user_id: &str,
        album_id: &str,
        patch: &AlbumPatch,
    ) -> Result<(), StoreError> {
        self.data.merge(user_id, album_id, patch)
    }

    fn delete_album(&mut self, user_id: &str, album_id: &str) -> Result<(), StoreError> {
        self.data.delete(user_id, album_id)
    }
}

/// A collection persisted as one JSON file.
///
/// Every call reads the file afresh; every mutation rewrites it, keeping the
/// previous contents next to it as `*.json.bak`.
#[derive(Debug, Clone)]
pub struct JsonCollectionStore {
    path: PathBuf,
}

impl JsonCollectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CollectionData, StoreError> {
        if !self.path.exists() {
            return Ok(CollectionData::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let data = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("loaded collection store {}", self.path.display());
        Ok(data)
    }

    fn save(&self, data: &CollectionData) -> Result<(), StoreError> {
        let io_error = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        if self.path.exists() {
            let backup = self.path.with_extension("json.bak");
            let _ = fs::copy(&self.path, &backup);
        }
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, json).map_err(io_error)?;
        Ok(())
    }

    fn modify(
        &mut self,
        apply: impl FnOnce(&mut CollectionData) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut data = self.load()?;
        apply(&mut data)?;
        self.save(&data)
    }
}

impl CollectionRepository for JsonCollectionStore {
    fn list_albums(&self, user_id: &str) -> Result<Vec<AlbumRecord>, StoreError> {
        self.load()?.list(user_id)
    }

    fn get_album(&self, user_id: &str, album_id: &str) -> Result<Option<AlbumRecord>, StoreError> {
        self.load()?.get(user_id, album_id)
    }

    fn create_album(&mut self, user_id: &str, record: &AlbumRecord) -> Result<(), StoreError> {
        self.modify(|data| data.create(user_id, record))
    }

    fn merge_album(
        &mut self,
        user_id: &str,
        album_id: &str,
        patch: &AlbumPatch,
    ) -> Result<(), StoreError> {
        self.modify(|data| data.merge(user_id, album_id, patch))
    }

    fn delete_album(&mut self, user_id: &str, album_id: &str) -> Result<(), StoreError> {
        self.modify(|data| data.delete(user_id, album_id))
    }
}

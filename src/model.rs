use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9998;

/// A saved album in one user's collection, validated at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRecord {
    pub id: String,
    pub name: String,
    /// Comma-joined artist names as they were at save time.
    pub artists: String,
    pub total_tracks: u32,
    pub album_type: String,
    pub release_date: String,
    pub image: Option<String>,
    pub link: String,
    pub listen_count: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_listened: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub first_listen: Option<OffsetDateTime>,
}

impl AlbumRecord {
    /// Seconds of `last_listened`, 0 when the album has never been listened.
    pub fn last_listened_seconds(&self) -> i64 {
        self.last_listened
            .map(OffsetDateTime::unix_timestamp)
            .unwrap_or(0)
    }

    /// Validates a loose store document.
    ///
    /// `key` is the document key the store filed the document under. The key wins
    /// when the body carries no id; a body id that disagrees with it is rejected.
    pub fn from_document(key: Option<&str>, document: AlbumDocument) -> Result<Self, RecordError> {
        let embedded = document
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let id = match (key.map(str::trim).filter(|k| !k.is_empty()), embedded) {
            (Some(key), Some(embedded)) if key != embedded => {
                return Err(RecordError::IdMismatch {
                    key: key.to_string(),
                    embedded: embedded.to_string(),
                });
            }
            (Some(key), _) => key.to_string(),
            (None, Some(embedded)) => embedded.to_string(),
            (None, None) => return Err(RecordError::MissingId),
        };

        let total_tracks = coerce_count(document.total_tracks.as_ref(), "totalTracks", &id);
        let listen_count = coerce_count(document.listen_count.as_ref(), "listenCount", &id);
        let last_listened = document
            .last_listened
            .as_ref()
            .map(|stamp| stamp.to_datetime(&id, "lastListened"))
            .transpose()?;
        let first_listen = document
            .first_listen
            .as_ref()
            .map(|stamp| stamp.to_datetime(&id, "firstListen"))
            .transpose()?;
        if let (Some(first), Some(last)) = (first_listen, last_listened)
            && first > last
        {
            log::warn!("album {id:?} was first listened after its last listen");
        }

        Ok(Self {
            id,
            name: document.name.unwrap_or_default(),
            artists: document.artists.unwrap_or_default(),
            total_tracks,
            album_type: document.album_type.unwrap_or_default(),
            release_date: document.release_date.unwrap_or_default(),
            image: document.image.filter(|url| !url.is_empty()),
            link: document.link.unwrap_or_default(),
            listen_count,
            last_listened,
            first_listen,
        })
    }
}

fn coerce_count(value: Option<&Number>, field: &str, id: &str) -> u32 {
    let Some(number) = value else {
        return 0;
    };
    if let Some(whole) = number.as_u64() {
        return u32::try_from(whole).unwrap_or_else(|_| {
            log::warn!("album {id:?} {field} {whole} saturated");
            u32::MAX
        });
    }

    let float = number.as_f64().unwrap_or(0.0);
    if !float.is_finite() || float < 0.0 {
        log::warn!("album {id:?} {field} {number} coerced to 0");
        return 0;
    }
    log::warn!("album {id:?} {field} {number} truncated");
    float.trunc().min(f64::from(u32::MAX)) as u32
}

/// Timestamp shapes found in stored documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentTimestamp {
    Parts {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },
    Seconds(i64),
    Text(String),
}

impl DocumentTimestamp {
    pub fn from_datetime(at: OffsetDateTime) -> Self {
        Self::Parts {
            seconds: at.unix_timestamp(),
            nanoseconds: at.nanosecond(),
        }
    }

    fn to_datetime(&self, id: &str, field: &'static str) -> Result<OffsetDateTime, RecordError> {
        let invalid = |reason: String| RecordError::InvalidTimestamp {
            id: id.to_string(),
            field,
            reason,
        };
        let at = match self {
            Self::Parts {
                seconds,
                nanoseconds,
            } => {
                if *nanoseconds >= 1_000_000_000 {
                    return Err(invalid(format!("{nanoseconds} nanoseconds")));
                }
                let nanos = i128::from(*seconds) * 1_000_000_000 + i128::from(*nanoseconds);
                OffsetDateTime::from_unix_timestamp_nanos(nanos)
                    .map_err(|err| invalid(err.to_string()))?
            }
            Self::Seconds(seconds) => OffsetDateTime::from_unix_timestamp(*seconds)
                .map_err(|err| invalid(err.to_string()))?,
            Self::Text(text) => OffsetDateTime::parse(text.trim(), &Rfc3339)
                .map_err(|err| invalid(err.to_string()))?
                .to_offset(UtcOffset::UTC),
        };
        if !(MIN_YEAR..=MAX_YEAR).contains(&at.year()) {
            return Err(invalid(format!("year {} out of range", at.year())));
        }
        Ok(at)
    }
}

/// A loosely shaped album document as the store holds it.
///
/// Fields the collection does not model are kept in `extra` so that
/// merge-updates leave them untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tracks: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_count: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_listened: Option<DocumentTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_listen: Option<DocumentTimestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&AlbumRecord> for AlbumDocument {
    fn from(record: &AlbumRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            name: Some(record.name.clone()),
            artists: Some(record.artists.clone()),
            total_tracks: Some(Number::from(record.total_tracks)),
            album_type: Some(record.album_type.clone()),
            release_date: Some(record.release_date.clone()),
            image: record.image.clone(),
            link: Some(record.link.clone()),
            listen_count: Some(Number::from(record.listen_count)),
            last_listened: record.last_listened.map(DocumentTimestamp::from_datetime),
            first_listen: record.first_listen.map(DocumentTimestamp::from_datetime),
            extra: Map::new(),
        }
    }
}

/// An album as returned by a catalog search, before it is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: String,
}

impl CatalogAlbum {
    /// Builds the first-save record: one listen, first and last listen at `saved_at`.
    pub fn to_record(&self, saved_at: OffsetDateTime) -> Result<AlbumRecord, RecordError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(RecordError::MissingId);
        }
        let saved_at = saved_at.to_offset(UtcOffset::UTC);
        Ok(AlbumRecord {
            id: id.to_string(),
            name: self.name.clone(),
            artists: self.artists.join(", "),
            total_tracks: self.total_tracks,
            album_type: self.album_type.clone(),
            release_date: self.release_date.clone(),
            image: self.image.clone().filter(|url| !url.is_empty()),
            link: self.link.clone(),
            listen_count: 1,
            last_listened: Some(saved_at),
            first_listen: Some(saved_at),
        })
    }
}

use crate::collection::{AlbumPatch, CollectionRepository};
use crate::error::StoreError;
use crate::model::CatalogAlbum;
use crate::session::SessionContext;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Incremented { listen_count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Decremented { listen_count: u32 },
    Deleted,
}

/// Saves a catalog album: first save creates it with one listen, a repeat save
/// counts another listen.
pub fn save_album<R>(
    repo: &mut R,
    session: &SessionContext,
    album: &CatalogAlbum,
) -> Result<SaveOutcome, StoreError>
where
    R: CollectionRepository + ?Sized,
{
    let now = session.now().to_offset(UtcOffset::UTC);
    let record = album.to_record(now)?;
    if repo.get_album(session.user_id(), &record.id)?.is_some() {
        let listen_count = record_listen(repo, session, &record.id)?;
        return Ok(SaveOutcome::Incremented { listen_count });
    }

    repo.create_album(session.user_id(), &record)?;
    log::debug!("{} saved album {}", session.user_id(), record.id);
    Ok(SaveOutcome::Created)
}

/// Counts one more listen of a saved album and returns the new count.
///
/// `last_listened` never moves backwards: a session clock earlier than the
/// stored first or last listen keeps the latest stored instant.
pub fn record_listen<R>(
    repo: &mut R,
    session: &SessionContext,
    album_id: &str,
) -> Result<u32, StoreError>
where
    R: CollectionRepository + ?Sized,
{
    let existing = repo
        .get_album(session.user_id(), album_id)?
        .ok_or_else(|| StoreError::NotFound(album_id.to_string()))?;
    let listen_count = existing.listen_count.saturating_add(1);
    let now = session.now().to_offset(UtcOffset::UTC);
    let last_listened = existing
        .last_listened
        .into_iter()
        .chain(existing.first_listen)
        .fold(now, OffsetDateTime::max);
    if last_listened != now {
        log::debug!(
            "{album_id}: listen at {now} predates stored listens, keeping {last_listened}"
        );
    }
    repo.merge_album(
        session.user_id(),
        album_id,
        &AlbumPatch {
            listen_count: Some(listen_count),
            last_listened: Some(last_listened),
        },
    )?;
    log::debug!(
        "{} listened to {album_id} ({listen_count} listens)",
        session.user_id()
    );
    Ok(listen_count)
}

/// Takes back one listen. The album leaves the collection instead of being
/// kept with zero listens.
pub fn remove_listen<R>(
    repo: &mut R,
    session: &SessionContext,
    album_id: &str,
) -> Result<RemoveOutcome, StoreError>
where
    R: CollectionRepository + ?Sized,
{
    let existing = repo
        .get_album(session.user_id(), album_id)?
        .ok_or_else(|| StoreError::NotFound(album_id.to_string()))?;
    if existing.listen_count <= 1 {
        repo.delete_album(session.user_id(), album_id)?;
        log::debug!("{} removed album {album_id}", session.user_id());
        return Ok(RemoveOutcome::Deleted);
    }

    let listen_count = existing.listen_count - 1;
    repo.merge_album(
        session.user_id(),
        album_id,
        &AlbumPatch {
            listen_count: Some(listen_count),
            last_listened: None,
        },
    )?;
    Ok(RemoveOutcome::Decremented { listen_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MemoryCollection;
    use crate::error::RecordError;
    use time::macros::datetime;

    fn catalog_album(id: &str) -> CatalogAlbum {
        CatalogAlbum {
            id: id.to_string(),
            name: String::from("Currents"),
            artists: vec![String::from("Tame Impala")],
            total_tracks: 13,
            album_type: String::from("album"),
            release_date: String::from("2015-07-17"),
            image: None,
            link: format!("https://open.spotify.com/album/{id}"),
        }
    }

    #[test]
    fn first_save_creates_with_one_listen() {
        let mut repo = MemoryCollection::new();
        let session = SessionContext::new("uid", datetime!(2024-06-15 12:00 +01:00));

        let outcome = save_album(&mut repo, &session, &catalog_album("c")).expect("save");
        assert_eq!(outcome, SaveOutcome::Created);

        let stored = repo.get_album("uid", "c").expect("get").expect("present");
        assert_eq!(stored.listen_count, 1);
        assert_eq!(stored.first_listen, Some(datetime!(2024-06-15 11:00 UTC)));
        assert_eq!(stored.last_listened, stored.first_listen);
    }

    #[test]
    fn repeat_save_increments_and_keeps_first_listen() {
        let mut repo = MemoryCollection::new();
        let first = SessionContext::new("uid", datetime!(2024-06-01 09:00 UTC));
        let later = SessionContext::new("uid", datetime!(2024-06-15 21:00 UTC));

        save_album(&mut repo, &first, &catalog_album("c")).expect("save");
        let outcome = save_album(&mut repo, &later, &catalog_album("c")).expect("save again");
        assert_eq!(outcome, SaveOutcome::Incremented { listen_count: 2 });

        let stored = repo.get_album("uid", "c").expect("get").expect("present");
        assert_eq!(stored.first_listen, Some(datetime!(2024-06-01 09:00 UTC)));
        assert_eq!(stored.last_listened, Some(datetime!(2024-06-15 21:00 UTC)));
    }

    #[test]
    fn earlier_session_clock_keeps_listens_ordered() {
        let mut repo = MemoryCollection::new();
        let saved = SessionContext::new("uid", datetime!(2024-06-15 12:00 UTC));
        let earlier = SessionContext::new("uid", datetime!(2024-06-01 12:00 UTC));

        save_album(&mut repo, &saved, &catalog_album("c")).expect("save");
        assert_eq!(record_listen(&mut repo, &earlier, "c").expect("listen"), 2);

        let stored = repo.get_album("uid", "c").expect("get").expect("present");
        assert_eq!(stored.first_listen, Some(datetime!(2024-06-15 12:00 UTC)));
        assert_eq!(stored.last_listened, Some(datetime!(2024-06-15 12:00 UTC)));
        assert!(stored.first_listen <= stored.last_listened);
    }

    #[test]
    fn listening_to_unsaved_album_fails() {
        let mut repo = MemoryCollection::new();
        let session = SessionContext::new("uid", datetime!(2024-06-15 12:00 UTC));
        assert!(matches!(
            record_listen(&mut repo, &session, "ghost"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn removal_decrements_then_deletes() {
        let mut repo = MemoryCollection::new();
        let session = SessionContext::new("uid", datetime!(2024-06-15 12:00 UTC));
        save_album(&mut repo, &session, &catalog_album("c")).expect("save");
        record_listen(&mut repo, &session, "c").expect("listen");

        assert_eq!(
            remove_listen(&mut repo, &session, "c").expect("remove"),
            RemoveOutcome::Decremented { listen_count: 1 }
        );
        assert_eq!(
            remove_listen(&mut repo, &session, "c").expect("remove"),
            RemoveOutcome::Deleted
        );
        assert_eq!(repo.get_album("uid", "c").expect("get"), None);
        assert!(matches!(
            remove_listen(&mut repo, &session, "c"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn catalog_album_without_id_is_rejected() {
        let mut repo = MemoryCollection::new();
        let session = SessionContext::new("uid", datetime!(2024-06-15 12:00 UTC));
        let err = save_album(&mut repo, &session, &catalog_album(" ")).expect_err("no id");
        assert!(matches!(err, StoreError::Record(RecordError::MissingId)));
    }
}

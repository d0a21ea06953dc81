use crate::activity::{ListeningActivity, compute_activity};
use crate::milestones::{MilestoneLadders, MilestoneReport, evaluate_collection_milestones};
use crate::model::AlbumRecord;
use crate::session::SessionContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_RECENT_LIMIT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTotals {
    pub album_count: usize,
    pub listen_count: u64,
    /// Distinct `artists` strings; a joined multi-artist string counts once.
    pub unique_artist_count: usize,
    pub average_tracks: f64,
}

impl CollectionTotals {
    pub fn average_tracks_rounded(&self) -> u64 {
        self.average_tracks.round() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOptions {
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default)]
    pub milestones: MilestoneLadders,
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            milestones: MilestoneLadders::default(),
        }
    }
}

/// Everything the dashboard and stats views show, recomputed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats<'a> {
    pub totals: CollectionTotals,
    pub most_listened: Option<&'a AlbumRecord>,
    pub most_replayed: Option<&'a AlbumRecord>,
    pub recent: Vec<&'a AlbumRecord>,
    pub activity: ListeningActivity,
    pub milestones: MilestoneReport,
}

pub fn derive_stats<'a>(
    records: &'a [AlbumRecord],
    session: &SessionContext,
    options: &StatsOptions,
) -> DerivedStats<'a> {
    log::debug!(
        "deriving stats for {} over {} albums",
        session.user_id(),
        records.len()
    );
    DerivedStats {
        totals: compute_totals(records),
        most_listened: select_most_listened(records),
        most_replayed: select_most_replayed(records),
        recent: rank_by_recency(records, options.recent_limit),
        activity: compute_activity(records, session),
        milestones: evaluate_collection_milestones(records, session, &options.milestones),
    }
}

pub fn compute_totals(records: &[AlbumRecord]) -> CollectionTotals {
    let album_count = records.len();
    let listen_count = records
        .iter()
        .map(|record| u64::from(record.listen_count))
        .sum();
    let unique_artist_count = records
        .iter()
        .map(|record| record.artists.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_tracks: u64 = records
        .iter()
        .map(|record| u64::from(record.total_tracks))
        .sum();
    let average_tracks = if album_count == 0 {
        0.0
    } else {
        total_tracks as f64 / album_count as f64
    };

    CollectionTotals {
        album_count,
        listen_count,
        unique_artist_count,
        average_tracks,
    }
}

/// Most recently listened first, at most `limit` albums.
///
/// Albums never listened sort as if listened at the epoch. The sort is stable,
/// so albums listened within the same second keep their snapshot order.
pub fn rank_by_recency(records: &[AlbumRecord], limit: usize) -> Vec<&AlbumRecord> {
    let mut ranked: Vec<&AlbumRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.last_listened_seconds().cmp(&a.last_listened_seconds()));
    ranked.truncate(limit);
    ranked
}

pub fn select_most_listened(records: &[AlbumRecord]) -> Option<&AlbumRecord> {
    max_by_listen_count(records)
}

/// Same selection as [`select_most_listened`]; the stats page shows it as the
/// most replayed album.
pub fn select_most_replayed(records: &[AlbumRecord]) -> Option<&AlbumRecord> {
    max_by_listen_count(records)
}

// First-wins on ties: an album must strictly exceed the best count so far,
// starting from zero, so albums without listens are never picked.
fn max_by_listen_count(records: &[AlbumRecord]) -> Option<&AlbumRecord> {
    records
        .iter()
        .fold((0, None), |(best_count, best), record| {
            if record.listen_count > best_count {
                (record.listen_count, Some(record))
            } else {
                (best_count, best)
            }
        })
        .1
}

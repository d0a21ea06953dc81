use crate::model::AlbumRecord;
use crate::session::SessionContext;
use crate::stats::compute_totals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
}

impl BadgeTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub level: u64,
    pub tier: BadgeTier,
}

impl Milestone {
    pub const fn new(level: u64, tier: BadgeTier) -> Self {
        Self { level, tier }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeState {
    pub level: u64,
    pub tier: BadgeTier,
    pub unlocked: bool,
}

/// Threshold ladders for the three tracked metrics, each ascending by level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneLadders {
    #[serde(default = "default_count_ladder")]
    pub listens: Vec<Milestone>,
    #[serde(default = "default_count_ladder")]
    pub artists: Vec<Milestone>,
    #[serde(default = "default_discovery_ladder")]
    pub discovered: Vec<Milestone>,
}

fn default_count_ladder() -> Vec<Milestone> {
    vec![
        Milestone::new(10, BadgeTier::Bronze),
        Milestone::new(50, BadgeTier::Silver),
        Milestone::new(100, BadgeTier::Gold),
    ]
}

fn default_discovery_ladder() -> Vec<Milestone> {
    vec![
        Milestone::new(3, BadgeTier::Bronze),
        Milestone::new(5, BadgeTier::Silver),
        Milestone::new(10, BadgeTier::Gold),
    ]
}

impl Default for MilestoneLadders {
    fn default() -> Self {
        Self {
            listens: default_count_ladder(),
            artists: default_count_ladder(),
            discovered: default_discovery_ladder(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricBadges {
    pub value: u64,
    pub badges: Vec<BadgeState>,
}

impl MetricBadges {
    fn evaluate(value: u64, thresholds: &[Milestone]) -> Self {
        Self {
            value,
            badges: evaluate_milestones(value, thresholds),
        }
    }

    pub fn unlocked(&self) -> impl Iterator<Item = &BadgeState> {
        self.badges.iter().filter(|badge| badge.unlocked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneReport {
    pub total_listens: MetricBadges,
    pub unique_artists: MetricBadges,
    pub discovered_this_month: MetricBadges,
}

/// One badge per threshold, in threshold order.
pub fn evaluate_milestones(value: u64, thresholds: &[Milestone]) -> Vec<BadgeState> {
    thresholds
        .iter()
        .map(|milestone| BadgeState {
            level: milestone.level,
            tier: milestone.tier,
            unlocked: value >= milestone.level,
        })
        .collect()
}

pub fn is_strictly_ascending(thresholds: &[Milestone]) -> bool {
    thresholds.windows(2).all(|pair| pair[0].level < pair[1].level)
}

/// Albums first listened in the session's current calendar month, as seen
/// from the session's offset.
pub fn discovered_this_month(records: &[AlbumRecord], session: &SessionContext) -> usize {
    let now = session.now();
    records
        .iter()
        .filter_map(|record| record.first_listen)
        .map(|first| session.local(first))
        .filter(|first| first.month() == now.month() && first.year() == now.year())
        .count()
}

pub fn evaluate_collection_milestones(
    records: &[AlbumRecord],
    session: &SessionContext,
    ladders: &MilestoneLadders,
) -> MilestoneReport {
    let totals = compute_totals(records);
    let discovered = discovered_this_month(records, session);
    MilestoneReport {
        total_listens: MetricBadges::evaluate(totals.listen_count, &ladders.listens),
        unique_artists: MetricBadges::evaluate(
            totals.unique_artist_count as u64,
            &ladders.artists,
        ),
        discovered_this_month: MetricBadges::evaluate(discovered as u64, &ladders.discovered),
    }
}

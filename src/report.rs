use crate::activity::ListeningActivity;
use crate::milestones::{BadgeState, MetricBadges};
use crate::model::AlbumRecord;
use crate::session::SessionContext;
use crate::stats::DerivedStats;
use std::fmt::Write as _;
use time::OffsetDateTime;

pub const NO_DATA: &str = "No data";
pub const EMPTY_COLLECTION: &str = "No Data Yet";

const BADGE_ASSET_DIR: &str = "/images/badges";

pub fn most_active_day_label(activity: &ListeningActivity) -> String {
    activity
        .most_active_day
        .map(|busiest| format!("{} ({} listens)", busiest.day, busiest.listens))
        .unwrap_or_else(|| NO_DATA.to_string())
}

pub fn most_active_weekday_label(activity: &ListeningActivity) -> String {
    activity
        .most_active_weekday
        .map(|busiest| busiest.weekday.to_string())
        .unwrap_or_else(|| NO_DATA.to_string())
}

pub fn most_active_hour_label(activity: &ListeningActivity) -> String {
    activity
        .most_active_hour
        .map(|busiest| format!("{}:00", busiest.hour))
        .unwrap_or_else(|| NO_DATA.to_string())
}

pub fn streak_label(days: u32) -> String {
    format!("{days} day(s)")
}

/// One decimal place.
pub fn average_label(value: f64) -> String {
    format!("{value:.1}")
}

/// `dd/mm/yyyy` on the viewer's wall clock.
pub fn listen_date_label(at: Option<OffsetDateTime>, session: &SessionContext) -> String {
    let Some(at) = at else {
        return NO_DATA.to_string();
    };
    let local = session.local(at);
    format!(
        "{:02}/{:02}/{}",
        local.day(),
        u8::from(local.month()),
        local.year()
    )
}

pub fn listening_range_label(activity: &ListeningActivity, session: &SessionContext) -> String {
    format!(
        "{} → {}",
        listen_date_label(activity.first_listen, session),
        listen_date_label(activity.last_listen, session)
    )
}

pub fn album_plays_label(album: Option<&AlbumRecord>) -> String {
    match album {
        Some(album) => format!("{} ({} plays)", album.name, album.listen_count),
        None => format!("{NO_DATA} (0 plays)"),
    }
}

pub fn badge_asset(badge: &BadgeState) -> String {
    if badge.unlocked {
        format!("{BADGE_ASSET_DIR}/{}{}.png", badge.level, badge.tier.label())
    } else {
        format!("{BADGE_ASSET_DIR}/nullbadge.png")
    }
}

fn badge_row(metric: &MetricBadges) -> String {
    let badges: Vec<String> = metric
        .badges
        .iter()
        .map(|badge| {
            let mark = if badge.unlocked { "*" } else { "-" };
            format!("[{mark} {} {}]", badge.level, badge.tier.label())
        })
        .collect();
    format!("{} {}", metric.value, badges.join(" "))
}

/// Plain-text rendering of every view, in dashboard then stats page order.
pub fn render_report(stats: &DerivedStats<'_>, session: &SessionContext) -> String {
    if stats.totals.album_count == 0 {
        return format!("{EMPTY_COLLECTION}\n");
    }

    let mut out = String::new();
    let totals = &stats.totals;
    let activity = &stats.activity;

    let _ = writeln!(out, "Collection");
    let _ = writeln!(out, "  Albums:               {}", totals.album_count);
    let _ = writeln!(out, "  Listens:              {}", totals.listen_count);
    let _ = writeln!(out, "  Artists:              {}", totals.unique_artist_count);
    let _ = writeln!(out, "  Average tracks:       {}", totals.average_tracks_rounded());
    let _ = writeln!(
        out,
        "  Most listened:        {}",
        album_plays_label(stats.most_listened)
    );
    let _ = writeln!(
        out,
        "  Most replayed:        {}",
        album_plays_label(stats.most_replayed)
    );

    let _ = writeln!(out, "\nRecently listened");
    for (rank, album) in stats.recent.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {} - {} ({})",
            rank + 1,
            album.name,
            album.artists,
            listen_date_label(album.last_listened, session)
        );
    }

    let _ = writeln!(out, "\nListening activity");
    let _ = writeln!(out, "  Most active day:      {}", most_active_day_label(activity));
    let _ = writeln!(
        out,
        "  Most active weekday:  {}",
        most_active_weekday_label(activity)
    );
    let _ = writeln!(
        out,
        "  Longest streak:       {}",
        streak_label(activity.longest_streak)
    );
    let _ = writeln!(
        out,
        "  Listens per day:      {}",
        average_label(activity.average_listens_per_day)
    );
    let _ = writeln!(out, "  Most active hour:     {}", most_active_hour_label(activity));
    let _ = writeln!(
        out,
        "  Listening range:      {}",
        listening_range_label(activity, session)
    );

    let milestones = &stats.milestones;
    let _ = writeln!(out, "\nMilestones");
    let _ = writeln!(out, "  Listens:              {}", badge_row(&milestones.total_listens));
    let _ = writeln!(out, "  Artists:              {}", badge_row(&milestones.unique_artists));
    let _ = writeln!(
        out,
        "  Discovered this month: {}",
        badge_row(&milestones.discovered_this_month)
    );
    out
}

#![no_main]

use albumlog::collection::decode_snapshot;
use albumlog::report::render_report;
use albumlog::session::SessionContext;
use albumlog::stats::{StatsOptions, derive_stats};
use libfuzzer_sys::fuzz_target;
use time::OffsetDateTime;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = decode_snapshot(raw) else {
        return;
    };

    let now = OffsetDateTime::from_unix_timestamp(1_718_452_800).expect("fixed instant");
    let session = SessionContext::new("fuzz", now);
    let options = StatsOptions {
        recent_limit: records.len() / 2,
        ..StatsOptions::default()
    };
    let stats = derive_stats(&records, &session, &options);

    assert_eq!(stats.totals.album_count, records.len());
    assert!(stats.recent.len() <= options.recent_limit);
    assert!((stats.activity.longest_streak as usize) <= stats.activity.active_days);
    let _ = render_report(&stats, &session);
});

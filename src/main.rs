use albumlog::actions::{self, RemoveOutcome, SaveOutcome};
use albumlog::collection::{CollectionRepository, JsonCollectionStore, decode_snapshot};
use albumlog::config::{self, Settings};
use albumlog::model::{AlbumRecord, CatalogAlbum};
use albumlog::report;
use albumlog::session::SessionContext;
use albumlog::stats::derive_stats;
use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug)]
enum Command {
    Report,
    Stats(PathBuf),
    Save(PathBuf),
    Listen(String),
    Remove(String),
}

#[derive(Debug, Default)]
struct CliArgs {
    user: Option<String>,
    now: Option<OffsetDateTime>,
    json: bool,
    command: Option<Command>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = parse_args(std::env::args().skip(1).collect())?;
    let settings = config::load_settings()?;
    let command = args.command.take().unwrap_or(Command::Report);

    match command {
        Command::Stats(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read snapshot {}", path.display()))?;
            let records = decode_snapshot(&raw)
                .with_context(|| format!("invalid snapshot {}", path.display()))?;
            let user = args.user.unwrap_or_else(|| String::from("snapshot"));
            let session = session_for(user, args.now);
            print_stats(&records, &session, &settings, args.json)?;
        }
        Command::Report => {
            let (session, store) = open_collection(&args, &settings)?;
            let records = store
                .list_albums(session.user_id())
                .with_context(|| format!("failed to load {}", store.path().display()))?;
            print_stats(&records, &session, &settings, args.json)?;
        }
        Command::Save(path) => {
            let (session, mut store) = open_collection(&args, &settings)?;
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read album {}", path.display()))?;
            let album: CatalogAlbum = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse album {}", path.display()))?;
            match actions::save_album(&mut store, &session, &album)? {
                SaveOutcome::Created => println!("Saved {}", album.name),
                SaveOutcome::Incremented { listen_count } => {
                    println!("Listened to {} {listen_count} times", album.name);
                }
            }
        }
        Command::Listen(album_id) => {
            let (session, mut store) = open_collection(&args, &settings)?;
            let listen_count = actions::record_listen(&mut store, &session, &album_id)?;
            println!("Listened to {album_id} {listen_count} times");
        }
        Command::Remove(album_id) => {
            let (session, mut store) = open_collection(&args, &settings)?;
            match actions::remove_listen(&mut store, &session, &album_id)? {
                RemoveOutcome::Decremented { listen_count } => {
                    println!("{album_id} now has {listen_count} listens");
                }
                RemoveOutcome::Deleted => println!("Removed {album_id} from the collection"),
            }
        }
    }
    Ok(())
}

fn open_collection(
    args: &CliArgs,
    settings: &Settings,
) -> anyhow::Result<(SessionContext, JsonCollectionStore)> {
    let user = args
        .user
        .clone()
        .or_else(|| settings.user_id.clone())
        .filter(|user| !user.trim().is_empty())
        .context("no user selected: pass --user or set userId in settings.json")?;
    let store = JsonCollectionStore::new(config::collection_path()?);
    Ok((session_for(user, args.now), store))
}

fn session_for(user: String, now: Option<OffsetDateTime>) -> SessionContext {
    match now {
        Some(now) => SessionContext::new(user, now),
        None => SessionContext::at_current_time(user),
    }
}

fn print_stats(
    records: &[AlbumRecord],
    session: &SessionContext,
    settings: &Settings,
    json: bool,
) -> anyhow::Result<()> {
    let stats = derive_stats(records, session, &settings.stats);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", report::render_report(&stats, session));
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--user" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--user requires a user id");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--user cannot be empty");
                }
                out.user = Some(value.trim().to_string());
            }
            "--now" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--now requires an RFC 3339 timestamp");
                };
                let now = OffsetDateTime::parse(value, &Rfc3339)
                    .with_context(|| format!("--now {value} is not an RFC 3339 timestamp"))?;
                out.now = Some(now);
            }
            "--json" => out.json = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if out.command.is_none() => {
                out.command = Some(match other {
                    "report" => Command::Report,
                    "stats" | "save" | "listen" | "remove" => {
                        index += 1;
                        let Some(value) = args.get(index) else {
                            anyhow::bail!("{other} requires an argument");
                        };
                        match other {
                            "stats" => Command::Stats(PathBuf::from(value)),
                            "save" => Command::Save(PathBuf::from(value)),
                            "listen" => Command::Listen(value.clone()),
                            _ => Command::Remove(value.clone()),
                        }
                    }
                    _ => anyhow::bail!("unknown command {other}"),
                });
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("albumlog");
    println!("  report                 Show collection statistics (default)");
    println!("  stats <snapshot.json>  Show statistics for a JSON array of albums");
    println!("  save <album.json>      Save a catalog album, or count another listen");
    println!("  listen <album id>      Count another listen of a saved album");
    println!("  remove <album id>      Take back one listen; removes the album at zero");
    println!("  --user <uid>           Collection owner (defaults to userId in settings)");
    println!("  --now <rfc3339>        Reference time for time-based statistics");
    println!("  --json                 Print statistics as JSON");
}

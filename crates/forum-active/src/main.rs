use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::signal::unix as unix_signal;

use forum_model::{clock::Clock, RankedUserList};
use forum_rank::{memory::MemoryForum, ActiveUserRanker};

mod cache;
mod config;
mod snapshot;

type Ranker = ActiveUserRanker<MemoryForum, cache::FsCache>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum Mode {
    Show,
    Refresh,
    Watch,
}

#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    #[clap(short, long, env = "ACTIVE_USERS_CONFIG", default_value = "./active-users.toml")]
    config: PathBuf,
    #[clap(short, long, env = "FORUM_DATA", default_value = "./.forum")]
    data: PathBuf,
    #[clap(long, env = "ACTIVE_USERS_CACHE", default_value = "./.cache")]
    cache: PathBuf,
    #[clap(short, long, default_value = "show")]
    mode: Mode,
}

fn print_users(users: &RankedUserList) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(users)?);
    Ok(())
}

async fn refresh_once(ranker: &Ranker, data_dir: &Path) -> eyre::Result<RankedUserList> {
    let snapshot = snapshot::load_snapshot(data_dir).await?;
    ranker.store().replace(snapshot);
    let users = ranker.recalculate_and_cache().await?;
    Ok(users)
}

async fn watch(ranker: &Ranker, data_dir: &Path, interval: std::time::Duration) -> eyre::Result<()> {
    let mut sigterm = unix_signal::signal(unix_signal::SignalKind::terminate())?;
    let mut sigint = unix_signal::signal(unix_signal::SignalKind::interrupt())?;
    let mut sigquit = unix_signal::signal(unix_signal::SignalKind::quit())?;

    let sigterm = sigterm.recv();
    tokio::pin!(sigterm);
    let sigint = sigint.recv();
    tokio::pin!(sigint);
    let sigquit = sigquit.recv();
    tokio::pin!(sigquit);
    let mut sig = futures_util::future::select_all([sigterm, sigint, sigquit]);

    let mut timer = tokio::time::interval(interval);
    log::info!("Started refresh loop, every {} second(s)", interval.as_secs());
    loop {
        tokio::select! {
            _ = timer.tick() => {},
            _ = &mut sig => {
                log::info!("Stopping refresh loop");
                break;
            },
        }

        log::trace!("Running refresh at {}", ranker.clock().now());
        if let Err(e) = refresh_once(ranker, data_dir).await {
            log::error!("Refresh failed: {}", e);
            sentry::capture_error(AsRef::<dyn std::error::Error + 'static>::as_ref(&e));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let Args {
        config: config_path,
        data: data_dir,
        cache: cache_dir,
        mode,
    } = Args::parse();

    env_logger::init();
    let _sentry = sentry::init((
        std::env::var_os("SENTRY_DSN"),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let config = config::AppConfig::from_config(&config_path).await?;
    let interval = config.refresh_interval();
    log::debug!("Ranker config: {:?}", config.ranker());

    tokio::fs::create_dir_all(&cache_dir).await?;
    let cache = cache::FsCache::new(&cache_dir);
    let forum = MemoryForum::from_snapshot(snapshot::load_snapshot(&data_dir).await?);
    log::info!("Running in {} mode, caching under {}", mode, cache.root().display());
    let ranker = ActiveUserRanker::new(config.into_ranker(), forum, cache);

    match mode {
        Mode::Show => {
            let users = ranker.get_active_users().await?;
            print_users(&users)?;
        }
        Mode::Refresh => {
            let users = ranker.recalculate_and_cache().await?;
            print_users(&users)?;
        }
        Mode::Watch => watch(&ranker, &data_dir, interval).await?,
    }
    Ok(())
}

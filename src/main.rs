// src/main.rs
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion2site::api::NotionHttpClient;
use notion2site::assets::{sync_file_blocks, HttpAssetStore};
use notion2site::cache::{BuildPaths, Staleness};
use notion2site::config::{BuildConfig, CommandLineInput};
use notion2site::context::BuildContext;
use notion2site::html::{cache_block_html, enhance_feed, render_feed};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const LOG_FILE: &str = "notion2site.log";

/// Sets up logging configuration.
fn setup_logging(verbose: bool, log_dir: &Path) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fs::create_dir_all(log_dir)?;
    let log_file_path = log_dir.join(LOG_FILE);

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {M} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// One full build: content, backlinks, assets, feed and, on request, the
/// passes over the rendered site.
async fn execute_build(config: &BuildConfig) -> anyhow::Result<()> {
    let started = Utc::now();
    let paths = config.paths();
    paths.ensure_all().await?;

    let last_build = if config.fresh {
        None
    } else {
        paths.read_last_build_time().await?
    };
    match last_build {
        Some(at) => log::info!("Previous build started at {}", at),
        None => log::info!("No previous build, refreshing everything"),
    }
    let staleness = Staleness::new(last_build);

    let client = Arc::new(NotionHttpClient::new(&config.api_key)?);
    let ctx = BuildContext::new(client, config.database_id.clone(), paths.clone(), staleness)
        .with_options(config.normalize_options())
        .with_links(config.links());

    let entries = ctx
        .all_entries()
        .await
        .context("querying the content database")?;
    log::info!("{} published entries", entries.len());

    let assets = HttpAssetStore::new(paths.public_notion())?;
    let mut references = Vec::with_capacity(entries.len());
    for entry in entries {
        let content = ctx
            .page_content(entry)
            .await
            .with_context(|| format!("fetching content of '{}'", entry.slug))?;
        sync_file_blocks(&ctx, &assets, &content.blocks).await;
        references.push((entry.page_id.clone(), content.references));
    }

    let backlinks = ctx.rebuild_backlinks(&references).await?;
    log::info!("Backlinks written for {} entries", backlinks.len());

    if config.site_url.is_empty() {
        log::warn!("No --site-url given, skipping the feed");
    } else {
        render_feed(&ctx, &config.dist, &config.feed_settings()).await?;
    }

    if config.post_process {
        post_process(&ctx, config, &paths, &staleness).await?;
    }

    paths.record_build_start(started).await?;
    if !config.keep_buildcache {
        paths.clear_buildcache().await?;
    }
    log::info!("Build finished in {}s", (Utc::now() - started).num_seconds());
    Ok(())
}

async fn post_process(
    ctx: &BuildContext,
    config: &BuildConfig,
    paths: &BuildPaths,
    staleness: &Staleness,
) -> anyhow::Result<()> {
    cache_block_html(ctx, &config.dist).await?;
    if config.dist.join("rss.xml").exists() {
        enhance_feed(paths, &config.dist, staleness, &config.base_path).await?;
    } else {
        log::warn!("No feed in {}, skipping feed enhancement", config.dist.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose, &BuildPaths::new(&cli.root).tmp())?;

    let config = BuildConfig::resolve(cli)?;

    execute_build(&config).await
}

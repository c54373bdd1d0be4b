// src/config.rs
use crate::cache::BuildPaths;
use crate::constants::{HOME_PAGE_SLUG, MENU_PAGES_COLLECTION};
use crate::error::AppError;
use crate::html::FeedSettings;
use crate::links::LinkBuilder;
use crate::normalize::NormalizeOptions;
use crate::types::{ApiKey, DatabaseId};
use clap::Parser;
use std::path::PathBuf;

const API_SECRET_VAR: &str = "NOTION_API_SECRET";
const DATABASE_ID_VAR: &str = "DATABASE_ID";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Project root holding buildcache/, tmp/ and public/
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Rendered site output, relative to the root
    #[arg(long, default_value = "dist")]
    pub dist: PathBuf,

    /// Content database ID (falls back to the DATABASE_ID environment variable)
    #[arg(long)]
    pub database_id: Option<String>,

    /// Path the site is served under
    #[arg(long, default_value = "/")]
    pub base_path: String,

    /// Absolute site origin used in the feed, e.g. https://example.com
    #[arg(long, default_value = "")]
    pub site_url: String,

    /// Author named on feed items
    #[arg(long)]
    pub author: Option<String>,

    /// Collection whose entries are menu pages instead of posts
    #[arg(long, default_value = MENU_PAGES_COLLECTION)]
    pub menu_collection: String,

    /// Slug of the menu page served at the site root
    #[arg(long, default_value = HOME_PAGE_SLUG)]
    pub home_slug: String,

    /// Point hosted images at their .webp variants
    #[arg(long, default_value_t = false)]
    pub optimize_images: bool,

    /// Run the block-HTML and feed passes over an existing rendered site
    #[arg(long, default_value_t = false)]
    pub post_process: bool,

    /// Keep the per-build cache when the build finishes
    #[arg(long, default_value_t = false)]
    pub keep_buildcache: bool,

    /// Ignore the previous build time and treat everything as changed
    #[arg(long, default_value_t = false)]
    pub fresh: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved build configuration, validated and ready to drive a build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub api_key: ApiKey,
    pub database_id: DatabaseId,
    pub root: PathBuf,
    pub dist: PathBuf,
    pub base_path: String,
    pub site_url: String,
    pub author: Option<String>,
    pub menu_collection: String,
    pub home_slug: String,
    pub optimize_images: bool,
    pub post_process: bool,
    pub keep_buildcache: bool,
    pub fresh: bool,
    pub verbose: bool,
}

impl BuildConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let api_key_str = std::env::var(API_SECRET_VAR).map_err(|_| {
            AppError::MissingConfiguration(format!("{} environment variable not set", API_SECRET_VAR))
        })?;
        let api_key = ApiKey::new(api_key_str)?;

        let raw_database_id = match cli.database_id {
            Some(id) => id,
            None => std::env::var(DATABASE_ID_VAR).map_err(|_| {
                AppError::MissingConfiguration(format!(
                    "--database-id not given and {} not set",
                    DATABASE_ID_VAR
                ))
            })?,
        };
        let database_id = DatabaseId::parse(&raw_database_id)?;

        let dist = if cli.dist.is_absolute() {
            cli.dist
        } else {
            cli.root.join(cli.dist)
        };

        Ok(BuildConfig {
            api_key,
            database_id,
            root: cli.root,
            dist,
            base_path: cli.base_path,
            site_url: cli.site_url,
            author: cli.author,
            menu_collection: cli.menu_collection,
            home_slug: cli.home_slug,
            optimize_images: cli.optimize_images,
            post_process: cli.post_process,
            keep_buildcache: cli.keep_buildcache,
            fresh: cli.fresh,
            verbose: cli.verbose,
        })
    }

    pub fn paths(&self) -> BuildPaths {
        BuildPaths::new(&self.root)
    }

    pub fn links(&self) -> LinkBuilder {
        LinkBuilder::new(&self.base_path, &self.menu_collection, &self.home_slug)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            optimize_images: self.optimize_images,
        }
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            site_url: self.site_url.clone(),
            author: self.author.clone(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::new("secret_default_key_for_testing_only")
                .expect("Default API key should be valid"),
            database_id: DatabaseId::parse("12345678123456781234567812345678")
                .expect("Example database ID should always be valid"),
            root: PathBuf::from("."),
            dist: PathBuf::from("dist"),
            base_path: "/".to_string(),
            site_url: String::new(),
            author: None,
            menu_collection: MENU_PAGES_COLLECTION.to_string(),
            home_slug: HOME_PAGE_SLUG.to_string(),
            optimize_images: false,
            post_process: false,
            keep_buildcache: false,
            fresh: false,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_have_site_defaults() {
        let cli = CommandLineInput::parse_from(["notion2site"]);
        assert_eq!(cli.dist, PathBuf::from("dist"));
        assert_eq!(cli.base_path, "/");
        assert_eq!(cli.menu_collection, "main");
        assert_eq!(cli.home_slug, "home");
        assert!(!cli.optimize_images && !cli.post_process && !cli.fresh);
    }

    #[test]
    fn derived_settings_follow_the_config() {
        let config = BuildConfig {
            base_path: "/blog/".to_string(),
            optimize_images: true,
            site_url: "https://example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.links().base_path(), "/blog/");
        assert!(config.normalize_options().optimize_images);
        assert_eq!(config.feed_settings().site_url, "https://example.com");
    }
}

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use curriculum::config::{DEFAULT_CONTENT_DIR, DEFAULT_CURRICULUM_DOCUMENT, DEFAULT_LESSON_PATTERN};
use curriculum::{CachePolicy, ContentConfig};

/// Curriculum: serve lesson content, practice queries and interaction logs
#[derive(Parser)]
#[command(name = "curriculum")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        #[command(flatten)]
        content: ContentArgs,

        /// Address to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port for the web server
        #[arg(short, long, env = "PORT", default_value = "8000")]
        port: u16,

        /// When to rebuild content from disk: 'rebuild' (every request) or 'cached'
        #[arg(long, env = "CACHE_POLICY", default_value = "rebuild")]
        cache_policy: CachePolicy,

        /// Allowed CORS origins, comma separated (empty allows any origin)
        #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,

        /// Directory for interaction logs
        #[arg(long, env = "LOG_DIR", default_value = "logs")]
        log_dir: PathBuf,
    },

    /// Load the content once and report consistency problems
    Check {
        #[command(flatten)]
        content: ContentArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error if any problem is found
        #[arg(long)]
        strict: bool,
    },
}

/// Where the content documents live.
#[derive(Args, Debug, Clone)]
pub struct ContentArgs {
    /// Directory holding content documents
    #[arg(long, env = "CONTENT_DIR", default_value = DEFAULT_CONTENT_DIR)]
    pub content_dir: PathBuf,

    /// Document holding domains and clusters
    #[arg(long, env = "CURRICULUM_DOCUMENT", default_value = DEFAULT_CURRICULUM_DOCUMENT)]
    pub curriculum: String,

    /// Glob selecting lesson documents
    #[arg(long, env = "LESSON_PATTERN", default_value = DEFAULT_LESSON_PATTERN)]
    pub lesson_pattern: String,
}

impl ContentArgs {
    pub fn to_config(&self, cache_policy: CachePolicy) -> ContentConfig {
        ContentConfig::new(&self.content_dir)
            .with_curriculum_document(&self.curriculum)
            .with_lesson_pattern(&self.lesson_pattern)
            .with_cache_policy(cache_policy)
    }
}

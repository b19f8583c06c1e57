use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the preferences file (defaults to $BINJR_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Connect to this source URL instead of the configured one
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Time zone of the source when --url is given (e.g. "Europe/Paris")
    #[arg(long, global = true, default_value = "UTC")]
    pub zone: String,

    /// Adapter key
    #[arg(short, long, global = true, default_value = "jrds")]
    pub adapter: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered data adapters
    Adapters,

    /// Print the source catalogue
    Tree {
        /// Catalogue view (e.g. hoststab, tagstab, filtertab, servicestab, viewstab);
        /// defaults to the adapter's configured view
        #[arg(long)]
        filter: Option<String>,

        /// Also fetch the leaves of every lazily loaded branch
        #[arg(long)]
        expand: bool,
    },

    /// Download, parse and print the series of one path as CSV
    Fetch {
        /// Path (graph id) to fetch
        #[arg(long)]
        path: String,

        /// Start datetime in RFC 3339 format (e.g. "2025-01-01T09:30:00Z")
        #[arg(long, requires = "end", conflicts_with = "last")]
        begin: Option<String>,

        /// End datetime in RFC 3339 format
        #[arg(short, long, requires = "begin")]
        end: Option<String>,

        /// Fetch the last N minutes instead of an explicit interval
        #[arg(long, default_value = "60")]
        last: i64,

        /// Down-sample every series to at most this many points
        #[arg(long)]
        reduce: Option<usize>,
    },
}

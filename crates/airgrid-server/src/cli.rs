//! The server's configuration surface: a `clap`-derived `Options` struct
//! parsed once at process start, the same way the teacher binary's own
//! `Options` is the sole source of configuration (`SPEC_FULL.md` §4.11).

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "airgrid-server",
    version,
    about = "Generate, serve and route the airgrid hierarchical airspace grid"
)]
pub struct Options {
    /// Activate verbose (debug-level) logging.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Address to bind the HTTP surface to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: Ipv4Addr,

    /// Port to bind the HTTP surface to.
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Optional JSON file to `import_json` on startup.
    #[arg(short, long)]
    pub import: Option<PathBuf>,

    /// Cap on the number of conflict triples retained by a single
    /// `/detect_conflicts` call.
    #[arg(long, default_value_t = airgrid::conflict::DEFAULT_MAX_TRIPLES)]
    pub max_triples: usize,
}

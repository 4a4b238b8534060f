//! CLI surface (spec.md §4.6): one flag per source plus `--all`, `--dedup`,
//! `--link`, `--schedule`, `--download`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "welldex", about = "Well/operator/production ingestion orchestrator")]
pub struct Cli {
    /// Run every registered source.
    #[arg(long)]
    pub all: bool,

    #[arg(long)]
    pub tx_rrc: bool,
    #[arg(long)]
    pub ok_occ: bool,
    #[arg(long)]
    pub nm_ocd: bool,
    #[arg(long)]
    pub co_cogcc: bool,
    #[arg(long)]
    pub la_ldnr: bool,
    #[arg(long)]
    pub nd_ndic: bool,

    /// Run the deduplicator after any requested source loads complete.
    #[arg(long)]
    pub dedup: bool,

    /// Run the linker (implies running after dedup, if also requested).
    #[arg(long)]
    pub link: bool,

    /// Start the long-running cron-driven scheduler instead of a one-shot run.
    #[arg(long)]
    pub schedule: bool,

    /// Pass-through to adapters: reuse a staged file from a previous run
    /// instead of actually performing the download.
    #[arg(long = "no-download", action = clap::ArgAction::SetFalse)]
    pub download: bool,

    /// Path to the scheduler's per-source state file.
    #[arg(long, default_value = "./welldex_state.json")]
    pub state_file: String,

    /// Internal: re-exec entrypoint for a single source, run as its own
    /// process so a crash in one adapter cannot taint shared process state.
    #[arg(long, hide = true)]
    pub run_source: Option<String>,
}

impl Cli {
    pub fn requested_sources(&self) -> Vec<&'static str> {
        if self.all {
            return welldex_adapters::all_sources().iter().map(|s| s.source_tag()).collect();
        }
        let mut tags = Vec::new();
        if self.tx_rrc {
            tags.push("tx_rrc");
        }
        if self.ok_occ {
            tags.push("ok_occ");
        }
        if self.nm_ocd {
            tags.push("nm_ocd");
        }
        if self.co_cogcc {
            tags.push("co_cogcc");
        }
        if self.la_ldnr {
            tags.push("la_ldnr");
        }
        if self.nd_ndic {
            tags.push("nd_ndic");
        }
        tags
    }
}

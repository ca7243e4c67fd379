use clap::Parser;
use task_symmetry::bench::{Benchmark, Config, GroupSpec};
use tracing_subscriber::EnvFilter;

/// Benchmark for symmetry reduction of task allocations. Enumerates all allocations of the
/// configured number of tasks onto the points of each group and reduces them to orbit
/// representatives. Set RUST_LOG=debug to trace group construction.
#[derive(Clone, Debug, Parser, PartialEq)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Groups like 'sym:4', 'dih:6', 'ring:8' or wreath products like 'sym:3~cyc:2'.
    #[arg(required = true)]
    groups: Vec<GroupSpec>,

    #[command(flatten)]
    config: Config,
}

fn main() -> task_symmetry::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();
    Benchmark { groups: args.groups, config: args.config }.timed_run()
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use log::info;

use fbsim_graph::read_triple_graph_from_file;
use fbsim_reduction::full_forward_bisimulation;
use fbsim_utilities::FbsimError;
use fbsim_utilities::LargeFormatter;
use fbsim_utilities::Timing;

mod verbosity;

use verbosity::VerbosityFlag;

#[derive(clap::Parser, Debug)]
#[command(
    about = "A command line tool for k-forward bisimulation of edge-labelled graphs",
    version,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    verbosity: VerbosityFlag,

    #[command(subcommand)]
    commands: Option<Commands>,

    #[arg(long, global = true, help = "Print the time spent in the different phases")]
    timings: bool,
}

/// Defines the subcommands for this tool.
#[derive(Debug, Subcommand)]
enum Commands {
    Info(InfoArgs),
    Partition(PartitionArgs),
}

#[derive(clap::Args, Debug)]
#[command(about = "Prints information about the given graph")]
struct InfoArgs {
    /// The graph in the binary triple format.
    filename: PathBuf,
}

#[derive(clap::Args, Debug)]
#[command(about = "Computes the forward bisimulation partition of the given graph")]
struct PartitionArgs {
    /// The graph in the binary triple format.
    filename: PathBuf,

    #[arg(
        long,
        default_value_t = 0,
        help = "Skip refining blocks with fewer nodes than this threshold"
    )]
    min_support: u64,
}

fn main() -> Result<ExitCode, FbsimError> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    let mut timing = Timing::new();

    if let Some(command) = &cli.commands {
        match command {
            Commands::Info(args) => {
                handle_info(args, &mut timing)?;
            }
            Commands::Partition(args) => {
                handle_partition(args, &mut timing)?;
            }
        }
    }

    if cli.timings {
        timing.print();
    }

    Ok(ExitCode::SUCCESS)
}

/// Display information about the given graph.
fn handle_info(args: &InfoArgs, timing: &mut Timing) -> Result<(), FbsimError> {
    let graph = load_graph(&args.filename, timing)?;

    println!(
        "Graph has {} nodes and {} edges.",
        LargeFormatter(graph.num_of_nodes()),
        LargeFormatter(graph.num_of_edges())
    );

    Ok(())
}

/// Run the refinement to its fixed point and report the per-step counts.
fn handle_partition(args: &PartitionArgs, timing: &mut Timing) -> Result<(), FbsimError> {
    let graph = load_graph(&args.filename, timing)?;
    info!(
        "Graph has {} nodes and {} edges.",
        LargeFormatter(graph.num_of_nodes()),
        LargeFormatter(graph.num_of_edges())
    );

    let (counts, outcome) = full_forward_bisimulation(&graph, args.min_support, timing);

    for (step, count) in counts.iter().enumerate() {
        println!(
            "k={}: {} blocks, {} singletons",
            step + 1,
            LargeFormatter(count.blocks),
            LargeFormatter(count.singletons)
        );
    }

    println!(
        "Fixed point after {} steps: {} classes ({} blocks, {} singletons).",
        counts.len() - 1,
        LargeFormatter(outcome.total_class_count()),
        LargeFormatter(outcome.live_block_count()),
        LargeFormatter(outcome.singleton_count())
    );

    Ok(())
}

fn load_graph(filename: &PathBuf, timing: &mut Timing) -> Result<fbsim_graph::Graph, FbsimError> {
    let mut timer = timing.start("load graph");
    let graph = read_triple_graph_from_file(filename)?;
    timer.finish();

    Ok(graph)
}

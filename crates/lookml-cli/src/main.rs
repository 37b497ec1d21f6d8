use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

use lookml_core::Config;
use lookml_graph::{GraphAnimator, LookmlGrapher};
use lookml_lint::LookmlLinter;
use lookml_update::LookmlModifier;

#[derive(Parser)]
#[command(
    name = "lookml-tools",
    version,
    author,
    about = "LookML developer tools - linter, grapher, animator, and description updater"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Custom input glob, can be given multiple times"
    )]
    glob: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the style and structure linter")]
    Lint {
        #[arg(default_value = ".", help = "Directory of LookML files to lint")]
        directory: PathBuf,
    },

    #[command(about = "Render the model/explore/view dependency graph")]
    Graph {
        #[arg(default_value = ".", help = "Directory of LookML files to graph")]
        directory: PathBuf,

        #[arg(short, long, help = "Output image path")]
        output: Option<PathBuf>,

        #[arg(long, help = "Graph title")]
        title: Option<String>,
    },

    #[command(about = "Build a GIF of the graph's evolution across git history")]
    Animate {
        #[arg(long, help = "Path to the git repository")]
        repo: PathBuf,

        #[arg(long, help = "Branch to walk", default_value = "master")]
        branch: String,

        #[arg(long, help = "Directory for the rendered frames")]
        image_dir: PathBuf,

        #[arg(long, help = "Output GIF path")]
        gif: PathBuf,
    },

    #[command(about = "Inject or refresh field descriptions from the definitions source")]
    Update {
        #[arg(long, required = true, help = "Input LookML file")]
        infile: PathBuf,

        #[arg(long, required = true, help = "Output LookML file")]
        outfile: PathBuf,
    },

    #[command(name = "git-clone", about = "Clone the configured LookML repository")]
    GitClone,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if !cli.glob.is_empty() {
        config.infile_globs = cli.glob.clone();
    }

    match cli.command {
        Commands::Lint { directory } => {
            let linter = LookmlLinter::new(config.linter)?;
            let report = linter.run(&directory, &config.infile_globs)?;
            let failures = report.failures();
            if failures > 0 {
                println!(
                    "{} {} finding(s) failed, see reports",
                    "lint:".yellow().bold(),
                    failures
                );
            } else {
                println!("{} all checks passed", "lint:".green().bold());
            }
        }
        Commands::Graph {
            directory,
            output,
            title,
        } => {
            if let Some(output) = output {
                config.grapher.output = output;
            }
            if title.is_some() {
                config.grapher.title = title;
            }
            let mut grapher = LookmlGrapher::new(config.grapher);
            grapher.run(&directory, &config.infile_globs)?;
        }
        Commands::Animate {
            repo,
            branch,
            image_dir,
            gif,
        } => {
            let animator = GraphAnimator::new(config.grapher);
            animator.create_gif(&repo, &branch, &image_dir, &gif)?;
        }
        Commands::Update { infile, outfile } => {
            let modifier = LookmlModifier::new(config.updater)?;
            modifier.modify(&infile, &outfile)?;
            info!(
                "Updated {} -> {}",
                infile.display(),
                outfile.display()
            );
        }
        Commands::GitClone => {
            if config.git.url.is_empty() {
                bail!("git.url is not configured");
            }
            info!("Cloning {} into {}", config.git.url, config.git.folder.display());
            git2::Repository::clone(&config.git.url, &config.git.folder)
                .with_context(|| format!("cloning {}", config.git.url))?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

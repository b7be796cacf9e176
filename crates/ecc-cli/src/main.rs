mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use ecc_core::preserve::PreservationRule;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ecc",
    about = "Merge the everything-claude-code bundle into an existing Claude configuration",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output merge results as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the bundle's hooks into settings.json and its MCP servers into ~/.claude.json
    Setup {
        /// Bundle source directory (default: auto-detect a parent containing hooks/)
        #[arg(long, env = "ECC_SRC")]
        src: Option<PathBuf>,

        /// Claude configuration directory holding settings.json [default: ~/.claude]
        #[arg(long, env = "ECC_DEST")]
        dest: Option<PathBuf>,

        /// Path to claude.json [default: ~/.claude.json]
        #[arg(long, env = "ECC_CLAUDE_JSON")]
        claude_json: Option<PathBuf>,

        /// Directory for the filesystem MCP server (skips the prompt)
        #[arg(long, env = "ECC_FS_PATH")]
        fs_path: Option<String>,

        /// Non-interactive mode, skip all prompts
        #[arg(long)]
        no_prompt: bool,
    },

    /// Deep-merge any JSON fragment into a JSON file, with backup and restore-on-failure
    Merge {
        /// Fragment file (a single JSON object)
        fragment: PathBuf,

        /// File to merge into (created if missing)
        destination: PathBuf,

        /// Merge only these top-level keys of the fragment (repeatable)
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Keep the destination's previous value at PATH when it passes CHECK
        /// (existing_dir, existing_file, non_empty, any; default any). Repeatable.
        #[arg(long = "preserve", value_name = "PATH[=CHECK]")]
        preserve: Vec<PreservationRule>,

        /// Expand ${NAME} style variables inside fragment strings: NAME=VALUE (repeatable)
        #[arg(long = "var", value_parser = cmd::merge::parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Put <file>.bak back in place of <file>
    Restore {
        /// File whose backup should be restored
        destination: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Setup {
            src,
            dest,
            claude_json,
            fs_path,
            no_prompt,
        } => cmd::setup::run(
            cmd::setup::SetupArgs {
                src,
                dest,
                claude_json,
                fs_path,
                no_prompt,
            },
            cli.json,
        ),
        Commands::Merge {
            fragment,
            destination,
            keys,
            preserve,
            vars,
        } => cmd::merge::run(&fragment, &destination, keys, preserve, &vars, cli.json),
        Commands::Restore { destination } => cmd::restore::run(&destination, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

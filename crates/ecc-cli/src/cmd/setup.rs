use crate::output::{print_json, Progress};
use crate::root::resolve_src;
use anyhow::Context;
use ecc_core::config::BundleConfig;
use ecc_core::json_path::JsonPath;
use ecc_core::setup::{self, FilesystemPath};
use ecc_core::{paths, preflight};
use std::path::{Path, PathBuf};

pub struct SetupArgs {
    pub src: Option<PathBuf>,
    pub dest: Option<PathBuf>,
    pub claude_json: Option<PathBuf>,
    pub fs_path: Option<String>,
    pub no_prompt: bool,
}

pub fn run(args: SetupArgs, json: bool) -> anyhow::Result<()> {
    let out = Progress::new(json);

    let src = resolve_src(args.src.as_deref()).context("use --src to point at the bundle")?;
    let dest = match args.dest {
        Some(d) => d,
        None => paths::default_dest()?,
    };
    let claude_json = match args.claude_json {
        Some(p) => p,
        None => paths::default_claude_json()?,
    };

    let config = BundleConfig::load(&src)
        .with_context(|| format!("failed to load {}", paths::bundle_config_path(&src).display()))?;
    preflight::check_required_tools(&config.requires)?;

    out.line(format!("Source: {}", src.display()));
    out.line(format!("Destination: {}", dest.display()));

    out.section("Merging hooks into settings.json");
    let hooks = setup::merge_hooks(&src, &dest, &config).context("hooks merge failed")?;
    match &hooks {
        Some(outcome) => out.merged("hooks", outcome),
        None => out.line(format!(
            "  Skipping hooks merge: {} not found",
            config.hooks_fragment_path(&src).display()
        )),
    }

    out.section("Merging MCP servers into claude.json");
    let mcp = setup::merge_mcp_servers(&src, &claude_json, &config)
        .context("MCP server merge failed")?;
    let mut filesystem = None;
    match &mcp {
        Some(outcome) => {
            out.merged("MCP servers", outcome);
            out.line(format!(
                "  NOTE: Replace YOUR_*_HERE placeholders in {} with actual values",
                claude_json.display()
            ));
            out.placeholders(outcome);

            out.section("Filesystem MCP server");
            filesystem = configure_filesystem(
                &out,
                &claude_json,
                &config.filesystem_path,
                setup::filesystem_state(outcome, &config.filesystem_path),
                args.fs_path.as_deref(),
                args.no_prompt || json,
            )?;
        }
        None => out.line(format!(
            "  Skipping MCP merge: {} not found",
            config.mcp_fragment_path(&src).display()
        )),
    }

    if json {
        print_json(&serde_json::json!({
            "source": src,
            "hooks": hooks,
            "mcp": mcp,
            "filesystem_path": filesystem,
        }))?;
    } else {
        out.line("\nSetup complete.");
    }

    Ok(())
}

/// Returns the directory written into the filesystem server's args, if any.
fn configure_filesystem(
    out: &Progress,
    claude_json: &Path,
    arg_path: &JsonPath,
    state: FilesystemPath,
    explicit: Option<&str>,
    no_prompt: bool,
) -> anyhow::Result<Option<PathBuf>> {
    if let Some(input) = explicit {
        return apply_dir(out, claude_json, arg_path, input);
    }

    match state {
        FilesystemPath::Preserved(existing) => {
            out.line(format!("  Filesystem MCP already configured: {existing}"));
            return Ok(None);
        }
        FilesystemPath::Stale(previous) => {
            out.line(format!(
                "  Warning: Previously configured path no longer exists: {previous}"
            ));
        }
        FilesystemPath::Unset => {}
    }

    if no_prompt {
        out.line("  Skipped filesystem path prompt (--no-prompt)");
        return Ok(None);
    }

    let answer = dialoguer::Input::<String>::new()
        .with_prompt("  Directory for the filesystem MCP server (empty to skip)")
        .allow_empty(true)
        .interact_text();
    match answer {
        Ok(input) if !input.trim().is_empty() => apply_dir(out, claude_json, arg_path, &input),
        Ok(_) => {
            out.line("  Skipped. Edit the filesystem args in claude.json later.");
            Ok(None)
        }
        Err(e) => {
            tracing::debug!(error = %e, "filesystem path prompt unavailable");
            out.line("  Skipped filesystem path prompt (no terminal)");
            Ok(None)
        }
    }
}

fn apply_dir(
    out: &Progress,
    claude_json: &Path,
    arg_path: &JsonPath,
    input: &str,
) -> anyhow::Result<Option<PathBuf>> {
    match paths::resolve_existing_dir(input)? {
        Some(dir) => {
            setup::set_filesystem_path(claude_json, arg_path, &dir)
                .with_context(|| format!("failed to update {}", claude_json.display()))?;
            out.line(format!("  Set filesystem path to: {}", dir.display()));
            Ok(Some(dir))
        }
        None => {
            out.line(format!("  Warning: Directory not found: {input} (skipping)"));
            Ok(None)
        }
    }
}

mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger};
use fs_err as fs;
use playerkit_core::adapters::{
    FsWritePort, ManualInstaller, PlaceholderRenderer, ProcessInstaller,
};
use playerkit_core::pipeline::{Ports, ToolError, run_integration};
use playerkit_core::ports::PackageInstaller;
use playerkit_render::{render_report_md, render_report_text};
use playerkit_types::report::ToolInfo;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "playerkit",
    version,
    about = "Wire a video player into an existing iOS, Android or web project."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the player component and add its dependencies to the project.
    Integrate(IntegrateArgs),
}

#[derive(Debug, Parser)]
struct IntegrateArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Target platform: ios, android or web.
    #[arg(long)]
    platform: Option<String>,

    /// iOS project name (default: the single *.xcodeproj in the root).
    #[arg(long)]
    name: Option<String>,

    /// Web framework: angular, vue, ember, react, none, ...
    #[arg(long)]
    framework: Option<String>,

    /// Web source directory relative to the project root (default: src).
    #[arg(long)]
    source_dir: Option<String>,

    /// Streaming service: low-latency-stream or generic-stream.
    #[arg(long)]
    service_type: Option<String>,

    /// Playback URL of the stream.
    #[arg(long)]
    endpoint: Option<String>,

    /// Latency mode of a low-latency channel.
    #[arg(long)]
    channel_latency: Option<String>,

    /// Perform every check but write nothing; prints the patch instead.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Do not run npm or pod install; print the command instead.
    #[arg(long, default_value_t = false)]
    no_install: bool,

    /// Write the run report as JSON to this path.
    #[arg(long)]
    report: Option<Utf8PathBuf>,

    /// Write the run report as markdown to this path.
    #[arg(long)]
    report_md: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit 1; 2 is reserved for integration errors.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match cli.cmd {
        Command::Integrate(args) => cmd_integrate(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn cmd_integrate(args: IntegrateArgs) -> Result<(), ToolError> {
    let project_root = args.project_root.clone();

    // Load config file and merge with CLI arguments
    let file_config =
        config::load_or_default(&project_root).context("load playerkit.toml config")?;
    let overrides = CliOverrides {
        platform: args.platform,
        name: args.name,
        framework: args.framework,
        source_dir: args.source_dir,
        service_type: args.service_type,
        endpoint: args.endpoint,
        channel_latency: args.channel_latency,
        dry_run: args.dry_run,
        no_install: args.no_install,
    };
    let settings = ConfigMerger::new(file_config).merge(&project_root, &overrides)?;
    debug!(?settings, "merged config");

    let installer: &dyn PackageInstaller = if settings.install_enabled {
        &ProcessInstaller
    } else {
        &ManualInstaller
    };
    let ports = Ports {
        writer: &FsWritePort,
        installer,
        renderer: &PlaceholderRenderer,
    };

    let outcome = run_integration(&settings, &ports, tool_info())?;

    print!("{}", render_report_text(&outcome.report));
    if settings.dry_run && !outcome.patch.is_empty() {
        println!();
        print!("{}", outcome.patch);
    }

    if let Some(path) = &args.report {
        write_json(path, &outcome.report)?;
        info!("wrote report to {}", path);
    }
    if let Some(path) = &args.report_md {
        fs::write(path, render_report_md(&outcome.report))
            .with_context(|| format!("write {}", path))?;
        info!("wrote report to {}", path);
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "playerkit".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

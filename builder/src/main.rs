//! Monster Builder
//!
//! Without a subcommand the desktop builder opens. `snapshot` renders a bare
//! body without opening a window:
//!
//! ```text
//! monster-builder --body peanut
//! monster-builder snapshot --body cube --out cube.png --width 800 --height 600
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monster_builder::app;
use monster_core::BodyShape;
use monster_core::config;

#[derive(Parser, Debug)]
#[command(name = "monster-builder", version, about = "Build a monster out of parts")]
struct Cli {
    /// Skip the selection screen and start with this body
    #[arg(long, value_parser = parse_body)]
    body: Option<BodyShape>,

    /// Start in fullscreen mode
    #[arg(short, long)]
    fullscreen: bool,

    /// Read settings from this file instead of the platform config directory
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a bare body to a PNG file
    Snapshot {
        #[arg(long, value_parser = parse_body, default_value = "waterdrop")]
        body: BodyShape,
        /// Output file
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 1024)]
        width: u32,
        #[arg(long, default_value_t = 768)]
        height: u32,
    },
}

fn parse_body(s: &str) -> Result<BodyShape, String> {
    s.parse()
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(Command::Snapshot {
        body,
        out,
        width,
        height,
    }) = cli.command
    {
        app::snapshot(body, width, height, &out)
            .with_context(|| format!("Snapshot of {body} failed"))?;
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Using config {}", path.display());
            config::load_from(path)
        }
        None => config::load(),
    };
    if cli.fullscreen {
        config.video.fullscreen = true;
    }

    app::run(config, cli.body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_no_args() {
        let cli = Cli::try_parse_from(["monster-builder"]).unwrap();
        assert!(cli.body.is_none());
        assert!(!cli.fullscreen);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_body_and_fullscreen() {
        let cli = Cli::try_parse_from(["monster-builder", "--body", "Peanut", "-f"]).unwrap();
        assert_eq!(cli.body, Some(BodyShape::Peanut));
        assert!(cli.fullscreen);
    }

    #[test]
    fn test_parse_unknown_body() {
        assert!(Cli::try_parse_from(["monster-builder", "--body", "blob"]).is_err());
    }

    #[test]
    fn test_parse_snapshot() {
        let cli = Cli::try_parse_from([
            "monster-builder",
            "snapshot",
            "--body",
            "cube",
            "--out",
            "cube.png",
            "--width",
            "320",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Snapshot {
                body,
                out,
                width,
                height,
            }) => {
                assert_eq!(body, BodyShape::Cube);
                assert_eq!(out, PathBuf::from("cube.png"));
                assert_eq!((width, height), (320, 768));
            }
            None => panic!("expected snapshot"),
        }
    }

    #[test]
    fn test_snapshot_requires_out() {
        assert!(Cli::try_parse_from(["monster-builder", "snapshot"]).is_err());
    }
}

//! CloudVault uploader entry point.

mod app;
mod config;
mod display;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Simulates uploading files to CloudVault and prints their progress.
#[derive(Debug, Parser)]
#[command(name = "cloudvault-uploader", version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Files to upload
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting CloudVault uploader"
    );

    let config = config::Config::load(args.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config, args.files))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_files_and_config() {
        let args =
            Args::try_parse_from(["cloudvault-uploader", "a.bin", "--config", "x.toml", "b.bin"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        assert_eq!(args.files, [PathBuf::from("a.bin"), PathBuf::from("b.bin")]);
    }

    #[test]
    fn short_config_flag() {
        let args = Args::try_parse_from(["cloudvault-uploader", "-c", "x.toml", "a.bin"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        assert_eq!(args.files, [PathBuf::from("a.bin")]);
    }

    #[test]
    fn help_is_not_a_file() {
        let err = Args::try_parse_from(["cloudvault-uploader", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn config_without_path_is_an_error() {
        assert!(Args::try_parse_from(["cloudvault-uploader", "a.bin", "-c"]).is_err());
    }

    #[test]
    fn files_are_required() {
        let err = Args::try_parse_from(["cloudvault-uploader"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Args::try_parse_from(["cloudvault-uploader", "--fast", "a.bin"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}

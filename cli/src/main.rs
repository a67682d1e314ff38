// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # aws-rekey
//!
//! Rotates the AWS access keys stored in the shared credentials file.
//!
//! For every requested profile the key on file is used to look up the IAM
//! user, a new key is created and written back to the file, and only then is
//! the old key deleted.
//!
//! ## Usage
//!
//! - `aws-rekey` - rotate the `default` profile
//! - `aws-rekey --profile prod,staging` - rotate several profiles in order
//! - `aws-rekey -c ~/work/credentials --dry-run` - check credentials only
//!
//! Exits non-zero only when the credentials file cannot be found or read;
//! per-profile failures are reported and the run continues.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use aws_rekey::commands::{rotate, OutputFormat, RotateOptions};
use aws_rekey_core::domain::profile::DEFAULT_PROFILE;
use aws_rekey_core::infrastructure::aws_iam::{AwsIamServiceFactory, DEFAULT_REGION};

/// Rotate AWS access keys in the shared credentials file
#[derive(Parser, Debug)]
#[command(name = "aws-rekey")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the AWS shared credentials file (overrides discovery)
    #[arg(
        short = 'c',
        long,
        env = "AWS_SHARED_CREDENTIALS_FILE",
        value_name = "FILE"
    )]
    credentials_file: Option<PathBuf>,

    /// Comma-separated credentials profiles to rotate
    #[arg(short, long, default_value = DEFAULT_PROFILE, value_name = "PROFILES")]
    profile: String,

    /// Region used to sign IAM requests
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Custom IAM endpoint (e.g. a local emulator)
    #[arg(long, env = "AWS_ENDPOINT_URL_IAM", value_name = "URL")]
    endpoint_url: Option<String>,

    /// Check credentials and identities without changing any key
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "AWS_REKEY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    let services = AwsIamServiceFactory::new(cli.region).with_endpoint_url(cli.endpoint_url);
    let options = RotateOptions {
        credentials_file: cli.credentials_file,
        profiles: cli.profile,
        dry_run: cli.dry_run,
        output: cli.output,
    };

    rotate::execute(options, Arc::new(services)).await?;
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    // Logs go to stderr so the report on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["aws-rekey"]).unwrap();

        assert_eq!(cli.profile, "default");
        assert!(!cli.dry_run);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "aws-rekey",
            "-c",
            "/tmp/credentials",
            "--profile",
            "prod,dev,",
            "--dry-run",
            "--output",
            "json",
            "--endpoint-url",
            "http://localhost:4566",
        ])
        .unwrap();

        assert_eq!(cli.credentials_file, Some(PathBuf::from("/tmp/credentials")));
        assert_eq!(cli.profile, "prod,dev,");
        assert!(cli.dry_run);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.endpoint_url.as_deref(), Some("http://localhost:4566"));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Rotate command
//!
//! Loads the shared credentials file once, rotates each requested profile in
//! order and reports the outcome of every profile as it completes.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use aws_rekey_core::application::RotationEngine;
use aws_rekey_core::domain::events::RotationEvent;
use aws_rekey_core::domain::identity_service::IdentityServiceFactory;
use aws_rekey_core::domain::profile::resolve_profiles;
use aws_rekey_core::domain::rotation::{
    ProfileRotation, RotationOutcome, RotationReport, RotationStage,
};
use aws_rekey_core::infrastructure::credentials_file::{
    discover_credentials_file, SharedCredentialsFile,
};
use aws_rekey_core::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct RotateOptions {
    /// Explicit credentials file (overrides discovery)
    pub credentials_file: Option<PathBuf>,
    /// Raw comma-separated profile list
    pub profiles: String,
    pub dry_run: bool,
    pub output: OutputFormat,
}

/// Run a rotation. Only run-fatal problems (no credentials file, unparseable
/// file) are returned as errors; per-profile failures live in the report.
pub async fn execute(
    options: RotateOptions,
    services: Arc<dyn IdentityServiceFactory>,
) -> Result<RotationReport> {
    let path = discover_credentials_file(options.credentials_file)
        .context("Failed to locate AWS shared credentials file")?;
    let mut store = SharedCredentialsFile::load(&path)
        .with_context(|| format!("Failed to load credentials file {}", path.display()))?;

    let profiles = resolve_profiles(&options.profiles);
    info!(path = %path.display(), profiles = ?profiles, dry_run = options.dry_run, "Rotating access keys");

    let event_bus = EventBus::for_profiles(profiles.len());
    let mut audit = event_bus.subscribe();
    let engine = RotationEngine::new(services, event_bus).with_dry_run(options.dry_run);

    let format = options.output;
    let report = engine
        .rotate_profiles(&path, &profiles, &mut store, |rotation| {
            let written = write_rotation(
                rotation,
                &path,
                format,
                &mut io::stdout().lock(),
                &mut io::stderr().lock(),
            );
            if let Err(e) = written {
                warn!(profile = %rotation.profile, error = %e, "Failed to write rotation result");
            }
        })
        .await;

    match format {
        OutputFormat::Text => print_summary(&report),
        OutputFormat::Json => {
            let events = audit.drain();
            if audit.dropped() > 0 {
                warn!(dropped = audit.dropped(), "Audit events were dropped from the report");
            }
            let document = JsonReport {
                credentials_file: &path,
                profiles: report.rotations.iter().map(ProfileSummary::from).collect(),
                events,
                events_dropped: audit.dropped(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&document).context("Failed to serialize report")?
            );
        }
    }

    Ok(report)
}

/// Write one profile's outcome as soon as it is known.
///
/// Text output goes to `out`. In JSON mode `out` carries only the final
/// document, so the unsaved-key recovery block goes to `diag` instead.
fn write_rotation<W: Write, E: Write>(
    rotation: &ProfileRotation,
    path: &Path,
    format: OutputFormat,
    out: &mut W,
    diag: &mut E,
) -> io::Result<()> {
    let profile = rotation.profile.as_str();

    // The unsaved key must reach the operator right away in every format
    if let RotationOutcome::PersistFailed {
        old_key_id,
        new_key,
        error,
        ..
    } = &rotation.outcome
    {
        let target: &mut dyn Write = match format {
            OutputFormat::Text => &mut *out,
            OutputFormat::Json => &mut *diag,
        };
        writeln!(
            target,
            "{}",
            format!(
                "✗ {}: new access key could not be saved to {}: {}",
                profile,
                path.display(),
                error
            )
            .red()
        )?;
        writeln!(
            target,
            "  Old key {} is still active. Record the new key manually:",
            old_key_id
        )?;
        writeln!(target, "  aws_access_key_id = {}", new_key.access_key_id)?;
        writeln!(target, "  aws_secret_access_key = {}", new_key.secret_access_key)?;
        return target.flush();
    }

    if format == OutputFormat::Json {
        return Ok(());
    }

    match &rotation.outcome {
        RotationOutcome::Rotated {
            identity,
            old_key_id,
            new_key_id,
        } => writeln!(
            out,
            "{}",
            format!(
                "✓ {}: rotated {} → {} (user {})",
                profile, old_key_id, new_key_id, identity
            )
            .green()
        )?,
        RotationOutcome::DryRun { identity, key_id } => writeln!(
            out,
            "• {}: would rotate {} (user {})",
            profile, key_id, identity
        )?,
        RotationOutcome::OldKeyNotDeleted {
            old_key_id,
            new_key_id,
            error,
            ..
        } => writeln!(
            out,
            "{}",
            format!(
                "⚠ {}: new key {} saved, but old key {} is still active: {}",
                profile, new_key_id, old_key_id, error
            )
            .yellow()
        )?,
        RotationOutcome::Failed { error } => {
            writeln!(out, "{}", format!("✗ {}: {}", profile, error).red())?
        }
        RotationOutcome::PersistFailed { .. } => {}
    }
    out.flush()
}

fn print_summary(report: &RotationReport) {
    println!();
    let summary = format!(
        "{} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    if report.has_failures() {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary.green());
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    credentials_file: &'a Path,
    profiles: Vec<ProfileSummary<'a>>,
    events: Vec<RotationEvent>,
    #[serde(skip_serializing_if = "is_zero")]
    events_dropped: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

#[derive(Debug, Serialize)]
struct ProfileSummary<'a> {
    profile: &'a str,
    success: bool,
    stage: RotationStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_key_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_key_id: Option<&'a str>,
    /// Only present when the new key could not be saved
    #[serde(skip_serializing_if = "Option::is_none")]
    new_secret_access_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a ProfileRotation> for ProfileSummary<'a> {
    fn from(rotation: &'a ProfileRotation) -> Self {
        let outcome = &rotation.outcome;
        let mut summary = ProfileSummary {
            profile: rotation.profile.as_str(),
            success: outcome.is_success(),
            stage: outcome.final_stage(),
            user_name: None,
            old_key_id: None,
            new_key_id: None,
            new_secret_access_key: None,
            error: outcome.error().map(|e| e.to_string()),
        };

        match outcome {
            RotationOutcome::Rotated {
                identity,
                old_key_id,
                new_key_id,
            }
            | RotationOutcome::OldKeyNotDeleted {
                identity,
                old_key_id,
                new_key_id,
                ..
            } => {
                summary.user_name = Some(identity.user_name.as_str());
                summary.old_key_id = Some(old_key_id.as_str());
                summary.new_key_id = Some(new_key_id.as_str());
            }
            RotationOutcome::PersistFailed {
                identity,
                old_key_id,
                new_key,
                ..
            } => {
                summary.user_name = Some(identity.user_name.as_str());
                summary.old_key_id = Some(old_key_id.as_str());
                summary.new_key_id = Some(new_key.access_key_id.as_str());
                summary.new_secret_access_key = Some(new_key.secret_access_key.as_str());
            }
            RotationOutcome::DryRun { identity, key_id } => {
                summary.user_name = Some(identity.user_name.as_str());
                summary.old_key_id = Some(key_id.as_str());
            }
            RotationOutcome::Failed { .. } => {}
        }

        summary
    }
}

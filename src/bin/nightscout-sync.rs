// ABOUTME: Command-line entry point that syncs a Nightscout site to newline-delimited JSON on stdout
// ABOUTME: Loads config, authorizes, runs the fetch pipeline, and reports failed windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nightscout Sync Binary
//!
//! Writes one JSON object per record to stdout:
//! `{"collection":"devicestatus","record":{...}}`. Logs go to stderr.
//! Exits non-zero if authorization fails or any fetch window failed.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nightscout_sync::{
    auth::Authenticator,
    config::SyncConfig,
    http_client::create_client,
    logging::LoggingConfig,
    pipeline::{SyncChannels, SyncPipeline, SyncPlan, SyncReport, COLLECTIONS},
    session::Session,
    SyncRecord,
};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "nightscout-sync")]
#[command(about = "Sync device status and treatment records from a Nightscout site")]
struct Args {
    /// Nightscout site URL (overrides `NIGHTSCOUT_URL`)
    #[arg(long)]
    url: Option<String>,

    /// Shared API secret (overrides `NIGHTSCOUT_API_SECRET`)
    #[arg(long)]
    secret: Option<String>,

    /// Identity stamped onto every record (overrides `NIGHTSCOUT_LOCAL_USER`)
    #[arg(long)]
    user: Option<String>,

    /// Log request and response diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Records per fetch window
    #[arg(long)]
    page_size: Option<u64>,

    /// Device status records to fetch
    #[arg(long)]
    devicestatus_count: Option<u64>,

    /// Treatment records to fetch
    #[arg(long)]
    treatments_count: Option<u64>,

    /// Output channel capacity per record type
    #[arg(long)]
    channel_capacity: Option<usize>,
}

impl Args {
    fn apply(self, mut config: SyncConfig) -> SyncConfig {
        if let Some(url) = self.url {
            config.endpoint = url;
        }
        if let Some(secret) = self.secret {
            config.shared_secret = secret;
        }
        if let Some(user) = self.user {
            config.local_user = user;
        }
        config.verbose |= self.verbose;
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(count) = self.devicestatus_count {
            config.devicestatus_count = count;
        }
        if let Some(count) = self.treatments_count {
            config.treatments_count = count;
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
        config
    }
}

#[derive(Serialize)]
struct OutputLine<'a, R> {
    collection: &'static str,
    record: &'a R,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Sync failed: {e:#}");
            eprintln!("nightscout-sync: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let args = Args::parse();
    let config = args
        .apply(SyncConfig::from_env()?)
        .validate()
        .context("invalid configuration")?;

    LoggingConfig::from_env()
        .with_verbose(config.verbose)
        .init()?;
    info!(config = ?config, "Configuration loaded");

    let http = create_client(&config.http);
    let session = Session::new(
        config.endpoint.as_str(),
        config.shared_secret.as_str(),
        config.local_user.as_str(),
        config.verbose,
    )?;
    let session = Authenticator::new(http.clone())
        .authorize(session)
        .await
        .context("authorization failed")?;

    let pipeline = SyncPipeline::new(http, session, config.channel_capacity);
    let plan = SyncPlan::from_counts(
        config.devicestatus_count,
        config.treatments_count,
        config.page_size,
    );

    let cancel = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight fetches");
            cancel.cancel();
        }
    });

    let (channels, run) = pipeline.start(&plan);
    let writer = tokio::spawn(write_records(channels, tokio::io::stdout()));
    let report = run.finish().await;
    let written = match writer.await {
        Ok(written) => written,
        Err(e) => Err(e).context("record writer task failed"),
    };

    pipeline.shutdown();
    conclude(&report, written)
}

/// Log the run summary and failed windows, then surface any output error
///
/// The report is logged even when writing records failed, so failed windows
/// are never hidden behind a broken stdout.
fn conclude(report: &SyncReport, written: Result<usize>) -> Result<bool> {
    for collection in COLLECTIONS {
        let summary = report.summary_for(collection);
        info!(
            collection,
            windows = summary.windows,
            failed = summary.failed,
            emitted = summary.emitted,
            "Collection summary"
        );
    }
    for (outcome, err) in report.failed() {
        error!(
            collection = outcome.collection,
            window = %outcome.window,
            error.code = %err.code(),
            "Window failed: {err}"
        );
    }
    let written = written.context("writing records to stdout failed")?;
    info!(records.written = written, "Sync complete");
    Ok(report.is_complete_success())
}

/// Drain both channels into `out` as NDJSON until both close
async fn write_records<W>(channels: SyncChannels, out: W) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let SyncChannels {
        mut device_statuses,
        mut treatments,
    } = channels;
    let mut out = BufWriter::new(out);
    let mut written = 0_usize;
    let (mut ds_open, mut tr_open) = (true, true);

    while ds_open || tr_open {
        tokio::select! {
            record = device_statuses.recv(), if ds_open => match record {
                Some(record) => {
                    write_line(&mut out, &record).await?;
                    written += 1;
                }
                None => ds_open = false,
            },
            record = treatments.recv(), if tr_open => match record {
                Some(record) => {
                    write_line(&mut out, &record).await?;
                    written += 1;
                }
                None => tr_open = false,
            },
        }
    }

    out.flush().await?;
    Ok(written)
}

async fn write_line<W, R>(out: &mut W, record: &R) -> Result<()>
where
    W: AsyncWrite + Unpin,
    R: SyncRecord,
{
    let mut line = serde_json::to_vec(&OutputLine {
        collection: R::COLLECTION,
        record,
    })?;
    line.push(b'\n');
    out.write_all(&line).await?;
    Ok(())
}

// /////////////////////////////////////////////////////////////////////////////
// Optimized Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Async Completion Demo
//!
//! A small standalone binary wiring [`bootstrap`]'s signal handling and exit
//! codes around a [`async_completion::Subsystem`]: loads configuration,
//! opens one file endpoint, writes and reads it back, then waits for
//! SIGINT/SIGTERM before shutting the subsystem down. Not the production
//! integration point — embedding applications construct their own
//! `Subsystem` directly — just a smoke test for the wiring.
//!
//! Every fallible step below converts to `anyhow::Error` via `?`; only the
//! outermost boundary in `main` maps that error down to a process exit code,
//! via [`ExitCode::from_error`].

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use async_completion::infrastructure::Settings;
use async_completion::Subsystem;
use async_completion_domain::entities::CompletionEvent;
use async_completion_domain::value_objects::{BackendKind, OpenFlags};
use bootstrap::exit_code::ExitCode;
use bootstrap::signals::{create_signal_handler, SystemSignals};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "async-completion-demo")]
#[command(about = "Demo binary for the async file I/O completion subsystem")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File to open, write to, and read back as a smoke test.
    #[arg(short, long, default_value = "async-completion-demo.tmp")]
    file: PathBuf,
}

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code.as_i32());
}

async fn run() -> ExitCode {
    async_completion::infrastructure::telemetry::init_logging();
    let args = Args::parse();

    match run_demo(args).await {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            error!(error = %err, "demo failed");
            ExitCode::from_error(err.root_cause())
        }
    }
}

async fn run_demo(args: Args) -> anyhow::Result<()> {
    let settings = Settings::load(args.config.as_deref())?;
    let mut subsystem = Subsystem::new(settings)?;

    let endpoint = subsystem.create_endpoint_for_file(&args.file, BackendKind::Buffered, OpenFlags::read_write()).await?;
    let template = subsystem.create_device_template(0, Arc::new(|event: CompletionEvent| {
        info!(status = ?event.status, "task completed");
    }));

    let (_task, rx) = subsystem.write(endpoint.clone(), template, 0, b"async completion demo\n".to_vec(), None)?;
    rx.await.map_err(|_| anyhow!("write result channel dropped"))??;
    info!(file = %args.file.display(), "demo write complete");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let handler = create_signal_handler();
    let wait = handler.wait_for_signal(Box::new(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    }));

    info!("demo running, waiting for SIGINT/SIGTERM to shut down");
    wait.await;
    subsystem.shutdown();
    Ok(())
}

mod cli;
mod ui;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fmops_tuner::callback::{CallbackSender, HttpCallbackClient};
use fmops_tuner::poller::classify;
use fmops_tuner::provider::{HttpTrainingClient, TrainingProvider};
use fmops_tuner::router::split_batch;
use fmops_tuner::state_machine::WorkflowContext;
use fmops_tuner::{CallbackRouter, Dispatch, TokioLauncher, TunerConfig, WorkflowRunner};

use cli::{Cli, Command};
use ui::WorkflowProgress;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let provider: Arc<dyn TrainingProvider> = Arc::new(
        HttpTrainingClient::new(
            config.provider_endpoint.clone(),
            config.provider_token.clone(),
        )
        .context("Failed to create training client")?,
    );

    match cli.command {
        Command::Route { input } => {
            config.validate().context("Configuration validation failed")?;
            route(&config, provider, &read_input(&input)?).await
        }
        Command::Step { input } => {
            config.validate().context("Configuration validation failed")?;
            let runner = WorkflowRunner::new(provider, callback_client(&config)?, &config);
            let payload: serde_json::Value =
                serde_json::from_str(&read_input(&input)?).context("Invalid step payload")?;
            let ctx = WorkflowContext::from_payload(payload)?;
            info!(status = %ctx.status, "Handling workflow step");
            match runner.handle_step(ctx).await? {
                Some(next) => println!("{}", serde_json::to_string_pretty(&next)?),
                None => println!("{{}}"),
            }
            Ok(())
        }
        Command::Status { job_name } => {
            let runner = WorkflowRunner::new(provider, callback_client(&config)?, &config);
            let details = runner.poller().details(&job_name).await?;
            println!("Job:    {}", details.job_name);
            println!("ARN:    {}", details.job_arn);
            println!("Raw:    {}", details.status);
            println!("Status: {}", classify(&details.status));
            if let Some(message) = &details.failure_message {
                println!("Reason: {message}");
            }
            Ok(())
        }
        Command::Jobs { max_results } => {
            let jobs = provider
                .list_jobs(max_results)
                .await
                .context("Failed to list tuning jobs")?;
            if jobs.is_empty() {
                println!("No tuning jobs found");
            }
            for job in jobs {
                let created = job
                    .creation_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".into());
                println!("{:<12} {:<26} {}", job.status, created, job.job_name);
            }
            Ok(())
        }
    }
}

async fn route(
    config: &TunerConfig,
    provider: Arc<dyn TrainingProvider>,
    input: &str,
) -> Result<()> {
    let callbacks = callback_client(config)?;
    let runner = Arc::new(WorkflowRunner::new(provider, callbacks.clone(), config));
    let launcher = Arc::new(TokioLauncher::new(runner, config.dedupe_starts));
    let router = CallbackRouter::new(launcher.clone(), callbacks);

    let bodies = split_batch(input)?;
    info!(messages = bodies.len(), "Received queue batch");
    let progress = WorkflowProgress::start(bodies.len());

    let mut rejected = 0;
    let mut started = 0;
    for body in &bodies {
        let result = router.dispatch_body(body).await;
        match &result {
            Ok(Dispatch::Started { .. }) => started += 1,
            Ok(Dispatch::Stopped) => {}
            Err(e) => {
                error!(error = %e, "Failed to route message");
                rejected += 1;
            }
        }
        progress.dispatched(&result);
    }

    progress.waiting(started);
    let results = launcher.join_all().await;
    let mut failed = rejected;
    for (execution_id, result) in &results {
        progress.finished(execution_id, result);
        if result.is_err() {
            failed += 1;
        }
    }
    progress.done();

    for record in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
        progress.print_record(record);
    }

    if failed > 0 {
        anyhow::bail!("{failed} message(s) failed");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<TunerConfig> {
    let mut config = match &cli.config {
        Some(path) => TunerConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {path:?}"))?,
        None => TunerConfig::load().context("Failed to load config")?,
    };
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }
    if cli.max_poll_cycles.is_some() {
        config.max_poll_cycles = cli.max_poll_cycles;
    }
    Ok(config)
}

fn callback_client(config: &TunerConfig) -> Result<Arc<dyn CallbackSender>> {
    let client = HttpCallbackClient::new(config.callback_endpoint.clone())
        .context("Failed to create callback client")?;
    Ok(Arc::new(client))
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

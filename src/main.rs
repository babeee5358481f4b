use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use nexus_lite::config::{ClaimPolicy, EngineConfig, SweepConfig};
use nexus_lite::engine::Engine;
use nexus_lite::notify::ChannelSink;
use nexus_lite::shutdown::install_shutdown_handler;
use nexus_lite::store::{ReviewDecision, ScoreInput, ScoreShare};
use nexus_lite::sweeper::TimeoutSweeper;
use nexus_lite::Role;

#[derive(Parser, Debug)]
#[command(name = "nexus-lite")]
#[command(version)]
#[command(about = "A task lifecycle and assignment engine for commander/node work distribution")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the engine with its timeout sweeper until shutdown
    Serve(ServeArgs),

    /// Drive one full module lifecycle against an in-process engine
    Demo {
        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Maximum concurrent claims per worker
    #[arg(long, default_value = "3")]
    cap_per_worker: u32,

    /// Maximum simultaneous assignees per module
    #[arg(long, default_value = "5")]
    cap_per_module: u32,

    /// Module status behavior when a claim is created
    #[arg(long, value_enum, default_value = "stay-open")]
    claim_policy: ClaimPolicyArg,

    /// Seconds between timeout sweeps
    #[arg(long, default_value = "3600")]
    sweep_interval_secs: u64,

    /// Maximum random jitter added to each sweep tick, in seconds
    #[arg(long, default_value = "30")]
    sweep_jitter_secs: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClaimPolicyArg {
    /// Modules stay open while claimed, up to the per-module cap
    StayOpen,
    /// The first claim flips the module to in-progress
    FlipInProgress,
}

impl From<ClaimPolicyArg> for ClaimPolicy {
    fn from(arg: ClaimPolicyArg) -> Self {
        match arg {
            ClaimPolicyArg::StayOpen => ClaimPolicy::StayOpen,
            ClaimPolicyArg::FlipInProgress => ClaimPolicy::FlipInProgress,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct DemoOutput {
    module_id: String,
    module_status: String,
    timed_out: bool,
    delivery_status: String,
    review_decision: String,
    total_allocated: f64,
    worker_scores: Vec<WorkerScore>,
    notifications_emitted: usize,
}

#[derive(Serialize)]
struct WorkerScore {
    worker_id: u64,
    name: String,
    reputation: f64,
    active_claims: u32,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let engine_config = EngineConfig::default()
        .with_caps(args.cap_per_worker, args.cap_per_module)
        .with_claim_policy(args.claim_policy.into());
    let sweep_config = SweepConfig::default()
        .with_interval(Duration::from_secs(args.sweep_interval_secs))
        .with_max_jitter(Duration::from_secs(args.sweep_jitter_secs));

    tracing::info!(
        cap_per_worker = engine_config.cap_per_worker,
        cap_per_module = engine_config.cap_per_module,
        claim_policy = ?engine_config.claim_policy,
        sweep_interval_secs = args.sweep_interval_secs,
        "Starting nexus-lite engine"
    );

    let (sink, mut notifications) = ChannelSink::new();
    let engine = Arc::new(Engine::with_sink(engine_config, Arc::new(sink)));

    let token = install_shutdown_handler();

    // Stand-in for the external delivery service: drain and log.
    let drain = tokio::spawn(async move {
        while let Some(n) = notifications.recv().await {
            tracing::info!(
                recipient = n.recipient_id,
                kind = ?n.kind,
                title = %n.title,
                "Notification emitted"
            );
        }
    });

    let sweeper = TimeoutSweeper::spawn(engine.clone(), sweep_config, token.clone());

    token.cancelled().await;
    sweeper.await?;
    drop(engine);
    drain.await?;
    tracing::info!("Engine stopped");
    Ok(())
}

/// Walk the happy path end to end: register a roster, publish a module, have
/// two workers claim it, submit a delivery, pass it with a split score, and
/// print where that leaves everyone.
async fn run_demo(output: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let (sink, mut notifications) = ChannelSink::new();
    let engine = Engine::with_sink(EngineConfig::default(), Arc::new(sink));

    engine.register_user(1, "commander-1", Role::Commander).await;
    engine.register_user(10, "node-10", Role::Node).await;
    engine.register_user(11, "node-11", Role::Node).await;

    let module = engine
        .create_module(
            1,
            "Wire format audit".into(),
            "Audit the serializer against the published format notes.".into(),
            None,
            Some(15.0),
        )
        .await?;

    engine.claim(module.id, 10).await?;
    engine.claim(module.id, 11).await?;

    let delivery = engine
        .submit_delivery(module.id, 10, "Audit notes attached.".into(), Vec::new())
        .await?;

    let review = engine
        .review_delivery(
            delivery.id,
            1,
            ReviewDecision::Pass,
            Some("Thorough work.".into()),
            Some(ScoreInput::Split(vec![
                ScoreShare { worker_id: 10, score: 10.0 },
                ScoreShare { worker_id: 11, score: 5.0 },
            ])),
        )
        .await?;

    let view = engine.module_view(module.id).await?;
    let deliveries = engine.deliveries_for_module(module.id).await?;

    let mut worker_scores = Vec::new();
    for worker_id in [10u64, 11] {
        let account = engine.user(worker_id).await?;
        worker_scores.push(WorkerScore {
            worker_id,
            name: account.name,
            reputation: account.reputation_score,
            active_claims: account.active_claims,
        });
    }

    let mut emitted = 0usize;
    while notifications.try_recv().is_ok() {
        emitted += 1;
    }

    let demo = DemoOutput {
        module_id: view.module.id.to_string(),
        module_status: view.module.status.to_string(),
        timed_out: view.module.timed_out,
        delivery_status: deliveries[0].status.to_string(),
        review_decision: review.decision.to_string(),
        total_allocated: review.total_allocated,
        worker_scores,
        notifications_emitted: emitted,
    };

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&demo)?);
        }
        OutputFormat::Table => {
            println!("Module:   {} ({})", demo.module_id, demo.module_status);
            println!("Delivery: {}", demo.delivery_status);
            println!(
                "Review:   {} (total allocated: {})",
                demo.review_decision, demo.total_allocated
            );
            println!();
            println!("{:<10} {:<12} {:<12} CLAIMS", "WORKER", "NAME", "REPUTATION");
            println!("{}", "-".repeat(46));
            for w in &demo.worker_scores {
                println!(
                    "{:<10} {:<12} {:<12} {}",
                    w.worker_id, w.name, w.reputation, w.active_claims
                );
            }
            println!();
            println!("{} notification(s) emitted", demo.notifications_emitted);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Serve(serve_args) => run_serve(serve_args).await?,
        Commands::Demo { output } => run_demo(output).await?,
    }

    Ok(())
}

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use talent_ai::config::AppConfig;
use talent_ai::error::AppError;
use talent_ai::telemetry;
use talent_ai::workflows::hiring::pipeline::{
    pipeline_router, FinalDecision, MemoryPipelineRepository, PipelineService, TracingNotifier,
};
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Talent Pipeline Orchestrator",
    about = "Run the candidate scoring and interview pipeline service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Candidate pipeline utilities for stakeholder demos
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Walk one candidate through every configured stage to a final decision
    Walkthrough(WalkthroughArgs),
}

#[derive(Args, Debug)]
struct WalkthroughArgs {
    /// Comma-separated stage names (defaults to APP_DEFAULT_STAGES)
    #[arg(long)]
    stages: Option<String>,
    /// Algorithmic screening score (0-100)
    #[arg(long, default_value_t = 82)]
    algo_score: u8,
    /// AI evaluation score (0-100)
    #[arg(long, default_value_t = 88)]
    ai_score: u8,
    /// Final decision to record once the pipeline completes
    #[arg(long, default_value = "accepted", value_parser = parse_decision)]
    decision: FinalDecision,
    /// Notes accompanying the final decision
    #[arg(long, default_value = "walkthrough decision")]
    notes: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Pipeline {
            command: PipelineCommand::Walkthrough(args),
        } => run_walkthrough(args),
    }
}

fn parse_decision(raw: &str) -> Result<FinalDecision, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "accepted" | "accept" | "hire" => Ok(FinalDecision::Accepted),
        "rejected" | "reject" => Ok(FinalDecision::Rejected),
        other => Err(format!("'{other}' is not a decision (accepted|rejected)")),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let repository = Arc::new(MemoryPipelineRepository::default());
    let notifier = Arc::new(TracingNotifier);
    let service = Arc::new(PipelineService::new(repository, notifier));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(pipeline_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talent pipeline orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_walkthrough(args: WalkthroughArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let stages = match args.stages {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|stage| !stage.is_empty())
            .map(str::to_string)
            .collect(),
        None => config.pipeline.default_stages.clone(),
    };

    let repository = Arc::new(MemoryPipelineRepository::default());
    let notifier = Arc::new(TracingNotifier);
    let service = PipelineService::new(repository, notifier);

    let person = service.register_person(
        "Walkthrough Candidate".to_string(),
        "walkthrough@example.com".to_string(),
        None,
    )?;
    let job = service.create_job(
        "Pipeline Walkthrough".to_string(),
        stages,
        Default::default(),
        Default::default(),
    )?;
    let candidate = service.add_candidate(person.id, job.id.clone())?;

    println!("Candidate pipeline walkthrough");
    println!(
        "Job '{}' with {} stage(s): {}",
        job.title,
        job.stage_count(),
        job.interview_stages.join(" -> ")
    );

    let card = service.record_scores(&candidate.id, Some(args.algo_score), Some(args.ai_score))?;
    match (card.combined_score, card.tier) {
        (Some(score), Some(tier)) => println!(
            "\nScores: algo {} + ai {} -> combined {} ({})",
            args.algo_score,
            args.ai_score,
            score,
            tier.label()
        ),
        _ => println!("\nScores: incomplete, candidate remains unscored"),
    }

    println!("\nStage progression");
    while let Some(stage_index) = service.next_stage(&candidate.id, &job.id)? {
        let interview = service.schedule_next_interview(&candidate.id, &job.id)?;
        let updated =
            service.record_interview_completion(&candidate.id, &job.id, interview.stage_index)?;
        println!(
            "- completed stage {} '{}' -> status {}",
            stage_index,
            job.interview_stages[stage_index],
            updated.pipeline_status
        );
    }

    let decided = service.decide(&candidate.id, &job.id, args.decision, &args.notes)?;
    println!(
        "\nFinal decision: {} ({})",
        decided.pipeline_status,
        decided.decision_rationale()
    );

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

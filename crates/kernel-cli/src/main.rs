// kernel-cli/src/main.rs
// ============================================================================
// Module: Kernel CLI Entry Point
// Description: Command dispatcher for the routing kernel's operator surface.
// Purpose: Implement the CLI table in spec.md §6: route, feedback, stats,
// propose, apply, rollback, baselines, lineage.
// Dependencies: clap, kernel-analysis, kernel-baselines, kernel-core,
// kernel-telemetry, serde_json, thiserror, tokio, tracing-subscriber.
// ============================================================================

//! ## Overview
//! Every command opens its stores fresh from `KERNEL_ROOT`, does one unit of
//! work, and exits — there is no long-lived server process here (`spec.md`
//! §6 describes an operator CLI, not a daemon). Exit codes follow `spec.md`
//! §6's contract: `0` success, `1` input error, `2` gates unmet, `3`
//! validation failed, `4` store unavailable.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod context;
mod env;
mod error;
mod gate_context;
mod monitor;
mod output;
mod proposals;
mod routing;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::Parser;
use clap::Subcommand;
use kernel_analysis::AutoUpdateGate;
use kernel_analysis::GateReport;
use kernel_analysis::PatternDetector;
use kernel_analysis::evaluate;
use kernel_baselines::ApplyOutcome;
use kernel_core::EscalationReason;
use kernel_core::HistoricalQuery;
use kernel_core::OutcomeSignal;
use kernel_core::ProposalStatus;
use kernel_core::ProposedUpdate;
use kernel_core::RouteRequest;
use kernel_core::SessionId;
use kernel_core::SignalKind;
use kernel_core::SignalTarget;
use kernel_core::Tier;
use kernel_telemetry::DecisionFilter;
use kernel_telemetry::FeedbackIngest;

use crate::context::Context;
use crate::error::CliError;
use crate::error::CliResult;
use crate::error::EXIT_GATES_UNMET;
use crate::error::emit_error;
use crate::output::invalid_input;
use crate::output::print_json;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Operator CLI for the adaptive routing kernel.
#[derive(Parser, Debug)]
#[command(name = "kernel", disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Route a query and emit the resulting Decision as JSON.
    Route {
        /// The query text to route.
        query: String,
        /// Caller-supplied session identifier.
        #[arg(long)]
        session: Option<String>,
        /// Bypass scoring and force this tier.
        #[arg(long, value_enum)]
        r#override: Option<TierArg>,
    },
    /// Attach an outcome signal to a decision.
    Feedback {
        /// Decision id, or a query-preview prefix when `--prefix` is set.
        target: String,
        /// Treat `target` as a query-preview prefix rather than an id.
        #[arg(long)]
        prefix: bool,
        /// The observed outcome.
        #[arg(value_enum)]
        outcome: OutcomeArg,
        /// Reason for an escalation outcome; ignored otherwise.
        #[arg(long, value_enum)]
        reason: Option<EscalationReasonArg>,
    },
    /// Print aggregate statistics.
    Stats {
        /// Restrict to the most recent N decisions.
        #[arg(long)]
        window: Option<usize>,
    },
    /// Run pattern detection and persist any proposed updates.
    Propose {
        /// Number of most recent decisions to analyze.
        #[arg(long)]
        window: Option<usize>,
    },
    /// Apply a proposed update, subject to feedback gates.
    Apply {
        /// The id of a previously proposed update.
        proposal_id: String,
        /// Preview the candidate without persisting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Roll back to the baseline version preceding a given proposal.
    Rollback {
        /// The id of a previously applied update.
        proposal_id: String,
    },
    /// Print the current baseline, or a historical version.
    Baselines {
        /// A specific historical version to print instead of current.
        #[arg(long)]
        version: Option<String>,
    },
    /// Print the ordered lineage of applied changes.
    Lineage,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TierArg {
    Fast,
    Medium,
    Strong,
}

impl From<TierArg> for Tier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Fast => Self::Fast,
            TierArg::Medium => Self::Medium,
            TierArg::Strong => Self::Strong,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutcomeArg {
    Success,
    Failure,
    Escalation,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum EscalationReasonArg {
    ExitCode,
    CapabilityLimitation,
    TruncatedResponse,
    UserRejection,
}

impl From<EscalationReasonArg> for EscalationReason {
    fn from(value: EscalationReasonArg) -> Self {
        match value {
            EscalationReasonArg::ExitCode => Self::ExitCode,
            EscalationReasonArg::CapabilityLimitation => Self::CapabilityLimitation,
            EscalationReasonArg::TruncatedResponse => Self::TruncatedResponse,
            EscalationReasonArg::UserRejection => Self::UserRejection,
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning a process exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(env::log_filter()).init();
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let root = env::root_dir();
    let ctx = Context::open(&root)?;

    match cli.command {
        Commands::Route {
            query,
            session,
            r#override,
        } => command_route(&ctx, query, session, r#override).await,
        Commands::Feedback {
            target,
            prefix,
            outcome,
            reason,
        } => command_feedback(&ctx, &target, prefix, outcome, reason),
        Commands::Stats {
            window,
        } => command_stats(&ctx, window),
        Commands::Propose {
            window,
        } => command_propose(&ctx, window),
        Commands::Apply {
            proposal_id,
            dry_run,
        } => command_apply(&ctx, &proposal_id, dry_run),
        Commands::Rollback {
            proposal_id,
        } => command_rollback(&ctx, &proposal_id),
        Commands::Baselines {
            version,
        } => command_baselines(&ctx, version.as_deref()),
        Commands::Lineage => command_lineage(&ctx),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

async fn command_route(ctx: &Context, query: String, session: Option<String>, override_tier: Option<TierArg>) -> CliResult<ExitCode> {
    let baselines = ctx.baselines.load();
    let existing = ctx.telemetry.query_decisions(&DecisionFilter::default())?;
    let history: Vec<HistoricalQuery> = existing
        .iter()
        .map(|decision| HistoricalQuery {
            query: decision.query_preview.clone(),
            complexity: decision.complexity,
            tier: decision.chosen_tier,
            dq_total: decision.dq.total,
            outcome: decision.outcome,
        })
        .collect();

    let request = RouteRequest {
        query,
        session_id: session.map(SessionId::from),
        override_tier: override_tier.map(Tier::from),
    };
    let sequence = existing.len() as u64 + 1;
    let wall_unix_ms = now_unix_ms();
    let routed = routing::route_with_ceiling(request, baselines.clone(), history, sequence, wall_unix_ms).await?;

    ctx.telemetry.append_decision(routed.decision.clone())?;
    if routed.fallback_used {
        ctx.telemetry.record_fallback_used(routed.decision.id, routed.decision.chosen_tier, wall_unix_ms, &baselines.version)?;
    }
    print_json(&routed.decision)?;
    Ok(ExitCode::SUCCESS)
}

fn command_feedback(ctx: &Context, target: &str, prefix: bool, outcome: OutcomeArg, reason: Option<EscalationReasonArg>) -> CliResult<ExitCode> {
    let signal_target = if prefix {
        SignalTarget::QueryPrefix(target.to_string())
    } else {
        SignalTarget::DecisionId(target.parse().map_err(|_| invalid_input(format!("invalid decision id: {target}")))?)
    };
    let signal = OutcomeSignal {
        target: signal_target,
        signal: match outcome {
            OutcomeArg::Success => SignalKind::Success,
            OutcomeArg::Failure => SignalKind::Failure,
            OutcomeArg::Escalation => SignalKind::Escalation,
        },
        escalation_reason: reason.map(EscalationReason::from),
        observed_at_unix_ms: now_unix_ms(),
    };
    let attached = FeedbackIngest::new(&ctx.telemetry).record(&signal)?;

    if let Some(reverted) = monitor::check(ctx)? {
        ctx.telemetry.record_rollback_triggered(reverted.proposal_id, reverted.reverted_to_version, now_unix_ms(), &reverted.restored.version)?;
    }

    print_json(&attached)?;
    Ok(ExitCode::SUCCESS)
}

fn command_stats(ctx: &Context, window: Option<usize>) -> CliResult<ExitCode> {
    let stats = ctx.telemetry.stats(window)?;
    print_json(&stats)?;
    Ok(ExitCode::SUCCESS)
}

fn command_propose(ctx: &Context, window: Option<usize>) -> CliResult<ExitCode> {
    let baselines = ctx.baselines.load();
    let decisions = ctx.telemetry.query_decisions(&DecisionFilter {
        limit: window,
        ..DecisionFilter::default()
    })?;
    let proposals = PatternDetector.detect(&decisions, &baselines, now_unix_ms());
    ctx.proposals.append(proposals.clone())?;
    print_json(&proposals)?;
    Ok(ExitCode::SUCCESS)
}

fn command_apply(ctx: &Context, proposal_id: &str, dry_run: bool) -> CliResult<ExitCode> {
    let proposal = find_proposal(ctx, proposal_id)?;

    let mut gates = ctx.baselines.load().feedback_gates;
    env::GateOverrides::from_env().apply(&mut gates);
    let gate_ctx = gate_context::build(&ctx.telemetry, &ctx.baselines, gates.recent_sample)?;

    if !dry_run
        && let GateReport::Unmet(unmet) = evaluate(&gate_ctx, &gates)
    {
        print_json(&unmet)?;
        return Ok(ExitCode::from(EXIT_GATES_UNMET));
    }

    match ctx.baselines.apply_update(&proposal, dry_run)? {
        ApplyOutcome::Preview {
            proposed, ..
        } => {
            print_json(&proposed)?;
            Ok(ExitCode::SUCCESS)
        }
        ApplyOutcome::Applied(candidate) => {
            ctx.proposals.set_status(proposal_id, ProposalStatus::Applied)?;
            print_json(&candidate)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn command_rollback(ctx: &Context, proposal_id: &str) -> CliResult<ExitCode> {
    let lineage = ctx.baselines.lineage();
    let applied_at = lineage
        .iter()
        .position(|entry| entry.proposal_id.as_deref() == Some(proposal_id))
        .ok_or_else(|| CliError::UnknownProposal(proposal_id.to_string()))?;

    let target_version = applied_at
        .checked_sub(1)
        .and_then(|idx| lineage.get(idx))
        .map_or_else(|| kernel_core::Baselines::defaults().version, |entry| entry.version.clone());

    let gate = AutoUpdateGate::new(&ctx.baselines);
    let restored = gate.rollback(&target_version)?;
    ctx.proposals.set_status(proposal_id, ProposalStatus::RolledBack)?;
    print_json(&restored)?;
    Ok(ExitCode::SUCCESS)
}

fn command_baselines(ctx: &Context, version: Option<&str>) -> CliResult<ExitCode> {
    let baselines = match version {
        Some(version) => ctx.baselines.load_version(version)?,
        None => ctx.baselines.load(),
    };
    print_json(&baselines)?;
    Ok(ExitCode::SUCCESS)
}

fn command_lineage(ctx: &Context) -> CliResult<ExitCode> {
    print_json(&ctx.baselines.lineage())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn find_proposal(ctx: &Context, proposal_id: &str) -> CliResult<ProposedUpdate> {
    ctx.proposals.find(proposal_id)?.ok_or_else(|| CliError::UnknownProposal(proposal_id.to_string()))
}

fn now_unix_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

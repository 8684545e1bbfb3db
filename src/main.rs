use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use fleet_authz::{AccessChecker, AccessConfig, CheckOptions, MemoryStore, PermissionLevel, Role, StoreSet};
use fleet_authz::model::UserId;

const USAGE: &str = "fleet_authz_check\n\nUSAGE:\n  fleet_authz_check --snapshot PATH [--at RFC3339] vehicle USER VEHICLE LEVEL\n  fleet_authz_check --snapshot PATH [--at RFC3339] role USER ROLE\n\nOPTIONS:\n  --snapshot PATH   JSON snapshot of the assignment/ACL tables (env: FLEET_AUTHZ_SNAPSHOT)\n  --at RFC3339      Evaluate at this instant instead of now\n\nENV:\n  FLEET_AUTHZ_GROUP_NESTING=all_parents|first_parent\n  FLEET_AUTHZ_DECISION_TIMEOUT_MS=N\n  FLEET_AUTHZ_AUDIT=true|false\n\nExit status: 0 allow, 1 deny, 2 error.\n";

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            return args.get(i + 1).cloned();
        }
        i += 1;
    }
    None
}

/// Arguments left after removing `--flag value` pairs and the program name.
fn positional(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--snapshot" || args[i] == "--at" {
            i += 2;
            continue;
        }
        out.push(args[i].clone());
        i += 1;
    }
    out
}

fn parse_options(pos: &[String]) -> Result<(UserId, CheckOptions)> {
    match pos {
        [kind, user, vehicle, level] if kind == "vehicle" => {
            let permission = level.parse::<PermissionLevel>()?;
            Ok((UserId::new(user.as_str()), CheckOptions::vehicle(vehicle.as_str(), permission)))
        }
        [kind, user, role] if kind == "role" => {
            let role = role.parse::<Role>()?;
            Ok((UserId::new(user.as_str()), CheckOptions::role(role)))
        }
        _ => Err(anyhow!("expected 'vehicle USER VEHICLE LEVEL' or 'role USER ROLE'")),
    }
}

async fn run(args: &[String]) -> Result<bool> {
    let snapshot = parse_value_arg(args, "--snapshot")
        .or_else(|| env::var("FLEET_AUTHZ_SNAPSHOT").ok())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--snapshot PATH is required"))?;
    let at: Option<DateTime<Utc>> = match parse_value_arg(args, "--at") {
        Some(s) => Some(DateTime::parse_from_rfc3339(&s).with_context(|| format!("invalid --at '{}'", s))?.with_timezone(&Utc)),
        None => None,
    };
    let (user, options) = parse_options(&positional(args))?;

    let config = AccessConfig::from_env()?;
    let store = MemoryStore::from_snapshot_file(&snapshot)?;
    info!(
        target: "fleet_authz",
        "checking user={} {} snapshot='{}' nesting={:?} timeout_ms={:?}",
        user, options, snapshot.display(), config.group_nesting, config.decision_timeout_ms
    );
    let checker = AccessChecker::new(StoreSet::uniform(Arc::new(store)), config);
    let decision = match at {
        Some(at) => checker.evaluate_at(&user, &options, at).await?,
        None => checker.evaluate(&user, &options).await?,
    };
    println!("{} ({})", if decision.allow { "allow" } else { "deny" }, decision.reason);
    Ok(decision.allow)
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print!("{}", USAGE);
        return;
    }

    match run(&args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(2);
        }
    }
}

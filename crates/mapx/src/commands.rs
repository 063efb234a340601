use crate::exit_code_for;
use anyhow::{Context, Result};
use colored::Colorize;
use map_config::Config;
use map_core::{Defect, ErrorDetail, Invocation};
use map_http::ReqwestTransport;
use map_providers::{catalog, Catalog};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

pub struct PerformArgs<'a> {
    pub config: Option<&'a Path>,
    pub provider: &'a str,
    pub usecase: &'a str,
    pub input: Option<&'a str>,
    pub parameters: Option<&'a str>,
    pub security: Option<&'a str>,
    pub security_json: Option<&'a str>,
}

fn configured_catalog(config: &Config) -> Catalog {
    let mut catalog = catalog();
    catalog.configure(|provider| config.apply(provider));
    catalog
}

// ── perform ─────────────────────────────────────────────────────

/// Runs the usecase and prints its outcome. Returns the exit code.
pub fn perform(args: &PerformArgs<'_>) -> Result<i32> {
    let config = Config::load(args.config).context("load config")?;
    let catalog = configured_catalog(&config);

    let input = match args.input {
        Some(path) => read_json(path).context("read input")?,
        None => Value::Object(Default::default()),
    };
    let parameters = match args.parameters {
        Some(path) => read_json(path).context("read parameters")?,
        None => Value::Object(Default::default()),
    };
    let security = match (args.security, args.security_json) {
        (Some(path), _) => read_json(path).context("read security")?,
        (None, Some(inline)) => serde_json::from_str(inline).context("parse MAPX_SECURITY")?,
        (None, None) => Value::Object(Default::default()),
    };

    let transport = ReqwestTransport::new(config.transport_policy(), config.timeout_ms())
        .context("build http client")?;
    let invocation = Invocation::new(input)
        .with_parameters(parameters)
        .with_security(security);

    let outcome = catalog.perform(args.provider, args.usecase, &invocation, &transport);
    match &outcome {
        Ok(Ok(data)) => println!("{}", serde_json::to_string_pretty(data)?),
        Ok(Err(error)) => print_error(error),
        Err(defect) => print_defect(defect),
    }
    Ok(exit_code_for(&outcome))
}

fn print_error(error: &ErrorDetail) {
    eprintln!("{} {}", "error:".red().bold(), error.title.bold());
    if let Some(detail) = &error.detail {
        eprintln!("  {} {}", "detail:".dimmed(), detail);
    }
    if let Some(code) = &error.code {
        eprintln!("  {} {}", "code:  ".dimmed(), code);
    }
    if let Some(rate) = &error.rate_limit {
        let mut parts = Vec::new();
        if let Some(bucket) = &rate.bucket {
            parts.push(format!("bucket {bucket}"));
        }
        if let (Some(remaining), Some(total)) = (rate.remaining_requests, rate.total_requests) {
            parts.push(format!("{remaining}/{total} left"));
        }
        if let Some(secs) = rate.retry_after.or(rate.reset_after) {
            parts.push(format!("retry in {secs}s"));
        }
        if parts.is_empty() {
            parts.push("no details".to_string());
        }
        eprintln!("  {} {}", "limit: ".yellow(), parts.join(", "));
    }
}

fn print_defect(defect: &Defect) {
    eprintln!("{} {}", "defect:".magenta().bold(), defect);
    eprintln!("  {}", "the map could not handle this situation; this is a bug in the adapter".dimmed());
}

// ── providers ───────────────────────────────────────────────────

pub fn providers(config: Option<&Path>) -> Result<()> {
    let config = Config::load(config).context("load config")?;
    let catalog = configured_catalog(&config);

    for dispatcher in catalog.providers() {
        let provider = dispatcher.provider();
        println!("{}", provider.name.cyan().bold());
        for service in &provider.services {
            println!("  {} {} {}", "service".dimmed(), service.id, service.base_url.dimmed());
        }
        for scheme in &provider.security {
            println!("  {} {}", "security".dimmed(), scheme.id());
        }
        for usecase in dispatcher.usecases() {
            println!("  {} {}", "usecase".dimmed(), usecase.green());
        }
    }
    Ok(())
}

// ── io ──────────────────────────────────────────────────────────

/// Reads JSON from `path`, or from stdin when `path` is `-`.
fn read_json(path: &str) -> Result<Value> {
    let content = if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("read {path}"))?
    };
    serde_json::from_str(&content).with_context(|| format!("parse JSON from {path}"))
}

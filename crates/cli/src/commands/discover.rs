use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use prospector_core::config::AppConfig;
use prospector_core::http::ReqwestTransport;
use prospector_core::ToolEnvelope;
use prospector_discovery::{
    ops, CreateRunRequest, DiscoveryClient, Generator, MatchCondition, WaitOptions,
};
use serde_json::json;

use crate::commands::{secret_provider, CommandResult};

const COMMAND: &str = "discover";

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    #[arg(long, help = "Natural-language description of the entities to find")]
    pub objective: String,
    #[arg(long = "entity-type", help = "Kind of entity, e.g. companies or people")]
    pub entity_type: String,
    #[arg(
        long = "condition",
        value_parser = parse_condition,
        required = true,
        help = "Match condition as name=description; repeat for several"
    )]
    pub conditions: Vec<MatchCondition>,
    #[arg(long, value_parser = parse_generator, help = "Engine tier: base, core, pro, or preview")]
    pub generator: Option<Generator>,
    #[arg(long = "match-limit", help = "Maximum matches to find (service accepts 5-1000)")]
    pub match_limit: Option<u32>,
    #[arg(long, help = "Poll until the run finishes and print its results")]
    pub wait: bool,
    #[arg(long = "poll-interval", default_value_t = 5, help = "Seconds between status checks")]
    pub poll_interval: u64,
    #[arg(long = "max-wait", default_value_t = 300, help = "Give up waiting after this many seconds")]
    pub max_wait: u64,
}

fn parse_condition(raw: &str) -> Result<MatchCondition, String> {
    let (name, description) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=description, got `{raw}`"))?;
    if name.trim().is_empty() || description.trim().is_empty() {
        return Err(format!("condition name and description must be non-empty, got `{raw}`"));
    }
    Ok(MatchCondition::new(name.trim(), description.trim()))
}

fn parse_generator(raw: &str) -> Result<Generator, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "base" => Ok(Generator::Base),
        "core" => Ok(Generator::Core),
        "pro" => Ok(Generator::Pro),
        "preview" => Ok(Generator::Preview),
        other => Err(format!("unsupported generator `{other}` (expected base|core|pro|preview)")),
    }
}

pub fn run(config: &AppConfig, args: DiscoverArgs) -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    let transport = Arc::new(ReqwestTransport::new());
    let secrets = secret_provider(config);
    let client = DiscoveryClient::new(transport, secrets, config.discovery.clone());

    let mut request =
        CreateRunRequest::new(args.objective, args.entity_type, args.conditions.clone());
    if let Some(generator) = args.generator {
        request = request.with_generator(generator);
    }
    if let Some(match_limit) = args.match_limit {
        request = request.with_match_limit(match_limit);
    }

    runtime.block_on(async {
        let created = ops::create_run(&client, request).await;
        if !created.is_success() || !args.wait {
            return envelope_result(&created);
        }

        let created_wire = created.to_value();
        let Some(run_id) = created_wire["run_id"].as_str() else {
            return CommandResult::failure(
                COMMAND,
                "transport",
                "create response did not carry a run id",
                1,
            );
        };

        let awaited = ops::await_run(
            &client,
            run_id,
            WaitOptions {
                poll_interval: Duration::from_secs(args.poll_interval),
                max_wait: Duration::from_secs(args.max_wait),
            },
        )
        .await;
        envelope_result(&awaited)
    })
}

fn envelope_result(envelope: &ToolEnvelope) -> CommandResult {
    let exit_code = if envelope.is_success() { 0 } else { 1 };
    CommandResult::json(exit_code, &json!({ "command": COMMAND, "result": envelope.to_value() }))
}

//! Declarative agent profiles: identity, orchestration model, and
//! instructions. Tools are attached separately at build time so the same
//! profile can ship with different registries.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instructions {
    pub response: String,
    pub orchestration: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: &'static str,
    pub comment: &'static str,
    pub model: &'static str,
    pub instructions: Instructions,
}

/// Profile for go-to-market prospecting work.
pub fn gtm_engineer() -> AgentProfile {
    AgentProfile {
        name: "GTM_ENGINEER_AGENT",
        comment: "GTM engineer agent for prospecting and account research",
        model: "claude-sonnet-4-5",
        instructions: Instructions {
            response: "When you report discovered entities, include the source URL for each \
                       one so the user can verify it."
                .to_string(),
            orchestration: "\
Two research paths are available; pick based on what the user needs.

Quick lookup: use web_search for single facts, current events, and one-entity \
questions. It answers in one shot with citations.

Complete research: use the discovery run tools when the goal is a LIST of \
entities matching criteria.
1. create_discovery_run with the objective, entity type, and match conditions.
2. Poll get_discovery_status until is_active is false, or call \
await_discovery_run to block with a timeout.
3. get_discovery_results to retrieve the matched entities.
4. Optionally extend_discovery_run for more matches or enrich_discovery_run \
to extract extra fields per entity.

A timed-out wait leaves the run working server-side; check its status again \
later instead of recreating it. Only cancel_discovery_run stops a run."
                .to_string(),
        },
    }
}

/// Look up a profile by its CLI-facing name.
pub fn profile(name: &str) -> Option<AgentProfile> {
    match name {
        "gtm_engineer" => Some(gtm_engineer()),
        _ => None,
    }
}

pub fn profile_names() -> Vec<&'static str> {
    vec!["gtm_engineer"]
}

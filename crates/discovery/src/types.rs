use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine tier used to generate candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generator {
    Base,
    #[default]
    Core,
    Pro,
    Preview,
}

/// Engine tier used to enrich matched candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processor {
    Base,
    #[default]
    Core,
    Pro,
}

/// A named predicate every matched entity must satisfy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCondition {
    pub name: String,
    pub description: String,
}

impl MatchCondition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

/// Last-observed run state. The authoritative copy lives server-side;
/// unknown values decode as `Unknown` rather than failing the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Cancelled,
    Failed,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Matched,
    Rejected,
    #[serde(other)]
    Unknown,
}

/// One entity returned by a run. The service decides the field shape per
/// entity type, so everything except the match tag stays open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub match_status: MatchStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Inputs for run creation. `match_limit` is bounded to [5, 1000] by the
/// remote service; the client deliberately does not pre-validate the
/// range so it cannot drift from server-side rules.
#[derive(Clone, Debug, Serialize)]
pub struct CreateRunRequest {
    pub objective: String,
    pub entity_type: String,
    pub match_conditions: Vec<MatchCondition>,
    pub generator: Generator,
    pub match_limit: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_list: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CreateRunRequest {
    pub const DEFAULT_MATCH_LIMIT: u32 = 10;

    pub fn new(
        objective: impl Into<String>,
        entity_type: impl Into<String>,
        match_conditions: Vec<MatchCondition>,
    ) -> Self {
        Self {
            objective: objective.into(),
            entity_type: entity_type.into(),
            match_conditions,
            generator: Generator::default(),
            match_limit: Self::DEFAULT_MATCH_LIMIT,
            exclude_list: Vec::new(),
            metadata: None,
        }
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_match_limit(mut self, match_limit: u32) -> Self {
        self.match_limit = match_limit;
        self
    }

    pub fn with_exclude_list(mut self, exclude_list: Vec<String>) -> Self {
        self.exclude_list = exclude_list;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Returned by run creation. The caller is responsible for remembering
/// `run_id`; the client keeps no registry of live runs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunHandle {
    pub run_id: String,
    pub status: RunStatus,
    pub is_active: bool,
    pub generator: Generator,
    pub created_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of a run. `metrics` is an implementation-defined
/// counter mapping (candidates found so far, etc).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub run_id: String,
    pub status: RunStatus,
    pub is_active: bool,
    pub metrics: Map<String, Value>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Candidates filtered down to matched entities, with both the filtered
/// and unfiltered counts. A snapshot, not a subscription: while the run
/// is active more candidates may appear between calls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultSet {
    pub run_id: String,
    pub status: RunStatus,
    pub is_active: bool,
    pub total_candidates: usize,
    pub matched_count: usize,
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtendedRun {
    pub run_id: String,
    pub new_match_limit: u32,
    pub objective: Option<String>,
    pub entity_type: Option<String>,
}

/// A supplementary schema-driven extraction attached to a run. Each
/// enrichment is independent and never mutates the match conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub processor: Processor,
    pub output_schema: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichmentSet {
    pub run_id: String,
    pub enrichments: Vec<Enrichment>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cancellation {
    pub run_id: String,
    pub status: RunStatus,
}

use prospector_agent::profiles;
use serde_json::json;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let profiles: Vec<_> = profiles::profile_names()
        .into_iter()
        .filter_map(|name| profiles::profile(name).map(|profile| (name, profile)))
        .map(|(name, profile)| {
            json!({
                "profile": name,
                "agent_name": profile.name,
                "model": profile.model,
                "comment": profile.comment,
            })
        })
        .collect();

    CommandResult::json(0, &json!({ "command": "profiles", "profiles": profiles }))
}

use serde_json::json;

use super::game_api::Observation;

#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub plan_contract: String,
    pub actions_contract: String,
    pub action_list: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            plan_contract: "Reply with one JSON object and nothing else:\n{\"plan\":{\"steps\":[{\"name\":\"goto\",\"params\":{\"x\":0,\"y\":64,\"z\":0},\"rationale\":\"short reason\"}]}}\nAt most 8 steps.".to_string(),
            actions_contract: "Reply with one JSON object and nothing else:\n{\"actions\":[{\"name\":\"goto\",\"params\":{\"x\":0,\"y\":64,\"z\":0}}]}\nAt most 10 actions.".to_string(),
            action_list: "Allowed actions:\n- inspect {\"x\",\"y\",\"z\"}   look at a block (within 10 blocks)\n- goto {\"x\",\"y\",\"z\"}      walk to a coordinate (within 10 blocks)\n- dig {\"x\",\"y\",\"z\"}       break the block there (within 10 blocks)\n- mine {\"x\",\"y\",\"z\"}      same as dig\n- gotoplayer {\"player\"}\n- dropitems {\"player\"}\n- ensureworkbench {}\n- craftwoodpickaxe {}\n- craftstonepickaxe {}\n- status {}\n- command {\"command\":\"/...\"}  server command (requires authorization)".to_string(),
        }
    }
}

fn state_json(obs: &Observation) -> String {
    let state = json!({
        "position": obs.position,
        "health": obs.health,
        "nearby_players": obs.nearby_players,
    });
    serde_json::to_string_pretty(&state).unwrap_or_else(|_| "{}".to_string())
}

/// User prompt for the periodic planning path.
pub fn build_plan_prompt(obs: &Observation, objective: &str, cfg: &PromptConfig) -> String {
    format!(
        "[OBJECTIVE]\n{objective}\n\n[STATE_JSON]\n{}\n\n[ACTIONS]\n{}\n\n[CONTRACT]\n{}\n",
        state_json(obs),
        cfg.action_list,
        cfg.plan_contract
    )
}

/// User prompt for the chat-triggered actions path.
pub fn build_chat_prompt(
    obs: &Observation,
    sender: &str,
    message: &str,
    cfg: &PromptConfig,
) -> String {
    format!(
        "[CHAT]\n{sender}: {message}\n\n[STATE_JSON]\n{}\n\n[ACTIONS]\n{}\n\n[CONTRACT]\n{}\n",
        state_json(obs),
        cfg.action_list,
        cfg.actions_contract
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::game_api::Vec3;

    fn obs() -> Observation {
        Observation {
            position: Vec3 {
                x: 1.0,
                y: 64.0,
                z: -2.0,
            },
            health: Some(20.0),
            nearby_players: vec!["Alex".to_string()],
        }
    }

    #[test]
    fn plan_prompt_carries_state_and_contract() {
        let p = build_plan_prompt(&obs(), "gather wood", &PromptConfig::default());
        assert!(p.contains("[OBJECTIVE]\ngather wood"));
        assert!(p.contains("[STATE_JSON]"));
        assert!(p.contains("\"plan\""));
        assert!(p.contains("Alex"));
    }

    #[test]
    fn chat_prompt_quotes_the_sender() {
        let p = build_chat_prompt(&obs(), "Alex", "come here", &PromptConfig::default());
        assert!(p.contains("Alex: come here"));
        assert!(p.contains("\"actions\""));
    }
}

//! Agent construction by configured name.

use tracing::info;

use webrun_core::WebrunError;

use crate::agent::{AgentDeps, StrategyAgent, WebAgent};
use crate::controller::ControlAgent;
use crate::identity::AgentKind;
use crate::strategy::Strategy;

/// Build the agent registered under `name`.
///
/// Unknown names fail with [`WebrunError::UnknownAgent`] listing the accepted
/// names.
pub fn select_agent(name: &str, deps: AgentDeps) -> Result<Box<dyn WebAgent>, WebrunError> {
    let kind = AgentKind::from_name(name).ok_or_else(|| WebrunError::UnknownAgent {
        name: name.to_string(),
        allowed: AgentKind::selectable_names(),
    })?;

    let llm = deps.llm.name().to_string();
    let agent: Box<dyn WebAgent> =
        match Strategy::for_kind(kind, &deps.templates, deps.temperature) {
            Some(strategy) => Box::new(StrategyAgent::new(strategy, deps)),
            None => Box::new(ControlAgent::new(deps)),
        };
    info!(agent = %agent.identity().name, llm = %llm, "Agent selected");
    Ok(agent)
}

//! Webrun Agents
//!
//! Prompting strategies for the web-shopping environment: per-session history
//! tracking, context-budgeted prompt assembly, action parsing, and the
//! search/click controller.

pub mod action_parser;
pub mod agent;
pub mod context_window;
pub mod controller;
pub mod factory;
pub mod identity;
pub mod planning;
pub mod prompts;
pub mod session_state;
pub mod strategy;
pub mod system_prompt;
pub mod tokens;

pub use action_parser::{extract_instruction, get_query, parse_action};
pub use agent::{AgentDeps, StrategyAgent, WebAgent};
pub use context_window::ContextWindow;
pub use controller::{ControlAgent, Role};
pub use factory::select_agent;
pub use identity::{AgentIdentity, AgentKind};
pub use planning::Planning;
pub use prompts::PromptTemplates;
pub use session_state::Session;
pub use strategy::Strategy;
pub use system_prompt::PromptBuilder;
pub use tokens::BpeTokenizer;

//! Prompt template store.
//!
//! Templates are plain text, loaded once per process (built-ins, optionally
//! overridden from a YAML file) and shared by reference between agents.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Static text for every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// Reactive one-shot demonstration, followed directly by the seed observation.
    pub oneshot: String,
    /// Zero-shot instructions.
    pub zeroshot: String,
    /// Zero-shot instructions asking for a reasoning step before acting.
    pub zeroshot_think: String,
    /// Plan-generation prompt for the planner strategy.
    pub plan: String,
    /// Plan-generation prompt for the planner+reactive strategy.
    pub plan_react: String,
    /// Acting prompt for the planner strategy.
    pub oneshot_plan: String,
    /// Acting prompt for the planner+reactive strategy.
    pub oneshot_plan_react: String,
    /// Instructions for the search role of the controller.
    pub search_agent: String,
    /// Instructions for the click role of the controller.
    pub click_agent: String,
}

impl PromptTemplates {
    /// Load templates from a YAML file. Keys missing from the file keep their
    /// built-in text.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt templates: {}", path.display()))?;
        let templates: PromptTemplates = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse prompt templates at: {}", path.display()))?;
        info!(path = %path.display(), "Loaded prompt templates");
        Ok(templates)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            oneshot: ONESHOT.to_string(),
            zeroshot: ZEROSHOT.to_string(),
            zeroshot_think: ZEROSHOT_THINK.to_string(),
            plan: PLAN.to_string(),
            plan_react: PLAN_REACT.to_string(),
            oneshot_plan: ONESHOT_PLAN.to_string(),
            oneshot_plan_react: ONESHOT_PLAN_REACT.to_string(),
            search_agent: SEARCH_AGENT.to_string(),
            click_agent: CLICK_AGENT.to_string(),
        }
    }
}

const ONESHOT: &str = r#"Webshop
Instruction:
i would like a 3 ounce bottle of bright citrus deodorant for sensitive skin, and price lower than 50.00 dollars
[Search]

Action: search[3 ounce bright citrus deodorant sensitive skin]
Observation:
[Back to Search]
Page 1 (Total results: 50)
[Next >]
[B078GWRC1J]
Bright Citrus Deodorant by Earth Mama | Natural and Safe for Sensitive Skin, Pregnancy and Breastfeeding, Contains Organic Calendula 3-Ounce
$10.99
[B078GTKVXY]
Ginger Fresh Deodorant by Earth Mama | Natural and Safe for Sensitive Skin, Pregnancy and Breastfeeding, Contains Organic Calendula 3-Ounce
$10.99
[B08KBVJ4XN]
Barrel and Oak - Aluminum-Free Deodorant, Deodorant for Men, Essential Oil-Based Scent, 24-Hour Odor Protection, Cedar & Patchouli Blend, Gentle on Sensitive Skin (Mountain Sage, 2.7 oz, 2-Pack)
$15.95

Action: think[B078GWRC1J and B078GTKVXY are bright citrus deodorant less then 50 dollars. I can check B078GWRC1J first.]
Observation: OK.

Action: click[B078GWRC1J]
Observation:
[Back to Search]
[< Prev]
scent [assorted scents][bright citrus][calming lavender][ginger fresh][simply non-scents]
size [travel set (4-pack)][3 ounce (pack of 1)][3-ounce (2-pack)]
Bright Citrus Deodorant by Earth Mama | Natural and Safe for Sensitive Skin, Pregnancy and Breastfeeding, Contains Organic Calendula 3-Ounce
Price: $10.99
Rating: N.A.
[Description]
[Features]
[Reviews]
[Buy Now]

Action: think[For 3 ounce bottle of bright citrus deodorant for sensitive skin, the item has options 'bright citrus' and '3 ounce (pack of 1)' and seems good to buy.]
Observation: OK.

Action: click[bright citrus]
Observation: You have clicked bright citrus.

Action: click[3 ounce (pack of 1)]
Observation: You have clicked 3 ounce (pack of 1).

Action: click[Buy Now]

"#;

const ZEROSHOT: &str = r#"You are a web shopping agent. You will be given a shopping instruction and the current web page, and you must act to buy the product that best matches the instruction.
You can take two kinds of actions:
- search[<query>]: type a search query into the search bar. Only valid when the page shows a search bar, written as {search} below.
- click[<button>]: click one of the buttons currently shown on the page, written as click: [<button> <button> ...] below.
Answer with exactly one action and nothing else.

"#;

const ZEROSHOT_THINK: &str = r#"You are a web shopping agent. You will be given a shopping instruction and the current web page, and you must act to buy the product that best matches the instruction.
You can take three kinds of actions:
- think[<reasoning>]: reason about the page and the instruction before acting. The page does not change.
- search[<query>]: type a search query into the search bar. Only valid when the page shows a search bar, written as {search} below.
- click[<button>]: click one of the buttons currently shown on the page, written as click: [<button> <button> ...] below.
Answer with exactly one action on a single line.

"#;

const PLAN: &str = r#"Write a short plan for buying a product in an online shop that matches the instruction. The plan is a single line listing the steps: which query to search, how to choose an item from the results, which options to click, and when to buy.

Instruction: i would like a 3 ounce bottle of bright citrus deodorant for sensitive skin, and price lower than 50.00 dollars
Plan: search[3 ounce bright citrus deodorant sensitive skin], click an item that is a bright citrus deodorant under 50 dollars, click the options 'bright citrus' and '3 ounce (pack of 1)', then click[Buy Now]."#;

const PLAN_REACT: &str = r#"Write a short plan for buying a product in an online shop that matches the instruction. The plan is a single line listing the steps, and may include think steps where the agent should reason about the page before acting.

Instruction: i would like a 3 ounce bottle of bright citrus deodorant for sensitive skin, and price lower than 50.00 dollars
Plan: search[3 ounce bright citrus deodorant sensitive skin], think about which results are bright citrus deodorant under 50 dollars, click the best item, think about which options match, click 'bright citrus' and '3 ounce (pack of 1)', then click[Buy Now]."#;

const ONESHOT_PLAN: &str = r#"Follow the plan to buy the product matching the instruction. Each step is one action: search[<query>] or click[<button>].

Instruction: i would like a 3 ounce bottle of bright citrus deodorant for sensitive skin, and price lower than 50.00 dollars
Plan: search[3 ounce bright citrus deodorant sensitive skin], click an item that is a bright citrus deodorant under 50 dollars, click the options 'bright citrus' and '3 ounce (pack of 1)', then click[Buy Now].

Action: search[3 ounce bright citrus deodorant sensitive skin]
Observation: [Back to Search] Page 1 (Total results: 50) [Next >] [B078GWRC1J] Bright Citrus Deodorant by Earth Mama | Natural and Safe for Sensitive Skin, Contains Organic Calendula 3-Ounce $10.99 [B078GTKVXY] Ginger Fresh Deodorant by Earth Mama 3-Ounce $10.99

Action: click[B078GWRC1J]
Observation: [Back to Search] [< Prev] scent [assorted scents][bright citrus][calming lavender][ginger fresh] size [travel set (4-pack)][3 ounce (pack of 1)][3-ounce (2-pack)] Bright Citrus Deodorant by Earth Mama Price: $10.99 [Description] [Features] [Reviews] [Buy Now]

Action: click[bright citrus]
Observation: You have clicked bright citrus.

Action: click[3 ounce (pack of 1)]
Observation: You have clicked 3 ounce (pack of 1).

Action: click[Buy Now]"#;

const ONESHOT_PLAN_REACT: &str = r#"Follow the plan to buy the product matching the instruction. Each step is one action: think[<reasoning>], search[<query>] or click[<button>].

Instruction: i would like a 3 ounce bottle of bright citrus deodorant for sensitive skin, and price lower than 50.00 dollars
Plan: search[3 ounce bright citrus deodorant sensitive skin], think about which results are bright citrus deodorant under 50 dollars, click the best item, think about which options match, click 'bright citrus' and '3 ounce (pack of 1)', then click[Buy Now].

Action: search[3 ounce bright citrus deodorant sensitive skin]
Observation: [Back to Search] Page 1 (Total results: 50) [Next >] [B078GWRC1J] Bright Citrus Deodorant by Earth Mama | Natural and Safe for Sensitive Skin, Contains Organic Calendula 3-Ounce $10.99 [B078GTKVXY] Ginger Fresh Deodorant by Earth Mama 3-Ounce $10.99

Action: think[B078GWRC1J is a bright citrus deodorant under 50 dollars. I will check it.]
Observation: OK.

Action: click[B078GWRC1J]
Observation: [Back to Search] [< Prev] scent [assorted scents][bright citrus][calming lavender][ginger fresh] size [travel set (4-pack)][3 ounce (pack of 1)][3-ounce (2-pack)] Bright Citrus Deodorant by Earth Mama Price: $10.99 [Description] [Features] [Reviews] [Buy Now]

Action: think[The options 'bright citrus' and '3 ounce (pack of 1)' match the instruction.]
Observation: OK.

Action: click[bright citrus]
Observation: You have clicked bright citrus.

Action: click[3 ounce (pack of 1)]
Observation: You have clicked 3 ounce (pack of 1).

Action: click[Buy Now]"#;

const SEARCH_AGENT: &str = r#"You are the search module of a web shopping agent. Given a shopping instruction and the current page, write the search query that is most likely to surface the requested product. Keep the query short and keep the important attributes (product type, size, color, material, price bound).
Answer with exactly one action in the form search[<query>].

"#;

const CLICK_AGENT: &str = r#"You are the click module of a web shopping agent. Given a shopping instruction, the pages visited so far and the buttons on the current page, choose the button to click next: open a matching item from the results, select the options the instruction asks for, go to the next page or back to search when nothing matches, and click Buy Now once the item and options are right.
Answer with exactly one action in the form click[<button>], using a button from the list verbatim.

"#;

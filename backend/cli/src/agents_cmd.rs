//! `webrun agents`: the agent names a run config may select.

use webrun_agent::AgentKind;

use crate::terminal_output::{render_table, Column};

pub fn rows() -> Vec<Vec<String>> {
    AgentKind::selectable_names()
        .into_iter()
        .filter_map(|name| {
            let kind = AgentKind::from_name(&name)?;
            let role = if kind.as_str() == name {
                if kind == AgentKind::SearchClickController {
                    "two-role".to_string()
                } else {
                    "single-role".to_string()
                }
            } else {
                format!("alias of {}", kind.as_str())
            };
            let plans = if kind.uses_planning() { "yes" } else { "no" };
            Some(vec![name, role, plans.to_string()])
        })
        .collect()
}

pub fn run() {
    let columns = vec![
        Column::left("Agent"),
        Column::left("Kind"),
        Column::left("Plans"),
    ];
    print!("{}", render_table(&columns, &rows()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_selectable_name() {
        let rows = rows();
        assert_eq!(rows.len(), AgentKind::selectable_names().len());
        let planner = rows.iter().find(|r| r[0] == "Planner_Webrun_Agent").unwrap();
        assert_eq!(planner[2], "yes");
        let alias = rows
            .iter()
            .find(|r| r[0] == "Search_Click_Control_Webrun_Agent")
            .unwrap();
        assert!(alias[1].starts_with("alias of"));
    }
}

//! Normalizes raw model output into the environment's action vocabulary.

use webrun_core::AvailableActions;

/// Map raw model text onto `search[...]` / `click[...]`.
///
/// Text starting with `search` becomes `search[<query>]`. Text starting with
/// `click` becomes `click[<target>]` for the first available target (in
/// declared order) whose lowercase label occurs in the text. Anything else,
/// including a click with no matching target, is returned unchanged.
pub fn parse_action(text: &str, available: &AvailableActions) -> String {
    let normalized = text.trim().to_lowercase();

    if normalized.starts_with("search") {
        return format!("search[{}]", get_query(&normalized));
    }

    if normalized.starts_with("click") {
        if let Some(target) = available
            .clickables
            .iter()
            .find(|target| normalized.contains(&target.to_lowercase()))
        {
            return format!("click[{target}]");
        }
    }

    text.to_string()
}

/// Extract the query from text starting with `search`.
///
/// `search[red shoes]` gives `red shoes`; free text such as
/// `search for red shoes` gives everything after the keyword.
pub fn get_query(text: &str) -> String {
    let rest = text.trim();
    let rest = rest
        .get(..6)
        .filter(|head| head.eq_ignore_ascii_case("search"))
        .map(|_| &rest[6..])
        .unwrap_or(rest);
    let rest = rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace());

    if let Some(inner) = rest.strip_prefix('[') {
        let end = inner.rfind(']').unwrap_or(inner.len());
        return inner[..end].trim().to_string();
    }
    rest.trim().to_string()
}

/// Pull the shopping instruction out of the reset page.
///
/// Pages are `[SEP]`-delimited; the instruction is the segment following the
/// `Instruction:` marker. Falls back to the whole observation.
pub fn extract_instruction(observation: &str) -> String {
    let segments: Vec<&str> = observation.split("[SEP]").map(str::trim).collect();
    if let Some(pos) = segments
        .iter()
        .position(|s| s.eq_ignore_ascii_case("instruction:"))
    {
        if let Some(instruction) = segments.get(pos + 1).filter(|s| !s.is_empty()) {
            return instruction.to_string();
        }
    }
    if let Some(idx) = observation.find("Instruction:") {
        let rest = observation[idx + "Instruction:".len()..].trim();
        let end = rest.find("[SEP]").unwrap_or(rest.len());
        let instruction = rest[..end].trim();
        if !instruction.is_empty() {
            return instruction.to_string();
        }
    }
    observation.trim().to_string()
}

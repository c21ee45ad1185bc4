pub mod config;
pub mod evaluate;
pub mod graph;
pub mod policies;
pub mod progress;
pub mod search;
pub mod source;

use caviz::policy::PolicyState;
use colored::Colorize;

/// Left-align to `width` columns
///
/// Pad before coloring: escape codes would otherwise count toward the width.
pub fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

/// Colored short state name, padded to `width` for tables
pub fn state_display(state: &PolicyState, width: usize) -> String {
    let text = pad(state.short_name(), width);
    match state {
        PolicyState::Enabled => text.green().to_string(),
        PolicyState::ReportOnly => text.yellow().to_string(),
        PolicyState::Disabled => text.red().to_string(),
        PolicyState::Other(_) => text.dimmed().to_string(),
    }
}

/// Truncate to `max` characters (not bytes) with a trailing ellipsis
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        format!("{}...", name.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_name_counts_chars() {
        assert_eq!(truncate_name("short", 48), "short");
        assert_eq!(truncate_name("Zugriff für Gäste blockieren", 10), "Zugriff...");
    }

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_state_display_pads_visible_text() {
        colored::control::set_override(true);
        let shown = state_display(&PolicyState::ReportOnly, 15);
        assert!(shown.contains('\x1b'));
        assert_eq!(strip_ansi(&shown), "report-only    ");

        // a table row lines up no matter which state colors it
        let rows: Vec<String> = [PolicyState::Enabled, PolicyState::Disabled, PolicyState::Other("x".into())]
            .iter()
            .map(|state| strip_ansi(&format!("{}|", state_display(state, 12))))
            .collect();
        assert!(rows.iter().all(|r| r.chars().count() == 13), "{:?}", rows);
    }
}

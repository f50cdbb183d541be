// Formatting helpers for the tree table

use {crate::tree::FlatNode, ratatui::style::Color};

/// Format a hit age as "42s" or "3m05s"
pub fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

/// Shorten long identifiers (gear uuids) for display
pub fn short_key(key: &str, max: usize) -> String {
    if key.chars().count() <= max {
        key.to_string()
    } else {
        let head: String = key.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// Node color: hits orange, collapsed nodes dark blue, application grey, gears light blue
pub fn node_color(node: &FlatNode, collapsed: bool) -> Color {
    match node {
        FlatNode::Hit { .. } => Color::Rgb(0xfd, 0x8d, 0x3c),
        _ if collapsed => Color::Rgb(0x31, 0x82, 0xbd),
        FlatNode::Application { .. } => Color::Rgb(0xac, 0xac, 0xac),
        FlatNode::Gear { .. } => Color::Rgb(0xc6, 0xdb, 0xef),
    }
}

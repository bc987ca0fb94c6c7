use crossterm::style::Stylize;
use std::io::IsTerminal;

/// Whether stdout is a terminal, which turns on highlighting
pub fn stdout_is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Repository names are shown in yellow on a terminal
pub fn highlight(name: &str, enabled: bool) -> String {
    if enabled {
        name.yellow().to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight() {
        assert_eq!(highlight("repo.git", false), "repo.git");

        assert!(highlight("repo.git", true).contains("repo.git"));
    }
}

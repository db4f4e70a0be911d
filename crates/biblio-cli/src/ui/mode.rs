//! Output mode selection.

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One JSON document on stdout
    Json,
    /// Tab-separated lines, stable for scripts
    #[default]
    Plain,
    /// Tables, badges and colour for a terminal
    Pretty,
}

impl OutputMode {
    /// Pick the mode from flags, the configured format and the terminal.
    ///
    /// `--json` wins over everything. An explicit `--format` wins over the
    /// configured one. `plain` (or `TERM=dumb`, or a pipe) gives plain text.
    pub fn resolve(
        json_flag: bool,
        format_flag: Option<&str>,
        configured: Option<&str>,
        is_tty: bool,
        term_is_dumb: bool,
    ) -> Self {
        if json_flag {
            return Self::Json;
        }

        match format_flag.or(configured) {
            Some("json") => return Self::Json,
            Some("plain") => return Self::Plain,
            _ => {}
        }

        if is_tty && !term_is_dumb {
            Self::Pretty
        } else {
            Self::Plain
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_wins() {
        let mode = OutputMode::resolve(true, Some("plain"), Some("table"), true, false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn test_flag_beats_config() {
        let mode = OutputMode::resolve(false, Some("table"), Some("plain"), true, false);
        assert_eq!(mode, OutputMode::Pretty);
        let mode = OutputMode::resolve(false, None, Some("plain"), true, false);
        assert_eq!(mode, OutputMode::Plain);
    }

    #[test]
    fn test_configured_json() {
        let mode = OutputMode::resolve(false, None, Some("json"), false, false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn test_terminal_detection() {
        assert_eq!(OutputMode::resolve(false, None, None, true, false), OutputMode::Pretty);
        assert_eq!(OutputMode::resolve(false, None, None, true, true), OutputMode::Plain);
        assert_eq!(OutputMode::resolve(false, None, None, false, false), OutputMode::Plain);
    }
}

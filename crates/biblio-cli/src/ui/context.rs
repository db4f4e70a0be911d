//! Terminal detection for output decisions.

use std::io::IsTerminal;

use super::mode::OutputMode;

/// What the terminal supports and how output should be shaped.
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Whether colour output is enabled
    pub color: bool,
    /// Whether unicode symbols are enabled
    pub unicode: bool,
    /// Terminal width (columns)
    pub width: usize,
    pub mode: OutputMode,
    /// Whether stdin and stdout are both terminals
    pub interactive: bool,
}

/// Output flags collected from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiFlags<'a> {
    pub json: bool,
    pub format: Option<&'a str>,
    pub no_color: bool,
    pub ascii: bool,
}

impl UiContext {
    /// Detect the terminal and resolve the output mode.
    ///
    /// Colour is off when `--no-color` is passed, `NO_COLOR` is set, stdout is
    /// not a terminal or `TERM=dumb`.
    pub fn from_env(flags: UiFlags<'_>, configured_format: Option<&str>) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let term_is_dumb = std::env::var("TERM").map(|v| v == "dumb").unwrap_or(false);
        let no_color_env = std::env::var("NO_COLOR").is_ok();

        Self {
            color: is_tty && !flags.no_color && !no_color_env && !term_is_dumb,
            unicode: !flags.ascii,
            width: terminal_width().unwrap_or(80),
            mode: OutputMode::resolve(
                flags.json,
                flags.format,
                configured_format,
                is_tty,
                term_is_dumb,
            ),
            interactive: is_tty && std::io::stdin().is_terminal(),
        }
    }

    /// A fixed plain-text context.
    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            color: false,
            unicode: true,
            width: 80,
            mode: OutputMode::Plain,
            interactive: false,
        }
    }
}

fn terminal_width() -> Option<usize> {
    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 {
                return Some(width);
            }
        }
    }

    #[cfg(unix)]
    {
        use std::mem::MaybeUninit;

        let mut winsize = MaybeUninit::<libc::winsize>::uninit();
        // SAFETY: TIOCGWINSZ only writes into the winsize buffer we own.
        let result =
            unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, winsize.as_mut_ptr()) };
        if result == 0 {
            // SAFETY: ioctl returned 0, so the struct was filled in.
            let ws = unsafe { winsize.assume_init() };
            if ws.ws_col > 0 {
                return Some(ws.ws_col as usize);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_sets_mode() {
        let flags = UiFlags {
            json: true,
            ..UiFlags::default()
        };
        assert_eq!(UiContext::from_env(flags, None).mode, OutputMode::Json);
    }

    #[test]
    fn test_ascii_and_no_color() {
        let flags = UiFlags {
            no_color: true,
            ascii: true,
            ..UiFlags::default()
        };
        let ctx = UiContext::from_env(flags, None);
        assert!(!ctx.unicode);
        assert!(!ctx.color);
        assert!(ctx.width > 0);
    }
}

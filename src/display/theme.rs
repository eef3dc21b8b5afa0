//! Color policy for terminal output.

use is_terminal::IsTerminal;

pub struct Theme;

impl Theme {
    /// Plain output for stdout: `NO_COLOR` is set or stdout is not a terminal.
    pub fn stdout_is_plain() -> bool {
        Self::is_plain(&std::io::stdout())
    }

    /// Plain output for stderr, decided the same way as for stdout.
    pub fn stderr_is_plain() -> bool {
        Self::is_plain(&std::io::stderr())
    }

    fn is_plain(stream: &impl IsTerminal) -> bool {
        no_color_requested() || !stream.is_terminal()
    }
}

fn no_color_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

//! Shared utilities for bmx.

use std::borrow::Cow;
use std::ffi::OsStr;

/// Quote one word for a POSIX shell.
pub fn shell_quote(word: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(word))
}

/// Render a program and its arguments as a copy-pasteable shell line.
pub fn render_command_line<I, S>(program: &OsStr, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut line = shell_quote(&program.to_string_lossy()).into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(&arg.as_ref().to_string_lossy()));
    }
    line
}

/// Strip trailing whitespace from the contents of an args side-car.
pub fn normalize_runtime_args(raw: &str) -> &str {
    raw.trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command_line_quotes_when_needed() {
        let line = render_command_line(
            OsStr::new("hyperfine"),
            ["--warmup", "2", "tmp/bench/fib/m1 10 20"],
        );
        assert_eq!(line, "hyperfine --warmup 2 'tmp/bench/fib/m1 10 20'");
    }

    #[test]
    fn test_shell_quote_plain_word_untouched() {
        assert_eq!(shell_quote("tmp/bench/fib/m1"), "tmp/bench/fib/m1");
        assert_eq!(shell_quote("a b"), "'a b'");
    }

    #[test]
    fn test_normalize_runtime_args() {
        assert_eq!(normalize_runtime_args("10 20\n\n"), "10 20");
        assert_eq!(normalize_runtime_args("  5\t\n"), "  5");
        assert_eq!(normalize_runtime_args("\n"), "");
    }
}

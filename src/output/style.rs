// src/output/style.rs

//! ANSI colouring for the supervisor's own report lines.
//!
//! Child output is never touched; only change lines and the repeat marker
//! are painted, and only when colour is enabled.

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DEFAULT_FG: &str = "\x1b[39m";

/// Printed instead of a crash log identical to the previous one.
pub const FAILURE_REPEAT_MARKER: &str = ".";

/// What a report line is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// A change forwarded to the running child.
    Live,
    /// A change that restarts the child.
    Restart,
    /// A repeated failure.
    Failure,
}

impl Tone {
    fn color(self) -> &'static str {
        match self {
            Tone::Live => GREEN,
            Tone::Restart => YELLOW,
            Tone::Failure => RED,
        }
    }
}

/// Whether report lines carry ANSI colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStyle {
    color: bool,
}

impl ReportStyle {
    pub const PLAIN: Self = Self { color: false };
    pub const COLORED: Self = Self { color: true };

    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn is_colored(&self) -> bool {
        self.color
    }

    /// Wrap `text` in the tone's foreground colour, resetting only the
    /// foreground afterwards.
    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if self.color {
            format!("{}{text}{DEFAULT_FG}", tone.color())
        } else {
            text.to_string()
        }
    }

    /// A full change line, newline included.
    pub fn change_line(&self, tone: Tone, description: &str) -> String {
        let mut line = self.paint(tone, description);
        line.push('\n');
        line
    }

    pub fn repeat_marker(&self) -> String {
        self.paint(Tone::Failure, FAILURE_REPEAT_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_style_leaves_text_alone() {
        let style = ReportStyle::PLAIN;
        assert_eq!(style.change_line(Tone::Restart, "modified a.js"), "modified a.js\n");
        assert_eq!(style.repeat_marker(), FAILURE_REPEAT_MARKER);
    }

    #[test]
    fn colored_style_uses_one_colour_per_tone() {
        let style = ReportStyle::COLORED;
        assert_eq!(
            style.change_line(Tone::Live, "modified public/a.css"),
            "\x1b[32mmodified public/a.css\x1b[39m\n"
        );
        assert_eq!(
            style.change_line(Tone::Restart, "modified src/a.js"),
            "\x1b[33mmodified src/a.js\x1b[39m\n"
        );
        assert_eq!(style.repeat_marker(), "\x1b[31m.\x1b[39m");
    }
}

use std::io::IsTerminal;

use inksac::prelude::*;

/// Colours user-facing messages when stdout is a colour terminal.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color_support: ColorSupport,
}

impl Default for Painter {
    fn default() -> Self {
        Self::plain()
    }
}

impl Painter {
    /// Detects colour support; piped stdout always gets plain text.
    pub fn detect() -> Self {
        if !std::io::stdout().is_terminal() {
            return Self::plain();
        }
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    pub fn plain() -> Self {
        Self {
            color_support: ColorSupport::NoColor,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self.color_support, ColorSupport::NoColor)
    }

    pub fn error(&self, message: &str) -> String {
        if self.is_plain() {
            return message.to_string();
        }

        let error_style = Style::builder()
            .foreground(Color::Red)
            .bold()
            .build();

        message.style(error_style).to_string()
    }

    /// Style for a recalled command echoed back before it runs.
    pub fn recalled(&self, command: &str) -> String {
        if self.is_plain() {
            return command.to_string();
        }

        let hint_style = Style::builder()
            .foreground(Color::RGB(128, 128, 128))
            .build();

        command.style(hint_style).to_string()
    }
}

use std::io::{IsTerminal, Write};

use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// A message assembled from differently styled segments, printed to stderr.
pub struct StyledStr {
    messages: Vec<(Option<Style>, String)>,
}

impl StyledStr {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::labelled(Style::Success, "success: ", msg)
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::labelled(Style::Warning, "warning: ", msg)
    }

    fn labelled(style: Style, label: &str, msg: impl Into<String>) -> Self {
        let mut styled = Self::new();
        styled.push_str(Some(style), label.to_string());
        styled.push_str(None, msg.into());
        styled
    }

    pub fn push_str(&mut self, style: Option<Style>, msg: String) {
        if !msg.is_empty() {
            self.messages.push((style, msg));
        }
    }

    pub fn print_msg(&self) -> std::io::Result<()> {
        let choice = if std::io::stderr().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let bufwtr = BufferWriter::stderr(choice);
        let mut buffer = bufwtr.buffer();

        for (style, message) in &self.messages {
            let mut color = ColorSpec::new();
            match style {
                Some(Style::Success) => {
                    color.set_fg(Some(Color::Green));
                }
                Some(Style::Warning) => {
                    color.set_fg(Some(Color::Yellow));
                }
                None => {}
            }

            buffer.set_color(&color)?;
            write!(buffer, "{message}")?;
        }

        buffer.reset()?;
        writeln!(buffer)?;
        bufwtr.print(&buffer)?;

        Ok(())
    }

    /// Prints the message, ignoring a closed stderr.
    pub fn eprint(&self) {
        if let Err(error) = self.print_msg() {
            log::debug!("unable to write to stderr: {}", error);
        }
    }
}

impl Default for StyledStr {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Success,
    Warning,
}

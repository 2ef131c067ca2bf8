// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!
A notification backend that sends colorized output to the terminal.

Notes go to standard output; everything else goes to standard error. Only
the prefix of each line (`note:`, `warning:`, ...) is colorized.

*/

use anyhow::Error;
use std::backtrace::BacktraceStatus;
use std::fmt::Arguments;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::{ChatterLevel, NotificationBackend, NotificationKind};

fn prefix_spec(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(true);
    spec
}

/// A notification backend that writes colorized output to the terminal.
pub struct TermcolorNotificationBackend {
    chatter: ChatterLevel,
    stdout: StandardStream,
    stderr: StandardStream,
}

impl TermcolorNotificationBackend {
    /// Create a new TermcolorNotificationBackend.
    pub fn new(chatter: ChatterLevel) -> TermcolorNotificationBackend {
        TermcolorNotificationBackend {
            chatter,
            stdout: StandardStream::stdout(ColorChoice::Auto),
            stderr: StandardStream::stderr(ColorChoice::Auto),
        }
    }

    fn stream(&mut self, kind: NotificationKind) -> Option<&mut StandardStream> {
        match kind {
            NotificationKind::Note if self.chatter <= ChatterLevel::Minimal => None,
            NotificationKind::Note => Some(&mut self.stdout),
            _ => Some(&mut self.stderr),
        }
    }

    /// Write one line: a colorized prefix, then the message.
    fn line(&mut self, kind: NotificationKind, prefix: &str, args: Arguments) -> io::Result<()> {
        let color = match kind {
            NotificationKind::Note => Color::Green,
            NotificationKind::Warning => Color::Yellow,
            NotificationKind::Severe | NotificationKind::Fatal => Color::Red,
        };

        let stream = match self.stream(kind) {
            Some(s) => s,
            None => return Ok(()),
        };

        stream.set_color(&prefix_spec(color))?;
        write!(stream, "{prefix}")?;
        stream.reset()?;
        writeln!(stream, " {args}")
    }

    /// Report the causes of `err`, then its backtrace if one was captured.
    fn chain(
        &mut self,
        kind: NotificationKind,
        err: &Error,
        first_prefix: &str,
    ) -> io::Result<()> {
        let mut causes = err.chain();

        if let Some(top) = causes.next() {
            self.line(kind, first_prefix, format_args!("{top}"))?;
        }

        for cause in causes {
            self.line(kind, "caused by:", format_args!("{cause}"))?;
        }

        let backtrace = err.backtrace();

        if backtrace.status() == BacktraceStatus::Captured {
            self.line(kind, "debugging:", format_args!("backtrace follows:"))?;

            if let Some(s) = self.stream(kind) {
                writeln!(s, "{backtrace:?}")?;
            }
        }

        Ok(())
    }

    /// Print the information contained in an Error object: the error itself,
    /// the errors that caused it, and its backtrace if one was captured.
    ///
    /// This is how the CLI reports the error that ended a run.
    pub fn bare_error<E: Into<Error>>(&mut self, err: E) {
        // If the terminal itself is failing there is nobody left to tell.
        let _ = self.chain(NotificationKind::Severe, &err.into(), "error:");
    }
}

impl NotificationBackend for TermcolorNotificationBackend {
    fn notify(&mut self, kind: NotificationKind, args: Arguments, err: Option<Error>) {
        let prefix = match kind {
            NotificationKind::Note => "note:",
            NotificationKind::Warning => "warning:",
            NotificationKind::Severe => "severe:",
            NotificationKind::Fatal => "fatal:",
        };

        let _ = self.line(kind, prefix, args);

        if let Some(e) = err {
            let _ = self.chain(kind, &e, "caused by:");
        }
    }
}

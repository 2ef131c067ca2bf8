// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!
A framework for notifying users about what tools are doing.

This module provides a way for uvport programs to notify the user about
actions taken, problems, and so on. It is very narrowly targeted at the
command-line use case. The conversion pipelines take a `&mut dyn
NotificationBackend` so that library callers can silence or capture the
messages.

*/

pub mod termcolor;

use anyhow::Error;
use std::fmt::Arguments;
use std::result::Result as StdResult;

/// How chatty the notification system should be.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ChatterLevel {
    /// Only warnings and errors are reported.
    Minimal,

    /// Informational messages are reported too.
    Normal,
}

impl ChatterLevel {
    /// Interpret the value of the `--chatter` argument. Anything other than
    /// `minimal` gives the normal level.
    pub fn from_arg(value: Option<&str>) -> ChatterLevel {
        match value {
            Some("minimal") => ChatterLevel::Minimal,
            _ => ChatterLevel::Normal,
        }
    }
}

/// The kind of notification that is being produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NotificationKind {
    /// An informational notice.
    Note,

    /// Warning of an unusual condition; the program will likely perform as intended.
    Warning,

    /// Notification of a severe problem; the program will likely fail but will attempt to continue.
    Severe,

    /// Notification of a fatal error; the program must give up.
    Fatal,
}

/// Trait for type that handle notifications to the user.
pub trait NotificationBackend {
    /// Notify the user about an event.
    ///
    /// If `err` is not `None`, the information contained in the object should
    /// be reported after the main message.
    fn notify(&mut self, kind: NotificationKind, args: Arguments, err: Option<Error>);
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rn_notify {
    ($kind:ident, $dest:expr, $( $fmt_args:expr ),* ; $err:expr) => {
        $dest.notify(
            $crate::notify::NotificationKind::$kind,
            format_args!($( $fmt_args ),*),
            Some($err.into()),
        )
    };
    ($kind:ident, $dest:expr, $( $fmt_args:expr ),*) => {
        $dest.notify($crate::notify::NotificationKind::$kind, format_args!($( $fmt_args ),*), None)
    };
}

/// Send an informational notification to the user.
///
/// Standard usage looks like this:
///
/// ```rust,ignore
/// rn_note!(nb, "downloaded {} files", n_files);
/// ```
///
/// where `nb` is a type implementing the NotificationBackend trait. You may
/// also provide an Error value after a semicolon; the information it contains
/// will be printed after the informational message. This is not expected to
/// be common usage for this particular macro, but makes more sense for the
/// `rn_warning!`, `rn_severe!`, and `rn_fatal!` macros.
#[macro_export]
macro_rules! rn_note {
    ($($args:tt)*) => {
        $crate::__rn_notify!(Note, $($args)*)
    };
}

/// Warn the user of a problematic condition.
///
/// See the documentation of `rn_note!` for usage information. This macro
/// should be used when an unusual condition has been detected, but the task
/// at hand will likely succeed.
#[macro_export]
macro_rules! rn_warning {
    ($($args:tt)*) => {
        $crate::__rn_notify!(Warning, $($args)*)
    };
}

/// Notify the user of a severe problem.
///
/// See the documentation of `rn_note!` for usage information. This macro
/// should be used when an issue has been detected that makes it likely that
/// the task at hand cannot be completed successfully; however, the program
/// will attempt to continue.
#[macro_export]
macro_rules! rn_severe {
    ($($args:tt)*) => {
        $crate::__rn_notify!(Severe, $($args)*)
    };
}

/// Notify the user of a fatal problem.
///
/// See the documentation of `rn_note!` for usage information. This macro
/// should be used when an issue has been detected that forces the program to
/// give up on the task at hand. If the command-line interface is being used,
/// it will probably exit almost immediately after a fatal notification is
/// issued.
#[macro_export]
macro_rules! rn_fatal {
    ($($args:tt)*) => {
        $crate::__rn_notify!(Fatal, $($args)*)
    };
}

/// A no-op notification backend.
///
/// This empty structure implements the NotificationBackend trait. Its
/// `notify()` function does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotificationBackend {}

impl NoopNotificationBackend {
    /// Create a new NoopNotificationBackend object.
    pub fn new() -> NoopNotificationBackend {
        NoopNotificationBackend {}
    }
}

impl NotificationBackend for NoopNotificationBackend {
    fn notify(&mut self, _kind: NotificationKind, _args: Arguments, _err: Option<Error>) {}
}

/// A notification backend that keeps notifications in memory.
///
/// Tests use it to check what a pipeline reported. The messages can also be
/// replayed into another backend later.
#[derive(Debug, Default)]
pub struct BufferingNotificationBackend {
    buf: Vec<(NotificationKind, String, Option<Error>)>,
}

impl BufferingNotificationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over the buffered notifications as `(kind, text)` pairs.
    pub fn messages(&self) -> impl Iterator<Item = (NotificationKind, &str)> {
        self.buf.iter().map(|(kind, text, _)| (*kind, text.as_str()))
    }

    /// Send the buffered notifications on to a different backend.
    pub fn drain(self, other: &mut dyn NotificationBackend) {
        for (kind, text, err) in self.buf {
            other.notify(kind, format_args!("{text}"), err);
        }
    }
}

impl NotificationBackend for BufferingNotificationBackend {
    fn notify(&mut self, kind: NotificationKind, args: Arguments, err: Option<Error>) {
        self.buf.push((kind, args.to_string(), err));
    }
}

/// An extension trait for adding standard notification arguments to a clap
/// Command object.
pub trait ClapNotificationArgsExt {
    /// Add standard uvport notification-related arguments to this Command.
    fn uvport_notify_args(self) -> Self;
}

impl ClapNotificationArgsExt for clap::Command {
    fn uvport_notify_args(self) -> Self {
        self.arg(
            clap::Arg::new("chatter_level")
                .long("chatter")
                .short('c')
                .value_name("LEVEL")
                .help("How much chatter to print when running")
                .value_parser(["default", "minimal"])
                .default_value("default")
                .global(true),
        )
    }
}

/// Run a function with colorized reporting of errors.
///
/// The return value is the process exit code: whatever the inner function
/// returns on success, and 1 if it fails.
pub fn run_with_notifications<E, F>(matches: clap::ArgMatches, inner: F) -> i32
where
    E: Into<Error>,
    F: FnOnce(clap::ArgMatches, &mut dyn NotificationBackend) -> StdResult<i32, E>,
{
    let chatter = ChatterLevel::from_arg(
        matches
            .get_one::<String>("chatter_level")
            .map(|s| s.as_str()),
    );
    let mut tnb = termcolor::TermcolorNotificationBackend::new(chatter);

    match inner(matches, &mut tnb) {
        Ok(ret) => ret,

        Err(e) => {
            tnb.bare_error(e);
            1
        }
    }
}

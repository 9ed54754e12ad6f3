use std::sync::RwLock;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use strum_macros::{Display, EnumString};
use thiserror::Error;

static LOG: RwLock<Output> = RwLock::new(Output::new(false, Verbosity::Normal));

pub fn init(stdout_json: bool, verbosity: Verbosity) {
    let mut log = match LOG.write() {
        Ok(log) => log,
        Err(poisoned) => poisoned.into_inner(),
    };
    *log = Output::new(stdout_json, verbosity);
}

fn current() -> Output {
    match LOG.read() {
        Ok(log) => *log,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn get_verbosity() -> Verbosity {
    current().verbosity
}

fn output_as_json() -> bool {
    current().stdout_json
}

/// Severity of a diagnostic line; each one is printed from a minimum `Verbosity` upward.
#[derive(Clone, Copy, PartialEq, Debug, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    fn threshold(self) -> Verbosity {
        match self {
            Level::Warn => Verbosity::Normal,
            Level::Info => Verbosity::Info,
            Level::Debug => Verbosity::Debug,
            Level::Trace => Verbosity::Trace,
        }
    }
}

pub fn emit(level: Level, args: std::fmt::Arguments) {
    if get_verbosity().rank() >= level.threshold().rank() {
        eprintln!("{}", format!("{}:\t{}", level, args).dimmed())
    }
}

macro_rules! warning {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Warn, format_args!($($arg)*))
    };
}
pub(crate) use warning;

macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Info, format_args!($($arg)*))
    };
}
pub(crate) use info;

macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Debug, format_args!($($arg)*))
    };
}
pub(crate) use debug;

macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Level::Trace, format_args!($($arg)*))
    };
}
pub(crate) use trace;

#[derive(Debug, Error)]
pub enum StdoutError {
    #[error("Couldn't serialize stdout: {source}")]
    JSONConversionException { source: serde_json::Error },
}

pub fn stdoutln<T: Stdout>(out: &T) -> Result<(), StdoutError> {
    if output_as_json() {
        let out_str = serde_json::to_string(out)
            .map_err(|source| StdoutError::JSONConversionException { source })?;
        println!("{}", out_str);
    } else {
        println!("{}", out.standard(get_verbosity()));
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Debug, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Verbosity {
    Normal,
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn rank(self) -> u8 {
        match self {
            Verbosity::Quiet => 0,
            Verbosity::Normal => 1,
            Verbosity::Info => 2,
            Verbosity::Debug => 3,
            Verbosity::Trace => 4,
        }
    }
}

#[derive(Clone, Copy)]
struct Output {
    verbosity: Verbosity,
    stdout_json: bool,
}

impl Output {
    const fn new(stdout_json: bool, verbosity: Verbosity) -> Self {
        Output {
            stdout_json,
            verbosity,
        }
    }
}

pub trait Message {
    fn standard(&self, verbosity: Verbosity) -> ColoredString;
}

pub trait Stdout: Serialize + Message {}

//! Error taxonomy and the sticky single-slot error context.
//!
//! The numeric ranges mirror the wire-compatible taxonomy used by the
//! engine this crate's API is modeled on: 0 is success, 10 is a non-fatal
//! warning, 100-199 are input/validation errors, 200-299 are simulation
//! numerical errors, 300-399 are file I/O errors, 400-409 are API
//! lifecycle errors, 410-429 are API value errors, and 430-439 are
//! output-file format errors.

use std::cell::Cell;
use thiserror::Error;

/// All engine errors, grouped so that `code()` reproduces the legacy
/// numeric ranges without the rest of the crate having to know them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    // --- 10: warnings -----------------------------------------------
    #[error("run completed but issued warnings")]
    RunIssuedWarnings,

    // --- 100-199: input / validation ---------------------------------
    #[error("input file could not be read")]
    InputFileError,
    #[error("project topology is invalid: {0}")]
    InvalidTopology(String),

    // --- 200-299: simulation numerical errors -------------------------
    #[error("routing time step fell below the minimum allowed step")]
    TimeStepTooSmall,
    #[error("routing failed to converge after the maximum number of trials")]
    NonConvergence,

    // --- 300-399: file I/O --------------------------------------------
    #[error("could not open file {path}: {reason}")]
    FileOpen { path: String, reason: String },
    #[error("could not write to file {path}: {reason}")]
    FileWrite { path: String, reason: String },
    #[error("could not read from file {path}: {reason}")]
    FileRead { path: String, reason: String },

    // --- 400-409: API lifecycle ---------------------------------------
    #[error("a project is already open in this process")]
    AlreadyOpen,
    #[error("no project is open")]
    NotOpen,
    #[error("the simulation has not been started")]
    NotStarted,
    #[error("the simulation has already ended")]
    AlreadyEnded,
    #[error("the simulation is still running")]
    StillRunning,

    // --- 410-429: API value errors -------------------------------------
    #[error("unrecognized object type")]
    ObjectType,
    #[error("object index {0} is out of range")]
    ObjectIndex(i32),
    #[error("unrecognized property code {0}")]
    PropertyCode(i32),
    #[error("value {0} is not valid for this property")]
    PropertyValue(f64),
    #[error("reporting period {0} is out of range")]
    PeriodRange(i32),
    #[error("property is not writable in the current lifecycle state")]
    NotWritable,

    // --- 430-439: output-file format errors -----------------------------
    #[error("output file header/epilogue magic number mismatch")]
    InvalidFile,
    #[error("output file contains no reporting periods")]
    NoResults,
    #[error("could not allocate result buffer")]
    Memory,

    // --- hot-start --------------------------------------------------
    #[error("hot-start file format version {found} is not compatible with {expected}")]
    HotStartVersion { expected: u32, found: u32 },
    #[error("hot-start file topology does not match the open project")]
    HotStartTopology,
}

impl EngineError {
    /// The legacy numeric code for this error, preserved for wire
    /// compatibility with callers that switch on an integer.
    pub fn code(&self) -> i32 {
        use EngineError::*;
        match self {
            RunIssuedWarnings => 10,
            InputFileError => 101,
            InvalidTopology(_) => 102,
            TimeStepTooSmall => 201,
            NonConvergence => 202,
            FileOpen { .. } => 301,
            FileWrite { .. } => 302,
            FileRead { .. } => 303,
            AlreadyOpen => 400,
            NotOpen => 401,
            NotStarted => 402,
            AlreadyEnded => 403,
            StillRunning => 404,
            ObjectType => 410,
            ObjectIndex(_) => 411,
            PropertyCode(_) => 412,
            PropertyValue(_) => 413,
            PeriodRange(_) => 414,
            NotWritable => 415,
            InvalidFile => 430,
            NoResults => 431,
            Memory => 432,
            HotStartVersion { .. } => 433,
            HotStartTopology => 434,
        }
    }

    /// The lazily-formatted human-readable message, produced on demand
    /// rather than eagerly stored.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// A single sticky error slot. Setting 0 (`Ok`) is a no-op so that hot
/// paths can do `ctx.set(fallible_call())` without ever clobbering an
/// error a previous call already recorded. The context is cleared only
/// by an explicit `clear()`, typically at the start of a new lifecycle.
#[derive(Debug, Default)]
pub struct ErrorContext {
    error: Cell<Option<EngineError>>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            error: Cell::new(None),
        }
    }

    /// Records `result` if it is an error and nothing is sticky yet.
    /// Returns `result` unchanged so call sites can propagate with `?`.
    pub fn set<T>(&self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        if let Err(ref e) = result {
            self.set_error(e.clone());
        }
        result
    }

    /// Sets the sticky error directly unless one is already set.
    pub fn set_error(&self, err: EngineError) {
        let current = self.error.take();
        self.error.set(Some(current.unwrap_or(err)));
    }

    /// Returns the current sticky error code, 0 if none.
    pub fn code(&self) -> i32 {
        let current = self.error.take();
        let code = current.as_ref().map(|e| e.code()).unwrap_or(0);
        self.error.set(current);
        code
    }

    /// Returns a freshly produced message for the sticky error, if any.
    pub fn message(&self) -> Option<String> {
        let current = self.error.take();
        let msg = current.as_ref().map(|e| e.message());
        self.error.set(current);
        msg
    }

    pub fn is_set(&self) -> bool {
        let current = self.error.take();
        let set = current.is_some();
        self.error.set(current);
        set
    }

    pub fn clear(&self) {
        self.error.set(None);
    }

    /// The sticky error itself, if any, cloned out.
    pub fn get(&self) -> Option<EngineError> {
        let current = self.error.take();
        self.error.set(current.clone());
        current
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_error_is_not_clobbered() {
        let ctx = ErrorContext::new();
        ctx.set_error(EngineError::NotOpen);
        ctx.set_error(EngineError::AlreadyOpen);
        assert_eq!(ctx.code(), EngineError::NotOpen.code());
    }

    #[test]
    fn setting_ok_is_a_no_op() {
        let ctx = ErrorContext::new();
        let _: Result<()> = ctx.set(Ok(()));
        assert_eq!(ctx.code(), 0);
        assert!(!ctx.is_set());
    }

    #[test]
    fn clear_resets_the_slot() {
        let ctx = ErrorContext::new();
        ctx.set_error(EngineError::NonConvergence);
        ctx.clear();
        assert_eq!(ctx.code(), 0);
    }

    #[test]
    fn code_ranges_match_taxonomy() {
        assert_eq!(EngineError::RunIssuedWarnings.code(), 10);
        assert_eq!(EngineError::InputFileError.code() / 100, 1);
        assert_eq!(EngineError::NonConvergence.code() / 100, 2);
        assert_eq!(EngineError::FileOpen { path: String::new(), reason: String::new() }.code() / 100, 3);
        assert!((400..410).contains(&EngineError::AlreadyOpen.code()));
        assert!((410..430).contains(&EngineError::ObjectType.code()));
        assert!((430..440).contains(&EngineError::InvalidFile.code()));
    }
}

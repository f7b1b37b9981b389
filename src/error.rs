//! Error types and the defect-severity policy described in the CFB specification's
//! error-handling design: structural anomalies are either raised as an error or
//! recorded as a diagnostic, depending on how severe they intrinsically are and
//! how strict the caller asked the container to be.

use std::fmt;

/// How severe a detected structural anomaly is.
///
/// Ordered so that `Fatal > Error > Warning`: a minimum-severity threshold of
/// `Error` accepts `Warning`-class diagnostics but raises on `Error` or `Fatal`.
/// This is a flat, totally ordered enum rather than an inheritance chain of
/// exception types, so the entire reporting policy collapses to one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// A structural deviation from MS-CFB, tagged with the severity it was detected at
/// and the field that triggered it.
#[derive(Debug, Clone)]
pub struct Defect {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.severity, self.field, self.message)
    }
}

/// Why a directory lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Id,
    Name,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Defect(Defect),

    #[error("no such {kind:?} entry: {key}")]
    NotFound { kind: LookupKind, key: String },

    #[error("entry name is not valid UTF-16: {0}")]
    InvalidName(#[from] std::string::FromUtf16Error),
}

impl Error {
    pub(crate) fn not_found_id(id: u32) -> Self {
        Error::NotFound {
            kind: LookupKind::Id,
            key: id.to_string(),
        }
    }

    pub(crate) fn not_found_name(name: &str) -> Self {
        Error::NotFound {
            kind: LookupKind::Name,
            key: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Container-wide policy object: given a detected anomaly's severity, decides
/// whether to fail the caller or to emit a diagnostic and let parsing continue.
#[derive(Debug, Clone, Copy)]
pub struct DefectReporter {
    minimum: Severity,
}

impl DefectReporter {
    pub fn new(minimum: Severity) -> Self {
        Self { minimum }
    }

    pub fn minimum(&self) -> Severity {
        self.minimum
    }

    /// Reports an anomaly of the given severity at `field`, describing it with
    /// `message`. Fails with `Error::Defect` when `severity >= self.minimum`;
    /// otherwise logs a `warn`-level diagnostic and returns `Ok`.
    pub fn report(&self, severity: Severity, field: &'static str, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        if severity >= self.minimum {
            Err(Error::Defect(Defect {
                severity,
                field,
                message,
            }))
        } else {
            log::warn!(target: "cfb::defect", "{} ({} below threshold {}): {}", field, severity, self.minimum, message);
            Ok(())
        }
    }

    pub fn fatal(&self, field: &'static str, message: impl Into<String>) -> Result<()> {
        self.report(Severity::Fatal, field, message)
    }

    pub fn error(&self, field: &'static str, message: impl Into<String>) -> Result<()> {
        self.report(Severity::Error, field, message)
    }

    pub fn warning(&self, field: &'static str, message: impl Into<String>) -> Result<()> {
        self.report(Severity::Warning, field, message)
    }
}

impl PartialEq for DefectReporter {
    fn eq(&self, other: &Self) -> bool {
        self.minimum == other.minimum
    }
}

#[allow(clippy::derivable_impls)]
impl Default for DefectReporter {
    fn default() -> Self {
        // Tolerant of metadata quirks, strict on genuine corruption (see the
        // error-handling design's note on the expected default caller policy).
        Self::new(Severity::Error)
    }
}

use std::fmt;

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// One or more `required` properties or parameters are absent
    MissingRequired,
    TypeMismatch,
    /// No documented template matches the request path
    UnknownPath,
    /// The template exists but does not document the request method
    UnknownMethod,
    /// Schema recursion exceeded the configured depth
    SchemaTooDeep,
    EnumMismatch,
    /// The payload is not parseable JSON
    InvalidBody,
    /// A required request body is empty
    MissingBody,
    InvalidContentType,
}

impl ValidationErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationErrorKind::MissingRequired => "missing-required",
            ValidationErrorKind::TypeMismatch => "type-mismatch",
            ValidationErrorKind::UnknownPath => "unknown-path",
            ValidationErrorKind::UnknownMethod => "unknown-method",
            ValidationErrorKind::SchemaTooDeep => "schema-too-deep",
            ValidationErrorKind::EnumMismatch => "enum-mismatch",
            ValidationErrorKind::InvalidBody => "invalid-body",
            ValidationErrorKind::MissingBody => "missing-body",
            ValidationErrorKind::InvalidContentType => "invalid-content-type",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure.
///
/// `location` is the JSON pointer of the violated schema inside the
/// specification (e.g. `#/components/schemas/city`); `instance_path` is the
/// JSON pointer of the offending value inside the payload, empty for the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub location: String,
    pub instance_path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        location: impl Into<String>,
        instance_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationError {
            kind,
            location: location.into(),
            instance_path: instance_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.location, self.message)
    }
}

/// Render errors as one message, `"; "` separated.
#[must_use]
pub fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Print a human readable error report to stderr.
pub fn print_errors(subject: &str, errors: &[ValidationError]) {
    eprintln!(
        "\n❌ {subject} failed validation. {} issue(s) found:\n",
        errors.len()
    );
    for error in errors {
        let at = if error.instance_path.is_empty() {
            "(root)"
        } else {
            error.instance_path.as_str()
        };
        eprintln!("[{}] {} at {}: {}", error.kind, error.location, at, error.message);
    }
    eprintln!();
}

//! Assertion evaluation for command subjects.
//!
//! Expectations are declared up front (`exist`, `contain=...`) and evaluated
//! against each new subject. Evaluation yields a [`Verdict`]; scheduling
//! retries around verdicts is the job of [`poll::Poller`].

pub mod poll;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::content::ReadContents;

/// A single declared expectation about a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// The subject must exist.
    Exist,
    /// The subject must not exist.
    NotExist,
    /// The subject must equal the given text.
    Equal(String),
    /// The subject must contain the given text.
    Contain(String),
    /// The subject must not contain the given text.
    NotContain(String),
    /// The subject must have exactly this many characters (or bytes).
    HaveLength(usize),
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exist => f.write_str("exist"),
            Self::NotExist => f.write_str("not.exist"),
            Self::Equal(text) => write!(f, "equal={text}"),
            Self::Contain(text) => write!(f, "contain={text}"),
            Self::NotContain(text) => write!(f, "not.contain={text}"),
            Self::HaveLength(len) => write!(f, "have.length={len}"),
        }
    }
}

impl FromStr for Assertion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (s.trim(), None),
        };
        let required =
            || value.map(str::to_string).ok_or_else(|| format!("`{name}` needs a value"));

        match name {
            "exist" => Ok(Self::Exist),
            "not.exist" => Ok(Self::NotExist),
            "equal" | "eq" => Ok(Self::Equal(required()?)),
            "contain" | "include" => Ok(Self::Contain(required()?)),
            "not.contain" | "not.include" => Ok(Self::NotContain(required()?)),
            "have.length" => {
                let raw = required()?;
                raw.trim()
                    .parse()
                    .map(Self::HaveLength)
                    .map_err(|_| format!("`have.length` needs a number, got {raw:?}"))
            }
            other => Err(format!("unknown assertion `{other}`")),
        }
    }
}

impl Serialize for Assertion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Assertion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Category of an assertion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The subject's presence did not match what was expected.
    Existence,
    /// The subject exists but its value is wrong.
    Value,
    /// The expectations themselves cannot be satisfied.
    Invalid,
}

/// A failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionError {
    /// What kind of failure this is.
    pub kind: FailureKind,
    /// User-facing message.
    pub message: String,
    /// Short documentation reference for the failure, if any.
    pub reference: Option<String>,
}

impl AssertionError {
    fn new(kind: FailureKind, message: String) -> Self {
        Self { kind, message, reference: None }
    }

    /// Returns `true` for presence mismatches.
    #[must_use]
    pub fn is_existence(&self) -> bool {
        self.kind == FailureKind::Existence
    }
}

/// Result of evaluating expectations against one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every expectation holds.
    Satisfied,
    /// An expectation failed but a newer subject might pass.
    Retryable(AssertionError),
    /// No subject can ever pass.
    Failed(AssertionError),
}

/// The set of expectations declared for a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expectations {
    assertions: Vec<Assertion>,
}

impl Expectations {
    /// No declared expectations.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps a list of assertions.
    #[must_use]
    pub fn new(assertions: Vec<Assertion>) -> Self {
        Self { assertions }
    }

    /// Adds an assertion.
    #[must_use]
    pub fn and(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Declared assertions in order.
    #[must_use]
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Returns `true` if the caller asserted non-existence.
    #[must_use]
    pub fn expects_absence(&self) -> bool {
        self.assertions.contains(&Assertion::NotExist)
    }

    /// Evaluates every expectation against `subject`.
    ///
    /// With `ensure_existence`, an absent subject fails unless the caller
    /// asserted `not.exist`.
    #[must_use]
    pub fn verify(&self, subject: &ReadContents, ensure_existence: bool) -> Verdict {
        let expects_absence = self.expects_absence();
        if expects_absence && self.assertions.contains(&Assertion::Exist) {
            return Verdict::Failed(AssertionError::new(
                FailureKind::Invalid,
                "cannot assert that the subject both exists and does not exist".to_string(),
            ));
        }

        if ensure_existence && !expects_absence && !subject.is_present() {
            return Verdict::Retryable(existence_failure(subject, true));
        }

        match self.assertions.iter().find_map(|assertion| check(assertion, subject)) {
            Some(err) => Verdict::Retryable(err),
            None => Verdict::Satisfied,
        }
    }
}

fn existence_failure(subject: &ReadContents, expected_present: bool) -> AssertionError {
    let negation = if expected_present { "" } else { "not " };
    AssertionError::new(
        FailureKind::Existence,
        format!("expected {} {negation}to exist", render(subject)),
    )
}

fn check(assertion: &Assertion, subject: &ReadContents) -> Option<AssertionError> {
    let value_failure = |message: String| Some(AssertionError::new(FailureKind::Value, message));
    let rendered = render(subject);

    match assertion {
        Assertion::Exist if !subject.is_present() => Some(existence_failure(subject, true)),
        Assertion::NotExist if subject.is_present() => Some(existence_failure(subject, false)),
        Assertion::Exist | Assertion::NotExist => None,
        Assertion::Equal(expected) => {
            if subject.as_bytes() == Some(expected.as_bytes()) {
                None
            } else {
                value_failure(format!("expected {rendered} to equal '{expected}'"))
            }
        }
        Assertion::Contain(needle) => {
            if contains(subject, needle) {
                None
            } else {
                value_failure(format!("expected {rendered} to include '{needle}'"))
            }
        }
        Assertion::NotContain(needle) => {
            if subject.is_present() && !contains(subject, needle) {
                None
            } else {
                value_failure(format!("expected {rendered} not to include '{needle}'"))
            }
        }
        Assertion::HaveLength(expected) => {
            let actual = match subject {
                ReadContents::Text(text) => Some(text.chars().count()),
                ReadContents::Bytes(bytes) => Some(bytes.len()),
                ReadContents::Absent => None,
            };
            match actual {
                Some(actual) if actual == *expected => None,
                Some(actual) => value_failure(format!(
                    "expected {rendered} to have a length of {expected} but got {actual}"
                )),
                None => {
                    value_failure(format!("expected {rendered} to have a length of {expected}"))
                }
            }
        }
    }
}

fn contains(subject: &ReadContents, needle: &str) -> bool {
    match subject {
        ReadContents::Text(text) => text.contains(needle),
        ReadContents::Bytes(bytes) => {
            needle.is_empty() || bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
        }
        ReadContents::Absent => false,
    }
}

fn render(subject: &ReadContents) -> String {
    match subject {
        ReadContents::Absent => "null".to_string(),
        ReadContents::Bytes(_) => subject.preview(),
        ReadContents::Text(_) => format!("'{}'", subject.preview()),
    }
}

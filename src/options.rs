//! Option normalization for the file commands.
//!
//! Both commands accept `(path, encodingOrOptions, options)`. The second
//! positional argument is either an encoding or an options bag; that
//! ambiguity is resolved once into [`EncodingOrOptions`] and then folded
//! into [`ReadOptions`] or [`WriteOptions`] by a pure defaulting function.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::Config;

/// Default text encoding when none is given.
pub const DEFAULT_ENCODING: &str = "utf8";

/// How bytes cross the backend boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Decode to text using the named encoding.
    Text(String),
    /// No decoding; the caller receives raw bytes.
    Raw,
}

impl Encoding {
    /// The default `utf8` text encoding.
    #[must_use]
    pub fn utf8() -> Self {
        Self::Text(DEFAULT_ENCODING.to_string())
    }

    /// Resolves an explicit encoding argument, where `None` stands for an
    /// explicit `null`. Empty names resolve to `utf8`.
    #[must_use]
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Raw,
            Some("") => Self::utf8(),
            Some(name) => Self::Text(name.to_string()),
        }
    }

    /// Returns the encoding name, or `None` for raw.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text(name) => Some(name),
            Self::Raw => None,
        }
    }

    /// Returns `true` for [`Encoding::Raw`].
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(name) => f.write_str(name),
            Self::Raw => f.write_str("null"),
        }
    }
}

// On the wire `Raw` is `null`, matching what the backend expects.
impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.name().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Encoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_arg(name.as_deref()))
    }
}

/// File-system flag used for writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteFlag {
    /// Create or truncate.
    #[default]
    #[serde(rename = "w")]
    Write,
    /// Create or append.
    #[serde(rename = "a")]
    Append,
    /// Create, failing if the file exists.
    #[serde(rename = "wx")]
    WriteExclusive,
    /// Append, failing if the file exists.
    #[serde(rename = "ax")]
    AppendExclusive,
    /// Create or truncate, opened read-write.
    #[serde(rename = "w+")]
    WriteRead,
    /// Create or append, opened read-write.
    #[serde(rename = "a+")]
    AppendRead,
}

impl WriteFlag {
    /// Returns the flag as the backend spells it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Write => "w",
            Self::Append => "a",
            Self::WriteExclusive => "wx",
            Self::AppendExclusive => "ax",
            Self::WriteRead => "w+",
            Self::AppendRead => "a+",
        }
    }

    /// Returns `true` when writes append instead of truncating.
    #[must_use]
    pub fn appends(self) -> bool {
        matches!(self, Self::Append | Self::AppendExclusive | Self::AppendRead)
    }

    /// Returns `true` when the write must create a new file.
    #[must_use]
    pub fn exclusive(self) -> bool {
        matches!(self, Self::WriteExclusive | Self::AppendExclusive)
    }
}

impl fmt::Display for WriteFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriteFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w" => Ok(Self::Write),
            "a" => Ok(Self::Append),
            "wx" => Ok(Self::WriteExclusive),
            "ax" => Ok(Self::AppendExclusive),
            "w+" => Ok(Self::WriteRead),
            "a+" => Ok(Self::AppendRead),
            other => Err(format!("unsupported write flag: {other}")),
        }
    }
}

/// Options bag as supplied by the caller. Every field is optional so the
/// defaults can tell "unset" from "explicitly set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserOptions {
    /// `None` when unset, `Some(None)` for an explicit `null`.
    #[serde(deserialize_with = "explicit_null")]
    pub encoding: Option<Option<String>>,
    /// Whether to emit a command log entry.
    pub log: Option<bool>,
    /// Read retry budget in milliseconds.
    pub timeout: Option<u64>,
    /// Write flag; empty strings fall back to the default.
    #[serde(deserialize_with = "optional_flag")]
    pub flag: Option<WriteFlag>,
}

fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn optional_flag<'de, D>(deserializer: D) -> Result<Option<WriteFlag>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// The second positional argument of both commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingOrOptions {
    /// A legacy encoding argument; `None` is an explicit `null`.
    Encoding(Option<String>),
    /// An options bag, which replaces the third argument entirely.
    Options(UserOptions),
}

/// Positional arguments after the path, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    /// The ambiguous second argument, if given.
    pub second: Option<EncodingOrOptions>,
    /// The trailing options bag.
    pub options: UserOptions,
}

impl CallArgs {
    /// No encoding and no options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A positional text encoding.
    #[must_use]
    pub fn encoding(name: impl Into<String>) -> Self {
        Self { second: Some(EncodingOrOptions::Encoding(Some(name.into()))), ..Self::default() }
    }

    /// A positional explicit `null` encoding (raw bytes).
    #[must_use]
    pub fn raw() -> Self {
        Self { second: Some(EncodingOrOptions::Encoding(None)), ..Self::default() }
    }

    /// An options bag in the second position.
    #[must_use]
    pub fn options(options: UserOptions) -> Self {
        Self { second: Some(EncodingOrOptions::Options(options)), ..Self::default() }
    }

    /// Sets the trailing options bag.
    #[must_use]
    pub fn with_options(mut self, options: UserOptions) -> Self {
        self.options = options;
        self
    }

    /// Splits the overload into the positional encoding and the effective
    /// options bag.
    fn resolve(self) -> (Option<Encoding>, UserOptions) {
        match self.second {
            Some(EncodingOrOptions::Options(options)) => (None, options),
            Some(EncodingOrOptions::Encoding(name)) => {
                (Some(Encoding::from_arg(name.as_deref())), self.options)
            }
            None => (None, self.options),
        }
    }
}

fn resolve_encoding(positional: Option<Encoding>, user: Option<Option<String>>) -> Encoding {
    match user {
        Some(explicit) => Encoding::from_arg(explicit.as_deref()),
        None => positional.unwrap_or_else(Encoding::utf8),
    }
}

/// Fully-defaulted options for `readFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// How contents are decoded.
    pub encoding: Encoding,
    /// Whether a command log entry is emitted.
    pub log: bool,
    /// Total retry budget for assertions.
    pub timeout: Duration,
}

impl ReadOptions {
    /// Applies read defaults to the caller's arguments.
    #[must_use]
    pub fn normalize(args: CallArgs, config: &Config) -> Self {
        let (positional, user) = args.resolve();
        Self {
            encoding: resolve_encoding(positional, user.encoding),
            log: user.log.unwrap_or(true),
            timeout: user.timeout.map_or(config.command_timeout, Duration::from_millis),
        }
    }
}

/// Fully-defaulted options for `writeFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Encoding the backend uses to turn the wire string into bytes.
    pub encoding: Encoding,
    /// Whether a command log entry is emitted.
    pub log: bool,
    /// File-system flag for the write.
    pub flag: WriteFlag,
}

impl WriteOptions {
    /// Applies write defaults to the caller's arguments.
    #[must_use]
    pub fn normalize(args: CallArgs) -> Self {
        let (positional, user) = args.resolve();
        Self {
            encoding: resolve_encoding(positional, user.encoding),
            log: user.log.unwrap_or(true),
            flag: user.flag.unwrap_or_default(),
        }
    }
}

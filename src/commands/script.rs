//! YAML scripts of `readFile` / `writeFile` steps.
//!
//! ```yaml
//! - writeFile: ["out/data.json", {"id": 1}]
//! - readFile: ["out/data.json", {"timeout": 500}]
//!   should: ["exist", "contain=\"id\""]
//! ```
//!
//! Arguments are raw JSON values, so a step goes through the same overload
//! resolution and argument checks as a direct call.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::assertion::Expectations;
use crate::content::{Contents, ReadContents};
use crate::context::ServiceContext;
use crate::error::{CommandError, CommandName};
use crate::options::{CallArgs, EncodingOrOptions, UserOptions};

use super::{read_file::read_file, write_file::write_file};

/// Errors raised while loading or running a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse script {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    #[error("Step {index}: invalid options: {source}")]
    InvalidOptions {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Step {index}: {source}")]
    Command {
        index: usize,
        #[source]
        source: CommandError,
    },
}

/// One step as written in the script.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Step {
    /// Arguments for `readFile`.
    pub read_file: Option<Vec<Value>>,
    /// Arguments for `writeFile`.
    pub write_file: Option<Vec<Value>>,
    /// Expectations for a `readFile` step.
    #[serde(default)]
    pub should: Expectations,
}

/// What a step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Position in the script, starting at 1.
    pub index: usize,
    /// Which command ran.
    pub command: CommandName,
    /// Path argument.
    pub file: String,
    /// Contents yielded by a `readFile` step.
    pub yielded: Option<ReadContents>,
}

/// Loads a script file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a list of steps.
pub fn load(path: &Path) -> Result<Vec<Step>, ScriptError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ScriptError::Read { path: path.to_path_buf(), source })?;
    serde_yaml::from_str(&text)
        .map_err(|source| ScriptError::Parse { path: path.to_path_buf(), source })
}

/// Runs steps in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first step that is malformed or whose command fails.
pub async fn run_steps(
    ctx: &ServiceContext,
    steps: &[Step],
) -> Result<Vec<StepReport>, ScriptError> {
    let mut reports = Vec::with_capacity(steps.len());
    for (offset, step) in steps.iter().enumerate() {
        let index = offset + 1;
        let report = match (&step.read_file, &step.write_file) {
            (Some(args), None) => run_read(ctx, index, args, &step.should).await?,
            (None, Some(args)) => {
                if !step.should.assertions().is_empty() {
                    return Err(invalid_step(index, "`should` only applies to readFile"));
                }
                run_write(ctx, index, args).await?
            }
            _ => return Err(invalid_step(index, "expected exactly one of readFile or writeFile")),
        };
        reports.push(report);
    }
    Ok(reports)
}

async fn run_read(
    ctx: &ServiceContext,
    index: usize,
    args: &[Value],
    should: &Expectations,
) -> Result<StepReport, ScriptError> {
    let file = path_arg(CommandName::ReadFile, index, args.first())?;
    let call = call_args(index, args.get(1), args.get(2))?;
    let yielded = read_file(ctx, &file, call, should)
        .await
        .map_err(|source| ScriptError::Command { index, source })?;
    Ok(StepReport { index, command: CommandName::ReadFile, file, yielded: Some(yielded) })
}

async fn run_write(
    ctx: &ServiceContext,
    index: usize,
    args: &[Value],
) -> Result<StepReport, ScriptError> {
    let file = path_arg(CommandName::WriteFile, index, args.first())?;
    let contents = match args.get(1) {
        Some(Value::String(text)) => Contents::Text(text.clone()),
        Some(value) => Contents::Structured(value.clone()),
        None => Contents::Structured(Value::Null),
    };
    let call = call_args(index, args.get(2), args.get(3))?;
    write_file(ctx, &file, contents, call)
        .await
        .map_err(|source| ScriptError::Command { index, source })?;
    Ok(StepReport { index, command: CommandName::WriteFile, file, yielded: None })
}

fn path_arg(cmd: CommandName, index: usize, arg: Option<&Value>) -> Result<String, ScriptError> {
    match arg {
        Some(Value::String(path)) => Ok(path.clone()),
        other => {
            let rendered = other.map_or_else(|| "undefined".to_string(), Value::to_string);
            let source = CommandError::invalid_argument(cmd, rendered);
            Err(ScriptError::Command { index, source })
        }
    }
}

fn call_args(
    index: usize,
    second: Option<&Value>,
    third: Option<&Value>,
) -> Result<CallArgs, ScriptError> {
    let options = |value: &Value| {
        UserOptions::deserialize(value)
            .map_err(|source| ScriptError::InvalidOptions { index, source })
    };

    let mut call = CallArgs::new();
    call.second = match second {
        None => None,
        Some(value @ Value::Object(_)) => Some(EncodingOrOptions::Options(options(value)?)),
        Some(Value::Null) => Some(EncodingOrOptions::Encoding(None)),
        Some(Value::String(name)) => Some(EncodingOrOptions::Encoding(Some(name.clone()))),
        Some(other) => Some(EncodingOrOptions::Encoding(Some(other.to_string()))),
    };
    if let Some(value @ Value::Object(_)) = third {
        call.options = options(value)?;
    }
    Ok(call)
}

fn invalid_step(index: usize, reason: &str) -> ScriptError {
    ScriptError::InvalidStep { index, reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::adapters::memory::{BackendCall, InMemoryBackend, ManualClock};
    use crate::config::Config;
    use crate::options::{Encoding, WriteFlag};

    fn context(backend: &Arc<InMemoryBackend>) -> ServiceContext {
        ServiceContext::new(
            Box::new(Arc::clone(backend)),
            Box::new(ManualClock::new()),
            Config::default(),
        )
    }

    fn parse(yaml: &str) -> Vec<Step> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn write_then_read_structured_value() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let steps = parse(
            r#"
- writeFile: ["data.json", {"b": 2, "a": 1}]
- readFile: ["data.json"]
  should: ["exist", "contain=\"a\": 1"]
"#,
        );

        let reports = run_steps(&ctx, &steps).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[1].yielded,
            Some(ReadContents::Text("{\n  \"a\": 1,\n  \"b\": 2\n}".into()))
        );
    }

    #[tokio::test]
    async fn second_argument_is_disambiguated_by_type() {
        let backend = Arc::new(InMemoryBackend::new().with_file("a.txt", "hi"));
        let ctx = context(&backend);
        let steps = parse(
            r#"
- readFile: ["a.txt", null]
- readFile: ["a.txt", "latin1"]
- readFile: ["a.txt", {"encoding": "hex"}]
- writeFile: ["b.txt", "x", {"flag": "a"}]
"#,
        );
        run_steps(&ctx, &steps).await.unwrap();

        let calls = backend.calls();
        let encodings: Vec<Encoding> = calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Read { encoding, .. } => Some(encoding.clone()),
                BackendCall::Write(_) => None,
            })
            .collect();
        assert_eq!(
            encodings,
            vec![Encoding::Raw, Encoding::Text("latin1".into()), Encoding::Text("hex".into())]
        );
        let BackendCall::Write(request) = &calls[3] else { panic!("expected a write") };
        assert_eq!(request.flag, WriteFlag::Append);
        assert_eq!(request.encoding, Encoding::utf8());
    }

    #[tokio::test]
    async fn non_string_path_is_invalid_argument() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let steps = parse("- readFile: [42]\n");

        let err = run_steps(&ctx, &steps).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Step 1: `readFile()` must be passed a non-empty string as its 1st argument. \
             You passed: `42`."
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn stops_at_first_failing_step() {
        let backend = Arc::new(InMemoryBackend::new());
        let ctx = context(&backend);
        let steps = parse(
            r#"
- writeFile: ["n.txt", 5]
- writeFile: ["never.txt", "x"]
"#,
        );
        let err = run_steps(&ctx, &steps).await.unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Command { index: 1, source: CommandError::InvalidContents { .. } }
        ));
        assert!(backend.contents("never.txt").is_none());
    }

    #[tokio::test]
    async fn malformed_steps_are_rejected() {
        let ctx = context(&Arc::new(InMemoryBackend::new()));

        let both = vec![Step {
            read_file: Some(vec![json!("a")]),
            write_file: Some(vec![json!("a")]),
            ..Step::default()
        }];
        assert!(matches!(
            run_steps(&ctx, &both).await,
            Err(ScriptError::InvalidStep { index: 1, .. })
        ));

        let steps = parse("- writeFile: [\"a.txt\", \"x\"]\n  should: [\"exist\"]\n");
        assert!(matches!(
            run_steps(&ctx, &steps).await,
            Err(ScriptError::InvalidStep { index: 1, .. })
        ));

        let steps = parse("- readFile: [\"a.txt\", {\"flag\": \"zz\"}]\n");
        assert!(matches!(
            run_steps(&ctx, &steps).await,
            Err(ScriptError::InvalidOptions { index: 1, .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load(Path::new("/nonexistent/steps.yaml")).unwrap_err();
        assert!(matches!(err, ScriptError::Read { .. }));
    }
}

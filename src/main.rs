//! Purpose: `portal-codec` CLI entry point for inspecting request bodies offline.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (JSON reports or escaped text).
//! Invariants: Non-interactive errors and notices are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Attachments are only written when `--store` is given.
use std::error::Error as _;
use std::ffi::OsString;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod report_json;

use portal_codec::api::{
    Error, ErrorKind, MultipartConfig, NamingPolicy, ParseMode, StoreConfig, to_exit_code,
};
use portal_codec::notice::{Notice, notice_json};

const UPLOAD_DIR_ENV: &str = "PORTAL_UPLOAD_DIR";

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os().collect::<Vec<OsString>>()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `portal-codec <command> --help` for usage."));
            }
        },
    };

    init_tracing();

    let upload_dir = cli.dir.unwrap_or_else(default_upload_dir);
    command_dispatch::dispatch_command(cli.command, upload_dir)
        .map_err(add_decode_hint)
        .map_err(add_io_hint)
}

#[derive(Parser)]
#[command(
    name = "portal-codec",
    version,
    about = "Decode portal upload and quiz request bodies",
    long_about = None,
    after_help = r#"EXAMPLES
  $ portal-codec multipart --content-type 'multipart/form-data; boundary=X' --input body.bin
  $ portal-codec multipart --content-type "$CT" --input body.bin --preset video --store
  $ portal-codec json --input question.json --strict
  $ portal-codec escape 'He said "hi"'

LOGGING
  Set RUST_LOG=debug to trace every decoded part and entry on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        help = "Upload root for --store (default: $PORTAL_UPLOAD_DIR or ./uploads)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Decode a multipart/form-data body into fields and one attachment")]
    Multipart {
        #[arg(long, help = "Raw Content-Type header, including the boundary parameter")]
        content_type: String,
        #[arg(long, help = "Body file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "material")]
        preset: UploadPreset,
        #[arg(long, value_enum, default_value = "timestamped")]
        naming: NamingArg,
        #[arg(long, help = "Persist the attachment under the upload root")]
        store: bool,
        #[arg(long, help = "Fail if any part was skipped")]
        strict: bool,
    },
    #[command(about = "Decode a restricted JSON object body")]
    Json {
        #[arg(long, help = "Body file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, help = "Fail if any segment was skipped")]
        strict: bool,
    },
    #[command(about = "Escape text for embedding inside a JSON string literal")]
    Escape {
        text: Option<String>,
        #[arg(long, conflicts_with = "text", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum UploadPreset {
    Video,
    Material,
}

impl UploadPreset {
    fn multipart_config(self) -> MultipartConfig {
        match self {
            UploadPreset::Video => MultipartConfig::video(),
            UploadPreset::Material => MultipartConfig::material(),
        }
    }

    fn store_config(self, root: &Path) -> StoreConfig {
        match self {
            UploadPreset::Video => StoreConfig::videos(root),
            UploadPreset::Material => StoreConfig::materials(root),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum NamingArg {
    Timestamped,
    ContentHash,
}

impl From<NamingArg> for NamingPolicy {
    fn from(value: NamingArg) -> Self {
        match value {
            NamingArg::Timestamped => NamingPolicy::Timestamped,
            NamingArg::ContentHash => NamingPolicy::ContentHash,
        }
    }
}

fn parse_mode(strict: bool) -> ParseMode {
    if strict {
        ParseMode::Strict
    } else {
        ParseMode::Permissive
    }
}

fn default_upload_dir() -> PathBuf {
    std::env::var_os(UPLOAD_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("uploads"))
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn input_label(input: Option<&Path>) -> String {
    input
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>, Error> {
    match input {
        Some(path) if path != Path::new("-") => fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read input file")
                .with_path(path)
                .with_source(err)
        }),
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(buf)
        }
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn add_decode_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::MissingBoundary => {
            err.with_hint("Pass the full header, e.g. 'multipart/form-data; boundary=XYZ'.")
        }
        ErrorKind::EmptyAttachment => {
            err.with_hint("The file part carried a filename but no bytes; re-send the file.")
        }
        ErrorKind::Malformed => {
            err.with_hint("Drop --strict to decode permissively and inspect the notices.")
        }
        _ => err,
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::AlreadyExists => {
            err.with_hint("A stored file with that name exists. Re-run to draw a new name.")
        }
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        _ => err,
    }
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

/// Human text on a terminal, one compact JSON line otherwise.
fn emit_stderr(text: &str, value: &Value) {
    if io::stderr().is_terminal() {
        eprintln!("{text}");
        return;
    }
    let json = serde_json::to_string(value)
        .unwrap_or_else(|_| "{\"error\":{\"kind\":\"Internal\"}}".to_string());
    eprintln!("{json}");
}

fn emit_error(err: &Error) {
    emit_stderr(&error_text(err), &error_json(err));
}

fn emit_notice(notice: &Notice) {
    let text = format!("notice: {} (input: {})", notice.message, notice.input);
    emit_stderr(&text, &notice_json(notice));
}

fn notice_time_now() -> String {
    use time::format_description::well_known::Rfc3339;
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return String::new();
    };
    time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_default()
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

/// Optional context carried by an error, in display order.
fn error_context(err: &Error) -> Vec<(&'static str, Value)> {
    let mut context = Vec::new();
    if let Some(hint) = err.hint() {
        context.push(("hint", json!(hint)));
    }
    if let Some(field) = err.field() {
        context.push(("field", json!(field)));
    }
    if let Some(path) = err.path() {
        context.push(("path", json!(path.display().to_string())));
    }
    if let Some(offset) = err.offset() {
        context.push(("offset", json!(offset)));
    }
    let causes: Vec<String> = std::iter::successors(err.source(), |source: &&dyn std::error::Error| (*source).source())
        .map(ToString::to_string)
        .collect();
    if !causes.is_empty() {
        context.push(("causes", json!(causes)));
    }
    context
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    inner.extend(
        error_context(err)
            .into_iter()
            .map(|(key, value)| (key.to_string(), value)),
    );
    json!({ "error": inner })
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    for (label, value) in error_context(err) {
        let rendered = match value {
            Value::String(text) => text,
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        };
        lines.push(format!("{label}: {rendered}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{error_json, error_text};
    use portal_codec::api::{Error, ErrorKind};

    #[test]
    fn error_text_lists_context_lines() {
        let err = Error::new(ErrorKind::Usage).with_message("bad input");
        assert_eq!(error_text(&err), "error: bad input");

        let err = Error::new(ErrorKind::Malformed)
            .with_message("1 part(s) skipped")
            .with_hint("Drop --strict.")
            .with_offset(7);
        assert_eq!(
            error_text(&err),
            "error: 1 part(s) skipped\nhint: Drop --strict.\noffset: 7"
        );
    }

    #[test]
    fn error_json_carries_field_offset_and_causes() {
        let err = Error::new(ErrorKind::EmptyAttachment)
            .with_field("videoFile")
            .with_offset(12)
            .with_source(std::io::Error::other("disk gone"));
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "EmptyAttachment");
        assert_eq!(value["error"]["message"], "EmptyAttachment");
        assert_eq!(value["error"]["field"], "videoFile");
        assert_eq!(value["error"]["offset"], 12);
        assert_eq!(value["error"]["causes"][0], "disk gone");
        assert!(value["error"].get("hint").is_none());
    }
}

//! Purpose: Route parsed CLI commands to the codec entrypoints.
//! Role: Keeps `main.rs` focused on arg parsing and error rendering.
//! Invariants: Notices for skipped input go to stderr before the report reaches stdout.
use super::*;

use portal_codec::api::{AttachmentStore, JsonDecoder, MultipartDecoder, escape_json};
use portal_codec::notice::{skipped_part_notice, skipped_segment_notice};

pub(super) fn dispatch_command(
    command: Command,
    upload_dir: PathBuf,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Multipart {
            content_type,
            input,
            preset,
            naming,
            store,
            strict,
        } => {
            let body = read_input(input.as_deref())?;
            let label = input_label(input.as_deref());
            let config = preset.multipart_config().with_naming(naming.into());
            let form = MultipartDecoder::new(config).decode(&content_type, &body)?;

            let time = notice_time_now();
            for part in &form.skipped {
                emit_notice(&skipped_part_notice(part, "multipart", &label, &time));
            }
            if strict && let Some(first) = form.skipped.first() {
                return Err(Error::new(ErrorKind::Malformed)
                    .with_message(format!(
                        "{} part(s) skipped in multipart body; first: {}",
                        form.skipped.len(),
                        first.reason.as_str()
                    ))
                    .with_offset(first.offset));
            }

            let stored = if store {
                let attachment = form.attachment.as_ref().ok_or_else(|| {
                    Error::new(ErrorKind::Usage)
                        .with_message("body carries no attachment to store")
                        .with_hint("Drop --store, or send a part with a filename.")
                })?;
                let store = AttachmentStore::new(preset.store_config(&upload_dir));
                Some(store.persist(attachment)?)
            } else {
                None
            };

            emit_json(report_json::form_json(&form, stored.as_ref()));
            Ok(RunOutcome::ok())
        }
        Command::Json { input, strict } => {
            let body = read_input(input.as_deref())?;
            let label = input_label(input.as_deref());
            let text = String::from_utf8_lossy(&body);

            let decoded = JsonDecoder::new(parse_mode(strict)).decode(&text)?;
            let time = notice_time_now();
            for segment in &decoded.skipped {
                emit_notice(&skipped_segment_notice(segment, "json", &label, &time));
            }

            emit_json(report_json::decode_json(&decoded));
            Ok(RunOutcome::ok())
        }
        Command::Escape { text, input } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let body = read_input(input.as_deref())?;
                    String::from_utf8_lossy(&body).into_owned()
                }
            };
            println!("{}", escape_json(&text));
            Ok(RunOutcome::ok())
        }
    }
}

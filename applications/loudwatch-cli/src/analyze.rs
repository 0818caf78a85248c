//! `analyze`: loudness records as JSON lines

use crate::input::WavInput;
use anyhow::{Context, Result};
use loudwatch_analyzer::{AnalyzerError, AnalyzerSettings, LoudnessAnalyzer, LoudnessMessage};
use loudwatch_core::CoreError;
use std::io::Write;
use tracing::{info, warn};

/// Run the analyzer over `input`, writing one JSON object per record to `out`
///
/// A failed record query is logged and skipped; any other error aborts.
/// Returns the number of records written.
pub fn run(input: &mut WavInput, settings: AnalyzerSettings, out: &mut dyn Write) -> Result<usize> {
    let mut analyzer = LoudnessAnalyzer::new(settings).context("Invalid analyzer settings")?;
    analyzer
        .configure(input.info())
        .context("Failed to set up the loudness meter")?;

    let mut written = 0;
    while let Some(buffer) = input.next_buffer()? {
        match analyzer.process_buffer(&buffer) {
            Ok(()) => {}
            Err(e) if is_query_failure(&e) => warn!("Skipped a record: {}", e),
            Err(e) => return Err(e).context("Failed to process audio"),
        }
        written += write_messages(analyzer.drain_messages(), out)?;
    }

    analyzer.handle_eos().context("Failed to emit the final record")?;
    written += write_messages(analyzer.drain_messages(), out)?;
    out.flush()?;

    info!(
        "Wrote {} records for {} frames",
        written,
        analyzer.frames_processed()
    );
    Ok(written)
}

/// Meter queries fail per record, feeds fail for the whole buffer
fn is_query_failure(error: &AnalyzerError) -> bool {
    matches!(
        error,
        AnalyzerError::Core(CoreError::Meter { call, .. }) if !call.starts_with("add_frames")
    )
}

fn write_messages(messages: Vec<LoudnessMessage>, out: &mut dyn Write) -> Result<usize> {
    let count = messages.len();
    for message in messages {
        serde_json::to_writer(&mut *out, &message)?;
        out.write_all(b"\n")?;
    }
    Ok(count)
}

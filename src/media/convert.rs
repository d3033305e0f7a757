use std::path::Path;

use crate::{
    errors::{BotError, BotResult},
    process::{CommandRunner, Invocation},
};

/// Copies the streams of `input` into an mp4 container at `output`, no re-encoding.
pub async fn remux_to_mp4(
    runner: &dyn CommandRunner,
    media_tool: &str,
    input: &Path,
    output: &Path,
) -> BotResult<()> {
    let invocation = Invocation::new(media_tool)
        .args(["-y", "-i"])
        .arg(input)
        .args(["-c", "copy"])
        .arg(output);

    let result = runner
        .run(&invocation)
        .await
        .map_err(|e| BotError::external_command_error(media_tool, e.to_string()))?;

    if !result.success() {
        log::error!("Remux of {} failed: {}", input.display(), result.error_text());
        return Err(BotError::ConversionFailed(Box::new(
            BotError::external_command_error(media_tool, result.error_text()),
        )));
    }
    Ok(())
}

use std::path::Path;

use strum::{Display, EnumString};

use crate::{
    config::ToolPaths,
    errors::{BotError, BotResult},
    process::{CommandRunner, Invocation, ToolOutput},
};

/// Offset of the frame used as a thumbnail.
const THUMBNAIL_OFFSET: &str = "00:00:01.000";

/// Thumbnails are scaled to this width, height follows the aspect ratio.
const THUMBNAIL_WIDTH: u32 = 320;

/// Metadata steps run for every video before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProbeStep {
    #[strum(to_string = "extracting thumbnail")]
    Thumbnail,
    #[strum(to_string = "getting video duration")]
    Duration,
    #[strum(to_string = "getting video dimensions")]
    Dimensions,
}

/// How the probe tool prints stream width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DimensionsLayout {
    /// One `WxH` line.
    #[default]
    Csv,
    /// Width and height on two separate lines (the probe tool's `default` writer).
    #[strum(serialize = "default")]
    Lines,
}

impl DimensionsLayout {
    fn output_format(self) -> &'static str {
        match self {
            DimensionsLayout::Csv => "csv=s=x:p=0",
            DimensionsLayout::Lines => "default=noprint_wrappers=1:nokey=1",
        }
    }
}

/// Wraps the probe tool (duration, dimensions) and the media tool (thumbnails).
pub struct Prober<'a> {
    runner: &'a dyn CommandRunner,
    tools: &'a ToolPaths,
    layout: DimensionsLayout,
}

impl<'a> Prober<'a> {
    pub fn new(runner: &'a dyn CommandRunner, tools: &'a ToolPaths, layout: DimensionsLayout) -> Self {
        Self {
            runner,
            tools,
            layout,
        }
    }

    /// Duration in whole seconds, truncated.
    pub async fn duration(&self, path: &Path) -> BotResult<u32> {
        let invocation = Invocation::new(&self.tools.probe_tool)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path);
        let output = self.checked(&invocation).await?;
        parse_duration(&output.stdout)
    }

    pub async fn dimensions(&self, path: &Path) -> BotResult<(u32, u32)> {
        let invocation = Invocation::new(&self.tools.probe_tool)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=width,height"])
            .args(["-of", self.layout.output_format()])
            .arg(path);
        let output = self.checked(&invocation).await?;
        parse_dimensions(&output.stdout, self.layout)
    }

    /// Writes a frame from one second in, scaled to a fixed width, to `output`.
    pub async fn thumbnail(&self, video: &Path, output: &Path) -> BotResult<()> {
        let extract = Invocation::new(&self.tools.media_tool)
            .args(["-y", "-i"])
            .arg(video)
            .args(["-ss", THUMBNAIL_OFFSET, "-vframes", "1"])
            .arg(output);
        self.checked(&extract).await?;

        let resize = Invocation::new(&self.tools.media_tool)
            .args(["-y", "-i"])
            .arg(output)
            .arg("-vf")
            .arg(format!("scale={}:-1", THUMBNAIL_WIDTH))
            .arg(output);
        self.checked(&resize).await?;
        Ok(())
    }

    async fn checked(&self, invocation: &Invocation) -> BotResult<ToolOutput> {
        let output = self
            .runner
            .run(invocation)
            .await
            .map_err(|e| BotError::external_command_error(&invocation.program, e.to_string()))?;

        if !output.success() {
            return Err(BotError::external_command_error(
                &invocation.program,
                output.error_text(),
            ));
        }
        Ok(output)
    }
}

pub fn parse_duration(stdout: &str) -> BotResult<u32> {
    let text = stdout.trim();
    let seconds = text
        .parse::<f64>()
        .map_err(|e| BotError::ParseError(format!("Failed to parse duration '{}': {}", text, e)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(BotError::ParseError(format!(
            "Duration '{}' is out of range",
            text
        )));
    }
    Ok(seconds.trunc() as u32)
}

/// Parses width and height, insisting on exactly the line count the layout produces.
pub fn parse_dimensions(stdout: &str, layout: DimensionsLayout) -> BotResult<(u32, u32)> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let expected = match layout {
        DimensionsLayout::Csv => 1,
        DimensionsLayout::Lines => 2,
    };
    if lines.len() != expected {
        return Err(BotError::ParseError(format!(
            "Expected {} line(s) of dimensions, got {}: '{}'",
            expected,
            lines.len(),
            stdout.trim()
        )));
    }

    let (width, height) = match layout {
        DimensionsLayout::Csv => lines[0].split_once('x').ok_or_else(|| {
            BotError::ParseError(format!("Dimensions '{}' are not WxH", lines[0]))
        })?,
        DimensionsLayout::Lines => (lines[0], lines[1]),
    };

    Ok((parse_side(width)?, parse_side(height)?))
}

fn parse_side(text: &str) -> BotResult<u32> {
    text.trim()
        .parse::<u32>()
        .map_err(|e| BotError::ParseError(format!("Failed to parse dimension '{}': {}", text, e)))
}

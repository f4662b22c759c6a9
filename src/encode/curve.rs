use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::audio::features::CurveFrame;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line: {"frame", "time", "bars"}
    #[default]
    Jsonl,
    /// Bare native-endian f32 bars, frame after frame
    Raw,
}

/// Streams curve frames to a file or stdout.
pub struct CurveWriter<W: Write> {
    out: BufWriter<W>,
    format: OutputFormat,
    frames: usize,
}

impl CurveWriter<Box<dyn Write>> {
    /// Opens `path` for writing; `-` means stdout.
    pub fn create(path: &Path, format: OutputFormat) -> Result<Self> {
        let sink: Box<dyn Write> = if path.as_os_str() == "-" {
            Box::new(std::io::stdout().lock())
        } else {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        };
        Ok(Self::new(sink, format))
    }
}

impl<W: Write> CurveWriter<W> {
    pub fn new(sink: W, format: OutputFormat) -> Self {
        Self {
            out: BufWriter::new(sink),
            format,
            frames: 0,
        }
    }

    pub fn write_frame(&mut self, frame: &CurveFrame) -> Result<()> {
        match self.format {
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.out, frame).context("Failed to encode frame")?;
                self.out.write_all(b"\n").context("Failed to write frame")?;
            }
            OutputFormat::Raw => {
                self.out
                    .write_all(bytemuck::cast_slice(&frame.bars))
                    .context("Failed to write frame")?;
            }
        }
        self.frames += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Flushes and hands back the underlying sink.
    pub fn finish(self) -> Result<W> {
        let frames = self.frames;
        let sink = self
            .out
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush output")?;
        log::info!("Wrote {} frames", frames);
        Ok(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(i: usize, bars: &[f32]) -> CurveFrame {
        CurveFrame {
            frame: i,
            time: i as f32 / 60.0,
            bars: bars.to_vec(),
        }
    }

    #[test]
    fn jsonl_writes_one_object_per_line() {
        let mut writer = CurveWriter::new(Vec::new(), OutputFormat::Jsonl);
        writer.write_frame(&frame(0, &[0.0, 0.5])).unwrap();
        writer.write_frame(&frame(1, &[1.0, 0.25])).unwrap();
        assert_eq!(writer.frames_written(), 2);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["frame"], 1);
        assert_eq!(second["bars"][0], 1.0);
        assert_eq!(second["bars"][1], 0.25);
    }

    #[test]
    fn raw_writes_packed_floats() {
        let mut writer = CurveWriter::new(Vec::new(), OutputFormat::Raw);
        writer.write_frame(&frame(0, &[0.5, 1.0, -2.0])).unwrap();
        writer.write_frame(&frame(1, &[0.0, 0.125, 3.0])).unwrap();

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len(), 6 * 4);
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, vec![0.5, 1.0, -2.0, 0.0, 0.125, 3.0]);
    }
}

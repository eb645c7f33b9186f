use anyhow::{anyhow, Context, Result};
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::capture::geometry::BoundingBox;

/// A word span as returned by the recognizer, in still-image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedSpan {
    pub text: String,
    pub bbox: BoundingBox,
}

/// An OCR engine. Any implementation returning spans in reading order works.
pub trait Recognizer: Send {
    /// Recognizes words in a PNG-encoded image.
    fn recognize(&self, png: &[u8], language: &str) -> Result<Vec<RecognizedSpan>>;
}

/// Runs the Tesseract command line tool with TSV output.
pub struct TesseractRecognizer {
    psm: u8,
    explicit_path: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(psm: u8, explicit_path: Option<String>) -> Self {
        Self { psm, explicit_path }
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, png: &[u8], language: &str) -> Result<Vec<RecognizedSpan>> {
        let tesseract_exe = find_tesseract_executable(self.explicit_path.as_deref())?;

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        std::fs::write(temp_input.path(), png).context("Failed to write OCR input image")?;

        // Create temporary output file (Tesseract adds .tsv extension)
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let mut command = Command::new(&tesseract_exe);
        command.arg(temp_input.path()).arg(&output_base);
        if let Some(tessdata_dir) = find_tessdata_dir() {
            command.arg("--tessdata-dir").arg(tessdata_dir);
        }
        let output = command
            .arg("-l")
            .arg(language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", tesseract_exe.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        let spans = parse_tsv_words(&tsv_content);
        log::debug!("Tesseract returned {} words", spans.len());
        Ok(spans)
    }
}

/// Parses Tesseract TSV output into word spans, keeping output order.
fn parse_tsv_words(tsv: &str) -> Vec<RecognizedSpan> {
    let mut spans = Vec::new();

    for line in tsv.lines().skip(1) {
        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // Level 5 = word
        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let numbers: Option<Vec<f32>> = fields[6..10].iter().map(|f| f.parse().ok()).collect();
        let Some(numbers) = numbers else {
            continue;
        };
        let (left, top, width, height) = (numbers[0], numbers[1], numbers[2], numbers[3]);

        spans.push(RecognizedSpan {
            text: text.to_string(),
            bbox: BoundingBox {
                x0: left,
                y0: top,
                x1: left + width,
                y1: top + height,
            },
        });
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_words() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t300\t60\t-1\t\n\
             4\t1\t1\t1\t1\t0\t5\t10\t290\t30\t-1\t\n\
             5\t1\t1\t1\t1\t1\t5\t10\t80\t30\t95.1\tHello,\n\
             5\t1\t1\t1\t1\t2\t100\t12\t90\t28\t91.0\tworld!\n"
        );

        let spans = parse_tsv_words(&tsv);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Hello,");
        assert_eq!(spans[0].bbox, BoundingBox { x0: 5.0, y0: 10.0, x1: 85.0, y1: 40.0 });
        assert_eq!(spans[1].text, "world!");
        assert_eq!(spans[1].bbox.x1, 190.0);
    }

    #[test]
    fn test_parse_tsv_skips_blank_and_malformed_rows() {
        let tsv = format!(
            "{HEADER}\n\
             5\t1\t1\t1\t1\t1\t5\t10\t80\t30\t95\t   \n\
             5\t1\t1\t1\t1\t2\tx\t10\t80\t30\t95\tbroken\n\
             5\t1\t1\n\
             5\t1\t1\t1\t1\t3\t1\t2\t3\t4\t88\tok\n"
        );

        let spans = parse_tsv_words(&tsv);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "ok");
    }
}

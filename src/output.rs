use std::io::{self, Write};

use serde::Serialize;

use crate::app::{FetchResult, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

/// Summary of one sample, as reported by `mri-data inspect`.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSummary {
    pub index: usize,
    pub file: String,
    pub label: f64,
    pub image_shape: Vec<usize>,
    pub tumor_pixels: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    pub root: String,
    pub len: usize,
    pub samples: Vec<SampleSummary>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_inspect(result: &InspectResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

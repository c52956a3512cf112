//! Recorded-response provider.
//!
//! Reads `<dir>/<phase>.json` for each request and runs it through the same
//! extraction as live answers. A missing file is reported as unavailable so a
//! partial recording stalls at the first unrecorded phase.
use super::{response, Inference, InferenceFailure, InferenceRequest};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReplayInference {
    dir: PathBuf,
}

impl ReplayInference {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReplayInference { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn response_path(&self, request: &InferenceRequest) -> PathBuf {
        self.dir.join(format!("{}.json", request.phase.as_str()))
    }
}

impl Inference for ReplayInference {
    fn name(&self) -> &str {
        "replay"
    }

    fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceFailure> {
        let path = self.response_path(request);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(InferenceFailure::Unavailable(format!(
                    "no recorded response at {}",
                    path.display()
                )));
            }
            Err(err) => {
                return Err(InferenceFailure::Transport(format!(
                    "read {}: {err}",
                    path.display()
                )));
            }
        };
        tracing::debug!(path = %path.display(), response_bytes = text.len(), "replay response");
        response::parse_response(&text)
    }
}

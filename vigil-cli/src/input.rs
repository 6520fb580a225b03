//! JSON-lines frame input, one `FrameDetections` object per line

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use vigil_eye::FrameDetections;

pub type FrameLines = Lines<BufReader<Box<dyn AsyncRead + Unpin + Send>>>;

/// Open a file, or stdin for "-"
pub async fn open(path: &str) -> anyhow::Result<FrameLines> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = if path == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open input {}", path))?;
        Box::new(file)
    };
    Ok(BufReader::new(reader).lines())
}

/// Parse one line; blank lines and `#` comments yield `None`
pub fn parse_frame(line: &str) -> Result<Option<FrameDetections>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

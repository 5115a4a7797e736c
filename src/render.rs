//! Diagram rendering collaborators

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Command;
use tracing::debug;

use crate::diagram::SipocDiagram;
use crate::error::{Result, SipocError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Turns a diagram into image bytes
pub trait DiagramRenderer: Send + Sync {
    fn render(&self, diagram: &SipocDiagram, format: ImageFormat) -> Result<Vec<u8>>;
}

/// Renders through the Graphviz `dot` executable
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    binary: String,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new("dot")
    }
}

impl GraphvizRenderer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Whether the configured binary can be executed
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary).arg("-V").output().is_ok()
    }
}

impl DiagramRenderer for GraphvizRenderer {
    fn render(&self, diagram: &SipocDiagram, format: ImageFormat) -> Result<Vec<u8>> {
        // Removed on drop, including on every early return below
        let mut source = tempfile::Builder::new()
            .prefix("sipoc-")
            .suffix(".dot")
            .tempfile()
            .map_err(|e| render_err(format!("cannot create temp file: {}", e)))?;
        source
            .write_all(diagram.to_dot().as_bytes())
            .and_then(|_| source.flush())
            .map_err(|e| render_err(format!("cannot write DOT source: {}", e)))?;

        debug!(binary = %self.binary, format = format.as_str(), "invoking graphviz");
        let output = Command::new(&self.binary)
            .arg(format!("-T{}", format.as_str()))
            .arg(source.path())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    render_err(format!("graphviz executable '{}' not found", self.binary))
                } else {
                    render_err(format!("failed to run '{}': {}", self.binary, e))
                }
            })?;

        if !output.status.success() {
            return Err(render_err(format!(
                "'{}' exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(render_err(format!("'{}' produced no output", self.binary)));
        }

        Ok(output.stdout)
    }
}

fn render_err(message: String) -> SipocError {
    SipocError::Render { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AnswerRecord;

    #[test]
    fn test_missing_binary_is_render_error() {
        let renderer = GraphvizRenderer::new("definitely-not-graphviz-7f3a");
        assert!(!renderer.is_available());

        let diagram = SipocDiagram::build(&AnswerRecord::new());
        let err = renderer.render(&diagram, ImageFormat::Png).unwrap_err();
        assert!(matches!(err, SipocError::Render { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_renders_svg_when_graphviz_present() {
        let renderer = GraphvizRenderer::default();
        if !renderer.is_available() {
            return;
        }
        let diagram = SipocDiagram::build(&AnswerRecord::new());
        let svg = renderer.render(&diagram, ImageFormat::Svg).unwrap();
        assert!(String::from_utf8_lossy(&svg).contains("<svg"));
    }
}

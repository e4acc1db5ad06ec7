//! Runtime configuration rendering using Tera.
//!
//! The template is data handed to the materializer, either the embedded
//! default or a file named in the configuration. The only variable is
//! `file_system_path`, the node's data directory.

pub mod embedded;

use crate::config::Config;
use crate::error::{NodeError, Result};
use crate::layout::NodeLayout;
use crate::persist;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

const CORE_TEMPLATE_NAME: &str = "core.yaml.j2";

/// Variable holding the node's data directory
pub const FILE_SYSTEM_PATH_VAR: &str = "file_system_path";

pub struct ConfigMaterializer {
    tera: Tera,
}

impl ConfigMaterializer {
    /// Materializer for the embedded core.yaml template
    pub fn from_embedded() -> Result<Self> {
        tracing::debug!("[ConfigMaterializer] Using embedded core.yaml template");
        Self::from_template(embedded::CORE_YAML)
    }

    /// Parse a template from text. A malformed template fails here, not at
    /// render time.
    pub fn from_template(content: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(CORE_TEMPLATE_NAME, content)
            .map_err(|e| NodeError::Template(format!("Failed to parse core.yaml template: {}", e)))?;
        Ok(Self { tera })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NodeError::io(path, e))?;
        tracing::info!(
            "[ConfigMaterializer] Loaded core.yaml template from {}",
            path.display()
        );
        Self::from_template(&content)
    }

    /// Template named by `peer.core_template`, embedded default otherwise
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.peer.core_template {
            Some(path) => Self::from_file(path),
            None => Self::from_embedded(),
        }
    }

    pub fn render(&self, file_system_path: &Path) -> Result<String> {
        let mut context = Context::new();
        context.insert(
            FILE_SYSTEM_PATH_VAR,
            &file_system_path.to_string_lossy().into_owned(),
        );

        self.tera
            .render(CORE_TEMPLATE_NAME, &context)
            .map_err(|e| NodeError::Template(format!("Failed to render core.yaml: {}", e)))
    }

    /// Render core.yaml for `layout` and write it into the node directory
    pub fn materialize(&self, layout: &NodeLayout) -> Result<PathBuf> {
        let rendered = self.render(&layout.data_dir())?;
        let output_path = layout.core_config_file();

        if let Some(parent) = output_path.parent() {
            persist::create_dir(parent)?;
        }
        persist::write_file(&output_path, rendered.as_bytes())?;

        tracing::info!(
            "[ConfigMaterializer] Rendered core.yaml to {}",
            output_path.display()
        );
        Ok(output_path)
    }
}

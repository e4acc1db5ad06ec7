//! Embedded runtime configuration templates, compiled into the binary so a
//! provisioned node does not depend on template files next to the executable.

/// Default peer core.yaml
pub static CORE_YAML: &str = include_str!("templates/core.yaml.j2");

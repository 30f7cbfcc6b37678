//! Hand-off of finished configurations to a virtualization engine.

use crate::error::{Error, Result};
use crate::vm::config::VmConfiguration;
use crate::vm::VmEngine;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

/// Serialization format of a configuration manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// TOML.
    Toml,
    /// YAML.
    Yaml,
}

impl OutputFormat {
    /// Render a configuration in this format.
    pub fn render(&self, config: &VmConfiguration) -> Result<String> {
        match self {
            OutputFormat::Json => {
                serde_json::to_string_pretty(config).map_err(|e| Error::Serialize(e.to_string()))
            }
            OutputFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::Serialize(e.to_string()))
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(config).map_err(|e| Error::Serialize(e.to_string()))
            }
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "toml" => Ok(OutputFormat::Toml),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(Error::config(format!(
                "unknown output format '{}': expected json, toml or yaml",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Toml => write!(f, "toml"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Engine that writes the configuration as a manifest for an external
/// launcher, either to a file or to stdout.
#[derive(Debug, Clone, Default)]
pub struct ManifestEngine {
    format: OutputFormat,
    output: Option<PathBuf>,
}

impl ManifestEngine {
    /// Write manifests in `format` to `output` (stdout when `None`).
    pub fn new(format: OutputFormat, output: Option<PathBuf>) -> Self {
        Self { format, output }
    }
}

impl VmEngine for ManifestEngine {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn is_available(&self) -> bool {
        match &self.output {
            None => true,
            Some(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
                _ => true,
            },
        }
    }

    fn submit(&self, config: VmConfiguration) -> Result<()> {
        let text = self.format.render(&config)?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, text)?;
                tracing::info!(
                    path = %path.display(),
                    format = %self.format,
                    "wrote vm configuration"
                );
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use crate::host::{FixedHost, PlatformVersion};
    use crate::vm::config::{BuildRequest, ConfigurationBuilder};
    use crate::vm::limits::ResourceLimits;
    use crate::vm::submit;

    fn sample_config(dir: &std::path::Path) -> VmConfiguration {
        let disk = dir.join("disk.img");
        std::fs::write(&disk, vec![0u8; 1024]).unwrap();
        let host = FixedHost {
            cores: 4,
            cpu_limits: ResourceLimits::new("cpu count", 1, 8).unwrap(),
            memory_limits: ResourceLimits::new("memory size", 1 << 27, 1 << 36).unwrap(),
            version: Some(PlatformVersion::new(14, 0, 0)),
        };
        let share = dir.join("share");
        std::fs::create_dir(&share).unwrap();
        ConfigurationBuilder::new(&host, &Defaults::default())
            .build(BuildRequest::new(disk).shared_directory(share))
            .unwrap()
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("toml".parse::<OutputFormat>().unwrap(), OutputFormat::Toml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());

        for format in [OutputFormat::Json, OutputFormat::Toml, OutputFormat::Yaml] {
            let text = format.render(&config).unwrap();
            assert!(
                text.contains("d6:a7:58:8e:78:d4"),
                "{} output: {}",
                format,
                text
            );
            assert!(text.contains("com.apple.virtio-fs.automount"));
        }
    }

    #[test]
    fn test_manifest_engine_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());
        let out = dir.path().join("vm.json");

        let engine = ManifestEngine::new(OutputFormat::Json, Some(out.clone()));
        submit(&engine, config.clone()).unwrap();

        let written: VmConfiguration =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written, config);
    }

    #[test]
    fn test_manifest_engine_unavailable_without_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample_config(dir.path());
        let out = dir.path().join("missing").join("vm.json");

        let engine = ManifestEngine::new(OutputFormat::Json, Some(out));
        assert!(!engine.is_available());
        let err = submit(&engine, config).unwrap_err();
        assert!(matches!(err, Error::EngineUnavailable(_)));
    }
}

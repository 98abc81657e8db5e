use crate::config::policy_config::PolicyConfig;
use crate::core::variants::VariantMode;
use crate::core::ConfigProvider;
use crate::utils::error::{GeoLinkError, Result};
use crate::utils::validation::{
    validate_allowed_values, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "geo-links.toml";
pub const OUTPUT_FORMATS: [&str; 3] = ["json", "md", "html"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub dataset: DatasetConfig,
    pub policy: PolicyConfig,
    pub sweep: SweepConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
}

/// Where the geo dataset lives. File names are relative to `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub root: String,
    pub clusters: String,
    pub adjacency: String,
    pub suburbs: String,
    pub suburb_meta: Option<String>,
    pub coverage: Option<String>,
    pub curated_neighbors: Option<String>,
    pub adjacency_overrides: Option<String>,
    /// Extra cluster aliases applied after slug normalization, e.g.
    /// `"brisbane-inner" = "brisbane"`.
    pub cluster_aliases: BTreeMap<String, String>,
    /// Treat every data-integrity issue as fatal.
    pub strict: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: "./data".to_string(),
            clusters: "clusters.json".to_string(),
            adjacency: "adjacency.json".to_string(),
            suburbs: "suburbs.json".to_string(),
            suburb_meta: Some("suburbs.meta.json".to_string()),
            coverage: Some("service-coverage.json".to_string()),
            curated_neighbors: Some("curated-neighbors.json".to_string()),
            adjacency_overrides: Some("adjacency.override.json".to_string()),
            cluster_aliases: BTreeMap::new(),
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Primary service; defaults to the first service in the coverage map.
    pub service: Option<String>,
    /// Services the production link pipeline renders.
    pub services: Vec<String>,
    pub mode: VariantMode,
    pub top: usize,
    #[serde(skip)]
    pub print_json: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            service: None,
            services: Vec::new(),
            mode: VariantMode::Small,
            top: 10,
            print_json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub sweep_basename: String,
    pub links_basename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            formats: OUTPUT_FORMATS.iter().map(|f| f.to_string()).collect(),
            sweep_basename: "policy.sweep".to_string(),
            links_basename: "links".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn wants(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f == format)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl ProjectConfig {
    /// Loads a TOML (or, by extension, JSON) project config.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GeoLinkError::IoError)?;
        let is_json = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Loads `path` when given; otherwise the default file if present, else
    /// built-in defaults. An explicitly named file that is missing is an error.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(explicit) => Self::from_file(explicit),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| GeoLinkError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        serde_json::from_str(&processed).map_err(|e| GeoLinkError::ConfigValidationError {
            field: "json_parsing".to_string(),
            message: format!("JSON parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        let re = match Regex::new(r"\$\{([^}]+)\}") {
            Ok(re) => re,
            Err(_) => return content.to_string(),
        };

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("dataset.root", &self.dataset.root)?;
        validate_non_empty_string("dataset.clusters", &self.dataset.clusters)?;
        validate_non_empty_string("dataset.adjacency", &self.dataset.adjacency)?;
        validate_non_empty_string("dataset.suburbs", &self.dataset.suburbs)?;
        validate_path("output.path", &self.output.path)?;
        validate_allowed_values("output.formats", &self.output.formats, &OUTPUT_FORMATS)?;
        validate_positive_number("sweep.top", self.sweep.top, 1)?;

        if let Some(service) = &self.sweep.service {
            validate_non_empty_string("sweep.service", service)?;
        }

        self.policy.validate()
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.output.wants(format)
    }
}

impl ConfigProvider for ProjectConfig {
    fn dataset(&self) -> &DatasetConfig {
        &self.dataset
    }

    fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    fn sweep(&self) -> &SweepConfig {
        &self.sweep
    }

    fn output(&self) -> &OutputConfig {
        &self.output
    }
}

impl Validate for ProjectConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

use std::fs::File;
use std::path::Path;

use harvester_core::HarvesterConfig;
use harvester_export::ExportConfig;
use harvester_http::CrawlApiConfig;
use serde::{Deserialize, Serialize};

/// Everything the YAML configuration file may hold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default)]
    pub harvester: HarvesterConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub crawl_api: CrawlApiConfig,
}

impl FileConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|e| anyhow::anyhow!("Couldn't open {} got: {e}", path.display()))?;
                Ok(serde_yaml::from_reader(file)?)
            }
            None => Ok(Self::default()),
        }
    }
}

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::plan::CommandSpec;

pub const ARCHIVE_URL_PREFIX: &str = "https://github.com/comfyanonymous/ComfyUI/archive/refs/tags";

/// Model storage categories relocated onto the data volume, in relocation order.
pub const MODEL_CATEGORIES: [&str; 17] = [
    "checkpoints",
    "clip_vision",
    "controlnet",
    "diffusion_models",
    "embeddings",
    "clip",
    "diffusers",
    "gligen",
    "hypernetworks",
    "loras",
    "photomaker",
    "style_models",
    "text_encoders",
    "unet",
    "upscale_models",
    "vae",
    "vae_approx",
];

const DEFAULT_APP_DIR: &str = "/comfyui";
const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_USER: &str = "comfyui";
const DEFAULT_ARCHIVE: &str = "/tmp/archive.tar.gz";
const DEFAULT_PYTHON: &str = "python";

/// Source archive URL for a tagged ComfyUI release.
#[must_use]
pub fn archive_url(version: &str) -> String {
    format!("{ARCHIVE_URL_PREFIX}/v{version}.tar.gz")
}

/// Where the application and its persisted data live inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub app_dir: Utf8PathBuf,
    pub data_dir: Utf8PathBuf,
    pub user: String,
    pub default_uid: u32,
    pub default_gid: u32,
    pub archive: Utf8PathBuf,
    pub python: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            app_dir: Utf8PathBuf::from(DEFAULT_APP_DIR),
            data_dir: Utf8PathBuf::from(DEFAULT_DATA_DIR),
            user: DEFAULT_USER.to_string(),
            default_uid: 1000,
            default_gid: 1000,
            archive: Utf8PathBuf::from(DEFAULT_ARCHIVE),
            python: DEFAULT_PYTHON.to_string(),
        }
    }
}

impl Layout {
    #[must_use]
    pub fn entry_module(&self) -> Utf8PathBuf {
        self.app_dir.join("main.py")
    }

    #[must_use]
    pub fn requirements(&self) -> Utf8PathBuf {
        self.app_dir.join("requirements.txt")
    }

    #[must_use]
    pub fn nodes_dir(&self) -> Utf8PathBuf {
        self.app_dir.join("custom_nodes")
    }

    #[must_use]
    pub fn models_dir(&self) -> Utf8PathBuf {
        self.app_dir.join("models")
    }

    /// `user:group` owner spec; the service group shares the account name.
    #[must_use]
    pub fn owner(&self) -> String {
        format!("{0}:{0}", self.user)
    }

    /// Application-tree path and data-tree path for each model category.
    pub fn relocations(&self) -> impl Iterator<Item = (Utf8PathBuf, Utf8PathBuf)> + '_ {
        let models = self.models_dir();
        MODEL_CATEGORIES
            .iter()
            .map(move |category| (models.join(category), self.data_dir.join(category)))
    }

    /// Unprefixed workload command: `python <app>/main.py <args...>`.
    #[must_use]
    pub fn launch_command(&self, arguments: &[String]) -> CommandSpec {
        let mut command =
            CommandSpec::new(self.python.as_str(), [self.entry_module().into_string()]);
        command.args.extend(arguments.iter().cloned());
        command
    }

    #[must_use]
    pub fn node_dir(&self, name: &str) -> Utf8PathBuf {
        self.nodes_dir().join(name)
    }
}

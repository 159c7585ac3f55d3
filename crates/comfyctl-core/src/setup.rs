//! Image provisioning: system packages, the service account, torch, and the
//! ComfyUI source tree.

use anyhow::Result;
use comfyctl_domain::{archive_url, Layout, Plan, Step};

use crate::context::CommandContext;
use crate::executor::run_or_preview;
use crate::issues::LifecycleIssue;
use crate::outcome::ExecutionOutcome;

#[derive(Clone, Debug, Default)]
pub struct SetupRequest {
    pub comfyui_version: String,
    /// Handed to `pip --index-url` verbatim, so a local index directory works too.
    pub torch_index_url: String,
    pub torch_version: String,
    pub torchaudio_version: String,
    pub torchvision_version: String,
    /// Expected sha256 of the downloaded archive; unchecked when absent.
    pub comfyui_sha256: Option<String>,
}

impl SetupRequest {
    fn validate(&self) -> Result<(), LifecycleIssue> {
        let required = [
            ("comfyui-version", &self.comfyui_version),
            ("torch-index-url", &self.torch_index_url),
            ("torch-version", &self.torch_version),
            ("torchaudio-version", &self.torchaudio_version),
            ("torchvision-version", &self.torchvision_version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(LifecycleIssue::InvalidInput { field });
            }
        }
        if let Some(expected) = &self.comfyui_sha256 {
            let valid = hex::decode(expected).is_ok_and(|bytes| bytes.len() == 32);
            if !valid {
                return Err(LifecycleIssue::InvalidChecksum {
                    value: expected.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Builds the provisioning plan.
///
/// # Errors
/// Returns an error when a required value is empty or malformed.
pub fn setup_plan(layout: &Layout, request: &SetupRequest) -> Result<Plan> {
    request.validate()?;

    let uid = layout.default_uid.to_string();
    let gid = layout.default_gid.to_string();
    let archive = layout.archive.to_string();
    let app_dir = layout.app_dir.to_string();

    let mut plan = Plan::new();
    plan.push(Step::run("apt", ["-y", "update"]));
    plan.push(Step::run("apt", ["-y", "install", "gosu"]));
    plan.push(Step::run("groupadd", ["-g", gid.as_str(), layout.user.as_str()]));
    plan.push(Step::run(
        "useradd",
        ["-u", uid.as_str(), "-g", gid.as_str(), layout.user.as_str()],
    ));
    plan.push(Step::run(
        "pip",
        [
            "install".to_string(),
            "--no-cache-dir".to_string(),
            format!("torch=={}", request.torch_version),
            format!("torchaudio=={}", request.torchaudio_version),
            format!("torchvision=={}", request.torchvision_version),
            "--index-url".to_string(),
            request.torch_index_url.clone(),
        ],
    ));
    plan.push(Step::CreateDirs {
        paths: vec![layout.app_dir.clone(), layout.data_dir.clone()],
    });
    plan.push(Step::run(
        "curl",
        [
            "-o".to_string(),
            archive.clone(),
            "-fsSL".to_string(),
            archive_url(&request.comfyui_version),
        ],
    ));
    if let Some(expected) = &request.comfyui_sha256 {
        plan.push(Step::VerifySha256 {
            path: layout.archive.clone(),
            expected: expected.to_ascii_lowercase(),
        });
    }
    plan.push(Step::run(
        "tar",
        [
            "xvzf",
            archive.as_str(),
            "-C",
            app_dir.as_str(),
            "--strip-components",
            "1",
        ],
    ));
    plan.push(Step::RemovePath {
        path: layout.archive.clone(),
    });
    plan.push(Step::run(
        "pip",
        [
            "install".to_string(),
            "--no-cache-dir".to_string(),
            "-r".to_string(),
            layout.requirements().into_string(),
        ],
    ));
    plan.push(Step::run(
        "chown",
        ["-R".to_string(), layout.owner(), app_dir, layout.data_dir.to_string()],
    ));
    Ok(plan)
}

/// Provisions the image.
///
/// # Errors
/// Returns the validation error or the first failing step's error.
pub fn setup(ctx: &CommandContext, request: &SetupRequest) -> Result<ExecutionOutcome> {
    let plan = setup_plan(ctx.layout(), request)?;
    tracing::info!(version = %request.comfyui_version, "provisioning comfyui");
    run_or_preview(ctx, "setup", &plan)
}

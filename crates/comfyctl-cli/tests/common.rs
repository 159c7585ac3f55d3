#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;

const ISOLATED_VARS: [&str; 16] = [
    "COMFYUI_VERSION",
    "COMFYUI_SHA256",
    "TORCH_INDEX_URL",
    "TORCH_VERSION",
    "TORCHAUDIO_VERSION",
    "TORCHVISION_VERSION",
    "NODES",
    "ARGUMENTS",
    "UID",
    "GID",
    "COMFYCTL_APP_DIR",
    "COMFYCTL_DATA_DIR",
    "COMFYCTL_USER",
    "COMFYCTL_PYTHON",
    "COMFYCTL_LOG",
    "NO_COLOR",
];

/// `comfyctl` with none of its configuration variables inherited.
pub fn comfyctl() -> Command {
    let mut cmd = cargo_bin_cmd!("comfyctl");
    for key in ISOLATED_VARS {
        cmd.env_remove(key);
    }
    cmd
}

pub const SETUP_FLAGS: [&str; 10] = [
    "--comfyui-version",
    "0.3.10",
    "--torch-index-url",
    "https://download.pytorch.org/whl/cu124",
    "--torch-version",
    "2.5.1",
    "--torchaudio-version",
    "2.5.1",
    "--torchvision-version",
    "0.20.1",
];

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn commands(payload: &Value) -> Vec<String> {
    payload["details"]["commands"]
        .as_array()
        .expect("commands array")
        .iter()
        .map(|value| value.as_str().expect("command string").to_string())
        .collect()
}

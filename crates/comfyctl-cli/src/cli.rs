use clap::{ArgAction, Args, Parser, Subcommand};

pub const COMFYCTL_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nOptions:\n{options}\n";

pub const COMFYCTL_BEFORE_HELP: &str = concat!(
    "comfyctl ",
    env!("CARGO_PKG_VERSION"),
    " – ComfyUI container lifecycle helper\n\n",
    "\x1b[1;36mImage build\x1b[0m\n",
    "  setup            Install gosu, the comfyui account, torch, and ComfyUI itself.\n",
    "  install-nodes    Clone custom nodes and install their requirements.\n\n",
    "\x1b[1;36mContainer start\x1b[0m\n",
    "  entrypoint       Match the account to --uid/--gid, link models to /data, run ComfyUI.\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "comfyctl",
    author,
    version,
    propagate_version = false,
    disable_help_subcommand = true,
    before_help = COMFYCTL_BEFORE_HELP,
    help_template = COMFYCTL_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct ComfyCli {
    #[arg(
        short,
        long,
        help = "Suppress human output (errors are still logged to stderr)",
        global = true
    )]
    pub quiet: bool,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging (-vv reaches trace)",
        global = true
    )]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes", global = true)]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        help = "Print the planned steps without running anything",
        global = true
    )]
    pub dry_run: bool,
    #[command(subcommand)]
    pub command: CommandCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandCli {
    #[command(
        about = "Provision the image: gosu, service account, torch, ComfyUI, requirements.",
        override_usage = "comfyctl setup --comfyui-version VERSION --torch-index-url URL --torch-version V --torchaudio-version V --torchvision-version V"
    )]
    Setup(SetupArgs),
    #[command(
        about = "Clone custom nodes into custom_nodes/ and install their requirements.",
        override_usage = "comfyctl install-nodes [REF ...] | comfyctl install-nodes --nodes \"REF REF\""
    )]
    InstallNodes(InstallNodesArgs),
    #[command(
        about = "Reconcile the service account, relocate model storage, and launch ComfyUI.",
        override_usage = "comfyctl entrypoint --uid UID --gid GID [-- ARG ...]"
    )]
    Entrypoint(EntrypointArgs),
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    #[arg(long, env = "COMFYUI_VERSION", help = "ComfyUI release tag without the leading v")]
    pub comfyui_version: String,
    #[arg(long, env = "TORCH_INDEX_URL", help = "Package index serving the torch wheels")]
    pub torch_index_url: String,
    #[arg(long, env = "TORCH_VERSION")]
    pub torch_version: String,
    #[arg(long, env = "TORCHAUDIO_VERSION")]
    pub torchaudio_version: String,
    #[arg(long, env = "TORCHVISION_VERSION")]
    pub torchvision_version: String,
    #[arg(
        long,
        env = "COMFYUI_SHA256",
        help = "Verify the downloaded archive against this sha256 before extracting"
    )]
    pub comfyui_sha256: Option<String>,
}

#[derive(Args, Debug)]
pub struct InstallNodesArgs {
    #[arg(value_name = "REF", help = "Git references of the custom nodes to install")]
    pub references: Vec<String>,
    #[arg(
        long,
        env = "NODES",
        value_name = "REFS",
        help = "Shell-quoted list used when no REF is given"
    )]
    pub nodes: Option<String>,
}

#[derive(Args, Debug)]
pub struct EntrypointArgs {
    #[arg(
        value_name = "ARG",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Arguments passed to ComfyUI's main.py"
    )]
    pub launch_args: Vec<String>,
    #[arg(
        long,
        env = "ARGUMENTS",
        value_name = "ARGS",
        help = "Shell-quoted arguments used when no ARG is given"
    )]
    pub arguments: Option<String>,
    #[arg(long, env = "UID", help = "uid the comfyui account must end up with")]
    pub uid: u32,
    #[arg(long, env = "GID", help = "gid the comfyui account must end up with")]
    pub gid: u32,
}

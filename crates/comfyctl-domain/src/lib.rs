//! Pure data for the ComfyUI container lifecycle: filesystem layout,
//! account identities, and the step plans the core executes.

mod args;
mod identity;
mod layout;
mod nodes;
mod plan;

pub use args::{positional_or_split, split_arguments, ArgumentsError};
pub use identity::{Account, Identity};
pub use layout::{archive_url, Layout, ARCHIVE_URL_PREFIX, MODEL_CATEGORIES};
pub use nodes::{node_dir_name, NodeReferenceError};
pub use plan::{CommandSpec, Plan, Step};

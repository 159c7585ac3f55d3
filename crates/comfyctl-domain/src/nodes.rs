/// A custom-node reference that cannot be turned into a clone directory.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum NodeReferenceError {
    #[error("custom node reference {reference:?} does not name a repository")]
    Unnamed { reference: String },
    #[error("custom node references {first:?} and {second:?} both clone into {name:?}")]
    Collision {
        name: String,
        first: String,
        second: String,
    },
}

/// Directory name `git clone` would pick for `reference`: the last path
/// segment with trailing slashes and a `.git` suffix removed.
///
/// # Errors
/// Returns [`NodeReferenceError::Unnamed`] when nothing usable remains.
pub fn node_dir_name(reference: &str) -> Result<String, NodeReferenceError> {
    let trimmed = reference.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        return Err(NodeReferenceError::Unnamed {
            reference: reference.to_string(),
        });
    }
    Ok(name.to_string())
}

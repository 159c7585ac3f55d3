//! Container entrypoint: reconcile the service account with the requested
//! uid/gid, move model storage onto the data volume, drop privileges, and
//! run ComfyUI.

use anyhow::Result;
use comfyctl_domain::{Account, Identity, Layout, Plan, Step};

use crate::context::CommandContext;
use crate::executor::run_or_preview;
use crate::issues::LifecycleIssue;
use crate::outcome::ExecutionOutcome;

const DEESCALATE: &str = "gosu";

#[derive(Clone, Debug, Default)]
pub struct EntrypointRequest {
    pub arguments: Vec<String>,
    pub uid: u32,
    pub gid: u32,
}

impl EntrypointRequest {
    #[must_use]
    pub fn desired(&self) -> Identity {
        Identity::new(self.uid, self.gid)
    }
}

/// Who the entrypoint is running as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Privilege {
    Root,
    Unprivileged(Identity),
}

impl Privilege {
    #[must_use]
    pub fn of(current: Identity) -> Self {
        if current.is_root() {
            Self::Root
        } else {
            Self::Unprivileged(current)
        }
    }
}

/// A non-root caller cannot change identities, so it may only launch when it
/// already is the service account and the account already has the desired ids.
#[must_use]
pub fn unprivileged_launch_allowed(
    current: Identity,
    account: Identity,
    desired: Identity,
) -> bool {
    current == account && account == desired
}

/// Builds the entrypoint plan for the given privilege state.
///
/// # Errors
/// Returns [`LifecycleIssue::PermissionDenied`] when an unprivileged caller
/// would need an identity change.
pub fn entrypoint_plan(
    layout: &Layout,
    privilege: Privilege,
    account: &Account,
    request: &EntrypointRequest,
) -> Result<Plan> {
    let desired = request.desired();
    let launch = layout.launch_command(&request.arguments);

    match privilege {
        Privilege::Unprivileged(current) => {
            if !unprivileged_launch_allowed(current, account.identity, desired) {
                return Err(LifecycleIssue::PermissionDenied {
                    current,
                    account: account.identity,
                    desired,
                }
                .into());
            }
            Ok([Step::Launch { command: launch }].into_iter().collect())
        }
        Privilege::Root => {
            let mut plan = Plan::new();
            if account.identity.uid != desired.uid {
                plan.push(Step::run(
                    "usermod",
                    ["-u".to_string(), desired.uid.to_string(), account.name.clone()],
                ));
            }
            if account.identity.gid != desired.gid {
                plan.push(Step::run(
                    "groupmod",
                    ["-g".to_string(), desired.gid.to_string(), account.name.clone()],
                ));
            }
            plan.push(Step::CreateDirs {
                paths: vec![layout.data_dir.clone()],
            });
            for (app_path, data_path) in layout.relocations() {
                plan.push(Step::RemovePath {
                    path: app_path.clone(),
                });
                plan.push(Step::CreateDirs {
                    paths: vec![data_path.clone()],
                });
                plan.push(Step::Symlink {
                    target: data_path,
                    link: app_path,
                });
            }
            let owner = layout.owner();
            plan.push(Step::run(
                "chown",
                [
                    "-R".to_string(),
                    owner.clone(),
                    layout.data_dir.to_string(),
                    layout.app_dir.to_string(),
                ],
            ));
            plan.push(Step::Launch {
                command: launch.prefixed(DEESCALATE, [owner]),
            });
            Ok(plan)
        }
    }
}

/// Runs the container entrypoint.
///
/// # Errors
/// Returns the account lookup error, a permission error for unprivileged
/// callers, or the first failing step.
pub fn entrypoint(ctx: &CommandContext, request: &EntrypointRequest) -> Result<ExecutionOutcome> {
    let layout = ctx.layout();
    let accounts = ctx.effects().accounts();
    let account = accounts.lookup(&layout.user)?;
    let current = accounts.current();
    let privilege = Privilege::of(current);
    tracing::debug!(
        %current,
        account = %account.identity,
        desired = %request.desired(),
        ?privilege,
        "reconciling service account"
    );
    let plan = entrypoint_plan(layout, privilege, &account, request)?;
    run_or_preview(ctx, "entrypoint", &plan)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use camino::Utf8PathBuf;

    use super::*;
    use crate::config::GlobalOptions;
    use crate::effects::SharedEffects;
    use crate::testing::RecordingEffects;
    use comfyctl_domain::MODEL_CATEGORIES;

    fn account(uid: u32, gid: u32) -> Account {
        Account::new("comfyui", Identity::new(uid, gid))
    }

    fn request(uid: u32, gid: u32) -> EntrypointRequest {
        EntrypointRequest {
            arguments: vec!["--listen".into(), "0.0.0.0".into()],
            uid,
            gid,
        }
    }

    #[test]
    fn unprivileged_rule_requires_all_three_to_match() {
        let same = Identity::new(1000, 1000);
        assert!(unprivileged_launch_allowed(same, same, same));
        assert!(!unprivileged_launch_allowed(Identity::new(1001, 1000), same, same));
        assert!(!unprivileged_launch_allowed(same, Identity::new(1000, 1001), same));
        assert!(!unprivileged_launch_allowed(same, same, Identity::new(2000, 1000)));
    }

    #[test]
    fn unprivileged_match_launches_without_setup() {
        let plan = entrypoint_plan(
            &Layout::default(),
            Privilege::of(Identity::new(1000, 1000)),
            &account(1000, 1000),
            &request(1000, 1000),
        )
        .expect("plan");
        assert_eq!(plan.rendered(), vec!["python /comfyui/main.py --listen 0.0.0.0"]);
        assert!(matches!(plan.steps()[0], Step::Launch { .. }));
    }

    #[test]
    fn unprivileged_mismatch_is_denied() {
        for (current, desired) in [
            (Identity::new(1000, 1000), Identity::new(2000, 1000)),
            (Identity::new(1000, 1000), Identity::new(1000, 2000)),
            (Identity::new(1234, 1000), Identity::new(1000, 1000)),
        ] {
            let err = entrypoint_plan(
                &Layout::default(),
                Privilege::of(current),
                &account(1000, 1000),
                &request(desired.uid, desired.gid),
            )
            .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<LifecycleIssue>(),
                Some(LifecycleIssue::PermissionDenied { .. })
            ));
        }
    }

    #[test]
    fn root_with_uid_change_only_modifies_the_user() {
        let plan = entrypoint_plan(
            &Layout::default(),
            Privilege::Root,
            &account(1000, 1000),
            &request(2000, 1000),
        )
        .expect("plan");
        let rendered = plan.rendered();
        assert_eq!(rendered[0], "usermod -u 2000 comfyui");
        assert!(!rendered.iter().any(|line| line.starts_with("groupmod")));
        assert_eq!(rendered[1], "mkdir -p /data");
        assert_eq!(rendered[2], "rm -rf /comfyui/models/checkpoints");
        assert_eq!(rendered[3], "mkdir -p /data/checkpoints");
        assert_eq!(rendered[4], "ln -s /data/checkpoints /comfyui/models/checkpoints");
        assert_eq!(rendered.len(), 1 + 1 + 17 * 3 + 2);
        assert_eq!(rendered[rendered.len() - 2], "chown -R comfyui:comfyui /data /comfyui");
        assert_eq!(
            rendered[rendered.len() - 1],
            "gosu comfyui:comfyui python /comfyui/main.py --listen 0.0.0.0"
        );
    }

    #[test]
    fn root_with_matching_identity_skips_account_changes() {
        let plan = entrypoint_plan(
            &Layout::default(),
            Privilege::Root,
            &account(1000, 1000),
            &request(1000, 1000),
        )
        .expect("plan");
        assert_eq!(plan.len(), 1 + 17 * 3 + 2);
        assert_eq!(plan.rendered()[0], "mkdir -p /data");
    }

    #[test]
    fn root_with_gid_change_runs_groupmod() {
        let plan = entrypoint_plan(
            &Layout::default(),
            Privilege::Root,
            &account(1000, 1000),
            &request(1000, 3000),
        )
        .expect("plan");
        assert_eq!(plan.rendered()[0], "groupmod -g 3000 comfyui");
        assert_eq!(plan.rendered()[1], "mkdir -p /data");
    }

    #[test]
    fn missing_account_fails_before_anything_runs() {
        let effects = Arc::new(RecordingEffects::new());
        let global = GlobalOptions::default();
        let ctx = CommandContext::for_testing(&global, &[], effects.clone() as SharedEffects);

        let err = entrypoint(&ctx, &request(1000, 1000)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LifecycleIssue>(),
            Some(LifecycleIssue::AccountNotFound { name }) if name == "comfyui"
        ));
        assert!(effects.journal().is_empty());
    }

    #[test]
    fn unprivileged_mismatch_runs_no_commands() {
        let effects = Arc::new(
            RecordingEffects::new()
                .running_as(Identity::new(1000, 1000))
                .with_account("comfyui", Identity::new(1000, 1000)),
        );
        let global = GlobalOptions::default();
        let ctx = CommandContext::for_testing(&global, &[], effects.clone() as SharedEffects);

        let err = entrypoint(&ctx, &request(2000, 2000)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LifecycleIssue>(),
            Some(LifecycleIssue::PermissionDenied { .. })
        ));
        assert!(effects.journal().is_empty());
    }

    #[test]
    fn root_entrypoint_relocates_model_directories_on_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 tempdir");
        let app = root.join("comfyui");
        let data = root.join("data");
        let models = app.join("models");
        std::fs::create_dir_all(models.join("checkpoints")).expect("checkpoints");
        std::fs::write(models.join("checkpoints/put_here"), b"").expect("placeholder");
        std::fs::write(models.join("vae"), b"stray file").expect("stray file");
        std::fs::create_dir_all(data.join("loras")).expect("existing data");
        std::fs::write(data.join("loras/style.safetensors"), b"weights").expect("weights");

        let effects = Arc::new(
            RecordingEffects::new()
                .with_real_fs()
                .with_account("comfyui", Identity::new(1000, 1000)),
        );
        let global = GlobalOptions::default();
        let overrides = [
            ("COMFYCTL_APP_DIR", app.as_str()),
            ("COMFYCTL_DATA_DIR", data.as_str()),
        ];
        let ctx =
            CommandContext::for_testing(&global, &overrides, effects.clone() as SharedEffects);

        // Run twice: the second pass must replace its own symlinks without
        // touching the data they point at.
        for _ in 0..2 {
            entrypoint(&ctx, &request(1000, 1000)).expect("entrypoint");
        }

        for category in MODEL_CATEGORIES {
            let link = models.join(category);
            let target = data.join(category);
            let meta = std::fs::symlink_metadata(&link).expect("link metadata");
            assert!(meta.file_type().is_symlink(), "{link} should be a symlink");
            assert_eq!(
                std::fs::read_link(&link).expect("read link"),
                target.as_std_path()
            );
            assert!(
                std::fs::symlink_metadata(&target).expect("target").is_dir(),
                "{target} should be a real directory"
            );
        }
        assert_eq!(
            std::fs::read(data.join("loras/style.safetensors")).expect("weights kept"),
            b"weights"
        );
        let launch = format!("gosu comfyui:comfyui python {app}/main.py --listen 0.0.0.0");
        assert_eq!(effects.commands().last(), Some(&launch));
        assert_eq!(effects.journal().last(), Some(&format!("exec {launch}")));
    }
}

// src/scripts/branch.rs
use anyhow::{Context, Result};
use log::{debug, info};
use crate::git::Git;

/// What the user asked for on the command line.
#[derive(Debug, Clone)]
pub struct BranchRequest {
    pub name: String,
    pub base: String,
    pub remote: String,
    pub push: bool,
}

/// Map an arbitrary string onto `[A-Za-z0-9/_-]`: other characters become
/// `-`, runs of `-` or `/` collapse to one, and leading/trailing `-` or `/`
/// are dropped.
pub fn sanitize_branch_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '/' || c == '_' || c == '-' {
            c
        } else {
            '-'
        };
        if (c == '-' || c == '/') && out.ends_with(c) {
            continue;
        }
        out.push(c);
    }
    out.trim_matches(|c| c == '-' || c == '/').to_string()
}

/// True if `name` exists as a local branch or as a head on `remote`.
pub fn branch_exists(git: &dyn Git, name: &str, remote: &str) -> Result<bool> {
    let local = git.run(&["branch", "--list", name])?;
    if !local.stdout.trim().is_empty() {
        debug!("Branch '{}' found locally", name);
        return Ok(true);
    }

    // ls-remote matches patterns against ref name tails, so `v1` would also
    // hit `refs/heads/release/v1`. Compare the full ref instead.
    let wanted = format!("refs/heads/{}", name);
    let remote_heads = git.run(&["ls-remote", "--heads", remote, &wanted])?;
    let found = remote_heads
        .stdout
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|reference| reference == wanted);
    if found {
        debug!("Branch '{}' found on {}", name, remote);
    }
    Ok(found)
}

/// Create the branch from `<remote>/<base>` and optionally push it.
///
/// Returns the sanitized branch name. Nothing is mutated if the branch already
/// exists. A failed push leaves the local branch in place and is reported as such.
pub fn create_branch(git: &dyn Git, request: &BranchRequest) -> Result<String> {
    let branch = sanitize_branch_name(&request.name);
    if branch.is_empty() {
        anyhow::bail!("Branch name '{}' has no usable characters", request.name);
    }
    if branch != request.name {
        println!("Using sanitized branch name '{}'", branch);
    }

    if branch_exists(git, &branch, &request.remote)? {
        anyhow::bail!("Branch '{}' already exists.", branch);
    }

    let upstream = format!("{}/{}", request.remote, request.base);

    println!("Fetching latest from {}...", upstream);
    git.run_checked(&["fetch", &request.remote, &request.base])?;

    println!("Creating branch '{}' from '{}'...", branch, upstream);
    git.run_checked(&["checkout", "-b", &branch, &upstream])?;
    info!("Created local branch {} tracking {}", branch, upstream);

    if request.push {
        println!("Pushing '{}' to {}...", branch, request.remote);
        git.run_checked(&["push", "-u", &request.remote, &branch])
            .with_context(|| {
                format!(
                    "Branch '{}' was created locally but pushing to {} failed; the local branch was kept",
                    branch, request.remote
                )
            })?;
    }

    println!("Branch '{}' created successfully.", branch);
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;

    fn request(name: &str, push: bool) -> BranchRequest {
        BranchRequest {
            name: name.to_string(),
            base: "main".to_string(),
            remote: "origin".to_string(),
            push,
        }
    }

    #[test]
    fn test_sanitize_example() {
        assert_eq!(sanitize_branch_name("feature/new ui!!"), "feature/new-ui");
    }

    #[test]
    fn test_sanitize_is_idempotent_and_clean() {
        let inputs = [
            "feature/new ui!!",
            "--leading and trailing--",
            "a---b",
            "ünïcödé branch",
            "bugfix/login-error",
            "!!!",
            "",
            "release/v1.2.3",
            "  spaced  out  ",
        ];
        for input in inputs {
            let once = sanitize_branch_name(input);
            assert_eq!(sanitize_branch_name(&once), once, "not idempotent for {:?}", input);
            assert!(!once.starts_with('-') && !once.ends_with('-'), "edge dash in {:?}", once);
            assert!(!once.contains("--"), "dash run in {:?}", once);
            assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '_' || c == '-'));
        }
        assert_eq!(sanitize_branch_name("release/v1.2.3"), "release/v1-2-3");
        assert_eq!(sanitize_branch_name("!!!"), "");
    }

    #[test]
    fn test_sanitize_cleans_up_slashes() {
        assert_eq!(sanitize_branch_name("/x"), "x");
        assert_eq!(sanitize_branch_name("a//b"), "a/b");
        assert_eq!(sanitize_branch_name("feature/"), "feature");
        assert_eq!(sanitize_branch_name("-/-a"), "a");
        for input in ["//a//b//", "/-/x", "a/-/b"] {
            let once = sanitize_branch_name(input);
            assert_eq!(sanitize_branch_name(&once), once);
            assert!(!once.contains("//") && !once.starts_with('/') && !once.ends_with('/'));
        }
    }

    #[test]
    fn test_remote_head_with_same_tail_does_not_count() {
        let git = FakeGit::new().respond(
            &["ls-remote", "--heads"],
            true,
            "abc123\trefs/heads/release/v1\n",
            "",
        );
        assert!(!branch_exists(&git, "v1", "origin").unwrap());

        let created = create_branch(&git, &request("v1", false)).unwrap();
        assert_eq!(created, "v1");
        assert!(git.called(&["ls-remote", "--heads", "origin", "refs/heads/v1"]));
        assert!(git.called(&["checkout", "-b", "v1", "origin/main"]));
    }

    #[test]
    fn test_existing_local_branch_aborts_before_any_mutation() {
        let git = FakeGit::new().respond(&["branch", "--list"], true, "  release/v1\n", "");
        let err = create_branch(&git, &request("release/v1", false)).unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert!(!git.called(&["fetch"]));
        assert!(!git.called(&["checkout"]));
        assert!(!git.called(&["ls-remote"]));
    }

    #[test]
    fn test_existing_remote_branch_aborts_before_any_mutation() {
        let git = FakeGit::new().respond(
            &["ls-remote", "--heads"],
            true,
            "abc123\trefs/heads/release/v1\n",
            "",
        );
        let err = create_branch(&git, &request("release/v1", true)).unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert!(!git.called(&["fetch"]));
        assert!(!git.called(&["checkout"]));
        assert!(!git.called(&["push"]));
    }

    #[test]
    fn test_fetch_failure_stops_immediately() {
        let git = FakeGit::new().respond(&["fetch"], false, "", "fatal: couldn't find remote ref develop");
        let mut req = request("feature/x", false);
        req.base = "develop".to_string();

        let err = create_branch(&git, &req).unwrap_err();
        assert!(format!("{:#}", err).contains("couldn't find remote ref develop"));
        assert!(!git.called(&["checkout"]));
    }

    #[test]
    fn test_happy_path_runs_fetch_checkout_push_in_order() {
        let git = FakeGit::new();
        let created = create_branch(&git, &request("feature/new ui!!", true)).unwrap();
        assert_eq!(created, "feature/new-ui");

        let calls = git.calls.borrow();
        let mutating: Vec<String> = calls
            .iter()
            .filter(|c| c[0] != "branch" && c[0] != "ls-remote")
            .map(|c| c.join(" "))
            .collect();
        assert_eq!(
            mutating,
            vec![
                "fetch origin main".to_string(),
                "checkout -b feature/new-ui origin/main".to_string(),
                "push -u origin feature/new-ui".to_string(),
            ]
        );
    }

    #[test]
    fn test_push_failure_reports_partial_success() {
        let git = FakeGit::new().respond(&["push"], false, "", "remote: Permission denied");
        let err = create_branch(&git, &request("feature/y", true)).unwrap_err();
        let message = format!("{:#}", err);

        assert!(git.called(&["checkout", "-b", "feature/y"]));
        assert!(message.contains("created locally"));
        assert!(message.contains("Permission denied"));
    }

    #[test]
    fn test_unusable_name_is_rejected() {
        let git = FakeGit::new();
        assert!(create_branch(&git, &request("???", false)).is_err());
        assert!(git.calls.borrow().is_empty());
    }
}

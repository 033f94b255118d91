//! C9 — Minimum permissions computation (spec §4.9).
//!
//! `contents: read` is the floor every agent job carries; tool and
//! safe-output declarations each add scopes on top of it, through fixed
//! tables, never downgrading a scope another declaration already raised.

use awc_core::job::{PermissionLevel, Permissions};
use awc_core::safe_outputs::SafeOutputType;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::{GitHubToolset, ToolConfig};

pub fn compute_permissions(spec: &WorkflowSpec) -> Permissions {
    let mut permissions = Permissions::new();
    permissions.grant("contents", PermissionLevel::Read);

    for cfg in spec.tools.values() {
        grant_for_tool(&mut permissions, cfg);
    }

    for output_type in spec.safe_outputs.enabled_types() {
        for (scope, level) in scopes_for_output_type(output_type) {
            permissions.grant(scope, level);
        }
    }

    permissions
}

fn grant_for_tool(permissions: &mut Permissions, cfg: &ToolConfig) {
    match cfg {
        ToolConfig::GitHub(github) => {
            let level = if github.read_only { PermissionLevel::Read } else { PermissionLevel::Write };
            if github.toolsets.is_empty() {
                permissions.grant("contents", level);
                permissions.grant("issues", level);
                permissions.grant("pull-requests", level);
                return;
            }
            for toolset in &github.toolsets {
                let scope = match toolset {
                    GitHubToolset::Default | GitHubToolset::Repos => "contents",
                    GitHubToolset::Issues => "issues",
                    GitHubToolset::PullRequests => "pull-requests",
                    GitHubToolset::Discussions => "discussions",
                    GitHubToolset::Actions => "actions",
                    GitHubToolset::Projects => "repository-projects",
                };
                permissions.grant(scope, level);
            }
        }
        ToolConfig::Edit(edit) if edit.write => {
            permissions.grant("contents", PermissionLevel::Write);
        }
        _ => {}
    }
}

fn scopes_for_output_type(output_type: SafeOutputType) -> &'static [(&'static str, PermissionLevel)] {
    use PermissionLevel::Write;
    match output_type {
        SafeOutputType::CreateIssue
        | SafeOutputType::UpdateIssue
        | SafeOutputType::CloseIssue
        | SafeOutputType::AddComment
        | SafeOutputType::HideComment
        | SafeOutputType::AddLabels
        | SafeOutputType::RemoveLabels
        | SafeOutputType::AssignMilestone
        | SafeOutputType::AssignToUser
        | SafeOutputType::UnassignFromUser
        | SafeOutputType::AssignToAgent
        | SafeOutputType::AssignToBot
        | SafeOutputType::LinkSubIssue => &[("issues", Write)],

        SafeOutputType::CreatePullRequest
        | SafeOutputType::UpdatePullRequest
        | SafeOutputType::ClosePullRequest
        | SafeOutputType::MarkPullRequestAsReadyForReview
        | SafeOutputType::AddReviewer
        | SafeOutputType::CreatePrReviewComment
        | SafeOutputType::SubmitPrReview
        | SafeOutputType::ResolvePrReviewThread
        | SafeOutputType::PushToPullRequestBranch => &[("pull-requests", Write)],

        SafeOutputType::CreateDiscussion
        | SafeOutputType::UpdateDiscussion
        | SafeOutputType::CloseDiscussion => &[("discussions", Write)],

        SafeOutputType::CreateProject
        | SafeOutputType::UpdateProject
        | SafeOutputType::CreateProjectStatusUpdate => &[("repository-projects", Write)],

        SafeOutputType::DispatchWorkflow | SafeOutputType::UpdateRunner | SafeOutputType::CreateAgentSession => {
            &[("actions", Write)]
        }

        SafeOutputType::UploadAssets | SafeOutputType::UpdateRelease => &[("contents", Write)],

        SafeOutputType::AutofixCodeScanningAlert => &[("security-events", Write)],

        SafeOutputType::Noop => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_core::safe_outputs::{SafeOutputPolicy, SafeOutputsConfig};
    use indexmap::IndexMap;

    #[test]
    fn contents_read_is_always_present() {
        let spec = WorkflowSpec::default();
        let permissions = compute_permissions(&spec);
        assert_eq!(permissions.get("contents"), PermissionLevel::Read);
    }

    #[test]
    fn create_issue_output_grants_issues_write() {
        let mut spec = WorkflowSpec::default();
        let mut policies = IndexMap::new();
        policies.insert(SafeOutputType::CreateIssue, SafeOutputPolicy::default());
        spec.safe_outputs = SafeOutputsConfig {
            policies,
            ..SafeOutputsConfig::default()
        };
        let permissions = compute_permissions(&spec);
        assert_eq!(permissions.get("issues"), PermissionLevel::Write);
    }

    #[test]
    fn edit_tool_with_write_grants_contents_write() {
        let mut spec = WorkflowSpec::default();
        spec.tools.insert(
            "edit".to_string(),
            ToolConfig::Edit(awc_core::tool::EditConfig { write: true }),
        );
        let permissions = compute_permissions(&spec);
        assert_eq!(permissions.get("contents"), PermissionLevel::Write);
    }

    #[test]
    fn read_only_github_toolset_never_escalates_to_write() {
        let mut spec = WorkflowSpec::default();
        spec.tools.insert(
            "github".to_string(),
            ToolConfig::GitHub(awc_core::tool::GitHubToolConfig {
                toolsets: vec![GitHubToolset::Issues],
                read_only: true,
                custom_token: None,
                lockdown: false,
            }),
        );
        let permissions = compute_permissions(&spec);
        assert_eq!(permissions.get("issues"), PermissionLevel::Read);
    }
}

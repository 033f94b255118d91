//! Safe-outputs data model (spec §4.7, §6 "Safe-output types").

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The closed set of safe-output types (spec §6). Unrecognized types fail
/// validation (spec §3 invariant on `SafeOutputsConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafeOutputType {
    CreateIssue,
    UpdateIssue,
    CloseIssue,
    AddComment,
    HideComment,
    AddLabels,
    RemoveLabels,
    AssignMilestone,
    AssignToUser,
    UnassignFromUser,
    AssignToAgent,
    AssignToBot,
    CreatePullRequest,
    UpdatePullRequest,
    ClosePullRequest,
    MarkPullRequestAsReadyForReview,
    AddReviewer,
    CreatePrReviewComment,
    SubmitPrReview,
    ResolvePrReviewThread,
    PushToPullRequestBranch,
    CreateDiscussion,
    UpdateDiscussion,
    CloseDiscussion,
    LinkSubIssue,
    CreateProject,
    UpdateProject,
    CreateProjectStatusUpdate,
    DispatchWorkflow,
    UploadAssets,
    UpdateRelease,
    UpdateRunner,
    AutofixCodeScanningAlert,
    CreateAgentSession,
    Noop,
}

impl SafeOutputType {
    pub const ALL: &'static [SafeOutputType] = &[
        SafeOutputType::CreateIssue,
        SafeOutputType::UpdateIssue,
        SafeOutputType::CloseIssue,
        SafeOutputType::AddComment,
        SafeOutputType::HideComment,
        SafeOutputType::AddLabels,
        SafeOutputType::RemoveLabels,
        SafeOutputType::AssignMilestone,
        SafeOutputType::AssignToUser,
        SafeOutputType::UnassignFromUser,
        SafeOutputType::AssignToAgent,
        SafeOutputType::AssignToBot,
        SafeOutputType::CreatePullRequest,
        SafeOutputType::UpdatePullRequest,
        SafeOutputType::ClosePullRequest,
        SafeOutputType::MarkPullRequestAsReadyForReview,
        SafeOutputType::AddReviewer,
        SafeOutputType::CreatePrReviewComment,
        SafeOutputType::SubmitPrReview,
        SafeOutputType::ResolvePrReviewThread,
        SafeOutputType::PushToPullRequestBranch,
        SafeOutputType::CreateDiscussion,
        SafeOutputType::UpdateDiscussion,
        SafeOutputType::CloseDiscussion,
        SafeOutputType::LinkSubIssue,
        SafeOutputType::CreateProject,
        SafeOutputType::UpdateProject,
        SafeOutputType::CreateProjectStatusUpdate,
        SafeOutputType::DispatchWorkflow,
        SafeOutputType::UploadAssets,
        SafeOutputType::UpdateRelease,
        SafeOutputType::UpdateRunner,
        SafeOutputType::AutofixCodeScanningAlert,
        SafeOutputType::CreateAgentSession,
        SafeOutputType::Noop,
    ];

    /// The snake_case identifier used in `output_types` (spec §4.10:
    /// `contains(needs.agent.outputs.output_types, 'create_issue')`).
    pub fn as_snake_case(&self) -> &'static str {
        match self {
            SafeOutputType::CreateIssue => "create_issue",
            SafeOutputType::UpdateIssue => "update_issue",
            SafeOutputType::CloseIssue => "close_issue",
            SafeOutputType::AddComment => "add_comment",
            SafeOutputType::HideComment => "hide_comment",
            SafeOutputType::AddLabels => "add_labels",
            SafeOutputType::RemoveLabels => "remove_labels",
            SafeOutputType::AssignMilestone => "assign_milestone",
            SafeOutputType::AssignToUser => "assign_to_user",
            SafeOutputType::UnassignFromUser => "unassign_from_user",
            SafeOutputType::AssignToAgent => "assign_to_agent",
            SafeOutputType::AssignToBot => "assign_to_bot",
            SafeOutputType::CreatePullRequest => "create_pull_request",
            SafeOutputType::UpdatePullRequest => "update_pull_request",
            SafeOutputType::ClosePullRequest => "close_pull_request",
            SafeOutputType::MarkPullRequestAsReadyForReview => {
                "mark_pull_request_as_ready_for_review"
            }
            SafeOutputType::AddReviewer => "add_reviewer",
            SafeOutputType::CreatePrReviewComment => "create_pr_review_comment",
            SafeOutputType::SubmitPrReview => "submit_pr_review",
            SafeOutputType::ResolvePrReviewThread => "resolve_pr_review_thread",
            SafeOutputType::PushToPullRequestBranch => "push_to_pull_request_branch",
            SafeOutputType::CreateDiscussion => "create_discussion",
            SafeOutputType::UpdateDiscussion => "update_discussion",
            SafeOutputType::CloseDiscussion => "close_discussion",
            SafeOutputType::LinkSubIssue => "link_sub_issue",
            SafeOutputType::CreateProject => "create_project",
            SafeOutputType::UpdateProject => "update_project",
            SafeOutputType::CreateProjectStatusUpdate => "create_project_status_update",
            SafeOutputType::DispatchWorkflow => "dispatch_workflow",
            SafeOutputType::UploadAssets => "upload_assets",
            SafeOutputType::UpdateRelease => "update_release",
            SafeOutputType::UpdateRunner => "update_runner",
            SafeOutputType::AutofixCodeScanningAlert => "autofix_code_scanning_alert",
            SafeOutputType::CreateAgentSession => "create_agent_session",
            SafeOutputType::Noop => "noop",
        }
    }

    /// The kebab-case frontmatter key, e.g. `create-issue`.
    pub fn as_kebab_case(&self) -> String {
        self.as_snake_case().replace('_', "-")
    }

    /// Per-type default cap (spec §4.7: "default values per type, typically
    /// 1 or 10").
    pub fn default_cap(&self) -> u32 {
        match self {
            SafeOutputType::AddLabels
            | SafeOutputType::RemoveLabels
            | SafeOutputType::AddComment
            | SafeOutputType::UploadAssets => 10,
            _ => 1,
        }
    }

    /// Whether this output type uses the "project token" precedence group
    /// (spec §4.7 "project-related outputs share a single project token").
    pub fn is_project_related(&self) -> bool {
        matches!(
            self,
            SafeOutputType::CreateProject
                | SafeOutputType::UpdateProject
                | SafeOutputType::CreateProjectStatusUpdate
        )
    }
}

/// Target-repo rule (spec §4.7). Wildcards are forbidden; construction
/// validates this at the `awc-safe-outputs` layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TargetRepoRule {
    #[default]
    CurrentRepoOnly,
    Single(String),
    Allowlist(Vec<String>),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SafeOutputPolicy {
    pub max: u32,
    #[serde(default)]
    pub target_repo: TargetRepoRule,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default = "default_true")]
    pub footer: bool,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub threat_detection: bool,
    #[serde(default)]
    pub continue_on_error: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SafeOutputsConfig {
    pub policies: IndexMap<SafeOutputType, SafeOutputPolicy>,
    /// Top-level `github-token` default, cascaded to each type (spec §4.3).
    #[serde(default)]
    pub default_github_token: Option<String>,
    /// `true` when any policy enables threat detection (spec §4.7/§4.10).
    #[serde(default)]
    pub threat_detection_enabled: bool,
}

impl SafeOutputsConfig {
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn enabled_types(&self) -> impl Iterator<Item = SafeOutputType> + '_ {
        self.policies.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_matches_output_types_contract() {
        assert_eq!(SafeOutputType::CreateIssue.as_snake_case(), "create_issue");
        assert_eq!(
            SafeOutputType::MarkPullRequestAsReadyForReview.as_snake_case(),
            "mark_pull_request_as_ready_for_review"
        );
    }

    #[test]
    fn default_caps_follow_per_type_table() {
        assert_eq!(SafeOutputType::CreateIssue.default_cap(), 1);
        assert_eq!(SafeOutputType::AddLabels.default_cap(), 10);
    }

    #[test]
    fn all_covers_every_variant_count() {
        assert_eq!(SafeOutputType::ALL.len(), 35);
    }
}

use std::path::{Path, PathBuf};

use patchlens_core::{
    ApplyReport, CommentEntry, FindingSeverity, PatchText, PatchlensError,
};

const RULE: &str =
    "================================================================================";

/// The fixed battery of review questions included in every prompt.
pub const QUESTION_BATTERY: &str = "\
Analyze the patch overall and answer these questions:
* What does this patch do? Provide a brief summary.
* Propose specific improvements to this patch. Be concrete and actionable - provide exact code snippets showing how to implement the improvements.
* Identify and suggest how to reduce any code duplication. Show the exact refactored code.
* Propose specific performance improvements if applicable. Include concrete code examples.
* Identify potential bugs or edge cases not handled, and suggest how to fix them. Provide the actual code fix.
* Propose refactoring opportunities that would improve code quality, readability, or maintainability. Show before/after code examples with the concrete changes.

IMPORTANT: For every issue or improvement you identify, provide concrete code examples showing exactly how to fix it. Don't just describe what should be done - show the actual code.

Note: Focus your analysis on the implementation code. Keep test analysis brief - only mention critical issues in test code.";

const SUMMARY_INSTRUCTIONS: &str = "\
At the end, please provide a SIMPLIFIED SUMMARY section with:
--- COPY-PASTE SUMMARY START ---
[A concise review summary that can be posted as a comment, including:
- Key findings (improvements needed, bugs, performance issues)
- Overall assessment (LGTM with minor suggestions / Needs changes / etc.)
]
--- COPY-PASTE SUMMARY END ---";

/// Everything the prompt is composed from.
///
/// `apply` is `None` when patch application was skipped (`--no-apply` or
/// `--no-checkout`); `default_branch` is `None` without a checkout.
pub struct PromptContext<'a> {
    /// The reviewer's stated language background.
    pub language: &'a str,
    /// Canonical URL of the change under review.
    pub url: &'a str,
    /// Fetched diff, possibly failure-flagged.
    pub patch: &'a PatchText,
    /// Outcome of patch application, when one was attempted.
    pub apply: Option<&'a ApplyReport>,
    /// Default branch of the working copy, when one exists.
    pub default_branch: Option<&'a str>,
    /// Aggregated pre-existing review feedback.
    pub comments: &'a [CommentEntry],
    /// A previously saved review of the same change.
    pub previous_review: Option<&'a str>,
    /// Caller-supplied extra questions, appended verbatim.
    pub extra_questions: Option<&'a str>,
}

/// Compose the full review prompt in fixed section order.
///
/// When the patch was applied to the working copy the prompt stays compact:
/// it tells the agent to inspect the tree's diff against the default branch
/// instead of embedding the diff text. When application failed or was
/// skipped, the literal patch is embedded so the agent can still reason from
/// the raw diff alone.
///
/// # Examples
///
/// ```
/// use patchlens_core::PatchText;
/// use patchlens_review::{build_review_prompt, PromptContext};
///
/// let patch = PatchText::Fetched("+added line".into());
/// let prompt = build_review_prompt(&PromptContext {
///     language: "Rust",
///     url: "https://github.com/acme/widgets/pull/42",
///     patch: &patch,
///     apply: None,
///     default_branch: None,
///     comments: &[],
///     previous_review: None,
///     extra_questions: None,
/// });
/// assert!(prompt.contains("+added line"));
/// assert!(prompt.contains("https://github.com/acme/widgets/pull/42"));
/// ```
pub fn build_review_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = format!(
        "I am a {} developer, I need to review this patch from: {}\n\n",
        ctx.language, ctx.url
    );

    match (ctx.apply, ctx.patch) {
        (Some(report), _) if report.outcome.is_applied() => {
            let base = ctx.default_branch.unwrap_or("main");
            prompt.push_str(&format!(
                "The patch has already been applied on branch `{}` in this repository.\n\
                 Load the changes with 'git diff {base}' and analyze them.\n\n",
                report.branch
            ));
        }
        (_, PatchText::Fetched(text)) => {
            prompt.push_str(&format!(
                "Here is the patch content:\n```patch\n{text}\n```\n\n"
            ));
        }
        (_, PatchText::Unavailable(reason)) => {
            prompt.push_str(&format!(
                "The patch content could not be retrieved ({reason}).\n\
                 Analyze the change as best you can from the review context below.\n\n"
            ));
        }
    }

    if let Some(previous) = ctx.previous_review {
        prompt.push_str(&previous_review_section(previous));
    }

    if let Some(rendered) = render_comments(ctx.comments) {
        prompt.push_str(&rendered);
        prompt.push_str(
            "\nPlease consider the above existing comments/reviews when providing your analysis.\n\n",
        );
    }

    prompt.push_str(QUESTION_BATTERY);
    prompt.push_str("\n\n");
    prompt.push_str(&output_shape_section());

    if let Some(extra) = ctx.extra_questions {
        prompt.push_str(&format!("\n\nAdditional questions:\n{extra}"));
    }

    prompt.push_str("\n\n");
    prompt.push_str(SUMMARY_INSTRUCTIONS);
    prompt
}

/// Render the aggregated comments between clear delimiters.
///
/// Returns `None` for an empty sequence so the caller can omit the section
/// entirely.
///
/// # Examples
///
/// ```
/// use patchlens_review::render_comments;
///
/// assert!(render_comments(&[]).is_none());
/// ```
pub fn render_comments(entries: &[CommentEntry]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let joined = entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    Some(format!(
        "{RULE}\nEXISTING COMMENTS/REVIEWS:\n{RULE}\n\n{joined}\n\n{RULE}\n"
    ))
}

fn previous_review_section(previous: &str) -> String {
    format!(
        "{RULE}\nPREVIOUS REVIEW:\n{RULE}\n\n{previous}\n\n{RULE}\n\
         Please compare the current patch with the previous review above.\n\
         Note any improvements made, remaining issues, and new concerns.\n{RULE}\n\n"
    )
}

fn output_shape_section() -> String {
    let levels = FindingSeverity::ALL
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "At the end of the output, provide LINE-BY-LINE FEEDBACK for ISSUES ONLY (no positive feedback) in this format:\n\
         filename:line_number severity \"comment\"\n\n\
         Severity levels: {levels}\n\n\
         Only include lines that have problems, potential bugs, improvements needed, or other issues.\n\
         For example:\n\
         src/main.rs:45 LOW \"Consider using unwrap_or_else() instead of unwrap() to handle potential errors\"\n\
         lib/parser.rs:123 HIGH \"This variable name 'x' is not descriptive\"\n\n\
         If there are no issues with specific lines, just write \"No line-specific issues found.\""
    )
}

/// The composed prompt and the path it was persisted to.
///
/// Persisting the prompt lets a human resume or extend the session by
/// editing and resubmitting the file.
pub struct ReviewPrompt {
    /// Full prompt text sent to the analysis agent.
    pub text: String,
    /// Where the text was written.
    pub path: PathBuf,
}

impl ReviewPrompt {
    /// Compose the prompt and persist it under `dir`.
    ///
    /// The filename carries the process id so concurrent runs never collide.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Io`] if the file cannot be written.
    pub fn compose(ctx: &PromptContext<'_>, dir: &Path) -> Result<Self, PatchlensError> {
        let text = build_review_prompt(ctx);
        let path = dir.join(format!("review-prompt-{}.txt", std::process::id()));
        std::fs::write(&path, &text)?;
        Ok(Self { text, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchlens_core::{
        ApplyOutcome, ApplyStrategy, CommentKind, CommentLocation,
    };

    fn base_ctx<'a>(patch: &'a PatchText) -> PromptContext<'a> {
        PromptContext {
            language: "Rust",
            url: "https://github.com/acme/widgets/pull/42",
            patch,
            apply: None,
            default_branch: None,
            comments: &[],
            previous_review: None,
            extra_questions: None,
        }
    }

    fn sample_comment() -> CommentEntry {
        CommentEntry {
            author: "alice".into(),
            location: Some(CommentLocation {
                path: "src/lib.rs".into(),
                line: Some(3),
            }),
            body: "consider a slice".into(),
            kind: CommentKind::Inline,
        }
    }

    #[test]
    fn prompt_always_contains_url_and_battery() {
        let patch = PatchText::Fetched("+x".into());
        let prompt = build_review_prompt(&base_ctx(&patch));
        assert!(prompt.contains("https://github.com/acme/widgets/pull/42"));
        assert!(prompt.contains(QUESTION_BATTERY));
        assert!(prompt.contains("--- COPY-PASTE SUMMARY START ---"));
        assert!(prompt.contains("--- COPY-PASTE SUMMARY END ---"));
    }

    #[test]
    fn prompt_lists_all_severity_levels() {
        let patch = PatchText::Fetched("+x".into());
        let prompt = build_review_prompt(&base_ctx(&patch));
        assert!(prompt.contains("\"PEDANTIC\", \"LOW\", \"MEDIUM\", \"HIGH\""));
    }

    #[test]
    fn applied_patch_instructs_tree_inspection() {
        let patch = PatchText::Fetched("+x".into());
        let report = ApplyReport {
            outcome: ApplyOutcome::Applied(ApplyStrategy::Strict),
            branch: "patch-review-123".into(),
        };
        let mut ctx = base_ctx(&patch);
        ctx.apply = Some(&report);
        ctx.default_branch = Some("main");
        let prompt = build_review_prompt(&ctx);
        assert!(prompt.contains("git diff main"));
        assert!(prompt.contains("patch-review-123"));
        assert!(!prompt.contains("```patch"));
    }

    #[test]
    fn failed_apply_embeds_the_patch() {
        let patch = PatchText::Fetched("+literal diff line".into());
        let report = ApplyReport {
            outcome: ApplyOutcome::Failed {
                diagnostics: "conflicts".into(),
            },
            branch: "patch-review-123".into(),
        };
        let mut ctx = base_ctx(&patch);
        ctx.apply = Some(&report);
        ctx.default_branch = Some("main");
        let prompt = build_review_prompt(&ctx);
        assert!(prompt.contains("```patch\n+literal diff line\n```"));
        assert!(prompt.contains(QUESTION_BATTERY));
    }

    #[test]
    fn skipped_apply_embeds_the_patch() {
        let patch = PatchText::Fetched("+raw".into());
        let prompt = build_review_prompt(&base_ctx(&patch));
        assert!(prompt.contains("```patch\n+raw\n```"));
    }

    #[test]
    fn unavailable_patch_reports_the_reason() {
        let patch = PatchText::Unavailable("HTTP 404".into());
        let prompt = build_review_prompt(&base_ctx(&patch));
        assert!(prompt.contains("HTTP 404"));
        assert!(!prompt.contains("```patch"));
    }

    #[test]
    fn comment_section_present_iff_comments_exist() {
        let patch = PatchText::Fetched("+x".into());
        let without = build_review_prompt(&base_ctx(&patch));
        assert!(!without.contains("EXISTING COMMENTS/REVIEWS:"));

        let comments = vec![sample_comment()];
        let mut ctx = base_ctx(&patch);
        ctx.comments = &comments;
        let with = build_review_prompt(&ctx);
        assert!(with.contains("EXISTING COMMENTS/REVIEWS:"));
        assert!(with.contains("Review comment by alice on src/lib.rs:3"));
        assert!(with.contains("Please consider the above existing comments/reviews"));
    }

    #[test]
    fn comments_are_separated() {
        let entries = vec![
            sample_comment(),
            CommentEntry {
                author: "bob".into(),
                location: None,
                body: "ship it".into(),
                kind: CommentKind::General,
            },
        ];
        let rendered = render_comments(&entries).unwrap();
        assert!(rendered.contains("\n\n---\n\n"));
        assert!(rendered.starts_with(RULE));
    }

    #[test]
    fn previous_review_section_present_iff_saved() {
        let patch = PatchText::Fetched("+x".into());
        let without = build_review_prompt(&base_ctx(&patch));
        assert!(!without.contains("PREVIOUS REVIEW:"));

        let mut ctx = base_ctx(&patch);
        ctx.previous_review = Some("old findings");
        let with = build_review_prompt(&ctx);
        assert!(with.contains("PREVIOUS REVIEW:"));
        assert!(with.contains("old findings"));
        assert!(with.contains("compare the current patch"));
    }

    #[test]
    fn extra_questions_appended_verbatim() {
        let patch = PatchText::Fetched("+x".into());
        let mut ctx = base_ctx(&patch);
        ctx.extra_questions = Some("Is the cache invalidation correct?");
        let prompt = build_review_prompt(&ctx);
        assert!(prompt.contains("Additional questions:\nIs the cache invalidation correct?"));
    }

    #[test]
    fn compose_persists_with_pid_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let patch = PatchText::Fetched("+x".into());
        let prompt = ReviewPrompt::compose(&base_ctx(&patch), dir.path()).unwrap();
        let expected = dir
            .path()
            .join(format!("review-prompt-{}.txt", std::process::id()));
        assert_eq!(prompt.path, expected);
        let on_disk = std::fs::read_to_string(&prompt.path).unwrap();
        assert_eq!(on_disk, prompt.text);
    }
}

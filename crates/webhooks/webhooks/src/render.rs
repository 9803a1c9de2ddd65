//! Plain-text notifications for provider events.

use hookbridge_core::Notification;

use crate::payload::{EventPayload, Issue};

/// Maximum number of commit lines listed for a push.
const MAX_COMMIT_LINES: usize = 3;

/// Renders the notice posted to rooms for an event.
pub fn render_notification(event_type: &str, payload: &EventPayload) -> Notification {
    let repo = payload.repo_full_name().unwrap_or("unknown/unknown");
    let sender = payload.sender_login();
    let action = payload.action.as_deref().unwrap_or("updated");

    let body = match event_type {
        "push" => render_push(repo, sender, payload),
        "pull_request" => match &payload.pull_request {
            Some(pr) => format!("[{repo}] {sender} {action} pull request {}", describe(pr)),
            None => fallback(repo, sender, event_type),
        },
        "issues" => match &payload.issue {
            Some(issue) => format!("[{repo}] {sender} {action} issue {}", describe(issue)),
            None => fallback(repo, sender, event_type),
        },
        "issue_comment" => match &payload.issue {
            Some(issue) => format!("[{repo}] {sender} commented on {}", describe(issue)),
            None => fallback(repo, sender, event_type),
        },
        "pull_request_review_comment" => match &payload.pull_request {
            Some(pr) => format!("[{repo}] {sender} reviewed pull request {}", describe(pr)),
            None => fallback(repo, sender, event_type),
        },
        _ => fallback(repo, sender, event_type),
    };

    Notification::notice(body)
}

fn render_push(repo: &str, sender: &str, payload: &EventPayload) -> String {
    let branch = payload
        .git_ref
        .as_deref()
        .map(|r| r.trim_start_matches("refs/heads/"))
        .unwrap_or("?");
    let count = payload.commits.len();
    let noun = if count == 1 { "commit" } else { "commits" };

    let mut body = format!("[{repo}] {sender} pushed {count} {noun} to {branch}");
    if let Some(compare) = &payload.compare {
        body.push_str(": ");
        body.push_str(compare);
    }

    for commit in payload.commits.iter().take(MAX_COMMIT_LINES) {
        let short_id: String = commit.id.chars().take(7).collect();
        let summary = commit.message.lines().next().unwrap_or_default();
        body.push_str(&format!("\n{short_id}: {summary}"));
    }
    if count > MAX_COMMIT_LINES {
        body.push_str(&format!("\n... and {} more", count - MAX_COMMIT_LINES));
    }

    body
}

fn describe(issue: &Issue) -> String {
    match &issue.html_url {
        Some(url) => format!("#{}: {} - {}", issue.number, issue.title, url),
        None => format!("#{}: {}", issue.number, issue.title),
    }
}

fn fallback(repo: &str, sender: &str, event_type: &str) -> String {
    format!("[{repo}] {sender} triggered {event_type}")
}

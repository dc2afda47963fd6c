//! Terminal output.

use bidboard_core::{
    format_project_description, format_project_title, mask_name, AnalyticsReport, Bid, BidActions,
    Dispute, Event, EventKind, DashboardPrompt, MatchInfo, ProgressOption, ProgressUpdate, Project,
    ProposalText, RecommendationBuckets, ScoredProject, SuggestedFreelancer, User, UserId,
    Verification,
};
use bidboard_progress::TimeEstimation;
use bidboard_work::{Notice, NoticeLevel};

/// Print notices; returns whether any of them was an error.
pub fn notices(notices: &[Notice]) -> bool {
    let mut failed = false;
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => println!("✓ {}", notice.message),
            NoticeLevel::Info => println!("  {}", notice.message),
            NoticeLevel::Error => {
                eprintln!("✗ {}", notice.message);
                failed = true;
            }
        }
    }
    failed
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn budget(project: &Project) -> String {
    if project.budget_min == project.budget_max {
        format!("${:.0}", project.budget_max)
    } else {
        format!("${:.0}-${:.0}", project.budget_min, project.budget_max)
    }
}

pub fn user(user: &User) {
    println!("{} <{}>", user.fullname, user.email);
    println!("  ID: {}", user.id);
    println!("  Role: {}", user.role);
    println!("  Verified: {}", if user.verified { "yes" } else { "no" });
}

/// One card per project.
pub fn project_list(heading: &str, projects: &[Project]) {
    println!("{heading} ({})", projects.len());
    for project in projects {
        println!(
            "  {} | {} | {} | {}% | {} bids",
            project.id,
            project.status,
            budget(project),
            project.progress,
            project.bids.len()
        );
        println!("{}", indent(&format_project_title(&project.title), "    "));
    }
}

/// Bidder name as `viewer` may see it.
fn bidder_name(project: &Project, bid: &Bid, viewer: Option<&UserId>) -> String {
    let name = bid
        .freelancer
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| bid.freelancer_id().to_string());
    let sees_names = viewer.is_some_and(|v| project.is_client(v) || bid.freelancer_id() == v);
    if sees_names {
        name
    } else {
        mask_name(&name)
    }
}

fn actions(project: &Project, bid: &Bid, viewer: &UserId) -> Option<String> {
    let actions = BidActions::for_viewer(project, bid, viewer);
    if !actions.any() {
        return None;
    }
    let names: Vec<&str> = [
        (actions.accept, "accept"),
        (actions.reject, "reject"),
        (actions.confirm, "confirm"),
        (actions.decline, "confirm --decline"),
    ]
    .into_iter()
    .filter_map(|(shown, name)| shown.then_some(name))
    .collect();
    Some(names.join(", "))
}

/// Full project view with bids and the controls available to `viewer`.
pub fn project_detail(project: &Project, viewer: Option<&UserId>) {
    println!("{}", format_project_title(&project.title));
    println!("  ID: {}", project.id);
    println!("  Status: {}", project.status);
    println!("  Budget: {}", budget(project));
    if !project.category.is_empty() {
        println!("  Category: {}", project.category);
    }
    if !project.skills.is_empty() {
        println!("  Skills: {}", project.skills.join(", "));
    }
    if let Some(deadline) = project.deadline {
        println!("  Deadline: {}", deadline.format("%Y-%m-%d"));
    }
    println!("  Progress: {}%", project.progress);
    if !project.introduction.is_empty() {
        println!();
        println!("{}", indent(&format_project_description(&project.introduction), "  "));
    }

    println!();
    println!("Bids ({})", project.bids.len());
    for bid in &project.bids {
        let proposal = ProposalText::parse(&bid.proposal);
        let timeline = proposal
            .timeline_days
            .map(|days| format!(" | {days} days"))
            .unwrap_or_default();
        println!(
            "  {} | {} | ${:.2} | {}{}",
            bid.id,
            bidder_name(project, bid, viewer),
            bid.amount,
            bid.status,
            timeline
        );
        if let Some(first) = proposal.cover_letter.lines().find(|l| !l.trim().is_empty()) {
            println!("    {first}");
        }
        if let Some(actions) = viewer.and_then(|v| actions(project, bid, v)) {
            println!("    Actions: {actions}");
        }
    }

    if viewer.is_some_and(|v| project.is_client(v)) {
        if project.awaiting_escrow() {
            println!();
            println!("Freelancer confirmed. Run `bidboard fund {}` to start work.", project.id);
        } else if project.awaiting_completion_approval() {
            println!();
            println!("Work delivered. Run `bidboard approve {}` to complete.", project.id);
        }
    }
}

pub fn progress_options(current: u8, options: &[ProgressOption]) {
    println!("Current progress: {current}%");
    let line: Vec<String> = options
        .iter()
        .map(|o| if o.disabled { format!("({}%)", o.value) } else { format!("{}%", o.value) })
        .collect();
    println!("  {}", line.join(" "));
    println!("Pass --value to report one of the unbracketed values.");
}

pub fn progress_history(updates: &[ProgressUpdate], estimate: Option<&TimeEstimation>) {
    println!("Progress updates ({})", updates.len());
    for update in updates {
        print!(
            "  {} | {}% -> {}%",
            update.created_at.format("%Y-%m-%d %H:%M"),
            update.previous_progress,
            update.new_progress
        );
        if let Some(milestone) = &update.milestone {
            print!(" | {milestone}");
        }
        println!();
        if let Some(note) = &update.note {
            println!("    {note}");
        }
    }
    if let Some(estimate) = estimate {
        println!(
            "Estimated completion: {} ({:.1} points/day)",
            estimate.completion.format("%Y-%m-%d"),
            estimate.points_per_day
        );
    }
}

fn level(info: Option<&MatchInfo>) -> String {
    match info {
        Some(MatchInfo { label: Some(label), .. }) => label.clone(),
        Some(info) => info.level.as_str().to_string(),
        None => "-".to_string(),
    }
}

fn scored(project: &ScoredProject) {
    println!(
        "  {} | {:.0}% | {} | {}",
        project.project.id,
        project.match_score,
        level(project.match_level.as_ref()),
        budget(&project.project)
    );
    println!("{}", indent(&format_project_title(&project.project.title), "    "));
}

pub fn recommendations(buckets: &RecommendationBuckets) {
    println!("Recommended for you ({})", buckets.recommended.len());
    buckets.recommended.iter().for_each(scored);
    println!("Other open projects ({})", buckets.others.len());
    buckets.others.iter().for_each(scored);
}

pub fn suggestions(suggestions: &[SuggestedFreelancer]) {
    println!("Suggested freelancers ({})", suggestions.len());
    for s in suggestions {
        let name = s.freelancer.fullname.as_deref().unwrap_or(s.freelancer.id.as_str());
        println!(
            "  {} | {} | {:.0}% | {}",
            s.freelancer.id,
            name,
            s.match_score,
            level(s.match_level.as_ref())
        );
        if !s.matched_skills.is_empty() {
            println!("    Skills: {}", s.matched_skills.join(", "));
        }
    }
}

pub fn verification(verification: &Verification) {
    println!("Verification {}", verification.id);
    println!("  Type: {}", verification.verification_type);
    println!("  Status: {}", verification.status);
    println!("  Documents: {}", verification.documents.len());
    if let Some(review) = &verification.admin_review {
        if let Some(notes) = &review.notes {
            println!("  Review notes: {notes}");
        }
    }
}

pub fn users(users: &[User]) {
    println!("Users ({})", users.len());
    for u in users {
        println!(
            "  {} | {} | {} | {}{}",
            u.id,
            u.fullname,
            u.email,
            u.role,
            if u.verified { " | verified" } else { "" }
        );
    }
}

pub fn verifications(list: &[Verification]) {
    println!("Verifications ({})", list.len());
    for v in list {
        let who = v.user.name().map(str::to_string).unwrap_or_else(|| v.user.id().to_string());
        println!("  {} | {} | {} | {}", v.id, who, v.verification_type, v.status);
    }
}

pub fn disputes(list: &[Dispute]) {
    println!("Disputes ({})", list.len());
    for d in list {
        println!("  {} | project {} | {}", d.id, d.project_id, d.status);
        println!("    {}", d.reason);
        if let Some(resolution) = &d.resolution {
            println!("    Resolution: {resolution}");
        }
    }
}

pub fn analytics(report: &AnalyticsReport) {
    println!("Platform analytics");
    println!("  Users: {}", report.total_users);
    println!("  Projects: {}", report.total_projects);
    println!("  Active: {}", report.active_projects);
    println!("  Completed: {}", report.completed_projects);
    println!("  Revenue: ${:.2}", report.total_revenue);
    for (key, value) in &report.extra {
        println!("  {key}: {value}");
    }
}

/// One line per dashboard event, plus the prompt it raises.
pub fn event(event: &Event) {
    let what = match &event.kind {
        EventKind::BidSubmitted { bid_id } => format!("new bid {bid_id}"),
        EventKind::BidAccepted { bid_id } => format!("bid {bid_id} accepted"),
        EventKind::BidRejected { bid_id } => format!("bid {bid_id} rejected"),
        EventKind::BidConfirmed { bid_id } => format!("bid {bid_id} confirmed"),
        EventKind::BidDeclined { bid_id } => format!("bid {bid_id} declined"),
        EventKind::EscrowFunded => "escrow funded, work started".to_string(),
        EventKind::ProgressUpdated { previous, current } => format!("progress {previous}% -> {current}%"),
        EventKind::CompletionRequested => "work reported complete".to_string(),
        EventKind::ProjectCompleted => "project completed".to_string(),
        EventKind::ProjectCancelled => "project cancelled".to_string(),
    };
    println!("[{}] {}: {what}", event.timestamp.format("%H:%M:%S"), event.project_id);

    match event.prompt() {
        Some(DashboardPrompt::Payment { project_id, .. }) => {
            println!("  -> Run `bidboard fund {project_id}` to fund escrow.");
        }
        Some(DashboardPrompt::CompletionReview { project_id }) => {
            println!("  -> Run `bidboard approve {project_id}` to approve completion.");
        }
        None => {}
    }
}

//! Bidboard CLI - freelance marketplace client.

mod app;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use bidboard_api::{ApiConfig, ApiError, MarketplaceApi, VerificationRequest};
use bidboard_core::{
    Attachment, BidDraft, BidId, DisputeId, ProjectId, ReviewDecision, Role, Time, UserId,
    VerificationId, VerificationStatus,
};
use bidboard_storage::{Session, Storage};
use bidboard_work::{
    BidWorkflow, CollectingNotifier, DashboardWatcher, ProjectWorkflow, WatchScope, WorkError,
};

use app::{failure, work_failure, App};

#[derive(Parser)]
#[command(name = "bidboard")]
#[command(about = "Freelance marketplace client", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "BIDBOARD_API_URL")]
    api_url: Option<String>,

    /// Directory holding the session and project cache
    #[arg(long, global = true, env = "BIDBOARD_HOME")]
    home: Option<PathBuf>,

    /// Log requests and state changes
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long, env = "BIDBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and forget the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List projects (defaults to your dashboard)
    Projects {
        /// Projects you posted
        #[arg(long, conflicts_with_all = ["assigned", "open"])]
        mine: bool,
        /// Projects you bid on or work on
        #[arg(long, conflicts_with = "open")]
        assigned: bool,
        /// Projects open for bidding
        #[arg(long)]
        open: bool,
    },
    /// Show a project with its bids
    Show {
        /// Project ID
        id: String,
    },
    /// Bid on an open project
    Bid {
        /// Project ID
        project: String,
        /// Bid amount
        #[arg(long)]
        amount: f64,
        /// Delivery time in days
        #[arg(long)]
        days: u32,
        /// Cover letter
        #[arg(long)]
        letter: String,
    },
    /// Accept a bid on your project
    Accept {
        /// Project ID
        project: String,
        /// Bid ID
        bid: String,
    },
    /// Reject a bid on your project
    Reject {
        /// Project ID
        project: String,
        /// Bid ID
        bid: String,
    },
    /// Confirm availability for an accepted bid
    Confirm {
        /// Project ID
        project: String,
        /// Bid ID
        bid: String,
        /// Decline instead
        #[arg(long)]
        decline: bool,
    },
    /// Fund escrow for a confirmed bid
    Fund {
        /// Project ID
        project: String,
    },
    /// Approve a completed delivery
    Approve {
        /// Project ID
        project: String,
    },
    /// Report progress (without --value, list the choices)
    Progress {
        /// Project ID
        project: String,
        /// New progress percentage
        #[arg(long)]
        value: Option<u8>,
        /// Milestone reached
        #[arg(long)]
        milestone: Option<String>,
        /// Note for the client
        #[arg(long)]
        note: Option<String>,
        /// Expected completion date (YYYY-MM-DD)
        #[arg(long)]
        eta: Option<chrono::NaiveDate>,
        /// Do not notify the client
        #[arg(long)]
        quiet: bool,
    },
    /// Show a project's progress log
    History {
        /// Project ID
        project: String,
    },
    /// Projects recommended for you
    Recommended,
    /// Freelancers suggested for your project
    Suggest {
        /// Project ID
        project: String,
    },
    /// Follow your dashboard until Ctrl-C
    Watch {
        /// Refresh interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Identity verification
    Verify {
        #[command(subcommand)]
        action: VerifyCommand,
    },
    /// Platform administration
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Subcommand)]
enum VerifyCommand {
    /// Submit documents for review
    Submit {
        /// Verification type (e.g. identity, business)
        #[arg(long = "type")]
        kind: String,
        /// Document URL (repeatable)
        #[arg(long = "doc", required = true)]
        documents: Vec<String>,
    },
    /// Show your latest verification
    Status,
}

#[derive(Subcommand)]
enum AdminCommand {
    /// List users
    Users,
    /// Mark a user verified
    VerifyUser {
        /// User ID
        user: String,
        /// Remove the verified mark instead
        #[arg(long)]
        revoke: bool,
    },
    /// Delete a user
    DeleteUser {
        /// User ID
        user: String,
    },
    /// List all projects
    Projects,
    /// Delete a project
    DeleteProject {
        /// Project ID
        project: String,
    },
    /// List verification requests
    Verifications {
        /// Only this status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Approve or reject a verification
    Review {
        /// Verification ID
        id: String,
        /// Approve the request
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,
        /// Reject the request
        #[arg(long)]
        reject: bool,
        /// Review notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List disputes
    Disputes,
    /// Resolve a dispute
    Resolve {
        /// Dispute ID
        id: String,
        /// Resolution text
        #[arg(long)]
        resolution: String,
    },
    /// Show or change platform settings
    Settings {
        /// Setting to change, as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Platform analytics
    Analytics,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Approved,
    Rejected,
}

impl From<StatusArg> for VerificationStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => VerificationStatus::Pending,
            StatusArg::Approved => VerificationStatus::Approved,
            StatusArg::Rejected => VerificationStatus::Rejected,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ApiConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }
    if let Some(home) = cli.home {
        config.data_dir = home;
    }

    let notices = Arc::new(CollectingNotifier::new());
    let app = match App::open(config, notices.clone()).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(&app, cli.command).await;
    let announced = render::notices(&notices.drain());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if needs_login(&e) {
                if let Err(clear) = app.forget_session().await {
                    warn!(error = %clear, "failed to clear session");
                }
                if !announced {
                    eprintln!("✗ {e}");
                }
                eprintln!("Run `bidboard login` to sign in.");
            } else if !announced {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn needs_login(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<WorkError>().is_some_and(WorkError::needs_login)
            || cause.downcast_ref::<ApiError>().is_some_and(ApiError::needs_login)
    })
}

fn eta(date: chrono::NaiveDate) -> Option<Time> {
    date.and_hms_opt(0, 0, 0).map(|at| at.and_utc())
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let outcome = app
                .api
                .login(&email, &password)
                .await
                .map_err(|e| failure(e, "Login failed"))?;
            if outcome.token.is_none() {
                warn!("server sent no token; the session lasts only for this run");
            }

            let session = Session::new(outcome.token.unwrap_or_default(), Some(outcome.user.clone()));
            let mut storage = app.storage.lock().await;
            storage.save_session(&session).await?;
            storage.save_user(&outcome.user).await?;
            storage.commit("login").await?;
            println!("Logged in as {} ({})", outcome.user.fullname, outcome.user.role);
        }

        Commands::Logout => {
            if let Err(e) = app.api.logout().await {
                warn!(error = %e, "server logout failed");
            }
            app.forget_session().await?;
            println!("Logged out");
        }

        Commands::Whoami => {
            app.user("whoami").await?;
            let user = app
                .api
                .current_user()
                .await
                .map_err(|e| failure(e, "Failed to load profile"))?;
            render::user(&user);
        }

        Commands::Projects { mine, assigned, open } => {
            let flow = ProjectWorkflow::new(app.context());
            if open {
                let projects = flow.refresh_open_projects().await?;
                render::project_list("Open projects", &projects);
                return Ok(());
            }

            let user = app.user("projects").await?;
            let client_view = mine || (!assigned && user.is(Role::Client));
            if client_view {
                let projects = flow.refresh_client_projects(&user.id).await?;
                render::project_list("Your projects", &projects);
            } else if assigned || user.is(Role::Freelancer) {
                let projects = flow.refresh_freelancer_projects(&user.id).await?;
                render::project_list("Your bids and assignments", &projects);
            } else {
                let projects = app
                    .api
                    .admin_projects()
                    .await
                    .map_err(|e| failure(e, "Failed to load projects"))?;
                render::project_list("All projects", &projects);
            }
        }

        Commands::Show { id } => {
            let viewer = app.user("show").await.ok().map(|u| u.id);
            let project = app
                .context()
                .refresh_project(&ProjectId::new(id))
                .await
                .map_err(|e| work_failure(e, "Failed to load project"))?;
            render::project_detail(&project, viewer.as_ref());
        }

        Commands::Bid { project, amount, days, letter } => {
            let user = app.user_with_role("bid", Role::Freelancer).await?;
            let flow = BidWorkflow::new(app.context());
            flow.submit_bid(&user, &ProjectId::new(project), BidDraft::new(amount, days, letter))
                .await?;
        }

        Commands::Accept { project, bid } => {
            let user = app.user("accept").await?;
            let flow = BidWorkflow::new(app.context());
            let project = flow.accept_bid(&user.id, &ProjectId::new(project), &BidId::new(bid)).await?;
            render::project_detail(&project, Some(&user.id));
        }

        Commands::Reject { project, bid } => {
            let user = app.user("reject").await?;
            let flow = BidWorkflow::new(app.context());
            flow.reject_bid(&user.id, &ProjectId::new(project), &BidId::new(bid)).await?;
        }

        Commands::Confirm { project, bid, decline } => {
            let user = app.user("confirm").await?;
            let flow = BidWorkflow::new(app.context());
            flow.confirm_bid(&user.id, &ProjectId::new(project), &BidId::new(bid), !decline)
                .await?;
        }

        Commands::Fund { project } => {
            let user = app.user("fund").await?;
            let flow = ProjectWorkflow::new(app.context());
            flow.fund_escrow(&user.id, &ProjectId::new(project)).await?;
        }

        Commands::Approve { project } => {
            let user = app.user("approve").await?;
            let flow = ProjectWorkflow::new(app.context());
            flow.approve_completion(&user.id, &ProjectId::new(project)).await?;
        }

        Commands::Progress { project, value, milestone, note, eta: date, quiet } => {
            let user = app.user_with_role("progress", Role::Freelancer).await?;
            let project_id = ProjectId::new(project);
            let flow = ProjectWorkflow::new(app.context());
            let mut draft = flow.tracker().open_draft(&user.id, &project_id).await?;

            let Some(value) = value else {
                render::progress_options(draft.current(), &draft.options());
                return Ok(());
            };
            draft.select(value)?;
            draft.milestone = milestone.unwrap_or_default();
            draft.note = note.unwrap_or_default();
            draft.estimated_completion = date.and_then(eta);
            draft.notify_client = !quiet;

            let submitted = flow.report_progress(&user.id, &project_id, draft.into_request()?).await?;
            if submitted.is_completion() {
                println!("The client has been asked to approve completion.");
            }
        }

        Commands::History { project } => {
            app.user("history").await?;
            let project_id = ProjectId::new(project);
            let flow = ProjectWorkflow::new(app.context());
            let updates = flow
                .tracker()
                .history(&project_id)
                .await
                .map_err(|e| work_failure(e.into(), "Failed to load progress history"))?;
            let estimate = flow.tracker().estimate(&project_id).await?;
            render::progress_history(&updates, estimate.as_ref());
        }

        Commands::Recommended => {
            app.user_with_role("recommended", Role::Freelancer).await?;
            let buckets = ProjectWorkflow::new(app.context()).recommended().await?;
            render::recommendations(&buckets);
        }

        Commands::Suggest { project } => {
            app.user_with_role("suggest", Role::Client).await?;
            let list = ProjectWorkflow::new(app.context())
                .suggestions(&ProjectId::new(project))
                .await?;
            render::suggestions(&list);
        }

        Commands::Watch { interval } => watch(app, interval).await?,

        Commands::Verify { action } => verify(app, action).await?,

        Commands::Admin { action } => admin(app, action).await?,
    }

    Ok(())
}

async fn watch(app: &App, interval: Option<u64>) -> Result<()> {
    let user = app.user("watch").await?;
    let scope = match user.role {
        Role::Client => WatchScope::Client(user.id.clone()),
        Role::Freelancer => WatchScope::Freelancer(user.id.clone()),
        Role::Admin => bail!("Admin accounts have no project dashboard to watch"),
    };
    let interval = interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(app.config.poll_interval);

    let ctx = app.context();
    let mut events = ctx.bus.subscribe();
    let handle = DashboardWatcher::new(ctx, scope, interval).spawn();
    println!(
        "Watching the {} dashboard every {}s (Ctrl-C to stop)",
        user.role,
        interval.as_secs()
    );

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => render::event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    Ok(())
}

async fn verify(app: &App, action: VerifyCommand) -> Result<()> {
    app.user("verify").await?;
    let verification = match action {
        VerifyCommand::Submit { kind, documents } => {
            let request = VerificationRequest {
                verification_type: kind,
                documents: documents.into_iter().map(Attachment::Url).collect(),
            };
            let submitted = app
                .api
                .submit_verification(&request)
                .await
                .map_err(|e| failure(e, "Failed to submit verification"))?;
            println!("✓ Verification submitted for review");
            submitted
        }
        VerifyCommand::Status => app
            .api
            .verification_status()
            .await
            .map_err(|e| failure(e, "Failed to load verification status"))?,
    };

    match verification {
        Some(verification) => {
            let mut storage = app.storage.lock().await;
            storage.save_verification(&verification).await?;
            storage.commit("verification").await?;
            render::verification(&verification);
        }
        None => println!("No verification on file"),
    }
    Ok(())
}

async fn admin(app: &App, action: AdminCommand) -> Result<()> {
    let admin = app.user_with_role("admin", Role::Admin).await?;
    let api = &app.api;

    match action {
        AdminCommand::Users => {
            let users = api.admin_users().await.map_err(|e| failure(e, "Failed to load users"))?;
            render::users(&users);
        }
        AdminCommand::VerifyUser { user, revoke } => {
            let id = UserId::new(user);
            let updated = api
                .admin_set_user_verified(&id, !revoke)
                .await
                .map_err(|e| failure(e, "Failed to update user"))?;
            if let Some(user) = updated {
                app.storage.lock().await.save_user(&user).await?;
            }
            println!("✓ User {id} {}", if revoke { "unverified" } else { "verified" });
        }
        AdminCommand::DeleteUser { user } => {
            let id = UserId::new(user);
            if id == admin.id {
                bail!("You cannot delete your own account");
            }
            api.admin_delete_user(&id).await.map_err(|e| failure(e, "Failed to delete user"))?;
            println!("✓ User {id} deleted");
        }
        AdminCommand::Projects => {
            let projects = api
                .admin_projects()
                .await
                .map_err(|e| failure(e, "Failed to load projects"))?;
            render::project_list("All projects", &projects);
        }
        AdminCommand::DeleteProject { project } => {
            let id = ProjectId::new(project);
            api.admin_delete_project(&id)
                .await
                .map_err(|e| failure(e, "Failed to delete project"))?;
            let mut storage = app.storage.lock().await;
            storage.delete_project(&id).await?;
            storage.commit("delete project").await?;
            println!("✓ Project {id} deleted");
        }
        AdminCommand::Verifications { status } => {
            let list = api
                .admin_verifications(status.map(VerificationStatus::from))
                .await
                .map_err(|e| failure(e, "Failed to load verifications"))?;
            render::verifications(&list);
        }
        AdminCommand::Review { id, approve, reject: _, notes } => {
            let decision = if approve { ReviewDecision::Approve } else { ReviewDecision::Reject };
            let reviewed = api
                .admin_review_verification(&VerificationId::new(id), decision, notes.as_deref())
                .await
                .map_err(|e| failure(e, "Failed to review verification"))?;
            match reviewed {
                Some(verification) => render::verification(&verification),
                None => println!("✓ Verification {}", decision.status()),
            }
        }
        AdminCommand::Disputes => {
            let list = api.admin_disputes().await.map_err(|e| failure(e, "Failed to load disputes"))?;
            render::disputes(&list);
        }
        AdminCommand::Resolve { id, resolution } => {
            let resolved = api
                .admin_resolve_dispute(&DisputeId::new(id), &resolution)
                .await
                .map_err(|e| failure(e, "Failed to resolve dispute"))?;
            match resolved {
                Some(dispute) => render::disputes(std::slice::from_ref(&dispute)),
                None => println!("✓ Dispute resolved"),
            }
        }
        AdminCommand::Settings { set } => {
            let mut settings = api.settings().await.map_err(|e| failure(e, "Failed to load settings"))?;
            if !set.is_empty() {
                let mut value = serde_json::to_value(&settings)?;
                let fields = value
                    .as_object_mut()
                    .context("settings are not a JSON object")?;
                for pair in &set {
                    let Some((key, raw)) = pair.split_once('=') else {
                        bail!("expected KEY=VALUE, got {pair:?}");
                    };
                    let parsed = serde_json::from_str(raw)
                        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
                    fields.insert(key.trim().to_string(), parsed);
                }
                let changed = serde_json::from_value(value).context("invalid setting value")?;
                settings = api
                    .update_settings(&changed)
                    .await
                    .map_err(|e| failure(e, "Failed to update settings"))?;
                println!("✓ Settings updated");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        AdminCommand::Analytics => {
            let report = api.analytics().await.map_err(|e| failure(e, "Failed to load analytics"))?;
            render::analytics(&report);
        }
    }
    Ok(())
}

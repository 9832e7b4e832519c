// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CourseHub command-line client
//!
//! Logs in against the course platform API, browses the catalog, enrolls,
//! and can simulate watching a video to exercise progress tracking.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursehub_client::catalog::CourseFilter;
use coursehub_client::config::Config;
use coursehub_client::gate::{is_unlocked, UnlockedStages};
use coursehub_client::models::admin::{AdminUserUpdate, UserQuery};
use coursehub_client::models::{
    Credentials, ProgressBook, ProgressUpdate, Registration, VideoProgressRecord,
};
use coursehub_client::token_store::FileTokenStore;
use coursehub_client::tracker::{
    PlaybackSample, Playback, PlayerState, ProgressSink, ProgressTracker, RecordingSink,
};
use coursehub_client::ClientContext;

#[derive(Parser, Debug)]
#[command(name = "coursehub")]
#[command(version, about = "CourseHub learner and admin client", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, env = "COURSEHUB_LOG_JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COURSEHUB_PASSWORD")]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COURSEHUB_PASSWORD")]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// End the session
    Logout,
    /// Show the current session
    Whoami,
    /// List courses
    Courses {
        #[arg(long, default_value = "All")]
        category: String,
        #[arg(long, default_value = "All")]
        difficulty: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Show a course with its stages
    Course { id: u64 },
    /// Enroll in a course
    Enroll { id: u64 },
    /// List course categories
    Categories,
    /// Show the learner dashboard
    Dashboard,
    /// Simulate watching a video, reporting progress as it plays
    Watch {
        course_id: u64,
        video_id: u64,
        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Admin operations
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    User { id: u64 },
    /// Activate or deactivate a user account
    SetActive {
        id: u64,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    Analytics,
    Courses,
    ToggleActive { id: u64 },
    ToggleFeatured { id: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(api_url = %config.api_url, "Starting CourseHub client");

    let store = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let ctx = ClientContext::connect(config, store).await?;
    if let Some(notice) = ctx.session().state().error_message() {
        eprintln!("{}", notice);
    }

    run(&ctx, cli.command).await
}

async fn run(ctx: &ClientContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = ctx.auth.login(&Credentials { email, password }).await?;
            println!("Logged in as {}", user.display_name());
        }
        Command::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let form = Registration {
                email,
                password,
                first_name,
                last_name,
            };
            let user = ctx.auth.register(&form).await?;
            println!("Welcome, {}", user.display_name());
        }
        Command::Logout => {
            ctx.auth.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match ctx.session().state().session() {
            Some(session) => println!(
                "{} (user {}){}",
                session.display_name,
                session.user_id,
                if session.is_admin { " [admin]" } else { "" }
            ),
            None => println!("Not logged in"),
        },
        Command::Courses {
            category,
            difficulty,
            search,
        } => {
            let filter = CourseFilter {
                category,
                difficulty,
                search_text: search,
            };
            let courses = ctx.api.get_courses(&filter).await?;
            // The server filters too; applying locally keeps the output
            // consistent with the browser's matching rules.
            for course in coursehub_client::catalog::filter(&courses, &filter) {
                println!(
                    "{:>5}  {:<40} {:<14} {}",
                    course.id, course.title, course.category, course.difficulty
                );
            }
        }
        Command::Course { id } => {
            let detail = ctx.api.get_course(id).await?;
            let course = &detail.course;
            println!("{} [{} / {}]", course.title, course.category, course.difficulty);
            println!(
                "Enrolled: {}  Progress: {:.1}%",
                detail.enrolled, detail.progress.completion_percentage
            );
            let unlocked = UnlockedStages::for_enrollment(course);
            for (index, stage) in course.stages.iter().enumerate() {
                let lock = if detail.enrolled && is_unlocked(stage, &unlocked) {
                    " "
                } else {
                    "*"
                };
                println!("{} Stage {}: {}", lock, index + 1, stage.title);
                for video in &stage.videos {
                    println!("      {:>5}  {}", video.id, video.title);
                }
            }
        }
        Command::Enroll { id } => {
            let message = ctx.api.enroll(id).await?;
            println!("{}", message);
        }
        Command::Categories => {
            for category in ctx.api.get_categories().await? {
                println!("{}", category);
            }
        }
        Command::Dashboard => {
            let dashboard = ctx.api.get_dashboard().await?;
            let stats = &dashboard.stats;
            println!(
                "{} courses: {} completed, {} in progress, {} not started",
                stats.total_courses,
                stats.completed_courses,
                stats.in_progress_courses,
                stats.not_started_courses
            );
            for course in &dashboard.enrolled_courses {
                println!("{:>5}  {:<40} {:>5.1}%", course.id, course.title, course.progress);
            }
        }
        Command::Watch {
            course_id,
            video_id,
            speed,
        } => watch(ctx, course_id, video_id, speed).await?,
        Command::Admin(admin) => run_admin(ctx, admin).await?,
    }
    Ok(())
}

async fn run_admin(ctx: &ClientContext, command: AdminCommand) -> anyhow::Result<()> {
    if !ctx.session().state().is_admin() {
        // Advisory only; the backend makes the real decision
        tracing::warn!("Current session is not flagged as admin");
    }

    match command {
        AdminCommand::Users {
            page,
            per_page,
            search,
        } => {
            let result = ctx
                .api
                .get_users(&UserQuery {
                    page,
                    per_page,
                    search,
                })
                .await?;
            for row in &result.users {
                println!(
                    "{:>5}  {:<30} {:<24} courses={}",
                    row.user.id,
                    row.user.email,
                    row.user.display_name(),
                    row.enrolled_courses_count
                );
            }
            println!(
                "page {}/{} ({} users)",
                result.pagination.page, result.pagination.pages, result.pagination.total
            );
        }
        AdminCommand::User { id } => {
            let detail = ctx.api.get_user_detail(id).await?;
            println!("{} <{}>", detail.user.display_name(), detail.user.email);
            for e in &detail.enrollments {
                println!("  {:<40} {:>5.1}%", e.course_title, e.completion_percentage);
            }
        }
        AdminCommand::SetActive { id, active } => {
            let update = AdminUserUpdate {
                is_active: Some(active),
                ..Default::default()
            };
            let user = ctx.api.update_user(id, &update).await?;
            println!("{} active={}", user.email, user.is_active);
        }
        AdminCommand::Analytics => {
            let analytics = ctx.api.get_analytics().await?;
            let o = &analytics.overview;
            println!(
                "users={} active={} courses={} enrollments={}",
                o.total_users, o.active_users, o.total_courses, o.total_enrollments
            );
            for stat in &analytics.completion_stats {
                println!("  {:<40} {:>6.2}%", stat.course_title, stat.completion_rate);
            }
        }
        AdminCommand::Courses => {
            for course in ctx.api.get_admin_courses().await? {
                println!(
                    "{:>5}  {:<40} active={} featured={}",
                    course.id, course.title, course.is_active, course.is_featured
                );
            }
        }
        AdminCommand::ToggleActive { id } => {
            println!("{}", ctx.api.toggle_course_active(id).await?.message);
        }
        AdminCommand::ToggleFeatured { id } => {
            println!("{}", ctx.api.toggle_course_featured(id).await?.message);
        }
    }
    Ok(())
}

/// Player that advances in real time at a fixed speed.
struct SimulatedPlayer {
    started: tokio::time::Instant,
    start_secs: f64,
    speed: f64,
    duration_secs: f64,
}

impl Playback for SimulatedPlayer {
    fn sample(&self) -> Option<PlaybackSample> {
        let elapsed = self.started.elapsed().as_secs_f64() * self.speed;
        Some(PlaybackSample {
            position_secs: (self.start_secs + elapsed).min(self.duration_secs),
            duration_secs: self.duration_secs,
        })
    }
}

async fn watch(ctx: &ClientContext, course_id: u64, video_id: u64, speed: f64) -> anyhow::Result<()> {
    let Some(session) = ctx.session().state().session().cloned() else {
        bail!("Log in first");
    };
    if !(speed > 0.0) {
        bail!("Speed must be positive");
    }

    let detail = ctx.api.get_course(course_id).await?;
    let course = &detail.course;
    let video = course
        .videos()
        .find(|v| v.id == video_id)
        .with_context(|| format!("Video {} is not part of course {}", video_id, course_id))?
        .clone();
    let duration_secs = video
        .duration_seconds()
        .context("Video has no known duration")? as f64;

    let mut book = ProgressBook::new(course, session.user_id, Utc::now());
    for entry in &detail.video_progress {
        book.apply(
            entry.video_id,
            0,
            ProgressUpdate {
                progress: entry.progress,
                completed: entry.completed,
            },
            Utc::now(),
        );
    }
    let record = book
        .record(video_id)
        .cloned()
        .unwrap_or_else(|| VideoProgressRecord::new(video_id, session.user_id));
    let book = Arc::new(Mutex::new(book));

    let player = Arc::new(SimulatedPlayer {
        started: tokio::time::Instant::now(),
        start_secs: record.percent_complete / 100.0 * duration_secs,
        speed,
        duration_secs,
    });
    let api: Arc<dyn ProgressSink> = Arc::new(ctx.api.clone());
    let sink = Arc::new(RecordingSink::new(api, book.clone()));

    let mut tracker =
        ProgressTracker::resume(&video, &ctx.config.tracker, &record, player, sink);
    let mut view = tracker.subscribe();
    tracker.on_state_change(PlayerState::Playing);

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let v = *view.borrow_and_update();
                println!("{:>7.1}s / {:.0}s  {:>5.1}%{}", v.position_secs, v.duration_secs, v.percent,
                    if v.completed { "  completed" } else { "" });
                if v.position_secs >= v.duration_secs {
                    settle(&tracker).await;
                    tracker.on_state_change(PlayerState::Ended);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracker.on_state_change(PlayerState::Paused);
                break;
            }
        }
    }

    let summary = book.lock().await.summary().clone();
    println!(
        "Course progress: {:.1}% (last accessed {})",
        summary.aggregate_progress_percent, summary.last_accessed_at
    );
    Ok(())
}

/// Wait briefly for a write that is still in flight.
async fn settle(tracker: &ProgressTracker) {
    for _ in 0..50 {
        if !tracker.snapshot().await.has_pending_write() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tracing::warn!("Final progress write did not finish in time");
}

/// Initialize logging; JSON for log shipping, plain text otherwise.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("coursehub_client=info,warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

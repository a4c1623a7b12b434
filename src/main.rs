use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studytrack::cache::{CourseCache, TaskCache};
use studytrack::config::AppConfig;
use studytrack::error::AppError;
use studytrack::gateway::{ApiGateway, HttpGateway};
use studytrack::models::NewCourse;
use studytrack::session::{FileSessionStorage, SessionStore};
use studytrack::views;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "studytrack=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env();
    let gateway: Arc<dyn ApiGateway> = Arc::new(HttpGateway::new(&config.api_base_url)?);
    let storage = Arc::new(FileSessionStorage::new(&config.data_dir));
    let mut session = SessionStore::load(gateway.clone(), storage);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command: Vec<&str> = args.iter().map(String::as_str).collect();

    if command.is_empty() {
        print_usage();
        return Ok(());
    }

    // Each action isolates its own failure: report it and leave the user
    // to retry, never crash.
    if let Err(e) = run(&command, &mut session, gateway).await {
        eprintln!("error: {}", e);
        if e.is_auth_failure() {
            eprintln!("Your session may have expired. Run `studytrack login <email>`.");
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    command: &[&str],
    session: &mut SessionStore,
    gateway: Arc<dyn ApiGateway>,
) -> Result<(), AppError> {
    match command {
        ["register", name, email] => {
            let password = views::read_line("Password")?;
            session.register(name, email, &password).await?;
            greet(session);
        }
        ["login", email] => {
            let password = views::read_line("Password")?;
            session.login(email, &password).await?;
            greet(session);
        }
        ["logout"] => {
            session.logout()?;
            println!("Logged out.");
        }
        ["whoami"] => match session.user() {
            Some(user) => println!("{} <{}>", user.name, user.email),
            None => println!("Not logged in."),
        },
        ["dashboard"] => {
            let mut courses = CourseCache::new(gateway, bearer(session)?);
            courses.refresh().await?;
            print!("{}", views::render_dashboard(courses.courses()));
        }
        ["course", id] => {
            let token = bearer(session)?;
            let mut tasks = TaskCache::new(gateway.clone(), token.clone(), *id);
            let (course, ()) =
                tokio::try_join!(gateway.fetch_course(&token, id), tasks.refresh())?;
            print!("{}", views::render_course(&course, tasks.tasks(), Utc::now()));
        }
        ["watch", id] => {
            let token = bearer(session)?;
            let mut tasks = TaskCache::new(gateway.clone(), token.clone(), *id);
            let (course, ()) =
                tokio::try_join!(gateway.fetch_course(&token, id), tasks.refresh())?;
            info!("Watching course {}; countdowns refresh every 60s", id);
            // Display refresh only: countdowns are recomputed against the
            // wall clock, the stored collection is untouched.
            loop {
                print!("{}", views::render_course(&course, tasks.tasks(), Utc::now()));
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }
        ["add-course", title, rest @ ..] => {
            let mut courses = CourseCache::new(gateway, bearer(session)?);
            courses
                .create(NewCourse {
                    title: title.to_string(),
                    description: rest.join(" "),
                })
                .await?;
            println!("Course created successfully!");
            print!("{}", views::render_dashboard(courses.courses()));
        }
        ["edit-course", id, title, rest @ ..] => {
            let mut courses = CourseCache::new(gateway, bearer(session)?);
            courses
                .update(
                    id,
                    NewCourse {
                        title: title.to_string(),
                        description: rest.join(" "),
                    },
                )
                .await?;
            println!("Course updated successfully!");
        }
        ["rm-course", id] => {
            if !views::confirm("Delete this course? All tasks will be deleted.")? {
                return Ok(());
            }
            let mut courses = CourseCache::new(gateway, bearer(session)?);
            courses.refresh().await?;
            courses.remove(id).await?;
            println!("Course deleted successfully");
        }
        ["add-task", course_id, deadline, goal @ ..] => {
            let deadline = parse_deadline(deadline)?;
            let mut tasks = TaskCache::new(gateway, bearer(session)?, *course_id);
            tasks.create(&goal.join(" "), deadline).await?;
            println!("Task created successfully!");
        }
        ["done", course_id, task_id] => {
            set_task_completed(gateway, session, course_id, task_id, true).await?;
            println!("Task completed!");
        }
        ["undone", course_id, task_id] => {
            set_task_completed(gateway, session, course_id, task_id, false).await?;
            println!("Task marked as incomplete");
        }
        ["rm-task", course_id, task_id] => {
            if !views::confirm("Delete this task?")? {
                return Ok(());
            }
            let mut tasks = TaskCache::new(gateway, bearer(session)?, *course_id);
            tasks.refresh().await?;
            tasks.remove(task_id).await?;
            println!("Task deleted successfully");
        }
        ["delete-account"] => {
            if !views::confirm("Delete your account and all of its data?")? {
                return Ok(());
            }
            session.delete_account().await?;
            println!("Account deleted.");
        }
        _ => print_usage(),
    }

    Ok(())
}

async fn set_task_completed(
    gateway: Arc<dyn ApiGateway>,
    session: &SessionStore,
    course_id: &str,
    task_id: &str,
    completed: bool,
) -> Result<(), AppError> {
    let mut tasks = TaskCache::new(gateway, bearer(session)?, course_id);
    tasks.refresh().await?;
    tasks.set_completed(task_id, completed).await
}

fn bearer(session: &SessionStore) -> Result<String, AppError> {
    session
        .token()
        .map(str::to_string)
        .ok_or(AppError::NotAuthenticated)
}

fn greet(session: &SessionStore) {
    match session.user() {
        Some(user) => println!("Welcome, {}!", user.name),
        None => println!("Logged in."),
    }
}

/// Accepts an RFC 3339 timestamp or a bare date, which gets end-of-day.
fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Validation(format!("Unrecognized deadline: {}", raw)))
}

fn print_usage() {
    println!("studytrack <command>");
    println!();
    println!("  register <name> <email>");
    println!("  login <email>");
    println!("  logout");
    println!("  whoami");
    println!("  dashboard");
    println!("  course <course-id>");
    println!("  watch <course-id>");
    println!("  add-course <title> [description...]");
    println!("  edit-course <course-id> <title> [description...]");
    println!("  rm-course <course-id>");
    println!("  add-task <course-id> <deadline> <goal...>");
    println!("  done <course-id> <task-id>");
    println!("  undone <course-id> <task-id>");
    println!("  rm-task <course-id> <task-id>");
    println!("  delete-account");
}

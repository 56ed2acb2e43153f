use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use workmanager::net::types::{NewEmployee, NewTask, Role, Task, TaskPatch, TaskStatus, User, UserId, UserPatch};
use workmanager::state::tasks::{self, TaskSummary};
use workmanager::state::users::{self as team, ProfileError, ProfileForm};
use workmanager::{ApiError, App, ClientConfig};

const RECENT_TASKS: usize = 5;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing credentials; pass --email/--password or set WORKMANAGER_EMAIL/WORKMANAGER_PASSWORD")]
    MissingCredentials,
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("profile update failed: {}", .0.user_message())]
    Profile(#[from] ProfileError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "workmanager-cli", about = "WorkManager task and team CLI")]
struct Cli {
    #[arg(long, env = "WORKMANAGER_API_URL", default_value = workmanager::config::DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = "WORKMANAGER_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "WORKMANAGER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "WORKMANAGER_CONNECT_TIMEOUT_SECS", default_value_t = workmanager::config::DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[arg(long, env = "WORKMANAGER_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new account.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long = "new-email")]
        new_email: String,
        #[arg(long = "new-password")]
        new_password: String,
        #[arg(long, default_value = "employee")]
        role: Role,
    },
    /// Show the signed-in user.
    Me,
    /// Task counters and the most recent tasks.
    Dashboard,
    Task(TaskCommand),
    User(UserCommand),
    /// Edit the signed-in user's own profile.
    Profile(ProfileArgs),
}

#[derive(Args, Debug)]
struct TaskCommand {
    #[command(subcommand)]
    command: TaskSubcommand,
}

#[derive(Subcommand, Debug)]
enum TaskSubcommand {
    List,
    Read {
        task_id: i64,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        assigned_to: Option<UserId>,
    },
    Update {
        task_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long, conflicts_with = "unassign")]
        assigned_to: Option<UserId>,
        #[arg(long, default_value_t = false)]
        unassign: bool,
    },
    Delete {
        task_id: i64,
    },
}

#[derive(Args, Debug)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
enum UserSubcommand {
    List,
    Read {
        user_id: UserId,
    },
    /// Add an employee to the signed-in employer's team.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "new-email")]
        new_email: String,
        #[arg(long = "new-password")]
        new_password: String,
    },
    Update {
        user_id: UserId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "new-email")]
        new_email: Option<String>,
        #[arg(long = "new-password")]
        new_password: Option<String>,
    },
    Delete {
        user_id: UserId,
    },
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "new-email")]
    new_email: Option<String>,
    #[arg(long = "new-password", default_value = "")]
    new_password: String,
    #[arg(long = "confirm-password", default_value = "")]
    confirm_password: String,
}

#[derive(Serialize)]
struct Dashboard<'a> {
    user: Option<&'a User>,
    total: usize,
    pending: usize,
    in_progress: usize,
    completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_members: Option<usize>,
    recent: &'a [Task],
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::new(&cli.base_url)?;
    config.connect_timeout_secs = cli.connect_timeout_secs;
    config.request_timeout_secs = cli.request_timeout_secs;
    let app = App::connect(&config)?;

    if let Command::Signup { name, new_email, new_password, role } = &cli.command {
        app.session.signup(name, new_email, new_password, *role).await?;
        println!("ok");
        return Ok(());
    }

    let (Some(email), Some(password)) = (cli.email.as_deref(), cli.password.as_deref()) else {
        return Err(CliError::MissingCredentials);
    };
    app.session.login(email, password).await?;

    let result = run(&app, cli.command).await;

    if let Err(e) = app.session.logout().await {
        tracing::warn!(error = %e, "logout failed");
    }
    result
}

async fn run(app: &App, command: Command) -> Result<(), CliError> {
    match command {
        Command::Signup { .. } => Ok(()),
        Command::Me => print_json(&app.session.fetch_me().await?),
        Command::Dashboard => run_dashboard(app).await,
        Command::Task(task) => run_task(app, task).await,
        Command::User(user) => run_user(app, user).await,
        Command::Profile(args) => run_profile(app, args).await,
    }
}

async fn run_dashboard(app: &App) -> Result<(), CliError> {
    app.tasks.fetch().await?;
    let me = app.session.current_user();
    let team_members = if app.session.is_employer() {
        app.users.fetch().await?;
        me.as_ref().map(|u| team::team_size(&app.users.items(), u.id))
    } else {
        None
    };

    let items = app.tasks.items();
    let summary = TaskSummary::from_tasks(&items);
    print_json(&Dashboard {
        user: me.as_ref(),
        total: summary.total,
        pending: summary.pending,
        in_progress: summary.in_progress,
        completed: summary.completed,
        team_members,
        recent: tasks::recent(&items, RECENT_TASKS),
    })
}

async fn run_task(app: &App, task: TaskCommand) -> Result<(), CliError> {
    match task.command {
        TaskSubcommand::List => {
            app.tasks.fetch().await?;
            print_json(&app.tasks.items())
        }
        TaskSubcommand::Read { task_id } => print_json(&app.tasks.get(task_id).await?),
        TaskSubcommand::Create { title, description, status, assigned_to } => {
            let created = app
                .tasks
                .create(&NewTask { title, description, status, assigned_to })
                .await?;
            print_json(&created)
        }
        TaskSubcommand::Update { task_id, title, description, status, assigned_to, unassign } => {
            let assigned_to = if unassign { Some(None) } else { assigned_to.map(Some) };
            let patch = TaskPatch { title, description, status, assigned_to };
            print_json(&app.tasks.update(task_id, &patch).await?)
        }
        TaskSubcommand::Delete { task_id } => {
            app.tasks.delete(task_id).await?;
            println!("deleted task {task_id}");
            Ok(())
        }
    }
}

async fn run_user(app: &App, user: UserCommand) -> Result<(), CliError> {
    match user.command {
        UserSubcommand::List => {
            app.users.fetch().await?;
            print_json(&app.users.items())
        }
        UserSubcommand::Read { user_id } => print_json(&app.users.get(user_id).await?),
        UserSubcommand::Create { name, new_email, new_password } => {
            let created = app
                .users
                .create(&NewEmployee { name, email: new_email, password: new_password })
                .await?;
            print_json(&created)
        }
        UserSubcommand::Update { user_id, name, new_email, new_password } => {
            let patch = UserPatch { name, email: new_email, password: new_password };
            print_json(&app.users.update(user_id, &patch).await?)
        }
        UserSubcommand::Delete { user_id } => {
            app.users.delete(user_id).await?;
            println!("deleted user {user_id}");
            Ok(())
        }
    }
}

async fn run_profile(app: &App, args: ProfileArgs) -> Result<(), CliError> {
    let me = app.session.current_user().ok_or(ProfileError::NotSignedIn)?;
    let mut form = ProfileForm::for_user(&me);
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(email) = args.new_email {
        form.email = email;
    }
    form.password = args.new_password;
    form.confirm_password = args.confirm_password;

    let updated = app.update_profile(&form).await?;
    print_json(&updated)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered: Value = serde_json::to_value(value)?;
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

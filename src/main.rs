//! CardioPredict: Cardiovascular risk prediction client
//!
//! Main entry point for the command-line application.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiopredict::adapters::sanitize::SanitizingMakeWriter;
use cardiopredict::adapters::{HttpApiClient, SeededJitter, SqliteSessionStore};
use cardiopredict::application::{
    AnalyticsService, AuthError, AuthService, HistorySummary, PredictionError, PredictionService,
};
use cardiopredict::config::AppConfig;
use cardiopredict::domain::{self, PatientForm, PredictionResult, Role};
use cardiopredict::ports::{AccountCredentials, ProfileUpdate};

#[derive(Debug, Parser)]
#[command(name = "cardiopredict")]
#[command(about = "Cardiovascular risk prediction client", version)]
struct Cli {
    /// Base URL of the prediction backend (overrides CARDIOPREDICT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session database path (overrides CARDIOPREDICT_SESSION_DB)
    #[arg(long, global = true)]
    session_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and log in
    Register {
        #[command(flatten)]
        account: AccountArgs,

        #[arg(long)]
        email: Option<String>,
    },

    /// Log in with an existing account
    Login {
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Forget the stored credential
    Logout,

    /// Continue without the backend (no predictions)
    Offline { username: String },

    /// Show the current session
    Whoami,

    /// Change username and/or password
    UpdateProfile {
        #[arg(long)]
        new_username: Option<String>,

        #[arg(long, env = "CARDIOPREDICT_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },

    /// Score patient data
    Predict(PredictArgs),

    /// List past predictions with a summary
    History,

    /// Platform-wide statistics
    Stats,

    /// List users (full listing for admins, with an admin key)
    Users {
        #[arg(long, env = "CARDIOPREDICT_ADMIN_KEY", hide_env_values = true)]
        admin_key: Option<String>,
    },

    /// Ask a heart-health question (answers in French, works offline)
    Ask { question: String },
}

#[derive(Debug, Args)]
struct AccountArgs {
    username: String,

    #[arg(long, env = "CARDIOPREDICT_PASSWORD", hide_env_values = true)]
    password: String,

    /// `user` or `admin`
    #[arg(long, default_value = "user")]
    role: String,
}

impl AccountArgs {
    fn credentials(&self) -> AccountCredentials {
        let mut account = AccountCredentials::new(&self.username, &self.password);
        account.role = Role::parse(&self.role);
        account
    }
}

/// Patient fields, named as the backend names them. Flags override `--input`.
#[derive(Debug, Args)]
struct PredictArgs {
    /// JSON file with the patient fields
    #[arg(long)]
    input: Option<PathBuf>,

    /// Age in years
    #[arg(long)]
    age: Option<String>,
    /// 0 = female, 1 = male
    #[arg(long)]
    sex: Option<String>,
    /// Chest pain type (0-3, 0 = typical angina)
    #[arg(long)]
    cp: Option<String>,
    /// Resting blood pressure (mm Hg)
    #[arg(long)]
    trestbps: Option<String>,
    /// Serum cholesterol (mg/dl)
    #[arg(long)]
    chol: Option<String>,
    /// Fasting blood sugar > 120 mg/dl (0/1)
    #[arg(long)]
    fbs: Option<String>,
    /// Resting ECG result (0-2)
    #[arg(long)]
    restecg: Option<String>,
    /// Maximum heart rate achieved
    #[arg(long)]
    thalach: Option<String>,
    /// Exercise-induced angina (0/1)
    #[arg(long)]
    exang: Option<String>,
    /// ST depression induced by exercise
    #[arg(long)]
    oldpeak: Option<String>,
    /// Slope of the peak exercise ST segment (0-2)
    #[arg(long)]
    slope: Option<String>,
    /// Major vessels colored by fluoroscopy (0-3)
    #[arg(long)]
    ca: Option<String>,
    /// Thalassemia (1 = normal, 2 = fixed defect, 3 = reversible defect)
    #[arg(long)]
    thal: Option<String>,
}

impl PredictArgs {
    fn into_form(self) -> Result<PatientForm> {
        let mut form = match &self.input {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str::<PatientForm>(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => PatientForm::default(),
        };

        let overrides = [
            (&mut form.age, self.age),
            (&mut form.sex, self.sex),
            (&mut form.cp, self.cp),
            (&mut form.trestbps, self.trestbps),
            (&mut form.chol, self.chol),
            (&mut form.fbs, self.fbs),
            (&mut form.restecg, self.restecg),
            (&mut form.thalach, self.thalach),
            (&mut form.exang, self.exang),
            (&mut form.oldpeak, self.oldpeak),
            (&mut form.slope, self.slope),
            (&mut form.ca, self.ca),
            (&mut form.thal, self.thal),
        ];
        for (slot, value) in overrides {
            if value.is_some() {
                *slot = value;
            }
        }
        Ok(form)
    }
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout carries command output, so logs go to stderr or a file.
    let log_mode = std::env::var("CARDIOPREDICT_LOG_MODE").unwrap_or_else(|_| "auto".to_string());
    let log_file = std::env::var("CARDIOPREDICT_LOG_FILE").ok();

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stderr" => false,
        // auto
        _ => log_file.is_some() && std::io::stderr().is_terminal(),
    };

    let (writer, guard) = if use_file {
        let path = log_file.unwrap_or_else(|| "cardiopredict.log".to_string());
        if let Some(parent) = std::path::Path::new(&path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {path}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!use_file)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    let mut config = AppConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(path) = cli.session_db {
        config.session_db = path;
    }

    tracing::debug!("Using backend {}", config.api_url);

    let api = Arc::new(HttpApiClient::new(&config)?);
    let store = Arc::new(
        SqliteSessionStore::new(&config.session_db)
            .with_context(|| format!("opening session store {}", config.session_db.display()))?,
    );
    let jitter = Arc::new(
        config
            .jitter_seed
            .map_or_else(SeededJitter::from_entropy, SeededJitter::from_seed),
    );

    let auth = AuthService::new(Arc::clone(&api), Arc::clone(&store));
    let predictions = PredictionService::new(Arc::clone(&api), jitter);
    let analytics = AnalyticsService::new(Arc::clone(&api), Arc::clone(&api));

    match cli.command {
        Command::Register { account, email } => {
            let mut credentials = account.credentials();
            if let Some(email) = email {
                credentials = credentials.with_email(email);
            }
            let session = auth.register(&credentials)?;
            println!(
                "Registered and logged in as {}",
                session.username.unwrap_or_default()
            );
        }
        Command::Login { account } => {
            let session = auth.login(&account.credentials())?;
            println!(
                "Logged in as {} ({})",
                session.username.unwrap_or_default(),
                session.role
            );
        }
        Command::Logout => {
            auth.logout()?;
            println!("Logged out");
        }
        Command::Offline { username } => {
            auth.enter_offline_mode(&username)?;
            println!("Offline mode for {username}: predictions need a login");
        }
        Command::Whoami => {
            let session = auth.current_session()?;
            match (&session.username, session.has_credential()) {
                (Some(name), true) => println!("{name} ({})", session.role),
                (Some(name), false) if session.offline => println!("{name} (offline)"),
                _ => println!("Not logged in"),
            }
        }
        Command::UpdateProfile {
            new_username,
            new_password,
        } => {
            let update = ProfileUpdate {
                new_username,
                new_password,
            };
            match auth.update_profile(&update) {
                Ok(session) => println!(
                    "Profile updated for {}",
                    session.username.unwrap_or_default()
                ),
                Err(AuthError::Unauthenticated(e)) => {
                    bail!("{e}. Run `cardiopredict login <username>` first");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Predict(args) => {
            let form = args.into_form()?;
            let session = auth.current_session()?;
            match predictions.predict_form(&session, &form) {
                Ok(result) => print_prediction(&result),
                Err(PredictionError::Unauthenticated(e)) => {
                    bail!("{e}. Run `cardiopredict login <username>` first");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::History => {
            let session = auth.current_session()?;
            let entries = predictions.history(&session)?;
            for entry in &entries {
                let factors: Vec<&str> = entry.risk_factors.iter().map(|f| f.label()).collect();
                println!(
                    "#{:<5} {}  {:>6}  {:<8}  {}",
                    entry.id,
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.risk_score.to_string(),
                    entry.risk_score.risk_level().to_string(),
                    factors.join(", ")
                );
            }
            print_summary(&analytics.summarize_history(&entries));
        }
        Command::Stats => {
            let overview = analytics.platform_overview()?;
            println!("Users:               {}", overview.total_users);
            println!("Predictions (total): {}", overview.predictions.total_predictions);
            println!("Predictions (month): {}", overview.predictions.monthly_predictions);
            println!("Predictions (today): {}", overview.predictions.daily_predictions);
            println!("Average risk:        {}", overview.predictions.average_risk);
        }
        Command::Users { admin_key } => match admin_key {
            Some(key) => {
                let session = auth.current_session()?;
                for user in analytics.admin_users(&session, &key)? {
                    println!(
                        "{:<5} {:<20} {:>5} predictions  last active {}",
                        user.id, user.username, user.predictions_count, user.last_activity
                    );
                }
            }
            None => {
                for user in analytics.public_users()? {
                    println!("{:<20} {} days", user.username, user.account_age_days);
                }
            }
        },
        Command::Ask { question } => println!("{}", domain::answer(&question)),
    }

    Ok(())
}

fn print_prediction(result: &PredictionResult) {
    let level = result.risk_level();
    println!("Risk score: {} ({level})", result.risk_score);
    println!("{}", level.description());
    if result.risk_factors.is_empty() {
        println!("No notable risk factors");
    } else {
        println!("Risk factors:");
        for factor in &result.risk_factors {
            println!("  - {factor}");
        }
    }
    println!("Time: {}", result.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    if result.is_fallback() {
        println!("Note: the prediction service was unreachable; this is a local estimate.");
    }
}

fn print_summary(summary: &HistorySummary) {
    if summary.total == 0 {
        println!("No predictions yet");
        return;
    }

    println!();
    println!("{} predictions", summary.total);
    for month in &summary.monthly {
        println!("  {:>7}: {}", month.month, month.count);
    }
    let d = summary.distribution;
    println!("Low: {}  Moderate: {}  High: {}", d.low, d.moderate, d.high);
    if let Some(avg) = summary.average_risk {
        println!("Average risk: {avg}");
    }
}

use clap::{Parser, Subcommand};
use clinic_core::{
    database_location_from_env_value, field_list_from_env_value, BmiReading, Consultation,
    CoreConfig, IntakeService, Patient,
};
use clinic_dashboard::{
    render, render::render_consultations, render::render_patients, Dashboard, DashboardView,
    HttpIntakeSource, DEFAULT_API_URL,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Clears the terminal and moves the cursor home.
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

const KEY_HELP: &str = "[r] refresh  [a] toggle auto-refresh  [q] quit  (then Enter)";

/// A line typed into the running dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    Refresh,
    ToggleAutoRefresh,
    Quit,
}

impl KeyCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "refresh" => Some(Self::Refresh),
            "a" | "auto" => Some(Self::ToggleAutoRefresh),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic intake operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered patients straight from the database
    ListPatients,
    /// List recorded consultations straight from the database
    ListConsultations,
    /// Compute a body-mass index
    Bmi {
        /// Height in centimetres
        height: f64,
        /// Weight in kilograms
        weight: f64,
    },
    /// Insert one sample patient and one sample consultation
    Seed,
    /// Run the admin dashboard against a running intake API
    Dashboard {
        /// Base URL of the intake API
        #[arg(long, env = "CLINIC_API_URL", default_value = DEFAULT_API_URL)]
        base_url: String,
        /// Seconds between background refreshes
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
        /// Load once, print and exit
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ListPatients => {
            let intake = intake_from_env()?;
            let patients: Vec<Patient> = intake.patients().list_all()?;
            print!("{}", render_patients(&patients));
            intake.shutdown()?;
        }
        Commands::ListConsultations => {
            let intake = intake_from_env()?;
            let consultations: Vec<Consultation> = intake.consultations().list_all()?;
            print!("{}", render_consultations(&consultations));
            intake.shutdown()?;
        }
        Commands::Bmi { height, weight } => {
            let reading = BmiReading::for_measurements(height, weight)
                .ok_or_else(|| anyhow::anyhow!("height and weight must both be positive"))?;
            println!("BMI {:.1} ({})", reading.bmi, reading.status);
        }
        Commands::Seed => {
            let intake = intake_from_env()?;
            let (patient, consultation) = seed(&intake)?;
            println!("Seeded patient {} and consultation {}", patient.id, consultation.id);
            intake.shutdown()?;
        }
        Commands::Dashboard {
            base_url,
            interval_secs,
            once,
        } => run_dashboard(base_url, Duration::from_secs(interval_secs), once).await?,
    }

    Ok(())
}

/// `RUST_LOG` plus warnings from the CLI and the dashboard's background refresher.
fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("clinic=warn".parse()?)
        .add_directive("clinic_dashboard=warn".parse()?))
}

/// Opens the configured database the same way the server does.
fn intake_from_env() -> anyhow::Result<IntakeService> {
    let cfg = CoreConfig::new(
        database_location_from_env_value(std::env::var("CLINIC_DATABASE_PATH").ok()),
        field_list_from_env_value(std::env::var("PATIENT_REQUIRED_FIELDS").ok()),
        field_list_from_env_value(std::env::var("CONSULTATION_REQUIRED_FIELDS").ok()),
    )?;
    Ok(IntakeService::new(Arc::new(cfg)))
}

fn sample_patient() -> Value {
    json!({
        "firstName": "Ivan",
        "lastName": "Petrenko",
        "middleName": "Oleksandrovych",
        "dateOfBirth": "1985-05-15",
        "gender": "male",
        "phone": "+380501234567",
        "email": "ivan.petrenko@email.com",
        "address": "1 Khreshchatyk St, apt. 5",
        "city": "Kyiv",
        "postalCode": "01001",
        "emergencyContact": "Maria Petrenko",
        "emergencyPhone": "+380509876543",
        "medicalHistory": "Hypertension since 2018",
        "allergies": "Penicillin",
        "medications": "Lisinopril 10mg daily"
    })
}

fn sample_consultation() -> Value {
    json!({
        "patientName": "Petrenko Ivan Oleksandrovych",
        "age": "40",
        "gender": "male",
        "phone": "+380501234567",
        "height": "180",
        "weight": "85",
        "complaints": "Headache and dizziness in the mornings",
        "hasGeneralExam": true,
        "hasLabTests": true,
        "hasEcg": true,
        "hasChronicDiseases": true,
        "takesMedications": true,
        "hasAllergies": true,
        "painLevel": "4",
        "additionalNotes": "Check blood pressure at the next visit"
    })
}

fn seed(intake: &IntakeService) -> anyhow::Result<(Patient, Consultation)> {
    let patient = intake.patients().create(&sample_patient())?;
    let consultation = intake.consultations().create(&sample_consultation())?;
    Ok((patient, consultation))
}

/// Reads key commands on a plain thread. A pending blocking read must not hold up
/// runtime shutdown after Ctrl-C.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if let Some(command) = KeyCommand::parse(&line) {
                if tx.send(command).is_err() {
                    break;
                }
            }
        }
    });
    rx
}

fn redraw(view: &DashboardView) {
    print!("{CLEAR_SCREEN}{}\n{KEY_HELP}\n", render(view));
}

/// Runs the dashboard until `q` or Ctrl-C, redrawing on every state change.
///
/// With `once`, prints a single snapshot and fails if it could not be loaded.
async fn run_dashboard(base_url: String, interval: Duration, once: bool) -> anyhow::Result<()> {
    let source = Arc::new(HttpIntakeSource::new(base_url)?);
    let dashboard = Dashboard::open(source, interval).await;

    if once {
        let view = dashboard.view();
        dashboard.close().await;
        print!("{}", render(&view));
        if let Some(message) = view.error() {
            anyhow::bail!("dashboard could not be loaded: {}", message);
        }
        return Ok(());
    }

    let dashboard = Arc::new(dashboard);
    let mut updates = dashboard.subscribe();
    let mut keys = spawn_key_reader();
    let mut keys_open = true;
    redraw(&updates.borrow_and_update());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                redraw(&updates.borrow_and_update());
            }
            key = keys.recv(), if keys_open => match key {
                Some(KeyCommand::Refresh) => {
                    // Failures land in the view as an error status.
                    let dashboard = dashboard.clone();
                    tokio::spawn(async move {
                        if let Err(e) = dashboard.refresh().await {
                            tracing::debug!("manual refresh failed: {}", e);
                        }
                    });
                }
                Some(KeyCommand::ToggleAutoRefresh) => {
                    dashboard.toggle_auto_refresh();
                }
                Some(KeyCommand::Quit) => break,
                None => keys_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    match Arc::try_unwrap(dashboard) {
        Ok(dashboard) => dashboard.close().await,
        Err(_) => tracing::debug!("manual refresh still in flight, dropping dashboard"),
    }
    Ok(())
}

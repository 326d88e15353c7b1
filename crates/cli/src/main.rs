//! Fuel Tracker CLI - fuel, fresh water, and chemical consumption per voyage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fueltrack_autosave::{AutosaveConfig, PersistenceManager};
use fueltrack_calc::{
    counter_consumption, cruise_summary, cruise_totals, format_mass, reading_status, report_view,
};
use fueltrack_core::{Cruise, EquipmentKey, FuelType, ReadingSide, ReportKind, VoyageStatus};
use fueltrack_storage::{BackupStore, SqliteBackupStore, VoyageDirectory};
use fueltrack_voyage::{
    resolve, Command, Completion, DirectoryChoice, Effect, NewVoyage, NewVoyageStep, Notice,
    NoticeLevel, PhaseEndSnapshot, PhaseRef, Session,
};

#[derive(Parser)]
#[command(name = "fueltrack")]
#[command(about = "Ship fuel, fresh water and chemical consumption tracker", long_about = None)]
struct Cli {
    /// Voyage directory
    #[arg(long, env = "FUELTRACK_DIR", default_value = ".")]
    dir: PathBuf,

    /// Backup database [default: <dir>/.fueltrack/backups.db]
    #[arg(long, env = "FUELTRACK_BACKUP_DB")]
    backup_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Offer the most recent unsaved draft
    Recover {
        /// Write the draft to the voyage directory
        #[arg(long, conflicts_with = "dismiss")]
        accept: bool,
        /// Delete the draft from the backup store
        #[arg(long)]
        dismiss: bool,
    },
    /// List voyages in the directory
    List,
    /// Create a voyage
    New {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Departure port
        #[arg(long)]
        from: String,
        /// Arrival port
        #[arg(long)]
        to: String,
        /// Counters to import from the most recent voyage
        #[arg(long, value_delimiter = ',')]
        import: Vec<EquipmentKey>,
        /// Import every counter from the most recent voyage
        #[arg(long, conflicts_with = "import")]
        import_all: bool,
    },
    /// Show a voyage phase by phase
    Show {
        /// Voyage file name
        file: String,
    },
    /// Cruise totals and latest ROB figures
    Totals {
        /// Voyage file name
        file: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Append a leg seeded from the previous leg's closing counters
    AddLeg { file: String },
    /// Delete a leg
    DeleteLeg {
        file: String,
        /// Leg number, counting from 1
        #[arg(value_parser = one_based)]
        index: usize,
    },
    /// Add an operational phase before standby
    AddPhase {
        file: String,
        /// Leg number, counting from 1
        #[arg(long, value_parser = one_based)]
        leg: usize,
        #[arg(long)]
        report: ReportKind,
    },
    /// Delete an operational phase
    DeletePhase {
        file: String,
        #[command(flatten)]
        at: PhaseArgs,
    },
    /// Set one counter reading
    SetReading {
        file: String,
        #[command(flatten)]
        at: PhaseArgs,
        #[arg(long)]
        key: EquipmentKey,
        #[arg(long, value_enum)]
        side: Side,
        /// Reading in m3; empty clears it
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
    /// Set the fuel a counter burns
    SetFuel {
        file: String,
        #[command(flatten)]
        at: PhaseArgs,
        #[arg(long)]
        key: EquipmentKey,
        #[arg(long)]
        fuel: FuelType,
    },
    /// Override a fuel density
    SetDensity {
        file: String,
        #[arg(long)]
        fuel: FuelType,
        #[arg(long)]
        density: f64,
    },
    /// Carry a phase's END readings to the next phase's START
    CarryOver {
        file: String,
        #[command(flatten)]
        at: PhaseArgs,
        /// Counters to carry; all with an END reading when omitted
        #[arg(long, value_delimiter = ',')]
        keys: Vec<EquipmentKey>,
        /// Only show what would be carried
        #[arg(long)]
        dry_run: bool,
    },
    /// Complete a voyage
    Complete {
        file: String,
        #[arg(long, default_value = "")]
        engineer: String,
        #[arg(long, default_value = "")]
        lube_oil_cons: String,
        #[arg(long, default_value = "")]
        lube_oil_rob: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Reopen a completed voyage
    Reopen { file: String },
    /// List backup snapshots
    Backups,
}

#[derive(Args)]
struct PhaseArgs {
    /// Leg number, counting from 1
    #[arg(long, value_parser = one_based)]
    leg: usize,
    /// departure or arrival
    #[arg(long)]
    report: ReportKind,
    /// Phase number within the report, counting from 1
    #[arg(long, value_parser = one_based)]
    phase: usize,
}

/// Parse a number shown to the user (1, 2, ...) into an index.
fn one_based(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("numbering starts at 1".to_string()),
        Ok(n) => Ok(n - 1),
        Err(e) => Err(e.to_string()),
    }
}

impl From<&PhaseArgs> for PhaseRef {
    fn from(args: &PhaseArgs) -> Self {
        PhaseRef::new(args.leg, args.report, args.phase)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Start,
    End,
}

impl From<Side> for ReadingSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Start => ReadingSide::Start,
            Side::End => ReadingSide::End,
        }
    }
}

/// Voyage directory plus the persistence manager writing into it.
struct App {
    dir: VoyageDirectory,
    persistence: PersistenceManager,
}

/// Where backups live unless `--backup-db` says otherwise.
fn backup_db_path(cli: &Cli) -> PathBuf {
    cli.backup_db
        .clone()
        .unwrap_or_else(|| default_backup_db(&cli.dir))
}

fn default_backup_db(dir: &Path) -> PathBuf {
    dir.join(".fueltrack").join("backups.db")
}

impl App {
    async fn open(cli: &Cli) -> Result<Self> {
        let dir = VoyageDirectory::open(&cli.dir)
            .await
            .with_context(|| format!("opening voyage directory {}", cli.dir.display()))?;

        let path = backup_db_path(cli);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let store: Arc<dyn BackupStore> = Arc::new(
            SqliteBackupStore::open(&path)
                .await
                .with_context(|| format!("opening backup database {}", path.display()))?,
        );
        let persistence =
            PersistenceManager::new(store, AutosaveConfig::default()).with_directory(dir.clone());
        Ok(Self { dir, persistence })
    }

    /// A session with every voyage listed.
    async fn session(&self) -> Result<Session> {
        let load = self.dir.load_all().await?;
        for failure in &load.failures {
            warn!(file = %failure.file, "{}", failure.reason);
        }
        for voyage in load.voyages.iter().filter(|v| !v.fixes.is_empty()) {
            for fix in &voyage.fixes {
                println!("  fixed {}: {}", voyage.file, fix);
            }
        }
        let mut session = Session::new();
        if let Some(notice) = session.directory_chosen(DirectoryChoice::Chosen(load.cruises())) {
            info!("{}", notice.message);
        }
        Ok(session)
    }

    /// A session editing the voyage stored in `file`.
    async fn edit(&self, file: &str) -> Result<Session> {
        let loaded = self.dir.load(file).await?;
        for fix in &loaded.fixes {
            println!("  fixed {}: {}", file, fix);
        }
        let mut session = Session::new();
        session.directory_chosen(DirectoryChoice::Chosen(vec![loaded.cruise.clone()]));
        session.open(loaded.cruise.id)?;
        Ok(session)
    }

    /// Carry out effects, saving right away when a save was asked for.
    async fn finish(&mut self, session: &Session, effects: Vec<Effect>) -> Result<()> {
        let mut save = false;
        for effect in effects {
            match effect {
                Effect::Notify(notice) => print_notice(&notice),
                Effect::ScheduleSave => save = true,
                Effect::PhaseEdited(_) | Effect::CarryOverApplied => {}
            }
        }
        if save {
            let cruise = session
                .active()
                .ok_or_else(|| anyhow!("no voyage open"))?;
            self.save(cruise.clone()).await?;
        }
        Ok(())
    }

    async fn save(&mut self, cruise: Cruise) -> Result<()> {
        self.persistence.start_editing(cruise);
        let saved = self.persistence.save_now().await;
        self.persistence.stop();
        let saved = saved?;
        let status = self.persistence.status().borrow().to_string();
        println!("{} ({})", status, saved.path.display());
        Ok(())
    }

    async fn apply(&mut self, file: &str, command: Command) -> Result<()> {
        let mut session = self.edit(file).await?;
        let effects = session.apply(command, Utc::now())?;
        self.finish(&session, effects).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app = App::open(&cli).await?;

    match cli.command {
        Commands::Recover { accept, dismiss } => {
            let mut session = Session::new();
            session.offer_recovery(app.persistence.recoverable(Utc::now()).await?);
            let Some(draft) = session.recovery() else {
                println!("No recoverable draft");
                return Ok(());
            };
            println!(
                "Recoverable draft: {} ({}), last modified {}",
                display_name(draft),
                draft.id,
                draft.last_modified.format("%Y-%m-%d %H:%M:%S")
            );

            if accept {
                let cruise = session
                    .recover()
                    .cloned()
                    .ok_or_else(|| anyhow!("draft disappeared"))?;
                print_notice(&Notice::success("Recovered draft"));
                app.save(cruise).await?;
            } else if dismiss {
                if let Some(id) = session.dismiss_recovery() {
                    app.persistence.discard_backup(id).await?;
                    println!("Draft dismissed");
                }
            } else {
                println!("Use --accept to restore it or --dismiss to delete it");
            }
        }
        Commands::List => {
            let session = app.session().await?;
            println!("Voyages ({})", session.voyages().len());
            for cruise in session.voyages() {
                let totals = cruise_totals(cruise);
                println!(
                    "  {} | {} | {} | {} legs | {} MT",
                    cruise.filename.as_deref().unwrap_or("-"),
                    display_name(cruise),
                    status_label(cruise),
                    cruise.legs.len(),
                    format_mass(Some(totals.total())),
                );
            }
        }
        Commands::New {
            date,
            from,
            to,
            import,
            import_all,
        } => {
            let mut session = app.session().await?;
            let details = NewVoyage {
                start_date: date,
                from_port: from,
                to_port: to,
            };
            let keys = if import_all {
                EquipmentKey::ALL.to_vec()
            } else {
                import
            };

            match session.new_voyage(&details) {
                NewVoyageStep::Ready => {}
                NewVoyageStep::ImportOffered { counters } if !keys.is_empty() => {
                    let (_, imported) = session
                        .import_counters(&counters, &keys)
                        .ok_or_else(|| anyhow!("no voyage pending"))?;
                    print_notice(&Notice::success(format!("{} counter(s) imported", imported)));
                }
                NewVoyageStep::ImportOffered { .. } => {
                    session.start_fresh();
                }
            }

            let cruise = session
                .active()
                .cloned()
                .ok_or_else(|| anyhow!("voyage was not created"))?;
            let path = app.dir.path_for(&cruise)?;
            if tokio::fs::try_exists(&path).await? {
                bail!("{} already exists", path.display());
            }
            println!("Created {}", display_name(&cruise));
            app.save(cruise).await?;
        }
        Commands::Show { file } => {
            let session = app.edit(&file).await?;
            let cruise = session.active().ok_or_else(|| anyhow!("no voyage open"))?;
            print_voyage(cruise);
        }
        Commands::Totals { file, json } => {
            let session = app.edit(&file).await?;
            let cruise = session.active().ok_or_else(|| anyhow!("no voyage open"))?;
            let summary = cruise_summary(cruise);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("{}", display_name(cruise));
            for (fuel, mass) in summary.fuel.by_fuel() {
                println!("  {:<5} {:>10} MT", fuel.label(), format_mass(Some(mass)));
            }
            println!("  {:<5} {:>10} MT", "Total", format_mass(Some(summary.fuel.total())));
            println!("  FW production  {}", format_mass(Some(summary.fw_production)));
            println!("  FW consumption {}", format_mass(Some(summary.fw_consumption)));
            println!("  NaOH consumption {}", format_mass(Some(summary.naoh_consumption)));
            println!("  Last ROB");
            for fuel in FuelType::ALL {
                println!("    {:<5} {}", fuel.label(), format_mass(summary.last_rob.fuel(fuel)));
            }
            println!("    FW    {}", format_mass(summary.last_rob.fresh_water));
            println!("    NaOH  {}", format_mass(summary.last_rob.naoh));
            if let (Some(cons), Some(rob)) = (&summary.lube_oil_cons, &summary.lube_oil_rob) {
                println!("  Lube oil consumption {} ROB {}", cons, rob);
            }
        }
        Commands::AddLeg { file } => app.apply(&file, Command::AddLeg).await?,
        Commands::DeleteLeg { file, index } => {
            app.apply(&file, Command::DeleteLeg { index }).await?
        }
        Commands::AddPhase { file, leg, report } => {
            app.apply(&file, Command::AddPhase { leg, kind: report }).await?
        }
        Commands::DeletePhase { file, at } => {
            app.apply(&file, Command::DeletePhase((&at).into())).await?
        }
        Commands::SetReading {
            file,
            at,
            key,
            side,
            value,
        } => {
            let at: PhaseRef = (&at).into();
            let side = ReadingSide::from(side);
            let status = reading_status_after(&app, &file, at, key, side, &value).await?;
            app.apply(
                &file,
                Command::SetReading {
                    at,
                    key,
                    side,
                    value,
                },
            )
            .await?;
            if let Some(message) = status {
                print_notice(&Notice::warning(message));
            }
        }
        Commands::SetFuel { file, at, key, fuel } => {
            app.apply(
                &file,
                Command::SetFuel {
                    at: (&at).into(),
                    key,
                    fuel,
                },
            )
            .await?
        }
        Commands::SetDensity {
            file,
            fuel,
            density,
        } => app.apply(&file, Command::SetDensity { fuel, density }).await?,
        Commands::CarryOver {
            file,
            at,
            keys,
            dry_run,
        } => {
            let mut session = app.edit(&file).await?;
            let cruise = session.active().ok_or_else(|| anyhow!("no voyage open"))?;
            let at: PhaseRef = (&at).into();

            let source = PhaseEndSnapshot::capture(cruise, at);
            let target = match resolve(cruise, source.as_ref()) {
                Ok(target) => target,
                Err(failure) => {
                    print_notice(&Notice::warning(failure.to_string()));
                    return Ok(());
                }
            };
            let source = source.ok_or_else(|| anyhow!("no END readings at {}", at))?;
            let keys = if keys.is_empty() {
                source.carried_keys().collect()
            } else {
                keys
            };

            println!("Carry over from {} to {} ({})", source.name, target.name, target.at);
            for key in &keys {
                let current = target.current_starts.get(key).map(String::as_str).unwrap_or("");
                let carried = source.ends.get(key).map(String::as_str).unwrap_or("");
                println!("  {:<8} {:>12} -> {}", key.label(), blank_dash(current), blank_dash(carried));
            }
            if dry_run {
                return Ok(());
            }

            let effects = session.apply(
                Command::CarryOver {
                    source,
                    target: target.at,
                    keys,
                },
                Utc::now(),
            )?;
            app.finish(&session, effects).await?;
        }
        Commands::Complete {
            file,
            engineer,
            lube_oil_cons,
            lube_oil_rob,
            notes,
        } => {
            let completion = Completion {
                lube_oil_cons,
                lube_oil_rob,
                engineer,
                notes,
            };
            app.apply(&file, Command::Complete(completion)).await?
        }
        Commands::Reopen { file } => app.apply(&file, Command::Reopen).await?,
        Commands::Backups => {
            let backups = app.persistence.backups().await?;
            println!("Backups ({})", backups.len());
            for cruise in backups {
                println!(
                    "  {} | {} | {}",
                    cruise.id,
                    display_name(&cruise),
                    cruise.last_modified.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
    }

    Ok(())
}

/// A warning for a reading that will not count towards the totals.
async fn reading_status_after(
    app: &App,
    file: &str,
    at: PhaseRef,
    key: EquipmentKey,
    side: ReadingSide,
    value: &str,
) -> Result<Option<String>> {
    let loaded = app.dir.load(file).await?;
    let Some(counter) = loaded
        .cruise
        .legs
        .get(at.leg)
        .and_then(|leg| leg.report(at.report).phases.get(at.phase))
        .map(|phase| phase.equipment.get(key))
    else {
        return Ok(None);
    };
    let (start, end) = match side {
        ReadingSide::Start => (value, counter.end.as_str()),
        ReadingSide::End => (counter.start.as_str(), value),
    };
    let status = reading_status(start, end);
    Ok(status
        .needs_attention()
        .then(|| format!("{} reading at {} is {:?} and will not be counted", key.label(), at, status)))
}

fn print_voyage(cruise: &Cruise) {
    println!(
        "{} | {} | {} - {} | {}",
        display_name(cruise),
        cruise.vessel,
        blank_dash(&cruise.start_date),
        blank_dash(&cruise.end_date),
        status_label(cruise)
    );
    let densities: Vec<String> = cruise
        .densities
        .entries()
        .map(|(fuel, density)| format!("{} {:.3}", fuel.label(), density))
        .collect();
    println!("Densities: {}", densities.join("  "));

    for (index, leg) in cruise.legs.iter().enumerate() {
        println!("Leg {}", index + 1);
        for report in [&leg.departure, &leg.arrival] {
            println!(
                "  {} {} {}",
                report.kind,
                blank_dash(&report.date),
                blank_dash(&report.port)
            );
            for (phase, view) in report.phases.iter().zip(report_view(report, &cruise.densities)) {
                println!("    [{}] {:?} {}", view.index + 1, view.kind, view.name);
                for (key, counter) in phase.equipment.iter() {
                    let mass = counter_consumption(counter, &cruise.densities);
                    let flag = if reading_status(&counter.start, &counter.end).needs_attention() {
                        " !"
                    } else {
                        ""
                    };
                    println!(
                        "        {:<8} {:<4} {:>12} {:>12} {:>10}{}",
                        key.label(),
                        counter.fuel.label(),
                        blank_dash(&counter.start),
                        blank_dash(&counter.end),
                        format_mass(mass),
                        flag
                    );
                }
                let label = if view.cumulative { "cumulative" } else { "phase" };
                println!(
                    "        {} engines {} MT, boilers {} MT",
                    label,
                    format_mass(Some(view.shown.engine.total())),
                    format_mass(Some(view.shown.boiler.total()))
                );
                if let Some(total) = view.grand_total {
                    println!("        grand total {} MT", format_mass(Some(total.total())));
                }
            }
        }
        if let Some(nav) = &leg.voyage_report {
            if let Some(speed) = nav.voyage.average_speed() {
                println!("  average speed {:.2} kn", speed);
            }
        }
    }
    println!("Total {} MT", format_mass(Some(cruise_totals(cruise).total())));
}

fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
    };
    println!("[{}] {}", tag, notice.message);
}

fn display_name(cruise: &Cruise) -> &str {
    if cruise.name.trim().is_empty() {
        "(unnamed voyage)"
    } else {
        &cruise.name
    }
}

fn status_label(cruise: &Cruise) -> &'static str {
    match cruise.status() {
        VoyageStatus::Draft => "draft",
        VoyageStatus::Completed => "completed",
    }
}

fn blank_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

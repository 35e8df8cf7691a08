use std::path::PathBuf;
use std::time::Instant;

use chrono::{Months, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use pravasi_registry::command::{
    LinkEstablishment, NewAdvance, NewEstablishment, NewFamilyMember, NewWorker, NewYear,
    WorkerFilter, WorkerUpdate,
};
use pravasi_registry::config::RegistryConfig;
use pravasi_registry::io::excel_write;
use pravasi_registry::model::{AdvanceMode, ESTABLISHMENT_TYPES, Gender, YearStatus};
use pravasi_registry::persistence::FileSnapshotStore;
use pravasi_registry::report::{self, ReportScope};
use pravasi_registry::store::RegistryStore;
use pravasi_registry::sync::{self, SyncStatus, WebhookClient};
use pravasi_registry::{RegistryError, Result, logging};

type Store = RegistryStore<FileSnapshotStore>;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init_logger(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => RegistryConfig::from_file(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    let persistence = FileSnapshotStore::new(&config.storage.data_dir, &config.storage.namespace);
    let mut store = RegistryStore::open(persistence);

    match cli.command {
        Command::Year(command) => execute_year(&mut store, command),
        Command::Establishment(command) => execute_establishment(&mut store, command),
        Command::Worker(command) => execute_worker(&mut store, command),
        Command::Family(command) => execute_family(&mut store, command),
        Command::Advance(command) => execute_advance(&mut store, command),
        Command::Stats { year } => execute_stats(&store, year),
        Command::Endpoint(command) => execute_endpoint(&mut store, command),
        Command::Export {
            output,
            current_year_only,
        } => execute_export(&store, &config, output, current_year_only),
        Command::Sync => execute_sync(&mut store, &config),
    }
}

fn resolve_year(store: &Store, year: Option<String>) -> Result<String> {
    match year {
        Some(year) => Ok(year),
        None => store
            .current_year()
            .map(|year| year.id.clone())
            .ok_or_else(|| RegistryError::InvalidState("no work year exists yet".into())),
    }
}

fn execute_year(store: &mut Store, command: YearCommand) -> Result<()> {
    match command {
        YearCommand::List => {
            for year in &store.state().years {
                let marker = if year.id == store.state().current_year_id {
                    "*"
                } else {
                    " "
                };
                let status = match year.status {
                    YearStatus::Active => "ACTIVE",
                    YearStatus::Closed => "CLOSED",
                };
                println!(
                    "{marker} {}\t{}\t{} .. {}\t{status}",
                    year.id, year.label, year.start_date, year.end_date
                );
            }
        }
        YearCommand::Add { label, start, end } => {
            let start_date = start.unwrap_or_else(|| Utc::now().date_naive());
            let end_date = match end {
                Some(end) => end,
                None => start_date
                    .checked_add_months(Months::new(12))
                    .ok_or_else(|| RegistryError::validation("endDate", "out of range"))?,
            };
            let year = store.add_year(NewYear {
                label,
                start_date,
                end_date,
            })?;
            println!("{}\t{} (current)", year.id, year.label);
        }
        YearCommand::Switch { year_id } => {
            store.switch_current_year(&year_id)?;
            println!("current year: {year_id}");
        }
        YearCommand::Close { year_id } => {
            store.close_year(&year_id)?;
            println!("closed: {year_id}");
        }
    }
    Ok(())
}

fn execute_establishment(store: &mut Store, command: EstablishmentCommand) -> Result<()> {
    match command {
        EstablishmentCommand::List { search, year } => {
            let year_id = resolve_year(store, year)?;
            let linked = store.year_establishments(&year_id);
            for master in store.search_establishments(search.as_deref().unwrap_or_default()) {
                match linked.iter().find(|entry| entry.link.master_id == master.id) {
                    Some(entry) => println!(
                        "{}\t{}\t{}\t{}\tactive: {} ({})",
                        master.id,
                        master.name,
                        master.registration_number,
                        master.kind,
                        entry.link.site_address,
                        entry.link.id
                    ),
                    None => println!(
                        "{}\t{}\t{}\t{}\tnot linked",
                        master.id, master.name, master.registration_number, master.kind
                    ),
                }
            }
        }
        EstablishmentCommand::Add {
            name,
            registration_number,
            kind,
        } => {
            if !ESTABLISHMENT_TYPES.contains(&kind.as_str()) {
                tracing::warn!(%kind, "establishment type is not one of the standard categories");
            }
            let master = store.add_establishment_master(NewEstablishment {
                name,
                registration_number,
                kind,
            })?;
            println!("{}\t{}", master.id, master.name);
        }
        EstablishmentCommand::Link {
            master_id,
            year,
            site_address,
            owner_name,
            owner_mobile,
        } => {
            let year_id = resolve_year(store, year)?;
            let link = store.link_establishment_to_year(LinkEstablishment {
                master_id,
                year_id,
                site_address,
                owner_name,
                owner_mobile,
            })?;
            println!("{}\t{}", link.id, link.site_address);
        }
    }
    Ok(())
}

fn execute_worker(store: &mut Store, command: WorkerCommand) -> Result<()> {
    match command {
        WorkerCommand::List {
            year,
            search,
            establishment,
        } => {
            let year_id = resolve_year(store, year)?;
            let filter = WorkerFilter {
                text: search,
                establishment_id: establishment,
            };
            for worker in store.query_workers(&year_id, &filter) {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\tfamily: {}",
                    worker.id,
                    worker.name,
                    worker.age,
                    worker.gender,
                    worker.mobile,
                    worker.native_state,
                    store.family_of(&worker.id).len()
                );
            }
        }
        WorkerCommand::Register(args) => {
            let year_id = resolve_year(store, args.year)?;
            let worker = store.register_worker(NewWorker {
                year_id,
                establishment_id: args.establishment,
                name: args.name,
                father_name: args.father_name,
                age: args.age,
                gender: args.gender.into(),
                caste: args.caste,
                mobile: args.mobile,
                aadhaar_number: args.aadhaar,
                native_state: args.native_state,
                nature_of_work: args.nature_of_work,
                joining_date: args.joining_date,
                expected_end_date: args.expected_end_date,
                has_family_at_site: args.family_at_site,
                notes: args.notes,
            })?;
            println!("{}\t{}", worker.id, worker.name);
        }
        WorkerCommand::Update {
            worker_id,
            notes,
            mobile,
            establishment,
            family_at_site,
        } => {
            let update = WorkerUpdate {
                notes,
                mobile,
                establishment_id: establishment,
                has_family_at_site: family_at_site,
                ..WorkerUpdate::default()
            };
            let worker = store.update_worker(&worker_id, update)?;
            println!("{}\tupdated", worker.id);
        }
    }
    Ok(())
}

fn execute_family(store: &mut Store, command: FamilyCommand) -> Result<()> {
    match command {
        FamilyCommand::List { worker_id } => {
            for member in store.family_of(&worker_id) {
                println!(
                    "{}\t{}\t{}\t{}",
                    member.id, member.name, member.relation, member.age
                );
            }
        }
        FamilyCommand::Add {
            worker_id,
            name,
            relation,
            age,
            notes,
        } => {
            let member = store.add_family_member(NewFamilyMember {
                worker_reg_id: worker_id,
                name,
                relation,
                age,
                notes,
            })?;
            println!("{}\t{}", member.id, member.name);
        }
        FamilyCommand::Remove { member_id } => {
            if store.delete_family_member(&member_id)? {
                println!("removed: {member_id}");
            } else {
                println!("not present: {member_id}");
            }
        }
    }
    Ok(())
}

fn execute_advance(store: &mut Store, command: AdvanceCommand) -> Result<()> {
    match command {
        AdvanceCommand::List { worker_id } => {
            for advance in store.advances_of(&worker_id) {
                println!(
                    "{}\t{}\t{:.2}\t{:?}\t{}",
                    advance.id, advance.date, advance.amount, advance.mode, advance.remarks
                );
            }
        }
        AdvanceCommand::Add {
            worker_id,
            amount,
            date,
            mode,
            remarks,
        } => {
            let advance = store.record_advance(NewAdvance {
                worker_reg_id: worker_id,
                amount,
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                mode: mode.into(),
                remarks,
            })?;
            println!("{}\t{:.2}", advance.id, advance.amount);
        }
    }
    Ok(())
}

fn execute_stats(store: &Store, year: Option<String>) -> Result<()> {
    let year_id = resolve_year(store, year)?;
    let stats = store.compute_year_statistics(&year_id)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    for (state, count) in store.native_state_breakdown(&year_id) {
        println!("state\t{state}\t{count}");
    }
    for (gender, count) in store.gender_breakdown(&year_id) {
        println!("gender\t{gender}\t{count}");
    }
    Ok(())
}

fn execute_endpoint(store: &mut Store, command: EndpointCommand) -> Result<()> {
    match command {
        EndpointCommand::Show => {
            match &store.state().integration_endpoint {
                Some(url) => println!("{url}"),
                None => println!("no endpoint configured"),
            }
            match store.state().last_synced_at {
                Some(at) => println!("last synced: {}", at.to_rfc3339()),
                None => println!("never synced"),
            }
        }
        EndpointCommand::Set { url } => {
            store.set_integration_endpoint(Some(url))?;
            println!("endpoint updated");
        }
        EndpointCommand::Clear => {
            store.set_integration_endpoint(None)?;
            println!("endpoint cleared");
        }
    }
    Ok(())
}

fn execute_export(
    store: &Store,
    config: &RegistryConfig,
    output: Option<PathBuf>,
    current_year_only: bool,
) -> Result<()> {
    let scope = if current_year_only {
        ReportScope::CurrentYear
    } else {
        ReportScope::AllYears
    };
    let output = output.unwrap_or_else(|| {
        config
            .report
            .output_dir
            .join(report::report_file_name(store.state()))
    });

    let workbook = report::build_report(store.state(), scope);
    excel_write::write_workbook(&output, &workbook)?;
    println!("{}", output.display());
    Ok(())
}

fn execute_sync(store: &mut Store, config: &RegistryConfig) -> Result<()> {
    let request = sync::prepare(store.state(), Utc::now())?;
    let client = WebhookClient::new(config.sync.policy())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut status = SyncStatus::default();
    status.begin(Instant::now());
    let outcome = runtime.block_on(client.deliver(&request));
    status.finish(&outcome, Instant::now());
    println!("sync status: {:?}", status.state_at(Instant::now()));

    sync::apply_outcome(store, &outcome, Utc::now())?;
    println!("sync delivered");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "District registry of migrant workers, establishments, and work years."
)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the registry snapshot. Overrides the config file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage work year cycles.
    #[command(subcommand)]
    Year(YearCommand),
    /// Manage master establishments and their yearly activations.
    #[command(subcommand)]
    Establishment(EstablishmentCommand),
    /// Register and search workers.
    #[command(subcommand)]
    Worker(WorkerCommand),
    /// Manage family members living at the site.
    #[command(subcommand)]
    Family(FamilyCommand),
    /// Record and list cash advances.
    #[command(subcommand)]
    Advance(AdvanceCommand),
    /// Show statistics for a work year.
    Stats {
        /// Defaults to the current year.
        #[arg(long)]
        year: Option<String>,
    },
    /// Configure the sync webhook.
    #[command(subcommand)]
    Endpoint(EndpointCommand),
    /// Write the district Excel report.
    Export {
        /// Output path. Defaults to the standard report name in the report directory.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only include the current year.
        #[arg(long)]
        current_year_only: bool,
    },
    /// Push the registry to the configured webhook.
    Sync,
}

#[derive(Subcommand)]
enum YearCommand {
    List,
    /// Open a new cycle and make it current.
    Add {
        label: String,
        /// Defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Defaults to one year after the start date.
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    Switch {
        year_id: String,
    },
    /// Finalize a cycle. This cannot be undone.
    Close {
        year_id: String,
    },
}

#[derive(Subcommand)]
enum EstablishmentCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        year: Option<String>,
    },
    Add {
        name: String,
        registration_number: String,
        #[arg(long, default_value = "Other")]
        kind: String,
    },
    /// Activate a master establishment for a year.
    Link {
        master_id: String,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        site_address: String,
        #[arg(long, default_value = "")]
        owner_name: String,
        #[arg(long, default_value = "")]
        owner_mobile: String,
    },
}

#[derive(Subcommand)]
enum WorkerCommand {
    List {
        #[arg(long)]
        year: Option<String>,
        /// Matches name, mobile, or Aadhaar number.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        establishment: Option<String>,
    },
    Register(RegisterArgs),
    Update {
        worker_id: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        establishment: Option<String>,
        #[arg(long)]
        family_at_site: Option<bool>,
    },
}

#[derive(clap::Args)]
struct RegisterArgs {
    #[arg(long)]
    year: Option<String>,
    /// Yearly establishment id.
    #[arg(long)]
    establishment: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    father_name: String,
    #[arg(long)]
    age: u8,
    #[arg(long, value_enum)]
    gender: GenderArg,
    #[arg(long, default_value = "")]
    caste: String,
    #[arg(long)]
    mobile: String,
    #[arg(long)]
    aadhaar: String,
    #[arg(long, default_value = "")]
    native_state: String,
    #[arg(long, default_value = "")]
    nature_of_work: String,
    #[arg(long)]
    joining_date: NaiveDate,
    #[arg(long)]
    expected_end_date: NaiveDate,
    #[arg(long)]
    family_at_site: bool,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum FamilyCommand {
    List {
        worker_id: String,
    },
    Add {
        worker_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        relation: String,
        #[arg(long)]
        age: u8,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove {
        member_id: String,
    },
}

#[derive(Subcommand)]
enum AdvanceCommand {
    List {
        worker_id: String,
    },
    Add {
        worker_id: String,
        #[arg(long)]
        amount: f64,
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value = "cash")]
        mode: AdvanceModeArg,
        #[arg(long, default_value = "")]
        remarks: String,
    },
}

#[derive(Subcommand)]
enum EndpointCommand {
    Show,
    Set { url: String },
    Clear,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum GenderArg {
    Male,
    Female,
    Other,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
            GenderArg::Other => Gender::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AdvanceModeArg {
    Cash,
    BankTransfer,
    Other,
}

impl From<AdvanceModeArg> for AdvanceMode {
    fn from(arg: AdvanceModeArg) -> Self {
        match arg {
            AdvanceModeArg::Cash => AdvanceMode::Cash,
            AdvanceModeArg::BankTransfer => AdvanceMode::BankTransfer,
            AdvanceModeArg::Other => AdvanceMode::Other,
        }
    }
}

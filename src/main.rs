use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use dialoguer::{Confirm, Input};
use jenv_core::ports::{InstallationValidator, Linker};
use jenv_core::{InstallationRecord, ScanResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

use jenv::adapters::env::default_backend;
use jenv::adapters::link::SymlinkLinker;
use jenv::adapters::persistence::JsonRegistryStore;
use jenv::adapters::validator::JavaValidator;
use jenv::cli::{CliArgs, Commands};
use jenv::config::Settings;
use jenv::scan::{CancelToken, ScanEvent};
use jenv::services::{JdkService, ScanOverrides};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(CliArgs::parse()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

/// Composition root: wires the adapters into the service and runs one command.
fn run(cli_args: CliArgs) -> Result<()> {
    let settings = Settings::from_cli_and_file(&cli_args)?;
    let store_path = settings.store_path()?;
    debug!("Using registry at {}", store_path.display());

    let validator: Arc<dyn InstallationValidator> = Arc::new(JavaValidator);
    let linker: Arc<dyn Linker> = Arc::new(SymlinkLinker);
    let store = Arc::new(JsonRegistryStore::open(&store_path, validator.clone())?);
    let env = default_backend()?;

    let service = JdkService::new(store, env, linker, validator, settings);

    match cli_args.command {
        Commands::Init => {
            let link = service.init()?;
            println!("Initialized. JAVA_HOME now points at {}", link.display());
            println!("Open a new shell for the environment changes to take effect.");
        }
        Commands::Add { name, path } => {
            let record = service.add(&name, &path)?;
            println!("Added {}", record);
        }
        Commands::Remove { name } => {
            let record = service.remove(&name)?;
            println!("Removed {}", record);
        }
        Commands::List => {
            let entries = service.list();
            if entries.is_empty() {
                println!("No JDKs registered. Use `jenv add` or `jenv scan`.");
            }
            for entry in entries {
                let marker = if entry.current { "*" } else { " " };
                println!("{} {:<20} {}", marker, entry.record.name, entry.record.path.display());
            }
        }
        Commands::Use { name } => {
            let record = service.use_jdk(&name)?;
            println!("Now using {}", record);
        }
        Commands::Current => {
            let record = service.current()?;
            println!("{}", record);
        }
        Commands::Scan {
            dir,
            max_depth,
            workers,
            yes,
        } => {
            let overrides = ScanOverrides { max_depth, workers };
            let result = scan_with_progress(&service, &dir, overrides);
            register_interactively(&service, &result, yes)?;
        }
        Commands::AddToPath { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => executable_dir()?,
            };
            if service.add_to_path(&dir)? {
                println!("Added {} to PATH", dir.display());
            } else {
                println!("{} is already on PATH", dir.display());
            }
        }
    }

    Ok(())
}

/// Run a scan, printing installations as they are found.
fn scan_with_progress(service: &JdkService, dir: &Path, overrides: ScanOverrides) -> ScanResult {
    let (events_tx, events_rx) = unbounded();
    let (_cancel_handle, cancel) = CancelToken::new();

    println!("Scanning {} ...", dir.display());
    let result = thread::scope(|s| {
        s.spawn(move || {
            for event in events_rx {
                match event {
                    ScanEvent::InstallationFound(record) => {
                        println!("  found {}", record.path.display());
                    }
                    ScanEvent::ScanCompleted(stats) => {
                        debug!("Scan completed: {:?}", stats);
                    }
                }
            }
        });

        let result = service.scan(dir, overrides, &cancel, Some(&events_tx));
        drop(events_tx);
        result
    });

    println!(
        "Scanned {} directories in {:.2?}: {} new JDK(s), {} skipped, {} already registered",
        result.scanned(),
        result.duration(),
        result.installations().len(),
        result.skipped(),
        result.excluded()
    );
    result
}

fn register_interactively(service: &JdkService, result: &ScanResult, yes: bool) -> Result<()> {
    if result.installations().is_empty() {
        return Ok(());
    }

    let mut prompt_error = None;
    let summary = service.register_found(result.installations(), |record| {
        if prompt_error.is_some() {
            return None;
        }
        if yes {
            return Some(record.name.clone());
        }
        match prompt_name(record) {
            Ok(name) => name,
            Err(e) => {
                prompt_error = Some(e);
                None
            }
        }
    });

    for record in &summary.added {
        println!("Registered {}", record);
    }
    if !summary.skipped.is_empty() {
        info!("{} installation(s) not registered", summary.skipped.len());
        println!("Skipped {} installation(s)", summary.skipped.len());
    }

    match prompt_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Ask whether to register `record` and under which name.
fn prompt_name(record: &InstallationRecord) -> Result<Option<String>> {
    let register = Confirm::new()
        .with_prompt(format!("Register {}?", record.path.display()))
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;
    if !register {
        return Ok(None);
    }

    let name: String = Input::<String>::new()
        .with_prompt("Name")
        .default(record.name.clone())
        .interact_text()
        .context("Failed to read name")?;
    let name = name.trim().to_string();

    Ok((!name.is_empty()).then_some(name))
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the jenv executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("jenv executable has no parent directory")
}

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use dienstwagen_core::codec;
use dienstwagen_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use dienstwagen_core::{ConfigRepository, ProfileService, TaxParameters, UserProfile, Vehicle};
use dienstwagen_data::VehicleLoader;
use dienstwagen_db_sqlite::SqliteRepositoryFactory;
use tracing::debug;
use uuid::Uuid;

use crate::cli::{CarArgs, CarCommand, Command, ProfileCommand};
use crate::output;
use crate::settings::RuntimeConfig;

/// Build a registry with every compiled-in backend.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// Opens the configured backend and runs `command` against it.
pub async fn run(
    command: &Command,
    config: &RuntimeConfig,
    out: &mut impl Write,
) -> Result<()> {
    debug!("connecting to {} backend", config.db.backend);
    let repo = build_registry()
        .create(&config.db)
        .await
        .with_context(|| format!("cannot open '{}' database", config.db.backend))?;

    let params = TaxParameters::year_2025();
    execute(command, &*repo, &params, out).await
}

pub async fn execute(
    command: &Command,
    repo: &dyn ConfigRepository,
    params: &TaxParameters,
    out: &mut impl Write,
) -> Result<()> {
    let service = ProfileService::new(repo, params);
    service.initialize().await?;

    match command {
        Command::Profile(command) => profile(command, &service, out).await,
        Command::Car(command) => car(command, &service, repo, out).await,
        Command::Net => {
            let profile = service.active_profile().await?;
            let breakdown = service.net_income().await?;
            writeln!(out, "Profile: {}", profile.name)?;
            writeln!(out, "{}", output::breakdown_table(&breakdown))?;
            Ok(())
        }
        Command::Compare => compare(&service, out).await,
        Command::Export { out: target } => export(&service, target.as_deref(), out).await,
        Command::Import { file } => {
            let json = fs::read_to_string(file)
                .with_context(|| format!("cannot read '{}'", file.display()))?;
            let snapshot = service
                .import_document(&json)
                .await
                .with_context(|| format!("cannot import '{}'", file.display()))?;
            writeln!(
                out,
                "Imported {} profiles and {} cars.",
                snapshot.profiles.len(),
                snapshot.vehicles.len()
            )?;
            Ok(())
        }
    }
}

async fn profile(
    command: &ProfileCommand,
    service: &ProfileService<'_>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        ProfileCommand::List => {
            let profiles = service.list_profiles().await?;
            let active = service.active_profile().await?;
            writeln!(out, "{}", output::profiles_table(&profiles, Some(active.id)))?;
        }
        ProfileCommand::Show => {
            let active = service.active_profile().await?;
            writeln!(out, "{}", output::profile_details(&active))?;
        }
        ProfileCommand::Add { name, copy } => {
            let data = if *copy {
                Some(service.active_profile().await?.user_data)
            } else {
                None
            };
            let profile = service.add_profile(name, data).await?;
            writeln!(out, "Added profile '{}' ({}); it is now active.", profile.name, profile.id)?;
        }
        ProfileCommand::Rename { profile, name } => {
            let id = find_profile(service, profile).await?.id;
            let renamed = service.rename_profile(id, name).await?;
            writeln!(out, "Renamed profile to '{}'.", renamed.name)?;
        }
        ProfileCommand::Delete { profile } => {
            let target = find_profile(service, profile).await?;
            service.delete_profile(target.id).await?;
            let active = service.active_profile().await?;
            writeln!(
                out,
                "Deleted profile '{}'. Active profile: '{}'.",
                target.name, active.name
            )?;
        }
        ProfileCommand::Activate { profile } => {
            let target = find_profile(service, profile).await?;
            service.set_active_profile(target.id).await?;
            writeln!(out, "Active profile: '{}'.", target.name)?;
        }
        ProfileCommand::Set(fields) => {
            let updated = service.update_user_data(&fields.into()).await?;
            writeln!(out, "{}", output::profile_details(&updated))?;
        }
    }
    Ok(())
}

async fn car(
    command: &CarCommand,
    service: &ProfileService<'_>,
    repo: &dyn ConfigRepository,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        CarCommand::List => {
            let vehicles = service.list_vehicles().await?;
            if vehicles.is_empty() {
                writeln!(out, "No cars stored.")?;
            } else {
                writeln!(out, "{}", output::vehicles_table(&vehicles))?;
            }
        }
        CarCommand::Add(args) => {
            let vehicle = service.add_vehicle(vehicle_from_args(args)?).await?;
            writeln!(out, "Added car '{}' ({}).", vehicle.name, vehicle.id)?;
        }
        CarCommand::Remove { vehicle } => {
            let target = find_vehicle(service, vehicle).await?;
            service.remove_vehicle(target.id).await?;
            writeln!(out, "Removed car '{}'.", target.name)?;
        }
        CarCommand::ImportCsv { file } => {
            let reader = File::open(file)
                .with_context(|| format!("cannot open '{}'", file.display()))?;
            let records = VehicleLoader::parse(reader)
                .with_context(|| format!("cannot parse '{}'", file.display()))?;
            let loaded = VehicleLoader::load(repo, &records)
                .await
                .with_context(|| format!("cannot load cars from '{}'", file.display()))?;
            writeln!(out, "Loaded {loaded} cars.")?;
        }
    }
    Ok(())
}

async fn compare(
    service: &ProfileService<'_>,
    out: &mut impl Write,
) -> Result<()> {
    let profile = service.active_profile().await?;
    let without_car = service.net_income().await?;
    let comparisons = service.compare_active().await?;

    writeln!(out, "Profile: {}", profile.name)?;
    writeln!(out, "Net without car: {}", output::money(without_car.net))?;
    if comparisons.is_empty() {
        writeln!(out, "No cars stored.")?;
    } else {
        writeln!(out, "{}", output::comparison_table(&comparisons))?;
    }
    Ok(())
}

async fn export(
    service: &ProfileService<'_>,
    target: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let now = Utc::now();
    let document = service.export_document(now).await?;
    let json = codec::to_json(&document).context("cannot serialise export")?;

    let path = match target {
        Some(path) if path == Path::new("-") => {
            writeln!(out, "{json}")?;
            return Ok(());
        }
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(codec::export_file_name(now)),
    };

    fs::write(&path, json).with_context(|| format!("cannot write '{}'", path.display()))?;
    writeln!(
        out,
        "Exported {} profiles and {} cars to {}.",
        document.profiles.len(),
        document.vehicles.len(),
        path.display()
    )?;
    Ok(())
}

fn vehicle_from_args(args: &CarArgs) -> Result<Vehicle> {
    let mut vehicle = Vehicle::new(args.name.trim(), args.price, args.taxation);
    vehicle.co_payment = args.co_payment_policy()?;
    vehicle.configurator_code = args.code.clone();
    vehicle.configurator_link = args.link.clone();
    Ok(vehicle)
}

/// Looks a profile up by id, then by exact name.
async fn find_profile(
    service: &ProfileService<'_>,
    key: &str,
) -> Result<UserProfile> {
    let profiles = service.list_profiles().await?;
    pick_one(profiles, key, |p| (p.id, p.name.as_str()), "profile")
}

/// Looks a car up by id, then by exact name.
async fn find_vehicle(
    service: &ProfileService<'_>,
    key: &str,
) -> Result<Vehicle> {
    let vehicles = service.list_vehicles().await?;
    pick_one(vehicles, key, |v| (v.id, v.name.as_str()), "car")
}

fn pick_one<T>(
    items: Vec<T>,
    key: &str,
    identity: impl Fn(&T) -> (Uuid, &str),
    kind: &str,
) -> Result<T> {
    if let Ok(id) = Uuid::parse_str(key) {
        return items
            .into_iter()
            .find(|item| identity(item).0 == id)
            .ok_or_else(|| anyhow!("no {kind} with id {id}"));
    }

    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| identity(item).1 == key)
        .collect();
    match matches.len() {
        0 => bail!("no {kind} named '{key}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("{n} {kind}s are named '{key}'; use the id instead"),
    }
}

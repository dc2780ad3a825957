use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dienstwagen_core::{CoPaymentPolicy, FederalState, ProfileUpdate, TaxClass, TaxationType};
use rust_decimal::Decimal;
use thiserror::Error;

/// Compare the monthly net income with and without a company car.
///
/// Profiles hold the payroll data a calculation runs against; vehicles are
/// the offers to compare. Both are stored in the configured database.
#[derive(Debug, Parser)]
#[command(name = "dienstwagen", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand. Unset values come from the settings
/// file, then from the built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Database backend to use [default: sqlite].
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `dienstwagen.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// TOML settings file [default: ./dienstwagen.toml when present].
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log calculation steps.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append log records to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Manage company car offers.
    #[command(subcommand)]
    Car(CarCommand),

    /// Show the active profile's net income without a company car.
    Net,

    /// Compare every stored car against no company car.
    Compare,

    /// Export profiles and cars as JSON.
    Export {
        /// Target file, `-` for stdout [default: dienstwagen-config-<date>.json].
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replace all profiles and cars with the contents of an export file.
    Import {
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// List all profiles; the active one is marked.
    List,

    /// Show the active profile.
    Show,

    /// Add a profile and make it active.
    Add {
        name: String,

        /// Start from the active profile's data instead of the defaults.
        #[arg(long)]
        copy: bool,
    },

    /// Rename a profile, given by id or name.
    Rename {
        profile: String,
        name: String,
    },

    /// Delete a profile, given by id or name.
    Delete {
        profile: String,
    },

    /// Make a profile active, given by id or name.
    Activate {
        profile: String,
    },

    /// Change fields of the active profile.
    Set(ProfileFields),
}

/// Fields of the active profile to change; omitted fields stay as they are.
#[derive(Debug, Clone, Default, Args)]
pub struct ProfileFields {
    /// Monthly gross salary in euros.
    #[arg(long)]
    pub gross: Option<Decimal>,

    /// Tax class, 1-6 or I-VI.
    #[arg(long)]
    pub tax_class: Option<TaxClass>,

    /// Federal state, e.g. `Bayern` or `Nordrhein-Westfalen`.
    #[arg(long)]
    pub state: Option<FederalState>,

    #[arg(long)]
    pub birth_year: Option<i32>,

    /// Number of child allowances, e.g. `1.5`.
    #[arg(long)]
    pub children: Option<Decimal>,

    /// Monthly tax-free allowance in euros.
    #[arg(long)]
    pub allowance: Option<Decimal>,

    #[arg(long)]
    pub church_tax: Option<bool>,

    /// Total pension insurance rate in percent.
    #[arg(long)]
    pub pension_rate: Option<Decimal>,

    /// General health insurance rate in percent.
    #[arg(long)]
    pub health_rate: Option<Decimal>,

    /// Health insurer's additional contribution in percent.
    #[arg(long)]
    pub health_surcharge: Option<Decimal>,
}

impl From<&ProfileFields> for ProfileUpdate {
    fn from(fields: &ProfileFields) -> Self {
        ProfileUpdate {
            gross_monthly_salary: fields.gross,
            tax_class: fields.tax_class,
            state: fields.state,
            birth_year: fields.birth_year,
            child_allowances: fields.children,
            monthly_tax_free_allowance: fields.allowance,
            church_tax_liable: fields.church_tax,
            pension_rate: fields.pension_rate,
            health_rate: fields.health_rate,
            health_surcharge_rate: fields.health_surcharge,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CarCommand {
    /// List stored cars.
    List,

    /// Add a car.
    Add(CarArgs),

    /// Remove a car, given by id or name.
    Remove {
        vehicle: String,
    },

    /// Load cars from a CSV file. Rows matching a stored name replace it.
    ImportCsv {
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CarArgs {
    pub name: String,

    /// Gross list price in euros.
    #[arg(long)]
    pub price: Decimal,

    /// full, hybrid or electric.
    #[arg(long, default_value = "full")]
    pub taxation: TaxationType,

    /// Employee co-payment policy.
    #[arg(long, value_enum, default_value_t = CoPaymentKind::Default)]
    pub co_payment: CoPaymentKind,

    /// Monthly amount for `--co-payment fixed`.
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Percent of the list price above the threshold, for `--co-payment percentage`.
    #[arg(long)]
    pub percentage: Option<Decimal>,

    /// List price threshold for `--co-payment percentage`.
    #[arg(long)]
    pub threshold: Option<Decimal>,

    /// Configurator code of the offer.
    #[arg(long)]
    pub code: Option<String>,

    /// Link to the offer in the configurator.
    #[arg(long)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoPaymentKind {
    /// 1.5 % of the list price above 45 000.
    Default,
    None,
    Fixed,
    Percentage,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("--co-payment {kind} requires --{flag}")]
pub struct MissingCoPaymentFlag {
    pub kind: &'static str,
    pub flag: &'static str,
}

impl CarArgs {
    /// The policy described by the co-payment flags; `None` means the default applies.
    pub fn co_payment_policy(&self) -> Result<Option<CoPaymentPolicy>, MissingCoPaymentFlag> {
        let require = |value: Option<Decimal>, kind, flag| {
            value.ok_or(MissingCoPaymentFlag { kind, flag })
        };

        let policy = match self.co_payment {
            CoPaymentKind::Default => return Ok(None),
            CoPaymentKind::None => CoPaymentPolicy::None,
            CoPaymentKind::Fixed => CoPaymentPolicy::Fixed {
                monthly_amount: require(self.amount, "fixed", "amount")?,
            },
            CoPaymentKind::Percentage => CoPaymentPolicy::Percentage {
                percentage: require(self.percentage, "percentage", "percentage")?,
                threshold: require(self.threshold, "percentage", "threshold")?,
            },
        };
        Ok(Some(policy))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dienstwagen").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    fn car_args(args: &[&str]) -> CarArgs {
        let mut full = vec!["car", "add"];
        full.extend_from_slice(args);
        match parse(&full).command {
            Command::Car(CarCommand::Add(args)) => args,
            other => panic!("expected car add, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_are_optional() {
        let cli = parse(&["net"]);

        assert_eq!(cli.global.backend, None);
        assert_eq!(cli.global.db, None);
        assert!(!cli.global.verbose);
        assert!(matches!(cli.command, Command::Net));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["compare", "--db", ":memory:", "-v", "--backend", "memory"]);

        assert_eq!(cli.global.db.as_deref(), Some(":memory:"));
        assert_eq!(cli.global.backend.as_deref(), Some("memory"));
        assert!(cli.global.verbose);
    }

    #[test]
    fn profile_set_parses_typed_values() {
        let cli = parse(&[
            "profile",
            "set",
            "--gross",
            "5000",
            "--tax-class",
            "III",
            "--state",
            "Sachsen",
            "--church-tax",
            "true",
        ]);

        let Command::Profile(ProfileCommand::Set(fields)) = cli.command else {
            panic!("expected profile set");
        };
        let update = ProfileUpdate::from(&fields);

        assert_eq!(update.gross_monthly_salary, Some(dec!(5000)));
        assert_eq!(update.tax_class, Some(TaxClass::III));
        assert_eq!(update.state, Some(FederalState::Sachsen));
        assert_eq!(update.church_tax_liable, Some(true));
        assert_eq!(update.birth_year, None);
    }

    #[test]
    fn unknown_tax_class_is_rejected() {
        let result = Cli::try_parse_from(["dienstwagen", "profile", "set", "--tax-class", "7"]);

        assert!(result.is_err());
    }

    #[test]
    fn car_defaults_to_full_taxation_and_default_policy() {
        let args = car_args(&["Kombi", "--price", "60000"]);

        assert_eq!(args.taxation, TaxationType::Full);
        assert_eq!(args.co_payment_policy(), Ok(None));
    }

    #[test]
    fn car_fixed_policy_needs_amount() {
        let args = car_args(&["Kombi", "--price", "60000", "--co-payment", "fixed"]);

        assert_eq!(
            args.co_payment_policy(),
            Err(MissingCoPaymentFlag {
                kind: "fixed",
                flag: "amount"
            })
        );
    }

    #[test]
    fn car_percentage_policy() {
        let args = car_args(&[
            "SUV",
            "--price",
            "70000",
            "--taxation",
            "electric",
            "--co-payment",
            "percentage",
            "--percentage",
            "1.0",
            "--threshold",
            "50000",
        ]);

        assert_eq!(args.taxation, TaxationType::Electric);
        assert_eq!(
            args.co_payment_policy(),
            Ok(Some(CoPaymentPolicy::Percentage {
                percentage: dec!(1.0),
                threshold: dec!(50000),
            }))
        );
    }
}

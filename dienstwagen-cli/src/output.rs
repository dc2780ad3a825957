//! Table rendering for command output.

use dienstwagen_core::calculations::{NetIncomeBreakdown, VehicleComparison};
use dienstwagen_core::{CoPaymentPolicy, UserProfile, Vehicle};
use rust_decimal::{Decimal, RoundingStrategy};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};
use uuid::Uuid;

/// Two decimals, rounded half away from zero.
pub fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn describe_co_payment(vehicle: &Vehicle) -> String {
    let describe = |policy: CoPaymentPolicy| match policy {
        CoPaymentPolicy::None => "none".to_string(),
        CoPaymentPolicy::Fixed { monthly_amount } => format!("{} / month", money(monthly_amount)),
        CoPaymentPolicy::Percentage {
            percentage,
            threshold,
        } => format!("{} % above {}", percentage.normalize(), money(threshold)),
    };

    match vehicle.co_payment {
        Some(policy) => describe(policy),
        None => format!("default ({})", describe(vehicle.effective_co_payment())),
    }
}

fn render<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_numeric<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string()
}

#[derive(Debug, Clone, Tabled)]
pub struct ProfileRow {
    #[tabled(rename = "")]
    pub active: &'static str,

    #[tabled(rename = "Id")]
    pub id: String,

    #[tabled(rename = "Name")]
    pub name: String,

    #[tabled(rename = "Gross")]
    pub gross: String,

    #[tabled(rename = "Class")]
    pub tax_class: String,

    #[tabled(rename = "State")]
    pub state: String,

    #[tabled(rename = "Children")]
    pub children: String,

    #[tabled(rename = "Church")]
    pub church: &'static str,
}

pub fn profiles_table(
    profiles: &[UserProfile],
    active_id: Option<Uuid>,
) -> String {
    let rows: Vec<ProfileRow> = profiles
        .iter()
        .map(|profile| {
            let data = &profile.user_data;
            ProfileRow {
                active: if Some(profile.id) == active_id { "*" } else { "" },
                id: profile.id.to_string(),
                name: profile.name.clone(),
                gross: money(data.gross_monthly_salary),
                tax_class: data.tax_class.to_string(),
                state: data.state.to_string(),
                children: data.child_allowances.normalize().to_string(),
                church: if data.church_tax_liable { "yes" } else { "no" },
            }
        })
        .collect();
    render(&rows)
}

#[derive(Debug, Clone, Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,

    #[tabled(rename = "Value")]
    value: String,
}

/// Every stored field of one profile.
pub fn profile_details(profile: &UserProfile) -> String {
    let data = &profile.user_data;
    let percent = |value: Decimal| format!("{} %", value.normalize());
    let rows = vec![
        FieldRow {
            field: "Id",
            value: profile.id.to_string(),
        },
        FieldRow {
            field: "Name",
            value: profile.name.clone(),
        },
        FieldRow {
            field: "Gross salary",
            value: money(data.gross_monthly_salary),
        },
        FieldRow {
            field: "Tax class",
            value: data.tax_class.to_string(),
        },
        FieldRow {
            field: "State",
            value: data.state.to_string(),
        },
        FieldRow {
            field: "Birth year",
            value: data.birth_year.to_string(),
        },
        FieldRow {
            field: "Child allowances",
            value: data.child_allowances.normalize().to_string(),
        },
        FieldRow {
            field: "Tax-free allowance",
            value: money(data.monthly_tax_free_allowance),
        },
        FieldRow {
            field: "Church tax",
            value: if data.church_tax_liable { "yes" } else { "no" }.to_string(),
        },
        FieldRow {
            field: "Pension rate",
            value: percent(data.pension_rate),
        },
        FieldRow {
            field: "Health rate",
            value: percent(data.health_rate),
        },
        FieldRow {
            field: "Health surcharge",
            value: percent(data.health_surcharge_rate),
        },
    ];
    render(&rows)
}

#[derive(Debug, Clone, Tabled)]
pub struct VehicleRow {
    #[tabled(rename = "Id")]
    pub id: String,

    #[tabled(rename = "Name")]
    pub name: String,

    #[tabled(rename = "List price")]
    pub list_price: String,

    #[tabled(rename = "Taxation")]
    pub taxation: String,

    #[tabled(rename = "Co-payment")]
    pub co_payment: String,

    #[tabled(rename = "Configurator")]
    pub configurator: String,
}

pub fn vehicles_table(vehicles: &[Vehicle]) -> String {
    let rows: Vec<VehicleRow> = vehicles
        .iter()
        .map(|vehicle| VehicleRow {
            id: vehicle.id.to_string(),
            name: vehicle.name.clone(),
            list_price: money(vehicle.list_price),
            taxation: vehicle.taxation.to_string(),
            co_payment: describe_co_payment(vehicle),
            configurator: vehicle
                .configurator_code
                .clone()
                .or_else(|| vehicle.configurator_link.clone())
                .unwrap_or_default(),
        })
        .collect();
    render(&rows)
}

#[derive(Debug, Clone, Tabled)]
struct AmountRow {
    #[tabled(rename = "Item")]
    item: &'static str,

    #[tabled(rename = "Amount")]
    amount: String,
}

/// One month from gross to net.
pub fn breakdown_table(breakdown: &NetIncomeBreakdown) -> String {
    let si = &breakdown.social_insurance;
    let row = |item, amount| AmountRow {
        item,
        amount: money(amount),
    };
    let rows = vec![
        row("Gross", breakdown.gross),
        row("Taxable gross", breakdown.taxable_gross),
        row("Income tax", breakdown.income_tax),
        row("Church tax", breakdown.church_tax),
        row("Health insurance", si.health),
        row("Care insurance", si.care),
        row("Pension insurance", si.pension),
        row("Unemployment insurance", si.unemployment),
        row("Net", breakdown.net),
    ];
    render_numeric(&rows)
}

#[derive(Debug, Clone, Tabled)]
pub struct ComparisonRow {
    #[tabled(rename = "Car")]
    pub vehicle: String,

    #[tabled(rename = "Benefit")]
    pub benefit: String,

    #[tabled(rename = "Co-payment")]
    pub co_payment: String,

    #[tabled(rename = "Tax burden")]
    pub tax_burden: String,

    #[tabled(rename = "Net with car")]
    pub net_with_car: String,

    #[tabled(rename = "Difference")]
    pub net_delta: String,
}

/// One row per vehicle. A failed comparison fills its row with the error.
pub fn comparison_table(comparisons: &[VehicleComparison]) -> String {
    let rows: Vec<ComparisonRow> = comparisons
        .iter()
        .map(|entry| match &entry.result {
            Ok(result) => ComparisonRow {
                vehicle: entry.vehicle_name.clone(),
                benefit: money(result.benefit),
                co_payment: money(result.co_payment),
                tax_burden: money(result.tax_burden),
                net_with_car: money(result.net_with_car),
                net_delta: money(result.net_delta),
            },
            Err(error) => ComparisonRow {
                vehicle: entry.vehicle_name.clone(),
                benefit: format!("error: {error}"),
                co_payment: String::new(),
                tax_burden: String::new(),
                net_with_car: String::new(),
                net_delta: String::new(),
            },
        })
        .collect();
    render_numeric(&rows)
}

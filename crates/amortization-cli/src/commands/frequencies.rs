use clap::{Args, Subcommand};
use serde_json::{json, Value};

use amortization_core::frequency::{Frequency, FrequencyCatalog};

use crate::input;

/// Arguments for browsing and maintaining the frequency catalog
#[derive(Args)]
pub struct FrequenciesArgs {
    #[command(subcommand)]
    pub action: Option<FrequencyAction>,
}

#[derive(Subcommand)]
pub enum FrequencyAction {
    /// List every frequency (the default)
    List,
    /// Show one frequency with its neighbours
    Show {
        /// Frequency id; omit to show the first entry
        #[arg(long)]
        id: Option<u32>,
    },
    /// Add a frequency under the next free id
    Add(FrequencyFields),
    /// Replace an existing frequency
    Update {
        #[arg(long)]
        id: u32,
        #[command(flatten)]
        fields: FrequencyFields,
    },
    /// Delete a frequency
    Remove {
        #[arg(long)]
        id: u32,
    },
}

#[derive(Args)]
pub struct FrequencyFields {
    /// Display name, unique within the catalog
    #[arg(long = "type")]
    pub frequency_type: String,

    #[arg(long)]
    pub payments_per_year: u32,

    #[arg(long)]
    pub days_between_payments: u32,
}

/// Mutating actions are saved back to `catalog_path` when one was given.
pub fn run_frequencies(
    args: FrequenciesArgs,
    catalog: &mut FrequencyCatalog,
    catalog_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let action = args.action.unwrap_or(FrequencyAction::List);

    let changed = match action {
        FrequencyAction::List => return Ok(list(catalog)),
        FrequencyAction::Show { id } => return show(catalog, id),
        FrequencyAction::Add(fields) => catalog
            .insert(
                &fields.frequency_type,
                fields.payments_per_year,
                fields.days_between_payments,
            )?
            .clone(),
        FrequencyAction::Update { id, fields } => catalog
            .update(
                id,
                &fields.frequency_type,
                fields.payments_per_year,
                fields.days_between_payments,
            )?
            .clone(),
        FrequencyAction::Remove { id } => catalog.remove(id)?,
    };

    if let Some(path) = catalog_path {
        input::catalog::save_catalog(path, catalog)?;
    }

    let mut value = list(catalog);
    value["changed"] = serde_json::to_value(changed)?;
    Ok(value)
}

fn list(catalog: &FrequencyCatalog) -> Value {
    let frequencies: Vec<&Frequency> = catalog.iter().collect();
    json!({
        "count": catalog.len(),
        "frequencies": frequencies,
    })
}

fn show(catalog: &FrequencyCatalog, id: Option<u32>) -> Result<Value, Box<dyn std::error::Error>> {
    let frequency = match id {
        Some(id) => catalog.get(id)?,
        None => catalog.first().ok_or("Frequency catalog is empty")?,
    };
    Ok(json!({
        "frequency": frequency,
        "previous_id": catalog.previous(frequency.id).map(|f| f.id),
        "next_id": catalog.next(frequency.id).map(|f| f.id),
    }))
}

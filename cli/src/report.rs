//! Rendering of replay results

use crate::replay::ReplayReport;
use city_ledger::{Citizen, Ledger, LedgerStats, Property};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    replay: &'a ReplayReport,
    stats: LedgerStats,
    citizens: Vec<&'a Citizen>,
    properties: Vec<&'a Property>,
    treasury: u64,
}

pub fn render_json(report: &ReplayReport) -> serde_json::Result<String> {
    let ledger = &report.ledger;
    serde_json::to_string_pretty(&JsonReport {
        replay: report,
        stats: ledger.stats(),
        citizens: sorted_citizens(ledger),
        properties: sorted_properties(ledger),
        treasury: ledger.treasury(),
    })
}

fn sorted_citizens(ledger: &Ledger) -> Vec<&Citizen> {
    let mut citizens: Vec<_> = ledger.citizens().iter().collect();
    citizens.sort_by_key(|c| c.address);
    citizens
}

fn sorted_properties(ledger: &Ledger) -> Vec<&Property> {
    let mut properties: Vec<_> = ledger.properties().iter().collect();
    properties.sort_by(|a, b| a.id.cmp(&b.id));
    properties
}

pub fn render_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    let ledger = &report.ledger;

    out.push_str(&format!("\n{}\n", "Private City Ledger".cyan().bold()));
    out.push_str(&format!("{}\n", "═══════════════════════════════════".bright_black()));
    out.push_str(&format!(
        "{}: {} applied, {} rejected, {} skipped\n",
        "Operations".yellow().bold(),
        report.effects.len().to_string().green(),
        report.rejected.len().to_string().red(),
        report.skipped
    ));

    for rejection in &report.rejected {
        out.push_str(&format!(
            "  {} #{} {}: {}\n",
            "✗".red(),
            rejection.index,
            rejection.operation.kind(),
            rejection.error
        ));
    }

    out.push_str(&citizen_table(ledger));
    out.push_str(&property_table(ledger));

    let stats = ledger.stats();
    out.push_str(&format!(
        "\n{}: {}\n{}: {}\n{}: {}\n",
        "Treasury".yellow().bold(),
        stats.treasury.to_string().green(),
        "Circulating".yellow().bold(),
        stats.circulating,
        "Total value".yellow().bold(),
        stats.total_value
    ));
    out
}

fn citizen_table(ledger: &Ledger) -> String {
    let citizens = sorted_citizens(ledger);
    let mut out = format!("\n{} ({})\n", "Citizens".yellow().bold(), citizens.len());
    for citizen in citizens {
        out.push_str(&format!(
            "  {}  {:<16} {:>20}\n",
            citizen.address.bright_blue(),
            citizen.name,
            citizen.balance
        ));
    }
    out
}

fn property_table(ledger: &Ledger) -> String {
    let properties = sorted_properties(ledger);
    let mut out = format!("\n{} ({})\n", "Properties".yellow().bold(), properties.len());
    for property in properties {
        out.push_str(&format!(
            "  {:<12} {:>3}%  {}  {}\n",
            property.id,
            property.tax_rate,
            property.owner_address.bright_blue(),
            property.details.bright_white()
        ));
    }
    out
}

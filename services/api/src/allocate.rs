use crate::infra::{capacity_config, parse_capacities, parse_quota_arg};
use clap::Args;
use placement::config::AppConfig;
use placement::error::AppError;
use placement::workflows::allocation::{AllocationOutcome, AllocationService};
use placement::workflows::roster::{RosterImporter, RosterScan};
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// CSV roster with English or Arabic headers
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Split this many seats evenly across destinations (defaults to one seat per applicant)
    #[arg(long, conflicts_with = "capacities")]
    pub(crate) total: Option<i64>,
    /// Per-destination seat counts as a JSON object, e.g. '{"Medicine": 40}'
    #[arg(long, value_parser = parse_capacities)]
    pub(crate) capacities: Option<BTreeMap<String, i64>>,
    /// Channel quota as label=fraction; repeat per channel. Values above 1 are percentages.
    #[arg(long = "quota", value_parser = parse_quota_arg)]
    pub(crate) quotas: Vec<(String, f64)>,
    /// Print the full outcome as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScanArgs {
    /// CSV roster with English or Arabic headers
    #[arg(long)]
    pub(crate) roster: PathBuf,
}

pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let AllocateArgs {
        roster,
        total,
        capacities,
        quotas,
        json,
    } = args;

    let config = AppConfig::load()?;
    let service = AllocationService::new(config.allocation);
    let capacity = capacity_config(total, capacities);
    let quotas: Option<BTreeMap<String, f64>> =
        (!quotas.is_empty()).then(|| quotas.into_iter().collect());

    let file = File::open(&roster)?;
    let outcome = service.allocate_roster(file, quotas.as_ref(), &capacity)?;

    if json {
        let rendered = serde_json::to_string_pretty(&outcome).map_err(io::Error::from)?;
        println!("{rendered}");
    } else {
        render_outcome(&roster, &outcome);
    }

    Ok(())
}

pub(crate) fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let scan = RosterImporter::scan_reader(File::open(&args.roster)?)?;
    render_scan(&args.roster, &scan);
    Ok(())
}

pub(crate) fn render_outcome(roster: &Path, outcome: &AllocationOutcome) {
    let summary = &outcome.summary;

    println!("Placement run for {}", roster.display());
    println!(
        "Applicants: {} | assigned {} | unassigned {} | overrides {}",
        summary.total_applicants, summary.assigned, summary.unassigned, summary.overridden
    );

    let quotas: Vec<String> = outcome
        .quotas
        .iter()
        .map(|(channel, fraction)| format!("{} {:.0}%", channel.label(), fraction * 100.0))
        .collect();
    println!("Applied quotas: {}", quotas.join(", "));

    println!("\nDestinations");
    for destination in &summary.destinations {
        let minimum = destination
            .minimum_default_score
            .map(|score| format!("{score:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "- {}: {}/{} seats, {} vacant, lowest central score {}",
            destination.destination,
            destination.seats_used,
            destination.capacity,
            destination.vacancies,
            minimum
        );
        if destination.overflow > 0 {
            println!("    over capacity by {} after overrides", destination.overflow);
        }
        for channel in &destination.channels {
            println!(
                "    {}: {}/{}",
                channel.channel_label, channel.seats_used, channel.ceiling
            );
        }
    }

    if outcome.overrides.is_empty() {
        println!("\nPrivileged overrides: none");
    } else {
        println!("\nPrivileged overrides");
        for admission in &outcome.overrides {
            println!(
                "- {} -> {} (was {}, threshold {:.2})",
                admission.applicant,
                admission.destination,
                admission.previous.as_deref().unwrap_or("unassigned"),
                admission.minimum_score
            );
        }
    }

    let unassigned: Vec<&str> = outcome
        .assignments
        .iter()
        .filter(|(_, destination)| destination.is_none())
        .map(|(id, _)| id.0.as_str())
        .collect();
    if !unassigned.is_empty() {
        println!("\nUnassigned: {}", unassigned.join(", "));
    }
}

fn render_scan(roster: &Path, scan: &RosterScan) {
    println!("Roster {}", roster.display());
    println!("Applicants: {}", scan.applicant_count);
    println!("Destinations ({})", scan.destinations.len());
    for destination in &scan.destinations {
        println!("- {destination}");
    }
}

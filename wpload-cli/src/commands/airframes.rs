//! Airframes command - list supported airframes and their capacities.

use console::style;
use wpload::drivers::Airframe;
use wpload::limits::Limit;
use wpload::profile::WaypointKind;

use crate::error::CliError;

/// Run the airframes command.
pub fn run() -> Result<(), CliError> {
    println!("Supported airframes");
    println!("===================");
    println!();

    for airframe in Airframe::ALL {
        println!(
            "  {:<8} {:<16} {}",
            style(airframe.id()).bold(),
            airframe.display_name(),
            style(capacity_summary(airframe)).dim()
        );
    }
    Ok(())
}

/// One-line summary of the point kinds an airframe stores.
fn capacity_summary(airframe: Airframe) -> String {
    let limits = airframe.limits();
    WaypointKind::ALL
        .iter()
        .filter_map(|&kind| {
            let limit = limits.get(kind)?;
            let count = match limit {
                Limit::Max(n) => n.to_string(),
                Limit::Unbounded => "unlimited".to_string(),
            };
            Some(if kind == WaypointKind::Mission {
                format!("{} {} per station", kind, count)
            } else {
                format!("{} {}", kind, count)
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

//! Format command - show the digit strings an airframe would be keyed with.

use console::style;
use wpload::drivers::Airframe;
use wpload::geo::Position;

use crate::error::CliError;

/// Arguments for the format command.
pub struct FormatArgs {
    pub latitude: f64,
    pub longitude: f64,
    pub airframe: Option<String>,
    pub all: bool,
}

/// Run the format command.
pub fn run(args: FormatArgs) -> Result<(), CliError> {
    let position = Position::new(args.latitude, args.longitude)?;

    let airframes = if args.all {
        Airframe::ALL.to_vec()
    } else {
        let airframe = match args.airframe {
            Some(id) => id.parse()?,
            None => {
                wpload::config::ConfigFile::load()
                    .unwrap_or_default()
                    .default_airframe
            }
        };
        vec![airframe]
    };

    println!(
        "Position: {:.6}, {:.6}",
        position.latitude(),
        position.longitude()
    );
    println!();

    for airframe in airframes {
        println!("{}", style(airframe.display_name()).bold());
        for line in render(airframe, &position) {
            println!("  {}", line);
        }
    }
    Ok(())
}

/// One line per entry format the airframe uses.
fn render(airframe: Airframe, position: &Position) -> Vec<String> {
    airframe
        .preview(position)
        .into_iter()
        .map(|(label, coords)| {
            format!(
                "{:<11} {} {}  {} {}",
                label,
                coords.latitude_hemisphere.letter(),
                coords.latitude,
                coords.longitude_hemisphere.letter(),
                coords.longitude
            )
        })
        .collect()
}

//! Print the sun position for a location, and optionally whether it falls
//! inside a threshold window. Useful when choosing sensor thresholds.

use chrono::{DateTime, Utc};
use clap::Parser;
use sun_azimuth_sensor::sun::{self, AltitudeWindow, AzimuthWindow, Coordinates};

#[derive(Parser, Debug)]
#[command(name = "sun-position")]
#[command(about = "Show sun azimuth and altitude for a location", long_about = None)]
struct Args {
    /// Latitude in decimal degrees
    #[arg(long, env = "SUN_LAT", allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, env = "SUN_LONG", allow_hyphen_values = true)]
    long: f64,

    /// Instant to evaluate (RFC 3339), defaults to now
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    /// Lower azimuth threshold
    #[arg(long, requires = "upper", allow_hyphen_values = true)]
    lower: Option<f64>,

    /// Upper azimuth threshold
    #[arg(long, requires = "lower", allow_hyphen_values = true)]
    upper: Option<f64>,

    /// Lower altitude threshold
    #[arg(long, requires = "lower", allow_hyphen_values = true)]
    lower_altitude: Option<f64>,

    /// Upper altitude threshold
    #[arg(long, requires = "lower", allow_hyphen_values = true)]
    upper_altitude: Option<f64>,
}

fn main() {
    let args = Args::parse();

    let coords = match Coordinates::new(Some(args.lat), Some(args.long)) {
        Ok(coords) => coords,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let at = args.at.unwrap_or_else(Utc::now);
    let observation = match sun::observe(at, &coords) {
        Ok(observation) => observation,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    println!("Time:     {}", at.to_rfc3339());
    println!("Location: {}, {}", coords.latitude, coords.longitude);
    println!("Azimuth:  {:.2}°", observation.azimuth);
    println!("Altitude: {:.2}°", observation.altitude);

    if args.lower.is_none() {
        return;
    }

    let windows = AzimuthWindow::from_config(args.lower, args.upper).and_then(|azimuth| {
        AltitudeWindow::from_config(args.lower_altitude, args.upper_altitude)
            .map(|altitude| (azimuth, altitude))
    });
    match windows {
        Ok((azimuth, altitude)) => {
            let inside = sun::window_contains(&observation, azimuth, altitude);
            println!(
                "Window:   {}..{} (altitude {}..{}): {}",
                azimuth.lower,
                azimuth.upper,
                altitude.lower,
                altitude.upper,
                if inside { "open" } else { "closed" }
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

use clap::Parser;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sun_azimuth_sensor::config::{self, Config};
use sun_azimuth_sensor::output::{self, LogSink, MqttClient, MqttSink, StateSink};
use sun_azimuth_sensor::platform::SunAzimuthPlatform;
use sun_azimuth_sensor::scheduler::TokioScheduler;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Virtual contact sensors that open while the sun shines through a window.
#[derive(Parser, Debug)]
#[command(name = "sun-azimuth-sensor")]
#[command(about = "Contact sensors driven by sun position and weather", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, env = "SUN_SENSOR_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Fetch weather once, evaluate every sensor, print the states and exit
    #[arg(long)]
    once: bool,
}

fn init_logger(debug_log: bool) {
    let default_level = if debug_log { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    config::load_dotenv(Path::new(".env"));
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fatal: {}", e);
            std::process::exit(1);
        }
    };

    init_logger(config.debug_log);
    info!("Starting Sun Azimuth Sensor");
    info!("Configuration loaded from {}", cli.config.display());
    info!("  Sensors: {}", config.sensors.len());
    info!(
        "  Weather integration: {}",
        if config.enable_weather_integration { "enabled" } else { "disabled" }
    );
    if config.enable_weather_integration && config.api_key().is_none() {
        warn!("[Weather] Weather integration enabled but no API key configured");
    }

    let platform = Arc::new(SunAzimuthPlatform::from_config(&config));

    if cli.once {
        platform.refresh_weather().await;
        platform.poll(chrono::Utc::now());
        for sensor in platform.sensors() {
            println!(
                "{}: {}",
                sensor.name(),
                if sensor.state().get() { "open" } else { "closed" }
            );
        }
        return;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    platform.attach_notifier(&tx);
    drop(tx);

    let mut mqtt_task = None;
    let sink: Box<dyn StateSink> = match &config.mqtt {
        Some(mqtt_config) => {
            info!(
                "[MQTT] Publishing to {}:{} under {}",
                mqtt_config.broker_host, mqtt_config.broker_port, mqtt_config.topic_prefix
            );
            let client = MqttClient::new(mqtt_config);
            let sink = MqttSink::new(client.client(), mqtt_config.topic_prefix.clone());
            mqtt_task = Some(tokio::spawn(client.run()));
            Box::new(sink)
        }
        None => Box::new(LogSink),
    };
    let forward_task =
        tokio::spawn(async move { output::forward_changes(rx, sink.as_ref()).await });

    let shutdown = CancellationToken::new();
    let scheduler = TokioScheduler::new(shutdown.clone());
    let handles = platform.start(&scheduler).await;

    info!("Sun Azimuth Sensor is running");
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    shutdown.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Scheduled task failed: {}", e);
        }
    }
    forward_task.abort();
    if let Some(task) = mqtt_task {
        task.abort();
    }

    info!("Sun Azimuth Sensor stopped");
}

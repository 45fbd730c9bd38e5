// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use fire_panel_bridge::constants::DEFAULT_EVENT_TOPIC;
use fire_panel_bridge::{
    AdvancedFilter, Framing, GatewayConfig, GatewayStats, InterfaceKind, MqttPublisher,
    ProtocolManager, SerialSettings, SerialSource, protocol,
};

/// Delay between attempts to re-open a failed serial port.
const SERIAL_RETRY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "firepanel2mqtt")]
#[command(about = "Bridge between a fire alarm panel serial port and MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    panel: PanelToml,
    mqtt: MqttToml,
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    /// Serial device the panel is wired to
    serial_port: String,
    /// Protocol id (0 = none configured)
    #[serde(default)]
    protocol_id: u8,
    /// Override of the protocol's default baud rate
    #[serde(default)]
    baud: Option<u32>,
    /// Override of the protocol's default framing ("8N1" or "8E1")
    #[serde(default)]
    framing: Option<String>,
    #[serde(default)]
    verbose: bool,
    #[serde(default = "default_advanced_filter")]
    advanced_filter: String,
    #[serde(default)]
    frame_timeout_ms: Option<u64>,
    #[serde(default = "default_scan_interval")]
    scan_interval_ms: u64,
}

fn default_advanced_filter() -> String {
    "any".to_string()
}
fn default_scan_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_event_topic")]
    event_topic: String,
    #[serde(default = "default_status_topic")]
    status_topic: String,
    #[serde(default = "default_status_interval")]
    status_interval_secs: u64,
}

fn default_client_id() -> String {
    "firepanel-bridge".to_string()
}
fn default_event_topic() -> String {
    DEFAULT_EVENT_TOPIC.to_string()
}
fn default_status_topic() -> String {
    "nimbus/dev/status".to_string()
}
fn default_status_interval() -> u64 {
    60
}

fn load_config(path: &str) -> Result<Config> {
    let config_text = std::fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&config_text).context("Failed to parse config file")
}

fn build_gateway_config(config: &Config) -> Result<GatewayConfig> {
    let panel = &config.panel;
    let advanced_filter = AdvancedFilter::parse(&panel.advanced_filter)
        .with_context(|| format!("Unknown advanced_filter: {}", panel.advanced_filter))?;
    if panel.scan_interval_ms == 0 {
        anyhow::bail!("scan_interval_ms must be greater than zero");
    }
    let gateway_config = GatewayConfig::builder()
        .protocol_id(panel.protocol_id)
        .verbose(panel.verbose)
        .advanced_filter(advanced_filter)
        .frame_timeout_ms(panel.frame_timeout_ms)
        .event_topic(&config.mqtt.event_topic)
        .build();
    gateway_config.validate()?;
    Ok(gateway_config)
}

/// Serial settings for the configured protocol, or `None` when the protocol
/// does not use the serial line.
fn build_serial_settings(panel: &PanelToml) -> Result<Option<SerialSettings>> {
    let Some(descriptor) = protocol::descriptor(panel.protocol_id) else {
        return Ok(None);
    };
    if descriptor.interface != InterfaceKind::Serial {
        return Ok(None);
    }
    let framing = match &panel.framing {
        Some(f) => Some(Framing::parse(f).with_context(|| format!("Unknown framing: {f}"))?),
        None => None,
    };
    Ok(Some(SerialSettings::for_protocol(
        &panel.serial_port,
        descriptor,
        panel.baud,
        framing,
    )))
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MqttStatus {
    now: u64,
    op: String,
    protocol: MqttProtocolState,
    stats: GatewayStats,
}

#[derive(Serialize)]
struct MqttProtocolState {
    id: u8,
    label: String,
    interface: String,
    active: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

fn build_status(manager: &ProtocolManager) -> MqttStatus {
    let id = manager.current_id();
    let (label, interface) = match protocol::descriptor(id) {
        Some(d) => (d.label.to_string(), d.interface.label().to_string()),
        None => (format!("Unknown ({id})"), InterfaceKind::None.label().to_string()),
    };
    MqttStatus {
        now: now_epoch_ms(),
        op: "STATUS".to_string(),
        protocol: MqttProtocolState {
            id,
            label,
            interface,
            active: manager.is_active(),
        },
        stats: manager.stats().clone(),
    }
}

/// Queue a JSON message without waiting on the MQTT request channel.
///
/// Returns false when the message was dropped.
fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) -> bool {
    match serde_json::to_string(payload) {
        Ok(json) => match client.try_publish(topic, QoS::AtLeastOnce, retain, json) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to publish to {topic}: {e}");
                false
            }
        },
        Err(e) => {
            error!("Failed to serialize MQTT payload: {e}");
            false
        }
    }
}

fn open_serial(settings: &Option<SerialSettings>) -> Option<SerialSource> {
    let settings = settings.as_ref()?;
    match SerialSource::open(settings.clone()) {
        Ok(source) => Some(source),
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

/// Restart the running protocol so no partial frame survives a lost line.
fn restart_protocol(manager: &mut ProtocolManager) {
    if let Err(e) = manager.select_protocol(manager.current_id()) {
        error!("{e}");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=fire_panel_bridge=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let gateway_config = build_gateway_config(&config)?;
    let mut serial_settings = build_serial_settings(&config.panel)?;
    let mut scan_interval_ms = config.panel.scan_interval_ms;
    let mut mqtt_client_id = config.mqtt.client_id;
    let mut status_topic = config.mqtt.status_topic;
    let mut status_interval_secs = config.mqtt.status_interval_secs;

    let (mut mqtt_host, mut mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;

    let mut manager = ProtocolManager::new(gateway_config);

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        // Set up MQTT
        let mut mqtt_opts = MqttOptions::new(&mqtt_client_id, &mqtt_host, mqtt_port);
        mqtt_opts.set_keep_alive(Duration::from_secs(30));
        let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);
        let mut publisher = MqttPublisher::new(client.clone());

        // MQTT event loop; we only publish, so just keep the connection alive
        let mqtt_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT: connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        let mut serial = open_serial(&serial_settings);
        let mut last_open_attempt = Instant::now();

        let mut scan_ticker = interval(Duration::from_millis(scan_interval_ms));
        scan_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut status_ticker = interval(Duration::from_secs(status_interval_secs.max(1)));

        info!("Bridge running. Send SIGHUP to reload, SIGINT/SIGTERM to stop.");
        let restart = loop {
            tokio::select! {
                _ = scan_ticker.tick() => {
                    let healthy = serial.as_ref().is_some_and(|s| !s.is_failed());
                    if let (true, Some(source)) = (healthy, serial.as_mut()) {
                        let count = manager.scan(source, &mut publisher);
                        if count > 0 {
                            debug!("Scanned {count} bytes");
                        }
                    } else if serial_settings.is_some() && last_open_attempt.elapsed() >= SERIAL_RETRY {
                        warn!("Serial port unavailable, re-opening");
                        serial = open_serial(&serial_settings);
                        last_open_attempt = Instant::now();
                        if serial.is_some() {
                            restart_protocol(&mut manager);
                        }
                    }
                }
                _ = status_ticker.tick() => {
                    let status = build_status(&manager);
                    publish_json(&client, &status_topic, &status, true);
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received SIGINT, shutting down...");
                    break false;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down...");
                    break false;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading config and restarting...");
                    break true;
                }
            }
        };

        mqtt_handle.abort();
        drop(serial);

        if !restart {
            break;
        }

        // Reload config from disk; keep previous config on failure
        info!("Reloading config from {}", cli.config);
        match load_config(&cli.config) {
            Ok(new_config) => match (
                build_gateway_config(&new_config),
                build_serial_settings(&new_config.panel),
                parse_mqtt_url(&new_config.mqtt.url),
            ) {
                (Ok(new_gateway_config), Ok(new_serial), Ok((new_host, new_port))) => {
                    serial_settings = new_serial;
                    scan_interval_ms = new_config.panel.scan_interval_ms;
                    mqtt_host = new_host;
                    mqtt_port = new_port;
                    mqtt_client_id = new_config.mqtt.client_id;
                    status_topic = new_config.mqtt.status_topic;
                    status_interval_secs = new_config.mqtt.status_interval_secs;
                    info!("Config reloaded successfully");
                    if let Err(e) = manager.reconfigure(new_gateway_config) {
                        error!("{e}");
                    }
                }
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                    warn!("Invalid config, keeping previous: {e}");
                    // Explicit restart of the running protocol
                    if let Err(e) = manager.reconfigure(manager.config().clone()) {
                        error!("{e}");
                    }
                }
            },
            Err(e) => warn!("Failed to reload config, keeping previous: {e}"),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}

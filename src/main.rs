//! Stepbridge Firmware: Main Entry Point
//!
//! Hexagonal architecture with three independent tasks.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  StepperRig       MoistureProbe   LogEventSink   SystemClock   │
//! │  (Actuator)       (Sensor)        (EventSink)    (Clock)       │
//! │  MqttConnector    HttpTelemetry   WifiAdapter    ThreadSpawner │
//! │  (Broker)         (Telemetry)     (Connectivity) (Tasks)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Supervisor ─▶ TriggerListener ─▶ ActuationDispatcher  │    │
//! │  │            └─▶ TelemetrySampler   ActuationExecutor    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};

use stepbridge::adapters::hardware::MoistureProbe;
use stepbridge::adapters::http_telemetry::HttpTelemetryUplink;
use stepbridge::adapters::log_sink::LogEventSink;
use stepbridge::adapters::mqtt::MqttConnector;
use stepbridge::adapters::time::SystemClock;
use stepbridge::adapters::wifi::WifiAdapter;
use stepbridge::app::actuation::ActuationExecutor;
use stepbridge::app::dispatch::ActuationDispatcher;
use stepbridge::app::listener::{ReconnectPolicy, TriggerListener};
use stepbridge::app::ports::ConnectivityPort;
use stepbridge::app::sampler::TelemetrySampler;
use stepbridge::app::supervisor::{BootstrapPolicy, Supervisor};
use stepbridge::config::SystemConfig;
use stepbridge::drivers::hw_init::{self, EspOutputPin};
use stepbridge::drivers::stepper::{StepperAxis, StepperRig};
use stepbridge::drivers::task_pin::ThreadSpawner;
use stepbridge::error::Error;
use stepbridge::pins;
use stepbridge::sensors::moisture::MoistureSensor;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Stepbridge v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate().map_err(Error::from)?;

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;
    wifi.set_credentials(config.wifi_ssid, config.wifi_password)
        .map_err(Error::from)?;

    // ── 3. Adapters ───────────────────────────────────────────
    let sink = LogEventSink::new();
    let clock = SystemClock::new();

    let rig = StepperRig::new(
        StepperAxis::new(
            1,
            EspOutputPin::new(pins::STEPPER1_PUL_GPIO),
            EspOutputPin::new(pins::STEPPER1_DIR_GPIO),
        ),
        StepperAxis::new(
            2,
            EspOutputPin::new(pins::STEPPER2_PUL_GPIO),
            EspOutputPin::new(pins::STEPPER2_DIR_GPIO),
        ),
        Ets,
    );
    let probe = MoistureProbe::new(MoistureSensor::new(
        pins::MOISTURE_ADC_GPIO,
        pins::MOISTURE_ADC1_CHANNEL,
    ));

    // ── 4. Tasks ──────────────────────────────────────────────
    let executor = Arc::new(ActuationExecutor::new(rig, sink));
    let dispatcher = ActuationDispatcher::new(executor, ThreadSpawner, sink);

    let listener = TriggerListener::new(
        MqttConnector::new(&config),
        dispatcher,
        clock,
        sink,
        config.trigger_topic,
        ReconnectPolicy::from_config(&config),
    );
    let sampler = TelemetrySampler::new(
        probe,
        HttpTelemetryUplink::new(&config),
        clock,
        sink,
        config.telemetry_interval(),
    );

    let supervisor = Supervisor::new(wifi, clock, sink, BootstrapPolicy::from_config(&config));

    // Only returns if bring-up failed.
    let err = supervisor.start(listener, sampler, &ThreadSpawner);
    error!("System initialization failed: {}", err);
    Err(err.into())
}

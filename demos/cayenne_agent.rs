//! Example device: sends temperature, luminosity and pressure readings to
//! Cayenne every five seconds and acknowledges every command.
//!
//! Credentials come from the environment (or a `.env` file):
//!
//! ```text
//! CAYENNE_USERNAME=...
//! CAYENNE_PASSWORD=...
//! CAYENNE_CLIENT_ID=...
//! ```
//!
//! Run with `RUST_LOG=info cargo run --example cayenne_agent --features std`.

use std::process::ExitCode;

use iotagent::agent::{Agent, CommandError, CommandHandler, Dispatcher, FixedTelemetry, Session};
use iotagent::config::AgentConfig;
use iotagent::network::application::cayenne::{DataPoint, Message, Topic, types};
use iotagent::network::client::{MqttClient, Options, TcpLink};
use iotagent::system::time::SystemClock;
use log::{error, info};

fn on_command(message: &Message) -> Result<(), CommandError> {
    // Actuate the channel here. Returning an error reports it to the dashboard.
    info!(
        "Setting channel {} to {}",
        message.channel,
        message.value(0).unwrap_or_default()
    );
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Missing or invalid configuration, error: {}", e.code());
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new(
        TcpLink::new(),
        MqttClient::new(Options::default()),
        SystemClock::new(),
        config,
    );

    let mut commands = CommandHandler::new(on_command);
    let mut dispatcher: Dispatcher = Dispatcher::new();
    if let Err(e) = dispatcher.register_handler(Topic::Command, &mut commands) {
        error!("Handler registration failed, error: {}", e.code());
        return ExitCode::FAILURE;
    }

    let telemetry = match FixedTelemetry::new(&[
        DataPoint::new(0, 30.5)
            .with_type(types::TEMPERATURE)
            .with_unit(types::CELSIUS),
        DataPoint::new(1, 1000)
            .with_type(types::LUMINOSITY)
            .with_unit(types::LUX),
        DataPoint::new(2, 800)
            .with_type(types::BAROMETRIC_PRESSURE)
            .with_unit(types::HECTOPASCAL),
    ]) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            error!("Telemetry setup failed, error: {}", e.code());
            return ExitCode::FAILURE;
        }
    };

    let mut agent = Agent::new(session, dispatcher, telemetry);
    if let Err(e) = agent.start() {
        error!("Connection failed, exiting: {}", e);
        agent.shutdown();
        return ExitCode::FAILURE;
    }
    agent.run()
}

mod common;

use common::*;
use iotagent::Error;
use iotagent::agent::{CommandError, CommandHandler, Dispatcher, Publisher, SessionState};
use iotagent::network::application::cayenne::{Channel, DataPoint, Message, Topic};

#[test]
fn test_connect_subscribes_and_publishes_descriptors() {
    let world = world();
    let mut session = session(&world);

    session.initialize().unwrap();
    session.connect().unwrap();

    assert_eq!(session.state(), SessionState::Established);
    assert!(session.is_alive());
    assert_eq!(
        events(&world),
        vec![
            Event::LinkInit([0xFE, 0x08, 0xDC, 0x12, 0x34, 0x56]),
            Event::LinkConnect("mqtt.mydevices.com".to_string(), 1883),
            Event::ClientConnect("user".to_string()),
            subscribe("v1/user/things/device/cmd/+"),
            subscribe("v1/user/things/device/conf/+"),
            publish("v1/user/things/device/sys/version", env!("CARGO_PKG_VERSION")),
            publish("v1/user/things/device/sys/model", "iotagent"),
        ]
    );
}

#[test]
fn test_link_failures_are_retried_with_fixed_delay() {
    let world = world();
    world.borrow_mut().link_failures = 3;
    let mut session = session(&world);

    session.connect().unwrap();

    let events = events(&world);
    assert_eq!(
        &events[..7],
        &[
            Event::LinkConnectFailed,
            Event::Delay(2000),
            Event::LinkConnectFailed,
            Event::Delay(2000),
            Event::LinkConnectFailed,
            Event::Delay(2000),
            Event::LinkConnect("mqtt.mydevices.com".to_string(), 1883),
        ]
    );
    assert_eq!(world.borrow().now_ms, 6000);
}

#[test]
fn test_protocol_failure_closes_link_and_is_returned() {
    let world = world();
    world
        .borrow_mut()
        .client_failures
        .push_back(Error::ConnectionRefused(5));
    let mut session = session(&world);

    assert_eq!(session.connect(), Err(Error::ConnectionRefused(5)));
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(!session.is_alive());
    assert_eq!(
        events(&world),
        vec![
            Event::LinkConnect("mqtt.mydevices.com".to_string(), 1883),
            Event::ClientConnectFailed(Error::ConnectionRefused(5)),
            Event::LinkDisconnect,
        ]
    );
    assert!(publishes(&world).is_empty());
}

#[test]
fn test_subscribe_failure_does_not_block_establishment() {
    let world = world();
    world.borrow_mut().subscribe_error = Some(Error::SubscribeRejected);
    let mut session = session(&world);

    session.connect().unwrap();

    assert_eq!(session.state(), SessionState::Established);
    assert_eq!(publishes(&world).len(), 2);
}

#[test]
fn test_optional_cpu_descriptors_are_published_when_configured() {
    let world = world();
    let mut config = config();
    config.device.cpu_model = Some("Cortex-M4".try_into().unwrap());
    config.device.cpu_speed = Some("1000000000".try_into().unwrap());
    let mut session = session_with(&world, config);

    session.connect().unwrap();

    let topics: Vec<String> = publishes(&world).into_iter().map(|(t, _)| t).collect();
    assert_eq!(
        topics,
        [
            "v1/user/things/device/sys/version",
            "v1/user/things/device/sys/model",
            "v1/user/things/device/sys/cpu/model",
            "v1/user/things/device/sys/cpu/speed",
        ]
    );
}

#[test]
fn test_publish_refused_unless_established() {
    let world = world();
    let mut session = session(&world);

    let point = DataPoint::new(0, 1);
    assert_eq!(
        session.publish_data(&Topic::Data, &point),
        Err(Error::NotConnected)
    );
    assert_eq!(
        session.publish_response(Some("1"), None, None),
        Err(Error::NotConnected)
    );
    assert!(publishes(&world).is_empty());
}

#[test]
fn test_publish_data_paths() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    session
        .publish_data(&Topic::Data, &DataPoint::new(0, 30.5).with_type("temp").with_unit("c"))
        .unwrap();
    session
        .publish_raw(None, &Topic::SysModel, Channel::None, "bench")
        .unwrap();

    assert_eq!(
        publishes(&world),
        vec![
            ("v1/user/things/device/data/0".to_string(), "temp,c=30.5".to_string()),
            ("v1/user/things/device/sys/model".to_string(), "bench".to_string()),
        ]
    );
}

#[test]
fn test_publish_refuses_wildcard_channel() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    assert_eq!(
        session.publish_data(&Topic::Data, &DataPoint::on(Channel::All, 1)),
        Err(Error::InvalidAddress)
    );
    assert!(publishes(&world).is_empty());
    assert!(session.is_alive());
}

#[test]
fn test_publish_without_channel_only_for_device_topics() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    assert_eq!(
        session.publish_data(&Topic::Data, &DataPoint::on(Channel::None, 1)),
        Err(Error::InvalidAddress)
    );
    assert!(publishes(&world).is_empty());

    session
        .publish_raw(None, &Topic::SysVersion, Channel::None, "1.0")
        .unwrap();
    session.publish_response(Some("7"), None, None).unwrap();
    assert_eq!(
        publishes(&world),
        vec![
            ("v1/user/things/device/sys/version".to_string(), "1.0".to_string()),
            ("v1/user/things/device/response".to_string(), "ok,7".to_string()),
        ]
    );
}

#[test]
fn test_connect_announces_configured_keep_alive() {
    let world = world();
    let mut config = config();
    config.keep_alive_seconds = 90;
    let mut session = session_with(&world, config);

    session.connect().unwrap();

    assert_eq!(world.borrow().keep_alive_seconds, Some(90));
}

#[test]
fn test_yield_requires_established_session() {
    let world = world();
    let mut session = session(&world);
    let mut dispatcher: Dispatcher = Dispatcher::new();

    assert_eq!(
        session.yield_for(1000, &mut dispatcher),
        Err(Error::NotConnected)
    );
    assert_eq!(world.borrow().now_ms, 0);
}

#[test]
fn test_yield_spends_its_budget() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    let mut dispatcher: Dispatcher = Dispatcher::new();

    assert_eq!(session.yield_for(1000, &mut dispatcher), Ok(0));
    assert_eq!(world.borrow().now_ms, 1000);
}

#[test]
fn test_yield_dispatches_in_arrival_order() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    push_inbound(&world, "v1/user/things/device/cmd/3", "42,1");
    push_inbound(&world, "v1/user/things/device/cmd/4", "43,0");

    let mut commands =
        CommandHandler::new(|_: &Message| -> Result<(), CommandError> { Ok(()) });
    let mut dispatcher: Dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(Topic::Command, &mut commands)
        .unwrap();

    assert_eq!(session.yield_for(1000, &mut dispatcher), Ok(2));
    assert_eq!(
        publishes(&world),
        vec![
            ("v1/user/things/device/response".to_string(), "ok,42".to_string()),
            ("v1/user/things/device/data/3".to_string(), "1".to_string()),
            ("v1/user/things/device/response".to_string(), "ok,43".to_string()),
            ("v1/user/things/device/data/4".to_string(), "0".to_string()),
        ]
    );
}

#[test]
fn test_gateway_commands_are_answered_for_the_addressed_device() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    push_inbound(&world, "v1/user/things/node-7/cmd/1", "9,on");

    let mut commands =
        CommandHandler::new(|_: &Message| -> Result<(), CommandError> { Ok(()) });
    let mut dispatcher: Dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(Topic::Command, &mut commands)
        .unwrap();

    session.yield_for(0, &mut dispatcher).unwrap();
    assert_eq!(
        publishes(&world),
        vec![
            ("v1/user/things/node-7/response".to_string(), "ok,9".to_string()),
            ("v1/user/things/node-7/data/1".to_string(), "on".to_string()),
        ]
    );
}

#[test]
fn test_default_handler_sees_config_messages() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();

    push_inbound(&world, "v1/user/things/device/conf/2", "5,120");

    let mut seen = Vec::new();
    let mut fallback = |message: &Message, _: &mut dyn Publisher| -> Result<(), Error> {
        seen.push((message.topic.clone(), message.id().map(str::to_string)));
        Ok(())
    };
    let mut dispatcher: Dispatcher = Dispatcher::new();
    dispatcher.register_default_handler(&mut fallback);

    session.yield_for(0, &mut dispatcher).unwrap();
    drop(dispatcher);
    assert_eq!(seen, vec![(Topic::Config, Some("5".to_string()))]);
}

#[test]
fn test_undecodable_message_is_skipped() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    world
        .borrow_mut()
        .inbound
        .push_back(("v1/user/things/device/cmd/3".to_string(), vec![0xff, 0xfe]));
    push_inbound(&world, "v1/user/things/device/cmd/3", "42,1");

    let mut commands =
        CommandHandler::new(|_: &Message| -> Result<(), CommandError> { Ok(()) });
    let mut dispatcher: Dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(Topic::Command, &mut commands)
        .unwrap();

    assert_eq!(session.yield_for(0, &mut dispatcher), Ok(1));
    assert_eq!(session.yield_for(0, &mut dispatcher), Ok(1));
    assert_eq!(publishes(&world).len(), 2);
}

#[test]
fn test_keep_alive_pings_when_idle() {
    let world = world();
    let mut config = config();
    config.keep_alive_seconds = 1;
    let mut session = session_with(&world, config);
    session.connect().unwrap();
    clear(&world);
    let mut dispatcher: Dispatcher = Dispatcher::new();

    session.yield_for(2500, &mut dispatcher).unwrap();

    let pings = events(&world)
        .into_iter()
        .filter(|e| *e == Event::Ping)
        .count();
    assert_eq!(pings, 2);
}

#[test]
fn test_keep_alive_disabled_with_zero_interval() {
    let world = world();
    let mut config = config();
    config.keep_alive_seconds = 0;
    let mut session = session_with(&world, config);
    session.connect().unwrap();
    let mut dispatcher: Dispatcher = Dispatcher::new();

    session.yield_for(5000, &mut dispatcher).unwrap();
    assert!(!events(&world).contains(&Event::Ping));
}

#[test]
fn test_reconnect_tears_down_both_layers_first() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    world.borrow_mut().client_failures.push_back(Error::Timeout);
    session.reconnect();

    assert_eq!(session.state(), SessionState::Established);
    assert_eq!(
        events(&world),
        vec![
            Event::ClientDisconnect,
            Event::LinkDisconnect,
            Event::LinkConnect("mqtt.mydevices.com".to_string(), 1883),
            Event::ClientConnectFailed(Error::Timeout),
            Event::LinkDisconnect,
            Event::Delay(2000),
            Event::LinkConnect("mqtt.mydevices.com".to_string(), 1883),
            Event::ClientConnect("user".to_string()),
            subscribe("v1/user/things/device/cmd/+"),
            subscribe("v1/user/things/device/conf/+"),
            publish("v1/user/things/device/sys/version", env!("CARGO_PKG_VERSION")),
            publish("v1/user/things/device/sys/model", "iotagent"),
        ]
    );
}

#[test]
fn test_shutdown_disconnects_protocol_then_link() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    session.shutdown();

    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(
        events(&world),
        vec![Event::ClientDisconnect, Event::LinkDisconnect]
    );
}

#[test]
fn test_shutdown_when_never_connected_is_quiet() {
    let world = world();
    let mut session = session(&world);

    session.shutdown();

    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(events(&world).is_empty());
}

#[test]
fn test_poll_error_with_session_up_is_skipped() {
    let world = world();
    let mut session = session(&world);
    session.connect().unwrap();
    clear(&world);

    world.borrow_mut().poll_error = Some(Error::ProtocolError);
    push_inbound(&world, "v1/user/things/device/cmd/3", "42,1");

    let mut commands =
        CommandHandler::new(|_: &Message| -> Result<(), CommandError> { Ok(()) });
    let mut dispatcher: Dispatcher = Dispatcher::new();
    dispatcher
        .register_handler(Topic::Command, &mut commands)
        .unwrap();

    assert_eq!(session.yield_for(1000, &mut dispatcher), Ok(1));
    assert_eq!(
        publishes(&world),
        vec![
            ("v1/user/things/device/response".to_string(), "ok,42".to_string()),
            ("v1/user/things/device/data/3".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn test_unanswered_keep_alive_ends_the_yield() {
    let world = world();
    let mut config = config();
    config.keep_alive_seconds = 1;
    let mut session = session_with(&world, config);
    session.connect().unwrap();
    world.borrow_mut().ping_lost = true;
    let mut dispatcher: Dispatcher = Dispatcher::new();

    assert_eq!(
        session.yield_for(2500, &mut dispatcher),
        Err(Error::Timeout)
    );
    assert!(!session.is_alive());
    assert_eq!(world.borrow().now_ms, 1000);
}

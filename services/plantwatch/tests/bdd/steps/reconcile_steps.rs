//! BDD step definitions for connectivity reconciliation

use cucumber::{given, then, when};

use plantwatch::reconcile::{Connectivity, DEFAULT_OFFLINE_THRESHOLD};
use plantwatch::timestamp::{parse, TimestampFormat};

use crate::world::PlantwatchWorld;

fn parse_connectivity(s: &str) -> Connectivity {
    match s {
        "Online" => Connectivity::Online,
        "Offline" => Connectivity::Offline,
        "Unknown" => Connectivity::Unknown,
        other => panic!("Unknown connectivity: {}", other),
    }
}

#[given(expr = "the weather API last updated at {string}")]
fn api_timestamp(world: &mut PlantwatchWorld, ts: String) {
    world.timestamps.api = Some(parse(&ts, TimestampFormat::WeatherApi).unwrap());
}

#[given(expr = "the device last reported at {string}")]
fn device_timestamp(world: &mut PlantwatchWorld, ts: String) {
    world.timestamps.device = Some(parse(&ts, TimestampFormat::Device).unwrap());
}

#[when("connectivity is reconciled")]
fn reconcile(world: &mut PlantwatchWorld) {
    world.connectivity = Some(world.timestamps.connectivity(DEFAULT_OFFLINE_THRESHOLD));
}

#[then(expr = "the device should be {string}")]
fn device_should_be(world: &mut PlantwatchWorld, expected: String) {
    assert_eq!(
        world.connectivity.expect("not reconciled"),
        parse_connectivity(&expected)
    );
}

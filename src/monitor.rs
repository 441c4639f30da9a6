//! Polling loop bridging the thermostat API to broker topics.

use crate::client::Thermostat;
use crate::mqtt::Publisher;
use log::{debug, info};
use std::thread;
use std::time::Duration;

/// Poll rooms forever and republish their temperatures.
///
/// Any listing or publish failure stops the loop and is returned to the
/// caller, which owns the exit policy. There is no retry and no backoff; a
/// failed cycle publishes nothing.
pub fn run_loop<T, P>(
    thermostat: &T,
    publisher: &mut P,
    topic_base: &str,
    idle_time: Duration,
) -> Result<(), String>
where
    T: Thermostat,
    P: Publisher,
{
    info!(
        "Monitoring rooms (topic base '{}', poll interval {}s)",
        topic_base,
        idle_time.as_secs()
    );
    loop {
        poll_once(thermostat, publisher, topic_base)?;
        thread::sleep(idle_time);
    }
}

/// One poll cycle: fetch all rooms, publish floor and target temperature for
/// each, in decoded room order.
pub fn poll_once<T, P>(thermostat: &T, publisher: &mut P, topic_base: &str) -> Result<(), String>
where
    T: Thermostat,
    P: Publisher,
{
    let rooms = thermostat
        .list_rooms()
        .map_err(|e| format!("listing rooms failed: {}", e))?;
    debug!("Fetched {} room(s)", rooms.len());

    for room in &rooms {
        let room_key = room.name.to_lowercase();
        let topic = format!("{}/{}/temperature/floor", topic_base, room_key);
        publisher
            .publish(&topic, &format!("{:.1}", room.current_temp.value()))
            .map_err(|e| format!("publish to {} failed: {}", topic, e))?;
        let topic = format!("{}/{}/temperature/floor/target", topic_base, room_key);
        publisher
            .publish(&topic, &format!("{:.1}", room.target_temp.value()))
            .map_err(|e| format!("publish to {} failed: {}", topic, e))?;
    }
    Ok(())
}

//! Models for the Warmup 4iE cloud API.
//!
//! Scope: wire/domain types only — no API client code.
//!
//! Notes
//! - The vendor encodes temperatures as bare integers (tenths of a degree
//!   Celsius) and run modes as bare integers with a fixed table; both get
//!   custom serde impls instead of plain derives.
//! - Response envelopes are modeled with `Option` everywhere so a partial
//!   payload fails at the unwrap site with a useful message, not inside serde.

use serde::{Deserialize, Serialize};
use std::fmt;

// =====================
// Temperature
// =====================

/// Temperature in raw tenths of a degree Celsius, as sent on the wire.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(pub i32);

impl Temperature {
    /// Logical value in degrees Celsius (raw / 10).
    pub fn value(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.value())
    }
}

// =====================
// Run mode
// =====================

/// Operational state of a heating zone.
///
/// Wire mapping is fixed by the vendor: 0=Off, 1=Prog, 2=Forced, 3=Fixed,
/// 4=Frost, 5=Away. Integers outside the table decode into `Unknown` and
/// re-encode verbatim; the vendor has been observed to only send the known
/// set, but the decoder does not reject anything.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Heater stopped
    Off,
    /// Schedule (programmation) active
    Prog,
    /// Heating forced for a limited time
    Forced,
    Fixed,
    Frost,
    Away,
    Unknown(i64),
}

impl RunMode {
    pub fn from_wire(value: i64) -> Self {
        match value {
            0 => RunMode::Off,
            1 => RunMode::Prog,
            2 => RunMode::Forced,
            3 => RunMode::Fixed,
            4 => RunMode::Frost,
            5 => RunMode::Away,
            other => RunMode::Unknown(other),
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            RunMode::Off => 0,
            RunMode::Prog => 1,
            RunMode::Forced => 2,
            RunMode::Fixed => 3,
            RunMode::Frost => 4,
            RunMode::Away => 5,
            RunMode::Unknown(other) => other,
        }
    }
}

impl serde::Serialize for RunMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.to_wire())
    }
}

impl<'de> serde::Deserialize<'de> for RunMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = RunMode;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an integer run mode")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(RunMode::from_wire(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(value)
                    .map(RunMode::from_wire)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(value), &self))
            }
        }

        deserializer.deserialize_any(V)
    }
}

// =====================
// Rooms
// =====================

/// Min/max limits of a single thermostat in a room.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatLimits {
    pub min_temp: Temperature,
    pub max_temp: Temperature,
}

/// One physical heating zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    #[serde(rename = "roomName")]
    pub name: String,
    #[serde(rename = "runModeInt")]
    pub run_mode: RunMode,
    pub target_temp: Temperature,
    pub current_temp: Temperature,
    #[serde(rename = "thermostat4ies", default)]
    pub thermostats: Vec<ThermostatLimits>,
}

/// Top-level envelope of the GraphQL rooms query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsResponse {
    pub status: Option<String>,
    pub data: Option<RoomsData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsData {
    pub user: Option<RoomsUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsUser {
    pub current_location: Option<CurrentLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentLocation {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

// =====================
// Locations
// =====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    #[serde(default, with = "stringified_f64")]
    pub latitude: Option<f64>,
    #[serde(default, with = "stringified_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub hol_start: Option<String>,
    pub hol_end: Option<String>,
    pub hol_temp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub owm_city_id: Option<i64>,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
    pub currency: Option<i64>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocZone {
    pub zone: Option<i64>,
    pub offset: Option<String>,
    pub is_homing: Option<bool>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSettings {
    pub main_room: Option<i64>,
    pub is_fahrenheit: Option<bool>,
    pub is_smart_geo: Option<bool>,
}

/// A user location (home) with its heating zones configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub geo_location: Option<GeoLocation>,
    pub holiday: Option<Holiday>,
    pub address: Option<Address>,
    pub loc_zone: Option<LocZone>,
    pub settings: Option<LocationSettings>,
    pub loc_mode: Option<String>,
    pub loc_mode_int: Option<i64>,
    #[serde(default)]
    pub fence_array: Vec<i64>,
    pub geo_mode_int: Option<i64>,
}

/// `status` object of the REST-style endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultStatus {
    pub result: Option<String>,
}

/// Envelope of the `getLocations` call. The useful payload sits under
/// `message.getLocations.result.data.user.locations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsResponse {
    pub status: Option<ResultStatus>,
    pub message: Option<LocationsMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsMessage {
    pub get_locations: Option<GetLocations>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLocations {
    pub result: Option<GetLocationsResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLocationsResult {
    pub data: Option<GetLocationsData>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLocationsData {
    pub user: Option<LocationsUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsUser {
    pub id: Option<i64>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

// =====================
// Authentication
// =====================

/// Envelope of the `userLogin` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub status: Option<ResultStatus>,
    pub response: Option<TokenBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBody {
    pub token: Option<String>,
}

/// The vendor serializes some floats as JSON strings (e.g. latitude).
pub(crate) mod stringified_f64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOMS_FIXTURE: &str = r#"{"data":{"user":{"currentLocation":{"id":1234,"name":"Home","rooms":[{"id":5678,"roomName":"Room1","runModeInt":1,"targetTemp":220,"currentTemp":235,"thermostat4ies":[{"minTemp":50,"maxTemp":300}]}]}}},"status":"success"}"#;

    #[test]
    fn temperature_value_is_tenths() {
        assert_eq!(Temperature(123).value(), 12.3);
        assert_eq!(Temperature(0).value(), 0.0);
    }

    #[test]
    fn temperature_display_one_decimal_with_unit() {
        assert_eq!(Temperature(0).to_string(), "0.0°C");
        assert_eq!(Temperature(112).to_string(), "11.2°C");
    }

    #[test]
    fn temperature_round_trips_as_bare_integer() {
        for raw in [-55, 0, 112, 234, 456, 3000] {
            let encoded = serde_json::to_string(&Temperature(raw)).unwrap();
            assert_eq!(encoded, raw.to_string());
            let decoded: Temperature = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, Temperature(raw));
        }
    }

    #[test]
    fn run_mode_wire_mapping_is_fixed() {
        let table = [
            (RunMode::Off, 0),
            (RunMode::Prog, 1),
            (RunMode::Forced, 2),
            (RunMode::Fixed, 3),
            (RunMode::Frost, 4),
            (RunMode::Away, 5),
        ];
        for (mode, wire) in table {
            assert_eq!(mode.to_wire(), wire);
            assert_eq!(RunMode::from_wire(wire), mode);
            assert_eq!(serde_json::to_string(&mode).unwrap(), wire.to_string());
            assert_eq!(serde_json::from_str::<RunMode>(&wire.to_string()).unwrap(), mode);
        }
    }

    #[test]
    fn run_mode_keeps_unknown_integers_verbatim() {
        let decoded: RunMode = serde_json::from_str("42").unwrap();
        assert_eq!(decoded, RunMode::Unknown(42));
        assert_eq!(serde_json::to_string(&decoded).unwrap(), "42");
    }

    #[test]
    fn rooms_fixture_decodes_into_domain_values() {
        let response: RoomsResponse = serde_json::from_str(ROOMS_FIXTURE).unwrap();
        assert_eq!(response.status.as_deref(), Some("success"));

        let location = response.data.unwrap().user.unwrap().current_location.unwrap();
        assert_eq!(location.id, Some(1234));
        assert_eq!(location.name.as_deref(), Some("Home"));
        assert_eq!(location.rooms.len(), 1);

        let room = &location.rooms[0];
        assert_eq!(room.id, 5678);
        assert_eq!(room.name, "Room1");
        assert_eq!(room.run_mode, RunMode::Prog);
        assert_eq!(room.current_temp.value(), 23.5);
        assert_eq!(room.target_temp.value(), 22.0);
        assert_eq!(room.thermostats, vec![ThermostatLimits {
            min_temp: Temperature(50),
            max_temp: Temperature(300),
        }]);
    }

    #[test]
    fn rooms_without_thermostat_list_still_decode() {
        let json = r#"{"id":1,"roomName":"Hall","runModeInt":0,"targetTemp":180,"currentTemp":175}"#;
        let room: Room = serde_json::from_str(json).unwrap();
        assert_eq!(room.run_mode, RunMode::Off);
        assert!(room.thermostats.is_empty());
    }

    #[test]
    fn locations_envelope_decodes_nested_payload() {
        let json = r#"{
            "status": {"result": "success"},
            "message": {"getLocations": {"result": {"status": "success", "data": {"user": {"id": 7,
                "locations": [{
                    "id": 2002,
                    "name": "Home",
                    "geoLocation": {"latitude": "48.8584", "longitude": "2.2945"},
                    "holiday": {"holStart": "2018-01-01 00:00:00", "holEnd": "2018-01-07 00:00:00", "holTemp": 100},
                    "settings": {"mainRoom": 5678, "isFahrenheit": false, "isSmartGeo": true},
                    "locMode": "off",
                    "locModeInt": 1,
                    "fenceArray": [0, 200]
                }]
            }}}}}
        }"#;
        let response: LocationsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.status.as_ref().and_then(|s| s.result.as_deref()),
            Some("success")
        );

        let user = response
            .message
            .and_then(|m| m.get_locations)
            .and_then(|g| g.result)
            .and_then(|r| r.data)
            .and_then(|d| d.user)
            .unwrap();
        assert_eq!(user.locations.len(), 1);

        let location = &user.locations[0];
        assert_eq!(location.id, Some(2002));
        assert_eq!(
            location.geo_location.as_ref().and_then(|g| g.latitude),
            Some(48.8584)
        );
        assert_eq!(
            location.holiday.as_ref().and_then(|h| h.hol_temp),
            Some(100)
        );
        assert_eq!(location.fence_array, vec![0, 200]);
    }
}

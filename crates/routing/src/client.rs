//! Directions backends.
//!
//! `DirectionsClient` is the seam the planner talks to; `HttpDirectionsClient`
//! speaks the OSRM `route/v1` HTTP API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use foundation::LngLat;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ProfileNames, RoutingConfig};
use crate::error::RouteError;
use crate::request::RouteRequest;
use crate::response::{ManeuverStep, RouteResponse};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can answer a directions request.
///
/// Methods return boxed futures for dyn-compatibility.
pub trait DirectionsClient: Send + Sync {
    fn route<'a>(
        &'a self,
        request: &'a RouteRequest,
    ) -> BoxFuture<'a, Result<RouteResponse, RouteError>>;
}

pub struct HttpDirectionsClient {
    base_url: String,
    profiles: ProfileNames,
    client: reqwest::Client,
}

impl HttpDirectionsClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RouteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profiles: config.profiles.clone(),
            client,
        })
    }

    /// `{base}/route/v1/{profile}/{lon,lat;…}?steps=true&geometries=geojson&overview=full`
    pub fn url(&self, request: &RouteRequest) -> Result<String, RouteError> {
        if request.coordinates.len() < 2 {
            return Err(RouteError::TooFewCoordinates(request.coordinates.len()));
        }
        let coords = request
            .coordinates
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        Ok(format!(
            "{}/route/v1/{}/{}?steps=true&geometries=geojson&overview=full",
            self.base_url,
            self.profiles.get(request.profile),
            coords
        ))
    }
}

impl DirectionsClient for HttpDirectionsClient {
    fn route<'a>(
        &'a self,
        request: &'a RouteRequest,
    ) -> BoxFuture<'a, Result<RouteResponse, RouteError>> {
        Box::pin(async move {
            let url = self.url(request)?;
            debug!(%url, profile = %request.profile, "requesting directions");
            let resp = self.client.get(&url).send().await?;
            // OSRM reports "no route" with a 400 and a JSON body, so only bail
            // on statuses that carry no usable payload.
            let status = resp.status();
            if status.is_server_error() || status == reqwest::StatusCode::NOT_FOUND {
                return Err(RouteError::Status(status.as_u16()));
            }
            let body = resp.text().await?;
            parse_osrm(&body)
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    distance: f64,
    duration: f64,
    maneuver: OsrmManeuver,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
    #[serde(default)]
    instruction: Option<String>,
}

/// Decodes an OSRM `route` response body, taking the first route.
pub fn parse_osrm(body: &str) -> Result<RouteResponse, RouteError> {
    let parsed: OsrmResponse = serde_json::from_str(body)?;
    if parsed.code != "Ok" {
        let detail = match parsed.message {
            Some(msg) => format!("{}: {msg}", parsed.code),
            None => parsed.code,
        };
        return Err(RouteError::NoRoute(detail));
    }
    let Some(route) = parsed.routes.into_iter().next() else {
        return Err(RouteError::NoRoute("empty route list".to_string()));
    };

    let steps = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| ManeuverStep {
            instruction: step
                .maneuver
                .instruction
                .clone()
                .unwrap_or_else(|| describe(&step)),
            distance_m: step.distance,
            duration_s: step.duration,
            maneuver_type: step.maneuver.kind,
            modifier: step.maneuver.modifier,
        })
        .collect();

    Ok(RouteResponse {
        geometry: route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| LngLat::new(lng, lat))
            .collect(),
        steps,
        distance_m: route.distance,
        duration_s: route.duration,
    })
}

fn describe(step: &OsrmStep) -> String {
    let m = &step.maneuver;
    let mut text = match m.kind.as_str() {
        "depart" => "Depart".to_string(),
        "arrive" => "Arrive".to_string(),
        kind => {
            let mut s = capitalize(&kind.replace('_', " "));
            if let Some(modifier) = &m.modifier {
                s.push(' ');
                s.push_str(modifier);
            }
            s
        }
    };
    if !step.name.is_empty() {
        let joiner = if m.kind == "arrive" { " at " } else { " onto " };
        text.push_str(joiner);
        text.push_str(&step.name);
    }
    text
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RouteProfile;
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 812.4,
            "duration": 190.0,
            "geometry": {"type": "LineString", "coordinates": [[-73.99, 40.73], [-73.98, 40.74]]},
            "legs": [{"steps": [
                {"name": "Broadway", "distance": 500.0, "duration": 120.0,
                 "maneuver": {"type": "depart", "modifier": "left"}},
                {"name": "W 4th St", "distance": 312.4, "duration": 70.0,
                 "maneuver": {"type": "new name", "modifier": "slight right"}},
                {"name": "", "distance": 0.0, "duration": 0.0,
                 "maneuver": {"type": "arrive"}}
            ]}]
        }]
    }"#;

    #[test]
    fn parses_geometry_and_steps() {
        let route = parse_osrm(BODY).unwrap();
        assert_eq!(
            route.geometry,
            vec![LngLat::new(-73.99, 40.73), LngLat::new(-73.98, 40.74)]
        );
        assert_eq!(route.distance_m, 812.4);
        let instructions: Vec<&str> = route
            .steps
            .iter()
            .map(|s| s.instruction.as_str())
            .collect();
        assert_eq!(
            instructions,
            vec![
                "Depart onto Broadway",
                "New name slight right onto W 4th St",
                "Arrive",
            ]
        );
        assert_eq!(route.steps[1].modifier.as_deref(), Some("slight right"));
    }

    #[test]
    fn non_ok_code_is_no_route() {
        let err = parse_osrm(r#"{"code":"NoRoute","message":"Impossible route"}"#).unwrap_err();
        let RouteError::NoRoute(detail) = err else {
            panic!("expected no route, got {err:?}");
        };
        assert_eq!(detail, "NoRoute: Impossible route");
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(parse_osrm("<html>"), Err(RouteError::Decode(_))));
    }

    #[test]
    fn url_joins_coordinates_and_profile() {
        let client = HttpDirectionsClient::new(&RoutingConfig {
            base_url: "http://localhost:5000/".to_string(),
            ..RoutingConfig::default()
        })
        .unwrap();
        let req = RouteRequest {
            coordinates: vec![LngLat::new(-73.99, 40.73), LngLat::new(-73.98, 40.74)],
            profile: RouteProfile::Safest,
        };
        assert_eq!(
            client.url(&req).unwrap(),
            "http://localhost:5000/route/v1/bike/-73.990000,40.730000;-73.980000,40.740000?steps=true&geometries=geojson&overview=full"
        );

        let single = RouteRequest {
            coordinates: vec![LngLat::new(0.0, 0.0)],
            profile: RouteProfile::Fastest,
        };
        let err = client.url(&single).unwrap_err();
        assert!(matches!(err, RouteError::TooFewCoordinates(1)));
    }
}

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Requests made with this key are answered with `OVER_QUERY_LIMIT`.
pub const OVER_QUOTA_KEY: &str = "over-quota";

/// Key that owns the seeded place.
pub const SEED_OWNER_KEY: &str = "google";

/// Reference of the moderated place present at startup.
pub const SEED_REFERENCE: &str = "seed-google-sydney";

#[derive(Clone, Debug)]
pub struct MockPlace {
    pub id: String,
    pub reference: String,
    pub name: String,
    /// `{lat, lng}` exactly as submitted.
    pub location: Value,
    pub viewport: Option<Value>,
    pub types: Vec<String>,
    pub vicinity: Option<String>,
    pub formatted_address: Option<String>,
    pub address_components: Vec<Value>,
    pub rating: Option<f64>,
    pub owner_key: String,
    pub moderated: bool,
    pub check_ins: u32,
}

impl MockPlace {
    fn lat_lng(&self) -> Option<(f64, f64)> {
        Some((number(&self.location["lat"])?, number(&self.location["lng"])?))
    }

    fn visible_to(&self, key: &str) -> bool {
        self.moderated || self.owner_key == key
    }

    fn summary(&self) -> Map<String, Value> {
        let mut geometry = Map::new();
        geometry.insert("location".to_string(), self.location.clone());
        if let Some(viewport) = &self.viewport {
            geometry.insert("viewport".to_string(), viewport.clone());
        }

        let mut out = Map::new();
        out.insert("id".to_string(), json!(self.id));
        out.insert("reference".to_string(), json!(self.reference));
        out.insert("name".to_string(), json!(self.name));
        out.insert("geometry".to_string(), Value::Object(geometry));
        out.insert("types".to_string(), json!(self.types));
        out.insert(
            "icon".to_string(),
            json!("https://maps.gstatic.com/mapfiles/place_api/icons/generic_business-71.png"),
        );
        if let Some(vicinity) = &self.vicinity {
            out.insert("vicinity".to_string(), json!(vicinity));
        }
        if let Some(rating) = self.rating {
            out.insert("rating".to_string(), json!(rating));
        }
        out
    }

    fn details(&self) -> Value {
        let mut out = self.summary();
        out.insert(
            "address_components".to_string(),
            Value::Array(self.address_components.clone()),
        );
        if let Some(address) = &self.formatted_address {
            out.insert("formatted_address".to_string(), json!(address));
        }
        out.insert(
            "url".to_string(),
            json!(format!("https://maps.google.com/maps/place?cid={}", self.id)),
        );
        Value::Object(out)
    }
}

pub type Db = Arc<RwLock<HashMap<String, MockPlace>>>;

/// A store holding one moderated place owned by `SEED_OWNER_KEY`.
pub fn seeded_db() -> Db {
    let place = MockPlace {
        id: "4f89212bf76dde31f092cfc14d7506555d85b5c7".to_string(),
        reference: SEED_REFERENCE.to_string(),
        name: "Google Sydney".to_string(),
        location: json!({"lat": -33.866651, "lng": 151.195827}),
        viewport: Some(json!({
            "southwest": {"lat": -33.8680, "lng": 151.1944},
            "northeast": {"lat": -33.8653, "lng": 151.1971},
        })),
        types: vec!["establishment".to_string(), "point_of_interest".to_string()],
        vicinity: Some("48 Pirrama Road, Pyrmont".to_string()),
        formatted_address: Some("48 Pirrama Road, Pyrmont NSW 2009, Australia".to_string()),
        address_components: vec![
            json!({"long_name": "Pyrmont", "short_name": "Pyrmont", "types": ["locality", "political"]}),
            json!({"long_name": "New South Wales", "short_name": "NSW", "types": ["administrative_area_level_1", "political"]}),
        ],
        rating: Some(4.5),
        owner_key: SEED_OWNER_KEY.to_string(),
        moderated: true,
        check_ins: 0,
    };
    Arc::new(RwLock::new(HashMap::from([(place.reference.clone(), place)])))
}

pub fn app() -> Router {
    app_with(seeded_db())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/search/json", get(search))
        .route("/details/json", get(details))
        .route("/check-in/json", post(check_in))
        .route("/add/json", post(add))
        .route("/delete/json", post(delete))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type Params = HashMap<String, String>;

fn status(token: &str) -> Json<Value> {
    Json(json!({ "status": token }))
}

/// The caller's key, or the status every endpoint answers without one.
fn authorize(params: &Params) -> Result<&str, Json<Value>> {
    let key = params
        .get("key")
        .filter(|k| !k.is_empty())
        .ok_or_else(|| status("REQUEST_DENIED"))?;
    if !params.contains_key("sensor") {
        return Err(status("REQUEST_DENIED"));
    }
    if key == OVER_QUOTA_KEY {
        return Err(status("OVER_QUERY_LIMIT"));
    }
    Ok(key)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_location(text: &str) -> Option<(f64, f64)> {
    let (lat, lng) = text.split_once(',')?;
    Some((lat.trim().parse().ok()?, lng.trim().parse().ok()?))
}

/// Great-circle distance in meters.
fn distance((lat1, lng1): (f64, f64), (lat2, lng2): (f64, f64)) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

async fn search(State(db): State<Db>, Query(params): Query<Params>) -> Json<Value> {
    let key = match authorize(&params) {
        Ok(key) => key,
        Err(rejection) => return rejection,
    };
    let Some(origin) = params.get("location").and_then(|l| parse_location(l)) else {
        return status("INVALID_REQUEST");
    };
    let Some(radius) = params
        .get("radius")
        .and_then(|r| r.parse::<f64>().ok())
        .filter(|r| *r > 0.0)
    else {
        return status("INVALID_REQUEST");
    };
    let types: Vec<&str> = params
        .get("types")
        .map(|t| t.split('|').collect())
        .unwrap_or_default();
    let name = params.get("name").map(|n| n.to_lowercase());

    let places = db.read().await;
    let results: Vec<Value> = places
        .values()
        .filter(|p| p.visible_to(key))
        .filter(|p| p.lat_lng().is_some_and(|at| distance(origin, at) <= radius))
        .filter(|p| types.is_empty() || p.types.iter().any(|t| types.contains(&t.as_str())))
        .filter(|p| {
            name.as_ref()
                .map_or(true, |n| p.name.to_lowercase().contains(n.as_str()))
        })
        .map(|p| Value::Object(p.summary()))
        .collect();
    debug!(matches = results.len(), "search");

    if results.is_empty() {
        return status("ZERO_RESULTS");
    }
    Json(json!({ "status": "OK", "results": results, "html_attributions": [] }))
}

async fn details(State(db): State<Db>, Query(params): Query<Params>) -> Json<Value> {
    let key = match authorize(&params) {
        Ok(key) => key,
        Err(rejection) => return rejection,
    };
    let Some(reference) = params.get("reference") else {
        return status("INVALID_REQUEST");
    };
    let places = db.read().await;
    match places.get(reference).filter(|p| p.visible_to(key)) {
        Some(place) => Json(json!({
            "status": "OK",
            "result": place.details(),
            "html_attributions": [],
        })),
        None => status("NOT_FOUND"),
    }
}

fn body_reference(body: &Value) -> Option<&str> {
    body.get("reference")
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
}

async fn check_in(
    State(db): State<Db>,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let key = match authorize(&params) {
        Ok(key) => key,
        Err(rejection) => return rejection,
    };
    let Some(reference) = body_reference(&body) else {
        return status("INVALID_REQUEST");
    };
    let mut places = db.write().await;
    match places.get_mut(reference).filter(|p| p.visible_to(key)) {
        Some(place) => {
            place.check_ins += 1;
            status("OK")
        }
        None => status("NOT_FOUND"),
    }
}

async fn add(
    State(db): State<Db>,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let key = match authorize(&params) {
        Ok(key) => key,
        Err(rejection) => return rejection,
    };
    let location = &body["location"];
    if number(&location["lat"]).is_none() || number(&location["lng"]).is_none() {
        return status("INVALID_REQUEST");
    }
    if body.get("accuracy").and_then(number).is_none() {
        return status("INVALID_REQUEST");
    }
    let Some(name) = body.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
        return status("INVALID_REQUEST");
    };
    let types = match body.get("types") {
        None => Vec::new(),
        Some(Value::Array(items)) if items.len() == 1 && items[0].is_string() => {
            vec![items[0].as_str().unwrap_or_default().to_string()]
        }
        Some(_) => return status("INVALID_REQUEST"),
    };

    let place = MockPlace {
        id: Uuid::new_v4().simple().to_string(),
        reference: Uuid::new_v4().to_string(),
        name: name.to_string(),
        location: json!({"lat": location["lat"].clone(), "lng": location["lng"].clone()}),
        viewport: None,
        types,
        vicinity: None,
        formatted_address: None,
        address_components: Vec::new(),
        rating: None,
        owner_key: key.to_string(),
        moderated: false,
        check_ins: 0,
    };
    let response = json!({
        "status": "OK",
        "id": place.id,
        "reference": place.reference,
        "scope": "APP",
    });
    db.write().await.insert(place.reference.clone(), place);
    Json(response)
}

async fn delete(
    State(db): State<Db>,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let key = match authorize(&params) {
        Ok(key) => key,
        Err(rejection) => return rejection,
    };
    let Some(reference) = body_reference(&body) else {
        return status("INVALID_REQUEST");
    };
    let mut places = db.write().await;
    let deletable = places
        .get(reference)
        .map(|p| p.owner_key == key && !p.moderated);
    match deletable {
        None => status("NOT_FOUND"),
        Some(true) => {
            places.remove(reference);
            status("OK")
        }
        Some(false) => status("REQUEST_DENIED"),
    }
}

use crate::{
    geo_sample::GeoSample,
    recorder::TripSink,
    trip::{Difficulty, Trip, TripStatus},
    RouteListError,
};

/// Owns every route the club shows: the curated ones and whatever was recorded
/// during this process. Nothing outlives the process.
#[derive(Debug, Clone, Default)]
pub struct RouteList {
    routes: Vec<Trip>,
}

impl RouteList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The list the club starts with.
    pub fn with_iconic_routes() -> Self {
        Self {
            routes: iconic_routes(),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trip> {
        self.routes.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Trip> {
        self.routes.iter().find(|route| route.id == id)
    }

    pub fn find_by_title(&self, title: &str) -> Option<&Trip> {
        let title = title.to_lowercase();
        self.routes.iter().find(|route| route.title.to_lowercase() == title)
    }

    pub fn by_status(&self, status: TripStatus) -> impl Iterator<Item = &Trip> {
        self.routes.iter().filter(move |route| route.status == status)
    }

    /// Routes still to be ridden (anything not completed).
    pub fn open_routes(&self) -> impl Iterator<Item = &Trip> {
        self.routes.iter().filter(|route| route.status != TripStatus::Completed)
    }

    /// Puts a route back on the plan.
    pub fn plan(&mut self, id: &str) -> Result<&Trip, RouteListError> {
        let route = self.routes
            .iter_mut()
            .find(|route| route.id == id)
            .ok_or_else(|| RouteListError::UnknownRoute(id.to_string()))?;

        route.status = TripStatus::Planned;
        tracing::info!("Route {} ({}) planned", route.id, route.title);
        Ok(route)
    }

    pub fn push(&mut self, trip: Trip) {
        tracing::info!("Added route {} ({}) with {} points", trip.id, trip.title, trip.points.len());
        self.routes.push(trip);
    }
}

impl TripSink for RouteList {
    fn accept(&mut self, trip: Trip) {
        self.push(trip);
    }
}

fn iconic_routes() -> Vec<Trip> {
    // Coordinates are literal and in range.
    let point = |lat: f64, lng: f64, t: i64| GeoSample::from_millis(lat, lng, t).ok();

    let mut real = Trip::new(
        "1".into(),
        "Estrada Real de Goiás".into(),
        "Um mergulho na história do Brasil Central, com paisagens típicas do cerrado e estradas desafiadoras.".into(),
        "120 km".into(),
        Difficulty::Moderate,
        [point(-16.76, -49.28, 0), point(-16.80, -49.30, 1)].into_iter().flatten().collect(),
        TripStatus::Planned,
    );
    real.thumbnail = Some("https://images.unsplash.com/photo-1471478331149-c72f17e33c73?q=80&w=800&auto=format&fit=crop".into());

    let mut waters = Trip::new(
        "2".into(),
        "Rota das Águas Quentes".into(),
        "Trajeto clássico partindo de Aparecida rumo às estâncias termais da região.".into(),
        "160 km".into(),
        Difficulty::Easy,
        [point(-16.76, -49.28, 0), point(-17.74, -48.62, 1)].into_iter().flatten().collect(),
        TripStatus::Completed,
    );
    waters.thumbnail = Some("https://images.unsplash.com/photo-1515777315835-281b94c9589f?q=80&w=800&auto=format&fit=crop".into());

    vec![real, waters]
}

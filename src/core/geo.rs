use crate::domain::model::{Coordinates, Slug};
use std::collections::BTreeMap;
use std::f64::consts::PI;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat * PI / 180.0;
    let lat2 = b.lat * PI / 180.0;
    let dlat = (b.lat - a.lat) * PI / 180.0;
    let dlng = (b.lng - a.lng) * PI / 180.0;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Every located suburb's other located suburbs, nearest first. Built once
/// per dataset; ties are ordered by slug.
#[derive(Debug, Clone, Default)]
pub struct ProximityIndex {
    nearest: BTreeMap<Slug, Vec<(Slug, f64)>>,
}

impl ProximityIndex {
    pub fn build(points: &BTreeMap<Slug, Coordinates>) -> Self {
        let nearest = points
            .iter()
            .map(|(slug, origin)| {
                let mut ranked: Vec<(Slug, f64)> = points
                    .iter()
                    .filter(|(other, _)| *other != slug)
                    .map(|(other, coords)| (other.clone(), haversine_km(*origin, *coords)))
                    .collect();
                ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                (slug.clone(), ranked)
            })
            .collect();

        Self { nearest }
    }

    /// Up to `depth` nearest suburbs; empty when `slug` has no coordinates.
    pub fn nearest(&self, slug: &str, depth: usize) -> impl Iterator<Item = &(Slug, f64)> {
        self.nearest
            .get(slug)
            .map(|ranked| ranked.as_slice())
            .unwrap_or(&[])
            .iter()
            .take(depth)
    }

    pub fn len(&self) -> usize {
        self.nearest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nearest.is_empty()
    }
}

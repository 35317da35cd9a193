//! Service-area checks: is a point (or route) inside the area we serve?
//!
//! Entirely local computation over geometry primitives — no provider
//! call, no cache. The batch check isolates per-point failures: an
//! invalid point in the batch becomes a negative result instead of
//! aborting the whole request.

use waypoint_models::Coordinate;

use crate::{ServiceError, require_valid};

/// Pure service-area membership checks.
pub struct ServiceabilityService;

impl ServiceabilityService {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether a point falls inside a polygonal service area.
    ///
    /// The polygon is an implicitly closed ring of at least 3 vertices.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an invalid point or a
    /// malformed polygon.
    pub fn is_point_in_area(
        &self,
        point: &Coordinate,
        area: &[Coordinate],
    ) -> Result<bool, ServiceError> {
        require_valid(point, "point")?;
        validate_area(area)?;
        Ok(waypoint_geo::is_point_in_polygon(point, area))
    }

    /// Whether a point falls within `radius_m` meters of a center.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for invalid coordinates or a
    /// non-positive radius.
    pub fn is_point_in_radius(
        &self,
        point: &Coordinate,
        center: &Coordinate,
        radius_m: f64,
    ) -> Result<bool, ServiceError> {
        require_valid(point, "point")?;
        require_valid(center, "center")?;
        if radius_m <= 0.0 {
            return Err(ServiceError::validation("radius must be positive"));
        }
        Ok(waypoint_geo::distance(point, center) <= radius_m)
    }

    /// Checks many points against one area, one verdict per point in
    /// input order.
    ///
    /// A point that fails validation yields `false` rather than failing
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] only for a malformed polygon.
    pub fn check_points(
        &self,
        points: &[Coordinate],
        area: &[Coordinate],
    ) -> Result<Vec<bool>, ServiceError> {
        validate_area(area)?;
        Ok(points
            .iter()
            .map(|point| point.is_valid() && waypoint_geo::is_point_in_polygon(point, area))
            .collect())
    }

    /// Checks many points against one circular area, one verdict per
    /// point in input order.
    ///
    /// A point that fails validation yields `false` rather than failing
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] only for an invalid center or
    /// a non-positive radius.
    pub fn check_points_in_radius(
        &self,
        points: &[Coordinate],
        center: &Coordinate,
        radius_m: f64,
    ) -> Result<Vec<bool>, ServiceError> {
        require_valid(center, "center")?;
        if radius_m <= 0.0 {
            return Err(ServiceError::validation("radius must be positive"));
        }
        Ok(points
            .iter()
            .map(|point| point.is_valid() && waypoint_geo::distance(point, center) <= radius_m)
            .collect())
    }

    /// Whether every point of a route lies inside the area.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty route, an
    /// invalid route point, or a malformed polygon.
    pub fn is_route_inside(
        &self,
        route: &[Coordinate],
        area: &[Coordinate],
    ) -> Result<bool, ServiceError> {
        validate_route(route)?;
        validate_area(area)?;
        Ok(route
            .iter()
            .all(|point| waypoint_geo::is_point_in_polygon(point, area)))
    }

    /// Percentage of route points inside the area, in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::is_route_inside`].
    pub fn route_coverage_percent(
        &self,
        route: &[Coordinate],
        area: &[Coordinate],
    ) -> Result<f64, ServiceError> {
        validate_route(route)?;
        validate_area(area)?;
        let inside = route
            .iter()
            .filter(|point| waypoint_geo::is_point_in_polygon(point, area))
            .count();
        #[allow(clippy::cast_precision_loss)]
        Ok(inside as f64 / route.len() as f64 * 100.0)
    }

    /// First point where the route transitions from inside the area to
    /// outside it, scanning in order. `None` when no such transition
    /// exists (the route never enters, or never leaves).
    ///
    /// # Errors
    ///
    /// Same error classes as [`Self::is_route_inside`].
    pub fn first_exit_point(
        &self,
        route: &[Coordinate],
        area: &[Coordinate],
    ) -> Result<Option<Coordinate>, ServiceError> {
        validate_route(route)?;
        validate_area(area)?;
        let mut was_inside = false;
        for point in route {
            let inside = waypoint_geo::is_point_in_polygon(point, area);
            if was_inside && !inside {
                return Ok(Some(*point));
            }
            was_inside = inside;
        }
        Ok(None)
    }

    /// Distance from a point to the area boundary, in meters.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an invalid point or a
    /// malformed polygon.
    pub fn distance_to_boundary(
        &self,
        point: &Coordinate,
        area: &[Coordinate],
    ) -> Result<f64, ServiceError> {
        require_valid(point, "point")?;
        validate_area(area)?;
        Ok(waypoint_geo::distance_to_polygon_boundary(point, area))
    }
}

impl Default for ServiceabilityService {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_area(area: &[Coordinate]) -> Result<(), ServiceError> {
    if area.len() < 3 {
        return Err(ServiceError::validation(
            "service area must have at least 3 vertices",
        ));
    }
    for (i, vertex) in area.iter().enumerate() {
        require_valid(vertex, &format!("area[{i}]"))?;
    }
    Ok(())
}

fn validate_route(route: &[Coordinate]) -> Result<(), ServiceError> {
    if route.is_empty() {
        return Err(ServiceError::validation("route must not be empty"));
    }
    for (i, point) in route.iter().enumerate() {
        require_valid(point, &format!("route[{i}]"))?;
    }
    Ok(())
}

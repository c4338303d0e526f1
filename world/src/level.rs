//! Loaded level: terrain, sampled route and wave schedule.

use shadow_defend_core::{
    LevelCatalog, LevelData, LevelError, Rect, Route, RouteSource, Schedule,
};
use shadow_defend_system_route::sample_route;

#[derive(Debug)]
pub(crate) struct Stage {
    terrain: Box<dyn RouteSource>,
    route: Route,
    schedule: Schedule,
}

impl Stage {
    /// Loads a level and samples its route.
    ///
    /// Levels whose route has fewer than two vertices, leaves no samples
    /// inside the playable area, or whose schedule has no waves are rejected.
    pub(crate) fn load(catalog: &dyn LevelCatalog, level: u32) -> Result<Self, LevelError> {
        let LevelData { terrain, schedule } = catalog.load(level)?;

        if terrain.polyline().len() < 2 {
            return Err(LevelError::InvalidRoute {
                level,
                reason: "route needs at least two vertices".to_owned(),
            });
        }

        let route = sample_route(terrain.polyline(), terrain.playable_area());
        if route.is_empty() {
            return Err(LevelError::InvalidRoute {
                level,
                reason: "route never enters the playable area".to_owned(),
            });
        }

        if schedule.wave_count() == 0 {
            return Err(LevelError::InvalidSchedule {
                level,
                reason: "no waves scheduled".to_owned(),
            });
        }

        Ok(Self {
            terrain,
            route,
            schedule,
        })
    }

    pub(crate) fn route(&self) -> &Route {
        &self.route
    }

    pub(crate) fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub(crate) fn playable_area(&self) -> Rect {
        self.terrain.playable_area()
    }

    pub(crate) fn terrain(&self) -> &dyn RouteSource {
        self.terrain.as_ref()
    }
}

use std::rc::Rc;

use super::MotionEngine;
use super::forces::{
    Axis, FILTER_COLLIDE_PADDING, FILTER_COLLIDE_STRENGTH, ForceName, boundary_force,
    category_force, collision_force, filter_force,
};

impl MotionEngine {
    /// Replaces the whole force set for the active layout regime.
    ///
    /// Unfiltered installs category, boundary and collision forces; filtered
    /// installs filter clustering and a tightened collision. The two never
    /// coexist.
    pub(super) fn rebuild_forces(&mut self) {
        self.forces.clear();
        if self.filter.is_active() {
            self.install_filter_forces();
        } else {
            self.install_layout_forces();
        }
        self.install_collision();
    }

    fn install_layout_forces(&mut self) {
        let anchors = Rc::new(
            self.viewport
                .size()
                .map(|size| self.anchors.absolute(size))
                .unwrap_or_default(),
        );
        let strength = self.config.center_strength;

        for (name, axis) in [(ForceName::CategoryX, Axis::X), (ForceName::CategoryY, Axis::Y)] {
            self.forces.install(
                name,
                category_force(axis, strength, Rc::clone(&anchors), self.viewport.clone()),
            );
        }
        for (name, axis) in [(ForceName::BoundaryX, Axis::X), (ForceName::BoundaryY, Axis::Y)] {
            self.forces
                .install(name, boundary_force(axis, self.viewport.clone()));
        }
    }

    fn install_filter_forces(&mut self) {
        let targets = Rc::new(self.filter.node_targets().clone());
        for (name, axis) in [(ForceName::FilterX, Axis::X), (ForceName::FilterY, Axis::Y)] {
            self.forces.install(
                name,
                filter_force(axis, Rc::clone(&targets), self.viewport.clone()),
            );
        }
    }

    /// Refreshes collision after radii or collision settings changed.
    pub(super) fn install_collision(&mut self) {
        let force = if self.filter.is_active() {
            collision_force(FILTER_COLLIDE_PADDING, FILTER_COLLIDE_STRENGTH)
        } else {
            collision_force(self.config.collide_padding, self.config.repulse_strength)
        };
        self.forces.install(ForceName::Collision, force);
    }
}

#[cfg(test)]
mod tests {
    use crate::motion::config::{DensityPreset, MotionConfig};
    use crate::motion::forces::{Force, ForceName};
    use crate::motion::viewport::Viewport;
    use crate::motion::MotionEngine;
    use crate::records::DataRecord;

    fn collision_params(engine: &MotionEngine) -> (f32, f32) {
        match engine.forces().get(ForceName::Collision) {
            Some(Force::Collide { padding, strength }) => (*padding, *strength),
            other => panic!("unexpected collision force {other:?}"),
        }
    }

    #[test]
    fn unfiltered_layout_has_category_boundary_and_collision() {
        let engine = MotionEngine::new(Viewport::new(640.0, 480.0), MotionConfig::default())
            .expect("engine builds");

        assert_eq!(
            engine.forces().names(),
            vec![
                ForceName::CategoryX,
                ForceName::CategoryY,
                ForceName::Collision,
                ForceName::BoundaryX,
                ForceName::BoundaryY,
            ]
        );
        assert_eq!(collision_params(&engine), (8.0, 0.8));
    }

    #[test]
    fn density_preset_rebuilds_collision_and_category_strength() {
        let mut engine = MotionEngine::new(Viewport::new(640.0, 480.0), MotionConfig::default())
            .expect("engine builds");
        engine.set_density(DensityPreset::Compact);

        assert_eq!(collision_params(&engine), (2.0, 0.4));
        assert!(matches!(
            engine.forces().get(ForceName::CategoryX),
            Some(Force::Position { strength, .. }) if *strength == 0.12
        ));
    }

    #[test]
    fn filtered_collision_is_tightened() {
        let mut engine = MotionEngine::new(Viewport::new(640.0, 480.0), MotionConfig::default())
            .expect("engine builds");
        engine
            .update_nodes(vec![DataRecord::new("a", 1.0).with_group("g")])
            .expect("update");
        engine.trigger_spatial_filter(Some("group")).expect("filter");

        assert_eq!(collision_params(&engine), (3.0, 0.9));
    }
}

use std::time::Duration;

use eframe::egui::Vec2;

use super::config::MotionConfig;
use super::forces::{ForceScratch, ForceSet};
use super::nodes::SimulationNode;

/// Alpha a membership change or transition raises the driver to.
pub const REHEAT_ALPHA: f32 = 0.3;
/// Alpha target held while a transition boost lasts.
pub const BOOST_ALPHA_TARGET: f32 = 0.1;
/// Ticks for alpha to cool from 1 to `alpha_min` with a zero target.
const COOLING_TICKS: f32 = 300.0;

/// Perpetual integrator advancing nodes under a [`ForceSet`].
///
/// Alpha eases toward the alpha target every tick. With a positive target
/// above `alpha_min` the driver never halts on its own.
#[derive(Debug)]
pub struct Driver {
    alpha: f32,
    alpha_min: f32,
    alpha_target: f32,
    alpha_decay: f32,
    initial_alpha: f32,
    velocity_decay: f32,
    running: bool,
    boost_remaining: Option<Duration>,
    scratch: ForceScratch,
}

impl Driver {
    pub fn new(config: &MotionConfig) -> Self {
        let mut driver = Self {
            alpha: 0.0,
            alpha_min: 0.0,
            alpha_target: 0.0,
            alpha_decay: 0.0,
            initial_alpha: 0.0,
            velocity_decay: config.velocity_decay,
            running: false,
            boost_remaining: None,
            scratch: ForceScratch::default(),
        };
        driver.configure(config);
        driver
    }

    /// Adopts alpha settings from `config`; velocity decay is set separately.
    pub fn configure(&mut self, config: &MotionConfig) {
        self.alpha_min = config.alpha_min;
        self.alpha_target = config.alpha_target;
        self.initial_alpha = config.initial_alpha;
        self.alpha_decay = 1.0 - config.alpha_min.max(1e-6).powf(1.0 / COOLING_TICKS);
    }

    pub fn start(&mut self) {
        self.alpha = self.initial_alpha;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.boost_remaining = None;
    }

    /// Resumes ticking without touching alpha.
    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn reheat(&mut self, min_alpha: f32) {
        self.alpha = self.alpha.max(min_alpha);
    }

    /// Raises energy and holds a higher alpha target for `duration`.
    pub fn boost(&mut self, duration: Duration) {
        self.reheat(REHEAT_ALPHA);
        self.boost_remaining = Some(duration);
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        if self.boost_remaining.is_some() {
            self.alpha_target.max(BOOST_ALPHA_TARGET)
        } else {
            self.alpha_target
        }
    }

    pub fn velocity_decay(&self) -> f32 {
        self.velocity_decay
    }

    pub fn set_velocity_decay(&mut self, decay: f32) {
        self.velocity_decay = decay.clamp(0.0, 1.0);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances one tick. Nodes with a non-finite position are put back at
    /// `fallback` at rest.
    pub fn tick(
        &mut self,
        nodes: &mut [SimulationNode],
        forces: &ForceSet,
        elapsed: Duration,
        fallback: Vec2,
    ) {
        if !self.running {
            return;
        }

        let target = self.alpha_target();
        if let Some(remaining) = self.boost_remaining {
            let remaining = remaining.saturating_sub(elapsed);
            self.boost_remaining = (!remaining.is_zero()).then_some(remaining);
        }
        self.alpha += (target - self.alpha) * self.alpha_decay;

        for force in forces.iter() {
            force.apply(nodes, self.alpha, &mut self.scratch);
        }

        let keep = 1.0 - self.velocity_decay;
        for node in nodes.iter_mut() {
            node.vx *= keep;
            node.vy *= keep;
            node.x += node.vx;
            node.y += node.vy;
        }

        for force in forces.iter() {
            force.constrain(nodes);
        }

        for node in nodes.iter_mut() {
            if !node.x.is_finite() || !node.y.is_finite() {
                node.x = fallback.x;
                node.y = fallback.y;
                node.vx = 0.0;
                node.vy = 0.0;
            }
        }

        if self.alpha < self.alpha_min {
            self.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::motion::forces::{Axis, Force, ForceName};
    use crate::records::DataRecord;

    const FRAME: Duration = Duration::from_millis(16);

    fn resting_node(x: f32, vx: f32) -> SimulationNode {
        SimulationNode {
            key: "n".to_owned(),
            record: DataRecord::new("n", 1.0),
            radius: 5.0,
            x,
            y: 0.0,
            vx,
            vy: 0.0,
        }
    }

    #[test]
    fn alpha_settles_on_target_and_keeps_running() {
        let mut driver = Driver::new(&MotionConfig::default());
        driver.start();
        assert_eq!(driver.alpha(), 0.6);

        let mut nodes = Vec::new();
        for _ in 0..3000 {
            driver.tick(&mut nodes, &ForceSet::default(), FRAME, Vec2::ZERO);
        }
        assert!(driver.is_running());
        assert!((driver.alpha() - 0.01).abs() < 1e-3);
    }

    #[test]
    fn zero_target_cools_down_and_halts() {
        let config = MotionConfig {
            alpha_target: 0.0,
            ..MotionConfig::default()
        };
        let mut driver = Driver::new(&config);
        driver.start();

        let mut ticks = 0;
        while driver.is_running() && ticks < 10_000 {
            driver.tick(&mut [], &ForceSet::default(), FRAME, Vec2::ZERO);
            ticks += 1;
        }
        assert!(!driver.is_running());
        assert!(ticks > 250 && ticks < 400, "cooled in {ticks} ticks");
    }

    #[test]
    fn velocity_decays_then_moves_position() {
        let mut driver = Driver::new(&MotionConfig::default());
        driver.start();
        let mut nodes = vec![resting_node(10.0, 5.0)];

        driver.tick(&mut nodes, &ForceSet::default(), FRAME, Vec2::ZERO);
        assert!((nodes[0].vx - 4.0).abs() < 1e-6);
        assert!((nodes[0].x - 14.0).abs() < 1e-6);
    }

    #[test]
    fn stopped_driver_does_not_move_nodes() {
        let mut driver = Driver::new(&MotionConfig::default());
        let mut nodes = vec![resting_node(10.0, 5.0)];

        driver.tick(&mut nodes, &ForceSet::default(), FRAME, Vec2::ZERO);
        assert_eq!(nodes[0].x, 10.0);

        driver.start();
        driver.stop();
        driver.tick(&mut nodes, &ForceSet::default(), FRAME, Vec2::ZERO);
        assert_eq!(nodes[0].x, 10.0);
    }

    #[test]
    fn boost_raises_target_until_it_expires() {
        let mut driver = Driver::new(&MotionConfig::default());
        driver.start();
        driver.boost(Duration::from_millis(40));
        assert_eq!(driver.alpha_target(), BOOST_ALPHA_TARGET);
        assert!(driver.alpha() >= REHEAT_ALPHA);

        for _ in 0..3 {
            driver.tick(&mut [], &ForceSet::default(), FRAME, Vec2::ZERO);
        }
        assert_eq!(driver.alpha_target(), 0.01);
    }

    #[test]
    fn non_finite_positions_are_reset() {
        let mut driver = Driver::new(&MotionConfig::default());
        driver.start();
        let mut forces = ForceSet::default();
        forces.install(
            ForceName::CategoryX,
            Force::Position {
                axis: Axis::X,
                strength: 1.0,
                target: Box::new(|_| f32::NAN),
                contain: None,
            },
        );
        let mut nodes = vec![resting_node(10.0, 0.0)];

        driver.tick(&mut nodes, &forces, FRAME, vec2(50.0, 40.0));
        assert_eq!(nodes[0].position(), vec2(50.0, 40.0));
        assert_eq!(nodes[0].velocity(), Vec2::ZERO);
    }
}

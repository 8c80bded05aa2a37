//! Background scenery, scaled for the device it runs on

use glam::Vec3;

use super::event::{Event, EventName, Payload, Platform};
use super::machine::{Behavior, Context, Rule, Scope};
use crate::tuning::BackdropTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackdropPhase {
    Shown,
}

pub struct BackdropController {
    tuning: BackdropTuning,
    platform: Platform,
}

impl BackdropController {
    pub fn new(tuning: BackdropTuning) -> Self {
        Self {
            tuning,
            platform: Platform::default(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn scale_for(&self, platform: Platform) -> Vec3 {
        match platform {
            Platform::Desktop => self.tuning.desktop_scale,
            Platform::Mobile => self.tuning.mobile_scale,
        }
    }

    fn fit(&mut self, platform: Platform, ctx: &mut Context<'_>) {
        self.platform = platform;
        let scale = self.scale_for(platform);
        let entity = ctx.entity();
        ctx.world.set_scale(entity, scale);
        log::debug!("backdrop scaled to {} for {:?}", scale, platform);
    }
}

impl Behavior for BackdropController {
    type State = BackdropPhase;
    const NAME: &'static str = "backdrop";
    const INITIAL: BackdropPhase = BackdropPhase::Shown;
    const RULES: &'static [Rule<BackdropPhase, Self>] = &[Rule::handle(
        BackdropPhase::Shown,
        EventName::DeviceChange,
        Scope::Global,
    )];

    fn on_enter(&mut self, _state: BackdropPhase, ctx: &mut Context<'_>) {
        let platform = ctx.world.platform();
        self.fit(platform, ctx);
    }

    fn on_event(&mut self, _state: BackdropPhase, event: &Event, ctx: &mut Context<'_>) {
        // No payload means "ask the host again"
        let platform = match event.payload {
            Payload::Device { platform } => platform,
            _ => ctx.world.platform(),
        };
        self.fit(platform, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::runtime::Simulation;
    use crate::sim::world::{HeadlessWorld, World};

    fn scale(sim: &Simulation<HeadlessWorld>, entity: crate::sim::event::EntityId) -> Vec3 {
        sim.world().node(entity).unwrap().scale
    }

    #[test]
    fn test_scales_for_platform() {
        let mut sim = Simulation::new(HeadlessWorld::new().with_platform(Platform::Mobile), 0);
        let sky = sim.world_mut().create_entity();
        sim.attach(sky, BackdropController::new(BackdropTuning::default()));
        assert_eq!(scale(&sim, sky), Vec3::new(3.0, 6.0, 3.0));

        sim.dispatch(
            Event::global(EventName::DeviceChange).with(Payload::Device {
                platform: Platform::Desktop,
            }),
        );
        assert_eq!(scale(&sim, sky), Vec3::new(5.0, 6.0, 5.0));

        sim.world_mut().set_platform(Platform::Mobile);
        sim.dispatch(Event::global(EventName::DeviceChange));
        assert_eq!(scale(&sim, sky), Vec3::new(3.0, 6.0, 3.0));
    }

    #[test]
    fn test_removed_backdrop_stops_listening() {
        let mut sim = Simulation::new(HeadlessWorld::new(), 0);
        let sky = sim.world_mut().create_entity();
        sim.attach(sky, BackdropController::new(BackdropTuning::default()));
        assert_eq!(sim.bus().count_for(sky), 1);

        sim.remove(sky);
        assert!(sim.bus().is_empty());
        sim.dispatch(Event::global(EventName::DeviceChange));
        assert!(!sim.world().contains(sky));
    }
}

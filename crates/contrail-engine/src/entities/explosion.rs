use crate::command::TickContext;
use crate::entity::{Behavior, EntityCore};
use crate::error::SimError;

/// Five animation frames at 0.1 s each.
pub const EXPLOSION_LIFETIME: f64 = 0.5;
const FRAME_TIME: f64 = 0.1;

#[derive(Debug, Default, Clone, Copy)]
pub struct Explosion {
    elapsed: f64,
}

impl Explosion {
    /// Animation frame the renderer should show.
    pub fn frame(&self) -> u32 {
        (self.elapsed / FRAME_TIME) as u32
    }
}

impl Behavior for Explosion {
    fn name(&self) -> &'static str {
        "explosion"
    }

    fn update(&mut self, core: &mut EntityCore, dt: f64, _ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        self.elapsed += dt;
        if self.elapsed >= EXPLOSION_LIFETIME {
            core.destroy();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use contrail_ecs::command::CommandBuffer;

    use super::*;
    use crate::command::SimCommands;
    use crate::config::Playfield;
    use crate::entities::explosion;
    use crate::math::Vec2;

    #[test]
    fn explosion_expires_after_its_animation() {
        let mut e = explosion(Vec2::new(10.0, 10.0), 3.0).unwrap();
        assert_eq!((e.core.body.layer(), e.core.body.mask()), (0, 0));
        let mut commands: SimCommands = CommandBuffer::new();
        let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
        for _ in 0..4 {
            e.update(0.1, &mut ctx).unwrap();
        }
        assert!(!e.core.is_destroyed());
        e.update(0.11, &mut ctx).unwrap();
        assert!(e.core.is_destroyed());
    }
}

//! The pipeline's first pass: turns the `Empty` placeholder artifact into a
//! freshly allocated, all-wall `DungeonState` sized per the run's config.

use dg_core::{Context, Pass, ProcgenError};

use crate::state::{DungeonState, Empty};

pub struct InitializeState;

impl Pass<Empty, DungeonState> for InitializeState {
    fn id(&self) -> &'static str {
        "initialize-state"
    }

    fn run(&self, _input: Empty, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        Ok(DungeonState::new(ctx.config.width, ctx.config.height, ctx.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_core::{GenerationConfig, NoopCollector};

    #[test]
    fn produces_an_all_wall_grid_of_the_configured_size() {
        let cfg = GenerationConfig::default();
        let mut trace = NoopCollector;
        let mut ctx = Context::new(&cfg, &mut trace);
        let state = InitializeState.run(Empty, &mut ctx).unwrap();
        assert_eq!(state.width(), cfg.width);
        assert_eq!(state.height(), cfg.height);
        assert_eq!(state.floor_ratio(), 0.0);
    }
}

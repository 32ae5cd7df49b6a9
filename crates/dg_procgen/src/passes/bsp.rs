//! The BSP generator's layout passes: recursive rectangle partitioning,
//! then probabilistic room placement inside each leaf.

use rand::Rng;

use dg_core::{Context, Decision, DecisionSystem, Pass, PassCounts, ProcgenError};
use dg_grid::Rect;

use crate::state::DungeonState;

pub struct PartitionBsp;

/// Recursively split `rect`, pushing leaves into `leaves` once neither
/// dimension can be split further without violating
/// `min_room_size + room_padding`, or `max_depth` is reached.
pub(crate) fn split(rect: Rect, depth: u32, ctx: &mut Context, leaves: &mut Vec<Rect>) {
    let bsp = &ctx.config.bsp;
    let min_leaf = (bsp.min_room_size + bsp.room_padding) as i32 * 2;
    let can_split_h = rect.width as i32 >= min_leaf;
    let can_split_v = rect.height as i32 >= min_leaf;
    let depth_exhausted = bsp.max_depth.map(|max| depth >= max).unwrap_or(false);

    if depth_exhausted || (!can_split_h && !can_split_v) {
        leaves.push(rect);
        return;
    }

    // Prefer splitting the longer axis so leaves trend toward square-ish,
    // falling back to whichever axis is legal if only one is.
    let split_horizontally = if can_split_h && can_split_v {
        rect.width >= rect.height
    } else {
        can_split_h
    };

    let ratio_min = bsp.split_ratio_min;
    let ratio_max = bsp.split_ratio_max;
    let ratio: f32 = ctx.rng.layout().gen_range(ratio_min..=ratio_max);

    let (a, b) = if split_horizontally {
        let split_x = (rect.width as f32 * ratio) as u32;
        (
            Rect::new(rect.x, rect.y, split_x, rect.height),
            Rect::new(rect.x + split_x as i32, rect.y, rect.width - split_x, rect.height),
        )
    } else {
        let split_y = (rect.height as f32 * ratio) as u32;
        (
            Rect::new(rect.x, rect.y, rect.width, split_y),
            Rect::new(rect.x, rect.y + split_y as i32, rect.width, rect.height - split_y),
        )
    };

    ctx.trace.decision(
        self_id(),
        ctx.now_ms(),
        Decision {
            system: DecisionSystem::Layout,
            question: "split axis and ratio".into(),
            options: vec!["horizontal".into(), "vertical".into()],
            chosen: if split_horizontally { "horizontal".into() } else { "vertical".into() },
            reason: "longer axis preferred, falls back to the only legal axis".into(),
            confidence: 1.0,
            rng_consumed: 1,
            context: None,
        },
    );

    split(a, depth + 1, ctx, leaves);
    split(b, depth + 1, ctx, leaves);
}

fn self_id() -> &'static str {
    "partition-bsp"
}

impl Pass<DungeonState, DungeonState> for PartitionBsp {
    fn id(&self) -> &'static str {
        self_id()
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let full = Rect::new(0, 0, state.width(), state.height());
        let mut leaves = Vec::new();
        split(full, 0, ctx, &mut leaves);
        state.bsp_leaves = leaves;
        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            custom: serde_json::Map::from_iter([("leaf_count".to_string(), output.bsp_leaves.len().into())]),
            ..Default::default()
        }
    }
}

pub struct PlaceRooms;

impl Pass<DungeonState, DungeonState> for PlaceRooms {
    fn id(&self) -> &'static str {
        "place-rooms"
    }

    fn run(&self, mut state: DungeonState, ctx: &mut Context) -> Result<DungeonState, ProcgenError> {
        let bsp = ctx.config.bsp;
        let leaves = std::mem::take(&mut state.bsp_leaves);

        for leaf in leaves {
            let roll: f32 = ctx.rng.rooms().gen();
            if roll > bsp.room_placement_chance {
                continue;
            }

            let max_w = (leaf.width.saturating_sub(2 * bsp.room_padding)).min(bsp.max_room_size);
            let max_h = (leaf.height.saturating_sub(2 * bsp.room_padding)).min(bsp.max_room_size);
            if max_w < bsp.min_room_size || max_h < bsp.min_room_size {
                continue;
            }

            let room_w = ctx.rng.rooms().gen_range(bsp.min_room_size..=max_w);
            let room_h = ctx.rng.rooms().gen_range(bsp.min_room_size..=max_h);
            let slack_x = leaf.width - 2 * bsp.room_padding - room_w;
            let slack_y = leaf.height - 2 * bsp.room_padding - room_h;
            let offset_x = if slack_x > 0 { ctx.rng.rooms().gen_range(0..=slack_x) } else { 0 };
            let offset_y = if slack_y > 0 { ctx.rng.rooms().gen_range(0..=slack_y) } else { 0 };

            let rect = Rect::new(
                leaf.x + bsp.room_padding as i32 + offset_x as i32,
                leaf.y + bsp.room_padding as i32 + offset_y as i32,
                room_w,
                room_h,
            );

            let id = state.alloc_room_id();
            let room_seed = ctx.rng.rooms().gen();
            state.rooms.push(dg_core::Room {
                id,
                rect,
                room_type: dg_core::RoomType::Normal,
                seed: room_seed,
                template: None,
                traits: Default::default(),
            });
        }

        Ok(state)
    }

    fn metrics(&self, output: &DungeonState) -> PassCounts {
        PassCounts {
            rooms: output.rooms.len(),
            ..Default::default()
        }
    }
}

//! Wire types come from `arena_shared`; this module maps server entities
//! onto them.

pub use arena_shared::protocol::*;

use crate::food::Food;
use crate::player::Player;
use crate::world::Event;

impl From<&Player> for PlayerWire {
    fn from(player: &Player) -> Self {
        Self {
            x: player.x,
            y: player.y,
            r: player.r,
            trail: player
                .trail
                .iter()
                .map(|v| [v.t.unwrap_or_default(), v.x, v.y])
                .collect(),
            score: player.score,
            color: player.color_rgb(),
            invincible: player.is_invincible(),
        }
    }
}

impl From<&Food> for FoodWire {
    fn from(food: &Food) -> Self {
        Self {
            x: food.x,
            y: food.y,
            r: food.r,
            dx: food.dx,
            dy: food.dy,
            color: food.color,
        }
    }
}

impl From<&Event> for EventWire {
    fn from(event: &Event) -> Self {
        Self {
            x: event.x,
            y: event.y,
            score: event.score,
            player_name: event.player_name.clone(),
        }
    }
}

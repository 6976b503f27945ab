/// RGB color with components in [0, 1]
pub type Color = (f64, f64, f64);

/// Gameplay tuning shared by the simulation and the client.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../static/generated/")]
pub struct GameConfig {
    /// Largest per-move displacement that still extends the trail
    pub max_move_speed: f64,
    /// How long a trail point survives (seconds)
    pub tail_lifespan: f64,
    pub min_foods: usize,
    pub player_radius: f64,
    pub food_radius: f64,
    pub food_speed_min: f64,
    /// Random extra speed on top of `food_speed_min`
    pub food_speed_range: f64,
    pub food_color: Color,
    pub invincibility_secs: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_move_speed: 0.1,
            tail_lifespan: 1.0,
            min_foods: 10,
            player_radius: 0.015,
            food_radius: 0.01,
            food_speed_min: 0.01,
            food_speed_range: 0.02,
            food_color: (0.3, 0.3, 0.3),
            invincibility_secs: 3.0,
        }
    }
}

impl GameConfig {
    pub fn max_move_speed2(&self) -> f64 {
        self.max_move_speed * self.max_move_speed
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.max_move_speed.is_finite() || self.max_move_speed <= 0.0 {
            return Err("max_move_speed must be finite and > 0".to_string());
        }
        if !self.tail_lifespan.is_finite() || self.tail_lifespan <= 0.0 {
            return Err("tail_lifespan must be finite and > 0".to_string());
        }
        if self.min_foods == 0 {
            return Err("min_foods must be >= 1".to_string());
        }
        if !self.player_radius.is_finite() || self.player_radius <= 0.0 {
            return Err("player_radius must be finite and > 0".to_string());
        }
        if !self.food_radius.is_finite() || self.food_radius <= 0.0 {
            return Err("food_radius must be finite and > 0".to_string());
        }
        if !self.food_speed_min.is_finite() || self.food_speed_min < 0.0 {
            return Err("food_speed_min must be finite and >= 0".to_string());
        }
        if !self.food_speed_range.is_finite() || self.food_speed_range < 0.0 {
            return Err("food_speed_range must be finite and >= 0".to_string());
        }
        if !self.invincibility_secs.is_finite() || self.invincibility_secs < 0.0 {
            return Err("invincibility_secs must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

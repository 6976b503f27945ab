use arena_shared::config::Color;

pub type FoodId = u64;

/// A drifting pickup that bounces around the unit square.
#[derive(Debug, Clone)]
pub struct Food {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: Color,
    last_update: f64,
}

impl Food {
    pub fn new(x: f64, y: f64, r: f64, dx: f64, dy: f64, color: Color, now: f64) -> Self {
        Self {
            x,
            y,
            r,
            dx,
            dy,
            color,
            last_update: now,
        }
    }

    /// Integrate by the real time elapsed since this food's last update,
    /// then reflect off any wall it reached.
    pub fn update(&mut self, now: f64) {
        let delta = now - self.last_update;
        self.last_update = now;

        self.x += self.dx * delta;
        self.y += self.dy * delta;

        if self.x <= 0.0 {
            self.x = 0.0;
            self.dx = -self.dx;
        }
        if self.y <= 0.0 {
            self.y = 0.0;
            self.dy = -self.dy;
        }
        if self.x >= 1.0 {
            self.x = 1.0;
            self.dx = -self.dx;
        }
        if self.y >= 1.0 {
            self.y = 1.0;
            self.dy = -self.dy;
        }
    }
}

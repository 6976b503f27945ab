use arena_shared::config::Color;
use arena_shared::geometry::{dist2, segment_intersection, Vertex};
use std::collections::VecDeque;

use crate::world::SessionId;

/// Fixed palette; new players get the least-used entry.
pub const PLAYER_COLORS: [Color; 10] = [
    (0.8, 0.0, 0.0),
    (0.5, 0.0, 0.0),
    (0.8, 0.5, 0.0),
    (0.0, 0.8, 0.0),
    (0.0, 0.5, 0.0),
    (0.0, 0.8, 0.8),
    (0.0, 0.5, 0.5),
    (0.0, 0.5, 0.8),
    (0.8, 0.0, 0.8),
    (0.5, 0.0, 0.5),
];

/// A player avatar and the trail it leaves behind.
#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    /// Session the player registered from; only used for delivery.
    pub session: SessionId,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    /// Index into `PLAYER_COLORS`
    pub color: usize,
    /// Past positions, newest first. Every entry carries a timestamp.
    pub trail: VecDeque<Vertex>,
    pub score: u32,
    pub invincible_until: Option<f64>,
}

impl Player {
    pub fn new(name: String, session: SessionId, x: f64, y: f64, r: f64, color: usize) -> Self {
        Self {
            name,
            session,
            x,
            y,
            r,
            color,
            trail: VecDeque::new(),
            score: 0,
            invincible_until: None,
        }
    }

    pub fn color_rgb(&self) -> Color {
        PLAYER_COLORS[self.color % PLAYER_COLORS.len()]
    }

    /// Invincibility is cleared lazily by `maintain`, so an expired window
    /// still protects until the next maintenance pass.
    pub fn is_invincible(&self) -> bool {
        self.invincible_until.is_some()
    }

    pub fn grant_invincibility(&mut self, now: f64, secs: f64) {
        self.invincible_until = Some(now + secs);
    }

    /// Apply a move and return the capture polygon if the move closed a loop.
    ///
    /// A move longer than `max_move_speed2` (squared) is a teleport and drops
    /// the whole trail. Otherwise the pre-move position is pushed onto the
    /// trail and the new segment is tested against older trail segments,
    /// newest first. The first hit wins: the polygon is every trail point
    /// newer than the hit segment followed by the intersection point, and the
    /// trail collapses to that intersection point.
    pub fn on_move(&mut self, x: f64, y: f64, now: f64, max_move_speed2: f64) -> Option<Vec<Vertex>> {
        if dist2(x, y, self.x, self.y) > max_move_speed2 {
            self.trail.clear();
        } else {
            self.trail.push_front(Vertex::at(self.x, self.y, now));
        }

        self.x = x;
        self.y = y;

        if self.trail.len() <= 3 {
            return None;
        }

        let from = self.trail[0];
        let to = Vertex::new(x, y);

        // Skip the segment starting at trail[0]: it shares an endpoint with the
        // move segment and would always "intersect" there.
        let mut hit = None;
        for i in 2..self.trail.len() {
            if let Some(p) = segment_intersection(from, to, self.trail[i - 1], self.trail[i]) {
                hit = Some((i, p));
                break;
            }
        }

        let (i, p) = hit?;
        let corner = Vertex::at(p.x, p.y, now);
        let mut polygon: Vec<Vertex> = self.trail.iter().take(i).copied().collect();
        polygon.push(corner);

        self.trail.clear();
        self.trail.push_front(corner);
        Some(polygon)
    }

    /// Per-tick upkeep: expire invincibility and drop trail points older
    /// than `tail_lifespan`.
    pub fn maintain(&mut self, now: f64, tail_lifespan: f64) {
        if self.invincible_until.is_some_and(|end| end <= now) {
            self.invincible_until = None;
        }

        let cutoff = now - tail_lifespan;
        let fresh = self
            .trail
            .partition_point(|v| v.t.is_some_and(|t| t >= cutoff));
        self.trail.truncate(fresh);
    }
}

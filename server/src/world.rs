use arena_shared::config::GameConfig;
use arena_shared::geometry::{dist2, point_in_polygon, Vertex};
use arena_shared::protocol::{EventWire, FoodWire, PlayerWire, SnapshotWire};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::food::{Food, FoodId};
use crate::player::{Player, PLAYER_COLORS};

/// Longest accepted player name, in characters
pub const MAX_NAME_LEN: usize = 32;

/// Opaque handle for a connected session, assigned by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    NameTaken,
    InvalidName,
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::NameTaken => {
                write!(f, "Another player with that name is already online.")
            }
            RegisterError::InvalidName => {
                write!(f, "Names must be 1 to {} characters long.", MAX_NAME_LEN)
            }
        }
    }
}

impl std::error::Error for RegisterError {}

/// A score change, reported once in the next snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub x: f64,
    pub y: f64,
    pub score: i64,
    pub player_name: String,
}

/// What `unregister` removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departed {
    Player(String),
    Watcher,
}

/// Seconds since the Unix epoch
pub fn wall_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Authoritative game state. Owned by the game loop task; nothing else
/// mutates it.
pub struct World {
    config: GameConfig,
    players: HashMap<String, Player>,
    foods: HashMap<FoodId, Food>,
    watchers: HashSet<SessionId>,
    next_food_id: FoodId,
    events: Vec<Event>,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(config: GameConfig, rng_seed: u64) -> Self {
        Self {
            config,
            players: HashMap::new(),
            foods: HashMap::new(),
            watchers: HashSet::new(),
            next_food_id: 0,
            events: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.get_mut(name)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn foods(&self) -> impl Iterator<Item = (FoodId, &Food)> {
        self.foods.iter().map(|(id, food)| (*id, food))
    }

    pub fn food_count(&self) -> usize {
        self.foods.len()
    }

    /// Events recorded since the last snapshot
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    /// Register a player at a random spawn point with the least-used color.
    pub fn register_player(&mut self, name: &str, session: SessionId) -> Result<(), RegisterError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(RegisterError::InvalidName);
        }
        if self.players.contains_key(name) {
            return Err(RegisterError::NameTaken);
        }

        let color = self.pick_color();
        let (x, y) = self.find_spawn_location();
        let player = Player::new(
            name.to_string(),
            session,
            x,
            y,
            self.config.player_radius,
            color,
        );
        self.players.insert(name.to_string(), player);
        Ok(())
    }

    pub fn register_watcher(&mut self, session: SessionId) {
        self.watchers.insert(session);
    }

    /// Remove whatever the session registered as.
    pub fn unregister(&mut self, session: SessionId) -> Option<Departed> {
        if self.watchers.remove(&session) {
            return Some(Departed::Watcher);
        }
        let name = self
            .players
            .values()
            .find(|p| p.session == session)
            .map(|p| p.name.clone())?;
        self.players.remove(&name);
        Some(Departed::Player(name))
    }

    /// Sessions that receive snapshots: every player and every watcher.
    pub fn recipients(&self) -> Vec<SessionId> {
        self.players
            .values()
            .map(|p| p.session)
            .chain(self.watchers.iter().copied())
            .collect()
    }

    /// Least-used palette entry, ties broken at random.
    fn pick_color(&mut self) -> usize {
        let mut counts = [0usize; PLAYER_COLORS.len()];
        for player in self.players.values() {
            counts[player.color % PLAYER_COLORS.len()] += 1;
        }
        let min = counts.iter().copied().min().unwrap_or(0);
        let candidates: Vec<usize> = (0..counts.len()).filter(|&i| counts[i] == min).collect();
        candidates.choose(&mut self.rng).copied().unwrap_or(0)
    }

    /// Uniform random point; not aware of players or food.
    pub fn find_spawn_location(&mut self) -> (f64, f64) {
        (self.rng.gen::<f64>(), self.rng.gen::<f64>())
    }

    pub fn add_food(&mut self, x: f64, y: f64, dx: f64, dy: f64, now: f64) -> FoodId {
        let id = self.next_food_id;
        self.next_food_id += 1;
        let food = Food::new(
            x,
            y,
            self.config.food_radius,
            dx,
            dy,
            self.config.food_color,
            now,
        );
        self.foods.insert(id, food);
        id
    }

    fn create_food(&mut self, now: f64) -> FoodId {
        let (x, y) = self.find_spawn_location();
        let speed = self.rng.gen::<f64>() * self.config.food_speed_range + self.config.food_speed_min;
        let angle = self.rng.gen::<f64>() * TAU;
        self.add_food(x, y, angle.sin() * speed, angle.cos() * speed, now)
    }

    /// Apply a move command. Unknown names are ignored.
    pub fn on_player_move(&mut self, name: &str, x: f64, y: f64, now: f64) {
        let max_move_speed2 = self.config.max_move_speed2();
        let Some(player) = self.players.get_mut(name) else {
            return;
        };
        if let Some(polygon) = player.on_move(x, y, now, max_move_speed2) {
            self.resolve_capture(name, &polygon, now);
        }
    }

    /// Score a capture polygon: enclosed food is eaten and enclosed rivals
    /// that are not invincible lose half their score.
    fn resolve_capture(&mut self, name: &str, polygon: &[Vertex], now: f64) {
        let mut event_score: i64 = 0;

        let before = self.foods.len();
        self.foods
            .retain(|_, food| !point_in_polygon(polygon, food.x, food.y));
        event_score += (before - self.foods.len()) as i64;

        let invincibility_secs = self.config.invincibility_secs;
        for (other_name, other) in self.players.iter_mut() {
            if other_name == name || other.is_invincible() {
                continue;
            }
            if !point_in_polygon(polygon, other.x, other.y) {
                continue;
            }
            event_score += 1;
            let new_score = other.score / 2;
            self.events.push(Event {
                x: other.x,
                y: other.y,
                score: new_score as i64 - other.score as i64,
                player_name: other_name.clone(),
            });
            other.score = new_score;
            other.grant_invincibility(now, invincibility_secs);
        }

        if event_score == 0 {
            return;
        }
        let Some(corner) = polygon.last() else {
            return;
        };
        if let Some(player) = self.players.get_mut(name) {
            player.score = player.score.saturating_add(event_score as u32);
            self.events.push(Event {
                x: corner.x,
                y: corner.y,
                score: event_score,
                player_name: name.to_string(),
            });
            tracing::debug!("{} captured {} points", name, event_score);
        }
    }

    /// One simulation step: entity upkeep, food top-up and player/food
    /// collisions. Food never ends a step below `min_foods`.
    pub fn update(&mut self, now: f64) {
        let tail_lifespan = self.config.tail_lifespan;
        for player in self.players.values_mut() {
            player.maintain(now, tail_lifespan);
        }
        for food in self.foods.values_mut() {
            food.update(now);
        }

        self.top_up_food(now);
        self.resolve_food_collisions(now);
        // Replace whatever the collisions ate
        self.top_up_food(now);
    }

    fn top_up_food(&mut self, now: f64) {
        while self.foods.len() < self.config.min_foods {
            self.create_food(now);
        }
    }

    /// Touching food costs a point (never below zero), destroys the food and
    /// makes the player briefly invincible.
    fn resolve_food_collisions(&mut self, now: f64) {
        let invincibility_secs = self.config.invincibility_secs;
        for (name, player) in self.players.iter_mut() {
            if player.is_invincible() {
                continue;
            }
            let touched: Vec<FoodId> = self
                .foods
                .iter()
                .filter(|(_, food)| {
                    let r = player.r + food.r;
                    dist2(player.x, player.y, food.x, food.y) < r * r
                })
                .map(|(id, _)| *id)
                .collect();

            for id in touched {
                let Some(food) = self.foods.remove(&id) else {
                    continue;
                };
                if player.score > 0 {
                    self.events.push(Event {
                        x: food.x,
                        y: food.y,
                        score: -1,
                        player_name: name.clone(),
                    });
                    player.score -= 1;
                }
                player.grant_invincibility(now, invincibility_secs);
            }
        }
    }

    /// Build the broadcast snapshot and drain pending events.
    pub fn snapshot(&mut self, now: f64) -> SnapshotWire {
        let events = std::mem::take(&mut self.events);
        SnapshotWire {
            server_time: now,
            players: self
                .players
                .iter()
                .map(|(name, p)| (name.clone(), PlayerWire::from(p)))
                .collect(),
            foods: self
                .foods
                .iter()
                .map(|(id, f)| (id.to_string(), FoodWire::from(f)))
                .collect(),
            events: events.iter().map(EventWire::from).collect(),
            tail_lifespan: self.config.tail_lifespan,
        }
    }
}

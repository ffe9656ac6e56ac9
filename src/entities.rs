//! Pooled game objects — the ship body, missiles and enemies.
//!
//! Every entity is allocated once at startup and recycled through its
//! `visible`/`disappear` flags; nothing in the per-frame path allocates.

use rand::Rng;

use crate::consts::{
    ENEMY_RADIUS, ENEMY_SPEED, HEIGHT, MISSILE_LENGTH, MISSILE_RADIUS_NORMAL, MISSILE_SPEED,
    TITLE_HEIGHT, WIDTH,
};
use crate::display::{Pen, Screen};

// ── Body — the shared positional base ────────────────────────────────────────

/// Positional state shared by the ship, missiles and enemies.
///
/// Positions are clamped into the play field after every move, so
/// `r <= x <= WIDTH - r` and `TITLE_HEIGHT + r <= y <= HEIGHT - r` hold at
/// all times.
#[derive(Clone, Debug)]
pub struct Body {
    pub x: i32,
    pub y: i32,
    pub r: i32,
    speed: i32,
    pub visible: bool,
    pub disappear: bool,
}

impl Body {
    pub fn new(speed: i32, radius: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            r: radius,
            speed,
            visible: false,
            disappear: false,
        }
    }

    /// Show or hide the object — only the flag changes.
    pub fn show(&mut self, flag: bool) {
        self.visible = flag;
    }

    /// Mark the object for erase-without-redraw on the next drawing turn.
    pub fn set_disappear(&mut self, flag: bool) {
        self.disappear = flag;
    }

    /// Update the speed and return the current value.
    ///
    /// Non-positive values leave the speed untouched, so `set_speed(0)`
    /// doubles as the peek query.
    pub fn set_speed(&mut self, spd: i32) -> i32 {
        if spd > 0 {
            self.speed = spd;
        }
        self.speed
    }

    /// Move relative to the current position; `dx`/`dy` are scaled by the
    /// current speed and the result is clamped into the field.
    pub fn move_rel(&mut self, dx: i32, dy: i32) {
        self.x += dx * self.speed;
        self.y += dy * self.speed;
        self.clamp();
    }

    /// Move to absolute coordinates, clamped into the field.
    pub fn move_abs(&mut self, px: i32, py: i32) {
        self.x = px;
        self.y = py;
        self.clamp();
    }

    fn clamp(&mut self) {
        if self.x < self.r {
            self.x = self.r;
        } else if self.x > WIDTH - self.r {
            self.x = WIDTH - self.r;
        }
        if self.y < TITLE_HEIGHT + self.r {
            self.y = TITLE_HEIGHT + self.r;
        } else if self.y > HEIGHT - self.r {
            self.y = HEIGHT - self.r;
        }
    }
}

// ── Missiles ──────────────────────────────────────────────────────────────────

/// Missile grade — determines collision radius and what a hit does next.
///
/// Normal disappears on first contact. Powered converts to Exploding on
/// first contact (blast radius, stays alive) and back to Normal-then-gone
/// on the second, so one powered shot can score two kills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    Normal,
    Powered,
    Exploding,
}

#[derive(Clone, Debug)]
pub struct Missile {
    pub body: Body,
    pub grade: Grade,
}

impl Missile {
    pub fn new() -> Self {
        Self {
            body: Body::new(MISSILE_SPEED, MISSILE_RADIUS_NORMAL),
            grade: Grade::Normal,
        }
    }

    /// Re-arm this slot at `(px, py)` — a no-op while the missile is still
    /// in flight (fixed-pool backpressure, not an error).
    pub fn fire(&mut self, px: i32, py: i32, grade: Grade) {
        if self.body.visible {
            return;
        }
        self.body.set_disappear(false);
        self.body.r = MISSILE_RADIUS_NORMAL;
        self.body.move_abs(px, py);
        self.body.set_speed(MISSILE_SPEED);
        self.grade = grade;
        self.body.show(true);
    }

    /// One frame: erase, honor the disappear flag, advance, redraw.
    pub fn draw(&mut self, screen: &mut dyn Screen) {
        if !self.body.visible {
            return;
        }
        screen.set_pen(Pen::Black);
        screen.circle(self.body.x, self.body.y, self.body.r);
        screen.pixel_span(self.body.x, self.body.y, MISSILE_LENGTH);
        if self.body.disappear {
            self.body.show(false);
            self.body.set_disappear(false);
            return;
        }

        // Exploding missiles hang in place; everything else flies right.
        let dx = if self.grade == Grade::Exploding { 0 } else { 1 };
        self.body.move_rel(dx, 0);
        if self.body.x >= WIDTH - self.body.r {
            self.body.set_disappear(true);
        } else {
            screen.set_pen(if self.grade == Grade::Normal {
                Pen::Cyan
            } else {
                Pen::Magenta
            });
            screen.circle(self.body.x, self.body.y, self.body.r);
            screen.pixel_span(self.body.x, self.body.y, MISSILE_LENGTH);
        }
    }
}

impl Default for Missile {
    fn default() -> Self {
        Self::new()
    }
}

// ── Enemies ───────────────────────────────────────────────────────────────────

/// Enemy model, re-rolled on every warp-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    Normal,
    UpgradeMissile,
    AddShip,
}

/// Per-tier model-draw divisors `(upg_missile, add_ship)`.
///
/// Both are prime, so on a uniform 0..100 draw their divisibility events
/// stay independent; lower tiers use larger primes and roll the bonus
/// models more rarely.
pub const MODEL_PRIMES: [(u32, u32); 4] = [(37, 47), (29, 37), (23, 29), (17, 23)];

impl Model {
    /// Weighted draw for `m` in 0..100 at the given difficulty tier.
    pub fn roll(tier: usize, m: u32) -> Model {
        let (upg, add) = MODEL_PRIMES[tier];
        if m % add == 0 {
            Model::AddShip
        } else if m % upg == 0 {
            Model::UpgradeMissile
        } else {
            Model::Normal
        }
    }

    pub fn pen(self) -> Pen {
        match self {
            Model::Normal => Pen::Red,
            Model::UpgradeMissile => Pen::Green,
            Model::AddShip => Pen::Yellow,
        }
    }

    /// Flat speed bonus on top of the base enemy speed.
    pub fn speed_bonus(self) -> i32 {
        match self {
            Model::Normal => 0,
            Model::UpgradeMissile => 1,
            Model::AddShip => 2,
        }
    }

    /// Score awarded for a kill.
    pub fn score(self) -> u32 {
        match self {
            Model::Normal => 5,
            Model::UpgradeMissile => 50,
            Model::AddShip => 100,
        }
    }

    /// Score penalty when the enemy escapes off the left edge.
    pub fn penalty(self) -> u32 {
        match self {
            Model::Normal => 3,
            Model::UpgradeMissile => 25,
            Model::AddShip => 50,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub body: Body,
    pub model: Model,
    warp_timer: i32,
    move_dir: (i32, i32),
    move_dir_change: i32,
}

impl Enemy {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut enemy = Self {
            body: Body::new(ENEMY_SPEED, ENEMY_RADIUS),
            model: Model::Normal,
            warp_timer: rng.gen_range(1..=10),
            move_dir: (-rng.gen_range(1..=3), rng.gen_range(-2..=2)),
            move_dir_change: rng.gen_range(1..=20),
        };
        enemy.set_model(0, rng);
        enemy
    }

    /// Re-roll the model for the given tier and take on its speed.
    pub fn set_model(&mut self, tier: usize, rng: &mut impl Rng) {
        let m = rng.gen_range(0..100);
        self.model = Model::roll(tier, m);
        self.body.set_speed(self.model.speed_bonus() + ENEMY_SPEED);
    }

    /// Tick the warp-in countdown while dormant. At zero the enemy re-rolls
    /// its model, materializes near the right edge and goes active; returns
    /// whether that happened so the wave can count the spawn.
    pub fn warp_out(&mut self, tier: usize, rng: &mut impl Rng) -> bool {
        if self.body.visible {
            return false;
        }
        self.body.set_disappear(false);
        self.warp_timer -= 1;
        if self.warp_timer <= 0 {
            self.set_model(tier, rng);
            let r = self.body.r;
            self.body.move_abs(
                WIDTH - r - rng.gen_range(0..=30),
                rng.gen_range(TITLE_HEIGHT + r..=HEIGHT - r),
            );
            self.body.show(true);
            self.warp_timer = rng.gen_range(1..=10);
            return true;
        }
        false
    }

    /// One frame: erase, honor the disappear flag, jitter and advance,
    /// mark an escape at the left boundary, redraw.
    pub fn draw(&mut self, screen: &mut dyn Screen, rng: &mut impl Rng) {
        if !self.body.visible {
            return;
        }
        screen.set_pen(Pen::Black);
        self.shape(screen);
        if self.body.disappear {
            self.body.show(false);
            self.body.set_disappear(false);
            return;
        }

        self.move_dir_change -= 1;
        if self.move_dir_change <= 0 {
            self.move_dir_change = rng.gen_range(1..=20);
            self.move_dir.1 = rng.gen_range(-2..=2);
        }
        let (dx, dy) = self.move_dir;
        self.body.move_rel(dx, dy);

        if self.body.x <= self.body.r {
            // Escaped — counts against the score, erased next turn.
            self.body.set_disappear(true);
        } else {
            screen.set_pen(self.model.pen());
            self.shape(screen);
        }
    }

    fn shape(&self, screen: &mut dyn Screen) {
        let (x, y, r) = (self.body.x, self.body.y, self.body.r);
        if self.model == Model::Normal {
            screen.circle(x, y, r);
        } else {
            screen.triangle(x - r, y, x + r, y - r, x + r, y + r);
        }
    }
}

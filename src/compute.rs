//! Game logic — wave control, the collision/scoring engine, the stage
//! presenter and the per-frame orchestrator.
//!
//! All randomness comes through an injected `Rng` and all drawing goes
//! through the `Screen` trait, so every path here runs under a seeded RNG
//! and a no-op screen in tests.

use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::consts::{
    ENEMY_POOL, ENEMY_SPEED, FINAL_STAGE, HEIGHT, MISSILE_LENGTH, MISSILE_POOL,
    MISSILE_RADIUS_POWERED, MISSILE_UPGRADE_COUNT, SHIPS_INIT, STAGE_ENEMIES, TITLE_HEIGHT, WIDTH,
};
use crate::display::{draw_ship, Pen, Screen, SHIP_ERASE, SHIP_PALETTES};
use crate::entities::{Body, Enemy, Grade, Missile, Model};

/// Difficulty tier for a stage number, clamped to the spawn-quota table.
pub fn tier_for(stage: u32) -> usize {
    (((stage.max(1) - 1) / 3) as usize).min(STAGE_ENEMIES.len() - 1)
}

// ── Enemy wave controller ─────────────────────────────────────────────────────

/// Owns the enemy pool, the difficulty tier and the per-stage spawn count.
pub struct EnemyWave {
    model: usize,
    generated: u32,
    pub enemies: Vec<Enemy>,
}

impl EnemyWave {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            model: 0,
            generated: 0,
            enemies: (0..ENEMY_POOL).map(|_| Enemy::new(rng)).collect(),
        }
    }

    /// Get or set the difficulty tier.
    pub fn set_model(&mut self, md: Option<usize>) -> usize {
        if let Some(md) = md {
            self.model = md.min(STAGE_ENEMIES.len() - 1);
        }
        self.model
    }

    /// Spawn quota for the current tier.
    pub fn quota(&self) -> u32 {
        STAGE_ENEMIES[self.model]
    }

    /// `generate(0)` resets the spawn counter (new stage or restart);
    /// `generate(n)` records n more spawns. Returns the current count.
    pub fn generate(&mut self, dn: u32) -> u32 {
        if dn == 0 {
            self.generated = 0;
        } else {
            self.generated += dn;
        }
        self.generated
    }

    /// One frame for the whole pool: warp dormant enemies in while the
    /// stage quota is unmet, then advance and redraw every enemy —
    /// already-active enemies keep moving once the quota is reached.
    pub fn draw(&mut self, screen: &mut dyn Screen, rng: &mut impl Rng) {
        for enemy in self.enemies.iter_mut() {
            if self.generated < STAGE_ENEMIES[self.model] && enemy.warp_out(self.model, rng) {
                self.generated += 1;
            }
            enemy.draw(screen, rng);
        }
    }
}

// ── Battle ship controller ────────────────────────────────────────────────────

/// The player entity plus its missile pool and the run state machine:
/// stage, score, lives, upgrade charge and the per-frame result flags.
pub struct BattleShip {
    pub body: Body,
    pub stage: u32,
    pub score: u32,
    pub score_max: u32,
    /// Lives remaining; 0 is game over, negative is the attract screen.
    pub ships: i32,
    pub missile_upgrade: u32,
    pub ship_destroyed: bool,
    pub go_to_next_stage: bool,
    pub missiles: Vec<Missile>,

    // Previous-frame sprite data, needed because only the delta region is
    // erased rather than the whole field.
    x_prev: i32,
    y_prev: i32,
    r_prev: i32,
    u_prev: u32,
}

impl BattleShip {
    pub fn new() -> Self {
        let mut body = Body::new(2, 10);
        body.x = 10;
        body.y = HEIGHT / 2;
        Self {
            body,
            stage: 1,
            score: 0,
            score_max: 0,
            ships: SHIPS_INIT,
            missile_upgrade: 0,
            ship_destroyed: false,
            go_to_next_stage: false,
            missiles: (0..MISSILE_POOL).map(|_| Missile::new()).collect(),
            x_prev: -1,
            y_prev: -1,
            r_prev: 0,
            u_prev: 0,
        }
    }

    /// Restart the run at `new_stage` — honored only when the ship is out
    /// of lives or the final stage has been cleared; rejected calls return
    /// false and change nothing.
    ///
    /// Stage 1 is a full run reset (score and lives included). On
    /// acceptance the caller is expected to clear the field.
    pub fn restart(&mut self, wave: &mut EnemyWave, new_stage: u32) -> bool {
        if self.ships > 0 && self.stage <= FINAL_STAGE {
            return false;
        }

        if self.score > self.score_max {
            self.score_max = self.score;
        }

        self.ship_destroyed = false;
        self.go_to_next_stage = false;
        self.missile_upgrade = 0;
        self.stage = new_stage;
        if new_stage == 1 {
            self.score = 0;
            self.ships = SHIPS_INIT;
        }
        self.body.set_disappear(false);
        self.body.show(true);

        for missile in self.missiles.iter_mut() {
            missile.body.show(false);
            missile.body.set_disappear(true);
        }

        wave.set_model(Some(tier_for(new_stage)));
        wave.generate(0);
        for enemy in wave.enemies.iter_mut() {
            enemy.body.show(false);
            enemy.body.set_disappear(true);
        }
        true
    }

    /// Fire from the first free missile slot; Powered while an upgrade
    /// charge is banked (consuming one unit). No-op while the player is
    /// hidden or the pool is full.
    pub fn fire(&mut self) {
        if !self.body.visible {
            return;
        }
        if let Some(missile) = self.missiles.iter_mut().find(|m| !m.body.visible) {
            let (x, y) = (self.body.x + self.body.r, self.body.y);
            if self.missile_upgrade == 0 {
                missile.fire(x, y, Grade::Normal);
            } else {
                missile.fire(x, y, Grade::Powered);
                self.missile_upgrade -= 1;
            }
        }
    }

    /// The per-frame rules engine. Returns true when the run just ended
    /// (last life lost).
    pub fn check_collisions(&mut self, wave: &mut EnemyWave) -> bool {
        let mut active_enemies = 0;
        for i in 0..wave.enemies.len() {
            // Escaped enemies (marked last turn, still at the left edge)
            // are penalized before they get erased.
            if wave.enemies[i].body.disappear {
                if wave.enemies[i].body.x <= wave.enemies[i].body.r {
                    self.score = self.score.saturating_sub(wave.enemies[i].model.penalty());
                }
                continue;
            }
            if !wave.enemies[i].body.visible {
                continue;
            }

            // Stage speed ramp: once the speed has decayed to base, boost
            // by stage/3 from stage 2 onward.
            let spd = wave.enemies[i].body.set_speed(0);
            if self.stage > 1 && spd == ENEMY_SPEED {
                wave.enemies[i]
                    .body
                    .set_speed(ENEMY_SPEED + (self.stage / 3) as i32);
            }

            active_enemies += 1;

            // Missiles test against the enemy with the tracer tip, one hit
            // per enemy per frame.
            for missile in self.missiles.iter_mut() {
                if !missile.body.visible {
                    continue;
                }
                let enemy = &wave.enemies[i].body;
                let mx = missile.body.x + MISSILE_LENGTH;
                let rsum = enemy.r + missile.body.r;
                let (dx, dy) = (enemy.x - mx, enemy.y - missile.body.y);
                if dx * dx + dy * dy < rsum * rsum {
                    self.score += wave.enemies[i].model.score();
                    match wave.enemies[i].model {
                        Model::AddShip => {
                            if self.ships < SHIPS_INIT {
                                self.ships += 1;
                            }
                        }
                        Model::UpgradeMissile => {
                            self.missile_upgrade += MISSILE_UPGRADE_COUNT;
                        }
                        Model::Normal => {}
                    }
                    wave.enemies[i].body.set_disappear(true);

                    match missile.grade {
                        Grade::Powered => {
                            missile.body.r = MISSILE_RADIUS_POWERED;
                            missile.grade = Grade::Exploding;
                        }
                        Grade::Exploding => {
                            missile.grade = Grade::Normal;
                            missile.body.set_disappear(true);
                        }
                        Grade::Normal => {
                            missile.body.set_disappear(true);
                        }
                    }
                    break;
                }
            }
            if wave.enemies[i].body.disappear {
                continue;
            }

            // Enemy against the battle ship.
            let enemy = &wave.enemies[i].body;
            let rsum = enemy.r + self.body.r;
            let (dx, dy) = (enemy.x - self.body.x, enemy.y - self.body.y);
            if dx * dx + dy * dy < rsum * rsum {
                self.ships -= 1;
                if self.ships > 0 {
                    self.ship_destroyed = true;
                    for enemy in wave.enemies.iter_mut() {
                        enemy.body.set_disappear(true);
                        enemy.body.show(false);
                    }
                    return false;
                }

                // Last life gone.
                self.body.set_disappear(true);
                self.ships = 0;
                for missile in self.missiles.iter_mut() {
                    if missile.body.visible {
                        missile.body.set_disappear(true);
                    }
                }
                return true;
            }
        }

        // Quota spawned, field empty, ship intact: stage cleared.
        if wave.generated >= wave.quota() && active_enemies == 0 && !self.ship_destroyed {
            self.go_to_next_stage = true;
        }
        false
    }

    /// One frame: advance the missiles, erase the previous sprite, honor
    /// the disappear flag, redraw and cache the new previous-frame data.
    pub fn draw(&mut self, screen: &mut dyn Screen) {
        if !self.body.visible {
            return;
        }
        for missile in self.missiles.iter_mut() {
            missile.draw(screen);
        }

        if self.r_prev > 0 {
            draw_ship(screen, self.x_prev, self.y_prev, self.r_prev, self.u_prev, &SHIP_ERASE);
        }
        if self.body.disappear {
            self.body.show(false);
            return;
        }

        let pens = &SHIP_PALETTES[self.ships.clamp(0, 3) as usize];
        draw_ship(
            screen,
            self.body.x,
            self.body.y,
            self.body.r,
            self.missile_upgrade,
            pens,
        );
        self.x_prev = self.body.x;
        self.y_prev = self.body.y;
        self.r_prev = self.body.r;
        self.u_prev = self.missile_upgrade;
    }
}

impl Default for BattleShip {
    fn default() -> Self {
        Self::new()
    }
}

// ── Stage presenter ───────────────────────────────────────────────────────────

struct Star {
    x: i32,
    y: i32,
    speed: i32,
}

/// Starfield backdrop plus the status line; reads ship state only.
pub struct StageView {
    stars: Vec<Star>,
    hud_prev: String,
}

impl StageView {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            stars: (0..20)
                .map(|_| Star {
                    x: rng.gen_range(1..=WIDTH - 1),
                    y: rng.gen_range(TITLE_HEIGHT..HEIGHT),
                    speed: rng.gen_range(1..=3),
                })
                .collect(),
            hud_prev: String::new(),
        }
    }

    /// Clear the whole field.
    pub fn clear(&mut self, screen: &mut dyn Screen) {
        screen.set_pen(Pen::Black);
        screen.clear();
        self.hud_prev.clear();
    }

    /// Scroll the starfield and refresh the status line.
    pub fn draw(&mut self, screen: &mut dyn Screen, ship: &BattleShip) {
        if !self.hud_prev.is_empty() {
            screen.set_pen(Pen::Black);
            screen.text(&self.hud_prev, 0, 0, WIDTH, 2);
        }

        for star in self.stars.iter_mut() {
            screen.set_pen(Pen::Black);
            screen.pixel(star.x, star.y);
            star.x = (star.x - star.speed).rem_euclid(WIDTH);
            screen.set_pen(Pen::White);
            screen.pixel(star.x, star.y);
        }

        let stage = if ship.stage <= FINAL_STAGE {
            ship.stage.to_string()
        } else {
            "CL".to_string()
        };
        self.hud_prev = format!("STAGE {}  LEFT={}  SC={}", stage, ship.ships, ship.score);
        screen.set_pen(Pen::White);
        screen.text(&self.hud_prev, 0, 0, WIDTH, 2);
    }
}

// ── Frame orchestrator ────────────────────────────────────────────────────────

/// Movement, fire and restart requests crossing from the input core to the
/// render core. Draining these once per frame is the only hand-off point,
/// so each game-state field keeps a single writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    MoveUp,
    MoveDown,
    Fire,
    Restart,
}

/// Owns the whole simulation and runs it one frame per call; hosted on the
/// render core by the worker primitive.
pub struct Game {
    pub stage_view: StageView,
    pub ship: BattleShip,
    pub wave: EnemyWave,
    commands: Receiver<Command>,
    /// One tick of the blocking banner countdowns (zero in tests).
    pub banner_delay: Duration,
    /// Fixed pacing sleep at the end of every frame (zero in tests).
    pub frame_delay: Duration,
}

impl Game {
    pub fn new(commands: Receiver<Command>, rng: &mut impl Rng) -> Self {
        let mut ship = BattleShip::new();
        ship.body.set_speed(3);
        // Boot into the attract screen.
        ship.ships = -1;
        Self {
            stage_view: StageView::new(rng),
            ship,
            wave: EnemyWave::new(rng),
            commands,
            banner_delay: Duration::from_secs(1),
            frame_delay: Duration::from_millis(10),
        }
    }

    /// Run one full frame: drain input commands, step the state machine,
    /// present.
    pub fn frame(&mut self, screen: &mut dyn Screen, rng: &mut impl Rng) {
        while let Ok(cmd) = self.commands.try_recv() {
            match cmd {
                Command::MoveUp => self.ship.body.move_rel(0, -1),
                Command::MoveDown => self.ship.body.move_rel(0, 1),
                Command::Fire => self.ship.fire(),
                Command::Restart => {
                    if self.ship.restart(&mut self.wave, 1) {
                        self.stage_view.clear(screen);
                    }
                }
            }
        }

        if self.ship.ships > 0 {
            if self.ship.go_to_next_stage {
                if self.ship.stage >= FINAL_STAGE {
                    self.draw_cleared(screen, rng);
                } else {
                    self.banner(screen, "STAGE CLR", Pen::Cyan);
                    self.ship.stage += 1;
                    self.ship.go_to_next_stage = false;
                    let tier = tier_for(self.ship.stage);
                    self.wave.set_model(Some(tier));
                    self.wave.generate(0);
                    self.stage_view.clear(screen);
                }
            } else if self.ship.ship_destroyed {
                self.banner(screen, "DESTROYED", Pen::Yellow);
                self.ship.ship_destroyed = false;
                self.stage_view.clear(screen);
            } else {
                self.ship.check_collisions(&mut self.wave);
                self.stage_view.draw(screen, &self.ship);
                self.wave.draw(screen, rng);
                self.ship.draw(screen);
            }
        } else if self.ship.ships == 0 {
            self.draw_game_over(screen, rng);
        } else {
            self.draw_attract(screen);
        }

        if let Err(e) = screen.present() {
            log::warn!("present failed: {e}");
        }
        if !self.frame_delay.is_zero() {
            thread::sleep(self.frame_delay);
        }
    }

    /// Blocking three-tick countdown banner; stalls this core only.
    fn banner(&self, screen: &mut dyn Screen, label: &str, pen: Pen) {
        for i in (1..=3).rev() {
            let msg = format!("{}{}", label, ".".repeat(i));
            screen.set_pen(pen);
            screen.text(&msg, 12, 50, WIDTH, 3);
            if let Err(e) = screen.present() {
                log::warn!("present failed: {e}");
            }
            if !self.banner_delay.is_zero() {
                thread::sleep(self.banner_delay);
            }
            screen.set_pen(Pen::Black);
            screen.text(&msg, 12, 50, WIDTH, 3);
        }
    }

    fn draw_high_score(&self, screen: &mut dyn Screen) {
        if self.ship.score > self.ship.score_max {
            screen.set_pen(Pen::Magenta);
            screen.text("HIGH SCORE!!", 22, 67, WIDTH, 3);
        } else {
            screen.set_pen(Pen::Cyan);
            let msg = format!("HIGH-SC={}", self.ship.score_max);
            screen.text(&msg, 15, 73, WIDTH, 2);
        }
        screen.set_pen(Pen::Green);
        screen.text("ENTER: REPLAY", 30, 111, WIDTH, 2);
    }

    /// Terminal run-cleared screen; the stage sticks at FINAL_STAGE + 1 so
    /// only a restart gets out of here.
    fn draw_cleared(&mut self, screen: &mut dyn Screen, rng: &mut impl Rng) {
        self.ship.stage = FINAL_STAGE + 1;
        self.stage_view.draw(screen, &self.ship);
        self.wave.draw(screen, rng);
        screen.set_pen(Pen::Green);
        screen.text("GAME CLEAR", 0, 20, WIDTH, 4);
        self.draw_high_score(screen);
    }

    fn draw_game_over(&mut self, screen: &mut dyn Screen, rng: &mut impl Rng) {
        self.stage_view.draw(screen, &self.ship);
        self.wave.draw(screen, rng);
        screen.set_pen(Pen::Yellow);
        screen.text("GAME OVER", 15, 20, WIDTH, 4);
        self.draw_high_score(screen);
    }

    fn draw_attract(&mut self, screen: &mut dyn Screen) {
        self.stage_view.draw(screen, &self.ship);
        screen.set_pen(Pen::Black);
        screen.rectangle(0, 0, WIDTH, TITLE_HEIGHT);
        screen.set_pen(Pen::Yellow);
        screen.text("--ASTEROID RUSH--", 18, 2, WIDTH, 2);
        screen.set_pen(Pen::Red);
        screen.text("UP: MOVE UP", 15, 30, WIDTH, 2);
        screen.text("DOWN: MOVE DOWN", 15, 54, WIDTH, 2);
        screen.text("SPACE: FIRE MISSILE", 15, 78, WIDTH, 2);
        screen.set_pen(Pen::Green);
        screen.text("ENTER: PLAY", 15, 105, WIDTH, 2);
    }
}

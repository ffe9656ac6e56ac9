//! Asteroid Rush — a two-thread arcade shooter for the terminal.
//!
//! Core modules:
//! - `entities`: pooled game objects (ship body, missiles, enemies)
//! - `compute`: wave control, collision/scoring engine, frame orchestrator
//! - `display`: pen palette, the `Screen` contract and its crossterm backend
//! - `worker`: the rebindable background task host driving the render thread

pub mod compute;
pub mod display;
pub mod entities;
pub mod worker;

/// Field geometry and game balance constants.
pub mod consts {
    /// Play field width in pixels.
    pub const WIDTH: i32 = 240;
    /// Play field height in pixels.
    pub const HEIGHT: i32 = 135;
    /// Rows reserved at the top for the status line; entity Y-clamping
    /// never lets an object enter this band.
    pub const TITLE_HEIGHT: i32 = 20;

    /// Last playable stage; `stage > FINAL_STAGE` means the run is cleared.
    pub const FINAL_STAGE: u32 = 9;
    /// Lives at the start of a run, and the cap AddShip kills restore to.
    pub const SHIPS_INIT: i32 = 3;

    pub const MISSILE_RADIUS_NORMAL: i32 = 2;
    /// Collision radius of a powered missile after its first hit.
    pub const MISSILE_RADIUS_POWERED: i32 = 15;
    pub const MISSILE_SPEED: i32 = 5;
    /// Length of the drawn tracer; collisions use the tracer tip.
    pub const MISSILE_LENGTH: i32 = 10;
    /// Charge units banked per UpgradeMissile kill.
    pub const MISSILE_UPGRADE_COUNT: u32 = 5;
    /// Fixed missile pool size — firing with all slots visible is a no-op.
    pub const MISSILE_POOL: usize = 3;

    /// Enemies to spawn per stage, indexed by difficulty tier.
    pub const STAGE_ENEMIES: [u32; 4] = [50, 100, 150, 200];
    pub const ENEMY_RADIUS: i32 = 5;
    pub const ENEMY_SPEED: i32 = 1;
    /// Fixed enemy pool size.
    pub const ENEMY_POOL: usize = 5;
}

//! Player characters.
//!
//! A character reads the input tracker once per frame, moves over the ground
//! plane and picks the clip it should be showing. The secondary action
//! (right click) toggles the archer between standing and aiming; each toggle
//! plays a one-shot clip and schedules the looping clip that follows it.

use std::time::Duration;

use archer_shared::{
    config::GameConfig,
    math::{Vec2, Vec3},
    render::AnimationBackend,
    resources::AssetLoadState,
};
use tracing::{debug, info};

use crate::{
    anim::{select_clip, Clip, ClipPlayer},
    input::InputTracker,
    timers::Timers,
};

/// What the frame loop needs from a player character.
pub trait Character {
    /// Advances one frame.
    fn update(&mut self, input: &InputTracker, dt: Duration);
    /// Secondary pointer button.
    fn on_secondary_action(&mut self);
    /// Hands over the readiness of the character's model and clips.
    fn on_assets_ready(&mut self, assets: AssetLoadState);
    fn transform(&self) -> Vec3;
    fn is_aiming(&self) -> bool;
    fn current_clip(&self) -> Option<Clip>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Idle,
    Aiming,
}

impl Stance {
    fn toggled(self) -> Self {
        match self {
            Stance::Idle => Stance::Aiming,
            Stance::Aiming => Stance::Idle,
        }
    }
}

/// Looping clip owed once a toggle's one-shot has had its time.
#[derive(Debug, Clone, Copy)]
struct FollowUp {
    clip: Clip,
    stance: Stance,
    epoch: u64,
}

/// The bow-wielding player character.
pub struct Archer<A> {
    position: Vec3,
    move_speed: f32,
    stance: Stance,

    normal_speed: f32,
    aim_speed: f32,
    draw_delay: Duration,
    recoil_delay: Duration,

    /// Time accumulated from frame deltas.
    clock: Duration,
    /// Bumped on every toggle; follow-ups from older toggles are stale.
    epoch: u64,
    /// A toggle's one-shot is on screen and per-frame selection must wait.
    holding_one_shot: bool,
    follow_ups: Timers<FollowUp>,
    clips: ClipPlayer<A>,
}

impl<A: AnimationBackend> Archer<A> {
    pub fn new(cfg: &GameConfig, animator: A) -> Self {
        Self {
            position: Vec3::ZERO,
            move_speed: cfg.normal_speed,
            stance: Stance::Idle,
            normal_speed: cfg.normal_speed,
            aim_speed: cfg.aim_speed,
            draw_delay: cfg.draw_delay(),
            recoil_delay: cfg.recoil_delay(),
            clock: Duration::ZERO,
            epoch: 0,
            holding_one_shot: false,
            follow_ups: Timers::new(),
            clips: ClipPlayer::new(animator),
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn assets(&self) -> &AssetLoadState {
        self.clips.assets()
    }

    /// The engine animator, for inspection.
    pub fn animator(&self) -> &A {
        self.clips.backend()
    }

    /// Follow-up clips still waiting on the clock, stale ones included.
    pub fn pending_follow_ups(&self) -> usize {
        self.follow_ups.len()
    }

    fn speed_for(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Idle => self.normal_speed,
            Stance::Aiming => self.aim_speed,
        }
    }

    /// Releases the one-shot hold once the latest toggle's follow-up is due.
    /// The clip comes from the decision table for this frame's direction; the
    /// scheduled clip only covers walking without aiming.
    fn fire_follow_ups(&mut self, dir: Vec2) {
        for follow_up in self.follow_ups.drain_due(self.clock) {
            if follow_up.epoch != self.epoch || follow_up.stance != self.stance {
                debug!(clip = follow_up.clip.name(), epoch = follow_up.epoch, "Dropping stale follow-up");
                continue;
            }
            self.holding_one_shot = false;
            let clip = select_clip(self.stance == Stance::Aiming, dir).unwrap_or(follow_up.clip);
            self.clips.play(clip);
        }
    }
}

impl<A: AnimationBackend> Character for Archer<A> {
    fn update(&mut self, input: &InputTracker, dt: Duration) {
        self.clock += dt;
        let dir = input.movement_direction();
        self.fire_follow_ups(dir);

        self.move_speed = self.speed_for(self.stance);
        if !dir.is_zero() {
            self.position = self.position.offset_ground(dir, self.move_speed);
        }

        if self.holding_one_shot || !self.clips.is_ready() {
            return;
        }
        if let Some(clip) = select_clip(self.stance == Stance::Aiming, dir) {
            self.clips.play(clip);
        }
    }

    fn on_secondary_action(&mut self) {
        self.stance = self.stance.toggled();
        self.move_speed = self.speed_for(self.stance);
        self.epoch += 1;
        self.holding_one_shot = true;

        let (one_shot, follow, delay) = match self.stance {
            Stance::Aiming => (Clip::Draw, Clip::AimOverdraw, self.draw_delay),
            Stance::Idle => (Clip::AimRecoil, Clip::Idle, self.recoil_delay),
        };
        info!(stance = ?self.stance, epoch = self.epoch, "Stance toggled");

        self.clips.play(one_shot);
        self.follow_ups.schedule_at(
            self.clock + delay,
            FollowUp {
                clip: follow,
                stance: self.stance,
                epoch: self.epoch,
            },
        );
    }

    fn on_assets_ready(&mut self, assets: AssetLoadState) {
        info!(clips = assets.clip_count(), "Character assets ready");
        self.clips.set_assets(assets);
        // Walking selects no clip, so a model arriving mid-walk starts on idle.
        if self.clips.current().is_none() && self.stance == Stance::Idle && !self.holding_one_shot {
            self.clips.play(Clip::Idle);
        }
    }

    fn transform(&self) -> Vec3 {
        self.position
    }

    fn is_aiming(&self) -> bool {
        self.stance == Stance::Aiming
    }

    fn current_clip(&self) -> Option<Clip> {
        self.clips.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archer_shared::resources::LoadedModel;

    #[derive(Default)]
    struct Recorder {
        starts: Vec<(&'static str, bool)>,
    }

    impl AnimationBackend for Recorder {
        fn start_clip(&mut self, clip: &str, looping: bool) {
            let name = Clip::from_name(clip).map_or("?", Clip::name);
            self.starts.push((name, looping));
        }
    }

    const FRAME: Duration = Duration::from_millis(100);

    fn loaded() -> AssetLoadState {
        AssetLoadState::from_model(&LoadedModel {
            name: "archer".into(),
            mesh_path: "archer.glb".into(),
            clips: Clip::ALL.iter().map(|c| c.name().to_string()).collect(),
        })
    }

    fn archer() -> Archer<Recorder> {
        let mut archer = Archer::new(&GameConfig::default(), Recorder::default());
        archer.on_assets_ready(loaded());
        archer
    }

    fn held(keys: &[&str]) -> InputTracker {
        let mut input = InputTracker::new();
        for key in keys {
            input.press(key);
        }
        input
    }

    fn run(archer: &mut Archer<Recorder>, input: &InputTracker, frames: u32) {
        for _ in 0..frames {
            archer.update(input, FRAME);
        }
    }

    fn starts_of(archer: &Archer<Recorder>, clip: Clip) -> usize {
        archer
            .animator()
            .starts
            .iter()
            .filter(|(name, _)| *name == clip.name())
            .count()
    }

    #[test]
    fn speed_follows_stance() {
        let cfg = GameConfig::default();
        let mut archer = archer();
        let idle = InputTracker::new();

        archer.update(&idle, FRAME);
        assert_eq!(archer.move_speed(), cfg.normal_speed);

        archer.on_secondary_action();
        archer.update(&idle, FRAME);
        assert!(archer.is_aiming());
        assert_eq!(archer.move_speed(), cfg.aim_speed);

        archer.on_secondary_action();
        archer.update(&idle, FRAME);
        assert_eq!(archer.move_speed(), cfg.normal_speed);
    }

    #[test]
    fn walking_forward_keeps_idle_clip() {
        let mut archer = archer().with_position(Vec3::new(0.0, 1.5, 0.0));
        archer.update(&InputTracker::new(), FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::Idle));

        let forward = held(&["w"]);
        run(&mut archer, &forward, 3);
        let pos = archer.transform();
        assert!((pos.z - 0.3).abs() < 1e-6);
        assert_eq!(pos.x, 0.0);
        assert_eq!(pos.y, 1.5);
        assert_eq!(archer.current_clip(), Some(Clip::Idle));
        assert_eq!(starts_of(&archer, Clip::Idle), 1);
    }

    #[test]
    fn repeated_frames_start_clip_once() {
        let mut archer = archer();
        run(&mut archer, &InputTracker::new(), 10);
        assert_eq!(archer.animator().starts, vec![("idle", true)]);
    }

    #[test]
    fn aiming_moves_slower() {
        let mut archer = archer();
        archer.on_secondary_action();
        archer.update(&held(&["d"]), FRAME);
        assert!((archer.transform().x - 0.05).abs() < 1e-6);
    }

    #[test]
    fn draw_then_overdraw_after_delay() {
        let mut archer = archer();
        let idle = InputTracker::new();
        archer.update(&idle, FRAME);

        archer.on_secondary_action();
        assert_eq!(archer.current_clip(), Some(Clip::Draw));

        // Draw holds for the whole delay.
        run(&mut archer, &idle, 9);
        assert_eq!(archer.current_clip(), Some(Clip::Draw));

        archer.update(&idle, FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::AimOverdraw));
        assert_eq!(
            archer.animator().starts,
            vec![("idle", true), ("draw", false), ("aim-overdraw", true)]
        );
    }

    #[test]
    fn aiming_walk_picks_direction_after_draw() {
        let mut archer = archer();
        archer.on_secondary_action();

        let forward = held(&["w"]);
        run(&mut archer, &forward, 9);
        assert_eq!(archer.current_clip(), Some(Clip::Draw));

        archer.update(&forward, FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::AimWalkForward));
        assert_eq!(
            archer.animator().starts,
            vec![("idle", true), ("draw", false), ("aim-walk-forward", true)]
        );

        archer.update(&held(&["s", "a"]), FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::AimWalkBack));

        archer.update(&held(&["a"]), FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::AimWalkLeft));
    }

    #[test]
    fn recoil_then_idle_after_delay() {
        let mut archer = archer();
        let idle = InputTracker::new();
        archer.on_secondary_action();
        run(&mut archer, &idle, 10);
        assert_eq!(archer.current_clip(), Some(Clip::AimOverdraw));

        archer.on_secondary_action();
        assert_eq!(archer.current_clip(), Some(Clip::AimRecoil));
        run(&mut archer, &idle, 4);
        assert_eq!(archer.current_clip(), Some(Clip::AimRecoil));
        archer.update(&idle, FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::Idle));
    }

    #[test]
    fn recoil_follow_up_plays_idle_even_while_walking() {
        let mut archer = archer();
        let forward = held(&["w"]);
        archer.on_secondary_action();
        run(&mut archer, &forward, 10);

        archer.on_secondary_action();
        run(&mut archer, &forward, 5);
        assert_eq!(archer.current_clip(), Some(Clip::Idle));
    }

    #[test]
    fn quick_retoggle_ignores_stale_follow_ups() {
        let mut archer = archer();
        let idle = InputTracker::new();
        archer.update(&idle, FRAME);

        // Aim, drop it and aim again inside the recoil window.
        archer.on_secondary_action();
        archer.update(&idle, FRAME);
        archer.on_secondary_action();
        archer.update(&idle, FRAME);
        archer.on_secondary_action();
        assert_eq!(archer.current_clip(), Some(Clip::Draw));
        let last_toggle = archer.clock();

        while archer.clock() < last_toggle + Duration::from_millis(900) {
            archer.update(&idle, FRAME);
            assert_eq!(archer.current_clip(), Some(Clip::Draw));
        }
        archer.update(&idle, FRAME);
        assert_eq!(archer.current_clip(), Some(Clip::AimOverdraw));

        assert_eq!(starts_of(&archer, Clip::Idle), 1);
        assert_eq!(starts_of(&archer, Clip::AimOverdraw), 1);
        assert_eq!(archer.pending_follow_ups(), 0);
    }

    #[test]
    fn assets_arriving_mid_walk_start_idle() {
        let mut archer = Archer::new(&GameConfig::default(), Recorder::default());
        let forward = held(&["w"]);
        run(&mut archer, &forward, 3);
        assert_eq!(archer.current_clip(), None);

        archer.on_assets_ready(loaded());
        run(&mut archer, &forward, 3);
        assert_eq!(archer.current_clip(), Some(Clip::Idle));
        assert_eq!(archer.animator().starts, vec![("idle", true)]);
    }

    #[test]
    fn assets_arriving_mid_draw_leave_the_follow_up_to_choose() {
        let mut archer = Archer::new(&GameConfig::default(), Recorder::default());
        let idle = InputTracker::new();
        archer.on_secondary_action();
        archer.on_assets_ready(loaded());
        assert_eq!(archer.current_clip(), None);

        run(&mut archer, &idle, 10);
        assert_eq!(archer.animator().starts, vec![("aim-overdraw", true)]);
    }

    #[test]
    fn no_assets_means_no_clip_starts() {
        let mut archer = Archer::new(&GameConfig::default(), Recorder::default());
        let forward = held(&["w"]);
        run(&mut archer, &forward, 5);
        archer.on_secondary_action();
        run(&mut archer, &forward, 20);
        archer.on_secondary_action();
        run(&mut archer, &forward, 20);

        assert!(!archer.is_aiming());
        assert!(archer.transform().z > 0.0);
        assert_eq!(archer.current_clip(), None);
        assert!(archer.animator().starts.is_empty());
    }
}

// animation.rs — per-dot shader uniforms, twinkle clock and pointer-driven extrusion

use glam::Vec3;
use std::time::{Duration, Instant};

// added to every u_time once per frame
pub const TWINKLE_STEP: f32 = 0.05;
pub const REST_EXTRUSION: f32 = 1.0;
pub const GRAB_EXTRUSION: f32 = 1.07;
// shortest time the globe stays extruded after a press
pub const MIN_GRAB: Duration = Duration::from_millis(500);

const EXTRUDE_DURATION: Duration = Duration::from_millis(500);
const RETRACT_DURATION: Duration = Duration::from_millis(200);

pub const COLOR_A: [f32; 3] = [0.196, 0.631, 0.886];
pub const COLOR_B: [f32; 3] = [0.192, 0.384, 0.498];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Uniform values of one dot material; laid out to be uploaded as instance data.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformSet {
    pub u_time: f32,
    pub u_max_extrusion: f32,
}

impl UniformSet {
    pub fn new(u_time: f32) -> Self {
        Self {
            u_time,
            u_max_extrusion: REST_EXTRUSION,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UniformArena {
    sets: Vec<UniformSet>,
}

impl UniformArena {
    pub fn push(&mut self, set: UniformSet) -> MaterialId {
        self.sets.push(set);
        MaterialId(self.sets.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> &UniformSet {
        &self.sets[id.0]
    }

    pub fn sets(&self) -> &[UniformSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn clear(&mut self) {
        self.sets.clear();
    }

    pub fn tick(&mut self) {
        for set in &mut self.sets {
            set.u_time += TWINKLE_STEP;
        }
    }

    pub fn set_max_extrusion(&mut self, value: f32) {
        for set in &mut self.sets {
            set.u_max_extrusion = value;
        }
    }
}

pub fn displace(position: Vec3, uniforms: UniformSet) -> Vec3 {
    if uniforms.u_max_extrusion > 1.0 {
        position * uniforms.u_max_extrusion + Vec3::splat(uniforms.u_time.sin())
    } else {
        position * uniforms.u_max_extrusion
    }
}

/// Fragment color of a dot at `u_time`; alpha is always 1.
pub fn twinkle_color(u_time: f32) -> [f32; 4] {
    let pct = u_time.sin().abs();
    let mix = |a: f32, b: f32| a + (b - a) * pct;
    [
        mix(COLOR_A[0], COLOR_B[0]),
        mix(COLOR_A[1], COLOR_B[1]),
        mix(COLOR_A[2], COLOR_B[2]),
        1.0,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabState {
    Idle,
    Pressed { until: Instant },
    PressedPastMinimum,
    // released early; retraction waits for `until`
    ReleasedPendingMinimum { until: Instant },
}

#[derive(Debug, Clone, Copy)]
struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
}

impl Tween {
    fn settled(value: f32, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            start: now,
            duration: Duration::ZERO,
        }
    }

    // power1.out
    fn value(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start);
        if elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.from + (self.to - self.from) * eased
    }
}

#[derive(Debug, Clone)]
pub struct ExtrusionController {
    state: GrabState,
    tween: Tween,
    animate: bool,
}

impl ExtrusionController {
    // animate = false steps straight to each target
    pub fn new(animate: bool, now: Instant) -> Self {
        Self {
            state: GrabState::Idle,
            tween: Tween::settled(REST_EXTRUSION, now),
            animate,
        }
    }

    pub fn state(&self) -> GrabState {
        self.state
    }

    pub fn is_grabbing(&self) -> bool {
        self.state != GrabState::Idle
    }

    pub fn target(&self) -> f32 {
        self.tween.to
    }

    pub fn value(&self, now: Instant) -> f32 {
        self.tween.value(now)
    }

    pub fn pointer_down(&mut self, now: Instant, over_globe: bool) {
        self.poll(now);
        if !over_globe {
            return;
        }
        self.retarget(GRAB_EXTRUSION, EXTRUDE_DURATION, now);
        self.state = GrabState::Pressed {
            until: now + MIN_GRAB,
        };
        log::debug!("extrusion pressed");
    }

    pub fn pointer_up(&mut self, now: Instant) {
        self.poll(now);
        match self.state {
            GrabState::Pressed { until } => {
                self.state = GrabState::ReleasedPendingMinimum { until };
            }
            GrabState::PressedPastMinimum => self.release(now),
            GrabState::Idle | GrabState::ReleasedPendingMinimum { .. } => {}
        }
    }

    pub fn poll(&mut self, now: Instant) {
        match self.state {
            GrabState::Pressed { until } if now >= until => {
                self.state = GrabState::PressedPastMinimum;
            }
            GrabState::ReleasedPendingMinimum { until } if now >= until => self.release(until),
            _ => {}
        }
    }

    pub fn update(&mut self, now: Instant, arena: &mut UniformArena) {
        self.poll(now);
        arena.set_max_extrusion(self.value(now));
    }

    fn release(&mut self, at: Instant) {
        self.retarget(REST_EXTRUSION, RETRACT_DURATION, at);
        self.state = GrabState::Idle;
        log::debug!("extrusion released");
    }

    fn retarget(&mut self, to: f32, duration: Duration, at: Instant) {
        self.tween = Tween {
            from: self.tween.value(at),
            to,
            start: at,
            duration: if self.animate { duration } else { Duration::ZERO },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn arena_of(n: usize) -> UniformArena {
        let mut arena = UniformArena::default();
        for i in 0..n {
            arena.push(UniformSet::new(i as f32));
        }
        arena
    }

    #[test]
    fn tick_accumulates_time() {
        let mut arena = arena_of(3);
        let initial = arena.get(MaterialId(2)).u_time;
        let mut expected = initial;
        for _ in 0..100 {
            arena.tick();
            expected += TWINKLE_STEP;
        }
        assert_eq!(arena.get(MaterialId(2)).u_time, expected);
        assert!((arena.get(MaterialId(2)).u_time - (initial + 100.0 * TWINKLE_STEP)).abs() < 1e-4);
        assert!(arena.sets().iter().all(|u| u.u_max_extrusion == REST_EXTRUSION));
    }

    #[test]
    fn quick_click_retracts_after_minimum() {
        let t0 = Instant::now();
        let mut arena = arena_of(4);
        let mut ctl = ExtrusionController::new(true, t0);

        ctl.pointer_down(t0, true);
        ctl.pointer_up(t0);
        assert!(matches!(ctl.state(), GrabState::ReleasedPendingMinimum { .. }));
        assert_eq!(ctl.target(), GRAB_EXTRUSION);

        ctl.update(t0 + ms(499), &mut arena);
        assert!(ctl.is_grabbing());
        assert!(arena.get(MaterialId(0)).u_max_extrusion > REST_EXTRUSION);

        ctl.update(t0 + ms(500), &mut arena);
        assert_eq!(ctl.state(), GrabState::Idle);
        assert_eq!(ctl.target(), REST_EXTRUSION);

        ctl.update(t0 + ms(700), &mut arena);
        assert!(arena.sets().iter().all(|u| u.u_max_extrusion == REST_EXTRUSION));
    }

    #[test]
    fn stepped_quick_click() {
        let t0 = Instant::now();
        let mut arena = arena_of(2);
        let mut ctl = ExtrusionController::new(false, t0);

        ctl.pointer_down(t0, true);
        ctl.update(t0, &mut arena);
        assert_eq!(arena.get(MaterialId(1)).u_max_extrusion, GRAB_EXTRUSION);

        ctl.pointer_up(t0);
        ctl.update(t0 + ms(250), &mut arena);
        assert_eq!(arena.get(MaterialId(1)).u_max_extrusion, GRAB_EXTRUSION);

        ctl.update(t0 + ms(500), &mut arena);
        assert_eq!(arena.get(MaterialId(1)).u_max_extrusion, REST_EXTRUSION);
    }

    #[test]
    fn long_hold_retracts_on_release() {
        let t0 = Instant::now();
        let mut ctl = ExtrusionController::new(false, t0);

        ctl.pointer_down(t0, true);
        ctl.poll(t0 + ms(800));
        assert_eq!(ctl.state(), GrabState::PressedPastMinimum);
        assert_eq!(ctl.value(t0 + ms(900)), GRAB_EXTRUSION);

        ctl.pointer_up(t0 + ms(1000));
        assert_eq!(ctl.state(), GrabState::Idle);
        assert_eq!(ctl.value(t0 + ms(1000)), REST_EXTRUSION);
    }

    #[test]
    fn late_release_after_deadline_retracts_immediately() {
        let t0 = Instant::now();
        let mut ctl = ExtrusionController::new(false, t0);

        ctl.pointer_down(t0, true);
        // no frame polled in between; release alone must observe the elapsed minimum
        ctl.pointer_up(t0 + ms(600));
        assert_eq!(ctl.state(), GrabState::Idle);
    }

    #[test]
    fn press_off_globe_is_ignored() {
        let t0 = Instant::now();
        let mut ctl = ExtrusionController::new(true, t0);

        ctl.pointer_down(t0, false);
        assert_eq!(ctl.state(), GrabState::Idle);
        ctl.pointer_up(t0 + ms(10));
        assert_eq!(ctl.value(t0 + ms(10)), REST_EXTRUSION);
    }

    #[test]
    fn repress_while_pending_rearms_timer() {
        let t0 = Instant::now();
        let mut ctl = ExtrusionController::new(false, t0);

        ctl.pointer_down(t0, true);
        ctl.pointer_up(t0 + ms(100));
        ctl.pointer_down(t0 + ms(300), true);
        ctl.poll(t0 + ms(600));
        assert_eq!(ctl.state(), GrabState::Pressed { until: t0 + ms(800) });
        assert_eq!(ctl.value(t0 + ms(600)), GRAB_EXTRUSION);
    }

    #[test]
    fn release_after_first_deadline_waits_for_repress_minimum() {
        let t0 = Instant::now();
        let mut ctl = ExtrusionController::new(false, t0);

        ctl.pointer_down(t0, true);
        ctl.pointer_up(t0 + ms(100));
        ctl.pointer_down(t0 + ms(300), true);

        // past the first press's deadline, short of the re-press one
        ctl.pointer_up(t0 + ms(600));
        assert_eq!(ctl.state(), GrabState::ReleasedPendingMinimum { until: t0 + ms(800) });
        assert_eq!(ctl.value(t0 + ms(700)), GRAB_EXTRUSION);

        ctl.poll(t0 + ms(800));
        assert_eq!(ctl.state(), GrabState::Idle);
        assert_eq!(ctl.value(t0 + ms(800)), REST_EXTRUSION);
    }

    #[test]
    fn tween_eases_toward_target() {
        let t0 = Instant::now();
        let mut ctl = ExtrusionController::new(true, t0);

        ctl.pointer_down(t0, true);
        let quarter = ctl.value(t0 + ms(125));
        let half = ctl.value(t0 + ms(250));
        assert!(quarter > REST_EXTRUSION && quarter < half);
        assert!(half < GRAB_EXTRUSION);
        assert_eq!(ctl.value(t0 + ms(500)), GRAB_EXTRUSION);
    }

    #[test]
    fn displacement_contract() {
        let p = Vec3::new(0.1, 0.0, 0.0);
        let rest = UniformSet { u_time: 1.3, u_max_extrusion: 1.0 };
        assert_eq!(displace(p, rest), p);

        let grabbed = UniformSet { u_time: 1.3, u_max_extrusion: 1.07 };
        let d = displace(p, grabbed);
        let s = 1.3f32.sin();
        assert!((d - Vec3::new(0.107 + s, s, s)).length() < 1e-6);
    }

    #[test]
    fn twinkle_mixes_between_colors() {
        assert_eq!(twinkle_color(0.0), [COLOR_A[0], COLOR_A[1], COLOR_A[2], 1.0]);

        let peak = twinkle_color(std::f32::consts::FRAC_PI_2);
        for c in 0..3 {
            assert!((peak[c] - COLOR_B[c]).abs() < 1e-6);
        }
        assert_eq!(twinkle_color(-std::f32::consts::FRAC_PI_2)[3], 1.0);
    }
}

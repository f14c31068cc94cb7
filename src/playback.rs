// --- File: playback.rs ---
// Timing state machine: decides per delivered frame how many generations to
// run, then always renders once.
use crate::config::SimulationConfig;
use crate::constants::*;
use crate::error::{SimError, SimResult};
use crate::grid::{CellState, Grid, InitialState};
use crate::substrate::Substrate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

pub type SimRng = StdRng;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackMode {
    Paused,
    Running,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ClockOutcome {
    pub due: u32,
    // Whole intervals dropped past MAX_CATCH_UP_STEPS
    pub discarded: u64,
}

// fps is always finite and positive; accumulated stays below one interval
// after every advance_clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    fps: f64,
    mode: PlaybackMode,
    accumulated: Duration,
}

impl PlaybackState {
    pub fn new(fps: f64, mode: PlaybackMode) -> SimResult<Self> {
        validate_rate(fps)?;
        Ok(Self {
            fps,
            mode,
            accumulated: Duration::ZERO,
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode == PlaybackMode::Running
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Saturates at `Duration::MAX` for rates too slow to represent.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.fps)
            .unwrap_or(Duration::MAX)
            .max(Duration::from_nanos(1))
    }

    /// Rejects non-positive rates, keeping the previous one.
    pub fn set_fps(&mut self, fps: f64) -> SimResult<()> {
        validate_rate(fps)?;
        self.fps = fps;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
        if mode == PlaybackMode::Paused {
            // Paused time is never replayed on resume
            self.accumulated = Duration::ZERO;
        }
    }

    /// Adds `elapsed` and consumes up to `MAX_CATCH_UP_STEPS` whole intervals.
    /// Any backlog beyond the cap is dropped, keeping only the fractional part.
    pub fn advance_clock(&mut self, elapsed: Duration) -> ClockOutcome {
        if !self.is_running() {
            self.accumulated = Duration::ZERO;
            return ClockOutcome::default();
        }

        self.accumulated = self.accumulated.saturating_add(elapsed);
        let interval = self.interval();

        let mut due = 0;
        while self.accumulated >= interval && due < MAX_CATCH_UP_STEPS {
            self.accumulated -= interval;
            due += 1;
        }

        let mut discarded = 0;
        if self.accumulated >= interval {
            let owed = self.accumulated.as_nanos();
            let step = interval.as_nanos();
            discarded = (owed / step) as u64;
            let rest = owed % step;
            self.accumulated =
                Duration::new((rest / 1_000_000_000) as u64, (rest % 1_000_000_000) as u32);
        }

        ClockOutcome { due, discarded }
    }
}

/// Step rates must be finite and positive.
pub fn validate_rate(fps: f64) -> SimResult<()> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(SimError::InvalidRate(fps));
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TickReport {
    pub steps: u32,
    pub discarded: u64,
}

// --- Playback Controller ---
pub struct PlaybackController<S: Substrate> {
    substrate: S,
    playback: PlaybackState,
    rng: SimRng,
    alive_probability: f64,
    generation: u64,
}

impl<S: Substrate> PlaybackController<S> {
    pub fn new(substrate: S, playback: PlaybackState, rng: SimRng, alive_probability: f64) -> Self {
        Self {
            substrate,
            playback,
            rng,
            alive_probability,
            generation: 0,
        }
    }

    pub fn from_config(substrate: S, config: &SimulationConfig) -> SimResult<Self> {
        let mode = if config.start_paused {
            PlaybackMode::Paused
        } else {
            PlaybackMode::Running
        };
        let playback = PlaybackState::new(config.fps, mode)?;
        let rng = match config.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        Ok(Self::new(substrate, playback, rng, config.alive_probability))
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.playback.is_running()
    }

    pub fn play(&mut self) {
        if !self.playback.is_running() {
            self.playback.set_mode(PlaybackMode::Running);
            log::info!("Simulation resumed");
        }
    }

    pub fn pause(&mut self) {
        if self.playback.is_running() {
            self.playback.set_mode(PlaybackMode::Paused);
            log::info!("Simulation paused at generation {}", self.generation);
        }
    }

    pub fn play_pause(&mut self) {
        if self.playback.is_running() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// One generation now, regardless of mode or timer.
    pub fn step_forward(&mut self) -> SimResult<()> {
        self.substrate.step()?;
        self.generation += 1;
        Ok(())
    }

    pub fn randomise_state(&mut self) -> SimResult<()> {
        let (width, height) = self.substrate.dimensions();
        let initial = InitialState::Random {
            alive_probability: self.alive_probability,
        };
        let grid = Grid::new(width, height, initial, &mut self.rng)?;
        self.substrate.load(&grid)?;
        self.generation = 0;
        log::info!("Grid randomised ({} cells alive)", grid.alive_count());
        Ok(())
    }

    pub fn reset_state(&mut self) -> SimResult<()> {
        let (width, height) = self.substrate.dimensions();
        self.substrate.load(&Grid::dead(width, height)?)?;
        self.generation = 0;
        log::info!("Grid cleared");
        Ok(())
    }

    /// Reset with new dimensions. On error the current grid is kept.
    pub fn resize_grid(&mut self, width: usize, height: usize) -> SimResult<()> {
        let grid = Grid::dead(width, height)?;
        self.substrate.load(&grid)?;
        self.generation = 0;
        Ok(())
    }

    pub fn update_fps(&mut self, fps: f64) -> SimResult<()> {
        self.playback.set_fps(fps)?;
        log::info!("Step rate set to {fps:.2}/s");
        Ok(())
    }

    /// Doubles or halves the step rate within `[MIN_FPS, MAX_FPS]`.
    pub fn adjust_fps(&mut self, increase: bool) -> SimResult<f64> {
        let fps = if increase {
            (self.playback.fps() * FPS_ADJUST_FACTOR).min(MAX_FPS)
        } else {
            (self.playback.fps() / FPS_ADJUST_FACTOR).max(MIN_FPS)
        };
        self.update_fps(fps)?;
        Ok(fps)
    }

    /// Manual edit path used by mouse painting.
    pub fn paint_cell(&mut self, x: usize, y: usize, state: CellState) -> SimResult<()> {
        self.substrate.set_cell(x as isize, y as isize, state)
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.substrate.resize_viewport(width, height);
    }

    /// One delivered frame: run the generations that are due, then render.
    pub fn tick(&mut self, elapsed: Duration) -> SimResult<TickReport> {
        let clock = self.playback.advance_clock(elapsed);
        for _ in 0..clock.due {
            self.substrate.step()?;
            self.generation += 1;
        }
        if clock.discarded > 0 {
            log::debug!(
                "Dropped {} overdue generations after a stall",
                clock.discarded
            );
        }
        self.substrate.render()?;
        Ok(TickReport {
            steps: clock.due,
            discarded: clock.discarded,
        })
    }
}
// --- End of File: playback.rs ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Palette;
    use crate::substrate::CpuSubstrate;

    const PALETTE: Palette = Palette {
        background: [0, 0, 0, 255],
        alive: [255, 255, 255, 255],
    };

    fn controller(grid: Grid, fps: f64, mode: PlaybackMode) -> PlaybackController<CpuSubstrate> {
        let substrate = CpuSubstrate::new(grid, (8, 8), PALETTE, 0.0);
        let playback = PlaybackState::new(fps, mode).unwrap();
        PlaybackController::new(substrate, playback, SimRng::seed_from_u64(5), 0.5)
    }

    fn blinker() -> Grid {
        Grid::from_alive(5, 5, &[(1, 2), (2, 2), (3, 2)]).unwrap()
    }

    #[test]
    fn test_play_pause_transitions() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Paused);
        ctl.pause();
        assert!(!ctl.is_running());
        ctl.play();
        assert!(ctl.is_running());
        ctl.play();
        assert!(ctl.is_running());
        ctl.play_pause();
        assert!(!ctl.is_running());
        ctl.play_pause();
        assert!(ctl.is_running());
    }

    #[test]
    fn test_step_forward_ignores_mode_and_timer() {
        let mut ctl = controller(blinker(), 1.0, PlaybackMode::Paused);
        ctl.step_forward().unwrap();
        assert!(!ctl.is_running());
        assert_eq!(ctl.generation(), 1);
        assert_eq!(ctl.substrate().grid().alive_cells(), vec![(2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn test_paused_tick_renders_without_stepping() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Paused);
        let report = ctl.tick(Duration::from_secs(5)).unwrap();
        assert_eq!(report.steps, 0);
        assert_eq!(ctl.substrate().steps_taken(), 0);
        assert_eq!(ctl.substrate().frames_rendered(), 1);
        assert_eq!(ctl.playback().accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_running_tick_keeps_fractional_time() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        assert_eq!(ctl.tick(Duration::from_millis(60)).unwrap().steps, 0);
        assert_eq!(ctl.tick(Duration::from_millis(60)).unwrap().steps, 1);
        assert_eq!(ctl.playback().accumulated(), Duration::from_millis(20));
        assert_eq!(ctl.tick(Duration::from_millis(250)).unwrap().steps, 2);
        assert_eq!(ctl.playback().accumulated(), Duration::from_millis(70));
        assert_eq!(ctl.generation(), 3);
        assert_eq!(ctl.substrate().frames_rendered(), 3);
    }

    #[test]
    fn test_catch_up_is_capped() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        ctl.update_fps(1000.0).unwrap();
        let report = ctl.tick(Duration::from_millis(1000)).unwrap();
        assert_eq!(report.steps, MAX_CATCH_UP_STEPS);
        assert_eq!(report.discarded, 1000 - MAX_CATCH_UP_STEPS as u64);
        assert!(ctl.playback().accumulated() < ctl.playback().interval());
        assert_eq!(ctl.substrate().steps_taken(), MAX_CATCH_UP_STEPS as u64);

        // Interval shorter than one frame still never exceeds the cap
        for _ in 0..10 {
            let report = ctl.tick(Duration::from_millis(16)).unwrap();
            assert!(report.steps <= MAX_CATCH_UP_STEPS);
        }
    }

    #[test]
    fn test_invalid_fps_keeps_previous_rate() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        assert_eq!(ctl.update_fps(-1.0), Err(SimError::InvalidRate(-1.0)));
        assert!(matches!(ctl.update_fps(0.0), Err(SimError::InvalidRate(_))));
        assert!(ctl.update_fps(f64::NAN).is_err());
        assert_eq!(ctl.playback().fps(), 10.0);
        // Still one step per 100ms
        assert_eq!(ctl.tick(Duration::from_millis(100)).unwrap().steps, 1);
    }

    #[test]
    fn test_extremely_slow_rates_tick_without_stepping() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        for fps in [1e-20, f64::MIN_POSITIVE, 5e-324] {
            ctl.update_fps(fps).unwrap();
            assert_eq!(ctl.playback().interval(), Duration::MAX);
            let report = ctl.tick(Duration::from_millis(16)).unwrap();
            assert_eq!(report.steps, 0);
            assert_eq!(ctl.playback().accumulated(), Duration::from_millis(16));
            ctl.pause();
            ctl.play();
        }
        assert_eq!(ctl.generation(), 0);
    }

    #[test]
    fn test_huge_elapsed_at_slow_rate_is_bounded() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        ctl.update_fps(1e-12).unwrap();
        let report = ctl.tick(Duration::MAX).unwrap();
        assert!(report.steps <= MAX_CATCH_UP_STEPS);
        assert!(ctl.playback().accumulated() < ctl.playback().interval());
    }

    #[test]
    fn test_pause_then_zero_elapsed_ticks_do_not_advance() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Paused);
        ctl.play();
        ctl.pause();
        let before = ctl.substrate().grid().clone();
        for _ in 0..20 {
            ctl.tick(Duration::ZERO).unwrap();
        }
        assert_eq!(ctl.substrate().grid(), &before);
        assert_eq!(ctl.generation(), 0);
        assert_eq!(ctl.substrate().frames_rendered(), 20);
    }

    #[test]
    fn test_pause_discards_accumulated_time() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        ctl.tick(Duration::from_millis(90)).unwrap();
        ctl.pause();
        ctl.play();
        assert_eq!(ctl.tick(Duration::from_millis(20)).unwrap().steps, 0);
    }

    #[test]
    fn test_reset_is_a_fixed_point() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        ctl.reset_state().unwrap();
        assert!(ctl.is_running());
        for _ in 0..5 {
            ctl.step_forward().unwrap();
        }
        assert_eq!(ctl.substrate().grid().alive_count(), 0);
    }

    #[test]
    fn test_randomise_keeps_mode_and_rate() {
        let mut ctl = controller(Grid::dead(16, 16).unwrap(), 7.0, PlaybackMode::Paused);
        ctl.step_forward().unwrap();
        ctl.randomise_state().unwrap();
        assert!(!ctl.is_running());
        assert_eq!(ctl.playback().fps(), 7.0);
        assert_eq!(ctl.generation(), 0);
        assert_eq!(ctl.substrate().dimensions(), (16, 16));
        assert!(ctl.substrate().grid().alive_count() > 0);
    }

    #[test]
    fn test_l_shape_scenario() {
        let mut ctl = controller(Grid::dead(4, 4).unwrap(), 10.0, PlaybackMode::Paused);
        for (x, y) in [(1, 1), (1, 2), (2, 1)] {
            ctl.paint_cell(x, y, CellState::Alive).unwrap();
        }
        ctl.step_forward().unwrap();
        assert_eq!(
            ctl.substrate().grid().alive_cells(),
            vec![(1, 1), (2, 1), (1, 2), (2, 2)]
        );
    }

    #[test]
    fn test_resize_grid_rejects_zero() {
        let mut ctl = controller(blinker(), 10.0, PlaybackMode::Running);
        let err = ctl.resize_grid(0, 5).unwrap_err();
        assert_eq!(err, SimError::InvalidDimensions { width: 0, height: 5 });
        assert_eq!(ctl.substrate().grid(), &blinker());

        ctl.resize_grid(9, 3).unwrap();
        assert_eq!(ctl.substrate().dimensions(), (9, 3));
        assert_eq!(ctl.substrate().grid().alive_count(), 0);
        assert!(ctl.is_running());
        assert_eq!(ctl.playback().fps(), 10.0);
    }

    #[test]
    fn test_adjust_fps_is_clamped() {
        let mut ctl = controller(blinker(), MAX_FPS, PlaybackMode::Running);
        assert_eq!(ctl.adjust_fps(true).unwrap(), MAX_FPS);
        let mut ctl = controller(blinker(), MIN_FPS, PlaybackMode::Running);
        assert_eq!(ctl.adjust_fps(false).unwrap(), MIN_FPS);
        assert_eq!(ctl.adjust_fps(true).unwrap(), MIN_FPS * FPS_ADJUST_FACTOR);
    }

    #[test]
    fn test_from_config_honours_seed_and_start_mode() {
        let config = SimulationConfig {
            cols: 12,
            rows: 12,
            seed: Some(9),
            start_paused: true,
            ..SimulationConfig::default()
        };
        let make = || {
            let sub = CpuSubstrate::new(Grid::dead(12, 12).unwrap(), (12, 12), PALETTE, 0.0);
            let mut ctl = PlaybackController::from_config(sub, &config).unwrap();
            ctl.randomise_state().unwrap();
            ctl
        };
        let a = make();
        let b = make();
        assert!(!a.is_running());
        assert_eq!(a.substrate().grid(), b.substrate().grid());
    }

    #[test]
    fn test_playback_state_rejects_bad_rate() {
        assert!(PlaybackState::new(0.0, PlaybackMode::Running).is_err());
        assert!(PlaybackState::new(f64::INFINITY, PlaybackMode::Running).is_err());
    }
}

use std::path::Path;

use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::error::ConfigError;
use crate::game::steering::{BehaviorWeights, DitherProbabilities};

pub const PARAMS_PATH: &str = "assets/params.ron";

/// Simulation parameters, loaded once before the world is built. Weights
/// and max force are stored unscaled; see [`Params::effective_weights`] and
/// [`Params::max_force`].
///
/// A parameter file must name every field. Only the `Option` fields (`seed`,
/// `evade_threat_range` and the individual dither probabilities) may be left
/// out, and read as `None`.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Params {
    // World
    pub world_width: f64,
    pub world_height: f64,
    pub num_agents: usize,
    pub num_obstacles: usize,
    pub min_obstacle_radius: f64,
    pub max_obstacle_radius: f64,
    pub num_cells_x: usize,
    pub num_cells_y: usize,
    pub num_samples_for_smoothing: usize,

    // Vehicles
    pub steering_force_tweaker: f64,
    pub max_steering_force: f64,
    pub max_speed: f64,
    pub vehicle_mass: f64,
    pub vehicle_scale: f64,
    pub max_turn_rate_per_second: f64,

    // Behaviour tuning
    pub weights: BehaviorWeights,
    pub probabilities: DitherProbabilities,
    pub view_distance: f64,
    pub min_detection_box_length: f64,
    pub wall_detection_feeler_length: f64,
    pub wander_radius: f64,
    pub wander_distance: f64,
    pub wander_jitter_per_sec: f64,
    pub waypoint_seek_distance: f64,
    pub evade_threat_range: Option<f64>,

    /// Fixed RNG seed for reproducible runs; a fresh one per run when unset.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            world_width: 1280.0,
            world_height: 720.0,
            num_agents: 300,
            num_obstacles: 7,
            min_obstacle_radius: 10.0,
            max_obstacle_radius: 30.0,
            num_cells_x: 7,
            num_cells_y: 7,
            num_samples_for_smoothing: 10,
            steering_force_tweaker: 200.0,
            max_steering_force: 2.0,
            max_speed: 150.0,
            vehicle_mass: 1.0,
            vehicle_scale: 3.0,
            max_turn_rate_per_second: std::f64::consts::PI,
            weights: BehaviorWeights::default(),
            probabilities: DitherProbabilities::classic(),
            view_distance: 50.0,
            min_detection_box_length: 40.0,
            wall_detection_feeler_length: 40.0,
            wander_radius: 1.2,
            wander_distance: 2.0,
            wander_jitter_per_sec: 80.0,
            waypoint_seek_distance: 20.0,
            evade_threat_range: Some(100.0),
            seed: None,
        }
    }
}

impl Params {
    /// Reads, parses and validates a RON parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let params: Params = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        params.validate()?;
        info!("Loaded simulation parameters from {}", path.display());
        Ok(params)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.num_cells_x == 0 || self.num_cells_y == 0 {
            return invalid(format!(
                "grid needs at least one cell per axis, got {}x{}",
                self.num_cells_x, self.num_cells_y
            ));
        }
        if !(self.world_width > 0.0 && self.world_height > 0.0) {
            return invalid(format!("world size must be positive, got {}x{}", self.world_width, self.world_height));
        }
        if !(self.vehicle_mass > 0.0) {
            return invalid(format!("vehicle_mass must be positive, got {}", self.vehicle_mass));
        }
        if !(self.vehicle_scale > 0.0) {
            return invalid(format!("vehicle_scale must be positive, got {}", self.vehicle_scale));
        }
        if self.max_speed < 0.0 || self.max_steering_force < 0.0 {
            return invalid("max_speed and max_steering_force must not be negative".into());
        }
        if self.min_obstacle_radius < 0.0 || self.min_obstacle_radius > self.max_obstacle_radius {
            return invalid(format!(
                "obstacle radius range {}..{} is empty",
                self.min_obstacle_radius, self.max_obstacle_radius
            ));
        }
        if self.num_samples_for_smoothing == 0 {
            return invalid("num_samples_for_smoothing must be at least 1".into());
        }
        if let Some((behavior, p)) = self.probabilities.iter().find(|(_, p)| !(*p > 0.0 && *p <= 1.0)) {
            return invalid(format!("dither probability for {behavior} must be in (0, 1], got {p}"));
        }
        Ok(())
    }

    pub fn max_force(&self) -> f64 {
        self.max_steering_force * self.steering_force_tweaker
    }

    pub fn effective_weights(&self) -> BehaviorWeights {
        self.weights.scaled(self.steering_force_tweaker)
    }

    /// Seeded from `seed` when set, from the OS otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Runtime view settings that can be hot-reloaded: key bindings and which
/// debug overlays start switched on.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug)]
pub struct ViewConfig {
    // World toggles
    pub key_pause: KeyCode,
    pub key_toggle_obstacles: KeyCode,
    pub key_toggle_walls: KeyCode,
    pub key_new_path: KeyCode,
    pub key_toggle_smoothing: KeyCode,
    pub key_toggle_partitioning: KeyCode,
    pub key_toggle_non_penetration: KeyCode,
    pub key_weighted_sum: KeyCode,
    pub key_prioritized: KeyCode,
    pub key_dithered: KeyCode,

    // Tuning
    pub key_max_force_up: KeyCode,
    pub key_max_force_down: KeyCode,
    pub key_max_speed_up: KeyCode,
    pub key_max_speed_down: KeyCode,

    // Overlays
    pub key_toggle_neighbors: KeyCode,
    pub key_toggle_cell_info: KeyCode,
    pub key_toggle_feelers: KeyCode,
    pub key_toggle_detection_box: KeyCode,
    pub key_toggle_wander_circle: KeyCode,
    pub key_toggle_steering_force: KeyCode,
    pub key_toggle_path: KeyCode,

    pub show_neighbors: bool,
    pub show_cell_info: bool,
    pub show_feelers: bool,
    pub show_detection_box: bool,
    pub show_wander_circle: bool,
    pub show_steering_force: bool,
    pub show_path: bool,
}

#[derive(Resource)]
pub struct ViewConfigHandle(pub Handle<ViewConfig>);

pub struct ViewConfigPlugin;

impl Plugin for ViewConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<ViewConfig>::new(&["view_config.ron"]))
            .add_systems(Startup, setup_view_config);
    }
}

fn setup_view_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("view_config.ron");
    commands.insert_resource(ViewConfigHandle(handle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("steering_{}_{}.ron", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        Params::default().validate().unwrap();
    }

    #[test]
    fn test_shipped_params_file_loads() {
        let params = Params::load(PARAMS_PATH).unwrap();
        assert!(params.num_agents > 0);
    }

    #[test]
    fn test_zero_cells_rejected() {
        let params = Params { num_cells_x: 0, ..Params::default() };
        assert!(matches!(params.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let mut params = Params::default();
        params.probabilities.seek = Some(1.5);
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("Seek"), "error names the behaviour: {err}");
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = Params::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_garbage_file_is_a_parse_error() {
        let path = write_temp("garbage", "this is ( not ron");
        let err = Params::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = std::fs::remove_file(path);
    }

    fn shipped_params() -> String {
        std::fs::read_to_string(PARAMS_PATH).unwrap()
    }

    #[test]
    fn test_missing_weights_is_a_parse_error() {
        let contents = shipped_params();
        let start = contents.find("    weights: (").unwrap();
        let end = start + contents[start..].find("    ),\n").unwrap() + "    ),\n".len();
        let without_weights = format!("{}{}", &contents[..start], &contents[end..]);

        let path = write_temp("no_weights", &without_weights);
        let err = Params::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err}");
        assert!(err.to_string().contains("weights"), "error names the field: {err}");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_single_weight_is_a_parse_error() {
        let contents = shipped_params();
        assert!(contents.contains("        cohesion: 2.0,\n"));
        let path = write_temp("no_cohesion", &contents.replacen("        cohesion: 2.0,\n", "", 1));

        let err = Params::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err}");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_scalar_is_a_parse_error() {
        let contents = shipped_params();
        let path = write_temp("no_agents", &contents.replacen("    num_agents: 300,\n", "", 1));

        let err = Params::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err}");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_optional_fields_may_be_omitted() {
        let contents = shipped_params()
            .replacen("    seed: None,\n", "", 1)
            .replacen("        arrive: Some(0.5),\n", "", 1);
        let path = write_temp("no_optionals", &contents);

        let params = Params::load(&path).unwrap();
        assert_eq!(params.seed, None);
        assert_eq!(params.probabilities.arrive, None);
        assert_eq!(params.weights, BehaviorWeights::default());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_tweaker_scales_weights_and_force() {
        let params = Params::default();
        assert_eq!(params.max_force(), 400.0);
        assert_eq!(params.effective_weights().cohesion, 400.0);
    }
}

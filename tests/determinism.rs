use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use voxelbots_lib::model::activation::ActivationFunction;
use voxelbots_lib::model::config::SimConfig;
use voxelbots_lib::model::controller::{Controller, Parametrized, RecurrentNetwork};
use voxelbots_lib::model::robot::Robot;
use voxelbots_lib::model::sensing::{CentralizedSensing, Sensing};
use voxelbots_lib::model::snapshot::NoopListener;
use voxelbots_lib::model::terrain::Terrain;
use voxelbots_lib::tasks::Locomotion;

fn seeded_robot(seed: u64) -> Robot {
    let body = Robot::rectangle_body(3, 1);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let net = RecurrentNetwork::new_random(
        CentralizedSensing::input_dim_for(&body, false),
        6,
        CentralizedSensing::output_dim_for(&body),
        ActivationFunction::Tanh,
        &mut rng,
    )
    .unwrap();
    let sensing =
        Sensing::Centralized(CentralizedSensing::new(Controller::Rnn(net), &body, false).unwrap());
    Robot::new(body, sensing)
}

fn short_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.task.horizon = 3.0;
    config
}

fn run_once(robot: &mut Robot) -> Vec<f64> {
    let mut task = Locomotion::new(Terrain::hilly(200.0, 5.0, 1.0, 42), short_config());
    task.run(robot, &mut NoopListener)
        .unwrap()
        .center_x_series()
}

#[test]
fn test_same_seed_reproduces_the_trajectory_bit_for_bit() {
    let series_a = run_once(&mut seeded_robot(7));
    let series_b = run_once(&mut seeded_robot(7));
    assert_eq!(
        series_a, series_b,
        "Identical seeds must give identical trajectories"
    );
}

#[test]
fn test_cloned_robot_runs_identically_to_its_original() {
    let mut original = seeded_robot(11);
    let mut copy = original.clone();
    assert_eq!(
        run_once(&mut original),
        run_once(&mut copy),
        "A cloned robot is a perfect stand-in for the original"
    );
}

#[test]
fn test_rerunning_the_same_robot_after_reset_matches() {
    // the driver resets controller state at the start of every run, so the
    // same robot instance is reusable across evaluations
    let mut robot = seeded_robot(23);
    let first = run_once(&mut robot);
    let second = run_once(&mut robot);
    assert_eq!(first, second, "Runs must not leak state into each other");
}

#[test]
fn test_different_seeds_give_different_controllers() {
    let a = seeded_robot(1);
    let b = seeded_robot(2);
    assert_ne!(a.params(), b.params(), "Seeds must matter");
}

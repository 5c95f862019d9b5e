use anyhow::Result;
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use voxelbots_lib::model::activation::ActivationFunction;
use voxelbots_lib::model::config::SimConfig;
use voxelbots_lib::model::controller::{
    Controller, MultiLayerPerceptron, Parametrized, RecurrentNetwork, SpikingNetwork,
};
use voxelbots_lib::model::controller::snn::NeuronModel;
use voxelbots_lib::model::robot::Robot;
use voxelbots_lib::model::sensing::{CentralizedSensing, DistributedSensing, Sensing};
use voxelbots_lib::model::snapshot::NoopListener;
use voxelbots_lib::model::terrain::Terrain;
use voxelbots_lib::tasks::{Locomotion, PeriodicLocomotion};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Controller variant driving the robot
    #[arg(short = 'b', long, value_enum, default_value = "mlp")]
    controller: ControllerKind,

    /// How sensors are wired to controllers
    #[arg(short, long, value_enum, default_value = "centralized")]
    sensing: SensingKind,

    /// Robot body width in voxels
    #[arg(long, default_value_t = 4)]
    width: usize,

    /// Robot body height in voxels
    #[arg(long, default_value_t = 2)]
    height: usize,

    /// Seed for controller parameter initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Run on a bounded periodic terrain of this length and report coverage
    #[arg(long)]
    periodic: Option<f64>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ControllerKind {
    Mlp,
    Rnn,
    Spiking,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SensingKind {
    Centralized,
    Distributed,
}

fn build_controller(
    kind: ControllerKind,
    input_dim: usize,
    output_dim: usize,
    config: &SimConfig,
    rng: &mut ChaCha8Rng,
) -> voxelbots_lib::model::errors::Result<Controller> {
    let controller = match kind {
        ControllerKind::Mlp => Controller::Mlp(MultiLayerPerceptron::new_random(
            vec![input_dim, input_dim.max(output_dim), output_dim],
            ActivationFunction::Tanh,
            rng,
        )?),
        ControllerKind::Rnn => Controller::Rnn(RecurrentNetwork::new_random(
            input_dim,
            input_dim.max(output_dim),
            output_dim,
            ActivationFunction::Tanh,
            rng,
        )?),
        ControllerKind::Spiking => Controller::Spiking(SpikingNetwork::new_random(
            input_dim,
            vec![input_dim.max(output_dim), output_dim],
            NeuronModel::LeakyIntegrateAndFire { homeostatic: false },
            config.spiking.substeps,
            config.spiking.substep_dt,
            config.spiking.decode_window,
            rng,
        )?),
    };
    Ok(controller)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = SimConfig::load(&args.config);
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let body = Robot::rectangle_body(args.width, args.height);
    let sensing = match args.sensing {
        SensingKind::Centralized => {
            let input_dim = CentralizedSensing::input_dim_for(&body, false);
            let output_dim = CentralizedSensing::output_dim_for(&body);
            let controller =
                build_controller(args.controller, input_dim, output_dim, &config, &mut rng)?;
            Sensing::Centralized(CentralizedSensing::new(controller, &body, false)?)
        }
        SensingKind::Distributed => {
            let comm_channels = 1;
            let sensing = DistributedSensing::new(&body, comm_channels, |input_dim, output_dim| {
                build_controller(args.controller, input_dim, output_dim, &config, &mut rng)
            })?;
            Sensing::Distributed(sensing)
        }
    };
    let mut robot = Robot::new(body, sensing);
    tracing::info!(
        params = robot.param_count(),
        "robot assembled, starting evaluation"
    );

    let mut listener = NoopListener;
    if let Some(length) = args.periodic {
        let task = PeriodicLocomotion::new(length, config);
        let outcome = task.run(&mut robot, &mut listener)?;
        println!(
            "periodic locomotion: coverage {:.3}, displacement {:.3} m over {:.1} s ({:?})",
            outcome.coverage(),
            outcome.outcome().x_displacement(),
            outcome.outcome().duration(),
            outcome.outcome().termination(),
        );
    } else {
        let terrain = Terrain::hilly(400.0, 5.0, 1.0, config.seed);
        let mut task = Locomotion::new(terrain, config);
        let outcome = task.run(&mut robot, &mut listener)?;
        println!(
            "locomotion: displacement {:.3} m, mean vx {:.3} m/s over {:.1} s ({:?})",
            outcome.x_displacement(),
            outcome.average_x_velocity(),
            outcome.duration(),
            outcome.termination(),
        );
    }
    Ok(())
}

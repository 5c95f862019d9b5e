use voxelbots_lib::model::activation::ActivationFunction;
use voxelbots_lib::model::body::{BodyUnit, Sensor, UnitState};
use voxelbots_lib::model::controller::{Controller, MultiLayerPerceptron, Parametrized};
use voxelbots_lib::model::errors::Result;
use voxelbots_lib::model::grid::Grid;
use voxelbots_lib::model::sensing::{CentralizedSensing, DistributedSensing, Sensing};

fn mixed_body() -> Grid<BodyUnit> {
    // Three units with different sensor suites: 4 + 1 + 3 channels.
    let mut body = Grid::new(2, 2);
    body.set(0, 0, Some(BodyUnit::standard()));
    body.set(1, 0, Some(BodyUnit::new(vec![Sensor::Touch])));
    body.set(0, 1, Some(BodyUnit::new(vec![Sensor::Velocity, Sensor::AreaRatio])));
    body
}

#[test]
fn test_centralized_input_length_is_sum_of_channel_counts() {
    let body = mixed_body();
    assert_eq!(
        CentralizedSensing::input_dim_for(&body, false),
        8,
        "4 + 1 + 3 channels over occupied cells in row-major order"
    );
    assert_eq!(
        CentralizedSensing::input_dim_for(&body, true),
        11,
        "Feedback adds one slot per unit"
    );
    assert_eq!(CentralizedSensing::output_dim_for(&body), 3);
}

#[test]
fn test_centralized_actuation_feedback_round_trips() {
    let mut body = mixed_body();
    let input_dim = CentralizedSensing::input_dim_for(&body, true);
    // biases drive constant nonzero outputs so feedback has something to see
    let mut net =
        MultiLayerPerceptron::new(vec![input_dim, 3], ActivationFunction::Tanh).unwrap();
    let mut params = vec![0.0; net.param_count()];
    let bias_start = input_dim * 3;
    params[bias_start] = 0.7;
    params[bias_start + 1] = -0.4;
    params[bias_start + 2] = 0.1;
    net.set_params(&params).unwrap();
    let mut sensing = CentralizedSensing::new(Controller::Mlp(net), &body, true).unwrap();

    let states = body.map(|_, _, _| UnitState::default());
    let first = sensing.control_step(&mut body, &states).unwrap();
    let expected: Vec<f64> = vec![0.7f64.tanh(), (-0.4f64).tanh(), 0.1f64.tanh()];
    let got: Vec<f64> = first.iter().map(|(_, _, &a)| a).collect();
    for (g, e) in got.iter().zip(expected.iter()) {
        assert!((g - e).abs() < 1e-12);
    }
    // previous actuation is now visible on each unit
    for (got_a, (_, _, unit)) in got.iter().zip(body.iter()) {
        assert_eq!(unit.last_actuation, *got_a);
    }
}

fn passthrough_controller(input_dim: usize, output_dim: usize) -> Result<Controller> {
    Ok(Controller::Mlp(MultiLayerPerceptron::new(
        vec![input_dim, output_dim],
        ActivationFunction::Tanh,
    )?))
}

#[test]
fn test_distributed_output_depends_on_neighbor_previous_tick_only() {
    // Two units in a row, one comm channel. Unit A (x=0) forwards its touch
    // sensor east; unit B (x=1) echoes its west-facing inbound signal as its
    // actuation. Signal slot order per unit: N, E, S, W.
    let mut body = Grid::new(2, 1);
    body.set(0, 0, Some(BodyUnit::new(vec![Sensor::Touch])));
    body.set(1, 0, Some(BodyUnit::new(vec![Sensor::Touch])));

    let mut sensing = DistributedSensing::new(&body, 1, |input_dim, output_dim| {
        passthrough_controller(input_dim, output_dim)
    })
    .unwrap();
    // Inputs per unit: [touch, sig_n, sig_e, sig_s, sig_w] -> outputs
    // [actuation, out_n, out_e, out_s, out_w].
    let per_unit = 5 * 5 + 5; // single affine layer: weights then biases
    let mut params = vec![0.0; sensing.param_count()];
    // unit A: touch (input 0) -> east outgoing signal (output 2), strong
    params[0 * 5 + 2] = 5.0;
    // unit B: west inbound signal (input 4) -> actuation (output 0), strong
    params[per_unit + 4 * 5 + 0] = 5.0;
    sensing.set_params(&params).unwrap();

    let touching = |t: bool| {
        let mut states = Grid::new(2, 1);
        states.set(
            0,
            0,
            Some(UnitState {
                touching: t,
                ..Default::default()
            }),
        );
        states.set(1, 0, Some(UnitState::default()));
        states
    };

    // Tick 1: A touches. B must not see it yet.
    let a1 = sensing.control_step(&mut body, &touching(true)).unwrap();
    assert_eq!(
        *a1.get(1, 0).unwrap(),
        0.0,
        "Neighbor signal of the same tick must be invisible"
    );
    // Tick 2: A no longer touches, but B now reads A's tick-1 signal.
    let a2 = sensing.control_step(&mut body, &touching(false)).unwrap();
    assert!(
        *a2.get(1, 0).unwrap() > 0.9,
        "B acts on A's previous-tick signal, got {}",
        a2.get(1, 0).unwrap()
    );
    // Tick 3: A stayed silent at tick 2, so the echo fades again.
    let a3 = sensing.control_step(&mut body, &touching(false)).unwrap();
    assert_eq!(*a3.get(1, 0).unwrap(), 0.0);
}

#[test]
fn test_distributed_controllers_edge_units_see_silent_outside() {
    let mut body = Grid::new(1, 1);
    body.set(0, 0, Some(BodyUnit::new(vec![Sensor::Touch])));
    let mut sensing =
        DistributedSensing::new(&body, 2, |i, o| passthrough_controller(i, o)).unwrap();
    let states = body.map(|_, _, _| UnitState::default());
    // a lone unit has no neighbors; all comm inputs are zero and the step works
    let actuations = sensing.control_step(&mut body, &states).unwrap();
    assert_eq!(*actuations.get(0, 0).unwrap(), 0.0);
}

#[test]
fn test_sensing_enum_param_passthrough() {
    let body = mixed_body();
    let input_dim = CentralizedSensing::input_dim_for(&body, false);
    let net = MultiLayerPerceptron::new(vec![input_dim, 3], ActivationFunction::Tanh).unwrap();
    let mut sensing =
        Sensing::Centralized(CentralizedSensing::new(Controller::Mlp(net), &body, false).unwrap());
    let n = sensing.param_count();
    let params: Vec<f64> = (0..n).map(|i| (i as f64).sin()).collect();
    sensing.set_params(&params).unwrap();
    assert_eq!(sensing.params(), params);
}

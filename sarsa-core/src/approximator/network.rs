//! Q function made of one small neural network per action.
use super::{check_action, check_agent, FunctionApproximator};
use crate::{
    error::{Result, SarsaError},
    mat::Mat,
    sa_pair::StateActionPair,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Configuration of [`QNetworks`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NetworkConfig {
    /// Standard deviation of the zero-mean Gaussian the weights are drawn from.
    pub init_std: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { init_std: 0.1 }
    }
}

impl NetworkConfig {
    /// Sets the standard deviation of the initial weights.
    pub fn init_std(mut self, v: f64) -> Self {
        self.init_std = v;
        self
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Derivative of the sigmoid, given the activation `a = sigmoid(z)`.
fn sigmoid_prime(a: f64) -> f64 {
    a * (1.0 - a)
}

/// Per-layer matrices with the shapes of the weights of a [`QNetwork`].
///
/// Used both for eligibilities and for the gradient of a single evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerTraces {
    /// Input-to-hidden layer, `hidden x (inputs + 1)`.
    pub hidden: Mat,

    /// Hidden-to-output layer, `1 x hidden`.
    pub output: Mat,
}

impl LayerTraces {
    fn zeros_like(w_hidden: &Mat, w_output: &Mat) -> Self {
        Self {
            hidden: Mat::zeros(w_hidden.rows(), w_hidden.cols()),
            output: Mat::zeros(w_output.rows(), w_output.cols()),
        }
    }

    /// Layer-wise sum.
    pub fn add(&self, x: &LayerTraces) -> Result<Self> {
        Ok(Self {
            hidden: self.hidden.add(&x.hidden)?,
            output: self.output.add(&x.output)?,
        })
    }

    /// Layer-wise scaling.
    pub fn scale(&self, s: f64) -> Self {
        Self {
            hidden: self.hidden.scale(s),
            output: self.output.scale(s),
        }
    }
}

/// Activations of one forward pass.
struct Forward {
    input: Mat,
    hidden: Mat,
    output: Mat,
    q: f64,
}

/// Three-layer sigmoid perceptron with a single output.
///
/// The input layer receives the element-wise sigmoid of the state followed by
/// a constant bias input of 1. The estimate is the weighted input of the
/// output neuron, before its sigmoid, so it is not bounded to `(0, 1)`.
#[derive(Clone, Debug)]
pub struct QNetwork {
    w_hidden: Mat,
    w_output: Mat,
    traces: Vec<LayerTraces>,
}

impl QNetwork {
    /// Builds a network for states of width `num_inputs` with weights drawn
    /// from `init`.
    pub fn new<R: Rng + ?Sized>(
        hidden_nodes: usize,
        num_inputs: usize,
        num_agents: usize,
        init: &Normal<f64>,
        rng: &mut R,
    ) -> Self {
        let hidden_nodes = hidden_nodes.max(1);
        let w_hidden = Mat::from_fn(hidden_nodes, num_inputs + 1, |_, _| init.sample(rng));
        let w_output = Mat::from_fn(1, hidden_nodes, |_, _| init.sample(rng));
        let traces = vec![LayerTraces::zeros_like(&w_hidden, &w_output); num_agents];

        Self {
            w_hidden,
            w_output,
            traces,
        }
    }

    /// Weights, `(input-to-hidden, hidden-to-output)`.
    pub fn weights(&self) -> (&Mat, &Mat) {
        (&self.w_hidden, &self.w_output)
    }

    fn input(&self, state: &[f64]) -> Result<Mat> {
        let expected = self.w_hidden.cols() - 1;
        if state.len() != expected {
            return Err(SarsaError::InputWidth {
                got: state.len(),
                expected,
            });
        }
        let mut x: Vec<f64> = state.iter().map(|s| sigmoid(*s)).collect();
        x.push(1.0);
        Ok(Mat::column(&x))
    }

    fn forward(&self, state: &[f64]) -> Result<Forward> {
        let input = self.input(state)?;
        let hidden = self.w_hidden.matmul(&input)?.map(sigmoid);
        let z = self.w_output.matmul(&hidden)?;
        let q = z.get(0, 0)?;
        let output = z.map(sigmoid);

        Ok(Forward {
            input,
            hidden,
            output,
            q,
        })
    }

    /// Estimated value of `state`.
    pub fn evaluate(&self, state: &[f64]) -> Result<f64> {
        Ok(self.forward(state)?.q)
    }

    /// Derivative of the output activation with respect to every weight,
    /// evaluated at `state`.
    pub fn gradient(&self, state: &[f64]) -> Result<LayerTraces> {
        let f = self.forward(state)?;

        // errors of the output and hidden neurons
        let delta_output = f.output.map(sigmoid_prime);
        let delta_hidden = self
            .w_output
            .transpose()
            .matmul(&delta_output)?
            .mul_elem(&f.hidden.map(sigmoid_prime))?;

        Ok(LayerTraces {
            hidden: delta_hidden.matmul(&f.input.transpose())?,
            output: delta_output.matmul(&f.hidden.transpose())?,
        })
    }

    /// Eligibilities of an agent.
    pub fn eligibilities(&self, agent: usize) -> Result<&LayerTraces> {
        check_agent(agent, self.traces.len())?;
        Ok(&self.traces[agent])
    }

    /// Adds the gradient at `state` to the eligibilities of an agent.
    pub fn accumulate(&mut self, agent: usize, state: &[f64]) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        let grad = self.gradient(state)?;
        self.traces[agent] = self.traces[agent].add(&grad)?;
        Ok(())
    }

    /// Scales the eligibilities of an agent by `factor`.
    pub fn degrade(&mut self, agent: usize, factor: f64) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        self.traces[agent] = self.traces[agent].scale(factor);
        Ok(())
    }

    /// Zeroes the eligibilities of an agent.
    pub fn reset(&mut self, agent: usize) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        self.traces[agent] = LayerTraces::zeros_like(&self.w_hidden, &self.w_output);
        Ok(())
    }

    /// `w += alpha * delta * e` for every layer, with the eligibilities `e`
    /// of an agent.
    pub fn update(&mut self, agent: usize, alpha: f64, delta: f64) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        let step = self.traces[agent].scale(alpha * delta);
        self.w_hidden = self.w_hidden.add(&step.hidden)?;
        self.w_output = self.w_output.add(&step.output)?;
        Ok(())
    }
}

/// Bank of [`QNetwork`]s, one per action.
///
/// All agents share the weights; each network keeps separate eligibilities
/// for every agent. Unlike the table Q functions, repeated visits add up in
/// the eligibilities.
pub struct QNetworks {
    networks: Vec<QNetwork>,
    num_agents: usize,
}

impl QNetworks {
    /// Builds `num_outputs` networks for states of width `num_inputs`.
    pub fn build<R: Rng + ?Sized>(
        config: &NetworkConfig,
        hidden_nodes: usize,
        num_inputs: usize,
        num_outputs: usize,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let init = Normal::new(0.0, config.init_std).map_err(|e| {
            SarsaError::InvalidSettings(format!("init_std {}: {}", config.init_std, e))
        })?;
        let networks = (0..num_outputs)
            .map(|_| QNetwork::new(hidden_nodes, num_inputs, num_agents, &init, rng))
            .collect();

        Ok(Self {
            networks,
            num_agents,
        })
    }

    /// Network of an action.
    pub fn network(&self, action: usize) -> Result<&QNetwork> {
        check_action(action, self.networks.len())?;
        Ok(&self.networks[action])
    }

    /// Gradient of the network of the pair's action at the pair's state.
    pub fn gradient(&self, pair: &StateActionPair) -> Result<LayerTraces> {
        self.network(pair.action())?.gradient(pair.state())
    }

    /// Eligibilities of an agent in the network of an action.
    pub fn eligibilities(&self, agent: usize, action: usize) -> Result<&LayerTraces> {
        self.network(action)?.eligibilities(agent)
    }
}

impl FunctionApproximator for QNetworks {
    fn evaluate(&mut self, pair: &StateActionPair) -> Result<f64> {
        self.peek(pair)
    }

    fn peek(&self, pair: &StateActionPair) -> Result<f64> {
        self.network(pair.action())?.evaluate(pair.state())
    }

    fn accumulate_eligibilities(&mut self, agent: usize, pair: &StateActionPair) -> Result<()> {
        check_agent(agent, self.num_agents)?;
        check_action(pair.action(), self.networks.len())?;
        self.networks[pair.action()].accumulate(agent, pair.state())
    }

    fn degrade_eligibilities(&mut self, agent: usize, gamma: f64, lambda: f64) -> Result<()> {
        check_agent(agent, self.num_agents)?;
        for n in self.networks.iter_mut() {
            n.degrade(agent, gamma * lambda)?;
        }
        Ok(())
    }

    fn reset_eligibilities(&mut self, agent: usize) -> Result<()> {
        check_agent(agent, self.num_agents)?;
        for n in self.networks.iter_mut() {
            n.reset(agent)?;
        }
        Ok(())
    }

    fn update(&mut self, agent: usize, alpha: f64, delta: f64) -> Result<()> {
        check_agent(agent, self.num_agents)?;
        for n in self.networks.iter_mut() {
            n.update(agent, alpha, delta)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.networks
            .iter()
            .map(|n| n.w_hidden.data().len() + n.w_output.data().len())
            .sum()
    }
}

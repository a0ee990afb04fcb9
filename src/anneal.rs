use crate::model::{BinaryQuadraticModel, Vartype};
use crate::solution::Sample;
use crate::TqType;
use rand::Rng;
use std::collections::HashMap;

/// Bit-packed binary state of an annealing run.
pub struct QubitState {
	state: Vec<u64>,
	len: usize,
}

impl QubitState {
	#[inline]
	pub fn new_random<T: Rng>(len: usize, r: &mut T) -> Self {
		let words = (len + 63) / 64;
		let state = (0..words).map(|_| r.gen::<u64>()).collect();
		Self { state, len }
	}

	/// State of the low `len` bits of `bits`, `len <= 64`.
	pub fn from_bits(len: usize, bits: u64) -> Self {
		assert!(len <= 64);
		Self {
			state: if len == 0 { Vec::new() } else { vec![bits] },
			len,
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn get(&self, loc: usize) -> bool {
		assert!(loc < self.len);
		(self.state[loc / 64] >> (loc % 64)) & 1 == 1
	}

	#[inline]
	pub fn flip(&mut self, loc: usize) {
		assert!(loc < self.len);
		self.state[loc / 64] ^= 1u64 << (loc % 64);
	}
}

impl std::fmt::Debug for QubitState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for i in 0..self.len {
			if self.get(i) {
				f.write_str("1")?;
			} else {
				f.write_str("0")?;
			}
		}
		Ok(())
	}
}

/// A model flattened to index form in the binary domain: linear biases `h`
/// and symmetric neighbour lists.
#[derive(Clone, Debug)]
pub struct IndexedQubo<Tq: TqType> {
	pub variables: Vec<Tq>,
	pub h: Vec<f64>,
	pub neighbors: Vec<Vec<(usize, f64)>>,
	pub offset: f64,
}

impl<Tq: TqType> IndexedQubo<Tq> {
	pub fn new(bqm: &BinaryQuadraticModel<Tq>) -> Self {
		let binary = bqm.change_vartype(Vartype::Binary);
		let variables = binary.variables().cloned().collect::<Vec<_>>();
		let index: HashMap<&Tq, usize> =
			variables.iter().enumerate().map(|(i, v)| (v, i)).collect();
		let h = binary.linear().values().copied().collect();
		let mut neighbors = vec![Vec::new(); variables.len()];
		for ((u, v), w) in binary.quadratic().iter() {
			let (i, j) = (index[u], index[v]);
			neighbors[i].push((j, *w));
			neighbors[j].push((i, *w));
		}
		Self {
			variables,
			h,
			neighbors,
			offset: binary.offset(),
		}
	}

	pub fn len(&self) -> usize {
		self.variables.len()
	}

	pub fn energy(&self, state: &QubitState) -> f64 {
		let mut energy = self.offset;
		for (i, (h, neigh)) in self.h.iter().zip(self.neighbors.iter()).enumerate() {
			if !state.get(i) {
				continue;
			}
			energy += *h;
			for (j, coeff) in neigh.iter() {
				if *j < i && state.get(*j) {
					energy += *coeff;
				}
			}
		}
		energy
	}

	/// Sample of the state expressed in `vartype`.
	pub fn to_sample(&self, state: &QubitState, vartype: Vartype) -> Sample<Tq> {
		self.variables
			.iter()
			.enumerate()
			.map(|(i, v)| (v.clone(), vartype.from_bool(state.get(i))))
			.collect()
	}

	/// Default inverse temperature range: hot enough that the largest single
	/// flip is accepted with probability 1/2, cold enough that the smallest
	/// one is accepted with probability 1/100.
	pub fn default_beta_range(&self) -> (f64, f64) {
		let eg_min = self
			.h
			.iter()
			.chain(self.neighbors.iter().flat_map(|sl| sl.iter().map(|(_, f)| f)))
			.map(|f| f.abs())
			.filter(|f| *f > 0.0)
			.fold(f64::INFINITY, f64::min);
		let eg_max = self
			.h
			.iter()
			.enumerate()
			.map(|(index, h)| h.abs() + self.neighbors[index].iter().map(|(_, f)| f.abs()).sum::<f64>())
			.fold(0.0, f64::max);
		if eg_max.is_finite() && eg_min.is_finite() && eg_max > 0.0 {
			(f64::ln(2.0) / eg_max, f64::ln(100.0) / eg_min)
		} else {
			(0.1, 1.0)
		}
	}
}

/// Geometric schedule of `count` inverse temperatures from `beta_min` to
/// `beta_max`.
pub fn generate_beta_schedule(beta_min: f64, beta_max: f64, count: usize) -> Vec<f64> {
	if count <= 1 {
		return vec![beta_max; count];
	}
	let r = f64::ln(beta_max / beta_min) / (count as f64 - 1.0);
	(0..count)
		.map(|index| beta_min * f64::exp(index as f64 * r))
		.collect()
}

/// Single-flip Metropolis annealer over a binary model.
#[derive(Clone)]
pub struct SimpleAnnealer {
	pub sweeps_per_round: usize,
	pub beta_schedule: Vec<f64>,
}

impl SimpleAnnealer {
	pub fn new(sweeps_per_round: usize, beta_schedule: Vec<f64>) -> Self {
		Self {
			sweeps_per_round,
			beta_schedule,
		}
	}

	pub fn run<T: Rng>(
		&self,
		state: &mut QubitState,
		random: &mut T,
		h: &[f64],
		neighbors: &[Vec<(usize, f64)>],
	) {
		assert_eq!(state.len(), neighbors.len());
		assert_eq!(state.len(), h.len());
		// energy_diffs[i] is the change of energy when flipping qubit i
		let mut energy_diffs = Vec::with_capacity(state.len());
		for (i, ngs) in neighbors.iter().enumerate() {
			let mut energy_diff = h[i];
			for (j, weight) in ngs.iter() {
				if state.get(*j) {
					energy_diff += weight;
				}
			}
			if state.get(i) {
				energy_diff = -energy_diff;
			}
			energy_diffs.push(energy_diff);
		}
		for beta in self.beta_schedule.iter() {
			let threshold = 44.36142 / beta;
			for _ in 0..self.sweeps_per_round {
				for i in 0..state.len() {
					let ed = energy_diffs[i];
					if ed > threshold {
						continue;
					}
					if ed <= 0.0 || f64::exp(-ed * beta) > random.gen::<f64>() {
						state.flip(i);
						let stat = state.get(i);
						for (j, weight) in neighbors[i].iter() {
							if stat != state.get(*j) {
								energy_diffs[*j] += weight;
							} else {
								energy_diffs[*j] -= weight;
							}
						}
						energy_diffs[i] *= -1.0;
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::SmallRng;
	use rand::SeedableRng;

	#[test]
	fn state_flip_roundtrip() {
		let mut r = SmallRng::seed_from_u64(7);
		let mut state = QubitState::new_random(70, &mut r);
		let before = state.get(65);
		state.flip(65);
		assert_ne!(before, state.get(65));
		state.flip(65);
		assert_eq!(before, state.get(65));
		assert_eq!(format!("{:?}", state).len(), 70);
	}

	#[test]
	fn schedule_is_geometric() {
		let s = generate_beta_schedule(0.1, 10.0, 3);
		assert!((s[0] - 0.1).abs() < 1e-12);
		assert!((s[1] - 1.0).abs() < 1e-12);
		assert!((s[2] - 10.0).abs() < 1e-9);
	}

	#[test]
	fn annealer_reaches_ground_state_of_open_chain() {
		let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
		for i in 0..8u32 {
			bqm.add_variable(i, -1.0);
			if i + 1 < 8 {
				bqm.add_interaction(i, i + 1, -1.0);
			}
		}
		let qubo = IndexedQubo::new(&bqm);
		let (lo, hi) = qubo.default_beta_range();
		let annealer = SimpleAnnealer::new(1, generate_beta_schedule(lo, hi, 500));
		let mut r = SmallRng::seed_from_u64(42);
		let mut state = QubitState::new_random(qubo.len(), &mut r);
		annealer.run(&mut state, &mut r, &qubo.h, &qubo.neighbors);
		let sample = qubo.to_sample(&state, Vartype::Spin);
		assert!((bqm.energy(&sample).unwrap() - qubo.energy(&state)).abs() < 1e-9);
		assert!((qubo.energy(&state) - (-15.0)).abs() < 1e-9);
	}
}

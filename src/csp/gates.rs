//! Constraints of Boolean gates. Inputs come first, outputs last.

use super::Constraint;
use crate::error::Result;
use crate::TqType;

/// `out = in1 ∧ in2` over `[in1, in2, out]`.
pub fn and_gate<Tq: TqType>(variables: [Tq; 3]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(|x| x[2] == (x[0] && x[1]), variables.to_vec())?.with_name("AND"))
}

/// `out = in1 ∨ in2` over `[in1, in2, out]`.
pub fn or_gate<Tq: TqType>(variables: [Tq; 3]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(|x| x[2] == (x[0] || x[1]), variables.to_vec())?.with_name("OR"))
}

/// `out = in1 ⊕ in2` over `[in1, in2, out]`.
pub fn xor_gate<Tq: TqType>(variables: [Tq; 3]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(|x| x[2] == (x[0] != x[1]), variables.to_vec())?.with_name("XOR"))
}

/// Half adder over `[augend, addend, sum, carry]`.
pub fn halfadder_gate<Tq: TqType>(variables: [Tq; 4]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(
		|x| {
			let total = x[0] as u8 + x[1] as u8;
			x[2] == (total & 1 == 1) && x[3] == (total >> 1 == 1)
		},
		variables.to_vec(),
	)?
	.with_name("HALF_ADD"))
}

/// Full adder over `[in1, in2, carry_in, sum, carry_out]`.
pub fn fulladder_gate<Tq: TqType>(variables: [Tq; 5]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(
		|x| {
			let total = x[0] as u8 + x[1] as u8 + x[2] as u8;
			x[3] == (total & 1 == 1) && x[4] == (total >> 1 == 1)
		},
		variables.to_vec(),
	)?
	.with_name("FULL_ADD"))
}

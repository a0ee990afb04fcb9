//! Two-variable relations.

use super::Constraint;
use crate::error::Result;
use crate::TqType;

/// `a ≠ b`; a NOT gate between its input and output.
pub fn ne<Tq: TqType>(variables: [Tq; 2]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(|x| x[0] != x[1], variables.to_vec())?.with_name("NE"))
}

/// `a = b`
pub fn eq<Tq: TqType>(variables: [Tq; 2]) -> Result<Constraint<Tq>> {
	Ok(Constraint::from_fn(|x| x[0] == x[1], variables.to_vec())?.with_name("EQ"))
}

use crate::TqType;
use std::fmt;

/// Hands out fresh ancilla labels while a model is being reduced or stitched.
#[derive(Clone, Debug, Default)]
pub struct Builder {
	ancillas: usize,
}

impl Builder {
	pub fn new() -> Self {
		Self { ancillas: 0 }
	}

	pub fn ancilla<Tq>(&mut self) -> Qubit<Tq>
	where
		Tq: TqType,
	{
		self.ancillas += 1;
		Qubit::Ancilla(self.ancillas - 1)
	}

	/// Number of ancillas created so far.
	pub fn ancillas(&self) -> usize {
		self.ancillas
	}
}

/// A variable of a reduced model: either one of the caller's variables or an
/// auxiliary variable introduced by order reduction.
#[derive(PartialEq, Eq, Clone, Hash, Ord, PartialOrd)]
pub enum Qubit<Tq>
where
	Tq: TqType,
{
	Qubit(Tq),
	Ancilla(usize),
}

impl<Tq> Qubit<Tq>
where
	Tq: TqType,
{
	pub fn new(ltq: Tq) -> Self {
		Self::Qubit(ltq)
	}

	/// The caller's label, `None` for ancillas.
	pub fn label(&self) -> Option<&Tq> {
		match self {
			Self::Qubit(q) => Some(q),
			Self::Ancilla(_) => None,
		}
	}

	pub fn is_ancilla(&self) -> bool {
		matches!(self, Self::Ancilla(_))
	}
}

impl<Tq> fmt::Debug for Qubit<Tq>
where
	Tq: TqType,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Qubit(q) => fmt::Debug::fmt(q, f),
			Self::Ancilla(n) => write!(f, "aux{}", n),
		}
	}
}

impl<Tq> fmt::Display for Qubit<Tq>
where
	Tq: TqType + fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Qubit(q) => fmt::Display::fmt(q, f),
			Self::Ancilla(n) => write!(f, "aux{}", n),
		}
	}
}

#[test]
fn ancilla_labels_are_unique() {
	let mut builder = Builder::new();
	let a: Qubit<&str> = builder.ancilla();
	let b: Qubit<&str> = builder.ancilla();
	assert_ne!(a, b);
	assert_eq!(format!("{:?}", b), "aux1");
	assert_eq!(format!("{}", Qubit::new("x")), "x");
	assert_eq!(builder.ancillas(), 2);
}

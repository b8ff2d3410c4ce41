// Shared world state and mutation observers

mod store;

pub use store::{Attributes, MutationListener, Store, World};

#[cfg(test)]
mod tests;

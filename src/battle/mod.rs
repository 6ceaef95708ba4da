pub mod engine;
pub mod state;

#[cfg(test)]
pub(crate) mod tests;

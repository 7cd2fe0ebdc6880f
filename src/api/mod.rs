pub mod authenticated;
pub mod public;

#[cfg(test)]
pub(crate) mod tests;

pub mod coordinator;
#[cfg(test)]
pub(crate) mod test_support;

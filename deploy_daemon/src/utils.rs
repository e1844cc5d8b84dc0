pub mod logging;
#[cfg(test)]
pub mod test_utilities;

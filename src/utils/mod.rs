pub mod git;
pub mod lib_http;
#[cfg(test)]
pub mod mock_http;

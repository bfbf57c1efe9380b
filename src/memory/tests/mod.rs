mod config_tests;
mod short_term_tests;
mod storage_tests;

mod test_utils;

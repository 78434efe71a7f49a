pub mod cookies;
pub mod extractor;
pub mod form;
pub mod jwt;
pub mod password;
pub mod test_utils;
pub mod validation;

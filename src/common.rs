pub mod business_days;
pub mod db_utils;
pub mod error;
pub mod i18n;
pub mod validation;

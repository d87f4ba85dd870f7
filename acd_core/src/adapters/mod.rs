pub mod acd;

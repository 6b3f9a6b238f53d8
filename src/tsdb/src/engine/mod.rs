pub mod tsm1;

pub mod helpers;
mod tests_timing;

//! Integration tests: the compiled binary against temporary git repositories

mod helpers;
mod test_commands;
mod test_release;

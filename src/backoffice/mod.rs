//! Back-office service the console creates transfers and agents through

mod memory;
mod traits;

pub use memory::InMemoryBackOffice;
pub use traits::BackOfficeTrait;

#[cfg(test)]
pub use traits::MockBackOfficeTrait;

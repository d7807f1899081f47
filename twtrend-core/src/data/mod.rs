//! Data sources: bar providers and display-name resolution.

pub mod circuit_breaker;
pub mod memory;
pub mod names;
pub mod provider;
pub mod yahoo;

pub use circuit_breaker::{CircuitBreaker, Outcome};
pub use memory::MemoryProvider;
pub use names::{NameDirectory, NameResolver, NameSource, SecondaryStatus};
pub use provider::{
    DataError, DataProvider, FetchProgress, Period, SilentProgress, StderrProgress,
};
pub use yahoo::YahooProvider;

pub mod codec;
pub mod config;
pub mod language;
pub mod persona;
pub mod scenario;
pub mod session;
pub mod turn;
pub mod types;
pub mod wire;

// Keep the public surface small and intentional.
pub use codec::*;
pub use config::*;
pub use language::*;
pub use persona::*;
pub use scenario::*;
pub use session::*;
pub use turn::*;
pub use types::*;
pub use wire::*;

pub mod error;
pub mod model;
pub mod persist;
pub mod store;

pub use error::WalletError;
pub use model::{CardRecord, PALETTE, PaletteColor, bank_color};
pub use persist::ChannelSink;
pub use store::{ActionMenu, CardStore, FlipOutcome, MenuAction};

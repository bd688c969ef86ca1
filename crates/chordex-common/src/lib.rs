pub mod errors;
pub mod id;
pub mod math;
pub mod realm;

pub use errors::{BusError, ChordexError, CommandError, ConfigError, ParseError};
pub use id::{new_id, MessageId};
pub use math::clamp;
pub use realm::{ContextIdentity, RealmKind, TabId, TAB_ID_NONE};

pub type Result<T> = std::result::Result<T, ChordexError>;

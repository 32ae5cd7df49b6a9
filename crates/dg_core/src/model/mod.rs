pub mod connection;
pub mod dungeon;
pub mod room;
pub mod spawn;
pub mod tile;

pub use connection::{Connection, CorridorStyle};
pub use dungeon::{compute_checksum, Dungeon};
pub use room::{Room, RoomId, RoomType};
pub use spawn::{SpawnDescriptor, SpawnKind};
pub use tile::TileKind;

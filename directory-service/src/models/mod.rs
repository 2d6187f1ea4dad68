pub mod media;
pub mod menu;
pub mod user;

pub use media::{EntityKind, ImageRecord};
pub use menu::{frontend_menu, MenuEntry, MenuSection};
pub use user::{Role, SanitizedUser, User, UserChanges};

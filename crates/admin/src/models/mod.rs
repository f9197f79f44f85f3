//! Domain models for the admin panel.
//!
//! Validated domain objects, converted from the internal row types in
//! [`crate::db`]. Session-scoped types (the signed-in identity and the
//! one-shot flash message) live here too.

pub mod category;
pub mod flash;
pub mod group;
pub mod media;
pub mod product;
pub mod sale;
pub mod session;
pub mod user;

pub use category::Category;
pub use flash::{Flash, Severity, flash, take_flash};
pub use group::Group;
pub use media::Media;
pub use product::{Product, ProductDetail, TopSeller};
pub use sale::{ReportRow, Sale, SaleWithProduct};
pub use session::{CurrentUser, session_keys};
pub use user::{User, UserWithGroup};

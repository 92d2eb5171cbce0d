//! Domain models shared by repositories and route handlers.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod slider;
pub mod user;

pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY};
pub use order::{Address, Order, OrderItem, OrderTotals, cod_fee, compute_totals};
pub use product::{Product, ProductInput};
pub use review::{Review, ReviewInput};
pub use slider::{SliderImage, SliderImageInput};
pub use user::User;

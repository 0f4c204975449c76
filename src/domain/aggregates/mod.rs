//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;
pub mod return_request;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Advance, CancelledBy, CustomerInfo, Fulfillment, Order, OrderError, OrderItem, OrderStatus, OrderType, PaymentMethod};
pub use product::{NewProduct, Product, ProductError};
pub use return_request::{RequestType, ReturnError, ReturnRequest, ReturnStatus};
pub use user::{Profile, PublicUser, Role, User, UserError};

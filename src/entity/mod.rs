pub mod order_items;
pub mod orders;
pub mod products;
pub mod profiles;

pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
